//! Snowfall Particle Field
//!
//! A pool of snowflakes drifting down a full-viewport surface, active only
//! while counting down.
//!
//! # Spawn cadence
//!
//! The initial population is spread over a band one viewport tall above the
//! visible area, so flakes trickle in. A flake that falls out the bottom is
//! re-randomized and then pinned to just above the top edge, so recycled
//! flakes re-enter immediately instead of waiting in the band.
//!
//! # Lifecycle
//!
//! [`Snowfall::mount`] sizes the field, draws the first frame and holds a
//! [`FrameRequest`] plus a [`ResizeListener`]. Each fired frame re-registers
//! the request. [`Snowfall::unmount`] (or drop) releases both guards.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::platform::{FrameRequest, Platform, ResizeListener, Viewport};

/// Fewest flakes a field ever holds
pub const MIN_PARTICLES: usize = 60;

/// Surface pixels of width per flake
pub const PIXELS_PER_PARTICLE: f32 = 4.0;

/// A 2D drawing surface the field renders onto
pub trait Surface {
    /// Resize the backing store to the viewport
    fn resize(&mut self, viewport: Viewport);

    /// Clear the whole surface
    fn clear(&mut self);

    /// Fill a white circle at the given opacity
    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, alpha: f32);
}

/// One snowflake
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Particle {
    /// Horizontal position
    pub x: f32,
    /// Vertical position, growing downward
    pub y: f32,
    /// Horizontal drift per frame
    pub vx: f32,
    /// Fall speed per frame
    pub vy: f32,
    /// Radius in surface pixels
    pub radius: f32,
    /// Opacity
    pub alpha: f32,
}

fn uniform<R: Rng>(rng: &mut R, low: f32, high: f32) -> f32 {
    low + rng.gen::<f32>() * (high - low)
}

impl Particle {
    /// Re-randomize somewhere in the band above the viewport
    pub fn reset<R: Rng>(&mut self, rng: &mut R, viewport: Viewport) {
        self.x = uniform(rng, 0.0, viewport.width);
        self.y = -uniform(rng, 0.0, viewport.height);
        self.vx = uniform(rng, -3.0, 3.0);
        self.vy = uniform(rng, 2.0, 5.0);
        self.radius = uniform(rng, 1.0, 4.0);
        self.alpha = uniform(rng, 0.1, 0.9);
    }

    /// Whether the top edge has passed below the viewport
    fn has_fallen_out(&self, height: f32) -> bool {
        self.y - self.radius > height
    }
}

/// Number of flakes for a viewport width
pub fn particle_count(width: f32) -> usize {
    let by_width = (width.max(0.0) / PIXELS_PER_PARTICLE).floor() as usize;
    by_width.max(MIN_PARTICLES)
}

/// The flake pool
#[derive(Debug)]
pub struct SnowField<R = StdRng> {
    viewport: Viewport,
    particles: Vec<Particle>,
    rng: R,
}

impl SnowField<StdRng> {
    /// Field with an entropy-seeded generator
    pub fn new(viewport: Viewport) -> Self {
        Self::with_rng(viewport, StdRng::from_entropy())
    }
}

impl<R: Rng> SnowField<R> {
    /// Field with a caller-supplied generator
    pub fn with_rng(viewport: Viewport, rng: R) -> Self {
        let mut field = Self {
            viewport,
            particles: Vec::new(),
            rng,
        };
        field.repopulate(viewport);
        field
    }

    /// Replace the whole population for a new viewport
    pub fn repopulate(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let count = particle_count(viewport.width);
        let rng = &mut self.rng;
        self.particles = (0..count)
            .map(|_| {
                let mut flake = Particle::default();
                flake.reset(rng, viewport);
                flake
            })
            .collect();
    }

    /// Advance every flake one frame, recycling the ones that fell out
    pub fn step(&mut self) {
        let viewport = self.viewport;
        for flake in &mut self.particles {
            flake.x += flake.vx;
            flake.y += flake.vy;
            if flake.has_fallen_out(viewport.height) {
                flake.reset(&mut self.rng, viewport);
                flake.y = -flake.radius;
            }
        }
    }

    /// Clear the surface and draw every flake
    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) {
        surface.clear();
        for flake in &self.particles {
            surface.fill_circle(flake.x, flake.y, flake.radius, flake.alpha);
        }
    }

    /// Current flakes
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable flakes (for scripted scenarios)
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Viewport the field was populated for
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

/// The mounted snowfall animation
pub struct Snowfall<R = StdRng> {
    platform: Platform,
    /// Generator held until the first drawable viewport
    rng: Option<R>,
    field: Option<SnowField<R>>,
    frame: Option<FrameRequest>,
    resize: Option<ResizeListener>,
}

impl Snowfall<StdRng> {
    /// Mount onto the platform's surface
    pub fn mount<S: Surface + ?Sized>(platform: &Platform, surface: &mut S) -> Self {
        Self::mount_with_rng(platform, surface, StdRng::from_entropy())
    }
}

impl<R: Rng> Snowfall<R> {
    /// Mount with a caller-supplied generator
    ///
    /// Without a viewport the snowfall stays inert. A zero-size viewport
    /// keeps the resize listener but draws nothing until the surface grows.
    pub fn mount_with_rng<S: Surface + ?Sized>(platform: &Platform, surface: &mut S, rng: R) -> Self {
        let mut snowfall = Self {
            platform: platform.clone(),
            rng: Some(rng),
            field: None,
            frame: None,
            resize: None,
        };

        let Some(viewport) = platform.viewport() else {
            tracing::debug!("No drawing surface, snowfall disabled");
            return snowfall;
        };

        snowfall.resize = Some(platform.listen_resize());
        if !viewport.is_drawable() {
            tracing::debug!(
                width = viewport.width,
                height = viewport.height,
                "Zero-size surface, snowfall paused"
            );
            return snowfall;
        }

        snowfall.populate(viewport, surface);
        snowfall.draw(surface);
        snowfall
    }

    /// Handle a platform frame; returns true if a frame was drawn
    pub fn on_frame<S: Surface + ?Sized>(&mut self, surface: &mut S) -> bool {
        let resized = self.resize.as_ref().and_then(ResizeListener::take_resize);
        if let Some(viewport) = resized {
            if !viewport.is_drawable() {
                tracing::debug!("Surface shrank to nothing, snowfall paused");
                self.frame = None;
                return false;
            }

            self.populate(viewport, surface);
            if self.frame.is_none() {
                self.draw(surface);
                return true;
            }
        }

        let fired = self
            .frame
            .as_ref()
            .and_then(FrameRequest::take_fired)
            .is_some();
        if !fired {
            return false;
        }

        self.draw(surface);
        true
    }

    /// Size the surface and (re)build the population for `viewport`
    fn populate<S: Surface + ?Sized>(&mut self, viewport: Viewport, surface: &mut S) {
        surface.resize(viewport);
        if let Some(field) = self.field.as_mut() {
            field.repopulate(viewport);
        } else if let Some(rng) = self.rng.take() {
            self.field = Some(SnowField::with_rng(viewport, rng));
        }
        tracing::debug!(
            particles = self.field.as_ref().map_or(0, |f| f.particles().len()),
            width = viewport.width,
            height = viewport.height,
            "Snowfall populated"
        );
    }

    fn draw<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        let Some(field) = self.field.as_mut() else {
            return;
        };
        field.step();
        field.render(surface);
        self.frame = Some(self.platform.request_frame());
    }

    /// Cancel the pending frame and drop the resize listener
    pub fn unmount(&mut self) {
        self.frame = None;
        self.resize = None;
    }

    /// Whether a redraw is scheduled
    pub fn is_running(&self) -> bool {
        self.frame.is_some()
    }

    /// The particle field, if a surface exists
    pub fn field(&self) -> Option<&SnowField<R>> {
        self.field.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[derive(Default)]
    struct RecordingSurface {
        size: Option<Viewport>,
        clears: usize,
        circles: usize,
    }

    impl Surface for RecordingSurface {
        fn resize(&mut self, viewport: Viewport) {
            self.size = Some(viewport);
        }
        fn clear(&mut self) {
            self.clears += 1;
            self.circles = 0;
        }
        fn fill_circle(&mut self, _x: f32, _y: f32, _radius: f32, _alpha: f32) {
            self.circles += 1;
        }
    }

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_particle_count_has_floor() {
        assert_eq!(particle_count(0.0), 60);
        assert_eq!(particle_count(239.0), 60);
        assert_eq!(particle_count(243.0), 60);
        assert_eq!(particle_count(244.0), 61);
        assert_eq!(particle_count(1920.0), 480);
    }

    #[test]
    fn test_reset_ranges() {
        let viewport = Viewport::new(800.0, 600.0);
        let mut rng = seeded();
        let mut flake = Particle::default();
        for _ in 0..1000 {
            flake.reset(&mut rng, viewport);
            assert!((0.0..=800.0).contains(&flake.x));
            assert!((-600.0..=0.0).contains(&flake.y));
            assert!((-3.0..=3.0).contains(&flake.vx));
            assert!((2.0..=5.0).contains(&flake.vy));
            assert!(flake.radius >= 1.0 && flake.radius <= 4.0);
            assert!((0.1..=0.9).contains(&flake.alpha));
        }
    }

    #[test]
    fn test_recycled_flake_pinned_above_top() {
        let viewport = Viewport::new(400.0, 300.0);
        let mut field = SnowField::with_rng(viewport, seeded());
        {
            let flake = &mut field.particles_mut()[0];
            flake.y = 310.0;
            flake.radius = 2.0;
            flake.vy = 3.0;
        }
        field.step();

        let flake = field.particles()[0];
        assert_eq!(flake.y, -flake.radius);
        assert!(flake.y <= viewport.height + flake.radius);
    }

    #[test]
    fn test_flake_at_bottom_edge_is_kept() {
        let viewport = Viewport::new(400.0, 300.0);
        let mut field = SnowField::with_rng(viewport, StepRng::new(0, 0));
        {
            let flake = &mut field.particles_mut()[0];
            flake.y = 299.0;
            flake.vy = 2.0;
            flake.vx = 0.0;
            flake.radius = 1.0;
        }
        field.step();
        assert_eq!(field.particles()[0].y, 301.0);
    }

    #[test]
    fn test_render_draws_every_flake() {
        let field = SnowField::with_rng(Viewport::new(800.0, 600.0), seeded());
        let mut surface = RecordingSurface::default();
        field.render(&mut surface);
        assert_eq!(surface.clears, 1);
        assert_eq!(surface.circles, 200);
    }

    #[test]
    fn test_mount_without_surface_is_inert() {
        let platform = Platform::new();
        let mut surface = RecordingSurface::default();
        let mut snowfall = Snowfall::mount_with_rng(&platform, &mut surface, seeded());

        platform.begin_frame();
        assert!(!snowfall.on_frame(&mut surface));
        assert!(!snowfall.is_running());
        assert_eq!(surface.clears, 0);
        assert_eq!(platform.resize_listener_count(), 0);
    }

    #[test]
    fn test_zero_size_surface_waits_for_resize() {
        let platform = Platform::with_viewport(Viewport::new(0.0, 0.0));
        let mut surface = RecordingSurface::default();
        let mut snowfall = Snowfall::mount_with_rng(&platform, &mut surface, seeded());

        platform.begin_frame();
        assert!(!snowfall.on_frame(&mut surface));
        assert!(!snowfall.is_running());
        assert!(snowfall.field().is_none());
        assert_eq!(surface.clears, 0);
        assert_eq!(platform.pending_frame_requests(), 0);
        assert_eq!(platform.resize_listener_count(), 1);

        platform.set_viewport(Viewport::new(400.0, 300.0));
        platform.begin_frame();
        assert!(snowfall.on_frame(&mut surface));
        assert!(snowfall.is_running());
        assert_eq!(snowfall.field().map(|f| f.particles().len()), Some(100));
        assert_eq!(surface.clears, 1);
    }

    #[test]
    fn test_shrinking_to_zero_pauses() {
        let platform = Platform::with_viewport(Viewport::new(400.0, 300.0));
        let mut surface = RecordingSurface::default();
        let mut snowfall = Snowfall::mount_with_rng(&platform, &mut surface, seeded());
        assert!(snowfall.is_running());

        platform.set_viewport(Viewport::new(0.0, 300.0));
        platform.begin_frame();
        assert!(!snowfall.on_frame(&mut surface));
        assert!(!snowfall.is_running());
        assert_eq!(platform.pending_frame_requests(), 0);

        platform.begin_frame();
        assert!(!snowfall.on_frame(&mut surface));
        assert_eq!(surface.clears, 1);
    }

    #[test]
    fn test_frame_loop_reschedules_itself() {
        let platform = Platform::with_viewport(Viewport::new(400.0, 300.0));
        let mut surface = RecordingSurface::default();
        let mut snowfall = Snowfall::mount_with_rng(&platform, &mut surface, seeded());
        assert_eq!(surface.clears, 1);
        assert_eq!(platform.pending_frame_requests(), 1);

        for _ in 0..5 {
            platform.begin_frame();
            assert!(snowfall.on_frame(&mut surface));
            assert_eq!(platform.pending_frame_requests(), 1);
        }
        assert_eq!(surface.clears, 6);

        // No frame fired: nothing drawn
        assert!(!snowfall.on_frame(&mut surface));
    }

    #[test]
    fn test_resize_repopulates() {
        let platform = Platform::with_viewport(Viewport::new(400.0, 300.0));
        let mut surface = RecordingSurface::default();
        let mut snowfall = Snowfall::mount_with_rng(&platform, &mut surface, seeded());

        platform.set_viewport(Viewport::new(1000.0, 500.0));
        platform.begin_frame();
        snowfall.on_frame(&mut surface);

        let field = snowfall.field().unwrap();
        assert_eq!(field.particles().len(), 250);
        assert_eq!(field.viewport(), Viewport::new(1000.0, 500.0));
        assert_eq!(surface.size, Some(Viewport::new(1000.0, 500.0)));
    }

    #[test]
    fn test_unmount_releases_registrations() {
        let platform = Platform::with_viewport(Viewport::new(400.0, 300.0));
        let mut surface = RecordingSurface::default();
        let mut snowfall = Snowfall::mount_with_rng(&platform, &mut surface, seeded());

        snowfall.unmount();
        assert_eq!(platform.pending_frame_requests(), 0);
        assert_eq!(platform.resize_listener_count(), 0);

        platform.begin_frame();
        assert!(!snowfall.on_frame(&mut surface));
    }
}
