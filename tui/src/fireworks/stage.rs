//! Fireworks Simulation
//!
//! Shells launch from the skyline on a fixed cadence, climb until gravity
//! stops them, and burst into sparks that slow down and fade out.
//! All positions are in surface pixels; velocities are per frame.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::style::Color;

use countdown_core::{Interval, Viewport};

use super::FireworksSettings;
use crate::surface::CellCanvas;
use crate::theme;

/// A rising shell
#[derive(Clone, Debug, PartialEq)]
pub struct Shell {
    pub x: f32,
    pub y: f32,
    pub vy: f32,
    pub kind: usize,
}

/// One burst fragment
#[derive(Clone, Debug, PartialEq)]
pub struct Spark {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub life: u32,
    pub max_life: u32,
    pub color: Color,
}

impl Spark {
    fn alpha(&self) -> f32 {
        self.life as f32 / self.max_life.max(1) as f32
    }
}

/// The running fireworks show
pub struct FireworksStage<R = StdRng> {
    settings: FireworksSettings,
    colors: Vec<Color>,
    viewport: Viewport,
    launcher: Interval,
    shells: Vec<Shell>,
    sparks: Vec<Spark>,
    rng: R,
}

impl FireworksStage<StdRng> {
    /// Stage with an entropy-seeded generator
    pub fn new(settings: FireworksSettings, viewport: Viewport, now_ms: i64) -> Self {
        Self::with_rng(settings, viewport, now_ms, StdRng::from_entropy())
    }
}

impl<R: Rng> FireworksStage<R> {
    /// Stage with a caller-supplied generator
    pub fn with_rng(settings: FireworksSettings, viewport: Viewport, now_ms: i64, rng: R) -> Self {
        let colors = settings
            .shells
            .iter()
            .map(|s| theme::parse_hex(&s.color).unwrap_or(theme::SNOW_BRIGHT))
            .collect();
        let launcher = Interval::start(now_ms, settings.stage.launch_interval_ms);
        tracing::info!(shells = settings.shells.len(), "Fireworks stage running");
        Self {
            settings,
            colors,
            viewport,
            launcher,
            shells: Vec::new(),
            sparks: Vec::new(),
            rng,
        }
    }

    /// Follow a surface resize
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Height of the skyline in pixels
    pub fn ground_height(&self) -> f32 {
        self.viewport.height * self.settings.screen.ground_fraction.clamp(0.0, 0.5)
    }

    /// Advance one frame
    pub fn step(&mut self, now_ms: i64) {
        if self.launcher.poll(now_ms) && self.shells.len() < self.settings.stage.max_shells {
            self.launch();
        }

        let gravity = self.settings.stage.gravity;
        let mut bursts = Vec::new();
        self.shells.retain_mut(|shell| {
            shell.y += shell.vy;
            shell.vy += gravity;
            if shell.vy >= 0.0 {
                bursts.push(shell.clone());
                return false;
            }
            true
        });
        for shell in bursts {
            self.burst(&shell);
        }

        let drag = self.settings.math.drag;
        self.sparks.retain_mut(|spark| {
            spark.vx *= drag;
            spark.vy = spark.vy * drag + gravity * 0.5;
            spark.x += spark.vx;
            spark.y += spark.vy;
            spark.life = spark.life.saturating_sub(1);
            spark.life > 0
        });
    }

    fn launch(&mut self) {
        let stage = &self.settings.stage;
        let floor = self.viewport.height - self.ground_height();
        let apex = floor * self.rng.gen_range(stage.apex_min..=stage.apex_max.max(stage.apex_min));
        // v^2 = 2 g h
        let speed = (2.0 * stage.gravity.max(0.01) * apex).sqrt();

        let shell = Shell {
            x: self.rng.gen_range(0.1..0.9) * self.viewport.width,
            y: floor,
            vy: -speed,
            kind: self.rng.gen_range(0..self.settings.shells.len().max(1)),
        };
        tracing::trace!(x = shell.x, apex, kind = shell.kind, "Shell launched");
        self.shells.push(shell);
    }

    fn burst(&mut self, shell: &Shell) {
        let Some(kind) = self.settings.shells.get(shell.kind) else {
            return;
        };
        let color = self.colors[shell.kind];
        let math = &self.settings.math;
        let max_life = math.spark_life_frames.max(1);

        for i in 0..kind.sparks {
            let angle = std::f32::consts::TAU * i as f32 / kind.sparks as f32;
            let speed = self
                .rng
                .gen_range(math.spark_speed_min..=math.spark_speed_max.max(math.spark_speed_min));
            self.sparks.push(Spark {
                x: shell.x,
                y: shell.y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                life: max_life,
                max_life,
                color,
            });
        }
    }

    /// Draw shells and sparks
    pub fn render(&self, canvas: &mut CellCanvas) {
        use countdown_core::Surface;

        canvas.clear();
        for shell in &self.shells {
            canvas.plot(shell.x, shell.y, 2.0, 1.0, theme::ROCKET_TRAIL);
        }
        for spark in &self.sparks {
            let alpha = spark.alpha();
            canvas.plot(spark.x, spark.y, 1.0 + 2.0 * alpha, alpha, spark.color);
        }
    }

    /// Shells in flight
    pub fn shells(&self) -> &[Shell] {
        &self.shells
    }

    /// Live sparks
    pub fn sparks(&self) -> &[Spark] {
        &self.sparks
    }

    /// Settings the stage runs with
    pub fn settings(&self) -> &FireworksSettings {
        &self.settings
    }
}
