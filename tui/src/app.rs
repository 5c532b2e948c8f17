//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin surface over the
//! headless [`Presentation`]:
//! - Event loop (keyboard, resize) and frame pacing
//! - Platform viewport in surface pixels, kept in step with the terminal
//! - Layered rendering: background scene, particles, panel
//! - Starting the fireworks stage once its modules are ready

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use parking_lot::Mutex;
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::Widget;
use ratatui::Terminal;
use tokio::time::MissedTickBehavior;

use countdown_core::{
    ActiveView, AudioOutput, CelebrationConfig, Clock, EngineState, Platform, Presentation,
    PresentationEvent, PresentationMode, Surface, SystemClock, Target,
};

use crate::compositor::{Compositor, LayerId};
use crate::fireworks::{AssetSource, FireworksStage, StageContext};
use crate::surface::CellCanvas;
use crate::theme;
use crate::widgets::{CountdownPanel, LoadingScreen};

/// Everything needed to start the display
pub struct Launch {
    pub config: CelebrationConfig,
    pub target: Target,
    pub force_fireworks: bool,
    pub clock: Arc<dyn Clock>,
    pub audio: Box<dyn AudioOutput>,
}

impl Launch {
    /// Launch on the system clock
    pub fn new(config: CelebrationConfig, target: Target, audio: Box<dyn AudioOutput>) -> Self {
        Self {
            config,
            target,
            force_fireworks: false,
            clock: Arc::new(SystemClock),
            audio,
        }
    }
}

/// Main application state
pub struct App {
    // === Core State ===
    /// Is the app still running?
    running: bool,
    /// Frame pacing and cell metrics
    config: CelebrationConfig,
    clock: Arc<dyn Clock>,

    // === Presentation ===
    platform: Platform,
    presentation: Presentation,
    /// Context the fireworks modules execute against
    stage_context: Arc<Mutex<StageContext>>,
    /// Running fireworks, once modules are ready
    stage: Option<FireworksStage>,
    stage_attempted: bool,

    // === UI Components ===
    /// Snowfall drawing surface
    snow: CellCanvas,
    /// Fireworks drawing surface
    sparks: CellCanvas,
    /// The layered compositor
    compositor: Compositor,
    /// Layer assignments
    layers: AppLayers,
    /// Terminal size
    size: (u16, u16),
}

/// Layer IDs for UI regions
struct AppLayers {
    background: LayerId,
    particles: LayerId,
    panel: LayerId,
}

impl App {
    /// Create the app for a terminal of `size` columns and rows
    ///
    /// Must be called inside a tokio runtime; the celebration spawns its
    /// module loader on it.
    pub fn new(launch: Launch, size: (u16, u16)) -> Self {
        let Launch {
            config,
            target,
            force_fireworks,
            clock,
            audio,
        } = launch;

        let area = Rect::new(0, 0, size.0, size.1);
        let mut compositor = Compositor::new(area);
        let layers = AppLayers {
            background: compositor.create_layer(area, 0),
            particles: compositor.create_layer(area, 10),
            panel: compositor.create_layer(area, 20),
        };

        let mut snow = CellCanvas::new(config.cell_width, config.cell_height);
        let sparks = CellCanvas::new(config.cell_width, config.cell_height);
        let platform = Platform::with_viewport(snow.viewport_for(size.0, size.1));

        let stage_context = Arc::new(Mutex::new(StageContext::new()));
        let source = Arc::new(AssetSource::new(
            config.assets_dir.clone(),
            stage_context.clone(),
        ));

        let presentation = Presentation::builder(target, source)
            .config(config.clone())
            .clock(clock.clone())
            .platform(platform.clone())
            .audio(audio)
            .force_fireworks(force_fireworks)
            .build(&mut snow);

        Self {
            running: true,
            config,
            clock,
            platform,
            presentation,
            stage_context,
            stage: None,
            stage_attempted: false,
            snow,
            sparks,
            compositor,
            layers,
            size,
        }
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        // Create async event stream for non-blocking terminal events
        let mut event_stream = EventStream::new();

        // Frame pacing
        let mut frames =
            tokio::time::interval(Duration::from_millis(self.config.frame_interval_ms.max(1)));
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Render initial frame immediately so user sees UI
        self.render(terminal)?;

        while self.running {
            tokio::select! {
                biased;

                // Terminal events - highest priority
                maybe_event = event_stream.next() => match maybe_event {
                    // Only handle Press events (not Release or Repeat)
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key);
                    }
                    Some(Ok(Event::Resize(w, h))) => self.handle_resize(w, h),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => tracing::warn!(error = %e, "Terminal event error"),
                    None => self.running = false,
                },

                // Frame tick - advance and render
                _ = frames.tick() => {
                    self.tick();
                    self.render(terminal)?;
                }
            }
        }

        self.presentation.teardown();
        Ok(())
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: event::KeyEvent) {
        match key.code {
            // Quit
            KeyCode::Esc | KeyCode::Char('q') => self.running = false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }

            // User gesture; lets blocked audio start
            KeyCode::Char(' ') => {
                if let Some(output) = self.presentation.audio_output_mut() {
                    if let Err(e) = output.play() {
                        tracing::debug!(error = %e, "Audio did not start on gesture");
                    }
                }
            }

            _ => {}
        }
    }

    /// Handle terminal resize
    pub fn handle_resize(&mut self, width: u16, height: u16) {
        self.size = (width, height);
        self.compositor.resize(Rect::new(0, 0, width, height));

        let viewport = self.snow.viewport_for(width, height);
        self.platform.set_viewport(viewport);
        if let Some(stage) = self.stage.as_mut() {
            self.sparks.resize(viewport);
            stage.resize(viewport);
        }
        tracing::debug!(width, height, "Terminal resized");
    }

    /// Advance one frame
    pub fn tick(&mut self) {
        for event in self.presentation.step(&mut self.snow) {
            self.apply(event);
        }

        let ready = self
            .presentation
            .celebration()
            .is_some_and(|view| view.is_ready());
        if ready && !self.stage_attempted {
            self.start_stage();
        }

        if let Some(stage) = self.stage.as_mut() {
            stage.step(self.clock.now_ms());
            stage.render(&mut self.sparks);
        }
    }

    fn apply(&mut self, event: PresentationEvent) {
        match event {
            PresentationEvent::Reached => tracing::info!("Happy New Year"),
            PresentationEvent::ModeChanged(PresentationMode::Fireworks) => self.snow.clear(),
            PresentationEvent::ModulesFailed(e) => {
                tracing::error!(error = %e, "Fireworks unavailable");
            }
            PresentationEvent::Audio(state) => tracing::info!(?state, "Ambient audio settled"),
            PresentationEvent::BackgroundChanged(index) => {
                tracing::trace!(index, "Background scene changed");
            }
            _ => {}
        }
    }

    fn start_stage(&mut self) {
        self.stage_attempted = true;
        let Some(settings) = self.stage_context.lock().settings() else {
            tracing::warn!("Modules reported ready but the stage is incomplete");
            return;
        };

        let viewport = self.snow.viewport_for(self.size.0, self.size.1);
        self.sparks.resize(viewport);
        self.stage = Some(FireworksStage::new(settings, viewport, self.clock.now_ms()));
    }

    /// Render the UI
    fn render(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let output = self.compose();

        terminal.draw(|frame| {
            let area = frame.area();
            let buf = frame.buffer_mut();

            for y in 0..area.height.min(output.area.height) {
                for x in 0..area.width.min(output.area.width) {
                    let idx = output.index_of(x, y);
                    if idx < output.content.len() {
                        buf[(x, y)] = output.content[idx].clone();
                    }
                }
            }
        })?;

        Ok(())
    }

    /// Draw every layer and composite them
    pub fn compose(&mut self) -> &Buffer {
        self.render_background();
        self.render_particles();
        self.render_panel();
        self.compositor.composite()
    }

    /// Render the background gradient layer
    fn render_background(&mut self) {
        let (sky, ground) = match self.presentation.view() {
            ActiveView::Countdown(view) => (theme::scene(view.background_index()).to_vec(), None),
            _ => match &self.stage {
                Some(stage) => {
                    let screen = &stage.settings().screen;
                    let sky: Vec<Color> =
                        screen.sky.iter().filter_map(|c| theme::parse_hex(c)).collect();
                    let ground_rows = (f32::from(self.size.1) * screen.ground_fraction.clamp(0.0, 0.5))
                        .round() as u16;
                    let ground = theme::parse_hex(&screen.ground).map(|c| (c, ground_rows));
                    (sky, ground)
                }
                None => (vec![theme::FIREWORKS_SKY], None),
            },
        };

        if let Some(buf) = self.compositor.layer_buffer_mut(self.layers.background) {
            buf.reset();
            fill_gradient(buf, &sky, ground);
        }
    }

    /// Render snow or fireworks
    fn render_particles(&mut self) {
        let canvas = match self.presentation.view() {
            ActiveView::Countdown(_) => Some(&self.snow),
            ActiveView::Celebration(_) if self.stage.is_some() => Some(&self.sparks),
            _ => None,
        };

        // Hidden while the loading screen is up
        self.compositor
            .set_visible(self.layers.particles, canvas.is_some());
        let Some(canvas) = canvas else {
            return;
        };

        if let Some(buf) = self.compositor.layer_buffer_mut(self.layers.particles) {
            buf.reset();
            canvas.render(buf);
        }
    }

    /// Render the countdown panel or the loading screen
    fn render_panel(&mut self) {
        let stage_running = self.stage.is_some();
        let Some(buf) = self.compositor.layer_buffer_mut(self.layers.panel) else {
            return;
        };
        buf.reset();
        let area = buf.area;

        match self.presentation.view() {
            ActiveView::Countdown(view) => {
                CountdownPanel::new(view.title(), view.target_year(), view.display())
                    .celebrating(view.engine().state() == EngineState::Completed)
                    .render(area, buf);
            }
            ActiveView::Celebration(view) if !stage_running => {
                LoadingScreen::new(view.status()).render(area, buf);
            }
            _ => {
                if area.height > 0 {
                    buf.set_string(
                        area.x,
                        area.y + area.height - 1,
                        " q to quit ",
                        Style::default().fg(theme::DIM_GRAY),
                    );
                }
            }
        }
    }

    /// Whether the loop should keep going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current presentation mode
    pub fn mode(&self) -> PresentationMode {
        self.presentation.mode()
    }

    /// The headless presentation
    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    /// The fireworks stage, once running
    pub fn stage(&self) -> Option<&FireworksStage> {
        self.stage.as_ref()
    }

    /// The platform the presentation schedules against
    pub fn platform(&self) -> &Platform {
        &self.platform
    }
}

/// Fill a buffer top to bottom with evenly sized color bands
///
/// `ground` paints the bottom rows a solid color.
fn fill_gradient(buf: &mut Buffer, bands: &[Color], ground: Option<(Color, u16)>) {
    let area = buf.area;
    if bands.is_empty() || area.height == 0 {
        return;
    }

    let ground_rows = ground.map_or(0, |(_, rows)| rows.min(area.height));
    let sky_rows = area.height - ground_rows;

    for row in 0..area.height {
        let color = if row >= sky_rows {
            ground.map_or(theme::FIREWORKS_SKY, |(c, _)| c)
        } else {
            let band = usize::from(row) * bands.len() / usize::from(sky_rows.max(1));
            bands[band.min(bands.len() - 1)]
        };
        buf.set_style(
            Rect::new(area.x, area.y + row, area.width, 1),
            Style::default().bg(color),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_bands_and_ground() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 2, 4));
        let top = Color::Rgb(1, 1, 1);
        let bottom = Color::Rgb(2, 2, 2);
        let ground = Color::Rgb(9, 9, 9);
        fill_gradient(&mut buf, &[top, bottom], Some((ground, 1)));

        assert_eq!(buf[(0, 0)].bg, top);
        assert_eq!(buf[(0, 1)].bg, top);
        assert_eq!(buf[(0, 2)].bg, bottom);
        assert_eq!(buf[(1, 3)].bg, ground);
    }
}
