//! Presentation - Composition Root
//!
//! Wires the mode controller, the two views and the process-wide loader
//! registry together, and drives them from one `step` per frame.
//!
//! # Views
//!
//! - [`CountdownView`]: countdown engine, snowfall and background cycle
//! - [`CelebrationView`]: module loading status and the ambient audio retry
//!
//! Exactly one view is mounted. When the countdown completes, the countdown
//! view is unmounted (cancelling its ticker, frame request, resize listener
//! and background timer) before the celebration view is mounted.
//!
//! # Loading
//!
//! Mounting the celebration view spawns the [`SequentialLoader`] chain on the
//! current tokio runtime. The chain reports back through a channel drained in
//! [`Presentation::step`]. Without a runtime the view stays in its loading
//! state.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::audio::{AudioOutput, AudioRetry, RetryState, SilentOutput};
use crate::background::BackgroundCycle;
use crate::clock::{Clock, SystemClock};
use crate::config::CelebrationConfig;
use crate::countdown::{CountdownDisplay, CountdownEngine, CountdownEvent};
use crate::document::Document;
use crate::loader::{
    LoadError, LoadOutcome, LoaderRegistry, LoaderState, ModuleSource, SequentialLoader,
};
use crate::mode::{ModeController, PresentationMode};
use crate::platform::Platform;
use crate::snow::{Snowfall, Surface};
use crate::target::Target;

/// Something the surface may want to react to
#[derive(Clone, Debug, PartialEq)]
pub enum PresentationEvent {
    /// New countdown snapshot
    Display(CountdownDisplay),
    /// Target reached, terminal message up
    Reached,
    /// The active mode changed
    ModeChanged(PresentationMode),
    /// Background scene advanced
    BackgroundChanged(usize),
    /// Every celebration module loaded
    ModulesReady,
    /// The module chain failed
    ModulesFailed(LoadError),
    /// Ambient audio retry settled
    Audio(RetryState),
}

/// The countdown view
pub struct CountdownView {
    engine: CountdownEngine,
    snowfall: Snowfall,
    background: BackgroundCycle,
}

impl CountdownView {
    fn mount(
        target: Target,
        config: &CelebrationConfig,
        platform: &Platform,
        surface: &mut dyn Surface,
        now_ms: i64,
        events: &mut Vec<PresentationEvent>,
    ) -> Self {
        let mut engine = CountdownEngine::new(target, config.tick_ms, config.completion_grace_ms);
        let snowfall = Snowfall::mount(platform, surface);
        let background =
            BackgroundCycle::start(config.background_scenes, config.background_period_ms, now_ms);

        for event in engine.start(now_ms) {
            push_countdown_event(events, event);
        }

        Self {
            engine,
            snowfall,
            background,
        }
    }

    /// Poll timers; returns true once completion is delivered
    fn update(&mut self, now_ms: i64, events: &mut Vec<PresentationEvent>) -> bool {
        let mut completed = false;
        for event in self.engine.update(now_ms) {
            if event == CountdownEvent::Completed {
                completed = true;
            }
            push_countdown_event(events, event);
        }

        if let Some(index) = self.background.update(now_ms) {
            events.push(PresentationEvent::BackgroundChanged(index));
        }

        completed
    }

    fn unmount(&mut self) {
        self.engine.teardown();
        self.snowfall.unmount();
        self.background.cancel();
    }

    /// The countdown engine
    pub fn engine(&self) -> &CountdownEngine {
        &self.engine
    }

    /// Latest display snapshot
    pub fn display(&self) -> &CountdownDisplay {
        self.engine.display()
    }

    /// Title line
    pub fn title(&self) -> &'static str {
        self.engine.title()
    }

    /// Year being counted down to
    pub fn target_year(&self) -> i32 {
        self.engine.target().year()
    }

    /// Background scene, 1-based
    pub fn background_index(&self) -> usize {
        self.background.index()
    }

    /// The snowfall animation
    pub fn snowfall(&self) -> &Snowfall {
        &self.snowfall
    }
}

fn push_countdown_event(events: &mut Vec<PresentationEvent>, event: CountdownEvent) {
    match event {
        CountdownEvent::Display(display) => events.push(PresentationEvent::Display(display)),
        CountdownEvent::Reached => events.push(PresentationEvent::Reached),
        CountdownEvent::Completed => {}
    }
}

/// Readiness of the celebration engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CelebrationStatus {
    /// Modules still loading
    Loading,
    /// Modules loaded; the engine may run
    Ready,
    /// The chain failed; the view stays inert
    Failed(LoadError),
}

/// The celebratory view
pub struct CelebrationView {
    status: CelebrationStatus,
    audio: Option<AudioRetry>,
}

impl CelebrationView {
    /// Loading status
    pub fn status(&self) -> &CelebrationStatus {
        &self.status
    }

    /// Whether the engine may run
    pub fn is_ready(&self) -> bool {
        self.status == CelebrationStatus::Ready
    }

    /// Ambient audio retry, if audio was started by this mount
    pub fn audio(&self) -> Option<&AudioRetry> {
        self.audio.as_ref()
    }

    fn unmount(&mut self) {
        if let Some(audio) = self.audio.as_mut() {
            audio.stop();
        }
    }
}

/// The mounted view
pub enum ActiveView {
    /// Counting down with snowfall
    Countdown(CountdownView),
    /// Celebrating; fireworks load and run
    Celebration(CelebrationView),
    /// Presentation torn down
    None,
}

type LoadResult = Result<LoadOutcome, LoadError>;

/// Builder for [`Presentation`]
pub struct PresentationBuilder {
    target: Target,
    source: Arc<dyn ModuleSource>,
    config: CelebrationConfig,
    clock: Arc<dyn Clock>,
    platform: Platform,
    document: Document,
    registry: LoaderRegistry,
    audio: Box<dyn AudioOutput>,
    force_fireworks: bool,
}

impl PresentationBuilder {
    /// Use a specific configuration
    #[must_use]
    pub fn config(mut self, config: CelebrationConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a specific clock
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use the surface's platform
    #[must_use]
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Share a document context
    #[must_use]
    pub fn document(mut self, document: Document) -> Self {
        self.document = document;
        self
    }

    /// Share a loader registry
    #[must_use]
    pub fn registry(mut self, registry: LoaderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Audio output for the celebration
    #[must_use]
    pub fn audio(mut self, audio: Box<dyn AudioOutput>) -> Self {
        self.audio = audio;
        self
    }

    /// Start in fireworks mode regardless of the target
    #[must_use]
    pub fn force_fireworks(mut self, force: bool) -> Self {
        self.force_fireworks = force;
        self
    }

    /// Decide the initial mode and mount its view
    pub fn build(self, surface: &mut dyn Surface) -> Presentation {
        let now_ms = self.clock.now_ms();
        let controller = ModeController::new(
            &self.target,
            self.force_fireworks,
            now_ms,
            self.document.clone(),
        );
        let loader = SequentialLoader::new(
            self.config.modules.clone(),
            self.registry.clone(),
            self.document.clone(),
        );
        let (loader_tx, loader_rx) = mpsc::unbounded_channel();

        let mut presentation = Presentation {
            config: self.config,
            clock: self.clock,
            target: self.target,
            document: self.document,
            platform: self.platform,
            registry: self.registry,
            loader,
            source: self.source,
            controller,
            view: ActiveView::None,
            loader_tx,
            loader_rx,
            audio: Some(self.audio),
            pending: Vec::new(),
        };

        let mut events = Vec::new();
        match presentation.controller.mode() {
            PresentationMode::Countdown => {
                let view = CountdownView::mount(
                    presentation.target,
                    &presentation.config,
                    &presentation.platform,
                    surface,
                    now_ms,
                    &mut events,
                );
                presentation.view = ActiveView::Countdown(view);
            }
            PresentationMode::Fireworks => presentation.mount_celebration(now_ms),
        }
        presentation.pending = events;
        presentation
    }
}

/// The whole presentation
pub struct Presentation {
    config: CelebrationConfig,
    clock: Arc<dyn Clock>,
    target: Target,
    document: Document,
    platform: Platform,
    registry: LoaderRegistry,
    loader: SequentialLoader,
    source: Arc<dyn ModuleSource>,
    controller: ModeController,
    view: ActiveView,
    loader_tx: mpsc::UnboundedSender<LoadResult>,
    loader_rx: mpsc::UnboundedReceiver<LoadResult>,
    audio: Option<Box<dyn AudioOutput>>,
    /// Events produced while mounting, delivered on the next step
    pending: Vec<PresentationEvent>,
}

impl Presentation {
    /// Start building a presentation for `target`, loading modules from `source`
    pub fn builder(target: Target, source: Arc<dyn ModuleSource>) -> PresentationBuilder {
        PresentationBuilder {
            target,
            source,
            config: CelebrationConfig::default(),
            clock: Arc::new(SystemClock),
            platform: Platform::new(),
            document: Document::new(),
            registry: LoaderRegistry::new(),
            audio: Box::new(SilentOutput),
            force_fireworks: false,
        }
    }

    /// Advance one frame: poll timers, apply loader results, draw snowfall
    pub fn step(&mut self, surface: &mut dyn Surface) -> Vec<PresentationEvent> {
        let now_ms = self.clock.now_ms();
        let mut events = std::mem::take(&mut self.pending);

        let completed = match &mut self.view {
            ActiveView::Countdown(view) => view.update(now_ms, &mut events),
            _ => false,
        };
        if completed {
            self.celebrate(now_ms, &mut events);
        }

        self.drain_loader(&mut events);

        if let ActiveView::Celebration(view) = &mut self.view {
            if let Some(audio) = view.audio.as_mut() {
                let before = audio.state();
                let after = audio.update(now_ms);
                if before != after {
                    events.push(PresentationEvent::Audio(after));
                }
            }
        }

        self.platform.begin_frame();
        if let ActiveView::Countdown(view) = &mut self.view {
            view.snowfall.on_frame(surface);
        }

        events
    }

    /// Switch to the celebration now (no-op when already celebrating)
    pub fn request_celebration(&mut self) -> Vec<PresentationEvent> {
        let mut events = Vec::new();
        let now_ms = self.clock.now_ms();
        self.celebrate(now_ms, &mut events);
        events
    }

    fn celebrate(&mut self, now_ms: i64, events: &mut Vec<PresentationEvent>) {
        if !self.controller.request_celebration() {
            return;
        }

        if let ActiveView::Countdown(view) = &mut self.view {
            view.unmount();
        }
        self.view = ActiveView::None;
        events.push(PresentationEvent::ModeChanged(PresentationMode::Fireworks));
        self.mount_celebration(now_ms);
    }

    fn mount_celebration(&mut self, now_ms: i64) {
        let audio = self.audio.take().map(|output| {
            AudioRetry::start(
                output,
                self.config.audio_volume,
                self.config.audio_retry_ms,
                now_ms,
            )
        });

        let status = match self.registry.state() {
            LoaderState::Loaded => CelebrationStatus::Ready,
            LoaderState::Failed(e) => CelebrationStatus::Failed(e),
            _ => CelebrationStatus::Loading,
        };

        self.view = ActiveView::Celebration(CelebrationView { status, audio });
        self.spawn_loader();
    }

    fn spawn_loader(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime, celebration modules not loaded");
            return;
        };

        let loader = self.loader.clone();
        let source = self.source.clone();
        let tx = self.loader_tx.clone();
        handle.spawn(async move {
            let result = loader.load_all(source.as_ref()).await;
            let _ = tx.send(result);
        });
    }

    fn drain_loader(&mut self, events: &mut Vec<PresentationEvent>) {
        while let Ok(result) = self.loader_rx.try_recv() {
            let status = match result {
                Ok(LoadOutcome::Loaded) => CelebrationStatus::Ready,
                Ok(LoadOutcome::AlreadyStarted) => match self.registry.state() {
                    LoaderState::Loaded => CelebrationStatus::Ready,
                    LoaderState::Failed(e) => CelebrationStatus::Failed(e),
                    // The chain that owns the latch reports separately
                    _ => continue,
                },
                Err(e) => CelebrationStatus::Failed(e),
            };

            let ActiveView::Celebration(view) = &mut self.view else {
                tracing::debug!("Loader result arrived after teardown, dropped");
                continue;
            };
            if view.status == status {
                continue;
            }
            view.status = status.clone();

            match status {
                CelebrationStatus::Ready => events.push(PresentationEvent::ModulesReady),
                CelebrationStatus::Failed(e) => events.push(PresentationEvent::ModulesFailed(e)),
                CelebrationStatus::Loading => {}
            }
        }
    }

    /// Unmount the active view and clear document markers
    pub fn teardown(&mut self) {
        match &mut self.view {
            ActiveView::Countdown(view) => view.unmount(),
            ActiveView::Celebration(view) => view.unmount(),
            ActiveView::None => {}
        }
        self.view = ActiveView::None;
        self.controller.teardown();
    }

    /// Current mode
    pub fn mode(&self) -> PresentationMode {
        self.controller.mode()
    }

    /// The mounted view
    pub fn view(&self) -> &ActiveView {
        &self.view
    }

    /// The countdown view, when mounted
    pub fn countdown(&self) -> Option<&CountdownView> {
        match &self.view {
            ActiveView::Countdown(view) => Some(view),
            _ => None,
        }
    }

    /// The celebration view, when mounted
    pub fn celebration(&self) -> Option<&CelebrationView> {
        match &self.view {
            ActiveView::Celebration(view) => Some(view),
            _ => None,
        }
    }

    /// The countdown target
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The document context
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The platform views schedule against
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// The loader registry
    pub fn registry(&self) -> &LoaderRegistry {
        &self.registry
    }

    /// Active configuration
    pub fn config(&self) -> &CelebrationConfig {
        &self.config
    }

    /// Mutable access to the audio output (user gestures)
    pub fn audio_output_mut(&mut self) -> Option<&mut dyn AudioOutput> {
        match &mut self.view {
            ActiveView::Celebration(view) => view.audio.as_mut().map(AudioRetry::output_mut),
            _ => None,
        }
    }
}

impl Drop for Presentation {
    fn drop(&mut self) {
        self.teardown();
    }
}
