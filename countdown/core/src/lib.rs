//! Countdown Core - Headless New Year Presentation
//!
//! Everything the New Year display does that is not drawing: deciding which
//! view is active, counting down to local midnight, simulating the snowfall,
//! loading the celebration modules in order, and nudging ambient audio into
//! playing. A surface (the terminal UI, a test harness) owns the clock, the
//! [`Platform`] and a drawing [`Surface`], and calls
//! [`Presentation::step`] once per frame.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Surface                               │
//! │     terminal loop ── Platform (frames, resize) ── Surface     │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ step()
//! ┌──────────────────────────────┴───────────────────────────────┐
//! │                        Presentation                           │
//! │  ┌────────────────┐                                           │
//! │  │ ModeController │ Countdown ──(once)──> Fireworks           │
//! │  └────────────────┘                                           │
//! │  ┌───────────────────────────┐   ┌──────────────────────────┐ │
//! │  │      CountdownView        │   │     CelebrationView      │ │
//! │  │ CountdownEngine Snowfall  │   │ SequentialLoader (async) │ │
//! │  │ BackgroundCycle           │   │ AudioRetry               │ │
//! │  └───────────────────────────┘   └──────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Overview
//!
//! - [`clock`]: Clock abstraction and pull-based interval/timeout timers
//! - [`target`]: The New Year target instant
//! - [`mode`]: Presentation mode and its document marker
//! - [`countdown`]: Countdown engine and display formatting
//! - [`platform`]: Viewport, frame requests and resize listeners
//! - [`snow`]: Snowfall particle field
//! - [`loader`]: Ordered, deduplicated, once-per-process module loading
//! - [`audio`]: Ambient audio retry loop
//! - [`background`]: Background scene rotation
//! - [`document`]: Shared document context (markers, module requests)
//! - [`config`]: Layered configuration
//! - [`presentation`]: Composition root
//!
//! # No TUI Dependencies
//!
//! This crate does not depend on ratatui or crossterm.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod audio;
pub mod background;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod document;
pub mod loader;
pub mod mode;
pub mod platform;
pub mod presentation;
pub mod snow;
pub mod target;

// Re-exports for convenience
pub use audio::{AudioOutput, AudioRetry, PlaybackError, RetryState, SilentOutput};
pub use background::BackgroundCycle;
pub use clock::{Clock, Interval, ManualClock, SystemClock, Timeout};
pub use config::{CelebrationConfig, ConfigError, LaunchQuery, DEFAULT_MODULES};
pub use countdown::{
    Breakdown, CountdownDisplay, CountdownEngine, CountdownEvent, EngineState, CELEBRATION_GLYPHS,
    CELEBRATION_TITLE, COUNTDOWN_TITLE, PLACEHOLDER,
};
pub use document::Document;
pub use loader::{
    LoadError, LoadOutcome, LoaderRegistry, LoaderState, ModuleFailure, ModuleId, ModuleSource,
    SequentialLoader,
};
pub use mode::{ModeController, PresentationMode};
pub use platform::{FrameNumber, FrameRequest, Platform, ResizeListener, Viewport};
pub use presentation::{
    ActiveView, CelebrationStatus, CelebrationView, CountdownView, Presentation,
    PresentationBuilder, PresentationEvent,
};
pub use snow::{particle_count, Particle, SnowField, Snowfall, Surface};
pub use target::{Target, TargetError};
