//! New Year TUI - Terminal surface for the countdown
//!
//! This crate draws the headless `countdown-core` presentation in a
//! full-screen terminal: a countdown over rotating night scenes with falling
//! snow, then a fireworks show once the New Year arrives.
//!
//! # Architecture
//!
//! - **Compositor**: Layered rendering with z-ordering (scene, particles, panel)
//! - **Surface**: Virtual pixel canvas mapped onto terminal cells
//! - **Fireworks**: Stage context, module source and the fireworks simulation
//! - **Widgets**: Countdown panel and loading screen
//! - **Audio**: Ambient track output (behind the `audio` feature)

pub mod app;
pub mod audio;
pub mod cli;
pub mod compositor;
pub mod fireworks;
pub mod surface;
pub mod theme;
pub mod widgets;

pub use app::{App, Launch};
