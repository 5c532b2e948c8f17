//! New Year TUI Entry Point
//!
//! Counts down to the next local New Year, then celebrates.
//!
//! Usage:
//!   newyear [OPTIONS]
//!
//! Options:
//!   --fireworks           Skip straight to the fireworks
//!   --query <QUERY>       Launch options in query form (`fireworks=1`)
//!   --config <FILE>       Configuration file
//!   --in-seconds <N>      Count down N seconds instead of to New Year
//!   --assets <DIR>        Directory holding the fireworks modules
//!   --audio <FILE>        Ambient audio track
//!
//! Logging goes to `NEWYEAR_LOG_FILE` when set (stderr otherwise), filtered
//! by `RUST_LOG`.

use std::fs::File;
use std::io;
use std::panic;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use countdown_core::{CelebrationConfig, Clock, SystemClock};
use newyear_tui::cli::Args;
use newyear_tui::{audio, App, Launch};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging()?;

    // Check if we have a TTY before attempting initialization
    use std::io::IsTerminal;

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: newyear requires a terminal (TTY)");
        eprintln!();
        eprintln!("This usually means:");
        eprintln!("  - Running in a non-interactive environment (CI, container)");
        eprintln!("  - SSH without -t flag");
        eprintln!("  - Piped stdin/stdout");
        std::process::exit(1);
    }

    let config = args.apply(
        CelebrationConfig::load(args.config.as_deref()).context("Failed to load configuration")?,
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let target = args
        .target(clock.as_ref())
        .context("Failed to compute the countdown target")?;
    tracing::info!(
        target_year = target.year(),
        target_ms = target.epoch_ms(),
        "Starting New Year display"
    );

    let launch = Launch {
        audio: audio::open_output(config.audio_path.as_deref()),
        config,
        target,
        force_fireworks: args.force_fireworks(),
        clock,
    };

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal before printing panic
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the app
    let result = run_app(&mut terminal, launch).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Propagate any errors
    result
}

fn init_logging() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env();

    match std::env::var_os("NEWYEAR_LOG_FILE") {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create log file: {path:?}"))?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(Arc::new(file)),
                )
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_writer(io::stderr),
                )
                .with(filter)
                .init();
        }
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    launch: Launch,
) -> anyhow::Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(launch, (size.width, size.height));
    app.run(terminal).await
}
