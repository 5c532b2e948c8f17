//! Countdown Engine
//!
//! Publishes a live day/hour/minute/second display for a [`Target`] and emits
//! a completion signal exactly once.
//!
//! The engine is a two-state machine: `Running -> Completed` on the first
//! tick that observes a non-positive gap, with no way back. The periodic
//! tick keeps firing after completion until the owning view is torn down, so
//! the state (not the timer) is what guarantees a single completion.
//!
//! Completion is not delivered in the tick that detects it. A grace
//! [`Timeout`] is armed instead, so the terminal message is visible before the
//! view swaps.

use std::fmt;

use crate::clock::{Interval, Timeout};
use crate::target::Target;

const SECOND_MS: i64 = 1000;
const MINUTE_MS: i64 = SECOND_MS * 60;
const HOUR_MS: i64 = MINUTE_MS * 60;
const DAY_MS: i64 = HOUR_MS * 24;

/// Placeholder shown before the first tick
pub const PLACEHOLDER: &str = "--";

/// Glyphs shown once the countdown completes
pub const CELEBRATION_GLYPHS: [&str; 4] = ["新", "年", "快", "乐"];

/// Title shown while counting down
pub const COUNTDOWN_TITLE: &str = "秃子喵提醒你，距离新年还有";

/// Title shown once the countdown completes
pub const CELEBRATION_TITLE: &str = "Happy New Year";

/// Integer decomposition of a positive gap
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Breakdown {
    /// Whole days
    pub days: i64,
    /// Hours past the last whole day (0-23)
    pub hours: i64,
    /// Minutes past the last whole hour (0-59)
    pub minutes: i64,
    /// Seconds past the last whole minute (0-59)
    pub seconds: i64,
}

impl Breakdown {
    /// Decompose a gap in milliseconds
    ///
    /// Each component is taken modulo the next larger unit; sub-second
    /// remainder is dropped.
    pub fn from_gap_ms(gap_ms: i64) -> Self {
        Self {
            days: gap_ms / DAY_MS,
            hours: (gap_ms % DAY_MS) / HOUR_MS,
            minutes: (gap_ms % HOUR_MS) / MINUTE_MS,
            seconds: (gap_ms % MINUTE_MS) / SECOND_MS,
        }
    }

    /// Milliseconds represented by the whole components
    pub fn total_ms(&self) -> i64 {
        self.days * DAY_MS + self.hours * HOUR_MS + self.minutes * MINUTE_MS + self.seconds * SECOND_MS
    }
}

/// Four-field display snapshot; each tick replaces it wholesale
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountdownDisplay {
    /// Days field
    pub days: String,
    /// Hours field
    pub hours: String,
    /// Minutes field
    pub minutes: String,
    /// Seconds field
    pub seconds: String,
}

impl CountdownDisplay {
    /// Snapshot shown before the first tick
    pub fn placeholder() -> Self {
        Self {
            days: PLACEHOLDER.to_string(),
            hours: PLACEHOLDER.to_string(),
            minutes: PLACEHOLDER.to_string(),
            seconds: PLACEHOLDER.to_string(),
        }
    }

    /// Snapshot shown after completion
    pub fn celebration() -> Self {
        let [d, h, m, s] = CELEBRATION_GLYPHS;
        Self {
            days: d.to_string(),
            hours: h.to_string(),
            minutes: m.to_string(),
            seconds: s.to_string(),
        }
    }

    /// Plain decimal rendering, no zero-padding
    pub fn from_breakdown(b: Breakdown) -> Self {
        Self {
            days: b.days.to_string(),
            hours: b.hours.to_string(),
            minutes: b.minutes.to_string(),
            seconds: b.seconds.to_string(),
        }
    }

    /// Fields in display order
    pub fn fields(&self) -> [&str; 4] {
        [&self.days, &self.hours, &self.minutes, &self.seconds]
    }
}

impl Default for CountdownDisplay {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl fmt::Display for CountdownDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.days, self.hours, self.minutes, self.seconds)
    }
}

/// Engine state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// Not yet ticked
    Idle,
    /// Ticking toward the target
    Running,
    /// Target reached; terminal display published
    Completed,
    /// Owning view unmounted; nothing fires any more
    TornDown,
}

/// Signals emitted by [`CountdownEngine::update`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CountdownEvent {
    /// A new display snapshot was published
    Display(CountdownDisplay),
    /// The target was reached; the terminal display is up
    Reached,
    /// Grace delay elapsed; the owner should switch to the celebration
    Completed,
}

/// Countdown engine for a fixed target
#[derive(Debug)]
pub struct CountdownEngine {
    target: Target,
    state: EngineState,
    tick_ms: u64,
    grace_ms: u64,
    ticker: Option<Interval>,
    completion: Option<Timeout>,
    display: CountdownDisplay,
    title: &'static str,
}

impl CountdownEngine {
    /// Create an idle engine
    pub fn new(target: Target, tick_ms: u64, grace_ms: u64) -> Self {
        Self {
            target,
            state: EngineState::Idle,
            tick_ms,
            grace_ms,
            ticker: None,
            completion: None,
            display: CountdownDisplay::placeholder(),
            title: COUNTDOWN_TITLE,
        }
    }

    /// Publish the first snapshot immediately and start the periodic tick
    pub fn start(&mut self, now_ms: i64) -> Vec<CountdownEvent> {
        if self.state != EngineState::Idle {
            return Vec::new();
        }
        self.state = EngineState::Running;
        self.ticker = Some(Interval::start(now_ms, self.tick_ms));

        let mut events = Vec::new();
        self.recompute(now_ms, &mut events);
        events
    }

    /// Poll timers; recomputes on each tick and delivers completion after the grace delay
    ///
    /// The grace timeout is polled before the ticker, so a completion armed
    /// by this call's tick can only fire on a later call.
    pub fn update(&mut self, now_ms: i64) -> Vec<CountdownEvent> {
        let mut events = Vec::new();

        if self.completion.as_mut().is_some_and(|t| t.poll(now_ms)) {
            self.completion = None;
            tracing::info!(target_year = self.target.year(), "Countdown completion delivered");
            events.push(CountdownEvent::Completed);
        }

        if self.ticker.as_mut().is_some_and(|t| t.poll(now_ms)) {
            self.recompute(now_ms, &mut events);
        }

        events
    }

    fn recompute(&mut self, now_ms: i64, events: &mut Vec<CountdownEvent>) {
        let gap = self.target.remaining_ms(now_ms);

        if gap <= 0 {
            if self.state == EngineState::Running {
                self.state = EngineState::Completed;
                self.title = CELEBRATION_TITLE;
                self.display = CountdownDisplay::celebration();
                self.completion = Some(Timeout::after(now_ms, self.grace_ms));

                tracing::info!(gap_ms = gap, "Countdown reached target");
                events.push(CountdownEvent::Display(self.display.clone()));
                events.push(CountdownEvent::Reached);
            }
            return;
        }

        // A clock jumping back after completion only changes the display;
        // the state machine never leaves Completed.
        self.display = CountdownDisplay::from_breakdown(Breakdown::from_gap_ms(gap));
        events.push(CountdownEvent::Display(self.display.clone()));
    }

    /// Stop ticking and cancel a pending completion
    pub fn teardown(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
        }
        if let Some(mut completion) = self.completion.take() {
            completion.cancel();
            tracing::debug!("Pending countdown completion cancelled by teardown");
        }
        self.state = EngineState::TornDown;
    }

    /// Current state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Latest published snapshot
    pub fn display(&self) -> &CountdownDisplay {
        &self.display
    }

    /// Current title line
    pub fn title(&self) -> &'static str {
        self.title
    }

    /// The target being counted down to
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Whether a completion is armed but not yet delivered
    pub fn completion_pending(&self) -> bool {
        self.completion.as_ref().is_some_and(Timeout::is_pending)
    }
}

impl Drop for CountdownEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}
