//! Clock and Timer Primitives
//!
//! Every timed behavior in the core (countdown ticks, the completion grace
//! delay, background cycling, audio retries) is expressed as an [`Interval`]
//! or a [`Timeout`] polled against a [`Clock`] by the single application loop.
//! Nothing here sleeps or spawns; a timer only "fires" when its owner polls it.
//!
//! All times are wall-clock epoch milliseconds.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Source of wall-clock time in epoch milliseconds
pub trait Clock: Send + Sync {
    /// Current time in epoch milliseconds
    fn now_ms(&self) -> i64;
}

/// The system wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A manually advanced clock for tests and scripted demos
///
/// Clones share the same underlying time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    /// Create a clock frozen at `now_ms`
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now_ms)),
        }
    }

    /// Move the clock to an absolute time (may go backwards)
    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    /// Advance the clock by `delta_ms`
    pub fn advance(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// A cancellable periodic timer
///
/// Missed periods are coalesced into a single firing, the way a throttled
/// browser interval behaves. A backwards clock jump larger than one period
/// re-anchors the schedule instead of stalling it.
#[derive(Clone, Debug)]
pub struct Interval {
    period_ms: i64,
    next_due: i64,
    active: bool,
}

impl Interval {
    /// Start an interval whose first firing is one period after `now_ms`
    pub fn start(now_ms: i64, period_ms: u64) -> Self {
        let period_ms = (period_ms as i64).max(1);
        Self {
            period_ms,
            next_due: now_ms + period_ms,
            active: true,
        }
    }

    /// Poll the interval; returns true when a period has elapsed
    pub fn poll(&mut self, now_ms: i64) -> bool {
        if !self.active {
            return false;
        }

        if self.next_due - now_ms > self.period_ms {
            self.next_due = now_ms + self.period_ms;
            return false;
        }

        if now_ms >= self.next_due {
            self.next_due = now_ms + self.period_ms;
            return true;
        }

        false
    }

    /// Stop the interval permanently
    pub fn cancel(&mut self) {
        self.active = false;
    }

    /// Whether the interval can still fire
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Period in milliseconds
    pub fn period_ms(&self) -> u64 {
        self.period_ms as u64
    }
}

/// A cancellable one-shot timer
#[derive(Clone, Debug)]
pub struct Timeout {
    due: i64,
    active: bool,
}

impl Timeout {
    /// Arm a timeout that fires `delay_ms` after `now_ms`
    pub fn after(now_ms: i64, delay_ms: u64) -> Self {
        Self {
            due: now_ms + delay_ms as i64,
            active: true,
        }
    }

    /// Poll the timeout; returns true exactly once, when it fires
    pub fn poll(&mut self, now_ms: i64) -> bool {
        if self.active && now_ms >= self.due {
            self.active = false;
            return true;
        }
        false
    }

    /// Disarm without firing
    pub fn cancel(&mut self) {
        self.active = false;
    }

    /// Whether the timeout is still armed
    pub fn is_pending(&self) -> bool {
        self.active
    }
}
