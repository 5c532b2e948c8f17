//! Background Scene Cycle
//!
//! Countdown mode rotates through a small fixed set of background scenes,
//! numbered from 1, advancing every period and wrapping after the last.

use crate::clock::Interval;

/// Rotating background scene index
#[derive(Clone, Debug)]
pub struct BackgroundCycle {
    index: usize,
    count: usize,
    timer: Interval,
}

impl BackgroundCycle {
    /// Start at scene 1
    pub fn start(count: usize, period_ms: u64, now_ms: i64) -> Self {
        Self {
            index: 1,
            count: count.max(1),
            timer: Interval::start(now_ms, period_ms),
        }
    }

    /// Poll the timer; returns the new index when the scene changes
    pub fn update(&mut self, now_ms: i64) -> Option<usize> {
        if !self.timer.poll(now_ms) {
            return None;
        }
        self.index = if self.index >= self.count { 1 } else { self.index + 1 };
        Some(self.index)
    }

    /// Current scene, 1-based
    pub fn index(&self) -> usize {
        self.index
    }

    /// Stop cycling
    pub fn cancel(&mut self) {
        self.timer.cancel();
    }
}
