//! Ambient Audio Retry
//!
//! The celebration plays looped ambient audio. Playback can be refused
//! (device busy, autoplay policy, no gesture yet), so an [`AudioRetry`]
//! re-attempts on a fixed period until the output reports it is playing, then
//! stops for good. A missing output is a capability gap, not an error.

use thiserror::Error;

use crate::clock::Interval;

/// Playback could not start
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// Playback refused for now; worth retrying
    #[error("playback blocked: {0}")]
    Blocked(String),

    /// No audio device or track available
    #[error("audio unavailable: {0}")]
    Unavailable(String),
}

/// An audio element the celebration can drive
pub trait AudioOutput {
    /// Whether audio is currently playing
    fn is_playing(&self) -> bool;

    /// Attempt to start playback
    fn play(&mut self) -> Result<(), PlaybackError>;

    /// Set output volume (0.0 - 1.0)
    fn set_volume(&mut self, volume: f32);

    /// Loop the track when it ends
    fn set_looping(&mut self, looping: bool);
}

/// Output used when no audio capability exists
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentOutput;

impl AudioOutput for SilentOutput {
    fn is_playing(&self) -> bool {
        false
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        Err(PlaybackError::Unavailable("no audio output".into()))
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn set_looping(&mut self, _looping: bool) {}
}

/// Retry status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryState {
    /// Still attempting on each period
    Retrying,
    /// Playback confirmed; no further attempts
    Playing,
    /// No audio capability; gave up silently
    Unavailable,
    /// Owning view torn down
    Stopped,
}

/// Bounded retry loop that starts looped playback
pub struct AudioRetry {
    output: Box<dyn AudioOutput>,
    timer: Interval,
    state: RetryState,
    attempts: u32,
}

impl AudioRetry {
    /// Configure the output and arm the retry timer
    ///
    /// The first check happens one period after `now_ms`.
    pub fn start(
        mut output: Box<dyn AudioOutput>,
        volume: f32,
        retry_ms: u64,
        now_ms: i64,
    ) -> Self {
        output.set_volume(volume.clamp(0.0, 1.0));
        output.set_looping(true);
        Self {
            output,
            timer: Interval::start(now_ms, retry_ms),
            state: RetryState::Retrying,
            attempts: 0,
        }
    }

    /// Poll the retry timer
    pub fn update(&mut self, now_ms: i64) -> RetryState {
        if self.state != RetryState::Retrying || !self.timer.poll(now_ms) {
            return self.state;
        }

        if self.output.is_playing() {
            self.timer.cancel();
            self.state = RetryState::Playing;
            tracing::info!(attempts = self.attempts, "Ambient audio playing");
            return self.state;
        }

        self.attempts += 1;
        match self.output.play() {
            Ok(()) => {}
            Err(PlaybackError::Blocked(reason)) => {
                tracing::debug!(attempt = self.attempts, %reason, "Audio playback blocked, will retry");
            }
            Err(PlaybackError::Unavailable(reason)) => {
                self.timer.cancel();
                self.state = RetryState::Unavailable;
                tracing::debug!(%reason, "Audio unavailable, ambient audio disabled");
            }
        }

        self.state
    }

    /// Stop retrying
    pub fn stop(&mut self) {
        self.timer.cancel();
        if self.state == RetryState::Retrying {
            self.state = RetryState::Stopped;
        }
    }

    /// Current state
    pub fn state(&self) -> RetryState {
        self.state
    }

    /// Play attempts made so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The driven output
    pub fn output(&self) -> &dyn AudioOutput {
        self.output.as_ref()
    }

    /// Mutable access to the driven output (user gesture hooks)
    pub fn output_mut(&mut self) -> &mut dyn AudioOutput {
        self.output.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Refuses the first `blocked` attempts, then plays
    struct FlakyOutput {
        blocked: u32,
        attempts: Arc<AtomicU32>,
        playing: bool,
        /// Last volume and looping flag set by the retry loop
        settings: Arc<Mutex<(f32, bool)>>,
    }

    impl AudioOutput for FlakyOutput {
        fn is_playing(&self) -> bool {
            self.playing
        }
        fn play(&mut self) -> Result<(), PlaybackError> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.blocked {
                return Err(PlaybackError::Blocked("no gesture".into()));
            }
            self.playing = true;
            Ok(())
        }
        fn set_volume(&mut self, volume: f32) {
            self.settings.lock().0 = volume;
        }
        fn set_looping(&mut self, looping: bool) {
            self.settings.lock().1 = looping;
        }
    }

    fn flaky(blocked: u32) -> (Box<FlakyOutput>, Arc<AtomicU32>) {
        let (output, attempts, _) = flaky_with_settings(blocked);
        (output, attempts)
    }

    fn flaky_with_settings(
        blocked: u32,
    ) -> (Box<FlakyOutput>, Arc<AtomicU32>, Arc<Mutex<(f32, bool)>>) {
        let attempts = Arc::new(AtomicU32::new(0));
        let settings = Arc::new(Mutex::new((0.0, false)));
        let output = Box::new(FlakyOutput {
            blocked,
            attempts: attempts.clone(),
            playing: false,
            settings: settings.clone(),
        });
        (output, attempts, settings)
    }

    #[test]
    fn test_start_configures_looped_playback_at_volume() {
        let (output, _, settings) = flaky_with_settings(0);
        let _retry = AudioRetry::start(output, 0.5, 200, 0);

        let (volume, looping) = *settings.lock();
        assert_eq!(volume, 0.5);
        assert!(looping);
    }

    #[test]
    fn test_retries_until_playing_then_stops() {
        let (output, attempts) = flaky(3);
        let mut retry = AudioRetry::start(output, 0.5, 200, 0);

        let mut now = 0;
        while retry.state() == RetryState::Retrying && now < 10_000 {
            now += 50;
            retry.update(now);
        }

        assert_eq!(retry.state(), RetryState::Playing);
        assert_eq!(attempts.load(Ordering::SeqCst), 4);

        // No further attempts once playing
        for _ in 0..20 {
            now += 200;
            retry.update(now);
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_start_does_not_attempt_immediately() {
        let (output, _) = flaky(0);
        let retry = AudioRetry::start(output, 0.5, 200, 0);
        assert!(!retry.output().is_playing());
        assert_eq!(retry.attempts(), 0);
    }

    #[test]
    fn test_silent_output_gives_up_quietly() {
        let mut retry = AudioRetry::start(Box::new(SilentOutput), 0.5, 200, 0);
        assert_eq!(retry.update(200), RetryState::Unavailable);
        assert_eq!(retry.update(400), RetryState::Unavailable);
        assert_eq!(retry.attempts(), 1);
    }

    #[test]
    fn test_stop_halts_retries() {
        let (output, attempts) = flaky(100);
        let mut retry = AudioRetry::start(output, 0.5, 200, 0);
        retry.update(200);
        retry.stop();
        retry.update(400);
        retry.update(600);
        assert_eq!(retry.state(), RetryState::Stopped);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
