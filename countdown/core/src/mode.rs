//! Mode Controller
//!
//! Single source of truth for which view is mounted. The mode only ever moves
//! `Countdown -> Fireworks`, at most once per process.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::target::Target;

/// Which presentation is active
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationMode {
    /// Counting down with snowfall behind the clock
    Countdown,
    /// The celebratory fireworks view
    Fireworks,
}

impl PresentationMode {
    /// Document marker applied while this mode is active
    pub fn marker(self) -> &'static str {
        match self {
            Self::Countdown => "mode-countdown",
            Self::Fireworks => "mode-fireworks",
        }
    }

    /// Markers of every mode
    pub const ALL_MARKERS: [&'static str; 2] = ["mode-countdown", "mode-fireworks"];
}

/// Owns the presentation mode and its document marker
#[derive(Debug)]
pub struct ModeController {
    mode: PresentationMode,
    document: Document,
    torn_down: bool,
}

impl ModeController {
    /// Decide the initial mode and apply its marker
    ///
    /// Starts in `Fireworks` when the override flag is set or the target has
    /// already been reached.
    pub fn new(target: &Target, force_fireworks: bool, now_ms: i64, document: Document) -> Self {
        let mode = if force_fireworks || target.has_passed(now_ms) {
            PresentationMode::Fireworks
        } else {
            PresentationMode::Countdown
        };

        tracing::info!(
            ?mode,
            force_fireworks,
            target_year = target.year(),
            "Presentation mode initialized"
        );

        let controller = Self {
            mode,
            document,
            torn_down: false,
        };
        controller.apply_marker();
        controller
    }

    /// Current mode
    pub fn mode(&self) -> PresentationMode {
        self.mode
    }

    /// Switch to the celebratory mode
    ///
    /// Returns true if this call performed the transition; repeated calls
    /// are no-ops.
    pub fn request_celebration(&mut self) -> bool {
        if self.mode == PresentationMode::Fireworks || self.torn_down {
            return false;
        }

        self.mode = PresentationMode::Fireworks;
        self.apply_marker();
        tracing::info!("Presentation mode switched to fireworks");
        true
    }

    /// Remove every mode marker; the controller ignores requests afterwards
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        Self::clear_markers(&self.document);
    }

    fn apply_marker(&self) {
        Self::clear_markers(&self.document);
        self.document.add_marker(self.mode.marker());
    }

    fn clear_markers(document: &Document) {
        for marker in PresentationMode::ALL_MARKERS {
            document.remove_marker(marker);
        }
    }
}

impl Drop for ModeController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn target() -> Target {
        Target::at_epoch_ms(1_000_000)
    }

    #[test]
    fn test_starts_in_countdown_before_target() {
        let doc = Document::new();
        let controller = ModeController::new(&target(), false, 0, doc.clone());
        assert_eq!(controller.mode(), PresentationMode::Countdown);
        assert_eq!(doc.markers(), vec!["mode-countdown".to_string()]);
    }

    #[test]
    fn test_starts_in_fireworks_at_target() {
        let controller = ModeController::new(&target(), false, 1_000_000, Document::new());
        assert_eq!(controller.mode(), PresentationMode::Fireworks);
    }

    #[test]
    fn test_override_wins_over_future_target() {
        let controller = ModeController::new(&target(), true, 0, Document::new());
        assert_eq!(controller.mode(), PresentationMode::Fireworks);
    }

    #[test]
    fn test_request_celebration_is_idempotent() {
        let doc = Document::new();
        let mut controller = ModeController::new(&target(), false, 0, doc.clone());

        assert!(controller.request_celebration());
        assert!(!controller.request_celebration());
        assert_eq!(controller.mode(), PresentationMode::Fireworks);
        assert_eq!(doc.markers(), vec!["mode-fireworks".to_string()]);
    }

    #[test]
    fn test_drop_clears_markers() {
        let doc = Document::new();
        doc.add_marker("unrelated");
        {
            let _controller = ModeController::new(&target(), false, 0, doc.clone());
            assert!(doc.has_marker("mode-countdown"));
        }
        assert_eq!(doc.markers(), vec!["unrelated".to_string()]);
    }
}
