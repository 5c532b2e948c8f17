//! Loading Screen
//!
//! Shown by the celebration view until its modules are ready. A failed load
//! keeps the screen up with the error underneath.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Widget;
use textwrap::wrap;

use countdown_core::CelebrationStatus;

use super::set_centered;
use crate::theme;

pub const LOADING_HEADER: &str = "Loading";
pub const LOADING_STATUS: &str = "Assembling Shells";

/// The celebration loading screen
pub struct LoadingScreen<'a> {
    status: &'a CelebrationStatus,
}

impl<'a> LoadingScreen<'a> {
    pub fn new(status: &'a CelebrationStatus) -> Self {
        Self { status }
    }
}

impl Widget for LoadingScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 2 {
            return;
        }

        let mid = area.y + area.height / 2;
        set_centered(
            buf,
            area,
            mid.saturating_sub(1),
            LOADING_HEADER,
            Style::default()
                .fg(theme::LOADING_HEADER)
                .add_modifier(Modifier::BOLD),
        );
        set_centered(
            buf,
            area,
            mid,
            LOADING_STATUS,
            Style::default().fg(theme::LOADING_STATUS),
        );

        if let CelebrationStatus::Failed(error) = self.status {
            let width = usize::from(area.width.saturating_sub(4)).max(10);
            let message = error.to_string();
            for (i, line) in wrap(&message, width).iter().enumerate() {
                let y = mid + 2 + i as u16;
                set_centered(buf, area, y, line, Style::default().fg(theme::ERROR_RED));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use countdown_core::{LoadError, ModuleFailure, ModuleId};

    fn text(buf: &Buffer) -> String {
        buf.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_shows_header_and_status() {
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        LoadingScreen::new(&CelebrationStatus::Loading).render(area, &mut buf);

        let text = text(&buf);
        assert!(text.contains("Loading"));
        assert!(text.contains("Assembling Shells"));
    }

    #[test]
    fn test_failure_names_module() {
        let status = CelebrationStatus::Failed(LoadError {
            module: ModuleId::new("fireworks/stage.toml"),
            reason: ModuleFailure::Fetch("gone".into()),
        });
        let area = Rect::new(0, 0, 80, 10);
        let mut buf = Buffer::empty(area);
        LoadingScreen::new(&status).render(area, &mut buf);

        assert!(text(&buf).contains("fireworks/stage.toml"));
    }
}
