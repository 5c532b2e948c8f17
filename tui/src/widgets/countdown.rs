//! Countdown Panel
//!
//! Title line with the target year, then the four countdown fields side by
//! side with their unit labels underneath.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Widget;

use countdown_core::CountdownDisplay;

use super::set_centered;
use crate::theme;

/// Unit labels, in display order
const LABELS: [&str; 4] = ["天", "时", "分", "秒"];

/// Widest a single field column gets
const MAX_COLUMN_WIDTH: u16 = 12;

/// The countdown panel
pub struct CountdownPanel<'a> {
    title: &'a str,
    year: i32,
    display: &'a CountdownDisplay,
    celebrating: bool,
}

impl<'a> CountdownPanel<'a> {
    pub fn new(title: &'a str, year: i32, display: &'a CountdownDisplay) -> Self {
        Self {
            title,
            year,
            display,
            celebrating: false,
        }
    }

    /// Render the fields as celebration glyphs
    pub fn celebrating(mut self, celebrating: bool) -> Self {
        self.celebrating = celebrating;
        self
    }
}

impl Widget for CountdownPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 8 || area.height < 5 {
            return;
        }

        let mid = area.y + area.height / 2;
        let title = format!("{} {}", self.title, self.year);
        set_centered(
            buf,
            area,
            mid.saturating_sub(2),
            &title,
            Style::default().fg(theme::TITLE_GOLD).add_modifier(Modifier::BOLD),
        );

        let column = (area.width / 4).min(MAX_COLUMN_WIDTH);
        let left = area.x + area.width.saturating_sub(column * 4) / 2;
        let value_style = if self.celebrating {
            Style::default().fg(theme::FESTIVE_RED).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme::DIGIT_WHITE).add_modifier(Modifier::BOLD)
        };
        let label_style = Style::default().fg(theme::LABEL_DIM);

        for (i, value) in self.display.fields().into_iter().enumerate() {
            let cell = Rect::new(left + column * i as u16, area.y, column, area.height);
            set_centered(buf, cell, mid, value, value_style);
            if !self.celebrating {
                set_centered(buf, cell, mid + 2, LABELS[i], label_style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect::<String>()
    }

    #[test]
    fn test_renders_title_and_fields() {
        let display = CountdownDisplay {
            days: "12".into(),
            hours: "3".into(),
            minutes: "45".into(),
            seconds: "6".into(),
        };
        let area = Rect::new(0, 0, 48, 9);
        let mut buf = Buffer::empty(area);
        CountdownPanel::new("Countdown", 2026, &display).render(area, &mut buf);

        assert!(row(&buf, 2).contains("Countdown 2026"));
        let digits = row(&buf, 4);
        for value in ["12", "3", "45", "6"] {
            assert!(digits.contains(value), "missing {value} in {digits:?}");
        }
    }

    #[test]
    fn test_celebration_hides_labels() {
        let display = CountdownDisplay::celebration();
        let area = Rect::new(0, 0, 48, 9);
        let mut buf = Buffer::empty(area);
        CountdownPanel::new("Happy New Year", 2026, &display)
            .celebrating(true)
            .render(area, &mut buf);

        assert!(row(&buf, 6).trim().is_empty());
    }

    #[test]
    fn test_tiny_area_draws_nothing() {
        let display = CountdownDisplay::placeholder();
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        CountdownPanel::new("Countdown", 2026, &display).render(area, &mut buf);
        assert!(row(&buf, 0).trim().is_empty());
    }
}
