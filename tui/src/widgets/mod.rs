//! Widgets
//!
//! Borderless, centered panels drawn over the background layers.

mod countdown;
mod loading;

pub use countdown::CountdownPanel;
pub use loading::LoadingScreen;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use unicode_width::UnicodeWidthStr;

/// Draw `text` horizontally centered on row `y`, clipped to the area
fn set_centered(buf: &mut Buffer, area: Rect, y: u16, text: &str, style: Style) {
    if y < area.y || y >= area.y + area.height {
        return;
    }
    let width = u16::try_from(text.width()).unwrap_or(u16::MAX);
    let x = area.x + area.width.saturating_sub(width) / 2;
    buf.set_stringn(x, y, text, usize::from(area.width), style);
}
