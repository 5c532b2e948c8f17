//! Compositor Layer

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

use super::LayerId;

/// A single z-ordered drawing layer
pub struct Layer {
    /// Layer identity
    pub id: LayerId,
    /// Position and size on screen
    pub bounds: Rect,
    /// Stacking order; higher draws later
    pub z_index: i32,
    /// Hidden layers are skipped when compositing
    pub visible: bool,
    /// Layer contents, origin at (0, 0)
    pub buffer: Buffer,
}

impl Layer {
    /// Create an empty, visible layer
    pub fn new(id: LayerId, bounds: Rect, z_index: i32) -> Self {
        Self {
            id,
            bounds,
            z_index,
            visible: true,
            buffer: Buffer::empty(Rect::new(0, 0, bounds.width, bounds.height)),
        }
    }
}
