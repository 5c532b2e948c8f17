//! Cell Canvas
//!
//! A virtual pixel surface mapped onto terminal cells. Drawing happens in
//! surface pixels (each cell covers `cell_width x cell_height` of them), and
//! every cell keeps the strongest mark that landed in it. Rendering turns
//! marks into glyphs sized by radius and colors dimmed by opacity.

use ratatui::buffer::Buffer;
use ratatui::style::{Color, Style};

use countdown_core::{Surface, Viewport};

use crate::theme;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Mark {
    radius: f32,
    alpha: f32,
    color: Color,
}

impl Mark {
    fn strength(&self) -> f32 {
        self.radius * self.alpha
    }

    fn glyph(&self) -> &'static str {
        if self.radius < 1.75 {
            "·"
        } else if self.radius < 2.75 {
            "•"
        } else {
            "*"
        }
    }
}

/// Pixel surface backed by a grid of terminal cells
#[derive(Clone, Debug)]
pub struct CellCanvas {
    cell_width: f32,
    cell_height: f32,
    cols: u16,
    rows: u16,
    cells: Vec<Option<Mark>>,
}

impl CellCanvas {
    /// Empty canvas with the given cell metrics
    pub fn new(cell_width: u16, cell_height: u16) -> Self {
        Self {
            cell_width: f32::from(cell_width.max(1)),
            cell_height: f32::from(cell_height.max(1)),
            cols: 0,
            rows: 0,
            cells: Vec::new(),
        }
    }

    /// Pixel viewport covering `cols x rows` cells
    pub fn viewport_for(&self, cols: u16, rows: u16) -> Viewport {
        Viewport::new(
            f32::from(cols) * self.cell_width,
            f32::from(rows) * self.cell_height,
        )
    }

    /// Columns covered
    pub fn cols(&self) -> u16 {
        self.cols
    }

    /// Rows covered
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Number of cells holding a mark
    pub fn marked_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Draw a colored dot; off-canvas points are dropped
    pub fn plot(&mut self, x: f32, y: f32, radius: f32, alpha: f32, color: Color) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let col = (x / self.cell_width) as usize;
        let row = (y / self.cell_height) as usize;
        if col >= usize::from(self.cols) || row >= usize::from(self.rows) {
            return;
        }

        let mark = Mark {
            radius,
            alpha: alpha.clamp(0.0, 1.0),
            color,
        };
        let slot = &mut self.cells[row * usize::from(self.cols) + col];
        if slot.map_or(true, |existing| mark.strength() > existing.strength()) {
            *slot = Some(mark);
        }
    }

    /// Write marks into a buffer whose area matches the canvas
    pub fn render(&self, buf: &mut Buffer) {
        let area = buf.area;
        for row in 0..self.rows.min(area.height) {
            for col in 0..self.cols.min(area.width) {
                let idx = usize::from(row) * usize::from(self.cols) + usize::from(col);
                let Some(mark) = self.cells[idx] else {
                    continue;
                };
                let color = theme::dim(mark.color, 0.35 + 0.65 * mark.alpha);
                buf.set_string(
                    area.x + col,
                    area.y + row,
                    mark.glyph(),
                    Style::default().fg(color),
                );
            }
        }
    }
}

impl Surface for CellCanvas {
    fn resize(&mut self, viewport: Viewport) {
        self.cols = (viewport.width.max(0.0) / self.cell_width).ceil() as u16;
        self.rows = (viewport.height.max(0.0) / self.cell_height).ceil() as u16;
        self.cells = vec![None; usize::from(self.cols) * usize::from(self.rows)];
    }

    fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, alpha: f32) {
        let color = if alpha > 0.65 {
            theme::SNOW_BRIGHT
        } else if alpha > 0.35 {
            theme::SNOW_SOFT
        } else {
            theme::SNOW_FAINT
        };
        self.plot(x, y, radius, alpha, color);
    }
}
