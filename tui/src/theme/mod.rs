//! Theme and Colors
//!
//! Winter night palette for the countdown and a darker sky for the fireworks.
//!
//! Each background scene is a vertical gradient, top to bottom.

use ratatui::style::Color;

// ============================================================================
// Background Scenes
// ============================================================================

/// Scene 1 - deep midnight blue
pub const SCENE_MIDNIGHT: [Color; 3] = [
    Color::Rgb(8, 12, 38),
    Color::Rgb(20, 30, 72),
    Color::Rgb(38, 52, 104),
];

/// Scene 2 - aurora teal
pub const SCENE_AURORA: [Color; 3] = [
    Color::Rgb(6, 20, 30),
    Color::Rgb(12, 58, 64),
    Color::Rgb(30, 96, 88),
];

/// Scene 3 - lantern red
pub const SCENE_LANTERN: [Color; 3] = [
    Color::Rgb(30, 6, 10),
    Color::Rgb(72, 16, 22),
    Color::Rgb(112, 30, 30),
];

/// Scene 4 - violet dusk
pub const SCENE_DUSK: [Color; 3] = [
    Color::Rgb(20, 10, 36),
    Color::Rgb(48, 24, 76),
    Color::Rgb(82, 44, 110),
];

/// Gradient for a 1-based scene index; out-of-range indices wrap
pub fn scene(index: usize) -> [Color; 3] {
    match index.saturating_sub(1) % 4 {
        0 => SCENE_MIDNIGHT,
        1 => SCENE_AURORA,
        2 => SCENE_LANTERN,
        _ => SCENE_DUSK,
    }
}

// ============================================================================
// Snow
// ============================================================================

/// Flake at full opacity
pub const SNOW_BRIGHT: Color = Color::Rgb(255, 255, 255);

/// Flake at middling opacity
pub const SNOW_SOFT: Color = Color::Rgb(205, 215, 235);

/// Faint flake
pub const SNOW_FAINT: Color = Color::Rgb(140, 150, 180);

// ============================================================================
// Text
// ============================================================================

/// Title line
pub const TITLE_GOLD: Color = Color::Rgb(255, 215, 120);

/// Countdown digits
pub const DIGIT_WHITE: Color = Color::Rgb(250, 250, 250);

/// Unit labels under the digits
pub const LABEL_DIM: Color = Color::Rgb(170, 170, 190);

/// Celebration glyphs
pub const FESTIVE_RED: Color = Color::Rgb(255, 72, 72);

/// Loading header
pub const LOADING_HEADER: Color = Color::Rgb(255, 236, 200);

/// Loading status
pub const LOADING_STATUS: Color = Color::Rgb(150, 150, 170);

/// Error red
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// System/dim text
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

// ============================================================================
// Fireworks
// ============================================================================

/// Night sky behind the fireworks when no screen module set one
pub const FIREWORKS_SKY: Color = Color::Rgb(5, 6, 15);

/// Rocket trail
pub const ROCKET_TRAIL: Color = Color::Rgb(255, 200, 140);

/// Parse `#rrggbb`; anything else is `None`
pub fn parse_hex(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(digits, 16).ok()?;
    Some(Color::Rgb(
        ((value >> 16) & 0xff) as u8,
        ((value >> 8) & 0xff) as u8,
        (value & 0xff) as u8,
    ))
}

/// Scale an RGB color toward black; other colors are returned unchanged
pub fn dim(color: Color, factor: f32) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let f = factor.clamp(0.0, 1.0);
            Color::Rgb(
                (f32::from(r) * f) as u8,
                (f32::from(g) * f) as u8,
                (f32::from(b) * f) as u8,
            )
        }
        other => other,
    }
}
