//! Color constants for the depot dashboard.

use ratatui::style::Color;

pub const HEADER_FG: Color = Color::White;
pub const HEADER_BG: Color = Color::DarkGray;
pub const FOOTER_FG: Color = Color::DarkGray;
pub const DRIVEWAY_FG: Color = Color::DarkGray;
pub const AREA_FG: Color = Color::Cyan;

/// Color for an area occupancy peak relative to its capacity; `None` when
/// the area's capacity is unknown to the dashboard.
pub fn occupancy_color(peak: u32, capacity: Option<u32>) -> Color {
    match capacity {
        Some(cap) if cap > 0 && peak >= cap => Color::Red,
        Some(cap) if cap > 0 && peak * 10 >= cap * 8 => Color::Yellow,
        _ => Color::Green,
    }
}
