//! Shared layout constants for the dashboard pages
//!
//! Sized for a 128x128 panel; horizontal extents scale with the frame width.

/// Left/right margin in pixels
pub const MARGIN_PX: i32 = 2;

/// Header row height, including the separator line
pub const HEADER_HEIGHT_PX: i32 = 12;

/// Top of the page title row
pub const TITLE_TOP_PX: i32 = 14;

/// Top of the first field row
pub const FIELD_ROWS_TOP_PX: i32 = 26;

/// Vertical pitch between field rows
pub const FIELD_ROW_HEIGHT_PX: i32 = 44;

/// Offset of the large value text within a field row
pub const VALUE_OFFSET_PX: i32 = 10;

/// Offset of the gauge bar within a field row
pub const GAUGE_OFFSET_PX: i32 = 32;

/// Gauge bar height in pixels
pub const GAUGE_HEIGHT_PX: u32 = 6;

/// Trend arrow size (both axes) in pixels
pub const ARROW_SIZE_PX: i32 = 10;

/// Vertical centre of the trend arrow within a field row
pub const ARROW_OFFSET_PX: i32 = 20;

/// Height of the advisory banner at the bottom of the frame
pub const ADVISORY_HEIGHT_PX: u32 = 13;

/// Advisory banner text
pub const ADVISORY_TEXT: &str = "VENTILATE!";
