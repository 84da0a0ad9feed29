//! Shared numeric constants for the scrapbook engine.

// ── Geometry ────────────────────────────────────────────────────

/// Smallest width or height an item may have after any resize.
pub const MIN_SIZE: f64 = 20.0;

/// Width and height given to dropped items whose payload carries no size.
pub const DEFAULT_ITEM_SIZE: f64 = 200.0;

/// Pointer-to-image ratio for crop panning.
pub const DEFAULT_CROP_PAN_SENSITIVITY: f64 = 1.0;

// ── Text ────────────────────────────────────────────────────────

/// Font size applied when a text payload does not specify one.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Lower bound of the font size control.
pub const FONT_SIZE_MIN: f64 = 10.0;

/// Upper bound of the font size control.
pub const FONT_SIZE_MAX: f64 = 100.0;

/// Content given to new text items.
pub const DEFAULT_TEXT_CONTENT: &str = "Double click to edit";

// ── Pages ───────────────────────────────────────────────────────

/// Number of pages a brand new scrapbook starts with (one spread).
pub const INITIAL_PAGE_COUNT: usize = 2;

/// How long the page-turn transition is held before the index changes.
pub const DEFAULT_FLIP_DURATION_MS: u64 = 600;

// ── History ─────────────────────────────────────────────────────

/// Maximum number of undo snapshots kept; the oldest is evicted first.
pub const DEFAULT_UNDO_LIMIT: usize = 50;
