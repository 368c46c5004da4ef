//! Layout and alignment.
//!
//! Decides whether continuation lines (extra message lines, data
//! entries, error text, stack frames) are padded so their separator
//! glyph lines up under the header's, or start at column zero. Widths
//! are always measured with [`crate::ansi::visible_length`], since
//! header segments may already contain color escapes.

use crate::ansi;

/// Continuation-line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    /// Pad continuation lines so the separator glyphs form a column.
    #[default]
    Aligned,
    /// Continuation lines start at column zero with no separator.
    Plain,
}

impl LayoutMode {
    /// Resolve the mode for one record: a per-record override wins over
    /// the formatter default.
    #[must_use]
    pub fn resolve(default: Self, record_override: Option<Self>) -> Self {
        record_override.unwrap_or(default)
    }
}

/// Visible width of a rendered header line, i.e. where the separator
/// glyph will sit.
#[must_use]
pub fn header_width(rendered_header: &str) -> usize {
    ansi::visible_length(rendered_header)
}

/// The prefix written before each continuation line.
///
/// Aligned mode pads with spaces to the header width and repeats the
/// separator; plain mode produces nothing.
#[must_use]
pub fn continuation_prefix(mode: LayoutMode, header_width: usize, separator: &str) -> String {
    match mode {
        LayoutMode::Aligned => format!("{}{separator} ", " ".repeat(header_width)),
        LayoutMode::Plain => String::new(),
    }
}
