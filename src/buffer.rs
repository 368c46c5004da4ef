//! Render buffer and color stack.
//!
//! A [`RenderBuffer`] accumulates one render call's output and owns the
//! stack of active paints, so a styled subtree can exit without erasing
//! an ancestor's still-active color. One buffer is created per
//! `format(record)` call and discarded after the text is extracted.

use smallvec::SmallVec;

use crate::ansi;
use crate::color::Paint;

const RESET: &str = "\x1b[0m";

/// Output accumulator with nested-color state.
#[derive(Debug)]
pub struct RenderBuffer {
    out: String,
    stack: SmallVec<[Paint; 4]>,
    colors_enabled: bool,
}

impl RenderBuffer {
    /// Create a buffer. When `colors_enabled` is false, paint pushes and
    /// pops are no-ops and no escape bytes are ever written.
    #[must_use]
    pub fn new(colors_enabled: bool) -> Self {
        Self {
            out: String::with_capacity(128),
            stack: SmallVec::new(),
            colors_enabled,
        }
    }

    /// Whether this buffer emits color escapes.
    #[must_use]
    pub fn colors_enabled(&self) -> bool {
        self.colors_enabled
    }

    /// Append literal text.
    pub fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// Append a newline.
    pub fn newline(&mut self) {
        self.out.push('\n');
    }

    /// Push a paint, emitting its SGR sequence.
    ///
    /// Returns true if an entry was actually pushed; the caller pops
    /// only in that case. Empty paints and disabled-color buffers push
    /// nothing.
    pub fn push_paint(&mut self, paint: Paint) -> bool {
        if !self.colors_enabled || paint.is_empty() {
            return false;
        }
        self.out.push_str(&paint.sgr_sequence());
        self.stack.push(paint);
        true
    }

    /// Pop the innermost paint and restore whatever was beneath it.
    ///
    /// Emits the sequence for the new top-of-stack entry (after a reset,
    /// so a popped background cannot leak), or a bare reset when the
    /// stack is empty again.
    pub fn pop_paint(&mut self) {
        if !self.colors_enabled || self.stack.pop().is_none() {
            return;
        }
        self.out.push_str(RESET);
        if let Some(surrounding) = self.stack.last() {
            self.out.push_str(&surrounding.sgr_sequence());
        }
    }

    /// Number of paints currently on the stack.
    #[must_use]
    pub fn paint_depth(&self) -> usize {
        self.stack.len()
    }

    /// The text written since the last newline.
    #[must_use]
    pub fn current_line(&self) -> &str {
        match self.out.rfind('\n') {
            Some(pos) => &self.out[pos + 1..],
            None => &self.out,
        }
    }

    /// Visible character count of the current line.
    #[must_use]
    pub fn current_line_visible_length(&self) -> usize {
        ansi::visible_length(self.current_line())
    }

    /// All accumulated text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// Consume the buffer, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.out
    }
}
