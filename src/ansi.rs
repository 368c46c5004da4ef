//! ANSI escape sequence utilities.
//!
//! This module strips escape sequences from strings and measures the
//! "visible" width of text that may already contain color codes. Width
//! measurement is what the layout engine uses to align continuation
//! lines under a variable-width header.

use std::num::NonZeroUsize;
use std::sync::{LazyLock, Mutex};

use lru::LruCache;
use regex::Regex;
use unicode_width::UnicodeWidthChar;

/// Matches, in order of specificity: CSI sequences (including SGR color
/// codes), OSC sequences terminated by BEL or ST, and single-character
/// escapes (e.g. save/restore cursor). Anything else is left alone so
/// malformed or unknown forms pass through unchanged.
static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\x1b\[[0-9:;?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)?|\x1b[0-9@-Z\\^_]",
    )
    .expect("ANSI pattern is valid")
});

/// Minimum string length to cache (shorter strings have minimal overhead).
const CACHE_MIN_LEN: usize = 8;

/// LRU cache for `visible_length` calculations.
static VISIBLE_LEN_CACHE: LazyLock<Mutex<LruCache<String, usize>>> =
    LazyLock::new(|| Mutex::new(LruCache::new(NonZeroUsize::new(1024).expect("non-zero"))));

/// Remove ANSI escape sequences from a string.
///
/// Strips SGR color/style codes, other CSI sequences (cursor movement,
/// erase, private-mode toggles), OSC sequences, and single-character
/// escapes. Unknown or incomplete escape forms are passed through
/// unmodified; the job here is best-effort visual-width estimation, not
/// strict validation.
#[must_use]
pub fn strip_ansi_codes(text: &str) -> String {
    if !text.contains('\x1b') {
        return text.to_string();
    }
    // Removing a sequence can butt a stray ESC up against text that now
    // completes it; strip again until nothing changes. Each pass that
    // changes the string shortens it, so this terminates.
    let mut current = ANSI_RE.replace_all(text, "").into_owned();
    while current.contains('\x1b') {
        let next = ANSI_RE.replace_all(&current, "").into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Number of visible (non-escape) characters in a string.
///
/// Results for strings of 8+ bytes are cached in an LRU cache.
#[must_use]
pub fn visible_length(text: &str) -> usize {
    if text.len() < CACHE_MIN_LEN {
        return strip_ansi_codes(text).chars().count();
    }

    if let Ok(mut cache) = VISIBLE_LEN_CACHE.lock()
        && let Some(&cached) = cache.get(text)
    {
        return cached;
    }

    let count = strip_ansi_codes(text).chars().count();

    if let Ok(mut cache) = VISIBLE_LEN_CACHE.lock() {
        cache.put(text.to_string(), count);
    }

    count
}

/// Terminal cell width of the visible portion of a string.
///
/// Unlike [`visible_length`], which counts characters, this accounts for
/// wide characters (CJK, emoji) occupying two cells and zero-width
/// characters occupying none.
#[must_use]
pub fn visible_cell_width(text: &str) -> usize {
    strip_ansi_codes(text)
        .chars()
        .map(|c| c.width().unwrap_or(0))
        .sum()
}
