//! # spanlog
//!
//! A span-tree based log formatting toolkit.
//!
//! Log lines are modelled as trees of spans: leaves carry content
//! (literals, timestamps, levels, fields), interior spans carry color
//! or grouping. Transformers rewrite the tree before rendering, and the
//! layout engine keeps message bodies aligned to a stable column across
//! records.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use spanlog::prelude::*;
//!
//! let formatter = Formatter::new().colors(true);
//! let record = LogRecord::new(Level::info(), "ready to serve");
//! println!("{}", formatter.format(&record)?);
//! ```
//!
//! ## Core Concepts
//!
//! - **SpanTree**: The document model for one log line
//! - **LeafSpan**: Content that resolves to text at render time
//! - **Paint**: Foreground/background colors applied to a subtree
//! - **Formatter**: Assembles, transforms, lays out, and renders records
//! - **LogBridge**: Adapter feeding the `log` facade through a formatter

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod ansi;
pub mod buffer;
pub mod color;
pub mod span;
pub mod render;
pub mod layout;
pub mod record;
pub mod format;
pub mod bridge;

/// Re-exports for convenient usage
pub mod prelude {
    pub use crate::ansi::{strip_ansi_codes, visible_cell_width, visible_length};
    pub use crate::bridge::LogBridge;
    pub use crate::buffer::RenderBuffer;
    pub use crate::color::{Color, Paint};
    pub use crate::format::{Formatter, Transformer};
    pub use crate::layout::LayoutMode;
    pub use crate::record::{CallerLocation, Level, LogRecord};
    pub use crate::render::{render_to_string, FormatError};
    pub use crate::span::{
        BuiltSpan, LeafSpan, Slot, SpanContent, SpanId, SpanKind, SpanTag, SpanTree,
    };
}

// Re-export key types at crate root
pub use bridge::LogBridge;
pub use color::{Color, Paint};
pub use format::Formatter;
pub use layout::LayoutMode;
pub use record::{Level, LogRecord};
pub use render::FormatError;
pub use span::{LeafSpan, SpanId, SpanTree};
