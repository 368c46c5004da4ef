//! Record formatter.
//!
//! Glue between the record contract and the span engine: assembles the
//! initial span tree from record fields and configuration, runs the
//! transformer pipeline, then renders with the layout engine's
//! measurements. Each call builds its own tree and buffer; concurrent
//! calls never share mutable state.

use std::sync::Arc;

use time::format_description::OwnedFormatItem;

use crate::buffer::RenderBuffer;
use crate::color::{Color, Paint};
use crate::layout::{self, LayoutMode};
use crate::record::{Level, LogRecord};
use crate::render::{self, FormatError};
use crate::span::{LeafSpan, Slot, SpanId, SpanKind, SpanTree, TimeFormat};

/// A caller-supplied tree rewriter: receives the assembled tree and the
/// originating record, and may mutate the tree in place before
/// rendering. Transformers run strictly in registration order; each
/// observes the cumulative effect of all prior ones.
pub type Transformer = Box<dyn Fn(&mut SpanTree, &LogRecord) + Send + Sync>;

const DEFAULT_SEPARATOR: &str = "▶";

fn default_time_format() -> TimeFormat {
    let parsed = time::format_description::parse_owned::<2>(
        "[hour]:[minute]:[second].[subsecond digits:3]",
    )
    .or_else(|_| time::format_description::parse_owned::<2>("[hour]:[minute]:[second]"))
    .unwrap_or_else(|_| OwnedFormatItem::Literal(Vec::<u8>::new().into_boxed_slice()));
    Arc::new(parsed)
}

/// Turns log records into rendered text.
///
/// Configuration is builder-style; a configured formatter is immutable
/// and can be shared across threads.
pub struct Formatter {
    colors: bool,
    layout: LayoutMode,
    show_timestamp: bool,
    show_logger: bool,
    show_location: bool,
    show_instance: bool,
    show_level: bool,
    separator: String,
    time_format: TimeFormat,
    transformers: Vec<Transformer>,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    /// Create a formatter with colors off, aligned layout, and all
    /// metadata fields shown.
    #[must_use]
    pub fn new() -> Self {
        Self {
            colors: false,
            layout: LayoutMode::Aligned,
            show_timestamp: true,
            show_logger: true,
            show_location: true,
            show_instance: true,
            show_level: true,
            separator: DEFAULT_SEPARATOR.to_string(),
            time_format: default_time_format(),
            transformers: Vec::new(),
        }
    }

    /// Enable or disable color escapes.
    #[must_use]
    pub fn colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Set the default layout mode. A record's own override wins.
    #[must_use]
    pub fn layout(mut self, layout: LayoutMode) -> Self {
        self.layout = layout;
        self
    }

    /// Enable or disable the timestamp field.
    #[must_use]
    pub fn show_timestamp(mut self, show: bool) -> Self {
        self.show_timestamp = show;
        self
    }

    /// Enable or disable the logger-name field.
    #[must_use]
    pub fn show_logger(mut self, show: bool) -> Self {
        self.show_logger = show;
        self
    }

    /// Enable or disable the caller-location field.
    #[must_use]
    pub fn show_location(mut self, show: bool) -> Self {
        self.show_location = show;
        self
    }

    /// Enable or disable the instance tag.
    #[must_use]
    pub fn show_instance(mut self, show: bool) -> Self {
        self.show_instance = show;
        self
    }

    /// Enable or disable the level tag.
    #[must_use]
    pub fn show_level(mut self, show: bool) -> Self {
        self.show_level = show;
        self
    }

    /// Override the separator glyph.
    #[must_use]
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Override the timestamp format. An unparsable description keeps
    /// the existing format.
    #[must_use]
    pub fn time_format(mut self, format: &str) -> Self {
        if let Ok(parsed) = time::format_description::parse_owned::<2>(format) {
            self.time_format = Arc::new(parsed);
        }
        self
    }

    /// Register a transformer. Transformers run in registration order.
    #[must_use]
    pub fn transformer<F>(mut self, transformer: F) -> Self
    where
        F: Fn(&mut SpanTree, &LogRecord) + Send + Sync + 'static,
    {
        self.transformers.push(Box::new(transformer));
        self
    }

    /// Paint used for a level's tag, by severity band.
    #[must_use]
    pub fn level_paint(level: &Level) -> Paint {
        match level.severity {
            0..=14 => Paint::fg(Color::GRAY),
            15..=24 => Paint::fg(Color::BLUE),
            25..=34 => Paint::fg(Color::GREEN),
            35..=44 => Paint::fg(Color::YELLOW),
            _ => Paint::fg(Color::BRIGHT_RED),
        }
    }

    /// Format a record into a fresh string.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] when a leaf's build chain never resolves;
    /// this indicates a malformed span implementation.
    pub fn format(&self, record: &LogRecord) -> Result<String, FormatError> {
        let mut out = String::new();
        self.format_into(record, &mut out)?;
        Ok(out)
    }

    /// Format a record, appending to an existing string. Writers that
    /// reuse a buffer avoid the intermediate allocation of
    /// [`Self::format`].
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::format`].
    pub fn format_into(&self, record: &LogRecord, out: &mut String) -> Result<(), FormatError> {
        let mut tree = self.assemble(record);
        for transformer in &self.transformers {
            transformer(&mut tree, record);
        }

        let root = tree.root();
        if !matches!(tree.kind(root), SpanKind::Slotted { .. }) {
            // A transformer replaced the root wholesale; render it as-is.
            out.push_str(&render::render_to_string(&tree, root, self.colors)?);
            return Ok(());
        }

        let mode = LayoutMode::resolve(self.layout, record.layout);
        let mut buf = RenderBuffer::new(self.colors);

        if let Some(header) = tree.slot(root, Slot::Prefix) {
            render::render_span(&tree, header, &mut buf)?;
        }
        let width = buf.current_line_visible_length();
        buf.write(&self.separator);
        buf.write(" ");

        let continuation = layout::continuation_prefix(mode, width, &self.separator);

        if let Some(body) = tree.slot(root, Slot::Body) {
            let message = render::render_to_string(&tree, body, self.colors)?;
            let mut lines = message.split('\n');
            if let Some(first) = lines.next() {
                buf.write(first);
            }
            for line in lines {
                buf.newline();
                buf.write(&continuation);
                buf.write(line);
            }
        }

        if let Some(details) = tree.slot(root, Slot::Suffix) {
            for item in tree.children(details) {
                let text = render::render_to_string(&tree, item, self.colors)?;
                if text.is_empty() {
                    continue;
                }
                for line in text.split('\n') {
                    buf.newline();
                    buf.write(&continuation);
                    buf.write(line);
                }
            }
        }

        out.push_str(buf.as_str());
        Ok(())
    }

    /// Build the initial span tree for one record.
    ///
    /// Root is slotted: prefix holds the header sequence, body the
    /// message, suffix the continuation items (data entries, error
    /// text, stack frames).
    fn assemble(&self, record: &LogRecord) -> SpanTree {
        let mut tree = SpanTree::new(SpanKind::Slotted {
            prefix: None,
            body: None,
            suffix: None,
        });
        let root = tree.root();

        let header = tree.sequence();
        if self.show_timestamp {
            let ts = tree.leaf(LeafSpan::Timestamp {
                value: record.timestamp,
                format: Arc::clone(&self.time_format),
            });
            Self::push_header_item(&mut tree, header, ts, Paint::fg(Color::GRAY));
        }
        if self.show_logger
            && let Some(name) = &record.logger
        {
            let logger = tree.leaf(LeafSpan::Logger(name.clone()));
            Self::push_header_item(&mut tree, header, logger, Paint::fg(Color::CYAN));
        }
        if self.show_location
            && let Some(caller) = &record.caller
        {
            let location = tree.leaf(LeafSpan::Location(caller.clone()));
            let method = caller.clean_method();
            let item = if method.is_empty() {
                location
            } else {
                let group = tree.sequence();
                let name = tree.literal(method);
                let open = tree.literal(" (");
                let close = tree.literal(")");
                tree.append(group, name);
                tree.append(group, open);
                tree.append(group, location);
                tree.append(group, close);
                group
            };
            Self::push_header_item(&mut tree, header, item, Paint::fg(Color::GRAY));
        }
        if self.show_instance
            && let Some(name) = &record.instance
        {
            let instance = tree.leaf(LeafSpan::Instance(name.clone()));
            Self::push_header_item(&mut tree, header, instance, Paint::fg(Color::MAGENTA));
        }
        if self.show_level {
            let level = tree.leaf(LeafSpan::Level(record.level.clone()));
            Self::push_header_item(&mut tree, header, level, Self::level_paint(&record.level));
        }
        tree.set_slot(root, Slot::Prefix, Some(header));

        let message = tree.literal(record.message.clone());
        tree.set_slot(root, Slot::Body, Some(message));

        let details = tree.sequence();
        for (key, value) in &record.data {
            let field = tree.leaf(LeafSpan::Field {
                key: key.clone(),
                value: value.clone(),
            });
            let styled = tree.styled(Paint::fg(Color::GRAY));
            tree.set_child(styled, Some(field));
            tree.append(details, styled);
        }
        if let Some(error) = &record.error {
            let text = tree.literal(error.clone());
            let styled = tree.styled(Paint::fg(Color::BRIGHT_RED));
            tree.set_child(styled, Some(text));
            tree.append(details, styled);
        }
        if let Some(trace) = &record.stack_trace {
            for frame in trace.lines() {
                let text = tree.literal(frame);
                let styled = tree.styled(Paint::fg(Color::GRAY));
                tree.set_child(styled, Some(text));
                tree.append(details, styled);
            }
        }
        tree.set_slot(root, Slot::Suffix, Some(details));

        tree
    }

    /// Append a painted header item followed by a spacer.
    fn push_header_item(tree: &mut SpanTree, header: SpanId, item: SpanId, paint: Paint) {
        let styled = tree.styled(paint);
        tree.set_child(styled, Some(item));
        tree.append(header, styled);
        let spacer = tree.literal(" ");
        tree.append(header, spacer);
    }
}
