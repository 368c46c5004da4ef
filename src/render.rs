//! Build resolution and the renderer.
//!
//! The renderer walks a span tree depth-first, resolving deferring
//! leaves into literal text or built subtrees and writing into a
//! [`RenderBuffer`]. Styled
//! wrappers push their paint around their child so nested coloring
//! restores the ancestor's color on exit.

use std::error::Error;
use std::fmt;

use crate::buffer::RenderBuffer;
use crate::span::{BuiltSpan, LeafSpan, SpanId, SpanKind, SpanTree};

/// Resolution hop limit: a correct span never defers more than a few
/// times, so exceeding this is a malformed span implementation rather
/// than a data problem.
pub const MAX_BUILD_HOPS: usize = 8;

/// Fatal construction errors surfaced by `format()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A leaf's `build()` chain never reached renderable content.
    BuildChainOverflow {
        /// Hops taken before giving up.
        hops: usize,
    },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuildChainOverflow { hops } => {
                write!(f, "span build() chain did not resolve within {hops} hops")
            }
        }
    }
}

impl Error for FormatError {}

/// Render a leaf, resolving deferrals. Each deferral counts against the
/// shared hop budget; a resolution may yield a structural subtree which
/// is recursed into in place.
fn render_leaf(
    leaf: &LeafSpan,
    buf: &mut RenderBuffer,
    hops: &mut usize,
) -> Result<(), FormatError> {
    if let LeafSpan::Literal(text) = leaf {
        buf.write(text);
        return Ok(());
    }
    *hops += 1;
    if *hops > MAX_BUILD_HOPS {
        return Err(FormatError::BuildChainOverflow { hops: *hops });
    }
    match leaf.build() {
        Some(built) => render_built(&built, buf, hops),
        // Only Literal declines to build, handled above.
        None => Ok(()),
    }
}

/// Render a resolution result. Built subtrees own their children, so
/// this walks them directly without touching the arena.
fn render_built(
    built: &BuiltSpan,
    buf: &mut RenderBuffer,
    hops: &mut usize,
) -> Result<(), FormatError> {
    match built {
        BuiltSpan::Leaf(leaf) => render_leaf(leaf, buf, hops),
        BuiltSpan::Styled { paint, child } => {
            let pushed = buf.push_paint(*paint);
            render_built(child, buf, hops)?;
            if pushed {
                buf.pop_paint();
            }
            Ok(())
        }
        BuiltSpan::Sequence(children) => {
            for child in children {
                render_built(child, buf, hops)?;
            }
            Ok(())
        }
    }
}

/// Render one node's subtree into the buffer.
///
/// # Errors
///
/// Returns [`FormatError::BuildChainOverflow`] when a deferring leaf
/// never resolves within [`MAX_BUILD_HOPS`].
pub fn render_span(
    tree: &SpanTree,
    id: SpanId,
    buf: &mut RenderBuffer,
) -> Result<(), FormatError> {
    match tree.kind(id) {
        SpanKind::Leaf(leaf) => {
            let mut hops = 0;
            render_leaf(leaf, buf, &mut hops)?;
        }
        SpanKind::Styled { paint, child } => {
            if let Some(child) = *child {
                let pushed = buf.push_paint(*paint);
                render_span(tree, child, buf)?;
                if pushed {
                    buf.pop_paint();
                }
            }
        }
        SpanKind::Sequence { children } => {
            for child in children.clone() {
                render_span(tree, child, buf)?;
            }
        }
        SpanKind::Slotted {
            prefix,
            body,
            suffix,
        } => {
            for slot in [*prefix, *body, *suffix].into_iter().flatten() {
                render_span(tree, slot, buf)?;
            }
        }
    }
    Ok(())
}

/// Render a subtree into a fresh buffer and return its text.
///
/// Used for content that is measured or split into lines before being
/// placed (message bodies, continuation items).
///
/// # Errors
///
/// Propagates [`FormatError`] from [`render_span`].
pub fn render_to_string(
    tree: &SpanTree,
    id: SpanId,
    colors_enabled: bool,
) -> Result<String, FormatError> {
    let mut buf = RenderBuffer::new(colors_enabled);
    render_span(tree, id, &mut buf)?;
    Ok(buf.into_string())
}
