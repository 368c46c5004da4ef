//! Span node model.
//!
//! A span tree is a small document model built per log record: leaves
//! carry primitive content (or defer to other content via `build`),
//! wrappers carry a paint, sequences carry ordered children, and slotted
//! spans carry named child positions. Transformers mutate the tree
//! through the API here before the renderer walks it.
//!
//! Nodes live in an arena owned by [`SpanTree`]; a [`SpanId`] is an
//! index into it. The parent back-reference is navigational only: the
//! parent's child slot or list is the sole ownership edge, and every
//! mutation keeps both sides consistent. Mutations that cannot apply
//! (wrong shape, missing parent, would form a cycle) return `false` or
//! `None` and leave the tree untouched, so speculative edits are safe
//! to attempt.

use std::fmt;
use std::sync::Arc;

use time::OffsetDateTime;
use time::format_description::OwnedFormatItem;

use crate::color::Paint;
use crate::record::{CallerLocation, Level};

/// Shared timestamp format description.
pub type TimeFormat = Arc<OwnedFormatItem>;

/// Handle to a node within a [`SpanTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(usize);

/// Named child positions of a slotted span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Prefix,
    Body,
    Suffix,
}

/// Caller-supplied deferring leaf content.
///
/// `build` resolves one hop toward renderable content; it may return
/// another deferring leaf (forming a chain the renderer bounds at
/// [`crate::render::MAX_BUILD_HOPS`]) or a small structural subtree the
/// renderer recurses into.
pub trait SpanContent: fmt::Debug + Send + Sync {
    fn build(&self) -> BuiltSpan;
}

/// The result of one resolution hop.
///
/// Built spans own their children directly; they exist only for the
/// duration of a render walk and never enter the tree's arena.
#[derive(Debug, Clone)]
pub enum BuiltSpan {
    /// A leaf, possibly deferring further.
    Leaf(LeafSpan),
    /// A painted run.
    Styled { paint: Paint, child: Box<BuiltSpan> },
    /// Ordered parts rendered left to right.
    Sequence(Vec<BuiltSpan>),
}

/// Primitive leaf content.
///
/// `Literal` writes directly; every other variant defers via
/// [`LeafSpan::build`]. The built-in variants resolve to a literal in
/// one hop; a `Dynamic` may defer further or produce structure.
#[derive(Debug, Clone)]
pub enum LeafSpan {
    /// Text written verbatim.
    Literal(String),
    /// A timestamp, resolving to its formatted text.
    Timestamp {
        value: OffsetDateTime,
        format: TimeFormat,
    },
    /// A level tag, resolving to the level's label.
    Level(Level),
    /// A logger-name label.
    Logger(String),
    /// An originating-instance tag, rendered as `<name>`.
    Instance(String),
    /// A caller location, rendered as `file:line`.
    Location(CallerLocation),
    /// One structured-data entry, rendered as `key: value`.
    Field { key: String, value: String },
    /// Caller-supplied deferring content.
    Dynamic(Arc<dyn SpanContent>),
}

impl LeafSpan {
    /// Resolve one deferral hop. Returns `None` when the leaf writes
    /// primitive output directly.
    #[must_use]
    pub fn build(&self) -> Option<BuiltSpan> {
        let literal = |text: String| Some(BuiltSpan::Leaf(Self::Literal(text)));
        match self {
            Self::Literal(_) => None,
            Self::Timestamp { value, format } => literal(
                value
                    .format(format.as_ref())
                    .unwrap_or_else(|_| value.to_string()),
            ),
            Self::Level(level) => literal(level.label.clone()),
            Self::Logger(name) => literal(name.clone()),
            Self::Instance(name) => literal(format!("<{name}>")),
            Self::Location(location) => literal(location.file_line()),
            Self::Field { key, value } => literal(format!("{key}: {value}")),
            Self::Dynamic(content) => Some(content.build()),
        }
    }

    fn tag(&self) -> SpanTag {
        match self {
            Self::Literal(_) => SpanTag::Literal,
            Self::Timestamp { .. } => SpanTag::Timestamp,
            Self::Level(_) => SpanTag::Level,
            Self::Logger(_) => SpanTag::Logger,
            Self::Instance(_) => SpanTag::Instance,
            Self::Location(_) => SpanTag::Location,
            Self::Field { .. } => SpanTag::Field,
            Self::Dynamic(_) => SpanTag::Dynamic,
        }
    }
}

/// The closed set of span shapes.
#[derive(Debug, Clone)]
pub enum SpanKind {
    /// Primitive or deferring content, no structural children.
    Leaf(LeafSpan),
    /// Single optional child wrapped in a paint.
    Styled { paint: Paint, child: Option<SpanId> },
    /// Ordered, mutable list of children.
    Sequence { children: Vec<SpanId> },
    /// Fixed set of named optional child slots.
    Slotted {
        prefix: Option<SpanId>,
        body: Option<SpanId>,
        suffix: Option<SpanId>,
    },
}

/// Discriminant used by typed search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanTag {
    Literal,
    Timestamp,
    Level,
    Logger,
    Instance,
    Location,
    Field,
    Dynamic,
    Styled,
    Sequence,
    Slotted,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<SpanId>,
    kind: SpanKind,
}

/// Arena of span nodes plus the current root.
///
/// A tree and its render buffer are created fresh for each format call;
/// detached nodes stay in the arena but are unreachable from the root.
#[derive(Debug, Clone)]
pub struct SpanTree {
    nodes: Vec<Node>,
    root: SpanId,
}

impl SpanTree {
    /// Create a tree whose root is the given span.
    #[must_use]
    pub fn new(kind: SpanKind) -> Self {
        Self {
            nodes: vec![Node { parent: None, kind }],
            root: SpanId(0),
        }
    }

    /// Allocate a detached node.
    pub fn alloc(&mut self, kind: SpanKind) -> SpanId {
        let id = SpanId(self.nodes.len());
        self.nodes.push(Node { parent: None, kind });
        id
    }

    /// Allocate a detached leaf.
    pub fn leaf(&mut self, leaf: LeafSpan) -> SpanId {
        self.alloc(SpanKind::Leaf(leaf))
    }

    /// Allocate a detached literal-text leaf.
    pub fn literal(&mut self, text: impl Into<String>) -> SpanId {
        self.leaf(LeafSpan::Literal(text.into()))
    }

    /// Allocate a detached styled wrapper with an empty child slot.
    pub fn styled(&mut self, paint: Paint) -> SpanId {
        self.alloc(SpanKind::Styled { paint, child: None })
    }

    /// Allocate a detached empty sequence.
    pub fn sequence(&mut self) -> SpanId {
        self.alloc(SpanKind::Sequence {
            children: Vec::new(),
        })
    }

    /// Allocate a detached slotted span with all slots vacant.
    pub fn slotted(&mut self) -> SpanId {
        self.alloc(SpanKind::Slotted {
            prefix: None,
            body: None,
            suffix: None,
        })
    }

    /// The current root.
    #[must_use]
    pub fn root(&self) -> SpanId {
        self.root
    }

    /// Re-assign the root. Fails if the new root still has a parent.
    pub fn set_root(&mut self, id: SpanId) -> bool {
        if self.nodes[id.0].parent.is_some() {
            return false;
        }
        self.root = id;
        true
    }

    /// The shape and content of a node.
    #[must_use]
    pub fn kind(&self, id: SpanId) -> &SpanKind {
        &self.nodes[id.0].kind
    }

    /// The navigational parent back-reference.
    #[must_use]
    pub fn parent(&self, id: SpanId) -> Option<SpanId> {
        self.nodes[id.0].parent
    }

    /// Shape/content discriminant for typed search.
    #[must_use]
    pub fn tag(&self, id: SpanId) -> SpanTag {
        match &self.nodes[id.0].kind {
            SpanKind::Leaf(leaf) => leaf.tag(),
            SpanKind::Styled { .. } => SpanTag::Styled,
            SpanKind::Sequence { .. } => SpanTag::Sequence,
            SpanKind::Slotted { .. } => SpanTag::Slotted,
        }
    }

    /// Number of nodes ever allocated (detached ones included).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Splice `wrapper` into `target`'s place and re-parent `target` as
    /// its child. Returns the wrapper id on success; if `target` was the
    /// root, the wrapper is the new root.
    ///
    /// Fails (`None`) if the wrapper is the target itself, already has a
    /// parent, contains the target, or has no vacant child position
    /// (leaf, occupied styled child, occupied slotted body).
    pub fn wrap(&mut self, target: SpanId, wrapper: SpanId) -> Option<SpanId> {
        if wrapper == target
            || self.nodes[wrapper.0].parent.is_some()
            || self.is_ancestor(wrapper, target)
        {
            return None;
        }
        let can_hold = match &self.nodes[wrapper.0].kind {
            SpanKind::Leaf(_) => false,
            SpanKind::Styled { child, .. } => child.is_none(),
            SpanKind::Sequence { .. } => true,
            SpanKind::Slotted { body, .. } => body.is_none(),
        };
        if !can_hold {
            return None;
        }

        if let Some(parent) = self.nodes[target.0].parent {
            self.replace_child(parent, target, wrapper);
            self.nodes[wrapper.0].parent = Some(parent);
        }
        self.nodes[target.0].parent = Some(wrapper);
        match &mut self.nodes[wrapper.0].kind {
            SpanKind::Styled { child, .. } => *child = Some(target),
            SpanKind::Sequence { children } => children.push(target),
            SpanKind::Slotted { body, .. } => *body = Some(target),
            SpanKind::Leaf(_) => {}
        }
        if self.root == target {
            self.root = wrapper;
        }
        Some(wrapper)
    }

    /// Replace a styled wrapper with its own child, discarding the
    /// wrapper. Fails if the node has no parent, is not styled, or has
    /// no child to promote.
    pub fn unwrap(&mut self, id: SpanId) -> bool {
        let Some(parent) = self.nodes[id.0].parent else {
            return false;
        };
        let SpanKind::Styled {
            child: Some(child), ..
        } = self.nodes[id.0].kind
        else {
            return false;
        };
        self.replace_child(parent, id, child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[id.0].parent = None;
        if let SpanKind::Styled { child: slot, .. } = &mut self.nodes[id.0].kind {
            *slot = None;
        }
        true
    }

    /// Substitute `new` for `id` in `id`'s parent. Fails when `id` is
    /// rootless (callers handle root replacement via [`Self::set_root`])
    /// or when the substitution would form a cycle.
    pub fn replace_with(&mut self, id: SpanId, new: SpanId) -> bool {
        if id == new {
            return false;
        }
        let Some(parent) = self.nodes[id.0].parent else {
            return false;
        };
        if self.would_cycle(parent, new) {
            return false;
        }
        self.detach(new);
        self.replace_child(parent, id, new);
        self.nodes[new.0].parent = Some(parent);
        self.nodes[id.0].parent = None;
        true
    }

    /// Detach `id` from its parent. Fails if it has none.
    pub fn remove(&mut self, id: SpanId) -> bool {
        self.detach(id)
    }

    /// Insert `child` at the end of a sequence's child list, detaching
    /// it from any previous parent first.
    pub fn append(&mut self, parent: SpanId, child: SpanId) -> bool {
        self.attach_at(parent, child, usize::MAX)
    }

    /// Insert `child` at the start of a sequence's child list.
    pub fn prepend(&mut self, parent: SpanId, child: SpanId) -> bool {
        self.attach_at(parent, child, 0)
    }

    /// Insert `new` as the immediate previous sibling of `anchor`.
    /// Requires `anchor` to have a sequence parent.
    pub fn insert_before(&mut self, anchor: SpanId, new: SpanId) -> bool {
        self.insert_sibling(anchor, new, 0)
    }

    /// Insert `new` as the immediate next sibling of `anchor`.
    pub fn insert_after(&mut self, anchor: SpanId, new: SpanId) -> bool {
        self.insert_sibling(anchor, new, 1)
    }

    /// Set or vacate a styled wrapper's child slot. A displaced child
    /// has its parent cleared; an installed child is detached from any
    /// previous parent.
    pub fn set_child(&mut self, id: SpanId, child: Option<SpanId>) -> bool {
        if !matches!(self.nodes[id.0].kind, SpanKind::Styled { .. }) {
            return false;
        }
        if let Some(c) = child
            && self.would_cycle(id, c)
        {
            return false;
        }
        let old = match self.nodes[id.0].kind {
            SpanKind::Styled { child, .. } => child,
            _ => None,
        };
        if let Some(o) = old {
            self.nodes[o.0].parent = None;
        }
        if let Some(c) = child {
            self.detach(c);
            self.nodes[c.0].parent = Some(id);
        }
        if let SpanKind::Styled { child: slot, .. } = &mut self.nodes[id.0].kind {
            *slot = child;
        }
        true
    }

    /// Set or vacate one named slot of a slotted span.
    pub fn set_slot(&mut self, id: SpanId, slot: Slot, child: Option<SpanId>) -> bool {
        if !matches!(self.nodes[id.0].kind, SpanKind::Slotted { .. }) {
            return false;
        }
        if let Some(c) = child
            && self.would_cycle(id, c)
        {
            return false;
        }
        let old = self.slot(id, slot);
        if let Some(o) = old {
            self.nodes[o.0].parent = None;
        }
        if let Some(c) = child {
            self.detach(c);
            self.nodes[c.0].parent = Some(id);
        }
        if let SpanKind::Slotted {
            prefix,
            body,
            suffix,
        } = &mut self.nodes[id.0].kind
        {
            let target = match slot {
                Slot::Prefix => prefix,
                Slot::Body => body,
                Slot::Suffix => suffix,
            };
            *target = child;
        }
        true
    }

    /// Current occupant of a named slot, if any.
    #[must_use]
    pub fn slot(&self, id: SpanId, slot: Slot) -> Option<SpanId> {
        match &self.nodes[id.0].kind {
            SpanKind::Slotted {
                prefix,
                body,
                suffix,
            } => match slot {
                Slot::Prefix => *prefix,
                Slot::Body => *body,
                Slot::Suffix => *suffix,
            },
            _ => None,
        }
    }

    /// Replace a styled wrapper's paint.
    pub fn set_paint(&mut self, id: SpanId, paint: Paint) -> bool {
        match &mut self.nodes[id.0].kind {
            SpanKind::Styled { paint: slot, .. } => {
                *slot = paint;
                true
            }
            _ => false,
        }
    }

    /// Replace a leaf's content.
    pub fn set_leaf(&mut self, id: SpanId, leaf: LeafSpan) -> bool {
        match &mut self.nodes[id.0].kind {
            SpanKind::Leaf(slot) => {
                *slot = leaf;
                true
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Immediate children in render order. Empty for leaves.
    #[must_use]
    pub fn children(&self, id: SpanId) -> Vec<SpanId> {
        match &self.nodes[id.0].kind {
            SpanKind::Leaf(_) => Vec::new(),
            SpanKind::Styled { child, .. } => child.iter().copied().collect(),
            SpanKind::Sequence { children } => children.clone(),
            SpanKind::Slotted {
                prefix,
                body,
                suffix,
            } => [prefix, body, suffix].iter().filter_map(|s| **s).collect(),
        }
    }

    /// The sibling immediately before `id`, if any.
    #[must_use]
    pub fn prev_sibling(&self, id: SpanId) -> Option<SpanId> {
        let parent = self.nodes[id.0].parent?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        if pos == 0 {
            None
        } else {
            Some(siblings[pos - 1])
        }
    }

    /// The sibling immediately after `id`, if any.
    #[must_use]
    pub fn next_sibling(&self, id: SpanId) -> Option<SpanId> {
        let parent = self.nodes[id.0].parent?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Parent, grandparent, and so on up to the root. Empty for a node
    /// with no parent.
    #[must_use]
    pub fn ancestors(&self, id: SpanId) -> Vec<SpanId> {
        let mut out = Vec::new();
        let mut cursor = self.nodes[id.0].parent;
        while let Some(p) = cursor {
            out.push(p);
            cursor = self.nodes[p.0].parent;
        }
        out
    }

    /// The topmost ancestor of `id` (itself, when detached).
    #[must_use]
    pub fn root_of(&self, id: SpanId) -> SpanId {
        self.ancestors(id).last().copied().unwrap_or(id)
    }

    /// Pre-order walk of `id`'s subtree, `id` included.
    #[must_use]
    pub fn descendants(&self, id: SpanId) -> Vec<SpanId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            let children = self.children(node);
            for &child in children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// First node of the given tag in pre-order, self included.
    #[must_use]
    pub fn find_first(&self, from: SpanId, tag: SpanTag) -> Option<SpanId> {
        self.descendants(from)
            .into_iter()
            .find(|&id| self.tag(id) == tag)
    }

    /// All nodes of the given tag in pre-order, self included.
    #[must_use]
    pub fn find_all(&self, from: SpanId, tag: SpanTag) -> Vec<SpanId> {
        self.descendants(from)
            .into_iter()
            .filter(|&id| self.tag(id) == tag)
            .collect()
    }

    /// First node satisfying a predicate in pre-order, self included.
    pub fn find_first_where<F>(&self, from: SpanId, pred: F) -> Option<SpanId>
    where
        F: Fn(&SpanKind) -> bool,
    {
        self.descendants(from)
            .into_iter()
            .find(|&id| pred(&self.nodes[id.0].kind))
    }

    // ------------------------------------------------------------------
    // Internal rewiring
    // ------------------------------------------------------------------

    fn detach(&mut self, id: SpanId) -> bool {
        let Some(parent) = self.nodes[id.0].parent else {
            return false;
        };
        match &mut self.nodes[parent.0].kind {
            SpanKind::Leaf(_) => {}
            SpanKind::Styled { child, .. } => {
                if *child == Some(id) {
                    *child = None;
                }
            }
            SpanKind::Sequence { children } => children.retain(|&c| c != id),
            SpanKind::Slotted {
                prefix,
                body,
                suffix,
            } => {
                for slot in [prefix, body, suffix] {
                    if *slot == Some(id) {
                        *slot = None;
                    }
                }
            }
        }
        self.nodes[id.0].parent = None;
        true
    }

    fn replace_child(&mut self, parent: SpanId, old: SpanId, new: SpanId) {
        match &mut self.nodes[parent.0].kind {
            SpanKind::Leaf(_) => {}
            SpanKind::Styled { child, .. } => {
                if *child == Some(old) {
                    *child = Some(new);
                }
            }
            SpanKind::Sequence { children } => {
                if let Some(pos) = children.iter().position(|&c| c == old) {
                    children[pos] = new;
                }
            }
            SpanKind::Slotted {
                prefix,
                body,
                suffix,
            } => {
                for slot in [prefix, body, suffix] {
                    if *slot == Some(old) {
                        *slot = Some(new);
                    }
                }
            }
        }
    }

    fn is_ancestor(&self, maybe_ancestor: SpanId, node: SpanId) -> bool {
        let mut cursor = self.nodes[node.0].parent;
        while let Some(p) = cursor {
            if p == maybe_ancestor {
                return true;
            }
            cursor = self.nodes[p.0].parent;
        }
        false
    }

    /// Attaching `child` under `parent` would form a cycle.
    fn would_cycle(&self, parent: SpanId, child: SpanId) -> bool {
        parent == child || self.is_ancestor(child, parent)
    }

    fn attach_at(&mut self, parent: SpanId, child: SpanId, index: usize) -> bool {
        if !matches!(self.nodes[parent.0].kind, SpanKind::Sequence { .. }) {
            return false;
        }
        if self.would_cycle(parent, child) {
            return false;
        }
        self.detach(child);
        if let SpanKind::Sequence { children } = &mut self.nodes[parent.0].kind {
            let at = index.min(children.len());
            children.insert(at, child);
        }
        self.nodes[child.0].parent = Some(parent);
        true
    }

    fn insert_sibling(&mut self, anchor: SpanId, new: SpanId, offset: usize) -> bool {
        if anchor == new {
            return false;
        }
        let Some(parent) = self.nodes[anchor.0].parent else {
            return false;
        };
        if !matches!(self.nodes[parent.0].kind, SpanKind::Sequence { .. }) {
            return false;
        }
        if self.would_cycle(parent, new) {
            return false;
        }
        self.detach(new);
        // Position is computed after the detach; removing an earlier
        // sibling shifts the anchor's index.
        let SpanKind::Sequence { children } = &mut self.nodes[parent.0].kind else {
            return false;
        };
        let Some(pos) = children.iter().position(|&c| c == anchor) else {
            return false;
        };
        children.insert(pos + offset, new);
        self.nodes[new.0].parent = Some(parent);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn literal_text(tree: &SpanTree, id: SpanId) -> &str {
        match tree.kind(id) {
            SpanKind::Leaf(LeafSpan::Literal(text)) => text,
            other => panic!("expected literal, got {other:?}"),
        }
    }

    fn sample_tree() -> (SpanTree, SpanId, SpanId, SpanId) {
        let mut tree = SpanTree::new(SpanKind::Sequence {
            children: Vec::new(),
        });
        let root = tree.root();
        let a = tree.literal("a");
        let b = tree.literal("b");
        assert!(tree.append(root, a));
        assert!(tree.append(root, b));
        (tree, root, a, b)
    }

    #[test]
    fn test_append_sets_parent_and_order() {
        let (tree, root, a, b) = sample_tree();
        assert_eq!(tree.children(root), vec![a, b]);
        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.parent(b), Some(root));
    }

    #[test]
    fn test_prepend() {
        let (mut tree, root, a, _) = sample_tree();
        let z = tree.literal("z");
        assert!(tree.prepend(root, z));
        assert_eq!(tree.children(root)[0], z);
        assert_eq!(tree.children(root)[1], a);
    }

    #[test]
    fn test_append_to_leaf_fails() {
        let (mut tree, _, a, b) = sample_tree();
        assert!(!tree.append(a, b));
        // b untouched
        assert_eq!(tree.parent(b), Some(tree.root()));
    }

    #[test]
    fn test_move_between_parents_leaves_single_occurrence() {
        let (mut tree, root, a, _) = sample_tree();
        let other = tree.sequence();
        assert!(tree.append(other, a));

        assert!(!tree.children(root).contains(&a));
        assert_eq!(tree.children(other), vec![a]);
        assert_eq!(tree.parent(a), Some(other));
    }

    #[test]
    fn test_remove_detaches() {
        let (mut tree, root, a, b) = sample_tree();
        assert!(tree.remove(a));
        assert_eq!(tree.children(root), vec![b]);
        assert_eq!(tree.parent(a), None);
        // Detached node cannot be removed again.
        assert!(!tree.remove(a));
    }

    #[test]
    fn test_remove_root_fails() {
        let (mut tree, root, _, _) = sample_tree();
        assert!(!tree.remove(root));
    }

    #[test]
    fn test_replace_with() {
        let (mut tree, root, a, b) = sample_tree();
        let c = tree.literal("c");
        assert!(tree.replace_with(a, c));
        assert_eq!(tree.children(root), vec![c, b]);
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.parent(c), Some(root));
    }

    #[test]
    fn test_replace_with_on_root_fails() {
        let (mut tree, root, a, _) = sample_tree();
        assert!(!tree.replace_with(root, a));
        assert_eq!(tree.root(), root);
    }

    #[test]
    fn test_replace_with_sibling() {
        let (mut tree, root, a, b) = sample_tree();
        // Replacing a with its own sibling moves b into a's position.
        assert!(tree.replace_with(a, b));
        assert_eq!(tree.children(root), vec![b]);
    }

    #[test]
    fn test_wrap_inner_node() {
        let (mut tree, root, a, b) = sample_tree();
        let wrapper = tree.styled(Paint::fg(Color::RED));
        let wrapped = tree.wrap(a, wrapper);
        assert_eq!(wrapped, Some(wrapper));
        assert_eq!(tree.children(root), vec![wrapper, b]);
        assert_eq!(tree.parent(a), Some(wrapper));
        assert_eq!(tree.children(wrapper), vec![a]);
    }

    #[test]
    fn test_wrap_root_promotes_wrapper() {
        let (mut tree, root, _, _) = sample_tree();
        let wrapper = tree.styled(Paint::fg(Color::BLUE));
        assert_eq!(tree.wrap(root, wrapper), Some(wrapper));
        assert_eq!(tree.root(), wrapper);
        assert_eq!(tree.parent(root), Some(wrapper));
    }

    #[test]
    fn test_wrap_with_leaf_wrapper_fails() {
        let (mut tree, _, a, b) = sample_tree();
        assert_eq!(tree.wrap(a, b), None);
        assert_eq!(tree.parent(a), Some(tree.root()));
    }

    #[test]
    fn test_wrap_with_occupied_styled_fails() {
        let (mut tree, _, a, b) = sample_tree();
        let wrapper = tree.styled(Paint::none());
        let orphan = tree.literal("x");
        assert!(tree.set_child(wrapper, Some(orphan)));
        assert_eq!(tree.wrap(a, wrapper), None);
        let _ = b;
    }

    #[test]
    fn test_unwrap_restores_child() {
        let (mut tree, root, a, b) = sample_tree();
        let wrapper = tree.styled(Paint::fg(Color::GREEN));
        tree.wrap(a, wrapper);
        assert!(tree.unwrap(wrapper));
        assert_eq!(tree.children(root), vec![a, b]);
        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.parent(wrapper), None);
        assert!(tree.children(wrapper).is_empty());
    }

    #[test]
    fn test_unwrap_failures_are_noops() {
        let (mut tree, root, a, _) = sample_tree();
        // Not a styled node.
        assert!(!tree.unwrap(a));
        // Styled but rootless.
        let floating = tree.styled(Paint::none());
        assert!(!tree.unwrap(floating));
        // Styled with empty child slot.
        let empty = tree.styled(Paint::none());
        assert!(tree.append(root, empty));
        assert!(!tree.unwrap(empty));
    }

    #[test]
    fn test_insert_before_and_after() {
        let (mut tree, root, a, b) = sample_tree();
        let x = tree.literal("x");
        let y = tree.literal("y");
        assert!(tree.insert_before(b, x));
        assert!(tree.insert_after(b, y));
        assert_eq!(tree.children(root), vec![a, x, b, y]);
    }

    #[test]
    fn test_insert_sibling_of_root_fails() {
        let (mut tree, root, _, _) = sample_tree();
        let x = tree.literal("x");
        assert!(!tree.insert_before(root, x));
        assert!(!tree.insert_after(root, x));
        assert_eq!(tree.parent(x), None);
    }

    #[test]
    fn test_insert_moves_existing_sibling() {
        let (mut tree, root, a, b) = sample_tree();
        // Moving b before a re-orders without duplicating.
        assert!(tree.insert_before(a, b));
        assert_eq!(tree.children(root), vec![b, a]);
    }

    #[test]
    fn test_set_child_displaces_previous() {
        let mut tree = SpanTree::new(SpanKind::Styled {
            paint: Paint::none(),
            child: None,
        });
        let root = tree.root();
        let first = tree.literal("first");
        let second = tree.literal("second");
        assert!(tree.set_child(root, Some(first)));
        assert!(tree.set_child(root, Some(second)));
        assert_eq!(tree.parent(first), None);
        assert_eq!(tree.parent(second), Some(root));
        assert!(tree.set_child(root, None));
        assert_eq!(tree.parent(second), None);
    }

    #[test]
    fn test_set_slot() {
        let mut tree = SpanTree::new(SpanKind::Slotted {
            prefix: None,
            body: None,
            suffix: None,
        });
        let root = tree.root();
        let head = tree.literal("head");
        let tail = tree.literal("tail");
        assert!(tree.set_slot(root, Slot::Prefix, Some(head)));
        assert!(tree.set_slot(root, Slot::Suffix, Some(tail)));
        assert_eq!(tree.slot(root, Slot::Prefix), Some(head));
        assert_eq!(tree.slot(root, Slot::Body), None);
        assert_eq!(tree.children(root), vec![head, tail]);

        // Vacating clears the displaced node's parent.
        assert!(tree.set_slot(root, Slot::Prefix, None));
        assert_eq!(tree.parent(head), None);
    }

    #[test]
    fn test_slot_assignment_moves_node_between_slots() {
        let mut tree = SpanTree::new(SpanKind::Slotted {
            prefix: None,
            body: None,
            suffix: None,
        });
        let root = tree.root();
        let node = tree.literal("n");
        assert!(tree.set_slot(root, Slot::Prefix, Some(node)));
        assert!(tree.set_slot(root, Slot::Body, Some(node)));
        assert_eq!(tree.slot(root, Slot::Prefix), None);
        assert_eq!(tree.slot(root, Slot::Body), Some(node));
        assert_eq!(tree.children(root), vec![node]);
    }

    #[test]
    fn test_cycle_attempts_fail() {
        let mut tree = SpanTree::new(SpanKind::Sequence {
            children: Vec::new(),
        });
        let root = tree.root();
        let inner = tree.sequence();
        assert!(tree.append(root, inner));
        // A node cannot become its own descendant.
        assert!(!tree.append(inner, root));
        assert!(!tree.append(inner, inner));
        assert!(!tree.insert_before(inner, root));
        assert_eq!(tree.parent(root), None);
        assert_eq!(tree.parent(inner), Some(root));
    }

    #[test]
    fn test_siblings() {
        let (tree, _, a, b) = sample_tree();
        assert_eq!(tree.next_sibling(a), Some(b));
        assert_eq!(tree.prev_sibling(b), Some(a));
        assert_eq!(tree.prev_sibling(a), None);
        assert_eq!(tree.next_sibling(b), None);
    }

    #[test]
    fn test_siblings_of_detached_node() {
        let (mut tree, _, a, _) = sample_tree();
        tree.remove(a);
        assert_eq!(tree.prev_sibling(a), None);
        assert_eq!(tree.next_sibling(a), None);
    }

    #[test]
    fn test_ancestors_and_root_of() {
        let (mut tree, root, a, _) = sample_tree();
        let wrapper = tree.styled(Paint::none());
        tree.wrap(a, wrapper);
        assert_eq!(tree.ancestors(a), vec![wrapper, root]);
        assert_eq!(tree.ancestors(root), Vec::<SpanId>::new());
        assert_eq!(tree.root_of(a), root);
        assert_eq!(tree.root_of(root), root);
    }

    #[test]
    fn test_descendants_preorder() {
        let (mut tree, root, a, b) = sample_tree();
        let wrapper = tree.styled(Paint::none());
        tree.wrap(a, wrapper);
        assert_eq!(tree.descendants(root), vec![root, wrapper, a, b]);
    }

    #[test]
    fn test_find_first_and_all() {
        let (mut tree, root, _, _) = sample_tree();
        let ts = tree.leaf(LeafSpan::Timestamp {
            value: OffsetDateTime::UNIX_EPOCH,
            format: Arc::new(
                time::format_description::parse_owned::<2>("[hour]:[minute]").expect("valid"),
            ),
        });
        assert!(tree.append(root, ts));

        assert_eq!(tree.find_first(root, SpanTag::Timestamp), Some(ts));
        assert_eq!(tree.find_first(root, SpanTag::Slotted), None);
        assert_eq!(tree.find_all(root, SpanTag::Literal).len(), 2);
        assert_eq!(tree.find_all(root, SpanTag::Timestamp), vec![ts]);
    }

    #[test]
    fn test_find_first_where() {
        let (tree, root, _, b) = sample_tree();
        let found = tree.find_first_where(root, |kind| {
            matches!(kind, SpanKind::Leaf(LeafSpan::Literal(text)) if text == "b")
        });
        assert_eq!(found, Some(b));
    }

    #[test]
    fn test_set_leaf_and_set_paint() {
        let (mut tree, root, a, _) = sample_tree();
        assert!(tree.set_leaf(a, LeafSpan::Literal("changed".into())));
        assert_eq!(literal_text(&tree, a), "changed");
        assert!(!tree.set_leaf(root, LeafSpan::Literal("nope".into())));

        let wrapper = tree.styled(Paint::none());
        assert!(tree.set_paint(wrapper, Paint::fg(Color::RED)));
        assert!(!tree.set_paint(a, Paint::fg(Color::RED)));
    }

    #[test]
    fn test_set_root_requires_detached() {
        let (mut tree, root, a, _) = sample_tree();
        assert!(!tree.set_root(a));
        let fresh = tree.sequence();
        assert!(tree.set_root(fresh));
        assert_eq!(tree.root(), fresh);
        let _ = root;
    }

    fn built_literal(built: BuiltSpan) -> String {
        match built {
            BuiltSpan::Leaf(LeafSpan::Literal(text)) => text,
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn test_leaf_build_chain() {
        let leaf = LeafSpan::Level(Level::info());
        let built = leaf.build().expect("level defers");
        assert_eq!(built_literal(built), "INFO");
        assert!(LeafSpan::Literal("x".into()).build().is_none());
    }

    #[test]
    fn test_instance_and_field_build() {
        let instance = LeafSpan::Instance("worker-3".into()).build().expect("defers");
        assert_eq!(built_literal(instance), "<worker-3>");
        let field = LeafSpan::Field {
            key: "user".into(),
            value: "bob".into(),
        }
        .build()
        .expect("defers");
        assert_eq!(built_literal(field), "user: bob");
    }
}
