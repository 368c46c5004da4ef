//! Property-based tests for spanlog.
//!
//! Uses proptest to verify invariants with generated inputs: ANSI
//! stripping is idempotent, visible length never counts escapes, paints
//! never leak into measurements, and tree surgery preserves structure.

use proptest::prelude::*;

use spanlog::ansi::{strip_ansi_codes, visible_length};
use spanlog::color::{Color, Paint};
use spanlog::format::Formatter;
use spanlog::record::{Level, LogRecord};
use spanlog::render::render_to_string;
use spanlog::span::SpanTree;

// ============================================================================
// Custom Strategies
// ============================================================================

/// Plain printable text, no escape characters.
fn plain_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!?_-]{0,40}"
}

/// A single well-formed SGR sequence.
fn sgr_sequence() -> impl Strategy<Value = String> {
    prop::collection::vec(0u16..=255, 0..4)
        .prop_map(|params| {
            let body: Vec<String> = params.iter().map(ToString::to_string).collect();
            format!("\x1b[{}m", body.join(";"))
        })
}

/// Text interleaving plain chunks with SGR sequences, stray ESC bytes,
/// and truncated sequence openers. Stripping a well-formed sequence can
/// leave a stray ESC adjacent to text that completes it, so stripping
/// must be tested against these malformed fragments too.
fn ansi_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            4 => plain_text(),
            4 => sgr_sequence(),
            1 => Just("\x1b".to_string()),
            1 => Just("\x1b[".to_string()),
        ],
        0..8,
    )
    .prop_map(|chunks| chunks.concat())
}

/// An arbitrary single-plane paint.
fn any_paint() -> impl Strategy<Value = Paint> {
    (any::<u8>(), prop::option::of(any::<u8>())).prop_map(|(fg, bg)| {
        let paint = Paint::fg(Color::new(fg));
        match bg {
            Some(bg) => paint.on(Color::new(bg)),
            None => paint,
        }
    })
}

// ============================================================================
// ANSI stripping properties
// ============================================================================

proptest! {
    #[test]
    fn prop_strip_is_idempotent(text in ansi_text()) {
        let once = strip_ansi_codes(&text);
        let twice = strip_ansi_codes(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_plain_text_passes_through(text in plain_text()) {
        prop_assert_eq!(strip_ansi_codes(&text), text.clone());
        prop_assert_eq!(visible_length(&text), text.chars().count());
    }

    #[test]
    fn prop_visible_length_never_exceeds_char_count(text in ansi_text()) {
        prop_assert!(visible_length(&text) <= text.chars().count());
    }

    #[test]
    fn prop_sgr_contributes_zero_visible_length(
        text in plain_text(),
        sgr in sgr_sequence(),
    ) {
        let wrapped = format!("{sgr}{text}\x1b[0m");
        prop_assert_eq!(visible_length(&wrapped), text.chars().count());
    }

    #[test]
    fn prop_paint_sequences_strip_away(text in plain_text(), paint in any_paint()) {
        let wrapped = format!("{}{text}\x1b[0m", paint.sgr_sequence());
        prop_assert_eq!(strip_ansi_codes(&wrapped), text);
    }
}

// ============================================================================
// Render properties
// ============================================================================

proptest! {
    #[test]
    fn prop_colored_render_strips_to_plain_render(
        text in plain_text(),
        paint in any_paint(),
    ) {
        let mut tree = SpanTree::new(spanlog::span::SpanKind::Sequence {
            children: Vec::new(),
        });
        let root = tree.root();
        let leaf = tree.literal(text.clone());
        let styled = tree.styled(paint);
        tree.set_child(styled, Some(leaf));
        tree.append(root, styled);

        let plain = render_to_string(&tree, root, false).expect("renders");
        let colored = render_to_string(&tree, root, true).expect("renders");
        prop_assert_eq!(&plain, &text);
        prop_assert_eq!(strip_ansi_codes(&colored), plain);
    }

    #[test]
    fn prop_formatter_colors_only_add_escapes(message in plain_text()) {
        let record = LogRecord::new(Level::info(), message).logger("svc");
        let base = Formatter::new().show_timestamp(false).show_location(false);
        let plain = base.format(&record).expect("formats");

        let base = Formatter::new()
            .show_timestamp(false)
            .show_location(false)
            .colors(true);
        let colored = base.format(&record).expect("formats");

        prop_assert!(!plain.contains('\x1b'));
        prop_assert_eq!(strip_ansi_codes(&colored), plain);
    }
}

// ============================================================================
// Tree surgery properties
// ============================================================================

proptest! {
    #[test]
    fn prop_wrap_then_unwrap_restores_parent(
        paint in any_paint(),
        text in plain_text(),
    ) {
        let mut tree = SpanTree::new(spanlog::span::SpanKind::Sequence {
            children: Vec::new(),
        });
        let root = tree.root();
        let leaf = tree.literal(text);
        tree.append(root, leaf);

        let before = render_to_string(&tree, root, true).expect("renders");

        let wrapper = tree.styled(paint);
        prop_assert_eq!(tree.wrap(leaf, wrapper), Some(wrapper));
        prop_assert_eq!(tree.parent(leaf), Some(wrapper));
        prop_assert_eq!(tree.parent(wrapper), Some(root));

        prop_assert!(tree.unwrap(wrapper));
        prop_assert_eq!(tree.parent(leaf), Some(root));
        prop_assert_eq!(tree.children(root), vec![leaf]);

        let after = render_to_string(&tree, root, true).expect("renders");
        prop_assert_eq!(before, after);
    }

    #[test]
    fn prop_find_first_locates_any_buried_leaf(
        filler in 0usize..5,
        depth in 0usize..4,
        paint in any_paint(),
    ) {
        use spanlog::record::Level;
        use spanlog::span::{LeafSpan, SpanTag};

        let mut tree = SpanTree::new(spanlog::span::SpanKind::Sequence {
            children: Vec::new(),
        });
        let root = tree.root();
        for number in 0..filler {
            let leaf = tree.literal(format!("filler {number}"));
            tree.append(root, leaf);
        }

        // Bury a level leaf under `depth` styled wrappers.
        let target = tree.leaf(LeafSpan::Level(Level::info()));
        tree.append(root, target);
        let mut buried = target;
        for _ in 0..depth {
            let wrapper = tree.styled(paint);
            tree.wrap(buried, wrapper);
            buried = wrapper;
        }

        prop_assert_eq!(tree.find_first(root, SpanTag::Level), Some(target));
        prop_assert_eq!(tree.find_first(root, SpanTag::Timestamp), None);
    }

    #[test]
    fn prop_moves_keep_each_node_single_parented(
        count in 2usize..6,
        moves in prop::collection::vec((0usize..6, 0usize..6), 0..12),
    ) {
        let mut tree = SpanTree::new(spanlog::span::SpanKind::Sequence {
            children: Vec::new(),
        });
        let root = tree.root();
        let groups: Vec<_> = (0..count).map(|_| tree.sequence()).collect();
        for &group in &groups {
            tree.append(root, group);
        }
        let leaf = tree.literal("payload");
        tree.append(groups[0], leaf);

        for (from, to) in moves {
            let (from, to) = (from % count, to % count);
            // append detaches from the previous parent itself
            if tree.parent(leaf) == Some(groups[from]) {
                tree.append(groups[to], leaf);
            }
        }

        // Exactly one group owns the leaf.
        let owners = groups
            .iter()
            .filter(|&&g| tree.children(g).contains(&leaf))
            .count();
        prop_assert_eq!(owners, 1);
        prop_assert!(tree.parent(leaf).is_some());
    }
}
