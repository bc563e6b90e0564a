//! Property-based tests for the text patch.
//!
//! These tests verify key invariants:
//! - Idempotency: patching twice equals patching once
//! - Locality: bytes around the patched line stay identical
//! - Identity: content without the target is returned unchanged

use installfix_edit::{TextPatch, UV_LOOP_FIND, UV_LOOP_REPLACE};
use proptest::prelude::*;

/// Header-like lines that never contain the target assignment.
fn arb_header_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::string::string_regex(r"[#a-z_ (){};*<>=0-9]{0,40}").unwrap(),
        0..8,
    )
    .prop_map(|lines| {
        lines
            .into_iter()
            .map(|l| format!("{}\n", l))
            .collect::<String>()
    })
    .prop_filter("no target", |s| !s.contains(UV_LOOP_FIND))
}

proptest! {
    #[test]
    fn patch_is_idempotent(prefix in arb_header_text(), suffix in arb_header_text()) {
        let patch = TextPatch::uv_event_loop_cast();
        let input = format!("{}{}\n{}", prefix, UV_LOOP_FIND, suffix);

        let once = patch.apply_to(&input);
        let twice = patch.apply_to(&once);

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn patch_preserves_surrounding_bytes(prefix in arb_header_text(), suffix in arb_header_text()) {
        let patch = TextPatch::uv_event_loop_cast();
        let input = format!("{}{}\n{}", prefix, UV_LOOP_FIND, suffix);

        let out = patch.apply_to(&input);

        prop_assert_eq!(out, format!("{}{}\n{}", prefix, UV_LOOP_REPLACE, suffix));
    }

    #[test]
    fn content_without_target_is_untouched(text in arb_header_text()) {
        let patch = TextPatch::uv_event_loop_cast();
        prop_assert_eq!(patch.apply_to(&text), text);
    }
}
