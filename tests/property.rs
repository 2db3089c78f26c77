//! Property-based tests for LeafJSON using proptest
//!
//! `serde_json` is the rendering side here: trees are generated, written to
//! text with a known-good serializer, and read back with this crate. The
//! library under test never serializes.

use leafjson::{parse, Value};
use proptest::prelude::*;

// =========================================================================
// Generation strategies
// =========================================================================

/// Generate a leaf value (no containers).
fn arb_leaf() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::from),
        // Stay inside the binary64-exact integer range.
        (-1_000_000_000i64..1_000_000_000i64).prop_map(serde_json::Value::from),
        any::<f64>()
            .prop_filter("finite only", |f| f.is_finite())
            .prop_map(serde_json::Value::from),
        prop::collection::vec(any::<char>(), 0..20)
            .prop_map(|chars| serde_json::Value::from(chars.into_iter().collect::<String>())),
    ]
}

/// Generate a value with bounded nesting.
fn arb_tree(depth: u32) -> BoxedStrategy<serde_json::Value> {
    if depth == 0 {
        arb_leaf().boxed()
    } else {
        prop_oneof![
            4 => arb_leaf(),
            1 => prop::collection::vec(arb_tree(depth - 1), 0..5)
                .prop_map(serde_json::Value::Array),
            1 => prop::collection::btree_map("[a-z]{1,8}", arb_tree(depth - 1), 0..5)
                .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
        ]
        .boxed()
    }
}

/// Assert the parsed tree matches the generated one node for node.
fn assert_matches(expected: &serde_json::Value, got: &Value) {
    match expected {
        serde_json::Value::Null => assert!(got.is_null(), "expected null, got {:?}", got),
        serde_json::Value::Bool(b) => assert_eq!(got.as_bool(), Some(*b)),
        serde_json::Value::Number(n) => {
            assert_eq!(got.as_number(), Some(n.as_f64().unwrap()));
        }
        serde_json::Value::String(s) => assert_eq!(got.as_str(), Some(s.as_str())),
        serde_json::Value::Array(items) => {
            let elements = got.as_array().expect("expected an array");
            assert_eq!(elements.len(), items.len());
            for (item, element) in items.iter().zip(elements) {
                assert_matches(item, element);
            }
        }
        serde_json::Value::Object(members) => {
            let object = got.as_object().expect("expected an object");
            assert_eq!(object.len(), members.len());
            for (key, member) in members {
                let child = object.get(key).expect("missing member");
                assert_matches(member, child);
            }
        }
    }
}

// =========================================================================
// Properties
// =========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any tree a known-good serializer writes, this parser reads back
    /// structurally unchanged.
    #[test]
    fn rendered_trees_parse_back(tree in arb_tree(3)) {
        let text = serde_json::to_string(&tree).expect("render");
        let value = parse(&text).expect("parse rendered text");
        assert_matches(&tree, &value);
    }

    /// Pretty-printing only inserts whitespace, which must not change the
    /// parsed tree.
    #[test]
    fn pretty_and_compact_renderings_agree(tree in arb_tree(3)) {
        let compact = serde_json::to_string(&tree).expect("render");
        let pretty = serde_json::to_string_pretty(&tree).expect("render pretty");
        prop_assert_eq!(parse(&compact).expect("compact"), parse(&pretty).expect("pretty"));
    }

    /// The first NUL byte terminates the input: whatever follows it can
    /// never change the outcome, success or failure.
    #[test]
    fn bytes_after_a_nul_terminator_are_inert(
        text in "[ -~]{0,40}",
        junk in "[ -~]{0,40}",
    ) {
        let extended = format!("{}\u{0}{}", text, junk);
        prop_assert_eq!(parse(&text), parse(&extended));
    }

    /// Surrounding whitespace from the RFC 8259 set never changes a parse.
    #[test]
    fn surrounding_whitespace_is_insignificant(
        tree in arb_tree(2),
        pad in "[ \t\r\n]{0,10}",
    ) {
        let text = serde_json::to_string(&tree).expect("render");
        let padded = format!("{}{}{}", pad, text, pad);
        prop_assert_eq!(parse(&text).expect("bare"), parse(&padded).expect("padded"));
    }

    /// Duplicate object keys keep the first member, no matter the values.
    #[test]
    fn duplicate_keys_keep_the_first_member(
        key in "[a-z]{1,8}",
        first in -1000i64..1000,
        second in -1000i64..1000,
    ) {
        let text = format!(r#"{{"{}": {}, "{}": {}}}"#, key, first, key, second);
        let doc = parse(&text).expect("parse");
        prop_assert_eq!(doc.size(), 1);
        prop_assert_eq!(doc[key.as_str()].as_number(), Some(first as f64));
    }

    /// Every finite f64 the renderer can spell survives the trip into a
    /// Number node bit for bit.
    #[test]
    fn finite_floats_round_trip(f in any::<f64>().prop_filter("finite only", |f| f.is_finite())) {
        let text = serde_json::to_string(&f).expect("render");
        let value = parse(&text).expect("parse number");
        prop_assert_eq!(value.as_number(), Some(f));
    }

    /// A parsed tree deep-clones into an equal, storage-independent tree.
    #[test]
    fn clones_are_equal_and_independent(tree in arb_tree(2)) {
        let text = serde_json::to_string(&tree).expect("render");
        let original = parse(&text).expect("parse");
        let mut copy = original.clone();
        prop_assert_eq!(&original, &copy);
        copy.set_null();
        assert_matches(&tree, &original);
    }
}
