//! Property-Based Tests for Canonicalization and Deduplication
//!
//! # Test Properties
//!
//! 1. **Determinism**: the same document always yields the same digest
//! 2. **Order Independence**: key order and whitespace never change the digest
//! 3. **Fidelity**: canonical bytes parse back to the same document
//! 4. **Numeric Form**: an integer and the equal float canonicalize alike
//! 5. **Exactly Once**: the ledger accepts each (asset, digest) pair once

#![cfg(test)]

use std::collections::{BTreeMap, HashSet};

use proptest::prelude::*;
use serde_json::{json, Value};

use super::canonical::Canonicalizer;
use crate::adapters::InMemoryDigestLedger;
use crate::domain::{AssetId, DigestLedger, LedgerInsert};

// =============================================================================
// Property Strategies
// =============================================================================

/// Strategy for arbitrary JSON documents with integer and float leaves.
fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        any::<i32>().prop_map(|n| json!(n as f64)),
        (-4_000_000i64..4_000_000).prop_map(|n| json!(n as f64 / 4.0)),
        "[a-zA-Z0-9 _\\-\"\\\\\u{e9}]{0,12}".prop_map(Value::String),
    ];

    leaf.prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Render JSON with keys in reverse order and loose whitespace.
fn render_scrambled(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push_str("[ ");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(" ,\n ");
                }
                render_scrambled(item, out);
            }
            out.push_str(" ]");
        }
        Value::Object(map) => {
            let entries: BTreeMap<&String, &Value> = map.iter().collect();
            out.push_str("{\n");
            for (i, (key, item)) in entries.into_iter().rev().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                out.push_str("  ");
                out.push_str(&serde_json::to_string(key).unwrap());
                out.push_str(" :\t");
                render_scrambled(item, out);
            }
            out.push_str("\n}");
        }
        other => out.push_str(&other.to_string()),
    }
}

// =============================================================================
// Canonicalization Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: canonicalization is a pure function.
    #[test]
    fn prop_digest_deterministic(value in json_strategy()) {
        let c = Canonicalizer::new();
        prop_assert_eq!(c.digest_value(&value).unwrap(), c.digest_value(&value.clone()).unwrap());
    }

    /// Property: re-ordered, re-spaced text of the same document hashes the same.
    #[test]
    fn prop_key_order_independent(value in json_strategy()) {
        let mut text = String::new();
        render_scrambled(&value, &mut text);
        let reparsed: Value = serde_json::from_str(&text).unwrap();

        let c = Canonicalizer::new();
        prop_assert_eq!(
            c.canonical_bytes(&value).unwrap(),
            c.canonical_bytes(&reparsed).unwrap()
        );
    }

    /// Property: canonical output is valid JSON for the same document.
    /// Integral floats come back as integers, so compare canonical forms.
    #[test]
    fn prop_canonical_reparses(value in json_strategy()) {
        let c = Canonicalizer::new();
        let bytes = c.canonical_bytes(&value).unwrap();
        let reparsed: Value = serde_json::from_slice(&bytes).unwrap();
        prop_assert_eq!(c.canonical_bytes(&reparsed).unwrap(), bytes);
    }

    /// Property: `n` and `n.0` in the same position give the same digest.
    #[test]
    fn prop_integer_and_float_agree(n in any::<i32>(), key in "[a-z_]{1,8}") {
        let c = Canonicalizer::new();
        let int_doc = json!({ (key.clone()): [n], "kind": "disk" });
        let float_doc = json!({ (key): [n as f64], "kind": "disk" });
        prop_assert_eq!(
            c.canonical_bytes(&int_doc).unwrap(),
            c.canonical_bytes(&float_doc).unwrap()
        );
    }
}

// =============================================================================
// Ledger Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: across a sequence of uploads, the ledger reports `Inserted`
    /// exactly once per distinct (asset, document) pair.
    #[test]
    fn prop_ledger_inserts_once(
        uploads in prop::collection::vec((0usize..3, 0u8..4), 1..24),
    ) {
        let ledger = InMemoryDigestLedger::new();
        let c = Canonicalizer::new();

        let inserted = tokio_test::block_on(async {
            let mut inserted = 0usize;
            for (asset, doc) in &uploads {
                let asset_id = AssetId::new(format!("A-{}", asset));
                let digest = c.digest_value(&json!({ "doc": doc })).unwrap();
                if let LedgerInsert::Inserted(_) = ledger.record_if_absent(&asset_id, &digest).await.unwrap() {
                    inserted += 1;
                }
            }
            inserted
        });

        let distinct: HashSet<_> = uploads.iter().collect();
        prop_assert_eq!(inserted, distinct.len());
    }
}
