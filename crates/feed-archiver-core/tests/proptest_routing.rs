// crates/feed-archiver-core/tests/proptest_routing.rs
// ============================================================================
// Module: Routing Derivation Property Tests
// Description: Derivation laws over generated routing keys.
// Purpose: Verify table/index derivation invariants hold for arbitrary keys.
// Dependencies: feed-archiver-core, proptest
// ============================================================================

//! ## Overview
//! Property tests for the destination derivations: for any well-formed
//! dot-separated key the table name equals the pre-last-dot prefix with dots
//! replaced by underscores, the index name equals the first segment plus the
//! fixed suffix, and keys without separators always derive errors (never a
//! panic, never an empty destination).

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use feed_archiver_core::index_destination;
use feed_archiver_core::table_destination;
use proptest::prelude::proptest;
use proptest::prop_assert;
use proptest::prop_assert_eq;

proptest! {
    #[test]
    fn table_name_matches_manual_derivation(
        segments in proptest::collection::vec("[a-z][a-z0-9_]{0,8}", 2 .. 6),
    ) {
        let key = segments.join(".");
        let expected = segments[.. segments.len() - 1].join("_");
        prop_assert_eq!(table_destination(&key).unwrap(), expected);
    }

    #[test]
    fn index_name_is_first_segment_with_suffix(
        segments in proptest::collection::vec("[a-z][a-z0-9_]{0,8}", 2 .. 6),
    ) {
        let key = segments.join(".");
        prop_assert_eq!(index_destination(&key).unwrap(), format!("{}-data", segments[0]));
    }

    #[test]
    fn keys_without_separator_never_derive_destinations(
        key in "[a-z0-9_]{1,16}",
    ) {
        prop_assert!(table_destination(&key).is_err());
        prop_assert!(index_destination(&key).is_err());
    }

    #[test]
    fn derived_table_names_are_identifier_safe(key in "[a-z0-9._]{2,24}") {
        if let Ok(table) = table_destination(&key) {
            prop_assert!(!table.is_empty());
            prop_assert!(table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }
    }
}
