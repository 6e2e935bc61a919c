// crates/feed-archiver-core/src/routing/tests.rs
// ============================================================================
// Module: Routing Derivation Unit Tests
// Description: Table and index name derivation rules.
// Purpose: Verify destination derivation and unsafe-name rejection.
// Dependencies: feed-archiver-core
// ============================================================================

//! ## Overview
//! Unit tests for [`table_destination`] and [`index_destination`] covering
//! prefix selection, separator handling, and identifier-safety validation.

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

use super::RoutingError;
use super::index_destination;
use super::table_destination;

#[test]
fn table_name_uses_prefix_before_last_dot() {
    assert_eq!(table_destination("shop.orders.created").unwrap(), "shop_orders");
}

#[test]
fn table_name_for_two_segments_is_first_segment() {
    assert_eq!(table_destination("news.feed").unwrap(), "news");
}

#[test]
fn table_name_replaces_every_dot_with_underscore() {
    assert_eq!(table_destination("a.b.c.d.e").unwrap(), "a_b_c_d");
}

#[test]
fn table_derivation_rejects_key_without_separator() {
    assert_eq!(
        table_destination("noseparator").unwrap_err(),
        RoutingError::MissingSeparator {
            key: "noseparator".to_string(),
        }
    );
}

#[test]
fn table_derivation_rejects_leading_dot() {
    assert!(matches!(
        table_destination(".orders").unwrap_err(),
        RoutingError::EmptyDestination { .. }
    ));
}

#[test]
fn table_derivation_rejects_sql_splice_attempts() {
    assert!(matches!(
        table_destination("shop\"; drop table x;--.orders").unwrap_err(),
        RoutingError::UnsafeDestination { .. }
    ));
}

#[test]
fn index_name_uses_first_segment_with_suffix() {
    assert_eq!(index_destination("news.feed").unwrap(), "news-data");
    assert_eq!(index_destination("shop.orders.created").unwrap(), "shop-data");
}

#[test]
fn index_derivation_rejects_key_without_separator() {
    assert!(matches!(
        index_destination("noseparator").unwrap_err(),
        RoutingError::MissingSeparator { .. }
    ));
}

#[test]
fn index_derivation_rejects_empty_first_segment() {
    assert!(matches!(
        index_destination(".feed").unwrap_err(),
        RoutingError::EmptyDestination { .. }
    ));
}

#[test]
fn index_derivation_rejects_uppercase_segments() {
    assert!(matches!(
        index_destination("News.feed").unwrap_err(),
        RoutingError::UnsafeDestination { .. }
    ));
}
