// crates/feed-archiver-core/src/routing.rs
// ============================================================================
// Module: Routing Key Destination Derivation
// Description: Pure derivations from routing keys to destination names.
// Purpose: Map hierarchical routing keys to table and index names.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Routing keys are dot-separated hierarchical strings. The relational
//! backend archives into a table named after everything before the *last*
//! dot (dots replaced with underscores); the search backend archives into an
//! index named after the segment before the *first* dot with a fixed
//! `-data` suffix. Both derivations are pure functions of the key.
//! Invariants:
//! - A key without a separator is a per-record error for both derivations.
//! - Derived names contain only identifier-safe characters; a name that
//!   would not survive interpolation into SQL or a URL path is rejected.
//!
//! Security posture: routing keys are untrusted input and destination names
//! are interpolated into DDL and URLs; derivation fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Suffix appended to search index names.
const INDEX_SUFFIX: &str = "-data";

// ============================================================================
// SECTION: Routing Errors
// ============================================================================

/// Errors produced while deriving a destination name from a routing key.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Routing errors are per-record: logged and dropped, never worker-fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    /// Routing key contains no `.` separator.
    #[error("routing key has no separator: {key}")]
    MissingSeparator {
        /// Offending routing key.
        key: String,
    },
    /// Derived destination name would be empty.
    #[error("routing key derives an empty destination: {key}")]
    EmptyDestination {
        /// Offending routing key.
        key: String,
    },
    /// Derived destination name contains unsafe characters.
    #[error("routing key derives an unsafe destination name: {key}")]
    UnsafeDestination {
        /// Offending routing key.
        key: String,
    },
}

// ============================================================================
// SECTION: Derivations
// ============================================================================

/// Derives the relational table name for a routing key.
///
/// Takes the prefix before the last `.` and replaces every remaining `.`
/// with `_`, so `shop.orders.created` archives into `shop_orders`.
///
/// # Errors
///
/// Returns [`RoutingError`] when the key has no separator, derives an empty
/// name, or derives a name with characters outside `[A-Za-z0-9_]`.
pub fn table_destination(key: &str) -> Result<String, RoutingError> {
    let prefix = key.rfind('.').map(|idx| &key[.. idx]).ok_or_else(|| {
        RoutingError::MissingSeparator {
            key: key.to_string(),
        }
    })?;
    if prefix.is_empty() {
        return Err(RoutingError::EmptyDestination {
            key: key.to_string(),
        });
    }
    let table = prefix.replace('.', "_");
    if !table.chars().all(is_identifier_char) {
        return Err(RoutingError::UnsafeDestination {
            key: key.to_string(),
        });
    }
    Ok(table)
}

/// Derives the search index name for a routing key.
///
/// Takes the segment before the first `.` and appends `-data`, so
/// `news.feed` archives into `news-data`.
///
/// # Errors
///
/// Returns [`RoutingError`] when the key has no separator, derives an empty
/// name, or derives a name with characters outside `[a-z0-9_-]`.
pub fn index_destination(key: &str) -> Result<String, RoutingError> {
    let segment = key.find('.').map(|idx| &key[.. idx]).ok_or_else(|| {
        RoutingError::MissingSeparator {
            key: key.to_string(),
        }
    })?;
    if segment.is_empty() {
        return Err(RoutingError::EmptyDestination {
            key: key.to_string(),
        });
    }
    if !segment.chars().all(is_index_char) {
        return Err(RoutingError::UnsafeDestination {
            key: key.to_string(),
        });
    }
    Ok(format!("{segment}{INDEX_SUFFIX}"))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true for characters safe in an interpolated SQL identifier.
const fn is_identifier_char(character: char) -> bool {
    character.is_ascii_alphanumeric() || character == '_'
}

/// Returns true for characters safe in a search index name segment.
const fn is_index_char(character: char) -> bool {
    character.is_ascii_lowercase() || character.is_ascii_digit() || matches!(character, '_' | '-')
}

#[cfg(test)]
mod tests;
