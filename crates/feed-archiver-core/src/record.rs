// crates/feed-archiver-core/src/record.rs
// ============================================================================
// Module: Record Model and Decoder
// Description: Structured archive record decoded from one queued message.
// Purpose: Extract the required identifier and payload from raw queue bytes.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`Record`] is the unit of work flowing through the pipeline: the payload
//! as structured JSON, the identifier extracted from its `_id` field, and the
//! routing key of the queue it was popped from. Decoding is strict about the
//! identifier (a missing or non-integer/non-string `_id` is a per-record
//! error) and lenient about everything else.
//! Invariants:
//! - A decoded record always carries a well-typed identifier.
//! - Records are consumed by exactly one archive call and never buffered.
//!
//! Security posture: payloads are untrusted JSON; decode errors must carry
//! enough context to log without echoing the full payload.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name of the payload field holding the record identifier.
pub const RECORD_ID_FIELD: &str = "_id";

// ============================================================================
// SECTION: Decode Errors
// ============================================================================

/// Errors produced while decoding a raw queue message into a [`Record`].
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Decode errors are per-record: logged and dropped, never worker-fatal.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload was not valid JSON.
    #[error("payload is not valid json: {0}")]
    InvalidJson(String),
    /// Payload has no identifier field.
    #[error("payload has no {RECORD_ID_FIELD} field")]
    MissingIdentifier,
    /// Identifier field is a JSON number outside the 64-bit signed range.
    #[error("{RECORD_ID_FIELD} number does not fit a 64-bit signed integer")]
    IdentifierOutOfRange,
    /// Identifier field has an unsupported JSON type.
    #[error("{RECORD_ID_FIELD} must be a json number or string, got {kind}")]
    UnsupportedIdentifier {
        /// JSON type label of the offending value.
        kind: &'static str,
    },
}

// ============================================================================
// SECTION: Identifier
// ============================================================================

/// Type of a record identifier, used to size destination key columns.
///
/// # Invariants
/// - Variants are stable for destination provisioning decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// 64-bit signed integer identifier.
    Integer,
    /// Raw byte identifier (from a JSON string).
    Bytes,
}

/// Identifier value extracted from a record payload.
///
/// # Invariants
/// - `Integer` holds the exact value of a JSON number identifier.
/// - `Bytes` holds the UTF-8 bytes of a JSON string identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierValue {
    /// Integer identifier.
    Integer(i64),
    /// Byte identifier.
    Bytes(Vec<u8>),
}

impl IdentifierValue {
    /// Returns the kind of this identifier.
    #[must_use]
    pub const fn kind(&self) -> IdentifierKind {
        match self {
            Self::Integer(_) => IdentifierKind::Integer,
            Self::Bytes(_) => IdentifierKind::Bytes,
        }
    }

    /// Renders the identifier as a document id string.
    ///
    /// Integer identifiers render in decimal; byte identifiers render as
    /// UTF-8 (lossy, though byte identifiers originate from JSON strings and
    /// are always valid UTF-8 in practice).
    #[must_use]
    pub fn document_id(&self) -> String {
        match self {
            Self::Integer(value) => value.to_string(),
            Self::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

// ============================================================================
// SECTION: Record
// ============================================================================

/// One decoded archive record.
///
/// # Invariants
/// - `payload` is the full decoded message, identifier field included.
/// - `routing_key` is the queue key the message was popped from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Routing key of the source queue.
    pub routing_key: String,
    /// Identifier extracted from the payload.
    pub identifier: IdentifierValue,
    /// Full payload as structured JSON.
    pub payload: Value,
}

/// Decodes a raw queue message into a [`Record`].
///
/// # Errors
///
/// Returns [`DecodeError`] when the payload is not JSON, lacks the
/// [`RECORD_ID_FIELD`] field, or carries an identifier that is neither a
/// 64-bit signed integer nor a string.
pub fn decode_record(routing_key: &str, payload: &[u8]) -> Result<Record, DecodeError> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|err| DecodeError::InvalidJson(err.to_string()))?;
    let identifier = extract_identifier(&value)?;
    Ok(Record {
        routing_key: routing_key.to_string(),
        identifier,
        payload: value,
    })
}

/// Extracts the identifier field from a decoded payload.
fn extract_identifier(payload: &Value) -> Result<IdentifierValue, DecodeError> {
    match payload.get(RECORD_ID_FIELD) {
        None => Err(DecodeError::MissingIdentifier),
        Some(Value::Number(number)) => number
            .as_i64()
            .map(IdentifierValue::Integer)
            .ok_or(DecodeError::IdentifierOutOfRange),
        Some(Value::String(text)) => Ok(IdentifierValue::Bytes(text.clone().into_bytes())),
        Some(other) => Err(DecodeError::UnsupportedIdentifier {
            kind: json_kind(other),
        }),
    }
}

/// Returns a stable label for a JSON value type.
const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
