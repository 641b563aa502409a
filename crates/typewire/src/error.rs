// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error type shared by every stage of the encode/decode pipeline.

use std::fmt;

/// Serialization failure modes.
///
/// Every variant aborts the whole `serialize`/`deserialize` call; no partial
/// envelope or partially populated graph is ever handed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// A reachable value has no supported representation.
    NotSerializable(String),
    /// A mandatory slot received no value, or a primitive slot was declared nullable.
    NullabilityViolation {
        /// Type owning the field, or the primitive kind for a field declaration.
        type_name: String,
        /// Offending field.
        field: String,
    },
    /// Two fields of one type share a name.
    DuplicateFieldName {
        /// Type owning the fields.
        type_name: String,
        /// Repeated field name.
        field: String,
    },
    /// The carpenter could not produce a type for a descriptor.
    SynthesisFailure(String),
    /// A value is structurally incompatible with the type expected for it.
    SchemaMismatch {
        /// What the caller (or slot) expected.
        expected: String,
        /// What was actually found.
        found: String,
    },
    /// A back-reference points to an id that was never assigned.
    ReferenceIntegrityViolation {
        /// Referenced id.
        id: u32,
        /// Number of ids assigned so far.
        known: usize,
    },
    /// The byte stream is not a well-formed envelope.
    InvalidEnvelope(String),
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSerializable(reason) => write!(f, "not serializable: {}", reason),
            Self::NullabilityViolation { type_name, field } => {
                write!(f, "nullability violation on field {} ({})", field, type_name)
            }
            Self::DuplicateFieldName { type_name, field } => {
                write!(f, "duplicate field name {} in {}", field, type_name)
            }
            Self::SynthesisFailure(reason) => write!(f, "type synthesis failed: {}", reason),
            Self::SchemaMismatch { expected, found } => {
                write!(f, "schema mismatch: expected {}, found {}", expected, found)
            }
            Self::ReferenceIntegrityViolation { id, known } => write!(
                f,
                "back-reference to unknown object id {} ({} ids assigned)",
                id, known
            ),
            Self::InvalidEnvelope(reason) => write!(f, "invalid envelope: {}", reason),
        }
    }
}

impl std::error::Error for SerializationError {}

impl From<std::string::FromUtf8Error> for SerializationError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::InvalidEnvelope(format!("invalid UTF-8: {}", e))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SerializationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_variants() {
        let err = SerializationError::NullabilityViolation {
            type_name: "Trade".into(),
            field: "price".into(),
        };
        assert_eq!(err.to_string(), "nullability violation on field price (Trade)");

        let err = SerializationError::ReferenceIntegrityViolation { id: 5, known: 0 };
        assert_eq!(
            err.to_string(),
            "back-reference to unknown object id 5 (0 ids assigned)"
        );
    }

    #[test]
    fn test_utf8_conversion() {
        let bad = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
        let err: SerializationError = bad.into();
        assert!(matches!(err, SerializationError::InvalidEnvelope(_)));
    }
}
