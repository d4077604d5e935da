// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for jsonplan.
//!
//! Provides error types for every stage of the decode pipeline:
//! - Structural and grammar failures in raw JSON
//! - Type mismatches and union discrimination
//! - Object construction (missing required properties)
//! - Byte source I/O

use crate::io::source::Boundary;

/// Errors that can occur while building or running a decode program.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CodecError {
    /// Raw JSON failed to parse, either structurally (splitter) or
    /// grammatically (native decoder).
    #[error("Malformed JSON at {range}: {message} (near `{snippet}`)")]
    MalformedInput {
        /// Byte range that was being read
        range: Boundary,
        /// Parser message
        message: String,
        /// Leading bytes of the offending input, lossily decoded
        snippet: String,
    },

    /// A decoded value matched no union member and no safe default exists.
    #[error("Unexpected value for union type '{signature}': got {observed}")]
    UnexpectedUnionValue {
        /// Textual signature of the union
        signature: String,
        /// Runtime type actually observed
        observed: String,
    },

    /// A non-nullable, non-defaulted property had no key in the input.
    #[error("Missing required property '{property}' for class '{class}'")]
    MissingRequiredProperty {
        /// Class being constructed
        class: String,
        /// Property name
        property: String,
    },

    /// A decoded value does not have the shape the program expects.
    #[error("Expected {expected} but got {observed} while decoding {context}")]
    UnexpectedValue {
        /// Expected type signature
        expected: String,
        /// Runtime type actually observed
        observed: String,
        /// What was being decoded (signature or property path)
        context: String,
    },

    /// No enum case matches the raw backing value.
    #[error("No case of enum '{class}' matches value {raw}")]
    UnknownEnumCase {
        /// Enum class identity
        class: String,
        /// Raw JSON text of the value
        raw: String,
    },

    /// Class, enum or transformer not registered in the catalog.
    #[error("Type not found: '{type_name}'")]
    TypeNotFound {
        /// Name that was not found
        type_name: String,
    },

    /// A type cannot be turned into a decode program.
    #[error("Invalid type '{signature}': {reason}")]
    InvalidType {
        /// Signature of the rejected type
        signature: String,
        /// Why it was rejected
        reason: String,
    },

    /// Nesting in the input exceeded the configured limit.
    #[error("Nesting depth exceeded limit of {limit} at byte {offset}")]
    DepthExceeded {
        /// Configured limit
        limit: usize,
        /// Absolute byte offset where the limit was hit
        offset: usize,
    },

    /// A value transformer rejected its input.
    #[error("Value transformer '{name}' failed: {message}")]
    Transform {
        /// Transformer name
        name: String,
        /// Error message
        message: String,
    },

    /// Reading from the byte source failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error message
        message: String,
    },
}

impl CodecError {
    /// Create a malformed input error, quoting at most `max_snippet` bytes of `bytes`.
    pub fn malformed(
        range: Boundary,
        message: impl Into<String>,
        bytes: &[u8],
        max_snippet: usize,
    ) -> Self {
        let end = bytes.len().min(max_snippet);
        CodecError::MalformedInput {
            range,
            message: message.into(),
            snippet: String::from_utf8_lossy(&bytes[..end]).into_owned(),
        }
    }

    /// Create an "unexpected value for union type" error.
    pub fn unexpected_union_value(
        signature: impl Into<String>,
        observed: impl Into<String>,
    ) -> Self {
        CodecError::UnexpectedUnionValue {
            signature: signature.into(),
            observed: observed.into(),
        }
    }

    /// Create a missing required property error.
    pub fn missing_property(class: impl Into<String>, property: impl Into<String>) -> Self {
        CodecError::MissingRequiredProperty {
            class: class.into(),
            property: property.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn unexpected_value(
        expected: impl Into<String>,
        observed: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        CodecError::UnexpectedValue {
            expected: expected.into(),
            observed: observed.into(),
            context: context.into(),
        }
    }

    /// Create an unknown enum case error.
    pub fn unknown_enum_case(class: impl Into<String>, raw: impl Into<String>) -> Self {
        CodecError::UnknownEnumCase {
            class: class.into(),
            raw: raw.into(),
        }
    }

    /// Create a "type not found" error.
    pub fn type_not_found(type_name: impl Into<String>) -> Self {
        CodecError::TypeNotFound {
            type_name: type_name.into(),
        }
    }

    /// Create an invalid type error.
    pub fn invalid_type(signature: impl Into<String>, reason: impl Into<String>) -> Self {
        CodecError::InvalidType {
            signature: signature.into(),
            reason: reason.into(),
        }
    }

    /// Create a transformer failure.
    pub fn transform(name: impl Into<String>, message: impl Into<String>) -> Self {
        CodecError::Transform {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from unparseable input rather than a type mismatch.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            CodecError::MalformedInput { .. } | CodecError::DepthExceeded { .. }
        )
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            CodecError::MalformedInput {
                range,
                message,
                snippet,
            } => vec![
                ("range", range.to_string()),
                ("message", message.clone()),
                ("snippet", snippet.clone()),
            ],
            CodecError::UnexpectedUnionValue {
                signature,
                observed,
            } => vec![("union", signature.clone()), ("observed", observed.clone())],
            CodecError::MissingRequiredProperty { class, property } => {
                vec![("class", class.clone()), ("property", property.clone())]
            }
            CodecError::UnexpectedValue {
                expected,
                observed,
                context,
            } => vec![
                ("expected", expected.clone()),
                ("observed", observed.clone()),
                ("context", context.clone()),
            ],
            CodecError::UnknownEnumCase { class, raw } => {
                vec![("enum", class.clone()), ("raw", raw.clone())]
            }
            CodecError::TypeNotFound { type_name } => vec![("type", type_name.clone())],
            CodecError::InvalidType { signature, reason } => {
                vec![("type", signature.clone()), ("reason", reason.clone())]
            }
            CodecError::DepthExceeded { limit, offset } => vec![
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ],
            CodecError::Transform { name, message } => {
                vec![("transformer", name.clone()), ("message", message.clone())]
            }
            CodecError::Io { message } => vec![("message", message.clone())],
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        CodecError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for jsonplan operations.
pub type Result<T> = std::result::Result<T, CodecError>;
