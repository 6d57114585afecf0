// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the runtime ABI codec.

/// Errors produced while converting between native values and wire bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The value does not have the shape or range the item declares.
    ///
    /// Raised for unknown item types, `null` items where arguments are expected,
    /// integers that overflow their declared bit width, malformed addresses and
    /// anything the ABI packer rejects.
    #[error("Invalid type: {details}")]
    InvalidType {
        /// What was wrong with the value
        details: String,
    },

    /// Wire bytes could not be unpacked into the declared item.
    #[error("Failed to decode {item}: {details}")]
    DecodeFailed {
        /// Item type being decoded
        item: String,
        /// Decoder message
        details: String,
    },

    /// The native value could not be produced from the decoded data.
    #[error("Failed to convert decoded {item} into the requested type: {details}")]
    ConversionFailed {
        /// Item type being decoded
        item: String,
        /// Deserializer message
        details: String,
    },
}

impl CodecError {
    /// Create an `InvalidType` error with details.
    pub fn invalid_type(details: impl Into<String>) -> Self {
        CodecError::InvalidType {
            details: details.into(),
        }
    }

    /// Helper for an item type no entry is registered for.
    pub fn unknown_item(item: &str) -> Self {
        Self::invalid_type(format!("no codec entry for item type {item}"))
    }

    /// Create a `DecodeFailed` error.
    pub fn decode_failed(item: impl Into<String>, details: impl std::fmt::Display) -> Self {
        CodecError::DecodeFailed {
            item: item.into(),
            details: details.to_string(),
        }
    }

    /// Create a `ConversionFailed` error.
    pub fn conversion_failed(item: impl Into<String>, details: impl std::fmt::Display) -> Self {
        CodecError::ConversionFailed {
            item: item.into(),
            details: details.to_string(),
        }
    }

    /// Whether this is an invalid-type failure.
    pub fn is_invalid_type(&self) -> bool {
        matches!(self, CodecError::InvalidType { .. })
    }
}
