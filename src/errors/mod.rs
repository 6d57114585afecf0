// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the contract reader.
//!
//! Like the rest of the crate, errors follow a hybrid approach:
//!
//! - **Module-specific errors** for fine-grained handling: [`ConfigError`],
//!   [`CodecError`], [`RpcError`], [`ReadError`], [`FilterError`] and
//!   [`BatchError`]
//! - **Unified error type** ([`ChainReaderError`]) returned by the public
//!   surface, with `From` conversions so `?` composes
//!
//! # Examples
//!
//! ```rust,ignore
//! use evm_contract_reader::{ChainReaderError, ConfidenceLevel, ConfigError};
//!
//! match service.get_latest_value::<_, u64>(&read_id, ConfidenceLevel::Finalized, &()).await {
//!     Ok(value) => println!("value: {value}"),
//!     Err(ChainReaderError::Config(ConfigError::MissingReadIdentifier { identifier })) => {
//!         eprintln!("{identifier} was never bound");
//!     }
//!     Err(e) if e.is_not_found() => eprintln!("no matching log yet"),
//!     Err(e) => eprintln!("read failed: {e}"),
//! }
//! ```

mod batch;
mod codec;
mod config;
mod filter;
mod read;
mod rpc;

pub use batch::BatchError;
pub use codec::CodecError;
pub use config::ConfigError;
pub use filter::{FilterAction, FilterError};
pub use read::{ReadError, ReadErrorKind};
pub use rpc::RpcError;

/// Unified error type for all reader operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainReaderError {
    /// Unknown identifier or inconsistent configuration. Never retried.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Value could not be converted to or from the wire encoding.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Contract read failed.
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// Log filter could not be registered or unregistered.
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// Batch dispatch exhausted its retries.
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// Collaborator transport failure outside of a read.
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    /// No log matches the requested event and filters.
    #[error("Not found: {details}")]
    NotFound {
        /// What was looked up
        details: String,
    },
}

impl ChainReaderError {
    /// Create a `NotFound` error with details.
    pub fn not_found(details: impl Into<String>) -> Self {
        ChainReaderError::NotFound {
            details: details.into(),
        }
    }

    /// Whether no matching value exists yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChainReaderError::NotFound { .. })
    }

    /// Whether the value had the wrong shape, at any layer.
    pub fn is_invalid_type(&self) -> bool {
        match self {
            ChainReaderError::Codec(e) => e.is_invalid_type(),
            ChainReaderError::Read(e) => e
                .source
                .downcast_ref::<CodecError>()
                .is_some_and(CodecError::is_invalid_type),
            _ => false,
        }
    }

    /// Whether this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, ChainReaderError::Config(_))
    }
}
