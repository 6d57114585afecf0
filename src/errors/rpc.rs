// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Shared transport error types for the reader's collaborators.
//!
//! Every network round trip the reader performs (single contract calls, JSON-RPC
//! batches, bytecode lookups, head queries and log-index queries) fails with an
//! [`RpcError`] that names the operation and keeps the underlying error as its
//! `source`.

use std::time::Duration;

use alloy_primitives::Address;

/// Errors returned by the RPC client, head tracker and log indexer.
///
/// # Examples
///
/// ```rust
/// use evm_contract_reader::RpcError;
///
/// let error = RpcError::Timeout {
///     operation: "eth_call batch".to_string(),
///     timeout: std::time::Duration::from_secs(5),
/// };
/// assert!(error.to_string().contains("eth_call batch"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// A single `eth_call` failed at the transport level.
    #[error("Contract call to {address} failed")]
    CallFailed {
        /// Target contract
        address: Address,
        /// The underlying transport error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A JSON-RPC batch request failed as a whole.
    #[error("Batch call of {size} elements failed")]
    BatchCallFailed {
        /// Number of elements in the failed batch
        size: usize,
        /// The underlying transport error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A single element inside an otherwise successful batch failed.
    #[error("Batch element failed: {message}")]
    BatchElementFailed {
        /// Error message reported by the node for this element
        message: String,
    },

    /// Fetching contract bytecode failed.
    #[error("Failed to fetch code at {address}")]
    CodeAtFailed {
        /// Address whose code was requested
        address: Address,
        /// The underlying transport error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Fetching the latest or finalized head failed.
    #[error("Failed to fetch latest and finalized heads")]
    HeadFetchFailed {
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The node has no finalized block to report.
    #[error("Block not found: {tag}")]
    BlockNotFound {
        /// Tag or number of the missing block
        tag: String,
    },

    /// A log-index query failed.
    #[error("Log query {operation} failed")]
    LogQueryFailed {
        /// Description of the query
        operation: String,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Registering or unregistering a filter with the log indexer failed.
    #[error("Log filter {name} rejected: {reason}")]
    FilterRejected {
        /// Filter name
        name: String,
        /// Why the indexer refused it
        reason: String,
    },

    /// The call did not complete before its deadline.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        /// Description of the timed-out operation
        operation: String,
        /// Deadline that elapsed
        timeout: Duration,
    },
}

impl RpcError {
    /// Helper to create a `CallFailed` error from any error type.
    pub fn call_failed(
        address: Address,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RpcError::CallFailed {
            address,
            source: Box::new(source),
        }
    }

    /// Helper to create a `BatchCallFailed` error from any error type.
    pub fn batch_call_failed(
        size: usize,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RpcError::BatchCallFailed {
            size,
            source: Box::new(source),
        }
    }

    /// Helper to create a `CodeAtFailed` error from any error type.
    pub fn code_at_failed(
        address: Address,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RpcError::CodeAtFailed {
            address,
            source: Box::new(source),
        }
    }

    /// Helper to create a `HeadFetchFailed` error from any error type.
    pub fn head_fetch_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        RpcError::HeadFetchFailed {
            source: Box::new(source),
        }
    }

    /// Helper to create a `LogQueryFailed` error from any error type.
    pub fn log_query_failed(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RpcError::LogQueryFailed {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// Helper to create a `FilterRejected` error.
    pub fn filter_rejected(name: impl Into<String>, reason: impl Into<String>) -> Self {
        RpcError::FilterRejected {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
