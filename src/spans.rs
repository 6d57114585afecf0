//! Span creation helpers for contract reader operations.
//!
//! Telemetry stays out of the business logic: each instrumented operation has
//! a span helper here, and the operation's future is wrapped with
//! [`tracing::Instrument`] so the span stays correct across await points.
//!
//! Usage pattern:
//! ```rust,ignore
//! pub async fn my_operation(&self, param: Type) -> Result<T> {
//!     async move {
//!         // Business logic here
//!     }
//!     .instrument(spans::my_operation(param_value))
//!     .await
//! }
//! ```

use alloy_primitives::Address;
use tracing::{Level, Span};

use crate::types::ConfidenceLevel;

/// Create span for reading the latest value of one bound read.
///
/// Parent: None (root span for this operation)
/// Children: RPC call or log query spans of the collaborators
#[inline]
pub(crate) fn get_latest_value(read_identifier: &str, confidence: ConfidenceLevel) -> Span {
    tracing::span!(
        Level::INFO,
        "contract_reader.get_latest_value",
        read_identifier = %read_identifier,
        confidence = %confidence,
    )
}

/// Create span for a batched read across contracts.
///
/// Parent: None (root span for this operation)
/// Children: batch_call_attempt spans (one per retry)
#[inline]
pub(crate) fn batch_get_latest_values(contracts: usize, calls: usize) -> Span {
    tracing::span!(
        Level::INFO,
        "contract_reader.batch_get_latest_values",
        contracts = contracts,
        calls = calls,
    )
}

/// Create span for one attempt of a dynamically limited batch call.
///
/// Parent: batch_get_latest_values span
#[inline]
pub(crate) fn batch_call_attempt(limit: usize, calls: usize) -> Span {
    tracing::debug_span!(
        "contract_reader.batch_call_attempt",
        limit = limit,
        calls = calls,
    )
}

/// Create span for a key query over indexed events.
///
/// Parent: None (root span for this operation)
#[inline]
pub(crate) fn query_key(contract: &str, address: Address, key: &str) -> Span {
    tracing::span!(
        Level::INFO,
        "contract_reader.query_key",
        contract = %contract,
        address = %address,
        key = %key,
    )
}

/// Create span for binding addresses to contracts.
#[inline]
pub(crate) fn bind(bindings: usize) -> Span {
    tracing::span!(Level::INFO, "contract_reader.bind", bindings = bindings)
}

/// Create span for unbinding addresses from contracts.
#[inline]
pub(crate) fn unbind(bindings: usize) -> Span {
    tracing::span!(Level::INFO, "contract_reader.unbind", bindings = bindings)
}
