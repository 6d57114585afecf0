// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Per-read bindings.
//!
//! Every configured read is served by one [`Reader`]:
//!
//! - [`MethodBinding`] executes `eth_call` against the bound address
//! - [`EventBinding`] looks up indexed logs through the [`LogIndexer`](crate::client::LogIndexer)
//!
//! Readers track which addresses they are bound to and refuse reads for
//! anything else. Mutating calls take `&mut self`; the registry serializes
//! them behind its write lock.

mod confidence;
mod event;
mod filter;
mod lookup;
mod method;

use alloy_primitives::Address;
use async_trait::async_trait;
use serde_json::Value;

pub use confidence::confidence_to_confirmations;
pub use event::{EventBinding, EventFilter};
pub use filter::SyncedFilter;
pub use lookup::{Lookup, ReadValues};
pub use method::MethodBinding;

pub(crate) use event::{filterable_fields, EventField};

use crate::batch::Call;
use crate::errors::ChainReaderError;
use crate::query::{KeyFilter, LimitAndSort};
use crate::types::{ConfidenceLevel, Sequence};

/// One configured read of a contract.
#[async_trait]
pub trait Reader: Send + Sync {
    /// Logical contract name.
    fn contract_name(&self) -> &str;

    /// Read name within the contract.
    fn read_name(&self) -> &str;

    /// Start serving reads for `address`.
    async fn bind(&mut self, address: Address) -> Result<(), ChainReaderError>;

    /// Stop serving reads for `address`.
    fn unbind(&mut self, address: Address);

    /// Register any filter this reader owns.
    async fn register(&self) -> Result<(), ChainReaderError>;

    /// Unregister any filter this reader owns.
    async fn unregister(&self) -> Result<(), ChainReaderError>;

    /// Latest value at the requested finality, in native form.
    async fn get_latest_value(
        &self,
        address: Address,
        confidence: ConfidenceLevel,
        params: &Value,
    ) -> Result<Value, ChainReaderError>;

    /// Deferred form of [`Reader::get_latest_value`] for batching.
    fn batch_call(&self, address: Address, params: &Value) -> Result<Call, ChainReaderError>;

    /// Values matching `filter`, each with its cursor and head.
    async fn query_key(
        &self,
        address: Address,
        filter: &KeyFilter,
        limit_and_sort: &LimitAndSort,
    ) -> Result<Vec<Sequence<Value>>, ChainReaderError>;
}
