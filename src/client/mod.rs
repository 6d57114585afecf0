// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Collaborator contracts the reader consumes.
//!
//! - [`RpcClient`]: single calls, JSON-RPC batches and bytecode lookups
//! - [`LogIndexer`]: stored logs and filter lifecycle
//! - [`HeadTracker`]: latest and finalized heads
//!
//! [`AlloyRpcClient`] implements [`RpcClient`] and [`HeadTracker`] over any
//! alloy [`Provider`](alloy_provider::Provider). The log indexer is always
//! external: it owns durable log storage.

mod provider;

use std::fmt;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use provider::AlloyRpcClient;

use crate::errors::RpcError;
use crate::query::{Expression, LimitAndSort, LogPrimitive};
use crate::types::{Confirmations, IndexedLog};

/// `eth_call` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMsg {
    /// Target contract
    pub to: Address,
    /// Calldata
    pub data: Bytes,
}

/// One element of a JSON-RPC batch.
///
/// The transport fills in exactly one of `result` and `error` per element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchElement {
    /// JSON-RPC method, `eth_call`
    pub method: String,
    /// Call to execute
    pub call: CallMsg,
    /// Block to execute at, `None` for latest
    pub block: Option<u64>,
    /// Raw hex result as returned by the node
    pub result: Option<String>,
    /// Per-element error message
    pub error: Option<String>,
}

impl BatchElement {
    /// `eth_call` element for `call` at `block`.
    pub fn eth_call(call: CallMsg, block: Option<u64>) -> Self {
        Self {
            method: "eth_call".to_string(),
            call,
            block,
            result: None,
            error: None,
        }
    }
}

/// Single-call, batch-call and bytecode transport.
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Execute `eth_call` at `block`, `None` for latest.
    async fn call_contract(&self, msg: &CallMsg, block: Option<u64>) -> Result<Bytes, RpcError>;

    /// Execute all elements as one batch, filling each element's result or
    /// error. A returned error means the whole batch was lost.
    async fn batch_call(&self, batch: &mut [BatchElement]) -> Result<(), RpcError>;

    /// Deployed bytecode at `address`.
    async fn code_at(&self, address: Address, block: Option<u64>) -> Result<Bytes, RpcError>;
}

/// Latest and finalized block numbers.
#[async_trait]
pub trait HeadTracker: Send + Sync {
    /// `(latest, finalized)` block numbers.
    async fn latest_and_finalized_block(&self) -> Result<(u64, u64), RpcError>;
}

/// Log storage and filter lifecycle.
#[async_trait]
pub trait LogIndexer: Send + Sync {
    /// Most recent log with `event_sig` emitted by `address` at the given
    /// finality, if any.
    async fn latest_log_by_event_sig_with_confs(
        &self,
        event_sig: B256,
        address: Address,
        confirmations: Confirmations,
    ) -> Result<Option<IndexedLog>, RpcError>;

    /// Logs matching every expression.
    async fn filtered_logs(
        &self,
        filter: &[Expression<LogPrimitive>],
        limit_and_sort: &LimitAndSort,
        query_name: &str,
    ) -> Result<Vec<IndexedLog>, RpcError>;

    /// Whether a filter with `name` is registered.
    fn has_filter(&self, name: &str) -> bool;

    /// Start indexing logs matching `filter`.
    async fn register_filter(&self, filter: LogFilter) -> Result<(), RpcError>;

    /// Stop indexing for the filter named `name`.
    async fn unregister_filter(&self, name: &str) -> Result<(), RpcError>;
}

/// A named log subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    /// Unique filter name
    pub name: String,
    /// Emitting contracts
    pub addresses: Vec<Address>,
    /// Accepted `topics[0]` values
    pub event_sigs: Vec<B256>,
    /// Accepted `topics[1]` values, empty for any
    #[serde(default)]
    pub topic2: Vec<B256>,
    /// Accepted `topics[2]` values, empty for any
    #[serde(default)]
    pub topic3: Vec<B256>,
    /// Accepted `topics[3]` values, empty for any
    #[serde(default)]
    pub topic4: Vec<B256>,
    /// How long the indexer keeps matching logs, `None` for forever
    #[serde(default, with = "optional_seconds")]
    pub retention: Option<Duration>,
    /// Maximum number of logs kept, `0` for unlimited
    #[serde(default)]
    pub max_logs_kept: u64,
    /// Rate limit on logs per block, `0` for unlimited
    #[serde(default)]
    pub logs_per_block: u64,
}

impl fmt::Display for LogFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (addresses: {:?}, event sigs: {:?})",
            self.name, self.addresses, self.event_sigs
        )
    }
}

/// Filter name for `id`, qualified by `args`: `"id"` or `"id - a:b:c"`.
pub fn filter_name<T: fmt::Display>(id: &str, args: &[T]) -> String {
    match args.split_first() {
        None => id.to_string(),
        Some((first, rest)) => {
            let mut name = format!("{id} - {first}");
            for arg in rest {
                name.push(':');
                name.push_str(&arg.to_string());
            }
            name
        }
    }
}

mod optional_seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_name_joins_arguments() {
        assert_eq!(filter_name::<&str>("Vault", &[]), "Vault");
        assert_eq!(filter_name("Vault", &["Deposit", "0xabc"]), "Vault - Deposit:0xabc");
    }

    #[test]
    fn log_filter_retention_is_seconds() {
        let filter: LogFilter = serde_json::from_str(
            r#"{"name":"f","addresses":[],"eventSigs":[],"retention":3600,"maxLogsKept":10}"#,
        )
        .unwrap();
        assert_eq!(filter.retention, Some(Duration::from_secs(3600)));
        assert_eq!(filter.max_logs_kept, 10);
        assert!(filter.topic2.is_empty());
    }
}
