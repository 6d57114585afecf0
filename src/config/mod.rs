//! Configuration for the contract reader
//!
//! Two kinds of configuration live here:
//!
//! - [`ChainReaderConfig`]: the declarative per-contract reader definitions,
//!   usually loaded from JSON (camelCase keys)
//! - [`BatchCallerConfig`]: limits for batched `eth_call`s, built with
//!   [`BatchCallerConfigBuilder`]
//!
//! # Example: Reader definitions
//!
//! ```rust
//! use evm_contract_reader::{ChainReaderConfig, ReadType};
//!
//! let config: ChainReaderConfig = serde_json::from_str(r#"{
//!     "contracts": {
//!         "Token": {
//!             "contractAbi": "[]",
//!             "configs": {
//!                 "Supply": { "chainSpecificName": "totalSupply" },
//!                 "Transfers": {
//!                     "chainSpecificName": "Transfer",
//!                     "readType": "event",
//!                     "confidenceConfirmations": { "finalized": -1, "unconfirmed": 0 }
//!                 }
//!             }
//!         }
//!     }
//! }"#).unwrap();
//!
//! assert_eq!(config.contracts["Token"].configs["Transfers"].read_type, ReadType::Event);
//! ```
//!
//! # Example: Batch limits
//!
//! ```rust
//! use evm_contract_reader::BatchCallerConfigBuilder;
//! use std::time::Duration;
//!
//! let config = BatchCallerConfigBuilder::with_defaults()
//!     .max_batch_size(50)
//!     .rpc_timeout(Duration::from_secs(10))
//!     .build();
//! assert_eq!(config.max_batch_size, 50);
//! assert_eq!(config.backoff_multiplier, 5);
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use alloy_json_abi::JsonAbi;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use crate::codec::ModifierChain;
use crate::errors::ConfigError;
use crate::types::{ConfidenceLevel, Confirmations};

pub mod constants;

use constants::{
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_MAX_BATCH_SIZE, DEFAULT_PARALLEL_RPC_CALLS_LIMIT,
    DEFAULT_UNCONFIRMED_DEPTH,
};

/// Reader definitions for every configured contract
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainReaderConfig {
    /// Logical contract name to its reader definitions
    pub contracts: BTreeMap<String, ChainContractReader>,
}

/// Reader definitions for one logical contract
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainContractReader {
    /// JSON ABI of the contract
    pub contract_abi: String,
    /// Read name to definition
    #[serde(default)]
    pub configs: BTreeMap<String, ChainReaderDefinition>,
}

impl ChainContractReader {
    /// Parse the contract ABI.
    pub fn abi(&self) -> Result<JsonAbi, ConfigError> {
        serde_json::from_str(&self.contract_abi)
            .map_err(|e| ConfigError::invalid(format!("contract ABI is not valid JSON ABI: {e}")))
    }
}

/// How a read is served
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadType {
    /// `eth_call` against a view function
    #[default]
    Method,
    /// Most recent matching log from the log indexer
    Event,
}

/// Declarative definition of one read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainReaderDefinition {
    /// Function or event name in the ABI
    pub chain_specific_name: String,
    /// Method or event
    #[serde(default)]
    pub read_type: ReadType,
    /// Modifiers for the params item
    #[serde(default)]
    pub input_modifications: ModifierChain,
    /// Modifiers for the return item
    #[serde(default)]
    pub output_modifications: ModifierChain,
    /// Confidence level to confirmations; empty means the defaults
    #[serde(default)]
    pub confidence_confirmations: BTreeMap<ConfidenceLevel, Confirmations>,
    /// Event-only settings
    #[serde(default)]
    pub event_definitions: Option<EventDefinitions>,
}

impl ChainReaderDefinition {
    /// Confidence mapping with defaults applied.
    ///
    /// An empty mapping becomes `{unconfirmed: 0, finalized: -1}`.
    pub fn confidence_mapping(&self) -> BTreeMap<ConfidenceLevel, Confirmations> {
        if !self.confidence_confirmations.is_empty() {
            return self.confidence_confirmations.clone();
        }
        BTreeMap::from([
            (
                ConfidenceLevel::Unconfirmed,
                Confirmations::Depth(DEFAULT_UNCONFIRMED_DEPTH),
            ),
            (ConfidenceLevel::Finalized, Confirmations::Finalized),
        ])
    }
}

/// Event-only reader settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDefinitions {
    /// Indexed on-chain argument name to generic name
    #[serde(default)]
    pub generic_topic_names: BTreeMap<String, String>,
    /// Non-indexed on-chain argument name to generic name
    #[serde(default)]
    pub generic_data_word_names: BTreeMap<String, String>,
    /// Settings for a private filter; `None` shares the contract filter
    #[serde(default)]
    pub polling_filter: Option<PollingFilter>,
}

/// Extra settings for an event's private log filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollingFilter {
    /// Accepted `topics[1]` values
    #[serde(default)]
    pub topic2: Vec<B256>,
    /// Accepted `topics[2]` values
    #[serde(default)]
    pub topic3: Vec<B256>,
    /// Accepted `topics[3]` values
    #[serde(default)]
    pub topic4: Vec<B256>,
    /// Retention in seconds
    #[serde(default)]
    pub retention: Option<u64>,
    /// Maximum number of logs kept
    #[serde(default)]
    pub max_logs_kept: u64,
    /// Logs per block limit
    #[serde(default)]
    pub logs_per_block: u64,
}

/// Limits for batched contract reads
///
/// Use [`BatchCallerConfigBuilder`] for a fluent API to construct instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCallerConfig {
    /// Calls per JSON-RPC batch on the first attempt
    /// Default: 100
    pub max_batch_size: usize,

    /// Divisor applied to the batch size after a failed attempt
    /// Default: 5
    pub backoff_multiplier: usize,

    /// Batches in flight at once; `1` runs batches sequentially
    /// Default: 10
    pub parallel_rpc_calls_limit: usize,

    /// Deadline for each batch round trip
    /// Default: None (no deadline)
    pub rpc_timeout: Option<Duration>,
}

impl Default for BatchCallerConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            parallel_rpc_calls_limit: DEFAULT_PARALLEL_RPC_CALLS_LIMIT,
            rpc_timeout: None,
        }
    }
}

/// Builder for [`BatchCallerConfig`]
#[derive(Debug, Clone, Default)]
pub struct BatchCallerConfigBuilder {
    config: BatchCallerConfig,
}

impl BatchCallerConfigBuilder {
    /// Start with the default limits
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Set the first-attempt batch size; `0` is treated as `1`
    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.config.max_batch_size = size.max(1);
        self
    }

    /// Set the backoff divisor; values below `2` are treated as `2`
    pub fn backoff_multiplier(mut self, multiplier: usize) -> Self {
        self.config.backoff_multiplier = multiplier.max(2);
        self
    }

    /// Set how many batches may be in flight; `0` is treated as `1`
    pub fn parallel_rpc_calls_limit(mut self, limit: usize) -> Self {
        self.config.parallel_rpc_calls_limit = limit.max(1);
        self
    }

    /// Set the per-batch deadline
    pub fn rpc_timeout(mut self, timeout: Duration) -> Self {
        self.config.rpc_timeout = Some(timeout);
        self
    }

    /// Build the final configuration
    pub fn build(self) -> BatchCallerConfig {
        self.config
    }
}
