// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for contract reader integration tests
//!
//! Provides mock implementations of the collaborator traits so readers can be
//! exercised without a node or a log database.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use alloy_primitives::{hex, keccak256, Address, Bytes, B256, U256};
use async_trait::async_trait;
use evm_contract_reader::query::{Expression, LimitAndSort, LogPrimitive, SortBy, SortDirection};
use evm_contract_reader::client::{BatchElement, CallMsg};
use evm_contract_reader::{
    BatchCallerConfigBuilder, BoundContract, ChainReaderConfig, ChainReaderService,
    Confirmations, HeadTracker, IndexedLog, LogFilter, LogIndexer, RpcClient, RpcError,
};
use serde_json::json;

pub const TOKEN_ABI: &str = r#"[
    {"type":"function","name":"balanceOf","stateMutability":"view",
     "inputs":[{"name":"owner","type":"address"}],
     "outputs":[{"name":"","type":"uint256"}]},
    {"type":"function","name":"decimals","stateMutability":"view",
     "inputs":[],
     "outputs":[{"name":"","type":"uint8"}]},
    {"type":"event","name":"Transfer","anonymous":false,
     "inputs":[{"name":"from","type":"address","indexed":true},
               {"name":"to","type":"address","indexed":true},
               {"name":"value","type":"uint256","indexed":false}]}
]"#;

/// Reader config for the token ABI.
///
/// `Transfer` exposes `to` as the generic topic `To` and `value` as the
/// generic data word `Amount`.
pub fn token_config() -> ChainReaderConfig {
    serde_json::from_value(json!({
        "contracts": {
            "Token": {
                "contractAbi": TOKEN_ABI,
                "configs": {
                    "balanceOf": {"chainSpecificName": "balanceOf"},
                    "decimals": {"chainSpecificName": "decimals"},
                    "Transfer": {
                        "chainSpecificName": "Transfer",
                        "readType": "event",
                        "eventDefinitions": {
                            "genericTopicNames": {"to": "To"},
                            "genericDataWordNames": {"value": "Amount"}
                        }
                    }
                }
            }
        }
    }))
    .unwrap()
}

pub fn transfer_sig() -> B256 {
    keccak256("Transfer(address,address,uint256)")
}

/// Encoded `uint256` word.
pub fn word(value: u64) -> Bytes {
    Bytes::from(U256::from(value).to_be_bytes::<32>().to_vec())
}

/// A stored `Transfer` log.
pub fn transfer_log(
    token: Address,
    from: Address,
    to: Address,
    value: u64,
    block_number: u64,
    log_index: u64,
) -> IndexedLog {
    IndexedLog {
        address: token,
        topics: vec![transfer_sig(), from.into_word(), to.into_word()],
        data: word(value),
        block_number,
        block_hash: B256::with_last_byte(block_number as u8),
        block_timestamp: 1_700_000_000 + block_number * 12,
        log_index,
        tx_hash: B256::with_last_byte(log_index as u8 + 100),
    }
}

type Responder = Box<dyn Fn(&CallMsg) -> Result<Bytes, String> + Send + Sync>;

/// Mock RpcClient
///
/// Every call is answered by a responder function. Whole batches can be made
/// to fail above a size, and every batch size and single call is recorded.
pub struct MockRpcClient {
    responder: Responder,
    fail_batches_larger_than: Option<usize>,
    no_code: HashSet<Address>,
    batch_sizes: Mutex<Vec<usize>>,
    calls: Mutex<Vec<(CallMsg, Option<u64>)>>,
}

impl MockRpcClient {
    /// Answer every call with `value` as a `uint256`.
    pub fn returning(value: u64) -> Self {
        Self::with_responder(move |_| Ok(word(value)))
    }

    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&CallMsg) -> Result<Bytes, String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            fail_batches_larger_than: None,
            no_code: HashSet::new(),
            batch_sizes: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Lose every batch with more than `size` elements.
    pub fn failing_batches_larger_than(mut self, size: usize) -> Self {
        self.fail_batches_larger_than = Some(size);
        self
    }

    /// Lose every batch.
    pub fn failing_all_batches(self) -> Self {
        self.failing_batches_larger_than(0)
    }

    /// Report no code at `address`.
    pub fn without_code_at(mut self, address: Address) -> Self {
        self.no_code.insert(address);
        self
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<(CallMsg, Option<u64>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RpcClient for MockRpcClient {
    async fn call_contract(&self, msg: &CallMsg, block: Option<u64>) -> Result<Bytes, RpcError> {
        self.calls.lock().unwrap().push((msg.clone(), block));
        (self.responder)(msg).map_err(|message| RpcError::CallFailed {
            address: msg.to,
            source: message.into(),
        })
    }

    async fn batch_call(&self, batch: &mut [BatchElement]) -> Result<(), RpcError> {
        self.batch_sizes.lock().unwrap().push(batch.len());
        if self
            .fail_batches_larger_than
            .is_some_and(|limit| batch.len() > limit)
        {
            return Err(RpcError::BatchCallFailed {
                size: batch.len(),
                source: "batch too large".into(),
            });
        }
        for element in batch.iter_mut() {
            match (self.responder)(&element.call) {
                Ok(bytes) => element.result = Some(hex::encode_prefixed(&bytes)),
                Err(message) => element.error = Some(message),
            }
        }
        Ok(())
    }

    async fn code_at(&self, address: Address, _block: Option<u64>) -> Result<Bytes, RpcError> {
        if self.no_code.contains(&address) {
            Ok(Bytes::new())
        } else {
            Ok(Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]))
        }
    }
}

/// Mock HeadTracker with fixed heads
pub struct MockHeadTracker {
    pub latest: u64,
    pub finalized: u64,
}

#[async_trait]
impl HeadTracker for MockHeadTracker {
    async fn latest_and_finalized_block(&self) -> Result<(u64, u64), RpcError> {
        Ok((self.latest, self.finalized))
    }
}

/// Filter lifecycle call seen by the mock indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterCall {
    Registered(String),
    Unregistered(String),
}

/// Mock LogIndexer over an in-memory log list
///
/// Expressions are evaluated with `LogPrimitive::matches`. Finality is not
/// modelled: every stored log counts as confirmed.
#[derive(Default)]
pub struct MockLogIndexer {
    logs: Mutex<Vec<IndexedLog>>,
    filters: Mutex<HashMap<String, LogFilter>>,
    filter_calls: Mutex<Vec<FilterCall>>,
    queries: Mutex<Vec<(Vec<Expression<LogPrimitive>>, String)>>,
}

impl MockLogIndexer {
    pub fn with_logs(logs: Vec<IndexedLog>) -> Self {
        Self {
            logs: Mutex::new(logs),
            ..Self::default()
        }
    }

    pub fn filter_calls(&self) -> Vec<FilterCall> {
        self.filter_calls.lock().unwrap().clone()
    }

    pub fn filter(&self, name: &str) -> Option<LogFilter> {
        self.filters.lock().unwrap().get(name).cloned()
    }

    pub fn queries(&self) -> Vec<(Vec<Expression<LogPrimitive>>, String)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogIndexer for MockLogIndexer {
    async fn latest_log_by_event_sig_with_confs(
        &self,
        event_sig: B256,
        address: Address,
        _confirmations: Confirmations,
    ) -> Result<Option<IndexedLog>, RpcError> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|log| log.address == address && log.event_sig() == Some(event_sig))
            .max_by_key(|log| log.position())
            .cloned())
    }

    async fn filtered_logs(
        &self,
        filter: &[Expression<LogPrimitive>],
        limit_and_sort: &LimitAndSort,
        query_name: &str,
    ) -> Result<Vec<IndexedLog>, RpcError> {
        self.queries
            .lock()
            .unwrap()
            .push((filter.to_vec(), query_name.to_string()));
        let mut logs: Vec<IndexedLog> = self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|log| filter.iter().all(|e| e.evaluate(&|p: &LogPrimitive| p.matches(log))))
            .cloned()
            .collect();
        // Stored order is kept unless a sort is requested.
        for sort in limit_and_sort.sort_by.iter().rev() {
            let SortBy::Sequence(direction) = sort else {
                continue;
            };
            logs.sort_by_key(|log| (log.block_number, log.log_index));
            if *direction == SortDirection::Desc {
                logs.reverse();
            }
        }
        if limit_and_sort.count > 0 {
            logs.truncate(limit_and_sort.count as usize);
        }
        Ok(logs)
    }

    fn has_filter(&self, name: &str) -> bool {
        self.filters.lock().unwrap().contains_key(name)
    }

    async fn register_filter(&self, filter: LogFilter) -> Result<(), RpcError> {
        self.filter_calls
            .lock()
            .unwrap()
            .push(FilterCall::Registered(filter.name.clone()));
        self.filters.lock().unwrap().insert(filter.name.clone(), filter);
        Ok(())
    }

    async fn unregister_filter(&self, name: &str) -> Result<(), RpcError> {
        self.filter_calls
            .lock()
            .unwrap()
            .push(FilterCall::Unregistered(name.to_string()));
        self.filters.lock().unwrap().remove(name);
        Ok(())
    }
}

/// Route reader logs to the test output; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A service over the given collaborators, with heads at 100 (latest) and 90
/// (finalized).
pub struct Harness {
    pub service: ChainReaderService,
    pub client: Arc<MockRpcClient>,
    pub indexer: Arc<MockLogIndexer>,
}

impl Harness {
    pub fn new(config: &ChainReaderConfig, client: MockRpcClient, indexer: MockLogIndexer) -> Self {
        init_tracing();
        let client = Arc::new(client);
        let indexer = Arc::new(indexer);
        let service = ChainReaderService::new(
            config,
            client.clone(),
            Arc::new(MockHeadTracker {
                latest: 100,
                finalized: 90,
            }),
            indexer.clone(),
            BatchCallerConfigBuilder::with_defaults().build(),
        )
        .unwrap();
        Self {
            service,
            client,
            indexer,
        }
    }

    pub fn token(client: MockRpcClient, indexer: MockLogIndexer) -> Self {
        Self::new(&token_config(), client, indexer)
    }
}

pub fn bound_token(address: Address) -> BoundContract {
    BoundContract::new(address, "Token")
}
