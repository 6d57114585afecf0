// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Registry of contract bindings.
//!
//! The registry owns one [`ContractBinding`] per configured contract name and
//! the [`Lookup`] that resolves read identifiers. Binding changes take the
//! write lock; reads share the read lock, so a bind never interleaves with a
//! read of the same registry.

mod contract;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use alloy_primitives::Address;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

pub use contract::ContractBinding;

use crate::batch::{BatchCallResult, BatchCaller};
use crate::client::LogIndexer;
use crate::errors::{ChainReaderError, ConfigError, ReadError, RpcError};
use crate::query::{KeyFilter, LimitAndSort};
use crate::reader::{Lookup, Reader, SyncedFilter};
use crate::types::{BoundContract, ConfidenceLevel, Sequence};

/// One read inside a batched request.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRead {
    /// Read name
    pub read_name: String,
    /// Native parameters
    pub params: Value,
}

impl BatchRead {
    /// Read `read_name` with `params`.
    pub fn new(read_name: impl Into<String>, params: Value) -> Self {
        Self {
            read_name: read_name.into(),
            params,
        }
    }
}

/// Outcome of one [`BatchRead`].
#[derive(Debug)]
pub struct BatchReadResult {
    /// Read name
    pub read_name: String,
    /// Decoded native value, or this read's own error
    pub result: Result<Value, ReadError>,
}

/// Reads to execute, per bound contract.
pub type BatchGetLatestValuesRequest = HashMap<BoundContract, Vec<BatchRead>>;

/// Results per bound contract, in the order the reads were requested.
pub type BatchGetLatestValuesResult = HashMap<BoundContract, Vec<BatchReadResult>>;

/// Contract bindings by name, plus read identifier resolution.
pub struct BindingsRegistry {
    contracts: RwLock<HashMap<String, ContractBinding>>,
    lookup: Lookup,
    indexer: Arc<dyn LogIndexer>,
    batch_caller: Arc<dyn BatchCaller>,
}

impl std::fmt::Debug for BindingsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingsRegistry")
            .field("lookup", &self.lookup)
            .finish_non_exhaustive()
    }
}

impl BindingsRegistry {
    /// Empty registry.
    pub fn new(indexer: Arc<dyn LogIndexer>, batch_caller: Arc<dyn BatchCaller>) -> Self {
        Self {
            contracts: RwLock::new(HashMap::new()),
            lookup: Lookup::new(),
            indexer,
            batch_caller,
        }
    }

    fn binding_mut(&mut self, contract: &str) -> &mut ContractBinding {
        let indexer = &self.indexer;
        self.contracts
            .get_mut()
            .entry(contract.to_string())
            .or_insert_with(|| ContractBinding::new(contract, Arc::clone(indexer)))
    }

    /// Filter shared by `contract`'s events, creating the binding if needed.
    pub fn shared_filter(&mut self, contract: &str) -> Arc<SyncedFilter> {
        self.binding_mut(contract).shared_filter()
    }

    /// Add a reader under its contract name.
    pub fn add_reader(&mut self, reader: Box<dyn Reader>) -> Result<(), ConfigError> {
        let contract = reader.contract_name().to_string();
        let read_name = reader.read_name().to_string();
        self.binding_mut(&contract).add_reader(reader)?;
        self.lookup.add_read_name_for_contract(&contract, &read_name);
        Ok(())
    }

    /// Read identifier resolution.
    pub fn lookup(&self) -> &Lookup {
        &self.lookup
    }

    /// Bind every listed deployment.
    ///
    /// Fails with [`ConfigError::MissingContract`] before binding anything if
    /// a name is not configured.
    pub async fn bind(&self, bindings: &[BoundContract]) -> Result<(), ChainReaderError> {
        let mut contracts = self.contracts.write().await;
        let grouped = group_by_name(&contracts, bindings)?;

        for (name, addresses) in grouped {
            let Some(binding) = contracts.get_mut(name) else {
                continue;
            };
            let outcome = binding.bind(&addresses).await;
            for address in addresses {
                if binding.is_bound_to(address) {
                    self.lookup.bind_address_for_contract(name, address);
                }
            }
            outcome?;
        }
        Ok(())
    }

    /// Unbind every listed deployment.
    pub async fn unbind(&self, bindings: &[BoundContract]) -> Result<(), ChainReaderError> {
        let mut contracts = self.contracts.write().await;
        let grouped = group_by_name(&contracts, bindings)?;

        for (name, addresses) in grouped {
            let Some(binding) = contracts.get_mut(name) else {
                continue;
            };
            for address in &addresses {
                self.lookup.unbind_address_for_contract(name, *address);
            }
            binding.unbind(&addresses).await?;
        }
        Ok(())
    }

    /// Register the filters of every contract.
    pub async fn register_all(&self) -> Result<(), ChainReaderError> {
        let mut contracts = self.contracts.write().await;
        for binding in contracts.values_mut() {
            binding.register().await?;
        }
        Ok(())
    }

    /// Unregister the filters of every contract.
    pub async fn unregister_all(&self) -> Result<(), ChainReaderError> {
        let mut contracts = self.contracts.write().await;
        for binding in contracts.values_mut() {
            binding.unregister().await?;
        }
        Ok(())
    }

    /// Latest value of the read behind `read_identifier`.
    pub async fn get_latest_value(
        &self,
        read_identifier: &str,
        confidence: ConfidenceLevel,
        params: &Value,
    ) -> Result<Value, ChainReaderError> {
        let target = self.lookup.get_contract_for_read_name(read_identifier)?;
        let contracts = self.contracts.read().await;
        let reader = reader_of(&contracts, &target.contract, &target.read_name)?;
        reader
            .get_latest_value(target.address, confidence, params)
            .await
    }

    /// Execute many method reads as JSON-RPC batches at the latest block.
    ///
    /// Unknown contracts or reads, unbound addresses and event reads fail the
    /// whole request before anything is sent. Failures of individual calls land
    /// in their own result slot.
    pub async fn batch_get_latest_values(
        &self,
        request: &BatchGetLatestValuesRequest,
    ) -> Result<BatchGetLatestValuesResult, ChainReaderError> {
        if request.is_empty() {
            return Ok(HashMap::new());
        }
        let order: Vec<(&BoundContract, &Vec<BatchRead>)> = request.iter().collect();

        let contracts = self.contracts.read().await;
        let mut calls = Vec::new();
        for (bound, reads) in &order {
            let binding = contracts
                .get(&bound.name)
                .ok_or_else(|| ConfigError::missing_contract(&bound.name))?;
            for read in reads.iter() {
                let reader = binding.reader(&read.read_name)?;
                calls.push(reader.batch_call(bound.address, &read.params)?);
            }
        }
        drop(contracts);

        debug!(contracts = order.len(), calls = calls.len(), "Dispatching batch read");
        let grouped = self.batch_caller.batch_call(None, calls).await?;
        let mut cursors: HashMap<String, std::vec::IntoIter<BatchCallResult>> = grouped
            .into_iter()
            .map(|(name, results)| (name, results.into_iter()))
            .collect();

        let mut out = HashMap::with_capacity(order.len());
        for (bound, reads) in order {
            let mut results = Vec::with_capacity(reads.len());
            for read in reads {
                let slot = cursors
                    .get_mut(&bound.name)
                    .and_then(|results| results.next())
                    .ok_or_else(|| RpcError::BatchElementFailed {
                        message: format!("no result for {}.{}", bound.name, read.read_name),
                    })?;
                results.push(BatchReadResult {
                    read_name: read.read_name.clone(),
                    result: slot.result,
                });
            }
            out.insert(bound.clone(), results);
        }
        Ok(out)
    }

    /// Query the event read `filter.key` of a bound contract.
    pub async fn query_key(
        &self,
        contract: &BoundContract,
        filter: &KeyFilter,
        limit_and_sort: &LimitAndSort,
    ) -> Result<Vec<Sequence<Value>>, ChainReaderError> {
        let contracts = self.contracts.read().await;
        let reader = reader_of(&contracts, &contract.name, &filter.key)?;
        reader
            .query_key(contract.address, filter, limit_and_sort)
            .await
    }
}

fn reader_of<'a>(
    contracts: &'a HashMap<String, ContractBinding>,
    contract: &str,
    read_name: &str,
) -> Result<&'a dyn Reader, ConfigError> {
    contracts
        .get(contract)
        .ok_or_else(|| ConfigError::missing_contract(contract))?
        .reader(read_name)
}

/// Addresses per contract name, rejecting names that are not configured.
fn group_by_name<'a>(
    contracts: &HashMap<String, ContractBinding>,
    bindings: &'a [BoundContract],
) -> Result<BTreeMap<&'a str, Vec<Address>>, ConfigError> {
    let mut grouped: BTreeMap<&str, Vec<Address>> = BTreeMap::new();
    for binding in bindings {
        if !contracts.contains_key(&binding.name) {
            return Err(ConfigError::missing_contract(&binding.name));
        }
        grouped
            .entry(binding.name.as_str())
            .or_default()
            .push(binding.address);
    }
    Ok(grouped)
}
