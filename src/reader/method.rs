// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Reads served by `eth_call`.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use alloy_primitives::Address;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{confidence_to_confirmations, Reader};
use crate::batch::Call;
use crate::client::{CallMsg, HeadTracker, RpcClient};
use crate::codec::{wrap_item_type, Codec};
use crate::errors::{ChainReaderError, ConfigError, ReadError, ReadErrorKind};
use crate::query::{KeyFilter, LimitAndSort};
use crate::types::{ConfidenceLevel, Confirmations, Sequence};

/// A contract method read through `eth_call`.
pub struct MethodBinding {
    contract_name: String,
    method_name: String,
    client: Arc<dyn RpcClient>,
    head_tracker: Arc<dyn HeadTracker>,
    codec: Arc<Codec>,
    confirmations: BTreeMap<ConfidenceLevel, Confirmations>,
    bound: HashSet<Address>,
}

impl std::fmt::Debug for MethodBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodBinding")
            .field("contract_name", &self.contract_name)
            .field("method_name", &self.method_name)
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}

impl MethodBinding {
    /// Create a binding for `contract_name.method_name`.
    ///
    /// The codec must hold the `params` and `return` entries of the read.
    pub fn new(
        contract_name: impl Into<String>,
        method_name: impl Into<String>,
        client: Arc<dyn RpcClient>,
        head_tracker: Arc<dyn HeadTracker>,
        codec: Arc<Codec>,
        confirmations: BTreeMap<ConfidenceLevel, Confirmations>,
    ) -> Self {
        Self {
            contract_name: contract_name.into(),
            method_name: method_name.into(),
            client,
            head_tracker,
            codec,
            confirmations,
            bound: HashSet::new(),
        }
    }

    fn ensure_bound(&self, address: Address) -> Result<(), ConfigError> {
        if self.bound.contains(&address) {
            Ok(())
        } else {
            Err(ConfigError::address_not_bound(
                address,
                &self.contract_name,
                &self.method_name,
            ))
        }
    }

    /// Block to read at, `None` for latest.
    async fn block_for(&self, confidence: ConfidenceLevel) -> Result<Option<u64>, ChainReaderError> {
        let confirmations = confidence_to_confirmations(
            &self.confirmations,
            confidence,
            &self.contract_name,
            &self.method_name,
        )?;
        match confirmations {
            Confirmations::Depth(0) => Ok(None),
            Confirmations::Finalized => {
                let (_, finalized) = self.head_tracker.latest_and_finalized_block().await?;
                Ok(Some(finalized))
            }
            Confirmations::Depth(depth) => {
                let (latest, _) = self.head_tracker.latest_and_finalized_block().await?;
                Ok(Some(latest.saturating_sub(depth)))
            }
        }
    }

    fn read_error(
        &self,
        kind: ReadErrorKind,
        address: Address,
        params: &Value,
        block: Option<u64>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> ReadError {
        ReadError::new(kind, address, &self.contract_name, &self.method_name, source)
            .with_params(params)
            .with_return_type(wrap_item_type(&self.contract_name, &self.method_name, false))
            .with_block(block)
    }
}

#[async_trait]
impl Reader for MethodBinding {
    fn contract_name(&self) -> &str {
        &self.contract_name
    }

    fn read_name(&self) -> &str {
        &self.method_name
    }

    async fn bind(&mut self, address: Address) -> Result<(), ChainReaderError> {
        if self.bound.contains(&address) {
            return Ok(());
        }
        let code = self.client.code_at(address, None).await?;
        if code.is_empty() {
            return Err(ConfigError::NoContractExists { address }.into());
        }
        debug!(
            contract = %self.contract_name,
            method = %self.method_name,
            address = %address,
            "Bound method"
        );
        self.bound.insert(address);
        Ok(())
    }

    fn unbind(&mut self, address: Address) {
        self.bound.remove(&address);
    }

    async fn register(&self) -> Result<(), ChainReaderError> {
        Ok(())
    }

    async fn unregister(&self) -> Result<(), ChainReaderError> {
        Ok(())
    }

    async fn get_latest_value(
        &self,
        address: Address,
        confidence: ConfidenceLevel,
        params: &Value,
    ) -> Result<Value, ChainReaderError> {
        self.ensure_bound(address)?;

        let params_item = wrap_item_type(&self.contract_name, &self.method_name, true);
        let data = self
            .codec
            .encode_value(params, &params_item)
            .map_err(|e| self.read_error(ReadErrorKind::Encode, address, params, None, e))?;

        let block = self.block_for(confidence).await?;
        let output = self
            .client
            .call_contract(&CallMsg { to: address, data }, block)
            .await
            .map_err(|e| self.read_error(ReadErrorKind::Transport, address, params, block, e))?;

        let return_item = wrap_item_type(&self.contract_name, &self.method_name, false);
        self.codec
            .decode_value(&output, &return_item)
            .map_err(|e| {
                let error = if output.is_empty() {
                    self.read_error(ReadErrorKind::EmptyOutput, address, params, block, e)
                } else {
                    self.read_error(ReadErrorKind::Decode, address, params, block, e)
                        .with_result(output.clone())
                };
                ChainReaderError::from(error)
            })
    }

    fn batch_call(&self, address: Address, params: &Value) -> Result<Call, ChainReaderError> {
        self.ensure_bound(address)?;
        Ok(Call {
            contract_address: address,
            contract_name: self.contract_name.clone(),
            read_name: self.method_name.clone(),
            params: params.clone(),
        })
    }

    async fn query_key(
        &self,
        _address: Address,
        _filter: &KeyFilter,
        _limit_and_sort: &LimitAndSort,
    ) -> Result<Vec<Sequence<Value>>, ChainReaderError> {
        // Methods have no history to query.
        Ok(Vec::new())
    }
}
