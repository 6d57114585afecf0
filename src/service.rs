// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! The contract reader service.
//!
//! [`ChainReaderService`] is built once from a [`ChainReaderConfig`]: every
//! declared read gets its codec entries and a reader. After that the set of
//! reads is fixed; only the bound addresses change.
//!
//! # Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use alloy_provider::ProviderBuilder;
//! use evm_contract_reader::{
//!     AlloyRpcClient, BatchCallerConfigBuilder, BoundContract, ChainReaderService,
//!     ConfidenceLevel,
//! };
//!
//! let provider = ProviderBuilder::new().connect_http("https://eth.llamarpc.com".parse()?);
//! let client = Arc::new(AlloyRpcClient::new(provider));
//! let service = ChainReaderService::new(
//!     &config,
//!     client.clone(),
//!     client,
//!     log_indexer,
//!     BatchCallerConfigBuilder::with_defaults().build(),
//! )?;
//!
//! let vault = BoundContract::new(vault_address, "Vault");
//! service.bind(&[vault.clone()]).await?;
//! service.start().await?;
//!
//! let assets: String = service
//!     .get_latest_value(&vault.read_identifier("totalAssets"), ConfidenceLevel::Finalized, &())
//!     .await?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_json_abi::JsonAbi;
use alloy_primitives::B256;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{info, Instrument};

use crate::batch::DynamicLimitedBatchCaller;
use crate::bindings::{BatchGetLatestValuesRequest, BatchGetLatestValuesResult, BindingsRegistry};
use crate::client::{filter_name, HeadTracker, LogFilter, LogIndexer, RpcClient};
use crate::codec::{wrap_item_type, Codec, CodecEntry};
use crate::config::{BatchCallerConfig, ChainReaderConfig, ChainReaderDefinition, ReadType};
use crate::errors::{ChainReaderError, CodecError, ConfigError};
use crate::query::{KeyFilter, LimitAndSort};
use crate::reader::{filterable_fields, EventBinding, EventField, EventFilter, MethodBinding, SyncedFilter};
use crate::spans;
use crate::types::{BoundContract, ConfidenceLevel, Sequence};

/// A read whose codec entries exist but whose reader is not built yet.
enum PendingRead<'a> {
    Method {
        contract: &'a str,
        read_name: &'a str,
        definition: &'a ChainReaderDefinition,
    },
    Event {
        contract: &'a str,
        read_name: &'a str,
        definition: &'a ChainReaderDefinition,
        event_sig: B256,
        topics: BTreeMap<String, EventField>,
        data_words: BTreeMap<String, EventField>,
    },
}

/// Reads contract state and events through bound addresses.
pub struct ChainReaderService {
    registry: BindingsRegistry,
    codec: Arc<Codec>,
}

impl std::fmt::Debug for ChainReaderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainReaderService")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl ChainReaderService {
    /// Build codec entries and readers for every read in `config`.
    ///
    /// Fails on unparsable ABIs, reads naming functions or events the ABI
    /// does not declare, and inconsistent event definitions.
    pub fn new(
        config: &ChainReaderConfig,
        client: Arc<dyn RpcClient>,
        head_tracker: Arc<dyn HeadTracker>,
        indexer: Arc<dyn LogIndexer>,
        batch_config: BatchCallerConfig,
    ) -> Result<Self, ChainReaderError> {
        let mut codec = Codec::new();
        let mut pending = Vec::new();
        for (contract, contract_config) in &config.contracts {
            let abi = contract_config.abi()?;
            for (read_name, definition) in &contract_config.configs {
                pending.push(add_codec_entries(
                    &mut codec, &abi, contract, read_name, definition,
                )?);
            }
        }
        let codec = Arc::new(codec);

        let batch_caller = Arc::new(DynamicLimitedBatchCaller::new(
            Arc::clone(&client),
            Arc::clone(&codec),
            batch_config,
        ));
        let mut registry = BindingsRegistry::new(Arc::clone(&indexer), batch_caller);

        let reads = pending.len();
        for read in pending {
            match read {
                PendingRead::Method {
                    contract,
                    read_name,
                    definition,
                } => {
                    let binding = MethodBinding::new(
                        contract,
                        read_name,
                        Arc::clone(&client),
                        Arc::clone(&head_tracker),
                        Arc::clone(&codec),
                        definition.confidence_mapping(),
                    );
                    registry.add_reader(Box::new(binding))?;
                }
                PendingRead::Event {
                    contract,
                    read_name,
                    definition,
                    event_sig,
                    topics,
                    data_words,
                } => {
                    let polling = definition
                        .event_definitions
                        .as_ref()
                        .and_then(|d| d.polling_filter.as_ref());
                    let filter = match polling {
                        Some(polling) => EventFilter::Private(SyncedFilter::from_filter(LogFilter {
                            name: filter_name(contract, &[read_name]),
                            topic2: polling.topic2.clone(),
                            topic3: polling.topic3.clone(),
                            topic4: polling.topic4.clone(),
                            retention: polling.retention.map(Duration::from_secs),
                            max_logs_kept: polling.max_logs_kept,
                            logs_per_block: polling.logs_per_block,
                            ..LogFilter::default()
                        })),
                        None => EventFilter::Shared(registry.shared_filter(contract)),
                    };
                    let binding = EventBinding::new(
                        contract,
                        read_name,
                        event_sig,
                        Arc::clone(&indexer),
                        Arc::clone(&codec),
                        definition.confidence_mapping(),
                        filter,
                    )
                    .with_fields(topics, data_words);
                    registry.add_reader(Box::new(binding))?;
                }
            }
        }

        info!(
            contracts = config.contracts.len(),
            reads = reads,
            "Contract reader configured"
        );
        Ok(Self { registry, codec })
    }

    /// Register log filters for everything bound, now and on later binds.
    pub async fn start(&self) -> Result<(), ChainReaderError> {
        self.registry.register_all().await?;
        info!("Contract reader started");
        Ok(())
    }

    /// Unregister every log filter.
    pub async fn close(&self) -> Result<(), ChainReaderError> {
        self.registry.unregister_all().await?;
        info!("Contract reader closed");
        Ok(())
    }

    /// Bind deployments to their configured contract names.
    pub async fn bind(&self, bindings: &[BoundContract]) -> Result<(), ChainReaderError> {
        self.registry
            .bind(bindings)
            .instrument(spans::bind(bindings.len()))
            .await
    }

    /// Remove deployments.
    pub async fn unbind(&self, bindings: &[BoundContract]) -> Result<(), ChainReaderError> {
        self.registry
            .unbind(bindings)
            .instrument(spans::unbind(bindings.len()))
            .await
    }

    /// Latest value of the read behind `read_identifier`, deserialized into `T`.
    ///
    /// `params` is anything serializable into the read's native parameter
    /// shape; pass `&()` for reads without parameters.
    pub async fn get_latest_value<P, T>(
        &self,
        read_identifier: &str,
        confidence: ConfidenceLevel,
        params: &P,
    ) -> Result<T, ChainReaderError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        async move {
            let params = to_native(params, read_identifier)?;
            let value = self
                .registry
                .get_latest_value(read_identifier, confidence, &params)
                .await?;
            from_native(value, read_identifier)
        }
        .instrument(spans::get_latest_value(read_identifier, confidence))
        .await
    }

    /// Latest values of many method reads, sent as JSON-RPC batches.
    pub async fn batch_get_latest_values(
        &self,
        request: &BatchGetLatestValuesRequest,
    ) -> Result<BatchGetLatestValuesResult, ChainReaderError> {
        let calls = request.values().map(Vec::len).sum();
        self.registry
            .batch_get_latest_values(request)
            .instrument(spans::batch_get_latest_values(request.len(), calls))
            .await
    }

    /// Logs of the event read `filter.key` on `contract`, decoded into `T`.
    pub async fn query_key<T: DeserializeOwned>(
        &self,
        contract: &BoundContract,
        filter: &KeyFilter,
        limit_and_sort: &LimitAndSort,
    ) -> Result<Vec<Sequence<T>>, ChainReaderError> {
        async move {
            let item = wrap_item_type(&contract.name, &filter.key, false);
            let sequences = self
                .registry
                .query_key(contract, filter, limit_and_sort)
                .await?;
            sequences
                .into_iter()
                .map(|sequence| {
                    Ok(Sequence {
                        cursor: sequence.cursor,
                        head: sequence.head,
                        data: from_native(sequence.data, &item)?,
                    })
                })
                .collect::<Result<Vec<_>, ChainReaderError>>()
        }
        .instrument(spans::query_key(&contract.name, contract.address, &filter.key))
        .await
    }

    /// Codec holding every read's entries.
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Underlying registry.
    pub fn registry(&self) -> &BindingsRegistry {
        &self.registry
    }
}

fn add_codec_entries<'a>(
    codec: &mut Codec,
    abi: &JsonAbi,
    contract: &'a str,
    read_name: &'a str,
    definition: &'a ChainReaderDefinition,
) -> Result<PendingRead<'a>, ChainReaderError> {
    let name = &definition.chain_specific_name;
    match definition.read_type {
        ReadType::Method => {
            let function = abi
                .function(name)
                .and_then(|overloads| overloads.first())
                .ok_or_else(|| {
                    ConfigError::invalid(format!("method {name} not found in ABI of {contract}"))
                })?;
            codec.add_entry(
                wrap_item_type(contract, read_name, true),
                CodecEntry::method_params(function)?
                    .with_modifier(definition.input_modifications.clone()),
            );
            codec.add_entry(
                wrap_item_type(contract, read_name, false),
                CodecEntry::method_return(function)?
                    .with_modifier(definition.output_modifications.clone()),
            );
            Ok(PendingRead::Method {
                contract,
                read_name,
                definition,
            })
        }
        ReadType::Event => {
            let event = abi
                .event(name)
                .and_then(|overloads| overloads.first())
                .ok_or_else(|| {
                    ConfigError::invalid(format!("event {name} not found in ABI of {contract}"))
                })?;
            let event_definitions = definition.event_definitions.clone().unwrap_or_default();
            let (topics, data_words) = filterable_fields(event, &event_definitions)?;

            codec.add_entry(
                wrap_item_type(contract, read_name, false),
                CodecEntry::event(event)?.with_modifier(definition.output_modifications.clone()),
            );
            let params = topics
                .values()
                .chain(data_words.values())
                .map(|field| field.descriptor.clone())
                .collect();
            codec.add_entry(
                wrap_item_type(contract, read_name, true),
                CodecEntry::new(params).with_modifier(definition.input_modifications.clone()),
            );
            for (generic, field) in topics.iter().chain(data_words.iter()) {
                codec.add_entry(
                    wrap_item_type(contract, &format!("{read_name}.{generic}"), true),
                    CodecEntry::single(field.descriptor.clone()),
                );
            }

            Ok(PendingRead::Event {
                contract,
                read_name,
                definition,
                event_sig: event.selector(),
                topics,
                data_words,
            })
        }
    }
}

fn to_native<P: Serialize + ?Sized>(params: &P, read_identifier: &str) -> Result<Value, CodecError> {
    serde_json::to_value(params).map_err(|e| {
        CodecError::invalid_type(format!(
            "params for {read_identifier} are not representable: {e}"
        ))
    })
}

fn from_native<T: DeserializeOwned>(value: Value, item: &str) -> Result<T, ChainReaderError> {
    serde_json::from_value(value).map_err(|e| CodecError::conversion_failed(item, e).into())
}
