// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Reads served from indexed event logs.
//!
//! An event read returns the newest matching log, decoded into the event's
//! native shape. Arguments can be filtered on when they are
//!
//! - indexed (matched against `topics[n]`), under the generic name configured
//!   for them or their on-chain name, or
//! - listed as generic data words (matched against a fixed payload word).
//!
//! Topic filters go to the log indexer. Data words are compared after the
//! logs come back.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use alloy_json_abi::Event;
use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{confidence_to_confirmations, Reader, SyncedFilter};
use crate::batch::Call;
use crate::client::LogIndexer;
use crate::codec::{head_words, wrap_item_type, Codec, CodecEntry, FieldDescriptor};
use crate::config::EventDefinitions;
use crate::errors::{ChainReaderError, CodecError, ConfigError, ReadError, ReadErrorKind};
use crate::query::{
    Expression, HashedValueComparator, KeyFilter, LimitAndSort, LogPrimitive, Primitive,
};
use crate::types::{ConfidenceLevel, Confirmations, Head, IndexedLog, Sequence};

/// A filterable event argument.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EventField {
    /// Argument name in the ABI
    pub(crate) on_chain_name: String,
    /// Topic index (`1..=3`) or payload word index
    pub(crate) index: usize,
    /// Field used to encode filter values
    pub(crate) descriptor: FieldDescriptor,
}

/// Filterable topics and data words of `event`, keyed by generic name.
pub(crate) fn filterable_fields(
    event: &Event,
    definitions: &EventDefinitions,
) -> Result<(BTreeMap<String, EventField>, BTreeMap<String, EventField>), ChainReaderError> {
    let entry = CodecEntry::event(event)?;
    let mut topics = BTreeMap::new();
    let mut data_words = BTreeMap::new();
    let mut topic_index = 0;
    let mut word_index = 0;

    for field in entry.fields() {
        let descriptor = FieldDescriptor {
            indexed: false,
            ..field.clone()
        };
        if field.indexed {
            topic_index += 1;
            let generic = definitions
                .generic_topic_names
                .get(&field.name)
                .cloned()
                .unwrap_or_else(|| field.name.clone());
            topics.insert(
                generic,
                EventField {
                    on_chain_name: field.name.clone(),
                    index: topic_index,
                    descriptor,
                },
            );
            continue;
        }

        if let Some(generic) = definitions.generic_data_word_names.get(&field.name) {
            if !field.is_word() {
                return Err(ConfigError::invalid(format!(
                    "data word {} of event {} must be a single static word, got {}",
                    field.name,
                    event.name,
                    field.ty.sol_type_name()
                ))
                .into());
            }
            if topics.contains_key(generic) {
                return Err(ConfigError::invalid(format!(
                    "generic name {generic} of event {} is used for a topic and a data word",
                    event.name
                ))
                .into());
            }
            data_words.insert(
                generic.clone(),
                EventField {
                    on_chain_name: field.name.clone(),
                    index: word_index,
                    descriptor,
                },
            );
        }
        word_index += head_words(&field.ty);
    }

    let declared = |name: &str, indexed: bool| {
        entry
            .fields()
            .iter()
            .any(|f| f.name == name && f.indexed == indexed)
    };
    for name in definitions.generic_topic_names.keys() {
        if !declared(name, true) {
            return Err(ConfigError::invalid(format!(
                "{name} is not an indexed argument of event {}",
                event.name
            ))
            .into());
        }
    }
    for name in definitions.generic_data_word_names.keys() {
        if !declared(name, false) {
            return Err(ConfigError::invalid(format!(
                "{name} is not a non-indexed argument of event {}",
                event.name
            ))
            .into());
        }
    }

    Ok((topics, data_words))
}

/// Which log filter an event is indexed through.
#[derive(Debug)]
pub enum EventFilter {
    /// The contract-wide filter, registered by the contract binding
    Shared(Arc<SyncedFilter>),
    /// A filter of its own, registered by the event binding
    Private(SyncedFilter),
}

impl EventFilter {
    fn inner(&self) -> &SyncedFilter {
        match self {
            EventFilter::Shared(filter) => filter,
            EventFilter::Private(filter) => filter,
        }
    }
}

/// A contract event read through the log indexer.
pub struct EventBinding {
    contract_name: String,
    event_name: String,
    event_sig: B256,
    indexer: Arc<dyn LogIndexer>,
    codec: Arc<Codec>,
    confirmations: BTreeMap<ConfidenceLevel, Confirmations>,
    topics: BTreeMap<String, EventField>,
    data_words: BTreeMap<String, EventField>,
    filter: EventFilter,
    bound: HashSet<Address>,
}

impl std::fmt::Debug for EventBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBinding")
            .field("contract_name", &self.contract_name)
            .field("event_name", &self.event_name)
            .field("event_sig", &self.event_sig)
            .field("topics", &self.topics.keys().collect::<Vec<_>>())
            .field("data_words", &self.data_words.keys().collect::<Vec<_>>())
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}

impl EventBinding {
    /// Create a binding for `contract_name.event_name`.
    ///
    /// The event signature is added to `filter` right away.
    pub fn new(
        contract_name: impl Into<String>,
        event_name: impl Into<String>,
        event_sig: B256,
        indexer: Arc<dyn LogIndexer>,
        codec: Arc<Codec>,
        confirmations: BTreeMap<ConfidenceLevel, Confirmations>,
        filter: EventFilter,
    ) -> Self {
        filter.inner().add_event_sig(event_sig);
        Self {
            contract_name: contract_name.into(),
            event_name: event_name.into(),
            event_sig,
            indexer,
            codec,
            confirmations,
            topics: BTreeMap::new(),
            data_words: BTreeMap::new(),
            filter,
            bound: HashSet::new(),
        }
    }

    pub(crate) fn with_fields(
        mut self,
        topics: BTreeMap<String, EventField>,
        data_words: BTreeMap<String, EventField>,
    ) -> Self {
        self.topics = topics;
        self.data_words = data_words;
        self
    }

    /// `topics[0]` of every log this binding reads.
    pub fn event_sig(&self) -> B256 {
        self.event_sig
    }

    fn ensure_bound(&self, address: Address) -> Result<(), ConfigError> {
        if self.bound.contains(&address) {
            Ok(())
        } else {
            Err(ConfigError::address_not_bound(
                address,
                &self.contract_name,
                &self.event_name,
            ))
        }
    }

    fn query_name(&self, address: Address) -> String {
        format!("{}-{}-{}", self.contract_name, address, self.event_name)
    }

    fn field_item(&self, generic: &str) -> String {
        wrap_item_type(
            &self.contract_name,
            &format!("{}.{generic}", self.event_name),
            true,
        )
    }

    fn confirmations_for(&self, level: ConfidenceLevel) -> Result<Confirmations, ConfigError> {
        confidence_to_confirmations(
            &self.confirmations,
            level,
            &self.contract_name,
            &self.event_name,
        )
    }

    fn read_error(
        &self,
        kind: ReadErrorKind,
        address: Address,
        params: &Value,
        block: Option<u64>,
        source: CodecError,
    ) -> ReadError {
        ReadError::new(kind, address, &self.contract_name, &self.event_name, source)
            .with_params(params)
            .with_return_type(wrap_item_type(&self.contract_name, &self.event_name, false))
            .with_block(block)
    }

    /// Topic and data word equality filters derived from native params.
    fn param_filters(&self, params: &Value) -> Result<(Vec<(usize, B256)>, Vec<(usize, B256)>), CodecError> {
        let mut topic_filters = Vec::new();
        let mut word_filters = Vec::new();
        if params.is_null() {
            return Ok((topic_filters, word_filters));
        }

        let params_item = wrap_item_type(&self.contract_name, &self.event_name, true);
        let on_chain = self.codec.to_on_chain(params, &params_item)?;
        let Value::Object(on_chain) = on_chain else {
            return Err(CodecError::invalid_type(format!(
                "{params_item}: expected an object of event arguments"
            )));
        };

        let lookup = |field: &EventField| {
            on_chain
                .get(&field.on_chain_name)
                .filter(|value| !value.is_null())
        };
        for (generic, field) in &self.topics {
            if let Some(value) = lookup(field) {
                topic_filters.push((field.index, self.codec.encode_topic(value, &self.field_item(generic))?));
            }
        }
        for (generic, field) in &self.data_words {
            if let Some(value) = lookup(field) {
                word_filters.push((field.index, self.codec.encode_topic(value, &self.field_item(generic))?));
            }
        }
        Ok((topic_filters, word_filters))
    }

    /// Translate a chain-agnostic primitive into the indexer's vocabulary.
    fn remap_primitive(&self, primitive: Primitive) -> Result<LogPrimitive, ChainReaderError> {
        Ok(match primitive {
            Primitive::Comparator {
                name,
                value_comparators,
            } => {
                let (field, by_topic) = match (self.topics.get(&name), self.data_words.get(&name)) {
                    (Some(field), _) => (field, true),
                    (None, Some(field)) => (field, false),
                    (None, None) => {
                        return Err(ConfigError::invalid(format!(
                            "{name} is not a filterable field of {}.{}",
                            self.contract_name, self.event_name
                        ))
                        .into())
                    }
                };
                let item = self.field_item(&name);
                let value_comparators = value_comparators
                    .into_iter()
                    .map(|c| {
                        Ok(HashedValueComparator {
                            value: self.codec.encode_topic(&c.value, &item)?,
                            operator: c.operator,
                        })
                    })
                    .collect::<Result<Vec<_>, CodecError>>()?;
                if by_topic {
                    LogPrimitive::EventByTopic {
                        topic: field.index,
                        value_comparators,
                    }
                } else {
                    LogPrimitive::EventByWord {
                        word_index: field.index,
                        value_comparators,
                    }
                }
            }
            Primitive::Block { block, operator } => LogPrimitive::Block { block, operator },
            Primitive::Confidence(level) => LogPrimitive::Confirmations(self.confirmations_for(level)?),
            Primitive::Timestamp {
                timestamp,
                operator,
            } => LogPrimitive::Timestamp {
                timestamp,
                operator,
            },
            Primitive::TxHash(hash) => LogPrimitive::TxHash(hash),
        })
    }

    fn decode(&self, log: &IndexedLog, params: &Value) -> Result<Value, ChainReaderError> {
        let return_item = wrap_item_type(&self.contract_name, &self.event_name, false);
        self.codec
            .decode_log::<Value>(&log.topics, &log.data, &return_item)
            .map_err(|e| {
                let error = self
                    .read_error(
                        ReadErrorKind::Decode,
                        log.address,
                        params,
                        Some(log.block_number),
                        e,
                    )
                    .with_result(log.data.clone());
                ChainReaderError::from(error)
            })
    }
}

#[async_trait]
impl Reader for EventBinding {
    fn contract_name(&self) -> &str {
        &self.contract_name
    }

    fn read_name(&self) -> &str {
        &self.event_name
    }

    async fn bind(&mut self, address: Address) -> Result<(), ChainReaderError> {
        if self.bound.insert(address) {
            if let EventFilter::Private(filter) = &self.filter {
                filter.add_addresses(&[address]);
            }
            debug!(
                contract = %self.contract_name,
                event = %self.event_name,
                address = %address,
                "Bound event"
            );
        }
        Ok(())
    }

    fn unbind(&mut self, address: Address) {
        if self.bound.remove(&address) {
            if let EventFilter::Private(filter) = &self.filter {
                filter.remove_addresses(&[address]);
            }
        }
    }

    async fn register(&self) -> Result<(), ChainReaderError> {
        match &self.filter {
            EventFilter::Private(filter) if !self.bound.is_empty() => {
                filter.register(self.indexer.as_ref()).await?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn unregister(&self) -> Result<(), ChainReaderError> {
        if let EventFilter::Private(filter) = &self.filter {
            filter.unregister(self.indexer.as_ref()).await?;
        }
        Ok(())
    }

    async fn get_latest_value(
        &self,
        address: Address,
        confidence: ConfidenceLevel,
        params: &Value,
    ) -> Result<Value, ChainReaderError> {
        self.ensure_bound(address)?;
        let confirmations = self.confirmations_for(confidence)?;
        let (topic_filters, word_filters) = self
            .param_filters(params)
            .map_err(|e| self.read_error(ReadErrorKind::Encode, address, params, None, e))?;

        let latest = if topic_filters.is_empty() && word_filters.is_empty() {
            self.indexer
                .latest_log_by_event_sig_with_confs(self.event_sig, address, confirmations)
                .await?
        } else {
            let mut expressions: Vec<Expression<LogPrimitive>> = vec![
                LogPrimitive::Address(address).into(),
                LogPrimitive::EventSig(self.event_sig).into(),
                LogPrimitive::Confirmations(confirmations).into(),
            ];
            expressions.extend(topic_filters.into_iter().map(|(topic, word)| {
                Expression::from(LogPrimitive::EventByTopic {
                    topic,
                    value_comparators: vec![HashedValueComparator::equal_to(word)],
                })
            }));
            // Data words are matched here, so only a topic-only query can stop at one log.
            let limit_and_sort = LimitAndSort::latest(u64::from(word_filters.is_empty()));
            self.indexer
                .filtered_logs(&expressions, &limit_and_sort, &self.query_name(address))
                .await?
                .into_iter()
                .filter(|log| {
                    word_filters
                        .iter()
                        .all(|(index, word)| log.data_word(*index) == Some(*word))
                })
                .max_by_key(IndexedLog::position)
        };

        let log = latest.ok_or_else(|| {
            ChainReaderError::not_found(format!(
                "no {}.{} log at {address} with {confidence} confidence",
                self.contract_name, self.event_name
            ))
        })?;
        self.decode(&log, params)
    }

    fn batch_call(&self, _address: Address, _params: &Value) -> Result<Call, ChainReaderError> {
        Err(ConfigError::invalid(format!(
            "{}.{} is an event and cannot be batched",
            self.contract_name, self.event_name
        ))
        .into())
    }

    async fn query_key(
        &self,
        address: Address,
        filter: &KeyFilter,
        limit_and_sort: &LimitAndSort,
    ) -> Result<Vec<Sequence<Value>>, ChainReaderError> {
        self.ensure_bound(address)?;

        let mut expressions: Vec<Expression<LogPrimitive>> = vec![
            LogPrimitive::Address(address).into(),
            LogPrimitive::EventSig(self.event_sig).into(),
        ];
        for expression in &filter.expressions {
            expressions.push(
                expression
                    .clone()
                    .try_map(&mut |primitive| self.remap_primitive(primitive))?,
            );
        }

        let logs = self
            .indexer
            .filtered_logs(&expressions, limit_and_sort, &self.query_name(address))
            .await?;
        logs.iter()
            .map(|log| {
                Ok(Sequence {
                    cursor: log.cursor(),
                    head: Head::of_log(log),
                    data: self.decode(log, &Value::Null)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swap() -> Event {
        Event::parse(
            "event Swap(address indexed sender, address indexed recipient, int256 amount0, int256 amount1, uint160 sqrtPriceX96, uint128 liquidity, int24 tick)",
        )
        .unwrap()
    }

    #[test]
    fn indexed_arguments_are_always_filterable() {
        let (topics, data_words) = filterable_fields(&swap(), &EventDefinitions::default()).unwrap();
        assert_eq!(topics["sender"].index, 1);
        assert_eq!(topics["recipient"].index, 2);
        assert!(data_words.is_empty());
    }

    #[test]
    fn generic_names_and_word_offsets() {
        let definitions = EventDefinitions {
            generic_topic_names: BTreeMap::from([("recipient".to_string(), "To".to_string())]),
            generic_data_word_names: BTreeMap::from([
                ("amount1".to_string(), "AmountOut".to_string()),
                ("tick".to_string(), "Tick".to_string()),
            ]),
            polling_filter: None,
        };
        let (topics, data_words) = filterable_fields(&swap(), &definitions).unwrap();

        assert_eq!(topics["To"].on_chain_name, "recipient");
        assert_eq!(topics["To"].index, 2);
        assert!(topics.contains_key("sender"));
        assert_eq!(data_words["AmountOut"].index, 1);
        assert_eq!(data_words["Tick"].index, 4);
        assert!(!data_words["Tick"].descriptor.indexed);
    }

    #[test]
    fn dynamic_data_words_are_rejected() {
        let event = Event::parse("event Note(address indexed from, string memo, uint256 id)").unwrap();
        let definitions = EventDefinitions {
            generic_data_word_names: BTreeMap::from([("memo".to_string(), "Memo".to_string())]),
            ..EventDefinitions::default()
        };
        let err = filterable_fields(&event, &definitions).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn unknown_topic_names_are_rejected() {
        let definitions = EventDefinitions {
            generic_topic_names: BTreeMap::from([("amount0".to_string(), "In".to_string())]),
            ..EventDefinitions::default()
        };
        let err = filterable_fields(&swap(), &definitions).unwrap_err();
        assert!(err.to_string().contains("amount0"));
    }
}
