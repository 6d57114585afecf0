// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use super::ComparisonOperator;
use crate::types::{Confirmations, IndexedLog};

/// A topic or data word compared against a log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedValueComparator {
    /// Encoded word
    pub value: B256,
    /// Comparison, on the big-endian word
    pub operator: ComparisonOperator,
}

impl HashedValueComparator {
    /// Equality on `value`.
    pub fn equal_to(value: B256) -> Self {
        Self {
            value,
            operator: ComparisonOperator::Eq,
        }
    }

    /// Whether `word` satisfies the comparison.
    pub fn matches(&self, word: &B256) -> bool {
        self.operator.compare(word, &self.value)
    }
}

/// Primitive understood by the log indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogPrimitive {
    /// Emitting contract
    Address(Address),
    /// Event signature, `topics[0]`
    EventSig(B256),
    /// Indexed argument at `topics[topic]`
    EventByTopic {
        /// Topic index, `1..=3`
        topic: usize,
        /// All comparators must hold
        value_comparators: Vec<HashedValueComparator>,
    },
    /// Payload word at `data[32 * word_index..]`
    EventByWord {
        /// Word index in the payload head
        word_index: usize,
        /// All comparators must hold
        value_comparators: Vec<HashedValueComparator>,
    },
    /// Required finality
    Confirmations(Confirmations),
    /// Block number comparison
    Block {
        /// Block number
        block: u64,
        /// Comparison
        operator: ComparisonOperator,
    },
    /// Block timestamp comparison
    Timestamp {
        /// Unix seconds
        timestamp: u64,
        /// Comparison
        operator: ComparisonOperator,
    },
    /// Transaction hash equality
    TxHash(B256),
}

impl LogPrimitive {
    /// Whether `log` satisfies this primitive.
    ///
    /// Finality is decided by the indexer, so `Confirmations` always matches
    /// here.
    pub fn matches(&self, log: &IndexedLog) -> bool {
        match self {
            LogPrimitive::Address(address) => log.address == *address,
            LogPrimitive::EventSig(sig) => log.event_sig() == Some(*sig),
            LogPrimitive::EventByTopic {
                topic,
                value_comparators,
            } => log
                .topics
                .get(*topic)
                .is_some_and(|word| value_comparators.iter().all(|c| c.matches(word))),
            LogPrimitive::EventByWord {
                word_index,
                value_comparators,
            } => log
                .data_word(*word_index)
                .is_some_and(|word| value_comparators.iter().all(|c| c.matches(&word))),
            LogPrimitive::Confirmations(_) => true,
            LogPrimitive::Block { block, operator } => operator.compare(&log.block_number, block),
            LogPrimitive::Timestamp {
                timestamp,
                operator,
            } => operator.compare(&log.block_timestamp, timestamp),
            LogPrimitive::TxHash(hash) => log.tx_hash == *hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Bytes};

    fn log() -> IndexedLog {
        IndexedLog {
            address: address!("1111111111111111111111111111111111111111"),
            topics: vec![B256::repeat_byte(0xee), B256::with_last_byte(7)],
            data: Bytes::from(B256::with_last_byte(9).to_vec()),
            block_number: 10,
            block_hash: B256::ZERO,
            block_timestamp: 1_000,
            log_index: 0,
            tx_hash: B256::repeat_byte(3),
        }
    }

    #[test]
    fn topic_and_word_primitives_match_positions() {
        let log = log();
        assert!(LogPrimitive::EventByTopic {
            topic: 1,
            value_comparators: vec![HashedValueComparator::equal_to(B256::with_last_byte(7))],
        }
        .matches(&log));
        assert!(LogPrimitive::EventByWord {
            word_index: 0,
            value_comparators: vec![HashedValueComparator {
                value: B256::with_last_byte(5),
                operator: ComparisonOperator::Gt,
            }],
        }
        .matches(&log));
        assert!(!LogPrimitive::EventByTopic {
            topic: 2,
            value_comparators: vec![HashedValueComparator::equal_to(B256::ZERO)],
        }
        .matches(&log));
    }

    #[test]
    fn block_comparison_uses_log_on_left() {
        let log = log();
        assert!(LogPrimitive::Block {
            block: 5,
            operator: ComparisonOperator::Gte
        }
        .matches(&log));
        assert!(!LogPrimitive::Block {
            block: 5,
            operator: ComparisonOperator::Lt
        }
        .matches(&log));
    }
}
