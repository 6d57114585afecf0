// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Log and sequence types returned by the log indexer

use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::errors::RpcError;

/// A log as stored by the log-indexing collaborator.
///
/// Unlike [`alloy_rpc_types::Log`], every positional field is present: indexed
/// logs always belong to a mined block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedLog {
    /// Emitting contract
    pub address: Address,
    /// Topics, `topics[0]` is the event signature
    pub topics: Vec<B256>,
    /// Non-indexed payload
    pub data: Bytes,
    /// Block number
    pub block_number: u64,
    /// Block hash
    pub block_hash: B256,
    /// Block timestamp (seconds)
    pub block_timestamp: u64,
    /// Index of the log within its block
    pub log_index: u64,
    /// Transaction hash
    pub tx_hash: B256,
}

impl IndexedLog {
    /// Event signature, if the log has any topics.
    pub fn event_sig(&self) -> Option<B256> {
        self.topics.first().copied()
    }

    /// Ordering key used to pick the most recent log.
    pub fn position(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }

    /// The `index`-th 32-byte word of the payload.
    pub fn data_word(&self, index: usize) -> Option<B256> {
        let start = index.checked_mul(32)?;
        self.data
            .get(start..start + 32)
            .map(B256::from_slice)
    }

    /// Opaque cursor that points at this log.
    pub fn cursor(&self) -> String {
        format!("{}-{}-{}", self.block_number, self.log_index, self.tx_hash)
    }
}

impl TryFrom<alloy_rpc_types::Log> for IndexedLog {
    type Error = RpcError;

    fn try_from(log: alloy_rpc_types::Log) -> Result<Self, Self::Error> {
        let missing = |field: &str| RpcError::BlockNotFound {
            tag: format!("log without {field}"),
        };
        Ok(Self {
            address: log.inner.address,
            topics: log.inner.data.topics().to_vec(),
            data: log.inner.data.data.clone(),
            block_number: log.block_number.ok_or_else(|| missing("block number"))?,
            block_hash: log.block_hash.ok_or_else(|| missing("block hash"))?,
            block_timestamp: log.block_timestamp.unwrap_or_default(),
            log_index: log.log_index.ok_or_else(|| missing("log index"))?,
            tx_hash: log.transaction_hash.ok_or_else(|| missing("transaction hash"))?,
        })
    }
}

/// Head of the chain a result was read at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Head {
    /// Block number, as a string so chains with other numbering fit the same shape
    pub identifier: String,
    /// Block hash
    pub hash: B256,
    /// Block timestamp (seconds)
    pub timestamp: u64,
}

impl Head {
    /// Head of the block that contains `log`.
    pub fn of_log(log: &IndexedLog) -> Self {
        Self {
            identifier: log.block_number.to_string(),
            hash: log.block_hash,
            timestamp: log.block_timestamp,
        }
    }

    /// Head from a block number, hash and timestamp.
    pub fn new(number: u64, hash: B256, timestamp: u64) -> Self {
        Self {
            identifier: number.to_string(),
            hash,
            timestamp,
        }
    }

    /// Block number, when the identifier is numeric.
    pub fn number(&self) -> Option<u64> {
        self.identifier.parse().ok()
    }
}

/// One decoded event from a key query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence<T> {
    /// Cursor pointing at this event
    pub cursor: String,
    /// Block the event was emitted in
    pub head: Head,
    /// Decoded event
    pub data: T,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, LogData};

    fn rpc_log() -> alloy_rpc_types::Log {
        alloy_rpc_types::Log {
            inner: alloy_primitives::Log {
                address: address!("1111111111111111111111111111111111111111"),
                data: LogData::new(vec![B256::repeat_byte(0xaa)], Bytes::from(vec![7u8; 64]))
                    .unwrap(),
            },
            block_hash: Some(B256::repeat_byte(1)),
            block_number: Some(42),
            block_timestamp: Some(1_700_000_000),
            transaction_hash: Some(B256::repeat_byte(2)),
            transaction_index: Some(0),
            log_index: Some(3),
            removed: false,
        }
    }

    #[test]
    fn converts_from_rpc_log() {
        let log = IndexedLog::try_from(rpc_log()).unwrap();
        assert_eq!(log.block_number, 42);
        assert_eq!(log.log_index, 3);
        assert_eq!(log.event_sig(), Some(B256::repeat_byte(0xaa)));
        assert_eq!(log.data_word(1), Some(B256::repeat_byte(7)));
        assert_eq!(log.data_word(2), None);
    }

    #[test]
    fn rpc_log_without_block_is_rejected() {
        let mut pending = rpc_log();
        pending.block_number = None;
        assert!(IndexedLog::try_from(pending).is_err());
    }

    #[test]
    fn head_from_log_uses_block_fields() {
        let log = IndexedLog::try_from(rpc_log()).unwrap();
        let head = Head::of_log(&log);
        assert_eq!(head.number(), Some(42));
        assert_eq!(head.timestamp, 1_700_000_000);
    }
}
