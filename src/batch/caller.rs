// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Batch caller that shrinks its batch size when the transport fails.
//!
//! The first attempt sends chunks of `max_batch_size` calls (capped at the
//! number of calls). When any chunk is lost as a whole, the attempt is
//! abandoned and retried with the limit divided by `backoff_multiplier`. With
//! the defaults, 200 failing calls are tried at sizes 100, 20, 4 and 1 before
//! the error is returned with the full call list.
//!
//! Chunks of one attempt run through an ordered, bounded stream
//! (`parallel_rpc_calls_limit` in flight), so results always come back in
//! request order.

use std::sync::Arc;

use alloy_primitives::{hex, Bytes};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;
use tracing::{debug, warn, Instrument};

use super::{BatchCall, BatchCallResult, BatchCaller, BatchResult, Call};
use crate::client::{BatchElement, CallMsg, RpcClient};
use crate::codec::Codec;
use crate::config::BatchCallerConfig;
use crate::errors::{BatchError, CodecError, ReadError, ReadErrorKind, RpcError};
use crate::spans;

/// [`BatchCaller`] over an [`RpcClient`] with retry-by-shrinking.
pub struct DynamicLimitedBatchCaller {
    client: Arc<dyn RpcClient>,
    codec: Arc<Codec>,
    config: BatchCallerConfig,
}

impl std::fmt::Debug for DynamicLimitedBatchCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicLimitedBatchCaller")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Batch size for the attempt after one that failed at `limit`.
pub(crate) fn next_limit(limit: usize, backoff_multiplier: usize) -> usize {
    let next = limit / backoff_multiplier.max(1);
    if next == 0 || next == limit {
        1
    } else {
        next
    }
}

impl DynamicLimitedBatchCaller {
    /// Create a batch caller.
    pub fn new(client: Arc<dyn RpcClient>, codec: Arc<Codec>, config: BatchCallerConfig) -> Self {
        Self {
            client,
            codec,
            config,
        }
    }

    /// Limits in effect.
    pub fn config(&self) -> &BatchCallerConfig {
        &self.config
    }

    async fn batch_call_dynamic_limit_retries(
        &self,
        block: Option<u64>,
        calls: Vec<Call>,
    ) -> Result<Vec<BatchCallResult>, BatchError> {
        let mut limit = self.config.max_batch_size.min(calls.len()).max(1);
        loop {
            let attempt = self
                .batch_call_limit(block, &calls, limit)
                .instrument(spans::batch_call_attempt(limit, calls.len()))
                .await;
            match attempt {
                Ok(results) => return Ok(results),
                Err(source) if limit <= 1 => {
                    warn!(error = %source, calls = calls.len(), "Batch call failed at minimum batch size");
                    return Err(BatchError {
                        last_limit: limit,
                        calls,
                        source,
                    });
                }
                Err(source) => {
                    let next = next_limit(limit, self.config.backoff_multiplier);
                    warn!(
                        error = %source,
                        limit = limit,
                        next_limit = next,
                        "Batch call failed, retrying with smaller batches"
                    );
                    limit = next;
                }
            }
        }
    }

    async fn batch_call_limit(
        &self,
        block: Option<u64>,
        calls: &[Call],
        limit: usize,
    ) -> Result<Vec<BatchCallResult>, RpcError> {
        let parallel = self.config.parallel_rpc_calls_limit.max(1);
        let pending: Vec<_> = calls
            .chunks(limit)
            .map(|chunk| self.execute_chunk(block, chunk))
            .collect();
        let chunks: Vec<Vec<BatchCallResult>> = stream::iter(pending)
            .buffered(parallel)
            .try_collect()
            .await?;
        Ok(chunks.into_iter().flatten().collect())
    }

    async fn execute_chunk(
        &self,
        block: Option<u64>,
        chunk: &[Call],
    ) -> Result<Vec<BatchCallResult>, RpcError> {
        let mut elements = Vec::with_capacity(chunk.len());
        let mut slots = Vec::with_capacity(chunk.len());
        for call in chunk {
            match self.codec.encode_value(&call.params, &call.params_item()) {
                Ok(data) => {
                    slots.push(Ok(elements.len()));
                    let msg = CallMsg {
                        to: call.contract_address,
                        data,
                    };
                    elements.push(BatchElement::eth_call(msg, block));
                }
                Err(e) => slots.push(Err(read_error(ReadErrorKind::Encode, call, block, e))),
            }
        }

        if !elements.is_empty() {
            debug!(size = elements.len(), "Sending batch");
            let size = elements.len();
            let round_trip = self.client.batch_call(&mut elements);
            match self.config.rpc_timeout {
                Some(timeout) => tokio::time::timeout(timeout, round_trip)
                    .await
                    .map_err(|_| RpcError::Timeout {
                        operation: format!("batch of {size} calls"),
                        timeout,
                    })??,
                None => round_trip.await?,
            }
        }

        Ok(chunk
            .iter()
            .zip(slots)
            .map(|(call, slot)| BatchCallResult {
                call: call.clone(),
                result: slot.and_then(|i| self.decode_element(call, &elements[i], block)),
            })
            .collect())
    }

    fn decode_element(
        &self,
        call: &Call,
        element: &BatchElement,
        block: Option<u64>,
    ) -> Result<Value, ReadError> {
        if let Some(message) = &element.error {
            return Err(read_error(
                ReadErrorKind::Transport,
                call,
                block,
                RpcError::BatchElementFailed {
                    message: message.clone(),
                },
            ));
        }

        // Some backends answer "" where others answer "0x".
        let raw = match element.result.as_deref() {
            None | Some("") => "0x",
            Some(raw) => raw,
        };
        let bytes = hex::decode(raw).map(Bytes::from).map_err(|e| {
            read_error(
                ReadErrorKind::Decode,
                call,
                block,
                CodecError::decode_failed(call.return_item(), e),
            )
        })?;

        self.codec
            .decode_value(&bytes, &call.return_item())
            .map_err(|e| {
                if bytes.is_empty() {
                    read_error(ReadErrorKind::EmptyOutput, call, block, e)
                } else {
                    read_error(ReadErrorKind::Decode, call, block, e).with_result(bytes.clone())
                }
            })
    }
}

fn read_error(
    kind: ReadErrorKind,
    call: &Call,
    block: Option<u64>,
    source: impl std::error::Error + Send + Sync + 'static,
) -> ReadError {
    ReadError::new(
        kind,
        call.contract_address,
        call.contract_name.clone(),
        call.read_name.clone(),
        source,
    )
    .with_params(&call.params)
    .with_return_type(call.return_item())
    .with_block(block)
}

#[async_trait]
impl BatchCaller for DynamicLimitedBatchCaller {
    async fn batch_call(
        &self,
        block: Option<u64>,
        calls: BatchCall,
    ) -> Result<BatchResult, BatchError> {
        let mut grouped = BatchResult::new();
        if calls.is_empty() {
            return Ok(grouped);
        }
        for result in self.batch_call_dynamic_limit_retries(block, calls).await? {
            grouped
                .entry(result.call.contract_name.clone())
                .or_default()
                .push(result);
        }
        Ok(grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn limits_shrink_to_one() {
        let mut limit = 100;
        let mut seen = vec![limit];
        while limit > 1 {
            limit = next_limit(limit, 5);
            seen.push(limit);
        }
        assert_eq!(seen, vec![100, 20, 4, 1]);
    }

    #[test]
    fn unchanged_limit_falls_to_one() {
        assert_eq!(next_limit(3, 1), 1);
        assert_eq!(next_limit(2, 5), 1);
    }

    proptest! {
        #[test]
        fn next_limit_always_shrinks(limit in 2usize..10_000, multiplier in 1usize..20) {
            let next = next_limit(limit, multiplier);
            prop_assert!(next >= 1);
            prop_assert!(next < limit);
        }
    }
}
