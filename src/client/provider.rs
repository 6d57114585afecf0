// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! [`RpcClient`] and [`HeadTracker`] over an alloy provider.

use std::marker::PhantomData;

use alloy_consensus::BlockHeader;
use alloy_eips::BlockId;
use alloy_json_rpc::ErrorPayload;
use alloy_network::{BlockResponse, Ethereum, Network, TransactionBuilder};
use alloy_primitives::{Address, Bytes};
use alloy_provider::Provider;
use alloy_rpc_client::{BatchRequest, Waiter};
use alloy_rpc_types::BlockNumberOrTag;
use alloy_transport::TransportError;
use async_trait::async_trait;
use tracing::debug;

use super::{BatchElement, CallMsg, HeadTracker, RpcClient};
use crate::errors::RpcError;

/// Chain collaborator backed by an alloy [`Provider`].
///
/// # Examples
///
/// ```rust,ignore
/// use alloy_provider::ProviderBuilder;
/// use evm_contract_reader::client::AlloyRpcClient;
///
/// let provider = ProviderBuilder::new().connect_http("https://eth.llamarpc.com".parse()?);
/// let client = AlloyRpcClient::new(provider);
/// ```
#[derive(Debug, Clone)]
pub struct AlloyRpcClient<P, N = Ethereum> {
    provider: P,
    _network: PhantomData<N>,
}

impl<P, N> AlloyRpcClient<P, N>
where
    N: Network,
    P: Provider<N>,
{
    /// Wrap `provider`.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            _network: PhantomData,
        }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }
}

fn block_id(block: Option<u64>) -> BlockId {
    block.map_or_else(BlockId::latest, BlockId::number)
}

/// Node message of a failed batch element, without the transport wrapping.
fn element_message(error: &TransportError) -> String {
    error
        .as_error_resp()
        .map(|payload: &ErrorPayload| payload.message.to_string())
        .unwrap_or_else(|| error.to_string())
}

fn call_request<N: Network>(msg: &CallMsg) -> N::TransactionRequest {
    N::TransactionRequest::default()
        .with_to(msg.to)
        .with_input(msg.data.clone())
}

#[async_trait]
impl<P, N> RpcClient for AlloyRpcClient<P, N>
where
    N: Network,
    P: Provider<N> + Send + Sync,
{
    async fn call_contract(&self, msg: &CallMsg, block: Option<u64>) -> Result<Bytes, RpcError> {
        self.provider
            .call(call_request::<N>(msg))
            .block(block_id(block))
            .await
            .map_err(|e| RpcError::call_failed(msg.to, e))
    }

    async fn batch_call(&self, batch: &mut [BatchElement]) -> Result<(), RpcError> {
        let size = batch.len();
        let client = self.provider.client();
        let mut request = BatchRequest::new(&client);

        let mut waiters: Vec<Waiter<String>> = Vec::with_capacity(size);
        for element in batch.iter() {
            let params = (call_request::<N>(&element.call), block_id(element.block));
            let waiter = request
                .add_call(element.method.clone(), &params)
                .map_err(|e| RpcError::batch_call_failed(size, e))?;
            waiters.push(waiter);
        }

        request
            .send()
            .await
            .map_err(|e| RpcError::batch_call_failed(size, e))?;

        for (element, waiter) in batch.iter_mut().zip(waiters) {
            match waiter.await {
                Ok(result) => element.result = Some(result),
                Err(e) => {
                    debug!(to = %element.call.to, error = %e, "Batch element failed");
                    element.error = Some(element_message(&e));
                }
            }
        }
        Ok(())
    }

    async fn code_at(&self, address: Address, block: Option<u64>) -> Result<Bytes, RpcError> {
        self.provider
            .get_code_at(address)
            .block_id(block_id(block))
            .await
            .map_err(|e| RpcError::code_at_failed(address, e))
    }
}

#[async_trait]
impl<P, N> HeadTracker for AlloyRpcClient<P, N>
where
    N: Network,
    P: Provider<N> + Send + Sync,
{
    async fn latest_and_finalized_block(&self) -> Result<(u64, u64), RpcError> {
        let latest = self
            .provider
            .get_block_number()
            .await
            .map_err(RpcError::head_fetch_failed)?;

        let finalized = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Finalized)
            .await
            .map_err(RpcError::head_fetch_failed)?
            .ok_or_else(|| RpcError::BlockNotFound {
                tag: BlockNumberOrTag::Finalized.to_string(),
            })?;

        Ok((latest, finalized.header().number()))
    }
}
