// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Deferred contract calls and their batched execution.
//!
//! Method readers turn a request into a [`Call`] without touching the network.
//! A [`BatchCaller`] executes many calls as JSON-RPC batches and hands back
//! one result slot per call, grouped by contract name in request order.

mod caller;

use std::collections::HashMap;

use alloy_primitives::Address;
use async_trait::async_trait;
use serde_json::Value;

pub use caller::DynamicLimitedBatchCaller;

use crate::codec::wrap_item_type;
use crate::errors::{BatchError, ReadError};

/// One deferred contract read.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Target contract
    pub contract_address: Address,
    /// Logical contract name
    pub contract_name: String,
    /// Read name
    pub read_name: String,
    /// Native parameters
    pub params: Value,
}

impl Call {
    /// Codec item the parameters are encoded as.
    pub fn params_item(&self) -> String {
        wrap_item_type(&self.contract_name, &self.read_name, true)
    }

    /// Codec item the result is decoded as.
    pub fn return_item(&self) -> String {
        wrap_item_type(&self.contract_name, &self.read_name, false)
    }
}

/// Ordered list of calls.
pub type BatchCall = Vec<Call>;

/// Outcome of one call in a batch.
#[derive(Debug)]
pub struct BatchCallResult {
    /// The call that was executed
    pub call: Call,
    /// Decoded native result, or this call's own error
    pub result: Result<Value, ReadError>,
}

/// Results grouped by contract name, each group in request order.
pub type BatchResult = HashMap<String, Vec<BatchCallResult>>;

/// Executes a batch of deferred calls.
#[async_trait]
pub trait BatchCaller: Send + Sync {
    /// Execute `calls` at `block` (`None` for latest).
    ///
    /// A single call's failure lands in its own result slot. An error is
    /// returned only when the whole batch could not be executed.
    async fn batch_call(&self, block: Option<u64>, calls: BatchCall)
        -> Result<BatchResult, BatchError>;
}
