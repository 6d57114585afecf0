// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error type for batch dispatch.

use super::RpcError;
use crate::batch::Call;

/// Every attempt at executing a batch failed, down to a batch size of one.
///
/// Only whole-batch transport failures end up here. Errors of individual calls
/// are reported in their own result slot instead.
#[derive(Debug, thiserror::Error)]
#[error("Batch of {} calls failed at batch size {last_limit}", calls.len())]
pub struct BatchError {
    /// Batch size of the final attempt
    pub last_limit: usize,
    /// The full list of calls that could not be executed
    pub calls: Vec<Call>,
    /// Error of the final attempt
    #[source]
    pub source: RpcError,
}
