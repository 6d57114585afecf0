// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error type for failed contract reads.

use std::fmt;

use alloy_primitives::{Address, Bytes};

/// What stage of a read failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadErrorKind {
    /// Parameters could not be encoded for the wire.
    Encode,
    /// The RPC round trip itself failed.
    Transport,
    /// The node returned no data; usually a missing method or an unhealthy endpoint.
    EmptyOutput,
    /// The node returned data that does not decode into the declared return shape.
    Decode,
}

impl fmt::Display for ReadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReadErrorKind::Encode => "failed to encode params",
            ReadErrorKind::Transport => "rpc call failed",
            ReadErrorKind::EmptyOutput => "empty output",
            ReadErrorKind::Decode => "failed to decode result",
        };
        f.write_str(label)
    }
}

/// A contract read that failed, with everything needed to reproduce it.
///
/// `source()` returns the underlying transport or codec error, so callers can
/// walk the chain to match on [`RpcError`](crate::RpcError) or
/// [`CodecError`](crate::CodecError).
#[derive(Debug, thiserror::Error)]
#[error("{kind} for {contract}.{read_name} at {address} (block: {block}, params: {params}, return type: {return_type})")]
pub struct ReadError {
    /// Failure stage
    pub kind: ReadErrorKind,
    /// Contract address
    pub address: Address,
    /// Contract name
    pub contract: String,
    /// Method or event name
    pub read_name: String,
    /// Rendered call parameters
    pub params: String,
    /// Codec item the result was decoded as
    pub return_type: String,
    /// Block the read targeted, or `latest`
    pub block: String,
    /// Raw result, present when decoding failed after a successful call
    pub result: Option<Bytes>,
    /// Underlying error
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl ReadError {
    /// Start a read error for a call against `address`.
    pub fn new(
        kind: ReadErrorKind,
        address: Address,
        contract: impl Into<String>,
        read_name: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            address,
            contract: contract.into(),
            read_name: read_name.into(),
            params: String::new(),
            return_type: String::new(),
            block: "latest".to_string(),
            result: None,
            source: Box::new(source),
        }
    }

    /// Attach the rendered parameters.
    pub fn with_params(mut self, params: &serde_json::Value) -> Self {
        self.params = params.to_string();
        self
    }

    /// Attach the codec item the result was decoded as.
    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = return_type.into();
        self
    }

    /// Attach the targeted block number; `None` means latest.
    pub fn with_block(mut self, block: Option<u64>) -> Self {
        self.block = block.map_or_else(|| "latest".to_string(), |n| n.to_string());
        self
    }

    /// Attach the raw encoded result that failed to decode.
    pub fn with_result(mut self, result: Bytes) -> Self {
        self.result = Some(result);
        self
    }

    /// Whether the node returned no data for the call.
    pub fn is_empty_output(&self) -> bool {
        self.kind == ReadErrorKind::EmptyOutput
    }
}
