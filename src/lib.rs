//! Generic contract reading for EVM chains.
//!
//! Contracts are declared once in a [`ChainReaderConfig`]: an ABI plus the
//! methods and events to expose under logical names. A [`ChainReaderService`]
//! turns that into readers, binds them to deployed addresses and serves
//! latest-value reads, batched reads and key queries over indexed logs.

mod batch;
mod bindings;
pub mod client;
pub mod codec;
mod config;
mod errors;
pub mod query;
mod reader;
mod service;
mod spans;
mod types;

pub use batch::{BatchCall, BatchCallResult, BatchCaller, BatchResult, Call, DynamicLimitedBatchCaller};
pub use bindings::{
    BatchGetLatestValuesRequest, BatchGetLatestValuesResult, BatchRead, BatchReadResult,
    BindingsRegistry, ContractBinding,
};
pub use client::{AlloyRpcClient, HeadTracker, LogFilter, LogIndexer, RpcClient};
pub use config::*;
pub use errors::*;
pub use reader::{
    confidence_to_confirmations, EventBinding, EventFilter, Lookup, MethodBinding, ReadValues,
    Reader, SyncedFilter,
};
pub use service::ChainReaderService;
pub use types::*;
