//! Default limits for batched contract reads
//!
//! These values match what public RPC providers accept without throttling a
//! JSON-RPC batch.

/// Calls per JSON-RPC batch on the first attempt
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Divisor applied to the batch size after a failed attempt
pub const DEFAULT_BACKOFF_MULTIPLIER: usize = 5;

/// Batches in flight at once
pub const DEFAULT_PARALLEL_RPC_CALLS_LIMIT: usize = 10;

/// Confirmations the `unconfirmed` level maps to when a read configures none
pub const DEFAULT_UNCONFIRMED_DEPTH: u64 = 0;
