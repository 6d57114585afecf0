// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Domain types shared by the reader's modules.
//!
//! - [`BoundContract`] names one deployment of a logical contract
//! - [`ConfidenceLevel`] and [`Confirmations`] express finality requests
//! - [`IndexedLog`], [`Head`] and [`Sequence`] describe log-index results

mod confidence;
mod contract;
mod log;

pub use confidence::{ConfidenceLevel, Confirmations};
pub use contract::BoundContract;
pub use log::{Head, IndexedLog, Sequence};
