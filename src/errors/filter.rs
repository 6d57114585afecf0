// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error type for log filter registration.

use std::fmt;

use super::RpcError;

/// Filter lifecycle action that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    /// `RegisterFilter`
    Register,
    /// `UnregisterFilter`
    Unregister,
}

impl fmt::Display for FilterAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterAction::Register => f.write_str("register"),
            FilterAction::Unregister => f.write_str("unregister"),
        }
    }
}

/// The log indexer refused to register or unregister a filter.
#[derive(Debug, thiserror::Error)]
#[error("Failed to {action} filter {filter}")]
pub struct FilterError {
    /// What was attempted
    pub action: FilterAction,
    /// Rendered filter spec
    pub filter: String,
    /// Indexer error
    #[source]
    pub source: RpcError,
}

impl FilterError {
    /// Create a filter error for `action` on the rendered `filter`.
    pub fn new(action: FilterAction, filter: impl Into<String>, source: RpcError) -> Self {
        Self {
            action,
            filter: filter.into(),
            source,
        }
    }
}
