// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Log filter shared between the event readers of one contract.

use std::sync::{PoisonError, RwLock};

use alloy_primitives::{Address, B256};
use tracing::{debug, info};

use crate::client::{LogFilter, LogIndexer};
use crate::errors::{FilterAction, FilterError};

/// A [`LogFilter`] whose address and event sets change as readers bind.
///
/// Mutations take the inner lock only briefly. Registration works on a
/// snapshot, so the indexer is never called with the lock held. Callers
/// serialize register and unregister among themselves.
#[derive(Debug)]
pub struct SyncedFilter {
    filter: RwLock<LogFilter>,
}

impl SyncedFilter {
    /// Filter named `name` with no addresses or events yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_filter(LogFilter {
            name: name.into(),
            ..LogFilter::default()
        })
    }

    /// Start from a pre-populated filter (topics, retention, limits).
    pub fn from_filter(filter: LogFilter) -> Self {
        Self {
            filter: RwLock::new(filter),
        }
    }

    /// Filter name.
    pub fn name(&self) -> String {
        self.read().name.clone()
    }

    /// Copy of the current filter.
    pub fn snapshot(&self) -> LogFilter {
        self.read().clone()
    }

    /// Include `addresses`, skipping ones already present.
    pub fn add_addresses(&self, addresses: &[Address]) {
        let mut filter = self.write();
        for address in addresses {
            if !filter.addresses.contains(address) {
                filter.addresses.push(*address);
            }
        }
    }

    /// Drop `addresses`.
    pub fn remove_addresses(&self, addresses: &[Address]) {
        self.write().addresses.retain(|a| !addresses.contains(a));
    }

    /// Include an event signature.
    pub fn add_event_sig(&self, event_sig: B256) {
        let mut filter = self.write();
        if !filter.event_sigs.contains(&event_sig) {
            filter.event_sigs.push(event_sig);
        }
    }

    /// Whether the filter would match anything.
    pub fn is_active(&self) -> bool {
        let filter = self.read();
        !filter.addresses.is_empty() && !filter.event_sigs.is_empty()
    }

    /// Register the current filter unless the indexer already has it.
    pub async fn register(&self, indexer: &dyn LogIndexer) -> Result<(), FilterError> {
        let filter = self.snapshot();
        if filter.addresses.is_empty() || filter.event_sigs.is_empty() {
            debug!(filter = %filter.name, "Nothing to index, skipping registration");
            return Ok(());
        }
        if indexer.has_filter(&filter.name) {
            return Ok(());
        }

        let rendered = filter.to_string();
        indexer
            .register_filter(filter)
            .await
            .map_err(|e| FilterError::new(FilterAction::Register, rendered.clone(), e))?;
        info!(filter = %rendered, "Registered log filter");
        Ok(())
    }

    /// Unregister the filter if the indexer has it.
    pub async fn unregister(&self, indexer: &dyn LogIndexer) -> Result<(), FilterError> {
        let filter = self.snapshot();
        if !indexer.has_filter(&filter.name) {
            return Ok(());
        }

        indexer
            .unregister_filter(&filter.name)
            .await
            .map_err(|e| FilterError::new(FilterAction::Unregister, filter.to_string(), e))?;
        info!(filter = %filter.name, "Unregistered log filter");
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, LogFilter> {
        self.filter.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, LogFilter> {
        self.filter.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256};

    #[test]
    fn addresses_are_deduplicated_and_removed() {
        let filter = SyncedFilter::new("Vault");
        let a = address!("1111111111111111111111111111111111111111");
        let b = address!("2222222222222222222222222222222222222222");

        filter.add_addresses(&[a, b, a]);
        assert_eq!(filter.snapshot().addresses, vec![a, b]);

        filter.remove_addresses(&[a]);
        assert_eq!(filter.snapshot().addresses, vec![b]);
    }

    #[test]
    fn active_only_with_addresses_and_events() {
        let filter = SyncedFilter::new("Vault");
        assert!(!filter.is_active());

        filter.add_addresses(&[address!("1111111111111111111111111111111111111111")]);
        assert!(!filter.is_active());

        let sig = b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");
        filter.add_event_sig(sig);
        filter.add_event_sig(sig);
        assert!(filter.is_active());
        assert_eq!(filter.snapshot().event_sigs, vec![sig]);
    }
}
