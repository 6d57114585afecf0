// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! All readers of one logical contract.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use alloy_primitives::Address;
use tracing::{debug, warn};

use crate::client::{filter_name, LogIndexer};
use crate::errors::{ChainReaderError, ConfigError};
use crate::reader::{Reader, SyncedFilter};

/// The readers of one contract name, its bound addresses and the log filter
/// its shared events are indexed through.
///
/// Filters are registered only after [`ContractBinding::register`] was called
/// and while at least one address is bound. Changing the address set
/// unregisters the old filters before registering the new ones.
pub struct ContractBinding {
    name: String,
    readers: HashMap<String, Box<dyn Reader>>,
    filter: Arc<SyncedFilter>,
    indexer: Arc<dyn LogIndexer>,
    bound: HashSet<Address>,
    register_called: bool,
}

impl std::fmt::Debug for ContractBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractBinding")
            .field("name", &self.name)
            .field("readers", &self.readers.keys().collect::<Vec<_>>())
            .field("bound", &self.bound)
            .field("register_called", &self.register_called)
            .finish_non_exhaustive()
    }
}

impl ContractBinding {
    /// Empty binding for `name`.
    pub fn new(name: impl Into<String>, indexer: Arc<dyn LogIndexer>) -> Self {
        let name = name.into();
        let filter = Arc::new(SyncedFilter::new(filter_name::<&str>(&name, &[])));
        Self {
            name,
            readers: HashMap::new(),
            filter,
            indexer,
            bound: HashSet::new(),
            register_called: false,
        }
    }

    /// Contract name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filter shared by events without a filter of their own.
    pub fn shared_filter(&self) -> Arc<SyncedFilter> {
        Arc::clone(&self.filter)
    }

    /// Add a reader. Read names are unique per contract.
    pub fn add_reader(&mut self, reader: Box<dyn Reader>) -> Result<(), ConfigError> {
        let read_name = reader.read_name().to_string();
        if self.readers.contains_key(&read_name) {
            return Err(ConfigError::invalid(format!(
                "read {read_name} is declared twice for contract {}",
                self.name
            )));
        }
        self.readers.insert(read_name, reader);
        Ok(())
    }

    /// Reader for `read_name`.
    pub fn reader(&self, read_name: &str) -> Result<&dyn Reader, ConfigError> {
        self.readers
            .get(read_name)
            .map(|reader| reader.as_ref())
            .ok_or_else(|| ConfigError::missing_read_name(&self.name, read_name))
    }

    /// Whether any address is bound.
    pub fn is_bound(&self) -> bool {
        !self.bound.is_empty()
    }

    /// Whether `address` is bound.
    pub fn is_bound_to(&self, address: Address) -> bool {
        self.bound.contains(&address)
    }

    /// Bind `addresses` to every reader.
    ///
    /// An address whose readers refuse it (for example, no code deployed) is
    /// left unbound everywhere and its error returned after the filters have
    /// been restored.
    pub async fn bind(&mut self, addresses: &[Address]) -> Result<(), ChainReaderError> {
        let mut new = Vec::new();
        for address in addresses {
            if !self.bound.contains(address) && !new.contains(address) {
                new.push(*address);
            }
        }
        if new.is_empty() {
            return Ok(());
        }

        if self.register_called && self.is_bound() {
            self.unregister_filters().await?;
        }

        let mut outcome = Ok(());
        for address in new {
            if let Err(e) = self.bind_readers(address).await {
                warn!(contract = %self.name, address = %address, error = %e, "Failed to bind address");
                for reader in self.readers.values_mut() {
                    reader.unbind(address);
                }
                outcome = Err(e);
                break;
            }
            self.bound.insert(address);
            self.filter.add_addresses(&[address]);
            debug!(contract = %self.name, address = %address, "Bound contract");
        }

        if self.register_called && self.is_bound() {
            self.register_filters().await?;
        }
        outcome
    }

    /// Unbind `addresses` from every reader.
    ///
    /// Filters are unregistered and, while addresses remain, registered again
    /// for the smaller set.
    pub async fn unbind(&mut self, addresses: &[Address]) -> Result<(), ChainReaderError> {
        let removed: Vec<Address> = addresses
            .iter()
            .copied()
            .filter(|a| self.bound.contains(a))
            .collect();
        if removed.is_empty() {
            return Ok(());
        }

        for address in &removed {
            for reader in self.readers.values_mut() {
                reader.unbind(*address);
            }
            self.bound.remove(address);
        }
        self.filter.remove_addresses(&removed);

        self.unregister_filters().await?;
        if self.register_called && self.is_bound() {
            self.register_filters().await?;
        }
        Ok(())
    }

    /// Register filters now, and again whenever the address set changes.
    pub async fn register(&mut self) -> Result<(), ChainReaderError> {
        self.register_called = true;
        if !self.is_bound() {
            return Ok(());
        }
        self.register_filters().await
    }

    /// Unregister filters and stop registering them on binds.
    pub async fn unregister(&mut self) -> Result<(), ChainReaderError> {
        self.register_called = false;
        self.unregister_filters().await
    }

    async fn bind_readers(&mut self, address: Address) -> Result<(), ChainReaderError> {
        for reader in self.readers.values_mut() {
            reader.bind(address).await?;
        }
        Ok(())
    }

    async fn register_filters(&self) -> Result<(), ChainReaderError> {
        self.filter.register(self.indexer.as_ref()).await?;
        for reader in self.readers.values() {
            reader.register().await?;
        }
        Ok(())
    }

    async fn unregister_filters(&self) -> Result<(), ChainReaderError> {
        self.filter.unregister(self.indexer.as_ref()).await?;
        for reader in self.readers.values() {
            reader.unregister().await?;
        }
        Ok(())
    }
}
