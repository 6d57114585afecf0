// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Read identifier resolution.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use alloy_primitives::Address;

use crate::errors::ConfigError;
use crate::types::BoundContract;

/// What a read identifier points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadValues {
    /// Bound address
    pub address: Address,
    /// Contract name
    pub contract: String,
    /// Read name
    pub read_name: String,
}

#[derive(Debug, Default)]
struct LookupState {
    contracts: HashMap<String, Vec<String>>,
    read_ids: HashMap<String, ReadValues>,
}

/// Maps read identifiers to `(address, contract, read name)`.
///
/// Both tables sit behind one lock; lookups only take it shared.
#[derive(Debug, Default)]
pub struct Lookup {
    state: RwLock<LookupState>,
}

impl Lookup {
    /// Empty lookup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `read_name` for `contract`.
    pub fn add_read_name_for_contract(&self, contract: &str, read_name: &str) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let names = state.contracts.entry(contract.to_string()).or_default();
        if !names.iter().any(|n| n == read_name) {
            names.push(read_name.to_string());
        }
    }

    /// Materialize read identifiers for every read of `contract` at `address`.
    pub fn bind_address_for_contract(&self, contract: &str, address: Address) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let LookupState {
            contracts,
            read_ids,
        } = &mut *state;
        let bound = BoundContract::new(address, contract);
        for read_name in contracts.get(contract).into_iter().flatten() {
            read_ids.insert(
                bound.read_identifier(read_name),
                ReadValues {
                    address,
                    contract: contract.to_string(),
                    read_name: read_name.clone(),
                },
            );
        }
    }

    /// Remove every read identifier of `contract` at `address`.
    pub fn unbind_address_for_contract(&self, contract: &str, address: Address) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let LookupState {
            contracts,
            read_ids,
        } = &mut *state;
        let bound = BoundContract::new(address, contract);
        for read_name in contracts.get(contract).into_iter().flatten() {
            read_ids.remove(&bound.read_identifier(read_name));
        }
    }

    /// Resolve a read identifier.
    pub fn get_contract_for_read_name(&self, read_identifier: &str) -> Result<ReadValues, ConfigError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .read_ids
            .get(read_identifier)
            .cloned()
            .ok_or_else(|| ConfigError::missing_read_identifier(read_identifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn bound_reads_resolve_until_unbound() {
        let lookup = Lookup::new();
        lookup.add_read_name_for_contract("Vault", "totalAssets");
        lookup.add_read_name_for_contract("Vault", "Deposit");
        let vault = address!("1111111111111111111111111111111111111111");
        let bound = BoundContract::new(vault, "Vault");

        lookup.bind_address_for_contract("Vault", vault);
        for read_name in ["totalAssets", "Deposit"] {
            assert_eq!(
                lookup
                    .get_contract_for_read_name(&bound.read_identifier(read_name))
                    .unwrap(),
                ReadValues {
                    address: vault,
                    contract: "Vault".to_string(),
                    read_name: read_name.to_string(),
                }
            );
        }

        lookup.unbind_address_for_contract("Vault", vault);
        for read_name in ["totalAssets", "Deposit"] {
            assert!(matches!(
                lookup.get_contract_for_read_name(&bound.read_identifier(read_name)),
                Err(ConfigError::MissingReadIdentifier { .. })
            ));
        }
    }

    #[test]
    fn unbinding_one_address_keeps_the_other() {
        let lookup = Lookup::new();
        lookup.add_read_name_for_contract("Pool", "slot0");
        let a = address!("1111111111111111111111111111111111111111");
        let b = address!("2222222222222222222222222222222222222222");
        lookup.bind_address_for_contract("Pool", a);
        lookup.bind_address_for_contract("Pool", b);
        lookup.unbind_address_for_contract("Pool", a);

        assert!(lookup
            .get_contract_for_read_name(&BoundContract::new(a, "Pool").read_identifier("slot0"))
            .is_err());
        assert!(lookup
            .get_contract_for_read_name(&BoundContract::new(b, "Pool").read_identifier("slot0"))
            .is_ok());
    }
}
