// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Bound contract type

use std::fmt;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// A logical contract name bound to one on-chain address.
///
/// Several `BoundContract`s may share a name: the same ABI deployed at
/// different addresses.
///
/// # Examples
///
/// ```
/// use alloy_primitives::address;
/// use evm_contract_reader::BoundContract;
///
/// let vault = BoundContract::new(address!("1111111111111111111111111111111111111111"), "Vault");
/// assert_eq!(
///     vault.read_identifier("totalAssets"),
///     "0x1111111111111111111111111111111111111111-Vault-totalAssets"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundContract {
    /// Deployment address
    pub address: Address,
    /// Logical contract name from the reader configuration
    pub name: String,
}

impl BoundContract {
    /// Create a new bound contract.
    pub fn new(address: Address, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
        }
    }

    /// Key that uniquely names one read of this deployment.
    pub fn read_identifier(&self, read_name: &str) -> String {
        format!("{}-{}-{}", self.address, self.name, read_name)
    }
}

impl fmt::Display for BoundContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.address)
    }
}
