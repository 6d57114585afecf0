// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Configuration and lookup errors.
//!
//! These are raised before any network traffic happens and are never retried:
//! the caller named something the reader does not know about, or the reader
//! was configured inconsistently.

use alloy_primitives::Address;

use crate::types::ConfidenceLevel;

/// Errors caused by unknown identifiers or inconsistent configuration.
///
/// # Examples
///
/// ```rust
/// use evm_contract_reader::ConfigError;
///
/// let error = ConfigError::missing_contract("Vault");
/// assert_eq!(error.to_string(), "Contract Vault is not configured");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No bound read is registered under this identifier.
    #[error("Read identifier {identifier} is not bound")]
    MissingReadIdentifier {
        /// The unknown read identifier
        identifier: String,
    },

    /// The contract name is not part of the configuration.
    #[error("Contract {contract} is not configured")]
    MissingContract {
        /// The unknown contract name
        contract: String,
    },

    /// The contract exists but has no read with this name.
    #[error("Read {read_name} is not configured for contract {contract}")]
    MissingReadName {
        /// Contract name
        contract: String,
        /// The unknown read name
        read_name: String,
    },

    /// The read exists but the address was never bound to it.
    #[error("Address {address} is not bound to {contract}.{read_name}")]
    AddressNotBound {
        /// Requested address
        address: Address,
        /// Contract name
        contract: String,
        /// Read name
        read_name: String,
    },

    /// The read has no confirmations configured for the confidence level.
    #[error("No confirmations mapped for confidence level {level} on {contract}.{read_name}")]
    MissingConfidenceMapping {
        /// Requested confidence level
        level: ConfidenceLevel,
        /// Contract name
        contract: String,
        /// Read name
        read_name: String,
    },

    /// `Bind` was asked to bind an address with no deployed bytecode.
    #[error("No contract exists at address {address}")]
    NoContractExists {
        /// Address without code
        address: Address,
    },

    /// The reader configuration is malformed.
    #[error("Invalid configuration: {details}")]
    Invalid {
        /// What is wrong
        details: String,
    },
}

impl ConfigError {
    /// Create a `MissingReadIdentifier` error.
    pub fn missing_read_identifier(identifier: impl Into<String>) -> Self {
        ConfigError::MissingReadIdentifier {
            identifier: identifier.into(),
        }
    }

    /// Create a `MissingContract` error.
    pub fn missing_contract(contract: impl Into<String>) -> Self {
        ConfigError::MissingContract {
            contract: contract.into(),
        }
    }

    /// Create a `MissingReadName` error.
    pub fn missing_read_name(contract: impl Into<String>, read_name: impl Into<String>) -> Self {
        ConfigError::MissingReadName {
            contract: contract.into(),
            read_name: read_name.into(),
        }
    }

    /// Create an `AddressNotBound` error.
    pub fn address_not_bound(
        address: Address,
        contract: impl Into<String>,
        read_name: impl Into<String>,
    ) -> Self {
        ConfigError::AddressNotBound {
            address,
            contract: contract.into(),
            read_name: read_name.into(),
        }
    }

    /// Create an `Invalid` error with details.
    pub fn invalid(details: impl Into<String>) -> Self {
        ConfigError::Invalid {
            details: details.into(),
        }
    }
}
