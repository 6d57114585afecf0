// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use crate::errors::ConfigError;
use crate::types::{ConfidenceLevel, Confirmations};

/// Confirmations a read requires for `level`.
///
/// Fails with [`ConfigError::MissingConfidenceMapping`] when the read has no
/// mapping for the level.
pub fn confidence_to_confirmations(
    mapping: &BTreeMap<ConfidenceLevel, Confirmations>,
    level: ConfidenceLevel,
    contract: &str,
    read_name: &str,
) -> Result<Confirmations, ConfigError> {
    mapping
        .get(&level)
        .copied()
        .ok_or_else(|| ConfigError::MissingConfidenceMapping {
            level,
            contract: contract.to_string(),
            read_name: read_name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_levels_resolve() {
        let mapping = BTreeMap::from([
            (ConfidenceLevel::Unconfirmed, Confirmations::Depth(2)),
            (ConfidenceLevel::Finalized, Confirmations::Finalized),
        ]);
        assert_eq!(
            confidence_to_confirmations(&mapping, ConfidenceLevel::Unconfirmed, "C", "r").unwrap(),
            Confirmations::Depth(2)
        );
        assert_eq!(
            confidence_to_confirmations(&mapping, ConfidenceLevel::Finalized, "C", "r").unwrap(),
            Confirmations::Finalized
        );
    }

    #[test]
    fn unmapped_level_names_level_contract_and_read() {
        let mapping = BTreeMap::from([(ConfidenceLevel::Unconfirmed, Confirmations::UNCONFIRMED)]);
        let err = confidence_to_confirmations(&mapping, ConfidenceLevel::Finalized, "Vault", "assets")
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingConfidenceMapping {
                level: ConfidenceLevel::Finalized,
                contract: "Vault".to_string(),
                read_name: "assets".to_string(),
            }
        );
        let message = err.to_string();
        assert!(message.contains("finalized"));
        assert!(message.contains("Vault.assets"));
    }
}
