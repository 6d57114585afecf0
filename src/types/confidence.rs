// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Finality request types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Chain-agnostic finality a caller asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    /// Latest state, may be reorged away
    Unconfirmed,
    /// State at or below the finalized head
    Finalized,
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::Unconfirmed => f.write_str("unconfirmed"),
            ConfidenceLevel::Finalized => f.write_str("finalized"),
        }
    }
}

/// Chain-specific finality depth a confidence level maps to.
///
/// Serialized as an integer: `-1` is finalized, `n >= 0` is a block depth below
/// the latest head.
///
/// # Examples
///
/// ```
/// use evm_contract_reader::Confirmations;
///
/// let confs: Confirmations = serde_json::from_str("-1").unwrap();
/// assert_eq!(confs, Confirmations::Finalized);
/// assert_eq!(Confirmations::UNCONFIRMED, Confirmations::Depth(0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Confirmations {
    /// Only logs and state at or below the finalized block
    Finalized,
    /// At least this many blocks below the latest head
    Depth(u64),
}

impl Confirmations {
    /// Latest state, no confirmations required.
    pub const UNCONFIRMED: Self = Self::Depth(0);
}

impl TryFrom<i64> for Confirmations {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Confirmations::Finalized),
            n if n >= 0 => Ok(Confirmations::Depth(n as u64)),
            n => Err(format!("invalid confirmations {n}: expected -1 or a depth >= 0")),
        }
    }
}

impl From<Confirmations> for i64 {
    fn from(value: Confirmations) -> Self {
        match value {
            Confirmations::Finalized => -1,
            Confirmations::Depth(n) => i64::try_from(n).unwrap_or(i64::MAX),
        }
    }
}

impl fmt::Display for Confirmations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confirmations::Finalized => f.write_str("finalized"),
            Confirmations::Depth(n) => write!(f, "{n} confirmations"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmations_serde_uses_integers() {
        assert_eq!(serde_json::to_string(&Confirmations::Finalized).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&Confirmations::Depth(12)).unwrap(), "12");
        assert_eq!(
            serde_json::from_str::<Confirmations>("0").unwrap(),
            Confirmations::UNCONFIRMED
        );
        assert!(serde_json::from_str::<Confirmations>("-2").is_err());
    }

    #[test]
    fn confidence_level_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&ConfidenceLevel::Finalized).unwrap(),
            "\"finalized\""
        );
        assert_eq!(
            serde_json::from_str::<ConfidenceLevel>("\"unconfirmed\"").unwrap(),
            ConfidenceLevel::Unconfirmed
        );
    }
}
