// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Field-level value transforms between the native and on-chain shapes.
//!
//! A [`ModifierChain`] is applied in declaration order when decoding
//! (on-chain to native) and in reverse order when encoding. Field paths are
//! dot-separated (`"order.maker"`) and fan out over arrays, so `"orders.maker"`
//! touches the `maker` field of every element of `orders`.
//!
//! ```
//! use evm_contract_reader::codec::{ModifierChain, ModifierConfig};
//! use serde_json::json;
//!
//! let chain = ModifierChain::new(vec![ModifierConfig::EpochToTime {
//!     fields: vec!["updatedAt".to_string()],
//! }]);
//! let native = chain.to_off_chain(json!({"updatedAt": 86400})).unwrap();
//! assert_eq!(native, json!({"updatedAt": "1970-01-02T00:00:00Z"}));
//! assert_eq!(chain.to_on_chain(native).unwrap(), json!({"updatedAt": 86400}));
//! ```

use std::collections::BTreeMap;

use alloy_primitives::hex;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::address::AddressCodec;
use super::value::bytes_of;
use crate::errors::CodecError;

/// One declared transform, as written in reader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ModifierConfig {
    /// Rename fields: on-chain path to native leaf name.
    Rename {
        /// `on-chain path -> native name`
        fields: BTreeMap<String, String>,
    },
    /// Hide fields from the native shape; they are zero-filled on encode.
    Drop {
        /// On-chain paths
        fields: Vec<String>,
    },
    /// Constant values written in one direction only.
    #[serde(rename_all = "camelCase")]
    HardCode {
        /// Written into the on-chain value when encoding
        #[serde(default)]
        on_chain_values: BTreeMap<String, Value>,
        /// Written into the native value when decoding
        #[serde(default)]
        off_chain_values: BTreeMap<String, Value>,
    },
    /// Raw 20-byte values on chain, checksummed address strings natively.
    AddressBytesToString {
        /// On-chain paths
        fields: Vec<String>,
    },
    /// Unix seconds on chain, RFC 3339 timestamps natively.
    EpochToTime {
        /// On-chain paths
        fields: Vec<String>,
    },
}

impl ModifierConfig {
    fn to_off_chain(&self, value: &mut Value) -> Result<(), CodecError> {
        match self {
            ModifierConfig::Rename { fields } => {
                for (from, to) in fields {
                    let (parent, leaf) = split_path(from);
                    rename_at(value, &parent, leaf, to)?;
                }
                Ok(())
            }
            ModifierConfig::Drop { fields } => {
                for path in fields {
                    let (parent, leaf) = split_path(path);
                    for_each_object(value, &parent, &mut |obj| {
                        obj.remove(leaf);
                        Ok(())
                    })?;
                }
                Ok(())
            }
            ModifierConfig::HardCode {
                off_chain_values, ..
            } => set_all(value, off_chain_values),
            ModifierConfig::AddressBytesToString { fields } => {
                map_leaves(value, fields, &mut |leaf| {
                    let bytes = bytes_of(leaf).ok_or_else(|| {
                        CodecError::invalid_type(format!("expected address bytes, got {leaf}"))
                    })?;
                    AddressCodec::encode(&bytes).map(Value::String)
                })
            }
            ModifierConfig::EpochToTime { fields } => map_leaves(value, fields, &mut |leaf| {
                let seconds = leaf
                    .as_i64()
                    .or_else(|| leaf.as_str().and_then(|s| s.parse().ok()))
                    .ok_or_else(|| {
                        CodecError::invalid_type(format!("expected unix seconds, got {leaf}"))
                    })?;
                let time = DateTime::<Utc>::from_timestamp(seconds, 0).ok_or_else(|| {
                    CodecError::invalid_type(format!("{seconds} is out of range for a timestamp"))
                })?;
                Ok(Value::String(time.to_rfc3339_opts(SecondsFormat::Secs, true)))
            }),
        }
    }

    fn to_on_chain(&self, value: &mut Value) -> Result<(), CodecError> {
        match self {
            ModifierConfig::Rename { fields } => {
                for (from, to) in fields {
                    let (parent, leaf) = split_path(from);
                    rename_at(value, &parent, to, leaf)?;
                }
                Ok(())
            }
            ModifierConfig::Drop { fields } => {
                for path in fields {
                    let (parent, leaf) = split_path(path);
                    for_each_object(value, &parent, &mut |obj| {
                        obj.remove(leaf);
                        Ok(())
                    })?;
                }
                Ok(())
            }
            ModifierConfig::HardCode {
                on_chain_values, ..
            } => set_all(value, on_chain_values),
            ModifierConfig::AddressBytesToString { fields } => {
                map_leaves(value, fields, &mut |leaf| {
                    let text = leaf.as_str().ok_or_else(|| {
                        CodecError::invalid_type(format!("expected address string, got {leaf}"))
                    })?;
                    let address = AddressCodec::decode(text)?;
                    Ok(Value::String(hex::encode_prefixed(address)))
                })
            }
            ModifierConfig::EpochToTime { fields } => map_leaves(value, fields, &mut |leaf| {
                let text = leaf.as_str().ok_or_else(|| {
                    CodecError::invalid_type(format!("expected RFC 3339 time, got {leaf}"))
                })?;
                let time = DateTime::parse_from_rfc3339(text)
                    .map_err(|e| CodecError::invalid_type(format!("{text}: {e}")))?;
                let seconds = u64::try_from(time.timestamp()).map_err(|_| {
                    CodecError::invalid_type(format!("{text} is before the unix epoch"))
                })?;
                Ok(Value::from(seconds))
            }),
        }
    }
}

/// Ordered, composable list of modifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierChain(Vec<ModifierConfig>);

impl ModifierChain {
    /// Chain applying `modifiers` in on-chain to native order.
    pub fn new(modifiers: Vec<ModifierConfig>) -> Self {
        Self(modifiers)
    }

    /// Whether the chain does nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Transform an on-chain shaped value into the native shape.
    pub fn to_off_chain(&self, mut value: Value) -> Result<Value, CodecError> {
        for modifier in &self.0 {
            modifier.to_off_chain(&mut value)?;
        }
        Ok(value)
    }

    /// Transform a native value into the on-chain shape.
    pub fn to_on_chain(&self, mut value: Value) -> Result<Value, CodecError> {
        for modifier in self.0.iter().rev() {
            modifier.to_on_chain(&mut value)?;
        }
        Ok(value)
    }
}

fn split_path(path: &str) -> (Vec<&str>, &str) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let leaf = segments.pop().unwrap_or_default();
    (segments, leaf)
}

/// Call `f` on every object reached by walking `parent`, fanning out over arrays.
fn for_each_object(
    value: &mut Value,
    parent: &[&str],
    f: &mut dyn FnMut(&mut Map<String, Value>) -> Result<(), CodecError>,
) -> Result<(), CodecError> {
    match value {
        Value::Array(items) => {
            for item in items {
                for_each_object(item, parent, f)?;
            }
            Ok(())
        }
        Value::Object(obj) => match parent.split_first() {
            None => f(obj),
            Some((head, rest)) => match obj.get_mut(*head) {
                Some(child) => for_each_object(child, rest, f),
                None => Ok(()),
            },
        },
        _ => Ok(()),
    }
}

fn rename_at(value: &mut Value, parent: &[&str], from: &str, to: &str) -> Result<(), CodecError> {
    for_each_object(value, parent, &mut |obj| {
        if let Some(v) = obj.remove(from) {
            obj.insert(to.to_string(), v);
        }
        Ok(())
    })
}

fn set_all(value: &mut Value, values: &BTreeMap<String, Value>) -> Result<(), CodecError> {
    for (path, constant) in values {
        let (parent, leaf) = split_path(path);
        for_each_object(value, &parent, &mut |obj| {
            obj.insert(leaf.to_string(), constant.clone());
            Ok(())
        })?;
    }
    Ok(())
}

/// Replace each leaf named by `paths` with `f(leaf)`, fanning out over arrays
/// at the leaf too.
fn map_leaves(
    value: &mut Value,
    paths: &[String],
    f: &mut dyn FnMut(&Value) -> Result<Value, CodecError>,
) -> Result<(), CodecError> {
    for path in paths {
        let (parent, leaf) = split_path(path);
        for_each_object(value, &parent, &mut |obj| {
            if let Some(slot) = obj.get_mut(leaf) {
                map_value(slot, &mut *f)?;
            }
            Ok(())
        })?;
    }
    Ok(())
}

fn map_value(
    slot: &mut Value,
    f: &mut dyn FnMut(&Value) -> Result<Value, CodecError>,
) -> Result<(), CodecError> {
    match slot {
        // Byte arrays are a single address, not a list of leaves.
        Value::Array(items) if items.is_empty() || !items.iter().all(Value::is_u64) => {
            for item in items {
                map_value(item, f)?;
            }
            Ok(())
        }
        _ => {
            *slot = f(slot)?;
            Ok(())
        }
    }
}
