// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Runtime ABI codec for named items.
//!
//! Every method and event a reader declares gets two [`CodecEntry`]s keyed by
//! item type: `params.<contract>.<name>` and `return.<contract>.<name>` (see
//! [`wrap_item_type`]). Native values are anything `serde` can represent; they
//! pass through the entry's [`ModifierChain`] and its field table on their way
//! to and from the wire.
//!
//! # Examples
//!
//! ```
//! use alloy_json_abi::Function;
//! use evm_contract_reader::codec::{wrap_item_type, Codec, CodecEntry};
//! use serde_json::json;
//!
//! let balance_of = Function::parse("function balanceOf(address owner) returns (uint256)").unwrap();
//! let mut codec = Codec::new();
//! codec.add_entry(
//!     wrap_item_type("Token", "balanceOf", true),
//!     CodecEntry::method_params(&balance_of).unwrap(),
//! );
//!
//! let call_data = codec
//!     .encode(
//!         &json!({"owner": "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"}),
//!         "params.Token.balanceOf",
//!     )
//!     .unwrap();
//! assert_eq!(&call_data[..4], balance_of.selector().as_slice());
//! assert_eq!(call_data.len(), 4 + 32);
//! ```

mod address;
mod entry;
mod integer;
mod modifiers;
mod value;

use std::collections::HashMap;

use alloy_primitives::{Bytes, B256};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

pub use address::AddressCodec;
pub use entry::{CodecEntry, FieldDescriptor};
pub use integer::{verify_int, verify_uint};
pub use modifiers::{ModifierChain, ModifierConfig};

pub(crate) use entry::head_words;

use crate::errors::CodecError;

/// Codec item type for a contract read.
///
/// `is_params` selects the entry used to encode arguments; otherwise the entry
/// used to decode return values (or event payloads).
pub fn wrap_item_type(contract: &str, read_name: &str, is_params: bool) -> String {
    if is_params {
        format!("params.{contract}.{read_name}")
    } else {
        format!("return.{contract}.{read_name}")
    }
}

/// Encoder and decoder over a fixed set of named items.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    entries: HashMap<String, CodecEntry>,
}

impl Codec {
    /// Empty codec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the entry for `item_type`.
    pub fn add_entry(&mut self, item_type: impl Into<String>, entry: CodecEntry) {
        self.entries.insert(item_type.into(), entry);
    }

    /// Whether an entry exists for `item_type`.
    pub fn has_entry(&self, item_type: &str) -> bool {
        self.entries.contains_key(item_type)
    }

    /// Entry for `item_type`.
    pub fn entry(&self, item_type: &str) -> Result<&CodecEntry, CodecError> {
        self.entries
            .get(item_type)
            .ok_or_else(|| CodecError::unknown_item(item_type))
    }

    /// Encode any serializable native value as `item_type`.
    pub fn encode<T: Serialize + ?Sized>(
        &self,
        item: &T,
        item_type: &str,
    ) -> Result<Bytes, CodecError> {
        let native = serde_json::to_value(item).map_err(|e| {
            CodecError::invalid_type(format!("{item_type}: value is not representable: {e}"))
        })?;
        self.encode_value(&native, item_type)
    }

    /// Encode an already-native JSON value as `item_type`.
    pub fn encode_value(&self, native: &Value, item_type: &str) -> Result<Bytes, CodecError> {
        self.entry(item_type)?.encode(native).map(Bytes::from)
    }

    /// Decode wire bytes of `item_type` into `T`.
    pub fn decode<T: DeserializeOwned>(&self, raw: &[u8], item_type: &str) -> Result<T, CodecError> {
        let native = self.decode_value(raw, item_type)?;
        into_native(native, item_type)
    }

    /// Decode wire bytes of `item_type` into its native JSON form.
    pub fn decode_value(&self, raw: &[u8], item_type: &str) -> Result<Value, CodecError> {
        self.entry(item_type)?.decode(raw, item_type)
    }

    /// Decode an event log of `item_type` into `T`.
    pub fn decode_log<T: DeserializeOwned>(
        &self,
        topics: &[B256],
        data: &[u8],
        item_type: &str,
    ) -> Result<T, CodecError> {
        let native = self.entry(item_type)?.decode_log(topics, data, item_type)?;
        into_native(native, item_type)
    }

    /// Hash a native value into the topic or data word of a single-field item.
    pub fn encode_topic(&self, native: &Value, item_type: &str) -> Result<B256, CodecError> {
        self.entry(item_type)?.encode_word(native)
    }

    /// Apply `item_type`'s modifiers in encoding direction, without packing.
    pub fn to_on_chain(&self, native: &Value, item_type: &str) -> Result<Value, CodecError> {
        self.entry(item_type)?.to_on_chain(native)
    }

    /// Zero-valued native instance of `item_type`.
    ///
    /// The shape is the same in both directions; `_for_encoding` is accepted
    /// for symmetry with [`Codec::create_contract_type`].
    pub fn create_type(&self, item_type: &str, _for_encoding: bool) -> Result<Value, CodecError> {
        self.entry(item_type)?.zero_native()
    }

    /// Zero-valued native instance for a contract read's params or return.
    pub fn create_contract_type(
        &self,
        contract: &str,
        read_name: &str,
        for_encoding: bool,
    ) -> Result<Value, CodecError> {
        self.create_type(&wrap_item_type(contract, read_name, for_encoding), for_encoding)
    }
}

fn into_native<T: DeserializeOwned>(native: Value, item_type: &str) -> Result<T, CodecError> {
    serde_json::from_value(native).map_err(|e| CodecError::conversion_failed(item_type, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_json_abi::{Event, Function};
    use alloy_primitives::{address, keccak256, U256};
    use serde_json::json;

    fn token_codec() -> Codec {
        let transfer = Event::parse(
            "event Transfer(address indexed from, address indexed to, uint256 value)",
        )
        .unwrap();
        let balance_of =
            Function::parse("function balanceOf(address owner) returns (uint256)").unwrap();

        let mut codec = Codec::new();
        codec.add_entry(
            wrap_item_type("Token", "balanceOf", true),
            CodecEntry::method_params(&balance_of).unwrap(),
        );
        codec.add_entry(
            wrap_item_type("Token", "balanceOf", false),
            CodecEntry::method_return(&balance_of).unwrap(),
        );
        codec.add_entry(
            wrap_item_type("Token", "Transfer", false),
            CodecEntry::event(&transfer).unwrap(),
        );
        codec
    }

    #[test]
    fn unknown_item_type_is_invalid_type() {
        let codec = token_codec();
        assert!(codec.encode(&json!({}), "params.Token.nope").unwrap_err().is_invalid_type());
        assert!(codec
            .decode::<u64>(&[], "return.Token.nope")
            .unwrap_err()
            .is_invalid_type());
    }

    #[test]
    fn return_decodes_into_native_integer_types() {
        let codec = token_codec();
        let raw = U256::from(1_000_000u64).to_be_bytes::<32>();
        let as_u256: U256 = codec.decode(&raw, "return.Token.balanceOf").unwrap();
        assert_eq!(as_u256, U256::from(1_000_000u64));
    }

    #[test]
    fn decode_log_merges_payload_and_topics() {
        let codec = token_codec();
        let from = address!("1111111111111111111111111111111111111111");
        let to = address!("2222222222222222222222222222222222222222");
        let topics = vec![
            keccak256("Transfer(address,address,uint256)"),
            from.into_word(),
            to.into_word(),
        ];
        let data = U256::from(5).to_be_bytes::<32>();
        let decoded: Value = codec
            .decode_log(&topics, &data, "return.Token.Transfer")
            .unwrap();
        assert_eq!(
            decoded,
            json!({
                "from": from.to_checksum(None),
                "to": to.to_checksum(None),
                "value": "5"
            })
        );
    }

    #[test]
    fn create_contract_type_returns_zero_shape() {
        let codec = token_codec();
        assert_eq!(
            codec.create_contract_type("Token", "balanceOf", true).unwrap(),
            json!({"owner": "0x0000000000000000000000000000000000000000"})
        );
        assert_eq!(
            codec.create_contract_type("Token", "balanceOf", false).unwrap(),
            json!("0")
        );
    }
}
