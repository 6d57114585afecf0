// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Conversion between raw 20-byte addresses and checksummed strings.

use alloy_primitives::{hex, Address};

use crate::errors::CodecError;

const ADDRESS_LEN: usize = 20;

/// Converts between raw address bytes and EIP-55 checksummed strings.
///
/// Decoding is strict: the zero address, empty input and anything that is not
/// exactly 20 bytes of hex are rejected as invalid types.
///
/// # Examples
///
/// ```
/// use alloy_primitives::address;
/// use evm_contract_reader::codec::AddressCodec;
///
/// let raw = address!("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
/// let text = AddressCodec::encode(raw.as_slice()).unwrap();
/// assert_eq!(text, "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
/// assert_eq!(AddressCodec::decode(&text).unwrap(), raw);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressCodec;

impl AddressCodec {
    /// Checksummed string for `bytes`, which must be exactly 20 bytes long.
    pub fn encode(bytes: &[u8]) -> Result<String, CodecError> {
        if bytes.len() != ADDRESS_LEN {
            return Err(CodecError::invalid_type(format!(
                "address must be {} bytes, got {}",
                ADDRESS_LEN,
                bytes.len()
            )));
        }
        Ok(Address::from_slice(bytes).to_checksum(None))
    }

    /// Parse a hex address string, with or without `0x`.
    pub fn decode(text: &str) -> Result<Address, CodecError> {
        let digits = text.strip_prefix("0x").unwrap_or(text);
        if digits.is_empty() {
            return Err(CodecError::invalid_type("empty address string"));
        }
        if digits.len() != ADDRESS_LEN * 2 {
            return Err(CodecError::invalid_type(format!(
                "address {text} must be {} hex characters",
                ADDRESS_LEN * 2
            )));
        }
        let bytes = hex::decode(digits)
            .map_err(|e| CodecError::invalid_type(format!("address {text} is not hex: {e}")))?;
        let address = Address::from_slice(&bytes);
        if address.is_zero() {
            return Err(CodecError::invalid_type("zero address is not allowed"));
        }
        Ok(address)
    }
}
