// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Sized integer coercion.
//!
//! Native integers arrive as JSON numbers, decimal strings or `0x` hex strings
//! and are widened to 256 bits. Each value is checked against the declared
//! Solidity bit width before it reaches the ABI packer, which would otherwise
//! silently truncate it.

use alloy_primitives::{I256, U256};
use serde_json::Value;

use crate::errors::CodecError;

/// Parse an unsigned integer and verify it fits in `bits`.
pub fn parse_uint(value: &Value, bits: usize) -> Result<U256, CodecError> {
    let parsed = match value {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| CodecError::invalid_type(format!("{n} is not a uint{bits}")))?,
        Value::String(s) => s
            .trim()
            .parse::<U256>()
            .map_err(|e| CodecError::invalid_type(format!("{s} is not a uint{bits}: {e}")))?,
        other => {
            return Err(CodecError::invalid_type(format!(
                "expected uint{bits}, got {other}"
            )))
        }
    };
    verify_uint(parsed, bits)?;
    Ok(parsed)
}

/// Parse a signed integer and verify it fits in `bits`.
pub fn parse_int(value: &Value, bits: usize) -> Result<I256, CodecError> {
    let parsed = match value {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                I256::try_from(v)
                    .map_err(|e| CodecError::invalid_type(format!("{n} is not an int{bits}: {e}")))?
            } else if let Some(v) = n.as_u64() {
                I256::from_raw(U256::from(v))
            } else {
                return Err(CodecError::invalid_type(format!("{n} is not an int{bits}")));
            }
        }
        Value::String(s) => parse_int_str(s.trim())
            .map_err(|e| CodecError::invalid_type(format!("{s} is not an int{bits}: {e}")))?,
        other => {
            return Err(CodecError::invalid_type(format!(
                "expected int{bits}, got {other}"
            )))
        }
    };
    verify_int(parsed, bits)?;
    Ok(parsed)
}

fn parse_int_str(s: &str) -> Result<I256, String> {
    if let Some(hex) = s.strip_prefix("0x") {
        let raw = U256::from_str_radix(hex, 16).map_err(|e| e.to_string())?;
        if raw.bit_len() == 256 {
            return Err("hex literal does not fit a signed 256-bit integer".to_string());
        }
        return Ok(I256::from_raw(raw));
    }
    I256::from_dec_str(s).map_err(|e| e.to_string())
}

/// Fails when `value` needs more than `bits` bits.
pub fn verify_uint(value: U256, bits: usize) -> Result<(), CodecError> {
    if value.bit_len() > bits {
        return Err(CodecError::invalid_type(format!(
            "{value} overflows uint{bits}"
        )));
    }
    Ok(())
}

/// Fails when `value` is outside `[-2^(bits-1), 2^(bits-1) - 1]`.
pub fn verify_int(value: I256, bits: usize) -> Result<(), CodecError> {
    if bits == 0 {
        return Err(CodecError::invalid_type("int0 is not a valid type"));
    }
    let magnitude = value.unsigned_abs();
    let fits = if value.is_negative() {
        magnitude <= U256::from(1u8) << (bits - 1)
    } else {
        magnitude.bit_len() < bits
    };
    if !fits {
        return Err(CodecError::invalid_type(format!("{value} overflows int{bits}")));
    }
    Ok(())
}

/// Native form of a decoded unsigned integer: a JSON number up to 64 bits,
/// a decimal string above.
pub fn uint_to_value(value: U256, bits: usize) -> Value {
    if bits <= 64 {
        if let Ok(small) = u64::try_from(value) {
            return Value::from(small);
        }
    }
    Value::String(value.to_string())
}

/// Native form of a decoded signed integer: a JSON number up to 64 bits,
/// a decimal string above.
pub fn int_to_value(value: I256, bits: usize) -> Value {
    if bits <= 64 {
        if let Ok(small) = i64::try_from(value) {
            return Value::from(small);
        }
    }
    Value::String(value.to_string())
}
