// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Conversion between native JSON values and ABI values, driven by the field
//! descriptor table of a codec entry.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{hex, Address, B256, I256, U256};
use serde_json::{Map, Value};

use super::entry::FieldDescriptor;
use super::integer::{int_to_value, parse_int, parse_uint, uint_to_value};
use crate::errors::CodecError;

/// Convert a native value into the ABI value declared by `field`.
pub(crate) fn to_sol(value: &Value, field: &FieldDescriptor) -> Result<DynSolValue, CodecError> {
    to_sol_typed(value, &field.ty, &field.components, &field.name)
}

fn to_sol_typed(
    value: &Value,
    ty: &DynSolType,
    components: &[FieldDescriptor],
    path: &str,
) -> Result<DynSolValue, CodecError> {
    let wrong = |expected: &str| {
        CodecError::invalid_type(format!("{path}: expected {expected}, got {value}"))
    };
    match ty {
        DynSolType::Bool => value.as_bool().map(DynSolValue::Bool).ok_or_else(|| wrong("bool")),
        DynSolType::Uint(bits) => parse_uint(value, *bits)
            .map(|v| DynSolValue::Uint(v, *bits))
            .map_err(|e| CodecError::invalid_type(format!("{path}: {e}"))),
        DynSolType::Int(bits) => parse_int(value, *bits)
            .map(|v| DynSolValue::Int(v, *bits))
            .map_err(|e| CodecError::invalid_type(format!("{path}: {e}"))),
        DynSolType::Address => {
            let bytes = bytes_of(value).ok_or_else(|| wrong("address"))?;
            if bytes.len() != 20 {
                return Err(wrong("20-byte address"));
            }
            Ok(DynSolValue::Address(Address::from_slice(&bytes)))
        }
        DynSolType::FixedBytes(size) => {
            let bytes = bytes_of(value).ok_or_else(|| wrong("fixed bytes"))?;
            if bytes.len() != *size {
                return Err(wrong(&format!("bytes{size}")));
            }
            let mut word = B256::ZERO;
            word[..*size].copy_from_slice(&bytes);
            Ok(DynSolValue::FixedBytes(word, *size))
        }
        DynSolType::Bytes => bytes_of(value)
            .map(DynSolValue::Bytes)
            .ok_or_else(|| wrong("bytes")),
        DynSolType::String => value
            .as_str()
            .map(|s| DynSolValue::String(s.to_string()))
            .ok_or_else(|| wrong("string")),
        DynSolType::Array(inner) => {
            let items = value.as_array().ok_or_else(|| wrong("array"))?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| to_sol_typed(item, inner, components, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::Array)
        }
        DynSolType::FixedArray(inner, size) => {
            let items = value.as_array().ok_or_else(|| wrong("array"))?;
            if items.len() != *size {
                return Err(wrong(&format!("array of length {size}")));
            }
            items
                .iter()
                .enumerate()
                .map(|(i, item)| to_sol_typed(item, inner, components, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::FixedArray)
        }
        DynSolType::Tuple(_) => {
            let object = value.as_object().ok_or_else(|| wrong("object"))?;
            tuple_from_object(object, components, path).map(DynSolValue::Tuple)
        }
        _ => Err(CodecError::invalid_type(format!(
            "{path}: type {ty} is not supported"
        ))),
    }
}

/// Reject keys of `object` that name none of `fields`.
pub(crate) fn check_known_keys(
    object: &Map<String, Value>,
    fields: &[FieldDescriptor],
    path: &str,
) -> Result<(), CodecError> {
    match object
        .keys()
        .find(|key| !fields.iter().any(|field| &field.name == *key))
    {
        Some(key) => Err(CodecError::invalid_type(format!(
            "{}: unknown field",
            join(path, key)
        ))),
        None => Ok(()),
    }
}

/// Convert an object into ordered tuple values. Missing fields are zero-filled,
/// unknown fields are rejected.
pub(crate) fn tuple_from_object(
    object: &Map<String, Value>,
    fields: &[FieldDescriptor],
    path: &str,
) -> Result<Vec<DynSolValue>, CodecError> {
    check_known_keys(object, fields, path)?;
    fields
        .iter()
        .map(|field| match object.get(&field.name) {
            Some(Value::Null) | None => zero_value(&field.ty),
            Some(v) => to_sol_typed(v, &field.ty, &field.components, &join(path, &field.name)),
        })
        .collect()
}

/// Convert an ABI value back into its native form.
pub(crate) fn from_sol(value: &DynSolValue, field: &FieldDescriptor) -> Value {
    from_sol_typed(value, &field.components)
}

fn from_sol_typed(value: &DynSolValue, components: &[FieldDescriptor]) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Uint(v, bits) => uint_to_value(*v, *bits),
        DynSolValue::Int(v, bits) => int_to_value(*v, *bits),
        DynSolValue::Address(a) => Value::String(a.to_checksum(None)),
        DynSolValue::FixedBytes(word, size) => {
            Value::String(hex::encode_prefixed(&word[..(*size).min(32)]))
        }
        DynSolValue::Bytes(b) => Value::String(hex::encode_prefixed(b)),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => Value::Array(
            items
                .iter()
                .map(|item| from_sol_typed(item, components))
                .collect(),
        ),
        DynSolValue::Tuple(items) => Value::Object(object_from_tuple(items, components)),
        DynSolValue::Function(f) => Value::String(hex::encode_prefixed(f.as_slice())),
        #[allow(unreachable_patterns)]
        _ => Value::Null,
    }
}

/// Convert ordered tuple values into an object keyed by field name.
pub(crate) fn object_from_tuple(
    items: &[DynSolValue],
    fields: &[FieldDescriptor],
) -> Map<String, Value> {
    items
        .iter()
        .zip(fields)
        .map(|(item, field)| (field.name.clone(), from_sol(item, field)))
        .collect()
}

/// Zero value of an ABI type, used for missing and dropped fields.
pub(crate) fn zero_value(ty: &DynSolType) -> Result<DynSolValue, CodecError> {
    Ok(match ty {
        DynSolType::Bool => DynSolValue::Bool(false),
        DynSolType::Uint(bits) => DynSolValue::Uint(U256::ZERO, *bits),
        DynSolType::Int(bits) => DynSolValue::Int(I256::ZERO, *bits),
        DynSolType::Address => DynSolValue::Address(Address::ZERO),
        DynSolType::FixedBytes(size) => DynSolValue::FixedBytes(B256::ZERO, *size),
        DynSolType::Bytes => DynSolValue::Bytes(Vec::new()),
        DynSolType::String => DynSolValue::String(String::new()),
        DynSolType::Array(_) => DynSolValue::Array(Vec::new()),
        DynSolType::FixedArray(inner, size) => DynSolValue::FixedArray(
            (0..*size)
                .map(|_| zero_value(inner))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        DynSolType::Tuple(types) => {
            DynSolValue::Tuple(types.iter().map(zero_value).collect::<Result<Vec<_>, _>>()?)
        }
        other => {
            return Err(CodecError::invalid_type(format!(
                "type {other} has no zero value"
            )))
        }
    })
}

/// Raw bytes from a hex string or an array of byte values.
pub(crate) fn bytes_of(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::String(s) => hex::decode(s.trim()).ok(),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect(),
        _ => None,
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(name: &str, ty: &str) -> FieldDescriptor {
        FieldDescriptor::new(name, DynSolType::parse(ty).unwrap())
    }

    #[test]
    fn tuple_fields_follow_declaration_order() {
        let fields = vec![field("amount", "uint256"), field("owner", "address")];
        let object = json!({
            "owner": "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "amount": "1000"
        });
        let values = tuple_from_object(object.as_object().unwrap(), &fields, "").unwrap();
        assert_eq!(values[0], DynSolValue::Uint(U256::from(1000), 256));
        assert!(matches!(values[1], DynSolValue::Address(_)));
    }

    #[test]
    fn missing_fields_are_zero_filled() {
        let fields = vec![field("flag", "bool"), field("name", "string")];
        let values = tuple_from_object(&Map::new(), &fields, "").unwrap();
        assert_eq!(
            values,
            vec![DynSolValue::Bool(false), DynSolValue::String(String::new())]
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let fields = vec![field("owner", "address")];
        let object = json!({"ownr": "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"});
        let err = tuple_from_object(object.as_object().unwrap(), &fields, "").unwrap_err();
        assert!(err.is_invalid_type());
        assert!(err.to_string().contains("ownr"));

        let mut point = field("point", "(uint64,int32)");
        point.components = vec![field("x", "uint64"), field("y", "int32")];
        let err = to_sol(&json!({"x": 1, "z": 2}), &point).unwrap_err();
        assert!(err.to_string().contains("point.z"));
    }

    #[test]
    fn fixed_bytes_length_is_checked() {
        let word = field("id", "bytes4");
        assert!(to_sol(&json!("0x01020304"), &word).is_ok());
        assert!(to_sol(&json!("0x010203"), &word).unwrap_err().is_invalid_type());
    }

    #[test]
    fn nested_tuples_round_trip_through_native_form() {
        let mut point = field("point", "(uint64,int32)");
        point.components = vec![field("x", "uint64"), field("y", "int32")];
        let native = json!({"x": 3, "y": -4});
        let sol = to_sol(&native, &point).unwrap();
        assert_eq!(from_sol(&sol, &point), native);
    }
}
