// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Codec entries: the wire-shape descriptor of one named item.
//!
//! An entry is built once from the contract ABI and holds an explicit field
//! table (name, position, ABI type). Both packing and unpacking walk that
//! table in declaration order, so no per-call type introspection is needed.

use std::panic::{catch_unwind, AssertUnwindSafe};

use alloy_dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy_json_abi::{Event, EventParam, Function, Param};
use alloy_primitives::{keccak256, B256};
use serde_json::{Map, Value};

use super::modifiers::ModifierChain;
use super::value::{
    check_known_keys, from_sol, object_from_tuple, to_sol, tuple_from_object, zero_value,
};
use crate::errors::CodecError;

/// One declared argument of an item.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Native field name, `arg{i}` for unnamed arguments
    pub name: String,
    /// ABI type
    pub ty: DynSolType,
    /// Tuple components, for tuples and arrays of tuples
    pub components: Vec<FieldDescriptor>,
    /// Event argument stored in a topic
    pub indexed: bool,
}

impl FieldDescriptor {
    /// A plain, non-indexed field.
    pub fn new(name: impl Into<String>, ty: DynSolType) -> Self {
        Self {
            name: name.into(),
            ty,
            components: Vec::new(),
            indexed: false,
        }
    }

    fn from_param(param: &Param, position: usize) -> Result<Self, CodecError> {
        let ty = param.resolve().map_err(|e| {
            CodecError::invalid_type(format!("cannot resolve type {}: {e}", param.ty))
        })?;
        let components = param
            .components
            .iter()
            .enumerate()
            .map(|(i, c)| Self::from_param(c, i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: field_name(&param.name, position),
            ty,
            components,
            indexed: false,
        })
    }

    fn from_event_param(param: &EventParam, position: usize) -> Result<Self, CodecError> {
        let ty = param.resolve().map_err(|e| {
            CodecError::invalid_type(format!("cannot resolve type {}: {e}", param.ty))
        })?;
        let components = param
            .components
            .iter()
            .enumerate()
            .map(|(i, c)| Self::from_param(c, i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: field_name(&param.name, position),
            ty,
            components,
            indexed: param.indexed,
        })
    }

    /// Whether the value occupies exactly one 32-byte word when encoded.
    pub fn is_word(&self) -> bool {
        matches!(
            self.ty,
            DynSolType::Bool
                | DynSolType::Int(_)
                | DynSolType::Uint(_)
                | DynSolType::Address
                | DynSolType::FixedBytes(_)
        )
    }
}

fn field_name(name: &str, position: usize) -> String {
    if name.is_empty() {
        format!("arg{position}")
    } else {
        name.to_string()
    }
}

/// Number of 32-byte words `ty` occupies in the head of an encoding.
pub(crate) fn head_words(ty: &DynSolType) -> usize {
    if ty.is_dynamic() {
        return 1;
    }
    match ty {
        DynSolType::FixedArray(inner, size) => head_words(inner) * size,
        DynSolType::Tuple(types) => types.iter().map(head_words).sum(),
        _ => 1,
    }
}

/// Wire-shape descriptor of one named item.
#[derive(Debug, Clone, Default)]
pub struct CodecEntry {
    fields: Vec<FieldDescriptor>,
    prefix: Vec<u8>,
    bare: bool,
    modifier: ModifierChain,
}

impl CodecEntry {
    /// Entry over `fields`, encoded as an object keyed by field name.
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Entry over a single field whose native form is the bare value.
    pub fn single(field: FieldDescriptor) -> Self {
        Self {
            fields: vec![field],
            bare: true,
            ..Self::default()
        }
    }

    /// Method parameters, prefixed with the function selector.
    pub fn method_params(function: &Function) -> Result<Self, CodecError> {
        Ok(Self::from_params(&function.inputs)?.with_prefix(function.selector().to_vec()))
    }

    /// Method return values.
    pub fn method_return(function: &Function) -> Result<Self, CodecError> {
        Self::from_params(&function.outputs)
    }

    /// All event arguments, in declaration order, with their indexed flags.
    pub fn event(event: &Event) -> Result<Self, CodecError> {
        let fields = event
            .inputs
            .iter()
            .enumerate()
            .map(|(i, input)| FieldDescriptor::from_event_param(input, i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(fields))
    }

    fn from_params(params: &[Param]) -> Result<Self, CodecError> {
        let fields = params
            .iter()
            .enumerate()
            .map(|(i, p)| FieldDescriptor::from_param(p, i))
            .collect::<Result<Vec<_>, _>>()?;
        let bare = params.len() == 1 && params[0].name.is_empty();
        Ok(Self {
            fields,
            bare,
            ..Self::default()
        })
    }

    /// Set the fixed bytes written before the payload.
    pub fn with_prefix(mut self, prefix: Vec<u8>) -> Self {
        self.prefix = prefix;
        self
    }

    /// Attach a modifier chain.
    pub fn with_modifier(mut self, modifier: ModifierChain) -> Self {
        self.modifier = modifier;
        self
    }

    /// Declared fields, in wire order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Field with the given on-chain name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fixed prefix, the selector for method parameters.
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Modifier chain applied between native and on-chain shapes.
    pub fn modifier(&self) -> &ModifierChain {
        &self.modifier
    }

    /// Pack a native value into wire bytes.
    pub fn encode(&self, native: &Value) -> Result<Vec<u8>, CodecError> {
        if self.fields.is_empty() {
            return Ok(self.prefix.clone());
        }
        if native.is_null() {
            return Err(CodecError::invalid_type(format!(
                "expected {} argument(s), got null",
                self.fields.len()
            )));
        }
        let on_chain = self.modifier.to_on_chain(native.clone())?;
        let values = self.to_values(&on_chain)?;
        let packed = catch_unwind(AssertUnwindSafe(|| {
            DynSolValue::Tuple(values).abi_encode_params()
        }))
        .map_err(|_| CodecError::invalid_type("value rejected by the ABI packer"))?;

        let mut out = self.prefix.clone();
        out.extend_from_slice(&packed);
        Ok(out)
    }

    /// Unpack wire bytes into the native shape.
    pub fn decode(&self, raw: &[u8], item: &str) -> Result<Value, CodecError> {
        if self.fields.is_empty() {
            return Ok(Value::Null);
        }
        let decoded = self
            .tuple_type(|_| true)
            .abi_decode_params(raw)
            .map_err(|e| CodecError::decode_failed(item, e))?;
        let DynSolValue::Tuple(items) = decoded else {
            return Err(CodecError::decode_failed(item, "expected a tuple"));
        };
        self.modifier.to_off_chain(self.to_native(&items))
    }

    /// Decode an event log: non-indexed payload first, then topics after the
    /// signature, merged into one object in declaration order.
    pub fn decode_log(&self, topics: &[B256], data: &[u8], item: &str) -> Result<Value, CodecError> {
        let decoded = self
            .tuple_type(|f| !f.indexed)
            .abi_decode_params(data)
            .map_err(|e| CodecError::decode_failed(item, e))?;
        let DynSolValue::Tuple(payload) = decoded else {
            return Err(CodecError::decode_failed(item, "expected a tuple"));
        };
        let mut payload = payload.into_iter();
        let mut topic_values = topics.iter().skip(1);

        let mut object = Map::new();
        for field in &self.fields {
            let value = if field.indexed {
                let topic = topic_values.next().ok_or_else(|| {
                    CodecError::decode_failed(item, format!("missing topic for {}", field.name))
                })?;
                if field.is_word() {
                    let value = field
                        .ty
                        .abi_decode(topic.as_slice())
                        .map_err(|e| CodecError::decode_failed(item, e))?;
                    from_sol(&value, field)
                } else {
                    // Only the hash of dynamic indexed values is on chain.
                    Value::String(topic.to_string())
                }
            } else {
                let value = payload.next().ok_or_else(|| {
                    CodecError::decode_failed(item, format!("missing data for {}", field.name))
                })?;
                from_sol(&value, field)
            };
            object.insert(field.name.clone(), value);
        }
        self.modifier.to_off_chain(Value::Object(object))
    }

    /// Encode a native value of the single field as a topic or data word.
    ///
    /// Word-sized values are left-padded into the word; dynamic values are
    /// hashed the way indexed dynamic arguments are.
    pub fn encode_word(&self, native: &Value) -> Result<B256, CodecError> {
        let [field] = self.fields.as_slice() else {
            return Err(CodecError::invalid_type(
                "topic encoding needs exactly one field",
            ));
        };
        let value = to_sol(native, field)?;
        Ok(value
            .as_word()
            .unwrap_or_else(|| keccak256(value.abi_encode_packed())))
    }

    /// Apply the modifier chain in encoding direction without packing.
    ///
    /// Object keys left after the chain must name declared fields.
    pub fn to_on_chain(&self, native: &Value) -> Result<Value, CodecError> {
        let on_chain = self.modifier.to_on_chain(native.clone())?;
        if let (false, Value::Object(object)) = (self.bare, &on_chain) {
            check_known_keys(object, &self.fields, "")?;
        }
        Ok(on_chain)
    }

    /// Zero-valued native instance of this item.
    pub fn zero_native(&self) -> Result<Value, CodecError> {
        let zeros = self
            .fields
            .iter()
            .map(|f| zero_value(&f.ty))
            .collect::<Result<Vec<_>, _>>()?;
        if self.fields.is_empty() {
            return Ok(Value::Null);
        }
        self.modifier.to_off_chain(self.to_native(&zeros))
    }

    fn tuple_type(&self, include: impl Fn(&FieldDescriptor) -> bool) -> DynSolType {
        DynSolType::Tuple(
            self.fields
                .iter()
                .filter(|f| include(f))
                .map(|f| f.ty.clone())
                .collect(),
        )
    }

    fn to_values(&self, on_chain: &Value) -> Result<Vec<DynSolValue>, CodecError> {
        if self.bare {
            return Ok(vec![to_sol(on_chain, &self.fields[0])?]);
        }
        let object = on_chain.as_object().ok_or_else(|| {
            CodecError::invalid_type(format!("expected an object of arguments, got {on_chain}"))
        })?;
        tuple_from_object(object, &self.fields, "")
    }

    fn to_native(&self, items: &[DynSolValue]) -> Value {
        match (self.bare, items) {
            (true, [only]) => from_sol(only, &self.fields[0]),
            _ => Value::Object(object_from_tuple(items, &self.fields)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use serde_json::json;

    fn function(signature: &str) -> Function {
        Function::parse(signature).unwrap()
    }

    #[test]
    fn zero_argument_item_encodes_to_prefix() {
        let entry = CodecEntry::method_params(&function("function totalSupply() returns (uint256)"))
            .unwrap();
        let encoded = entry.encode(&Value::Null).unwrap();
        assert_eq!(encoded, function("function totalSupply()").selector().to_vec());
    }

    #[test]
    fn null_item_with_arguments_is_invalid_type() {
        let entry =
            CodecEntry::method_params(&function("function balanceOf(address owner)")).unwrap();
        assert!(entry.encode(&Value::Null).unwrap_err().is_invalid_type());
    }

    #[test]
    fn single_unnamed_output_decodes_bare() {
        let entry =
            CodecEntry::method_return(&function("function totalSupply() returns (uint256)"))
                .unwrap();
        let raw = DynSolValue::Uint(U256::from(77), 256).abi_encode();
        assert_eq!(entry.decode(&raw, "return.T.totalSupply").unwrap(), json!("77"));
    }

    #[test]
    fn named_outputs_decode_to_object() {
        let entry = CodecEntry::method_return(&function(
            "function slot0() returns (uint160 price, int24 tick)",
        ))
        .unwrap();
        let raw = DynSolValue::Tuple(vec![
            DynSolValue::Uint(U256::from(5), 160),
            DynSolValue::Int(alloy_primitives::I256::try_from(-3).unwrap(), 24),
        ])
        .abi_encode_params();
        assert_eq!(
            entry.decode(&raw, "return.Pool.slot0").unwrap(),
            json!({"price": "5", "tick": -3})
        );
    }

    #[test]
    fn head_words_counts_static_arrays() {
        assert_eq!(head_words(&DynSolType::parse("uint256").unwrap()), 1);
        assert_eq!(head_words(&DynSolType::parse("uint8[3]").unwrap()), 3);
        assert_eq!(head_words(&DynSolType::parse("(uint8,bool)").unwrap()), 2);
        assert_eq!(head_words(&DynSolType::parse("string").unwrap()), 1);
    }
}
