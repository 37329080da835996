// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::{
    AvroResult,
    error::Details,
    schema::{NamesRef, RecordSchema, Schema, SchemaKind},
    types::{Value, ValueKind},
    util::{zig_i32, zig_i64},
};
use log::error;
use std::collections::HashMap;
use std::io::Write;

/// Encode a `Value` into Avro binary format.
///
/// Schemas are needed to guide the encoding of complex type values and to
/// pick union branches.
pub fn encode<W: Write>(value: &Value, schema: &Schema, writer: &mut W) -> AvroResult<()> {
    let mut names = NamesRef::new();
    schema.collect_named_schemas(&mut names);
    encode_internal(value, schema, &names, writer)
}

pub(crate) fn encode_bytes<B: AsRef<[u8]> + ?Sized, W: Write>(
    s: &B,
    writer: &mut W,
) -> AvroResult<()> {
    let bytes = s.as_ref();
    encode_long(bytes.len() as i64, &mut *writer)?;
    writer
        .write_all(bytes)
        .map_err(|e| Details::WriteBytes(e).into())
}

pub(crate) fn encode_long<W: Write>(i: i64, writer: W) -> AvroResult<()> {
    zig_i64(i, writer).map(|_| ())
}

pub(crate) fn encode_int<W: Write>(i: i32, writer: W) -> AvroResult<()> {
    zig_i32(i, writer).map(|_| ())
}

pub(crate) fn encode_internal<W: Write>(
    value: &Value,
    schema: &Schema,
    names: &NamesRef,
    writer: &mut W,
) -> AvroResult<()> {
    if let Schema::Ref { name } = schema {
        let resolved = names
            .get(name)
            .ok_or_else(|| Details::SchemaResolutionError(name.clone()))?;
        return encode_internal(value, resolved, names, writer);
    }

    // A bare value under a union schema needs a branch index first. Null and
    // explicitly wrapped values carry their branch and are handled below.
    if matches!(schema, Schema::Union(_)) && !matches!(value, Value::Union(_, _) | Value::Null) {
        return encode_union(value, schema, names, writer);
    }

    match value {
        Value::Null => {
            if let Schema::Union(union) = schema {
                match union
                    .variants()
                    .iter()
                    .position(|sch| matches!(sch, Schema::Null(_)))
                {
                    Some(p) => encode_long(p as i64, writer),
                    None => Err(Details::EncodeValueAsSchemaError {
                        value_kind: ValueKind::Null,
                        supported_schema: vec![SchemaKind::Null, SchemaKind::Union],
                    }
                    .into()),
                }
            } else {
                Ok(())
            }
        }
        Value::Boolean(b) => writer
            .write_all(&[u8::from(*b)])
            .map_err(|e| Details::WriteBytes(e).into()),
        Value::Int(i) => encode_int(*i, writer),
        Value::Long(i) => encode_long(*i, writer),
        Value::Float(x) => writer
            .write_all(&x.to_le_bytes())
            .map_err(|e| Details::WriteBytes(e).into()),
        Value::Double(x) => writer
            .write_all(&x.to_le_bytes())
            .map_err(|e| Details::WriteBytes(e).into()),
        Value::Bytes(bytes) => match schema {
            Schema::Bytes(_) => encode_bytes(bytes, writer),
            Schema::Fixed(fixed) => {
                if bytes.len() != fixed.size {
                    return Err(Details::CompareFixedSizes {
                        size: fixed.size,
                        observed: bytes.len(),
                    }
                    .into());
                }
                writer
                    .write_all(bytes.as_slice())
                    .map_err(|e| Details::WriteBytes(e).into())
            }
            _ => Err(Details::EncodeValueAsSchemaError {
                value_kind: ValueKind::Bytes,
                supported_schema: vec![SchemaKind::Bytes, SchemaKind::Fixed],
            }
            .into()),
        },
        Value::String(s) => match schema {
            Schema::String(_) | Schema::Bytes(_) => encode_bytes(s, writer),
            Schema::Enum(inner) => {
                if let Some(index) = inner.symbols.iter().position(|item| item == s) {
                    encode_int(index as i32, writer)
                } else {
                    error!("Invalid symbol string {:?}.", &s[..]);
                    Err(Details::GetEnumSymbol(s.clone()).into())
                }
            }
            _ => Err(Details::EncodeValueAsSchemaError {
                value_kind: ValueKind::String,
                supported_schema: vec![SchemaKind::String, SchemaKind::Enum],
            }
            .into()),
        },
        Value::Fixed(observed, bytes) => match schema {
            Schema::Fixed(fixed) if fixed.size == *observed && bytes.len() == *observed => writer
                .write_all(bytes.as_slice())
                .map_err(|e| Details::WriteBytes(e).into()),
            Schema::Fixed(fixed) => Err(Details::CompareFixedSizes {
                size: fixed.size,
                observed: bytes.len(),
            }
            .into()),
            _ => Err(Details::EncodeValueAsSchemaError {
                value_kind: ValueKind::Fixed,
                supported_schema: vec![SchemaKind::Fixed],
            }
            .into()),
        },
        Value::Enum(_, symbol) => match schema {
            Schema::Enum(inner) => {
                // the symbol wins over the stored position when they diverge
                match inner.symbols.iter().position(|item| item == symbol) {
                    Some(position) => encode_int(position as i32, writer),
                    None => Err(Details::GetEnumSymbol(symbol.clone()).into()),
                }
            }
            _ => Err(Details::EncodeValueAsSchemaError {
                value_kind: ValueKind::Enum,
                supported_schema: vec![SchemaKind::Enum],
            }
            .into()),
        },
        Value::Union(index, item) => {
            if let Schema::Union(inner) = schema {
                let inner_schema = inner.variants().get(*index as usize).ok_or(
                    Details::GetUnionVariant {
                        index: *index as i64,
                        num_variants: inner.variants().len(),
                    },
                )?;
                encode_long(*index as i64, &mut *writer)?;
                encode_internal(item, inner_schema, names, writer)
            } else {
                encode_internal(item, schema, names, writer)
            }
        }
        Value::Array(items) => {
            if let Schema::Array(inner) = schema {
                if !items.is_empty() {
                    encode_long(items.len() as i64, &mut *writer)?;
                    for item in items.iter() {
                        encode_internal(item, &inner.items, names, writer)?;
                    }
                }
                // a zero count terminates the blocks
                writer
                    .write_all(&[0u8])
                    .map_err(|e| Details::WriteBytes(e).into())
            } else {
                error!("invalid schema type for Array: {schema:?}");
                Err(Details::EncodeValueAsSchemaError {
                    value_kind: ValueKind::Array,
                    supported_schema: vec![SchemaKind::Array],
                }
                .into())
            }
        }
        Value::Map(items) => {
            if let Schema::Map(inner) = schema {
                if !items.is_empty() {
                    encode_long(items.len() as i64, &mut *writer)?;
                    for (key, value) in items {
                        encode_bytes(key, writer)?;
                        encode_internal(value, &inner.types, names, writer)?;
                    }
                }
                writer
                    .write_all(&[0u8])
                    .map_err(|e| Details::WriteBytes(e).into())
            } else {
                error!("invalid schema type for Map: {schema:?}");
                Err(Details::EncodeValueAsSchemaError {
                    value_kind: ValueKind::Map,
                    supported_schema: vec![SchemaKind::Map],
                }
                .into())
            }
        }
        Value::Record(value_fields) => match schema {
            Schema::Record(RecordSchema {
                fields: schema_fields,
                ..
            }) => {
                let mut lookup = HashMap::with_capacity(value_fields.len());
                value_fields.iter().for_each(|(name, field)| {
                    lookup.insert(name.as_str(), field);
                });

                for schema_field in schema_fields.iter() {
                    let name = &schema_field.name;
                    let value_opt = lookup.get(name.as_str()).copied().or_else(|| {
                        schema_field
                            .aliases
                            .iter()
                            .find_map(|alias| lookup.get(alias.as_str()).copied())
                    });

                    match value_opt {
                        Some(value) => {
                            encode_internal(value, &schema_field.schema, names, writer)?;
                        }
                        None => match &schema_field.default {
                            Some(default) => {
                                let value =
                                    Value::from_json(default, &schema_field.schema, names)?;
                                encode_internal(&value, &schema_field.schema, names, writer)?;
                            }
                            None => return Err(Details::GetField(name.clone()).into()),
                        },
                    }
                }
                Ok(())
            }
            _ => Err(Details::EncodeValueAsSchemaError {
                value_kind: ValueKind::Record,
                supported_schema: vec![SchemaKind::Record, SchemaKind::Union],
            }
            .into()),
        },
    }
}

fn encode_union<W: Write>(
    value: &Value,
    schema: &Schema,
    names: &NamesRef,
    writer: &mut W,
) -> AvroResult<()> {
    if let Schema::Union(union) = schema {
        let (index, branch) = union
            .resolve_branch(value, names)
            .ok_or_else(|| Details::FindUnionVariant(ValueKind::from(value)))?;
        encode_long(index as i64, &mut *writer)?;
        encode_internal(value, branch, names, writer)
    } else {
        Err(Details::EncodeValueAsSchemaError {
            value_kind: ValueKind::from(value),
            supported_schema: vec![SchemaKind::Union],
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn encoded(value: &Value, schema: &Schema) -> Vec<u8> {
        let mut buffer = Vec::new();
        encode(value, schema, &mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_encode_array_prefixes_count() {
        let schema = Schema::parse_str(r#"{"type": "array", "items": "string"}"#).unwrap();
        let value = Value::Array(vec![
            Value::String("a".into()),
            Value::String("b".into()),
            Value::String("c".into()),
        ]);
        let buffer = encoded(&value, &schema);
        // zigzag of 3, then "a", "b", "c", then the terminator block
        assert_eq!(buffer[0], 0x06);
        assert_eq!(buffer.last(), Some(&0x00));
    }

    #[test]
    fn test_encode_record_fields_in_declared_order() {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "Person", "fields": [
                {"name": "first_name", "type": "string"},
                {"name": "age", "type": "int"}
            ]}"#,
        )
        .unwrap();
        let value = Value::Record(vec![
            ("first_name".to_string(), Value::String("Ada".to_string())),
            ("age".to_string(), Value::Int(37)),
        ]);
        assert_eq!(
            encoded(&value, &schema),
            vec![0x06, b'A', b'd', b'a', 0x4a]
        );
    }

    #[test]
    fn test_encode_union_branch_index() {
        let null_first = Schema::parse_str(r#"["null", "string"]"#).unwrap();
        let null_last = Schema::parse_str(r#"["string", "null"]"#).unwrap();

        let hi = Value::String("hi".into());
        assert_eq!(encoded(&hi, &null_first)[0], 0x02);
        assert_eq!(encoded(&hi, &null_last)[0], 0x00);

        assert_eq!(encoded(&Value::Null, &null_first), vec![0x00]);
        assert_eq!(encoded(&Value::Null, &null_last), vec![0x02]);
    }

    #[test]
    fn test_encode_missing_field_uses_default() {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "Rec", "fields": [
                {"name": "a", "type": "long", "default": 42},
                {"name": "b", "type": "string"}
            ]}"#,
        )
        .unwrap();
        let value = Value::Record(vec![("b".to_string(), Value::String("x".to_string()))]);
        let buffer = encoded(&value, &schema);
        assert_eq!(buffer, vec![0x54, 0x02, b'x']);
    }

    #[test]
    fn test_encode_missing_field_without_default_fails() {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "Rec", "fields": [
                {"name": "a", "type": "long"}
            ]}"#,
        )
        .unwrap();
        let value = Value::Record(vec![]);
        let mut buffer = Vec::new();
        match encode(&value, &schema, &mut buffer).map_err(crate::Error::into_details) {
            Err(Details::GetField(name)) => assert_eq!(name, "a"),
            other => panic!("Expected Details::GetField, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_fixed_requires_exact_size() {
        let schema =
            Schema::parse_str(r#"{"type": "fixed", "name": "md5", "size": 4}"#).unwrap();
        let mut buffer = Vec::new();
        assert!(encode(&Value::Fixed(4, vec![1, 2, 3, 4]), &schema, &mut buffer).is_ok());
        assert!(encode(&Value::Fixed(3, vec![1, 2, 3]), &schema, &mut buffer).is_err());
    }
}
