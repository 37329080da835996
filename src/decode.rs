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
    schema::{NamesRef, Schema},
    types::Value,
    util::{safe_len, zag_i32, zag_i64},
};
use std::collections::HashMap;
use std::io::Read;

/// Decode a `Value` from Avro binary format given its `Schema`.
pub fn decode<R: Read>(schema: &Schema, reader: &mut R) -> AvroResult<Value> {
    let mut names = NamesRef::new();
    schema.collect_named_schemas(&mut names);
    decode_internal(schema, &names, reader)
}

pub(crate) fn decode_long<R: Read>(reader: &mut R) -> AvroResult<Value> {
    zag_i64(reader).map(Value::Long)
}

pub(crate) fn decode_int<R: Read>(reader: &mut R) -> AvroResult<Value> {
    zag_i32(reader).map(Value::Int)
}

pub(crate) fn decode_len<R: Read>(reader: &mut R) -> AvroResult<usize> {
    let len = zag_i64(reader)?;
    safe_len(usize::try_from(len).map_err(|_| Details::BlockCount(len))?)
}

/// Decode the length of an array or map block.
///
/// A negative block count means a byte-length for the block follows, making
/// the block skippable without decoding its items.
pub(crate) fn decode_seq_len<R: Read>(reader: &mut R) -> AvroResult<usize> {
    let raw = zag_i64(reader)?;
    let result = if raw < 0 {
        let _block_bytes = zag_i64(reader)?;
        raw.checked_abs().ok_or(Details::BlockCount(raw))?
    } else {
        raw
    };
    safe_len(usize::try_from(result).map_err(|_| Details::BlockCount(raw))?)
}

pub(crate) fn decode_internal<R: Read>(
    schema: &Schema,
    names: &NamesRef,
    reader: &mut R,
) -> AvroResult<Value> {
    match schema {
        Schema::Ref { name } => {
            let resolved = names
                .get(name)
                .ok_or_else(|| Details::SchemaResolutionError(name.clone()))?;
            decode_internal(resolved, names, reader)
        }
        Schema::Null(_) => Ok(Value::Null),
        Schema::Boolean(_) => {
            let mut buf = [0u8; 1];
            match reader.read_exact(&mut buf[..]) {
                Ok(()) => match buf[0] {
                    0u8 => Ok(Value::Boolean(false)),
                    1u8 => Ok(Value::Boolean(true)),
                    _ => Err(Details::BoolValue(buf[0]).into()),
                },
                Err(io_err) => Err(Details::ReadBoolean(io_err).into()),
            }
        }
        Schema::Int(_) => decode_int(reader),
        Schema::Long(_) => decode_long(reader),
        Schema::Float(_) => {
            let mut buf = [0u8; std::mem::size_of::<f32>()];
            reader
                .read_exact(&mut buf[..])
                .map_err(Details::ReadFloat)?;
            Ok(Value::Float(f32::from_le_bytes(buf)))
        }
        Schema::Double(_) => {
            let mut buf = [0u8; std::mem::size_of::<f64>()];
            reader
                .read_exact(&mut buf[..])
                .map_err(Details::ReadDouble)?;
            Ok(Value::Double(f64::from_le_bytes(buf)))
        }
        Schema::Bytes(_) => {
            let len = decode_len(reader)?;
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf).map_err(Details::ReadBytes)?;
            Ok(Value::Bytes(buf))
        }
        Schema::String(_) => {
            let len = decode_len(reader)?;
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf).map_err(Details::ReadString)?;
            String::from_utf8(buf)
                .map(Value::String)
                .map_err(|e| Details::ConvertToUtf8(e).into())
        }
        Schema::Fixed(fixed) => {
            let mut buf = vec![0u8; fixed.size];
            reader
                .read_exact(&mut buf)
                .map_err(|e| Details::ReadFixed(e, fixed.size))?;
            Ok(Value::Fixed(fixed.size, buf))
        }
        Schema::Array(inner) => {
            let mut items = Vec::new();

            loop {
                let len = decode_seq_len(reader)?;
                if len == 0 {
                    break;
                }

                items.reserve(len);
                for _ in 0..len {
                    items.push(decode_internal(&inner.items, names, reader)?);
                }
            }

            Ok(Value::Array(items))
        }
        Schema::Map(inner) => {
            let mut items = HashMap::new();

            loop {
                let len = decode_seq_len(reader)?;
                if len == 0 {
                    break;
                }

                items.reserve(len);
                for _ in 0..len {
                    match decode_internal(&Schema::string(), names, reader)? {
                        Value::String(key) => {
                            let value = decode_internal(&inner.types, names, reader)?;
                            items.insert(key, value);
                        }
                        value => {
                            unreachable!("decoding a string produced {value:?}")
                        }
                    }
                }
            }

            Ok(Value::Map(items))
        }
        Schema::Union(union) => {
            let index = zag_i64(reader)?;
            let variants = union.variants();
            let variant = variants
                .get(usize::try_from(index).map_err(|_| Details::GetUnionVariant {
                    index,
                    num_variants: variants.len(),
                })?)
                .ok_or(Details::GetUnionVariant {
                    index,
                    num_variants: variants.len(),
                })?;
            let value = decode_internal(variant, names, reader)?;
            Ok(Value::Union(index as u32, Box::new(value)))
        }
        Schema::Record(record) => {
            // Avro's pattern of the form of a linked list cannot be handled
            // by simple recursion, a record field may refer to the record
            // itself; the names table carries every definition seen so far.
            let mut fields = Vec::with_capacity(record.fields.len());
            for field in &record.fields {
                let value = decode_internal(&field.schema, names, reader)?;
                fields.push((field.name.clone(), value));
            }
            Ok(Value::Record(fields))
        }
        Schema::Enum(inner) => {
            let index = zag_i32(reader)? as i64;
            match usize::try_from(index)
                .ok()
                .and_then(|i| inner.symbols.get(i))
            {
                Some(symbol) => Ok(Value::Enum(index as u32, symbol.clone())),
                None => Err(Details::GetEnumValue {
                    index,
                    nsymbols: inner.symbols.len(),
                }
                .into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode;
    use pretty_assertions::assert_eq;

    fn roundtrip(value: &Value, schema: &Schema) -> Value {
        let mut buffer = Vec::new();
        encode(value, schema, &mut buffer).unwrap();
        decode(schema, &mut &buffer[..]).unwrap()
    }

    #[test]
    fn test_roundtrip_primitives() {
        for (raw, value) in [
            ("\"null\"", Value::Null),
            ("\"boolean\"", Value::Boolean(true)),
            ("\"int\"", Value::Int(-42)),
            ("\"long\"", Value::Long(1_234_567_890_123)),
            ("\"float\"", Value::Float(3.25)),
            ("\"double\"", Value::Double(-1.5e300)),
            ("\"bytes\"", Value::Bytes(vec![0, 1, 2, 255])),
            ("\"string\"", Value::String("héllo".to_string())),
        ] {
            let schema = Schema::parse_str(raw).unwrap();
            assert_eq!(roundtrip(&value, &schema), value, "schema: {raw}");
        }
    }

    #[test]
    fn test_roundtrip_array() {
        let schema = Schema::parse_str(r#"{"type": "array", "items": "string"}"#).unwrap();
        let value = Value::Array(vec![
            Value::String("a".into()),
            Value::String("b".into()),
            Value::String("c".into()),
        ]);
        assert_eq!(roundtrip(&value, &schema), value);
    }

    #[test]
    fn test_roundtrip_map_and_enum() {
        let schema = Schema::parse_str(
            r#"{"type": "map", "values": {"type": "enum", "name": "ABC", "symbols": ["A", "B", "C"]}}"#,
        )
        .unwrap();
        let value = Value::Map(
            [
                ("first".to_string(), Value::Enum(0, "A".to_string())),
                ("second".to_string(), Value::Enum(2, "C".to_string())),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(roundtrip(&value, &schema), value);
    }

    #[test]
    fn test_roundtrip_recursive_record() {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "LongList", "fields": [
                {"name": "value", "type": "long"},
                {"name": "next", "type": ["null", "LongList"]}
            ]}"#,
        )
        .unwrap();
        let value = Value::Record(vec![
            ("value".to_string(), Value::Long(1)),
            (
                "next".to_string(),
                Value::Union(
                    1,
                    Box::new(Value::Record(vec![
                        ("value".to_string(), Value::Long(2)),
                        ("next".to_string(), Value::Union(0, Box::new(Value::Null))),
                    ])),
                ),
            ),
        ]);
        assert_eq!(roundtrip(&value, &schema), value);
    }

    #[test]
    fn test_negative_block_count_with_byte_size() {
        let schema = Schema::parse_str(r#"{"type": "array", "items": "int"}"#).unwrap();
        // one block of 2 items in negative-count form: count -2, byte length
        // 2, items 1 and 2, then the terminator
        let buffer: &[u8] = &[0x03, 0x04, 0x02, 0x04, 0x00];
        let value = decode(&schema, &mut &*buffer).unwrap();
        assert_eq!(value, Value::Array(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn test_illformed_length_is_rejected() {
        let schema = Schema::parse_str("\"bytes\"").unwrap();
        // Would allocate 18446744073709551605 bytes
        let illformed: &[u8] = &[0x3e, 0x15, 0xff, 0x1f, 0x15, 0xff];
        assert!(decode(&schema, &mut &*illformed).is_err());
    }

    #[test]
    fn test_truncated_input_is_rejected() {
        let schema = Schema::parse_str("\"string\"").unwrap();
        // length prefix of 10 but only 2 bytes follow
        let truncated: &[u8] = &[0x14, b'h', b'i'];
        assert!(decode(&schema, &mut &*truncated).is_err());
    }

    #[test]
    fn test_invalid_boolean_byte() {
        let schema = Schema::parse_str("\"boolean\"").unwrap();
        let bad: &[u8] = &[0x02];
        match decode(&schema, &mut &*bad).map_err(crate::Error::into_details) {
            Err(Details::BoolValue(2)) => {}
            other => panic!("Expected Details::BoolValue, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_enum_index() {
        let schema = Schema::parse_str(
            r#"{"type": "enum", "name": "ABC", "symbols": ["A", "B", "C"]}"#,
        )
        .unwrap();
        let bad: &[u8] = &[0x06]; // index 3
        match decode(&schema, &mut &*bad).map_err(crate::Error::into_details) {
            Err(Details::GetEnumValue { index: 3, nsymbols: 3 }) => {}
            other => panic!("Expected Details::GetEnumValue, got {other:?}"),
        }
    }
}
