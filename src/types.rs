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

//! Logic handling the intermediate representation of Avro values.

use crate::AvroResult;
use crate::error::Details;
use crate::schema::{NamesRef, RecordSchema, Schema};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use strum::EnumDiscriminants;

/// Represents any valid Avro value.
///
/// More information about Avro values can be found in the
/// [Avro Specification](https://avro.apache.org/docs/current/specification/)
#[derive(Clone, Debug, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(ValueKind))]
pub enum Value {
    /// A `null` Avro value.
    Null,
    /// A `boolean` Avro value.
    Boolean(bool),
    /// A `int` Avro value.
    Int(i32),
    /// A `long` Avro value.
    Long(i64),
    /// A `float` Avro value.
    Float(f32),
    /// A `double` Avro value.
    Double(f64),
    /// A `bytes` Avro value.
    Bytes(Vec<u8>),
    /// A `string` Avro value.
    String(String),
    /// A `fixed` Avro value.
    /// The size of the fixed value is represented as a `usize`.
    Fixed(usize, Vec<u8>),
    /// An `enum` Avro value: the position of the symbol in the schema's
    /// symbol list together with the symbol itself.
    Enum(u32, String),
    /// An `union` Avro value: the branch position in the schema's member
    /// list together with the branch value.
    Union(u32, Box<Value>),
    /// An `array` Avro value.
    Array(Vec<Value>),
    /// A `map` Avro value.
    Map(HashMap<String, Value>),
    /// A `record` Avro value.
    ///
    /// Fields are listed in the order of the record schema they are bound
    /// to.
    Record(Vec<(String, Value)>),
}

/// Utility interface to build `Value::Record` objects bound to a record
/// schema. Iteration order of the built value follows schema field order.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    /// List of fields the record has been given so far.
    pub fields: Vec<(String, Value)>,
    schema_lookup: &'a BTreeMap<String, usize>,
}

impl<'a> Record<'a> {
    /// Create a `Record` given a `Schema`.
    ///
    /// If the `Schema` is not a record variant, `None` will be returned.
    pub fn new(schema: &Schema) -> Option<Record<'_>> {
        match *schema {
            Schema::Record(RecordSchema {
                fields: ref schema_fields,
                lookup: ref schema_lookup,
                ..
            }) => Some(Record {
                fields: Vec::with_capacity(schema_fields.len()),
                schema_lookup,
            }),
            _ => None,
        }
    }

    /// Put a value for a given field name.
    ///
    /// **NOTE** Only ensures that the field name is present in the schema
    /// the record was created with; the value is validated on write.
    pub fn put<V>(&mut self, field: &str, value: V)
    where
        V: Into<Value>,
    {
        if self.schema_lookup.contains_key(field) {
            self.fields.push((field.to_owned(), value.into()));
        }
    }
}

impl From<Record<'_>> for Value {
    fn from(record: Record<'_>) -> Self {
        Value::Record(record.fields)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_owned())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            None => Self::Null,
            Some(inner) => inner.into(),
        }
    }
}

impl<V> From<HashMap<String, V>> for Value
where
    V: Into<Value>,
{
    fn from(value: HashMap<String, V>) -> Self {
        Self::Map(value.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<V> From<Vec<V>> for Value
where
    V: Into<Value>,
{
    fn from(value: Vec<V>) -> Self {
        Self::Array(value.into_iter().map(Into::into).collect())
    }
}

impl Value {
    /// For an enum value, the symbol it carries.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Value::Enum(_, symbol) => Some(symbol.as_str()),
            _ => None,
        }
    }

    /// Check whether this value is structurally acceptable under `schema`.
    ///
    /// Numeric variants are only accepted where their wire encoding matches
    /// the schema (an `Int` may stand in for a `long`).
    pub fn validate(&self, schema: &Schema, names: &NamesRef) -> bool {
        match (self, schema) {
            (_, Schema::Ref { name }) => match names.get(name) {
                Some(target) => self.validate(target, names),
                None => false,
            },
            (Value::Null, Schema::Null(_)) => true,
            (Value::Boolean(_), Schema::Boolean(_)) => true,
            (Value::Int(_), Schema::Int(_)) => true,
            // same zigzag encoding, a narrower value is fine
            (Value::Int(_) | Value::Long(_), Schema::Long(_)) => true,
            (Value::Float(_), Schema::Float(_)) => true,
            (Value::Double(_), Schema::Double(_)) => true,
            (Value::Bytes(_), Schema::Bytes(_)) => true,
            (Value::Bytes(bytes), Schema::Fixed(fixed)) => bytes.len() == fixed.size,
            (Value::String(_), Schema::String(_)) => true,
            (Value::String(symbol), Schema::Enum(inner)) => inner.symbols.contains(symbol),
            (Value::Fixed(size, _), Schema::Fixed(fixed)) => *size == fixed.size,
            (Value::Enum(_, symbol), Schema::Enum(inner)) => inner.symbols.contains(symbol),
            (Value::Union(index, value), Schema::Union(union)) => union
                .variants()
                .get(*index as usize)
                .is_some_and(|variant| value.validate(variant, names)),
            (_, Schema::Union(union)) => union
                .variants()
                .iter()
                .any(|variant| self.validate(variant, names)),
            (Value::Array(items), Schema::Array(inner)) => {
                items.iter().all(|item| item.validate(&inner.items, names))
            }
            (Value::Map(entries), Schema::Map(inner)) => entries
                .values()
                .all(|value| value.validate(&inner.types, names)),
            (Value::Record(fields), Schema::Record(record)) => {
                fields
                    .iter()
                    .all(|(name, _)| record.lookup.contains_key(name))
                    && record.fields.iter().all(|schema_field| {
                        match fields.iter().find(|(name, _)| *name == schema_field.name) {
                            Some((_, value)) => value.validate(&schema_field.schema, names),
                            None => schema_field.default.is_some(),
                        }
                    })
            }
            _ => false,
        }
    }

    /// Materialize a JSON datum into a `Value` guided by `schema`.
    ///
    /// This is the dynamic entry point behind [`Schema::generic`]: record
    /// fields absent from the JSON object take the field default, unions
    /// select the first matching branch, enum symbols are resolved to their
    /// position.
    pub(crate) fn from_json(
        json: &JsonValue,
        schema: &Schema,
        names: &NamesRef,
    ) -> AvroResult<Value> {
        fn mismatch(json: &JsonValue, schema: &Schema, path: &str) -> crate::Error {
            Details::GenericValue {
                value: json.clone(),
                schema: schema.into(),
                path: path.to_string(),
            }
            .into()
        }

        fn from_json_at(
            json: &JsonValue,
            schema: &Schema,
            names: &NamesRef,
            path: &str,
        ) -> AvroResult<Value> {
            match schema {
                Schema::Null(_) => match json {
                    JsonValue::Null => Ok(Value::Null),
                    _ => Err(mismatch(json, schema, path)),
                },
                Schema::Boolean(_) => json
                    .as_bool()
                    .map(Value::Boolean)
                    .ok_or_else(|| mismatch(json, schema, path)),
                Schema::Int(_) => json
                    .as_i64()
                    .and_then(|i| i32::try_from(i).ok())
                    .map(Value::Int)
                    .ok_or_else(|| mismatch(json, schema, path)),
                Schema::Long(_) => json
                    .as_i64()
                    .map(Value::Long)
                    .ok_or_else(|| mismatch(json, schema, path)),
                Schema::Float(_) => json
                    .as_f64()
                    .map(|x| Value::Float(x as f32))
                    .ok_or_else(|| mismatch(json, schema, path)),
                Schema::Double(_) => json
                    .as_f64()
                    .map(Value::Double)
                    .ok_or_else(|| mismatch(json, schema, path)),
                Schema::Bytes(_) => json
                    .as_str()
                    .map(|s| Value::Bytes(json_string_to_bytes(s)))
                    .ok_or_else(|| mismatch(json, schema, path)),
                Schema::String(_) => json
                    .as_str()
                    .map(|s| Value::String(s.to_string()))
                    .ok_or_else(|| mismatch(json, schema, path)),
                Schema::Fixed(fixed) => {
                    let bytes = json
                        .as_str()
                        .map(json_string_to_bytes)
                        .ok_or_else(|| mismatch(json, schema, path))?;
                    if bytes.len() != fixed.size {
                        return Err(mismatch(json, schema, path));
                    }
                    Ok(Value::Fixed(fixed.size, bytes))
                }
                Schema::Enum(inner) => {
                    let symbol = json.as_str().ok_or_else(|| mismatch(json, schema, path))?;
                    match inner.symbols.iter().position(|s| s == symbol) {
                        Some(index) => Ok(Value::Enum(index as u32, symbol.to_string())),
                        None => Err(mismatch(json, schema, path)),
                    }
                }
                Schema::Array(inner) => {
                    let items = json
                        .as_array()
                        .ok_or_else(|| mismatch(json, schema, path))?;
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| {
                            from_json_at(item, &inner.items, names, &format!("{path}[{i}]"))
                        })
                        .collect::<Result<_, _>>()
                        .map(Value::Array)
                }
                Schema::Map(inner) => {
                    let entries = json
                        .as_object()
                        .ok_or_else(|| mismatch(json, schema, path))?;
                    entries
                        .iter()
                        .map(|(key, value)| {
                            from_json_at(value, &inner.types, names, &format!("{path}/{key}"))
                                .map(|v| (key.clone(), v))
                        })
                        .collect::<Result<_, _>>()
                        .map(Value::Map)
                }
                Schema::Union(union) => {
                    for (index, variant) in union.variants().iter().enumerate() {
                        if let Ok(value) = from_json_at(json, variant, names, path) {
                            return Ok(Value::Union(index as u32, Box::new(value)));
                        }
                    }
                    Err(mismatch(json, schema, path))
                }
                Schema::Record(record) => {
                    let object = json
                        .as_object()
                        .ok_or_else(|| mismatch(json, schema, path))?;
                    let mut fields = Vec::with_capacity(record.fields.len());
                    for field in &record.fields {
                        let field_path = format!("{path}/{}", field.name);
                        let value = match object.get(&field.name) {
                            Some(value) => from_json_at(value, &field.schema, names, &field_path)?,
                            None => match &field.default {
                                Some(default) => {
                                    from_json_at(default, &field.schema, names, &field_path)?
                                }
                                None => return Err(Details::GetField(field.name.clone()).into()),
                            },
                        };
                        fields.push((field.name.clone(), value));
                    }
                    Ok(Value::Record(fields))
                }
                Schema::Ref { name } => match names.get(name) {
                    Some(target) => from_json_at(json, target, names, path),
                    None => Err(Details::SchemaResolutionError(name.clone()).into()),
                },
            }
        }

        from_json_at(json, schema, names, "")
    }
}

/// Avro JSON encodes binary data as a string of code points 0-255.
fn json_string_to_bytes(s: &str) -> Vec<u8> {
    s.chars().map(|c| c as u8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AvroResult;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_record_put_ignores_unknown_fields() -> AvroResult<()> {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "Person", "fields": [
                {"name": "first_name", "type": "string"},
                {"name": "age", "type": "int"}
            ]}"#,
        )?;
        let mut record = Record::new(&schema).unwrap();
        record.put("first_name", "Ada");
        record.put("no_such_field", 1);
        record.put("age", 37);

        assert_eq!(
            Value::from(record),
            Value::Record(vec![
                ("first_name".to_string(), Value::String("Ada".to_string())),
                ("age".to_string(), Value::Int(37)),
            ])
        );
        Ok(())
    }

    #[test]
    fn test_generic_fills_defaults() -> AvroResult<()> {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "Rec", "fields": [
                {"name": "select", "type": {"type": "enum", "name": "ABC", "symbols": ["A", "B", "C"]}, "default": "B"},
                {"name": "option", "type": ["null", "ABC"], "default": null}
            ]}"#,
        )?;
        let generic = schema.generic(json!({"option": "C"}))?;
        assert_eq!(
            generic,
            Value::Record(vec![
                ("select".to_string(), Value::Enum(1, "B".to_string())),
                (
                    "option".to_string(),
                    Value::Union(1, Box::new(Value::Enum(2, "C".to_string()))),
                ),
            ])
        );
        Ok(())
    }

    #[test]
    fn test_generic_rejects_missing_field_without_default() {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "Rec", "fields": [
                {"name": "must", "type": "string"}
            ]}"#,
        )
        .unwrap();
        assert!(schema.generic(json!({})).is_err());
    }

    #[test]
    fn test_validate_union_branches() -> AvroResult<()> {
        let schema = Schema::parse_str(r#"["null", "string"]"#)?;
        let names = NamesRef::new();
        assert!(Value::Null.validate(&schema, &names));
        assert!(Value::String("ok".into()).validate(&schema, &names));
        assert!(!Value::Int(3).validate(&schema, &names));
        assert!(Value::Union(1, Box::new(Value::String("ok".into()))).validate(&schema, &names));
        assert!(!Value::Union(0, Box::new(Value::String("ok".into()))).validate(&schema, &names));
        Ok(())
    }
}
