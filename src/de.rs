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

//! Logic for serde-compatible deserialization: generic [`Value`]s into
//! caller-supplied host structures.

use crate::types::Value;
use crate::{AvroResult, Error};
use serde::de::value::{MapDeserializer, SeqDeserializer};
use serde::de::{self, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;

/// Populate a typed destination from a generic [`Value`].
///
/// Field association is by name; record fields the destination does not
/// declare are discarded, and a union null materializes as `None` for
/// optional destinations. Enum values deserialize from their symbol.
pub fn from_value<'de, T: de::Deserialize<'de>>(value: &'de Value) -> AvroResult<T> {
    T::deserialize(ValueDeserializer { input: value })
}

#[derive(Clone, Copy)]
pub struct ValueDeserializer<'de> {
    input: &'de Value,
}

impl<'de> IntoDeserializer<'de, Error> for &'de Value {
    type Deserializer = ValueDeserializer<'de>;

    fn into_deserializer(self) -> Self::Deserializer {
        ValueDeserializer { input: self }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> AvroResult<V::Value> {
        match self.input {
            Value::Null => visitor.visit_unit(),
            Value::Boolean(b) => visitor.visit_bool(*b),
            Value::Int(i) => visitor.visit_i32(*i),
            Value::Long(i) => visitor.visit_i64(*i),
            Value::Float(x) => visitor.visit_f32(*x),
            Value::Double(x) => visitor.visit_f64(*x),
            Value::Bytes(bytes) => visitor.visit_borrowed_bytes(bytes),
            Value::String(s) => visitor.visit_borrowed_str(s),
            Value::Fixed(_, bytes) => visitor.visit_borrowed_bytes(bytes),
            Value::Enum(_, symbol) => visitor.visit_borrowed_str(symbol),
            Value::Union(_, inner) => ValueDeserializer { input: inner }.deserialize_any(visitor),
            Value::Array(items) => {
                visitor.visit_seq(SeqDeserializer::new(items.iter()))
            }
            Value::Map(entries) => visitor.visit_map(MapDeserializer::new(
                entries.iter().map(|(k, v)| (k.as_str(), v)),
            )),
            Value::Record(fields) => visitor.visit_map(MapDeserializer::new(
                fields.iter().map(|(k, v)| (k.as_str(), v)),
            )),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> AvroResult<V::Value> {
        match self.input {
            Value::Null => visitor.visit_none(),
            Value::Union(_, inner) => match inner.as_ref() {
                Value::Null => visitor.visit_none(),
                inner => visitor.visit_some(ValueDeserializer { input: inner }),
            },
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> AvroResult<V::Value> {
        match self.input {
            Value::Enum(_, symbol) => visitor.visit_enum(symbol.as_str().into_deserializer()),
            Value::String(symbol) => visitor.visit_enum(symbol.as_str().into_deserializer()),
            Value::Union(_, inner) => ValueDeserializer { input: inner }
                .deserialize_enum(_name, _variants, visitor),
            other => Err(de::Error::custom(format!(
                "expected an enum symbol, got {other:?}"
            ))),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> AvroResult<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> AvroResult<V::Value> {
        match self.input {
            Value::Bytes(bytes) | Value::Fixed(_, bytes) => visitor.visit_borrowed_bytes(bytes),
            Value::String(s) => visitor.visit_bytes(s.as_bytes()),
            Value::Union(_, inner) => {
                ValueDeserializer { input: inner }.deserialize_bytes(visitor)
            }
            other => Err(de::Error::custom(format!(
                "expected bytes, got {other:?}"
            ))),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> AvroResult<V::Value> {
        self.deserialize_bytes(visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        unit unit_struct seq tuple tuple_struct map struct identifier
        ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Deserialize, PartialEq)]
    enum Suit {
        Spades,
        Clubs,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestRecord {
        a: i64,
        b: String,
        c: Option<String>,
        d: Suit,
        dict: HashMap<String, Vec<String>>,
    }

    #[test]
    fn test_record_to_struct() -> AvroResult<()> {
        let value = Value::Record(vec![
            ("a".to_owned(), Value::Long(27)),
            ("b".to_owned(), Value::String("foo".to_owned())),
            ("c".to_owned(), Value::Union(0, Box::new(Value::Null))),
            ("d".to_owned(), Value::Enum(1, "Clubs".to_owned())),
            (
                "dict".to_owned(),
                Value::Map(
                    [(
                        "k".to_owned(),
                        Value::Array(vec![Value::String("v".to_owned())]),
                    )]
                    .into_iter()
                    .collect(),
                ),
            ),
            // not declared by the destination, discarded
            ("extra".to_owned(), Value::Int(1)),
        ]);
        let datum: TestRecord = from_value(&value)?;
        assert_eq!(datum.a, 27);
        assert_eq!(datum.b, "foo");
        assert_eq!(datum.c, None);
        assert_eq!(datum.d, Suit::Clubs);
        assert_eq!(datum.dict["k"], vec!["v".to_owned()]);
        Ok(())
    }

    #[test]
    fn test_union_some_to_option() -> AvroResult<()> {
        let value = Value::Union(1, Box::new(Value::String("hi".to_owned())));
        let datum: Option<String> = from_value(&value)?;
        assert_eq!(datum, Some("hi".to_owned()));
        Ok(())
    }
}
