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

//! Logic for serde-compatible serialization: host-native values into the
//! generic [`Value`] model.

use crate::types::Value;
use crate::{AvroResult, Error};
use serde::ser::{self, Serialize};
use std::collections::HashMap;

/// Convert any [`Serialize`] value into a generic [`Value`].
///
/// Structs become records with fields bound by name, unit enum variants
/// become their symbol string, `None` becomes null. The result carries no
/// union branch indices; those are resolved against the schema on write.
pub fn to_value<T: Serialize>(value: T) -> AvroResult<Value> {
    value.serialize(ValueSerializer)
}

struct ValueSerializer;

pub struct SeqSerializer {
    items: Vec<Value>,
}

pub struct MapSerializer {
    entries: HashMap<String, Value>,
    next_key: Option<String>,
}

pub struct StructSerializer {
    fields: Vec<(String, Value)>,
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;
    type SerializeSeq = SeqSerializer;
    type SerializeTuple = SeqSerializer;
    type SerializeTupleStruct = SeqSerializer;
    type SerializeTupleVariant = SeqSerializer;
    type SerializeMap = MapSerializer;
    type SerializeStruct = StructSerializer;
    type SerializeStructVariant = StructSerializer;

    fn serialize_bool(self, v: bool) -> AvroResult<Value> {
        Ok(Value::Boolean(v))
    }

    fn serialize_i8(self, v: i8) -> AvroResult<Value> {
        self.serialize_i32(v as i32)
    }

    fn serialize_i16(self, v: i16) -> AvroResult<Value> {
        self.serialize_i32(v as i32)
    }

    fn serialize_i32(self, v: i32) -> AvroResult<Value> {
        Ok(Value::Int(v))
    }

    fn serialize_i64(self, v: i64) -> AvroResult<Value> {
        Ok(Value::Long(v))
    }

    fn serialize_u8(self, v: u8) -> AvroResult<Value> {
        self.serialize_i32(v as i32)
    }

    fn serialize_u16(self, v: u16) -> AvroResult<Value> {
        self.serialize_i32(v as i32)
    }

    fn serialize_u32(self, v: u32) -> AvroResult<Value> {
        self.serialize_i64(v as i64)
    }

    fn serialize_u64(self, v: u64) -> AvroResult<Value> {
        i64::try_from(v)
            .map(Value::Long)
            .map_err(|_| ser::Error::custom(format!("u64 value {v} does not fit into a long")))
    }

    fn serialize_f32(self, v: f32) -> AvroResult<Value> {
        Ok(Value::Float(v))
    }

    fn serialize_f64(self, v: f64) -> AvroResult<Value> {
        Ok(Value::Double(v))
    }

    fn serialize_char(self, v: char) -> AvroResult<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> AvroResult<Value> {
        Ok(Value::String(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> AvroResult<Value> {
        Ok(Value::Bytes(v.to_owned()))
    }

    fn serialize_none(self) -> AvroResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> AvroResult<Value> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> AvroResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> AvroResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> AvroResult<Value> {
        Ok(Value::String(variant.to_owned()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> AvroResult<Value> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> AvroResult<Value> {
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> AvroResult<Self::SerializeSeq> {
        Ok(SeqSerializer {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> AvroResult<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> AvroResult<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        len: usize,
    ) -> AvroResult<Self::SerializeTupleVariant> {
        self.serialize_seq(Some(len))
    }

    fn serialize_map(self, len: Option<usize>) -> AvroResult<Self::SerializeMap> {
        Ok(MapSerializer {
            entries: HashMap::with_capacity(len.unwrap_or(0)),
            next_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> AvroResult<Self::SerializeStruct> {
        Ok(StructSerializer {
            fields: Vec::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        len: usize,
    ) -> AvroResult<Self::SerializeStructVariant> {
        self.serialize_struct(_name, len)
    }
}

impl ser::SerializeSeq for SeqSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> AvroResult<()> {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> AvroResult<Value> {
        Ok(Value::Array(self.items))
    }
}

impl ser::SerializeTuple for SeqSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> AvroResult<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> AvroResult<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> AvroResult<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> AvroResult<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleVariant for SeqSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> AvroResult<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> AvroResult<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeMap for MapSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> AvroResult<()> {
        match key.serialize(ValueSerializer)? {
            Value::String(key) => {
                self.next_key = Some(key);
                Ok(())
            }
            other => Err(ser::Error::custom(format!(
                "map keys must serialize to a string, got {other:?}"
            ))),
        }
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> AvroResult<()> {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| <Error as ser::Error>::custom("map value serialized before its key"))?;
        self.entries.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> AvroResult<Value> {
        Ok(Value::Map(self.entries))
    }
}

impl ser::SerializeStruct for StructSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        name: &'static str,
        value: &T,
    ) -> AvroResult<()> {
        self.fields
            .push((name.to_owned(), value.serialize(ValueSerializer)?));
        Ok(())
    }

    fn end(self) -> AvroResult<Value> {
        Ok(Value::Record(self.fields))
    }
}

impl ser::SerializeStructVariant for StructSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        name: &'static str,
        value: &T,
    ) -> AvroResult<()> {
        ser::SerializeStruct::serialize_field(self, name, value)
    }

    fn end(self) -> AvroResult<Value> {
        ser::SerializeStruct::end(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Serialize;

    #[derive(Serialize)]
    enum Suit {
        Spades,
    }

    #[derive(Serialize)]
    struct TestRecord {
        a: i64,
        b: String,
        c: Option<i32>,
        d: Suit,
    }

    #[test]
    fn test_struct_to_record() -> AvroResult<()> {
        let value = to_value(TestRecord {
            a: 27,
            b: "foo".to_owned(),
            c: None,
            d: Suit::Spades,
        })?;
        assert_eq!(
            value,
            Value::Record(vec![
                ("a".to_owned(), Value::Long(27)),
                ("b".to_owned(), Value::String("foo".to_owned())),
                ("c".to_owned(), Value::Null),
                ("d".to_owned(), Value::String("Spades".to_owned())),
            ])
        );
        Ok(())
    }

    #[test]
    fn test_map_keys_must_be_strings() {
        let mut bad = HashMap::new();
        bad.insert(1, "x");
        assert!(to_value(bad).is_err());
    }
}
