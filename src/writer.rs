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

//! Logic for serializing Avro values into binary-encoded bytes.

use crate::{
    AvroResult,
    encode::{encode_bytes, encode_internal, encode_int, encode_long},
    error::Details,
    schema::{NamesRef, Schema},
    types::Value,
};
use std::io::Write;

/// A sink for the Avro binary encoding, owning the byte stream it writes to.
///
/// The typed operations write the primitive encodings directly; schema
/// directed writing of whole datums goes through [`DatumWriter`].
pub struct BinaryEncoder<W: Write> {
    writer: W,
}

impl<W: Write> BinaryEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub(crate) fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// The null encoding is empty.
    pub fn write_null(&mut self) -> AvroResult<()> {
        Ok(())
    }

    pub fn write_boolean(&mut self, b: bool) -> AvroResult<()> {
        self.writer
            .write_all(&[u8::from(b)])
            .map_err(|e| Details::WriteBytes(e).into())
    }

    pub fn write_int(&mut self, i: i32) -> AvroResult<()> {
        encode_int(i, &mut self.writer)
    }

    pub fn write_long(&mut self, i: i64) -> AvroResult<()> {
        encode_long(i, &mut self.writer)
    }

    pub fn write_float(&mut self, x: f32) -> AvroResult<()> {
        self.writer
            .write_all(&x.to_le_bytes())
            .map_err(|e| Details::WriteBytes(e).into())
    }

    pub fn write_double(&mut self, x: f64) -> AvroResult<()> {
        self.writer
            .write_all(&x.to_le_bytes())
            .map_err(|e| Details::WriteBytes(e).into())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> AvroResult<()> {
        encode_bytes(bytes, &mut self.writer)
    }

    pub fn write_str(&mut self, s: &str) -> AvroResult<()> {
        encode_bytes(s, &mut self.writer)
    }
}

/// Writes whole datums under a given schema.
///
/// The writer accepts any [`Value`] shape the schema can describe; record
/// fields are bound by name (case-sensitive), and fields without a value
/// fall back to the field default.
pub struct DatumWriter<'s> {
    schema: &'s Schema,
    names: NamesRef<'s>,
}

impl<'s> DatumWriter<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        let mut names = NamesRef::new();
        schema.collect_named_schemas(&mut names);
        Self { schema, names }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Write one datum to the encoder.
    pub fn write<W: Write>(
        &self,
        value: &Value,
        encoder: &mut BinaryEncoder<W>,
    ) -> AvroResult<()> {
        encode_internal(value, self.schema, &self.names, encoder.writer_mut())
    }
}

/// Encode one datum under `schema` into a fresh byte buffer.
pub fn to_avro_datum<T: Into<Value>>(schema: &Schema, value: T) -> AvroResult<Vec<u8>> {
    let mut encoder = BinaryEncoder::new(Vec::new());
    DatumWriter::new(schema).write(&value.into(), &mut encoder)?;
    Ok(encoder.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_typed_primitive_writes() -> AvroResult<()> {
        let mut encoder = BinaryEncoder::new(Vec::new());
        encoder.write_null()?;
        encoder.write_boolean(true)?;
        encoder.write_long(1)?;
        encoder.write_str("ab")?;
        assert_eq!(encoder.into_inner(), vec![0x01, 0x02, 0x04, b'a', b'b']);
        Ok(())
    }

    #[test]
    fn test_datum_writer_with_record_builder() -> AvroResult<()> {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "Person", "fields": [
                {"name": "first_name", "type": "string"},
                {"name": "age", "type": "int"}
            ]}"#,
        )?;
        let mut record = Record::new(&schema).unwrap();
        record.put("first_name", "Ada");
        record.put("age", 37);

        let bytes = to_avro_datum(&schema, record)?;
        assert_eq!(bytes, vec![0x06, b'A', b'd', b'a', 0x4a]);
        Ok(())
    }
}
