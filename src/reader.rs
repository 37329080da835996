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

//! Logic handling reading from Avro format at user level.

use crate::{
    AvroResult,
    decode::decode_internal,
    error::Details,
    schema::{NamesRef, Schema},
    types::Value,
    util::{zag_i32, zag_i64},
};
use std::io::Read;

/// A source of the Avro binary encoding, owning the byte stream it reads
/// from.
///
/// A failed read leaves the stream position undefined; callers must discard
/// the stream.
pub struct BinaryDecoder<R: Read> {
    reader: R,
}

impl<R: Read> BinaryDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    pub(crate) fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn read_boolean(&mut self) -> AvroResult<bool> {
        let mut buf = [0u8; 1];
        self.reader
            .read_exact(&mut buf)
            .map_err(Details::ReadBoolean)?;
        match buf[0] {
            0u8 => Ok(false),
            1u8 => Ok(true),
            other => Err(Details::BoolValue(other).into()),
        }
    }

    pub fn read_int(&mut self) -> AvroResult<i32> {
        zag_i32(&mut self.reader)
    }

    pub fn read_long(&mut self) -> AvroResult<i64> {
        zag_i64(&mut self.reader)
    }

    pub fn read_float(&mut self) -> AvroResult<f32> {
        let mut buf = [0u8; 4];
        self.reader
            .read_exact(&mut buf)
            .map_err(Details::ReadFloat)?;
        Ok(f32::from_le_bytes(buf))
    }

    pub fn read_double(&mut self) -> AvroResult<f64> {
        let mut buf = [0u8; 8];
        self.reader
            .read_exact(&mut buf)
            .map_err(Details::ReadDouble)?;
        Ok(f64::from_le_bytes(buf))
    }
}

/// Reads whole datums under a given schema, building fresh generic values
/// mirroring the schema.
///
/// For typed destinations deserialize the produced value with
/// [`from_value`](crate::from_value).
pub struct DatumReader<'s> {
    schema: &'s Schema,
    names: NamesRef<'s>,
}

impl<'s> DatumReader<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        let mut names = NamesRef::new();
        schema.collect_named_schemas(&mut names);
        Self { schema, names }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Read one datum from the decoder.
    pub fn read<R: Read>(&self, decoder: &mut BinaryDecoder<R>) -> AvroResult<Value> {
        decode_internal(self.schema, &self.names, decoder.reader_mut())
    }
}

/// Decode one datum written under `schema` from `reader`.
pub fn from_avro_datum<R: Read>(schema: &Schema, reader: &mut R) -> AvroResult<Value> {
    let mut decoder = BinaryDecoder::new(reader);
    DatumReader::new(schema).read(&mut decoder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::to_avro_datum;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_typed_primitive_reads() -> AvroResult<()> {
        let bytes: &[u8] = &[0x01, 0x4a, 0x00, 0x00, 0x80, 0x3f];
        let mut decoder = BinaryDecoder::new(bytes);
        assert!(decoder.read_boolean()?);
        assert_eq!(decoder.read_int()?, 37);
        assert_eq!(decoder.read_float()?, 1.0);
        Ok(())
    }

    #[test]
    fn test_datum_roundtrip() -> AvroResult<()> {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "Person", "fields": [
                {"name": "first_name", "type": "string"},
                {"name": "age", "type": "int"}
            ]}"#,
        )?;
        let value = Value::Record(vec![
            ("first_name".to_string(), Value::String("Ada".to_string())),
            ("age".to_string(), Value::Int(37)),
        ]);
        let bytes = to_avro_datum(&schema, value.clone())?;
        assert_eq!(from_avro_datum(&schema, &mut &bytes[..])?, value);
        Ok(())
    }
}
