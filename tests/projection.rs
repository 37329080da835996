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

use avro_datum::types::Value;
use avro_datum::{
    AvroResult, BinaryDecoder, BinaryEncoder, DatumProjector, DatumReader, DatumWriter, Schema,
    from_value, to_value,
};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
enum Something {
    A,
    B,
    C,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Datum {
    dict: HashMap<String, Vec<String>>,
    select: Something,
    option: Option<Something>,
    option2: Option<HashMap<String, u64>>,
    option3: Option<Something>,
}

fn convert_schema() -> AvroResult<Schema> {
    Schema::parse_str(
        r#"{
            "type": "record",
            "name": "Rec",
            "fields": [
                {
                    "name": "dict",
                    "type": {"type": "map", "values": {"type": "array", "items": "string"}}
                }, {
                    "name": "select",
                    "type": {"type": "enum", "name": "something", "symbols": ["A", "B", "C"]},
                    "default": "B"
                }, {
                    "name": "option",
                    "type": ["null", {"type": "enum", "name": "something", "symbols": ["A", "B", "C"]}],
                    "default": null
                }, {
                    "name": "option2",
                    "type": ["null", {"type": "map", "values": "long"}],
                    "default": null
                }, {
                    "name": "option3",
                    "type": ["null", {"type": "enum", "name": "something", "symbols": ["A", "B", "C"]}],
                    "default": "A"
                }
            ]
        }"#,
    )
}

fn expected_generic() -> Value {
    Value::Record(vec![
        (
            "dict".to_string(),
            Value::Map(
                [
                    (
                        "A1".to_string(),
                        Value::Array(vec![
                            Value::String("abc".to_string()),
                            Value::String("def".to_string()),
                        ]),
                    ),
                    (
                        "G1".to_string(),
                        Value::Array(vec![
                            Value::String("ghi".to_string()),
                            Value::String("jkl".to_string()),
                        ]),
                    ),
                ]
                .into_iter()
                .collect(),
            ),
        ),
        ("select".to_string(), Value::Enum(1, "B".to_string())),
        (
            "option".to_string(),
            Value::Union(1, Box::new(Value::Enum(2, "C".to_string()))),
        ),
        ("option2".to_string(), Value::Union(0, Box::new(Value::Null))),
        (
            "option3".to_string(),
            Value::Union(1, Box::new(Value::Enum(0, "A".to_string()))),
        ),
    ])
}

/// The JSON datum only supplies `dict` and `option`; everything else comes
/// from field defaults.
#[test]
fn test_generic_materialization_fills_defaults() -> AvroResult<()> {
    let schema = convert_schema()?;
    let generic = schema.generic(json!({
        "dict": {
            "A1": ["abc", "def"],
            "G1": ["ghi", "jkl"]
        },
        "option": "C"
    }))?;
    assert_eq!(generic, expected_generic());
    Ok(())
}

#[test]
fn test_generic_write_typed_read() -> AvroResult<()> {
    let schema = convert_schema()?;
    let generic = schema.generic(json!({
        "dict": {
            "A1": ["abc", "def"],
            "G1": ["ghi", "jkl"]
        },
        "option": "C"
    }))?;

    let mut encoder = BinaryEncoder::new(Vec::new());
    DatumWriter::new(&schema).write(&generic, &mut encoder)?;
    let bytes = encoder.into_inner();

    let mut decoder = BinaryDecoder::new(&bytes[..]);
    let value = DatumReader::new(&schema).read(&mut decoder)?;
    assert_eq!(value, generic);

    let datum: Datum = from_value(&value)?;
    assert_eq!(
        datum.dict,
        [
            ("A1".to_string(), vec!["abc".to_string(), "def".to_string()]),
            ("G1".to_string(), vec!["ghi".to_string(), "jkl".to_string()]),
        ]
        .into_iter()
        .collect()
    );
    assert_eq!(datum.select, Something::B);
    assert_eq!(datum.option, Some(Something::C));
    assert_eq!(datum.option2, None);
    assert_eq!(datum.option3, Some(Something::A));
    Ok(())
}

#[test]
fn test_typed_write_typed_read() -> AvroResult<()> {
    let schema = convert_schema()?;
    let datum = Datum {
        dict: [("K".to_string(), vec!["v1".to_string(), "v2".to_string()])]
            .into_iter()
            .collect(),
        select: Something::B,
        option: Some(Something::C),
        option2: None,
        option3: Some(Something::A),
    };

    let mut encoder = BinaryEncoder::new(Vec::new());
    DatumWriter::new(&schema).write(&to_value(&datum)?, &mut encoder)?;
    let bytes = encoder.into_inner();

    let mut decoder = BinaryDecoder::new(&bytes[..]);
    let value = DatumReader::new(&schema).read(&mut decoder)?;
    let roundtripped: Datum = from_value(&value)?;
    assert_eq!(roundtripped, datum);
    Ok(())
}

#[test]
fn test_identity_projection_equals_plain_read() -> AvroResult<()> {
    let schema = convert_schema()?;
    let generic = schema.generic(json!({
        "dict": {
            "A1": ["abc", "def"],
            "G1": ["ghi", "jkl"]
        },
        "option": "C"
    }))?;

    let mut encoder = BinaryEncoder::new(Vec::new());
    DatumWriter::new(&schema).write(&generic, &mut encoder)?;
    let bytes = encoder.into_inner();

    let projector = DatumProjector::new(&schema, &schema)?;
    let mut decoder = BinaryDecoder::new(&bytes[..]);
    let projected = projector.read(&mut decoder)?;
    assert_eq!(projected, generic);

    let datum: Datum = from_value(&projected)?;
    assert_eq!(datum.select, Something::B);
    assert_eq!(datum.option, Some(Something::C));
    assert_eq!(datum.option2, None);
    assert_eq!(datum.option3, Some(Something::A));
    Ok(())
}

/// A stream of records costs one plan lookup per record once the plan cache
/// is warm.
#[test]
fn test_projector_reads_a_stream_of_records() -> AvroResult<()> {
    let writer = Schema::parse_str(
        r#"{"type": "record", "name": "Point", "fields": [
            {"name": "x", "type": "int"},
            {"name": "y", "type": "int"}
        ]}"#,
    )?;
    let reader = Schema::parse_str(
        r#"{"type": "record", "name": "Point", "fields": [
            {"name": "x", "type": "long"},
            {"name": "label", "type": "string", "default": "p"}
        ]}"#,
    )?;

    let mut encoder = BinaryEncoder::new(Vec::new());
    let datum_writer = DatumWriter::new(&writer);
    for i in 0..100 {
        datum_writer.write(
            &Value::Record(vec![
                ("x".to_string(), Value::Int(i)),
                ("y".to_string(), Value::Int(-i)),
            ]),
            &mut encoder,
        )?;
    }
    let bytes = encoder.into_inner();

    let projector = DatumProjector::new(&writer, &reader)?;
    let mut decoder = BinaryDecoder::new(&bytes[..]);
    for i in 0..100 {
        let value = projector.read(&mut decoder)?;
        assert_eq!(
            value,
            Value::Record(vec![
                ("x".to_string(), Value::Long(i)),
                ("label".to_string(), Value::String("p".to_string())),
            ])
        );
    }
    Ok(())
}
