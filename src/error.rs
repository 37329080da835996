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

use crate::schema::{Name, SchemaKind};
use crate::types::ValueKind;
use serde_json::Value as JsonValue;
use std::fmt;

/// Errors encountered while parsing schemas or encoding and decoding data.
///
/// To inspect the details of the error use [`details`](Self::details) or
/// [`into_details`](Self::into_details) to get a [`Details`] which contains
/// more precise error information.
#[derive(thiserror::Error, Debug)]
#[repr(transparent)]
#[error(transparent)]
pub struct Error {
    details: Box<Details>,
}

impl Error {
    pub fn new(details: Details) -> Self {
        Self {
            details: Box::new(details),
        }
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn into_details(self) -> Details {
        *self.details
    }
}

impl From<Details> for Error {
    fn from(details: Details) -> Self {
        Self::new(details)
    }
}

/// The closed taxonomy of failures.
///
/// Parser errors are fatal to the in-progress parse and leave any supplied
/// registry unchanged. Codec errors abort the current datum and render the
/// stream position undefined.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Details {
    // ---- schema parsing ----
    #[error("Failed to parse schema from JSON: {0}")]
    ParseSchemaJson(#[source] serde_json::Error),

    #[error("Must be a JSON string, object or array")]
    ParseSchemaFromValidJson,

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("A full name was already registered: {0}")]
    DuplicateName(String),

    #[error("Unions may not directly contain a union")]
    NestedUnion,

    #[error("Unions cannot contain duplicate types: {0:?}")]
    DuplicateUnionKind(SchemaKind),

    #[error("Unions cannot contain two record members with the same name: {0}")]
    DuplicateUnionName(String),

    #[error("Invalid schema name {0}: every segment must match the regex {1}")]
    InvalidSchemaName(String, &'static str),

    #[error("Invalid namespace {0}: every segment must match the regex {1}")]
    InvalidNamespace(String, &'static str),

    #[error("Invalid enum symbol name {0}")]
    EnumSymbolName(String),

    #[error("Invalid field name {0}")]
    FieldName(String),

    #[error("Duplicate field name {0}")]
    FieldNameDuplicate(String),

    #[error("Duplicate enum symbol {0}")]
    EnumSymbolDuplicate(String),

    #[error("Default value for enum must be a string: {0:?}")]
    EnumDefaultWrongType(JsonValue),

    #[error("Default symbol {symbol} is not among the enum symbols {symbols:?}")]
    GetEnumDefault {
        symbol: String,
        symbols: Vec<String>,
    },

    #[error(
        "Invalid default value {value} for field {field} of record {record}: it does not match the field schema"
    )]
    InvalidDefault {
        field: String,
        record: String,
        value: JsonValue,
    },

    #[error("No `name` field")]
    GetNameField,

    #[error("No `fields` in record")]
    GetRecordFieldsJson,

    #[error("No `type` in record field")]
    GetRecordFieldTypeField,

    #[error("No `symbols` field in enum")]
    GetEnumSymbolsField,

    #[error("Unable to parse `symbols` in enum")]
    GetEnumSymbols,

    #[error("No `items` in array")]
    GetArrayItemsField,

    #[error("No `values` in map")]
    GetMapValuesField,

    #[error("No `size` in fixed")]
    GetFixedSizeField,

    #[error("Fixed `size` must be a positive integer: {0:?}")]
    GetFixedSizeFieldPositive(JsonValue),

    #[error("Invalid `order` in record field: {0:?}")]
    GetRecordFieldOrder(JsonValue),

    #[error("No `type` field found for complex schema")]
    GetComplexTypeField,

    #[error("Unknown complex type: {0}")]
    GetComplexType(JsonValue),

    // ---- datum writing ----
    #[error("Failed to write bytes: {0}")]
    WriteBytes(#[source] std::io::Error),

    #[error("Value of type {value_kind:?} cannot be encoded with schema of type {supported_schema:?}")]
    EncodeValueAsSchemaError {
        value_kind: ValueKind,
        supported_schema: Vec<SchemaKind>,
    },

    #[error("Enum symbol not found: {0}")]
    GetEnumSymbol(String),

    #[error("Fixed schema requires {size} bytes, got {observed}")]
    CompareFixedSizes { size: usize, observed: usize },

    #[error("Record field {0} has no value and no default")]
    GetField(String),

    #[error("Could not find a matching union branch for value of type {0:?}")]
    FindUnionVariant(ValueKind),

    // ---- datum reading ----
    #[error("Failed to read variable-length integer bytes: {0}")]
    ReadVariableIntegerBytes(#[source] std::io::Error),

    #[error("Overflow when decoding a variable-length integer")]
    IntegerOverflow,

    #[error("Failed to read boolean byte: {0}")]
    ReadBoolean(#[source] std::io::Error),

    #[error("Invalid u8 for bool: {0}")]
    BoolValue(u8),

    #[error("Failed to read bytes: {0}")]
    ReadBytes(#[source] std::io::Error),

    #[error("Failed to read string: {0}")]
    ReadString(#[source] std::io::Error),

    #[error("Failed to read float: {0}")]
    ReadFloat(#[source] std::io::Error),

    #[error("Failed to read double: {0}")]
    ReadDouble(#[source] std::io::Error),

    #[error("Failed to read {1} fixed bytes: {0}")]
    ReadFixed(#[source] std::io::Error, usize),

    #[error("Invalid utf-8 string: {0}")]
    ConvertToUtf8(#[source] std::string::FromUtf8Error),

    #[error("Cannot convert {1} to i32: {0}")]
    ZagI32(#[source] std::num::TryFromIntError, i64),

    #[error("Unable to allocate {desired} bytes (maximum allowed: {maximum})")]
    MemoryAllocation { desired: usize, maximum: usize },

    #[error("Union index {index} out of bounds: {num_variants}")]
    GetUnionVariant { index: i64, num_variants: usize },

    #[error("Enum index {index} out of bounds: {nsymbols}")]
    GetEnumValue { index: i64, nsymbols: usize },

    #[error("Unable to resolve schema name {0}")]
    SchemaResolutionError(Name),

    #[error("Array/map block count {0} cannot be allocated")]
    BlockCount(i64),

    // ---- generic value materialization ----
    #[error("Value {value} does not match schema {schema:?} at {path}")]
    GenericValue {
        value: JsonValue,
        schema: SchemaKind,
        path: String,
    },

    // ---- projection ----
    #[error("Schemas are not compatible at {path}: {reason}")]
    IncompatibleSchemas { path: String, reason: String },

    #[error("Writer enum symbol {symbol} has no counterpart in the reader enum {reader}")]
    ProjectEnumSymbol { symbol: String, reader: Name },

    // ---- serde bridge ----
    #[error("Failed to serialize value: {0}")]
    SerializeValue(String),

    #[error("Failed to deserialize value: {0}")]
    DeserializeValue(String),
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Details::SerializeValue(msg.to_string()).into()
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Details::DeserializeValue(msg.to_string()).into()
    }
}
