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

//! Logic for parsing and interacting with schemas in Avro format.

mod canonical;
mod name;
mod parser;
mod record;
mod union;

pub use crate::schema::{
    canonical::CanonicalSchema,
    name::{Alias, Aliases, Name, Names, NamesRef, Namespace, NamespaceRef},
    record::{
        RecordField, RecordFieldBuilder, RecordFieldOrder, RecordSchema, RecordSchemaBuilder,
    },
    union::UnionSchema,
};
use crate::{
    AvroResult, error::Details, rabin::Fingerprint, schema::parser::Parser, types,
};
use digest::Digest;
use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;
use strum::{Display, EnumDiscriminants};

/// Represents documentation for complex Avro schemas.
pub type Documentation = Option<String>;

/// Represents an Avro schema fingerprint over an arbitrary digest.
///
/// For the 8-byte Rabin identity used for schema equality see
/// [`Fingerprint`].
pub struct SchemaFingerprint {
    pub bytes: Vec<u8>,
}

impl fmt::Display for SchemaFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in &self.bytes {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Represents any valid Avro schema.
///
/// Schemas are constructed by the parser and immutable thereafter; they can
/// be cloned and shared freely across threads.
#[derive(Clone, Debug, EnumDiscriminants, Display)]
#[strum_discriminants(name(SchemaKind), derive(Hash, Ord, PartialOrd))]
pub enum Schema {
    /// A `null` Avro schema.
    Null(PrimitiveSchema),
    /// A `boolean` Avro schema.
    Boolean(PrimitiveSchema),
    /// An `int` Avro schema.
    Int(PrimitiveSchema),
    /// A `long` Avro schema.
    Long(PrimitiveSchema),
    /// A `float` Avro schema.
    Float(PrimitiveSchema),
    /// A `double` Avro schema.
    Double(PrimitiveSchema),
    /// A `bytes` Avro schema.
    ///
    /// `Bytes` represents a sequence of 8-bit unsigned bytes.
    Bytes(PrimitiveSchema),
    /// A `string` Avro schema.
    ///
    /// `String` represents a unicode character sequence.
    String(PrimitiveSchema),
    /// An `array` Avro schema.
    ///
    /// All items will have the same schema.
    Array(ArraySchema),
    /// A `map` Avro schema.
    ///
    /// Keys are always strings and all values will have the same schema.
    Map(MapSchema),
    /// A `union` Avro schema.
    Union(UnionSchema),
    /// A `record` Avro schema.
    Record(RecordSchema),
    /// An `enum` Avro schema.
    Enum(EnumSchema),
    /// A `fixed` Avro schema.
    Fixed(FixedSchema),
    /// A by-name reference to a named schema.
    ///
    /// Inserted by the parser wherever resolving a name would otherwise
    /// build a cycle in the schema graph.
    Ref { name: Name },
}

/// The payload shared by all primitive schema variants: the custom
/// properties that were declared next to the `type` key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrimitiveSchema {
    pub attributes: BTreeMap<String, JsonValue>,
}

impl PrimitiveSchema {
    pub(crate) fn from_complex(complex: &Map<String, JsonValue>) -> Self {
        let mut attributes = BTreeMap::new();
        for (key, value) in complex {
            if key != "type" {
                attributes.insert(key.clone(), value.clone());
            }
        }
        Self { attributes }
    }
}

/// A description of an Array schema.
#[derive(Clone, Debug, PartialEq)]
pub struct ArraySchema {
    pub items: Box<Schema>,
    pub attributes: BTreeMap<String, JsonValue>,
}

/// A description of a Map schema.
#[derive(Clone, Debug, PartialEq)]
pub struct MapSchema {
    pub types: Box<Schema>,
    pub attributes: BTreeMap<String, JsonValue>,
}

/// A description of an Enum schema.
#[derive(bon::Builder, Debug, Clone)]
pub struct EnumSchema {
    /// The name of the schema
    pub name: Name,
    /// The aliases of the schema
    #[builder(default)]
    pub aliases: Aliases,
    /// The documentation of the schema
    #[builder(default)]
    pub doc: Documentation,
    /// The ordered set of symbols of the schema
    pub symbols: Vec<String>,
    /// An optional default symbol used for compatibility
    pub default: Option<String>,
    /// The custom attributes of the schema
    #[builder(default = BTreeMap::new())]
    pub attributes: BTreeMap<String, JsonValue>,
}

/// A description of a Fixed schema.
#[derive(bon::Builder, Debug, Clone)]
pub struct FixedSchema {
    /// The name of the schema
    pub name: Name,
    /// The aliases of the schema
    #[builder(default)]
    pub aliases: Aliases,
    /// The documentation of the schema
    #[builder(default)]
    pub doc: Documentation,
    /// The number of bytes of the fixed schema
    pub size: usize,
    /// The custom attributes of the schema
    #[builder(default = BTreeMap::new())]
    pub attributes: BTreeMap<String, JsonValue>,
}

impl SchemaKind {
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            SchemaKind::Null
                | SchemaKind::Boolean
                | SchemaKind::Int
                | SchemaKind::Long
                | SchemaKind::Double
                | SchemaKind::Float
                | SchemaKind::Bytes
                | SchemaKind::String,
        )
    }
}

impl From<&types::Value> for SchemaKind {
    fn from(value: &types::Value) -> Self {
        use crate::types::Value;
        match value {
            Value::Null => Self::Null,
            Value::Boolean(_) => Self::Boolean,
            Value::Int(_) => Self::Int,
            Value::Long(_) => Self::Long,
            Value::Float(_) => Self::Float,
            Value::Double(_) => Self::Double,
            Value::Bytes(_) => Self::Bytes,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Map(_) => Self::Map,
            Value::Union(_, _) => Self::Union,
            Value::Record(_) => Self::Record,
            Value::Enum(_, _) => Self::Enum,
            Value::Fixed(_, _) => Self::Fixed,
        }
    }
}

impl Schema {
    pub fn null() -> Self {
        Schema::Null(PrimitiveSchema::default())
    }

    pub fn boolean() -> Self {
        Schema::Boolean(PrimitiveSchema::default())
    }

    pub fn int() -> Self {
        Schema::Int(PrimitiveSchema::default())
    }

    pub fn long() -> Self {
        Schema::Long(PrimitiveSchema::default())
    }

    pub fn float() -> Self {
        Schema::Float(PrimitiveSchema::default())
    }

    pub fn double() -> Self {
        Schema::Double(PrimitiveSchema::default())
    }

    pub fn bytes() -> Self {
        Schema::Bytes(PrimitiveSchema::default())
    }

    pub fn string() -> Self {
        Schema::String(PrimitiveSchema::default())
    }

    /// Create a `Schema` from a string representing a JSON Avro schema.
    pub fn parse_str(input: &str) -> AvroResult<Schema> {
        let value = serde_json::from_str(input).map_err(Details::ParseSchemaJson)?;
        let mut parser = Parser::default();
        parser.parse(&value, None)
    }

    /// Create a `Schema` from a string representing a JSON Avro schema,
    /// resolving named references through `registry` and registering every
    /// named schema the document defines into it.
    ///
    /// The registry is never global; cross-document linkage is opt-in by
    /// passing the same registry to multiple parse calls. A failed parse
    /// leaves the registry untouched.
    ///
    /// # Errors
    /// Returns [`Details::DuplicateName`] if the document's top-level name is
    /// already registered.
    pub fn parse_str_with_registry(input: &str, registry: &mut Names) -> AvroResult<Schema> {
        let value = serde_json::from_str(input).map_err(Details::ParseSchemaJson)?;

        if let JsonValue::Object(ref complex) = value
            && let Ok(name) = Name::parse(complex, None)
            && registry.contains_key(&name)
        {
            return Err(Details::DuplicateName(name.fullname()).into());
        }

        let mut parser = Parser::with_registry(registry.clone());
        let schema = parser.parse(&value, None)?;
        *registry = parser.into_parsed_schemas();
        Ok(schema)
    }

    /// Create an array of `Schema`s from a list of JSON Avro schemas sharing
    /// one registry.
    ///
    /// Each document may reference names defined by the documents before it.
    pub fn parse_list<'a>(
        inputs: impl IntoIterator<Item = &'a str>,
    ) -> AvroResult<Vec<Schema>> {
        let mut registry = Names::new();
        inputs
            .into_iter()
            .map(|input| Self::parse_str_with_registry(input, &mut registry))
            .collect()
    }

    /// Parse an Avro schema from already deserialized JSON.
    pub fn parse(value: &JsonValue) -> AvroResult<Schema> {
        let mut parser = Parser::default();
        parser.parse(value, None)
    }

    /// Convert `self` into its canonical form.
    ///
    /// The canonical form strips documentation, aliases and custom
    /// properties, fully qualifies names and normalizes key and record field
    /// order, so that two schemas are semantically equivalent iff their
    /// canonical forms are equal.
    pub fn canonical(&self) -> CanonicalSchema {
        CanonicalSchema::new(self)
    }

    /// Like [`canonical`](Self::canonical), but resolves references that are
    /// not defined within `self` through `registry`.
    pub fn canonical_with(&self, registry: &Names) -> CanonicalSchema {
        CanonicalSchema::with_registry(self, registry)
    }

    /// Generate a fingerprint of the schema's canonical form with the given
    /// digest algorithm.
    pub fn fingerprint<D: Digest>(&self) -> SchemaFingerprint {
        let mut d = D::new();
        d.update(self.canonical().as_str());
        SchemaFingerprint {
            bytes: d.finalize().to_vec(),
        }
    }

    /// The 64-bit Rabin fingerprint of the schema's canonical form: the
    /// schema's identity.
    pub fn rabin_fingerprint(&self) -> Fingerprint {
        self.canonical().rabin_fingerprint()
    }

    /// Look up a custom property by name.
    pub fn property(&self, name: &str) -> Option<&JsonValue> {
        self.attributes().and_then(|attributes| attributes.get(name))
    }

    /// Returns the custom attributes (metadata) if the schema supports them.
    pub fn attributes(&self) -> Option<&BTreeMap<String, JsonValue>> {
        match self {
            Schema::Null(PrimitiveSchema { attributes })
            | Schema::Boolean(PrimitiveSchema { attributes })
            | Schema::Int(PrimitiveSchema { attributes })
            | Schema::Long(PrimitiveSchema { attributes })
            | Schema::Float(PrimitiveSchema { attributes })
            | Schema::Double(PrimitiveSchema { attributes })
            | Schema::Bytes(PrimitiveSchema { attributes })
            | Schema::String(PrimitiveSchema { attributes })
            | Schema::Record(RecordSchema { attributes, .. })
            | Schema::Enum(EnumSchema { attributes, .. })
            | Schema::Fixed(FixedSchema { attributes, .. })
            | Schema::Array(ArraySchema { attributes, .. })
            | Schema::Map(MapSchema { attributes, .. }) => Some(attributes),
            _ => None,
        }
    }

    /// Returns whether the schema represents a named type.
    pub fn is_named(&self) -> bool {
        matches!(
            self,
            Schema::Ref { .. } | Schema::Record(_) | Schema::Enum(_) | Schema::Fixed(_)
        )
    }

    /// Returns true if this schema is a union whose first variant is `Null`.
    pub fn is_nullable(&self) -> bool {
        match self {
            Schema::Union(inner) => inner.is_nullable(),
            _ => false,
        }
    }

    /// Returns the name of the schema if it has one.
    pub fn name(&self) -> Option<&Name> {
        match self {
            Schema::Ref { name, .. }
            | Schema::Record(RecordSchema { name, .. })
            | Schema::Enum(EnumSchema { name, .. })
            | Schema::Fixed(FixedSchema { name, .. }) => Some(name),
            _ => None,
        }
    }

    /// Returns the namespace of the schema if it has one.
    pub fn namespace(&self) -> Namespace {
        self.name().and_then(|n| n.namespace.clone())
    }

    /// Returns the aliases of the schema if it has any.
    pub fn aliases(&self) -> Option<&Vec<Alias>> {
        match self {
            Schema::Record(RecordSchema { aliases, .. })
            | Schema::Enum(EnumSchema { aliases, .. })
            | Schema::Fixed(FixedSchema { aliases, .. }) => aliases.as_ref(),
            _ => None,
        }
    }

    /// Returns the doc of the schema if it has one.
    pub fn doc(&self) -> Option<&String> {
        match self {
            Schema::Record(RecordSchema { doc, .. })
            | Schema::Enum(EnumSchema { doc, .. })
            | Schema::Fixed(FixedSchema { doc, .. }) => doc.as_ref(),
            _ => None,
        }
    }

    /// Materialize a dynamically typed (JSON) datum into a generic
    /// [`Value`](types::Value) guided by this schema.
    ///
    /// Record fields absent from the datum take their defaults; unions pick
    /// the first matching branch; enum symbols are looked up in the schema.
    pub fn generic(&self, datum: JsonValue) -> AvroResult<types::Value> {
        let mut names = NamesRef::new();
        self.collect_named_schemas(&mut names);
        types::Value::from_json(&datum, self, &names)
    }

    /// Collect every named schema defined within `self` (and their aliases)
    /// into `names`.
    pub(crate) fn collect_named_schemas<'s>(&'s self, names: &mut NamesRef<'s>) {
        match self {
            Schema::Record(record) => {
                if names.insert(record.name.clone(), self).is_some() {
                    return;
                }
                register_aliases(self, names);
                for field in &record.fields {
                    field.schema.collect_named_schemas(names);
                }
            }
            Schema::Enum(EnumSchema { name, .. }) | Schema::Fixed(FixedSchema { name, .. }) => {
                names.insert(name.clone(), self);
                register_aliases(self, names);
            }
            Schema::Array(inner) => inner.items.collect_named_schemas(names),
            Schema::Map(inner) => inner.types.collect_named_schemas(names),
            Schema::Union(inner) => {
                for variant in inner.variants() {
                    variant.collect_named_schemas(names);
                }
            }
            _ => (),
        }
    }
}

fn register_aliases<'s>(schema: &'s Schema, names: &mut NamesRef<'s>) {
    if let Some(aliases) = schema.aliases() {
        let namespace = schema.namespace();
        for alias in aliases {
            names.insert(alias.fully_qualified_name(namespace.as_deref()), schema);
        }
    }
}

impl PartialEq for Schema {
    /// Assess equality of two `Schema`s based on their canonical forms.
    fn eq(&self, other: &Self) -> bool {
        self.canonical().as_str() == other.canonical().as_str()
    }
}

impl Serialize for Schema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        fn primitive<S: Serializer>(
            serializer: S,
            name: &str,
            inner: &PrimitiveSchema,
        ) -> Result<S::Ok, S::Error> {
            if inner.attributes.is_empty() {
                serializer.serialize_str(name)
            } else {
                let mut map = serializer.serialize_map(Some(1 + inner.attributes.len()))?;
                map.serialize_entry("type", name)?;
                for (key, value) in &inner.attributes {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }

        match self {
            Schema::Ref { name } => serializer.serialize_str(&name.fullname()),
            Schema::Null(inner) => primitive(serializer, "null", inner),
            Schema::Boolean(inner) => primitive(serializer, "boolean", inner),
            Schema::Int(inner) => primitive(serializer, "int", inner),
            Schema::Long(inner) => primitive(serializer, "long", inner),
            Schema::Float(inner) => primitive(serializer, "float", inner),
            Schema::Double(inner) => primitive(serializer, "double", inner),
            Schema::Bytes(inner) => primitive(serializer, "bytes", inner),
            Schema::String(inner) => primitive(serializer, "string", inner),
            Schema::Array(ArraySchema { items, attributes }) => {
                let mut map = serializer.serialize_map(Some(2 + attributes.len()))?;
                map.serialize_entry("type", "array")?;
                map.serialize_entry("items", items)?;
                for (key, value) in attributes {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Schema::Map(MapSchema { types, attributes }) => {
                let mut map = serializer.serialize_map(Some(2 + attributes.len()))?;
                map.serialize_entry("type", "map")?;
                map.serialize_entry("values", types)?;
                for (key, value) in attributes {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Schema::Union(inner) => {
                let variants = inner.variants();
                let mut seq = serializer.serialize_seq(Some(variants.len()))?;
                for v in variants {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Schema::Record(RecordSchema {
                name,
                aliases,
                doc,
                fields,
                attributes,
                lookup: _lookup,
            }) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "record")?;
                if let Some(ref n) = name.namespace {
                    map.serialize_entry("namespace", n)?;
                }
                map.serialize_entry("name", &name.name)?;
                if let Some(docstr) = doc {
                    map.serialize_entry("doc", docstr)?;
                }
                if let Some(aliases) = aliases {
                    map.serialize_entry("aliases", aliases)?;
                }
                map.serialize_entry("fields", fields)?;
                for attr in attributes {
                    map.serialize_entry(attr.0, attr.1)?;
                }
                map.end()
            }
            Schema::Enum(EnumSchema {
                name,
                symbols,
                aliases,
                attributes,
                default,
                doc,
            }) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "enum")?;
                if let Some(ref n) = name.namespace {
                    map.serialize_entry("namespace", n)?;
                }
                map.serialize_entry("name", &name.name)?;
                if let Some(doc) = doc {
                    map.serialize_entry("doc", doc)?;
                }
                map.serialize_entry("symbols", symbols)?;
                if let Some(aliases) = aliases {
                    map.serialize_entry("aliases", aliases)?;
                }
                if let Some(default) = default {
                    map.serialize_entry("default", default)?;
                }
                for attr in attributes {
                    map.serialize_entry(attr.0, attr.1)?;
                }
                map.end()
            }
            Schema::Fixed(FixedSchema {
                name,
                aliases,
                doc,
                size,
                attributes,
            }) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "fixed")?;
                if let Some(ref n) = name.namespace {
                    map.serialize_entry("namespace", n)?;
                }
                map.serialize_entry("name", &name.name)?;
                if let Some(docstr) = doc {
                    map.serialize_entry("doc", docstr)?;
                }
                map.serialize_entry("size", size)?;
                if let Some(aliases) = aliases {
                    map.serialize_entry("aliases", aliases)?;
                }
                for attr in attributes {
                    map.serialize_entry(attr.0, attr.1)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rabin::Rabin;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_invalid_schema() {
        assert!(Schema::parse_str("invalid").is_err());
    }

    #[test]
    fn test_primitive_custom_properties_survive() -> AvroResult<()> {
        let schema = Schema::parse_str(r#"{"type": "string", "maxLength": 64}"#)?;
        assert!(matches!(schema, Schema::String(_)));
        assert_eq!(
            schema.property("maxLength"),
            Some(&serde_json::json!(64))
        );
        assert_eq!(schema.property("minLength"), None);
        Ok(())
    }

    #[test]
    fn test_record_custom_properties() -> AvroResult<()> {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "TestRecord", "hello": "world", "fields": [
                {"name": "longRecordField", "type": "long"},
                {"name": "stringRecordField", "type": "string"},
                {"name": "intRecordField", "type": "int"},
                {"name": "floatRecordField", "type": "float"}
            ]}"#,
        )?;
        assert_eq!(schema.attributes().map(|a| a.len()), Some(1));
        assert_eq!(schema.property("hello"), Some(&serde_json::json!("world")));
        Ok(())
    }

    #[test]
    fn test_serialize_referenced_schema() -> AvroResult<()> {
        let schema = Schema::parse_str(
            r#"{
                "type": "record",
                "name": "Referenced",
                "namespace": "io.avro",
                "fields": [
                    {"name": "A", "type": {"type": "enum", "name": "Status", "symbols": ["OK", "FAILED"]}},
                    {"name": "B", "type": "Status"},
                    {"name": "C", "type": {"type": "map", "values": "Status"}},
                    {"name": "D", "type": {"type": "array", "items": "Status"}},
                    {"name": "E", "type": ["null", "Status"]},
                    {"name": "F", "type": {"type": "record", "name": "F", "fields": [{"name": "X", "type": "Status"}]}},
                    {"name": "G", "type": {"type": "map", "values": {"type": "record", "name": "F", "fields": [{"name": "X", "type": "Status"}]}}}
                ]
            }"#,
        )?;
        let expected = r#"{"type":"record","namespace":"io.avro","name":"Referenced","fields":[{"name":"A","type":{"type":"enum","namespace":"io.avro","name":"Status","symbols":["OK","FAILED"]}},{"name":"B","type":"io.avro.Status"},{"name":"C","type":{"type":"map","values":"io.avro.Status"}},{"name":"D","type":{"type":"array","items":"io.avro.Status"}},{"name":"E","type":["null","io.avro.Status"],"default":null},{"name":"F","type":{"type":"record","namespace":"io.avro","name":"F","fields":[{"name":"X","type":"io.avro.Status"}]}},{"name":"G","type":{"type":"map","values":"io.avro.F"}}]}"#;
        assert_eq!(serde_json::to_string(&schema).unwrap(), expected);
        Ok(())
    }

    #[test]
    fn test_equality_ignores_doc_and_properties() -> AvroResult<()> {
        let a = Schema::parse_str(
            r#"{"type": "enum", "name": "foo", "symbols": ["A", "B"], "doc": "hello"}"#,
        )?;
        let b = Schema::parse_str(r#"{"type": "enum", "name": "foo", "symbols": ["A", "B"]}"#)?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn test_generic_digest_fingerprints_differ_from_rabin() -> AvroResult<()> {
        use md5::Md5;

        let schema = Schema::parse_str(r#"{"type": "array", "items": "string"}"#)?;
        let md5 = schema.fingerprint::<Md5>();
        assert_eq!(md5.bytes.len(), 16);
        let rabin = schema.fingerprint::<Rabin>();
        assert_eq!(rabin.bytes.len(), 8);
        assert_eq!(rabin.bytes, schema.rabin_fingerprint().as_bytes());
        Ok(())
    }
}
