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

//! The canonical form of a schema.
//!
//! Two schemas are semantically equivalent iff their canonical forms are
//! equal, which decouples schema identity from whitespace, key order,
//! documentation, custom properties and namespace notation.

use crate::AvroResult;
use crate::error::Details;
use crate::rabin::{Fingerprint, Rabin};
use crate::schema::{Names, NamesRef, RecordField, Schema, SchemaFingerprint};
use digest::Digest;
use std::collections::HashSet;
use std::fmt;

/// The normalized rendition of a [`Schema`], produced by
/// [`Schema::canonical`].
///
/// Its text is a deterministic JSON document:
/// - documentation, aliases, ordering hints and custom properties are
///   stripped;
/// - object keys appear in the fixed order `name`, `type`, `fields`,
///   `symbols`, `items`, `values`, `size`;
/// - names are fully qualified into `name` and the separate `namespace`
///   key is omitted;
/// - a named schema after its first appearance is emitted as the bare
///   full-name string;
/// - record fields are ordered alphabetically by name, while union member
///   order and enum symbol order stay as declared.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CanonicalSchema(String);

impl CanonicalSchema {
    pub(crate) fn new(schema: &Schema) -> Self {
        let mut names = NamesRef::new();
        schema.collect_named_schemas(&mut names);
        Self::build(schema, &names)
    }

    pub(crate) fn with_registry(schema: &Schema, registry: &Names) -> Self {
        let mut names: NamesRef = registry.iter().map(|(name, s)| (name.clone(), s)).collect();
        schema.collect_named_schemas(&mut names);
        Self::build(schema, &names)
    }

    fn build(schema: &Schema, names: &NamesRef) -> Self {
        let mut defined_names = HashSet::new();
        CanonicalSchema(canonical_form(schema, names, &mut defined_names))
    }

    /// The canonical text. This is valid JSON.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_json(&self) -> AvroResult<serde_json::Value> {
        serde_json::from_str(&self.0).map_err(|e| Details::ParseSchemaJson(e).into())
    }

    /// Fingerprint of the canonical text with an arbitrary digest.
    pub fn fingerprint<D: Digest>(&self) -> SchemaFingerprint {
        let mut d = D::new();
        d.update(self.0.as_bytes());
        SchemaFingerprint {
            bytes: d.finalize().to_vec(),
        }
    }

    /// The 64-bit Rabin fingerprint of the canonical text.
    pub fn rabin_fingerprint(&self) -> Fingerprint {
        let mut rabin = Rabin::new();
        rabin.update(self.0.as_bytes());
        Fingerprint::new(rabin.finalize().into())
    }
}

impl fmt::Display for CanonicalSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn canonical_form(schema: &Schema, names: &NamesRef, defined_names: &mut HashSet<String>) -> String {
    match schema {
        Schema::Null(_) => pcf_string("null"),
        Schema::Boolean(_) => pcf_string("boolean"),
        Schema::Int(_) => pcf_string("int"),
        Schema::Long(_) => pcf_string("long"),
        Schema::Float(_) => pcf_string("float"),
        Schema::Double(_) => pcf_string("double"),
        Schema::Bytes(_) => pcf_string("bytes"),
        Schema::String(_) => pcf_string("string"),
        Schema::Array(inner) => format!(
            r#"{{"type":"array","items":{}}}"#,
            canonical_form(&inner.items, names, defined_names)
        ),
        Schema::Map(inner) => format!(
            r#"{{"type":"map","values":{}}}"#,
            canonical_form(&inner.types, names, defined_names)
        ),
        Schema::Union(union) => {
            let members = union
                .variants()
                .iter()
                .map(|variant| canonical_form(variant, names, defined_names))
                .collect::<Vec<String>>()
                .join(",");
            format!("[{members}]")
        }
        Schema::Record(record) => {
            let fullname = record.name.fullname();
            if !defined_names.insert(fullname.clone()) {
                return pcf_string(&fullname);
            }

            // Alphabetical field order makes the form independent of field
            // declaration order.
            let mut fields: Vec<&RecordField> = record.fields.iter().collect();
            fields.sort_by(|a, b| a.name.cmp(&b.name));

            let fields = fields
                .iter()
                .map(|field| {
                    format!(
                        r#"{{"name":{},"type":{}}}"#,
                        pcf_string(&field.name),
                        canonical_form(&field.schema, names, defined_names)
                    )
                })
                .collect::<Vec<String>>()
                .join(",");
            format!(
                r#"{{"name":{},"type":"record","fields":[{}]}}"#,
                pcf_string(&fullname),
                fields
            )
        }
        Schema::Enum(enum_schema) => {
            let fullname = enum_schema.name.fullname();
            if !defined_names.insert(fullname.clone()) {
                return pcf_string(&fullname);
            }

            let symbols = enum_schema
                .symbols
                .iter()
                .map(|symbol| pcf_string(symbol))
                .collect::<Vec<String>>()
                .join(",");
            format!(
                r#"{{"name":{},"type":"enum","symbols":[{}]}}"#,
                pcf_string(&fullname),
                symbols
            )
        }
        Schema::Fixed(fixed) => {
            let fullname = fixed.name.fullname();
            if !defined_names.insert(fullname.clone()) {
                return pcf_string(&fullname);
            }

            format!(
                r#"{{"name":{},"type":"fixed","size":{}}}"#,
                pcf_string(&fullname),
                fixed.size
            )
        }
        Schema::Ref { name } => {
            let fullname = name.fullname();
            if defined_names.contains(&fullname) {
                pcf_string(&fullname)
            } else if let Some(target) = names.get(name) {
                canonical_form(target, names, defined_names)
            } else {
                // Unresolvable here; the bare name keeps the form stable.
                pcf_string(&fullname)
            }
        }
    }
}

fn pcf_string(s: &str) -> String {
    format!("\"{s}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AvroResult;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_enum_canonical_strips_doc() -> AvroResult<()> {
        let schema = Schema::parse_str(
            r#"{"type": "enum", "name": "foo", "symbols": ["A", "B", "C", "D"], "doc": "hello"}"#,
        )?;
        assert_eq!(
            schema.canonical().as_str(),
            r#"{"name":"foo","type":"enum","symbols":["A","B","C","D"]}"#
        );
        Ok(())
    }

    #[test]
    fn test_record_fields_sorted_alphabetically() -> AvroResult<()> {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "R", "namespace": "ns", "fields": [
                {"name": "b", "type": "string"},
                {"name": "a", "type": "int"}
            ]}"#,
        )?;
        assert_eq!(
            schema.canonical().as_str(),
            r#"{"name":"ns.R","type":"record","fields":[{"name":"a","type":"int"},{"name":"b","type":"string"}]}"#
        );
        Ok(())
    }

    #[test]
    fn test_second_appearance_is_bare_name() -> AvroResult<()> {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "a", "type": {"type": "fixed", "name": "Hash", "size": 4}},
                {"name": "b", "type": "Hash"}
            ]}"#,
        )?;
        assert_eq!(
            schema.canonical().as_str(),
            r#"{"name":"R","type":"record","fields":[{"name":"a","type":{"name":"Hash","type":"fixed","size":4}},{"name":"b","type":"Hash"}]}"#
        );
        Ok(())
    }

    #[test]
    fn test_self_reference_does_not_recurse_forever() -> AvroResult<()> {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "Self", "fields": [
                {"name": "next", "type": ["null", "Self"]}
            ]}"#,
        )?;
        assert_eq!(
            schema.canonical().as_str(),
            r#"{"name":"Self","type":"record","fields":[{"name":"next","type":["null","Self"]}]}"#
        );
        Ok(())
    }

    #[test]
    fn test_canonical_is_valid_json() -> AvroResult<()> {
        let schema = Schema::parse_str(r#"{"type": "map", "values": ["int", "string"]}"#)?;
        let json = schema.canonical().to_json()?;
        assert_eq!(json["type"], "map");
        Ok(())
    }
}
