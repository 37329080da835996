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

use crate::AvroResult;
use crate::error::Details;
use crate::schema::parser::Parser;
use crate::schema::{Aliases, Documentation, Name, Names, Schema};
use crate::util::MapHelper;
use crate::validator::validate_record_field_name;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

/// A description of a Record schema.
#[derive(bon::Builder, Clone)]
pub struct RecordSchema {
    /// The name of the schema
    pub name: Name,
    /// The aliases of the schema
    #[builder(default)]
    pub aliases: Aliases,
    /// The documentation of the schema
    #[builder(default)]
    pub doc: Documentation,
    /// The set of fields of the schema
    #[builder(default)]
    pub fields: Vec<RecordField>,
    /// The `lookup` table maps field names (and their aliases) to their
    /// position in the `Vec` of `fields`.
    #[builder(skip = calculate_lookup_table(&fields))]
    pub lookup: BTreeMap<String, usize>,
    /// The custom attributes of the schema
    #[builder(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl RecordSchema {
    /// Look up a field by name or alias.
    pub fn field(&self, name: &str) -> Option<&RecordField> {
        self.lookup.get(name).map(|&i| &self.fields[i])
    }
}

impl Debug for RecordSchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("RecordSchema");
        debug.field("name", &self.name);
        if let Some(aliases) = &self.aliases {
            debug.field("aliases", aliases);
        }
        if let Some(doc) = &self.doc {
            debug.field("doc", doc);
        }
        debug.field("fields", &self.fields);
        if !self.attributes.is_empty() {
            debug.field("attributes", &self.attributes);
        }
        debug.finish_non_exhaustive()
    }
}

/// Calculate the lookup table for the given fields.
fn calculate_lookup_table(fields: &[RecordField]) -> BTreeMap<String, usize> {
    let mut lookup = BTreeMap::new();
    for (i, field) in fields.iter().enumerate() {
        lookup.insert(field.name.clone(), i);
        for alias in &field.aliases {
            lookup.insert(alias.clone(), i);
        }
    }
    lookup
}

/// The sort ordering hint of a record field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RecordFieldOrder {
    #[default]
    Ascending,
    Descending,
    Ignore,
}

impl RecordFieldOrder {
    fn parse(value: &Value) -> AvroResult<Self> {
        match value.as_str() {
            Some("ascending") => Ok(RecordFieldOrder::Ascending),
            Some("descending") => Ok(RecordFieldOrder::Descending),
            Some("ignore") => Ok(RecordFieldOrder::Ignore),
            _ => Err(Details::GetRecordFieldOrder(value.clone()).into()),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            RecordFieldOrder::Ascending => "ascending",
            RecordFieldOrder::Descending => "descending",
            RecordFieldOrder::Ignore => "ignore",
        }
    }
}

/// Represents a `field` in a `record` Avro schema.
#[derive(bon::Builder, Clone)]
pub struct RecordField {
    /// Name of the field.
    #[builder(into)]
    pub name: String,
    /// Documentation of the field.
    #[builder(default)]
    pub doc: Documentation,
    /// Aliases of the field's name. They have no namespace.
    #[builder(default)]
    pub aliases: Vec<String>,
    /// Default value of the field, as the JSON literal it was declared with.
    /// It is materialized into a concrete value the first time schema
    /// resolution needs it.
    pub default: Option<Value>,
    /// Schema of the field.
    pub schema: Schema,
    /// The sort ordering hint of the field.
    #[builder(default)]
    pub order: RecordFieldOrder,
    /// A collection of all unknown keys in the record field.
    #[builder(default = BTreeMap::new())]
    pub custom_attributes: BTreeMap<String, Value>,
}

impl Debug for RecordField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("RecordField");
        debug.field("name", &self.name);
        if let Some(doc) = &self.doc {
            debug.field("doc", &doc);
        }
        if !self.aliases.is_empty() {
            debug.field("aliases", &self.aliases);
        }
        if let Some(default) = &self.default {
            debug.field("default", &default);
        }
        debug.field("schema", &self.schema);
        if !self.custom_attributes.is_empty() {
            debug.field("custom_attributes", &self.custom_attributes);
        }
        debug.finish_non_exhaustive()
    }
}

impl RecordField {
    /// Parse a JSON object into a `RecordField`.
    pub(crate) fn parse(
        field: &Map<String, Value>,
        parser: &mut Parser,
        enclosing_record: &Name,
    ) -> AvroResult<Self> {
        let name = field.name().ok_or(Details::GetNameField)?;

        validate_record_field_name(&name)?;

        let ty = field.get("type").ok_or(Details::GetRecordFieldTypeField)?;
        let schema = parser.parse(ty, enclosing_record.namespace())?;

        let mut default = field.get("default").cloned();
        if default.is_none() && schema.is_nullable() {
            // A field typed as ["null", ...] is optional by construction.
            default = Some(Value::Null);
        }
        Self::resolve_default_value(
            &schema,
            &name,
            &enclosing_record.fullname(),
            parser.get_parsed_schemas(),
            &default,
        )?;

        let order = match field.get("order") {
            Some(order) => RecordFieldOrder::parse(order)?,
            None => RecordFieldOrder::default(),
        };

        let aliases = field.aliases().unwrap_or_default();

        Ok(RecordField {
            name,
            doc: field.doc(),
            default,
            aliases,
            order,
            custom_attributes: RecordField::get_field_custom_attributes(field),
            schema,
        })
    }

    fn resolve_default_value(
        field_schema: &Schema,
        field_name: &str,
        record_name: &str,
        names: &Names,
        default: &Option<Value>,
    ) -> AvroResult<()> {
        if let Some(value) = default
            && !default_matches(field_schema, value, names)
        {
            return Err(Details::InvalidDefault {
                field: field_name.to_string(),
                record: record_name.to_string(),
                value: value.clone(),
            }
            .into());
        }

        Ok(())
    }

    fn get_field_custom_attributes(field: &Map<String, Value>) -> BTreeMap<String, Value> {
        let mut custom_attributes: BTreeMap<String, Value> = BTreeMap::new();
        for (key, value) in field {
            match key.as_str() {
                "type" | "name" | "doc" | "default" | "aliases" | "order" => continue,
                _ => custom_attributes.insert(key.clone(), value.clone()),
            };
        }
        custom_attributes
    }

    /// Returns true if this `RecordField` is nullable, meaning the schema is
    /// a union whose first variant is `Null`.
    pub fn is_nullable(&self) -> bool {
        self.schema.is_nullable()
    }
}

/// Check that a default literal is assignable under the given schema.
///
/// Runs at parse time over the raw JSON so no generic value needs to be
/// built. References that are still being resolved cannot be checked and are
/// accepted as-is.
fn default_matches(schema: &Schema, default: &Value, names: &Names) -> bool {
    match schema {
        Schema::Null(_) => default.is_null(),
        Schema::Boolean(_) => default.is_boolean(),
        Schema::Int(_) => default
            .as_i64()
            .is_some_and(|i| i32::try_from(i).is_ok()),
        Schema::Long(_) => default.is_i64() || default.is_u64(),
        Schema::Float(_) | Schema::Double(_) => default.is_number(),
        Schema::Bytes(_) | Schema::String(_) => default.is_string(),
        Schema::Fixed(fixed) => default
            .as_str()
            .is_some_and(|s| s.len() == fixed.size),
        Schema::Enum(enum_schema) => default
            .as_str()
            .is_some_and(|s| enum_schema.symbols.iter().any(|symbol| symbol == s)),
        Schema::Array(inner) => default
            .as_array()
            .is_some_and(|items| items.iter().all(|v| default_matches(&inner.items, v, names))),
        Schema::Map(inner) => default
            .as_object()
            .is_some_and(|map| map.values().all(|v| default_matches(&inner.types, v, names))),
        Schema::Union(union) => union
            .variants()
            .iter()
            .any(|variant| default_matches(variant, default, names)),
        Schema::Record(record) => default.as_object().is_some_and(|map| {
            record.fields.iter().all(|field| {
                match map.get(&field.name) {
                    Some(v) => default_matches(&field.schema, v, names),
                    None => field.default.is_some(),
                }
            })
        }),
        Schema::Ref { name } => match names.get(name) {
            Some(target) => default_matches(target, default, names),
            // still mid-parse, nothing to check against
            None => true,
        },
    }
}

impl Serialize for RecordField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("type", &self.schema)?;

        if let Some(default) = &self.default {
            map.serialize_entry("default", default)?;
        }

        if let Some(doc) = &self.doc {
            map.serialize_entry("doc", doc)?;
        }

        if !self.aliases.is_empty() {
            map.serialize_entry("aliases", &self.aliases)?;
        }

        if self.order != RecordFieldOrder::Ascending {
            map.serialize_entry("order", self.order.as_str())?;
        }

        for attr in &self.custom_attributes {
            map.serialize_entry(attr.0, attr.1)?;
        }

        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::UnionSchema;
    use serde_json::json;

    #[test]
    fn test_nullable_record_field() {
        let nullable_record_field = RecordField::builder()
            .name("next")
            .schema(Schema::Union(
                UnionSchema::new(vec![
                    Schema::null(),
                    Schema::Ref {
                        name: Name::new("LongList").unwrap(),
                    },
                ])
                .unwrap(),
            ))
            .build();

        assert!(nullable_record_field.is_nullable());

        let non_nullable_record_field = RecordField::builder()
            .name("next")
            .default(json!(2))
            .schema(Schema::long())
            .build();

        assert!(!non_nullable_record_field.is_nullable());
    }

    #[test]
    fn test_lookup_covers_aliases() {
        let fields = vec![
            RecordField::builder()
                .name("a")
                .aliases(vec!["old_a".to_string()])
                .schema(Schema::int())
                .build(),
            RecordField::builder().name("b").schema(Schema::long()).build(),
        ];
        let record = RecordSchema::builder()
            .name(Name::new("Test").unwrap())
            .fields(fields)
            .build();

        assert_eq!(record.lookup.get("a"), Some(&0));
        assert_eq!(record.lookup.get("old_a"), Some(&0));
        assert_eq!(record.lookup.get("b"), Some(&1));
        assert!(record.field("old_a").is_some());
    }

    #[test]
    fn test_default_matches_union_any_member() {
        let names = Names::new();
        let union = Schema::Union(
            UnionSchema::new(vec![Schema::null(), Schema::string()]).unwrap(),
        );
        assert!(default_matches(&union, &json!(null), &names));
        assert!(default_matches(&union, &json!("hi"), &names));
        assert!(!default_matches(&union, &json!(42), &names));
    }
}
