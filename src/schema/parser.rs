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
use crate::schema::{
    Alias, Aliases, ArraySchema, EnumSchema, FixedSchema, MapSchema, Name, Names, NamespaceRef,
    PrimitiveSchema, RecordField, RecordSchema, Schema, UnionSchema,
};
use crate::util::MapHelper;
use crate::validator::validate_enum_symbol_name;
use log::{debug, error, warn};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Converts JSON documents into [`Schema`] trees.
///
/// The parser owns the name registry while a document is being parsed:
/// `resolving_schemas` breaks cycles (a field referencing its own record by
/// name resolves to a [`Schema::Ref`]), `parsed_schemas` holds every named
/// schema that finished parsing, seeded from an externally supplied registry
/// when cross-document references are wanted.
#[derive(Default)]
pub(crate) struct Parser {
    /// Used to resolve cyclic references, i.e. when a field's type is a
    /// reference to its record's type.
    resolving_schemas: Names,
    parsed_schemas: Names,
}

impl Parser {
    pub(crate) fn with_registry(registry: Names) -> Self {
        Self {
            resolving_schemas: Names::default(),
            parsed_schemas: registry,
        }
    }

    pub(crate) fn get_parsed_schemas(&self) -> &Names {
        &self.parsed_schemas
    }

    pub(crate) fn into_parsed_schemas(self) -> Names {
        self.parsed_schemas
    }

    /// Create a `Schema` from a `serde_json::Value` representing a JSON Avro
    /// schema.
    pub(crate) fn parse(
        &mut self,
        value: &Value,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        match *value {
            Value::String(ref t) => self.parse_known_schema(t.as_str(), enclosing_namespace),
            Value::Object(ref data) => self.parse_complex(data, enclosing_namespace),
            Value::Array(ref data) => self.parse_union(data, enclosing_namespace),
            _ => Err(Details::ParseSchemaFromValidJson.into()),
        }
    }

    /// Parse a string as a primitive type or a reference to an already
    /// registered named schema.
    fn parse_known_schema(
        &mut self,
        name: &str,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        match name {
            "null" => Ok(Schema::null()),
            "boolean" => Ok(Schema::boolean()),
            "int" => Ok(Schema::int()),
            "long" => Ok(Schema::long()),
            "double" => Ok(Schema::double()),
            "float" => Ok(Schema::float()),
            "bytes" => Ok(Schema::bytes()),
            "string" => Ok(Schema::string()),
            _ => self.fetch_schema_ref(name, enclosing_namespace),
        }
    }

    /// Given a name, retrieve the registered schema as a [`Schema::Ref`].
    ///
    /// The name is looked up as qualified by the enclosing namespace first,
    /// then as written.
    fn fetch_schema_ref(
        &mut self,
        name: &str,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let qualified = Name::new_with_enclosing_namespace(name, enclosing_namespace)?;
        let as_written = Name::new(name)?;

        for candidate in [&qualified, &as_written] {
            if self.parsed_schemas.contains_key(candidate)
                || self.resolving_schemas.contains_key(candidate)
            {
                return Ok(Schema::Ref {
                    name: candidate.clone(),
                });
            }
        }

        Err(Details::UnknownType(name.to_string()).into())
    }

    /// Parse a JSON object representing a complex Avro type into a `Schema`.
    fn parse_complex(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        match complex.get("type") {
            Some(Value::String(t)) => match t.as_str() {
                "record" => self.parse_record(complex, enclosing_namespace),
                "enum" => self.parse_enum(complex, enclosing_namespace),
                "array" => self.parse_array(complex, enclosing_namespace),
                "map" => self.parse_map(complex, enclosing_namespace),
                "fixed" => self.parse_fixed(complex, enclosing_namespace),
                "null" => Ok(Schema::Null(PrimitiveSchema::from_complex(complex))),
                "boolean" => Ok(Schema::Boolean(PrimitiveSchema::from_complex(complex))),
                "int" => Ok(Schema::Int(PrimitiveSchema::from_complex(complex))),
                "long" => Ok(Schema::Long(PrimitiveSchema::from_complex(complex))),
                "float" => Ok(Schema::Float(PrimitiveSchema::from_complex(complex))),
                "double" => Ok(Schema::Double(PrimitiveSchema::from_complex(complex))),
                "bytes" => Ok(Schema::Bytes(PrimitiveSchema::from_complex(complex))),
                "string" => Ok(Schema::String(PrimitiveSchema::from_complex(complex))),
                // handles the nested reference form `{"type": "Status"}`
                other => self.parse_known_schema(other, enclosing_namespace),
            },
            Some(Value::Object(data)) => self.parse_complex(data, enclosing_namespace),
            Some(Value::Array(variants)) => self.parse_union(variants, enclosing_namespace),
            Some(unknown) => Err(Details::GetComplexType(unknown.clone()).into()),
            None => Err(Details::GetComplexTypeField.into()),
        }
    }

    /// If the full name is already known, return the matching reference. A
    /// repeated inline definition of a name resolves to the registered
    /// schema instead of erroring.
    fn get_already_seen_schema(&self, fully_qualified_name: &Name) -> Option<Schema> {
        if self.parsed_schemas.contains_key(fully_qualified_name)
            || self.resolving_schemas.contains_key(fully_qualified_name)
        {
            Some(Schema::Ref {
                name: fully_qualified_name.clone(),
            })
        } else {
            None
        }
    }

    /// Parse a JSON object representing an Avro record type into a `Schema`.
    fn parse_record(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;
        if let Some(seen) = self.get_already_seen_schema(&fully_qualified_name) {
            return Ok(seen);
        }

        let aliases =
            self.fix_aliases_namespace(complex.aliases(), fully_qualified_name.namespace());

        // Register before parsing the fields so that self-references resolve.
        self.register_resolving_schema(&fully_qualified_name, &aliases);

        debug!("Going to parse record schema: {:?}", &fully_qualified_name);

        let fields: Vec<RecordField> = complex
            .get("fields")
            .and_then(|fields| fields.as_array())
            .ok_or_else(|| crate::Error::new(Details::GetRecordFieldsJson))
            .and_then(|fields| {
                fields
                    .iter()
                    .filter_map(|field| field.as_object())
                    .map(|field| RecordField::parse(field, self, &fully_qualified_name))
                    .collect::<Result<_, _>>()
            })?;

        let mut lookup = BTreeMap::new();
        for (position, field) in fields.iter().enumerate() {
            if let Some(_old) = lookup.insert(field.name.clone(), position) {
                return Err(Details::FieldNameDuplicate(field.name.clone()).into());
            }

            for alias in &field.aliases {
                lookup.insert(alias.clone(), position);
            }
        }

        let schema = Schema::Record(RecordSchema {
            name: fully_qualified_name.clone(),
            aliases: aliases.clone(),
            doc: complex.doc(),
            fields,
            lookup,
            attributes: self.get_custom_attributes(complex, &["fields"]),
        });

        self.register_parsed_schema(&fully_qualified_name, &schema, &aliases);
        Ok(schema)
    }

    /// Parse a JSON object representing an Avro enum type into a `Schema`.
    fn parse_enum(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;
        if let Some(seen) = self.get_already_seen_schema(&fully_qualified_name) {
            return Ok(seen);
        }

        let aliases =
            self.fix_aliases_namespace(complex.aliases(), fully_qualified_name.namespace());

        let symbols: Vec<String> = complex
            .get("symbols")
            .and_then(|v| v.as_array())
            .ok_or_else(|| crate::Error::from(Details::GetEnumSymbolsField))
            .and_then(|symbols| {
                symbols
                    .iter()
                    .map(|symbol| symbol.as_str().map(|s| s.to_string()))
                    .collect::<Option<_>>()
                    .ok_or_else(|| crate::Error::from(Details::GetEnumSymbols))
            })?;

        let mut existing_symbols: HashSet<&String> = HashSet::with_capacity(symbols.len());
        for symbol in symbols.iter() {
            validate_enum_symbol_name(symbol)?;

            if existing_symbols.contains(&symbol) {
                return Err(Details::EnumSymbolDuplicate(symbol.to_string()).into());
            }

            existing_symbols.insert(symbol);
        }

        let mut default: Option<String> = None;
        if let Some(value) = complex.get("default") {
            if let Value::String(ref s) = *value {
                default = Some(s.clone());
            } else {
                return Err(Details::EnumDefaultWrongType(value.clone()).into());
            }
        }

        if let Some(ref symbol) = default
            && !symbols.contains(symbol)
        {
            return Err(Details::GetEnumDefault {
                symbol: symbol.to_string(),
                symbols,
            }
            .into());
        }

        let schema = Schema::Enum(EnumSchema {
            name: fully_qualified_name.clone(),
            aliases: aliases.clone(),
            doc: complex.doc(),
            symbols,
            default,
            attributes: self.get_custom_attributes(complex, &["symbols", "default"]),
        });

        self.register_parsed_schema(&fully_qualified_name, &schema, &aliases);

        Ok(schema)
    }

    /// Parse a JSON object representing an Avro array type into a `Schema`.
    fn parse_array(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let items = complex
            .get("items")
            .ok_or_else(|| Details::GetArrayItemsField.into())
            .and_then(|items| self.parse(items, enclosing_namespace))?;

        Ok(Schema::Array(ArraySchema {
            items: Box::new(items),
            attributes: self.get_custom_attributes(complex, &["items"]),
        }))
    }

    /// Parse a JSON object representing an Avro map type into a `Schema`.
    fn parse_map(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let types = complex
            .get("values")
            .ok_or_else(|| Details::GetMapValuesField.into())
            .and_then(|types| self.parse(types, enclosing_namespace))?;

        Ok(Schema::Map(MapSchema {
            types: Box::new(types),
            attributes: self.get_custom_attributes(complex, &["values"]),
        }))
    }

    /// Parse a JSON array of schemas into an Avro union.
    fn parse_union(
        &mut self,
        items: &[Value],
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let schemas = items
            .iter()
            .map(|v| self.parse(v, enclosing_namespace))
            .collect::<Result<Vec<_>, _>>()?;

        if schemas.is_empty() {
            error!("Union schemas should have at least two members!");
        } else if schemas.len() == 1 {
            warn!("Union schema with just one member! Consider dropping the union!");
        }
        Ok(Schema::Union(UnionSchema::new(schemas)?))
    }

    /// Parse a JSON object representing an Avro fixed type into a `Schema`.
    fn parse_fixed(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;
        if let Some(seen) = self.get_already_seen_schema(&fully_qualified_name) {
            return Ok(seen);
        }

        let aliases =
            self.fix_aliases_namespace(complex.aliases(), fully_qualified_name.namespace());

        let size = match complex.get("size") {
            Some(size) => size
                .as_u64()
                .ok_or_else(|| Details::GetFixedSizeFieldPositive(size.clone())),
            None => Err(Details::GetFixedSizeField),
        }?;

        let schema = Schema::Fixed(FixedSchema {
            name: fully_qualified_name.clone(),
            aliases: aliases.clone(),
            doc: complex.doc(),
            size: size as usize,
            attributes: self.get_custom_attributes(complex, &["size"]),
        });

        self.register_parsed_schema(&fully_qualified_name, &schema, &aliases);

        Ok(schema)
    }

    fn register_resolving_schema(&mut self, name: &Name, aliases: &Aliases) {
        let resolving_schema = Schema::Ref { name: name.clone() };
        self.resolving_schemas
            .insert(name.clone(), resolving_schema.clone());

        let namespace = name.namespace();

        if let Some(aliases) = aliases {
            aliases.iter().for_each(|alias| {
                let alias_fullname = alias.fully_qualified_name(namespace);
                self.resolving_schemas
                    .insert(alias_fullname, resolving_schema.clone());
            });
        }
    }

    fn register_parsed_schema(
        &mut self,
        fully_qualified_name: &Name,
        schema: &Schema,
        aliases: &Aliases,
    ) {
        self.parsed_schemas
            .insert(fully_qualified_name.clone(), schema.clone());
        self.resolving_schemas.remove(fully_qualified_name);

        let namespace = fully_qualified_name.namespace();

        if let Some(aliases) = aliases {
            aliases.iter().for_each(|alias| {
                let alias_fullname = alias.fully_qualified_name(namespace);
                self.resolving_schemas.remove(&alias_fullname);
                self.parsed_schemas.insert(alias_fullname, schema.clone());
            });
        }
    }

    fn get_custom_attributes(
        &self,
        complex: &Map<String, Value>,
        excluded: &[&'static str],
    ) -> BTreeMap<String, Value> {
        let mut custom_attributes: BTreeMap<String, Value> = BTreeMap::new();
        for (key, value) in complex {
            match key.as_str() {
                "type" | "name" | "namespace" | "doc" | "aliases" => continue,
                candidate if excluded.contains(&candidate) => continue,
                _ => custom_attributes.insert(key.clone(), value.clone()),
            };
        }
        custom_attributes
    }

    // A type alias may be specified either as fully namespace-qualified, or
    // relative to the namespace of the name it is an alias for. For example,
    // if a type named "a.b" has aliases of "c" and "x.y", then the fully
    // qualified names of its aliases are "a.c" and "x.y".
    fn fix_aliases_namespace(
        &self,
        aliases: Option<Vec<String>>,
        namespace: NamespaceRef,
    ) -> Aliases {
        aliases.map(|aliases| {
            aliases
                .iter()
                .map(|alias| {
                    if alias.find('.').is_none() {
                        match namespace {
                            Some(ns) => format!("{ns}.{alias}"),
                            None => alias.clone(),
                        }
                    } else {
                        alias.clone()
                    }
                })
                .map(|alias| Alias::new(alias.as_str()).unwrap())
                .collect()
        })
    }
}
