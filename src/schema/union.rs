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
use crate::schema::{NamesRef, RecordSchema, Schema, SchemaKind};
use crate::types::Value;
use std::collections::{BTreeMap, HashSet};

/// A description of a Union schema.
///
/// Members may not be unions themselves. Record members (and the by-name
/// references the parser emits for them) are distinguished by their full
/// name; every other kind may appear at most once.
#[derive(Debug, Clone)]
pub struct UnionSchema {
    /// The schemas that make up this union.
    pub(crate) schemas: Vec<Schema>,
    // Maps member kinds to their position, for constant time branch
    // selection given a value. Record members are found by name instead.
    variant_index: BTreeMap<SchemaKind, usize>,
}

impl UnionSchema {
    /// Creates a new UnionSchema from a vector of schemas.
    ///
    /// # Errors
    /// Will return an error if `schemas` contains a union, more than one
    /// member of any non-record kind, or two record members sharing a full
    /// name.
    pub fn new(schemas: Vec<Schema>) -> AvroResult<Self> {
        let mut vindex = BTreeMap::new();
        let mut record_names = HashSet::new();
        for (i, schema) in schemas.iter().enumerate() {
            match schema {
                Schema::Union(_) => return Err(Details::NestedUnion.into()),
                Schema::Record(RecordSchema { name, .. }) | Schema::Ref { name } => {
                    if !record_names.insert(name.fullname()) {
                        return Err(Details::DuplicateUnionName(name.fullname()).into());
                    }
                }
                _ => {
                    if vindex.insert(SchemaKind::from(schema), i).is_some() {
                        return Err(Details::DuplicateUnionKind(SchemaKind::from(schema)).into());
                    }
                }
            }
        }
        Ok(UnionSchema {
            schemas,
            variant_index: vindex,
        })
    }

    /// Returns a slice of all variants of this schema.
    pub fn variants(&self) -> &[Schema] {
        &self.schemas
    }

    /// Returns true if the first variant of this `UnionSchema` is `Null`,
    /// which makes values of this union optional.
    pub fn is_nullable(&self) -> bool {
        matches!(self.schemas.first(), Some(Schema::Null(_)))
    }

    /// Select the branch a value should be written under.
    ///
    /// Resolution order: an explicit [`Value::Union`] wrapper wins, then the
    /// null branch for null values, then an exact unnamed kind match, then
    /// the first branch the value is structurally compatible with (which
    /// covers named schemas).
    pub(crate) fn resolve_branch<'s>(
        &'s self,
        value: &Value,
        names: &NamesRef<'s>,
    ) -> Option<(usize, &'s Schema)> {
        if let Value::Union(index, _) = value {
            let index = *index as usize;
            return self.schemas.get(index).map(|schema| (index, schema));
        }
        if let Value::Null = value {
            return self
                .variant_index
                .get(&SchemaKind::Null)
                .map(|&i| (i, &self.schemas[i]));
        }
        let kind = SchemaKind::from(value);
        if kind.is_primitive()
            && let Some(&i) = self.variant_index.get(&kind)
        {
            return Some((i, &self.schemas[i]));
        }
        self.schemas
            .iter()
            .enumerate()
            .find(|(_, schema)| value.validate(schema, names))
    }
}

// No need to compare variant_index, it is derivative of schemas.
impl PartialEq for UnionSchema {
    fn eq(&self, other: &UnionSchema) -> bool {
        self.schemas.eq(&other.schemas)
    }
}
