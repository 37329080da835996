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

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use crate::{
    AvroResult, Error, Schema,
    error::Details,
    util::MapHelper,
    validator::{validate_namespace, validate_schema_name},
};

/// Represents names for `record`, `enum` and `fixed` Avro schemas.
///
/// Each of these schemas has a `fullname` composed of two parts:
///   * a name
///   * a namespace
///
/// `aliases` can also be defined to facilitate schema evolution.
#[derive(Clone, Hash, PartialEq, Eq)]
pub struct Name {
    /// The name part of the full name.
    pub name: String,
    /// The namespace part of the full name, if any.
    pub namespace: Namespace,
}

/// Represents the aliases for a named schema.
pub type Aliases = Option<Vec<Alias>>;
/// Schema lookup by full name. Doubles as the registry shared between parses.
pub type Names = HashMap<Name, Schema>;
/// Borrowed schema lookup by full name.
pub type NamesRef<'a> = HashMap<Name, &'a Schema>;
/// Represents the namespace of a named schema.
pub type Namespace = Option<String>;
/// Borrowed namespace of a named schema.
pub type NamespaceRef<'a> = Option<&'a str>;

impl Name {
    /// Create a new `Name` from a full name, splitting off the namespace if
    /// the name is dotted.
    pub fn new(name: &str) -> AvroResult<Self> {
        Self::new_with_enclosing_namespace(name, None)
    }

    /// Create a new `Name`, falling back to `enclosing_namespace` when `name`
    /// does not carry a namespace of its own.
    pub fn new_with_enclosing_namespace(
        name: &str,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Self> {
        let index_of_name = validate_schema_name(name)?;

        if index_of_name > 0 {
            // A leading dot anchors the name to the null namespace.
            let namespace = &name[..index_of_name - 1];
            Ok(Self {
                name: name[index_of_name..].to_string(),
                namespace: (!namespace.is_empty()).then(|| namespace.to_string()),
            })
        } else if let Some(namespace) = enclosing_namespace
            && !namespace.is_empty()
        {
            validate_namespace(namespace)?;
            Ok(Self {
                name: name.to_string(),
                namespace: Some(namespace.to_string()),
            })
        } else {
            Ok(Self {
                name: name.to_string(),
                namespace: None,
            })
        }
    }

    /// Parse a JSON object with `name` (and optionally `namespace`) keys into
    /// a `Name`.
    pub(crate) fn parse(
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Self> {
        let name_field = complex.name().ok_or(Details::GetNameField)?;
        let namespace = complex.string("namespace");
        Self::new_with_enclosing_namespace(
            &name_field,
            namespace.as_deref().or(enclosing_namespace),
        )
    }

    /// Return the dotted `namespace.name` full name.
    pub fn fullname(&self) -> String {
        match self.namespace {
            Some(ref namespace) => format!("{namespace}.{}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn namespace(&self) -> NamespaceRef<'_> {
        self.namespace.as_deref()
    }
}

impl TryFrom<&str> for Name {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Debug for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Name");
        debug.field("name", &self.name);
        if self.namespace.is_some() {
            debug.field("namespace", &self.namespace);
            debug.finish()
        } else {
            debug.finish_non_exhaustive()
        }
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.fullname())
    }
}

/// Newtype over [`Name`] for schema aliases.
///
/// Aliases are serialized as an array of plain strings in the JSON
/// representation, and are resolved against the owning schema's namespace.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Alias(Name);

impl Alias {
    pub fn new(name: &str) -> AvroResult<Self> {
        Name::new(name).map(Self)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn namespace(&self) -> NamespaceRef<'_> {
        self.0.namespace()
    }

    pub fn fullname(&self) -> String {
        self.0.fullname()
    }

    /// The alias as a [`Name`], resolved against `default_namespace` when the
    /// alias itself is bare.
    pub fn fully_qualified_name(&self, default_namespace: NamespaceRef) -> Name {
        if self.0.namespace.is_none()
            && let Some(namespace) = default_namespace
            && !namespace.is_empty()
        {
            Name {
                name: self.0.name.clone(),
                namespace: Some(namespace.to_string()),
            }
        } else {
            self.0.clone()
        }
    }
}

impl TryFrom<&str> for Alias {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for Alias {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Alias {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.fullname())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Details;

    #[test]
    fn test_name_splits_namespace() -> Result<(), Error> {
        let name = Name::new("com.example.Record")?;
        assert_eq!(name.name, "Record");
        assert_eq!(name.namespace, Some("com.example".to_string()));
        assert_eq!(name.fullname(), "com.example.Record");
        Ok(())
    }

    #[test]
    fn test_enclosing_namespace_applies_to_bare_names_only() -> Result<(), Error> {
        let bare = Name::new_with_enclosing_namespace("Record", Some("ns"))?;
        assert_eq!(bare.fullname(), "ns.Record");

        let qualified = Name::new_with_enclosing_namespace("other.Record", Some("ns"))?;
        assert_eq!(qualified.fullname(), "other.Record");
        Ok(())
    }

    /// Zero-length namespace is considered as no-namespace.
    #[test]
    fn test_namespace_from_name_with_empty_value() -> Result<(), Error> {
        let name = Name::new(".name")?;
        assert_eq!(name.name, "name");
        assert_eq!(name.namespace, None);
        Ok(())
    }

    /// Whitespace is not allowed in the name.
    #[test]
    fn test_name_with_whitespace_value() {
        match Name::new(" ").map_err(Error::into_details) {
            Err(Details::InvalidSchemaName(_, _)) => {}
            other => panic!("Expected Details::InvalidSchemaName, got {other:?}"),
        }
    }

    /// The name must be non-empty.
    #[test]
    fn test_name_with_no_name_part() {
        match Name::new("space.").map_err(Error::into_details) {
            Err(Details::InvalidSchemaName(_, _)) => {}
            other => panic!("Expected Details::InvalidSchemaName, got {other:?}"),
        }
    }

    #[test]
    fn test_alias_qualification() -> Result<(), Error> {
        let alias = Alias::new("Old")?;
        assert_eq!(alias.fully_qualified_name(Some("ns")).fullname(), "ns.Old");

        let alias = Alias::new("other.Old")?;
        assert_eq!(
            alias.fully_qualified_name(Some("ns")).fullname(),
            "other.Old"
        );
        Ok(())
    }
}
