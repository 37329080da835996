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

//! # Name validation
//!
//! Schema names, namespaces, enum symbols and record field names all follow
//! the same rule: every segment matches `[A-Za-z_][A-Za-z0-9_]*`. What
//! varies per identifier kind is only how segments combine (a schema name
//! may carry dotted namespace segments, a namespace may be empty, symbols
//! and field names are a single segment), so one validator handles all four.
//!
//! Other Avro implementations are more lenient in what they accept. For
//! interoperability with those, a custom [`NameValidator`] can be
//! registered:
//!
//! ```
//! use avro_datum::validator::{NameValidator, set_name_validator};
//! use regex_lite::Regex;
//! use std::sync::OnceLock;
//!
//! struct AllowDashes;
//!
//! impl NameValidator for AllowDashes {
//!     fn segment_regex(&self) -> &'static Regex {
//!         static SEGMENT_ONCE: OnceLock<Regex> = OnceLock::new();
//!         SEGMENT_ONCE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").unwrap())
//!     }
//! }
//!
//! // don't parse any schema before registering the custom validator!
//! if set_name_validator(Box::new(AllowDashes)).is_err() {
//!     panic!("a name validator was already configured")
//! }
//! ```
//!
//! **Note**: the validator can be set only once per application lifetime. If
//! a schema is parsed before one is registered, the default validator is
//! installed and used from then on.

use crate::{AvroResult, error::Details};
use log::debug;
use regex_lite::Regex;
use std::sync::OnceLock;

/// The kinds of identifiers appearing in a schema document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameKind {
    /// A schema name, optionally dotted with namespace segments. A leading
    /// dot anchors the name to the null namespace.
    Schema,
    /// A namespace: dotted segments, or empty for the null namespace.
    Namespace,
    /// An enum symbol: a single segment.
    EnumSymbol,
    /// A record field name: a single segment.
    RecordField,
}

/// Validates the identifiers appearing in schemas.
///
/// The default behavior follows the Avro specification; overriding
/// [`segment_regex`](Self::segment_regex) is usually enough to loosen it.
/// To register an implementation use [`set_name_validator`].
pub trait NameValidator: Send + Sync {
    /// The regex a single name segment must match.
    fn segment_regex(&self) -> &'static Regex {
        static SEGMENT_ONCE: OnceLock<Regex> = OnceLock::new();
        SEGMENT_ONCE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
    }

    /// Validate `input` as an identifier of the given kind.
    ///
    /// For [`NameKind::Schema`] the returned value is the start byte of the
    /// name part within the full name; it is 0 for every other kind.
    fn validate(&self, kind: NameKind, input: &str) -> AvroResult<usize> {
        let segment = self.segment_regex();
        match kind {
            NameKind::Schema => {
                let index_of_name = input.rfind('.').map_or(0, |dot| dot + 1);
                let namespace = &input[..index_of_name.saturating_sub(1)];
                let valid = segment.is_match(&input[index_of_name..])
                    && (namespace.is_empty()
                        || namespace.split('.').all(|s| segment.is_match(s)));
                if valid {
                    Ok(index_of_name)
                } else {
                    Err(Details::InvalidSchemaName(input.to_string(), segment.as_str()).into())
                }
            }
            NameKind::Namespace => {
                if input.is_empty() || input.split('.').all(|s| segment.is_match(s)) {
                    Ok(0)
                } else {
                    Err(Details::InvalidNamespace(input.to_string(), segment.as_str()).into())
                }
            }
            NameKind::EnumSymbol => {
                if segment.is_match(input) {
                    Ok(0)
                } else {
                    Err(Details::EnumSymbolName(input.to_string()).into())
                }
            }
            NameKind::RecordField => {
                if segment.is_match(input) {
                    Ok(0)
                } else {
                    Err(Details::FieldName(input.to_string()).into())
                }
            }
        }
    }
}

/// The validator following the rules of the Avro specification.
struct SpecificationValidator;

impl NameValidator for SpecificationValidator {}

static VALIDATOR_ONCE: OnceLock<Box<dyn NameValidator>> = OnceLock::new();

/// Sets a custom name validator.
///
/// Returns `Err(validator)` if a validator is already configured.
///
/// **Note**: This function must be called before parsing any schema, because
/// parsing registers the default validator and the registration is one time
/// only!
pub fn set_name_validator(
    validator: Box<dyn NameValidator>,
) -> Result<(), Box<dyn NameValidator>> {
    debug!("Setting a custom name validator.");
    VALIDATOR_ONCE.set(validator)
}

fn validator() -> &'static dyn NameValidator {
    VALIDATOR_ONCE
        .get_or_init(|| {
            debug!("Going to use the default name validator.");
            Box::new(SpecificationValidator)
        })
        .as_ref()
}

pub(crate) fn validate_schema_name(schema_name: &str) -> AvroResult<usize> {
    validator().validate(NameKind::Schema, schema_name)
}

pub(crate) fn validate_namespace(ns: &str) -> AvroResult<()> {
    validator().validate(NameKind::Namespace, ns).map(|_| ())
}

pub(crate) fn validate_enum_symbol_name(symbol: &str) -> AvroResult<()> {
    validator().validate(NameKind::EnumSymbol, symbol).map(|_| ())
}

pub(crate) fn validate_record_field_name(field_name: &str) -> AvroResult<()> {
    validator()
        .validate(NameKind::RecordField, field_name)
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Details;

    #[test]
    fn test_schema_name_returns_name_start() {
        assert_eq!(validate_schema_name("Record").unwrap(), 0);
        assert_eq!(validate_schema_name("ns.Record").unwrap(), 3);
        assert_eq!(validate_schema_name("com.example.Record").unwrap(), 12);
        // a leading dot anchors the name to the null namespace
        assert_eq!(validate_schema_name(".Record").unwrap(), 1);
    }

    #[test]
    fn test_invalid_schema_names() {
        for bad in ["", " ", "com-example", "ns..Record", "ns.0.Record", "space."] {
            match validate_schema_name(bad).map_err(crate::Error::into_details) {
                Err(Details::InvalidSchemaName(name, _)) => assert_eq!(name, bad),
                other => panic!("Expected Details::InvalidSchemaName for {bad:?}, got {other:?}"),
            }
        }
    }

    /// Names and namespaces can be built entirely from underscores.
    #[test]
    fn test_underscore_only_names() {
        for funny_name in ["_", "_._", "__._", "_.__", "_._._"] {
            assert!(validate_schema_name(funny_name).is_ok());
        }
    }

    #[test]
    fn test_namespaces() {
        assert!(validate_namespace("").is_ok());
        assert!(validate_namespace("com.example").is_ok());
        assert!(validate_namespace("com-example").is_err());
        assert!(validate_namespace("com..example").is_err());
    }

    #[test]
    fn test_enum_symbols() {
        assert!(validate_enum_symbol_name("spades").is_ok());
        assert!(validate_enum_symbol_name("com.example").is_err());
        assert!(validate_enum_symbol_name("com-example").is_err());
    }

    #[test]
    fn test_record_field_names() {
        assert!(validate_record_field_name("test").is_ok());
        assert!(validate_record_field_name("two words").is_err());
        assert!(validate_record_field_name("dotted.name").is_err());
    }
}
