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

//! **[Apache Avro](https://avro.apache.org/)** is a data serialization system
//! which provides rich data structures and a compact, fast, binary data
//! format. This crate implements its core: the schema model (parsing,
//! registry, canonical form, fingerprinting), the binary codec, and the
//! datum layer mediating between the two, including a schema-resolving
//! [`DatumProjector`] that reads data written under one schema into values
//! matching another.
//!
//! There are two ways of working with Avro data in this crate:
//!
//! 1. Via the generic [`Value`](types::Value) type: great when working with
//!    unknown or rapidly changing schemas, or when you don't want or need to
//!    map to Rust types.
//! 2. Via types implementing Serde's `Serialize` and `Deserialize`, bridged
//!    with [`to_value`] and [`from_value`].
//!
//! # Example
//!
//! ```
//! use avro_datum::{BinaryDecoder, BinaryEncoder, DatumReader, DatumWriter, Schema};
//! use avro_datum::types::Record;
//!
//! # fn main() -> Result<(), avro_datum::Error> {
//! let schema = Schema::parse_str(r#"
//!     {
//!         "type": "record",
//!         "name": "Person",
//!         "fields": [
//!             {"name": "first_name", "type": "string"},
//!             {"name": "age", "type": "int"}
//!         ]
//!     }
//! "#)?;
//!
//! let mut record = Record::new(&schema).unwrap();
//! record.put("first_name", "Ada");
//! record.put("age", 37);
//!
//! let mut encoder = BinaryEncoder::new(Vec::new());
//! DatumWriter::new(&schema).write(&record.into(), &mut encoder)?;
//! let bytes = encoder.into_inner();
//!
//! let mut decoder = BinaryDecoder::new(&bytes[..]);
//! let value = DatumReader::new(&schema).read(&mut decoder)?;
//! # Ok(())
//! # }
//! ```
//!
//! Schema identity is the 64-bit Rabin [`Fingerprint`] of the schema's
//! canonical form; see [`Schema::canonical`] and
//! [`Schema::rabin_fingerprint`].

mod de;
mod decode;
mod encode;
mod projection;
mod reader;
mod ser;
mod writer;

pub mod error;
pub mod rabin;
pub mod schema;
pub mod types;
pub mod util;
pub mod validator;

pub use de::from_value;
pub use error::Error;
pub use projection::DatumProjector;
pub use rabin::{Fingerprint, Rabin};
pub use reader::{BinaryDecoder, DatumReader, from_avro_datum};
pub use schema::{CanonicalSchema, Schema};
pub use ser::to_value;
pub use writer::{BinaryEncoder, DatumWriter, to_avro_datum};

/// A convenience type alias for `Result`s with `Error`s.
pub type AvroResult<T> = Result<T, Error>;
