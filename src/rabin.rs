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

//! Implementation of the Rabin fingerprint algorithm (CRC-64-AVRO).

use digest::{
    FixedOutput, FixedOutputReset, HashMarker, Output, OutputSizeUser, Reset, Update, consts::U8,
};
use std::fmt;
use std::sync::OnceLock;

const EMPTY: u64 = 0xc15d_213a_a4d7_a795;

static FP_TABLE_ONCE: OnceLock<[u64; 256]> = OnceLock::new();

fn fp_table() -> &'static [u64; 256] {
    FP_TABLE_ONCE.get_or_init(|| {
        let mut fp_table = [0u64; 256];
        for (i, entry) in fp_table.iter_mut().enumerate() {
            let mut fp = i as u64;
            for _ in 0..8 {
                fp = (fp >> 1) ^ (EMPTY & (fp & 1).wrapping_neg());
            }
            *entry = fp;
        }
        fp_table
    })
}

/// The 64-bit Rabin fingerprint of the canonical form of an Avro schema,
/// computed as in the Avro specification.
///
/// Implements [`digest::Digest`] so it can be used interchangeably with other
/// digest algorithms in [`Schema::fingerprint`](crate::Schema::fingerprint).
#[derive(Clone)]
pub struct Rabin {
    result: u64,
}

impl Default for Rabin {
    fn default() -> Self {
        Rabin { result: EMPTY }
    }
}

impl Update for Rabin {
    fn update(&mut self, data: &[u8]) {
        let table = fp_table();
        for b in data {
            self.result = (self.result >> 8) ^ table[((self.result ^ *b as u64) & 0xff) as usize];
        }
    }
}

impl HashMarker for Rabin {}

impl OutputSizeUser for Rabin {
    type OutputSize = U8;
}

impl FixedOutput for Rabin {
    fn finalize_into(self, out: &mut Output<Self>) {
        out.copy_from_slice(&self.result.to_le_bytes());
    }
}

impl Reset for Rabin {
    fn reset(&mut self) {
        self.result = EMPTY;
    }
}

impl FixedOutputReset for Rabin {
    fn finalize_into_reset(&mut self, out: &mut Output<Self>) {
        out.copy_from_slice(&self.result.to_le_bytes());
        Reset::reset(self);
    }
}

/// An 8-byte schema identity: the Rabin fingerprint of the schema's
/// canonical form.
///
/// Byte order is the little-endian rendition of the 64-bit fingerprint and
/// is stable within one build.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 8]);

impl Fingerprint {
    pub fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Whether two fingerprints are the same identity.
    pub fn equal(&self, other: &Fingerprint) -> bool {
        self == other
    }
}

impl From<[u8; 8]> for Fingerprint {
    fn from(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}
