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

use std::hash::Hasher;

const DJB2_SEED: u32 = 5381;
const DJB2_MULTIPLIER: u32 = 33;
const SDBM_MULTIPLIER: u32 = 65599;

/// Widens a key byte the way existing filters were built: as a signed byte, sign-extended to
/// 32 bits. Bytes `0x80..=0xFF` therefore add `-128..=-1`, wrapped.
fn widen(byte: u8) -> u32 {
    byte as i8 as u32
}

/// Dan Bernstein's djb2 string hash: `h = h * 33 + byte`, seeded with 5381.
///
/// Bytes are added as sign-extended signed values.
///
/// Feed key bytes through [`Hasher::write`]. Going through [`std::hash::Hash`] would also hash
/// the length prefix or terminator the standard library adds for slices and strings.
#[derive(Debug, Clone, Copy)]
pub struct Djb2Hasher {
    hash: u32,
}

impl Djb2Hasher {
    /// Creates a hasher in its seeded initial state.
    pub fn new() -> Self {
        Djb2Hasher { hash: DJB2_SEED }
    }

    /// Returns the 32-bit hash of the bytes written so far.
    pub fn finish32(&self) -> u32 {
        self.hash
    }
}

impl Default for Djb2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Djb2Hasher {
    fn finish(&self) -> u64 {
        u64::from(self.hash)
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.hash = self
                .hash
                .wrapping_mul(DJB2_MULTIPLIER)
                .wrapping_add(widen(byte));
        }
    }
}

/// The sdbm string hash: `h = byte + h * 65599`, seeded with 0, bytes sign-extended.
///
/// The multiplication is the `(h << 6) + (h << 16) - h` of the classic formulation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdbmHasher {
    hash: u32,
}

impl SdbmHasher {
    /// Creates a hasher in its initial state.
    pub fn new() -> Self {
        SdbmHasher { hash: 0 }
    }

    /// Returns the 32-bit hash of the bytes written so far.
    pub fn finish32(&self) -> u32 {
        self.hash
    }
}

impl Hasher for SdbmHasher {
    fn finish(&self) -> u64 {
        u64::from(self.hash)
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.hash = widen(byte).wrapping_add(self.hash.wrapping_mul(SDBM_MULTIPLIER));
        }
    }
}
