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

//! Base string hashes and the double-hashing combiner.
//!
//! Every bit position a filter touches is derived from two cheap 32-bit string hashes, djb2 and
//! sdbm, computed over the raw bytes of the key. Both hashes and the combiner are part of the
//! persisted format: a filter written by one process is only readable by another that derives
//! exactly the same indices, so none of the arithmetic here may change.

mod string;

use std::hash::Hasher;

pub use self::string::Djb2Hasher;
pub use self::string::SdbmHasher;

/// Computes the two base hashes `(djb2, sdbm)` of a key.
///
/// # Examples
///
/// ```
/// # use bloomset::hash::base_hashes;
/// assert_eq!(base_hashes(b""), (5381, 0));
/// assert_eq!(base_hashes(b"a"), (177670, 97));
/// ```
pub fn base_hashes(key: &[u8]) -> (u32, u32) {
    let mut djb2 = Djb2Hasher::new();
    djb2.write(key);
    let mut sdbm = SdbmHasher::new();
    sdbm.write(key);
    (djb2.finish32(), sdbm.finish32())
}

/// Combines the two base hashes into the hash for `round`.
///
/// Round 0 yields `hash_a` and round 1 yields `hash_b`. Every later round yields
/// `hash_a + round * hash_b + (round ^ 2)` with wrapping 32-bit arithmetic. The last term is a
/// bitwise XOR with 2, not a square, and has to stay that way for existing filters to keep
/// answering the same.
///
/// # Examples
///
/// ```
/// # use bloomset::hash::double_hash;
/// assert_eq!(double_hash(10, 20, 0), 10);
/// assert_eq!(double_hash(10, 20, 1), 20);
/// assert_eq!(double_hash(10, 20, 2), 50); // 10 + 2 * 20 + (2 ^ 2)
/// assert_eq!(double_hash(10, 20, 3), 71); // 10 + 3 * 20 + (3 ^ 2)
/// ```
pub fn double_hash(hash_a: u32, hash_b: u32, round: u32) -> u32 {
    match round {
        0 => hash_a,
        1 => hash_b,
        _ => hash_a
            .wrapping_add(round.wrapping_mul(hash_b))
            .wrapping_add(round ^ 2),
    }
}
