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

//! Bloom filter with a durable, versioned binary format.
//!
//! A Bloom filter is a space-efficient probabilistic data structure used to test whether
//! a key is a member of a set. False positive matches are possible, but false negatives
//! are not. In other words, a query returns either "possibly in set" or "definitely not in set".
//!
//! # Properties
//!
//! - **No false negatives**: If a key was added, `contains()` will always return `true`
//! - **Possible false positives**: `contains()` may return `true` for keys never added
//! - **Fixed size**: The bit array is sized once, for a capacity and a target error rate
//! - **Monotonic**: Nothing ever clears a bit; there is no removal
//!
//! # Usage
//!
//! ```rust
//! use bloomset::bloom::BloomFilter;
//!
//! // Create a filter for 1000 keys with a 0.1% false positive rate
//! let mut filter = BloomFilter::new(1000, 0.001)?;
//!
//! filter.add("apple");
//! filter.add("banana");
//!
//! assert!(filter.contains("apple"));
//! assert!(!filter.contains("grape"));
//!
//! // Persist and restore
//! let bytes = filter.serialize();
//! let restored = BloomFilter::deserialize(&bytes, None)?;
//! assert_eq!(filter, restored);
//! # Ok::<(), bloomset::error::Error>(())
//! ```
//!
//! # Serialized formats
//!
//! Filters are always written in the versioned format: a magic marker, a 64-byte header with
//! the capacity, bit count, hash round count and insertion count in big-endian, then the packed
//! bits. Decoding also accepts the older legacy format, which is only a little-endian bit count
//! followed by the packed bits; since it carries no capacity, the caller has to supply it. See
//! [`Format`] and the constants in this module for the exact layout.
//!
//! # Implementation Details
//!
//! - Uses djb2 and sdbm as the two base hashes
//! - Derives the remaining rounds by double hashing
//! - Bits packed LSB-first in bytes

mod bit_array;
mod builder;
mod filter;
mod serialization;

pub use self::builder::BloomFilterBuilder;
pub use self::builder::MAX_HASH_ROUNDS;
pub use self::builder::MAX_NUM_BITS;
pub use self::builder::MIN_HASH_ROUNDS;
pub use self::builder::MIN_NUM_BITS;
pub use self::filter::BloomFilter;
pub use self::filter::FilterSettings;
pub use self::serialization::BITS_PER_BLOCK;
pub use self::serialization::Block;
pub use self::serialization::Format;
pub use self::serialization::HEADER_SIZE;
pub use self::serialization::MAGIC;
pub use self::serialization::VERSION_MAJOR;
pub use self::serialization::VERSION_MINOR;
