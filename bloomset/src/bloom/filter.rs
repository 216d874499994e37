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

use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use byteorder::ByteOrder;
use byteorder::LE;

use super::BloomFilterBuilder;
use super::bit_array;
use super::bit_array::BitArray;
use super::builder::MAX_HASH_ROUNDS;
use super::builder::MAX_NUM_BITS;
use super::serialization::BITS_PER_BLOCK;
use super::serialization::Format;
use super::serialization::HEADER_SIZE;
use super::serialization::Header;
use super::serialization::VERSION_MINOR;
use super::serialization::check_block_width;
use crate::codec::FilterReader;
use crate::codec::FilterWriter;
use crate::error::Error;
use crate::hash::base_hashes;
use crate::hash::double_hash;

/// A Bloom filter for probabilistic set membership testing of byte-string keys.
///
/// Provides fast membership queries with:
/// - No false negatives (added keys always return `true`)
/// - A false positive rate bounded by the target probability up to `max_items` keys
/// - Constant space usage
///
/// Use [`BloomFilterBuilder`] or [`BloomFilter::new`] to create an empty filter, or one of the
/// decoding constructors to restore a serialized one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomFilter {
    /// Capacity the filter was sized for (n). Not enforced.
    pub(super) max_items: u64,
    /// Number of bit positions touched per key (k)
    pub(super) hash_rounds: u64,
    /// Number of `add` calls, duplicates included
    pub(super) num_inserted: u64,
    /// Packed bits, `ceil(m / 8)` blocks
    pub(super) bits: BitArray,
}

/// A snapshot of a filter's parameters, as returned by [`BloomFilter::settings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterSettings {
    /// Capacity the filter was sized for.
    pub max_items: u64,
    /// Number of addressable bits.
    pub size_in_bits: u64,
    /// Bits stored per block; always 8.
    pub bits_per_block: u64,
    /// Number of storage blocks, `ceil(size_in_bits / bits_per_block)`.
    pub num_blocks: u64,
    /// Bit positions touched per key.
    pub hash_rounds: u64,
    /// Number of keys added so far.
    pub num_inserted: u64,
}

impl BloomFilter {
    /// Creates an empty filter sized for `max_items` keys at `target_probability`.
    ///
    /// Shorthand for [`BloomFilterBuilder::with_accuracy`] followed by
    /// [`build`](BloomFilterBuilder::build).
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomset::bloom::BloomFilter;
    /// let mut filter = BloomFilter::new(1000, 0.001).unwrap();
    /// filter.add("abc");
    /// assert!(filter.contains("abc"));
    /// ```
    pub fn new(max_items: u64, target_probability: f64) -> Result<Self, Error> {
        BloomFilterBuilder::with_accuracy(max_items, target_probability).build()
    }

    /// Adds a key to the filter.
    ///
    /// After this call `contains(key)` always returns `true`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomset::bloom::BloomFilter;
    /// let mut filter = BloomFilter::new(100, 0.01).unwrap();
    ///
    /// filter.add("apple");
    /// filter.add(String::from("banana"));
    /// filter.add([0xde, 0xad, 0xbe, 0xef]);
    ///
    /// assert!(filter.contains("apple"));
    /// assert_eq!(filter.num_inserted(), 3);
    /// ```
    pub fn add(&mut self, key: impl AsRef<[u8]>) {
        let (hash_a, hash_b) = base_hashes(key.as_ref());
        self.set_bits(hash_a, hash_b);
        self.num_inserted = self.num_inserted.saturating_add(1);
    }

    /// Tests whether a key is possibly in the set.
    ///
    /// Returns:
    /// - `true`: Key was **possibly** added (or false positive)
    /// - `false`: Key was **definitely not** added
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomset::bloom::BloomFilter;
    /// let mut filter = BloomFilter::new(100, 0.01).unwrap();
    /// filter.add("apple");
    ///
    /// assert!(filter.contains("apple"));
    /// assert!(!filter.contains("grape"));
    /// ```
    pub fn contains(&self, key: impl AsRef<[u8]>) -> bool {
        let (hash_a, hash_b) = base_hashes(key.as_ref());
        self.check_bits(hash_a, hash_b)
    }

    /// Tests and adds a key in a single operation.
    ///
    /// Returns whether the key was possibly already in the set before it was added.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomset::bloom::BloomFilter;
    /// let mut filter = BloomFilter::new(100, 0.01).unwrap();
    ///
    /// assert!(!filter.contains_and_add("apple"));
    /// assert!(filter.contains_and_add("apple"));
    /// ```
    pub fn contains_and_add(&mut self, key: impl AsRef<[u8]>) -> bool {
        let (hash_a, hash_b) = base_hashes(key.as_ref());
        let was_present = self.check_bits(hash_a, hash_b);
        self.set_bits(hash_a, hash_b);
        self.num_inserted = self.num_inserted.saturating_add(1);
        was_present
    }

    /// Returns a snapshot of the filter's parameters.
    pub fn settings(&self) -> FilterSettings {
        FilterSettings {
            max_items: self.max_items,
            size_in_bits: self.bits.num_bits(),
            bits_per_block: BITS_PER_BLOCK as u64,
            num_blocks: self.bits.num_blocks() as u64,
            hash_rounds: self.hash_rounds,
            num_inserted: self.num_inserted,
        }
    }

    /// Returns the number of addressable bits.
    pub fn size_in_bits(&self) -> u64 {
        self.bits.num_bits()
    }

    /// Returns the number of bit positions touched per key.
    pub fn hash_rounds(&self) -> u64 {
        self.hash_rounds
    }

    /// Returns the capacity the filter was sized for.
    pub fn max_items(&self) -> u64 {
        self.max_items
    }

    /// Returns the number of `add` calls so far, duplicates included.
    pub fn num_inserted(&self) -> u64 {
        self.num_inserted
    }

    /// Returns the packed storage blocks.
    pub fn blocks(&self) -> &[u8] {
        self.bits.as_blocks()
    }

    /// Returns whether no bit is set.
    pub fn is_empty(&self) -> bool {
        self.bits_used() == 0
    }

    /// Returns the number of bits set to 1.
    ///
    /// Useful for monitoring filter saturation.
    pub fn bits_used(&self) -> u64 {
        self.bits.count_ones()
    }

    /// Returns the current load factor (fraction of bits set).
    ///
    /// Values near 0.5 indicate the filter is approaching its designed capacity.
    pub fn load_factor(&self) -> f64 {
        self.bits_used() as f64 / self.size_in_bits() as f64
    }

    /// Estimates the current false positive probability.
    ///
    /// Uses the approximation `load_factor ^ hash_rounds`, which assumes uniformly distributed
    /// bits.
    pub fn estimated_fpp(&self) -> f64 {
        self.load_factor().powf(self.hash_rounds as f64)
    }

    /// Serializes the filter in the versioned format.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomset::bloom::BloomFilter;
    /// let mut filter = BloomFilter::new(100, 0.01).unwrap();
    /// filter.add("test");
    ///
    /// let bytes = filter.serialize();
    /// let restored = BloomFilter::deserialize(&bytes, None).unwrap();
    /// assert_eq!(filter, restored);
    /// ```
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.bits.num_blocks());
        self.write_to(&mut bytes)
            .expect("writing to a Vec never fails");
        bytes
    }

    /// Writes the filter in the versioned format to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an [`Io`](crate::error::ErrorKind::Io) error if the writer fails.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), Error> {
        let mut writer = FilterWriter::new(writer);
        let header = Header {
            version_minor: VERSION_MINOR,
            size_in_bits: self.size_in_bits(),
            max_items: self.max_items,
            hash_rounds: self.hash_rounds,
            num_inserted: self.num_inserted,
        };
        header.write(&mut writer)?;
        writer.write(self.bits.as_blocks(), "blocks")?;
        writer.flush()?;

        tracing::debug!(bytes = writer.written(), "serialized bloom filter");
        Ok(())
    }

    /// Writes the filter in the versioned format to the file at `path`, replacing its contents.
    ///
    /// # Errors
    ///
    /// Returns an [`Io`](crate::error::ErrorKind::Io) error if the file cannot be created or
    /// written.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|err| Error::from(err).with_context("path", path.display()))?;
        self.write_to(BufWriter::new(file))
            .map_err(|err| err.with_context("path", path.display()))
    }

    /// Deserializes a filter from bytes in either the versioned or the legacy format.
    ///
    /// `max_items` is required for legacy data, which carries no capacity. For versioned data it
    /// may be omitted; when given and different from the stored capacity, the stored one is used.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The data is truncated or its header is malformed: a bit count of 0 or above
    ///   [`MAX_NUM_BITS`](super::MAX_NUM_BITS), a capacity of 0, or a hash round count of 0 or
    ///   above [`MAX_HASH_ROUNDS`](super::MAX_HASH_ROUNDS)
    /// - The major version is unsupported
    /// - The data is in the legacy format and `max_items` is missing or 0
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomset::bloom::BloomFilter;
    /// // A legacy file: 9 bits, little-endian, then two blocks.
    /// let legacy = [9, 0, 0, 0, 0b1000_0001, 0b1];
    /// let filter = BloomFilter::deserialize(&legacy, Some(2)).unwrap();
    /// assert_eq!(filter.size_in_bits(), 9);
    /// assert_eq!(filter.bits_used(), 3);
    /// ```
    pub fn deserialize(bytes: &[u8], max_items: Option<u64>) -> Result<Self, Error> {
        Self::read_from(bytes, max_items)
    }

    /// Reads a filter in either the versioned or the legacy format from `reader`.
    ///
    /// Exactly the header and the blocks are consumed; any data following them is left unread.
    /// See [`deserialize()`](Self::deserialize) for the meaning of `max_items`.
    pub fn read_from<R: Read>(reader: R, max_items: Option<u64>) -> Result<Self, Error> {
        check_block_width()?;

        let mut reader = FilterReader::new(reader);
        let prefix = reader.read_array("magic")?;
        let (size_in_bits, max_items, hash_rounds, num_inserted) =
            match Format::from_prefix(prefix) {
                Format::Versioned => Self::read_versioned_header(&mut reader, max_items)?,
                Format::Legacy => Self::legacy_parameters(LE::read_u32(&prefix), max_items)?,
            };

        let num_blocks = bit_array::num_blocks(size_in_bits);
        let blocks = reader.read_bytes(num_blocks, "blocks")?;

        Ok(BloomFilter {
            max_items,
            hash_rounds,
            num_inserted,
            bits: BitArray::from_blocks(size_in_bits, blocks),
        })
    }

    /// Reads a filter from the file at `path`. See [`deserialize()`](Self::deserialize).
    pub fn from_file(path: impl AsRef<Path>, max_items: Option<u64>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|err| Error::from(err).with_context("path", path.display()))?;
        Self::read_from(BufReader::new(file), max_items)
            .map_err(|err| err.with_context("path", path.display()))
    }

    fn read_versioned_header<R: Read>(
        reader: &mut FilterReader<R>,
        max_items: Option<u64>,
    ) -> Result<(u64, u64, u64, u64), Error> {
        let header = Header::read_after_magic(reader)?;

        if header.size_in_bits == 0 || header.size_in_bits > MAX_NUM_BITS {
            return Err(Error::invalid_header(
                "size_in_bits",
                format!("bit count {} out of range", header.size_in_bits),
            ));
        }
        if header.max_items == 0 {
            return Err(Error::invalid_header("max_items", "capacity must not be 0"));
        }
        if header.hash_rounds == 0 || header.hash_rounds > MAX_HASH_ROUNDS {
            return Err(Error::invalid_header(
                "hash_rounds",
                format!("hash round count {} out of range", header.hash_rounds),
            ));
        }

        if let Some(requested) = max_items {
            if requested != header.max_items {
                tracing::warn!(
                    requested,
                    stored = header.max_items,
                    "max_items differs from the serialized filter, using the stored value"
                );
            }
        }
        let recomputed =
            BloomFilterBuilder::suggest_hash_rounds(header.size_in_bits, header.max_items)?;
        if recomputed != header.hash_rounds {
            tracing::warn!(
                recomputed,
                stored = header.hash_rounds,
                "hash_rounds differs from the value derived from the header, using the stored value"
            );
        }

        tracing::debug!(
            version_minor = header.version_minor,
            size_in_bits = header.size_in_bits,
            max_items = header.max_items,
            hash_rounds = header.hash_rounds,
            num_inserted = header.num_inserted,
            "decoding versioned bloom filter"
        );

        Ok((
            header.size_in_bits,
            header.max_items,
            header.hash_rounds,
            header.num_inserted,
        ))
    }

    fn legacy_parameters(
        size_in_bits: u32,
        max_items: Option<u64>,
    ) -> Result<(u64, u64, u64, u64), Error> {
        let size_in_bits = u64::from(size_in_bits);
        if size_in_bits == 0 {
            return Err(Error::invalid_header(
                "size_in_bits",
                "legacy filter has no bits",
            ));
        }
        let max_items = max_items.ok_or_else(|| {
            Error::invalid_configuration("max_items is required to decode a legacy filter")
        })?;
        let hash_rounds = BloomFilterBuilder::suggest_hash_rounds(size_in_bits, max_items)?;

        tracing::debug!(
            size_in_bits,
            max_items,
            hash_rounds,
            "decoding legacy bloom filter"
        );

        Ok((size_in_bits, max_items, hash_rounds, 0))
    }

    /// Checks if all bits derived from the base hashes are set.
    fn check_bits(&self, hash_a: u32, hash_b: u32) -> bool {
        bit_indices(self.size_in_bits(), self.hash_rounds, hash_a, hash_b)
            .all(|bit_index| self.bits.get(bit_index))
    }

    /// Sets all bits derived from the base hashes.
    fn set_bits(&mut self, hash_a: u32, hash_b: u32) {
        for bit_index in bit_indices(self.size_in_bits(), self.hash_rounds, hash_a, hash_b) {
            self.bits.set(bit_index);
        }
    }
}

/// Yields the bit index of every hash round for a key's base hashes.
fn bit_indices(
    size_in_bits: u64,
    hash_rounds: u64,
    hash_a: u32,
    hash_b: u32,
) -> impl Iterator<Item = u64> {
    // the round counter is 32 bits wide in the persisted hashing scheme
    (0..hash_rounds)
        .map(move |round| u64::from(double_hash(hash_a, hash_b, round as u32)) % size_in_bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bloom::serialization::MAGIC;
    use crate::error::ErrorKind;

    fn legacy_bytes(filter: &BloomFilter) -> Vec<u8> {
        let mut bytes = (filter.size_in_bits() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(filter.blocks());
        bytes
    }

    #[test]
    fn test_empty_filter_contains_nothing() {
        let filter = BloomFilter::new(1000, 0.001).unwrap();
        assert!(filter.is_empty());
        assert!(!filter.contains("abc"));
        assert_eq!(filter.num_inserted(), 0);
    }

    #[test]
    fn test_add_and_contains() {
        let mut filter = BloomFilter::new(1000, 0.001).unwrap();
        filter.add("abc");
        assert!(filter.contains("abc"));
        assert!(!filter.is_empty());
        assert_eq!(filter.num_inserted(), 1);
        assert!(filter.bits_used() <= filter.hash_rounds());
    }

    #[test]
    fn test_key_types_hash_the_same_bytes() {
        let mut filter = BloomFilter::new(100, 0.01).unwrap();
        filter.add("key");
        assert!(filter.contains(String::from("key")));
        assert!(filter.contains(b"key"));
        assert!(filter.contains(vec![b'k', b'e', b'y']));
    }

    #[test]
    fn test_contains_and_add() {
        let mut filter = BloomFilter::new(100, 0.01).unwrap();
        assert!(!filter.contains_and_add("x"));
        assert!(filter.contains_and_add("x"));
        assert_eq!(filter.num_inserted(), 2);
    }

    #[test]
    fn test_settings() {
        let mut filter = BloomFilterBuilder::with_size(17, 3).build().unwrap();
        filter.add("a");
        assert_eq!(
            filter.settings(),
            FilterSettings {
                max_items: 3,
                size_in_bits: 17,
                bits_per_block: 8,
                num_blocks: 3,
                hash_rounds: 4,
                num_inserted: 1,
            }
        );
    }

    #[test]
    fn test_statistics() {
        let mut filter = BloomFilterBuilder::with_size(1000, 100).build().unwrap();
        assert_eq!(filter.bits_used(), 0);
        assert_eq!(filter.load_factor(), 0.0);
        assert_eq!(filter.estimated_fpp(), 0.0);

        filter.add("test");
        assert!(filter.bits_used() > 0);
        assert!(filter.load_factor() > 0.0);
        assert!(filter.estimated_fpp() > 0.0);
    }

    #[test]
    fn test_serialized_size() {
        let filter = BloomFilterBuilder::with_size(17, 3).build().unwrap();
        let bytes = filter.serialize();
        assert_eq!(bytes.len(), HEADER_SIZE + 3);
        assert_eq!(&bytes[..4], &MAGIC);
    }

    #[test]
    fn test_round_trip() {
        let mut filter = BloomFilter::new(100, 0.01).unwrap();
        filter.add("test");
        filter.add("other");

        let bytes = filter.serialize();
        let restored = BloomFilter::deserialize(&bytes, None).unwrap();
        assert_eq!(filter, restored);
        assert_eq!(restored.serialize(), bytes);
    }

    #[test]
    fn test_stored_max_items_wins() {
        let filter = BloomFilter::new(100, 0.01).unwrap();
        let restored = BloomFilter::deserialize(&filter.serialize(), Some(5000)).unwrap();
        assert_eq!(restored.max_items(), 100);
        assert_eq!(restored.hash_rounds(), filter.hash_rounds());
    }

    #[test]
    fn test_stored_hash_rounds_win() {
        let filter = BloomFilter::new(100, 0.01).unwrap();
        let mut bytes = filter.serialize();
        bytes[28..36].copy_from_slice(&3u64.to_be_bytes());
        let restored = BloomFilter::deserialize(&bytes, None).unwrap();
        assert_eq!(restored.hash_rounds(), 3);
    }

    #[test]
    fn test_legacy_round_trip() {
        let mut filter = BloomFilter::new(100, 0.01).unwrap();
        filter.add("legacy");

        let restored = BloomFilter::deserialize(&legacy_bytes(&filter), Some(100)).unwrap();
        assert_eq!(restored.size_in_bits(), filter.size_in_bits());
        assert_eq!(restored.hash_rounds(), filter.hash_rounds());
        assert_eq!(restored.num_inserted(), 0);
        assert_eq!(restored.blocks(), filter.blocks());
        assert!(restored.contains("legacy"));
    }

    #[test]
    fn test_legacy_requires_max_items() {
        let filter = BloomFilter::new(100, 0.01).unwrap();
        let err = BloomFilter::deserialize(&legacy_bytes(&filter), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);

        let err = BloomFilter::deserialize(&legacy_bytes(&filter), Some(0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_legacy_zero_bits_is_invalid() {
        let err = BloomFilter::deserialize(&[0, 0, 0, 0], Some(10)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_truncated_blocks() {
        let filter = BloomFilter::new(100, 0.01).unwrap();
        let bytes = filter.serialize();
        let err = BloomFilter::deserialize(&bytes[..bytes.len() - 1], None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert_eq!(err.message(), "insufficient data: blocks");

        let err = BloomFilter::deserialize(&bytes[..2], None).unwrap_err();
        assert_eq!(err.message(), "insufficient data: magic");
    }

    #[test]
    fn test_malformed_header_fields() {
        let bytes = BloomFilter::new(100, 0.01).unwrap().serialize();
        for (offset, field) in [(12, "size_in_bits"), (20, "max_items"), (28, "hash_rounds")] {
            let mut corrupt = bytes.clone();
            corrupt[offset..offset + 8].fill(0);
            let err = BloomFilter::deserialize(&corrupt, None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidData, "{field}");
            assert!(err.to_string().contains(field), "{err}");
        }
    }

    #[test]
    fn test_hash_rounds_above_cap_are_malformed() {
        let filter = BloomFilter::new(100, 0.01).unwrap();
        let mut bytes = filter.serialize();

        bytes[28..36].copy_from_slice(&MAX_HASH_ROUNDS.to_be_bytes());
        let restored = BloomFilter::deserialize(&bytes, None).unwrap();
        assert_eq!(restored.hash_rounds(), MAX_HASH_ROUNDS);

        bytes[28..36].copy_from_slice(&(MAX_HASH_ROUNDS + 1).to_be_bytes());
        let err = BloomFilter::deserialize(&bytes, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert!(err.to_string().contains("field: hash_rounds"), "{err}");
    }

    #[test]
    fn test_huge_size_fails_without_allocating() {
        let mut bytes = BloomFilter::new(100, 0.01).unwrap().serialize();
        bytes[12..20].copy_from_slice(&(1u64 << 40).to_be_bytes());
        let err = BloomFilter::deserialize(&bytes, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_trailing_data_is_left_unread() {
        let filter = BloomFilter::new(10, 0.1).unwrap();
        let mut bytes = filter.serialize();
        let len = bytes.len();
        bytes.extend_from_slice(b"trailer");

        let mut reader = &bytes[..];
        let restored = BloomFilter::read_from(&mut reader, None).unwrap();
        assert_eq!(restored, filter);
        assert_eq!(reader, b"trailer");
        assert_eq!(bytes.len() - reader.len(), len);
    }
}
