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

use std::f64::consts::LN_2;

use super::BloomFilter;
use super::bit_array::BitArray;
use super::serialization::check_block_width;
use crate::error::Error;

/// Smallest bit count a filter can have.
pub const MIN_NUM_BITS: u64 = 1;
/// Largest bit count a filter can have.
pub const MAX_NUM_BITS: u64 = isize::MAX as u64;
/// Smallest number of hash rounds.
pub const MIN_HASH_ROUNDS: u64 = 1;
/// Largest number of hash rounds.
pub const MAX_HASH_ROUNDS: u64 = i16::MAX as u64;

/// Builder for creating [`BloomFilter`] instances.
///
/// Provides two construction modes:
/// - [`with_accuracy()`](Self::with_accuracy): Specify target items and false positive rate
///   (recommended)
/// - [`with_size()`](Self::with_size): Specify the exact bit count
///
/// Parameters are validated by [`build()`](Self::build), before anything is allocated.
#[derive(Debug, Clone)]
pub struct BloomFilterBuilder {
    max_items: u64,
    sizing: Sizing,
}

#[derive(Debug, Clone, Copy)]
enum Sizing {
    Accuracy { target_probability: f64 },
    Bits { size_in_bits: u64 },
}

impl BloomFilterBuilder {
    /// Creates a builder sized for a target accuracy.
    ///
    /// # Arguments
    ///
    /// - `max_items`: Number of items the filter is designed to hold
    /// - `target_probability`: False positive probability once `max_items` items were added, in
    ///   the open interval (0, 1)
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomset::bloom::BloomFilterBuilder;
    /// let filter = BloomFilterBuilder::with_accuracy(1000, 0.001).build().unwrap();
    /// assert_eq!(filter.size_in_bits(), 14378);
    /// assert_eq!(filter.hash_rounds(), 10);
    /// ```
    pub fn with_accuracy(max_items: u64, target_probability: f64) -> Self {
        BloomFilterBuilder {
            max_items,
            sizing: Sizing::Accuracy { target_probability },
        }
    }

    /// Creates a builder for a filter of exactly `size_in_bits` bits.
    ///
    /// Hash rounds are derived from `size_in_bits` and `max_items` just like for
    /// [`with_accuracy()`](Self::with_accuracy).
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomset::bloom::BloomFilterBuilder;
    /// let filter = BloomFilterBuilder::with_size(17, 3).build().unwrap();
    /// assert_eq!(filter.settings().num_blocks, 3);
    /// assert_eq!(filter.hash_rounds(), 4);
    /// ```
    pub fn with_size(size_in_bits: u64, max_items: u64) -> Self {
        BloomFilterBuilder {
            max_items,
            sizing: Sizing::Bits { size_in_bits },
        }
    }

    /// Builds the Bloom filter.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidConfiguration`](crate::error::ErrorKind::InvalidConfiguration) error
    /// if `max_items` is 0, the target probability is not in (0, 1), or the bit count is out of
    /// range.
    pub fn build(self) -> Result<BloomFilter, Error> {
        check_block_width()?;

        let size_in_bits = match self.sizing {
            Sizing::Accuracy { target_probability } => {
                Self::suggest_num_bits(self.max_items, target_probability)?
            }
            Sizing::Bits { size_in_bits } => {
                check_num_bits(size_in_bits)?;
                size_in_bits
            }
        };
        let hash_rounds = Self::suggest_hash_rounds(size_in_bits, self.max_items)?;
        let bits = BitArray::zeroed(size_in_bits).ok_or_else(|| {
            Error::invalid_configuration("filter does not fit in memory")
                .with_context("size_in_bits", size_in_bits)
        })?;

        tracing::debug!(
            max_items = self.max_items,
            size_in_bits,
            hash_rounds,
            "built empty bloom filter"
        );

        Ok(BloomFilter {
            max_items: self.max_items,
            hash_rounds,
            num_inserted: 0,
            bits,
        })
    }

    /// Suggests the number of bits for `max_items` items at `target_probability`.
    ///
    /// Formula: `m = ceil(n * ln(p) / ln(1 / 2^ln(2)))`
    /// where n = max_items, p = target_probability
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidConfiguration`](crate::error::ErrorKind::InvalidConfiguration) error
    /// if `max_items` is 0 or `target_probability` is not in (0, 1).
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomset::bloom::BloomFilterBuilder;
    /// assert_eq!(BloomFilterBuilder::suggest_num_bits(1000, 0.01).unwrap(), 9586);
    /// assert!(BloomFilterBuilder::suggest_num_bits(0, 0.01).is_err());
    /// assert!(BloomFilterBuilder::suggest_num_bits(1000, 1.0).is_err());
    /// ```
    pub fn suggest_num_bits(max_items: u64, target_probability: f64) -> Result<u64, Error> {
        check_max_items(max_items)?;
        if !(target_probability > 0.0 && target_probability < 1.0) {
            return Err(Error::invalid_configuration(
                "target_probability must be between 0.0 and 1.0 (exclusive)",
            )
            .with_context("target_probability", target_probability));
        }

        // ln(1 / 2^ln(2)) == -ln(2)^2, folded the same way as existing filter files were sized
        let denominator = (1.0 / 2.0f64.powf(LN_2)).ln();
        let bits = (max_items as f64 * target_probability.ln() / denominator).ceil();
        if bits > MAX_NUM_BITS as f64 {
            return Err(
                Error::invalid_configuration("filter would exceed the maximum bit count")
                    .with_context("max_items", max_items)
                    .with_context("target_probability", target_probability),
            );
        }

        Ok((bits as u64).max(MIN_NUM_BITS))
    }

    /// Suggests the number of hash rounds for a filter of `size_in_bits` bits holding
    /// `max_items` items.
    ///
    /// Formula: `k = round(ln(2) * m / n)`, clamped to at least 1
    /// where m = size_in_bits, n = max_items
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidConfiguration`](crate::error::ErrorKind::InvalidConfiguration) error
    /// if `max_items` is 0.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomset::bloom::BloomFilterBuilder;
    /// assert_eq!(BloomFilterBuilder::suggest_hash_rounds(9586, 1000).unwrap(), 7);
    /// assert_eq!(BloomFilterBuilder::suggest_hash_rounds(10, 1000).unwrap(), 1);
    /// ```
    pub fn suggest_hash_rounds(size_in_bits: u64, max_items: u64) -> Result<u64, Error> {
        check_max_items(max_items)?;
        let k = (LN_2 * size_in_bits as f64 / max_items as f64).round();
        Ok(k.clamp(MIN_HASH_ROUNDS as f64, MAX_HASH_ROUNDS as f64) as u64)
    }
}

fn check_max_items(max_items: u64) -> Result<(), Error> {
    if max_items == 0 {
        return Err(Error::invalid_configuration(
            "max_items must be greater than 0",
        ));
    }
    Ok(())
}

fn check_num_bits(size_in_bits: u64) -> Result<(), Error> {
    if !(MIN_NUM_BITS..=MAX_NUM_BITS).contains(&size_in_bits) {
        return Err(Error::invalid_configuration(format!(
            "size_in_bits must be between {MIN_NUM_BITS} and {MAX_NUM_BITS}"
        ))
        .with_context("size_in_bits", size_in_bits));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_reference_sizes() {
        assert_eq!(BloomFilterBuilder::suggest_num_bits(1000, 0.001).unwrap(), 14378);
        assert_eq!(BloomFilterBuilder::suggest_num_bits(10_000, 0.01).unwrap(), 95851);
        assert_eq!(BloomFilterBuilder::suggest_num_bits(50_000, 0.01).unwrap(), 479253);
        assert_eq!(BloomFilterBuilder::suggest_hash_rounds(14378, 1000).unwrap(), 10);
        assert_eq!(BloomFilterBuilder::suggest_hash_rounds(95851, 10_000).unwrap(), 7);
    }

    #[test]
    fn test_rounds_never_zero() {
        // p close to 1 gives fewer bits than items
        let bits = BloomFilterBuilder::suggest_num_bits(1000, 0.9).unwrap();
        assert!(bits < 1000);
        assert_eq!(BloomFilterBuilder::suggest_hash_rounds(bits, 1000).unwrap(), 1);
    }

    #[test]
    fn test_tiny_filter_has_one_bit() {
        let filter = BloomFilterBuilder::with_accuracy(1, 0.99).build().unwrap();
        assert_eq!(filter.size_in_bits(), 1);
        assert_eq!(filter.hash_rounds(), 1);
    }

    #[test]
    fn test_rejects_zero_items() {
        let err = BloomFilterBuilder::with_accuracy(0, 0.01).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        assert_eq!(err.message(), "max_items must be greater than 0");

        let err = BloomFilterBuilder::with_size(64, 0).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_rejects_out_of_range_probability() {
        for p in [0.0, 1.0, -0.5, 1.5, f64::NAN, f64::INFINITY] {
            let err = BloomFilterBuilder::with_accuracy(100, p).build().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidConfiguration, "p = {p}");
        }
    }

    #[test]
    fn test_rejects_zero_bits() {
        let err = BloomFilterBuilder::with_size(0, 10).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_rejects_oversized_filter() {
        let err = BloomFilterBuilder::with_accuracy(u64::MAX, 1e-300)
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_rounds_are_capped() {
        assert_eq!(
            BloomFilterBuilder::suggest_hash_rounds(u64::MAX, 1).unwrap(),
            MAX_HASH_ROUNDS
        );
    }
}
