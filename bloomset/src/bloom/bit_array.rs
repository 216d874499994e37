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

use super::serialization::BITS_PER_BLOCK;
use super::serialization::Block;

/// Fixed-length bit array packed LSB-first into byte blocks.
///
/// Bit `j` of block `i` is bit `i * 8 + j` of the array. Bits past `num_bits` in the last block
/// are never addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct BitArray {
    num_bits: u64,
    blocks: Box<[Block]>,
}

/// Number of blocks needed to hold `num_bits` bits.
pub(super) fn num_blocks(num_bits: u64) -> u64 {
    num_bits.div_ceil(BITS_PER_BLOCK as u64)
}

impl BitArray {
    /// Creates an array with every bit clear.
    ///
    /// Returns `None` when the block count does not fit in memory addressing.
    pub fn zeroed(num_bits: u64) -> Option<Self> {
        let len = usize::try_from(num_blocks(num_bits)).ok()?;
        Some(BitArray {
            num_bits,
            blocks: vec![0; len].into_boxed_slice(),
        })
    }

    /// Wraps blocks read from a serialized filter.
    ///
    /// # Panics
    ///
    /// Panics if `blocks` does not hold exactly `ceil(num_bits / 8)` blocks.
    pub fn from_blocks(num_bits: u64, blocks: Vec<Block>) -> Self {
        assert_eq!(
            blocks.len() as u64,
            num_blocks(num_bits),
            "block count does not match bit count"
        );
        BitArray {
            num_bits,
            blocks: blocks.into_boxed_slice(),
        }
    }

    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn as_blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Gets the value of a single bit.
    pub fn get(&self, bit_index: u64) -> bool {
        debug_assert!(bit_index < self.num_bits);
        let (block, mask) = locate(bit_index);
        (self.blocks[block] & mask) != 0
    }

    /// Sets a single bit.
    pub fn set(&mut self, bit_index: u64) {
        debug_assert!(bit_index < self.num_bits);
        let (block, mask) = locate(bit_index);
        self.blocks[block] |= mask;
    }

    /// Counts the set bits below `num_bits`.
    pub fn count_ones(&self) -> u64 {
        let total: u64 = self.blocks.iter().map(|b| u64::from(b.count_ones())).sum();
        let tail_bits = (self.num_bits % BITS_PER_BLOCK as u64) as u32;
        match (tail_bits, self.blocks.last()) {
            (0, _) | (_, None) => total,
            (tail_bits, Some(&last)) => {
                let unused = last & !((1 << tail_bits) - 1);
                total - u64::from(unused.count_ones())
            }
        }
    }
}

/// Splits a bit index into its block index and the single-bit mask within that block.
fn locate(bit_index: u64) -> (usize, Block) {
    let block = (bit_index / BITS_PER_BLOCK as u64) as usize;
    let offset = bit_index % BITS_PER_BLOCK as u64;
    (block, 1 << offset)
}
