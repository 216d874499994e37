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

//! On-disk layout of a serialized filter.
//!
//! Versioned format, header integers in big-endian:
//!
//! ```text
//! offset  size  field
//!      0     4  magic            BF AA FE ED
//!      4     1  version_major    1
//!      5     1  version_minor    0
//!      6     6  padding
//!     12     8  size_in_bits
//!     20     8  max_items
//!     28     8  hash_rounds
//!     36     8  num_inserted
//!     44    20  padding
//!     64     *  blocks           ceil(size_in_bits / 8) raw bytes
//! ```
//!
//! Legacy format: a little-endian `u32` bit count followed directly by the blocks. Any prefix
//! other than the magic is read as a legacy bit count, so a legacy file whose bit count happens
//! to encode as `BF AA FE ED` cannot be told apart from a versioned one.

use std::io::Read;
use std::io::Write;

use crate::codec::FilterReader;
use crate::codec::FilterWriter;
use crate::error::Error;

/// The storage unit bits are packed into.
pub type Block = u8;

/// Number of filter bits held by one [`Block`].
pub const BITS_PER_BLOCK: usize = 8;

const _: () = assert!(Block::BITS as usize == BITS_PER_BLOCK);

/// Marker opening every versioned file.
pub const MAGIC: [u8; 4] = [0xBF, 0xAA, 0xFE, 0xED];
/// Major version written by this crate. Files with any other major version are rejected.
pub const VERSION_MAJOR: u8 = 1;
/// Minor version written by this crate.
pub const VERSION_MINOR: u8 = 0;
/// Total size of the versioned header, magic included.
pub const HEADER_SIZE: usize = 64;

pub(super) const MAGIC_SIZE: usize = MAGIC.len();
const VERSION_PADDING: usize = 6;
const TRAILING_PADDING: usize = 20;

const _: () = assert!(MAGIC_SIZE + 2 + VERSION_PADDING + 4 * 8 + TRAILING_PADDING == HEADER_SIZE);

/// The layout a serialized filter was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Header-less layout: little-endian bit count, then blocks.
    Legacy,
    /// Magic, 64-byte metadata header, then blocks.
    Versioned,
}

impl Format {
    /// Detects the format from the first four bytes of a serialized filter.
    ///
    /// Returns `None` when fewer than four bytes are given.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomset::bloom::Format;
    /// assert_eq!(Format::detect(&[0xBF, 0xAA, 0xFE, 0xED, 1]), Some(Format::Versioned));
    /// assert_eq!(Format::detect(&[17, 0, 0, 0]), Some(Format::Legacy));
    /// assert_eq!(Format::detect(&[0xBF]), None);
    /// ```
    pub fn detect(bytes: &[u8]) -> Option<Format> {
        let prefix: [u8; MAGIC_SIZE] = bytes.get(..MAGIC_SIZE)?.try_into().ok()?;
        Some(Self::from_prefix(prefix))
    }

    pub(super) fn from_prefix(prefix: [u8; MAGIC_SIZE]) -> Format {
        if prefix == MAGIC {
            Format::Versioned
        } else {
            Format::Legacy
        }
    }
}

/// Fails when the platform's storage unit is not the 8-bit block the format is defined in.
pub(super) fn check_block_width() -> Result<(), Error> {
    let actual = Block::BITS as usize;
    if actual != BITS_PER_BLOCK {
        return Err(Error::unsupported_environment(format!(
            "storage blocks must be {BITS_PER_BLOCK} bits wide, found {actual}"
        )));
    }
    Ok(())
}

/// Metadata carried by the versioned header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Header {
    pub version_minor: u8,
    pub size_in_bits: u64,
    pub max_items: u64,
    pub hash_rounds: u64,
    pub num_inserted: u64,
}

impl Header {
    pub fn write<W: Write>(&self, writer: &mut FilterWriter<W>) -> Result<(), Error> {
        writer.write(&MAGIC, "magic")?;
        writer.write_u8(VERSION_MAJOR, "version_major")?;
        writer.write_u8(self.version_minor, "version_minor")?;
        writer.write_zeros(VERSION_PADDING, "padding")?;
        writer.write_u64_be(self.size_in_bits, "size_in_bits")?;
        writer.write_u64_be(self.max_items, "max_items")?;
        writer.write_u64_be(self.hash_rounds, "hash_rounds")?;
        writer.write_u64_be(self.num_inserted, "num_inserted")?;
        writer.write_zeros(TRAILING_PADDING, "padding")?;
        debug_assert_eq!(writer.written(), HEADER_SIZE as u64);
        Ok(())
    }

    /// Reads the header fields following an already consumed magic.
    ///
    /// Only the version is checked here; field values are validated by the filter.
    pub fn read_after_magic<R: Read>(reader: &mut FilterReader<R>) -> Result<Header, Error> {
        let version_major = reader.read_u8("version_major")?;
        if version_major != VERSION_MAJOR {
            return Err(Error::unsupported_version(VERSION_MAJOR, version_major));
        }
        let version_minor = reader.read_u8("version_minor")?;
        reader.skip(VERSION_PADDING as u64, "padding")?;
        let size_in_bits = reader.read_u64_be("size_in_bits")?;
        let max_items = reader.read_u64_be("max_items")?;
        let hash_rounds = reader.read_u64_be("hash_rounds")?;
        let num_inserted = reader.read_u64_be("num_inserted")?;
        reader.skip(TRAILING_PADDING as u64, "padding")?;
        debug_assert_eq!(reader.position(), HEADER_SIZE as u64);

        Ok(Header {
            version_minor,
            size_in_bits,
            max_items,
            hash_rounds,
            num_inserted,
        })
    }
}
