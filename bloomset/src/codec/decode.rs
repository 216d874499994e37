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

use std::io::Read;

use byteorder::BE;
use byteorder::ReadBytesExt;

use crate::error::Error;

/// A wrapper around a reader that decodes the fields of a serialized filter.
///
/// Every read names the field being decoded so that a short stream is reported as
/// "insufficient data: <field>".
pub(crate) struct FilterReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> FilterReader<R> {
    /// Creates a new `FilterReader` positioned at the start of `inner`.
    pub fn new(inner: R) -> Self {
        FilterReader { inner, position: 0 }
    }

    /// Returns the number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Reads exactly `buf.len()` bytes into `buf`.
    pub fn read_exact(&mut self, buf: &mut [u8], field: &'static str) -> Result<(), Error> {
        self.inner
            .read_exact(buf)
            .map_err(Error::read_failed(field))?;
        self.position += buf.len() as u64;
        Ok(())
    }

    /// Reads a fixed-size byte array.
    pub fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], Error> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf, field)?;
        Ok(buf)
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, Error> {
        let n = self.inner.read_u8().map_err(Error::read_failed(field))?;
        self.position += 1;
        Ok(n)
    }

    /// Reads a 64-bit unsigned integer in big-endian (network) byte order.
    pub fn read_u64_be(&mut self, field: &'static str) -> Result<u64, Error> {
        let n = self
            .inner
            .read_u64::<BE>()
            .map_err(Error::read_failed(field))?;
        self.position += 8;
        Ok(n)
    }

    /// Skips `n` reserved bytes.
    pub fn skip(&mut self, n: u64, field: &'static str) -> Result<(), Error> {
        let skipped = std::io::copy(&mut (&mut self.inner).take(n), &mut std::io::sink())
            .map_err(Error::read_failed(field))?;
        self.position += skipped;
        if skipped < n {
            return Err(Error::insufficient_data(field));
        }
        Ok(())
    }

    /// Reads exactly `len` bytes into a new buffer.
    ///
    /// The buffer grows as data arrives instead of being allocated up front, so a corrupted length
    /// cannot force a huge allocation before the stream runs dry.
    pub fn read_bytes(&mut self, len: u64, field: &'static str) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        let read = (&mut self.inner)
            .take(len)
            .read_to_end(&mut buf)
            .map_err(Error::read_failed(field))?;
        self.position += read as u64;
        if (read as u64) < len {
            return Err(Error::insufficient_data(field)
                .with_context("expected", len)
                .with_context("actual", read));
        }
        Ok(buf)
    }
}
