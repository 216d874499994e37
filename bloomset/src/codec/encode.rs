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

use std::io::Write;

use byteorder::BE;
use byteorder::WriteBytesExt;

use crate::error::Error;

/// A wrapper around a writer that encodes the fields of a serialized filter.
pub(crate) struct FilterWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> FilterWriter<W> {
    /// Creates a new `FilterWriter` on top of `inner`.
    pub fn new(inner: W) -> Self {
        FilterWriter { inner, written: 0 }
    }

    /// Returns the number of bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Writes the given bytes verbatim.
    pub fn write(&mut self, buf: &[u8], field: &'static str) -> Result<(), Error> {
        self.inner
            .write_all(buf)
            .map_err(Error::write_failed(field))?;
        self.written += buf.len() as u64;
        Ok(())
    }

    /// Writes a single byte.
    pub fn write_u8(&mut self, n: u8, field: &'static str) -> Result<(), Error> {
        self.inner.write_u8(n).map_err(Error::write_failed(field))?;
        self.written += 1;
        Ok(())
    }

    /// Writes a 64-bit unsigned integer in big-endian (network) byte order.
    pub fn write_u64_be(&mut self, n: u64, field: &'static str) -> Result<(), Error> {
        self.inner
            .write_u64::<BE>(n)
            .map_err(Error::write_failed(field))?;
        self.written += 8;
        Ok(())
    }

    /// Writes `n` zero bytes of reserved padding.
    pub fn write_zeros(&mut self, n: usize, field: &'static str) -> Result<(), Error> {
        const ZEROS: [u8; 32] = [0; 32];
        let mut remaining = n;
        while remaining > 0 {
            let chunk = remaining.min(ZEROS.len());
            self.write(&ZEROS[..chunk], field)?;
            remaining -= chunk;
        }
        Ok(())
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> Result<(), Error> {
        self.inner.flush().map_err(Error::write_failed("flush"))
    }
}
