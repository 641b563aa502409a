// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read/write cursors for envelope bytes.
//!
//! All integers are little-endian. Strings and byte blobs carry a `u32`
//! length prefix.

use crate::error::{Result, SerializationError};

/// Generate write methods for primitive types.
macro_rules! impl_write_le {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) {
            self.buffer.extend_from_slice(&value.to_le_bytes());
        }
    };
}

/// Generate read methods for primitive types.
///
/// Each generated method checks bounds, converts from little-endian and
/// advances the offset.
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> Result<$type> {
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(self.read_bytes($size)?);
            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

/// Growable writer.
#[derive(Debug, Default)]
pub struct WireWriter {
    buffer: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    impl_write_le!(write_i8, i8);
    impl_write_le!(write_u16_le, u16);
    impl_write_le!(write_i16_le, i16);
    impl_write_le!(write_u32_le, u32);
    impl_write_le!(write_i32_le, i32);
    impl_write_le!(write_u64_le, u64);
    impl_write_le!(write_i64_le, i64);
    impl_write_le!(write_f32_le, f32);
    impl_write_le!(write_f64_le, f64);

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Write a length (collection count, blob size) as `u32`.
    pub fn write_len(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len).map_err(|_| {
            SerializationError::NotSerializable(format!("length {} exceeds u32::MAX", len))
        })?;
        self.write_u32_le(len);
        Ok(())
    }

    /// Length-prefixed byte blob.
    pub fn write_blob(&mut self, data: &[u8]) -> Result<()> {
        self.write_len(data.len())?;
        self.write_bytes(data);
        Ok(())
    }

    /// Length-prefixed UTF-8 string.
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_blob(s.as_bytes())
    }
}

/// Bounds-checked reader.
#[derive(Debug)]
pub struct WireReader<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(SerializationError::InvalidEnvelope(format!(
                "unexpected end of buffer at offset {}: need {} bytes, have {}",
                self.offset,
                count,
                self.remaining()
            )));
        }
        let slice = &self.buffer[self.offset..self.offset + count];
        self.offset += count;
        Ok(slice)
    }

    impl_read_le!(read_u8, u8, 1);
    impl_read_le!(read_i8, i8, 1);
    impl_read_le!(read_u16_le, u16, 2);
    impl_read_le!(read_i16_le, i16, 2);
    impl_read_le!(read_u32_le, u32, 4);
    impl_read_le!(read_i32_le, i32, 4);
    impl_read_le!(read_u64_le, u64, 8);
    impl_read_le!(read_i64_le, i64, 8);
    impl_read_le!(read_f32_le, f32, 4);
    impl_read_le!(read_f64_le, f64, 8);

    /// Read a `u32` length, rejecting values larger than what is left.
    ///
    /// `min_item_size` is the smallest encoding of one counted item, so a
    /// forged count cannot trigger a huge allocation.
    pub fn read_len(&mut self, min_item_size: usize) -> Result<usize> {
        let len = self.read_u32_le()? as usize;
        if len.saturating_mul(min_item_size.max(1)) > self.remaining() {
            return Err(SerializationError::InvalidEnvelope(format!(
                "length {} at offset {} exceeds remaining {} bytes",
                len,
                self.offset,
                self.remaining()
            )));
        }
        Ok(len)
    }

    pub fn read_blob(&mut self) -> Result<&'a [u8]> {
        let len = self.read_len(1)?;
        self.read_bytes(len)
    }

    pub fn read_string(&mut self) -> Result<String> {
        Ok(String::from_utf8(self.read_blob()?.to_vec())?)
    }
}
