//! Bounded read cursor over the store bytes.
//!
//! All multi-byte numeric reads are big-endian. Every read checks the
//! remaining length first, so a short buffer yields
//! [`Error::TruncatedInput`] instead of a panic from [`Buf`].

use crate::error::{Error, Result};
use bytes::Buf;

/// Read cursor over an immutable byte slice
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor at offset 0
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read
    pub fn remaining_len(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Reads `n` bytes without copying and advances past them
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Looks at the next byte as a signed tag without advancing
    pub fn peek_i8(&self) -> Result<i8> {
        self.ensure(1)?;
        Ok(self.data[self.pos] as i8)
    }

    /// Reads an unsigned byte
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?.get_u8())
    }

    /// Reads a signed byte
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?.get_i8())
    }

    /// Reads a big-endian `i16`
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.take(2)?.get_i16())
    }

    /// Reads a big-endian `u16`
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.take(2)?.get_u16())
    }

    /// Reads a big-endian `i32`
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.take(4)?.get_i32())
    }

    /// Reads a big-endian `i64`
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(self.take(8)?.get_i64())
    }

    /// Reads a big-endian IEEE-754 `f32`
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(self.take(4)?.get_f32())
    }

    /// Reads a big-endian IEEE-754 `f64`
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(self.take(8)?.get_f64())
    }

    fn ensure(&self, n: usize) -> Result<()> {
        let have = self.remaining_len();
        if n > have {
            return Err(Error::truncated(self.pos, n, have));
        }
        Ok(())
    }
}
