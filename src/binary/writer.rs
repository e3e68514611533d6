//! Writer mirroring [`BinaryReader`](super::BinaryReader).

use std::io::Write;

use encoding_rs::Encoding;

use super::{
    BLOCK_LENGTH_MASK, BinaryError, BinaryResult, BufferPool, FONT_NAME_MAX_CHARS, FONT_NAME_SIZE,
};
use crate::coord::{Coord, CoordPoint};
use crate::encoding;

/// Little-endian writer. Block lengths are always written with a zero flag
/// byte.
#[derive(Debug)]
pub struct BinaryWriter<W> {
    inner: W,
    pos: u64,
}

impl<W: Write> BinaryWriter<W> {
    #[inline]
    pub fn new(inner: W) -> Self {
        Self { inner, pos: 0 }
    }

    /// Bytes written so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    #[inline]
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    #[inline]
    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> BinaryResult<()> {
        self.inner.write_all(bytes)?;
        self.pos += bytes.len() as u64;
        Ok(())
    }

    #[inline]
    pub fn write_u8(&mut self, v: u8) -> BinaryResult<()> {
        self.write_bytes(&[v])
    }

    #[inline]
    pub fn write_bool(&mut self, v: bool) -> BinaryResult<()> {
        self.write_u8(u8::from(v))
    }

    #[inline]
    pub fn write_i16(&mut self, v: i16) -> BinaryResult<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    #[inline]
    pub fn write_u16(&mut self, v: u16) -> BinaryResult<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    #[inline]
    pub fn write_i32(&mut self, v: i32) -> BinaryResult<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    #[inline]
    pub fn write_u32(&mut self, v: u32) -> BinaryResult<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    #[inline]
    pub fn write_f64(&mut self, v: f64) -> BinaryResult<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    #[inline]
    pub fn write_coord(&mut self, v: Coord) -> BinaryResult<()> {
        self.write_i32(v.raw())
    }

    #[inline]
    pub fn write_coord_point(&mut self, v: CoordPoint) -> BinaryResult<()> {
        self.write_coord(v.x)?;
        self.write_coord(v.y)
    }

    /// Write `count` copies of `byte`. A count of zero writes nothing.
    pub fn write_fill(&mut self, byte: u8, count: usize) -> BinaryResult<()> {
        const CHUNK: usize = 64;
        let run = [byte; CHUNK];
        let mut left = count;
        while left > 0 {
            let n = left.min(CHUNK);
            self.write_bytes(&run[..n])?;
            left -= n;
        }
        Ok(())
    }

    /// Write a length-prefixed block.
    pub fn write_block(&mut self, data: &[u8]) -> BinaryResult<()> {
        if data.len() > BLOCK_LENGTH_MASK as usize {
            return Err(BinaryError::BlockTooLarge {
                length: data.len(),
                max: BLOCK_LENGTH_MASK as usize,
            });
        }
        self.write_u32(data.len() as u32)?;
        self.write_bytes(data)
    }

    /// Build a block body in a pooled scratch buffer, then frame it.
    ///
    /// Nothing reaches the underlying writer if `body` fails, and the
    /// scratch buffer goes back to the pool on every path.
    pub fn write_block_with<F>(&mut self, pool: &BufferPool, body: F) -> BinaryResult<()>
    where
        F: FnOnce(&mut BinaryWriter<&mut Vec<u8>>) -> BinaryResult<()>,
    {
        let mut scratch = pool.acquire();
        body(&mut BinaryWriter::new(&mut *scratch))?;
        self.write_block(&scratch)
    }

    /// A 1-byte length followed by the encoded text.
    ///
    /// Characters the codepage cannot represent are replaced.
    pub fn write_pascal_string(&mut self, text: &str, encoding: &'static Encoding) -> BinaryResult<()> {
        let bytes = encoding::encode_lossy(text, encoding);
        if bytes.len() > u8::MAX as usize {
            return Err(BinaryError::StringTooLong { length: bytes.len() });
        }
        self.write_u8(bytes.len() as u8)?;
        self.write_bytes(&bytes)
    }

    /// A block whose payload is a Pascal string.
    pub fn write_string_block(&mut self, text: &str, encoding: &'static Encoding) -> BinaryResult<()> {
        let bytes = encoding::encode_lossy(text, encoding);
        if bytes.len() > u8::MAX as usize {
            return Err(BinaryError::StringTooLong { length: bytes.len() });
        }
        self.write_u32(bytes.len() as u32 + 1)?;
        self.write_u8(bytes.len() as u8)?;
        self.write_bytes(&bytes)
    }

    /// A fixed 64-byte UTF-16LE font name, truncated to 31 characters and
    /// NUL padded.
    pub fn write_font_name(&mut self, name: &str) -> BinaryResult<()> {
        let mut field = [0u8; FONT_NAME_SIZE];
        let mut units = 0;
        for ch in name.chars().take(FONT_NAME_MAX_CHARS) {
            let mut pair = [0u16; 2];
            let encoded = ch.encode_utf16(&mut pair);
            if units + encoded.len() > FONT_NAME_MAX_CHARS {
                break;
            }
            for unit in encoded.iter() {
                field[units * 2..units * 2 + 2].copy_from_slice(&unit.to_le_bytes());
                units += 1;
            }
        }
        self.write_bytes(&field)
    }

    /// A block holding parameter text followed by one NUL terminator.
    pub fn write_parameter_block(&mut self, text: &[u8]) -> BinaryResult<()> {
        let length = text.len() + 1;
        if length > BLOCK_LENGTH_MASK as usize {
            return Err(BinaryError::BlockTooLarge {
                length,
                max: BLOCK_LENGTH_MASK as usize,
            });
        }
        self.write_u32(length as u32)?;
        self.write_bytes(text)?;
        self.write_u8(0)
    }

    pub fn flush(&mut self) -> BinaryResult<()> {
        self.inner.flush()?;
        Ok(())
    }
}
