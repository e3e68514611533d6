//! Zero-copy reader over one decoded stream.

use std::borrow::Cow;

use encoding_rs::Encoding;
use zerocopy::{F64, FromBytes, I16, I32, LE, U16, U32};

use super::{BLOCK_LENGTH_MASK, BinaryError, BinaryResult, FONT_NAME_MAX_CHARS, FONT_NAME_SIZE};
use crate::coord::{Coord, CoordPoint};
use crate::encoding;

/// Read cursor over a byte slice. All reads are little-endian.
///
/// A failed read never moves the cursor.
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

/// A length-prefixed byte range borrowed from the reader's data.
///
/// The borrow ends when the block is dropped; it cannot outlive the stream
/// bytes it points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    flags: u8,
    data: &'a [u8],
}

impl<'a> Block<'a> {
    /// Flag bits stored in the top byte of the length field.
    #[inline]
    pub fn flags(&self) -> u8 {
        self.flags
    }

    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// A reader scoped to the block's payload.
    #[inline]
    pub fn reader(&self) -> BinaryReader<'a> {
        BinaryReader::new(self.data)
    }
}

impl<'a> BinaryReader<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current byte offset.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total length of the underlying stream.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left after the cursor.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Whether any unread bytes remain.
    #[inline]
    pub fn has_more(&self) -> bool {
        self.pos < self.data.len()
    }

    /// Move to an absolute offset. The end of the stream is a valid target.
    pub fn seek(&mut self, target: usize) -> BinaryResult<()> {
        if target > self.data.len() {
            return Err(BinaryError::SeekOutOfRange {
                target,
                len: self.data.len(),
            });
        }
        self.pos = target;
        Ok(())
    }

    /// Advance `n` bytes without reading them.
    pub fn skip(&mut self, n: usize) -> BinaryResult<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Borrow the next `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> BinaryResult<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    #[inline]
    pub fn read_u8(&mut self) -> BinaryResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// A single byte where any non-zero value is `true`.
    #[inline]
    pub fn read_bool(&mut self) -> BinaryResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    #[inline]
    pub fn read_i16(&mut self) -> BinaryResult<i16> {
        let bytes = self.read_bytes(2)?;
        Ok(I16::<LE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or_default())
    }

    #[inline]
    pub fn read_u16(&mut self) -> BinaryResult<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(U16::<LE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or_default())
    }

    #[inline]
    pub fn read_i32(&mut self) -> BinaryResult<i32> {
        let bytes = self.read_bytes(4)?;
        Ok(I32::<LE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or_default())
    }

    #[inline]
    pub fn read_u32(&mut self) -> BinaryResult<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(U32::<LE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or_default())
    }

    #[inline]
    pub fn read_f64(&mut self) -> BinaryResult<f64> {
        let bytes = self.read_bytes(8)?;
        Ok(F64::<LE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or_default())
    }

    /// A raw `i32` coordinate.
    #[inline]
    pub fn read_coord(&mut self) -> BinaryResult<Coord> {
        self.read_i32().map(Coord::from_raw)
    }

    /// Two raw coordinates, x first.
    #[inline]
    pub fn read_coord_point(&mut self) -> BinaryResult<CoordPoint> {
        let x = self.read_coord()?;
        let y = self.read_coord()?;
        Ok(CoordPoint::new(x, y))
    }

    /// Flag byte of the next block, without consuming anything.
    pub fn peek_block_flags(&self) -> BinaryResult<u8> {
        self.ensure(4)?;
        Ok(self.data[self.pos + 3])
    }

    /// Read a length-prefixed block, masking the flag byte off the length.
    pub fn read_block(&mut self) -> BinaryResult<Block<'a>> {
        let start = self.pos;
        let (flags, length) = self.read_block_header()?;
        match self.read_bytes(length) {
            Ok(data) => Ok(Block { flags, data }),
            Err(err) => {
                self.pos = start;
                Err(err)
            },
        }
    }

    /// Skip a block without materializing it. Returns the payload length.
    pub fn skip_block(&mut self) -> BinaryResult<usize> {
        let start = self.pos;
        let (_, length) = self.read_block_header()?;
        if let Err(err) = self.skip(length) {
            self.pos = start;
            return Err(err);
        }
        Ok(length)
    }

    /// A 1-byte length followed by that many codepage bytes.
    pub fn read_pascal_string(&mut self, encoding: &'static Encoding) -> BinaryResult<Cow<'a, str>> {
        let start = self.pos;
        let length = self.read_u8()? as usize;
        match self.read_bytes(length) {
            Ok(bytes) => Ok(encoding::decode(bytes, encoding)),
            Err(err) => {
                self.pos = start;
                Err(err)
            },
        }
    }

    /// A block whose payload is a Pascal string.
    ///
    /// The block length governs how far the cursor advances, even if the
    /// embedded string is shorter.
    pub fn read_string_block(&mut self, encoding: &'static Encoding) -> BinaryResult<Cow<'a, str>> {
        let start = self.pos;
        let block = self.read_block()?;
        if block.is_empty() {
            return Ok(Cow::Borrowed(""));
        }
        let mut inner = block.reader();
        inner.read_pascal_string(encoding).inspect_err(|_| self.pos = start)
    }

    /// A fixed 64-byte UTF-16LE font name.
    ///
    /// Always consumes exactly 64 bytes and yields at most 31 characters.
    pub fn read_font_name(&mut self) -> BinaryResult<String> {
        let bytes = self.read_bytes(FONT_NAME_SIZE)?;
        let mut name = encoding::decode_utf16le(bytes);
        if let Some((cut, _)) = name.char_indices().nth(FONT_NAME_MAX_CHARS) {
            name.truncate(cut);
        }
        Ok(name)
    }

    /// A block of parameter text, returned untokenized with its NUL
    /// terminators removed.
    pub fn read_parameter_block(&mut self) -> BinaryResult<Block<'a>> {
        let block = self.read_block()?;
        let end = block
            .data
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |last| last + 1);
        Ok(Block {
            flags: block.flags,
            data: &block.data[..end],
        })
    }

    fn read_block_header(&mut self) -> BinaryResult<(u8, usize)> {
        let stored = self.read_u32()?;
        let flags = (stored >> 24) as u8;
        Ok((flags, (stored & BLOCK_LENGTH_MASK) as usize))
    }

    #[inline]
    fn ensure(&self, n: usize) -> BinaryResult<()> {
        if n > self.remaining() {
            return Err(BinaryError::EndOfData {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        Ok(())
    }
}
