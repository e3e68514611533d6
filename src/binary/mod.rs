//! Binary primitive codec.
//!
//! Altium streams are built from a handful of framing primitives:
//!
//! - little-endian fixed-width integers and IEEE doubles
//! - **blocks**: a 4-byte length followed by that many bytes. The top byte of
//!   the stored length carries flag bits (SchLib uses it to tell text records
//!   from binary pin records); the true length is the low 24 bits.
//! - **Pascal strings**: a 1-byte length followed by codepage bytes
//! - **string blocks**: a block whose payload is a Pascal string
//! - **font names**: fixed 64-byte UTF-16LE fields, NUL padded
//! - **parameter blocks**: a block holding NUL-terminated `|NAME=VALUE` text
//!
//! [`BinaryReader`] decodes these from a borrowed slice without copying;
//! [`BinaryWriter`] is its exact mirror over any [`std::io::Write`].

mod pool;
mod reader;
mod writer;

use thiserror::Error;

pub use pool::{BufferPool, PooledBuffer};
pub use reader::{BinaryReader, Block};
pub use writer::BinaryWriter;

/// Mask applied to a stored block length to drop the flag byte.
pub const BLOCK_LENGTH_MASK: u32 = 0x00FF_FFFF;

/// Size in bytes of a fixed-width font name field.
pub const FONT_NAME_SIZE: usize = 64;

/// Longest font name a font name field can hold, leaving room for a NUL.
pub const FONT_NAME_MAX_CHARS: usize = FONT_NAME_SIZE / 2 - 1;

/// Errors raised by the binary primitive codec.
#[derive(Error, Debug)]
pub enum BinaryError {
    /// Not enough data left to read the requested value
    #[error("unexpected end of data at offset {offset}: needed {needed} bytes, {available} available")]
    EndOfData {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Seek target outside the stream
    #[error("seek to offset {target} outside of {len}-byte stream")]
    SeekOutOfRange { target: usize, len: usize },

    /// Block payload too long for a 24-bit length
    #[error("block of {length} bytes exceeds the {max}-byte limit")]
    BlockTooLarge { length: usize, max: usize },

    /// String too long for a 1-byte length prefix
    #[error("string of {length} bytes does not fit in a Pascal string")]
    StringTooLong { length: usize },

    /// A field value does not fit its on-disk width
    #[error("{field} value {value} does not fit in {bits} bits")]
    ValueOutOfRange {
        field: &'static str,
        value: i64,
        bits: u32,
    },

    /// A text value would not read back unchanged from parameter text
    #[error("value of {field} contains a delimiter or ends in whitespace")]
    UnrepresentableValue { field: String },

    /// Underlying writer failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for binary operations.
pub type BinaryResult<T> = Result<T, BinaryError>;
