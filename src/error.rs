//! Error types for the record codec.
//!
//! Failures are split in two layers. Low-level decoding problems (truncated
//! data, malformed fields, unrecognized headers) are [`DecodeError`]s and never
//! leave the crate on their own: at the stream boundary they are wrapped into
//! [`Error::Corrupt`] together with the file path and the name of the stream
//! that was being decoded.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::binary::BinaryError;
use crate::mapping::FieldError;

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structural decoding failure inside a single stream.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Framing failure from the binary layer
    #[error(transparent)]
    Binary(#[from] BinaryError),

    /// A mapped field could not be converted
    #[error(transparent)]
    Field(#[from] FieldError),

    /// The stream exists but holds no bytes
    #[error("stream is empty")]
    EmptyStream,

    /// A stream required by the layout is absent from the container
    #[error("stream not found")]
    MissingStream,

    /// The leading header does not identify this file family
    #[error("unrecognized file header: {0:?}")]
    BadHeader(String),

    /// A record carries no `RECORD` tag
    #[error("record {index} has no RECORD tag")]
    MissingKind { index: usize },

    /// The layout requires a specific record at this position
    #[error("record {index} is not a {expected} record")]
    UnexpectedRecord { index: usize, expected: &'static str },
}

/// Main error type for reading and writing libraries and documents.
#[derive(Error, Debug)]
pub enum Error {
    /// File-level failure with no more specific classification
    #[error("{}: {message}", PathLabel(.path))]
    File {
        path: Option<PathBuf>,
        message: String,
    },

    /// Framing or structural decoding failed
    #[error("{}: corrupt stream '{stream}': {source}", PathLabel(.path))]
    Corrupt {
        path: Option<PathBuf>,
        stream: String,
        source: DecodeError,
    },

    /// A recognized record kind that this codec cannot decode was required
    #[error("{}: unsupported record kind {kind} in stream '{stream}'", PathLabel(.path))]
    Unsupported {
        path: Option<PathBuf>,
        stream: String,
        kind: String,
    },

    /// Framing limits were exceeded while encoding
    #[error("{}: cannot encode stream '{stream}': {source}", PathLabel(.path))]
    Encode {
        path: Option<PathBuf>,
        stream: String,
        source: BinaryError,
    },

    /// The stream sink rejected a write
    #[error("{}: I/O error: {source}", PathLabel(.path))]
    Io {
        path: Option<PathBuf>,
        source: std::io::Error,
    },

    /// The caller's cancellation token fired
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Path of the file the failure is attributed to, when known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::File { path, .. }
            | Error::Corrupt { path, .. }
            | Error::Unsupported { path, .. }
            | Error::Encode { path, .. }
            | Error::Io { path, .. } => path.as_deref(),
            Error::Cancelled => None,
        }
    }

    /// Name of the stream being processed, when the failure is stream-scoped.
    pub fn stream(&self) -> Option<&str> {
        match self {
            Error::Corrupt { stream, .. }
            | Error::Unsupported { stream, .. }
            | Error::Encode { stream, .. } => Some(stream),
            _ => None,
        }
    }

    /// Whether this is a corrupt-file failure.
    #[inline]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::Corrupt { .. })
    }

    /// Whether this is a cancellation outcome.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Attach a file path, replacing any path already recorded.
    pub fn with_path(mut self, new_path: impl Into<PathBuf>) -> Self {
        match &mut self {
            Error::File { path, .. }
            | Error::Corrupt { path, .. }
            | Error::Unsupported { path, .. }
            | Error::Encode { path, .. }
            | Error::Io { path, .. } => *path = Some(new_path.into()),
            Error::Cancelled => {},
        }
        self
    }
}

struct PathLabel<'a>(&'a Option<PathBuf>);

impl fmt::Display for PathLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(path) => write!(f, "{}", path.display()),
            None => f.write_str("<memory>"),
        }
    }
}
