//! Options for the read and write entry points.
//!
//! Both option types carry the file path used in error messages, an optional
//! cancellation token and the codepage for legacy 8-bit text.
//!
//! # Examples
//!
//! ```rust
//! use altium_codec::ReadOptions;
//! use tokio_util::sync::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let options = ReadOptions::new()
//!     .with_path("parts.SchLib")
//!     .with_cancellation(token.clone())
//!     .with_codepage(1251);
//! assert_eq!(options.encoding().name(), "windows-1251");
//! ```

use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use tokio_util::sync::CancellationToken;

use crate::binary::BinaryError;
use crate::container::{StreamSink, StreamSource};
use crate::encoding::{DEFAULT_ENCODING, codepage_to_encoding};
use crate::error::{DecodeError, Error, Result};

/// Settings for reading a library or document.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// File path reported in errors
    pub path: Option<PathBuf>,
    /// Checked before and during the read
    pub cancel: Option<CancellationToken>,
    /// Codepage of text without a UTF-8 marker
    pub encoding: &'static Encoding,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            path: None,
            cancel: None,
            encoding: DEFAULT_ENCODING,
        }
    }
}

impl ReadOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[inline]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Select a Windows codepage. Unknown codepages keep the current one.
    pub fn with_codepage(mut self, codepage: u16) -> Self {
        match codepage_to_encoding(codepage) {
            Some(encoding) => self.encoding = encoding,
            None => tracing::warn!(codepage, "unsupported codepage, keeping {}", self.encoding.name()),
        }
        self
    }

    #[inline]
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub(crate) fn session(&self) -> Session<'_> {
        Session {
            path: self.path.as_deref(),
            cancel: self.cancel.as_ref(),
            encoding: self.encoding,
        }
    }
}

/// Settings for writing a library or document.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// File path reported in errors
    pub path: Option<PathBuf>,
    /// Checked before and during the write
    pub cancel: Option<CancellationToken>,
    /// Codepage for text; values it cannot represent get a UTF-8 marker
    pub encoding: &'static Encoding,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            path: None,
            cancel: None,
            encoding: DEFAULT_ENCODING,
        }
    }
}

impl WriteOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[inline]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Select a Windows codepage. Unknown codepages keep the current one.
    pub fn with_codepage(mut self, codepage: u16) -> Self {
        match codepage_to_encoding(codepage) {
            Some(encoding) => self.encoding = encoding,
            None => tracing::warn!(codepage, "unsupported codepage, keeping {}", self.encoding.name()),
        }
        self
    }

    #[inline]
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub(crate) fn session(&self) -> Session<'_> {
        Session {
            path: self.path.as_deref(),
            cancel: self.cancel.as_ref(),
            encoding: self.encoding,
        }
    }
}

/// Per-call state shared by the format drivers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Session<'o> {
    path: Option<&'o Path>,
    cancel: Option<&'o CancellationToken>,
    pub encoding: &'static Encoding,
}

impl Session<'_> {
    pub fn check_cancelled(&self) -> Result<()> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    fn path_buf(&self) -> Option<PathBuf> {
        self.path.map(Path::to_path_buf)
    }

    pub fn corrupt(&self, stream: &str, source: impl Into<DecodeError>) -> Error {
        Error::Corrupt {
            path: self.path_buf(),
            stream: stream.to_string(),
            source: source.into(),
        }
    }

    pub fn unsupported(&self, stream: &str, kind: impl Into<String>) -> Error {
        Error::Unsupported {
            path: self.path_buf(),
            stream: stream.to_string(),
            kind: kind.into(),
        }
    }

    pub fn encode_failed(&self, stream: &str, source: BinaryError) -> Error {
        Error::Encode {
            path: self.path_buf(),
            stream: stream.to_string(),
            source,
        }
    }

    /// A stream that must exist and hold data.
    pub fn required<'s, S: StreamSource + ?Sized>(&self, source: &'s S, name: &str) -> Result<&'s [u8]> {
        match source.stream(name) {
            None => Err(self.corrupt(name, DecodeError::MissingStream)),
            Some([]) => Err(self.corrupt(name, DecodeError::EmptyStream)),
            Some(data) => {
                tracing::debug!(stream = name, len = data.len(), "reading stream");
                Ok(data)
            },
        }
    }

    pub fn put<S: StreamSink + ?Sized>(&self, sink: &mut S, name: &str, data: Vec<u8>) -> Result<()> {
        tracing::debug!(stream = name, len = data.len(), "writing stream");
        sink.put_stream(name, data).map_err(|source| Error::Io {
            path: self.path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryContainer;

    #[test]
    fn test_defaults() {
        let options = ReadOptions::default();
        assert!(options.path.is_none());
        assert_eq!(options.encoding(), encoding_rs::WINDOWS_1252);
        assert!(options.session().check_cancelled().is_ok());
    }

    #[test]
    fn test_unknown_codepage_keeps_encoding() {
        let options = WriteOptions::new().with_codepage(1250).with_codepage(1);
        assert_eq!(options.encoding(), encoding_rs::WINDOWS_1250);
    }

    #[test]
    fn test_cancelled_token() {
        let token = CancellationToken::new();
        let options = ReadOptions::new().with_cancellation(token.clone());
        assert!(options.session().check_cancelled().is_ok());
        token.cancel();
        assert!(options.session().check_cancelled().unwrap_err().is_cancelled());
    }

    #[test]
    fn test_required_stream_errors() {
        let mut c = MemoryContainer::new();
        c.insert("Empty", Vec::new());
        let options = ReadOptions::new().with_path("a.PcbLib");
        let session = options.session();

        let err = session.required(&c, "Missing").unwrap_err();
        assert!(err.is_corrupt());
        assert_eq!(err.stream(), Some("Missing"));
        assert_eq!(err.path(), Some(Path::new("a.PcbLib")));

        let err = session.required(&c, "Empty").unwrap_err();
        assert!(matches!(
            err,
            Error::Corrupt {
                source: DecodeError::EmptyStream,
                ..
            }
        ));
    }
}
