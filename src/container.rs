//! Named-stream access.
//!
//! The readers and writers see a file as a set of byte streams addressed by
//! `storage/stream` names (`"R1/Data"`, `"FileHeader"`). The compound-file
//! layer that stores them is outside this crate; it plugs in through
//! [`StreamSource`] and [`StreamSink`]. [`MemoryContainer`] implements both.

use std::collections::BTreeMap;
use std::io;

use bytes::Bytes;

/// Read access to named streams.
pub trait StreamSource {
    /// Bytes of the named stream. Its length bounds every read.
    fn stream(&self, name: &str) -> Option<&[u8]>;

    fn has_stream(&self, name: &str) -> bool {
        self.stream(name).is_some()
    }
}

/// Write access to named streams.
pub trait StreamSink {
    /// Store a stream, replacing any stream with the same name.
    fn put_stream(&mut self, name: &str, data: Vec<u8>) -> io::Result<()>;
}

/// An in-memory container ordered by stream name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryContainer {
    streams: BTreeMap<String, Bytes>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Bytes>) {
        self.streams.insert(name.into(), data.into());
    }

    /// A cheap handle to the stream's bytes.
    pub fn get(&self, name: &str) -> Option<Bytes> {
        self.streams.get(name).cloned()
    }

    pub fn remove(&mut self, name: &str) -> Option<Bytes> {
        self.streams.remove(name)
    }

    /// Stream names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().map(String::as_str)
    }

    /// Distinct storage names, the part of a stream name before the first
    /// `/`.
    pub fn storages(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .streams
            .keys()
            .filter_map(|name| name.split_once('/').map(|(storage, _)| storage))
            .collect();
        out.dedup();
        out
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl StreamSource for MemoryContainer {
    fn stream(&self, name: &str) -> Option<&[u8]> {
        self.streams.get(name).map(|b| b.as_ref())
    }
}

impl StreamSink for MemoryContainer {
    fn put_stream(&mut self, name: &str, data: Vec<u8>) -> io::Result<()> {
        self.streams.insert(name.to_string(), Bytes::from(data));
        Ok(())
    }
}
