//! Schematic libraries and documents.
//!
//! Both formats store records as blocks of `|NAME=VALUE` parameter text,
//! tagged by a numeric `RECORD` parameter and linked by `OWNERINDEX`, the
//! stream position of the owning record. Libraries may also contain pins in
//! a packed binary layout.

mod document;
mod header;
mod library;
mod pin;
mod record;
mod records;

#[cfg(test)]
mod tests;

pub use document::SchDocument;
pub use header::{DOCUMENT_HEADER, FILE_HEADER_STREAM, LIBRARY_HEADER, LibraryHeader};
pub use library::{LibComponent, SchLib};
pub use record::{SchRecord, UnknownRecord};
pub use records::*;
