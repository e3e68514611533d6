//! Altium Designer record codec.
//!
//! Reads and writes the record streams of Altium Designer schematic and PCB
//! files: schematic symbol libraries (`.SchLib`), schematic documents
//! (`.SchDoc`), footprint libraries (`.PcbLib`) and board documents
//! (`.PcbDoc`). The files are compound documents whose named streams hold
//! length-prefixed blocks of either pipe-delimited parameter text or packed
//! little-endian binary.
//!
//! # Features
//!
//! - **Parameter text**: zero-copy `|KEY=VALUE|` parsing with case-insensitive
//!   lookup, and a writer for the schematic and PCB dialects
//! - **Binary framing**: bounded block reads with flag bits, Pascal strings and
//!   fixed-size UTF-16 font names
//! - **Typed records**: every schematic record kind, PCB components and
//!   primitives, with unknown records preserved where the format allows
//! - **Ownership trees**: flat owner-index streams rebuilt into trees on read
//!   and flattened again on write
//! - **Diagnostics**: recoverable problems are collected per file and mirrored
//!   to `tracing` instead of failing the read
//!
//! The compound-file container itself is pluggable: readers take any
//! [`StreamSource`], writers any [`StreamSink`]. [`MemoryContainer`] is an
//! in-memory implementation of both.
//!
//! # Example - Writing and reading a symbol library
//!
//! ```rust
//! use altium_codec::sch::{Component, LibComponent, Rectangle, SchLib};
//! use altium_codec::{CoordPoint, MemoryContainer, ReadOptions, WriteOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let symbol = Component {
//!     lib_reference: "LM358".to_string(),
//!     part_count: 3,
//!     ..Component::default()
//! };
//! let body = Rectangle {
//!     corner: CoordPoint::from_dxp(40, 30),
//!     ..Rectangle::default()
//! };
//!
//! let mut lib = SchLib::new();
//! lib.components.push(LibComponent::new(symbol).with_child(body));
//!
//! let mut container = MemoryContainer::new();
//! lib.write(&mut container, &WriteOptions::new())?;
//!
//! let read = SchLib::read(&container, &ReadOptions::new().with_path("opamps.SchLib"))?;
//! assert_eq!(read.components[0].name(), "LM358");
//! assert!(read.diagnostics().is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Reading a board
//!
//! ```no_run
//! use altium_codec::pcb::PcbDocument;
//! use altium_codec::{MemoryContainer, ReadOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let container = MemoryContainer::new();
//! let board = PcbDocument::read(&container, &ReadOptions::new().with_path("main.PcbDoc"))?;
//! for placed in &board.components {
//!     println!("{} at {}", placed.component.source_designator, placed.component.x.0);
//! }
//! for diagnostic in board.diagnostics().iter() {
//!     eprintln!("{diagnostic}");
//! }
//! # Ok(())
//! # }
//! ```

/// Block framing and little-endian primitives
pub mod binary;
/// Named-stream access
pub mod container;
/// Fixed-point coordinates
pub mod coord;
/// Recoverable problems found while reading
pub mod diagnostics;
/// Codepage handling for 8-bit text
pub mod encoding;
/// Error types
pub mod error;
/// Owner-index trees
pub mod hierarchy;
/// Typed field mapping over parameter collections
pub mod mapping;
/// Read and write settings
pub mod options;
/// Parameter text parsing and writing
pub mod params;
/// PCB libraries and documents
pub mod pcb;
/// Schematic libraries and documents
pub mod sch;
/// Storage names for long or unusual item names
pub mod section_keys;

pub use container::{MemoryContainer, StreamSink, StreamSource};
pub use coord::{Coord, CoordPoint};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{DecodeError, Error, Result};
pub use hierarchy::Node;
pub use options::{ReadOptions, WriteOptions};
pub use params::{Dialect, ParameterCollection, ParameterWriter};
pub use pcb::{PcbDocument, PcbLib};
pub use sch::{SchDocument, SchLib};
