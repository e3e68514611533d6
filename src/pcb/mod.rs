//! PCB footprint libraries and board documents.
//!
//! Geometry is stored as binary primitives: an object id byte followed by
//! blocks of little-endian fields in raw coordinate units. Components,
//! footprint properties and board settings are parameter text in the PCB
//! dialect.

mod common;
mod component;
mod document;
mod layer;
mod library;
mod primitives;
mod stream;

#[cfg(test)]
mod tests;

pub use common::{COMMON_PREFIX_SIZE, NO_COMPONENT, PcbFlags, PrimitiveCommon};
pub use component::{FootprintParameters, PcbComponent};
pub use document::{DOCUMENT_HEADER, PRIMITIVE_STREAMS, PcbDocument, PlacedComponent};
pub use layer::Layer;
pub use library::{Footprint, LIBRARY_HEADER, PcbLib};
pub use primitives::{
    Arc, Fill, Pad, PadMode, PadShape, PcbPrimitive, Region, Text, TextKind, Track, Via, object_id,
};
