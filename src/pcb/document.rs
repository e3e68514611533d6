//! PCB documents (`.PcbDoc`).
//!
//! Board settings live in `Board6/Data`, placed components in
//! `Components6/Data`, and primitives in one storage per kind (`Arcs6`,
//! `Pads6`, ...), each with a `Header` stream holding the object count.
//! A primitive belongs to a component when its common prefix names that
//! component's position in `Components6`.
//!
//! Primitives of a component are kept grouped by kind on read, in the order
//! of [`PRIMITIVE_STREAMS`].

use encoding_rs::Encoding;

use super::common::NO_COMPONENT;
use super::component::PcbComponent;
use super::library::{check_signature, signature_block};
use super::primitives::{PcbPrimitive, object_id};
use super::stream::{Decoded, PrimitiveStream, write_primitives};
use crate::binary::{BinaryReader, BinaryResult, BinaryWriter};
use crate::container::{StreamSink, StreamSource};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::hierarchy::{HierarchyBuilder, Node, OwnedRecord};
use crate::mapping::ParamFields;
use crate::options::{ReadOptions, Session, WriteOptions};
use crate::params::{Dialect, OwnedParameters, ParameterCollection, ParameterWriter};

pub const DOCUMENT_HEADER: &str = "PCB 6.0 Binary File";

const FILE_HEADER_STREAM: &str = "FileHeader";
const BOARD_STREAM: &str = "Board6/Data";
const COMPONENTS_STORAGE: &str = "Components6";

/// Storage name and object id of each primitive kind, in stream order.
pub const PRIMITIVE_STREAMS: [(&str, u8); 7] = [
    ("Arcs6", object_id::ARC),
    ("Pads6", object_id::PAD),
    ("Vias6", object_id::VIA),
    ("Tracks6", object_id::TRACK),
    ("Texts6", object_id::TEXT),
    ("Fills6", object_id::FILL),
    ("Regions6", object_id::REGION),
];

/// A component on the board with the primitives it owns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacedComponent {
    pub component: PcbComponent,
    pub primitives: Vec<PcbPrimitive>,
}

impl PlacedComponent {
    pub fn new(component: PcbComponent) -> Self {
        Self {
            component,
            primitives: Vec::new(),
        }
    }

    pub fn with_primitive(mut self, primitive: impl Into<PcbPrimitive>) -> Self {
        self.primitives.push(primitive.into());
        self
    }
}

/// A board layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PcbDocument {
    /// Board settings, kept as written
    pub board: OwnedParameters,
    pub components: Vec<PlacedComponent>,
    /// Primitives that belong to no component
    pub primitives: Vec<PcbPrimitive>,
    pub(crate) diagnostics: Diagnostics,
}

#[derive(Debug)]
enum PcbObject {
    Component(PcbComponent),
    Primitive(PcbPrimitive),
}

impl OwnedRecord for PcbObject {
    fn can_own(&self) -> bool {
        matches!(self, PcbObject::Component(_))
    }
}

impl PcbDocument {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Every primitive, owned or free.
    pub fn all_primitives(&self) -> impl Iterator<Item = &PcbPrimitive> {
        self.components
            .iter()
            .flat_map(|c| c.primitives.iter())
            .chain(self.primitives.iter())
    }

    pub fn read<S: StreamSource + ?Sized>(source: &S, options: &ReadOptions) -> Result<Self> {
        let session = options.session();
        session.check_cancelled()?;
        let encoding = session.encoding;
        let mut diags = Diagnostics::new();

        let header = session.required(source, FILE_HEADER_STREAM)?;
        check_signature(header, DOCUMENT_HEADER, encoding).map_err(|e| session.corrupt(FILE_HEADER_STREAM, e))?;

        let board = match source.stream(BOARD_STREAM) {
            Some(data) if !data.is_empty() => {
                let block = BinaryReader::new(data)
                    .read_parameter_block()
                    .map_err(|e| session.corrupt(BOARD_STREAM, e))?;
                OwnedParameters::from_collection(&ParameterCollection::parse(block.data()), encoding)
            },
            _ => OwnedParameters::new(),
        };

        let mut builder = HierarchyBuilder::new();
        let components = format!("{COMPONENTS_STORAGE}/Data");
        if let Some(data) = source.stream(&components) {
            let mut reader = BinaryReader::new(data);
            let mut count = 0;
            while reader.has_more() {
                session.check_cancelled()?;
                let block = reader
                    .read_parameter_block()
                    .map_err(|e| session.corrupt(&components, e))?;
                let component = PcbComponent::read_fields(&ParameterCollection::parse(block.data()), encoding)
                    .map_err(|e| session.corrupt(&components, e))?;
                builder.push(PcbObject::Component(component), -1, &mut diags, &components);
                count += 1;
            }
            check_count(source, COMPONENTS_STORAGE, count, &session, &mut diags)?;
        }

        for (storage, _) in PRIMITIVE_STREAMS {
            let stream = format!("{storage}/Data");
            let Some(data) = source.stream(&stream) else {
                continue;
            };
            let mut records = PrimitiveStream::new(BinaryReader::new(data), &stream);
            while let Some(decoded) = records.next(&session, &mut diags)? {
                match decoded {
                    Decoded::Primitive { primitive, component } => {
                        let owner = component.map_or(-1, i32::from);
                        builder.push(PcbObject::Primitive(primitive), owner, &mut diags, &stream);
                    },
                    Decoded::Skipped => builder.push_dropped(),
                }
            }
            check_count(source, storage, records.count(), &session, &mut diags)?;
        }

        let mut doc = Self {
            board,
            diagnostics: diags,
            ..Self::default()
        };
        for Node { record, children } in builder.finish() {
            match record {
                PcbObject::Component(component) => doc.components.push(PlacedComponent {
                    component,
                    primitives: children.into_iter().filter_map(into_primitive).collect(),
                }),
                PcbObject::Primitive(primitive) => doc.primitives.push(primitive),
            }
        }
        tracing::debug!(
            components = doc.components.len(),
            primitives = doc.primitives.len(),
            diagnostics = doc.diagnostics.len(),
            "read PcbDoc"
        );
        Ok(doc)
    }

    pub fn write<S: StreamSink + ?Sized>(&self, sink: &mut S, options: &WriteOptions) -> Result<()> {
        let session = options.session();
        session.check_cancelled()?;
        let encoding = session.encoding;

        let header = signature_block(DOCUMENT_HEADER, encoding).map_err(|e| session.encode_failed(FILE_HEADER_STREAM, e))?;
        session.put(sink, FILE_HEADER_STREAM, header)?;

        let board = parameter_block(encoding, |w| self.board.write_to(w, &[]))
            .map_err(|e| session.encode_failed(BOARD_STREAM, e))?;
        session.put(sink, BOARD_STREAM, board)?;

        let stream = format!("{COMPONENTS_STORAGE}/Data");
        let mut out = BinaryWriter::new(Vec::new());
        for placed in &self.components {
            let block = parameter_block(encoding, |w| placed.component.write_fields(w))
                .map_err(|e| session.encode_failed(&stream, e))?;
            out.write_bytes(&block).map_err(|e| session.encode_failed(&stream, e))?;
        }
        session.put(sink, &stream, out.into_inner())?;
        put_count(sink, COMPONENTS_STORAGE, self.components.len() as u32, &session)?;

        for (storage, id) in PRIMITIVE_STREAMS {
            session.check_cancelled()?;
            let owned = self.components.iter().enumerate().flat_map(|(i, placed)| {
                let index = u16::try_from(i).ok().filter(|&i| i != NO_COMPONENT);
                placed.primitives.iter().map(move |p| (p, index))
            });
            let free = self.primitives.iter().map(|p| (p, None));
            let selected = owned.chain(free).filter(|(p, _)| p.object_id() == id);

            let stream = format!("{storage}/Data");
            let (data, count) = write_primitives(selected, encoding).map_err(|e| session.encode_failed(&stream, e))?;
            session.put(sink, &stream, data)?;
            put_count(sink, storage, count, &session)?;
        }
        Ok(())
    }
}

fn into_primitive(node: Node<PcbObject>) -> Option<PcbPrimitive> {
    match node.record {
        PcbObject::Primitive(p) => Some(p),
        PcbObject::Component(_) => None,
    }
}

fn parameter_block(
    encoding: &'static Encoding,
    fields: impl FnOnce(&mut ParameterWriter<'_>),
) -> BinaryResult<Vec<u8>> {
    let mut text = Vec::new();
    let mut w = ParameterWriter::new(&mut text, encoding).with_dialect(Dialect::Pcb);
    fields(&mut w);
    w.finish()?;
    let mut out = BinaryWriter::new(Vec::with_capacity(text.len() + 5));
    out.write_parameter_block(&text)?;
    Ok(out.into_inner())
}

/// Compare a storage's `Header` count with the objects found in its data.
fn check_count<S: StreamSource + ?Sized>(
    source: &S,
    storage: &str,
    found: usize,
    session: &Session<'_>,
    diags: &mut Diagnostics,
) -> Result<()> {
    let stream = format!("{storage}/Header");
    let Some(data) = source.stream(&stream).filter(|d| !d.is_empty()) else {
        return Ok(());
    };
    let listed = BinaryReader::new(data)
        .read_u32()
        .map_err(|e| session.corrupt(&stream, e))? as usize;
    if listed != found {
        diags.warning(&stream, None, format!("header lists {listed} objects, data holds {found}"));
    }
    Ok(())
}

fn put_count<S: StreamSink + ?Sized>(sink: &mut S, storage: &str, count: u32, session: &Session<'_>) -> Result<()> {
    session.put(sink, &format!("{storage}/Header"), count.to_le_bytes().to_vec())
}
