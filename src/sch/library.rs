//! Schematic symbol libraries (`.SchLib`).
//!
//! Stream layout:
//!
//! - `FileHeader`: a parameter block with the `HEADER` signature, library
//!   settings and the component index (`CompCount`, `LibRef{n}`,
//!   `CompDescr{n}`, `PartCount{n}`), then a `u32` count and one string
//!   block per component name.
//! - `SectionKeys` (optional): storage names for components whose name
//!   cannot be used directly.
//! - `<key>/Data`: the component record followed by its primitives.

use crate::binary::{BinaryReader, BinaryResult, BinaryWriter};
use crate::container::{StreamSink, StreamSource};
use crate::diagnostics::Diagnostics;
use crate::error::{DecodeError, Result};
use crate::hierarchy::{HierarchyBuilder, Node, flatten};
use crate::mapping::{FieldError, FieldValue, ParamFields};
use crate::options::{ReadOptions, Session, WriteOptions};
use crate::params::{ParameterCollection, ParameterWriter};
use crate::section_keys::{SECTION_KEYS_STREAM, SectionKeys};

use super::header::{FILE_HEADER_STREAM, LIBRARY_FAMILY, LIBRARY_HEADER, LibraryHeader, check_header};
use super::record::{Decoded, RecordStream, SchRecord, write_fields_block, write_record_block};
use super::records::{Component, Pin};

/// One symbol: its component record and the primitives it owns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibComponent {
    pub component: Component,
    pub children: Vec<Node<SchRecord>>,
}

impl LibComponent {
    pub fn new(component: Component) -> Self {
        Self {
            component,
            children: Vec::new(),
        }
    }

    /// Append a primitive owned directly by the component.
    pub fn with_child(mut self, record: impl Into<SchRecord>) -> Self {
        self.children.push(Node::new(record.into()));
        self
    }

    /// Library reference, which is also the component's name in the index.
    #[inline]
    pub fn name(&self) -> &str {
        &self.component.lib_reference
    }

    /// Pins owned directly by the component.
    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.children.iter().filter_map(|node| match &node.record {
            SchRecord::Pin(pin) => Some(pin),
            _ => None,
        })
    }

    /// Records in the component's storage, the component included.
    pub fn record_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum::<usize>()
    }

    fn write_records(&self, encoding: &'static encoding_rs::Encoding) -> BinaryResult<Vec<u8>> {
        let mut out = BinaryWriter::new(Vec::new());
        write_fields_block(&mut out, Component::KIND, &self.component, encoding)?;
        // Direct children name no owner; the component at position 0 is
        // their owner on read.
        for flat in flatten(&self.children, 1) {
            write_record_block(&mut out, flat.record, flat.owner, encoding)?;
        }
        Ok(out.into_inner())
    }
}

/// A schematic symbol library.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchLib {
    pub header: LibraryHeader,
    pub components: Vec<LibComponent>,
    pub(crate) diagnostics: Diagnostics,
}

impl SchLib {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-fatal findings from the read that produced this library.
    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// First component with the given library reference.
    pub fn component(&self, name: &str) -> Option<&LibComponent> {
        self.components.iter().find(|c| c.name() == name)
    }

    pub fn read<S: StreamSource + ?Sized>(source: &S, options: &ReadOptions) -> Result<Self> {
        let session = options.session();
        session.check_cancelled()?;
        let mut diags = Diagnostics::new();

        let data = session.required(source, FILE_HEADER_STREAM)?;
        let (header, names) = read_file_header(data, &session, &mut diags)?;

        let keys = match source.stream(SECTION_KEYS_STREAM) {
            Some(data) if !data.is_empty() => SectionKeys::read(data, session.encoding)
                .map_err(|e| session.corrupt(SECTION_KEYS_STREAM, e))?,
            _ => SectionKeys::default(),
        };

        let storages = keys.resolve(names.iter().map(String::as_str));
        let mut components = Vec::with_capacity(names.len());
        for storage in &storages {
            session.check_cancelled()?;
            let stream = format!("{storage}/Data");
            components.push(read_component(source, &stream, &session, &mut diags)?);
        }
        tracing::debug!(components = components.len(), diagnostics = diags.len(), "read SchLib");

        Ok(Self {
            header,
            components,
            diagnostics: diags,
        })
    }

    pub fn write<S: StreamSink + ?Sized>(&self, sink: &mut S, options: &WriteOptions) -> Result<()> {
        let session = options.session();
        session.check_cancelled()?;
        let encoding = session.encoding;

        let (keys, table) = SectionKeys::assign(self.components.iter().map(LibComponent::name));
        let header = self
            .write_file_header(encoding)
            .map_err(|e| session.encode_failed(FILE_HEADER_STREAM, e))?;
        session.put(sink, FILE_HEADER_STREAM, header)?;
        if !table.is_empty() {
            let data = table
                .write(encoding)
                .map_err(|e| session.encode_failed(SECTION_KEYS_STREAM, e))?;
            session.put(sink, SECTION_KEYS_STREAM, data)?;
        }

        for (component, key) in self.components.iter().zip(&keys) {
            session.check_cancelled()?;
            let stream = format!("{key}/Data");
            let data = component
                .write_records(encoding)
                .map_err(|e| session.encode_failed(&stream, e))?;
            session.put(sink, &stream, data)?;
        }
        Ok(())
    }

    fn write_file_header(&self, encoding: &'static encoding_rs::Encoding) -> BinaryResult<Vec<u8>> {
        let mut text = Vec::new();
        let mut w = ParameterWriter::new(&mut text, encoding);
        w.string(&["HEADER"], LIBRARY_HEADER);
        let weight: usize = self.components.iter().map(LibComponent::record_count).sum();
        w.int(&["Weight"], weight as i64);
        self.header.write_fields(&mut w);
        w.int(&["CompCount"], self.components.len() as i64);
        let mut index = itoa::Buffer::new();
        for (i, component) in self.components.iter().enumerate() {
            let i = index.format(i);
            w.string(&["LibRef", i], component.name());
            if !component.component.description.is_empty() {
                w.string(&["CompDescr", i], &component.component.description);
            }
            w.int(&["PartCount", i], i64::from(component.component.part_count));
        }
        w.finish()?;

        let mut out = BinaryWriter::new(Vec::with_capacity(text.len() + 64));
        out.write_parameter_block(&text)?;
        out.write_u32(self.components.len() as u32)?;
        for component in &self.components {
            out.write_string_block(component.name(), encoding)?;
        }
        Ok(out.into_inner())
    }
}

fn read_file_header(
    data: &[u8],
    session: &Session<'_>,
    diags: &mut Diagnostics,
) -> Result<(LibraryHeader, Vec<String>)> {
    let corrupt = |e: DecodeError| session.corrupt(FILE_HEADER_STREAM, e);
    let encoding = session.encoding;

    let mut reader = BinaryReader::new(data);
    let block = reader
        .read_parameter_block()
        .map_err(|e| corrupt(e.into()))?;
    let params = ParameterCollection::parse(block.data());
    check_header(&params, LIBRARY_FAMILY).map_err(corrupt)?;
    let header = LibraryHeader::read_fields(&params, encoding).map_err(|e| corrupt(e.into()))?;

    let count = i32::read_field(&params, "CompCount", encoding).map_err(|e| corrupt(e.into()))?;
    let count = usize::try_from(count)
        .map_err(|_| corrupt(FieldError::new("CompCount", format!("negative count {count}")).into()))?;

    let mut names = Vec::with_capacity(count.min(params.len()));
    let mut index = itoa::Buffer::new();
    for i in 0..count.min(params.len()) {
        match params.get_joined(&["LibRef", index.format(i)]) {
            Some(p) => names.push(p.value(encoding).into_owned()),
            None => diags.warning(FILE_HEADER_STREAM, None, format!("component {i} has no LibRef")),
        }
    }

    if reader.remaining() >= 4 {
        let listed = reader.read_u32().map_err(|e| corrupt(e.into()))? as usize;
        if listed != count {
            diags.warning(
                FILE_HEADER_STREAM,
                None,
                format!("name list has {listed} entries, CompCount is {count}"),
            );
        }
    }
    Ok((header, names))
}

fn read_component<S: StreamSource + ?Sized>(
    source: &S,
    stream: &str,
    session: &Session<'_>,
    diags: &mut Diagnostics,
) -> Result<LibComponent> {
    let data = session.required(source, stream)?;
    let mut records = RecordStream::new(BinaryReader::new(data), stream);
    let mut builder = HierarchyBuilder::new().with_fallback(0);
    while let Some(decoded) = records.next(session, diags)? {
        match decoded {
            Decoded::Record { record, owner } => {
                builder.push(record, owner, diags, stream);
            },
            Decoded::Skipped => builder.push_dropped(),
        }
    }

    let mut roots = builder.finish().into_iter();
    let Some(Node {
        record: SchRecord::Component(component),
        mut children,
    }) = roots.next()
    else {
        return Err(session.corrupt(
            stream,
            DecodeError::UnexpectedRecord {
                index: 0,
                expected: "component",
            },
        ));
    };
    let stray: Vec<_> = roots.collect();
    if !stray.is_empty() {
        diags.warning(stream, None, format!("{} records outside the component", stray.len()));
        children.extend(stray);
    }
    Ok(LibComponent { component, children })
}
