//! PCB footprint libraries (`.PcbLib`).
//!
//! Stream layout:
//!
//! - `FileHeader`: a string block with the format signature.
//! - `Library/Data`: library parameters, a `u32` footprint count and one
//!   string block per footprint name.
//! - `SectionKeys` (optional): storage names for footprints whose name
//!   cannot be used directly.
//! - `<key>/Data`: the footprint name, then its primitives.
//! - `<key>/Parameters`: footprint properties.
//! - `<key>/Header`: the number of primitives in `<key>/Data`.

use encoding_rs::Encoding;

use super::component::FootprintParameters;
use super::primitives::PcbPrimitive;
use super::stream::{Decoded, PrimitiveStream, write_primitives};
use crate::binary::{BinaryReader, BinaryResult, BinaryWriter};
use crate::container::{StreamSink, StreamSource};
use crate::diagnostics::Diagnostics;
use crate::error::{DecodeError, Result};
use crate::mapping::ParamFields;
use crate::options::{ReadOptions, Session, WriteOptions};
use crate::params::{Dialect, OwnedParameters, ParameterCollection, ParameterWriter};
use crate::section_keys::{SECTION_KEYS_STREAM, SectionKeys};

pub const FILE_HEADER_STREAM: &str = "FileHeader";

pub const LIBRARY_HEADER: &str = "PCB 6.0 Binary Library File";

const LIBRARY_DATA_STREAM: &str = "Library/Data";

/// One footprint and its primitives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Footprint {
    pub name: String,
    pub parameters: FootprintParameters,
    pub primitives: Vec<PcbPrimitive>,
}

impl Footprint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_primitive(mut self, primitive: impl Into<PcbPrimitive>) -> Self {
        self.primitives.push(primitive.into());
        self
    }

    /// Pads in stream order.
    pub fn pads(&self) -> impl Iterator<Item = &super::primitives::Pad> {
        self.primitives.iter().filter_map(|p| match p {
            PcbPrimitive::Pad(pad) => Some(pad),
            _ => None,
        })
    }
}

/// A PCB footprint library.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PcbLib {
    /// Library-wide settings, kept as written
    pub library: OwnedParameters,
    pub footprints: Vec<Footprint>,
    pub(crate) diagnostics: Diagnostics,
}

impl PcbLib {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn footprint(&self, name: &str) -> Option<&Footprint> {
        self.footprints.iter().find(|f| f.name == name)
    }

    pub fn read<S: StreamSource + ?Sized>(source: &S, options: &ReadOptions) -> Result<Self> {
        let session = options.session();
        session.check_cancelled()?;
        let mut diags = Diagnostics::new();

        let header = session.required(source, FILE_HEADER_STREAM)?;
        check_signature(header, LIBRARY_HEADER, session.encoding)
            .map_err(|e| session.corrupt(FILE_HEADER_STREAM, e))?;

        let data = session.required(source, LIBRARY_DATA_STREAM)?;
        let (library, names) =
            read_library_data(data, session.encoding).map_err(|e| session.corrupt(LIBRARY_DATA_STREAM, e))?;

        let keys = match source.stream(SECTION_KEYS_STREAM) {
            Some(data) if !data.is_empty() => SectionKeys::read(data, session.encoding)
                .map_err(|e| session.corrupt(SECTION_KEYS_STREAM, e))?,
            _ => SectionKeys::default(),
        };

        let storages = keys.resolve(names.iter().map(String::as_str));
        let mut footprints = Vec::with_capacity(names.len());
        for (name, key) in names.into_iter().zip(&storages) {
            session.check_cancelled()?;
            footprints.push(read_footprint(source, name, key, &session, &mut diags)?);
        }
        tracing::debug!(footprints = footprints.len(), diagnostics = diags.len(), "read PcbLib");

        Ok(Self {
            library,
            footprints,
            diagnostics: diags,
        })
    }

    pub fn write<S: StreamSink + ?Sized>(&self, sink: &mut S, options: &WriteOptions) -> Result<()> {
        let session = options.session();
        session.check_cancelled()?;
        let encoding = session.encoding;

        let header = signature_block(LIBRARY_HEADER, encoding)
            .map_err(|e| session.encode_failed(FILE_HEADER_STREAM, e))?;
        session.put(sink, FILE_HEADER_STREAM, header)?;

        let data = self
            .write_library_data(encoding)
            .map_err(|e| session.encode_failed(LIBRARY_DATA_STREAM, e))?;
        session.put(sink, LIBRARY_DATA_STREAM, data)?;

        let (keys, table) = SectionKeys::assign(self.footprints.iter().map(|f| f.name.as_str()));
        if !table.is_empty() {
            let data = table
                .write(encoding)
                .map_err(|e| session.encode_failed(SECTION_KEYS_STREAM, e))?;
            session.put(sink, SECTION_KEYS_STREAM, data)?;
        }

        for (footprint, key) in self.footprints.iter().zip(&keys) {
            session.check_cancelled()?;
            write_footprint(footprint, key, sink, &session)?;
        }
        Ok(())
    }

    fn write_library_data(&self, encoding: &'static Encoding) -> BinaryResult<Vec<u8>> {
        let mut text = Vec::new();
        let mut w = ParameterWriter::new(&mut text, encoding).with_dialect(Dialect::Pcb);
        self.library.write_to(&mut w, &[]);
        w.finish()?;
        let mut out = BinaryWriter::new(Vec::new());
        out.write_parameter_block(&text)?;
        out.write_u32(self.footprints.len() as u32)?;
        for footprint in &self.footprints {
            out.write_string_block(&footprint.name, encoding)?;
        }
        Ok(out.into_inner())
    }
}

/// Check a `FileHeader` string block against the expected signature.
pub(crate) fn check_signature(data: &[u8], expected: &str, encoding: &'static Encoding) -> std::result::Result<(), DecodeError> {
    let found = BinaryReader::new(data).read_string_block(encoding)?;
    if found.trim().eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(DecodeError::BadHeader(found.into_owned()))
    }
}

pub(crate) fn signature_block(signature: &str, encoding: &'static Encoding) -> BinaryResult<Vec<u8>> {
    let mut out = BinaryWriter::new(Vec::new());
    out.write_string_block(signature, encoding)?;
    Ok(out.into_inner())
}

fn read_library_data(
    data: &[u8],
    encoding: &'static Encoding,
) -> std::result::Result<(OwnedParameters, Vec<String>), DecodeError> {
    let mut r = BinaryReader::new(data);
    let block = r.read_parameter_block()?;
    let library = OwnedParameters::from_collection(&ParameterCollection::parse(block.data()), encoding);
    let count = r.read_u32()? as usize;
    // Each name takes at least five bytes.
    let mut names = Vec::with_capacity(count.min(r.remaining() / 5));
    for _ in 0..count {
        names.push(r.read_string_block(encoding)?.into_owned());
    }
    Ok((library, names))
}

fn read_footprint<S: StreamSource + ?Sized>(
    source: &S,
    name: String,
    key: &str,
    session: &Session<'_>,
    diags: &mut Diagnostics,
) -> Result<Footprint> {
    let stream = format!("{key}/Data");
    let data = session.required(source, &stream)?;
    let mut reader = BinaryReader::new(data);
    let stored = reader
        .read_string_block(session.encoding)
        .map_err(|e| session.corrupt(&stream, e))?;
    if stored != name {
        diags.warning(&stream, None, format!("footprint is named {stored:?}, library lists {name:?}"));
    }

    let mut primitives = Vec::new();
    let mut records = PrimitiveStream::new(reader, &stream);
    while let Some(decoded) = records.next(session, diags)? {
        if let Decoded::Primitive { primitive, .. } = decoded {
            primitives.push(primitive);
        }
    }

    let header = format!("{key}/Header");
    if let Some(data) = source.stream(&header).filter(|d| !d.is_empty()) {
        let expected = BinaryReader::new(data)
            .read_u32()
            .map_err(|e| session.corrupt(&header, e))? as usize;
        if expected != records.count() {
            diags.warning(
                &header,
                None,
                format!("header lists {expected} primitives, data holds {}", records.count()),
            );
        }
    }

    let params_stream = format!("{key}/Parameters");
    let parameters = match source.stream(&params_stream) {
        Some(data) if !data.is_empty() => {
            let block = BinaryReader::new(data)
                .read_parameter_block()
                .map_err(|e| session.corrupt(&params_stream, e))?;
            FootprintParameters::read_fields(&ParameterCollection::parse(block.data()), session.encoding)
                .map_err(|e| session.corrupt(&params_stream, e))?
        },
        _ => FootprintParameters::default(),
    };

    Ok(Footprint {
        name,
        parameters,
        primitives,
    })
}

fn write_footprint<S: StreamSink + ?Sized>(
    footprint: &Footprint,
    key: &str,
    sink: &mut S,
    session: &Session<'_>,
) -> Result<()> {
    let encoding = session.encoding;

    let stream = format!("{key}/Data");
    let (data, count) = write_footprint_data(footprint, encoding).map_err(|e| session.encode_failed(&stream, e))?;
    session.put(sink, &stream, data)?;

    let stream = format!("{key}/Parameters");
    let mut text = Vec::new();
    let mut w = ParameterWriter::new(&mut text, encoding).with_dialect(Dialect::Pcb);
    w.string(&["PATTERN"], &footprint.name);
    footprint.parameters.write_fields(&mut w);
    w.finish().map_err(|e| session.encode_failed(&stream, e))?;
    let mut out = BinaryWriter::new(Vec::new());
    out.write_parameter_block(&text)
        .map_err(|e| session.encode_failed(&stream, e))?;
    session.put(sink, &stream, out.into_inner())?;

    session.put(sink, &format!("{key}/Header"), count.to_le_bytes().to_vec())
}

fn write_footprint_data(footprint: &Footprint, encoding: &'static Encoding) -> BinaryResult<(Vec<u8>, u32)> {
    let mut out = BinaryWriter::new(Vec::new());
    out.write_string_block(&footprint.name, encoding)?;
    let (primitives, count) = write_primitives(footprint.primitives.iter().map(|p| (p, None)), encoding)?;
    out.write_bytes(&primitives)?;
    Ok((out.into_inner(), count))
}
