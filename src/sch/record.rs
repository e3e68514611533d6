//! Record dispatch and the record stream shared by libraries and documents.

use encoding_rs::Encoding;

use super::pin;
use super::records::*;
use crate::binary::{BinaryReader, BinaryWriter, BufferPool};
use crate::diagnostics::Diagnostics;
use crate::error::{DecodeError, Result};
use crate::hierarchy::OwnedRecord;
use crate::mapping::{FieldError, ParamFields};
use crate::options::Session;
use crate::params::{Dialect, OwnedParameters, ParameterCollection, ParameterWriter};

/// A record whose `RECORD` tag this crate does not map.
///
/// Its parameters are kept in order and written back unchanged, apart from
/// the owner index, which is recomputed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnknownRecord {
    /// Raw `RECORD` value
    pub kind: String,
    pub params: OwnedParameters,
}

macro_rules! sch_record_kinds {
    ( $( $variant:ident ),+ $(,)? ) => {
        /// Any schematic record.
        #[derive(Debug, Clone, PartialEq)]
        pub enum SchRecord {
            $( $variant($variant), )+
            Unknown(UnknownRecord),
        }

        impl SchRecord {
            /// The `RECORD` tag, or `None` for unrecognized records.
            pub fn kind(&self) -> Option<i32> {
                match self {
                    $( SchRecord::$variant(_) => Some($variant::KIND), )+
                    SchRecord::Unknown(_) => None,
                }
            }

            /// Type name, for messages.
            pub fn kind_name(&self) -> &'static str {
                match self {
                    $( SchRecord::$variant(_) => stringify!($variant), )+
                    SchRecord::Unknown(_) => "Unknown",
                }
            }

            /// Shared ownership fields, absent for unrecognized records.
            pub fn common(&self) -> Option<&Ownership> {
                match self {
                    $( SchRecord::$variant(r) => Some(&r.common), )+
                    SchRecord::Unknown(_) => None,
                }
            }

            fn read_known(
                kind: i32,
                params: &ParameterCollection<'_>,
                encoding: &'static Encoding,
            ) -> Option<std::result::Result<Self, FieldError>> {
                match kind {
                    $( $variant::KIND => Some($variant::read_fields(params, encoding).map(SchRecord::$variant)), )+
                    _ => None,
                }
            }

            fn write_fields(&self, w: &mut ParameterWriter<'_>) {
                match self {
                    $( SchRecord::$variant(r) => r.write_fields(w), )+
                    SchRecord::Unknown(u) => u.params.write_to(w, &["RECORD", "OWNERINDEX"]),
                }
            }
        }

        $(
            impl From<$variant> for SchRecord {
                fn from(record: $variant) -> Self {
                    SchRecord::$variant(record)
                }
            }
        )+
    };
}

sch_record_kinds! {
    Component,
    Pin,
    Label,
    Bezier,
    Polyline,
    Polygon,
    Ellipse,
    RoundRectangle,
    EllipticalArc,
    Arc,
    Line,
    Rectangle,
    PowerPort,
    Port,
    NoErc,
    NetLabel,
    Bus,
    Wire,
    TextFrame,
    Junction,
    Sheet,
    Designator,
    Parameter,
    ImplementationList,
    Implementation,
    MapDefinerList,
    MapDefiner,
    ImplementationParameters,
}

impl OwnedRecord for SchRecord {
    fn can_own(&self) -> bool {
        matches!(
            self,
            SchRecord::Component(_)
                | SchRecord::Pin(_)
                | SchRecord::Port(_)
                | SchRecord::ImplementationList(_)
                | SchRecord::Implementation(_)
                | SchRecord::MapDefinerList(_)
        )
    }
}

impl SchRecord {
    /// Decode one record from its parameters. Returns the record and its
    /// owner index, `-1` when it names none.
    pub fn read(
        params: &ParameterCollection<'_>,
        index: usize,
        encoding: &'static Encoding,
        diags: &mut Diagnostics,
        stream: &str,
    ) -> std::result::Result<(SchRecord, i32), DecodeError> {
        let Some(tag) = params.get("RECORD") else {
            return Err(DecodeError::MissingKind { index });
        };
        let owner = match params.get("OWNERINDEX") {
            Some(p) if !p.raw_value().trim_ascii().is_empty() => p
                .as_i32()
                .map_err(|e| FieldError::from_value(&["OWNERINDEX"], e))?,
            _ => -1,
        };

        let known = tag
            .as_i32()
            .ok()
            .and_then(|kind| Self::read_known(kind, params, encoding));
        let record = match known {
            Some(record) => record?,
            None => {
                let kind = tag.value(encoding).into_owned();
                diags.info(stream, Some(index), format!("keeping unrecognized record kind {kind}"));
                let mut params = OwnedParameters::from_collection(params, encoding);
                params.remove("RECORD");
                params.remove("OWNERINDEX");
                SchRecord::Unknown(UnknownRecord { kind, params })
            },
        };
        Ok((record, owner))
    }

    /// Append `RECORD`, the owner index when there is one, then the fields.
    pub fn write(&self, owner: Option<usize>, w: &mut ParameterWriter<'_>) {
        match (self.kind(), self) {
            (Some(kind), _) => w.int(&["RECORD"], i64::from(kind)),
            (None, SchRecord::Unknown(u)) => w.string(&["RECORD"], &u.kind),
            (None, _) => {},
        }
        if let Some(owner) = owner {
            w.int(&["OWNERINDEX"], owner as i64);
        }
        self.write_fields(w);
    }
}

/// One decoded slot of a record stream.
#[derive(Debug)]
pub(crate) enum Decoded {
    Record { record: SchRecord, owner: i32 },
    /// A block this crate cannot decode, skipped
    Skipped,
}

/// Sequential decoder over the record blocks of one stream.
pub(crate) struct RecordStream<'a> {
    reader: BinaryReader<'a>,
    name: &'a str,
    index: usize,
}

impl<'a> RecordStream<'a> {
    pub fn new(reader: BinaryReader<'a>, name: &'a str) -> Self {
        Self {
            reader,
            name,
            index: 0,
        }
    }

    /// Decode the next record.
    ///
    /// Block flag 0 is a parameter record, 1 a binary pin. Other flags are
    /// skipped with an info diagnostic.
    pub fn next(&mut self, session: &Session<'_>, diags: &mut Diagnostics) -> Result<Option<Decoded>> {
        if !self.reader.has_more() {
            return Ok(None);
        }
        session.check_cancelled()?;
        let index = self.index;
        self.index += 1;

        let name = self.name;
        let corrupt = |e: crate::binary::BinaryError| session.corrupt(name, e);
        match self.reader.peek_block_flags().map_err(corrupt)? {
            0 => {
                let block = self.reader.read_parameter_block().map_err(corrupt)?;
                let params = ParameterCollection::parse(block.data());
                let (record, owner) = SchRecord::read(&params, index, session.encoding, diags, name)
                    .map_err(|e| session.corrupt(name, e))?;
                Ok(Some(Decoded::Record { record, owner }))
            },
            1 => {
                let block = self.reader.read_block().map_err(corrupt)?;
                let id = block.reader().read_i32().map_err(corrupt)?;
                if id != Pin::KIND {
                    return Err(session.unsupported(name, format!("binary record {id}")));
                }
                let pin = pin::read_binary_pin(block.data(), session.encoding).map_err(corrupt)?;
                Ok(Some(Decoded::Record {
                    record: SchRecord::Pin(pin),
                    owner: -1,
                }))
            },
            flags => {
                let skipped = self.reader.skip_block().map_err(corrupt)?;
                tracing::trace!(stream = name, index, flags, skipped, "skipped record block");
                diags.info(
                    name,
                    Some(index),
                    format!("skipped {skipped}-byte block with flags {flags:#04x}"),
                );
                Ok(Some(Decoded::Skipped))
            },
        }
    }
}

/// Write a record given by its tag and fields as a parameter block.
pub(crate) fn write_fields_block<T: ParamFields>(
    out: &mut BinaryWriter<Vec<u8>>,
    kind: i32,
    fields: &T,
    encoding: &'static Encoding,
) -> crate::binary::BinaryResult<()> {
    let mut text = BufferPool::shared().acquire();
    let mut w = ParameterWriter::new(&mut text, encoding).with_dialect(Dialect::Schematic);
    w.int(&["RECORD"], i64::from(kind));
    fields.write_fields(&mut w);
    w.finish()?;
    out.write_parameter_block(&text)
}

/// Write one record as a parameter block.
pub(crate) fn write_record_block(
    out: &mut BinaryWriter<Vec<u8>>,
    record: &SchRecord,
    owner: Option<usize>,
    encoding: &'static Encoding,
) -> crate::binary::BinaryResult<()> {
    let mut text = BufferPool::shared().acquire();
    let mut w = ParameterWriter::new(&mut text, encoding).with_dialect(Dialect::Schematic);
    record.write(owner, &mut w);
    w.finish()?;
    out.write_parameter_block(&text)
}
