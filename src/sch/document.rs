//! Schematic documents (`.SchDoc`).
//!
//! The whole document lives in the `FileHeader` stream: a header parameter
//! block, then one block per record. The first record is the sheet; owner
//! indices count from it, so an owner index of 0 means "top level".

use encoding_rs::Encoding;

use crate::binary::{BinaryReader, BinaryResult, BinaryWriter};
use crate::container::{StreamSink, StreamSource};
use crate::diagnostics::Diagnostics;
use crate::error::{DecodeError, Result};
use crate::hierarchy::{HierarchyBuilder, Node, flatten};
use crate::options::{ReadOptions, Session, WriteOptions};
use crate::params::{ParameterCollection, ParameterWriter};

use super::header::{DOCUMENT_FAMILY, DOCUMENT_HEADER, FILE_HEADER_STREAM, check_header};
use super::record::{Decoded, RecordStream, SchRecord, write_fields_block, write_record_block};
use super::records::{Component, Sheet};

/// A schematic sheet and the records placed on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchDocument {
    pub sheet: Sheet,
    /// Top-level records with the records they own
    pub records: Vec<Node<SchRecord>>,
    diagnostics: Diagnostics,
}

impl SchDocument {
    pub fn new(sheet: Sheet) -> Self {
        Self {
            sheet,
            ..Self::default()
        }
    }

    pub fn with_record(mut self, node: impl Into<Node<SchRecord>>) -> Self {
        self.records.push(node.into());
        self
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Top-level components with their subtrees.
    pub fn components(&self) -> impl Iterator<Item = (&Component, &[Node<SchRecord>])> {
        self.records.iter().filter_map(|node| match &node.record {
            SchRecord::Component(c) => Some((c, node.children.as_slice())),
            _ => None,
        })
    }

    /// Total number of records below the sheet.
    pub fn record_count(&self) -> usize {
        self.records.iter().map(|n| 1 + n.descendant_count()).sum()
    }

    pub fn read<S: StreamSource + ?Sized>(source: &S, options: &ReadOptions) -> Result<Self> {
        let session = options.session();
        session.check_cancelled()?;
        let data = session.required(source, FILE_HEADER_STREAM)?;
        let mut diags = Diagnostics::new();

        let mut reader = BinaryReader::new(data);
        let header = reader
            .read_parameter_block()
            .map_err(|e| session.corrupt(FILE_HEADER_STREAM, e))?;
        check_header(&ParameterCollection::parse(header.data()), DOCUMENT_FAMILY)
            .map_err(|e| session.corrupt(FILE_HEADER_STREAM, e))?;

        let mut records = RecordStream::new(reader, FILE_HEADER_STREAM);
        let sheet = read_sheet(&mut records, &session, &mut diags)?;

        let mut builder = HierarchyBuilder::new();
        builder.push_document();
        while let Some(decoded) = records.next(&session, &mut diags)? {
            match decoded {
                Decoded::Record { record, owner } => {
                    builder.push(record, owner, &mut diags, FILE_HEADER_STREAM);
                },
                Decoded::Skipped => builder.push_dropped(),
            }
        }
        let records = builder.finish();
        tracing::debug!(records = records.len(), diagnostics = diags.len(), "read SchDoc");

        Ok(Self {
            sheet,
            records,
            diagnostics: diags,
        })
    }

    pub fn write<S: StreamSink + ?Sized>(&self, sink: &mut S, options: &WriteOptions) -> Result<()> {
        let session = options.session();
        session.check_cancelled()?;
        let data = self
            .write_stream(session.encoding)
            .map_err(|e| session.encode_failed(FILE_HEADER_STREAM, e))?;
        session.put(sink, FILE_HEADER_STREAM, data)
    }

    fn write_stream(&self, encoding: &'static Encoding) -> BinaryResult<Vec<u8>> {
        let (components, others): (Vec<_>, Vec<_>) = self
            .records
            .iter()
            .partition(|n| matches!(n.record, SchRecord::Component(_)));
        let flat = flatten(others.into_iter().chain(components), 1);

        let mut text = Vec::new();
        let mut w = ParameterWriter::new(&mut text, encoding);
        w.string(&["HEADER"], DOCUMENT_HEADER);
        w.int(&["WEIGHT"], flat.len() as i64 + 1);
        w.finish()?;

        let mut out = BinaryWriter::new(Vec::new());
        out.write_parameter_block(&text)?;
        write_fields_block(&mut out, Sheet::KIND, &self.sheet, encoding)?;
        for record in flat {
            write_record_block(&mut out, record.record, record.owner, encoding)?;
        }
        Ok(out.into_inner())
    }
}

fn read_sheet(records: &mut RecordStream<'_>, session: &Session<'_>, diags: &mut Diagnostics) -> Result<Sheet> {
    match records.next(session, diags)? {
        Some(Decoded::Record {
            record: SchRecord::Sheet(sheet),
            ..
        }) => Ok(sheet),
        _ => Err(session.corrupt(
            FILE_HEADER_STREAM,
            DecodeError::UnexpectedRecord {
                index: 0,
                expected: "sheet",
            },
        )),
    }
}

impl From<SchRecord> for Node<SchRecord> {
    fn from(record: SchRecord) -> Self {
        Node::new(record)
    }
}
