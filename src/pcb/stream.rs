//! Reading and writing runs of primitives within one stream.

use encoding_rs::Encoding;

use super::primitives::PcbPrimitive;
use crate::binary::{BinaryError, BinaryReader, BinaryResult, BinaryWriter};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::options::Session;

/// One decoded slot of a primitive stream.
#[derive(Debug)]
pub(crate) enum Decoded {
    Primitive {
        primitive: PcbPrimitive,
        component: Option<u16>,
    },
    /// An object this crate does not decode, skipped
    Skipped,
}

pub(crate) struct PrimitiveStream<'a> {
    reader: BinaryReader<'a>,
    name: &'a str,
    index: usize,
}

impl<'a> PrimitiveStream<'a> {
    pub fn new(reader: BinaryReader<'a>, name: &'a str) -> Self {
        Self {
            reader,
            name,
            index: 0,
        }
    }

    /// Objects consumed so far, skipped ones included.
    #[inline]
    pub fn count(&self) -> usize {
        self.index
    }

    pub fn next(&mut self, session: &Session<'_>, diags: &mut Diagnostics) -> Result<Option<Decoded>> {
        if !self.reader.has_more() {
            return Ok(None);
        }
        session.check_cancelled()?;
        let index = self.index;
        self.index += 1;

        let name = self.name;
        let corrupt = |e: BinaryError| session.corrupt(name, e);
        let id = self.reader.read_u8().map_err(corrupt)?;
        match PcbPrimitive::read(id, &mut self.reader, session.encoding).map_err(corrupt)? {
            Some((primitive, component)) => Ok(Some(Decoded::Primitive { primitive, component })),
            None => {
                let skipped = self.reader.skip_block().map_err(corrupt)?;
                tracing::trace!(stream = name, index, id, skipped, "skipped primitive");
                diags.info(name, Some(index), format!("skipped object with id {id}"));
                Ok(Some(Decoded::Skipped))
            },
        }
    }
}

/// Write primitives back to back, each with its owning component index.
pub(crate) fn write_primitives<'p>(
    primitives: impl IntoIterator<Item = (&'p PcbPrimitive, Option<u16>)>,
    encoding: &'static Encoding,
) -> BinaryResult<(Vec<u8>, u32)> {
    let mut out = BinaryWriter::new(Vec::new());
    let mut count = 0u32;
    for (primitive, component) in primitives {
        primitive.write(&mut out, component, encoding)?;
        count += 1;
    }
    Ok((out.into_inner(), count))
}
