//! Binary PCB primitives.
//!
//! A primitive is an object id byte followed by one or more blocks. The
//! first block holding geometry opens with the [`PrimitiveCommon`] prefix;
//! bytes a block carries beyond the fields read here are ignored.

use std::io::Write;

use encoding_rs::Encoding;

use super::common::PrimitiveCommon;
use super::layer::Layer;
use crate::binary::{BinaryError, BinaryReader, BinaryResult, BinaryWriter, BufferPool};
use crate::coord::{Coord, CoordPoint};
use crate::mapping::int_enum;
use crate::params::{Dialect, OwnedParameters, ParameterCollection, ParameterWriter};

int_enum! {
    pub enum PadShape {
        Round = 1,
        Rectangular = 2,
        Octagonal = 3,
        RoundedRectangle = 9,
    }
}

int_enum! {
    /// How pad sizes vary across the layer stack.
    pub enum PadMode {
        Simple = 0,
        TopMiddleBottom = 1,
        FullStack = 2,
    }
}

int_enum! {
    pub enum TextKind {
        Stroke = 0,
        TrueType = 1,
        BarCode = 2,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arc {
    pub common: PrimitiveCommon,
    pub center: CoordPoint,
    pub radius: Coord,
    /// Degrees
    pub start_angle: f64,
    pub end_angle: f64,
    pub width: Coord,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pad {
    pub common: PrimitiveCommon,
    pub designator: String,
    pub location: CoordPoint,
    pub size_top: CoordPoint,
    pub size_middle: CoordPoint,
    pub size_bottom: CoordPoint,
    pub hole_size: Coord,
    pub shape_top: PadShape,
    pub shape_middle: PadShape,
    pub shape_bottom: PadShape,
    pub rotation: f64,
    pub plated: bool,
    pub mode: PadMode,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Via {
    pub common: PrimitiveCommon,
    pub center: CoordPoint,
    pub diameter: Coord,
    pub hole_size: Coord,
    pub start_layer: Layer,
    pub end_layer: Layer,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    pub common: PrimitiveCommon,
    pub start: CoordPoint,
    pub end: CoordPoint,
    pub width: Coord,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Text {
    pub common: PrimitiveCommon,
    pub corner: CoordPoint,
    pub height: Coord,
    pub stroke_font: u16,
    pub rotation: f64,
    pub mirrored: bool,
    pub stroke_width: Coord,
    pub kind: TextKind,
    pub bold: bool,
    pub italic: bool,
    pub font_name: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fill {
    pub common: PrimitiveCommon,
    pub corner1: CoordPoint,
    pub corner2: CoordPoint,
    pub rotation: f64,
}

/// A copper or keep-out area given by its outline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    pub common: PrimitiveCommon,
    /// Region parameters, kept as written
    pub params: OwnedParameters,
    pub outline: Vec<CoordPoint>,
}

/// Any PCB primitive this crate decodes.
#[derive(Debug, Clone, PartialEq)]
pub enum PcbPrimitive {
    Arc(Arc),
    Pad(Pad),
    Via(Via),
    Track(Track),
    Text(Text),
    Fill(Fill),
    Region(Region),
}

/// Object id bytes.
pub mod object_id {
    pub const ARC: u8 = 1;
    pub const PAD: u8 = 2;
    pub const VIA: u8 = 3;
    pub const TRACK: u8 = 4;
    pub const TEXT: u8 = 5;
    pub const FILL: u8 = 6;
    pub const REGION: u8 = 11;
}

impl PcbPrimitive {
    pub fn object_id(&self) -> u8 {
        match self {
            PcbPrimitive::Arc(_) => object_id::ARC,
            PcbPrimitive::Pad(_) => object_id::PAD,
            PcbPrimitive::Via(_) => object_id::VIA,
            PcbPrimitive::Track(_) => object_id::TRACK,
            PcbPrimitive::Text(_) => object_id::TEXT,
            PcbPrimitive::Fill(_) => object_id::FILL,
            PcbPrimitive::Region(_) => object_id::REGION,
        }
    }

    pub fn common(&self) -> &PrimitiveCommon {
        match self {
            PcbPrimitive::Arc(p) => &p.common,
            PcbPrimitive::Pad(p) => &p.common,
            PcbPrimitive::Via(p) => &p.common,
            PcbPrimitive::Track(p) => &p.common,
            PcbPrimitive::Text(p) => &p.common,
            PcbPrimitive::Fill(p) => &p.common,
            PcbPrimitive::Region(p) => &p.common,
        }
    }

    /// Whether `id` is an object id this crate decodes.
    pub fn is_known(id: u8) -> bool {
        matches!(
            id,
            object_id::ARC
                | object_id::PAD
                | object_id::VIA
                | object_id::TRACK
                | object_id::TEXT
                | object_id::FILL
                | object_id::REGION
        )
    }

    /// Read the blocks of a primitive whose object id has been consumed.
    ///
    /// Returns the primitive and its owning component index. `id` must be
    /// one [`is_known`](Self::is_known) accepts.
    pub(crate) fn read(
        id: u8,
        r: &mut BinaryReader<'_>,
        encoding: &'static Encoding,
    ) -> BinaryResult<Option<(PcbPrimitive, Option<u16>)>> {
        let read = match id {
            object_id::ARC => read_arc(r)?,
            object_id::PAD => read_pad(r, encoding)?,
            object_id::VIA => read_via(r)?,
            object_id::TRACK => read_track(r)?,
            object_id::TEXT => read_text(r, encoding)?,
            object_id::FILL => read_fill(r)?,
            object_id::REGION => read_region(r, encoding)?,
            _ => return Ok(None),
        };
        Ok(Some(read))
    }

    /// Write the object id and blocks.
    pub(crate) fn write<W: Write>(
        &self,
        w: &mut BinaryWriter<W>,
        component: Option<u16>,
        encoding: &'static Encoding,
    ) -> BinaryResult<()> {
        let pool = BufferPool::shared();
        w.write_u8(self.object_id())?;
        match self {
            PcbPrimitive::Arc(arc) => w.write_block_with(pool, |b| {
                arc.common.write(b, component)?;
                b.write_coord_point(arc.center)?;
                b.write_coord(arc.radius)?;
                b.write_f64(arc.start_angle)?;
                b.write_f64(arc.end_angle)?;
                b.write_coord(arc.width)
            }),
            PcbPrimitive::Pad(pad) => {
                w.write_string_block(&pad.designator, encoding)?;
                w.write_block(&[])?;
                w.write_string_block("|&|0", encoding)?;
                w.write_block(&[])?;
                w.write_block_with(pool, |b| {
                    pad.common.write(b, component)?;
                    b.write_coord_point(pad.location)?;
                    b.write_coord_point(pad.size_top)?;
                    b.write_coord_point(pad.size_middle)?;
                    b.write_coord_point(pad.size_bottom)?;
                    b.write_coord(pad.hole_size)?;
                    for shape in [pad.shape_top, pad.shape_middle, pad.shape_bottom] {
                        b.write_u8(byte_field("pad shape", shape.into())?)?;
                    }
                    b.write_f64(pad.rotation)?;
                    b.write_bool(pad.plated)?;
                    b.write_u8(byte_field("pad mode", pad.mode.into())?)
                })?;
                w.write_block(&[])
            },
            PcbPrimitive::Via(via) => w.write_block_with(pool, |b| {
                via.common.write(b, component)?;
                b.write_coord_point(via.center)?;
                b.write_coord(via.diameter)?;
                b.write_coord(via.hole_size)?;
                b.write_u8(via.start_layer.0)?;
                b.write_u8(via.end_layer.0)
            }),
            PcbPrimitive::Track(track) => w.write_block_with(pool, |b| {
                track.common.write(b, component)?;
                b.write_coord_point(track.start)?;
                b.write_coord_point(track.end)?;
                b.write_coord(track.width)
            }),
            PcbPrimitive::Text(text) => {
                w.write_block_with(pool, |b| {
                    text.common.write(b, component)?;
                    b.write_coord_point(text.corner)?;
                    b.write_coord(text.height)?;
                    b.write_u16(text.stroke_font)?;
                    b.write_f64(text.rotation)?;
                    b.write_bool(text.mirrored)?;
                    b.write_coord(text.stroke_width)?;
                    b.write_u8(byte_field("text kind", text.kind.into())?)?;
                    b.write_bool(text.bold)?;
                    b.write_bool(text.italic)?;
                    b.write_font_name(&text.font_name)
                })?;
                w.write_string_block(&text.text, encoding)
            },
            PcbPrimitive::Fill(fill) => w.write_block_with(pool, |b| {
                fill.common.write(b, component)?;
                b.write_coord_point(fill.corner1)?;
                b.write_coord_point(fill.corner2)?;
                b.write_f64(fill.rotation)
            }),
            PcbPrimitive::Region(region) => w.write_block_with(pool, |b| {
                region.common.write(b, component)?;
                let mut text = Vec::new();
                let mut params = ParameterWriter::new(&mut text, encoding).with_dialect(Dialect::Pcb);
                region.params.write_to(&mut params, &[]);
                params.finish()?;
                b.write_parameter_block(&text)?;
                b.write_u32(region.outline.len() as u32)?;
                for point in &region.outline {
                    b.write_f64(f64::from(point.x.raw()))?;
                    b.write_f64(f64::from(point.y.raw()))?;
                }
                Ok(())
            }),
        }
    }
}

type Decoded = (PcbPrimitive, Option<u16>);

fn read_arc(r: &mut BinaryReader<'_>) -> BinaryResult<Decoded> {
    let mut b = r.read_block()?.reader();
    let (common, component) = PrimitiveCommon::read(&mut b)?;
    let arc = Arc {
        common,
        center: b.read_coord_point()?,
        radius: b.read_coord()?,
        start_angle: b.read_f64()?,
        end_angle: b.read_f64()?,
        width: b.read_coord()?,
    };
    Ok((PcbPrimitive::Arc(arc), component))
}

fn read_pad(r: &mut BinaryReader<'_>, encoding: &'static Encoding) -> BinaryResult<Decoded> {
    let designator = r.read_string_block(encoding)?.into_owned();
    r.skip_block()?;
    r.skip_block()?;
    r.skip_block()?;
    let mut b = r.read_block()?.reader();
    // Per-layer sizes; empty unless the pad uses a full stack.
    r.skip_block()?;

    let (common, component) = PrimitiveCommon::read(&mut b)?;
    let location = b.read_coord_point()?;
    let size_top = b.read_coord_point()?;
    let size_middle = b.read_coord_point()?;
    let size_bottom = b.read_coord_point()?;
    let hole_size = b.read_coord()?;
    let shape_top = PadShape::from(i32::from(b.read_u8()?));
    let shape_middle = PadShape::from(i32::from(b.read_u8()?));
    let shape_bottom = PadShape::from(i32::from(b.read_u8()?));
    let rotation = b.read_f64()?;
    let plated = b.read_bool()?;
    let mode = PadMode::from(i32::from(b.read_u8()?));
    let pad = Pad {
        common,
        designator,
        location,
        size_top,
        size_middle,
        size_bottom,
        hole_size,
        shape_top,
        shape_middle,
        shape_bottom,
        rotation,
        plated,
        mode,
    };
    Ok((PcbPrimitive::Pad(pad), component))
}

fn read_via(r: &mut BinaryReader<'_>) -> BinaryResult<Decoded> {
    let mut b = r.read_block()?.reader();
    let (common, component) = PrimitiveCommon::read(&mut b)?;
    let via = Via {
        common,
        center: b.read_coord_point()?,
        diameter: b.read_coord()?,
        hole_size: b.read_coord()?,
        start_layer: Layer(b.read_u8()?),
        end_layer: Layer(b.read_u8()?),
    };
    Ok((PcbPrimitive::Via(via), component))
}

fn read_track(r: &mut BinaryReader<'_>) -> BinaryResult<Decoded> {
    let mut b = r.read_block()?.reader();
    let (common, component) = PrimitiveCommon::read(&mut b)?;
    let track = Track {
        common,
        start: b.read_coord_point()?,
        end: b.read_coord_point()?,
        width: b.read_coord()?,
    };
    Ok((PcbPrimitive::Track(track), component))
}

fn read_text(r: &mut BinaryReader<'_>, encoding: &'static Encoding) -> BinaryResult<Decoded> {
    let mut b = r.read_block()?.reader();
    let (common, component) = PrimitiveCommon::read(&mut b)?;
    let corner = b.read_coord_point()?;
    let height = b.read_coord()?;
    let stroke_font = b.read_u16()?;
    let rotation = b.read_f64()?;
    let mirrored = b.read_bool()?;
    let stroke_width = b.read_coord()?;
    let kind = TextKind::from(i32::from(b.read_u8()?));
    let bold = b.read_bool()?;
    let italic = b.read_bool()?;
    let font_name = b.read_font_name()?;
    let text = r.read_string_block(encoding)?.into_owned();
    let text = Text {
        common,
        corner,
        height,
        stroke_font,
        rotation,
        mirrored,
        stroke_width,
        kind,
        bold,
        italic,
        font_name,
        text,
    };
    Ok((PcbPrimitive::Text(text), component))
}

fn read_fill(r: &mut BinaryReader<'_>) -> BinaryResult<Decoded> {
    let mut b = r.read_block()?.reader();
    let (common, component) = PrimitiveCommon::read(&mut b)?;
    let fill = Fill {
        common,
        corner1: b.read_coord_point()?,
        corner2: b.read_coord_point()?,
        rotation: b.read_f64()?,
    };
    Ok((PcbPrimitive::Fill(fill), component))
}

fn read_region(r: &mut BinaryReader<'_>, encoding: &'static Encoding) -> BinaryResult<Decoded> {
    let mut b = r.read_block()?.reader();
    let (common, component) = PrimitiveCommon::read(&mut b)?;
    let text = b.read_parameter_block()?;
    let params = OwnedParameters::from_collection(&ParameterCollection::parse(text.data()), encoding);
    let count = b.read_u32()? as usize;
    let mut outline = Vec::with_capacity(count.min(b.remaining() / 16));
    for _ in 0..count {
        let x = raw_from_f64(b.read_f64()?);
        let y = raw_from_f64(b.read_f64()?);
        outline.push(CoordPoint::new(x, y));
    }
    let region = Region {
        common,
        params,
        outline,
    };
    Ok((PcbPrimitive::Region(region), component))
}

#[inline]
fn raw_from_f64(value: f64) -> Coord {
    // `as` saturates and maps NaN to zero.
    Coord::from_raw(value.round() as i32)
}

/// An enum value stored in a single byte.
fn byte_field(field: &'static str, value: i32) -> BinaryResult<u8> {
    u8::try_from(value).map_err(|_| BinaryError::ValueOutOfRange {
        field,
        value: i64::from(value),
        bits: 8,
    })
}

macro_rules! primitive_from {
    ( $( $variant:ident ),+ ) => {
        $(
            impl From<$variant> for PcbPrimitive {
                fn from(p: $variant) -> Self {
                    PcbPrimitive::$variant(p)
                }
            }
        )+
    };
}

primitive_from!(Arc, Pad, Via, Track, Text, Fill, Region);
