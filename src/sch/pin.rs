//! Binary pin records.
//!
//! Library streams may store pins in a packed binary layout instead of
//! parameter text; the block's flag byte is 1 in that case. Pins are always
//! written back as parameter text.

use encoding_rs::Encoding;

use super::records::{Ownership, Pin, PinElectrical};
use crate::binary::{BinaryReader, BinaryResult};
use crate::coord::{Coord, CoordPoint};
use crate::mapping::Color;

/// Decode a binary pin block, including its leading record id.
pub(crate) fn read_binary_pin(data: &[u8], encoding: &'static Encoding) -> BinaryResult<Pin> {
    let mut r = BinaryReader::new(data);
    let _record = r.read_i32()?;
    let _reserved = r.read_u8()?;
    let owner_part_id = r.read_i16()?;
    let owner_part_display_mode = r.read_u8()?;
    let symbol_inner_edge = r.read_u8()?;
    let symbol_outer_edge = r.read_u8()?;
    let symbol_inner = r.read_u8()?;
    let symbol_outer = r.read_u8()?;
    let description = r.read_pascal_string(encoding)?.into_owned();
    let formal_type = r.read_u8()?;
    let electrical = r.read_u8()?;
    let conglomerate = r.read_u8()?;
    let length = r.read_i16()?;
    let x = r.read_i16()?;
    let y = r.read_i16()?;
    let color = r.read_i32()?;
    let name = r.read_pascal_string(encoding)?.into_owned();
    let designator = r.read_pascal_string(encoding)?.into_owned();
    let swap_id_pin = r.read_pascal_string(encoding)?.into_owned();
    let swap_id_part_pin = r.read_pascal_string(encoding)?.into_owned();
    let default_value = r.read_pascal_string(encoding)?.into_owned();

    Ok(Pin {
        common: Ownership {
            owner_part_id: i32::from(owner_part_id),
            owner_part_display_mode: i32::from(owner_part_display_mode),
            ..Ownership::default()
        },
        location: CoordPoint::from_dxp(i32::from(x), i32::from(y)),
        length: Coord::from_dxp(i32::from(length), 0),
        electrical: PinElectrical::from(i32::from(electrical)),
        conglomerate: i32::from(conglomerate),
        symbol_inner_edge: i32::from(symbol_inner_edge),
        symbol_outer_edge: i32::from(symbol_outer_edge),
        symbol_inner: i32::from(symbol_inner),
        symbol_outer: i32::from(symbol_outer),
        formal_type: i32::from(formal_type),
        name,
        designator,
        description,
        swap_id_pin,
        swap_id_part_pin,
        default_value,
        color: Color(color as u32),
    })
}
