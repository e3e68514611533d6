//! Prefix shared by every binary PCB primitive.

use std::io::Write;

use bitflags::bitflags;

use super::layer::Layer;
use crate::binary::{BinaryReader, BinaryResult, BinaryWriter};

/// Size of the common prefix in bytes.
pub const COMMON_PREFIX_SIZE: usize = 13;

/// Component index meaning "not part of a component".
pub const NO_COMPONENT: u16 = 0xFFFF;

bitflags! {
    /// Primitive state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PcbFlags: u16 {
        const UNLOCKED = 0x0004;
        const TENTING_TOP = 0x0020;
        const TENTING_BOTTOM = 0x0040;
        const FABRICATION_TOP = 0x0080;
        const FABRICATION_BOTTOM = 0x0100;
        const KEEP_OUT = 0x0200;
    }
}

impl Default for PcbFlags {
    fn default() -> Self {
        PcbFlags::UNLOCKED
    }
}

/// Layer, flags and connectivity of a primitive.
///
/// The component index stored next to these fields is not kept here: it is
/// a position in the component list, recomputed from the tree on write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PrimitiveCommon {
    pub layer: Layer,
    pub flags: PcbFlags,
    /// Net index, `0xFFFF` for no net
    pub net: u16,
    /// Owning polygon index, `0xFFFF` for none
    pub polygon: u16,
}

impl PrimitiveCommon {
    pub fn on_layer(layer: Layer) -> Self {
        Self {
            layer,
            net: 0xFFFF,
            polygon: 0xFFFF,
            ..Self::default()
        }
    }

    /// Read the prefix and the owning component index, if any.
    pub(crate) fn read(r: &mut BinaryReader<'_>) -> BinaryResult<(Self, Option<u16>)> {
        let layer = Layer(r.read_u8()?);
        let flags = PcbFlags::from_bits_retain(r.read_u16()?);
        let net = r.read_u16()?;
        let polygon = r.read_u16()?;
        let component = r.read_u16()?;
        r.skip(4)?;
        let common = Self {
            layer,
            flags,
            net,
            polygon,
        };
        Ok((common, (component != NO_COMPONENT).then_some(component)))
    }

    pub(crate) fn write<W: Write>(&self, w: &mut BinaryWriter<W>, component: Option<u16>) -> BinaryResult<()> {
        w.write_u8(self.layer.0)?;
        w.write_u16(self.flags.bits())?;
        w.write_u16(self.net)?;
        w.write_u16(self.polygon)?;
        w.write_u16(component.unwrap_or(NO_COMPONENT))?;
        w.write_fill(0xFF, 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_layout() {
        let common = PrimitiveCommon {
            layer: Layer::BOTTOM,
            flags: PcbFlags::UNLOCKED | PcbFlags::TENTING_TOP,
            net: 7,
            polygon: 0xFFFF,
        };
        let mut out = Vec::new();
        common.write(&mut BinaryWriter::new(&mut out), Some(2)).unwrap();
        assert_eq!(out.len(), COMMON_PREFIX_SIZE);
        assert_eq!(out, [32, 0x24, 0, 7, 0, 0xFF, 0xFF, 2, 0, 0xFF, 0xFF, 0xFF, 0xFF]);

        let mut r = BinaryReader::new(&out);
        assert_eq!(PrimitiveCommon::read(&mut r).unwrap(), (common, Some(2)));
        assert!(!r.has_more());
    }

    #[test]
    fn test_unknown_flag_bits_survive() {
        let data = [1, 0x01, 0x80, 0, 0, 0, 0, 0xFF, 0xFF, 0, 0, 0, 0];
        let (common, component) = PrimitiveCommon::read(&mut BinaryReader::new(&data)).unwrap();
        assert_eq!(common.flags.bits(), 0x8001);
        assert_eq!(component, None);

        let mut out = Vec::new();
        common.write(&mut BinaryWriter::new(&mut out), component).unwrap();
        assert_eq!(&out[..3], &data[..3]);
    }
}
