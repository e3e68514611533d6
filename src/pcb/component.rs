//! Parameter records of the PCB formats.
//!
//! These are written in the PCB dialect: `TRUE`/`FALSE` booleans, lengths as
//! mil text, every field present.

use super::layer::Layer;
use crate::mapping::{MilCoord, param_fields};

param_fields! {
    /// A placed footprint on a board (`Components6`).
    pub struct PcbComponent {
        pub layer: Layer = "LAYER",
        pub x: MilCoord = "X",
        pub y: MilCoord = "Y",
        pub rotation: f64 = "ROTATION",
        pub pattern: String = "PATTERN",
        pub height: MilCoord = "HEIGHT",
        pub name_on: bool = "NAMEON",
        pub comment_on: bool = "COMMENTON",
        pub locked: bool = "LOCKED",
        pub source_designator: String = "SOURCEDESIGNATOR",
        pub source_description: String = "SOURCEDESCRIPTION",
        pub source_lib_reference: String = "SOURCELIBREFERENCE",
        pub source_footprint_library: String = "SOURCEFOOTPRINTLIBRARY",
        pub unique_id: String = "UNIQUEID",
    }
}

param_fields! {
    /// Properties of a library footprint (`<key>/Parameters`).
    pub struct FootprintParameters {
        pub height: MilCoord = "HEIGHT",
        pub description: String = "DESCRIPTION",
        pub item_guid: String = "ITEMGUID",
        pub revision_guid: String = "REVISIONGUID",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coord;
    use crate::encoding::DEFAULT_ENCODING;
    use crate::mapping::ParamFields;
    use crate::params::{Dialect, ParameterCollection, ParameterWriter};

    #[test]
    fn test_component_pcb_dialect() {
        let component = PcbComponent {
            layer: Layer::BOTTOM,
            x: MilCoord(Coord::from_mils(1234.5)),
            y: MilCoord(Coord::from_mils(-20.0)),
            rotation: 90.0,
            pattern: "SOIC-8".to_string(),
            name_on: true,
            source_designator: "U3".to_string(),
            ..PcbComponent::default()
        };
        let mut out = Vec::new();
        component.write_fields(&mut ParameterWriter::new(&mut out, DEFAULT_ENCODING).with_dialect(Dialect::Pcb));
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.starts_with("|LAYER=BOTTOM|X=1234.5mil|Y=-20mil|ROTATION=90.0|PATTERN=SOIC-8"), "{text}");
        assert!(text.contains("|NAMEON=TRUE|COMMENTON=FALSE|"), "{text}");

        let read = PcbComponent::read_fields(&ParameterCollection::parse(&out), DEFAULT_ENCODING).unwrap();
        assert_eq!(read, component);
    }

    #[test]
    fn test_bad_mil_text() {
        let params = ParameterCollection::parse_str("|X=12 furlongs|");
        let err = PcbComponent::read_fields(&params, DEFAULT_ENCODING).unwrap_err();
        assert_eq!(err.field, "X");
    }
}
