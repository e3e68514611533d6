//! Board layers.
//!
//! Binary primitives store a layer as its one-byte id; parameter text uses
//! the layer name (`TOP`, `MID3`, `MECHANICAL13`).

use std::fmt;

use encoding_rs::Encoding;
use phf::{Map, phf_map};

use crate::mapping::{FieldError, FieldValue};
use crate::params::{ParameterCollection, ParameterWriter};

/// A layer id as stored in binary primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Layer(pub u8);

static LAYER_IDS: Map<&'static str, u8> = phf_map! {
    "TOP" => 1,
    "MID1" => 2, "MID2" => 3, "MID3" => 4, "MID4" => 5, "MID5" => 6,
    "MID6" => 7, "MID7" => 8, "MID8" => 9, "MID9" => 10, "MID10" => 11,
    "MID11" => 12, "MID12" => 13, "MID13" => 14, "MID14" => 15, "MID15" => 16,
    "MID16" => 17, "MID17" => 18, "MID18" => 19, "MID19" => 20, "MID20" => 21,
    "MID21" => 22, "MID22" => 23, "MID23" => 24, "MID24" => 25, "MID25" => 26,
    "MID26" => 27, "MID27" => 28, "MID28" => 29, "MID29" => 30, "MID30" => 31,
    "BOTTOM" => 32,
    "TOPOVERLAY" => 33,
    "BOTTOMOVERLAY" => 34,
    "TOPPASTE" => 35,
    "BOTTOMPASTE" => 36,
    "TOPSOLDER" => 37,
    "BOTTOMSOLDER" => 38,
    "PLANE1" => 39, "PLANE2" => 40, "PLANE3" => 41, "PLANE4" => 42,
    "PLANE5" => 43, "PLANE6" => 44, "PLANE7" => 45, "PLANE8" => 46,
    "PLANE9" => 47, "PLANE10" => 48, "PLANE11" => 49, "PLANE12" => 50,
    "PLANE13" => 51, "PLANE14" => 52, "PLANE15" => 53, "PLANE16" => 54,
    "DRILLGUIDE" => 55,
    "KEEPOUT" => 56,
    "MECHANICAL1" => 57, "MECHANICAL2" => 58, "MECHANICAL3" => 59,
    "MECHANICAL4" => 60, "MECHANICAL5" => 61, "MECHANICAL6" => 62,
    "MECHANICAL7" => 63, "MECHANICAL8" => 64, "MECHANICAL9" => 65,
    "MECHANICAL10" => 66, "MECHANICAL11" => 67, "MECHANICAL12" => 68,
    "MECHANICAL13" => 69, "MECHANICAL14" => 70, "MECHANICAL15" => 71,
    "MECHANICAL16" => 72,
    "DRILLDRAWING" => 73,
    "MULTILAYER" => 74,
};

impl Layer {
    pub const TOP: Layer = Layer(1);
    pub const BOTTOM: Layer = Layer(32);
    pub const TOP_OVERLAY: Layer = Layer(33);
    pub const BOTTOM_OVERLAY: Layer = Layer(34);
    pub const KEEP_OUT: Layer = Layer(56);
    pub const MULTI_LAYER: Layer = Layer(74);

    /// Look up a layer by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Layer> {
        let name = name.trim();
        if name.len() > 16 {
            return None;
        }
        let mut upper = [0u8; 16];
        let upper = &mut upper[..name.len()];
        upper.copy_from_slice(name.as_bytes());
        upper.make_ascii_uppercase();
        let upper = std::str::from_utf8(upper).ok()?;
        LAYER_IDS.get(upper).copied().map(Layer)
    }

    /// Canonical name, or `None` for ids without one.
    pub fn name(self) -> Option<String> {
        let n = self.0;
        let fixed = match n {
            1 => "TOP",
            32 => "BOTTOM",
            33 => "TOPOVERLAY",
            34 => "BOTTOMOVERLAY",
            35 => "TOPPASTE",
            36 => "BOTTOMPASTE",
            37 => "TOPSOLDER",
            38 => "BOTTOMSOLDER",
            55 => "DRILLGUIDE",
            56 => "KEEPOUT",
            73 => "DRILLDRAWING",
            74 => "MULTILAYER",
            2..=31 => return Some(format!("MID{}", n - 1)),
            39..=54 => return Some(format!("PLANE{}", n - 38)),
            57..=72 => return Some(format!("MECHANICAL{}", n - 56)),
            _ => return None,
        };
        Some(fixed.to_string())
    }
}

impl Default for Layer {
    fn default() -> Self {
        Layer::TOP
    }
}

impl From<u8> for Layer {
    fn from(id: u8) -> Self {
        Layer(id)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(&name),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Layers are written by name; ids without a name are written as numbers
/// and read back either way.
impl FieldValue for Layer {
    fn read_field(
        params: &ParameterCollection<'_>,
        name: &str,
        encoding: &'static Encoding,
    ) -> Result<Self, FieldError> {
        let Some(p) = params.get(name) else {
            return Ok(Layer::default());
        };
        let text = p.value(encoding);
        if let Some(layer) = Layer::from_name(&text) {
            return Ok(layer);
        }
        text.trim()
            .parse::<u8>()
            .map(Layer)
            .map_err(|_| FieldError::new(name, format!("unknown layer {text:?}")))
    }

    fn write_field(&self, name: &str, w: &mut ParameterWriter<'_>) {
        match self.name() {
            Some(layer) => w.string(&[name], &layer),
            None => w.int(&[name], i64::from(self.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::DEFAULT_ENCODING;

    #[test]
    fn test_names_and_ids_agree() {
        for id in 1..=74u8 {
            let name = Layer(id).name().unwrap();
            assert_eq!(Layer::from_name(&name), Some(Layer(id)), "{name}");
        }
        assert_eq!(Layer(0).name(), None);
        assert_eq!(Layer(200).name(), None);
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(Layer::from_name("TopOverlay"), Some(Layer::TOP_OVERLAY));
        assert_eq!(Layer::from_name("mechanical13"), Some(Layer(69)));
        assert_eq!(Layer::from_name("Mid30"), Some(Layer(31)));
        assert_eq!(Layer::from_name("MID31"), None);
        assert_eq!(Layer::from_name("SOMETHING_VERY_LONG_NAME"), None);
    }

    #[test]
    fn test_field_value() {
        let params = ParameterCollection::parse_str("|LAYER=Bottom|V7_LAYER=120|BAD=NOWHERE|");
        assert_eq!(Layer::read_field(&params, "LAYER", DEFAULT_ENCODING).unwrap(), Layer::BOTTOM);
        assert_eq!(Layer::read_field(&params, "V7_LAYER", DEFAULT_ENCODING).unwrap(), Layer(120));
        assert!(Layer::read_field(&params, "BAD", DEFAULT_ENCODING).is_err());
        assert_eq!(Layer::read_field(&params, "NONE", DEFAULT_ENCODING).unwrap(), Layer::TOP);

        let mut out = Vec::new();
        let mut w = ParameterWriter::new(&mut out, DEFAULT_ENCODING);
        Layer(4).write_field("LAYER", &mut w);
        Layer(120).write_field("V7_LAYER", &mut w);
        assert_eq!(out, b"|LAYER=MID3|V7_LAYER=120");
    }
}
