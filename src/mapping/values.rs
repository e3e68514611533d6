//! [`FieldValue`] implementations for the field types records use.

use encoding_rs::Encoding;

use super::{FieldError, FieldValue};
use crate::coord::{Coord, CoordPoint};
use crate::params::{ParameterCollection, ParameterWriter, parse_bool};

impl FieldValue for i32 {
    fn read_field(
        params: &ParameterCollection<'_>,
        name: &str,
        _encoding: &'static Encoding,
    ) -> Result<Self, FieldError> {
        read_i32(params, &[name])
    }

    fn write_field(&self, name: &str, w: &mut ParameterWriter<'_>) {
        w.int(&[name], i64::from(*self));
    }
}

impl FieldValue for bool {
    fn read_field(
        params: &ParameterCollection<'_>,
        name: &str,
        _encoding: &'static Encoding,
    ) -> Result<Self, FieldError> {
        Ok(params.get(name).is_some_and(|p| parse_bool(p.raw_value())))
    }

    fn write_field(&self, name: &str, w: &mut ParameterWriter<'_>) {
        w.bool(&[name], *self);
    }
}

impl FieldValue for String {
    fn read_field(
        params: &ParameterCollection<'_>,
        name: &str,
        encoding: &'static Encoding,
    ) -> Result<Self, FieldError> {
        Ok(params
            .value(name, encoding)
            .map(|v| v.into_owned())
            .unwrap_or_default())
    }

    fn write_field(&self, name: &str, w: &mut ParameterWriter<'_>) {
        w.string(&[name], self);
    }
}

impl FieldValue for f64 {
    fn read_field(
        params: &ParameterCollection<'_>,
        name: &str,
        _encoding: &'static Encoding,
    ) -> Result<Self, FieldError> {
        match params.get(name) {
            Some(p) if !p.raw_value().trim_ascii().is_empty() => {
                p.as_f64().map_err(|e| FieldError::from_value(&[name], e))
            },
            _ => Ok(0.0),
        }
    }

    fn write_field(&self, name: &str, w: &mut ParameterWriter<'_>) {
        w.float(&[name], *self);
    }
}

/// A Win32 `COLORREF`: red in the low byte, then green, then blue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color(r as u32 | (g as u32) << 8 | (b as u32) << 16)
    }

    #[inline]
    pub const fn red(self) -> u8 {
        self.0 as u8
    }

    #[inline]
    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn blue(self) -> u8 {
        (self.0 >> 16) as u8
    }
}

impl FieldValue for Color {
    fn read_field(
        params: &ParameterCollection<'_>,
        name: &str,
        _encoding: &'static Encoding,
    ) -> Result<Self, FieldError> {
        let Some(p) = params.get(name) else {
            return Ok(Color(0));
        };
        let value = p.as_i64().map_err(|e| FieldError::from_value(&[name], e))?;
        u32::try_from(value)
            .map(Color)
            .map_err(|_| FieldError::new(name, format!("color {value} out of range")))
    }

    fn write_field(&self, name: &str, w: &mut ParameterWriter<'_>) {
        w.int(&[name], i64::from(self.0));
    }
}

/// Upper bound on indexed entries (vertices, fonts) in one record.
const MAX_INDEXED_ENTRIES: usize = 1 << 16;

fn read_count(params: &ParameterCollection<'_>, name: &str) -> Result<usize, FieldError> {
    let count = read_i32(params, &[name])?;
    match usize::try_from(count) {
        Ok(n) if n <= MAX_INDEXED_ENTRIES => Ok(n),
        _ => Err(FieldError::new(name, format!("entry count {count} out of range"))),
    }
}

fn read_i32(params: &ParameterCollection<'_>, name: &[&str]) -> Result<i32, FieldError> {
    match params.get_joined(name) {
        Some(p) if !p.raw_value().trim_ascii().is_empty() => {
            p.as_i32().map_err(|e| FieldError::from_value(name, e))
        },
        _ => Ok(0),
    }
}

/// Read a DXP primary value and its fraction into one coordinate.
fn read_dxp(
    params: &ParameterCollection<'_>,
    primary: &[&str],
    frac: &[&str],
) -> Result<Coord, FieldError> {
    Ok(Coord::from_dxp(read_i32(params, primary)?, read_i32(params, frac)?))
}

fn write_dxp(value: Coord, primary: &[&str], frac: &[&str], w: &mut ParameterWriter<'_>) {
    let (whole, rest) = value.to_dxp();
    let all = !w.omits_defaults();
    if all || whole != 0 {
        w.int(primary, i64::from(whole));
    }
    if all || rest != 0 {
        w.int(frac, i64::from(rest));
    }
}

impl FieldValue for Coord {
    fn read_field(
        params: &ParameterCollection<'_>,
        name: &str,
        _encoding: &'static Encoding,
    ) -> Result<Self, FieldError> {
        read_dxp(params, &[name], &[name, "_FRAC"])
    }

    fn write_field(&self, name: &str, w: &mut ParameterWriter<'_>) {
        write_dxp(*self, &[name], &[name, "_FRAC"], w);
    }
}

impl FieldValue for CoordPoint {
    fn read_field(
        params: &ParameterCollection<'_>,
        name: &str,
        _encoding: &'static Encoding,
    ) -> Result<Self, FieldError> {
        Ok(CoordPoint::new(
            read_dxp(params, &[name, ".X"], &[name, ".X", "_FRAC"])?,
            read_dxp(params, &[name, ".Y"], &[name, ".Y", "_FRAC"])?,
        ))
    }

    fn write_field(&self, name: &str, w: &mut ParameterWriter<'_>) {
        write_dxp(self.x, &[name, ".X"], &[name, ".X", "_FRAC"], w);
        write_dxp(self.y, &[name, ".Y"], &[name, ".Y", "_FRAC"], w);
    }
}

/// A coordinate stored as mil text (`"1234.5mil"`), as PCB parameters use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MilCoord(pub Coord);

impl FieldValue for MilCoord {
    fn read_field(
        params: &ParameterCollection<'_>,
        name: &str,
        _encoding: &'static Encoding,
    ) -> Result<Self, FieldError> {
        let Some(p) = params.get(name) else {
            return Ok(MilCoord(Coord::ZERO));
        };
        if p.raw_value().trim_ascii().is_empty() {
            return Ok(MilCoord(Coord::ZERO));
        }
        Coord::parse_mil_text(p.raw_value())
            .map(MilCoord)
            .ok_or_else(|| {
                FieldError::new(
                    name,
                    format!("invalid length {:?}", String::from_utf8_lossy(p.raw_value())),
                )
            })
    }

    fn write_field(&self, name: &str, w: &mut ParameterWriter<'_>) {
        w.mil(&[name], self.0);
    }
}

/// A vertex list stored as a count parameter plus `X{n}`/`Y{n}` pairs,
/// numbered from 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vertices(pub Vec<CoordPoint>);

impl FieldValue for Vertices {
    fn read_field(
        params: &ParameterCollection<'_>,
        name: &str,
        _encoding: &'static Encoding,
    ) -> Result<Self, FieldError> {
        let count = read_count(params, name)?;
        let mut points = Vec::with_capacity(count);
        let mut index = itoa::Buffer::new();
        for n in 1..=count {
            let n = index.format(n);
            let x = read_dxp(params, &["X", n], &["X", n, "_FRAC"])?;
            let y = read_dxp(params, &["Y", n], &["Y", n, "_FRAC"])?;
            points.push(CoordPoint::new(x, y));
        }
        Ok(Vertices(points))
    }

    fn write_field(&self, name: &str, w: &mut ParameterWriter<'_>) {
        w.int(&[name], self.0.len() as i64);
        let mut index = itoa::Buffer::new();
        for (i, point) in self.0.iter().enumerate() {
            let n = index.format(i + 1);
            write_dxp(point.x, &["X", n], &["X", n, "_FRAC"], w);
            write_dxp(point.y, &["Y", n], &["Y", n, "_FRAC"], w);
        }
    }
}

/// One entry of a sheet or library font table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Font {
    pub name: String,
    pub size: i32,
    pub rotation: i32,
    pub italic: bool,
    pub bold: bool,
    pub underline: bool,
    pub strikeout: bool,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            name: "Times New Roman".to_string(),
            size: 10,
            rotation: 0,
            italic: false,
            bold: false,
            underline: false,
            strikeout: false,
        }
    }
}

/// Indexed font table bound to its count parameter (`FontIdCount`).
///
/// Entry parameters are `Size{n}`, `FontName{n}` and so on, numbered from
/// 1. They are written in upper case when the count name is upper case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontTable(pub Vec<Font>);

struct FontKeys {
    size: &'static str,
    rotation: &'static str,
    italic: &'static str,
    bold: &'static str,
    underline: &'static str,
    strikeout: &'static str,
    name: &'static str,
}

const FONT_KEYS: FontKeys = FontKeys {
    size: "Size",
    rotation: "Rotation",
    italic: "Italic",
    bold: "Bold",
    underline: "Underline",
    strikeout: "Strikeout",
    name: "FontName",
};

const FONT_KEYS_UPPER: FontKeys = FontKeys {
    size: "SIZE",
    rotation: "ROTATION",
    italic: "ITALIC",
    bold: "BOLD",
    underline: "UNDERLINE",
    strikeout: "STRIKEOUT",
    name: "FONTNAME",
};

impl FieldValue for FontTable {
    fn read_field(
        params: &ParameterCollection<'_>,
        name: &str,
        encoding: &'static Encoding,
    ) -> Result<Self, FieldError> {
        let count = read_count(params, name)?;
        let keys = &FONT_KEYS;
        let mut fonts = Vec::with_capacity(count);
        let mut index = itoa::Buffer::new();
        for n in 1..=count {
            let n = index.format(n);
            let flag = |key: &str| {
                params
                    .get_joined(&[key, n])
                    .is_some_and(|p| parse_bool(p.raw_value()))
            };
            fonts.push(Font {
                name: params
                    .get_joined(&[keys.name, n])
                    .map(|p| p.value(encoding).into_owned())
                    .unwrap_or_default(),
                size: read_i32(params, &[keys.size, n])?,
                rotation: read_i32(params, &[keys.rotation, n])?,
                italic: flag(keys.italic),
                bold: flag(keys.bold),
                underline: flag(keys.underline),
                strikeout: flag(keys.strikeout),
            });
        }
        Ok(FontTable(fonts))
    }

    fn write_field(&self, name: &str, w: &mut ParameterWriter<'_>) {
        let upper = name.bytes().all(|b| !b.is_ascii_lowercase());
        let keys = if upper { &FONT_KEYS_UPPER } else { &FONT_KEYS };
        w.int(&[name], self.0.len() as i64);
        let all = !w.omits_defaults();
        let mut index = itoa::Buffer::new();
        for (i, font) in self.0.iter().enumerate() {
            let n = index.format(i + 1);
            w.int(&[keys.size, n], i64::from(font.size));
            if all || font.rotation != 0 {
                w.int(&[keys.rotation, n], i64::from(font.rotation));
            }
            for (key, set) in [
                (keys.italic, font.italic),
                (keys.bold, font.bold),
                (keys.underline, font.underline),
                (keys.strikeout, font.strikeout),
            ] {
                if all || set {
                    w.bool(&[key, n], set);
                }
            }
            w.string(&[keys.name, n], &font.name);
        }
    }
}
