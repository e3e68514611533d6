//! Fixed-point coordinates.
//!
//! Every linear measurement is an integer count of 1/10,000 mil ("raw units").
//! PCB streams store raw units directly as `i32`. Schematic parameter text
//! splits a coordinate into a primary value in DXP units (10 mil) and a `_FRAC`
//! remainder; [`Coord::from_dxp`] and [`Coord::to_dxp`] are exact inverses for
//! every `i32` raw value.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw units per mil.
pub const UNITS_PER_MIL: i32 = 10_000;

/// Raw units per DXP (schematic) unit of 10 mil.
pub const UNITS_PER_DXP: i32 = 100_000;

/// Fractional digits kept when printing mils; one raw unit is 0.0001 mil.
const MIL_DECIMALS: u32 = 4;

/// A linear measurement in raw units.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Coord(i32);

impl Coord {
    pub const ZERO: Coord = Coord(0);

    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Coord(raw)
    }

    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Build from mils, rounding to the nearest raw unit and saturating.
    #[inline]
    pub fn from_mils(mils: f64) -> Self {
        Coord(saturate(mils * f64::from(UNITS_PER_MIL)))
    }

    #[inline]
    pub fn to_mils(self) -> f64 {
        f64::from(self.0) / f64::from(UNITS_PER_MIL)
    }

    /// Combine a schematic primary value and its fraction into raw units.
    ///
    /// Values outside the `i32` range saturate.
    #[inline]
    pub fn from_dxp(primary: i32, frac: i32) -> Self {
        let raw = i64::from(primary) * i64::from(UNITS_PER_DXP) + i64::from(frac);
        Coord(raw.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
    }

    /// Split into a schematic primary value and fraction.
    ///
    /// Uses truncating division so both parts carry the sign of the value.
    #[inline]
    pub fn to_dxp(self) -> (i32, i32) {
        (self.0 / UNITS_PER_DXP, self.0 % UNITS_PER_DXP)
    }

    /// Parse PCB parameter text such as `"1234.5mil"`.
    ///
    /// The unit suffix is optional and matched case-insensitively; `mm` is
    /// also accepted. Returns `None` when the number does not parse.
    pub fn parse_mil_text(text: &[u8]) -> Option<Self> {
        let text = text.trim_ascii();
        let (number, scale) = if let Some(n) = strip_suffix_ignore_case(text, b"mil") {
            (n, 1.0)
        } else if let Some(n) = strip_suffix_ignore_case(text, b"mm") {
            (n, 1000.0 / 25.4)
        } else {
            (text, 1.0)
        };
        let value: f64 = fast_float2::parse(number.trim_ascii()).ok()?;
        if !value.is_finite() {
            return None;
        }
        Some(Coord::from_mils(value * scale))
    }

    /// Append the value as decimal mils with a `mil` suffix.
    ///
    /// At most four fractional digits are written, trailing zeros dropped.
    pub fn write_mil_text(self, out: &mut Vec<u8>) {
        let raw = i64::from(self.0);
        let units = i64::from(UNITS_PER_MIL);
        if raw < 0 {
            out.push(b'-');
        }
        let magnitude = raw.unsigned_abs();
        let whole = magnitude / units as u64;
        let mut frac = magnitude % units as u64;

        let mut buffer = itoa::Buffer::new();
        out.extend_from_slice(buffer.format(whole).as_bytes());
        if frac != 0 {
            out.push(b'.');
            let mut digits = MIL_DECIMALS;
            let mut divisor = units as u64 / 10;
            while frac != 0 && digits > 0 {
                out.push(b'0' + (frac / divisor) as u8);
                frac %= divisor;
                divisor /= 10;
                digits -= 1;
            }
        }
        out.extend_from_slice(b"mil");
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = Vec::with_capacity(16);
        self.write_mil_text(&mut out);
        f.write_str(&String::from_utf8_lossy(&out))
    }
}

impl From<i32> for Coord {
    #[inline]
    fn from(raw: i32) -> Self {
        Coord(raw)
    }
}

/// A two-dimensional location in raw units.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CoordPoint {
    pub x: Coord,
    pub y: Coord,
}

impl CoordPoint {
    #[inline]
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Point from whole DXP units, the usual schematic grid.
    #[inline]
    pub fn from_dxp(x: i32, y: i32) -> Self {
        Self::new(Coord::from_dxp(x, 0), Coord::from_dxp(y, 0))
    }

    #[inline]
    pub fn from_mils(x: f64, y: f64) -> Self {
        Self::new(Coord::from_mils(x), Coord::from_mils(y))
    }
}

#[inline]
fn saturate(value: f64) -> i32 {
    // `as` saturates for out-of-range floats and maps NaN to zero.
    value.round() as i32
}

fn strip_suffix_ignore_case<'a>(text: &'a [u8], suffix: &[u8]) -> Option<&'a [u8]> {
    if text.len() < suffix.len() {
        return None;
    }
    let (head, tail) = text.split_at(text.len() - suffix.len());
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}
