//! Serializer for the `|NAME=VALUE` micro-format.

use encoding_rs::Encoding;

use super::parser::{ParameterLevel, UTF8_MARKER};
use crate::binary::{BinaryError, BinaryResult};
use crate::coord::Coord;
use crate::encoding;

/// Text conventions of the two record families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Booleans as `T`/`F`; fields holding their default are left out.
    #[default]
    Schematic,
    /// Booleans as `TRUE`/`FALSE`; every field is written.
    Pcb,
}

/// Appends tokens to a byte buffer.
///
/// Each token is written as a delimiter followed by `NAME=VALUE`, so the
/// output of a top-level writer starts with `|` and has no trailing
/// delimiter.
///
/// Text values holding a delimiter or ending in whitespace or NUL cannot be
/// parsed back. They are still written, and [`finish`](Self::finish)
/// reports the first such field.
#[derive(Debug)]
pub struct ParameterWriter<'b> {
    out: &'b mut Vec<u8>,
    delimiter: u8,
    encoding: &'static Encoding,
    dialect: Dialect,
    unrepresentable: Option<String>,
}

impl<'b> ParameterWriter<'b> {
    pub fn new(out: &'b mut Vec<u8>, encoding: &'static Encoding) -> Self {
        Self {
            out,
            delimiter: ParameterLevel::Top.delimiter(),
            encoding,
            dialect: Dialect::Schematic,
            unrepresentable: None,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_level(mut self, level: ParameterLevel) -> Self {
        self.delimiter = level.delimiter();
        self
    }

    #[inline]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    #[inline]
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Whether fields holding their default value should be skipped.
    #[inline]
    pub fn omits_defaults(&self) -> bool {
        self.dialect == Dialect::Schematic
    }

    fn begin(&mut self, name: &[&str]) {
        self.out.push(self.delimiter);
        for part in name {
            self.out.extend_from_slice(part.as_bytes());
        }
        self.out.push(b'=');
    }

    /// A token whose value bytes are written as given.
    pub fn raw(&mut self, name: &[&str], value: &[u8]) {
        self.begin(name);
        self.out.extend_from_slice(value);
    }

    /// A text value in the codepage, or with the UTF-8 marker when the
    /// codepage cannot represent it or the value itself starts with the
    /// marker.
    pub fn string(&mut self, name: &[&str], value: &str) {
        if value.as_bytes().starts_with(UTF8_MARKER) {
            return self.utf8(name, value);
        }
        self.check(name, value);
        self.begin(name);
        match encoding::encode(value, self.encoding) {
            Some(bytes) => self.out.extend_from_slice(&bytes),
            None => {
                self.out.extend_from_slice(UTF8_MARKER);
                self.out.extend_from_slice(value.as_bytes());
            },
        }
    }

    /// A text value that always carries the UTF-8 marker.
    pub fn utf8(&mut self, name: &[&str], value: &str) {
        self.check(name, value);
        self.begin(name);
        self.out.extend_from_slice(UTF8_MARKER);
        self.out.extend_from_slice(value.as_bytes());
    }

    fn check(&mut self, name: &[&str], value: &str) {
        if self.unrepresentable.is_some() {
            return;
        }
        let bytes = value.as_bytes();
        let splits = bytes.iter().any(|&b| b == b'|' || b == self.delimiter);
        let trimmed = bytes.last().is_some_and(|&b| b == 0 || b.is_ascii_whitespace());
        if splits || trimmed {
            self.unrepresentable = Some(name.concat());
        }
    }

    /// Release the buffer, failing if a text value will not read back as
    /// written.
    pub fn finish(self) -> BinaryResult<()> {
        match self.unrepresentable {
            Some(field) => Err(BinaryError::UnrepresentableValue { field }),
            None => Ok(()),
        }
    }

    pub fn int(&mut self, name: &[&str], value: i64) {
        self.begin(name);
        let mut buf = itoa::Buffer::new();
        self.out.extend_from_slice(buf.format(value).as_bytes());
    }

    pub fn float(&mut self, name: &[&str], value: f64) {
        self.begin(name);
        let mut buf = ryu::Buffer::new();
        self.out.extend_from_slice(buf.format(value).as_bytes());
    }

    pub fn bool(&mut self, name: &[&str], value: bool) {
        let text: &[u8] = match (self.dialect, value) {
            (Dialect::Schematic, true) => b"T",
            (Dialect::Schematic, false) => b"F",
            (Dialect::Pcb, true) => b"TRUE",
            (Dialect::Pcb, false) => b"FALSE",
        };
        self.raw(name, text);
    }

    /// A coordinate as mil text such as `1234.5mil`.
    pub fn mil(&mut self, name: &[&str], value: Coord) {
        self.begin(name);
        value.write_mil_text(self.out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::DEFAULT_ENCODING;
    use crate::params::ParameterCollection;

    #[test]
    fn test_token_layout() {
        let mut out = Vec::new();
        let mut w = ParameterWriter::new(&mut out, DEFAULT_ENCODING);
        w.int(&["RECORD"], 1);
        w.string(&["LIBREFERENCE"], "RES");
        w.bool(&["ISMIRRORED"], true);
        assert_eq!(out, b"|RECORD=1|LIBREFERENCE=RES|ISMIRRORED=T");
    }

    #[test]
    fn test_pcb_booleans() {
        let mut out = Vec::new();
        let mut w = ParameterWriter::new(&mut out, DEFAULT_ENCODING).with_dialect(Dialect::Pcb);
        assert!(!w.omits_defaults());
        w.bool(&["LOCKED"], false);
        w.bool(&["PRIMITIVELOCK"], true);
        assert_eq!(out, b"|LOCKED=FALSE|PRIMITIVELOCK=TRUE");
    }

    #[test]
    fn test_composite_name() {
        let mut out = Vec::new();
        ParameterWriter::new(&mut out, DEFAULT_ENCODING).int(&["LOCATION", ".X", "_FRAC"], 5);
        assert_eq!(out, b"|LOCATION.X_FRAC=5");
    }

    #[test]
    fn test_unencodable_text_uses_utf8_marker() {
        let mut out = Vec::new();
        let mut w = ParameterWriter::new(&mut out, DEFAULT_ENCODING);
        w.string(&["TEXT"], "电阻");
        w.string(&["PLAIN"], "10µF");
        let params = ParameterCollection::parse(&out);
        let text = params.get("TEXT").unwrap();
        assert!(text.is_utf8());
        assert_eq!(text.value(DEFAULT_ENCODING), "电阻");
        let plain = params.get("PLAIN").unwrap();
        assert!(!plain.is_utf8());
        assert_eq!(plain.raw_value(), b"10\xB5F");
    }

    #[test]
    fn test_values_that_cannot_read_back() {
        let mut out = Vec::new();
        let mut w = ParameterWriter::new(&mut out, DEFAULT_ENCODING);
        w.string(&["NAME"], "ok value");
        w.string(&["TEXT"], "A|B");
        w.string(&["OTHER"], "trailing ");
        let err = w.finish().unwrap_err();
        assert!(matches!(err, BinaryError::UnrepresentableValue { ref field } if field == "TEXT"));

        let mut out = Vec::new();
        let mut w = ParameterWriter::new(&mut out, DEFAULT_ENCODING).with_level(ParameterLevel::Nested);
        w.utf8(&["A"], "x`y");
        assert!(w.finish().is_err());

        let mut out = Vec::new();
        let mut w = ParameterWriter::new(&mut out, DEFAULT_ENCODING);
        w.string(&["PLAIN"], " leading is fine");
        assert!(w.finish().is_ok());
    }

    #[test]
    fn test_marker_prefixed_value_reads_back() {
        let mut out = Vec::new();
        let mut w = ParameterWriter::new(&mut out, DEFAULT_ENCODING);
        w.string(&["TEXT"], "%UTF8%abc");
        w.finish().unwrap();
        let params = ParameterCollection::parse(&out);
        assert_eq!(params.get("TEXT").unwrap().value(DEFAULT_ENCODING), "%UTF8%abc");
    }

    #[test]
    fn test_numbers_read_back() {
        let mut out = Vec::new();
        let mut w = ParameterWriter::new(&mut out, DEFAULT_ENCODING);
        w.int(&["N"], -2_000_000_000);
        w.float(&["ROT"], 90.0);
        w.mil(&["X"], Coord::from_raw(12_345_000));
        let params = ParameterCollection::parse(&out);
        assert_eq!(params.get("N").unwrap().as_i64().unwrap(), -2_000_000_000);
        assert_eq!(params.get("ROT").unwrap().as_f64().unwrap(), 90.0);
        assert_eq!(
            Coord::parse_mil_text(params.get("X").unwrap().raw_value()),
            Some(Coord::from_raw(12_345_000))
        );
    }

    #[test]
    fn test_nested_level_delimiter() {
        let mut out = Vec::new();
        let mut w = ParameterWriter::new(&mut out, DEFAULT_ENCODING).with_level(ParameterLevel::Nested);
        w.int(&["A"], 1);
        w.int(&["B"], 2);
        assert_eq!(out, b"`A=1`B=2");
    }
}
