//! Tokenizer for the `|NAME=VALUE|...` micro-format.

use std::borrow::Cow;

use encoding_rs::Encoding;
use memchr::memchr;
use smallvec::SmallVec;
use thiserror::Error;

use crate::encoding;

/// Prefix marking a value as UTF-8 instead of the default codepage.
pub const UTF8_MARKER: &[u8] = b"%UTF8%";

/// Nesting level of a parameter list, which selects its delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterLevel {
    /// Record parameters, separated by `|`
    #[default]
    Top,
    /// A list embedded in a single value, separated by `` ` ``
    Nested,
}

impl ParameterLevel {
    #[inline]
    pub const fn delimiter(self) -> u8 {
        match self {
            ParameterLevel::Top => b'|',
            ParameterLevel::Nested => b'`',
        }
    }
}

/// A value that could not be converted to the requested type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {expected} value {value:?}")]
pub struct ValueError {
    pub expected: &'static str,
    pub value: String,
}

impl ValueError {
    fn new(expected: &'static str, raw: &[u8]) -> Self {
        Self {
            expected,
            value: String::from_utf8_lossy(raw).into_owned(),
        }
    }
}

/// One `NAME=VALUE` token, borrowed from the parsed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter<'a> {
    name: &'a [u8],
    value: &'a [u8],
    utf8: bool,
}

impl<'a> Parameter<'a> {
    #[inline]
    pub fn name_bytes(&self) -> &'a [u8] {
        self.name
    }

    /// The name as text. Names are ASCII in practice.
    #[inline]
    pub fn name(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.name)
    }

    /// Value bytes with the UTF-8 marker already stripped.
    #[inline]
    pub fn raw_value(&self) -> &'a [u8] {
        self.value
    }

    /// Whether the value carried the `%UTF8%` marker.
    #[inline]
    pub fn is_utf8(&self) -> bool {
        self.utf8
    }

    /// Case-insensitive name comparison.
    #[inline]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.as_bytes())
    }

    /// Case-insensitive comparison against the concatenation of `parts`.
    pub fn is_named_joined(&self, parts: &[&str]) -> bool {
        let mut rest = self.name;
        for part in parts {
            let part = part.as_bytes();
            if rest.len() < part.len() || !rest[..part.len()].eq_ignore_ascii_case(part) {
                return false;
            }
            rest = &rest[part.len()..];
        }
        rest.is_empty()
    }

    /// Decode the value, using UTF-8 when flagged and `encoding` otherwise.
    #[inline]
    pub fn value(&self, encoding: &'static Encoding) -> Cow<'a, str> {
        if self.utf8 {
            encoding::decode_utf8(self.value)
        } else {
            encoding::decode(self.value, encoding)
        }
    }

    pub fn as_i32(&self) -> Result<i32, ValueError> {
        atoi_simd::parse::<i32>(integer_digits(self.value))
            .map_err(|_| ValueError::new("integer", self.value))
    }

    pub fn as_i64(&self) -> Result<i64, ValueError> {
        atoi_simd::parse::<i64>(integer_digits(self.value))
            .map_err(|_| ValueError::new("integer", self.value))
    }

    /// Parse a float. Accepts the `9.0E+0001` form Delphi writes.
    pub fn as_f64(&self) -> Result<f64, ValueError> {
        fast_float2::parse::<f64, _>(self.value.trim_ascii())
            .map_err(|_| ValueError::new("float", self.value))
    }

    /// `T` or `TRUE` (any case) is true; anything else, including an empty
    /// value, is false.
    #[inline]
    pub fn as_bool(&self) -> bool {
        parse_bool(self.value)
    }
}

#[inline]
pub(crate) fn parse_bool(value: &[u8]) -> bool {
    let value = value.trim_ascii();
    value.eq_ignore_ascii_case(b"T") || value.eq_ignore_ascii_case(b"TRUE")
}

#[inline]
fn integer_digits(value: &[u8]) -> &[u8] {
    let value = value.trim_ascii();
    value.strip_prefix(b"+").unwrap_or(value)
}

/// Iterator over the tokens of a parameter text.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: &'a [u8],
    delimiter: u8,
}

impl<'a> Tokens<'a> {
    pub fn new(text: &'a [u8], delimiter: u8) -> Self {
        Self { rest: text, delimiter }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Parameter<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.rest.is_empty() {
            let segment = match memchr(self.delimiter, self.rest) {
                Some(at) => {
                    let segment = &self.rest[..at];
                    self.rest = &self.rest[at + 1..];
                    segment
                },
                None => std::mem::take(&mut self.rest),
            };
            if let Some(param) = split_segment(segment) {
                return Some(param);
            }
        }
        None
    }
}

fn split_segment(segment: &[u8]) -> Option<Parameter<'_>> {
    if segment.iter().all(|&b| b == 0 || b.is_ascii_whitespace()) {
        return None;
    }
    let (name, value) = match memchr(b'=', segment) {
        Some(at) => (&segment[..at], &segment[at + 1..]),
        None => (segment, &segment[segment.len()..]),
    };
    let value = trim_value_end(value);
    let (value, utf8) = match value.strip_prefix(UTF8_MARKER) {
        Some(rest) => (rest, true),
        None => (value, false),
    };
    Some(Parameter {
        name: name.trim_ascii(),
        value,
        utf8,
    })
}

#[inline]
fn trim_value_end(value: &[u8]) -> &[u8] {
    let end = value
        .iter()
        .rposition(|&b| b != 0 && !b.is_ascii_whitespace())
        .map_or(0, |last| last + 1);
    &value[..end]
}

/// Parsed tokens of one parameter text.
///
/// Holds borrowed views only; a typical record fits in the inline storage
/// and parsing does not allocate.
#[derive(Debug, Clone, Default)]
pub struct ParameterCollection<'a> {
    params: SmallVec<[Parameter<'a>; 24]>,
}

impl<'a> ParameterCollection<'a> {
    /// Parse top-level (`|` delimited) text.
    #[inline]
    pub fn parse(text: &'a [u8]) -> Self {
        Self::with_delimiter(text, ParameterLevel::Top.delimiter())
    }

    /// Parse text at the given nesting level.
    #[inline]
    pub fn parse_level(text: &'a [u8], level: ParameterLevel) -> Self {
        Self::with_delimiter(text, level.delimiter())
    }

    /// Parse text with an explicit delimiter.
    pub fn with_delimiter(text: &'a [u8], delimiter: u8) -> Self {
        Self {
            params: Tokens::new(text, delimiter).collect(),
        }
    }

    /// Parse an in-memory string.
    #[inline]
    pub fn parse_str(text: &'a str) -> Self {
        Self::parse(text.as_bytes())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Parameter<'a>> {
        self.params.iter()
    }

    /// First token with the given name, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&Parameter<'a>> {
        self.params.iter().find(|p| p.is_named(name))
    }

    /// First token whose name equals the concatenation of `parts`.
    ///
    /// Looks up composite names such as `LOCATION.X_FRAC` without building
    /// the key.
    pub fn get_joined(&self, parts: &[&str]) -> Option<&Parameter<'a>> {
        self.params.iter().find(|p| p.is_named_joined(parts))
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Decoded value of the first token with the given name.
    pub fn value(&self, name: &str, encoding: &'static Encoding) -> Option<Cow<'a, str>> {
        self.get(name).map(|p| p.value(encoding))
    }

    /// Boolean value, false when absent.
    pub fn bool(&self, name: &str) -> bool {
        self.get(name).is_some_and(Parameter::as_bool)
    }

    /// Integer value, `None` when absent.
    pub fn i32(&self, name: &str) -> Result<Option<i32>, ValueError> {
        self.get(name).map(Parameter::as_i32).transpose()
    }
}

impl<'a, 'c> IntoIterator for &'c ParameterCollection<'a> {
    type Item = &'c Parameter<'a>;
    type IntoIter = std::slice::Iter<'c, Parameter<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}
