//! Codepage handling for text stored in Altium streams.
//!
//! Altium writes Pascal strings and parameter values in the Windows ANSI
//! codepage of the machine that saved the file (Windows-1252 for nearly every
//! file in the wild). Values that cannot be represented are written with a
//! `%UTF8%` marker instead, which the parameter layer handles.
//!
//! - Uses `encoding_rs` for the codepage conversion
//! - ASCII input decodes and encodes without allocating

use std::borrow::Cow;

use encoding_rs::Encoding;

/// Default codepage for legacy 8-bit text.
pub const DEFAULT_ENCODING: &Encoding = encoding_rs::WINDOWS_1252;

/// Map a Windows codepage identifier to an `encoding_rs` encoding.
///
/// Only codepages `encoding_rs` can also *encode* into are listed, since
/// every text field must survive a write.
///
/// # Examples
///
/// ```
/// use altium_codec::encoding::codepage_to_encoding;
///
/// assert!(codepage_to_encoding(1252).is_some());
/// assert!(codepage_to_encoding(99999).is_none());
/// ```
#[inline]
pub fn codepage_to_encoding(codepage: u16) -> Option<&'static Encoding> {
    match codepage {
        874 => Some(encoding_rs::WINDOWS_874),   // Thai
        1250 => Some(encoding_rs::WINDOWS_1250), // Central European
        1251 => Some(encoding_rs::WINDOWS_1251), // Cyrillic
        1252 => Some(encoding_rs::WINDOWS_1252), // Western European
        1253 => Some(encoding_rs::WINDOWS_1253), // Greek
        1254 => Some(encoding_rs::WINDOWS_1254), // Turkish
        1255 => Some(encoding_rs::WINDOWS_1255), // Hebrew
        1256 => Some(encoding_rs::WINDOWS_1256), // Arabic
        1257 => Some(encoding_rs::WINDOWS_1257), // Baltic
        1258 => Some(encoding_rs::WINDOWS_1258), // Vietnamese

        932 => Some(encoding_rs::SHIFT_JIS),
        936 => Some(encoding_rs::GBK),
        949 => Some(encoding_rs::EUC_KR),
        950 => Some(encoding_rs::BIG5),

        65001 => Some(encoding_rs::UTF_8),
        _ => None,
    }
}

/// Decode codepage bytes. Borrows the input when it is plain ASCII.
#[inline]
pub fn decode<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Cow<'a, str> {
    encoding.decode_without_bom_handling(bytes).0
}

/// Decode bytes flagged as UTF-8, replacing invalid sequences.
#[inline]
pub fn decode_utf8(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Encode text into the codepage.
///
/// Returns `None` when the text contains characters the codepage cannot
/// represent, so the caller can fall back to a UTF-8 marker.
#[inline]
pub fn encode<'a>(text: &'a str, encoding: &'static Encoding) -> Option<Cow<'a, [u8]>> {
    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors { None } else { Some(bytes) }
}

/// Encode text into the codepage, substituting unmappable characters.
#[inline]
pub fn encode_lossy<'a>(text: &'a str, encoding: &'static Encoding) -> Cow<'a, [u8]> {
    encoding.encode(text).0
}

/// Decode UTF-16LE bytes up to the first NUL code unit.
///
/// A trailing odd byte is ignored and unpaired surrogates become U+FFFD.
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0);
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_borrows() {
        let text = decode(b"Hello", DEFAULT_ENCODING);
        assert!(matches!(text, Cow::Borrowed("Hello")));
        let bytes = encode("Hello", DEFAULT_ENCODING).unwrap();
        assert!(matches!(bytes, Cow::Borrowed(b"Hello")));
    }

    #[test]
    fn test_windows_1252_high_range() {
        assert_eq!(decode(b"\x80 \xB5", DEFAULT_ENCODING), "€ µ");
        assert_eq!(encode("€ µ", DEFAULT_ENCODING).unwrap().as_ref(), b"\x80 \xB5");
    }

    #[test]
    fn test_unmappable_encode_is_none() {
        assert!(encode("电阻", DEFAULT_ENCODING).is_none());
        assert!(encode("电阻", encoding_rs::GBK).is_some());
    }

    #[test]
    fn test_decode_utf16le_stops_at_nul() {
        let bytes = b"H\x00i\x00\x00\x00X\x00";
        assert_eq!(decode_utf16le(bytes), "Hi");
    }

    #[test]
    fn test_decode_utf16le_odd_length() {
        assert_eq!(decode_utf16le(b"A\x00B"), "A");
    }

    #[test]
    fn test_codepage_lookup() {
        assert_eq!(codepage_to_encoding(1251), Some(encoding_rs::WINDOWS_1251));
        assert!(codepage_to_encoding(1200).is_none());
    }
}
