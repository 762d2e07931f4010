//! Text decoding for raw input bytes using chardetng and `encoding_rs`.

use std::borrow::Cow;

use chardetng::EncodingDetector;
use simdutf8::basic::from_utf8;

/// Check if the given bytes are valid UTF-8.
pub fn is_utf8(data: &[u8]) -> bool {
    from_utf8(data).is_ok()
}

/// Check if the data starts with a UTF-8 BOM (EF BB BF).
pub fn has_utf8_bom(data: &[u8]) -> bool {
    data.starts_with(&[0xEF, 0xBB, 0xBF])
}

/// Skip the UTF-8 BOM if present and return the remaining data.
pub fn skip_bom(data: &[u8]) -> &[u8] {
    if has_utf8_bom(data) { &data[3..] } else { data }
}

/// Decode raw bytes into UTF-8 text.
///
/// UTF-16 input is recognised by its BOM. Valid UTF-8 (with or without BOM) is
/// borrowed as-is. Anything else goes through chardetng, which covers the
/// common legacy code pages (Windows-125x, ISO-8859, GBK, Shift-JIS, ...).
/// Undecodable sequences become U+FFFD rather than failing.
pub fn decode(data: &[u8]) -> Cow<'_, str> {
    if data.len() >= 2 {
        // UTF-16 LE BOM: FF FE
        if data[0] == 0xFF && data[1] == 0xFE {
            let (decoded, _, _) = encoding_rs::UTF_16LE.decode(data);
            return Cow::Owned(decoded.into_owned());
        }
        // UTF-16 BE BOM: FE FF
        if data[0] == 0xFE && data[1] == 0xFF {
            let (decoded, _, _) = encoding_rs::UTF_16BE.decode(data);
            return Cow::Owned(decoded.into_owned());
        }
    }

    let data = skip_bom(data);
    if let Ok(text) = from_utf8(data) {
        return Cow::Borrowed(text);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(data, true);
    let encoding = detector.guess(None, true);
    tracing::debug!(encoding = encoding.name(), "transcoding non-UTF-8 input");

    let (decoded, _, _) = encoding.decode(data);
    Cow::Owned(decoded.into_owned())
}
