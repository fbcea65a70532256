use std::fs;
use std::io;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::UTF_8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: String,
    pub had_errors: bool,
}

pub fn read_text(path: &Path) -> io::Result<DecodedText> {
    let bytes = fs::read(path)?;
    Ok(decode(&bytes))
}

/// UTF-8 (with or without BOM) passes through; anything else is guessed with
/// chardetng and decoded lossily.
pub fn decode(bytes: &[u8]) -> DecodedText {
    // BOM UTF-8 (EF BB BF)
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        let (text, had_errors) = UTF_8.decode_without_bom_handling(rest);
        return DecodedText {
            text: text.into_owned(),
            encoding: "utf-8-sig".into(),
            had_errors,
        };
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return DecodedText {
            text: text.to_string(),
            encoding: "utf-8".into(),
            had_errors: false,
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::warn!(encoding = encoding.name(), "catalog decoded with replacement characters");
    }

    DecodedText {
        text: text.into_owned(),
        encoding: encoding.name().to_lowercase(),
        had_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_utf8_bom() {
        let decoded = decode(b"\xEF\xBB\xBFmsgid \"a\"");
        assert_eq!(decoded.text, "msgid \"a\"");
        assert_eq!(decoded.encoding, "utf-8-sig");
    }

    #[test]
    fn plain_utf8_passes_through() {
        let decoded = decode("msgstr \"Adiós\"".as_bytes());
        assert_eq!(decoded.text, "msgstr \"Adiós\"");
        assert_eq!(decoded.encoding, "utf-8");
        assert!(!decoded.had_errors);
    }

    #[test]
    fn legacy_single_byte_is_decoded() {
        // "Adiós" in windows-1252
        let bytes = b"msgstr \"Adi\xF3s se\xF1or\"\n";
        let decoded = decode(bytes);
        assert_ne!(decoded.encoding, "utf-8");
        assert!(decoded.text.starts_with("msgstr \"Adi"));
    }
}
