//! Text to trytes.
//!
//! Each byte `b < 128` becomes two trytes: `b % 27` followed by `b / 27`,
//! both as unbalanced indices into the tryte alphabet. Text that may hold
//! non-ASCII characters goes through [`encode_non_ascii`] first, which
//! rewrites them as JSON `\uXXXX` escapes so a JSON document survives the
//! trip unchanged.

use std::fmt::Write as _;

use crate::crypto::ternary::TRYTE_ALPHABET;

use super::error::LedgerError;

/// Encode ASCII text as trytes.
pub fn ascii_to_trytes(input: &str) -> Result<String, LedgerError> {
    let mut out = String::with_capacity(input.len() * 2);
    for c in input.chars() {
        if !c.is_ascii() {
            return Err(LedgerError::NonAscii(c));
        }
        let b = c as u8;
        out.push(TRYTE_ALPHABET[(b % 27) as usize] as char);
        out.push(TRYTE_ALPHABET[(b / 27) as usize] as char);
    }
    Ok(out)
}

/// Decode trytes produced by [`ascii_to_trytes`].
pub fn trytes_to_ascii(trytes: &str) -> Result<String, LedgerError> {
    if trytes.len() % 2 != 0 {
        return Err(LedgerError::OddLength(trytes.len()));
    }
    let bytes = trytes.as_bytes();
    let mut out = String::with_capacity(trytes.len() / 2);
    for pair in bytes.chunks(2) {
        let low = alphabet_index(pair[0])?;
        let high = alphabet_index(pair[1])?;
        let value = low as u32 + high as u32 * 27;
        if value > 127 {
            return Err(LedgerError::InvalidMessage);
        }
        out.push(value as u8 as char);
    }
    Ok(out)
}

/// Decode a padded message field: trailing `9`s are fill, not content.
pub fn decode_message(trytes: &str) -> Result<String, LedgerError> {
    let trimmed = trytes.trim_end_matches('9');
    if trimmed.len() % 2 == 0 {
        trytes_to_ascii(trimmed)
    } else {
        // The last character ended in a `9` tryte (a multiple of 27).
        let mut restored = String::with_capacity(trimmed.len() + 1);
        restored.push_str(trimmed);
        restored.push('9');
        trytes_to_ascii(&restored)
    }
}

/// Replace every character from U+007F upwards with `\uXXXX` escapes of its
/// UTF-16 code units.
pub fn encode_non_ascii(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if (c as u32) < 0x7f {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                let _ = write!(out, "\\u{:04x}", unit);
            }
        }
    }
    out
}

fn alphabet_index(b: u8) -> Result<u8, LedgerError> {
    match b {
        b'9' => Ok(0),
        b'A'..=b'Z' => Ok(b - b'A' + 1),
        _ => Err(LedgerError::InvalidMessage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_known_vector() {
        assert_eq!(ascii_to_trytes("IOTA").unwrap(), "SBYBCCKB");
        assert_eq!(ascii_to_trytes("").unwrap(), "");
    }

    #[test]
    fn decodes_what_it_encodes() {
        let text = r#"{"name":"notes.txt","size":5}"#;
        let trytes = ascii_to_trytes(text).unwrap();
        assert_eq!(trytes_to_ascii(&trytes).unwrap(), text);
    }

    #[test]
    fn rejects_non_ascii_input() {
        assert!(matches!(
            ascii_to_trytes("café"),
            Err(LedgerError::NonAscii('é'))
        ));
    }

    #[test]
    fn rejects_odd_length() {
        assert!(matches!(
            trytes_to_ascii("ABC"),
            Err(LedgerError::OddLength(3))
        ));
    }

    #[test]
    fn decode_message_strips_padding() {
        let mut padded = ascii_to_trytes("IOTA").unwrap();
        padded.push_str(&"9".repeat(20));
        assert_eq!(decode_message(&padded).unwrap(), "IOTA");

        // '\n' is 10 = 10 + 0 * 27, so its second tryte is a 9.
        let mut tricky = ascii_to_trytes("ok\n").unwrap();
        assert!(tricky.ends_with("J9"));
        tricky.push_str("999");
        assert_eq!(decode_message(&tricky).unwrap(), "ok\n");
    }

    #[test]
    fn escapes_non_ascii_as_json_unicode() {
        assert_eq!(encode_non_ascii("plain"), "plain");
        assert_eq!(encode_non_ascii("café"), "caf\\u00e9");
        // Outside the BMP: a surrogate pair.
        assert_eq!(encode_non_ascii("😀"), "\\ud83d\\ude00");
    }

    #[test]
    fn escaped_json_still_parses() {
        let original = serde_json::json!({"name": "résumé.pdf"});
        let escaped = encode_non_ascii(&original.to_string());
        assert!(escaped.is_ascii());
        let parsed: serde_json::Value = serde_json::from_str(&escaped).unwrap();
        assert_eq!(parsed, original);
    }
}
