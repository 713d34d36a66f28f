//! Clipboard text translation
//!
//! The emulated OS stores clipboard text in a legacy single-byte codepage
//! (CP1252 for Western locales); the host side wants UTF-8. Characters
//! with no mapping degrade to `?` on encode and U+FFFD on decode.

use pb_core::config::Codepage;

/// CP1252 codepoints for bytes 0x80..=0x9F. Holes in the codepage keep
/// their C1 control value so decode(encode(x)) round-trips raw bytes.
const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

/// Decode emulated-OS clipboard bytes to host text
pub fn decode(bytes: &[u8], codepage: Codepage) -> String {
    bytes
        .iter()
        .map(|&b| match codepage {
            Codepage::Windows1252 if (0x80..=0x9f).contains(&b) => {
                CP1252_HIGH[(b - 0x80) as usize]
            }
            _ => b as char,
        })
        .collect()
}

/// Encode host text for the emulated OS clipboard
pub fn encode(text: &str, codepage: Codepage) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let code = c as u32;
            match code {
                0x00..=0x7f => code as u8,
                0xa0..=0xff => code as u8,
                0x80..=0x9f if codepage == Codepage::Latin1 => code as u8,
                _ if codepage == Codepage::Windows1252 => CP1252_HIGH
                    .iter()
                    .position(|&h| h == c)
                    .map_or(b'?', |i| 0x80 + i as u8),
                _ => b'?',
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        let text = "HotSync Name 42";
        assert_eq!(encode(text, Codepage::Windows1252), text.as_bytes());
        assert_eq!(decode(text.as_bytes(), Codepage::Windows1252), text);
    }

    #[test]
    fn test_cp1252_specials() {
        assert_eq!(encode("€”", Codepage::Windows1252), vec![0x80, 0x94]);
        assert_eq!(decode(&[0x80, 0x94], Codepage::Windows1252), "€”");
    }

    #[test]
    fn test_latin1_range() {
        // é is 0xE9 in both codepages
        assert_eq!(encode("café", Codepage::Windows1252), b"caf\xe9");
        assert_eq!(decode(b"caf\xe9", Codepage::Latin1), "café");
    }

    #[test]
    fn test_unmappable_becomes_question_mark() {
        assert_eq!(encode("雪", Codepage::Windows1252), vec![b'?']);
        assert_eq!(encode("€", Codepage::Latin1), vec![b'?']);
    }

    #[test]
    fn test_round_trip() {
        let text = "Äpfel — 3 × „gratis“";
        let encoded = encode(text, Codepage::Windows1252);
        // × (0xD7) and the quotes all exist in CP1252
        assert_eq!(decode(&encoded, Codepage::Windows1252), text);
    }
}
