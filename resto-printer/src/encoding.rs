//! Single-byte code pages for thermal printers
//!
//! Text reaches the builder as UTF-8 and is converted at write time, so
//! the command bytes already in the buffer are never re-interpreted.

use std::fmt;
use std::str::FromStr;

use crate::error::PrintError;

/// Printer character table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codepage {
    /// 7-bit ASCII; unmappable characters are dropped
    #[default]
    Ascii,
    /// Windows-1252 (Western European), ESC t 16 on Epson-compatible heads
    Cp1252,
}

impl Codepage {
    /// `ESC t n` table number, if the page needs selecting
    pub fn table_number(&self) -> Option<u8> {
        match self {
            Codepage::Ascii => None,
            Codepage::Cp1252 => Some(16),
        }
    }
}

impl FromStr for Codepage {
    type Err = PrintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ascii" => Ok(Codepage::Ascii),
            "cp1252" | "windows-1252" => Ok(Codepage::Cp1252),
            other => Err(PrintError::InvalidConfig(format!(
                "unsupported codepage: {other}"
            ))),
        }
    }
}

impl fmt::Display for Codepage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codepage::Ascii => f.write_str("ascii"),
            Codepage::Cp1252 => f.write_str("cp1252"),
        }
    }
}

/// ASCII stand-ins for characters common on receipts
fn ascii_fallback(c: char) -> Option<u8> {
    match c {
        '…' => Some(b'.'),
        '‘' | '’' => Some(b'\''),
        '“' | '”' => Some(b'"'),
        '–' | '—' => Some(b'-'),
        '\u{a0}' => Some(b' '),
        _ => None,
    }
}

/// Encode printable text for the given code page
///
/// Characters the page cannot represent are dropped (ASCII) or replaced
/// by `?` (cp1252).
pub fn encode_text(s: &str, codepage: Codepage) -> Vec<u8> {
    match codepage {
        Codepage::Ascii => s
            .chars()
            .filter_map(|c| {
                if c.is_ascii() {
                    Some(c as u8)
                } else {
                    ascii_fallback(c)
                }
            })
            .collect(),
        Codepage::Cp1252 => {
            let mut out = Vec::with_capacity(s.len());
            let mut tmp = [0u8; 4];
            for c in s.chars() {
                if c.is_ascii() {
                    out.push(c as u8);
                    continue;
                }
                let (bytes, _, had_errors) =
                    encoding_rs::WINDOWS_1252.encode(c.encode_utf8(&mut tmp));
                if had_errors || bytes.len() != 1 {
                    out.push(b'?');
                } else {
                    out.extend_from_slice(&bytes);
                }
            }
            out
        }
    }
}

/// Decode printable bytes back to text (previews)
pub fn decode_text(bytes: &[u8], codepage: Codepage) -> String {
    match codepage {
        Codepage::Ascii => String::from_utf8_lossy(bytes).into_owned(),
        Codepage::Cp1252 => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_drops_unmappable() {
        assert_eq!(encode_text("Kopi Susu", Codepage::Ascii), b"Kopi Susu");
        assert_eq!(encode_text("Café 中", Codepage::Ascii), b"Caf ");
        assert_eq!(encode_text("Nasi…", Codepage::Ascii), b"Nasi.");
    }

    #[test]
    fn test_cp1252_keeps_western_chars() {
        assert_eq!(encode_text("Café", Codepage::Cp1252), vec![b'C', b'a', b'f', 0xE9]);
        assert_eq!(encode_text("…", Codepage::Cp1252), vec![0x85]);
        assert_eq!(encode_text("中", Codepage::Cp1252), b"?");
        assert_eq!(decode_text(&[b'C', 0xE9], Codepage::Cp1252), "Cé");
    }

    #[test]
    fn test_parse_codepage() {
        assert_eq!("ASCII".parse::<Codepage>().unwrap(), Codepage::Ascii);
        assert_eq!("cp1252".parse::<Codepage>().unwrap(), Codepage::Cp1252);
        assert!("gbk".parse::<Codepage>().is_err());
    }
}
