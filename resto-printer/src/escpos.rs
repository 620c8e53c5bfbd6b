//! ESC/POS command builder
//!
//! Provides a fluent API for building ESC/POS print data.

use crate::encoding::{Codepage, decode_text, encode_text};
use crate::layout::{pad_left_right, separator};
use crate::raster::Raster;

const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;
const LF: u8 = b'\n';

/// Largest byte-mode payload a model 2 QR symbol holds at level M
pub const QR_MAX_BYTES: usize = 2331;

/// Horizontal alignment (`ESC a n`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left = 0,
    Center = 1,
    Right = 2,
}

/// Character font (`ESC M n`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Font {
    /// 12x24, the normal receipt font
    #[default]
    A = 0,
    /// 9x17, condensed
    B = 1,
}

/// ESC/POS command builder
///
/// Text is encoded to the builder's code page as it is written, so the
/// finished buffer can be sent to the printer unchanged.
pub struct EscPosBuilder {
    buf: Vec<u8>,
    width: usize,
    codepage: Codepage,
}

impl EscPosBuilder {
    /// Create a builder for `width` columns using 7-bit ASCII
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 42 characters (font A)
    pub fn new(width: usize) -> Self {
        Self::with_codepage(width, Codepage::Ascii)
    }

    /// Create a builder with an explicit code page
    pub fn with_codepage(width: usize, codepage: Codepage) -> Self {
        let mut builder = Self {
            buf: Vec::with_capacity(2048),
            width,
            codepage,
        };
        builder.init();
        builder
    }

    /// Get the configured paper width
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn codepage(&self) -> Codepage {
        self.codepage
    }

    /// Initialize printer (ESC @), then select the code page table
    pub fn init(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, 0x40]);
        if let Some(n) = self.codepage.table_number() {
            // ESC t n
            self.buf.extend_from_slice(&[ESC, 0x74, n]);
        }
        self
    }

    // === Text Output ===

    /// Write text in the builder's code page
    pub fn text(&mut self, s: &str) -> &mut Self {
        let bytes = encode_text(s, self.codepage);
        self.buf.extend_from_slice(&bytes);
        self
    }

    /// Write text followed by newline
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s);
        self.buf.push(LF);
        self
    }

    /// Write empty line
    pub fn newline(&mut self) -> &mut Self {
        self.buf.push(LF);
        self
    }

    /// Print and feed n lines (ESC d n), clamped to 0..=255
    pub fn feed(&mut self, lines: u32) -> &mut Self {
        let n = lines.min(255) as u8;
        self.buf.extend_from_slice(&[ESC, 0x64, n]);
        self
    }

    // === Alignment ===

    pub fn align(&mut self, align: Align) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, 0x61, align as u8]);
        self
    }

    /// Align text to center
    pub fn center(&mut self) -> &mut Self {
        self.align(Align::Center)
    }

    /// Align text to left (default)
    pub fn left(&mut self) -> &mut Self {
        self.align(Align::Left)
    }

    /// Align text to right
    pub fn right(&mut self) -> &mut Self {
        self.align(Align::Right)
    }

    // === Text Style ===

    /// Enable bold text
    pub fn bold(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, 0x45, 0x01]);
        self
    }

    /// Disable bold text
    pub fn bold_off(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, 0x45, 0x00]);
        self
    }

    pub fn font(&mut self, font: Font) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, 0x4D, font as u8]);
        self
    }

    /// Character size multiplier (GS ! n)
    ///
    /// 0 = normal, 7 = 8x. Both values are clamped to 0..=7.
    pub fn char_size(&mut self, width_mul: u8, height_mul: u8) -> &mut Self {
        let w = width_mul.min(7);
        let h = height_mul.min(7);
        self.buf.extend_from_slice(&[GS, 0x21, (w << 4) | h]);
        self
    }

    /// Double width and height
    pub fn double_size(&mut self) -> &mut Self {
        self.char_size(1, 1)
    }

    /// Reset to normal size
    pub fn reset_size(&mut self) -> &mut Self {
        self.char_size(0, 0)
    }

    // === Separators ===

    /// Print a full-width line of `ch`
    pub fn separator(&mut self, ch: char) -> &mut Self {
        let rule = separator(ch, self.width);
        self.line(&rule)
    }

    /// Print a line of '-' characters
    pub fn sep_single(&mut self) -> &mut Self {
        self.separator('-')
    }

    /// Print a line of '=' characters
    pub fn sep_double(&mut self) -> &mut Self {
        self.separator('=')
    }

    // === Layout Helpers ===

    /// Print left and right text on the same line
    ///
    /// Left text is left-aligned, right text is right-aligned,
    /// with spaces filling the gap.
    pub fn line_lr(&mut self, left: &str, right: &str) -> &mut Self {
        let row = pad_left_right(left, right, self.width);
        self.line(&row)
    }

    // === Paper Control ===

    /// Cut paper (GS V 0, full cut)
    pub fn cut(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[GS, 0x56, 0x00]);
        self
    }

    // === QR Code ===

    /// Print a QR code: model 2, module size 4, error correction M
    ///
    /// Payloads over [`QR_MAX_BYTES`] are skipped; the printer could not
    /// encode them anyway.
    pub fn qr(&mut self, data: &str) -> &mut Self {
        if data.len() > QR_MAX_BYTES {
            tracing::warn!(bytes = data.len(), max = QR_MAX_BYTES, "QR payload too large, skipped");
            return self;
        }

        // Function 165: select model 2
        self.buf
            .extend_from_slice(&[GS, 0x28, 0x6B, 0x04, 0x00, 0x31, 0x41, 0x32, 0x00]);

        // Function 167: module size
        self.buf
            .extend_from_slice(&[GS, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x43, 0x04]);

        // Function 169: error correction level M
        self.buf
            .extend_from_slice(&[GS, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x45, 0x31]);

        // Function 180: store data
        let data_bytes = data.as_bytes();
        let len = data_bytes.len() + 3;
        let p_l = (len & 0xFF) as u8;
        let p_h = ((len >> 8) & 0xFF) as u8;
        self.buf
            .extend_from_slice(&[GS, 0x28, 0x6B, p_l, p_h, 0x31, 0x50, 0x30]);
        self.buf.extend_from_slice(data_bytes);

        // Function 181: print
        self.buf
            .extend_from_slice(&[GS, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x51, 0x30]);

        self
    }

    // === Images ===

    /// Print a raster image, row by row
    pub fn raster(&mut self, image: &Raster) -> &mut Self {
        self.buf.extend_from_slice(&image.to_escpos());
        self
    }

    // === Raw Commands ===

    /// Write raw bytes directly
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    // === Build ===

    /// Finish and return the command stream
    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new(32)
    }
}

/// Remove every command this builder emits, keeping printable text
///
/// QR payloads and raster data are skipped entirely. Used for plain-text
/// previews of a finished stream.
pub fn strip_commands(bytes: &[u8], codepage: Codepage) -> String {
    let mut text = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            ESC => {
                let cmd = bytes.get(i + 1).copied();
                i += match cmd {
                    Some(0x40) => 2,
                    // ESC p m t1 t2 (drawer pulse)
                    Some(0x70) => 5,
                    Some(_) => 3,
                    None => 1,
                };
            }
            GS => {
                let cmd = bytes.get(i + 1).copied();
                i += match cmd {
                    // GS V m [n]
                    Some(0x56) => match bytes.get(i + 2) {
                        Some(0x41) | Some(0x42) => 4,
                        _ => 3,
                    },
                    // GS ( k pL pH <payload>
                    Some(0x28) => {
                        let p_l = bytes.get(i + 3).copied().unwrap_or(0) as usize;
                        let p_h = bytes.get(i + 4).copied().unwrap_or(0) as usize;
                        5 + p_l + (p_h << 8)
                    }
                    // GS v 0 m xL xH yL yH <data>
                    Some(0x76) => {
                        let byte_at = |k: usize| bytes.get(i + k).copied().unwrap_or(0) as usize;
                        let x = byte_at(4) | (byte_at(5) << 8);
                        let y = byte_at(6) | (byte_at(7) << 8);
                        8 + x * y
                    }
                    Some(_) => 3,
                    None => 1,
                };
            }
            LF => {
                text.push(LF);
                i += 1;
            }
            b if b < 0x20 || b == 0x7F => {
                i += 1;
            }
            _ => {
                text.push(b);
                i += 1;
            }
        }
    }

    decode_text(&text, codepage)
}
