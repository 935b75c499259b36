//! # ESC/POS Encoder
//!
//! Converts receipt lines into the byte stream a thermal printer expects.
//!
//! ## Byte Layout
//! ```text
//! ┌──────────┬────────────┬──────────────────────────────┬──────────┐
//! │ 1B 40    │ 1B 74 10   │ <cp1252 line> 0A  (× lines)  │ 1D 56 00 │
//! │ ESC @    │ ESC t 16   │                              │ GS V 0   │
//! │ init     │ code page  │                              │ cut, opt │
//! └──────────┴────────────┴──────────────────────────────┴──────────┘
//! ```
//!
//! Code page 16 is Windows-1252, which covers German umlauts and `€` (0x80).
//! Characters outside it are printed as `?`.

use encoding_rs::{EncoderResult, WINDOWS_1252};

/// ESC @ - initialize printer.
pub const ESC_INIT: [u8; 2] = [0x1B, 0x40];

/// ESC t 16 - select character code table WPC1252.
pub const ESC_SELECT_CP1252: [u8; 3] = [0x1B, 0x74, 0x10];

/// GS V 0 - full cut.
pub const GS_CUT: [u8; 3] = [0x1D, 0x56, 0x00];

/// Line feed.
pub const LF: u8 = 0x0A;

/// Replacement for characters CP1252 cannot represent.
pub const UNMAPPABLE: u8 = b'?';

/// Encodes receipt lines into a complete ESC/POS job.
///
/// ## Example
/// ```rust
/// use stand_print::escpos::encode;
///
/// let bytes = encode(&["Summe: 3,50 €"], true);
/// assert_eq!(&bytes[..5], &[0x1B, 0x40, 0x1B, 0x74, 0x10]);
/// assert_eq!(&bytes[bytes.len() - 3..], &[0x1D, 0x56, 0x00]);
/// ```
pub fn encode<S: AsRef<str>>(lines: &[S], cut: bool) -> Vec<u8> {
    let text_len: usize = lines.iter().map(|l| l.as_ref().len() + 1).sum();
    let mut out = Vec::with_capacity(ESC_INIT.len() + ESC_SELECT_CP1252.len() + text_len + GS_CUT.len());

    out.extend_from_slice(&ESC_INIT);
    out.extend_from_slice(&ESC_SELECT_CP1252);
    for line in lines {
        push_cp1252(line.as_ref(), &mut out);
        out.push(LF);
    }
    if cut {
        out.extend_from_slice(&GS_CUT);
    }

    out
}

/// Appends `text` in Windows-1252, writing [`UNMAPPABLE`] for characters
/// that have no mapping.
pub fn push_cp1252(text: &str, out: &mut Vec<u8>) {
    let mut encoder = WINDOWS_1252.new_encoder();
    let mut buf = [0u8; 256];
    let mut rest = text;

    loop {
        let (result, read, written) =
            encoder.encode_from_utf8_without_replacement(rest, &mut buf, true);
        out.extend_from_slice(&buf[..written]);
        rest = &rest[read..];

        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => continue,
            EncoderResult::Unmappable(_) => out.push(UNMAPPABLE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_bytes() {
        let bytes = encode(&["A", "B"], true);
        assert_eq!(
            bytes,
            vec![0x1B, 0x40, 0x1B, 0x74, 0x10, b'A', 0x0A, b'B', 0x0A, 0x1D, 0x56, 0x00]
        );

        let bytes = encode(&["A"], false);
        assert_eq!(bytes, vec![0x1B, 0x40, 0x1B, 0x74, 0x10, b'A', 0x0A]);
    }

    #[test]
    fn test_no_lines() {
        let empty: [&str; 0] = [];
        assert_eq!(encode(&empty, false), vec![0x1B, 0x40, 0x1B, 0x74, 0x10]);
        assert_eq!(
            encode(&empty, true),
            vec![0x1B, 0x40, 0x1B, 0x74, 0x10, 0x1D, 0x56, 0x00]
        );
    }

    #[test]
    fn test_cp1252_mapping() {
        let mut out = Vec::new();
        push_cp1252("€ü", &mut out);
        assert_eq!(out, vec![0x80, 0xFC]);

        let mut out = Vec::new();
        push_cp1252("Mühle Grüß", &mut out);
        assert_eq!(out, b"M\xFChle Gr\xFC\xDF".to_vec());
    }

    #[test]
    fn test_unmappable_becomes_question_mark() {
        let mut out = Vec::new();
        push_cp1252("a🍟b漢", &mut out);
        assert_eq!(out, b"a?b?".to_vec());
    }

    #[test]
    fn test_long_line_crosses_buffer() {
        let line = "ä".repeat(600);
        let mut out = Vec::new();
        push_cp1252(&line, &mut out);
        assert_eq!(out.len(), 600);
        assert!(out.iter().all(|&b| b == 0xE4));
    }

    #[test]
    fn test_deterministic() {
        let lines = vec!["Testdruck €".to_string(), "Order #7".to_string()];
        assert_eq!(encode(&lines, true), encode(&lines, true));
    }
}
