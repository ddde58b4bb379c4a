//! Input format detection
//!
//! Classifies a byte prefix as CSV, TSV, JSON or JSON-lines without consuming
//! the underlying stream.

use csv_nose::Sniffer;
use log::debug;
use std::fmt;
use std::io::{self, Cursor, Read};

/// Number of bytes inspected when no format was declared
pub const PEEK_SIZE: usize = 2048;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Textual input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Csv,
    Tsv,
    Json,
    Jsonl,
}

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Tsv => "tsv",
            Format::Json => "json",
            Format::Jsonl => "jsonl",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a peek window
pub fn sniff(window: &[u8]) -> Format {
    let window = window.strip_prefix(UTF8_BOM).unwrap_or(window);
    let trimmed = window.trim_ascii_start();

    if trimmed.starts_with(b"[") {
        return Format::Json;
    }

    if trimmed.starts_with(b"{") {
        let parts: Vec<&[u8]> = trimmed.splitn(3, |&b| b == b'\n').collect();
        if parts.len() >= 2 && parts[0].trim_ascii().starts_with(b"{") {
            return Format::Jsonl;
        }
        return Format::Json;
    }

    match sniff_delimiter(window) {
        Some(b'\t') => Format::Tsv,
        _ => Format::Csv,
    }
}

/// Peek at the start of `reader` and classify it.
///
/// The returned reader yields the peeked bytes followed by the rest of the
/// stream, so the chosen loader sees the complete input.
pub fn detect_format<R: Read>(mut reader: R) -> io::Result<(Format, impl Read)> {
    let mut window = Vec::with_capacity(PEEK_SIZE);
    (&mut reader)
        .take(PEEK_SIZE as u64)
        .read_to_end(&mut window)?;

    let format = sniff(&window);
    debug!("detected {} input from {} byte window", format, window.len());

    Ok((format, Cursor::new(window).chain(reader)))
}

/// Field delimiter of delimited text, `None` when no dialect can be sniffed.
///
/// A window cut at [`PEEK_SIZE`] is trimmed back to its last complete line.
fn sniff_delimiter(window: &[u8]) -> Option<u8> {
    let sample = if window.len() >= PEEK_SIZE {
        match window.iter().rposition(|&b| b == b'\n') {
            Some(end) => &window[..=end],
            None => window,
        }
    } else {
        window
    };
    if sample.trim_ascii().is_empty() {
        return None;
    }

    match Sniffer::new().sniff_bytes(sample) {
        Ok(metadata) => Some(metadata.dialect.delimiter),
        Err(e) => {
            debug!("delimiter sniffing failed, assuming csv: {}", e);
            None
        }
    }
}
