//! Canonical JSON encoding and size-bounded alert body truncation
//!
//! Payload bytes must be byte-identical for equal field mappings, so the
//! encoder relies on `serde_json::Map` being backed by a `BTreeMap` (the
//! `preserve_order` feature must stay disabled). That gives sorted keys at
//! every nesting level. Output goes through [`AsciiFormatter`]: compact
//! `,` and `:` separators, every character outside printable ASCII written
//! as a lowercase `\uXXXX` escape (UTF-16 surrogate pairs above U+FFFF), and
//! floats in shortest round-trip form with a signed two-digit exponent
//! (`1e-05`, `1e+16`). The size ceiling is measured on these escaped bytes.

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::{Map, Value};
use std::io::{self, Write};
use tracing::{debug, error, warn};

/// Suffix appended to a truncated alert body
pub const ELLIPSIS: &str = "...";

/// Floats at or beyond these decimal exponents are written in scientific form
const MIN_PLAIN_EXPONENT: i32 = -4;
const MAX_PLAIN_EXPONENT: i32 = 16;

/// Compact JSON formatter that keeps the output pure ASCII
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(fragment[start..idx].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(format_float(value).as_bytes())
    }
}

/// Shortest round-trip text for a finite float, always carrying either a
/// fraction or an exponent (`1.0`, `0.0001`, `1e-05`, `2.5e+20`)
fn format_float(value: f64) -> String {
    let scientific = format!("{value:e}");
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if value != 0.0 && !(MIN_PLAIN_EXPONENT..MAX_PLAIN_EXPONENT).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs());
    }

    let plain = value.to_string();
    if plain.contains('.') {
        plain
    } else {
        format!("{plain}.0")
    }
}

/// Encode a field mapping as compact, key-sorted, ASCII-only JSON
pub fn encode(fields: Map<String, Value>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    let mut serializer = Serializer::with_formatter(&mut buf, AsciiFormatter);
    if let Err(e) = Value::Object(fields).serialize(&mut serializer) {
        // Map keys are always strings and Vec writes never fail
        error!(error = %e, "Failed to encode payload fields");
        buf.clear();
    }
    buf
}

/// Encode the mapping produced by `render`, shrinking the alert body until
/// the output fits in `limit` bytes.
///
/// `render` is called with `None` for the untouched payload and with
/// `Some(candidate)` for each truncated body. Each pass strips
/// `max(1, extra / 10)` characters from the end of the working copy, so the
/// loop runs at most once per character of `body`.
pub fn encode_within_limit<F>(body: Option<&str>, limit: usize, render: F) -> Vec<u8>
where
    F: Fn(Option<&str>) -> Map<String, Value>,
{
    let mut encoded = encode(render(None));

    let body = match body {
        Some(body) if !body.is_empty() => body,
        _ => return encoded,
    };
    if encoded.len() <= limit {
        return encoded;
    }

    let original_len = encoded.len();
    let mut working = body.to_owned();
    let mut iterations = 0usize;

    debug!(
        original_len,
        limit,
        body_chars = body.chars().count(),
        "Payload exceeds size limit, truncating alert body"
    );

    while !working.is_empty() && encoded.len() > limit {
        let extra = encoded.len() - limit;
        let chars_to_strip = std::cmp::max(1, extra / 10);
        strip_trailing_chars(&mut working, chars_to_strip);

        let candidate = format!("{working}{ELLIPSIS}");
        encoded = encode(render(Some(&candidate)));
        iterations += 1;
    }

    if encoded.len() > limit {
        warn!(
            encoded_len = encoded.len(),
            limit, "Payload still exceeds size limit after truncating alert body"
        );
    } else {
        debug!(
            original_len,
            final_len = encoded.len(),
            iterations,
            "Alert body truncated"
        );
    }

    encoded
}

/// Remove up to `count` characters (not bytes) from the end of `s`
fn strip_trailing_chars(s: &mut String, count: usize) {
    match s.char_indices().rev().nth(count.saturating_sub(1)) {
        Some((idx, _)) if count > 0 => s.truncate(idx),
        Some(_) => {}
        None => s.clear(),
    }
}
