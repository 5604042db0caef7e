//! The [JSON Canonicalization Scheme](https://www.rfc-editor.org/rfc/rfc8785) (JCS).
//!
//! The canonical form of a JSON value has no whitespace,
//! object members sorted by the UTF-16 code units of their keys,
//! strings with a minimal set of escape sequences,
//! and numbers serialized with [`format_number`].
use crate::number::{format_number, InvalidNumber};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt::Write;

/// Serialize `value` in canonical form.
///
/// Fails if a number can not be represented as a finite IEEE-754 double.
pub fn canonicalize(value: &Value) -> Result<String, InvalidNumber> {
    let mut buffer = String::new();
    write_value(value, &mut buffer)?;
    Ok(buffer)
}

fn write_value(value: &Value, buffer: &mut String) -> Result<(), InvalidNumber> {
    match value {
        Value::Null => buffer.push_str("null"),
        Value::Bool(true) => buffer.push_str("true"),
        Value::Bool(false) => buffer.push_str("false"),
        Value::Number(n) => {
            let f = n.as_f64().unwrap_or(f64::NAN);
            buffer.push_str(&format_number(f)?);
        }
        Value::String(s) => write_string(s, buffer),
        Value::Array(items) => {
            buffer.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buffer.push(',');
                }
                write_value(item, buffer)?;
            }
            buffer.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(k1, _), (k2, _)| cmp_utf16(k1, k2));
            buffer.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    buffer.push(',');
                }
                write_string(key, buffer);
                buffer.push(':');
                write_value(item, buffer)?;
            }
            buffer.push('}');
        }
    }
    Ok(())
}

fn write_string(s: &str, buffer: &mut String) {
    buffer.push('"');
    for c in s.chars() {
        match c {
            '"' => buffer.push_str("\\\""),
            '\\' => buffer.push_str("\\\\"),
            '\n' => buffer.push_str("\\n"),
            '\r' => buffer.push_str("\\r"),
            '\t' => buffer.push_str("\\t"),
            '\x08' => buffer.push_str("\\b"),
            '\x0c' => buffer.push_str("\\f"),
            c if c < '\x20' => {
                // writing into a String can not fail
                let _ = write!(buffer, "\\u{:04x}", c as u32);
            }
            c => buffer.push(c),
        }
    }
    buffer.push('"');
}

/// Compare strings by their UTF-16 code units.
fn cmp_utf16(s1: &str, s2: &str) -> Ordering {
    s1.encode_utf16().cmp(s2.encode_utf16())
}
