//! Serialization of IEEE-754 double precision numbers,
//! as specified by [ECMAScript's `Number::toString`](https://tc39.es/ecma262/#sec-numeric-types-number-tostring)
//! and required by the [JSON Canonicalization Scheme](https://www.rfc-editor.org/rfc/rfc8785#name-serialization-of-numbers).
//!
//! The output is the shortest decimal string that parses back to the same number,
//! written in fixed notation when the magnitude is in `[1e-6, 1e21)`,
//! and in exponential notation otherwise.
//!
//! ```
//! # use ldtk_c14n::number::format_number;
//! assert_eq!(format_number(-0.0).unwrap(), "0");
//! assert_eq!(format_number(1e21).unwrap(), "1e+21");
//! assert_eq!(format_number(0.000001).unwrap(), "0.000001");
//! assert_eq!(format_number(1e-7).unwrap(), "1e-7");
//! assert!(format_number(f64::NAN).is_err());
//! ```
use thiserror::Error;

/// Raised when trying to serialize NaN or an infinite number.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
#[error("Invalid number format: {0} has no canonical serialization")]
pub struct InvalidNumber(pub f64);

/// Smallest magnitude written in fixed notation.
const FIXED_MIN: f64 = 1e-6;
/// Smallest magnitude written in exponential notation (above [`FIXED_MIN`]).
const FIXED_MAX: f64 = 1e21;

/// Serialize `value` as ECMAScript would.
///
/// Fails for NaN and infinite values.
pub fn format_number(value: f64) -> Result<String, InvalidNumber> {
    if !value.is_finite() {
        return Err(InvalidNumber(value));
    }
    if value == 0.0 {
        // also covers -0
        return Ok("0".to_string());
    }
    let magnitude = value.abs();
    if (FIXED_MIN..FIXED_MAX).contains(&magnitude) {
        // Rust's Display for f64 produces the shortest round-tripping digits,
        // in fixed notation and without a trailing ".0"
        Ok(format!("{value}"))
    } else {
        Ok(exponential(value))
    }
}

/// Shortest round-tripping digits in ECMAScript exponential notation (`d[.ddd]e±n`).
fn exponential(value: f64) -> String {
    let txt = format!("{value:e}");
    match txt.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => txt,
    }
}
