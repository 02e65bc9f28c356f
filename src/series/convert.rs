//! Untyped value coercion
//!
//! Converts the scalars found in result rows into member types. The dispatch
//! is fixed at compile time by the member type: booleans, chars, 8/16/32/64-bit
//! signed and unsigned integers, `f32`/`f64`, `Decimal`, strings, byte
//! buffers, `DateTime<Utc>` and `Option` of any of those.
//!
//! Numbers are coerced across kinds (a float `3.0` fills an `i32`, an integer
//! fills an `f64`, `"42"` fills a `u16`); floats are rounded to the nearest
//! integer and range-checked. Decimals are read from the number's text, never
//! through `f64`. Integer timestamps are read as nanoseconds since
//! the Unix epoch, the precision InfluxDB uses by default.

use crate::series::types::Value;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// A single value could not be converted to the member type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// The value kind cannot represent the target type at all
    #[error("cannot convert {value} to {target}")]
    Incompatible { target: &'static str, value: String },

    /// The value is numeric but does not fit the target type
    #[error("{value} is out of range for {target}")]
    OutOfRange { target: &'static str, value: String },

    /// A string value failed to parse
    #[error("cannot parse {value:?} as {target}: {reason}")]
    Parse {
        target: &'static str,
        value: String,
        reason: String,
    },
}

impl ConvertError {
    fn incompatible(target: &'static str, value: &Value) -> Self {
        Self::Incompatible {
            target,
            value: value.to_string(),
        }
    }

    fn out_of_range(target: &'static str, value: &Value) -> Self {
        Self::OutOfRange {
            target,
            value: value.to_string(),
        }
    }

    fn parse(target: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Parse {
            target,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Types that can be filled from an untyped result value
pub trait FromValue: Sized {
    /// Target type name used in error messages
    const TARGET: &'static str;

    /// Convert a non-null value
    fn from_value(value: &Value) -> Result<Self, ConvertError>;

    /// What a null becomes; `None` leaves the member untouched
    fn from_null() -> Option<Self> {
        None
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                const TARGET: &'static str = stringify!($ty);

                fn from_value(value: &Value) -> Result<Self, ConvertError> {
                    match value {
                        Value::Number(n) => {
                            if let Some(i) = n.as_i64() {
                                <$ty>::try_from(i)
                                    .map_err(|_| ConvertError::out_of_range(Self::TARGET, value))
                            } else if let Some(u) = n.as_u64() {
                                <$ty>::try_from(u)
                                    .map_err(|_| ConvertError::out_of_range(Self::TARGET, value))
                            } else {
                                let f = n.as_f64().unwrap_or(f64::NAN).round();
                                if f.is_finite() && f >= <$ty>::MIN as f64 && f <= <$ty>::MAX as f64 {
                                    Ok(f as $ty)
                                } else {
                                    Err(ConvertError::out_of_range(Self::TARGET, value))
                                }
                            }
                        }
                        Value::Bool(b) => Ok(if *b { 1 } else { 0 }),
                        Value::String(s) => s
                            .trim()
                            .parse::<$ty>()
                            .map_err(|e| ConvertError::parse(Self::TARGET, s, e)),
                        _ => Err(ConvertError::incompatible(Self::TARGET, value)),
                    }
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! impl_from_value_float {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                const TARGET: &'static str = stringify!($ty);

                fn from_value(value: &Value) -> Result<Self, ConvertError> {
                    match value {
                        Value::Number(n) => n
                            .as_f64()
                            .map(|f| f as $ty)
                            .ok_or_else(|| ConvertError::incompatible(Self::TARGET, value)),
                        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
                        Value::String(s) => s
                            .trim()
                            .parse::<$ty>()
                            .map_err(|e| ConvertError::parse(Self::TARGET, s, e)),
                        _ => Err(ConvertError::incompatible(Self::TARGET, value)),
                    }
                }
            }
        )*
    };
}

impl_from_value_float!(f32, f64);

impl FromValue for Decimal {
    const TARGET: &'static str = "Decimal";

    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Number(n) => parse_decimal(&n.to_string()),
            Value::Bool(b) => Ok(if *b { Decimal::ONE } else { Decimal::ZERO }),
            Value::String(s) => parse_decimal(s.trim()),
            _ => Err(ConvertError::incompatible(Self::TARGET, value)),
        }
    }
}

// Floats may print in exponent form ("1e-5")
fn parse_decimal(text: &str) -> Result<Decimal, ConvertError> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|e| ConvertError::parse(Decimal::TARGET, text, e))
}

impl FromValue for bool {
    const TARGET: &'static str = "bool";

    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
            Value::String(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("true") {
                    Ok(true)
                } else if s.eq_ignore_ascii_case("false") {
                    Ok(false)
                } else {
                    Err(ConvertError::parse(Self::TARGET, s, "expected true or false"))
                }
            }
            _ => Err(ConvertError::incompatible(Self::TARGET, value)),
        }
    }
}

impl FromValue for char {
    const TARGET: &'static str = "char";

    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(ConvertError::parse(
                        Self::TARGET,
                        s,
                        "expected exactly one character",
                    )),
                }
            }
            Value::Number(_) => {
                let code = u32::from_value(value)?;
                char::from_u32(code).ok_or_else(|| ConvertError::out_of_range(Self::TARGET, value))
            }
            _ => Err(ConvertError::incompatible(Self::TARGET, value)),
        }
    }
}

impl FromValue for String {
    const TARGET: &'static str = "String";

    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Ok(other.to_string()),
        }
    }
}

impl FromValue for Vec<u8> {
    const TARGET: &'static str = "Vec<u8>";

    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            Value::Array(items) => items.iter().map(u8::from_value).collect(),
            _ => Err(ConvertError::incompatible(Self::TARGET, value)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    const TARGET: &'static str = "DateTime<Utc>";

    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| ConvertError::parse(Self::TARGET, s, e)),
            Value::Number(_) => {
                let nanos = i64::from_value(value)?;
                Ok(Utc.timestamp_nanos(nanos))
            }
            _ => Err(ConvertError::incompatible(Self::TARGET, value)),
        }
    }
}

impl FromValue for Value {
    const TARGET: &'static str = "Value";

    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        Ok(value.clone())
    }

    fn from_null() -> Option<Self> {
        Some(Value::Null)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const TARGET: &'static str = T::TARGET;

    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        T::from_value(value).map(Some)
    }

    fn from_null() -> Option<Self> {
        Some(None)
    }
}

/// Parse an enumeration from its string representation.
///
/// Numbers are parsed from their decimal text, so an enum whose `FromStr`
/// accepts discriminants (`"1"`) can be filled from integer columns.
pub fn parse_enum<E>(value: &Value) -> Result<E, ConvertError>
where
    E: FromStr,
    E::Err: std::fmt::Display,
{
    let target = std::any::type_name::<E>();
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return Err(ConvertError::incompatible(target, value)),
    };
    E::from_str(text.trim()).map_err(|e| ConvertError::parse(target, &text, e))
}

/// Convert a value, mapping null through [`FromValue::from_null`]
pub fn convert<T: FromValue>(value: &Value) -> Result<Option<T>, ConvertError> {
    if value.is_null() {
        Ok(T::from_null())
    } else {
        T::from_value(value).map(Some)
    }
}
