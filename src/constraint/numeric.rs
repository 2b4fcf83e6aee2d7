use std::cmp::Ordering;

use once_cell::sync::Lazy;
use ordered_float::OrderedFloat;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde_json::Value;

use crate::model::Argument;

/// The eleven operand kinds a numeric constraint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericKind {
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
}

/// An operand carried at its exact width.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericValue {
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Single(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    /// 96-bit mantissa with scale up to 28, the same range as the target's
    /// `decimal`.
    Decimal(Decimal),
}

/// Sign, integer digits, optional fraction digits, optional exponent.
static DECIMAL_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?)(\d*)(?:\.(\d+))?(?:[eE]([+-]?\d+))?$").unwrap()
});

/// Exponents beyond this cannot land inside the decimal range.
const MAX_DECIMAL_EXPONENT: i32 = 64;

/// Plain floats up to this magnitude print positionally; beyond it the
/// literal switches to exponent form.
const POSITIONAL_FLOAT_LIMIT: f64 = 1e16;

// ------------------------------- Kinds ----------------------------------- //

impl NumericKind {
    /// Accepts both the keyword (`int`) and the metadata name (`System.Int32`).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.strip_prefix("global::").unwrap_or(name);
        let kind = match name {
            "sbyte" | "System.SByte" => Self::SByte,
            "byte" | "System.Byte" => Self::Byte,
            "short" | "System.Int16" => Self::Int16,
            "ushort" | "System.UInt16" => Self::UInt16,
            "int" | "System.Int32" => Self::Int32,
            "uint" | "System.UInt32" => Self::UInt32,
            "long" | "System.Int64" => Self::Int64,
            "ulong" | "System.UInt64" => Self::UInt64,
            "float" | "System.Single" => Self::Single,
            "double" | "System.Double" => Self::Double,
            "decimal" | "System.Decimal" => Self::Decimal,
            _ => return None,
        };
        Some(kind)
    }
}

// ------------------------------- Values ---------------------------------- //

impl NumericValue {
    /// `None` when the kind is not numeric or the value does not fit it.
    pub fn from_argument(argument: &Argument) -> Option<Self> {
        let kind = NumericKind::from_name(&argument.kind)?;
        Self::parse(kind, &argument.value)
    }

    pub fn parse(kind: NumericKind, value: &Value) -> Option<Self> {
        fn signed<T: TryFrom<i64>>(value: &Value) -> Option<T> {
            value.as_i64().and_then(|v| T::try_from(v).ok())
        }
        fn unsigned<T: TryFrom<u64>>(value: &Value) -> Option<T> {
            value.as_u64().and_then(|v| T::try_from(v).ok())
        }

        let parsed = match kind {
            NumericKind::SByte => Self::SByte(signed(value)?),
            NumericKind::Byte => Self::Byte(unsigned(value)?),
            NumericKind::Int16 => Self::Int16(signed(value)?),
            NumericKind::UInt16 => Self::UInt16(unsigned(value)?),
            NumericKind::Int32 => Self::Int32(signed(value)?),
            NumericKind::UInt32 => Self::UInt32(unsigned(value)?),
            NumericKind::Int64 => Self::Int64(signed(value)?),
            NumericKind::UInt64 => Self::UInt64(unsigned(value)?),
            NumericKind::Single => {
                let wide = float_value(value)?;
                let narrow = wide as f32;
                if wide.is_finite() && !narrow.is_finite() {
                    return None;
                }
                Self::Single(OrderedFloat(narrow))
            }
            NumericKind::Double => Self::Double(OrderedFloat(float_value(value)?)),
            NumericKind::Decimal => {
                let text = match value {
                    Value::String(s) => s.trim().to_string(),
                    Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                Self::Decimal(parse_decimal(&text)?)
            }
        };
        Some(parsed)
    }

    /// Source literal with the suffix the target language needs for the kind.
    pub fn literal(&self) -> String {
        match self {
            Self::SByte(v) => v.to_string(),
            Self::Byte(v) => v.to_string(),
            Self::Int16(v) => v.to_string(),
            Self::UInt16(v) => v.to_string(),
            Self::Int32(v) => v.to_string(),
            Self::UInt32(v) => format!("{v}U"),
            Self::Int64(v) => format!("{v}L"),
            Self::UInt64(v) => format!("{v}UL"),
            Self::Single(v) => float_literal(f64::from(v.0), float_text(v.0, f64::from(v.0)), "float", "F"),
            Self::Double(v) => float_literal(v.0, float_text(v.0, v.0), "double", "D"),
            Self::Decimal(d) => format!("{d}M"),
        }
    }

    /// Numeric comparison across kinds. `None` when either side is NaN.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_integer(), other.as_integer()) {
            return Some(a.cmp(&b));
        }
        if let (Some(a), Some(b)) = (self.as_decimal(), other.as_decimal()) {
            return Some(a.cmp(&b));
        }
        self.as_f64()?.partial_cmp(&other.as_f64()?)
    }

    /// Exact decimal view of integers and decimals.
    fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(d) => Some(*d),
            other => other.as_integer().and_then(Decimal::from_i128),
        }
    }

    fn as_integer(&self) -> Option<i128> {
        let v = match self {
            Self::SByte(v) => i128::from(*v),
            Self::Byte(v) => i128::from(*v),
            Self::Int16(v) => i128::from(*v),
            Self::UInt16(v) => i128::from(*v),
            Self::Int32(v) => i128::from(*v),
            Self::UInt32(v) => i128::from(*v),
            Self::Int64(v) => i128::from(*v),
            Self::UInt64(v) => i128::from(*v),
            Self::Single(_) | Self::Double(_) | Self::Decimal(_) => return None,
        };
        Some(v)
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Single(v) => Some(f64::from(v.0)),
            Self::Double(v) => Some(v.0),
            Self::Decimal(d) => d.to_f64(),
            other => other.as_integer().map(|v| v as f64),
        }
    }
}

fn float_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" | "+Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        _ => None,
    }
}

/// Range-checked decimal from literal text. Exponent forms are expanded to
/// positional digits first so overflow and excess scale are both rejected.
fn parse_decimal(text: &str) -> Option<Decimal> {
    let caps = DECIMAL_LITERAL.captures(text)?;
    let sign = caps.get(1).map_or("", |m| m.as_str());
    let int = caps.get(2).map_or("", |m| m.as_str());
    let frac = caps.get(3).map_or("", |m| m.as_str());
    if int.is_empty() && frac.is_empty() {
        return None;
    }
    let exponent = match caps.get(4) {
        Some(m) => m.as_str().parse::<i32>().ok().filter(|e| e.abs() <= MAX_DECIMAL_EXPONENT)?,
        None => 0,
    };

    let digits = format!("{int}{frac}");
    let point = int.len() as i32 + exponent;
    let positional = if point <= 0 {
        format!("0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else if point as usize >= digits.len() {
        format!("{digits}{}", "0".repeat(point as usize - digits.len()))
    } else {
        let (whole, fraction) = digits.split_at(point as usize);
        format!("{whole}.{fraction}")
    };
    let sign = if sign == "-" { "-" } else { "" };
    Decimal::from_str_exact(&format!("{sign}{positional}")).ok()
}

/// Shortest round-trip text, in exponent form for very large or very small
/// magnitudes.
fn float_text<T: std::fmt::Display + std::fmt::LowerExp>(v: T, magnitude: f64) -> String {
    let magnitude = magnitude.abs();
    if magnitude >= POSITIONAL_FLOAT_LIMIT || (magnitude != 0.0 && magnitude < 1e-5) {
        format!("{v:e}")
    } else {
        v.to_string()
    }
}

fn float_literal(v: f64, text: String, keyword: &str, suffix: &str) -> String {
    if v.is_nan() {
        format!("{keyword}.NaN")
    } else if v == f64::INFINITY {
        format!("{keyword}.PositiveInfinity")
    } else if v == f64::NEG_INFINITY {
        format!("{keyword}.NegativeInfinity")
    } else {
        format!("{text}{suffix}")
    }
}

// ------------------------------- Tests ------------------------------------ //
