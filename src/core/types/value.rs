//! Value types for typed memory access

use super::error::{MemoryError, MemoryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Enum representing the fixed-width numeric type of a memory value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl ValueType {
    /// Every supported type, narrowest first
    pub const ALL: [ValueType; 10] = [
        ValueType::Int8,
        ValueType::UInt8,
        ValueType::Int16,
        ValueType::UInt16,
        ValueType::Int32,
        ValueType::UInt32,
        ValueType::Int64,
        ValueType::UInt64,
        ValueType::Float32,
        ValueType::Float64,
    ];

    /// Returns the size in bytes for this value type
    pub const fn width(&self) -> usize {
        match self {
            ValueType::Int8 | ValueType::UInt8 => 1,
            ValueType::Int16 | ValueType::UInt16 => 2,
            ValueType::Int32 | ValueType::UInt32 | ValueType::Float32 => 4,
            ValueType::Int64 | ValueType::UInt64 | ValueType::Float64 => 8,
        }
    }

    /// Lowercase display name, also accepted by [`FromStr`]
    pub const fn name(&self) -> &'static str {
        match self {
            ValueType::Int8 => "int8",
            ValueType::UInt8 => "uint8",
            ValueType::Int16 => "int16",
            ValueType::UInt16 => "uint16",
            ValueType::Int32 => "int32",
            ValueType::UInt32 => "uint32",
            ValueType::Int64 => "int64",
            ValueType::UInt64 => "uint64",
            ValueType::Float32 => "float32",
            ValueType::Float64 => "float64",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueType {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value_type = match s.trim().to_ascii_lowercase().as_str() {
            "int8" | "i8" | "byte" => ValueType::Int8,
            "uint8" | "u8" => ValueType::UInt8,
            "int16" | "i16" | "short" => ValueType::Int16,
            "uint16" | "u16" => ValueType::UInt16,
            "int32" | "i32" | "int" => ValueType::Int32,
            "uint32" | "u32" => ValueType::UInt32,
            "int64" | "i64" | "long" => ValueType::Int64,
            "uint64" | "u64" => ValueType::UInt64,
            "float32" | "f32" | "float" => ValueType::Float32,
            "float64" | "f64" | "double" => ValueType::Float64,
            _ => return Err(MemoryError::parse(s, "unknown value type")),
        };
        Ok(value_type)
    }
}

/// A number as supplied by the operator, before it is bound to a [`ValueType`].
///
/// Integers are carried as `i128` so the full `Int64` and `UInt64` ranges
/// survive without floating point rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum NumericValue {
    Integer(i128),
    Float(f64),
}

impl NumericValue {
    /// Returns the value as `f64`, possibly rounding large integers
    pub fn as_f64(&self) -> f64 {
        match *self {
            NumericValue::Integer(v) => v as f64,
            NumericValue::Float(v) => v,
        }
    }
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericValue::Integer(v) => write!(f, "{}", v),
            NumericValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for NumericValue {
    fn from(value: i64) -> Self {
        NumericValue::Integer(i128::from(value))
    }
}

impl From<u64> for NumericValue {
    fn from(value: u64) -> Self {
        NumericValue::Integer(i128::from(value))
    }
}

impl From<i32> for NumericValue {
    fn from(value: i32) -> Self {
        NumericValue::Integer(i128::from(value))
    }
}

impl From<u32> for NumericValue {
    fn from(value: u32) -> Self {
        NumericValue::Integer(i128::from(value))
    }
}

impl From<f64> for NumericValue {
    fn from(value: f64) -> Self {
        NumericValue::Float(value)
    }
}

impl From<f32> for NumericValue {
    fn from(value: f32) -> Self {
        NumericValue::Float(f64::from(value))
    }
}

/// A value decoded as one specific [`ValueType`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TypedValue {
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
}

impl TypedValue {
    /// Gets the value type enum for this value
    pub fn value_type(&self) -> ValueType {
        match self {
            TypedValue::Int8(_) => ValueType::Int8,
            TypedValue::UInt8(_) => ValueType::UInt8,
            TypedValue::Int16(_) => ValueType::Int16,
            TypedValue::UInt16(_) => ValueType::UInt16,
            TypedValue::Int32(_) => ValueType::Int32,
            TypedValue::UInt32(_) => ValueType::UInt32,
            TypedValue::Int64(_) => ValueType::Int64,
            TypedValue::UInt64(_) => ValueType::UInt64,
            TypedValue::Float32(_) => ValueType::Float32,
            TypedValue::Float64(_) => ValueType::Float64,
        }
    }

    /// Converts back into an operator-level number
    pub fn to_numeric(&self) -> NumericValue {
        match *self {
            TypedValue::Int8(v) => NumericValue::Integer(v.into()),
            TypedValue::UInt8(v) => NumericValue::Integer(v.into()),
            TypedValue::Int16(v) => NumericValue::Integer(v.into()),
            TypedValue::UInt16(v) => NumericValue::Integer(v.into()),
            TypedValue::Int32(v) => NumericValue::Integer(v.into()),
            TypedValue::UInt32(v) => NumericValue::Integer(v.into()),
            TypedValue::Int64(v) => NumericValue::Integer(v.into()),
            TypedValue::UInt64(v) => NumericValue::Integer(v.into()),
            TypedValue::Float32(v) => NumericValue::Float(v.into()),
            TypedValue::Float64(v) => NumericValue::Float(v),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Int8(v) => write!(f, "{}", v),
            TypedValue::UInt8(v) => write!(f, "{}", v),
            TypedValue::Int16(v) => write!(f, "{}", v),
            TypedValue::UInt16(v) => write!(f, "{}", v),
            TypedValue::Int32(v) => write!(f, "{}", v),
            TypedValue::UInt32(v) => write!(f, "{}", v),
            TypedValue::Int64(v) => write!(f, "{}", v),
            TypedValue::UInt64(v) => write!(f, "{}", v),
            TypedValue::Float32(v) => write!(f, "{}", v),
            TypedValue::Float64(v) => write!(f, "{}", v),
        }
    }
}

/// Every interpretation a byte buffer supports.
///
/// `value` is the reading for the type the caller asked for. The remaining
/// fields are filled in whenever enough bytes are present after the offset:
/// four for the 32-bit and `float32` readings, eight for the 64-bit and
/// `float64` readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedValue {
    pub value: TypedValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_int32: Option<i32>,
    #[serde(rename = "asUInt32", skip_serializing_if = "Option::is_none")]
    pub as_uint32: Option<u32>,
    #[serde(rename = "hexUInt32", skip_serializing_if = "Option::is_none")]
    pub hex_uint32: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_int64: Option<i64>,
    #[serde(rename = "asUInt64", skip_serializing_if = "Option::is_none")]
    pub as_uint64: Option<u64>,
    #[serde(rename = "hexUInt64", skip_serializing_if = "Option::is_none")]
    pub hex_uint64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_float32: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_float64: Option<f64>,
}

impl DecodedValue {
    /// Convenience accessor used by scan consumers
    pub fn int32(&self) -> MemoryResult<i32> {
        self.as_int32
            .ok_or_else(|| MemoryError::buffer_too_small(4, self.value.value_type().width()))
    }
}
