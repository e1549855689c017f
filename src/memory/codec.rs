//! Encoding and decoding of fixed-width numeric values
//!
//! Everything here is pure and little-endian. Decoding deliberately returns
//! every interpretation the buffer supports, because operators routinely
//! guess the wrong type for a value they found.

use crate::core::types::{DecodedValue, MemoryError, MemoryResult, NumericValue, TypedValue, ValueType};

/// Byte width of a value type
pub fn width(value_type: ValueType) -> usize {
    value_type.width()
}

/// Parses operator input: `0x` hex (optionally signed), decimal integer or
/// decimal float. Anything else is a [`MemoryError::Parse`], never zero or NaN.
pub fn parse_number(input: &str) -> MemoryResult<NumericValue> {
    let s = input.trim();
    if s.is_empty() {
        return Err(MemoryError::parse(input, "empty input"));
    }

    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(MemoryError::parse(input, "invalid hexadecimal digits"));
        }
        let magnitude = i128::from_str_radix(hex, 16)
            .map_err(|_| MemoryError::parse(input, "hexadecimal value too large"))?;
        return Ok(NumericValue::Integer(if negative { -magnitude } else { magnitude }));
    }

    if !body.is_empty() && body.chars().all(|c| c.is_ascii_digit()) {
        let magnitude = body
            .parse::<i128>()
            .map_err(|_| MemoryError::parse(input, "integer value too large"))?;
        return Ok(NumericValue::Integer(if negative { -magnitude } else { magnitude }));
    }

    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(NumericValue::Float(v)),
        Ok(_) => Err(MemoryError::parse(input, "value is not finite")),
        Err(_) => Err(MemoryError::parse(input, "not a number")),
    }
}

/// Encodes `value` as exactly `width(value_type)` little-endian bytes.
///
/// Fails with [`MemoryError::Encode`] if the value does not fit the type, is
/// fractional for an integer type, or is not finite for a float type.
pub fn encode(value_type: ValueType, value: NumericValue) -> MemoryResult<Vec<u8>> {
    let bytes = match value_type {
        ValueType::Int8 => integer::<i8>(value_type, value)?.to_le_bytes().to_vec(),
        ValueType::UInt8 => integer::<u8>(value_type, value)?.to_le_bytes().to_vec(),
        ValueType::Int16 => integer::<i16>(value_type, value)?.to_le_bytes().to_vec(),
        ValueType::UInt16 => integer::<u16>(value_type, value)?.to_le_bytes().to_vec(),
        ValueType::Int32 => integer::<i32>(value_type, value)?.to_le_bytes().to_vec(),
        ValueType::UInt32 => integer::<u32>(value_type, value)?.to_le_bytes().to_vec(),
        ValueType::Int64 => integer::<i64>(value_type, value)?.to_le_bytes().to_vec(),
        ValueType::UInt64 => integer::<u64>(value_type, value)?.to_le_bytes().to_vec(),
        ValueType::Float32 => {
            let v = finite(value_type, value)?;
            if v.abs() > f64::from(f32::MAX) {
                return Err(MemoryError::encode(value_type, value, "out of range for float32"));
            }
            (v as f32).to_le_bytes().to_vec()
        }
        ValueType::Float64 => finite(value_type, value)?.to_le_bytes().to_vec(),
    };

    debug_assert_eq!(bytes.len(), value_type.width());
    Ok(bytes)
}

fn integer<T: TryFrom<i128>>(value_type: ValueType, value: NumericValue) -> MemoryResult<T> {
    let wide = match value {
        NumericValue::Integer(v) => v,
        NumericValue::Float(v) => {
            if !v.is_finite() || v.fract() != 0.0 {
                return Err(MemoryError::encode(value_type, value, "not an integer"));
            }
            // Saturating cast; anything clamped here fails the range check below.
            v as i128
        }
    };

    T::try_from(wide).map_err(|_| {
        MemoryError::encode(value_type, value, format!("out of range for {}", value_type))
    })
}

fn finite(value_type: ValueType, value: NumericValue) -> MemoryResult<f64> {
    let v = value.as_f64();
    if v.is_finite() {
        Ok(v)
    } else {
        Err(MemoryError::encode(value_type, value, "value is not finite"))
    }
}

fn take<const N: usize>(bytes: &[u8]) -> Option<[u8; N]> {
    bytes.get(..N)?.try_into().ok()
}

/// Decodes the value at `offset` as `value_type` only
pub fn decode_typed(value_type: ValueType, bytes: &[u8], offset: usize) -> MemoryResult<TypedValue> {
    let available = bytes.get(offset..).unwrap_or(&[]);

    let value = match value_type {
        ValueType::Int8 => take(available).map(|b| TypedValue::Int8(i8::from_le_bytes(b))),
        ValueType::UInt8 => take(available).map(|b| TypedValue::UInt8(u8::from_le_bytes(b))),
        ValueType::Int16 => take(available).map(|b| TypedValue::Int16(i16::from_le_bytes(b))),
        ValueType::UInt16 => take(available).map(|b| TypedValue::UInt16(u16::from_le_bytes(b))),
        ValueType::Int32 => take(available).map(|b| TypedValue::Int32(i32::from_le_bytes(b))),
        ValueType::UInt32 => take(available).map(|b| TypedValue::UInt32(u32::from_le_bytes(b))),
        ValueType::Int64 => take(available).map(|b| TypedValue::Int64(i64::from_le_bytes(b))),
        ValueType::UInt64 => take(available).map(|b| TypedValue::UInt64(u64::from_le_bytes(b))),
        ValueType::Float32 => take(available).map(|b| TypedValue::Float32(f32::from_le_bytes(b))),
        ValueType::Float64 => take(available).map(|b| TypedValue::Float64(f64::from_le_bytes(b))),
    };

    value.ok_or_else(|| MemoryError::buffer_too_small(value_type.width(), available.len()))
}

/// Decodes the buffer at `offset` into every interpretation it supports.
///
/// The buffer must hold at least `width(value_type)` bytes after `offset`;
/// a shorter buffer is a [`MemoryError::BufferTooSmall`].
pub fn decode(value_type: ValueType, bytes: &[u8], offset: usize) -> MemoryResult<DecodedValue> {
    let value = decode_typed(value_type, bytes, offset)?;
    let available = bytes.get(offset..).unwrap_or(&[]);
    let word: Option<[u8; 4]> = take(available);
    let dword: Option<[u8; 8]> = take(available);

    Ok(DecodedValue {
        value,
        as_int32: word.map(i32::from_le_bytes),
        as_uint32: word.map(u32::from_le_bytes),
        hex_uint32: word.map(|w| hex_u32(u32::from_le_bytes(w))),
        as_int64: dword.map(i64::from_le_bytes),
        as_uint64: dword.map(u64::from_le_bytes),
        hex_uint64: dword.map(|d| hex_u64(u64::from_le_bytes(d))),
        as_float32: word.map(f32::from_le_bytes),
        as_float64: dword.map(f64::from_le_bytes),
    })
}

/// `0x` + uppercase hex, no padding
pub fn hex_u32(value: u32) -> String {
    format!("0x{:X}", value)
}

/// `0x` + uppercase hex, no padding
pub fn hex_u64(value: u64) -> String {
    format!("0x{:X}", value)
}

/// Converts an operator number to the 32-bit pattern the native scan expects.
///
/// Accepts `i32::MIN..=u32::MAX`; negative values scan for their two's
/// complement bit pattern.
pub fn scan_pattern(value: NumericValue) -> MemoryResult<u32> {
    match value {
        NumericValue::Integer(v) if (i128::from(i32::MIN)..=i128::from(u32::MAX)).contains(&v) => {
            Ok(v as u32)
        }
        _ => Err(MemoryError::encode(
            ValueType::UInt32,
            value,
            "scan target must be a 32-bit integer",
        )),
    }
}
