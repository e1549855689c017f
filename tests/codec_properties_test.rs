//! Property tests for the value codec

use memory_trainer::core::types::*;
use memory_trainer::memory::codec::{decode, decode_typed, encode, parse_number, width};
use proptest::prelude::*;

fn integer_case() -> impl Strategy<Value = (ValueType, i128)> {
    prop_oneof![
        any::<i8>().prop_map(|v| (ValueType::Int8, v as i128)),
        any::<u8>().prop_map(|v| (ValueType::UInt8, v as i128)),
        any::<i16>().prop_map(|v| (ValueType::Int16, v as i128)),
        any::<u16>().prop_map(|v| (ValueType::UInt16, v as i128)),
        any::<i32>().prop_map(|v| (ValueType::Int32, v as i128)),
        any::<u32>().prop_map(|v| (ValueType::UInt32, v as i128)),
        any::<i64>().prop_map(|v| (ValueType::Int64, v as i128)),
        any::<u64>().prop_map(|v| (ValueType::UInt64, v as i128)),
    ]
}

proptest! {
    #[test]
    fn integers_round_trip_exactly((value_type, value) in integer_case()) {
        let bytes = encode(value_type, NumericValue::Integer(value)).unwrap();
        prop_assert_eq!(bytes.len(), width(value_type));

        let decoded = decode_typed(value_type, &bytes, 0).unwrap();
        prop_assert_eq!(decoded.to_numeric(), NumericValue::Integer(value));
    }

    #[test]
    fn float64_round_trips_exactly(value in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
        let bytes = encode(ValueType::Float64, NumericValue::Float(value)).unwrap();
        prop_assert_eq!(bytes.len(), 8);
        prop_assert_eq!(decode(ValueType::Float64, &bytes, 0).unwrap().as_float64, Some(value));
    }

    #[test]
    fn float32_round_trips_within_epsilon(value in -1.0e30f64..1.0e30f64) {
        let bytes = encode(ValueType::Float32, NumericValue::Float(value)).unwrap();
        prop_assert_eq!(bytes.len(), 4);

        let back = decode(ValueType::Float32, &bytes, 0).unwrap().as_float32.unwrap() as f64;
        let tolerance = value.abs() * f32::EPSILON as f64 + f32::MIN_POSITIVE as f64;
        prop_assert!((back - value).abs() <= tolerance, "{} -> {}", value, back);
    }

    #[test]
    fn out_of_range_integers_never_encode(value in (u32::MAX as i128 + 1)..i128::MAX) {
        for value_type in [ValueType::Int32, ValueType::UInt32, ValueType::Int16, ValueType::UInt8] {
            let err = encode(value_type, NumericValue::Integer(value)).unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::Encode);
        }
    }

    #[test]
    fn short_buffers_are_decode_errors(len in 0usize..8) {
        let bytes = vec![0xAB; len];
        for value_type in ValueType::ALL {
            let result = decode(value_type, &bytes, 0);
            if len < width(value_type) {
                prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::Decode);
            } else {
                prop_assert!(result.is_ok());
            }
        }
    }

    #[test]
    fn decimal_and_hex_parse_agree(value in any::<u32>()) {
        let decimal = parse_number(&value.to_string()).unwrap();
        let hex = parse_number(&format!("0x{:X}", value)).unwrap();
        prop_assert_eq!(decimal, hex);
    }
}

#[test]
fn test_three_bytes_is_not_a_word() {
    let err = decode(ValueType::Int32, &[1, 2, 3], 0).unwrap_err();
    assert_eq!(err, MemoryError::buffer_too_small(4, 3));
}

#[test]
fn test_offset_decoding() {
    let bytes = [0xFF, 0xEF, 0xBE, 0xAD, 0xDE, 0x01, 0x00, 0x00, 0x00];
    let decoded = decode(ValueType::UInt32, &bytes, 1).unwrap();
    assert_eq!(decoded.hex_uint32.as_deref(), Some("0xDEADBEEF"));
    assert_eq!(decoded.as_uint64, Some(0x01_DEAD_BEEF));

    assert!(decode(ValueType::UInt32, &bytes, 6).is_err());
    assert!(decode(ValueType::UInt8, &bytes, 100).is_err());
}
