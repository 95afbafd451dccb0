//! Response encoding.
//!
//! Every payload leaves the server as pretty-printed JSON. Integers that a
//! double-precision client cannot hold exactly are rewritten as decimal
//! strings first, at any depth.

use serde_json::{Number, Value};

use crate::core::error::ToolError;

/// Largest integer a JSON client using doubles can represent exactly.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Encode `value` as 2-space indented JSON with large integers stringified.
///
/// The rewrite is per value, not per field: the same upstream field (a
/// token `balance`, say) is a number when it fits in 53 bits and a string
/// when it does not. Clients should accept both forms for integer fields.
pub fn encode(value: Value) -> Result<String, ToolError> {
    Ok(serde_json::to_string_pretty(&stringify_large_integers(value))?)
}

/// Replace every unsafe integer in `value` with its decimal string.
pub fn stringify_large_integers(value: Value) -> Value {
    match value {
        Value::Number(number) if is_unsafe_integer(&number) => Value::String(number.to_string()),
        Value::Array(items) => Value::Array(items.into_iter().map(stringify_large_integers).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, stringify_large_integers(value)))
                .collect(),
        ),
        other => other,
    }
}

fn is_unsafe_integer(number: &Number) -> bool {
    if let Some(n) = number.as_u64() {
        return n > MAX_SAFE_INTEGER;
    }
    if let Some(n) = number.as_i64() {
        return n.unsigned_abs() > MAX_SAFE_INTEGER;
    }
    // Beyond 64 bits the number only survives as its literal (arbitrary
    // precision); anything without a fraction or exponent is an integer.
    let literal = number.to_string();
    let digits = literal.strip_prefix('-').unwrap_or(&literal);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_small_values_untouched() {
        let value = json!({"a": 1, "b": -2, "c": 1.5, "d": "x", "e": null, "f": true});
        assert_eq!(stringify_large_integers(value.clone()), value);
    }

    #[test]
    fn test_same_field_can_change_form() {
        let small = encode(json!({"balance": 5})).unwrap();
        let large = encode(json!({"balance": MAX_SAFE_INTEGER + 1})).unwrap();

        let small: Value = serde_json::from_str(&small).unwrap();
        let large: Value = serde_json::from_str(&large).unwrap();
        assert!(small["balance"].is_number());
        assert_eq!(large["balance"], json!((MAX_SAFE_INTEGER + 1).to_string()));
    }

    #[test]
    fn test_safe_boundary() {
        let value = json!([MAX_SAFE_INTEGER, MAX_SAFE_INTEGER + 1]);
        assert_eq!(
            stringify_large_integers(value),
            json!([MAX_SAFE_INTEGER, "9007199254740992"])
        );
    }

    #[test]
    fn test_nested_and_negative() {
        let value = json!({"outer": {"list": [{"v": i64::MIN}, {"v": u64::MAX}]}});
        assert_eq!(
            stringify_large_integers(value),
            json!({"outer": {"list": [
                {"v": "-9223372036854775808"},
                {"v": "18446744073709551615"}
            ]}})
        );
    }

    #[test]
    fn test_beyond_u64_keeps_digits() {
        let value: Value =
            serde_json::from_str(r#"{"balance": 340282366920938463463374607431768211455}"#).unwrap();
        let encoded = encode(value).unwrap();

        let decoded: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded["balance"], json!("340282366920938463463374607431768211455"));
    }

    #[test]
    fn test_floats_are_not_integers() {
        let value: Value = serde_json::from_str(r#"[1e300, 12345678901234567890.5]"#).unwrap();
        let out = stringify_large_integers(value);
        assert!(out[0].is_number());
        assert!(out[1].is_number());
    }

    #[test]
    fn test_pretty_printed_with_two_spaces() {
        let encoded = encode(json!({"a": [1]})).unwrap();
        assert_eq!(encoded, "{\n  \"a\": [\n    1\n  ]\n}");
    }

    #[test]
    fn test_round_trip_is_stable() {
        let value = json!({"big": 9007199254740993u64, "small": 7});
        let once = encode(value).unwrap();
        let twice = encode(serde_json::from_str(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }
}
