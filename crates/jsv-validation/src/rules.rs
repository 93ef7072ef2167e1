//! Validation rules
//!
//! Each rule checks one constraint against an already kind-checked value and
//! returns a [`RuleResult`]; the engine turns failures into located errors.

use jsv_ir::{Number, Value};
use regex::Regex;

/// Validation rule result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleResult {
    pub is_valid: bool,
    pub message: Option<String>,
}

impl RuleResult {
    #[must_use]
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
        }
    }
}

/// Validate string length in characters, not bytes
#[must_use]
pub fn validate_length(value: &str, min: Option<u64>, max: Option<u64>) -> RuleResult {
    let len = value.chars().count() as u64;

    if let Some(min) = min {
        if len < min {
            return RuleResult::invalid(format!(
                "String length must be greater than or equal to {min}"
            ));
        }
    }

    if let Some(max) = max {
        if len > max {
            return RuleResult::invalid(format!(
                "String length must be less than or equal to {max}"
            ));
        }
    }

    RuleResult::valid()
}

/// Validate against a pattern; the regex is unanchored
#[must_use]
pub fn validate_pattern(value: &str, pattern: &Regex) -> RuleResult {
    if pattern.is_match(value) {
        RuleResult::valid()
    } else {
        RuleResult::invalid(format!("Does not match pattern '{}'", pattern.as_str()))
    }
}

#[must_use]
pub fn validate_minimum(value: Number, minimum: Number, exclusive: bool) -> RuleResult {
    if exclusive {
        if value > minimum {
            return RuleResult::valid();
        }
        return RuleResult::invalid(format!("Must be greater than {minimum}"));
    }
    if value >= minimum {
        RuleResult::valid()
    } else {
        RuleResult::invalid(format!("Must be greater than or equal to {minimum}"))
    }
}

#[must_use]
pub fn validate_maximum(value: Number, maximum: Number, exclusive: bool) -> RuleResult {
    if exclusive {
        if value < maximum {
            return RuleResult::valid();
        }
        return RuleResult::invalid(format!("Must be less than {maximum}"));
    }
    if value <= maximum {
        RuleResult::valid()
    } else {
        RuleResult::invalid(format!("Must be less than or equal to {maximum}"))
    }
}

/// Validate `multipleOf`
///
/// Both numbers are compared as exact decimals, taken from the shortest
/// representation that round-trips through `f64`. Values too large for that
/// fall back to a tolerance relative to the value.
#[must_use]
pub fn validate_multiple_of(value: Number, divisor: Number) -> RuleResult {
    let is_multiple = exact_multiple(value, divisor).unwrap_or_else(|| {
        let (value, divisor) = (value.as_f64(), divisor.as_f64());
        let quotient = value / divisor;
        quotient.is_finite()
            && (value - quotient.round() * divisor).abs() < f64::EPSILON * value.abs()
    });

    if is_multiple {
        RuleResult::valid()
    } else {
        RuleResult::invalid(format!("Must be a multiple of {divisor}"))
    }
}

#[must_use]
pub fn validate_property_count(count: usize, min: Option<u64>, max: Option<u64>) -> RuleResult {
    let count = count as u64;
    if let Some(min) = min {
        if count < min {
            return RuleResult::invalid(format!("Must have at least {min} properties"));
        }
    }
    if let Some(max) = max {
        if count > max {
            return RuleResult::invalid(format!("Must have at most {max} properties"));
        }
    }
    RuleResult::valid()
}

#[must_use]
pub fn validate_item_count(count: usize, min: Option<u64>, max: Option<u64>) -> RuleResult {
    let count = count as u64;
    if let Some(min) = min {
        if count < min {
            return RuleResult::invalid(format!("Array must have at least {min} items"));
        }
    }
    if let Some(max) = max {
        if count > max {
            return RuleResult::invalid(format!("Array must have at most {max} items"));
        }
    }
    RuleResult::valid()
}

/// Pairs `(i, j)` with `i < j` where item `j` repeats item `i`
///
/// Each repeated item is reported once, against its nearest earlier equal.
#[must_use]
pub fn find_duplicates(items: &[Value]) -> Vec<(usize, usize)> {
    let mut duplicates = Vec::new();
    for (j, item) in items.iter().enumerate() {
        if let Some(i) = items[..j].iter().rposition(|earlier| earlier == item) {
            duplicates.push((i, j));
        }
    }
    duplicates
}

/// Validate enum membership
#[must_use]
pub fn validate_enum(value: &Value, allowed: &[Value]) -> RuleResult {
    if allowed.contains(value) {
        return RuleResult::valid();
    }
    let listed: Vec<String> = allowed.iter().map(ToString::to_string).collect();
    RuleResult::invalid(format!(
        "Must be one of the following: {}",
        listed.join(", ")
    ))
}

#[must_use]
pub fn validate_const(value: &Value, expected: &Value) -> RuleResult {
    if value == expected {
        RuleResult::valid()
    } else {
        RuleResult::invalid(format!("Does not match: {expected}"))
    }
}

/// `mantissa * 10^exponent`, exactly as the number is written
fn decimal_parts(number: Number) -> Option<(i128, i32)> {
    let Number::Float(float) = number else {
        return number.as_i128().map(|int| (int, 0));
    };
    let text = format!("{float:e}");
    let (mantissa, exponent) = text.split_once('e')?;
    let exponent: i32 = exponent.parse().ok()?;
    let (digits, fraction_len) = match mantissa.split_once('.') {
        Some((whole, fraction)) => (format!("{whole}{fraction}"), fraction.len()),
        None => (mantissa.to_string(), 0),
    };
    let fraction_len = i32::try_from(fraction_len).ok()?;
    Some((digits.parse().ok()?, exponent - fraction_len))
}

fn exact_multiple(value: Number, divisor: Number) -> Option<bool> {
    let (value, value_exp) = decimal_parts(value)?;
    let (divisor, divisor_exp) = decimal_parts(divisor)?;
    if divisor == 0 {
        return None;
    }
    let exponent = value_exp.min(divisor_exp);
    let scale = |mantissa: i128, exp: i32| -> Option<i128> {
        let shift = u32::try_from(exp - exponent).ok()?;
        mantissa.checked_mul(10_i128.checked_pow(shift)?)
    };
    Some(scale(value, value_exp)?.checked_rem(scale(divisor, divisor_exp)?)? == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_length_counts_characters() {
        assert!(validate_length("héllo", Some(5), Some(5)).is_valid);

        let result = validate_length("ab", Some(3), None);
        assert!(!result.is_valid);
        assert_eq!(
            result.message.as_deref(),
            Some("String length must be greater than or equal to 3")
        );

        let result = validate_length("abcd", None, Some(3));
        assert_eq!(
            result.message.as_deref(),
            Some("String length must be less than or equal to 3")
        );
    }

    #[test]
    fn test_validate_pattern() {
        let re = Regex::new("^[0-9]{5}$").unwrap();
        assert!(validate_pattern("12345", &re).is_valid);

        let result = validate_pattern("1234a", &re);
        assert_eq!(
            result.message.as_deref(),
            Some("Does not match pattern '^[0-9]{5}$'")
        );
    }

    #[test]
    fn test_validate_pattern_is_unanchored() {
        let re = Regex::new("b").unwrap();
        assert!(validate_pattern("abc", &re).is_valid);
    }

    #[test]
    fn test_validate_bounds() {
        let ten = Number::from(10_i64);
        assert!(validate_minimum(ten, ten, false).is_valid);
        assert_eq!(
            validate_minimum(ten, ten, true).message.as_deref(),
            Some("Must be greater than 10")
        );
        assert_eq!(
            validate_minimum(Number::from(9.5), ten, false).message.as_deref(),
            Some("Must be greater than or equal to 10")
        );
        assert!(validate_maximum(ten, ten, false).is_valid);
        assert_eq!(
            validate_maximum(ten, ten, true).message.as_deref(),
            Some("Must be less than 10")
        );
        assert_eq!(
            validate_maximum(Number::from(11_i64), ten, false).message.as_deref(),
            Some("Must be less than or equal to 10")
        );
    }

    #[test]
    fn test_validate_multiple_of() {
        assert!(validate_multiple_of(Number::from(9_i64), Number::from(3_i64)).is_valid);
        assert!(!validate_multiple_of(Number::from(10_i64), Number::from(3_i64)).is_valid);
        assert!(validate_multiple_of(Number::from(0.3), Number::from(0.1)).is_valid);
        assert!(validate_multiple_of(Number::from(4.5), Number::from(1.5)).is_valid);

        let result = validate_multiple_of(Number::from(0.35), Number::from(0.1));
        assert_eq!(result.message.as_deref(), Some("Must be a multiple of 0.1"));
    }

    #[test]
    fn test_validate_multiple_of_rejects_near_misses() {
        let result =
            validate_multiple_of(Number::from(4.000_000_000_000_001), Number::from(2_i64));
        assert_eq!(result.message.as_deref(), Some("Must be a multiple of 2"));
        assert!(!validate_multiple_of(Number::from(0.1 + 0.2), Number::from(0.1)).is_valid);
        assert!(validate_multiple_of(Number::from(4_i64), Number::from(0.5)).is_valid);
        assert!(validate_multiple_of(Number::from(-7.5), Number::from(2.5)).is_valid);
    }

    #[test]
    fn test_decimal_parts() {
        assert_eq!(decimal_parts(Number::from(0.35)), Some((35, -2)));
        assert_eq!(decimal_parts(Number::from(-1.5)), Some((-15, -1)));
        assert_eq!(decimal_parts(Number::from(12_i64)), Some((12, 0)));
        assert_eq!(decimal_parts(Number::from(1e30)), Some((1, 30)));
        assert_eq!(decimal_parts(Number::from(f64::NAN)), None);
    }

    #[test]
    fn test_validate_counts() {
        assert!(validate_property_count(2, Some(1), Some(2)).is_valid);
        assert_eq!(
            validate_property_count(0, Some(1), None).message.as_deref(),
            Some("Must have at least 1 properties")
        );
        assert_eq!(
            validate_item_count(4, None, Some(3)).message.as_deref(),
            Some("Array must have at most 3 items")
        );
    }

    #[test]
    fn test_find_duplicates() {
        let items: Vec<Value> = vec![1_i64.into(), "a".into(), 1.0.into(), "a".into(), 1_i64.into()];
        assert_eq!(find_duplicates(&items), vec![(0, 2), (1, 3), (2, 4)]);
        assert!(find_duplicates(&[Value::Null, Value::Bool(false)]).is_empty());
    }

    #[test]
    fn test_validate_enum_and_const() {
        let allowed = vec![Value::from("red"), Value::from(1_i64)];
        assert!(validate_enum(&Value::from(1.0), &allowed).is_valid);

        let result = validate_enum(&Value::from("blue"), &allowed);
        assert_eq!(
            result.message.as_deref(),
            Some("Must be one of the following: \"red\", 1")
        );

        assert!(validate_const(&Value::Null, &Value::Null).is_valid);
        assert_eq!(
            validate_const(&Value::from(2_i64), &Value::from(1_i64)).message.as_deref(),
            Some("Does not match: 1")
        );
    }
}
