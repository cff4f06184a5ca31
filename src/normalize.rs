//! Scalar normalization for leaf text content.
//!
//! Every leaf element in a `.bsmx` file carries its value as text. This
//! module turns that text into a typed [`Scalar`] using a fixed, ordered
//! rule set:
//!
//! 1. empty text stays an empty string (never zero, never null)
//! 2. text without a `.` is tried as an integer
//! 3. anything else (or a failed integer parse) is tried as a float
//! 4. whatever is left is returned unchanged
//!
//! Surrounding whitespace is ignored for the numeric attempts, but the string
//! fallback always returns the original text. The decimal separator is always
//! `.`; there is no locale handling.

use serde::{Deserialize, Serialize};

/// A normalized leaf value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Normalize leaf text into a typed scalar.
pub fn normalize(text: &str) -> Scalar {
    if text.is_empty() {
        return Scalar::Text(String::new());
    }

    let trimmed = text.trim();

    if !text.contains('.') {
        if let Ok(i) = trimmed.parse::<i64>() {
            return Scalar::Int(i);
        }
    }

    if let Ok(f) = trimmed.parse::<f64>() {
        return Scalar::Float(f);
    }

    Scalar::Text(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_without_dot() {
        assert_eq!(normalize("42"), Scalar::Int(42));
        assert_eq!(normalize("-7"), Scalar::Int(-7));
        assert_eq!(normalize("12"), Scalar::Int(12));
    }

    #[test]
    fn test_dot_goes_to_float() {
        assert_eq!(normalize("3.14"), Scalar::Float(3.14));
        assert_eq!(normalize("12.5000000"), Scalar::Float(12.5));
        assert_eq!(normalize("5."), Scalar::Float(5.0));
    }

    #[test]
    fn test_empty_is_empty_string() {
        assert_eq!(normalize(""), Scalar::Text(String::new()));
    }

    #[test]
    fn test_non_numeric_unchanged() {
        assert_eq!(normalize("IBU"), Scalar::Text("IBU".to_string()));
        assert_eq!(normalize("1.2.3"), Scalar::Text("1.2.3".to_string()));
        assert_eq!(normalize("WLP001"), Scalar::Text("WLP001".to_string()));
    }

    #[test]
    fn test_exponent_without_dot_reaches_float() {
        assert_eq!(normalize("1e3"), Scalar::Float(1000.0));
    }

    #[test]
    fn test_whitespace_only_for_numeric_attempts() {
        assert_eq!(normalize(" 12 "), Scalar::Int(12));
        assert_eq!(normalize("  "), Scalar::Text("  ".to_string()));
    }

    #[test]
    fn test_integer_overflow_falls_back_to_float() {
        assert_eq!(
            normalize("123456789012345678901234"),
            Scalar::Float(123456789012345678901234.0)
        );
    }
}
