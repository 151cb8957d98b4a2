//! FILENAME: dataset/src/value.rs
//! PURPOSE: Decides which raw text values are summable numbers.
//! CONTEXT: Every field arrives as text, and "numeric" columns may hold
//! blanks or labels. One rule classifies all of them:
//!
//! ```text
//! ^[+-]?[0-9]+(\.[0-9]+)?$
//! ```
//!
//! The whole string must match, with ASCII digits only, and the value must
//! be finite as an `f64`. No surrounding whitespace, no exponent, no bare
//! leading/trailing dot, no `NaN`/`Infinity`. Anything else contributes 0.

use once_cell::sync::Lazy;
use regex::Regex;

static NUMERIC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]+(\.[0-9]+)?$").expect("numeric pattern is valid"));

/// Returns true iff `raw` should be summed as a number.
pub fn is_numeric(raw: &str) -> bool {
    parse_numeric(raw).is_some()
}

fn parse_numeric(raw: &str) -> Option<f64> {
    if !NUMERIC_PATTERN.is_match(raw) {
        return None;
    }
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parses a raw field into its summable value.
/// Absent and non-numeric values yield `None`.
pub fn coerce_number(raw: Option<&str>) -> Option<f64> {
    parse_numeric(raw?)
}

/// The amount a raw field contributes to a sum.
pub fn contribution(raw: Option<&str>) -> f64 {
    coerce_number(raw).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accepts_signed_integers_and_decimals() {
        assert!(is_numeric("12.5"));
        assert!(is_numeric("-3"));
        assert!(is_numeric("+4"));
        assert!(is_numeric("007"));
        assert!(is_numeric("0"));
        assert!(is_numeric("1234567.000"));
    }

    #[test]
    fn test_rejects_everything_else() {
        assert!(!is_numeric(""));
        assert!(!is_numeric("NaN"));
        assert!(!is_numeric("Infinity"));
        assert!(!is_numeric("1e5"));
        assert!(!is_numeric(" 12"));
        assert!(!is_numeric("12 "));
        assert!(!is_numeric(" 12 "));
        assert!(!is_numeric(".5"));
        assert!(!is_numeric("5."));
        assert!(!is_numeric("1,000"));
        assert!(!is_numeric("$100"));
        assert!(!is_numeric("--1"));
        assert!(!is_numeric("Dependent"));
    }

    #[test]
    fn test_rejects_non_ascii_digits() {
        for raw in ["\u{0661}\u{0662}", "\u{FF11}\u{FF12}", "1\u{0662}.5"] {
            assert!(!is_numeric(raw), "{:?}", raw);
            assert_eq!(coerce_number(Some(raw)), None);
            assert_eq!(contribution(Some(raw)), 0.0);
        }
    }

    #[test]
    fn test_rejects_values_beyond_f64_range() {
        let huge = "9".repeat(400);
        assert!(!is_numeric(&huge));
        assert_eq!(coerce_number(Some(&huge)), None);
        assert_eq!(contribution(Some(&huge)), 0.0);

        let negative = format!("-{}", huge);
        assert!(!is_numeric(&negative));
        assert!(is_numeric(&"9".repeat(300)));
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(Some("12.5")), Some(12.5));
        assert_eq!(coerce_number(Some("+4")), Some(4.0));
        assert_eq!(coerce_number(Some("-3")), Some(-3.0));
        assert_eq!(coerce_number(Some("abc")), None);
        assert_eq!(coerce_number(None), None);
    }

    proptest! {
        #[test]
        fn prop_formatted_decimals_coerce(whole in -1_000_000i64..1_000_000, frac in 0u32..100) {
            let raw = format!("{}.{:02}", whole, frac);
            prop_assert!(is_numeric(&raw));
            prop_assert_eq!(coerce_number(Some(&raw)), raw.parse::<f64>().ok());
        }

        #[test]
        fn prop_predicate_agrees_with_coercion(raw in "\\PC{0,12}|[+-]?[0-9\u{0660}-\u{0669}\u{FF10}-\u{FF19}]{1,8}(\\.[0-9]{1,3})?") {
            let coerced = coerce_number(Some(&raw));
            prop_assert_eq!(is_numeric(&raw), coerced.is_some());
            prop_assert!(coerced.map_or(true, f64::is_finite));
        }

        #[test]
        fn prop_padding_is_never_numeric(n in any::<u32>(), pad in "[ \t]{1,3}") {
            let padded = format!("{}{}", pad, n);
            prop_assert!(!is_numeric(&padded));
            prop_assert_eq!(contribution(Some(&padded)), 0.0);
        }
    }

    #[test]
    fn test_contribution_defaults_to_zero() {
        assert_eq!(contribution(Some("100")), 100.0);
        assert_eq!(contribution(Some("")), 0.0);
        assert_eq!(contribution(None), 0.0);
    }
}
