//! Property values and the expectation predicates checked against them.

use std::fmt;

/// A decoded property value as returned by the capability backend.
///
/// Backends normalize whatever their wire layer produced into this enum at
/// the boundary, so comparison code never has to guess at shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Real(f64),
    Unsigned(u64),
    Bool(bool),
    Text(String),
    Null,
}

impl Value {
    /// Numeric view of the value, if it has one.
    ///
    /// Character strings that parse as numbers count as numeric; some stacks
    /// hand back stringified readings for analog properties.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Real(v) => Some(*v),
            Self::Unsigned(v) => Some(*v as f64),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(_) | Self::Null => None,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Keep one decimal on whole reals so "got 73.0" reads as a measurement.
            Self::Real(v) if v.fract() == 0.0 => write!(f, "{v:.1}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Unsigned(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
            Self::Null => f.write_str("null"),
        }
    }
}

/// Textual tokens accepted as "active" for boolean-like properties.
const ACTIVE_TOKENS: [&str; 4] = ["active", "true", "1", "on"];
/// Textual tokens accepted as "inactive".
const INACTIVE_TOKENS: [&str; 4] = ["inactive", "false", "0", "off"];

/// What a property is expected to report.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// Numeric match within an absolute tolerance.
    Number { expected: f64, tolerance: f64 },
    /// Exact string match.
    Text(String),
    /// Boolean-like match; accepts a small set of case-insensitive
    /// textual and numeric renderings.
    Active(bool),
}

impl Expectation {
    pub fn number(expected: f64, tolerance: f64) -> Self {
        Self::Number {
            expected,
            tolerance,
        }
    }

    pub fn text(expected: impl Into<String>) -> Self {
        Self::Text(expected.into())
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Number {
                expected,
                tolerance,
            } => value
                .as_f64()
                .is_some_and(|v| (v - expected).abs() < *tolerance),
            Self::Text(expected) => matches!(value, Value::Text(s) if s == expected),
            Self::Active(want) => match value {
                Value::Bool(b) => b == want,
                Value::Unsigned(n) => (*n != 0) == *want,
                Value::Real(v) => (*v != 0.0) == *want,
                Value::Text(s) => {
                    let token = s.trim().to_ascii_lowercase();
                    let accepted = if *want {
                        &ACTIVE_TOKENS
                    } else {
                        &INACTIVE_TOKENS
                    };
                    accepted.contains(&token.as_str())
                }
                Value::Null => false,
            },
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number { expected, .. } => write!(f, "~ {expected}"),
            Self::Text(s) => write!(f, "= '{s}'"),
            Self::Active(true) => f.write_str("active"),
            Self::Active(false) => f.write_str("inactive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_expectation_is_absolute_tolerance() {
        let exp = Expectation::number(72.5, 0.1);
        assert!(exp.matches(&Value::Real(72.55)));
        assert!(exp.matches(&Value::Real(72.45)));
        assert!(!exp.matches(&Value::Real(73.0)));
        assert!(!exp.matches(&Value::text("not a number")));
    }

    #[test]
    fn stringified_numbers_still_compare_numerically() {
        let exp = Expectation::number(125.0, 0.5);
        assert!(exp.matches(&Value::text("125.2")));
        assert!(exp.matches(&Value::Unsigned(125)));
    }

    #[test]
    fn text_expectation_is_exact() {
        let exp = Expectation::text("Zone Temp");
        assert!(exp.matches(&Value::text("Zone Temp")));
        assert!(!exp.matches(&Value::text("zone temp")));
        assert!(!exp.matches(&Value::Real(72.0)));
    }

    #[test]
    fn boolean_like_accepts_common_renderings() {
        let active = Expectation::Active(true);
        for v in [
            Value::Bool(true),
            Value::Unsigned(1),
            Value::text("Active"),
            Value::text("TRUE"),
            Value::text("1"),
        ] {
            assert!(active.matches(&v), "expected {v:?} to read as active");
        }

        let inactive = Expectation::Active(false);
        for v in [
            Value::Bool(false),
            Value::Unsigned(0),
            Value::text("inactive"),
            Value::text("off"),
        ] {
            assert!(inactive.matches(&v), "expected {v:?} to read as inactive");
        }
        assert!(!inactive.matches(&Value::text("active")));
        assert!(!active.matches(&Value::Null));
    }

    #[test]
    fn whole_reals_render_with_one_decimal() {
        assert_eq!(Value::Real(73.0).to_string(), "73.0");
        assert_eq!(Value::Real(72.5).to_string(), "72.5");
    }
}
