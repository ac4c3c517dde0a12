//! Exact constant values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value category of a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    String,
}

/// The value of a constant as computed by the checker.
///
/// Integers are held in `i128`, wide enough for every 64-bit pattern in
/// either signedness plus intermediate results of untyped arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    Bool(bool),
    Int(i128),
    Float(f64),
    String(String),
}

impl ConstValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    /// The value as `i64`, if it is an integer that fits exactly.
    pub fn int64_val(&self) -> Option<i64> {
        match self {
            Self::Int(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// The value as `u64`, if it is an integer that fits exactly.
    pub fn uint64_val(&self) -> Option<u64> {
        match self {
            Self::Int(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Numeric value as a float, for mixed integer/float arithmetic.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to an integer when no information is lost.
    pub fn to_exact_int(&self) -> Option<i128> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.fract() == 0.0 && v.is_finite() && v.abs() < 1.7e38 => {
                Some(*v as i128)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{:?}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int64_and_uint64() {
        let neg = ConstValue::Int(-1);
        assert_eq!(neg.int64_val(), Some(-1));
        assert_eq!(neg.uint64_val(), None);

        let big = ConstValue::Int(u64::MAX as i128);
        assert_eq!(big.int64_val(), None);
        assert_eq!(big.uint64_val(), Some(u64::MAX));

        let huge = ConstValue::Int(1i128 << 64);
        assert_eq!(huge.int64_val(), None);
        assert_eq!(huge.uint64_val(), None);
    }

    #[test]
    fn test_non_int_has_no_int_view() {
        assert_eq!(ConstValue::Float(1.0).int64_val(), None);
        assert!(!ConstValue::String("a".into()).is_int());
    }

    #[test]
    fn test_display() {
        assert_eq!(ConstValue::Int(18446744073709551615).to_string(), "18446744073709551615");
        assert_eq!(ConstValue::String("a".into()).to_string(), "\"a\"");
        assert_eq!(ConstValue::Float(1.5).to_string(), "1.5");
    }

    #[test]
    fn test_to_exact_int() {
        assert_eq!(ConstValue::Float(3.0).to_exact_int(), Some(3));
        assert_eq!(ConstValue::Float(3.5).to_exact_int(), None);
    }
}
