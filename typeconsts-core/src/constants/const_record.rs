//! Resolved constant records.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// One named constant of the requested type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantRecord {
    /// Declared identifier, never `_`
    pub name: String,
    /// Bit pattern of the value; reinterpret as `i64` when `signed`
    pub value: u64,
    /// Whether the underlying basic type is a signed integer kind
    pub signed: bool,
    /// Decimal text of the exact value
    pub literal: String,
}

impl ConstantRecord {
    /// The value read as a signed integer.
    pub fn signed_value(&self) -> i64 {
        self.value as i64
    }

    /// Numeric order of two records, honoring each record's signedness.
    pub fn cmp_value(&self, other: &Self) -> Ordering {
        match (self.signed, other.signed) {
            (true, true) => self.signed_value().cmp(&other.signed_value()),
            (false, false) => self.value.cmp(&other.value),
            _ => self.wide_value().cmp(&other.wide_value()),
        }
    }

    /// Whether `other` holds the value immediately after this one.
    pub fn precedes(&self, other: &Self) -> bool {
        self.wide_value().checked_add(1) == Some(other.wide_value())
    }

    fn wide_value(&self) -> i128 {
        if self.signed {
            self.signed_value() as i128
        } else {
            self.value as i128
        }
    }
}

impl fmt::Display for ConstantRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}
