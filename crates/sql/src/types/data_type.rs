//! Data types known to the query front end
//!
//! The implicit conversion lattice mirrors the runtime type system: each
//! numeric type converts implicitly to every wider one, dates and times
//! convert to timestamps, and the NULL type converts to anything.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime data types assignable to elements and expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Float,
    Double,
    String,
    Date,
    Time,
    Timestamp,
    /// The type of a bare NULL constant. Converts implicitly to any type.
    Null,
}

impl DataType {
    /// Whether this type is numeric.
    pub fn is_numeric(&self) -> bool {
        self.numeric_rank().is_some()
    }

    /// Position in the numeric widening chain, if numeric.
    fn numeric_rank(&self) -> Option<u8> {
        match self {
            DataType::SmallInt => Some(1),
            DataType::Integer => Some(2),
            DataType::BigInt => Some(3),
            DataType::Decimal => Some(4),
            DataType::Float => Some(5),
            DataType::Double => Some(6),
            _ => None,
        }
    }

    /// Whether a value of this type converts to `target` without an explicit
    /// cast. Identical types are not considered conversions.
    pub fn converts_implicitly_to(&self, target: &DataType) -> bool {
        if self == target {
            return false;
        }
        if *self == DataType::Null {
            return true;
        }
        match (self.numeric_rank(), target.numeric_rank()) {
            (Some(from), Some(to)) => from < to,
            _ => matches!(
                (self, target),
                (DataType::Date, DataType::Timestamp) | (DataType::Time, DataType::Timestamp)
            ),
        }
    }

    /// Whether an explicit CAST from this type to `target` is defined.
    pub fn converts_explicitly_to(&self, target: &DataType) -> bool {
        if self == target || self.converts_implicitly_to(target) {
            return true;
        }
        // Strings cast to and from everything; numerics cast among themselves.
        if *self == DataType::String || *target == DataType::String {
            return true;
        }
        self.is_numeric() && target.is_numeric()
    }

    /// The narrowest type both `a` and `b` implicitly convert to, if any.
    pub fn common_type(a: &DataType, b: &DataType) -> Option<DataType> {
        if a == b {
            return Some(*a);
        }
        if a.converts_implicitly_to(b) {
            return Some(*b);
        }
        if b.converts_implicitly_to(a) {
            return Some(*a);
        }
        None
    }

    /// Whether the type can stand where a boolean condition is required.
    pub fn is_boolean_compatible(&self) -> bool {
        matches!(self, DataType::Boolean | DataType::Null)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Boolean => "boolean",
            DataType::SmallInt => "smallint",
            DataType::Integer => "integer",
            DataType::BigInt => "bigint",
            DataType::Decimal => "decimal",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::String => "string",
            DataType::Date => "date",
            DataType::Time => "time",
            DataType::Timestamp => "timestamp",
            DataType::Null => "null",
        };
        write!(f, "{}", name)
    }
}
