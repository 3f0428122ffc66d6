use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A declared column type, per §3 "Scalar types": exactly the five types
/// the engine recognises. There is no catch-all/unknown variant — the
/// parser rejects any other type name as a syntax error.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataType {
    /// Signed 64-bit integer.
    Integer,
    /// IEEE-754 64-bit float.
    Float,
    /// Text with an upper character bound, declared as `VARCHAR(N)`.
    Varchar(u64),
    /// Calendar date, ordered by (year, month, day).
    Date,
    /// Boolean.
    Boolean,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataType::Integer => f.write_str("INTEGER"),
            DataType::Float => f.write_str("FLOAT"),
            DataType::Varchar(n) => write!(f, "VARCHAR({})", n),
            DataType::Date => f.write_str("DATE"),
            DataType::Boolean => f.write_str("BOOLEAN"),
        }
    }
}
