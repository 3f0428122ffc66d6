use std::{cmp::Ordering, fmt};

use tinybase_ast::Literal;
use tinybase_error::Error;

use crate::{date::Date, DataType};

/// A runtime scalar value (§4.3): one of five typed variants, or `Null`.
///
/// Every operator in this module pattern-matches on the discriminant
/// explicitly (§9 "Dynamic values") rather than dispatching through a
/// generic numeric/ordering trait, so the widening and NULL-propagation
/// rules stay visible at each call site.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// The absence of a value.
    Null,
    /// A signed 64-bit integer.
    Integer(i64),
    /// An IEEE-754 64-bit float.
    Float(f64),
    /// Text, bound by a column's declared `VARCHAR(N)` at write time, not here.
    Text(String),
    /// A validated calendar date.
    Date(Date),
    /// A boolean.
    Boolean(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::Date(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
        }
    }
}

impl Value {
    /// Converts a parsed AST literal into a runtime value, validating date
    /// fields along the way (the lexer only checked the `YYYY-MM-DD` shape).
    pub fn from_literal(literal: &Literal) -> Result<Value, Error> {
        Ok(match literal {
            Literal::Null => Value::Null,
            Literal::Boolean(v) => Value::Boolean(*v),
            Literal::Integer(v) => Value::Integer(*v),
            Literal::Float(v) => Value::Float(*v),
            Literal::Text(v) => Value::Text(v.clone()),
            Literal::Date { year, month, day } => {
                Value::Date(Date::new(*year, *month as u32, *day as u32)?)
            }
        })
    }

    /// Whether this value is `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The declared type this value would satisfy, or `None` for `Null`
    /// (NULL is compatible with every nullable column, regardless of type).
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(DataType::Integer),
            Value::Float(_) => Some(DataType::Float),
            Value::Text(_) => Some(DataType::Varchar(0)),
            Value::Date(_) => Some(DataType::Date),
            Value::Boolean(_) => Some(DataType::Boolean),
        }
    }

    /// Whether this value may be stored in a column declared `data_type`
    /// (§3: "attempting to store a value of a non-matching type fails").
    /// `Null` always matches; `VARCHAR(N)` additionally bounds text length.
    pub fn matches_type(&self, data_type: &DataType) -> bool {
        match (self, data_type) {
            (Value::Null, _) => true,
            (Value::Integer(_), DataType::Integer) => true,
            (Value::Float(_), DataType::Float) => true,
            (Value::Text(s), DataType::Varchar(n)) => (s.chars().count() as u64) <= *n,
            (Value::Date(_), DataType::Date) => true,
            (Value::Boolean(_), DataType::Boolean) => true,
            _ => false,
        }
    }

    /// Three-valued comparison (§4.3). `Ok(None)` means the comparison's
    /// result is `NULL` (either operand is `NULL`); `Ok(Some(ordering))` is
    /// a definite result; `Err` is a cross-type comparison other than
    /// INTEGER/FLOAT, which is a hard type error.
    pub fn compare(&self, other: &Value) -> Result<Option<Ordering>, Error> {
        use Value::*;
        Ok(match (self, other) {
            (Null, _) | (_, Null) => None,
            (Integer(a), Integer(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Integer(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Text(a), Text(b)) => Some(a.as_str().cmp(b.as_str())),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            _ => {
                return Err(Error::TypeMismatch(format!(
                    "cannot compare {} and {}",
                    self.type_name(),
                    other.type_name()
                )))
            }
        })
    }

    /// Numeric addition. NULL propagates; INTEGER widens to FLOAT if either
    /// operand is FLOAT.
    pub fn add(&self, other: &Value) -> Result<Value, Error> {
        arith(self, other, "+", |a, b| a + b, |a, b| a + b)
    }

    /// Numeric subtraction. See [`Value::add`] for NULL/widening rules.
    pub fn sub(&self, other: &Value) -> Result<Value, Error> {
        arith(self, other, "-", |a, b| a - b, |a, b| a - b)
    }

    /// Numeric multiplication. See [`Value::add`] for NULL/widening rules.
    pub fn mul(&self, other: &Value) -> Result<Value, Error> {
        arith(self, other, "*", |a, b| a * b, |a, b| a * b)
    }

    /// Numeric division. NULL propagates; division by zero yields `NULL`,
    /// not an error (§4.3). Integer division by zero also yields `NULL`.
    pub fn div(&self, other: &Value) -> Result<Value, Error> {
        use Value::*;
        if self.is_null() || other.is_null() {
            return Ok(Null);
        }
        match (self, other) {
            (Integer(_), Integer(0)) => Ok(Null),
            (Integer(a), Integer(b)) => Ok(Integer(a / b)),
            (Float(_), Float(b)) | (Integer(_), Float(b)) if *b == 0.0 => Ok(Null),
            (Float(a), Float(b)) => Ok(Float(a / b)),
            (Integer(a), Float(b)) => Ok(Float(*a as f64 / b)),
            (Float(_), Integer(0)) => Ok(Null),
            (Float(a), Integer(b)) => Ok(Float(a / *b as f64)),
            _ => Err(Error::TypeMismatch(format!(
                "cannot divide {} by {}",
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    /// Arithmetic negation (unary minus). NULL propagates.
    pub fn neg(&self) -> Result<Value, Error> {
        match self {
            Value::Null => Ok(Value::Null),
            Value::Integer(v) => Ok(Value::Integer(-v)),
            Value::Float(v) => Ok(Value::Float(-v)),
            other => Err(Error::TypeMismatch(format!(
                "cannot negate {}",
                other.type_name()
            ))),
        }
    }

    /// Three-valued logical AND (§4.3): `NULL AND FALSE = FALSE`;
    /// otherwise `NULL` if either operand is `NULL`.
    pub fn and(&self, other: &Value) -> Result<Value, Error> {
        use Value::*;
        Ok(match (self.as_bool()?, other.as_bool()?) {
            (Some(false), _) | (_, Some(false)) => Boolean(false),
            (Some(a), Some(b)) => Boolean(a && b),
            _ => Null,
        })
    }

    /// Three-valued logical OR (§4.3): `NULL OR TRUE = TRUE`; otherwise
    /// `NULL` if either operand is `NULL`.
    pub fn or(&self, other: &Value) -> Result<Value, Error> {
        use Value::*;
        Ok(match (self.as_bool()?, other.as_bool()?) {
            (Some(true), _) | (_, Some(true)) => Boolean(true),
            (Some(a), Some(b)) => Boolean(a || b),
            _ => Null,
        })
    }

    /// Three-valued logical NOT. `NULL` propagates.
    pub fn not(&self) -> Result<Value, Error> {
        Ok(match self.as_bool()? {
            Some(v) => Value::Boolean(!v),
            None => Value::Null,
        })
    }

    /// Whether a predicate result should select the row: `TRUE` selects,
    /// `FALSE`/`NULL` do not (§4.3: "WHERE/HAVING treat NULL as 'do not
    /// select'").
    pub fn is_truthy(&self) -> bool {
        matches!(self, Value::Boolean(true))
    }

    /// `Some(NULL)` as a tri-state bool, or an error if this isn't boolean/NULL.
    fn as_bool(&self) -> Result<Option<bool>, Error> {
        match self {
            Value::Null => Ok(None),
            Value::Boolean(v) => Ok(Some(*v)),
            other => Err(Error::TypeMismatch(format!(
                "expected BOOLEAN, found {}",
                other.type_name()
            ))),
        }
    }

    /// A short name for error messages and type-mismatch diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::Text(_) => "TEXT",
            Value::Date(_) => "DATE",
            Value::Boolean(_) => "BOOLEAN",
        }
    }
}

fn arith(
    a: &Value,
    b: &Value,
    op: &str,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, Error> {
    use Value::*;
    if a.is_null() || b.is_null() {
        return Ok(Null);
    }
    match (a, b) {
        (Integer(x), Integer(y)) => Ok(Integer(int_op(*x, *y))),
        (Float(x), Float(y)) => Ok(Float(float_op(*x, *y))),
        (Integer(x), Float(y)) => Ok(Float(float_op(*x as f64, *y))),
        (Float(x), Integer(y)) => Ok(Float(float_op(*x, *y as f64))),
        _ => Err(Error::TypeMismatch(format!(
            "cannot apply '{}' to {} and {}",
            op,
            a.type_name(),
            b.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn null_propagates_through_comparison() {
        assert_eq!(Value::Null.compare(&Value::Integer(1)).unwrap(), None);
    }

    #[test]
    fn integer_float_widen_for_comparison() {
        assert_eq!(
            Value::Integer(1).compare(&Value::Float(1.0)).unwrap(),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn cross_type_comparison_is_an_error() {
        assert!(Value::Text("a".into()).compare(&Value::Integer(1)).is_err());
    }

    #[test]
    fn division_by_zero_is_null_not_error() {
        assert_eq!(
            Value::Integer(1).div(&Value::Integer(0)).unwrap(),
            Value::Null
        );
        assert_eq!(
            Value::Float(1.0).div(&Value::Float(0.0)).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn three_valued_and() {
        assert_eq!(
            Value::Null.and(&Value::Boolean(false)).unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(Value::Null.and(&Value::Boolean(true)).unwrap(), Value::Null);
    }

    #[test]
    fn three_valued_or() {
        assert_eq!(
            Value::Null.or(&Value::Boolean(true)).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(Value::Null.or(&Value::Boolean(false)).unwrap(), Value::Null);
    }

    #[test]
    fn varchar_length_bound_is_inclusive() {
        let v = Value::Text("hello".into());
        assert!(v.matches_type(&DataType::Varchar(5)));
        assert!(!v.matches_type(&DataType::Varchar(4)));
    }
}
