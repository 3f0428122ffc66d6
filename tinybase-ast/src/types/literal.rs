#[cfg(not(feature = "std"))]
use alloc::string::String;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::utils::escape_single_quote_string;

/// A literal value as written in SQL source, already typed by the lexer
/// (§4.2 lists integer/float/string/date/boolean/NULL as distinct token
/// kinds, so there is no separate "numeric literal" variant to split
/// later the way a stringly-typed AST would need).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Literal {
    /// `NULL`.
    Null,
    /// `TRUE` / `FALSE`.
    Boolean(bool),
    /// An integer literal, e.g. `42`.
    Integer(i64),
    /// A float literal, e.g. `4.2`.
    Float(f64),
    /// A single-quoted string literal, with `''` already unescaped to `'`.
    Text(String),
    /// A single-quoted `YYYY-MM-DD` date literal.
    Date {
        /// Calendar year.
        year: i32,
        /// Calendar month, 1-12.
        month: u8,
        /// Calendar day, 1-31.
        day: u8,
    },
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("NULL"),
            Literal::Boolean(v) => write!(f, "{}", if *v { "TRUE" } else { "FALSE" }),
            Literal::Integer(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::Text(v) => write!(f, "'{}'", escape_single_quote_string(v)),
            Literal::Date { year, month, day } => {
                write!(f, "'{:04}-{:02}-{:02}'", year, month, day)
            }
        }
    }
}
