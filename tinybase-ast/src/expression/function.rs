use core::fmt;

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Expr;

/// The fixed set of aggregate functions the dialect recognises (§4.7 step
/// 5). There is no general user-defined or scalar function call in this
/// dialect, so unlike a general-purpose AST this is a closed enum rather
/// than `Function { name, args }`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AggregateFunc {
    /// `COUNT(*)` — counts rows, including those with NULL in every column.
    CountStar,
    /// `COUNT(expr)` — counts non-NULL evaluations of `expr`.
    Count(Box<Expr>),
    /// `SUM(expr)`.
    Sum(Box<Expr>),
    /// `AVG(expr)`.
    Avg(Box<Expr>),
    /// `MIN(expr)`.
    Min(Box<Expr>),
    /// `MAX(expr)`.
    Max(Box<Expr>),
}

impl fmt::Display for AggregateFunc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AggregateFunc::CountStar => f.write_str("COUNT(*)"),
            AggregateFunc::Count(e) => write!(f, "COUNT({})", e),
            AggregateFunc::Sum(e) => write!(f, "SUM({})", e),
            AggregateFunc::Avg(e) => write!(f, "AVG({})", e),
            AggregateFunc::Min(e) => write!(f, "MIN({})", e),
            AggregateFunc::Max(e) => write!(f, "MAX({})", e),
        }
    }
}

impl AggregateFunc {
    /// The argument expression, if the aggregate has one (all but `COUNT(*)`).
    pub fn arg(&self) -> Option<&Expr> {
        match self {
            AggregateFunc::CountStar => None,
            AggregateFunc::Count(e)
            | AggregateFunc::Sum(e)
            | AggregateFunc::Avg(e)
            | AggregateFunc::Min(e)
            | AggregateFunc::Max(e) => Some(e),
        }
    }
}
