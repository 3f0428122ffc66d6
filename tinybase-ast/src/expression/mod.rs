mod function;
mod operator;

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, vec::Vec};
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use self::{function::AggregateFunc, operator::*};
use crate::{
    types::{Ident, Literal},
    utils::display_comma_separated,
};

/// A scalar SQL expression, as produced by the precedence-climbing parser
/// (§4.2). The tree is a closed sum type; the executor traverses it without
/// mutating it (§9 "AST shape").
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expr {
    /// A literal value.
    Literal(Literal),
    /// An unqualified column reference, e.g. `name`.
    Identifier(Ident),
    /// A qualified column reference, e.g. `alias.name`.
    CompoundIdentifier(Ident, Ident),
    /// `*` in projection position.
    Wildcard,
    /// A parenthesised expression, e.g. `(a + b)`.
    Nested(Box<Expr>),
    /// A unary prefix operator, e.g. `-x` or `NOT x`.
    UnaryOp {
        /// The operator.
        op: UnaryOperator,
        /// The operand.
        expr: Box<Expr>,
    },
    /// A binary infix operator, e.g. `a + b` or `a = b`.
    BinaryOp {
        /// The left operand.
        left: Box<Expr>,
        /// The operator.
        op: BinaryOperator,
        /// The right operand.
        right: Box<Expr>,
    },
    /// `expr IS [NOT] NULL`.
    IsNull {
        /// The operand.
        expr: Box<Expr>,
        /// `true` for `IS NOT NULL`.
        negated: bool,
    },
    /// `expr [NOT] IN (v1, v2, ...)`.
    InList {
        /// The operand.
        expr: Box<Expr>,
        /// The candidate list.
        list: Vec<Expr>,
        /// `true` for `NOT IN`.
        negated: bool,
    },
    /// An aggregate function call, e.g. `COUNT(*)` or `SUM(amount)`.
    Aggregate(AggregateFunc),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Identifier(ident) => write!(f, "{}", ident),
            Expr::CompoundIdentifier(qualifier, ident) => write!(f, "{}.{}", qualifier, ident),
            Expr::Wildcard => f.write_str("*"),
            Expr::Nested(expr) => write!(f, "({})", expr),
            Expr::UnaryOp { op, expr } => match op {
                UnaryOperator::Not => write!(f, "NOT {}", expr),
                UnaryOperator::Minus => write!(f, "-{}", expr),
            },
            Expr::BinaryOp { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expr::IsNull { expr, negated } => {
                write!(f, "{} IS{} NULL", expr, if *negated { " NOT" } else { "" })
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => write!(
                f,
                "{}{} IN ({})",
                expr,
                if *negated { " NOT" } else { "" },
                display_comma_separated(list)
            ),
            Expr::Aggregate(func) => write!(f, "{}", func),
        }
    }
}

impl Expr {
    /// Whether this expression is an aggregate function call.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Expr::Aggregate(_))
    }
}
