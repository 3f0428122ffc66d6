#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{expression::Expr, types::Ident, utils::display_comma_separated};

/// `INSERT INTO name [(col, ...)] VALUES (expr, ...) [, (...)]*` (§4.2).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InsertStmt {
    /// Target table.
    pub table: Ident,
    /// Explicit column list, or `None` for positional insertion.
    pub columns: Option<Vec<Ident>>,
    /// One row of value expressions per `VALUES (...)` tuple.
    pub rows: Vec<Vec<Expr>>,
}

impl fmt::Display for InsertStmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "INSERT INTO {}", self.table)?;
        if let Some(columns) = &self.columns {
            write!(f, " ({})", display_comma_separated(columns))?;
        }
        write!(f, " VALUES ")?;
        let rendered: Vec<RowTuple<'_>> = self.rows.iter().map(RowTuple).collect();
        write!(f, "{}", display_comma_separated(&rendered))
    }
}

struct RowTuple<'a>(&'a Vec<Expr>);

impl fmt::Display for RowTuple<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({})", display_comma_separated(self.0))
    }
}

/// `UPDATE name SET col = expr, ... [WHERE predicate]` (§4.2).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UpdateStmt {
    /// Target table.
    pub table: Ident,
    /// Column assignments, in source order.
    pub assignments: Vec<Assignment>,
    /// `WHERE` predicate, if present.
    pub selection: Option<Expr>,
}

impl fmt::Display for UpdateStmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "UPDATE {} SET {}",
            self.table,
            display_comma_separated(&self.assignments)
        )?;
        if let Some(selection) = &self.selection {
            write!(f, " WHERE {}", selection)?;
        }
        Ok(())
    }
}

/// A single `col = expr` assignment in an `UPDATE` statement.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Assignment {
    /// Target column.
    pub column: Ident,
    /// New value expression.
    pub value: Expr,
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} = {}", self.column, self.value)
    }
}

/// `DELETE FROM name [WHERE predicate]` (§4.2).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeleteStmt {
    /// Target table.
    pub table: Ident,
    /// `WHERE` predicate, if present.
    pub selection: Option<Expr>,
}

impl fmt::Display for DeleteStmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DELETE FROM {}", self.table)?;
        if let Some(selection) = &self.selection {
            write!(f, " WHERE {}", selection)?;
        }
        Ok(())
    }
}
