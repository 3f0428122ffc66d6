#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{expression::Expr, types::Ident, utils::display_comma_separated};

/// `SELECT projection FROM table [alias] [join-clause]* [WHERE predicate]
/// [GROUP BY ...] [HAVING predicate] [ORDER BY ...] [LIMIT n]` (§4.2).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SelectStmt {
    /// Projection list.
    pub projection: Vec<SelectItem>,
    /// `FROM` source table.
    pub from: TableRef,
    /// `JOIN` clauses, applied left to right (§4.7 step 2).
    pub joins: Vec<Join>,
    /// `WHERE` predicate.
    pub selection: Option<Expr>,
    /// `GROUP BY` columns.
    pub group_by: Vec<Ident>,
    /// `HAVING` predicate.
    pub having: Option<Expr>,
    /// `ORDER BY` items.
    pub order_by: Vec<OrderByItem>,
    /// `LIMIT n`.
    pub limit: Option<u64>,
}

impl fmt::Display for SelectStmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SELECT {} FROM {}", display_comma_separated(&self.projection), self.from)?;
        for join in &self.joins {
            write!(f, " {}", join)?;
        }
        if let Some(selection) = &self.selection {
            write!(f, " WHERE {}", selection)?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY {}", display_comma_separated(&self.group_by))?;
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {}", having)?;
        }
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY {}", display_comma_separated(&self.order_by))?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        Ok(())
    }
}

/// One projection entry: `*` or `expr [AS alias]`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SelectItem {
    /// `*`
    Wildcard,
    /// `expr [AS alias]`.
    Expr {
        /// The projected expression.
        expr: Expr,
        /// An explicit alias, if given.
        alias: Option<Ident>,
    },
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SelectItem::Wildcard => f.write_str("*"),
            SelectItem::Expr { expr, alias } => {
                write!(f, "{}", expr)?;
                if let Some(alias) = alias {
                    write!(f, " AS {}", alias)?;
                }
                Ok(())
            }
        }
    }
}

/// A table reference: a name and an optional alias. Unaliased, the table
/// name itself is the qualifier later stages use (§4.7 step 1).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TableRef {
    /// Table name.
    pub name: Ident,
    /// Optional alias.
    pub alias: Option<Ident>,
}

impl TableRef {
    /// The qualifier rows from this source are addressed by: the alias if
    /// present, otherwise the table name.
    pub fn qualifier(&self) -> &Ident {
        self.alias.as_ref().unwrap_or(&self.name)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(alias) = &self.alias {
            write!(f, " {}", alias)?;
        }
        Ok(())
    }
}

/// `[INNER|LEFT] JOIN table [alias] ON predicate`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Join {
    /// Join kind.
    pub kind: JoinKind,
    /// Right-hand side table.
    pub table: TableRef,
    /// `ON` predicate.
    pub on: Expr,
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} JOIN {} ON {}", self.kind, self.table, self.on)
    }
}

/// The join kind (§4.7 step 2). `Non-goals` excludes hash/merge joins, not
/// join kinds, so `INNER` and `LEFT OUTER` are both modelled.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JoinKind {
    /// `INNER JOIN` (also the default for bare `JOIN`).
    Inner,
    /// `LEFT [OUTER] JOIN`.
    Left,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
        })
    }
}

/// One `ORDER BY` item with its direction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderByItem {
    /// The sort expression.
    pub expr: Expr,
    /// `true` for `DESC`, `false` for `ASC` (the default).
    pub desc: bool,
}

impl fmt::Display for OrderByItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.expr, if self.desc { "DESC" } else { "ASC" })
    }
}
