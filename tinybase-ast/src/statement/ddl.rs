#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{types::*, utils::display_comma_separated};

/// `CREATE TABLE name (col-def [, col-def]* [, table-constraint]*)` (§4.2).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CreateTableStmt {
    /// Table name.
    pub name: Ident,
    /// Column definitions, in declaration order.
    pub columns: Vec<ColumnDef>,
    /// Table-level constraints (`PRIMARY KEY(col)`, `FOREIGN KEY(col) REFERENCES ...`).
    pub constraints: Vec<TableConstraint>,
}

impl fmt::Display for CreateTableStmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "CREATE TABLE {} ({}",
            self.name,
            display_comma_separated(&self.columns)
        )?;
        for constraint in &self.constraints {
            write!(f, ", {}", constraint)?;
        }
        f.write_str(")")
    }
}

/// A single column definition: `name TYPE [col-constraint]*`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColumnDef {
    /// Column name.
    pub name: Ident,
    /// Declared type.
    pub data_type: DataType,
    /// Column-level constraints, in declaration order.
    pub constraints: Vec<ColumnConstraint>,
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)?;
        for constraint in &self.constraints {
            write!(f, " {}", constraint)?;
        }
        Ok(())
    }
}

/// A column-level constraint (§3 "Column").
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ColumnConstraint {
    /// `PRIMARY KEY`. Implies `UNIQUE` and `NOT NULL`.
    PrimaryKey,
    /// `UNIQUE`.
    Unique,
    /// `NOT NULL`.
    NotNull,
    /// `REFERENCES table(col)`.
    References {
        /// Referenced table.
        table: Ident,
        /// Referenced column.
        column: Ident,
    },
}

impl fmt::Display for ColumnConstraint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ColumnConstraint::PrimaryKey => f.write_str("PRIMARY KEY"),
            ColumnConstraint::Unique => f.write_str("UNIQUE"),
            ColumnConstraint::NotNull => f.write_str("NOT NULL"),
            ColumnConstraint::References { table, column } => {
                write!(f, "REFERENCES {}({})", table, column)
            }
        }
    }
}

/// A table-level constraint.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TableConstraint {
    /// `PRIMARY KEY(col)`.
    PrimaryKey {
        /// The column named.
        column: Ident,
    },
    /// `FOREIGN KEY(col) REFERENCES table(col)`.
    ForeignKey {
        /// The local column.
        column: Ident,
        /// The referenced table.
        ref_table: Ident,
        /// The referenced column.
        ref_column: Ident,
    },
}

impl fmt::Display for TableConstraint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TableConstraint::PrimaryKey { column } => write!(f, "PRIMARY KEY({})", column),
            TableConstraint::ForeignKey {
                column,
                ref_table,
                ref_column,
            } => write!(
                f,
                "FOREIGN KEY({}) REFERENCES {}({})",
                column, ref_table, ref_column
            ),
        }
    }
}

/// `CREATE INDEX name ON table(col)` (§4.2).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CreateIndexStmt {
    /// Index name.
    pub name: Ident,
    /// Table the index is built on.
    pub table: Ident,
    /// Column the index covers.
    pub column: Ident,
}

impl fmt::Display for CreateIndexStmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CREATE INDEX {} ON {}({})", self.name, self.table, self.column)
    }
}

/// `DROP TABLE name` (§4.2).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DropTableStmt {
    /// Table name.
    pub name: Ident,
}

impl fmt::Display for DropTableStmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DROP TABLE {}", self.name)
    }
}
