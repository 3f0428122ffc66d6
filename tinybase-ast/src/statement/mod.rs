mod ddl;
mod dml;
mod select;

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use self::{ddl::*, dml::*, select::*};

/// A single parsed statement (§4.2). The facade accepts exactly one of
/// these per `execute`/`explain` call.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Stmt {
    /// `CREATE TABLE ...`
    CreateTable(CreateTableStmt),
    /// `CREATE INDEX ...`
    CreateIndex(CreateIndexStmt),
    /// `DROP TABLE ...`
    DropTable(DropTableStmt),
    /// `INSERT INTO ...`
    Insert(InsertStmt),
    /// `UPDATE ...`
    Update(UpdateStmt),
    /// `DELETE FROM ...`
    Delete(DeleteStmt),
    /// `SELECT ...`
    Select(SelectStmt),
    /// `EXPLAIN <select-stmt>` — parsed but not executed (§4.8).
    Explain(SelectStmt),
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stmt::CreateTable(s) => write!(f, "{}", s),
            Stmt::CreateIndex(s) => write!(f, "{}", s),
            Stmt::DropTable(s) => write!(f, "{}", s),
            Stmt::Insert(s) => write!(f, "{}", s),
            Stmt::Update(s) => write!(f, "{}", s),
            Stmt::Delete(s) => write!(f, "{}", s),
            Stmt::Select(s) => write!(f, "{}", s),
            Stmt::Explain(s) => write!(f, "EXPLAIN {}", s),
        }
    }
}

impl Stmt {
    /// A short, human-readable name for the statement kind, used by the
    /// executor's dispatch logging and by EXPLAIN's plan header.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::CreateTable(_) => "CREATE TABLE",
            Stmt::CreateIndex(_) => "CREATE INDEX",
            Stmt::DropTable(_) => "DROP TABLE",
            Stmt::Insert(_) => "INSERT",
            Stmt::Update(_) => "UPDATE",
            Stmt::Delete(_) => "DELETE",
            Stmt::Select(_) => "SELECT",
            Stmt::Explain(_) => "EXPLAIN",
        }
    }
}
