//! What executing or querying produced (§4.1).

use tinybase_types::Value;

/// A named, ordered column set with its materialized rows — the shape
/// `SELECT` (and introspection) hand back to the facade.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultSet {
    /// Output column names, in projection order.
    pub columns: Vec<String>,
    /// Rows, each with one value per column.
    pub rows: Vec<Vec<Value>>,
}

/// What executing one statement produced (§4.1).
#[derive(Debug)]
pub enum ExecResult {
    /// A DDL statement (`CREATE TABLE`, `CREATE INDEX`, `DROP TABLE`)
    /// completed; the message matches §6's Ack wording exactly ("Table
    /// created", "Index created", "Table dropped").
    Ack(&'static str),
    /// A DML statement (`INSERT`, `UPDATE`, `DELETE`) completed, affecting
    /// this many rows.
    RowsAffected(usize),
    /// A `SELECT` completed, producing this result set.
    Query(ResultSet),
}
