//! The on-disk shape of a table's row file (§4.5): a sequence of
//! `(row-id, field values)` records in insertion order.

use serde::{Deserialize, Serialize};

use tinybase_catalog::{Row, RowId, Table};
use tinybase_types::Value;

#[derive(Serialize, Deserialize)]
pub(crate) struct RowFile {
    /// The row-id that will be assigned to the next inserted row. Kept
    /// alongside the rows (not in the schema file) because it changes on
    /// every INSERT, and INSERT/UPDATE/DELETE must each trigger exactly
    /// one atomic save of the row file, not the schema file too (§4.5).
    pub(crate) next_row_id: RowId,
    pub(crate) rows: Vec<RowRecord>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct RowRecord {
    pub(crate) id: RowId,
    pub(crate) values: Vec<Value>,
}

impl RowFile {
    pub(crate) fn empty() -> Self {
        RowFile {
            next_row_id: 0,
            rows: Vec::new(),
        }
    }

    pub(crate) fn from_table(table: &Table) -> Self {
        RowFile {
            next_row_id: table.next_row_id(),
            rows: table
                .rows()
                .iter()
                .map(|r| RowRecord {
                    id: r.id,
                    values: r.values.clone(),
                })
                .collect(),
        }
    }

    pub(crate) fn into_rows(self) -> Vec<Row> {
        self.rows
            .into_iter()
            .map(|r| Row {
                id: r.id,
                values: r.values,
            })
            .collect()
    }
}
