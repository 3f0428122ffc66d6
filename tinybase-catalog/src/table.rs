use std::time::{SystemTime, UNIX_EPOCH};

use tinybase_error::Error;
use tinybase_types::Value;

use crate::column::Column;

/// A table-local row identifier, assigned on insertion and never reused
/// (§3 "Row").
pub type RowId = u64;

/// One row: its row-id and ordered field values, positional against the
/// table's column list.
#[derive(Clone, Debug)]
pub struct Row {
    /// The row's identifier.
    pub id: RowId,
    /// Field values, one per column, in column-declaration order.
    pub values: Vec<Value>,
}

/// A table: its schema, and the in-memory mirror of its row store (§3
/// "Table", §4.5 "In-memory mirror" — the catalog's [`Table`] *is* the
/// mirror; `tinybase-storage` only adds durability on top of it).
#[derive(Clone, Debug)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    rows: Vec<Row>,
    next_row_id: RowId,
    created_at_unix: u64,
}

impl Table {
    /// Creates an empty table with the given schema.
    pub fn new(name: String, columns: Vec<Column>) -> Self {
        Table {
            name,
            columns,
            rows: Vec::new(),
            next_row_id: 0,
            created_at_unix: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    /// Reconstructs a table from its persisted parts (used by
    /// `tinybase-storage` when loading from disk); `next_row_id` must be at
    /// least one more than the largest row-id among `rows`.
    pub fn from_parts(
        name: String,
        columns: Vec<Column>,
        rows: Vec<Row>,
        next_row_id: RowId,
        created_at_unix: u64,
    ) -> Self {
        Table {
            name,
            columns,
            rows,
            next_row_id,
            created_at_unix,
        }
    }

    /// The table name, exactly as declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The table's columns, in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The name of the primary-key column, if one was declared.
    pub fn primary_key_column(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .map(|c| c.name.as_str())
    }

    /// All surviving rows, in insertion order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Unix timestamp (seconds) this table was created.
    pub fn created_at_unix(&self) -> u64 {
        self.created_at_unix
    }

    /// The next row-id that will be assigned.
    pub fn next_row_id(&self) -> RowId {
        self.next_row_id
    }

    /// Finds a column's position by case-insensitive name match.
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Finds a column by case-insensitive name match.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Appends a new row, assigning it the next row-id. Callers are
    /// responsible for constraint validation and index maintenance before
    /// calling this (§4.7 INSERT steps a-f happen first).
    pub fn append_row(&mut self, values: Vec<Value>) -> RowId {
        let id = self.next_row_id;
        self.next_row_id += 1;
        self.rows.push(Row { id, values });
        id
    }

    /// Replaces the field values of the row with the given id.
    pub fn set_row_values(&mut self, row_id: RowId, values: Vec<Value>) -> Result<(), Error> {
        let row = self
            .rows
            .iter_mut()
            .find(|r| r.id == row_id)
            .ok_or_else(|| Error::UnknownColumn(format!("row-id {} not found", row_id)))?;
        row.values = values;
        Ok(())
    }

    /// Removes the row with the given id, preserving insertion order of
    /// the remaining rows.
    pub fn remove_row(&mut self, row_id: RowId) -> Option<Row> {
        let pos = self.rows.iter().position(|r| r.id == row_id)?;
        Some(self.rows.remove(pos))
    }

    /// Looks up a row by id.
    pub fn row(&self, row_id: RowId) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == row_id)
    }
}
