//! The on-disk shape of a table's schema descriptor (§4.5): table name,
//! column definitions, explicit (non-implicit) index names, and the
//! row-id counter needed to resume assigning ids after a reload.

use serde::{Deserialize, Serialize};

use tinybase_catalog::{Column, ForeignKey, Table};
use tinybase_types::DataType;

/// The serialized form of one table's schema file.
#[derive(Serialize, Deserialize)]
pub(crate) struct SchemaFile {
    pub(crate) table: String,
    pub(crate) created_at_unix: u64,
    pub(crate) columns: Vec<ColumnSchema>,
    /// Indexes created with `CREATE INDEX` (always non-unique; implicit
    /// PRIMARY KEY/UNIQUE indexes are recomputed from `columns` on load
    /// instead of being listed here).
    pub(crate) explicit_indexes: Vec<ExplicitIndexSchema>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct ColumnSchema {
    pub(crate) name: String,
    pub(crate) data_type: DataType,
    pub(crate) primary_key: bool,
    pub(crate) unique: bool,
    pub(crate) not_null: bool,
    pub(crate) references: Option<ForeignKeySchema>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct ForeignKeySchema {
    pub(crate) table: String,
    pub(crate) column: String,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct ExplicitIndexSchema {
    pub(crate) name: String,
    pub(crate) column: String,
}

impl SchemaFile {
    pub(crate) fn from_table(table: &Table, explicit_indexes: Vec<ExplicitIndexSchema>) -> Self {
        SchemaFile {
            table: table.name().to_string(),
            created_at_unix: table.created_at_unix(),
            columns: table.columns().iter().map(ColumnSchema::from_column).collect(),
            explicit_indexes,
        }
    }

    pub(crate) fn to_columns(&self) -> Vec<Column> {
        self.columns.iter().map(ColumnSchema::to_column).collect()
    }
}

impl ColumnSchema {
    fn from_column(column: &Column) -> Self {
        ColumnSchema {
            name: column.name.clone(),
            data_type: column.data_type,
            primary_key: column.primary_key,
            unique: column.unique,
            not_null: column.not_null,
            references: column.references.as_ref().map(|fk| ForeignKeySchema {
                table: fk.table.clone(),
                column: fk.column.clone(),
            }),
        }
    }

    fn to_column(&self) -> Column {
        Column {
            name: self.name.clone(),
            data_type: self.data_type,
            primary_key: self.primary_key,
            unique: self.unique,
            not_null: self.not_null,
            references: self.references.as_ref().map(|fk| ForeignKey {
                table: fk.table.clone(),
                column: fk.column.clone(),
            }),
        }
    }
}
