//! `CREATE TABLE`, `CREATE INDEX`, `DROP TABLE` (§4.7).

use tinybase_ast::{CreateIndexStmt, CreateTableStmt, DropTableStmt};
use tinybase_catalog::Catalog;
use tinybase_error::Error;
use tinybase_storage::Storage;

use crate::result::ExecResult;

/// `CREATE TABLE`: validate, build the row store, create implicit indexes
/// for PRIMARY KEY / UNIQUE columns, persist the schema.
pub(crate) fn create_table(
    catalog: &mut Catalog,
    storage: &Storage,
    stmt: &CreateTableStmt,
) -> Result<ExecResult, Error> {
    catalog.create_table(stmt)?;
    storage.persist_new_table(catalog, &stmt.name.value)?;
    log::debug!("created table '{}'", stmt.name.value);
    Ok(ExecResult::Ack("Table created"))
}

/// `CREATE INDEX`: register with the catalog, scan existing rows to
/// populate it, persist the owning table's schema (§4.7 "CREATE INDEX").
pub(crate) fn create_index(
    catalog: &mut Catalog,
    storage: &Storage,
    stmt: &CreateIndexStmt,
) -> Result<ExecResult, Error> {
    catalog.create_index(&stmt.name.value, &stmt.table.value, &stmt.column.value, false)?;
    catalog.populate_index_from_rows(&stmt.table.value, &stmt.column.value)?;
    storage.persist_schema(catalog, &stmt.table.value)?;
    log::debug!(
        "created index '{}' on {}.{}",
        stmt.name.value,
        stmt.table.value,
        stmt.column.value
    );
    Ok(ExecResult::Ack("Index created"))
}

/// `DROP TABLE`: referential check (refuses if another table still has a
/// foreign key into it), remove from the catalog, delete both on-disk
/// artefacts (§4.7 "DROP TABLE").
pub(crate) fn drop_table(
    catalog: &mut Catalog,
    storage: &Storage,
    stmt: &DropTableStmt,
) -> Result<ExecResult, Error> {
    catalog.drop_table(&stmt.name.value)?;
    storage.delete_table(&stmt.name.value)?;
    log::debug!("dropped table '{}'", stmt.name.value);
    Ok(ExecResult::Ack("Table dropped"))
}
