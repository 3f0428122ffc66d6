//! # tinybase-storage
//!
//! The durability layer (§4.5, C4): per-table schema and row files, the
//! atomic-rename write contract, and the in-memory [`Catalog`] mirror that
//! every read and write actually goes through. Indexes are never
//! persisted directly; they live only in memory and are rebuilt from row
//! data on [`Storage::load_all`] (§4.5 "In-memory mirror").

#![deny(missing_docs)]
#![deny(unused_imports)]

mod atomic;
mod row_file;
mod schema_file;

use std::fs;
use std::path::{Path, PathBuf};

use tinybase_catalog::{Catalog, RowId, Table};
use tinybase_error::Error;
use tinybase_types::Value;

use self::row_file::RowFile;
use self::schema_file::{ExplicitIndexSchema, SchemaFile};

/// Tunable knobs for the durability contract. Currently just whether the
/// temp file is `fsync`ed before the rename (§10.3): production code
/// wants this on; tests that don't care about crash-safety can turn it
/// off to avoid paying for a real disk flush on every assertion.
#[derive(Clone, Copy, Debug)]
pub struct StorageConfig {
    /// Whether to `fsync` the temp file before renaming it over the
    /// target. Defaults to `true`.
    pub fsync: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig { fsync: true }
    }
}

/// The durable per-table schema/row file store for one catalog directory.
pub struct Storage {
    dir: PathBuf,
    config: StorageConfig,
}

impl Storage {
    /// Opens (creating if absent) the catalog directory at `dir`.
    pub fn open(dir: impl Into<PathBuf>, config: StorageConfig) -> Result<Self, Error> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(Error::IoError)?;
        Ok(Storage { dir, config })
    }

    /// Loads every table found in the directory into a fresh [`Catalog`],
    /// rebuilding implicit PRIMARY KEY/UNIQUE indexes and any indexes
    /// created with `CREATE INDEX`, and restoring foreign-key back-links
    /// (§4.5, §9 "Backward links for foreign keys").
    pub fn load_all(&self) -> Result<Catalog, Error> {
        let mut catalog = Catalog::new();
        let mut schema_paths: Vec<PathBuf> = Vec::new();

        for entry in fs::read_dir(&self.dir).map_err(Error::IoError)? {
            let entry = entry.map_err(Error::IoError)?;
            let path = entry.path();
            match path.extension().and_then(|e| e.to_str()) {
                Some("schema") => schema_paths.push(path),
                Some("tmp") => {
                    log::warn!("ignoring stray temp file on open: {}", path.display());
                }
                _ => {}
            }
        }
        schema_paths.sort();

        for schema_path in schema_paths {
            self.load_table(&schema_path, &mut catalog)?;
        }

        Ok(catalog)
    }

    fn load_table(&self, schema_path: &Path, catalog: &mut Catalog) -> Result<(), Error> {
        let schema: SchemaFile = read_json(schema_path)?;
        let row_path = self.row_path(&schema.table);
        let row_file = if row_path.exists() {
            read_json(&row_path)?
        } else {
            log::warn!(
                "table '{}' has a schema file but no row file; treating it as empty",
                schema.table
            );
            RowFile::empty()
        };

        log::debug!(
            "loaded table '{}' ({} rows)",
            schema.table,
            row_file.rows.len()
        );

        let columns = schema.to_columns();
        let table_name = schema.table.clone();
        let next_row_id = row_file.next_row_id;
        let created_at_unix = schema.created_at_unix;
        let rows = row_file.into_rows();

        let implicit_indexes: Vec<(String, String)> = columns
            .iter()
            .filter(|c| c.primary_key || c.unique)
            .map(|c| (format!("{}_{}_idx", table_name, c.name), c.name.clone()))
            .collect();
        let fk_links: Vec<(String, String, String)> = columns
            .iter()
            .filter_map(|c| {
                c.references
                    .as_ref()
                    .map(|fk| (fk.table.clone(), fk.column.clone(), c.name.clone()))
            })
            .collect();

        catalog.insert_table_unchecked(Table::from_parts(
            table_name.clone(),
            columns,
            rows,
            next_row_id,
            created_at_unix,
        ));

        for (index_name, column) in implicit_indexes {
            catalog.insert_index_unchecked(&index_name, &table_name, &column, true);
            catalog.populate_index_from_rows(&table_name, &column)?;
        }
        for index in &schema.explicit_indexes {
            catalog.insert_index_unchecked(&index.name, &table_name, &index.column, false);
            catalog.populate_index_from_rows(&table_name, &index.column)?;
        }
        for (ref_table, ref_column, column) in fk_links {
            catalog.register_foreign_key_back_link(&ref_table, &ref_column, &table_name, &column);
        }

        Ok(())
    }

    /// Persists a newly created (and still empty) table's schema and row
    /// files (§4.7 "CREATE TABLE ... Persist the schema").
    pub fn persist_new_table(&self, catalog: &Catalog, table_name: &str) -> Result<(), Error> {
        self.save_schema(catalog, table_name)?;
        self.save_rows(catalog.table(table_name)?)
    }

    /// Deletes a dropped table's on-disk artefacts (§4.7 "DROP TABLE").
    /// Missing files are not an error: a table may never have been
    /// persisted if the process crashed between `CREATE TABLE` validation
    /// and its first save.
    pub fn delete_table(&self, table_name: &str) -> Result<(), Error> {
        for path in [self.schema_path(table_name), self.row_path(table_name)] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::IoError(e)),
            }
        }
        Ok(())
    }

    /// Rewrites a table's schema file, e.g. after `CREATE INDEX` adds a
    /// new explicit index. The row file is untouched.
    pub fn persist_schema(&self, catalog: &Catalog, table_name: &str) -> Result<(), Error> {
        self.save_schema(catalog, table_name)
    }

    /// Appends a row to `table` and durably saves the row file; exactly
    /// one atomic rename per call (§4.5).
    pub fn append_row(
        &self,
        catalog: &mut Catalog,
        table_name: &str,
        values: Vec<Value>,
    ) -> Result<RowId, Error> {
        let row_id = catalog.table_mut(table_name)?.append_row(values);
        self.save_rows(catalog.table(table_name)?)?;
        Ok(row_id)
    }

    /// Overwrites the field values of an existing row and durably saves
    /// the row file.
    pub fn mutate_row(
        &self,
        catalog: &mut Catalog,
        table_name: &str,
        row_id: RowId,
        new_values: Vec<Value>,
    ) -> Result<(), Error> {
        catalog
            .table_mut(table_name)?
            .set_row_values(row_id, new_values)?;
        self.save_rows(catalog.table(table_name)?)
    }

    /// Removes a row and durably saves the row file.
    pub fn remove_row(
        &self,
        catalog: &mut Catalog,
        table_name: &str,
        row_id: RowId,
    ) -> Result<(), Error> {
        catalog.table_mut(table_name)?.remove_row(row_id);
        self.save_rows(catalog.table(table_name)?)
    }

    fn save_schema(&self, catalog: &Catalog, table_name: &str) -> Result<(), Error> {
        let table = catalog.table(table_name)?;
        let explicit_indexes = catalog
            .introspect_indexes()
            .into_iter()
            .filter(|idx| idx.table.eq_ignore_ascii_case(table_name))
            .filter(|idx| !is_implicit_index_name(&idx.name, table.name(), &idx.column))
            .map(|idx| ExplicitIndexSchema {
                name: idx.name,
                column: idx.column,
            })
            .collect();
        let schema = SchemaFile::from_table(table, explicit_indexes);
        let bytes = serde_json::to_vec_pretty(&schema).map_err(json_err)?;
        atomic::atomic_write(&self.schema_path(table_name), &bytes, self.config.fsync)?;
        log::debug!("saved schema for table '{}'", table_name);
        Ok(())
    }

    fn save_rows(&self, table: &Table) -> Result<(), Error> {
        let row_file = RowFile::from_table(table);
        let bytes = serde_json::to_vec_pretty(&row_file).map_err(json_err)?;
        atomic::atomic_write(&self.row_path(table.name()), &bytes, self.config.fsync)?;
        log::debug!(
            "saved {} rows for table '{}'",
            row_file.rows.len(),
            table.name()
        );
        Ok(())
    }

    fn schema_path(&self, table_name: &str) -> PathBuf {
        self.dir.join(format!("{}.schema", table_name.to_lowercase()))
    }

    fn row_path(&self, table_name: &str) -> PathBuf {
        self.dir.join(format!("{}.data", table_name.to_lowercase()))
    }
}

fn is_implicit_index_name(index_name: &str, table_name: &str, column_name: &str) -> bool {
    index_name.eq_ignore_ascii_case(&format!("{}_{}_idx", table_name, column_name))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let bytes = fs::read(path).map_err(Error::IoError)?;
    serde_json::from_slice(&bytes).map_err(json_err)
}

fn json_err(e: serde_json::Error) -> Error {
    Error::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use tinybase_ast::{ColumnConstraint, ColumnDef, CreateTableStmt, DataType, Ident};

    use super::*;

    fn create_table_stmt() -> CreateTableStmt {
        CreateTableStmt {
            name: Ident::new("widgets"),
            columns: vec![
                ColumnDef {
                    name: Ident::new("id"),
                    data_type: DataType::Integer,
                    constraints: vec![ColumnConstraint::PrimaryKey],
                },
                ColumnDef {
                    name: Ident::new("label"),
                    data_type: DataType::Varchar(32),
                    constraints: vec![],
                },
            ],
            constraints: vec![],
        }
    }

    fn test_config() -> StorageConfig {
        StorageConfig { fsync: false }
    }

    #[test]
    fn round_trips_schema_and_rows_through_a_reload() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path(), test_config()).unwrap();

        let mut catalog = Catalog::new();
        catalog.create_table(&create_table_stmt()).unwrap();
        storage.persist_new_table(&catalog, "widgets").unwrap();
        storage
            .append_row(
                &mut catalog,
                "widgets",
                vec![Value::Integer(1), Value::Text("gear".into())],
            )
            .unwrap();
        storage
            .append_row(
                &mut catalog,
                "widgets",
                vec![Value::Integer(2), Value::Text("cog".into())],
            )
            .unwrap();

        let reloaded = storage.load_all().unwrap();
        let table = reloaded.table("widgets").unwrap();
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.next_row_id(), 2);
        assert!(reloaded.index_for("widgets", "id").unwrap().is_unique());
    }

    #[test]
    fn mutate_and_remove_row_persist_across_reload() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path(), test_config()).unwrap();
        let mut catalog = Catalog::new();
        catalog.create_table(&create_table_stmt()).unwrap();
        storage.persist_new_table(&catalog, "widgets").unwrap();
        let id = storage
            .append_row(
                &mut catalog,
                "widgets",
                vec![Value::Integer(1), Value::Text("gear".into())],
            )
            .unwrap();
        storage
            .mutate_row(
                &mut catalog,
                "widgets",
                id,
                vec![Value::Integer(1), Value::Text("sprocket".into())],
            )
            .unwrap();

        let reloaded = storage.load_all().unwrap();
        let row = reloaded.table("widgets").unwrap().row(id).unwrap();
        assert_eq!(row.values[1], Value::Text("sprocket".into()));

        storage.remove_row(&mut catalog, "widgets", id).unwrap();
        let reloaded = storage.load_all().unwrap();
        assert!(reloaded.table("widgets").unwrap().row(id).is_none());
    }

    #[test]
    fn explicit_index_survives_a_reload() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path(), test_config()).unwrap();
        let mut catalog = Catalog::new();
        catalog.create_table(&create_table_stmt()).unwrap();
        storage.persist_new_table(&catalog, "widgets").unwrap();
        storage
            .append_row(
                &mut catalog,
                "widgets",
                vec![Value::Integer(1), Value::Text("gear".into())],
            )
            .unwrap();

        catalog
            .create_index("widgets_label_idx2", "widgets", "label", false)
            .unwrap();
        catalog.populate_index_from_rows("widgets", "label").unwrap();
        storage.persist_schema(&catalog, "widgets").unwrap();

        let reloaded = storage.load_all().unwrap();
        assert!(reloaded.index_for("widgets", "label").is_some());
        assert!(!reloaded.index_for("widgets", "label").unwrap().is_unique());
    }

    #[test]
    fn delete_table_removes_both_artefacts() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path(), test_config()).unwrap();
        let mut catalog = Catalog::new();
        catalog.create_table(&create_table_stmt()).unwrap();
        storage.persist_new_table(&catalog, "widgets").unwrap();

        storage.delete_table("widgets").unwrap();
        assert!(!storage.schema_path("widgets").exists());
        assert!(!storage.row_path("widgets").exists());

        let reloaded = storage.load_all().unwrap();
        assert!(!reloaded.has_table("widgets"));
    }
}
