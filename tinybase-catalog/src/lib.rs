//! # tinybase-catalog
//!
//! The schema/catalog layer (§4.4, C2): table definitions, constraint
//! metadata, and the index registry. Per §9 "Ownership of indexes", every
//! index is owned by the catalog — keyed by `(table, column)` — rather than
//! by the table itself, so the executor can hold several index references
//! at once (e.g. while planning a multi-join query) without re-entrant
//! borrowing of one table. §9 "Backward links for foreign keys" is
//! implemented here too: a reverse map from a referenced `(table, column)`
//! to every `(table, column)` pair that references it, consulted in
//! O(referencing-columns) by DELETE and DROP TABLE.

#![deny(missing_docs)]
#![deny(unused_imports)]

mod column;
mod table;

use std::collections::HashMap;

use tinybase_ast::{ColumnConstraint, ColumnDef, CreateTableStmt, DataType, TableConstraint};
use tinybase_error::Error;
use tinybase_index::BTreeIndex;

pub use self::{
    column::{Column, ForeignKey},
    table::{Row, RowId, Table},
};

fn canonical(name: &str) -> String {
    name.to_lowercase()
}

/// An index key: the canonical table and column name it was built on.
pub type IndexKey = (String, String);

/// The per-table/per-index metadata and the in-memory mirror of every
/// table (§4.4), owned by one catalog directory (§3 "Catalog").
#[derive(Default)]
pub struct Catalog {
    tables: HashMap<String, Table>,
    indexes: HashMap<IndexKey, BTreeIndex>,
    index_names: HashMap<String, IndexKey>,
    fk_back_links: HashMap<IndexKey, Vec<IndexKey>>,
}

/// A per-table introspection row, backing `introspect('tables')` (§4.1, §4.4).
pub struct TableDescriptor {
    /// Table name.
    pub name: String,
    /// Number of declared columns.
    pub column_count: usize,
    /// Number of surviving rows.
    pub row_count: usize,
    /// The primary-key column name, if any.
    pub primary_key: Option<String>,
    /// Unix timestamp (seconds) the table was created.
    pub created_at_unix: u64,
    /// Names of every index defined on this table.
    pub indexes: Vec<String>,
}

/// A per-index introspection row, backing `introspect('indexes')` (§4.1, §4.4).
pub struct IndexDescriptor {
    /// Index name.
    pub name: String,
    /// The table it's built on.
    pub table: String,
    /// The column it's built on.
    pub column: String,
    /// Whether it enforces uniqueness.
    pub unique: bool,
    /// Number of distinct (key, row-id) entries.
    pub entry_count: usize,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Whether a table with this name (case-insensitive) exists.
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(&canonical(name))
    }

    /// Looks up a table, or `UnknownTable`.
    pub fn table(&self, name: &str) -> Result<&Table, Error> {
        self.tables
            .get(&canonical(name))
            .ok_or_else(|| Error::UnknownTable(name.to_string()))
    }

    /// Looks up a table mutably, or `UnknownTable`.
    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table, Error> {
        self.tables
            .get_mut(&canonical(name))
            .ok_or_else(|| Error::UnknownTable(name.to_string()))
    }

    /// Every table, for storage load/save-all and introspection.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Inserts an already-constructed table directly into the catalog,
    /// without running CREATE TABLE validation or building implicit
    /// indexes. Used by `tinybase-storage` when loading tables from disk
    /// (where indexes are rebuilt separately by the caller, per §4.5 "indexes
    /// live only in memory and are rebuilt from row data on open").
    pub fn insert_table_unchecked(&mut self, table: Table) {
        self.tables.insert(canonical(table.name()), table);
    }

    /// Validates and registers a new table from a parsed `CREATE TABLE`
    /// statement (§4.4), creating an implicit unique index for every
    /// PRIMARY KEY / UNIQUE column (§4.7 "CREATE TABLE"). Does not persist
    /// anything to disk; that is the caller's (executor's) job.
    pub fn create_table(&mut self, stmt: &CreateTableStmt) -> Result<(), Error> {
        let table_name = stmt.name.value.clone();
        if self.has_table(&table_name) {
            return Err(Error::TypeMismatch(format!(
                "table '{}' already exists",
                table_name
            )));
        }

        let mut columns = resolve_columns(stmt)?;
        apply_table_constraints(&mut columns, stmt)?;
        validate_single_primary_key(&table_name, &columns)?;
        self.validate_foreign_keys(&table_name, &columns)?;

        let canonical_table = canonical(&table_name);
        let mut implicit_indexes = Vec::new();
        for column in &columns {
            if column.primary_key || column.unique {
                let index_name = format!("{}_{}_idx", table_name, column.name);
                implicit_indexes.push((index_name, canonical(&column.name)));
            }
        }

        for column in &columns {
            if let Some(fk) = &column.references {
                self.fk_back_links
                    .entry((fk.table.clone(), fk.column.clone()))
                    .or_default()
                    .push((canonical_table.clone(), canonical(&column.name)));
            }
        }

        self.tables
            .insert(canonical_table.clone(), Table::new(table_name, columns));

        for (index_name, column) in implicit_indexes {
            self.indexes
                .insert((canonical_table.clone(), column.clone()), BTreeIndex::new(true));
            self.index_names
                .insert(canonical(&index_name), (canonical_table.clone(), column));
        }

        Ok(())
    }

    /// Removes a table, refusing if any other table still holds a foreign
    /// key into it (§4.4, §4.7 "DROP TABLE"). Returns the removed table so
    /// `tinybase-storage` can delete its on-disk artefacts.
    pub fn drop_table(&mut self, name: &str) -> Result<Table, Error> {
        let canonical_table = canonical(name);
        if !self.tables.contains_key(&canonical_table) {
            return Err(Error::UnknownTable(name.to_string()));
        }
        for ((ref_table, ref_column), referencers) in &self.fk_back_links {
            if *ref_table == canonical_table {
                if let Some((rt, rc)) = referencers.first() {
                    return Err(Error::RefusedDrop {
                        table: name.to_string(),
                        referencing_table: rt.clone(),
                        referencing_column: rc.clone(),
                    });
                }
                let _ = ref_column;
            }
        }

        let table = self.tables.remove(&canonical_table).expect("checked above");

        self.indexes.retain(|(t, _), _| *t != canonical_table);
        self.index_names.retain(|_, (t, _)| *t != canonical_table);
        self.fk_back_links.retain(|(t, _), _| *t != canonical_table);
        for referencers in self.fk_back_links.values_mut() {
            referencers.retain(|(t, _)| *t != canonical_table);
        }

        Ok(table)
    }

    /// Registers an explicit `CREATE INDEX name ON table(column)`. The
    /// caller (executor) is responsible for populating the returned index
    /// by scanning existing rows (§4.7 "CREATE INDEX").
    pub fn create_index(
        &mut self,
        index_name: &str,
        table: &str,
        column: &str,
        unique: bool,
    ) -> Result<(), Error> {
        let t = self.table(table)?;
        t.column(column)
            .ok_or_else(|| Error::UnknownColumn(column.to_string()))?;
        if self.index_names.contains_key(&canonical(index_name)) {
            return Err(Error::TypeMismatch(format!(
                "index '{}' already exists",
                index_name
            )));
        }
        let key = (canonical(table), canonical(column));
        self.indexes.insert(key.clone(), BTreeIndex::new(unique));
        self.index_names.insert(canonical(index_name), key);
        Ok(())
    }

    /// Registers an empty index over `table.column` under `index_name`
    /// without validating that the table or column exist. Used by
    /// `tinybase-storage` while replaying a schema file, where the table
    /// itself was just inserted via [`Catalog::insert_table_unchecked`] and
    /// ordinary validation would be redundant.
    pub fn insert_index_unchecked(&mut self, index_name: &str, table: &str, column: &str, unique: bool) {
        let key = (canonical(table), canonical(column));
        self.indexes.insert(key.clone(), BTreeIndex::new(unique));
        self.index_names.insert(canonical(index_name), key);
    }

    /// Scans every surviving row of `table` and inserts its `column` value
    /// into the already-registered index over `table.column` (§4.5 "indexes
    /// ... are rebuilt from row data on open", and §4.7 "CREATE INDEX").
    /// NULL values are skipped, matching insert-time index maintenance.
    pub fn populate_index_from_rows(&mut self, table: &str, column: &str) -> Result<(), Error> {
        let t = self.table(table)?;
        let pos = t
            .column_position(column)
            .ok_or_else(|| Error::UnknownColumn(column.to_string()))?;
        let entries: Vec<_> = t
            .rows()
            .iter()
            .filter(|row| !row.values[pos].is_null())
            .map(|row| (row.values[pos].clone(), row.id))
            .collect();
        let index = self
            .index_for_mut(table, column)
            .ok_or_else(|| Error::NoSuchIndex(format!("{}.{}", table, column)))?;
        for (value, row_id) in entries {
            index.insert(value, row_id, column)?;
        }
        Ok(())
    }

    /// Registers a foreign-key back-link from `referenced` to `referencing`
    /// directly, without re-running `CREATE TABLE` validation. Used by
    /// `tinybase-storage` to restore `fk_back_links` while replaying schema
    /// files (§9 "Backward links for foreign keys").
    pub fn register_foreign_key_back_link(
        &mut self,
        referenced_table: &str,
        referenced_column: &str,
        referencing_table: &str,
        referencing_column: &str,
    ) {
        self.fk_back_links
            .entry((canonical(referenced_table), canonical(referenced_column)))
            .or_default()
            .push((canonical(referencing_table), canonical(referencing_column)));
    }

    /// Looks up the index over `table.column`, if one exists.
    pub fn index_for(&self, table: &str, column: &str) -> Option<&BTreeIndex> {
        self.indexes.get(&(canonical(table), canonical(column)))
    }

    /// Looks up the index over `table.column` mutably, if one exists.
    pub fn index_for_mut(&mut self, table: &str, column: &str) -> Option<&mut BTreeIndex> {
        self.indexes
            .get_mut(&(canonical(table), canonical(column)))
    }

    /// The registered name of the index over `table.column`, if one exists
    /// (the inverse of [`Catalog::index_by_name`]). Used by the executor
    /// and EXPLAIN to name the index an access-method decision picked.
    pub fn index_name_for(&self, table: &str, column: &str) -> Option<&str> {
        let key = (canonical(table), canonical(column));
        self.index_names
            .iter()
            .find(|(_, v)| **v == key)
            .map(|(name, _)| name.as_str())
    }

    /// Looks up an index by its own name, or `NoSuchIndex`.
    pub fn index_by_name(&self, name: &str) -> Result<&BTreeIndex, Error> {
        let key = self
            .index_names
            .get(&canonical(name))
            .ok_or_else(|| Error::NoSuchIndex(name.to_string()))?;
        Ok(self.indexes.get(key).expect("index_names is kept in sync"))
    }

    /// Every `(referencing table, referencing column)` pair whose foreign
    /// key targets `table.column` (§9 "Backward links for foreign keys").
    pub fn referencing_columns(&self, table: &str, column: &str) -> &[IndexKey] {
        self.fk_back_links
            .get(&(canonical(table), canonical(column)))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn validate_foreign_keys(&self, table_name: &str, columns: &[Column]) -> Result<(), Error> {
        for column in columns {
            if let Some(fk) = &column.references {
                if canonical(&fk.table) == canonical(table_name) {
                    // Self-referencing FK: the target column must still be
                    // declared unique/PK within this same CREATE TABLE.
                    let target = columns
                        .iter()
                        .find(|c| canonical(&c.name) == fk.column)
                        .ok_or_else(|| Error::UnknownColumn(fk.column.clone()))?;
                    if !(target.unique || target.primary_key) {
                        return Err(Error::TypeMismatch(format!(
                            "foreign key target {}.{} is not UNIQUE or PRIMARY KEY",
                            fk.table, fk.column
                        )));
                    }
                    continue;
                }
                let ref_table = self
                    .tables
                    .get(&fk.table)
                    .ok_or_else(|| Error::UnknownTable(fk.table.clone()))?;
                let ref_column = ref_table
                    .column(&fk.column)
                    .ok_or_else(|| Error::UnknownColumn(fk.column.clone()))?;
                if !(ref_column.unique || ref_column.primary_key) {
                    return Err(Error::TypeMismatch(format!(
                        "foreign key target {}.{} is not UNIQUE or PRIMARY KEY",
                        fk.table, fk.column
                    )));
                }
            }
        }
        Ok(())
    }

    /// Descriptors for every table (§4.4 introspection projection).
    pub fn introspect_tables(&self) -> Vec<TableDescriptor> {
        let mut out: Vec<TableDescriptor> = self
            .tables
            .values()
            .map(|t| TableDescriptor {
                name: t.name().to_string(),
                column_count: t.columns().len(),
                row_count: t.rows().len(),
                primary_key: t.primary_key_column().map(str::to_string),
                created_at_unix: t.created_at_unix(),
                indexes: self
                    .index_names
                    .iter()
                    .filter(|(_, (table, _))| *table == canonical(t.name()))
                    .map(|(name, _)| name.clone())
                    .collect(),
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Descriptors for every index (§4.4 introspection projection).
    pub fn introspect_indexes(&self) -> Vec<IndexDescriptor> {
        let mut out: Vec<IndexDescriptor> = self
            .index_names
            .iter()
            .map(|(name, (table, column))| {
                let index = self.indexes.get(&(table.clone(), column.clone()));
                IndexDescriptor {
                    name: name.clone(),
                    table: table.clone(),
                    column: column.clone(),
                    unique: index.map(|i| i.is_unique()).unwrap_or(false),
                    entry_count: index.map(|i| i.len()).unwrap_or(0),
                }
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}

fn resolve_columns(stmt: &CreateTableStmt) -> Result<Vec<Column>, Error> {
    let mut seen = std::collections::HashSet::new();
    let mut columns = Vec::with_capacity(stmt.columns.len());
    for col_def in &stmt.columns {
        let canonical_name = canonical(&col_def.name.value);
        if !seen.insert(canonical_name) {
            return Err(Error::TypeMismatch(format!(
                "duplicate column '{}'",
                col_def.name.value
            )));
        }
        columns.push(resolve_column(col_def)?);
    }
    Ok(columns)
}

fn resolve_column(col_def: &ColumnDef) -> Result<Column, Error> {
    let mut column = Column {
        name: col_def.name.value.clone(),
        data_type: col_def.data_type,
        primary_key: false,
        unique: false,
        not_null: false,
        references: None,
    };
    for constraint in &col_def.constraints {
        match constraint {
            ColumnConstraint::PrimaryKey => {
                column.primary_key = true;
                column.unique = true;
                column.not_null = true;
            }
            ColumnConstraint::Unique => column.unique = true,
            ColumnConstraint::NotNull => column.not_null = true,
            ColumnConstraint::References { table, column: col } => {
                column.references = Some(ForeignKey {
                    table: canonical(&table.value),
                    column: canonical(&col.value),
                });
            }
        }
    }
    Ok(column)
}

fn apply_table_constraints(columns: &mut [Column], stmt: &CreateTableStmt) -> Result<(), Error> {
    for constraint in &stmt.constraints {
        match constraint {
            TableConstraint::PrimaryKey { column } => {
                let target = find_column_mut(columns, &column.value)?;
                target.primary_key = true;
                target.unique = true;
                target.not_null = true;
            }
            TableConstraint::ForeignKey {
                column,
                ref_table,
                ref_column,
            } => {
                let fk = ForeignKey {
                    table: canonical(&ref_table.value),
                    column: canonical(&ref_column.value),
                };
                let target = find_column_mut(columns, &column.value)?;
                target.references = Some(fk);
            }
        }
    }
    Ok(())
}

fn find_column_mut<'a>(columns: &'a mut [Column], name: &str) -> Result<&'a mut Column, Error> {
    columns
        .iter_mut()
        .find(|c| c.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| Error::UnknownColumn(name.to_string()))
}

fn validate_single_primary_key(table_name: &str, columns: &[Column]) -> Result<(), Error> {
    let count = columns.iter().filter(|c| c.primary_key).count();
    if count > 1 {
        return Err(Error::TypeMismatch(format!(
            "table '{}' declares more than one PRIMARY KEY",
            table_name
        )));
    }
    Ok(())
}

/// Re-exported so callers building a [`Column`] by hand (tests, the
/// executor's `CREATE INDEX` path) don't need a direct `tinybase-types`
/// dependency just for `DataType`.
pub type ColumnType = DataType;

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tinybase_ast::{ColumnDef, CreateTableStmt, DataType as Dt, Ident};

    use super::*;

    fn simple_create_table() -> CreateTableStmt {
        CreateTableStmt {
            name: Ident::new("users"),
            columns: vec![
                ColumnDef {
                    name: Ident::new("id"),
                    data_type: Dt::Integer,
                    constraints: vec![ColumnConstraint::PrimaryKey],
                },
                ColumnDef {
                    name: Ident::new("email"),
                    data_type: Dt::Varchar(50),
                    constraints: vec![ColumnConstraint::Unique],
                },
            ],
            constraints: vec![],
        }
    }

    #[test]
    fn create_table_registers_implicit_indexes() {
        let mut catalog = Catalog::new();
        catalog.create_table(&simple_create_table()).unwrap();
        assert!(catalog.index_for("users", "id").is_some());
        assert!(catalog.index_for("users", "email").is_some());
        assert!(catalog.index_for("users", "id").unwrap().is_unique());
    }

    #[test]
    fn create_table_rejects_duplicate_columns() {
        let mut stmt = simple_create_table();
        stmt.columns.push(ColumnDef {
            name: Ident::new("id"),
            data_type: Dt::Integer,
            constraints: vec![],
        });
        let mut catalog = Catalog::new();
        assert!(catalog.create_table(&stmt).is_err());
    }

    #[test]
    fn create_table_rejects_multiple_primary_keys() {
        let mut stmt = simple_create_table();
        stmt.columns[1].constraints.push(ColumnConstraint::PrimaryKey);
        let mut catalog = Catalog::new();
        assert!(catalog.create_table(&stmt).is_err());
    }

    #[test]
    fn drop_table_is_refused_when_referenced() {
        let mut catalog = Catalog::new();
        catalog.create_table(&simple_create_table()).unwrap();
        let orders = CreateTableStmt {
            name: Ident::new("orders"),
            columns: vec![
                ColumnDef {
                    name: Ident::new("id"),
                    data_type: Dt::Integer,
                    constraints: vec![ColumnConstraint::PrimaryKey],
                },
                ColumnDef {
                    name: Ident::new("user_id"),
                    data_type: Dt::Integer,
                    constraints: vec![ColumnConstraint::References {
                        table: Ident::new("users"),
                        column: Ident::new("id"),
                    }],
                },
            ],
            constraints: vec![],
        };
        catalog.create_table(&orders).unwrap();

        let err = catalog.drop_table("users").unwrap_err();
        assert!(matches!(err, Error::RefusedDrop { .. }));

        catalog.drop_table("orders").unwrap();
        catalog.drop_table("users").unwrap();
    }
}
