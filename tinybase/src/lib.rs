//! # tinybase
//!
//! The public facade of the tinybase SQL engine (§4.1): a single [`Engine`]
//! type binding one on-disk catalog directory to the `tinybase-parser` /
//! `tinybase-catalog` / `tinybase-storage` / `tinybase-exec` stack
//! underneath it. Everything else in the workspace is an implementation
//! detail reached through this crate; callers outside the engine (the
//! terminal, the HTTP dashboard, seeding scripts) only ever see
//! [`Engine::execute`], [`Engine::explain`] and [`Engine::introspect`].

#![deny(missing_docs)]
#![deny(unused_imports)]

use std::path::PathBuf;

use tinybase_ast::Stmt;
use tinybase_catalog::Catalog;
use tinybase_error::Error;
use tinybase_storage::{Storage, StorageConfig};
use tinybase_types::Value;

pub use tinybase_error::{Band, Error as EngineError};
pub use tinybase_exec::{AccessMethod, ExecResult, JoinAccessMethod, JoinPlan, Plan, Probe, ResultSet};

/// Which synthetic projection [`Engine::introspect`] should return (§4.1,
/// §4.4).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IntrospectKind {
    /// One row per table: name, column count, row count, primary key,
    /// indexes.
    Tables,
    /// One row per index: name, table, column, uniqueness, entry count.
    Indexes,
}

/// One open catalog directory (§3 "Catalog", §5): the in-memory mirror of
/// every table/index in `dir`, plus the durable store backing it. Every
/// `Engine` is fully independent of every other one, including other
/// `Engine`s opened on a different directory (§6 "Process-wide state:
/// None").
///
/// `Engine` is not `Sync`; callers sharing one across threads must
/// serialise calls externally (§5), since the engine performs no internal
/// locking of its own.
pub struct Engine {
    catalog: Catalog,
    storage: Storage,
}

impl Engine {
    /// Opens (creating if absent) the catalog directory at `dir`, loading
    /// every table and rebuilding every index into memory (§4.5). Durable
    /// writes are `fsync`ed before their atomic rename.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, Error> {
        Self::open_with_config(dir, StorageConfig::default())
    }

    /// As [`Engine::open`], with explicit control over the durability
    /// tradeoffs in `config` (§10.3). Tests that don't care about
    /// crash-safety can disable `fsync` for speed.
    pub fn open_with_config(dir: impl Into<PathBuf>, config: StorageConfig) -> Result<Self, Error> {
        let dir = dir.into();
        let storage = Storage::open(&dir, config)?;
        let catalog = storage.load_all()?;
        log::debug!("opened catalog at {}", dir.display());
        Ok(Engine { catalog, storage })
    }

    /// Parses `sql` as exactly one statement and dispatches it (§4.1). Any
    /// catalog/row-store mutation this statement makes is durably
    /// persisted before this call returns; on failure nothing is mutated
    /// (§4.1 "On failure, no partial effect is observable").
    ///
    /// `EXPLAIN ...` is rejected here: route it through [`Engine::explain`]
    /// instead, since `EXPLAIN` must never read or write a row (§4.8).
    pub fn execute(&mut self, sql: &str) -> Result<ExecResult, Error> {
        let stmt = tinybase_parser::parse(sql)?;
        if matches!(stmt, Stmt::Explain(_)) {
            return Err(Error::TypeMismatch(
                "EXPLAIN must be run through Engine::explain, not Engine::execute".to_string(),
            ));
        }
        tinybase_exec::execute(&mut self.catalog, &self.storage, &stmt)
    }

    /// Parses `sql` — a `SELECT`, optionally prefixed with `EXPLAIN` — and
    /// returns the structural plan the executor would use to run it,
    /// without performing any read or write (§4.1, §4.8).
    pub fn explain(&self, sql: &str) -> Result<Plan, Error> {
        let stmt = tinybase_parser::parse(sql)?;
        let select = match stmt {
            Stmt::Select(select) | Stmt::Explain(select) => select,
            other => {
                return Err(Error::TypeMismatch(format!(
                    "EXPLAIN only accepts a SELECT statement, found {}",
                    other.kind_name()
                )))
            }
        };
        tinybase_exec::explain(&self.catalog, &select)
    }

    /// Returns a synthetic [`ResultSet`] describing every table or every
    /// index in this catalog (§4.1).
    pub fn introspect(&self, kind: IntrospectKind) -> ResultSet {
        match kind {
            IntrospectKind::Tables => introspect_tables(&self.catalog),
            IntrospectKind::Indexes => introspect_indexes(&self.catalog),
        }
    }
}

fn introspect_tables(catalog: &Catalog) -> ResultSet {
    let columns = vec![
        "table".to_string(),
        "columns".to_string(),
        "rows".to_string(),
        "primary_key".to_string(),
        "indexes".to_string(),
    ];
    let rows = catalog
        .introspect_tables()
        .into_iter()
        .map(|t| {
            let mut indexes = t.indexes;
            indexes.sort();
            vec![
                Value::Text(t.name),
                Value::Integer(t.column_count as i64),
                Value::Integer(t.row_count as i64),
                t.primary_key.map(Value::Text).unwrap_or(Value::Null),
                Value::Text(indexes.join(", ")),
            ]
        })
        .collect();
    ResultSet { columns, rows }
}

fn introspect_indexes(catalog: &Catalog) -> ResultSet {
    let columns = vec![
        "index".to_string(),
        "table".to_string(),
        "column".to_string(),
        "unique".to_string(),
        "size".to_string(),
    ];
    let rows = catalog
        .introspect_indexes()
        .into_iter()
        .map(|i| {
            vec![
                Value::Text(i.name),
                Value::Text(i.table),
                Value::Text(i.column),
                Value::Boolean(i.unique),
                Value::Integer(i.entry_count as i64),
            ]
        })
        .collect();
    ResultSet { columns, rows }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn open_test_engine() -> (Engine, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let engine = Engine::open_with_config(dir.path(), StorageConfig { fsync: false }).unwrap();
        (engine, dir)
    }

    #[test]
    fn create_and_query_round_trips_through_reopen() {
        let (mut engine, dir) = open_test_engine();
        engine
            .execute("CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR(10))")
            .unwrap();
        engine.execute("INSERT INTO t VALUES (1, 'a'), (2, 'b')").unwrap();
        drop(engine);

        let mut reopened = Engine::open_with_config(dir.path(), StorageConfig { fsync: false }).unwrap();
        match reopened.execute("SELECT * FROM t").unwrap() {
            ExecResult::Query(rs) => assert_eq!(rs.rows.len(), 2),
            other => panic!("expected a query result, got {:?}", other),
        }
    }

    #[test]
    fn execute_rejects_explain() {
        let (mut engine, _dir) = open_test_engine();
        engine.execute("CREATE TABLE t (id INT PRIMARY KEY)").unwrap();
        assert!(engine.execute("EXPLAIN SELECT * FROM t").is_err());
    }

    #[test]
    fn explain_accepts_a_bare_select_or_an_explain_prefixed_one() {
        let (mut engine, _dir) = open_test_engine();
        engine.execute("CREATE TABLE t (id INT PRIMARY KEY)").unwrap();
        let a = engine.explain("SELECT * FROM t WHERE id = 1").unwrap();
        let b = engine.explain("EXPLAIN SELECT * FROM t WHERE id = 1").unwrap();
        assert_eq!(a, b);
        assert!(a.from_access.starts_with("index scan"));
    }

    #[test]
    fn introspect_tables_reports_columns_rows_and_indexes() {
        let (mut engine, _dir) = open_test_engine();
        engine
            .execute("CREATE TABLE t (id INT PRIMARY KEY, e VARCHAR(10) UNIQUE)")
            .unwrap();
        engine.execute("INSERT INTO t VALUES (1, 'a')").unwrap();
        let rs = engine.introspect(IntrospectKind::Tables);
        assert_eq!(rs.columns, vec!["table", "columns", "rows", "primary_key", "indexes"]);
        assert_eq!(rs.rows.len(), 1);
        assert_eq!(rs.rows[0][0], Value::Text("t".to_string()));
        assert_eq!(rs.rows[0][2], Value::Integer(1));
    }

    #[test]
    fn introspect_indexes_reports_uniqueness_and_size() {
        let (mut engine, _dir) = open_test_engine();
        engine
            .execute("CREATE TABLE t (id INT PRIMARY KEY, e VARCHAR(10) UNIQUE)")
            .unwrap();
        engine.execute("INSERT INTO t VALUES (1, 'a')").unwrap();
        let rs = engine.introspect(IntrospectKind::Indexes);
        assert_eq!(rs.rows.len(), 2);
        assert!(rs.rows.iter().all(|r| r[3] == Value::Boolean(true)));
    }
}
