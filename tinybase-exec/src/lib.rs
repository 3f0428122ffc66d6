//! # tinybase-exec
//!
//! The expression evaluator (C6), statement executor (C7), and `EXPLAIN`
//! planner (C8): everything downstream of a parsed [`Stmt`] that touches a
//! live [`Catalog`]/[`Storage`] pair. [`execute`] is the single dispatch
//! point the facade crate calls for every statement kind except `EXPLAIN`,
//! which goes through [`explain`] instead so it never reads or writes a row
//! (§4.8).

#![deny(missing_docs)]
#![deny(unused_imports)]

mod ddl;
mod dml;
mod eval;
mod explain;
mod plan;
mod result;
mod select;

use tinybase_ast::Stmt;
use tinybase_catalog::Catalog;
use tinybase_error::Error;
use tinybase_storage::Storage;

pub use self::explain::{explain, JoinPlan, Plan};
pub use self::plan::{AccessMethod, JoinAccessMethod, Probe};
pub use self::result::{ExecResult, ResultSet};

/// Dispatches one already-parsed statement (§4.7). `EXPLAIN` is the only
/// statement kind this function refuses: the facade must route it to
/// [`explain`] instead, since `EXPLAIN` must not read or write a single row.
pub fn execute(catalog: &mut Catalog, storage: &Storage, stmt: &Stmt) -> Result<ExecResult, Error> {
    log::debug!("executing {}", stmt.kind_name());
    match stmt {
        Stmt::CreateTable(s) => ddl::create_table(catalog, storage, s),
        Stmt::CreateIndex(s) => ddl::create_index(catalog, storage, s),
        Stmt::DropTable(s) => ddl::drop_table(catalog, storage, s),
        Stmt::Insert(s) => dml::insert(catalog, storage, s),
        Stmt::Update(s) => dml::update(catalog, storage, s),
        Stmt::Delete(s) => dml::delete(catalog, storage, s),
        Stmt::Select(s) => select::select(catalog, s).map(ExecResult::Query),
        Stmt::Explain(_) => Err(Error::TypeMismatch(
            "EXPLAIN must be executed via the explain() entry point, not execute()".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use tinybase_parser::parse;
    use tinybase_storage::StorageConfig;
    use tinybase_types::Value;

    use super::*;

    fn setup() -> (Catalog, Storage, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path(), StorageConfig { fsync: false }).unwrap();
        (Catalog::new(), storage, dir)
    }

    fn run(catalog: &mut Catalog, storage: &Storage, sql: &str) -> Result<ExecResult, Error> {
        let stmt = parse(sql).unwrap();
        execute(catalog, storage, &stmt)
    }

    #[test]
    fn create_insert_select_round_trip() {
        let (mut catalog, storage, _dir) = setup();
        run(&mut catalog, &storage, "CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR(10))").unwrap();
        run(&mut catalog, &storage, "INSERT INTO t VALUES (1, 'a'), (2, 'b')").unwrap();
        match run(&mut catalog, &storage, "SELECT * FROM t").unwrap() {
            ExecResult::Query(rs) => {
                assert_eq!(rs.columns, vec!["id", "name"]);
                assert_eq!(rs.rows.len(), 2);
            }
            other => panic!("expected a query result, got {:?}", other),
        }
    }

    #[test]
    fn unique_violation_leaves_prior_row_intact() {
        let (mut catalog, storage, _dir) = setup();
        run(&mut catalog, &storage, "CREATE TABLE u (id INT PRIMARY KEY, e VARCHAR(20) UNIQUE)").unwrap();
        run(&mut catalog, &storage, "INSERT INTO u VALUES (1,'a')").unwrap();
        let err = run(&mut catalog, &storage, "INSERT INTO u VALUES (2,'a')").unwrap_err();
        assert_eq!(err.kind(), "UniqueViolation");
        match run(&mut catalog, &storage, "SELECT * FROM u").unwrap() {
            ExecResult::Query(rs) => assert_eq!(rs.rows, vec![vec![Value::Integer(1), Value::Text("a".into())]]),
            other => panic!("expected a query result, got {:?}", other),
        }
    }

    #[test]
    fn delete_refused_while_referenced() {
        let (mut catalog, storage, _dir) = setup();
        run(&mut catalog, &storage, "CREATE TABLE d (id INT PRIMARY KEY)").unwrap();
        run(&mut catalog, &storage, "CREATE TABLE e (id INT PRIMARY KEY, d_id INT REFERENCES d(id))").unwrap();
        run(&mut catalog, &storage, "INSERT INTO d VALUES (1)").unwrap();
        run(&mut catalog, &storage, "INSERT INTO e VALUES (10,1)").unwrap();
        let err = run(&mut catalog, &storage, "DELETE FROM d WHERE id=1").unwrap_err();
        assert_eq!(err.kind(), "RefusedDelete");
    }

    #[test]
    fn explain_is_rejected_by_execute() {
        let (mut catalog, storage, _dir) = setup();
        run(&mut catalog, &storage, "CREATE TABLE t (id INT PRIMARY KEY)").unwrap();
        let stmt = parse("EXPLAIN SELECT * FROM t").unwrap();
        assert!(execute(&mut catalog, &storage, &stmt).is_err());
    }
}
