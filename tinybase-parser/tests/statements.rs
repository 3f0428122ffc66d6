//! Round-trip parse assertions for every statement shape in §4.2: each
//! accepted string parses to the expected [`Stmt`] variant with no partial
//! AST left behind on failure.

use pretty_assertions::assert_eq;
use tinybase_ast::Stmt;
use tinybase_error::Error;

fn parse(sql: &str) -> Stmt {
    tinybase_parser::parse(sql).unwrap_or_else(|e| panic!("failed to parse {:?}: {}", sql, e))
}

fn parse_err(sql: &str) -> Error {
    tinybase_parser::parse(sql).unwrap_err()
}

#[test]
fn create_table_with_column_and_table_constraints() {
    let stmt = parse(
        "CREATE TABLE orders (
            id INTEGER PRIMARY KEY,
            customer_id INTEGER NOT NULL,
            total FLOAT,
            placed DATE,
            paid BOOLEAN,
            FOREIGN KEY (customer_id) REFERENCES customers(id)
        )",
    );
    assert!(matches!(stmt, Stmt::CreateTable(_)));
}

#[test]
fn create_index_on_a_column() {
    assert!(matches!(parse("CREATE INDEX orders_customer_idx ON orders(customer_id)"), Stmt::CreateIndex(_)));
}

#[test]
fn drop_table() {
    assert!(matches!(parse("DROP TABLE orders"), Stmt::DropTable(_)));
}

#[test]
fn insert_positional_and_named_multi_row() {
    assert!(matches!(parse("INSERT INTO t VALUES (1, 'a'), (2, 'b')"), Stmt::Insert(_)));
    assert!(matches!(parse("INSERT INTO t (a, b) VALUES (1, 2)"), Stmt::Insert(_)));
}

#[test]
fn update_with_and_without_where() {
    assert!(matches!(parse("UPDATE t SET a = 1"), Stmt::Update(_)));
    assert!(matches!(parse("UPDATE t SET a = 1, b = 2 WHERE id = 5"), Stmt::Update(_)));
}

#[test]
fn delete_with_and_without_where() {
    assert!(matches!(parse("DELETE FROM t"), Stmt::Delete(_)));
    assert!(matches!(parse("DELETE FROM t WHERE id = 1"), Stmt::Delete(_)));
}

#[test]
fn select_full_pipeline() {
    let stmt = parse(
        "SELECT dept, COUNT(*), AVG(salary) AS avg_salary
         FROM emp e
         JOIN staff s ON e.id = s.emp_id
         LEFT JOIN bonus b ON e.id = b.emp_id
         WHERE e.salary > 1000
         GROUP BY dept
         HAVING COUNT(*) >= 3
         ORDER BY dept DESC, avg_salary ASC
         LIMIT 10",
    );
    match stmt {
        Stmt::Select(s) => {
            assert_eq!(s.joins.len(), 2);
            assert_eq!(s.group_by.len(), 1);
            assert!(s.having.is_some());
            assert_eq!(s.order_by.len(), 2);
            assert_eq!(s.limit, Some(10));
        }
        other => panic!("expected Select, got {:?}", other),
    }
}

#[test]
fn explain_wraps_a_select() {
    assert!(matches!(parse("EXPLAIN SELECT * FROM t WHERE id = 1"), Stmt::Explain(_)));
}

#[test]
fn statement_terminator_is_optional_and_comments_are_ignored() {
    assert!(matches!(parse("-- a leading comment\nDROP TABLE t"), Stmt::DropTable(_)));
    assert!(matches!(parse("DROP TABLE t;"), Stmt::DropTable(_)));
}

#[test]
fn keyword_case_is_insignificant() {
    assert!(matches!(parse("select * from t"), Stmt::Select(_)));
    assert!(matches!(parse("SeLeCt * FrOm t"), Stmt::Select(_)));
}

#[test]
fn a_second_statement_is_rejected() {
    let err = parse_err("DROP TABLE t; DROP TABLE u;");
    assert_eq!(err.kind(), "SyntaxError");
}

#[test]
fn string_literals_preserve_embedded_commas_and_operators() {
    let stmt = parse("INSERT INTO t VALUES ('a, b = c')");
    match stmt {
        Stmt::Insert(i) => assert_eq!(i.rows.len(), 1),
        other => panic!("expected Insert, got {:?}", other),
    }
}
