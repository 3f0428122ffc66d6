//! Access-method selection shared between the executor (C7) and EXPLAIN
//! (C8). Kept as one module consumed by both (§9 "EXPLAIN accuracy": "the
//! planner must use the same index-selection logic as the executor;
//! divergence is a test-detected bug. Extract the chooser into a function
//! consumed by both"). Every function here only consults catalog metadata
//! (table/column/index existence) — never a row — so it's safe for EXPLAIN
//! to call directly.

use tinybase_ast::{BinaryOperator, Expr};
use tinybase_catalog::{Catalog, RowId};
use tinybase_types::Value;

/// How a single table source is scanned (§4.7 step 3, §4.8).
#[derive(Clone, Debug, PartialEq)]
pub enum AccessMethod {
    /// Every row, in insertion order.
    FullScan,
    /// A probe of `index_name` (built on `column`), with the given bound.
    IndexScan {
        /// The index's registered name.
        index_name: String,
        /// The column it's built on.
        column: String,
        /// The probe bound.
        probe: Probe,
    },
}

/// The key bound an [`AccessMethod::IndexScan`] probes with.
#[derive(Clone, Debug, PartialEq)]
pub enum Probe {
    /// An exact-key probe (`=`).
    Point(Value),
    /// A bounded range probe (`<`, `<=`, `>`, `>=`).
    Range {
        /// Lower bound, if any.
        lo: Option<Value>,
        /// Upper bound, if any.
        hi: Option<Value>,
        /// Whether `lo` itself is included.
        lo_inclusive: bool,
        /// Whether `hi` itself is included.
        hi_inclusive: bool,
    },
}

impl core::fmt::Display for Probe {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Probe::Point(v) => write!(f, "= {}", v),
            Probe::Range {
                lo,
                hi,
                lo_inclusive,
                hi_inclusive,
            } => {
                let mut first = true;
                if let Some(lo) = lo {
                    write!(f, "{} {}", if *lo_inclusive { ">=" } else { ">" }, lo)?;
                    first = false;
                }
                if let Some(hi) = hi {
                    if !first {
                        write!(f, " AND ")?;
                    }
                    write!(f, "{} {}", if *hi_inclusive { "<=" } else { "<" }, hi)?;
                }
                Ok(())
            }
        }
    }
}

impl core::fmt::Display for AccessMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AccessMethod::FullScan => write!(f, "full scan"),
            AccessMethod::IndexScan { index_name, probe, .. } => {
                write!(f, "index scan({}) {}", index_name, probe)
            }
        }
    }
}

/// How a `JOIN`'s inner side is accessed (§4.7 step 2, §4.8).
#[derive(Clone, Debug, PartialEq)]
pub enum JoinAccessMethod {
    /// Every row of the right-hand table is scanned per left row.
    NestedLoop,
    /// The right-hand table's index on `right_column` is probed with the
    /// value of `left_key` evaluated against the already-joined row.
    IndexNestedLoop {
        /// The right-hand index's registered name.
        index_name: String,
        /// The right-hand column it's built on.
        right_column: String,
        /// The expression (over the already-joined schema) supplying the
        /// probe key for each left row.
        left_key: Expr,
    },
}

impl core::fmt::Display for JoinAccessMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            JoinAccessMethod::NestedLoop => write!(f, "nested loop"),
            JoinAccessMethod::IndexNestedLoop { index_name, .. } => {
                write!(f, "index-aware nested loop({})", index_name)
            }
        }
    }
}

/// Splits a predicate into its top-level `AND`-conjuncts (an `OR` at the
/// top is left as one conjunct, since its two halves aren't independently
/// safe to push into an index probe).
pub(crate) fn split_conjuncts(expr: &Expr) -> Vec<&Expr> {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            let mut out = split_conjuncts(left);
            out.extend(split_conjuncts(right));
            out
        }
        Expr::Nested(inner) => split_conjuncts(inner),
        other => vec![other],
    }
}

fn flip(op: BinaryOperator) -> BinaryOperator {
    match op {
        BinaryOperator::Lt => BinaryOperator::Gt,
        BinaryOperator::LtEq => BinaryOperator::GtEq,
        BinaryOperator::Gt => BinaryOperator::Lt,
        BinaryOperator::GtEq => BinaryOperator::LtEq,
        other => other,
    }
}

/// Whether `expr` names the column `column` on the source addressed by
/// `qualifier` — bare (`col`) or qualified (`qualifier.col`).
fn names_column(expr: &Expr, qualifier: &str, column: &str) -> bool {
    match expr {
        Expr::Identifier(ident) => ident.value.eq_ignore_ascii_case(column),
        Expr::CompoundIdentifier(q, ident) => {
            q.value.eq_ignore_ascii_case(qualifier) && ident.value.eq_ignore_ascii_case(column)
        }
        _ => false,
    }
}

/// Recognises `col OP literal` (or `literal OP col`) for a column
/// addressed by `qualifier`, where `OP` is one of the five comparison
/// operators eligible for index probing (§4.7 step 3: `=, <, <=, >, >=`;
/// `!=`/`<>` is excluded — a B-tree can't bound a "not equal to" probe).
fn match_indexable_conjunct(expr: &Expr, qualifier: &str) -> Option<(String, BinaryOperator, Value)> {
    let Expr::BinaryOp { left, op, right } = expr else {
        return None;
    };
    if !matches!(
        op,
        BinaryOperator::Eq
            | BinaryOperator::Lt
            | BinaryOperator::LtEq
            | BinaryOperator::Gt
            | BinaryOperator::GtEq
    ) {
        return None;
    }
    if let (col_expr, Expr::Literal(lit)) = (left.as_ref(), right.as_ref()) {
        if let Some(col) = column_name(col_expr, qualifier) {
            return Some((col, *op, Value::from_literal(lit).ok()?));
        }
    }
    if let (Expr::Literal(lit), col_expr) = (left.as_ref(), right.as_ref()) {
        if let Some(col) = column_name(col_expr, qualifier) {
            return Some((col, flip(*op), Value::from_literal(lit).ok()?));
        }
    }
    None
}

fn column_name(expr: &Expr, qualifier: &str) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.clone()),
        Expr::CompoundIdentifier(q, ident) if q.value.eq_ignore_ascii_case(qualifier) => {
            Some(ident.value.clone())
        }
        _ => None,
    }
}

fn probe_for(op: BinaryOperator, value: Value) -> Option<Probe> {
    Some(match op {
        BinaryOperator::Eq => Probe::Point(value),
        BinaryOperator::Lt => Probe::Range {
            lo: None,
            hi: Some(value),
            lo_inclusive: false,
            hi_inclusive: false,
        },
        BinaryOperator::LtEq => Probe::Range {
            lo: None,
            hi: Some(value),
            lo_inclusive: false,
            hi_inclusive: true,
        },
        BinaryOperator::Gt => Probe::Range {
            lo: Some(value),
            hi: None,
            lo_inclusive: false,
            hi_inclusive: false,
        },
        BinaryOperator::GtEq => Probe::Range {
            lo: Some(value),
            hi: None,
            lo_inclusive: true,
            hi_inclusive: false,
        },
        _ => return None,
    })
}

/// Whether `value` is safe to hand to the B-tree comparator as a probe
/// key for `table.column`: not NULL (§4.3 three-valued logic — `col = NULL`
/// is never true, so it must never reach an index probe expecting an
/// ordered key) and of the column's declared type (a cross-type literal is
/// a `TypeMismatch`, not a key the index can order against). Either case
/// falls back to a full scan, where the evaluator surfaces the correct
/// three-valued result or error instead of panicking in the comparator.
fn probe_value_fits_column(catalog: &Catalog, table_name: &str, column: &str, value: &Value) -> bool {
    if value.is_null() {
        return false;
    }
    match catalog.table(table_name).ok().and_then(|t| t.column(column)) {
        Some(col) => value.matches_type(&col.data_type),
        None => false,
    }
}

/// Chooses how to scan `table` (addressed by `qualifier`) given the
/// statement's `WHERE` predicate, applicable only when the query has a
/// single source (§4.7 step 3: "If the FROM is a single table"). Never
/// touches a row — only `Catalog::index_for`'s metadata.
pub(crate) fn choose_table_access(
    catalog: &Catalog,
    table_name: &str,
    qualifier: &str,
    selection: Option<&Expr>,
) -> AccessMethod {
    let Some(selection) = selection else {
        return AccessMethod::FullScan;
    };
    for conjunct in split_conjuncts(selection) {
        if let Some((column, op, value)) = match_indexable_conjunct(conjunct, qualifier) {
            if !probe_value_fits_column(catalog, table_name, &column, &value) {
                continue;
            }
            if catalog.index_for(table_name, &column).is_some() {
                if let Some(probe) = probe_for(op, value) {
                    let index_name = catalog
                        .index_name_for(table_name, &column)
                        .unwrap_or(&column)
                        .to_string();
                    return AccessMethod::IndexScan {
                        index_name,
                        column,
                        probe,
                    };
                }
            }
        }
    }
    AccessMethod::FullScan
}

/// Recognises an equality conjunct naming a column on `right_qualifier`'s
/// side, returning that column's name and the expression (over whatever
/// is already joined) that supplies the probe value from the other side.
fn match_join_equality<'a>(expr: &'a Expr, right_qualifier: &str) -> Option<(String, &'a Expr)> {
    let Expr::BinaryOp {
        left,
        op: BinaryOperator::Eq,
        right,
    } = expr
    else {
        return None;
    };
    if let Expr::CompoundIdentifier(q, ident) = left.as_ref() {
        if q.value.eq_ignore_ascii_case(right_qualifier) {
            return Some((ident.value.clone(), right));
        }
    }
    if let Expr::CompoundIdentifier(q, ident) = right.as_ref() {
        if q.value.eq_ignore_ascii_case(right_qualifier) {
            return Some((ident.value.clone(), left));
        }
    }
    None
}

/// Chooses how a `JOIN`'s inner side is accessed (§4.7 step 2). Per §4.7:
/// "The executor MUST detect equality ON-conditions of the form `left.X =
/// right.Y` and, if `right.Y` carries an index, replace the inner scan
/// with an index probe ... Tie-break: if both sides of the equality are
/// indexed, the right side wins" — this function only ever inspects the
/// right-hand column's index, which already implements that tie-break
/// (the left side's index, if any, is simply never consulted here).
pub(crate) fn choose_join_access(
    catalog: &Catalog,
    right_table: &str,
    right_qualifier: &str,
    on: &Expr,
) -> JoinAccessMethod {
    for conjunct in split_conjuncts(on) {
        if let Some((right_column, left_key)) = match_join_equality(conjunct, right_qualifier) {
            if catalog.index_for(right_table, &right_column).is_some() {
                let index_name = catalog
                    .index_name_for(right_table, &right_column)
                    .unwrap_or(&right_column)
                    .to_string();
                return JoinAccessMethod::IndexNestedLoop {
                    index_name,
                    right_column,
                    left_key: left_key.clone(),
                };
            }
        }
    }
    JoinAccessMethod::NestedLoop
}

/// Resolves an [`AccessMethod`] against the live catalog into the row-ids
/// it selects, in ascending row-id order (insertion order, since row-ids
/// are assigned monotonically and never reused). Callers needing a
/// different output order (e.g. ORDER BY) sort again downstream; this
/// ordering exists so an index scan doesn't silently reorder a plain
/// `SELECT * FROM t` relative to `t`'s insertion order (§8 "Insertion
/// order").
pub(crate) fn scan_row_ids(catalog: &Catalog, table_name: &str, method: &AccessMethod) -> Vec<RowId> {
    match method {
        AccessMethod::FullScan => catalog
            .table(table_name)
            .map(|t| t.rows().iter().map(|r| r.id).collect())
            .unwrap_or_default(),
        AccessMethod::IndexScan { column, probe, .. } => {
            let Some(index) = catalog.index_for(table_name, column) else {
                return Vec::new();
            };
            let mut ids = match probe {
                Probe::Point(value) => index.point_lookup(value).to_vec(),
                Probe::Range {
                    lo,
                    hi,
                    lo_inclusive,
                    hi_inclusive,
                } => index.range_lookup(lo.as_ref(), hi.as_ref(), *lo_inclusive, *hi_inclusive),
            };
            ids.sort_unstable();
            ids
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tinybase_ast::{ColumnConstraint, ColumnDef, CreateTableStmt, DataType, Ident, Literal};

    use super::*;

    fn catalog_with_indexed_users() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .create_table(&CreateTableStmt {
                name: Ident::new("users"),
                columns: vec![
                    ColumnDef {
                        name: Ident::new("id"),
                        data_type: DataType::Integer,
                        constraints: vec![ColumnConstraint::PrimaryKey],
                    },
                    ColumnDef {
                        name: Ident::new("age"),
                        data_type: DataType::Integer,
                        constraints: vec![],
                    },
                ],
                constraints: vec![],
            })
            .unwrap();
        catalog
    }

    fn eq_expr(col: &str, n: i64) -> Expr {
        Expr::BinaryOp {
            left: Box::new(Expr::Identifier(Ident::new(col))),
            op: BinaryOperator::Eq,
            right: Box::new(Expr::Literal(Literal::Integer(n))),
        }
    }

    #[test]
    fn chooses_index_scan_on_indexed_equality() {
        let catalog = catalog_with_indexed_users();
        let method = choose_table_access(&catalog, "users", "users", Some(&eq_expr("id", 5)));
        assert!(matches!(
            method,
            AccessMethod::IndexScan {
                probe: Probe::Point(Value::Integer(5)),
                ..
            }
        ));
    }

    #[test]
    fn falls_back_to_full_scan_on_unindexed_column() {
        let catalog = catalog_with_indexed_users();
        let method = choose_table_access(&catalog, "users", "users", Some(&eq_expr("age", 30)));
        assert_eq!(method, AccessMethod::FullScan);
    }

    #[test]
    fn falls_back_to_full_scan_with_no_where() {
        let catalog = catalog_with_indexed_users();
        let method = choose_table_access(&catalog, "users", "users", None);
        assert_eq!(method, AccessMethod::FullScan);
    }

    #[test]
    fn range_operator_produces_a_range_probe() {
        let catalog = catalog_with_indexed_users();
        let expr = Expr::BinaryOp {
            left: Box::new(Expr::Identifier(Ident::new("id"))),
            op: BinaryOperator::GtEq,
            right: Box::new(Expr::Literal(Literal::Integer(10))),
        };
        let method = choose_table_access(&catalog, "users", "users", Some(&expr));
        match method {
            AccessMethod::IndexScan {
                probe: Probe::Range { lo, lo_inclusive, .. },
                ..
            } => {
                assert_eq!(lo, Some(Value::Integer(10)));
                assert!(lo_inclusive);
            }
            other => panic!("expected a range probe, got {:?}", other),
        }
    }

    #[test]
    fn falls_back_to_full_scan_on_null_literal_against_indexed_column() {
        let catalog = catalog_with_indexed_users();
        let expr = Expr::BinaryOp {
            left: Box::new(Expr::Identifier(Ident::new("id"))),
            op: BinaryOperator::Eq,
            right: Box::new(Expr::Literal(Literal::Null)),
        };
        let method = choose_table_access(&catalog, "users", "users", Some(&expr));
        assert_eq!(method, AccessMethod::FullScan);
    }

    #[test]
    fn falls_back_to_full_scan_on_type_mismatched_literal_against_indexed_column() {
        let catalog = catalog_with_indexed_users();
        let expr = Expr::BinaryOp {
            left: Box::new(Expr::Identifier(Ident::new("id"))),
            op: BinaryOperator::Eq,
            right: Box::new(Expr::Literal(Literal::Text("abc".to_string()))),
        };
        let method = choose_table_access(&catalog, "users", "users", Some(&expr));
        assert_eq!(method, AccessMethod::FullScan);
    }

    #[test]
    fn chooses_index_nested_loop_when_right_side_is_indexed() {
        let catalog = catalog_with_indexed_users();
        let on = Expr::BinaryOp {
            left: Box::new(Expr::CompoundIdentifier(Ident::new("o"), Ident::new("user_id"))),
            op: BinaryOperator::Eq,
            right: Box::new(Expr::CompoundIdentifier(Ident::new("u"), Ident::new("id"))),
        };
        let method = choose_join_access(&catalog, "users", "u", &on);
        assert!(matches!(method, JoinAccessMethod::IndexNestedLoop { .. }));
    }

    #[test]
    fn falls_back_to_nested_loop_with_no_matching_equality() {
        let catalog = catalog_with_indexed_users();
        let on = Expr::BinaryOp {
            left: Box::new(Expr::CompoundIdentifier(Ident::new("o"), Ident::new("user_id"))),
            op: BinaryOperator::Eq,
            right: Box::new(Expr::CompoundIdentifier(Ident::new("u"), Ident::new("age"))),
        };
        let method = choose_join_access(&catalog, "users", "u", &on);
        assert_eq!(method, JoinAccessMethod::NestedLoop);
    }
}
