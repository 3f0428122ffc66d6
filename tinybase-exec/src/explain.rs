//! `EXPLAIN` (C8, §4.8): reports the access method the executor would
//! choose for a `SELECT`, without reading or writing a single row. Reuses
//! [`crate::plan`]'s chooser functions directly so the plan can never
//! diverge from what `execute` actually does (§9 "EXPLAIN accuracy").

use tinybase_ast::{Expr, JoinKind, SelectItem, SelectStmt};
use tinybase_catalog::Catalog;
use tinybase_error::Error;

use crate::plan;
use crate::select::contains_aggregate;

/// One `JOIN`'s reported access method.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinPlan {
    /// The joined table's name.
    pub table: String,
    /// `INNER` or `LEFT`.
    pub kind: JoinKind,
    /// Whether an index probe replaces the naive inner scan.
    pub index_aware: bool,
    /// The index consulted, when `index_aware` is true.
    pub index_name: Option<String>,
    /// Human-readable rendering of the access method.
    pub access: String,
}

/// The structural plan for a `SELECT` (§4.8): statement kind, the access
/// method for each source, whether the query groups/aggregates, and the
/// presence of `ORDER BY`/`LIMIT`.
#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    /// Always `"SELECT"` — `EXPLAIN` only accepts a `SELECT` body.
    pub statement_kind: &'static str,
    /// The `FROM` table's name.
    pub from_table: String,
    /// Human-readable rendering of the `FROM` table's access method.
    pub from_access: String,
    /// One entry per `JOIN`, in clause order.
    pub joins: Vec<JoinPlan>,
    /// Whether the query groups and/or aggregates.
    pub grouping: bool,
    /// Every aggregate call appearing in the projection or `HAVING`,
    /// rendered as text (e.g. `"COUNT(*)"`).
    pub aggregates: Vec<String>,
    /// Each `ORDER BY` item, rendered as text.
    pub order_by: Vec<String>,
    /// The `LIMIT`, if any.
    pub limit: Option<u64>,
}

fn collect_aggregates_into(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Aggregate(func) => out.push(func.to_string()),
        Expr::Nested(e) => collect_aggregates_into(e, out),
        Expr::UnaryOp { expr, .. } => collect_aggregates_into(expr, out),
        Expr::BinaryOp { left, right, .. } => {
            collect_aggregates_into(left, out);
            collect_aggregates_into(right, out);
        }
        Expr::IsNull { expr, .. } => collect_aggregates_into(expr, out),
        Expr::InList { expr, list, .. } => {
            collect_aggregates_into(expr, out);
            for item in list {
                collect_aggregates_into(item, out);
            }
        }
        Expr::Literal(_) | Expr::Identifier(_) | Expr::CompoundIdentifier(_, _) | Expr::Wildcard => {}
    }
}

fn collect_aggregates(stmt: &SelectStmt) -> Vec<String> {
    let mut out = Vec::new();
    for item in &stmt.projection {
        if let SelectItem::Expr { expr, .. } = item {
            collect_aggregates_into(expr, &mut out);
        }
    }
    if let Some(having) = &stmt.having {
        collect_aggregates_into(having, &mut out);
    }
    out
}

/// Builds `stmt`'s plan (§4.8). Consults only catalog metadata: existence
/// of tables/columns/indexes, never a row, so it can never read row data
/// the executor hasn't read, and vice versa.
pub(crate) fn explain(catalog: &Catalog, stmt: &SelectStmt) -> Result<Plan, Error> {
    catalog.table(&stmt.from.name.value)?;
    let from_qualifier = stmt.from.qualifier().value.clone();
    let from_access_method = if stmt.joins.is_empty() {
        plan::choose_table_access(catalog, &stmt.from.name.value, &from_qualifier, stmt.selection.as_ref())
    } else {
        plan::AccessMethod::FullScan
    };

    let mut joins = Vec::with_capacity(stmt.joins.len());
    for join in &stmt.joins {
        catalog.table(&join.table.name.value)?;
        let right_qualifier = join.table.qualifier().value.clone();
        let method = plan::choose_join_access(catalog, &join.table.name.value, &right_qualifier, &join.on);
        let (index_aware, index_name) = match &method {
            plan::JoinAccessMethod::NestedLoop => (false, None),
            plan::JoinAccessMethod::IndexNestedLoop { index_name, .. } => (true, Some(index_name.clone())),
        };
        joins.push(JoinPlan {
            table: join.table.name.value.clone(),
            kind: join.kind,
            index_aware,
            index_name,
            access: method.to_string(),
        });
    }

    let grouping = !stmt.group_by.is_empty()
        || stmt
            .projection
            .iter()
            .any(|item| matches!(item, SelectItem::Expr { expr, .. } if contains_aggregate(expr)))
        || stmt.having.is_some();

    Ok(Plan {
        statement_kind: "SELECT",
        from_table: stmt.from.name.value.clone(),
        from_access: from_access_method.to_string(),
        joins,
        grouping,
        aggregates: collect_aggregates(stmt),
        order_by: stmt.order_by.iter().map(|item| item.to_string()).collect(),
        limit: stmt.limit,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tinybase_ast::{
        BinaryOperator, ColumnConstraint, ColumnDef, CreateTableStmt, DataType, Ident, Join, JoinKind, Literal,
        SelectItem, TableRef,
    };
    use tinybase_catalog::Catalog;

    use super::*;

    fn catalog_with_users_and_orders() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .create_table(&CreateTableStmt {
                name: Ident::new("users"),
                columns: vec![ColumnDef {
                    name: Ident::new("id"),
                    data_type: DataType::Integer,
                    constraints: vec![ColumnConstraint::PrimaryKey],
                }],
                constraints: vec![],
            })
            .unwrap();
        catalog
            .create_table(&CreateTableStmt {
                name: Ident::new("orders"),
                columns: vec![
                    ColumnDef {
                        name: Ident::new("id"),
                        data_type: DataType::Integer,
                        constraints: vec![ColumnConstraint::PrimaryKey],
                    },
                    ColumnDef {
                        name: Ident::new("user_id"),
                        data_type: DataType::Integer,
                        constraints: vec![],
                    },
                ],
                constraints: vec![],
            })
            .unwrap();
        catalog
    }

    #[test]
    fn reports_index_scan_for_an_indexed_equality() {
        let catalog = catalog_with_users_and_orders();
        let stmt = SelectStmt {
            projection: vec![SelectItem::Wildcard],
            from: TableRef {
                name: Ident::new("users"),
                alias: None,
            },
            joins: vec![],
            selection: Some(Expr::BinaryOp {
                left: Box::new(Expr::Identifier(Ident::new("id"))),
                op: BinaryOperator::Eq,
                right: Box::new(Expr::Literal(Literal::Integer(1))),
            }),
            group_by: vec![],
            having: None,
            order_by: vec![],
            limit: None,
        };
        let plan = explain(&catalog, &stmt).unwrap();
        assert!(plan.from_access.starts_with("index scan"));
    }

    #[test]
    fn reports_index_aware_join_on_indexed_foreign_key() {
        let catalog = catalog_with_users_and_orders();
        let stmt = SelectStmt {
            projection: vec![SelectItem::Wildcard],
            from: TableRef {
                name: Ident::new("orders"),
                alias: Some(Ident::new("o")),
            },
            joins: vec![Join {
                kind: JoinKind::Inner,
                table: TableRef {
                    name: Ident::new("users"),
                    alias: Some(Ident::new("u")),
                },
                on: Expr::BinaryOp {
                    left: Box::new(Expr::CompoundIdentifier(Ident::new("o"), Ident::new("user_id"))),
                    op: BinaryOperator::Eq,
                    right: Box::new(Expr::CompoundIdentifier(Ident::new("u"), Ident::new("id"))),
                },
            }],
            selection: None,
            group_by: vec![],
            having: None,
            order_by: vec![],
            limit: None,
        };
        let plan = explain(&catalog, &stmt).unwrap();
        assert_eq!(plan.from_access, "full scan");
        assert_eq!(plan.joins.len(), 1);
        assert!(plan.joins[0].index_aware);
        assert_eq!(plan.joins[0].index_name.as_deref(), Some("users_id_idx"));
    }

    #[test]
    fn unknown_from_table_is_an_error() {
        let catalog = catalog_with_users_and_orders();
        let stmt = SelectStmt {
            projection: vec![SelectItem::Wildcard],
            from: TableRef {
                name: Ident::new("missing"),
                alias: None,
            },
            joins: vec![],
            selection: None,
            group_by: vec![],
            having: None,
            order_by: vec![],
            limit: None,
        };
        assert!(explain(&catalog, &stmt).is_err());
    }
}
