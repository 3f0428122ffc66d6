//! `SELECT` (§4.7 step 1-9): source resolution, joins, filtering,
//! grouping/aggregation, HAVING, ORDER BY, LIMIT, projection.

use std::cmp::Ordering;
use std::collections::HashSet;

use tinybase_ast::{AggregateFunc, Expr, Ident, JoinKind, OrderByItem, SelectItem, SelectStmt};
use tinybase_catalog::Catalog;
use tinybase_error::Error;
use tinybase_types::Value;

use crate::eval::{self, ColumnSlot, Resolver, RowResolver, RowSchema};
use crate::plan;
use crate::result::ResultSet;

/// Whether `expr` contains an aggregate call anywhere in its tree (not
/// just at the top level, unlike [`Expr::is_aggregate`]) — used both to
/// decide whether a query without `GROUP BY` is nonetheless a one-group
/// aggregate query, and by EXPLAIN to report the same thing.
pub(crate) fn contains_aggregate(expr: &Expr) -> bool {
    match expr {
        Expr::Aggregate(_) => true,
        Expr::Nested(e) => contains_aggregate(e),
        Expr::UnaryOp { expr, .. } => contains_aggregate(expr),
        Expr::BinaryOp { left, right, .. } => contains_aggregate(left) || contains_aggregate(right),
        Expr::IsNull { expr, .. } => contains_aggregate(expr),
        Expr::InList { expr, list, .. } => {
            contains_aggregate(expr) || list.iter().any(contains_aggregate)
        }
        Expr::Literal(_) | Expr::Identifier(_) | Expr::CompoundIdentifier(_, _) | Expr::Wildcard => false,
    }
}

fn grouping_is_active(stmt: &SelectStmt) -> bool {
    !stmt.group_by.is_empty()
        || stmt
            .projection
            .iter()
            .any(|item| matches!(item, SelectItem::Expr { expr, .. } if contains_aggregate(expr)))
        || stmt.having.is_some()
}

/// Builds the flat schema and row stream from the `FROM` table and its
/// `JOIN`s (§4.7 steps 1-2).
fn build_source_rows(catalog: &Catalog, stmt: &SelectStmt) -> Result<(RowSchema, Vec<Vec<Value>>), Error> {
    let from_table_name = stmt.from.name.value.clone();
    let from_qualifier = stmt.from.qualifier().value.clone();
    let from_columns = catalog.table(&from_table_name)?.columns().to_vec();

    let mut schema = RowSchema {
        columns: from_columns
            .iter()
            .map(|c| ColumnSlot {
                qualifier: from_qualifier.clone(),
                name: c.name.clone(),
            })
            .collect(),
    };

    let mut rows: Vec<Vec<Value>> = if stmt.joins.is_empty() {
        // Index-aware WHERE scan only applies to a single-table FROM
        // (§4.7 step 3).
        let method = plan::choose_table_access(catalog, &from_table_name, &from_qualifier, stmt.selection.as_ref());
        log::debug!("access method for '{}': {}", from_table_name, method);
        let row_ids = plan::scan_row_ids(catalog, &from_table_name, &method);
        let table = catalog.table(&from_table_name)?;
        row_ids
            .iter()
            .map(|&id| table.row(id).expect("scan result row exists").values.clone())
            .collect()
    } else {
        log::debug!("access method for '{}': full scan (joined query)", from_table_name);
        catalog
            .table(&from_table_name)?
            .rows()
            .iter()
            .map(|r| r.values.clone())
            .collect()
    };
    log::trace!("source '{}' yielded {} row(s)", from_table_name, rows.len());

    for join in &stmt.joins {
        let right_table_name = join.table.name.value.clone();
        let right_qualifier = join.table.qualifier().value.clone();
        let right_table = catalog.table(&right_table_name)?;
        let right_columns = right_table.columns().to_vec();

        let join_method = plan::choose_join_access(catalog, &right_table_name, &right_qualifier, &join.on);
        log::debug!("join access method for '{}': {}", right_table_name, join_method);

        let combined_schema = RowSchema {
            columns: schema
                .columns
                .iter()
                .cloned()
                .chain(right_columns.iter().map(|c| ColumnSlot {
                    qualifier: right_qualifier.clone(),
                    name: c.name.clone(),
                }))
                .collect(),
        };

        let mut joined_rows = Vec::new();
        for left_row in &rows {
            let mut matched_any = false;
            let candidates: Vec<&Vec<Value>> = match &join_method {
                plan::JoinAccessMethod::NestedLoop => right_table.rows().iter().map(|r| &r.values).collect(),
                plan::JoinAccessMethod::IndexNestedLoop {
                    right_column, left_key, ..
                } => {
                    let left_resolver = RowResolver {
                        schema: &schema,
                        row: left_row,
                    };
                    let key = eval::eval(left_key, &left_resolver)?;
                    if key.is_null() {
                        Vec::new()
                    } else if let Some(index) = catalog.index_for(&right_table_name, right_column) {
                        index
                            .point_lookup(&key)
                            .iter()
                            .filter_map(|&id| right_table.row(id))
                            .map(|r| &r.values)
                            .collect()
                    } else {
                        Vec::new()
                    }
                }
            };

            for right_values in candidates {
                let mut combined = left_row.clone();
                combined.extend(right_values.iter().cloned());
                let resolver = RowResolver {
                    schema: &combined_schema,
                    row: &combined,
                };
                if eval::eval(&join.on, &resolver)?.is_truthy() {
                    matched_any = true;
                    joined_rows.push(combined);
                }
            }

            if !matched_any && join.kind == JoinKind::Left {
                let mut combined = left_row.clone();
                combined.extend(std::iter::repeat(Value::Null).take(right_columns.len()));
                joined_rows.push(combined);
            }
        }

        rows = joined_rows;
        schema = combined_schema;
        log::trace!("after join with '{}': {} row(s)", right_table_name, rows.len());
    }

    Ok((schema, rows))
}

/// `WHERE`, applied to the joined row stream (§4.7 step 3). When the
/// source scan already narrowed candidates via an index probe this is a
/// safety filter re-evaluating the full predicate; it is never skipped.
fn apply_where(schema: &RowSchema, rows: Vec<Vec<Value>>, selection: Option<&Expr>) -> Result<Vec<Vec<Value>>, Error> {
    let Some(selection) = selection else {
        return Ok(rows);
    };
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let resolver = RowResolver { schema, row: &row };
        if eval::eval(selection, &resolver)?.is_truthy() {
            out.push(row);
        }
    }
    Ok(out)
}

fn group_by_names(group_by: &[Ident]) -> HashSet<String> {
    group_by.iter().map(|i| i.value.to_lowercase()).collect()
}

/// Walks `expr`, erroring on any bare column reference that isn't in
/// `allowed` (§4.7 step 5, §9 "Open question": enforced at plan time).
/// `Expr::Aggregate` subtrees are opaque — their argument is never
/// checked, since an aggregate collapses many rows into one value
/// regardless of which columns it reads.
fn check_non_aggregate_refs(expr: &Expr, allowed: &HashSet<String>) -> Result<(), Error> {
    match expr {
        Expr::Aggregate(_) | Expr::Literal(_) | Expr::Wildcard => Ok(()),
        Expr::Identifier(ident) | Expr::CompoundIdentifier(_, ident) => {
            if allowed.contains(&ident.value.to_lowercase()) {
                Ok(())
            } else {
                Err(Error::AggregateMisuse(format!(
                    "column '{}' must appear in GROUP BY or be used inside an aggregate",
                    ident.value
                )))
            }
        }
        Expr::Nested(e) | Expr::UnaryOp { expr: e, .. } => check_non_aggregate_refs(e, allowed),
        Expr::BinaryOp { left, right, .. } => {
            check_non_aggregate_refs(left, allowed)?;
            check_non_aggregate_refs(right, allowed)
        }
        Expr::IsNull { expr, .. } => check_non_aggregate_refs(expr, allowed),
        Expr::InList { expr, list, .. } => {
            check_non_aggregate_refs(expr, allowed)?;
            for item in list {
                check_non_aggregate_refs(item, allowed)?;
            }
            Ok(())
        }
    }
}

fn validate_aggregate_usage(stmt: &SelectStmt) -> Result<(), Error> {
    let allowed = group_by_names(&stmt.group_by);
    for item in &stmt.projection {
        match item {
            SelectItem::Wildcard => {
                return Err(Error::AggregateMisuse(
                    "'*' cannot be used with GROUP BY or aggregate functions".to_string(),
                ))
            }
            SelectItem::Expr { expr, .. } => check_non_aggregate_refs(expr, &allowed)?,
        }
    }
    if let Some(having) = &stmt.having {
        check_non_aggregate_refs(having, &allowed)?;
    }
    Ok(())
}

/// Partitions `rows` by the tuple of `group_by_positions` values,
/// preserving first-occurrence order (§4.7 step 4). An empty
/// `group_by_positions` always yields exactly one group — even over zero
/// rows — so the aggregate emptiness law (§8) can apply.
fn build_groups(rows: &[Vec<Value>], group_by_positions: &[usize]) -> Vec<(Vec<Value>, Vec<Vec<Value>>)> {
    if group_by_positions.is_empty() {
        return vec![(Vec::new(), rows.to_vec())];
    }
    let mut groups: Vec<(Vec<Value>, Vec<Vec<Value>>)> = Vec::new();
    for row in rows {
        let key: Vec<Value> = group_by_positions.iter().map(|&p| row[p].clone()).collect();
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some(group) => group.1.push(row.clone()),
            None => groups.push((key, vec![row.clone()])),
        }
    }
    groups
}

/// Computes one aggregate function's value over a group's member rows
/// (§4.7 step 5). `COUNT(*)` counts rows; every other aggregate skips
/// `NULL` evaluations of its argument.
pub(crate) fn compute_aggregate(func: &AggregateFunc, schema: &RowSchema, rows: &[Vec<Value>]) -> Result<Value, Error> {
    match func {
        AggregateFunc::CountStar => Ok(Value::Integer(rows.len() as i64)),
        AggregateFunc::Count(expr) => {
            let mut count = 0i64;
            for row in rows {
                let resolver = RowResolver { schema, row };
                if !eval::eval(expr, &resolver)?.is_null() {
                    count += 1;
                }
            }
            Ok(Value::Integer(count))
        }
        AggregateFunc::Sum(expr) => {
            let mut sum_i: i64 = 0;
            let mut sum_f: f64 = 0.0;
            let mut is_float = false;
            let mut any = false;
            for row in rows {
                let resolver = RowResolver { schema, row };
                let value = eval::eval(expr, &resolver)?;
                if value.is_null() {
                    continue;
                }
                any = true;
                match value {
                    Value::Integer(i) => {
                        if is_float {
                            sum_f += i as f64;
                        } else {
                            sum_i += i;
                        }
                    }
                    Value::Float(f) => {
                        if !is_float {
                            sum_f = sum_i as f64;
                            is_float = true;
                        }
                        sum_f += f;
                    }
                    other => {
                        return Err(Error::TypeMismatch(format!(
                            "SUM requires a numeric operand, found {}",
                            other.type_name()
                        )))
                    }
                }
            }
            if !any {
                return Ok(Value::Null);
            }
            Ok(if is_float { Value::Float(sum_f) } else { Value::Integer(sum_i) })
        }
        AggregateFunc::Avg(expr) => {
            let mut sum = 0.0f64;
            let mut count = 0usize;
            for row in rows {
                let resolver = RowResolver { schema, row };
                let value = eval::eval(expr, &resolver)?;
                if value.is_null() {
                    continue;
                }
                let n = match value {
                    Value::Integer(i) => i as f64,
                    Value::Float(f) => f,
                    other => {
                        return Err(Error::TypeMismatch(format!(
                            "AVG requires a numeric operand, found {}",
                            other.type_name()
                        )))
                    }
                };
                sum += n;
                count += 1;
            }
            if count == 0 {
                return Ok(Value::Null);
            }
            Ok(Value::Float(sum / count as f64))
        }
        AggregateFunc::Min(expr) | AggregateFunc::Max(expr) => {
            let is_max = matches!(func, AggregateFunc::Max(_));
            let mut best: Option<Value> = None;
            for row in rows {
                let resolver = RowResolver { schema, row };
                let value = eval::eval(expr, &resolver)?;
                if value.is_null() {
                    continue;
                }
                best = match best {
                    None => Some(value),
                    Some(current) => {
                        let ordering = current.compare(&value)?.unwrap_or(Ordering::Equal);
                        if (is_max && ordering == Ordering::Less) || (!is_max && ordering == Ordering::Greater) {
                            Some(value)
                        } else {
                            Some(current)
                        }
                    }
                };
            }
            Ok(best.unwrap_or(Value::Null))
        }
    }
}

/// Evaluates columns and aggregates at group granularity: a bare column
/// must be one of the `GROUP BY` columns (validated earlier), resolved
/// from the group key; an aggregate is computed over the group's rows.
struct GroupResolver<'a> {
    schema: &'a RowSchema,
    rows: &'a [Vec<Value>],
    group_by_positions: &'a [usize],
    key: &'a [Value],
}

impl Resolver for GroupResolver<'_> {
    fn column(&self, qualifier: Option<&str>, name: &str) -> Result<Value, Error> {
        let pos = self.schema.resolve(qualifier, name)?;
        if let Some(idx) = self.group_by_positions.iter().position(|&p| p == pos) {
            Ok(self.key[idx].clone())
        } else {
            Ok(self.rows.first().map(|r| r[pos].clone()).unwrap_or(Value::Null))
        }
    }

    fn aggregate(&self, func: &AggregateFunc) -> Result<Value, Error> {
        compute_aggregate(func, self.schema, self.rows)
    }
}

fn order_cmp(a: &Value, b: &Value, desc: bool) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => {
            if desc {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (false, true) => {
            if desc {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (false, false) => {
            let ordering = a.compare(b).ok().flatten().unwrap_or(Ordering::Equal);
            if desc {
                ordering.reverse()
            } else {
                ordering
            }
        }
    }
}

/// Stable sort by the `ORDER BY` items, then `LIMIT` truncation (§4.7
/// steps 7-8). `rows` pairs each output row with its precomputed sort key.
fn apply_order_and_limit(mut rows: Vec<(Vec<Value>, Vec<Value>)>, order_by: &[OrderByItem], limit: Option<u64>) -> Vec<Vec<Value>> {
    if !order_by.is_empty() {
        rows.sort_by(|a, b| {
            for (idx, item) in order_by.iter().enumerate() {
                let ordering = order_cmp(&a.1[idx], &b.1[idx], item.desc);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }
    let mut out: Vec<Vec<Value>> = rows.into_iter().map(|(row, _)| row).collect();
    if let Some(limit) = limit {
        out.truncate(limit as usize);
    }
    out
}

fn ungrouped_output_columns(schema: &RowSchema, projection: &[SelectItem]) -> Vec<String> {
    let mut columns = Vec::new();
    for item in projection {
        match item {
            SelectItem::Wildcard => columns.extend(schema.columns.iter().map(|c| c.name.clone())),
            SelectItem::Expr { expr, alias } => {
                columns.push(alias.as_ref().map(|a| a.value.clone()).unwrap_or_else(|| expr.to_string()))
            }
        }
    }
    columns
}

fn grouped_output_columns(projection: &[SelectItem]) -> Vec<String> {
    projection
        .iter()
        .map(|item| match item {
            SelectItem::Wildcard => unreachable!("rejected by validate_aggregate_usage"),
            SelectItem::Expr { expr, alias } => alias.as_ref().map(|a| a.value.clone()).unwrap_or_else(|| expr.to_string()),
        })
        .collect()
}

/// Runs the full `SELECT` pipeline (§4.7).
pub(crate) fn select(catalog: &Catalog, stmt: &SelectStmt) -> Result<ResultSet, Error> {
    let (schema, source_rows) = build_source_rows(catalog, stmt)?;
    let rows = apply_where(&schema, source_rows, stmt.selection.as_ref())?;
    log::trace!("after WHERE filter: {} row(s)", rows.len());

    let order_exprs: Vec<&Expr> = stmt.order_by.iter().map(|o| &o.expr).collect();

    if grouping_is_active(stmt) {
        validate_aggregate_usage(stmt)?;

        let group_by_positions: Vec<usize> = stmt
            .group_by
            .iter()
            .map(|ident| schema.resolve(None, &ident.value))
            .collect::<Result<_, _>>()?;
        let groups = build_groups(&rows, &group_by_positions);
        log::trace!("grouped into {} group(s)", groups.len());

        let columns = grouped_output_columns(&stmt.projection);
        let mut output_rows: Vec<(Vec<Value>, Vec<Value>)> = Vec::with_capacity(groups.len());
        for (key, member_rows) in &groups {
            let resolver = GroupResolver {
                schema: &schema,
                rows: member_rows,
                group_by_positions: &group_by_positions,
                key,
            };
            if let Some(having) = &stmt.having {
                if !eval::eval(having, &resolver)?.is_truthy() {
                    continue;
                }
            }
            let mut out_row = Vec::with_capacity(stmt.projection.len());
            for item in &stmt.projection {
                match item {
                    SelectItem::Wildcard => unreachable!("rejected by validate_aggregate_usage"),
                    SelectItem::Expr { expr, .. } => out_row.push(eval::eval(expr, &resolver)?),
                }
            }
            let order_key: Vec<Value> = order_exprs
                .iter()
                .map(|expr| eval::eval(expr, &resolver))
                .collect::<Result<_, _>>()?;
            output_rows.push((out_row, order_key));
        }

        let rows = apply_order_and_limit(output_rows, &stmt.order_by, stmt.limit);
        Ok(ResultSet { columns, rows })
    } else {
        let columns = ungrouped_output_columns(&schema, &stmt.projection);
        let mut output_rows: Vec<(Vec<Value>, Vec<Value>)> = Vec::with_capacity(rows.len());
        for row in &rows {
            let resolver = RowResolver { schema: &schema, row };
            let mut out_row = Vec::new();
            for item in &stmt.projection {
                match item {
                    SelectItem::Wildcard => out_row.extend(row.iter().cloned()),
                    SelectItem::Expr { expr, .. } => out_row.push(eval::eval(expr, &resolver)?),
                }
            }
            let order_key: Vec<Value> = order_exprs
                .iter()
                .map(|expr| eval::eval(expr, &resolver))
                .collect::<Result<_, _>>()?;
            output_rows.push((out_row, order_key));
        }

        let rows = apply_order_and_limit(output_rows, &stmt.order_by, stmt.limit);
        Ok(ResultSet { columns, rows })
    }
}
