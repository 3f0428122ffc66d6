//! `INSERT`, `UPDATE`, `DELETE` (§4.7).

use std::collections::HashMap;

use tinybase_ast::{DeleteStmt, Expr, Ident, InsertStmt, UpdateStmt};
use tinybase_catalog::{Catalog, Column, RowId};
use tinybase_error::Error;
use tinybase_storage::Storage;
use tinybase_types::Value;

use crate::eval::{self, ColumnSlot, NoColumnResolver, RowResolver, RowSchema};
use crate::plan;
use crate::result::ExecResult;

fn single_table_schema(table_name: &str, columns: &[Column]) -> RowSchema {
    RowSchema {
        columns: columns
            .iter()
            .map(|c| ColumnSlot {
                qualifier: table_name.to_string(),
                name: c.name.clone(),
            })
            .collect(),
    }
}

fn indexed_columns(catalog: &Catalog, table_name: &str, columns: &[Column]) -> Vec<(usize, String)> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, c)| catalog.index_for(table_name, &c.name).is_some())
        .map(|(i, c)| (i, c.name.clone()))
        .collect()
}

fn validate_row_types(columns: &[Column], values: &[Value]) -> Result<(), Error> {
    for (column, value) in columns.iter().zip(values) {
        if value.is_null() {
            if column.not_null {
                return Err(Error::NullViolation(column.name.clone()));
            }
        } else if !value.matches_type(&column.data_type) {
            return Err(Error::TypeMismatch(format!(
                "column '{}' expects {}, found {}",
                column.name,
                column.data_type,
                value.type_name()
            )));
        }
    }
    Ok(())
}

fn resolve_insert_row(
    columns: &[Column],
    explicit_columns: Option<&[Ident]>,
    exprs: &[Expr],
) -> Result<Vec<Value>, Error> {
    match explicit_columns {
        None => {
            if exprs.len() != columns.len() {
                return Err(Error::TypeMismatch(format!(
                    "expected {} values, found {}",
                    columns.len(),
                    exprs.len()
                )));
            }
            exprs.iter().map(|e| eval::eval(e, &NoColumnResolver)).collect()
        }
        Some(names) => {
            if exprs.len() != names.len() {
                return Err(Error::TypeMismatch(format!(
                    "expected {} values, found {}",
                    names.len(),
                    exprs.len()
                )));
            }
            let mut values = vec![Value::Null; columns.len()];
            let mut filled = vec![false; columns.len()];
            for (name, expr) in names.iter().zip(exprs) {
                let pos = columns
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(&name.value))
                    .ok_or_else(|| Error::UnknownColumn(name.value.clone()))?;
                if filled[pos] {
                    return Err(Error::TypeMismatch(format!(
                        "column '{}' specified more than once",
                        name.value
                    )));
                }
                values[pos] = eval::eval(expr, &NoColumnResolver)?;
                filled[pos] = true;
            }
            Ok(values)
        }
    }
}

/// Validates uniqueness/foreign-key constraints for a whole batch of new
/// rows before any of them is committed (§4.7 "All rows of a multi-row
/// insert commit or none do"). `seen` tracks values claimed earlier in
/// this same batch, since those haven't reached the real index yet.
fn validate_insert_batch(
    catalog: &Catalog,
    table_name: &str,
    columns: &[Column],
    rows: &[Vec<Value>],
) -> Result<(), Error> {
    let mut seen: HashMap<String, Vec<Value>> = HashMap::new();
    for row in rows {
        for (column, value) in columns.iter().zip(row) {
            if value.is_null() {
                continue;
            }
            if column.primary_key || column.unique {
                if let Some(index) = catalog.index_for(table_name, &column.name) {
                    if !index.point_lookup(value).is_empty() {
                        return Err(Error::UniqueViolation(column.name.clone(), value.to_string()));
                    }
                }
                let bucket = seen.entry(column.name.clone()).or_default();
                if bucket.iter().any(|v| v == value) {
                    return Err(Error::UniqueViolation(column.name.clone(), value.to_string()));
                }
                bucket.push(value.clone());
            }
            if let Some(fk) = &column.references {
                let satisfied = catalog
                    .index_for(&fk.table, &fk.column)
                    .map(|index| !index.point_lookup(value).is_empty())
                    .unwrap_or(false);
                if !satisfied {
                    return Err(Error::FKViolation {
                        table: table_name.to_string(),
                        column: column.name.clone(),
                        ref_table: fk.table.clone(),
                        ref_column: fk.column.clone(),
                        value: value.to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// `INSERT INTO ...` (§4.7 steps a-g).
pub(crate) fn insert(catalog: &mut Catalog, storage: &Storage, stmt: &InsertStmt) -> Result<ExecResult, Error> {
    let table_name = stmt.table.value.clone();
    let columns = catalog.table(&table_name)?.columns().to_vec();

    let mut resolved_rows = Vec::with_capacity(stmt.rows.len());
    for row_exprs in &stmt.rows {
        let values = resolve_insert_row(&columns, stmt.columns.as_deref(), row_exprs)?;
        validate_row_types(&columns, &values)?;
        resolved_rows.push(values);
    }
    validate_insert_batch(catalog, &table_name, &columns, &resolved_rows)?;

    let indexed = indexed_columns(catalog, &table_name, &columns);
    for values in &resolved_rows {
        let row_id = storage.append_row(catalog, &table_name, values.clone())?;
        for (pos, column_name) in &indexed {
            let value = &values[*pos];
            if !value.is_null() {
                catalog
                    .index_for_mut(&table_name, column_name)
                    .expect("index presence checked above")
                    .insert(value.clone(), row_id, column_name)?;
            }
        }
    }

    log::debug!("inserted {} row(s) into '{}'", resolved_rows.len(), table_name);
    Ok(ExecResult::RowsAffected(resolved_rows.len()))
}

/// Validates uniqueness/foreign-key constraints for a batch of row
/// mutations, allowing a row to keep its own current unique value (§4.7
/// "accounting for the row's current values").
fn validate_update_batch(
    catalog: &Catalog,
    table_name: &str,
    columns: &[Column],
    targets: &[(RowId, Vec<Value>)],
) -> Result<(), Error> {
    let mut seen: HashMap<String, Vec<(Value, RowId)>> = HashMap::new();
    for (row_id, new_values) in targets {
        for (column, value) in columns.iter().zip(new_values) {
            if value.is_null() {
                continue;
            }
            if column.primary_key || column.unique {
                if let Some(index) = catalog.index_for(table_name, &column.name) {
                    let conflict = index.point_lookup(value).iter().any(|id| id != row_id);
                    if conflict {
                        return Err(Error::UniqueViolation(column.name.clone(), value.to_string()));
                    }
                }
                let bucket = seen.entry(column.name.clone()).or_default();
                if bucket.iter().any(|(v, id)| v == value && id != row_id) {
                    return Err(Error::UniqueViolation(column.name.clone(), value.to_string()));
                }
                bucket.push((value.clone(), *row_id));
            }
            if let Some(fk) = &column.references {
                let satisfied = catalog
                    .index_for(&fk.table, &fk.column)
                    .map(|index| !index.point_lookup(value).is_empty())
                    .unwrap_or(false);
                if !satisfied {
                    return Err(Error::FKViolation {
                        table: table_name.to_string(),
                        column: column.name.clone(),
                        ref_table: fk.table.clone(),
                        ref_column: fk.column.clone(),
                        value: value.to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// `UPDATE ... SET ... [WHERE ...]` (§4.7).
pub(crate) fn update(catalog: &mut Catalog, storage: &Storage, stmt: &UpdateStmt) -> Result<ExecResult, Error> {
    let table_name = stmt.table.value.clone();
    let columns = catalog.table(&table_name)?.columns().to_vec();
    let schema = single_table_schema(&table_name, &columns);

    let method = plan::choose_table_access(catalog, &table_name, &table_name, stmt.selection.as_ref());
    let candidates = plan::scan_row_ids(catalog, &table_name, &method);

    let mut targets: Vec<(RowId, Vec<Value>)> = Vec::new();
    {
        let table = catalog.table(&table_name)?;
        for row_id in candidates {
            let row = table.row(row_id).expect("candidate id came from this table's scan");
            if let Some(selection) = &stmt.selection {
                let resolver = RowResolver {
                    schema: &schema,
                    row: &row.values,
                };
                if !eval::eval(selection, &resolver)?.is_truthy() {
                    continue;
                }
            }
            let resolver = RowResolver {
                schema: &schema,
                row: &row.values,
            };
            let mut new_values = row.values.clone();
            for assignment in &stmt.assignments {
                let pos = columns
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(&assignment.column.value))
                    .ok_or_else(|| Error::UnknownColumn(assignment.column.value.clone()))?;
                new_values[pos] = eval::eval(&assignment.value, &resolver)?;
            }
            validate_row_types(&columns, &new_values)?;
            targets.push((row_id, new_values));
        }
    }

    validate_update_batch(catalog, &table_name, &columns, &targets)?;

    let indexed = indexed_columns(catalog, &table_name, &columns);
    let affected = targets.len();
    for (row_id, new_values) in targets {
        let old_values = catalog
            .table(&table_name)?
            .row(row_id)
            .expect("row still present")
            .values
            .clone();
        storage.mutate_row(catalog, &table_name, row_id, new_values.clone())?;
        for (pos, column_name) in &indexed {
            let old_value = &old_values[*pos];
            let new_value = &new_values[*pos];
            if old_value == new_value {
                continue;
            }
            if !old_value.is_null() {
                catalog
                    .index_for_mut(&table_name, column_name)
                    .expect("index presence checked above")
                    .remove(old_value, row_id);
            }
            if !new_value.is_null() {
                catalog
                    .index_for_mut(&table_name, column_name)
                    .expect("index presence checked above")
                    .insert(new_value.clone(), row_id, column_name)?;
            }
        }
    }

    log::debug!("updated {} row(s) in '{}'", affected, table_name);
    Ok(ExecResult::RowsAffected(affected))
}

/// Whether any surviving row of `table` holds `value` in `column`, used as
/// the DELETE referential check's fallback when that column has no index
/// to probe (§4.7 "DELETE").
fn table_references_value(catalog: &Catalog, table: &str, column: &str, value: &Value) -> Result<bool, Error> {
    let t = catalog.table(table)?;
    let pos = t
        .column_position(column)
        .ok_or_else(|| Error::UnknownColumn(column.to_string()))?;
    Ok(t.rows().iter().any(|row| &row.values[pos] == value))
}

/// `DELETE FROM ... [WHERE ...]` (§4.7).
pub(crate) fn delete(catalog: &mut Catalog, storage: &Storage, stmt: &DeleteStmt) -> Result<ExecResult, Error> {
    let table_name = stmt.table.value.clone();
    let columns = catalog.table(&table_name)?.columns().to_vec();
    let schema = single_table_schema(&table_name, &columns);

    let method = plan::choose_table_access(catalog, &table_name, &table_name, stmt.selection.as_ref());
    let candidates = plan::scan_row_ids(catalog, &table_name, &method);

    let mut targets: Vec<RowId> = Vec::new();
    {
        let table = catalog.table(&table_name)?;
        for row_id in candidates {
            let row = table.row(row_id).expect("candidate id came from this table's scan");
            if let Some(selection) = &stmt.selection {
                let resolver = RowResolver {
                    schema: &schema,
                    row: &row.values,
                };
                if !eval::eval(selection, &resolver)?.is_truthy() {
                    continue;
                }
            }
            targets.push(row_id);
        }
    }

    // Referential check over the whole batch before any row is removed
    // (§4.7 "DELETE"): no other table may still hold a foreign key onto a
    // unique/primary-key value this statement is about to delete.
    for &row_id in &targets {
        let row = catalog.table(&table_name)?.row(row_id).expect("row still present");
        for (pos, column) in columns.iter().enumerate() {
            if !(column.primary_key || column.unique) {
                continue;
            }
            let value = &row.values[pos];
            if value.is_null() {
                continue;
            }
            for (ref_table, ref_column) in catalog.referencing_columns(&table_name, &column.name) {
                let referenced = match catalog.index_for(ref_table, ref_column) {
                    // A foreign-key column is only indexed when it's also
                    // PRIMARY KEY/UNIQUE, which it normally isn't — fall back
                    // to a row scan rather than treating "no index" as "no
                    // references" (§4.7 "DELETE").
                    Some(index) => !index.point_lookup(value).is_empty(),
                    None => table_references_value(catalog, ref_table, ref_column, value)?,
                };
                if referenced {
                    return Err(Error::RefusedDelete {
                        table: table_name.clone(),
                        referencing_table: ref_table.clone(),
                        referencing_column: ref_column.clone(),
                    });
                }
            }
        }
    }

    let indexed = indexed_columns(catalog, &table_name, &columns);
    let affected = targets.len();
    for row_id in targets {
        let old_values = catalog
            .table(&table_name)?
            .row(row_id)
            .expect("row still present")
            .values
            .clone();
        storage.remove_row(catalog, &table_name, row_id)?;
        for (pos, column_name) in &indexed {
            let value = &old_values[*pos];
            if !value.is_null() {
                catalog
                    .index_for_mut(&table_name, column_name)
                    .expect("index presence checked above")
                    .remove(value, row_id);
            }
        }
    }

    log::debug!("deleted {} row(s) from '{}'", affected, table_name);
    Ok(ExecResult::RowsAffected(affected))
}
