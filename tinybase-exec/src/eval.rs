//! The expression evaluator (C6): resolves column references against a
//! row schema and folds an [`Expr`] tree down to a single [`Value`], per
//! §4.3's three-valued rules.

use std::cmp::Ordering;

use tinybase_ast::{AggregateFunc, BinaryOperator, Expr, UnaryOperator};
use tinybase_error::Error;
use tinybase_types::Value;

/// One column available at some stage of the pipeline: the qualifier
/// (table alias or name) rows are addressed by, and the column's own name.
#[derive(Clone, Debug)]
pub(crate) struct ColumnSlot {
    pub(crate) qualifier: String,
    pub(crate) name: String,
}

/// The flat layout of a row at some pipeline stage (§4.7 step 1: "Columns
/// in later stages are referenced either bare ... or qualified"). Rows
/// themselves are plain `Vec<Value>`, positional against this schema.
#[derive(Clone, Debug, Default)]
pub(crate) struct RowSchema {
    pub(crate) columns: Vec<ColumnSlot>,
}

impl RowSchema {
    pub(crate) fn resolve(&self, qualifier: Option<&str>, name: &str) -> Result<usize, Error> {
        let mut found = None;
        for (i, col) in self.columns.iter().enumerate() {
            let qualifier_matches = qualifier.map_or(true, |q| q.eq_ignore_ascii_case(&col.qualifier));
            if qualifier_matches && col.name.eq_ignore_ascii_case(name) {
                if found.is_some() {
                    return Err(Error::AmbiguousColumn(name.to_string()));
                }
                found = Some(i);
            }
        }
        found.ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }
}

/// Supplies the two things [`eval`] cannot determine on its own: a column
/// reference's value, and (only in grouped contexts) an aggregate's
/// precomputed value. Per-row evaluation (WHERE, ON, assignments, INSERT
/// values) and group-level evaluation (projection/HAVING/ORDER BY of a
/// grouped query) share the same `eval` by implementing this differently.
pub(crate) trait Resolver {
    fn column(&self, qualifier: Option<&str>, name: &str) -> Result<Value, Error>;
    fn aggregate(&self, func: &AggregateFunc) -> Result<Value, Error>;
}

/// A resolver over one flat row and its schema; used everywhere aggregates
/// are not syntactically allowed (WHERE, ON, SET, INSERT VALUES).
pub(crate) struct RowResolver<'a> {
    pub(crate) schema: &'a RowSchema,
    pub(crate) row: &'a [Value],
}

impl Resolver for RowResolver<'_> {
    fn column(&self, qualifier: Option<&str>, name: &str) -> Result<Value, Error> {
        let pos = self.schema.resolve(qualifier, name)?;
        Ok(self.row[pos].clone())
    }

    fn aggregate(&self, _func: &AggregateFunc) -> Result<Value, Error> {
        Err(Error::AggregateMisuse(
            "aggregate functions are not allowed here".to_string(),
        ))
    }
}

/// A resolver with no row at all, for literal-only contexts (plain INSERT
/// VALUES tuples with no FROM in scope).
pub(crate) struct NoColumnResolver;

impl Resolver for NoColumnResolver {
    fn column(&self, _qualifier: Option<&str>, name: &str) -> Result<Value, Error> {
        Err(Error::UnknownColumn(name.to_string()))
    }

    fn aggregate(&self, _func: &AggregateFunc) -> Result<Value, Error> {
        Err(Error::AggregateMisuse(
            "aggregate functions are not allowed here".to_string(),
        ))
    }
}

/// Evaluates `expr` against whatever `resolver` supplies for columns and
/// aggregates (§4.3, §9 "Dynamic values").
pub(crate) fn eval(expr: &Expr, resolver: &dyn Resolver) -> Result<Value, Error> {
    match expr {
        Expr::Literal(lit) => Value::from_literal(lit),
        Expr::Identifier(ident) => resolver.column(None, &ident.value),
        Expr::CompoundIdentifier(qualifier, ident) => {
            resolver.column(Some(&qualifier.value), &ident.value)
        }
        Expr::Wildcard => Err(Error::TypeMismatch("'*' is not a scalar expression".to_string())),
        Expr::Nested(inner) => eval(inner, resolver),
        Expr::UnaryOp { op, expr } => {
            let v = eval(expr, resolver)?;
            match op {
                UnaryOperator::Minus => v.neg(),
                UnaryOperator::Not => v.not(),
            }
        }
        Expr::BinaryOp { left, op, right } => eval_binary(left, *op, right, resolver),
        Expr::IsNull { expr, negated } => {
            let v = eval(expr, resolver)?;
            Ok(Value::Boolean(v.is_null() != *negated))
        }
        Expr::InList { expr, list, negated } => {
            let v = eval(expr, resolver)?;
            eval_in_list(&v, list, *negated, resolver)
        }
        Expr::Aggregate(func) => resolver.aggregate(func),
    }
}

fn eval_binary(
    left: &Expr,
    op: BinaryOperator,
    right: &Expr,
    resolver: &dyn Resolver,
) -> Result<Value, Error> {
    // AND/OR short-circuit per their three-valued truth tables: a known
    // `FALSE`/`TRUE` on one side fixes the result without evaluating the
    // other (§4.3), which also lets `a IS NOT NULL AND b > 1 / a` style
    // guards work without a spurious division error.
    if op == BinaryOperator::And {
        let l = eval(left, resolver)?;
        if l == Value::Boolean(false) {
            return Ok(Value::Boolean(false));
        }
        return l.and(&eval(right, resolver)?);
    }
    if op == BinaryOperator::Or {
        let l = eval(left, resolver)?;
        if l == Value::Boolean(true) {
            return Ok(Value::Boolean(true));
        }
        return l.or(&eval(right, resolver)?);
    }

    let l = eval(left, resolver)?;
    let r = eval(right, resolver)?;
    match op {
        BinaryOperator::Plus => l.add(&r),
        BinaryOperator::Minus => l.sub(&r),
        BinaryOperator::Multiply => l.mul(&r),
        BinaryOperator::Divide => l.div(&r),
        BinaryOperator::Like => eval_like(&l, &r),
        _ if op.is_comparison() => eval_comparison(&l, op, &r),
        BinaryOperator::And | BinaryOperator::Or => unreachable!("handled above"),
    }
}

fn eval_comparison(l: &Value, op: BinaryOperator, r: &Value) -> Result<Value, Error> {
    let ordering = match l.compare(r)? {
        None => return Ok(Value::Null),
        Some(ordering) => ordering,
    };
    let result = match op {
        BinaryOperator::Eq => ordering == Ordering::Equal,
        BinaryOperator::NotEq => ordering != Ordering::Equal,
        BinaryOperator::Lt => ordering == Ordering::Less,
        BinaryOperator::LtEq => ordering != Ordering::Greater,
        BinaryOperator::Gt => ordering == Ordering::Greater,
        BinaryOperator::GtEq => ordering != Ordering::Less,
        _ => unreachable!("caller only dispatches comparison operators here"),
    };
    Ok(Value::Boolean(result))
}

fn eval_in_list(
    v: &Value,
    list: &[Expr],
    negated: bool,
    resolver: &dyn Resolver,
) -> Result<Value, Error> {
    if v.is_null() {
        return Ok(Value::Null);
    }
    let mut saw_null = false;
    for candidate in list {
        let c = eval(candidate, resolver)?;
        match v.compare(&c)? {
            Some(Ordering::Equal) => return Ok(Value::Boolean(!negated)),
            None => saw_null = true,
            _ => {}
        }
    }
    if saw_null {
        Ok(Value::Null)
    } else {
        Ok(Value::Boolean(negated))
    }
}

fn eval_like(l: &Value, r: &Value) -> Result<Value, Error> {
    if l.is_null() || r.is_null() {
        return Ok(Value::Null);
    }
    match (l, r) {
        (Value::Text(text), Value::Text(pattern)) => Ok(Value::Boolean(like_match(text, pattern))),
        _ => Err(Error::TypeMismatch(format!(
            "LIKE requires TEXT operands, found {} and {}",
            l.type_name(),
            r.type_name()
        ))),
    }
}

/// `%` matches any run of characters (including none); `_` matches exactly
/// one character. No escape-character syntax (§9 Open question).
pub(crate) fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    like_match_from(&text, &pattern)
}

fn like_match_from(text: &[char], pattern: &[char]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some('%') => {
            like_match_from(text, &pattern[1..])
                || (!text.is_empty() && like_match_from(&text[1..], pattern))
        }
        Some('_') => !text.is_empty() && like_match_from(&text[1..], &pattern[1..]),
        Some(c) => text.first() == Some(c) && like_match_from(&text[1..], &pattern[1..]),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use tinybase_ast::Literal;

    struct EmptyResolver;
    impl Resolver for EmptyResolver {
        fn column(&self, _qualifier: Option<&str>, name: &str) -> Result<Value, Error> {
            Err(Error::UnknownColumn(name.to_string()))
        }
        fn aggregate(&self, _func: &AggregateFunc) -> Result<Value, Error> {
            unreachable!()
        }
    }

    fn lit(v: i64) -> Expr {
        Expr::Literal(Literal::Integer(v))
    }

    #[test]
    fn arithmetic_widens_to_float() {
        let expr = Expr::BinaryOp {
            left: Box::new(lit(1)),
            op: BinaryOperator::Plus,
            right: Box::new(Expr::Literal(Literal::Float(1.5))),
        };
        assert_eq!(eval(&expr, &EmptyResolver).unwrap(), Value::Float(2.5));
    }

    #[test]
    fn like_supports_percent_and_underscore() {
        assert!(like_match("hello", "h%o"));
        assert!(like_match("hello", "h_llo"));
        assert!(!like_match("hello", "h_lo"));
        assert!(like_match("anything", "%"));
    }

    #[test]
    fn and_short_circuits_on_false() {
        let expr = Expr::BinaryOp {
            left: Box::new(Expr::Literal(Literal::Boolean(false))),
            op: BinaryOperator::And,
            right: Box::new(Expr::Identifier(tinybase_ast::Ident::new("missing"))),
        };
        assert_eq!(eval(&expr, &EmptyResolver).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn in_list_is_null_when_no_match_includes_a_null_candidate() {
        let expr = Expr::InList {
            expr: Box::new(lit(5)),
            list: vec![lit(1), Expr::Literal(Literal::Null)],
            negated: false,
        };
        assert_eq!(eval(&expr, &EmptyResolver).unwrap(), Value::Null);
    }
}
