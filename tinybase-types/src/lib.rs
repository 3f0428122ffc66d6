//! # tinybase-types
//!
//! The runtime value model (§4.3, C1): a tagged-union [`Value`] carrying its
//! type discriminant at runtime, plus the comparison and arithmetic rules
//! that give SQL's three-valued logic and INTEGER/FLOAT widening. Column
//! *declarations* (`DataType`) live in `tinybase-ast`; this crate re-exports
//! them so callers only need one type-system entry point.
//!
//! Per §9 "Dynamic values": every operator pattern-matches on the
//! discriminant explicitly. There is no opaque `Value` with introspection.

#![deny(missing_docs)]
#![deny(unused_imports)]

mod date;
mod value;

pub use tinybase_ast::DataType;

pub use self::{date::Date, value::Value};
