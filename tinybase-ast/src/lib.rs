//! # tinybase-ast
//!
//! Statement and expression AST types produced by `tinybase-parser` and
//! consumed by `tinybase-exec`. The tree is a closed set of sum types: one
//! variant per statement shape and expression shape the dialect supports.
//! The parser returns owned trees; nothing here mutates a tree once built.

#![deny(missing_docs)]
#![deny(unused_imports)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod expression;
mod statement;
mod types;
mod utils;

pub use self::{expression::*, statement::*, types::*};
