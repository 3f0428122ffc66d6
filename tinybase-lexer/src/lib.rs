//! # tinybase-lexer
//!
//! A hand-written lexer for the tinybase SQL dialect: converts source text
//! into a flat sequence of tokens, tracking line/column for diagnostics.

#![deny(missing_docs)]
#![deny(unused_imports)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod error;
mod keywords;
mod lexer;
mod tokens;

pub use self::{
    error::{LexerError, Location},
    keywords::Keyword,
    lexer::Lexer,
    tokens::Token,
};
