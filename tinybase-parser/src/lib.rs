//! # tinybase-parser
//!
//! A recursive-descent parser for the tinybase SQL dialect (§4.2, C5):
//! turns the flat token stream produced by `tinybase-lexer` into one
//! `tinybase_ast::Stmt`. Failure is reported as `Error::SyntaxError` with
//! the source position of the offending token; there is no partial AST on
//! failure (§4.2 "Failure mode").

#![deny(missing_docs)]
#![deny(unused_imports)]

mod expression;
mod parser;
mod statement;

pub use self::parser::Parser;

use tinybase_ast::Stmt;
use tinybase_error::Error;

/// Parses exactly one statement from `sql`, optionally terminated by `;`.
/// Trailing tokens after the statement (other than a single `;` and
/// whitespace/comments, already stripped by the lexer) are a syntax error
/// (§4.1: "Accepts exactly one statement; additional statements are an
/// error").
pub fn parse(sql: &str) -> Result<Stmt, Error> {
    let mut parser = Parser::new(sql)?;
    let stmt = parser.parse_statement()?;
    parser.expect_end_of_statement()?;
    Ok(stmt)
}

#[cfg(test)]
mod tests {
    use tinybase_ast::Stmt;

    use super::*;

    #[test]
    fn parses_a_trailing_semicolon() {
        assert!(matches!(parse("DROP TABLE t;"), Ok(Stmt::DropTable(_))));
    }

    #[test]
    fn rejects_a_second_statement() {
        let err = parse("DROP TABLE t; DROP TABLE u;").unwrap_err();
        assert_eq!(err.kind(), "SyntaxError");
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse("").is_err());
        assert!(parse("   -- just a comment").is_err());
    }
}
