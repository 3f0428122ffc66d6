#[cfg(not(feature = "std"))]
use alloc::string::String;
use core::fmt;

use crate::keywords::Keyword;

/// One lexical token, carrying enough information for the parser to build
/// an AST without re-scanning the source text (§4.2).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Token {
    /// An unquoted identifier, e.g. `customer_id`.
    Ident(String),
    /// A reserved word.
    Keyword(Keyword),
    /// An integer literal, already parsed, e.g. `42`.
    Integer(i64),
    /// A floating-point literal, already parsed, e.g. `3.14`.
    Float(f64),
    /// A single-quoted string literal, with `''` escapes resolved and the
    /// enclosing quotes stripped.
    String(String),
    /// A single-quoted `YYYY-MM-DD` literal, already split into fields.
    Date {
        /// Calendar year.
        year: i32,
        /// Calendar month, 1-12.
        month: u32,
        /// Calendar day, 1-31.
        day: u32,
    },

    /// Comma `,`
    Comma,
    /// Semicolon `;`
    SemiColon,
    /// Period `.`
    Period,
    /// Left parenthesis `(`
    LeftParen,
    /// Right parenthesis `)`
    RightParen,
    /// Equal `=`
    Eq,
    /// `<>` or `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Asterisk,
    /// `/`
    Slash,
    /// `%`
    Percent,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(value) => f.write_str(value),
            Token::Keyword(keyword) => write!(f, "{}", keyword),
            Token::Integer(value) => write!(f, "{}", value),
            Token::Float(value) => write!(f, "{}", value),
            Token::String(value) => write!(f, "'{}'", value.replace('\'', "''")),
            Token::Date { year, month, day } => write!(f, "'{:04}-{:02}-{:02}'", year, month, day),
            Token::Comma => f.write_str(","),
            Token::SemiColon => f.write_str(";"),
            Token::Period => f.write_str("."),
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
            Token::Eq => f.write_str("="),
            Token::NotEq => f.write_str("<>"),
            Token::Lt => f.write_str("<"),
            Token::LtEq => f.write_str("<="),
            Token::Gt => f.write_str(">"),
            Token::GtEq => f.write_str(">="),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Asterisk => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::Percent => f.write_str("%"),
        }
    }
}

impl Token {
    /// Resolves a scanned identifier to either a keyword token or a plain
    /// identifier token.
    pub fn ident_or_keyword(value: String) -> Token {
        match Keyword::from_str(&value) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Ident(value),
        }
    }
}
