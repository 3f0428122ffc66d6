#[cfg(not(feature = "std"))]
use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::{iter::Peekable, str::Chars};

use crate::{
    error::{LexerError, Location},
    tokens::Token,
};

/// Tokenizes `input` in full, stopping at the first lexing error.
///
/// Whitespace and `-- ...` line comments are consumed and discarded; they
/// never appear in the returned token sequence (§4.1: "comments are
/// ignored").
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexerError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

/// A hand-written scanner over SQL source text, producing one [`Token`] at
/// a time. Used directly by the parser for lookahead-free cases and via
/// [`tokenize`] for the common up-front tokenization path.
pub struct Lexer<'a> {
    iter: Peekable<Chars<'a>>,
    location: Location,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `input`, positioned at line 1, column 1.
    pub fn new(input: &'a str) -> Self {
        Self {
            iter: input.chars().peekable(),
            location: Location::start(),
        }
    }

    /// The position of the next character to be scanned.
    pub fn location(&self) -> Location {
        self.location
    }

    /// Scans and returns the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexerError> {
        loop {
            match self.iter.peek() {
                None => return Ok(None),
                Some(&ch) if ch.is_whitespace() => {
                    self.next_char();
                }
                Some(&'-') => {
                    // Only `--` introduces a comment; a bare `-` is the
                    // minus operator, disambiguated by one-token lookahead.
                    let mut lookahead = self.iter.clone();
                    lookahead.next();
                    if lookahead.next() == Some('-') {
                        self.next_char();
                        self.next_char();
                        self.skip_line_comment();
                        continue;
                    }
                    self.next_char();
                    return Ok(Some(Token::Minus));
                }
                Some(&ch) if ch == '\'' => {
                    self.next_char();
                    return self.tokenize_quoted_literal().map(Some);
                }
                Some(&ch) if is_identifier_start(ch) => {
                    self.next_char();
                    return Ok(Some(self.tokenize_ident(ch)));
                }
                Some(&ch) if ch.is_ascii_digit() => return self.tokenize_number().map(Some),
                Some(_) => return self.tokenize_symbol().map(Some),
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(&ch) = self.iter.peek() {
            if ch == '\n' {
                break;
            }
            self.next_char();
        }
    }

    fn tokenize_ident(&mut self, first: char) -> Token {
        let mut ident = first.to_string();
        ident.push_str(&self.next_while(|ch| is_identifier_part(*ch)));
        Token::ident_or_keyword(ident)
    }

    /// Scans the body of a `'...'` literal (the opening quote already
    /// consumed) and classifies it as a date literal when it matches
    /// `YYYY-MM-DD` exactly, otherwise as a string literal.
    fn tokenize_quoted_literal(&mut self) -> Result<Token, LexerError> {
        let mut value = String::new();
        loop {
            match self.next_char() {
                Some('\'') => {
                    // `''` inside the literal is an escaped single quote.
                    if self.next_if_is('\'') {
                        value.push('\'');
                        continue;
                    }
                    break;
                }
                Some(ch) => value.push(ch),
                None => {
                    return Err(self.location.into_error("unterminated string literal"));
                }
            }
        }
        Ok(match parse_date(&value) {
            Some((year, month, day)) => Token::Date { year, month, day },
            None => Token::String(value),
        })
    }

    fn tokenize_number(&mut self) -> Result<Token, LexerError> {
        let mut text = self.next_while(|ch| ch.is_ascii_digit());
        let mut is_float = false;
        if self.iter.peek() == Some(&'.') {
            is_float = true;
            text.push('.');
            self.next_char();
            text.push_str(&self.next_while(|ch| ch.is_ascii_digit()));
        }
        if is_float {
            text.parse::<f64>()
                .map(Token::Float)
                .map_err(|_| self.location.into_error("invalid float literal"))
        } else {
            text.parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| self.location.into_error("invalid integer literal"))
        }
    }

    fn tokenize_symbol(&mut self) -> Result<Token, LexerError> {
        let ch = self.next_char().expect("peeked Some before calling");
        Ok(match ch {
            ',' => Token::Comma,
            ';' => Token::SemiColon,
            '.' => Token::Period,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '+' => Token::Plus,
            '*' => Token::Asterisk,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '=' => Token::Eq,
            '<' => {
                if self.next_if_is('>') {
                    Token::NotEq
                } else if self.next_if_is('=') {
                    Token::LtEq
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if self.next_if_is('=') {
                    Token::GtEq
                } else {
                    Token::Gt
                }
            }
            '!' => {
                if self.next_if_is('=') {
                    Token::NotEq
                } else {
                    return Err(self.location.into_error("unexpected character '!'"));
                }
            }
            other => {
                return Err(self
                    .location
                    .into_error(format!("unexpected character '{}'", other)));
            }
        })
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.iter.next()?;
        self.location.advance(ch);
        Some(ch)
    }

    fn next_if_is(&mut self, ch: char) -> bool {
        if self.iter.next_if_eq(&ch).is_some() {
            self.location.advance(ch);
            true
        } else {
            false
        }
    }

    fn next_while<F: Fn(&char) -> bool>(&mut self, predicate: F) -> String {
        let mut value = String::new();
        while let Some(ch) = self.iter.next_if(&predicate) {
            self.location.advance(ch);
            value.push(ch);
        }
        value
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic()
}

fn is_identifier_part(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Parses `text` as a strict `YYYY-MM-DD` date, returning `None` if it
/// doesn't match the shape (it is then treated as an ordinary string).
/// Calendar validity (day-of-month bounds) is checked later by
/// `tinybase-types`, not here; the lexer only recognises the *shape*.
fn parse_date(text: &str) -> Option<(i32, u32, u32)> {
    let bytes = text.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let is_digits = |s: &str| s.len() > 0 && s.bytes().all(|b| b.is_ascii_digit());
    let (year, month, day) = (&text[0..4], &text[5..7], &text[8..10]);
    if !is_digits(year) || !is_digits(month) || !is_digits(day) {
        return None;
    }
    Some((year.parse().ok()?, month.parse().ok()?, day.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::keywords::Keyword;

    fn lex(input: &str) -> Vec<Token> {
        tokenize(input).expect("input should lex cleanly")
    }

    #[test]
    fn tokenizes_a_simple_select() {
        assert_eq!(
            lex("SELECT * FROM t WHERE a = 1"),
            vec![
                Token::Keyword(Keyword::SELECT),
                Token::Asterisk,
                Token::Keyword(Keyword::FROM),
                Token::Ident("t".into()),
                Token::Keyword(Keyword::WHERE),
                Token::Ident("a".into()),
                Token::Eq,
                Token::Integer(1),
            ]
        );
    }

    #[test]
    fn distinguishes_two_char_operators() {
        assert_eq!(lex("<>"), vec![Token::NotEq]);
        assert_eq!(lex("!="), vec![Token::NotEq]);
        assert_eq!(lex("<="), vec![Token::LtEq]);
        assert_eq!(lex(">="), vec![Token::GtEq]);
        assert_eq!(lex("<"), vec![Token::Lt]);
        assert_eq!(lex(">"), vec![Token::Gt]);
    }

    #[test]
    fn tokenizes_float_and_integer_literals() {
        assert_eq!(lex("42"), vec![Token::Integer(42)]);
        assert_eq!(lex("3.14"), vec![Token::Float(3.14)]);
    }

    #[test]
    fn tokenizes_string_with_escaped_quote() {
        assert_eq!(
            lex("'it''s here'"),
            vec![Token::String("it's here".into())]
        );
    }

    #[test]
    fn recognises_date_literal_shape() {
        assert_eq!(
            lex("'2024-01-31'"),
            vec![Token::Date {
                year: 2024,
                month: 1,
                day: 31,
            }]
        );
        // Not a date shape: falls back to a plain string.
        assert_eq!(lex("'2024-1-31'"), vec![Token::String("2024-1-31".into())]);
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(
            lex("SELECT 1 -- trailing comment\nFROM t"),
            vec![
                Token::Keyword(Keyword::SELECT),
                Token::Integer(1),
                Token::Keyword(Keyword::FROM),
                Token::Ident("t".into()),
            ]
        );
    }

    #[test]
    fn minus_is_not_confused_with_comment() {
        assert_eq!(lex("1 - 2"), vec![Token::Integer(1), Token::Minus, Token::Integer(2)]);
    }

    #[test]
    fn reports_location_of_unterminated_string() {
        let err = tokenize("'abc").unwrap_err();
        assert_eq!(err.location, Location { line: 1, column: 5 });
    }
}
