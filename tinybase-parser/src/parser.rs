use tinybase_error::Error;
use tinybase_lexer::{Keyword, Lexer, Location, Token};

/// A recursive-descent parser over a fully-tokenized statement.
///
/// Tokens are scanned up front (§4.2's lexer step), each paired with the
/// source location of its first character, so every `Error::SyntaxError`
/// this module raises can point at the exact place parsing went wrong.
pub struct Parser {
    tokens: Vec<(Token, Location)>,
    pos: usize,
}

impl Parser {
    /// Tokenizes `sql` and builds a parser positioned before the first token.
    pub fn new(sql: &str) -> Result<Self, Error> {
        let mut lexer = Lexer::new(sql);
        let mut tokens = Vec::new();
        loop {
            let location = lexer.location();
            match lexer
                .next_token()
                .map_err(|e| Error::syntax(e.message, e.location))?
            {
                Some(token) => tokens.push((token, location)),
                None => break,
            }
        }
        Ok(Parser { tokens, pos: 0 })
    }

    /// The location of the next unconsumed token, or of end-of-input.
    pub(crate) fn location(&self) -> Location {
        self.tokens
            .get(self.pos)
            .map(|(_, loc)| *loc)
            .unwrap_or_else(|| self.tokens.last().map(|(_, loc)| *loc).unwrap_or_default())
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    pub(crate) fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(t, _)| t)
    }

    pub(crate) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Builds a `SyntaxError` at the current position.
    pub(crate) fn error<R>(&self, message: impl Into<String>) -> Result<R, Error> {
        Err(Error::syntax(message.into(), self.location()))
    }

    pub(crate) fn expected<R>(&self, what: &str) -> Result<R, Error> {
        match self.peek() {
            Some(token) => self.error(format!("expected {}, found '{}'", what, token)),
            None => self.error(format!("expected {}, found end of input", what)),
        }
    }

    /// Consumes the next token if it is exactly `keyword`.
    pub(crate) fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if matches!(self.peek(), Some(Token::Keyword(k)) if *k == keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes `keyword` or fails with a syntax error naming it.
    pub(crate) fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), Error> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            self.expected(&keyword.to_string())
        }
    }

    /// Consumes the next token if it is one of `keywords`, returning which.
    pub(crate) fn eat_one_of_keywords(&mut self, keywords: &[Keyword]) -> Option<Keyword> {
        if let Some(Token::Keyword(k)) = self.peek() {
            if keywords.contains(k) {
                let k = *k;
                self.advance();
                return Some(k);
            }
        }
        None
    }

    /// Whether the next token is exactly `keyword`, without consuming it.
    pub(crate) fn peek_is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.peek(), Some(Token::Keyword(k)) if *k == keyword)
    }

    /// Consumes the next token if it equals `token`.
    pub(crate) fn eat_token(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_token(&mut self, token: &Token) -> Result<(), Error> {
        if self.eat_token(token) {
            Ok(())
        } else {
            self.expected(&token.to_string())
        }
    }

    /// Consumes an identifier token, or fails.
    pub(crate) fn expect_ident(&mut self) -> Result<tinybase_ast::Ident, Error> {
        match self.peek() {
            Some(Token::Ident(_)) => match self.advance() {
                Some(Token::Ident(name)) => Ok(tinybase_ast::Ident::new(name)),
                _ => unreachable!("peeked an identifier"),
            },
            _ => self.expected("an identifier"),
        }
    }

    /// Parses a `,`-separated non-empty list using `item`.
    pub(crate) fn parse_comma_separated<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<T, Error>,
    ) -> Result<Vec<T>, Error> {
        let mut out = vec![item(self)?];
        while self.eat_token(&Token::Comma) {
            out.push(item(self)?);
        }
        Ok(out)
    }

    /// Fails unless every token has been consumed, per §4.1: exactly one
    /// statement, with an optional trailing `;`.
    pub fn expect_end_of_statement(&mut self) -> Result<(), Error> {
        self.eat_token(&Token::SemiColon);
        match self.peek() {
            None => Ok(()),
            Some(token) => {
                let token = token.clone();
                self.error(format!(
                    "unexpected '{}' after end of statement",
                    token
                ))
            }
        }
    }
}
