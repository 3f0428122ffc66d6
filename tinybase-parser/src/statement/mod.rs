mod ddl;
mod dml;
mod select;

use tinybase_ast::Stmt;
use tinybase_error::Error;
use tinybase_lexer::{Keyword, Token};

use crate::parser::Parser;

impl Parser {
    /// Dispatches on the statement's leading keyword and parses the rest
    /// of the statement (§4.2). The leading keyword is peeked, not
    /// unconditionally consumed, so each sub-parser owns consuming its own
    /// prefix.
    pub fn parse_statement(&mut self) -> Result<Stmt, Error> {
        match self.peek() {
            Some(Token::Keyword(Keyword::CREATE)) => self.parse_create(),
            Some(Token::Keyword(Keyword::DROP)) => Ok(Stmt::DropTable(self.parse_drop_table()?)),
            Some(Token::Keyword(Keyword::INSERT)) => Ok(Stmt::Insert(self.parse_insert()?)),
            Some(Token::Keyword(Keyword::UPDATE)) => Ok(Stmt::Update(self.parse_update()?)),
            Some(Token::Keyword(Keyword::DELETE)) => Ok(Stmt::Delete(self.parse_delete()?)),
            Some(Token::Keyword(Keyword::SELECT)) => Ok(Stmt::Select(self.parse_select()?)),
            Some(Token::Keyword(Keyword::EXPLAIN)) => {
                self.advance();
                Ok(Stmt::Explain(self.parse_select()?))
            }
            _ => self.expected("a statement (CREATE, DROP, INSERT, UPDATE, DELETE, SELECT, EXPLAIN)"),
        }
    }

    fn parse_create(&mut self) -> Result<Stmt, Error> {
        self.expect_keyword(Keyword::CREATE)?;
        if self.peek_is_keyword(Keyword::TABLE) {
            Ok(Stmt::CreateTable(self.parse_create_table()?))
        } else if self.peek_is_keyword(Keyword::INDEX) {
            Ok(Stmt::CreateIndex(self.parse_create_index()?))
        } else {
            self.expected("TABLE or INDEX")
        }
    }
}
