use tinybase_ast::{Assignment, DeleteStmt, InsertStmt, UpdateStmt};
use tinybase_error::Error;
use tinybase_lexer::{Keyword, Token};

use crate::parser::Parser;

impl Parser {
    /// `INSERT INTO name [(col, ...)] VALUES (expr, ...) [, (...)]*` (§4.2).
    pub(crate) fn parse_insert(&mut self) -> Result<InsertStmt, Error> {
        self.expect_keyword(Keyword::INSERT)?;
        self.expect_keyword(Keyword::INTO)?;
        let table = self.expect_ident()?;

        let columns = if self.eat_token(&Token::LeftParen) {
            let columns = self.parse_comma_separated(Self::expect_ident)?;
            self.expect_token(&Token::RightParen)?;
            Some(columns)
        } else {
            None
        };

        self.expect_keyword(Keyword::VALUES)?;
        let rows = self.parse_comma_separated(|p| {
            p.expect_token(&Token::LeftParen)?;
            let values = p.parse_comma_separated(Self::parse_expr)?;
            p.expect_token(&Token::RightParen)?;
            Ok(values)
        })?;

        Ok(InsertStmt {
            table,
            columns,
            rows,
        })
    }

    /// `UPDATE name SET col = expr, ... [WHERE predicate]` (§4.2).
    pub(crate) fn parse_update(&mut self) -> Result<UpdateStmt, Error> {
        self.expect_keyword(Keyword::UPDATE)?;
        let table = self.expect_ident()?;
        self.expect_keyword(Keyword::SET)?;
        let assignments = self.parse_comma_separated(|p| {
            let column = p.expect_ident()?;
            p.expect_token(&Token::Eq)?;
            let value = p.parse_expr()?;
            Ok(Assignment { column, value })
        })?;
        let selection = if self.eat_keyword(Keyword::WHERE) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(UpdateStmt {
            table,
            assignments,
            selection,
        })
    }

    /// `DELETE FROM name [WHERE predicate]` (§4.2).
    pub(crate) fn parse_delete(&mut self) -> Result<DeleteStmt, Error> {
        self.expect_keyword(Keyword::DELETE)?;
        self.expect_keyword(Keyword::FROM)?;
        let table = self.expect_ident()?;
        let selection = if self.eat_keyword(Keyword::WHERE) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(DeleteStmt { table, selection })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tinybase_ast::Stmt;

    #[test]
    fn parses_multi_row_insert() {
        let stmt = crate::parse("INSERT INTO t VALUES (1, 'a'), (2, 'b')").unwrap();
        match stmt {
            Stmt::Insert(i) => assert_eq!(i.rows.len(), 2),
            other => panic!("expected Insert, got {:?}", other),
        }
    }

    #[test]
    fn parses_insert_with_column_list() {
        let stmt = crate::parse("INSERT INTO t (a, b) VALUES (1, 2)").unwrap();
        match stmt {
            Stmt::Insert(i) => assert_eq!(i.columns.unwrap().len(), 2),
            other => panic!("expected Insert, got {:?}", other),
        }
    }

    #[test]
    fn parses_update_with_where() {
        let stmt = crate::parse("UPDATE t SET a = 1, b = 2 WHERE id = 5").unwrap();
        match stmt {
            Stmt::Update(u) => {
                assert_eq!(u.assignments.len(), 2);
                assert!(u.selection.is_some());
            }
            other => panic!("expected Update, got {:?}", other),
        }
    }

    #[test]
    fn parses_delete_without_where() {
        let stmt = crate::parse("DELETE FROM t").unwrap();
        match stmt {
            Stmt::Delete(d) => assert!(d.selection.is_none()),
            other => panic!("expected Delete, got {:?}", other),
        }
    }
}
