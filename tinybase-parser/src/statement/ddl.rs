use tinybase_ast::{
    ColumnConstraint, ColumnDef, CreateIndexStmt, CreateTableStmt, DataType, DropTableStmt,
    TableConstraint,
};
use tinybase_error::Error;
use tinybase_lexer::{Keyword, Token};

use crate::parser::Parser;

impl Parser {
    /// `CREATE TABLE name (col-def [, col-def]* [, table-constraint]*)` (§4.2).
    pub(crate) fn parse_create_table(&mut self) -> Result<CreateTableStmt, Error> {
        self.expect_keyword(Keyword::TABLE)?;
        let name = self.expect_ident()?;
        self.expect_token(&Token::LeftParen)?;

        let mut columns = Vec::new();
        let mut constraints = Vec::new();
        loop {
            if self.peek_is_keyword(Keyword::PRIMARY) || self.peek_is_keyword(Keyword::FOREIGN) {
                constraints.push(self.parse_table_constraint()?);
            } else {
                columns.push(self.parse_column_def()?);
            }
            if !self.eat_token(&Token::Comma) {
                break;
            }
        }
        self.expect_token(&Token::RightParen)?;

        if columns.is_empty() {
            return self.error("CREATE TABLE requires at least one column");
        }

        Ok(CreateTableStmt {
            name,
            columns,
            constraints,
        })
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef, Error> {
        let name = self.expect_ident()?;
        let data_type = self.parse_data_type()?;
        let mut constraints = Vec::new();
        loop {
            if self.eat_keyword(Keyword::PRIMARY) {
                self.expect_keyword(Keyword::KEY)?;
                constraints.push(ColumnConstraint::PrimaryKey);
            } else if self.eat_keyword(Keyword::UNIQUE) {
                constraints.push(ColumnConstraint::Unique);
            } else if self.eat_keyword(Keyword::NOT) {
                self.expect_keyword(Keyword::NULL)?;
                constraints.push(ColumnConstraint::NotNull);
            } else if self.eat_keyword(Keyword::REFERENCES) {
                let table = self.expect_ident()?;
                self.expect_token(&Token::LeftParen)?;
                let column = self.expect_ident()?;
                self.expect_token(&Token::RightParen)?;
                constraints.push(ColumnConstraint::References { table, column });
            } else {
                break;
            }
        }
        Ok(ColumnDef {
            name,
            data_type,
            constraints,
        })
    }

    fn parse_data_type(&mut self) -> Result<DataType, Error> {
        match self.advance() {
            Some(Token::Keyword(Keyword::INT)) | Some(Token::Keyword(Keyword::INTEGER)) => {
                Ok(DataType::Integer)
            }
            Some(Token::Keyword(Keyword::FLOAT)) => Ok(DataType::Float),
            Some(Token::Keyword(Keyword::DATE)) => Ok(DataType::Date),
            Some(Token::Keyword(Keyword::BOOLEAN)) => Ok(DataType::Boolean),
            Some(Token::Keyword(Keyword::VARCHAR)) => {
                self.expect_token(&Token::LeftParen)?;
                let length = match self.advance() {
                    Some(Token::Integer(n)) if n >= 0 => n as u64,
                    _ => return self.error("VARCHAR length must be a non-negative integer"),
                };
                self.expect_token(&Token::RightParen)?;
                Ok(DataType::Varchar(length))
            }
            _ => self.error("expected a column type (INTEGER, FLOAT, VARCHAR(n), DATE, BOOLEAN)"),
        }
    }

    fn parse_table_constraint(&mut self) -> Result<TableConstraint, Error> {
        if self.eat_keyword(Keyword::PRIMARY) {
            self.expect_keyword(Keyword::KEY)?;
            self.expect_token(&Token::LeftParen)?;
            let column = self.expect_ident()?;
            self.expect_token(&Token::RightParen)?;
            Ok(TableConstraint::PrimaryKey { column })
        } else if self.eat_keyword(Keyword::FOREIGN) {
            self.expect_keyword(Keyword::KEY)?;
            self.expect_token(&Token::LeftParen)?;
            let column = self.expect_ident()?;
            self.expect_token(&Token::RightParen)?;
            self.expect_keyword(Keyword::REFERENCES)?;
            let ref_table = self.expect_ident()?;
            self.expect_token(&Token::LeftParen)?;
            let ref_column = self.expect_ident()?;
            self.expect_token(&Token::RightParen)?;
            Ok(TableConstraint::ForeignKey {
                column,
                ref_table,
                ref_column,
            })
        } else {
            self.expected("PRIMARY KEY or FOREIGN KEY")
        }
    }

    /// `CREATE INDEX name ON table(col)` (§4.2).
    pub(crate) fn parse_create_index(&mut self) -> Result<CreateIndexStmt, Error> {
        self.expect_keyword(Keyword::INDEX)?;
        let name = self.expect_ident()?;
        self.expect_keyword(Keyword::ON)?;
        let table = self.expect_ident()?;
        self.expect_token(&Token::LeftParen)?;
        let column = self.expect_ident()?;
        self.expect_token(&Token::RightParen)?;
        Ok(CreateIndexStmt { name, table, column })
    }

    /// `DROP TABLE name` (§4.2).
    pub(crate) fn parse_drop_table(&mut self) -> Result<DropTableStmt, Error> {
        self.expect_keyword(Keyword::DROP)?;
        self.expect_keyword(Keyword::TABLE)?;
        let name = self.expect_ident()?;
        Ok(DropTableStmt { name })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tinybase_ast::Stmt;

    #[test]
    fn parses_create_table_with_constraints() {
        let stmt = crate::parse(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, email VARCHAR(50) UNIQUE NOT NULL)",
        )
        .unwrap();
        match stmt {
            Stmt::CreateTable(t) => {
                assert_eq!(t.columns.len(), 2);
                assert_eq!(t.name.value, "users");
            }
            other => panic!("expected CreateTable, got {:?}", other),
        }
    }

    #[test]
    fn parses_table_level_foreign_key() {
        let stmt = crate::parse(
            "CREATE TABLE orders (id INTEGER, user_id INTEGER, FOREIGN KEY (user_id) REFERENCES users(id))",
        )
        .unwrap();
        match stmt {
            Stmt::CreateTable(t) => assert_eq!(t.constraints.len(), 1),
            other => panic!("expected CreateTable, got {:?}", other),
        }
    }

    #[test]
    fn parses_create_index() {
        let stmt = crate::parse("CREATE INDEX idx_email ON users(email)").unwrap();
        assert!(matches!(stmt, Stmt::CreateIndex(_)));
    }

    #[test]
    fn parses_drop_table() {
        let stmt = crate::parse("DROP TABLE users").unwrap();
        assert!(matches!(stmt, Stmt::DropTable(_)));
    }

    #[test]
    fn rejects_table_with_no_columns() {
        assert!(crate::parse("CREATE TABLE t ()").is_err());
    }

    #[test]
    fn accepts_zero_length_varchar() {
        assert!(crate::parse("CREATE TABLE t (a VARCHAR(0))").is_ok());
    }
}
