use tinybase_ast::{Join, JoinKind, OrderByItem, SelectItem, SelectStmt, TableRef};
use tinybase_error::Error;
use tinybase_lexer::{Keyword, Token};

use crate::parser::Parser;

impl Parser {
    /// `SELECT projection FROM table [alias] [join-clause]* [WHERE
    /// predicate] [GROUP BY ...] [HAVING predicate] [ORDER BY ...]
    /// [LIMIT n]` (§4.2, §4.7).
    pub(crate) fn parse_select(&mut self) -> Result<SelectStmt, Error> {
        self.expect_keyword(Keyword::SELECT)?;
        let projection = self.parse_projection()?;
        self.expect_keyword(Keyword::FROM)?;
        let from = self.parse_table_ref()?;

        let mut joins = Vec::new();
        while self.peek_is_join_start() {
            joins.push(self.parse_join()?);
        }

        let selection = if self.eat_keyword(Keyword::WHERE) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let group_by = if self.eat_keyword(Keyword::GROUP) {
            self.expect_keyword(Keyword::BY)?;
            self.parse_comma_separated(Self::expect_ident)?
        } else {
            Vec::new()
        };

        let having = if self.eat_keyword(Keyword::HAVING) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let order_by = if self.eat_keyword(Keyword::ORDER) {
            self.expect_keyword(Keyword::BY)?;
            self.parse_comma_separated(Self::parse_order_by_item)?
        } else {
            Vec::new()
        };

        let limit = if self.eat_keyword(Keyword::LIMIT) {
            match self.advance() {
                Some(Token::Integer(n)) if n >= 0 => Some(n as u64),
                _ => return self.error("LIMIT requires a non-negative integer"),
            }
        } else {
            None
        };

        Ok(SelectStmt {
            projection,
            from,
            joins,
            selection,
            group_by,
            having,
            order_by,
            limit,
        })
    }

    fn parse_projection(&mut self) -> Result<Vec<SelectItem>, Error> {
        if self.eat_token(&Token::Asterisk) {
            return Ok(vec![SelectItem::Wildcard]);
        }
        self.parse_comma_separated(|p| {
            let expr = p.parse_expr()?;
            let alias = if p.eat_keyword(Keyword::AS) {
                Some(p.expect_ident()?)
            } else {
                None
            };
            Ok(SelectItem::Expr { expr, alias })
        })
    }

    fn parse_table_ref(&mut self) -> Result<TableRef, Error> {
        let name = self.expect_ident()?;
        let alias = self.parse_optional_alias()?;
        Ok(TableRef { name, alias })
    }

    fn parse_optional_alias(&mut self) -> Result<Option<tinybase_ast::Ident>, Error> {
        if self.eat_keyword(Keyword::AS) {
            Ok(Some(self.expect_ident()?))
        } else if matches!(self.peek(), Some(Token::Ident(_))) {
            Ok(Some(self.expect_ident()?))
        } else {
            Ok(None)
        }
    }

    fn peek_is_join_start(&self) -> bool {
        self.peek_is_keyword(Keyword::JOIN)
            || self.peek_is_keyword(Keyword::INNER)
            || self.peek_is_keyword(Keyword::LEFT)
    }

    /// `[INNER|LEFT] JOIN table [alias] ON predicate` (§4.2). `RIGHT`,
    /// `CROSS`, `OUTER`-without-`LEFT`, and `USING` are recognised
    /// keywords (so they remain reserved) but no join form uses them; the
    /// dialect's join grammar covers `INNER`/`LEFT` only (§4.7 step 2).
    fn parse_join(&mut self) -> Result<Join, Error> {
        let kind = if self.eat_keyword(Keyword::INNER) {
            JoinKind::Inner
        } else if self.eat_keyword(Keyword::LEFT) {
            self.eat_keyword(Keyword::OUTER);
            JoinKind::Left
        } else {
            JoinKind::Inner
        };
        self.expect_keyword(Keyword::JOIN)?;
        let table = self.parse_table_ref()?;
        self.expect_keyword(Keyword::ON)?;
        let on = self.parse_expr()?;
        Ok(Join { kind, table, on })
    }

    fn parse_order_by_item(&mut self) -> Result<OrderByItem, Error> {
        let expr = self.parse_expr()?;
        let desc = if self.eat_keyword(Keyword::DESC) {
            true
        } else {
            self.eat_keyword(Keyword::ASC);
            false
        };
        Ok(OrderByItem { expr, desc })
    }
}
