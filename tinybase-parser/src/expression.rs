use tinybase_ast::{AggregateFunc, BinaryOperator, Expr, Literal, UnaryOperator};
use tinybase_error::Error;
use tinybase_lexer::{Keyword, Token};

use crate::parser::Parser;

/// Precedence levels for the climb (§4.2): `OR < AND < NOT < comparison <
/// additive < multiplicative`; unary minus and primary sit above all of
/// these and are handled by `parse_unary`/`parse_primary` directly rather
/// than by the precedence table.
impl Parser {
    /// Parses a full expression (the entry point for WHERE/HAVING/ON
    /// predicates, SET/VALUES scalar expressions, and projection items).
    pub fn parse_expr(&mut self) -> Result<Expr, Error> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_and()?;
        while self.eat_keyword(Keyword::OR) {
            let right = self.parse_and()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::Or,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_not()?;
        while self.eat_keyword(Keyword::AND) {
            let right = self.parse_not()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::And,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// `NOT` is a prefix operator that binds tighter than `AND`/`OR` but
    /// looser than comparison (§4.2), so it wraps a `parse_not` recursively
    /// (to allow `NOT NOT x`) rather than a comparison directly.
    fn parse_not(&mut self) -> Result<Expr, Error> {
        if self.eat_keyword(Keyword::NOT) {
            let expr = self.parse_not()?;
            Ok(Expr::UnaryOp {
                op: UnaryOperator::Not,
                expr: Box::new(expr),
            })
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_additive()?;
        loop {
            left = if self.eat_keyword(Keyword::IS) {
                let negated = self.eat_keyword(Keyword::NOT);
                self.expect_keyword(Keyword::NULL)?;
                Expr::IsNull {
                    expr: Box::new(left),
                    negated,
                }
            } else if self.eat_keyword(Keyword::IN) {
                self.parse_in_list(left, false)?
            } else if self.eat_keyword(Keyword::LIKE) {
                let right = self.parse_additive()?;
                Expr::BinaryOp {
                    left: Box::new(left),
                    op: BinaryOperator::Like,
                    right: Box::new(right),
                }
            } else if self.peek_is_keyword(Keyword::NOT)
                && matches!(self.peek_nth(1), Some(Token::Keyword(Keyword::IN)))
            {
                self.advance();
                self.advance();
                self.parse_in_list(left, true)?
            } else if self.peek_is_keyword(Keyword::NOT)
                && matches!(self.peek_nth(1), Some(Token::Keyword(Keyword::LIKE)))
            {
                self.advance();
                self.advance();
                let right = self.parse_additive()?;
                Expr::UnaryOp {
                    op: UnaryOperator::Not,
                    expr: Box::new(Expr::BinaryOp {
                        left: Box::new(left),
                        op: BinaryOperator::Like,
                        right: Box::new(right),
                    }),
                }
            } else if let Some(op) = self.eat_comparison_operator() {
                let right = self.parse_additive()?;
                Expr::BinaryOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                }
            } else {
                break;
            };
        }
        Ok(left)
    }

    fn eat_comparison_operator(&mut self) -> Option<BinaryOperator> {
        let op = match self.peek()? {
            Token::Eq => BinaryOperator::Eq,
            Token::NotEq => BinaryOperator::NotEq,
            Token::Lt => BinaryOperator::Lt,
            Token::LtEq => BinaryOperator::LtEq,
            Token::Gt => BinaryOperator::Gt,
            Token::GtEq => BinaryOperator::GtEq,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn parse_in_list(&mut self, expr: Expr, negated: bool) -> Result<Expr, Error> {
        self.expect_token(&Token::LeftParen)?;
        let list = self.parse_comma_separated(Self::parse_expr)?;
        self.expect_token(&Token::RightParen)?;
        Ok(Expr::InList {
            expr: Box::new(expr),
            list,
            negated,
        })
    }

    fn parse_additive(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOperator::Plus,
                Some(Token::Minus) => BinaryOperator::Minus,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Asterisk) => BinaryOperator::Multiply,
                Some(Token::Slash) => BinaryOperator::Divide,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        if self.eat_token(&Token::Minus) {
            let expr = self.parse_unary()?;
            Ok(Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr: Box::new(expr),
            })
        } else {
            self.parse_primary()
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        match self.peek() {
            Some(Token::Integer(_))
            | Some(Token::Float(_))
            | Some(Token::String(_))
            | Some(Token::Date { .. })
            | Some(Token::Keyword(Keyword::NULL))
            | Some(Token::Keyword(Keyword::TRUE))
            | Some(Token::Keyword(Keyword::FALSE)) => Ok(Expr::Literal(self.parse_literal()?)),
            Some(Token::Keyword(k))
                if matches!(
                    k,
                    Keyword::COUNT | Keyword::SUM | Keyword::AVG | Keyword::MIN | Keyword::MAX
                ) =>
            {
                self.parse_aggregate()
            }
            Some(Token::LeftParen) => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect_token(&Token::RightParen)?;
                Ok(Expr::Nested(Box::new(expr)))
            }
            Some(Token::Ident(_)) => self.parse_identifier_expr(),
            _ => self.expected("an expression"),
        }
    }

    fn parse_identifier_expr(&mut self) -> Result<Expr, Error> {
        let first = self.expect_ident()?;
        if self.eat_token(&Token::Period) {
            let second = self.expect_ident()?;
            Ok(Expr::CompoundIdentifier(first, second))
        } else {
            Ok(Expr::Identifier(first))
        }
    }

    fn parse_literal(&mut self) -> Result<Literal, Error> {
        match self.advance() {
            Some(Token::Integer(v)) => Ok(Literal::Integer(v)),
            Some(Token::Float(v)) => Ok(Literal::Float(v)),
            Some(Token::String(v)) => Ok(Literal::Text(v)),
            Some(Token::Date { year, month, day }) => Ok(Literal::Date {
                year,
                month: month as u8,
                day: day as u8,
            }),
            Some(Token::Keyword(Keyword::NULL)) => Ok(Literal::Null),
            Some(Token::Keyword(Keyword::TRUE)) => Ok(Literal::Boolean(true)),
            Some(Token::Keyword(Keyword::FALSE)) => Ok(Literal::Boolean(false)),
            _ => self.expected("a literal"),
        }
    }

    fn parse_aggregate(&mut self) -> Result<Expr, Error> {
        let keyword = match self.advance() {
            Some(Token::Keyword(k)) => k,
            _ => unreachable!("caller peeked an aggregate keyword"),
        };
        self.expect_token(&Token::LeftParen)?;
        let func = if keyword == Keyword::COUNT && self.eat_token(&Token::Asterisk) {
            AggregateFunc::CountStar
        } else {
            let arg = Box::new(self.parse_expr()?);
            match keyword {
                Keyword::COUNT => AggregateFunc::Count(arg),
                Keyword::SUM => AggregateFunc::Sum(arg),
                Keyword::AVG => AggregateFunc::Avg(arg),
                Keyword::MIN => AggregateFunc::Min(arg),
                Keyword::MAX => AggregateFunc::Max(arg),
                _ => unreachable!("caller only dispatches aggregate keywords"),
            }
        };
        self.expect_token(&Token::RightParen)?;
        Ok(Expr::Aggregate(func))
    }
}
