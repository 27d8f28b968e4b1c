use super::{ParseResult, Parser};
use crate::ast::{BinaryOp, Expr, ExprKind, FieldInit, Literal, UnaryOp};
use crate::token::TokenKind;

/// Expression grammar as a conventional precedence climb:
/// member access > unary > `*` > `+ -` > `> <` > `==` > `& |` > `&& ||`.
/// Single `=` is not an expression operator; it belongs to binding
/// statements and struct-literal fields.
pub trait ExprParsing<'a> {
    fn parse_expression(&mut self) -> ParseResult<Option<&'a Expr<'a>>>;
    fn parse_bitwise(&mut self) -> ParseResult<Option<&'a Expr<'a>>>;
    fn parse_equality(&mut self) -> ParseResult<Option<&'a Expr<'a>>>;
    fn parse_comparison(&mut self) -> ParseResult<Option<&'a Expr<'a>>>;
    fn parse_additive(&mut self) -> ParseResult<Option<&'a Expr<'a>>>;
    fn parse_multiplicative(&mut self) -> ParseResult<Option<&'a Expr<'a>>>;
    fn parse_unary(&mut self) -> ParseResult<Option<&'a Expr<'a>>>;
    fn parse_postfix(&mut self) -> ParseResult<Option<&'a Expr<'a>>>;
    fn parse_primary(&mut self) -> ParseResult<Option<&'a Expr<'a>>>;
}

impl<'a, 'int> ExprParsing<'a> for Parser<'a, 'int> {
    fn parse_expression(&mut self) -> ParseResult<Option<&'a Expr<'a>>> {
        let mut left = match self.parse_bitwise()? {
            Some(expr) => expr,
            None => return Ok(None),
        };
        loop {
            let checkpoint = self.checkpoint();
            let op = if self.eat(&TokenKind::And) && self.eat(&TokenKind::And) {
                BinaryOp::And
            } else {
                self.restore(checkpoint);
                if self.eat(&TokenKind::Pipe) && self.eat(&TokenKind::Pipe) {
                    BinaryOp::Or
                } else {
                    self.restore(checkpoint);
                    break;
                }
            };
            let right = match self.parse_bitwise()? {
                Some(expr) => expr,
                None => {
                    self.restore(checkpoint);
                    break;
                }
            };
            left = self.alloc_expr(ExprKind::Binary { op, left, right });
        }
        Ok(Some(left))
    }

    fn parse_bitwise(&mut self) -> ParseResult<Option<&'a Expr<'a>>> {
        let mut left = match self.parse_equality()? {
            Some(expr) => expr,
            None => return Ok(None),
        };
        loop {
            // A doubled `&` or `|` belongs to the logical level above.
            let op = match (self.peek_kind(), self.peek_kind_at(1)) {
                (Some(TokenKind::And), next) if next != Some(&TokenKind::And) => BinaryOp::BitAnd,
                (Some(TokenKind::Pipe), next) if next != Some(&TokenKind::Pipe) => BinaryOp::BitOr,
                _ => break,
            };
            let checkpoint = self.checkpoint();
            self.advance();
            let right = match self.parse_equality()? {
                Some(expr) => expr,
                None => {
                    self.restore(checkpoint);
                    break;
                }
            };
            left = self.alloc_expr(ExprKind::Binary { op, left, right });
        }
        Ok(Some(left))
    }

    fn parse_equality(&mut self) -> ParseResult<Option<&'a Expr<'a>>> {
        let mut left = match self.parse_comparison()? {
            Some(expr) => expr,
            None => return Ok(None),
        };
        // `==` is two adjacent `=` tokens; a single `=` is never an
        // expression operator.
        while self.peek_kind() == Some(&TokenKind::Eq)
            && self.peek_kind_at(1) == Some(&TokenKind::Eq)
        {
            let checkpoint = self.checkpoint();
            self.advance();
            self.advance();
            let right = match self.parse_comparison()? {
                Some(expr) => expr,
                None => {
                    self.restore(checkpoint);
                    break;
                }
            };
            left = self.alloc_expr(ExprKind::Binary {
                op: BinaryOp::Eq,
                left,
                right,
            });
        }
        Ok(Some(left))
    }

    fn parse_comparison(&mut self) -> ParseResult<Option<&'a Expr<'a>>> {
        let mut left = match self.parse_additive()? {
            Some(expr) => expr,
            None => return Ok(None),
        };
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::RightArrow) => BinaryOp::Greater,
                Some(TokenKind::LeftArrow) => BinaryOp::Less,
                _ => break,
            };
            let checkpoint = self.checkpoint();
            self.advance();
            let right = match self.parse_additive()? {
                Some(expr) => expr,
                None => {
                    self.restore(checkpoint);
                    break;
                }
            };
            left = self.alloc_expr(ExprKind::Binary { op, left, right });
        }
        Ok(Some(left))
    }

    fn parse_additive(&mut self) -> ParseResult<Option<&'a Expr<'a>>> {
        let mut left = match self.parse_multiplicative()? {
            Some(expr) => expr,
            None => return Ok(None),
        };
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Subtract,
                _ => break,
            };
            let checkpoint = self.checkpoint();
            self.advance();
            let right = match self.parse_multiplicative()? {
                Some(expr) => expr,
                None => {
                    self.restore(checkpoint);
                    break;
                }
            };
            left = self.alloc_expr(ExprKind::Binary { op, left, right });
        }
        Ok(Some(left))
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Option<&'a Expr<'a>>> {
        let mut left = match self.parse_unary()? {
            Some(expr) => expr,
            None => return Ok(None),
        };
        while self.peek_kind() == Some(&TokenKind::Star) {
            let checkpoint = self.checkpoint();
            self.advance();
            let right = match self.parse_unary()? {
                Some(expr) => expr,
                None => {
                    self.restore(checkpoint);
                    break;
                }
            };
            left = self.alloc_expr(ExprKind::Binary {
                op: BinaryOp::Multiply,
                left,
                right,
            });
        }
        Ok(Some(left))
    }

    fn parse_unary(&mut self) -> ParseResult<Option<&'a Expr<'a>>> {
        let op = match self.peek_kind() {
            Some(TokenKind::Bang) => Some(UnaryOp::Not),
            Some(TokenKind::Star) => Some(UnaryOp::Deref),
            Some(TokenKind::Minus) => Some(UnaryOp::Negate),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_postfix();
        };

        let checkpoint = self.checkpoint();
        self.advance();
        match self.parse_unary()? {
            Some(operand) => Ok(Some(self.alloc_expr(ExprKind::Unary { op, operand }))),
            None => {
                self.restore(checkpoint);
                Ok(None)
            }
        }
    }

    fn parse_postfix(&mut self) -> ParseResult<Option<&'a Expr<'a>>> {
        let mut expr = match self.parse_primary()? {
            Some(expr) => expr,
            None => return Ok(None),
        };
        while self.peek_kind() == Some(&TokenKind::Dot) {
            self.advance();
            let field = match self.eat_ident() {
                Some(field) => field,
                None => return Err(self.fatal("expected a field name after `.`.")),
            };
            expr = self.alloc_expr(ExprKind::Member { base: expr, field });
        }
        Ok(Some(expr))
    }

    fn parse_primary(&mut self) -> ParseResult<Option<&'a Expr<'a>>> {
        if self.eat(&TokenKind::OpenRound) {
            let inner = match self.parse_expression()? {
                Some(expr) => expr,
                None => return Ok(None),
            };
            if !self.eat(&TokenKind::CloseRound) {
                return Err(self.fatal("expected a closing `)`."));
            }
            return Ok(Some(self.alloc_expr(ExprKind::Group(inner))));
        }

        if self.eat(&TokenKind::True) {
            return Ok(Some(self.alloc_expr(ExprKind::Literal(Literal::Bool(true)))));
        }
        if self.eat(&TokenKind::False) {
            return Ok(Some(self.alloc_expr(ExprKind::Literal(Literal::Bool(false)))));
        }
        if self.eat(&TokenKind::Null) {
            return Ok(Some(self.alloc_expr(ExprKind::Literal(Literal::Null))));
        }
        if let Some(value) = self.eat_char() {
            return Ok(Some(self.alloc_expr(ExprKind::Literal(Literal::Char(value)))));
        }
        if let Some(sym) = self.eat_str() {
            return Ok(Some(self.alloc_expr(ExprKind::Literal(Literal::Str(sym)))));
        }
        if let Some(value) = self.eat_numeric() {
            return Ok(Some(
                self.alloc_expr(ExprKind::Literal(Literal::Numeric(value))),
            ));
        }

        if self.check(&TokenKind::Struct) || self.check(&TokenKind::Enum) {
            return self.try_parse(parse_struct_enum_literal);
        }

        if self.peek_kind_at(1) == Some(&TokenKind::OpenRound) {
            if let Some(call) = self.try_parse(parse_call)? {
                return Ok(Some(call));
            }
        }
        if let Some(name) = self.eat_ident() {
            let literal = if self.is_hole(name) {
                Literal::Hole
            } else {
                Literal::Name(name)
            };
            return Ok(Some(self.alloc_expr(ExprKind::Literal(literal))));
        }

        Ok(None)
    }
}

fn parse_call<'a, 'int>(p: &mut Parser<'a, 'int>) -> ParseResult<Option<&'a Expr<'a>>> {
    let callee = match p.eat_ident() {
        Some(callee) => callee,
        None => return Ok(None),
    };
    if !p.eat(&TokenKind::OpenRound) {
        return Ok(None);
    }

    let mut args = Vec::new();
    if !p.check(&TokenKind::CloseRound) {
        loop {
            let arg = match p.parse_expression()? {
                Some(arg) => arg,
                None => return Ok(None),
            };
            args.push(arg);
            if !p.eat(&TokenKind::Comma) {
                break;
            }
        }
    }
    if !p.eat(&TokenKind::CloseRound) {
        return Ok(None);
    }

    Ok(Some(p.alloc_expr(ExprKind::Call { callee, args })))
}

/// `struct Name { field = expr, ... }` or `enum Name { variant = expr }`.
fn parse_struct_enum_literal<'a, 'int>(
    p: &mut Parser<'a, 'int>,
) -> ParseResult<Option<&'a Expr<'a>>> {
    let is_struct = if p.eat(&TokenKind::Struct) {
        true
    } else if p.eat(&TokenKind::Enum) {
        false
    } else {
        return Ok(None);
    };

    let name = match p.eat_ident() {
        Some(name) => name,
        None => return Ok(None),
    };
    if !p.eat(&TokenKind::OpenCurly) {
        return Ok(None);
    }

    let mut inits = Vec::new();
    loop {
        let field = match p.eat_ident() {
            Some(field) => field,
            None => return Ok(None),
        };
        if !p.eat(&TokenKind::Eq) {
            return Ok(None);
        }
        let value = match p.parse_expression()? {
            Some(value) => value,
            None => return Ok(None),
        };
        inits.push(FieldInit { name: field, value });
        if !p.eat(&TokenKind::Comma) {
            break;
        }
    }
    if !p.eat(&TokenKind::CloseCurly) {
        return Ok(None);
    }

    let literal = if is_struct {
        Literal::Struct { name, inits }
    } else {
        Literal::Enum { name, inits }
    };
    Ok(Some(p.alloc_expr(ExprKind::Literal(literal))))
}
