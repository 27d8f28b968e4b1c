use super::{ExprParsing, ParseResult, Parser, PatternParsing, TypeParsing};
use crate::ast::{Case, Stmt, StmtKind, TypeKind};
use crate::token::TokenKind;

/// Statement grammar. Inside a function body the alternatives are tried
/// in a fixed order: return, break, action, binding, if, block, while,
/// switch. The first committed success wins; fatal errors (a malformed
/// binding, a missing semicolon, an unclosed block) abort the parse.
pub trait StmtParsing<'a> {
    fn parse_statement(&mut self) -> ParseResult<Option<&'a Stmt<'a>>>;
    fn parse_block_statement(&mut self) -> ParseResult<Option<&'a Stmt<'a>>>;
    fn parse_type_declaration(&mut self) -> ParseResult<Option<&'a Stmt<'a>>>;
    fn parse_include_statement(&mut self) -> ParseResult<Option<&'a Stmt<'a>>>;
}

impl<'a, 'int> StmtParsing<'a> for Parser<'a, 'int> {
    fn parse_statement(&mut self) -> ParseResult<Option<&'a Stmt<'a>>> {
        if let Some(stmt) = self.try_parse(parse_return_statement)? {
            return Ok(Some(stmt));
        }
        if let Some(stmt) = self.try_parse(parse_break_statement)? {
            return Ok(Some(stmt));
        }
        if let Some(stmt) = self.try_parse(parse_action_statement)? {
            return Ok(Some(stmt));
        }
        if let Some(stmt) = self.try_parse(parse_binding_statement)? {
            return Ok(Some(stmt));
        }
        if let Some(stmt) = self.try_parse(parse_if_statement)? {
            return Ok(Some(stmt));
        }
        if let Some(stmt) = self.try_parse(|p| p.parse_block_statement())? {
            return Ok(Some(stmt));
        }
        if let Some(stmt) = self.try_parse(parse_while_statement)? {
            return Ok(Some(stmt));
        }
        if let Some(stmt) = self.try_parse(parse_switch_statement)? {
            return Ok(Some(stmt));
        }
        Ok(None)
    }

    fn parse_block_statement(&mut self) -> ParseResult<Option<&'a Stmt<'a>>> {
        let pos = self.current_pos();
        if !self.eat(&TokenKind::OpenCurly) {
            return Ok(None);
        }

        let mut statements = Vec::new();
        loop {
            if self.eat(&TokenKind::CloseCurly) {
                break;
            }
            if self.at_end() {
                return Err(self.fatal("expected a closing `}`."));
            }
            match self.parse_statement()? {
                Some(stmt) => statements.push(stmt),
                None => return Err(self.fatal("expected a statement.")),
            }
        }

        Ok(Some(self.alloc_stmt(StmtKind::Block(statements), pos)))
    }

    /// Top-level declaration. Function types carry a block body; struct
    /// and enum declarations stand alone.
    fn parse_type_declaration(&mut self) -> ParseResult<Option<&'a Stmt<'a>>> {
        let pos = self.current_pos();
        let ty = match self.parse_type(true, false)? {
            Some(ty) => ty,
            None => return Ok(None),
        };

        if !matches!(ty.kind, TypeKind::Function { .. }) {
            return Ok(Some(
                self.alloc_stmt(StmtKind::TypeDeclaration { ty, body: None }, pos),
            ));
        }

        let body = match self.parse_block_statement()? {
            Some(body) => body,
            None => return Err(self.fatal("a function declaration requires a body.")),
        };
        Ok(Some(self.alloc_stmt(
            StmtKind::TypeDeclaration {
                ty,
                body: Some(body),
            },
            pos,
        )))
    }

    /// `# include <sys.header>` or `# include "local.h"`.
    fn parse_include_statement(&mut self) -> ParseResult<Option<&'a Stmt<'a>>> {
        let pos = self.current_pos();
        if !self.eat(&TokenKind::Hash) {
            return Ok(None);
        }
        if self.eat_ident().is_none() {
            return Ok(None);
        }

        if self.eat(&TokenKind::LeftArrow) {
            let base = match self.eat_ident() {
                Some(base) => base,
                None => return Ok(None),
            };
            if !self.eat(&TokenKind::Dot) {
                return Ok(None);
            }
            let extension = match self.eat_ident() {
                Some(extension) => extension,
                None => return Ok(None),
            };
            if !self.eat(&TokenKind::RightArrow) {
                return Ok(None);
            }
            let path = format!(
                "{}.{}",
                self.interner.resolve(base),
                self.interner.resolve(extension)
            );
            return Ok(Some(self.alloc_stmt(
                StmtKind::Include {
                    path,
                    external: true,
                },
                pos,
            )));
        }

        if let Some(sym) = self.eat_str() {
            let path = self.interner.resolve(sym).to_string();
            return Ok(Some(self.alloc_stmt(
                StmtKind::Include {
                    path,
                    external: false,
                },
                pos,
            )));
        }

        Ok(None)
    }
}

fn parse_return_statement<'a, 'int>(p: &mut Parser<'a, 'int>) -> ParseResult<Option<&'a Stmt<'a>>> {
    let pos = p.current_pos();
    if !p.eat(&TokenKind::Return) {
        return Ok(None);
    }
    let value = match p.parse_expression()? {
        Some(value) => value,
        None => return Ok(None),
    };
    if !p.eat(&TokenKind::Semicolon) {
        return Err(p.fatal("a statement must end with a semicolon."));
    }
    Ok(Some(p.alloc_stmt(StmtKind::Return(value), pos)))
}

fn parse_break_statement<'a, 'int>(p: &mut Parser<'a, 'int>) -> ParseResult<Option<&'a Stmt<'a>>> {
    let pos = p.current_pos();
    if !p.eat(&TokenKind::Break) {
        return Ok(None);
    }
    if !p.eat(&TokenKind::Semicolon) {
        return Err(p.fatal("a statement must end with a semicolon."));
    }
    Ok(Some(p.alloc_stmt(StmtKind::Break, pos)))
}

fn parse_action_statement<'a, 'int>(p: &mut Parser<'a, 'int>) -> ParseResult<Option<&'a Stmt<'a>>> {
    let pos = p.current_pos();
    let expr = match p.parse_expression()? {
        Some(expr) => expr,
        None => return Ok(None),
    };
    // A missing semicolon here is a neutral rejection, not an error:
    // `x = 5;` reaches this alternative as the expression `x` and must
    // fall through to the binding alternative.
    if !p.eat(&TokenKind::Semicolon) {
        return Ok(None);
    }
    Ok(Some(p.alloc_stmt(StmtKind::Action(expr), pos)))
}

fn parse_binding_statement<'a, 'int>(p: &mut Parser<'a, 'int>) -> ParseResult<Option<&'a Stmt<'a>>> {
    let pos = p.current_pos();
    let name = match p.eat_ident() {
        Some(name) => name,
        None => return Ok(None),
    };

    let annotation = if p.eat(&TokenKind::Colon) {
        match p.parse_type(false, true)? {
            Some(ty) => Some(ty),
            None => {
                return Err(p.fatal(
                    "a type annotation is required after a `:` in a binding statement.",
                ))
            }
        }
    } else {
        None
    };

    if !p.eat(&TokenKind::Eq) {
        return Err(p.fatal("expected a `=`."));
    }

    let bind_failure = |p: &Parser<'a, 'int>| {
        let name = p.interner.resolve(name).to_string();
        p.fatal(format!(
            "the variable `{}` must be bound to a valid expression.",
            name
        ))
    };
    let value = match p.parse_expression() {
        Ok(Some(value)) => value,
        Ok(None) => return Err(bind_failure(p)),
        // The specific failure inside the expression survives as the
        // inner cause.
        Err(inner) => return Err(bind_failure(p).caused_by(inner)),
    };

    if !p.eat(&TokenKind::Semicolon) {
        return Err(p.fatal("a statement must end with a semicolon."));
    }

    Ok(Some(p.alloc_stmt(
        StmtKind::Binding {
            name,
            annotation,
            value,
        },
        pos,
    )))
}

fn parse_if_statement<'a, 'int>(p: &mut Parser<'a, 'int>) -> ParseResult<Option<&'a Stmt<'a>>> {
    let pos = p.current_pos();
    if !p.eat(&TokenKind::If) {
        return Ok(None);
    }
    if !p.eat(&TokenKind::OpenRound) {
        return Ok(None);
    }
    let condition = match p.parse_expression()? {
        Some(condition) => condition,
        None => return Err(p.fatal("expected a condition expression.")),
    };
    if !p.eat(&TokenKind::CloseRound) {
        return Err(p.fatal("expected a closing `)`."));
    }
    let then_branch = match p.parse_block_statement()? {
        Some(block) => block,
        None => return Err(p.fatal("expected a block after the condition.")),
    };

    let else_branch = if p.eat(&TokenKind::Else) {
        if let Some(nested) = p.try_parse(parse_if_statement)? {
            Some(nested)
        } else if let Some(block) = p.parse_block_statement()? {
            Some(block)
        } else {
            return Err(p.fatal("expected a block or `if` after `else`."));
        }
    } else {
        None
    };

    Ok(Some(p.alloc_stmt(
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        },
        pos,
    )))
}

fn parse_while_statement<'a, 'int>(p: &mut Parser<'a, 'int>) -> ParseResult<Option<&'a Stmt<'a>>> {
    let pos = p.current_pos();
    if !p.eat(&TokenKind::While) {
        return Ok(None);
    }
    if !p.eat(&TokenKind::OpenRound) {
        return Ok(None);
    }
    let condition = match p.parse_expression()? {
        Some(condition) => condition,
        None => return Err(p.fatal("expected a condition expression.")),
    };
    if !p.eat(&TokenKind::CloseRound) {
        return Err(p.fatal("expected a closing `)`."));
    }
    let body = match p.parse_block_statement()? {
        Some(block) => block,
        None => return Err(p.fatal("expected a block after the condition.")),
    };

    Ok(Some(p.alloc_stmt(StmtKind::While { condition, body }, pos)))
}

fn parse_switch_statement<'a, 'int>(p: &mut Parser<'a, 'int>) -> ParseResult<Option<&'a Stmt<'a>>> {
    let pos = p.current_pos();
    if !p.eat(&TokenKind::Switch) {
        return Ok(None);
    }
    if !p.eat(&TokenKind::OpenRound) {
        return Ok(None);
    }
    let scrutinee = match p.parse_expression()? {
        Some(scrutinee) => scrutinee,
        None => return Err(p.fatal("expected an expression to switch on.")),
    };
    if !p.eat(&TokenKind::CloseRound) {
        return Err(p.fatal("expected a closing `)`."));
    }
    if !p.eat(&TokenKind::OpenCurly) {
        return Err(p.fatal("expected a `{`."));
    }

    let mut cases = Vec::new();
    loop {
        if p.eat(&TokenKind::CloseCurly) {
            break;
        }
        match parse_case_statement(p)? {
            Some(case) => cases.push(case),
            None => return Err(p.fatal("expected a `case`.")),
        }
    }

    Ok(Some(p.alloc_stmt(StmtKind::Switch { scrutinee, cases }, pos)))
}

fn parse_case_statement<'a, 'int>(p: &mut Parser<'a, 'int>) -> ParseResult<Option<Case<'a>>> {
    if !p.eat(&TokenKind::Case) {
        return Ok(None);
    }
    let pattern = match p.parse_pattern()? {
        Some(pattern) => pattern,
        None => return Err(p.fatal("expected a pattern.")),
    };
    if !p.eat(&TokenKind::Colon) {
        return Err(p.fatal("expected a `:` after the case pattern."));
    }
    let body = match p.parse_statement()? {
        Some(body) => body,
        None => return Err(p.fatal("expected a statement.")),
    };
    Ok(Some(Case { pattern, body }))
}
