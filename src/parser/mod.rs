mod expr;
mod pattern;
mod stmt;
mod types;

#[cfg(test)]
mod tests;

pub use expr::ExprParsing;
pub use pattern::PatternParsing;
pub use stmt::StmtParsing;
pub use types::TypeParsing;

use std::collections::HashMap;

use crate::arena::AstContext;
use crate::ast::{Expr, ExprId, ExprKind, Stmt, StmtId, StmtKind};
use crate::error::Diagnostic;
use crate::intern::{Interner, Symbol};
use crate::token::{Position, Token, TokenKind};

/// `Ok(Some(_))` is a committed success, `Ok(None)` a neutral rejection
/// (the cursor is rewound and the next alternative may be tried), and
/// `Err(_)` a fatal parse error that aborts the whole parse.
pub type ParseResult<T> = Result<T, Diagnostic>;

/// Everything the parser learned about one source file: the top-level
/// statements and the statement-id → source-position table used by
/// every later stage to anchor diagnostics.
#[derive(Debug)]
pub struct ParsedFile<'a> {
    pub statements: Vec<&'a Stmt<'a>>,
    pub metadata: HashMap<StmtId, Position>,
}

impl<'a> ParsedFile<'a> {
    pub fn position_of(&self, id: StmtId) -> Position {
        self.metadata.get(&id).copied().unwrap_or_default()
    }
}

#[derive(Clone, Copy)]
pub(super) struct Checkpoint {
    pos: usize,
}

pub struct Parser<'a, 'int> {
    pub(super) tokens: Vec<Token>,
    pub(super) current: usize,
    pub(super) interner: &'int mut Interner,
    pub(super) ctx: AstContext<'a>,
    next_expr_id: u32,
    next_stmt_id: u32,
    metadata: HashMap<StmtId, Position>,
}

impl<'a, 'int> Parser<'a, 'int> {
    pub fn new(tokens: Vec<Token>, interner: &'int mut Interner, ctx: AstContext<'a>) -> Self {
        Parser {
            tokens,
            current: 0,
            interner,
            ctx,
            next_expr_id: 0,
            next_stmt_id: 0,
            metadata: HashMap::new(),
        }
    }

    /// Parse a whole file: top-level type declarations and includes
    /// until the token stream is exhausted.
    pub fn parse_file(mut self) -> Result<ParsedFile<'a>, Diagnostic> {
        let mut statements = Vec::new();
        while !self.at_end() {
            match self.parse_top_level_statement()? {
                Some(stmt) => statements.push(stmt),
                None => {
                    return Err(self.fatal("expected a type declaration at the top level."));
                }
            }
        }
        Ok(ParsedFile {
            statements,
            metadata: self.metadata,
        })
    }

    fn parse_top_level_statement(&mut self) -> ParseResult<Option<&'a Stmt<'a>>> {
        if let Some(stmt) = self.try_parse(|p| p.parse_type_declaration())? {
            return Ok(Some(stmt));
        }
        if let Some(stmt) = self.try_parse(|p| p.parse_include_statement())? {
            return Ok(Some(stmt));
        }
        Ok(None)
    }

    // ------------------------------------------------------------------
    // Cursor primitives
    // ------------------------------------------------------------------

    pub(super) fn at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    pub(super) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    pub(super) fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    pub(super) fn peek_kind_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.current + offset).map(|t| &t.kind)
    }

    pub(super) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.current).cloned()?;
        self.current += 1;
        Some(token)
    }

    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    /// Consume the next token when it matches `kind` exactly.
    pub(super) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub(super) fn eat_ident(&mut self) -> Option<Symbol> {
        match self.peek_kind() {
            Some(TokenKind::Ident(sym)) => {
                let sym = *sym;
                self.current += 1;
                Some(sym)
            }
            _ => None,
        }
    }

    pub(super) fn eat_numeric(&mut self) -> Option<f64> {
        match self.peek_kind() {
            Some(TokenKind::Numeric(value)) => {
                let value = *value;
                self.current += 1;
                Some(value)
            }
            _ => None,
        }
    }

    pub(super) fn eat_str(&mut self) -> Option<Symbol> {
        match self.peek_kind() {
            Some(TokenKind::StrLit(sym)) => {
                let sym = *sym;
                self.current += 1;
                Some(sym)
            }
            _ => None,
        }
    }

    pub(super) fn eat_char(&mut self) -> Option<u8> {
        match self.peek_kind() {
            Some(TokenKind::CharLit(byte)) => {
                let byte = *byte;
                self.current += 1;
                Some(byte)
            }
            _ => None,
        }
    }

    /// Position of the token where a failure was detected: the token at
    /// the cursor, or the last token of the file at end of input.
    pub(super) fn current_pos(&self) -> Position {
        self.tokens
            .get(self.current)
            .or_else(|| self.tokens.last())
            .map(|t| t.pos)
            .unwrap_or_default()
    }

    pub(super) fn fatal(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(self.current_pos(), message)
    }

    // ------------------------------------------------------------------
    // Backtracking
    // ------------------------------------------------------------------

    pub(super) fn checkpoint(&self) -> Checkpoint {
        Checkpoint { pos: self.current }
    }

    pub(super) fn restore(&mut self, checkpoint: Checkpoint) {
        self.current = checkpoint.pos;
    }

    /// Run one speculative alternative. A neutral rejection rewinds the
    /// token cursor to where it was; nodes allocated by the failed
    /// attempt are simply abandoned in the arena. Fatal errors pass
    /// through untouched.
    pub(super) fn try_parse<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> ParseResult<Option<T>>,
    ) -> ParseResult<Option<T>> {
        let checkpoint = self.checkpoint();
        match parse(self)? {
            Some(value) => Ok(Some(value)),
            None => {
                self.restore(checkpoint);
                Ok(None)
            }
        }
    }

    // ------------------------------------------------------------------
    // Node construction
    // ------------------------------------------------------------------

    pub(super) fn alloc_expr(&mut self, kind: ExprKind<'a>) -> &'a Expr<'a> {
        let id = ExprId(self.next_expr_id);
        self.next_expr_id += 1;
        self.ctx.alloc_expr(Expr { id, kind })
    }

    pub(super) fn alloc_stmt(&mut self, kind: StmtKind<'a>, pos: Position) -> &'a Stmt<'a> {
        let id = StmtId(self.next_stmt_id);
        self.next_stmt_id += 1;
        self.metadata.insert(id, pos);
        self.ctx.alloc_stmt(Stmt { id, kind })
    }

    pub(super) fn is_hole(&self, sym: Symbol) -> bool {
        self.interner.resolve(sym) == "_"
    }
}
