use bumpalo::Bump;

use crate::ast::{Expr, Stmt};

/// Typed arena. Allocations are never freed individually; everything
/// lives until the arena itself is dropped, which is the lifetime of a
/// single compilation.
pub struct Arena<T> {
    bump: Bump,
    _marker: std::marker::PhantomData<T>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Arena {
            bump: Bump::new(),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn alloc(&self, value: T) -> &T {
        self.bump.alloc(value)
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The arenas every AST node is allocated into, bundled so the parser
/// can be handed a single context value.
#[derive(Clone, Copy)]
pub struct AstContext<'a> {
    pub exprs: &'a Arena<Expr<'a>>,
    pub stmts: &'a Arena<Stmt<'a>>,
}

impl<'a> AstContext<'a> {
    pub fn new(exprs: &'a Arena<Expr<'a>>, stmts: &'a Arena<Stmt<'a>>) -> Self {
        AstContext { exprs, stmts }
    }

    pub fn alloc_expr(&self, expr: Expr<'a>) -> &'a Expr<'a> {
        self.exprs.alloc(expr)
    }

    pub fn alloc_stmt(&self, stmt: Stmt<'a>) -> &'a Stmt<'a> {
        self.stmts.alloc(stmt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_returns_stable_references() {
        let arena: Arena<u32> = Arena::new();
        let a = arena.alloc(1);
        let b = arena.alloc(2);
        assert_eq!(*a, 1);
        assert_eq!(*b, 2);
    }

    #[test]
    fn references_survive_many_allocations() {
        let arena: Arena<usize> = Arena::new();
        let refs: Vec<&usize> = (0..4096).map(|i| arena.alloc(i)).collect();
        for (i, r) in refs.iter().enumerate() {
            assert_eq!(**r, i);
        }
    }
}
