//! smelt: the front end and C-emitting back end of a small
//! statically-typed systems language.
//!
//! A compilation is strictly staged. The lexer turns bytes into a
//! token stream with source positions; the backtracking recursive-
//! descent parser builds an arena-allocated AST; the context builder
//! records, for every statement, the variables visible at that point
//! and, for every expression, its inferred type; the soundness and
//! type checkers validate names, shapes, and type equality; and the C
//! emitter prints a header and an implementation file an ordinary C
//! compiler can take from there.

pub mod arena;
pub mod ast;
pub mod cli;
pub mod compile;
pub mod context;
pub mod error;
pub mod infer;
pub mod intern;
pub mod lexer;
pub mod lowering;
pub mod parser;
pub mod soundness;
pub mod style;
pub mod suggest;
pub mod token;
pub mod typecheck;

#[cfg(test)]
pub mod test_utils;
