//! Helpers for tests that need a program analysed up to a given stage.

use crate::arena::{Arena, AstContext};
use crate::context::{contextualise, Context, GlobalContext};
use crate::error::Diagnostic;
use crate::intern::Interner;
use crate::lexer::Lexer;
use crate::parser::{ParsedFile, Parser};
use crate::soundness::soundness_check;
use crate::typecheck::type_check;

/// Parse and contextualise `source`, then hand the tables to `check`.
/// Panics if parsing or context construction fails.
pub fn with_analysed<R>(
    source: &str,
    check: impl FnOnce(&ParsedFile<'_>, &GlobalContext, &Context, &Interner) -> R,
) -> R {
    let mut interner = Interner::new();
    let tokens = Lexer::new(source, &mut interner).tokenize();
    let expr_arena = Arena::new();
    let stmt_arena = Arena::new();
    let ctx = AstContext::new(&expr_arena, &stmt_arena);
    let file = Parser::new(tokens, &mut interner, ctx)
        .parse_file()
        .expect("source should parse");
    let (global, context) = contextualise(&file, &interner).expect("source should contextualise");
    check(&file, &global, &context, &interner)
}

/// Run the analysis stages in pipeline order and return the first
/// diagnostic. Panics if the program is clean.
pub fn analyse_error(source: &str) -> Diagnostic {
    let mut interner = Interner::new();
    let tokens = Lexer::new(source, &mut interner).tokenize();
    let expr_arena = Arena::new();
    let stmt_arena = Arena::new();
    let ctx = AstContext::new(&expr_arena, &stmt_arena);
    let file = Parser::new(tokens, &mut interner, ctx)
        .parse_file()
        .expect("source should parse");

    let (global, context) = match contextualise(&file, &interner) {
        Ok(tables) => tables,
        Err(diagnostic) => return diagnostic,
    };
    if let Err(diagnostic) = soundness_check(&file, &global, &context, &interner) {
        return diagnostic;
    }
    match type_check(&file, &global, &context, &interner) {
        Ok(()) => panic!("expected an analysis error for:\n{}", source),
        Err(diagnostic) => diagnostic,
    }
}
