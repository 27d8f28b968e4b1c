//! End-to-end compilation pipeline: source text → lexer → parser →
//! context builder → soundness checker → type checker → C emitter.
//! Each stage either succeeds with an enriched representation or stops
//! the pipeline with a diagnostic anchored at a source position.

use std::fs;
use std::path::Path;

use crate::arena::{Arena, AstContext};
use crate::context::contextualise;
use crate::error::Diagnostic;
use crate::intern::Interner;
use crate::lexer::Lexer;
use crate::lowering::{generate_c, CArtifacts};
use crate::parser::Parser;
use crate::soundness::soundness_check;
use crate::typecheck::type_check;

pub const HEADER_FILE_NAME: &str = "c_output.h";
pub const SOURCE_FILE_NAME: &str = "c_output.c";

/// Compile one source file to its C header and implementation.
pub fn compile_source(source: &str, file_name: &str) -> Result<CArtifacts, CompileError> {
    let fail = |diagnostic: Diagnostic| CompileError::Diagnostic {
        file: file_name.to_string(),
        diagnostic,
    };

    let mut interner = Interner::new();
    let tokens = Lexer::new(source, &mut interner).tokenize();

    let expr_arena = Arena::new();
    let stmt_arena = Arena::new();
    let ctx = AstContext::new(&expr_arena, &stmt_arena);

    let parser = Parser::new(tokens, &mut interner, ctx);
    let file = parser.parse_file().map_err(fail)?;

    let (global, context) = contextualise(&file, &interner).map_err(fail)?;
    soundness_check(&file, &global, &context, &interner).map_err(fail)?;
    type_check(&file, &global, &context, &interner).map_err(fail)?;

    Ok(generate_c(&file, &global, &context, &interner))
}

pub fn compile_file(path: &Path) -> Result<CArtifacts, CompileError> {
    let source = fs::read_to_string(path).map_err(|e| CompileError::Io(e.to_string()))?;
    let file_name = path.to_string_lossy();
    compile_source(&source, &file_name)
}

/// Write the artifacts as `c_output.h` / `c_output.c` under `out_dir`,
/// creating the directory if needed.
pub fn write_artifacts(artifacts: &CArtifacts, out_dir: &Path) -> Result<(), CompileError> {
    fs::create_dir_all(out_dir).map_err(|e| CompileError::Io(e.to_string()))?;
    fs::write(out_dir.join(HEADER_FILE_NAME), &artifacts.header)
        .map_err(|e| CompileError::Io(e.to_string()))?;
    fs::write(out_dir.join(SOURCE_FILE_NAME), &artifacts.source)
        .map_err(|e| CompileError::Io(e.to_string()))?;
    Ok(())
}

#[derive(Debug)]
pub enum CompileError {
    Diagnostic {
        file: String,
        diagnostic: Diagnostic,
    },
    Io(String),
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Diagnostic { file, diagnostic } => {
                write!(f, "{}", diagnostic.render(file).trim_end())
            }
            CompileError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for CompileError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn squish(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn compiles_a_function_to_header_and_source() {
        let artifacts =
            compile_source("fn add(a: i32, b: i32) -> i32 { return a + b; }", "t.sm").unwrap();
        assert!(squish(&artifacts.header).contains(&squish("int add(int a, int b);")));
        assert!(squish(&artifacts.source).contains(&squish("int add(int a, int b){return a + b;}")));
    }

    #[test]
    fn emission_is_idempotent() {
        let source = "struct Point { x: i32, y: i32 } \
                      fn mk() -> struct Point { p: struct Point = struct Point { x = 1, y = 2 }; return p; }";
        let first = compile_source(source, "t.sm").unwrap();
        let second = compile_source(source, "t.sm").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn diagnostics_name_the_file_row_and_column() {
        let err = compile_source("fn f() -> i32 { x = ; }", "bad.sm").unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.starts_with("bad.sm:1:"), "got: {}", rendered);
        assert!(rendered.contains("error:"), "got: {}", rendered);
    }

    #[test]
    fn stage_failure_stops_the_pipeline() {
        // A type error: no artifacts are produced.
        let err = compile_source("fn f() -> i32 { x: i32 = true; return x; }", "t.sm");
        assert!(err.is_err());
    }
}
