//! Command-line interface for the smelt compiler.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use crate::compile::{compile_source, write_artifacts, CompileError};

#[derive(Parser)]
#[command(name = "smelt")]
#[command(about = "The smelt compiler", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a source file to a C header and implementation
    Build {
        /// Input source file
        input: PathBuf,

        /// Directory the generated C is written into
        #[arg(long, default_value = "target")]
        out_dir: PathBuf,
    },
    /// Check a source file without writing any output
    Check {
        /// Input source file
        input: PathBuf,
    },
}

pub fn run_cli() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Build { input, out_dir } => cmd_build(&input, &out_dir),
        Commands::Check { input } => cmd_check(&input),
    }
}

fn compile_or_exit(input: &Path) -> Result<crate::lowering::CArtifacts, Box<dyn std::error::Error>> {
    let source = fs::read_to_string(input)
        .map_err(|e| format!("cannot read `{}`: {}", input.display(), e))?;
    let file_name = input.to_string_lossy();

    match compile_source(&source, &file_name) {
        Ok(artifacts) => Ok(artifacts),
        Err(CompileError::Diagnostic { file, diagnostic }) => {
            eprint!("{}", diagnostic.render(&file));
            if let Some(context) = diagnostic.source_context(&source) {
                eprintln!("{}", context);
            }
            process::exit(1);
        }
        Err(other) => Err(Box::new(other)),
    }
}

fn cmd_build(input: &Path, out_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let artifacts = compile_or_exit(input)?;
    write_artifacts(&artifacts, out_dir)?;
    Ok(())
}

fn cmd_check(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    compile_or_exit(input)?;
    Ok(())
}
