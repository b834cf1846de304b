//! # Wick
//!
//! This binary is the interpreter for the Wick scripting language. It wires
//! the lexer, parser, and tree-walking evaluator into a single pipeline.

mod cli;

use cli::*;

use std::{fs, process};

use anyhow::Context;
use log::{error, info};
use wick::{interpreter::Interpreter, lexer::Lexer, parser::Parser, reporter::ErrorReporter};

fn main() -> anyhow::Result<()> {
    let args = Cli::init();

    simple_logger::init_with_level(args.verbosity.into())?;

    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("Could not read file '{}'", args.file.to_string_lossy()))?;

    let mut reporter = ErrorReporter::default();

    let tokens = Lexer::new(&source, &mut reporter).lex();
    if args.dump_tokens {
        info!("Tokens:\n{tokens:#?}");
    }

    let statements = Parser::new(tokens, &mut reporter).parse();
    if args.dump_ast {
        info!("Parsed statements:\n{statements:#?}");
    }

    // Placeholders from synchronized parse errors never run: any diagnostic
    // skips interpretation entirely.
    if reporter.had_error() {
        process::exit(1);
    }

    let statements: Vec<_> = statements.into_iter().flatten().collect();
    let interpreter = Interpreter::new();
    if let Err(runtime_error) = interpreter.interpret(&statements) {
        match &runtime_error.token {
            Some(token) => reporter.report(token, &runtime_error.message),
            None => error!("{runtime_error}"),
        }
        process::exit(1);
    }

    Ok(())
}
