//! # Wick
//!
//! A small dynamically-typed scripting language with first-class lambdas,
//! prototype-based objects with public/private visibility and inheritance,
//! persistent lexical scopes, and ternary/short-circuit expressions.
//!
//! The crate is organized as a classic three-stage pipeline:
//!
//! ```text
//! source text -> Lexer -> tokens -> Parser -> statements -> Interpreter
//! ```
//!
//! Diagnostics from every stage flow into a shared [`reporter::ErrorReporter`];
//! interpretation only runs when lexing and parsing were clean.

pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod reporter;
