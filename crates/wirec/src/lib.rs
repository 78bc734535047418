//! Compiler for a small schema language describing messages and procedures exchanged between
//! a server and its clients.
//!
//! The pipeline is [`lexer`] -> [`parse`] -> [`resolve`] -> [`opcodes`] -> [`emit`], driven by
//! [`compile::compile_schema`]. It produces three Rust modules that build against
//! `wirec-runtime`.

pub mod ast;
pub mod compile;
pub mod diagnostics;
pub mod emit;
pub mod language;
pub mod lexer;
pub mod naming;
pub mod opcodes;
pub mod parse;
pub mod resolve;
pub mod types;
pub mod validate;

mod util;

pub use compile::{compile_schema, load_schema, CompileOptions, CompileOutput};
pub use diagnostics::{Diagnostic, DiagnosticCode};
