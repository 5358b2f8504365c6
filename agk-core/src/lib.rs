//! Core of the AGK natural-language compiler.
//!
//! The pipeline is:
//!
//!   source .agk
//!     -> lexer     (tokens, with INDENT/DEDENT layout markers)
//!     -> parser    (surface AST)
//!     -> semantic  (scoped two-pass analysis, fail-soft diagnostics)
//!     -> codegen   (python, javascript, kotlin, swift, cpp, csharp)
//!
//! Front ends (the CLI and its interactive loop) should depend on this
//! crate and call [`compile`] rather than reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod span;
pub mod diagnostic;
pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing, parsing and the syntax tree
// ---------------------------------------------------------------------

pub mod lexer;
pub mod ast;
pub mod visit;
pub mod parser;
pub mod printer;

// ---------------------------------------------------------------------
// Semantic layers: types, scopes, builtins, analysis
// ---------------------------------------------------------------------

pub mod types;
pub mod scope;
pub mod builtins;
pub mod semantic;

// ---------------------------------------------------------------------
// Back-end: platforms, code generation and compiler orchestration
// ---------------------------------------------------------------------

pub mod platform;
pub mod codegen;
pub mod sources;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{
    CompilationArtifact, CompileOptions, CompiledFile, compile, compile_file, compile_tree,
};
pub use diagnostic::{Category, Diagnostic, Severity};
pub use error::CoreError;
pub use platform::Platform;
