//! Core compiler pipeline for the pixie language.
//!
//! The pipeline is:
//!
//!   source .pixie
//!     -> lexer     (tokens, pulled one at a time)
//!     -> parser    (AST rooted at a block)
//!     -> compiler  (type checks and emits target source)
//!
//! The CLI and any other tooling should depend on this crate rather than
//! reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------

pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod keywords;
pub mod lexer;
pub mod parser;
pub mod ast;

// ---------------------------------------------------------------------
// Semantic layers: types and structural checks
// ---------------------------------------------------------------------

pub mod types;
pub mod typecheck;

// ---------------------------------------------------------------------
// Back-end: emission
// ---------------------------------------------------------------------

pub mod compiler;

// ---------------------------------------------------------------------
// Sample corpus
// ---------------------------------------------------------------------

pub mod samples;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{compile, compile_source};
pub use error::{CompileError, CoreError, LexError, ParseError};
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::parse;
