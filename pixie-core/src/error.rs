use std::path::PathBuf;

use thiserror::Error;

/// Crate-level error returned by the convenience entry points.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read source: {0}")]
    SourceIo(#[from] std::io::Error),
    #[error("unsupported emit format: {0}")]
    UnsupportedFormat(String),
    #[error("sample directory was not found at {0}")]
    MissingSamples(PathBuf),
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("parse error: {0}")]
    Parse(ParseError),
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
}

// A lex error seen by the parser is still a lex error to the caller.
impl From<ParseError> for CoreError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Lex(lex) => CoreError::Lex(lex),
            other => CoreError::Parse(other),
        }
    }
}

/// Errors raised while turning characters into tokens.
///
/// Positions count Unicode scalar values, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated string literal starting at character {position}")]
    UnterminatedString { position: usize },
    #[error("invalid character {character:?} at character {position}")]
    InvalidCharacter { character: char, position: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected token: expected {expected}, got {found}")]
    UnexpectedToken { expected: String, found: String },
    #[error("{what} is empty")]
    EmptyIdentifier { what: &'static str },
    #[error("name {name:?} is a reserved keyword")]
    IllegalKeywordUsed { name: String },
    #[error("unexpected end of input while parsing {parsing}")]
    PrematureEndOfInput { parsing: &'static str },
    #[error("expression nesting is deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
    #[error(transparent)]
    Lex(#[from] LexError),
}

impl ParseError {
    pub(crate) fn unexpected(expected: impl Into<String>, found: impl ToString) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: found.to_string(),
        }
    }
}

/// Errors raised by the type checker and the emitter.
///
/// Call frames add detail through [`CompileError::Context`]; use
/// [`CompileError::root_cause`] to get at the error that started it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("{namespace} {name:?} already exists")]
    Redeclaration {
        namespace: &'static str,
        name: String,
    },
    #[error("variable {name:?} does not exist")]
    UndeclaredVariable { name: String },
    #[error("invalid type assign: wanted {expected}, got {found}")]
    TypeMismatch { expected: String, found: String },
    #[error("unknown type {name:?}")]
    UnknownType { name: String },
    #[error("object {name:?} is not defined")]
    UnresolvedObjectReference { name: String },
    #[error("key {field:?} not found in object {object:?}")]
    UnknownObjectField { object: String, field: String },
    #[error("object {object:?} literal keys must be field names, got {found}")]
    InvalidObjectKey { object: String, found: String },
    #[error("object {name:?} contains itself and has no finite zero value")]
    RecursiveObject { name: String },
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<CompileError>,
    },
}

impl CompileError {
    /// Wrap this error in another frame of context.
    pub fn context(self, context: impl Into<String>) -> Self {
        CompileError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with every context frame stripped.
    pub fn root_cause(&self) -> &CompileError {
        let mut current = self;
        while let CompileError::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// True when the underlying failure is an invalid type assignment.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self.root_cause(), CompileError::TypeMismatch { .. })
    }
}

/// Attach context to the error side of a compile result.
pub(crate) trait ResultExt<T> {
    fn context_with(self, f: impl FnOnce() -> String) -> Result<T, CompileError>;
}

impl<T> ResultExt<T> for Result<T, CompileError> {
    fn context_with(self, f: impl FnOnce() -> String) -> Result<T, CompileError> {
        self.map_err(|err| err.context(f()))
    }
}
