//! Reserved words of the pixie language.
//!
//! The lexer only knows about `true` / `false`; every other keyword is
//! an ordinary label that the parser or compiler gives meaning to.
//! This table is the single place those words are spelled out.

pub const FUNCTION: &str = "fn";
pub const NUMBER: &str = "num";
pub const STRING: &str = "str";
pub const BOOLEAN: &str = "bool";
pub const LIST: &str = "list";
pub const MAP: &str = "map";
pub const OBJECT: &str = "obj";
pub const TRUE: &str = "true";
pub const FALSE: &str = "false";

/// Target-language qualifier for variables outside the global scope.
pub const LOCAL: &str = "local";

/// How a reserved word is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordKind {
    /// Built-in type name (`num`, `list`, ...).
    Type,
    /// Boolean literal.
    Literal,
    /// Reserved for future syntax.
    Reserved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyword {
    pub text: &'static str,
    pub kind: KeywordKind,
}

/// Words that may not be used as a variable or object name.
pub const ILLEGAL_NAMES: &[Keyword] = &[
    Keyword {
        text: FUNCTION,
        kind: KeywordKind::Reserved,
    },
    Keyword {
        text: NUMBER,
        kind: KeywordKind::Type,
    },
    Keyword {
        text: STRING,
        kind: KeywordKind::Type,
    },
    Keyword {
        text: BOOLEAN,
        kind: KeywordKind::Type,
    },
    Keyword {
        text: LIST,
        kind: KeywordKind::Type,
    },
    Keyword {
        text: MAP,
        kind: KeywordKind::Type,
    },
    Keyword {
        text: TRUE,
        kind: KeywordKind::Literal,
    },
    Keyword {
        text: FALSE,
        kind: KeywordKind::Literal,
    },
];

/// Look up a reserved word by its text.
///
/// The table is tiny, so this is a linear scan.
pub fn find_keyword(text: &str) -> Option<&'static Keyword> {
    ILLEGAL_NAMES.iter().find(|keyword| keyword.text == text)
}

pub fn is_illegal_name(text: &str) -> bool {
    find_keyword(text).is_some()
}

pub fn is_boolean_literal(text: &str) -> bool {
    text == TRUE || text == FALSE
}
