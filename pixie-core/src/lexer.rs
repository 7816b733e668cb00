//! Lexer for pixie.
//!
//! Tokens are produced lazily: the parser pulls them one at a time with
//! [`Lexer::next_token`] and looks one token ahead with
//! [`Lexer::peek_token`]. End of input is `Ok(None)`, never an error.

use std::fmt;

use log::trace;

use crate::error::LexError;
use crate::keywords;

/// Kind of a token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Placeholder kind; the lexer never produces it.
    Undefined,

    // Labels and literals
    Label,
    NumberLiteral,
    StringLiteral,
    BooleanLiteral, // true / false

    // Arithmetic
    Plus,         // +
    Minus,        // -
    Asterisk,     // *
    ForwardSlash, // /

    // Punctuation
    OpenParen,    // (
    CloseParen,   // )
    Comma,        // ,
    Equal,        // =
    Colon,        // :
    OpenBracket,  // [
    CloseBracket, // ]
    Period,       // .
    OpenBrace,    // {
    CloseBrace,   // }

    // Comparison
    EqualEqual,       // ==
    BangEqual,        // !=
    LessThan,         // <
    LessThanEqual,    // <=
    GreaterThan,      // >
    GreaterThanEqual, // >=
}

impl TokenKind {
    pub fn name(self) -> &'static str {
        use TokenKind::*;
        match self {
            Undefined => "Undefined",
            Label => "Label",
            NumberLiteral => "NumberLiteral",
            StringLiteral => "StringLiteral",
            BooleanLiteral => "BooleanLiteral",
            Plus => "Plus",
            Minus => "Minus",
            Asterisk => "Asterisk",
            ForwardSlash => "ForwardSlash",
            OpenParen => "OpenParen",
            CloseParen => "CloseParen",
            Comma => "Comma",
            Equal => "Equal",
            Colon => "Colon",
            OpenBracket => "OpenBracket",
            CloseBracket => "CloseBracket",
            Period => "Period",
            OpenBrace => "OpenBrace",
            CloseBrace => "CloseBrace",
            EqualEqual => "EqualEqual",
            BangEqual => "BangEqual",
            LessThan => "LessThan",
            LessThanEqual => "LessThanEqual",
            GreaterThan => "GreaterThan",
            GreaterThanEqual => "GreaterThanEqual",
        }
    }

    /// Whether the token's text carries information beyond its kind.
    pub fn has_payload(self) -> bool {
        matches!(
            self,
            TokenKind::Label
                | TokenKind::NumberLiteral
                | TokenKind::StringLiteral
                | TokenKind::BooleanLiteral
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single token: its kind and the text it was lexed from.
///
/// String literals hold their contents without the surrounding quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.has_payload() {
            write!(f, "{} {:?}", self.kind, self.text)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

/// Start lexing `source`. The returned lexer is also an iterator of
/// `Result<Token, LexError>` that ends at end of input.
pub fn tokenize(source: &str) -> Lexer {
    Lexer::new(source)
}

/// Pull-based lexer over the code points of a source string.
#[derive(Debug, Clone)]
pub struct Lexer {
    chars: Vec<char>,
    index: usize,
    peeked: Option<Token>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            index: 0,
            peeked: None,
        }
    }

    /// Consume and return the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        if let Some(token) = self.peeked.take() {
            return Ok(Some(token));
        }
        self.scan()
    }

    /// Return the next token without consuming it.
    ///
    /// Repeated peeks return the same token until `next_token` is called.
    pub fn peek_token(&mut self) -> Result<Option<&Token>, LexError> {
        if self.peeked.is_none() {
            self.peeked = self.scan()?;
        }
        Ok(self.peeked.as_ref())
    }

    /// Kind of the next token, or `None` at end of input.
    pub fn peek_kind(&mut self) -> Result<Option<TokenKind>, LexError> {
        Ok(self.peek_token()?.map(|token| token.kind))
    }

    fn scan(&mut self) -> Result<Option<Token>, LexError> {
        loop {
            let Some(ch) = self.peek_char() else {
                return Ok(None);
            };

            if ch.is_whitespace() {
                self.index += 1;
                continue;
            }

            if ch == '/' && self.peek_next() == Some('/') {
                self.skip_comment();
                continue;
            }

            let token = if ch.is_numeric() {
                self.lex_number()
            } else if is_label_char(ch) {
                self.lex_label()
            } else if ch == '"' {
                self.lex_string()?
            } else {
                self.lex_symbol(ch)?
            };
            trace!("lexed {token}");
            return Ok(Some(token));
        }
    }

    /// Digits with at most one decimal point. A second point ends the
    /// literal; it is not consumed.
    fn lex_number(&mut self) -> Token {
        let mut text = String::new();
        let mut seen_point = false;
        while let Some(ch) = self.peek_char() {
            if ch.is_numeric() {
                text.push(ch);
            } else if ch == '.' && !seen_point {
                seen_point = true;
                text.push(ch);
            } else {
                break;
            }
            self.index += 1;
        }
        Token::new(TokenKind::NumberLiteral, text)
    }

    fn lex_label(&mut self) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.peek_char() {
            if !is_label_char(ch) {
                break;
            }
            text.push(ch);
            self.index += 1;
        }
        let kind = if keywords::is_boolean_literal(&text) {
            TokenKind::BooleanLiteral
        } else {
            TokenKind::Label
        };
        Token::new(kind, text)
    }

    /// Raw characters up to the closing quote; no escape sequences.
    fn lex_string(&mut self) -> Result<Token, LexError> {
        let start = self.index;
        self.index += 1; // opening quote
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.index += 1;
                    return Ok(Token::new(TokenKind::StringLiteral, text));
                }
                Some(ch) => {
                    text.push(ch);
                    self.index += 1;
                }
                None => return Err(LexError::UnterminatedString { position: start }),
            }
        }
    }

    fn lex_symbol(&mut self, ch: char) -> Result<Token, LexError> {
        let position = self.index;
        self.index += 1;

        // Two-character comparison operators first.
        let followed_by_equal = self.peek_char() == Some('=');
        let paired = match ch {
            '=' if followed_by_equal => Some(TokenKind::EqualEqual),
            '!' if followed_by_equal => Some(TokenKind::BangEqual),
            '<' if followed_by_equal => Some(TokenKind::LessThanEqual),
            '>' if followed_by_equal => Some(TokenKind::GreaterThanEqual),
            _ => None,
        };
        if let Some(kind) = paired {
            self.index += 1;
            return Ok(Token::new(kind, format!("{ch}=")));
        }

        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Asterisk,
            '/' => TokenKind::ForwardSlash,
            '(' => TokenKind::OpenParen,
            ')' => TokenKind::CloseParen,
            ',' => TokenKind::Comma,
            '=' => TokenKind::Equal,
            ':' => TokenKind::Colon,
            '[' => TokenKind::OpenBracket,
            ']' => TokenKind::CloseBracket,
            '.' => TokenKind::Period,
            '{' => TokenKind::OpenBrace,
            '}' => TokenKind::CloseBrace,
            '<' => TokenKind::LessThan,
            '>' => TokenKind::GreaterThan,
            _ => {
                return Err(LexError::InvalidCharacter {
                    character: ch,
                    position,
                });
            }
        };
        Ok(Token::new(kind, ch.to_string()))
    }

    /// Skip `//` and everything up to (not including) the line break.
    fn skip_comment(&mut self) {
        self.index += 2;
        while let Some(ch) = self.peek_char() {
            if ch == '\n' || ch == '\r' {
                break;
            }
            self.index += 1;
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }
}

impl Iterator for Lexer {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

fn is_label_char(ch: char) -> bool {
    ch.is_alphabetic() || ch.is_numeric() || ch == '_'
}
