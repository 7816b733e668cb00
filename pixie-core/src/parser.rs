//! Recursive-descent parser for pixie.
//!
//! One token of lookahead is enough for every decision except the
//! label statement, which inspects the token after the leading label.
//! The first error aborts the parse.

use log::{debug, trace};

use crate::ast::{BinaryOp, Expr, Precedence, Stmt, TablePair};
use crate::error::ParseError;
use crate::keywords;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::types::{DataType, Field};

/// Parse a whole source string into its root block.
pub fn parse(source: &str) -> Result<Stmt, ParseError> {
    Parser::new(Lexer::new(source)).parse()
}

/// Deepest expression or type tree the parser will build. Each nested
/// expression, binary operator and suffix counts one level.
pub const MAX_NESTING: usize = 256;

pub struct Parser {
    lexer: Lexer,
    depth: usize,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        Parser { lexer, depth: 0 }
    }

    /// Parse statements until end of input.
    pub fn parse(&mut self) -> Result<Stmt, ParseError> {
        let block = self.parse_block()?;
        if let Stmt::Block(stmts) = &block {
            debug!("parsed {} top-level statements", stmts.len());
        }
        Ok(block)
    }

    fn parse_block(&mut self) -> Result<Stmt, ParseError> {
        let mut stmts = Vec::new();
        while self.lexer.peek_kind()?.is_some() {
            let stmt = self.parse_stmt()?;
            trace!("statement: {stmt:?}");
            stmts.push(stmt);
        }
        Ok(Stmt::Block(stmts))
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let token = self.next("statement")?;
        if token.kind != TokenKind::Label {
            return Err(ParseError::unexpected("a statement", token));
        }
        self.parse_label_stmt(token)
    }

    /// Dispatch on the token following the leading label.
    fn parse_label_stmt(&mut self, label: Token) -> Result<Stmt, ParseError> {
        let next = self
            .lexer
            .peek_token()?
            .cloned()
            .ok_or(ParseError::PrematureEndOfInput {
                parsing: "label statement",
            })?;

        match next.kind {
            TokenKind::OpenParen => self.parse_call_function(label),
            TokenKind::Label if next.text == keywords::OBJECT => self.parse_obj_define(label),
            TokenKind::Label => self.parse_var_declare(label),
            TokenKind::Equal => self.parse_var_assign(label),
            _ => Err(ParseError::unexpected(
                format!("a call, declaration or assignment after {label}"),
                next,
            )),
        }
    }

    fn parse_call_function(&mut self, label: Token) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::OpenParen, "function call")?;
        let args = self.parse_expr_list(TokenKind::CloseParen, "function call", true)?;
        Ok(Stmt::CallFunction {
            name: label.text,
            args,
        })
    }

    fn parse_var_declare(&mut self, label: Token) -> Result<Stmt, ParseError> {
        let name = declared_name(label, "variable name")?;
        let data_type = self.parse_data_type()?;

        let init = if self.lexer.peek_kind()? == Some(TokenKind::Equal) {
            self.next("variable declaration")?;
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(Stmt::VarDeclare {
            name,
            data_type,
            init,
        })
    }

    /// `name obj { field type ... }`
    fn parse_obj_define(&mut self, label: Token) -> Result<Stmt, ParseError> {
        let name = declared_name(label, "object name")?;

        let keyword = self.expect(TokenKind::Label, "object definition")?;
        if keyword.text != keywords::OBJECT {
            return Err(ParseError::unexpected(format!("{:?}", keywords::OBJECT), keyword));
        }
        self.expect(TokenKind::OpenBrace, "object definition")?;

        let mut fields = Vec::new();
        loop {
            let field_name = self.expect(TokenKind::Label, "object field")?;
            if field_name.text.is_empty() {
                return Err(ParseError::EmptyIdentifier { what: "field name" });
            }
            let data_type = self.parse_data_type()?;
            fields.push(Field::new(field_name.text, data_type));

            match self.lexer.peek_kind()? {
                Some(TokenKind::CloseBrace) => {
                    self.next("object definition")?;
                    break;
                }
                Some(TokenKind::Label) => continue,
                Some(_) => {
                    let token = self.next("object definition")?;
                    return Err(ParseError::unexpected("a field name or '}'", token));
                }
                None => {
                    return Err(ParseError::PrematureEndOfInput {
                        parsing: "object definition",
                    });
                }
            }
        }

        debug!("parsed object definition {name} with {} fields", fields.len());
        Ok(Stmt::ObjDefine { name, fields })
    }

    fn parse_var_assign(&mut self, label: Token) -> Result<Stmt, ParseError> {
        if label.text.is_empty() {
            return Err(ParseError::EmptyIdentifier {
                what: "variable name",
            });
        }
        self.expect(TokenKind::Equal, "assignment")?;
        let expr = self.parse_expr()?;
        Ok(Stmt::VarAssign {
            name: label.text,
            expr,
        })
    }

    /// `num | str | bool | list[T] | map[K:V] | <custom>`
    fn parse_data_type(&mut self) -> Result<DataType, ParseError> {
        let saved = self.depth;
        let data_type = self.descend().and_then(|()| self.parse_data_type_inner());
        self.depth = saved;
        data_type
    }

    fn parse_data_type_inner(&mut self) -> Result<DataType, ParseError> {
        let label = self.expect(TokenKind::Label, "data type")?;
        if label.text.is_empty() {
            return Err(ParseError::EmptyIdentifier { what: "data type" });
        }

        match label.text.as_str() {
            keywords::NUMBER => Ok(DataType::Number),
            keywords::STRING => Ok(DataType::String),
            keywords::BOOLEAN => Ok(DataType::Boolean),
            keywords::LIST => {
                self.expect(TokenKind::OpenBracket, "list type")?;
                let element = self.parse_data_type()?;
                self.expect(TokenKind::CloseBracket, "list type")?;
                Ok(DataType::list(element))
            }
            keywords::MAP => {
                self.expect(TokenKind::OpenBracket, "map type")?;
                let key = self.parse_data_type()?;
                self.expect(TokenKind::Colon, "map type")?;
                let value = self.parse_data_type()?;
                self.expect(TokenKind::CloseBracket, "map type")?;
                Ok(DataType::map(key, value))
            }
            _ => Ok(DataType::custom(label.text)),
        }
    }

    /// A precedence-climbed expression followed by any number of
    /// `[index]` / `.property` suffixes.
    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let saved = self.depth;
        let expr = self.descend().and_then(|()| self.parse_expr_inner());
        self.depth = saved;
        expr
    }

    fn parse_expr_inner(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_expr_with_precedence(Precedence::Lowest)?;

        loop {
            match self.lexer.peek_kind()? {
                Some(TokenKind::OpenBracket) => {
                    self.descend()?;
                    self.next("index")?;
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::CloseBracket, "index")?;
                    expr = Expr::Index {
                        left: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                Some(TokenKind::Period) => {
                    self.descend()?;
                    self.next("property access")?;
                    let property = self.expect(TokenKind::Label, "property access")?;
                    expr = Expr::PropertyAccess {
                        left: Box::new(expr),
                        property: property.text,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_expr_with_precedence(&mut self, precedence: Precedence) -> Result<Expr, ParseError> {
        let mut left = self.parse_expr_base()?;

        loop {
            let Some(op) = self.lexer.peek_kind()?.and_then(binary_op) else {
                return Ok(left);
            };
            let next_precedence = op.precedence();
            if next_precedence <= precedence {
                return Ok(left);
            }
            self.descend()?;
            self.next("binary expression")?;

            let right = self.parse_expr_with_precedence(next_precedence)?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
    }

    fn parse_expr_base(&mut self) -> Result<Expr, ParseError> {
        let token = self.next("expression")?;
        match token.kind {
            TokenKind::NumberLiteral => {
                if token.text.is_empty() {
                    return Err(ParseError::EmptyIdentifier {
                        what: "number literal",
                    });
                }
                Ok(Expr::Number(token.text))
            }
            TokenKind::StringLiteral => Ok(Expr::String(token.text)),
            TokenKind::BooleanLiteral => Ok(Expr::Boolean(token.text)),
            TokenKind::OpenParen => {
                let inner = self.parse_expr()?;
                self.expect(TokenKind::CloseParen, "parenthesized expression")?;
                Ok(Expr::Block(Box::new(inner)))
            }
            TokenKind::OpenBracket => {
                let elements = self.parse_expr_list(TokenKind::CloseBracket, "list", false)?;
                Ok(Expr::List(elements))
            }
            TokenKind::OpenBrace => self.parse_table(),
            TokenKind::Label => {
                if token.text.is_empty() {
                    return Err(ParseError::EmptyIdentifier { what: "label" });
                }
                Ok(Expr::Variable(token.text))
            }
            _ => Err(ParseError::unexpected("an expression", token)),
        }
    }

    /// Comma-separated expressions up to and including `close`. The
    /// opening token has already been consumed.
    fn parse_expr_list(
        &mut self,
        close: TokenKind,
        parsing: &'static str,
        allow_empty: bool,
    ) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = Vec::new();
        if allow_empty && self.lexer.peek_kind()? == Some(close) {
            self.next(parsing)?;
            return Ok(exprs);
        }

        loop {
            exprs.push(self.parse_expr()?);
            let token = self.next(parsing)?;
            match token.kind {
                TokenKind::Comma => continue,
                kind if kind == close => return Ok(exprs),
                _ => return Err(ParseError::unexpected(format!("',' or {close}"), token)),
            }
        }
    }

    /// `{ key: value, ... }`; the opening brace is already consumed.
    fn parse_table(&mut self) -> Result<Expr, ParseError> {
        let mut pairs = Vec::new();
        if self.lexer.peek_kind()? == Some(TokenKind::CloseBrace) {
            self.next("table")?;
            return Ok(Expr::Table(pairs));
        }

        loop {
            let key = self.parse_table_key()?;
            self.expect(TokenKind::Colon, "table")?;
            let value = self.parse_expr()?;
            pairs.push(TablePair { key, value });

            let token = self.next("table")?;
            match token.kind {
                TokenKind::Comma => continue,
                TokenKind::CloseBrace => return Ok(Expr::Table(pairs)),
                _ => return Err(ParseError::unexpected("',' or CloseBrace", token)),
            }
        }
    }

    /// Table keys are primitive literals or bare labels, never arbitrary
    /// expressions.
    fn parse_table_key(&mut self) -> Result<Expr, ParseError> {
        let token = self.next("table key")?;
        match token.kind {
            TokenKind::NumberLiteral => Ok(Expr::Number(token.text)),
            TokenKind::StringLiteral => Ok(Expr::String(token.text)),
            TokenKind::BooleanLiteral => Ok(Expr::Boolean(token.text)),
            TokenKind::Label => Ok(Expr::Variable(token.text)),
            _ => Err(ParseError::unexpected("a literal or label table key", token)),
        }
    }

    /// Go one level deeper, failing past `MAX_NESTING`. Callers that
    /// open a nesting level restore `depth` when they return.
    fn descend(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ParseError::NestingTooDeep { limit: MAX_NESTING });
        }
        Ok(())
    }

    fn next(&mut self, parsing: &'static str) -> Result<Token, ParseError> {
        self.lexer
            .next_token()?
            .ok_or(ParseError::PrematureEndOfInput { parsing })
    }

    fn expect(&mut self, kind: TokenKind, parsing: &'static str) -> Result<Token, ParseError> {
        let token = self.next(parsing)?;
        if token.kind != kind {
            return Err(ParseError::unexpected(kind.name(), token));
        }
        Ok(token)
    }
}

/// Validate the name introduced by a declaration or object definition.
fn declared_name(label: Token, what: &'static str) -> Result<String, ParseError> {
    if label.text.is_empty() {
        return Err(ParseError::EmptyIdentifier { what });
    }
    if keywords::is_illegal_name(&label.text) {
        return Err(ParseError::IllegalKeywordUsed { name: label.text });
    }
    Ok(label.text)
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Subtract),
        TokenKind::Asterisk => Some(BinaryOp::Multiply),
        TokenKind::ForwardSlash => Some(BinaryOp::Divide),
        TokenKind::EqualEqual => Some(BinaryOp::Equal),
        TokenKind::BangEqual => Some(BinaryOp::NotEqual),
        TokenKind::LessThan => Some(BinaryOp::Less),
        TokenKind::LessThanEqual => Some(BinaryOp::LessEqual),
        TokenKind::GreaterThan => Some(BinaryOp::Greater),
        TokenKind::GreaterThanEqual => Some(BinaryOp::GreaterEqual),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LexError;

    fn body(source: &str) -> Vec<Stmt> {
        match parse(source).expect("parse") {
            Stmt::Block(stmts) => stmts,
            other => panic!("expected block, got {other:?}"),
        }
    }

    fn single(source: &str) -> Stmt {
        let mut stmts = body(source);
        assert_eq!(stmts.len(), 1, "expected one statement in {source:?}");
        stmts.remove(0)
    }

    fn num(text: &str) -> Expr {
        Expr::Number(text.to_string())
    }

    fn var(name: &str) -> Expr {
        Expr::Variable(name.to_string())
    }

    fn init_of(source: &str) -> Expr {
        match single(source) {
            Stmt::VarDeclare {
                init: Some(init), ..
            } => init,
            other => panic!("expected initialized declaration, got {other:?}"),
        }
    }

    #[test]
    fn parses_function_call() {
        assert_eq!(
            single("print(1,2)"),
            Stmt::CallFunction {
                name: "print".to_string(),
                args: vec![num("1"), num("2")],
            }
        );
    }

    #[test]
    fn parses_call_without_arguments() {
        assert_eq!(
            single("flush()"),
            Stmt::CallFunction {
                name: "flush".to_string(),
                args: vec![],
            }
        );
    }

    #[test]
    fn empty_source_is_an_empty_block() {
        assert_eq!(parse("  // nothing here\n").expect("parse"), Stmt::Block(vec![]));
    }

    #[test]
    fn parses_declarations_with_and_without_initializer() {
        let stmts = body("a num = 5\nb str\nc bool = true");
        assert_eq!(
            stmts,
            vec![
                Stmt::VarDeclare {
                    name: "a".to_string(),
                    data_type: DataType::Number,
                    init: Some(num("5")),
                },
                Stmt::VarDeclare {
                    name: "b".to_string(),
                    data_type: DataType::String,
                    init: None,
                },
                Stmt::VarDeclare {
                    name: "c".to_string(),
                    data_type: DataType::Boolean,
                    init: Some(Expr::Boolean("true".to_string())),
                },
            ]
        );
    }

    #[test]
    fn parses_nested_container_types() {
        match single("m map[str:list[point]]") {
            Stmt::VarDeclare { data_type, .. } => assert_eq!(
                data_type,
                DataType::map(DataType::String, DataType::list(DataType::custom("point")))
            ),
            other => panic!("unexpected statement {other:?}"),
        }
    }

    #[test]
    fn rejects_reserved_names() {
        let err = parse("num num = 1").unwrap_err();
        assert_eq!(
            err,
            ParseError::IllegalKeywordUsed {
                name: "num".to_string()
            }
        );
        let err = parse("list obj { a num }").unwrap_err();
        assert!(matches!(err, ParseError::IllegalKeywordUsed { .. }));
    }

    #[test]
    fn parses_object_definition() {
        assert_eq!(
            single("point obj {\n  x num\n  y num\n  tags list[str]\n}"),
            Stmt::ObjDefine {
                name: "point".to_string(),
                fields: vec![
                    Field::new("x", DataType::Number),
                    Field::new("y", DataType::Number),
                    Field::new("tags", DataType::list(DataType::String)),
                ],
            }
        );
    }

    #[test]
    fn object_definition_needs_a_field() {
        let err = parse("point obj {}").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn parses_assignment() {
        assert_eq!(
            single("x = y"),
            Stmt::VarAssign {
                name: "x".to_string(),
                expr: var("y"),
            }
        );
    }

    #[test]
    fn products_bind_tighter_than_sums() {
        assert_eq!(
            init_of("x num = 1 + 2 * 3"),
            Expr::Binary {
                left: Box::new(num("1")),
                op: BinaryOp::Add,
                right: Box::new(Expr::Binary {
                    left: Box::new(num("2")),
                    op: BinaryOp::Multiply,
                    right: Box::new(num("3")),
                }),
            }
        );
    }

    #[test]
    fn operators_of_equal_precedence_are_left_associative() {
        assert_eq!(
            init_of("x num = 1 - 2 - 3"),
            Expr::Binary {
                left: Box::new(Expr::Binary {
                    left: Box::new(num("1")),
                    op: BinaryOp::Subtract,
                    right: Box::new(num("2")),
                }),
                op: BinaryOp::Subtract,
                right: Box::new(num("3")),
            }
        );
    }

    #[test]
    fn comparison_binds_loosest() {
        assert_eq!(
            init_of("x bool = a + 1 <= b"),
            Expr::Binary {
                left: Box::new(Expr::Binary {
                    left: Box::new(var("a")),
                    op: BinaryOp::Add,
                    right: Box::new(num("1")),
                }),
                op: BinaryOp::LessEqual,
                right: Box::new(var("b")),
            }
        );
    }

    #[test]
    fn parentheses_produce_block_expressions() {
        assert_eq!(
            init_of("x num = (1 + 2) * 3"),
            Expr::Binary {
                left: Box::new(Expr::Block(Box::new(Expr::Binary {
                    left: Box::new(num("1")),
                    op: BinaryOp::Add,
                    right: Box::new(num("2")),
                }))),
                op: BinaryOp::Multiply,
                right: Box::new(num("3")),
            }
        );
    }

    #[test]
    fn suffixes_chain_after_the_whole_expression() {
        assert_eq!(
            init_of("x num = a.b[0].c"),
            Expr::PropertyAccess {
                left: Box::new(Expr::Index {
                    left: Box::new(Expr::PropertyAccess {
                        left: Box::new(var("a")),
                        property: "b".to_string(),
                    }),
                    index: Box::new(num("0")),
                }),
                property: "c".to_string(),
            }
        );
        // Suffixes apply to the precedence-climbed expression as a whole.
        assert!(matches!(
            init_of("x num = a + b[0]"),
            Expr::Index { left, .. } if matches!(*left, Expr::Binary { .. })
        ));
    }

    #[test]
    fn parses_list_and_table_literals() {
        assert_eq!(
            init_of("l list[num] = [1, 2, 3]"),
            Expr::List(vec![num("1"), num("2"), num("3")])
        );
        assert_eq!(
            init_of("m map[str:num] = {\"a\": 1, b: 2, 3: 4, true: 5}"),
            Expr::Table(vec![
                TablePair {
                    key: Expr::String("a".to_string()),
                    value: num("1"),
                },
                TablePair {
                    key: var("b"),
                    value: num("2"),
                },
                TablePair {
                    key: num("3"),
                    value: num("4"),
                },
                TablePair {
                    key: Expr::Boolean("true".to_string()),
                    value: num("5"),
                },
            ])
        );
        assert_eq!(init_of("m map[str:num] = {}"), Expr::Table(vec![]));
    }

    #[test]
    fn table_keys_must_be_literals_or_labels() {
        let err = parse("m map[str:num] = {(1): 2}").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn statements_must_start_with_a_label() {
        let err = parse("123").unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedToken { ref expected, .. } if expected == "a statement"
        ));
    }

    #[test]
    fn unknown_follow_token_is_a_syntax_error() {
        let err = parse("x + 1").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn reports_premature_end_of_input() {
        assert!(matches!(
            parse("print(1,").unwrap_err(),
            ParseError::PrematureEndOfInput { .. }
        ));
        assert!(matches!(
            parse("x").unwrap_err(),
            ParseError::PrematureEndOfInput { .. }
        ));
        assert!(matches!(
            parse("x list[").unwrap_err(),
            ParseError::PrematureEndOfInput { .. }
        ));
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let depth = 50_000;
        let source = format!("x num = {}1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(
            parse(&source).unwrap_err(),
            ParseError::NestingTooDeep { limit: MAX_NESTING }
        );

        let chain = vec!["1"; 1_000].join(" + ");
        assert!(matches!(
            parse(&format!("x num = {chain}")).unwrap_err(),
            ParseError::NestingTooDeep { .. }
        ));

        let suffixes = "[0]".repeat(1_000);
        assert!(matches!(
            parse(&format!("x num = l{suffixes}")).unwrap_err(),
            ParseError::NestingTooDeep { .. }
        ));

        let types = format!("x {}num{}", "list[".repeat(1_000), "]".repeat(1_000));
        assert!(matches!(
            parse(&types).unwrap_err(),
            ParseError::NestingTooDeep { .. }
        ));
    }

    #[test]
    fn moderate_nesting_is_accepted() {
        let source = format!("x num = {}1{}", "(".repeat(50), ")".repeat(50));
        assert!(parse(&source).is_ok());

        let chain = vec!["1"; 100].join(" + ");
        assert!(parse(&format!("x num = {chain}")).is_ok());

        // Sibling expressions do not add up.
        let elements = vec!["(1)"; 1_000].join(", ");
        assert!(parse(&format!("l list[num] = [{elements}]")).is_ok());
    }

    #[test]
    fn lex_errors_propagate() {
        let err = parse("s str = \"abc").unwrap_err();
        assert_eq!(
            err,
            ParseError::Lex(LexError::UnterminatedString { position: 8 })
        );
    }
}
