//! Syntax tree produced by the parser.
//!
//! Nodes are plain owned trees: every parent owns its children and
//! nothing points back up.

use crate::types::{DataType, Field};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// Ordered statements sharing one lexical scope.
    Block(Vec<Stmt>),
    CallFunction {
        name: String,
        args: Vec<Expr>,
    },
    /// `name type (= init)?`; a missing initializer means the zero value.
    VarDeclare {
        name: String,
        data_type: DataType,
        init: Option<Expr>,
    },
    VarAssign {
        name: String,
        expr: Expr,
    },
    ObjDefine {
        name: String,
        fields: Vec<Field>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Parenthesized expression.
    Block(Box<Expr>),
    Number(String),
    String(String),
    Boolean(String),
    List(Vec<Expr>),
    /// Brace literal shared by maps and objects; the type checker decides
    /// which one it is.
    Table(Vec<TablePair>),
    Variable(String),
    Index {
        left: Box<Expr>,
        index: Box<Expr>,
    },
    PropertyAccess {
        left: Box<Expr>,
        property: String,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Short description of the expression's shape, for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Expr::Block(_) => "parenthesized expression",
            Expr::Number(_) => "number literal",
            Expr::String(_) => "string literal",
            Expr::Boolean(_) => "boolean literal",
            Expr::List(_) => "list literal",
            Expr::Table(_) => "table literal",
            Expr::Variable(_) => "variable",
            Expr::Index { .. } => "index expression",
            Expr::PropertyAccess { .. } => "property access",
            Expr::Binary { .. } => "binary expression",
        }
    }

    pub fn is_variable(&self, name: &str) -> bool {
        matches!(self, Expr::Variable(n) if n == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePair {
    pub key: Expr,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

/// Binding strength of binary operators, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Comparison,
    Sum,
    Product,
}

impl BinaryOp {
    pub fn precedence(self) -> Precedence {
        use BinaryOp::*;
        match self {
            Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual => Precedence::Comparison,
            Add | Subtract => Precedence::Sum,
            Multiply | Divide => Precedence::Product,
        }
    }

    /// Operator spelling in the target language.
    pub fn target_symbol(self) -> &'static str {
        use BinaryOp::*;
        match self {
            Add => "+",
            Subtract => "-",
            Multiply => "*",
            Divide => "/",
            Equal => "==",
            NotEqual => "~=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
        }
    }
}
