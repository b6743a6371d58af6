//! The restricted statement tree shared by every compiler stage.
//!
//! The frontend lowers the Python AST into these nodes, the preprocessing
//! passes rewrite them, and the code generator walks them. Constructs the
//! DSL does not model arrive as `Unsupported` nodes so that later stages
//! stay total and can still emit a placeholder for them.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// A statement list, as found in a function body or a nested block.
pub type Block = Vec<Stmt>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Assign(StmtAssign),
    AugAssign(StmtAugAssign),
    If(StmtIf),
    For(StmtFor),
    Return(StmtReturn),
    Break { line: u32 },
    Continue { line: u32 },
    Expr(StmtExpr),
    /// Produced by the guard-folding pass, never by the frontend.
    Unwrap(ConditionalUnwrap),
    Unsupported { summary: String, line: u32 },
}

impl Stmt {
    pub fn line(&self) -> u32 {
        match self {
            Stmt::Assign(s) => s.line,
            Stmt::AugAssign(s) => s.line,
            Stmt::If(s) => s.line,
            Stmt::For(s) => s.line,
            Stmt::Return(s) => s.line,
            Stmt::Break { line } => *line,
            Stmt::Continue { line } => *line,
            Stmt::Expr(s) => s.line,
            Stmt::Unwrap(s) => s.line,
            Stmt::Unsupported { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StmtAssign {
    pub name: String,
    pub value: Expr,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StmtAugAssign {
    pub name: String,
    pub op: BinOp,
    pub value: Expr,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StmtIf {
    pub test: Expr,
    pub body: Block,
    pub orelse: Block,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StmtFor {
    pub target: ForTarget,
    pub iter: Expr,
    pub body: Block,
    pub line: u32,
}

/// Loop binding shape. Two-name unpacking only exists for map iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ForTarget {
    Name(String),
    KeyValue(String, String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StmtReturn {
    pub value: Option<Expr>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StmtExpr {
    pub value: Expr,
    pub line: u32,
}

/// One folded guard: bind `name` from an optional `source` or leave the
/// enclosing scope. Renders as a `match` with a `None` escape arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalUnwrap {
    pub name: String,
    pub source: Expr,
    pub exit: UnwrapExit,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnwrapExit {
    Return(Option<Expr>),
    Continue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Name(String),
    Constant(Constant),
    Attribute(ExprAttribute),
    Subscript(ExprSubscript),
    Call(ExprCall),
    Compare(ExprCompare),
    BoolOp(ExprBoolOp),
    Binary(ExprBinary),
    Unary(ExprUnary),
    List(Vec<Expr>),
    IfExp(ExprIfExp),
    Unsupported { summary: String },
}

impl Expr {
    pub fn name(id: impl Into<String>) -> Self {
        Expr::Name(id.into())
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Expr::Name(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_none_literal(&self) -> bool {
        matches!(self, Expr::Constant(Constant::None))
    }

    /// `obj.attr` with a plain name receiver, the shape the guard folding
    /// pass cares about.
    pub fn as_name_attribute(&self) -> Option<(&str, &str)> {
        match self {
            Expr::Attribute(attr) => attr.value.as_name().map(|obj| (obj, attr.attr.as_str())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprAttribute {
    pub value: Box<Expr>,
    pub attr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprSubscript {
    pub value: Box<Expr>,
    pub index: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprCall {
    pub func: Box<Expr>,
    pub args: Vec<Expr>,
    pub keywords: Vec<Keyword>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprCompare {
    pub left: Box<Expr>,
    pub op: CmpOp,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprBoolOp {
    pub op: BoolOpKind,
    pub values: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprBinary {
    pub left: Box<Expr>,
    pub op: BinOp,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprUnary {
    pub op: UnaryOpKind,
    pub operand: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprIfExp {
    pub test: Box<Expr>,
    pub body: Box<Expr>,
    pub orelse: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl Display for BinOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolOpKind {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOpKind {
    Not,
    Neg,
}
