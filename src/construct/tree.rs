use std::rc::Rc;

use crate::common::{lit::Lit, span::Spanned};

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
    Plus,
    TypeOf,
}

/// Arithmetic and comparison operators.
/// These also back compound assignment, e.g. `+=` is `Assign(Some(Add), ..)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
}

/// Short-circuiting operators, which may not evaluate their right side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Lit(Lit),
    Iden(String),
    This,
    Array(Vec<Spanned<Expr>>),
    Object(Vec<(String, Spanned<Expr>)>),
    Function(Rc<Function>),

    Member(Box<Spanned<Expr>>, String),
    Index(Box<Spanned<Expr>>, Box<Spanned<Expr>>),
    Call(Box<Spanned<Expr>>, Vec<Spanned<Expr>>),

    Unary(UnOp, Box<Spanned<Expr>>),
    /// `++` or `--`; `prefix` decides whether the old or new value is used.
    Update {
        increment: bool,
        prefix: bool,
        target: Box<Spanned<Expr>>,
    },
    Binary(BinOp, Box<Spanned<Expr>>, Box<Spanned<Expr>>),
    Logic(LogicOp, Box<Spanned<Expr>>, Box<Spanned<Expr>>),
    Conditional(Box<Spanned<Expr>>, Box<Spanned<Expr>>, Box<Spanned<Expr>>),
    Assign(Option<BinOp>, Box<Spanned<Expr>>, Box<Spanned<Expr>>),
    /// `a, b`: evaluates both, yields `b`.
    Sequence(Vec<Spanned<Expr>>),
}

impl Expr {
    pub fn member(object: Spanned<Expr>, field: &str) -> Expr {
        Expr::Member(Box::new(object), field.to_string())
    }

    pub fn index(object: Spanned<Expr>, index: Spanned<Expr>) -> Expr {
        Expr::Index(Box::new(object), Box::new(index))
    }

    pub fn call(fun: Spanned<Expr>, args: Vec<Spanned<Expr>>) -> Expr {
        Expr::Call(Box::new(fun), args)
    }

    pub fn unary(op: UnOp, operand: Spanned<Expr>) -> Expr {
        Expr::Unary(op, Box::new(operand))
    }

    pub fn update(increment: bool, prefix: bool, target: Spanned<Expr>) -> Expr {
        Expr::Update {
            increment,
            prefix,
            target: Box::new(target),
        }
    }

    pub fn binary(op: BinOp, left: Spanned<Expr>, right: Spanned<Expr>) -> Expr {
        Expr::Binary(op, Box::new(left), Box::new(right))
    }

    pub fn logic(op: LogicOp, left: Spanned<Expr>, right: Spanned<Expr>) -> Expr {
        Expr::Logic(op, Box::new(left), Box::new(right))
    }

    pub fn conditional(
        test: Spanned<Expr>,
        then: Spanned<Expr>,
        otherwise: Spanned<Expr>,
    ) -> Expr {
        Expr::Conditional(Box::new(test), Box::new(then), Box::new(otherwise))
    }

    pub fn assign(
        op: Option<BinOp>,
        target: Spanned<Expr>,
        value: Spanned<Expr>,
    ) -> Expr {
        Expr::Assign(op, Box::new(target), Box::new(value))
    }

    /// Whether this expression can appear on the left of an assignment.
    pub fn is_target(&self) -> bool {
        matches!(self, Expr::Iden(_) | Expr::Member(..) | Expr::Index(..))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

/// The binding introduced in the head of a `for ... in` or `for ... of`.
#[derive(Debug, Clone)]
pub struct ForHead {
    pub kind: Option<DeclKind>,
    pub name: String,
    /// `of` iterates values, `in` iterates keys.
    pub values: bool,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expr(Spanned<Expr>),
    Decl(DeclKind, Vec<(String, Option<Spanned<Expr>>)>),
    /// A function declaration; hoisted to the top of its block.
    Function(Rc<Function>),
    Block(Vec<Spanned<Stmt>>),
    If(Spanned<Expr>, Box<Spanned<Stmt>>, Option<Box<Spanned<Stmt>>>),
    For {
        init: Option<Box<Spanned<Stmt>>>,
        test: Option<Spanned<Expr>>,
        update: Option<Spanned<Expr>>,
        body: Box<Spanned<Stmt>>,
    },
    ForIn(ForHead, Spanned<Expr>, Box<Spanned<Stmt>>),
    While(Spanned<Expr>, Box<Spanned<Stmt>>),
    DoWhile(Box<Spanned<Stmt>>, Spanned<Expr>),
    Return(Option<Spanned<Expr>>),
    Break,
    Continue,
    Throw(Spanned<Expr>),
    Empty,
}

/// A function body together with what the VM needs to enter it.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<Spanned<Stmt>>,
    /// Every `var` declared in the body, outside nested functions.
    pub vars: Vec<String>,
}

/// A whole generated script.
/// The script is read as the body of a function, so it may `return`.
#[derive(Debug, Clone)]
pub struct Program {
    pub main: Rc<Function>,
}
