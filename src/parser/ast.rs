//! Syntax tree walked by the interpreter.
//!
//! Mython statements and expressions share a single node type: an expression
//! is simply a statement whose `execute` produces an interesting value. The
//! parser builds these nodes once and the interpreter walks them directly.

use std::rc::Rc;

use crate::runtime::Class;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
}

#[derive(Debug, PartialEq)]
pub enum Statement {
    NumberLiteral(i32),
    StringLiteral(String),
    BoolLiteral(bool),
    NoneLiteral,
    /// A dotted name: the first id is looked up in the closure, every
    /// further id reads an instance field.
    VariableValue(Vec<String>),
    Assignment {
        name: String,
        value: Box<Statement>,
    },
    FieldAssignment {
        object: Box<Statement>,
        field: String,
        value: Box<Statement>,
    },
    Add {
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    Sub {
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    Mult {
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    Div {
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    Or {
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    And {
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    Not(Box<Statement>),
    Comparison {
        op: ComparisonOp,
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    /// `str(x)`: renders the argument the way `print` would.
    Stringify(Box<Statement>),
    NewInstance {
        class: Rc<Class>,
        args: Vec<Statement>,
    },
    MethodCall {
        object: Box<Statement>,
        method: String,
        args: Vec<Statement>,
    },
    Print(Vec<Statement>),
    IfElse {
        condition: Box<Statement>,
        then_body: Box<Statement>,
        else_body: Option<Box<Statement>>,
    },
    Return(Box<Statement>),
    ClassDefinition(Rc<Class>),
    /// Wraps every method suite; catches the `return` signal and turns it
    /// into the call's result.
    MethodBody(Box<Statement>),
    Compound(Vec<Statement>),
}
