use thiserror::Error;

use crate::runtime::Value;

/// Typed runtime failures. Any of these aborts the interpretation run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String },
    #[error("Unknown field '{field}' for an instance of class '{class}'")]
    UnknownField { field: String, class: String },
    #[error("Values of type {type_name} have no fields")]
    NoFields { type_name: &'static str },
    #[error("Class '{class}' has no method '{method}' taking {arity} arguments")]
    UnknownMethod {
        class: String,
        method: String,
        arity: usize,
    },
    #[error("Operation '{operation}' is not supported for types {lhs} and {rhs}")]
    UnsupportedOperation {
        operation: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Cannot compare values of types {lhs} and {rhs}")]
    NotComparable {
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("Method '{method}' returned a value of type {type_name}, expected a bool")]
    NonBoolComparison {
        method: &'static str,
        type_name: &'static str,
    },
    #[error("Return outside of a method body")]
    ReturnOutsideMethod,
    #[error("Could not write to the output stream")]
    OutputStream,
}

/// Signals that unwind out of `execute` toward an enclosing handler.
///
/// `Return` carries a `return`ed value out of nested blocks and is consumed
/// at exactly the enclosing `MethodBody`; `Error` is never consumed and
/// aborts the program.
#[derive(Debug)]
pub enum Unwind {
    Return(Value),
    Error(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(error: RuntimeError) -> Self {
        Unwind::Error(error)
    }
}

pub type ExecResult = Result<Value, Unwind>;
