//! Tree-walking evaluator.
//!
//! Every AST node exposes `execute(closure, context)`; statements run for
//! their effect and return `None`, expressions return their value. The
//! `return` statement raises `Unwind::Return`, which `?` carries out of any
//! nested block until the enclosing `MethodBody` consumes it.

use std::rc::Rc;

use crate::ast::{ComparisonOp, Statement};
use crate::runtime::{
    ClassInstance, Closure, Context, ExecResult, RuntimeError, Unwind, Value, equal, greater,
    greater_or_equal, less, less_or_equal, not_equal,
};

/// Executes a program root against a fresh top-level closure. A `return`
/// escaping every method body is reported as an error.
pub fn run(program: &Statement, context: &mut dyn Context) -> Result<(), RuntimeError> {
    let mut closure = Closure::new();
    match program.execute(&mut closure, context) {
        Ok(_) => Ok(()),
        Err(Unwind::Return(_)) => Err(RuntimeError::ReturnOutsideMethod),
        Err(Unwind::Error(error)) => Err(error),
    }
}

impl Statement {
    pub fn execute(&self, closure: &mut Closure, context: &mut dyn Context) -> ExecResult {
        match self {
            Statement::NumberLiteral(value) => Ok(Value::Number(*value)),
            Statement::StringLiteral(value) => Ok(Value::String(value.clone())),
            Statement::BoolLiteral(value) => Ok(Value::Bool(*value)),
            Statement::NoneLiteral => Ok(Value::None),

            Statement::VariableValue(names) => variable_value(names, closure),

            Statement::Assignment { name, value } => {
                let value = value.execute(closure, context)?;
                closure.insert(name.clone(), value.clone());
                Ok(value)
            }

            Statement::FieldAssignment {
                object,
                field,
                value,
            } => {
                let object = object.execute(closure, context)?;
                let type_name = object.type_name();
                let Value::Instance(instance) = object else {
                    return Err(RuntimeError::NoFields { type_name }.into());
                };
                let value = value.execute(closure, context)?;
                instance
                    .fields_mut()
                    .insert(field.clone(), value.clone());
                Ok(value)
            }

            Statement::Add { lhs, rhs } => {
                let lhs = lhs.execute(closure, context)?;
                let rhs = rhs.execute(closure, context)?;
                match (lhs, rhs) {
                    (Value::Number(lhs), Value::Number(rhs)) => {
                        Ok(Value::Number(lhs.wrapping_add(rhs)))
                    }
                    (Value::String(lhs), Value::String(rhs)) => Ok(Value::String(lhs + &rhs)),
                    (Value::Instance(instance), rhs) if instance.has_method("__add__", 1) => {
                        instance.call("__add__", vec![rhs], context)
                    }
                    (lhs, rhs) => Err(unsupported("+", &lhs, &rhs)),
                }
            }

            Statement::Sub { lhs, rhs } => {
                let lhs = lhs.execute(closure, context)?;
                let rhs = rhs.execute(closure, context)?;
                match (lhs, rhs) {
                    (Value::Number(lhs), Value::Number(rhs)) => {
                        Ok(Value::Number(lhs.wrapping_sub(rhs)))
                    }
                    (lhs, rhs) => Err(unsupported("-", &lhs, &rhs)),
                }
            }

            Statement::Mult { lhs, rhs } => {
                let lhs = lhs.execute(closure, context)?;
                let rhs = rhs.execute(closure, context)?;
                match (lhs, rhs) {
                    (Value::Number(lhs), Value::Number(rhs)) => {
                        Ok(Value::Number(lhs.wrapping_mul(rhs)))
                    }
                    (lhs, rhs) => Err(unsupported("*", &lhs, &rhs)),
                }
            }

            Statement::Div { lhs, rhs } => {
                let lhs = lhs.execute(closure, context)?;
                let rhs = rhs.execute(closure, context)?;
                if matches!(rhs, Value::Number(0)) {
                    return Err(RuntimeError::DivisionByZero.into());
                }
                match (lhs, rhs) {
                    // wrapping_div keeps i32::MIN / -1 from aborting the
                    // interpreter; the quotient wraps to i32::MIN.
                    (Value::Number(lhs), Value::Number(rhs)) => {
                        Ok(Value::Number(lhs.wrapping_div(rhs)))
                    }
                    (lhs, rhs) => Err(unsupported("/", &lhs, &rhs)),
                }
            }

            Statement::Or { lhs, rhs } => {
                if lhs.execute(closure, context)?.is_truthy() {
                    Ok(Value::Bool(true))
                } else {
                    Ok(Value::Bool(rhs.execute(closure, context)?.is_truthy()))
                }
            }

            Statement::And { lhs, rhs } => {
                if !lhs.execute(closure, context)?.is_truthy() {
                    Ok(Value::Bool(false))
                } else {
                    Ok(Value::Bool(rhs.execute(closure, context)?.is_truthy()))
                }
            }

            Statement::Not(argument) => {
                let value = argument.execute(closure, context)?;
                Ok(Value::Bool(!value.is_truthy()))
            }

            Statement::Comparison { op, lhs, rhs } => {
                let lhs = lhs.execute(closure, context)?;
                let rhs = rhs.execute(closure, context)?;
                let result = match op {
                    ComparisonOp::Equal => equal(&lhs, &rhs, context)?,
                    ComparisonOp::NotEqual => not_equal(&lhs, &rhs, context)?,
                    ComparisonOp::Less => less(&lhs, &rhs, context)?,
                    ComparisonOp::Greater => greater(&lhs, &rhs, context)?,
                    ComparisonOp::LessOrEqual => less_or_equal(&lhs, &rhs, context)?,
                    ComparisonOp::GreaterOrEqual => greater_or_equal(&lhs, &rhs, context)?,
                };
                Ok(Value::Bool(result))
            }

            Statement::Stringify(argument) => {
                let value = argument.execute(closure, context)?;
                Ok(Value::String(value.to_output(context)?))
            }

            Statement::NewInstance { class, args } => {
                let instance = Rc::new(ClassInstance::new(Rc::clone(class)));
                // Arguments are only evaluated when a matching __init__ runs.
                if instance.has_method("__init__", args.len()) {
                    let mut call_args = Vec::with_capacity(args.len());
                    for arg in args {
                        call_args.push(arg.execute(closure, context)?);
                    }
                    instance.call("__init__", call_args, context)?;
                }
                Ok(Value::Instance(instance))
            }

            Statement::MethodCall {
                object,
                method,
                args,
            } => {
                let object = object.execute(closure, context)?;
                match object {
                    Value::Instance(instance) if instance.has_method(method, args.len()) => {
                        let mut call_args = Vec::with_capacity(args.len());
                        for arg in args {
                            call_args.push(arg.execute(closure, context)?);
                        }
                        instance.call(method, call_args, context)
                    }
                    // No such method: the call quietly yields None.
                    _ => Ok(Value::None),
                }
            }

            Statement::Print(args) => {
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        write_output(context, " ")?;
                    }
                    let value = arg.execute(closure, context)?;
                    let text = value.to_output(context)?;
                    write_output(context, &text)?;
                }
                write_output(context, "\n")?;
                Ok(Value::None)
            }

            Statement::IfElse {
                condition,
                then_body,
                else_body,
            } => {
                if condition.execute(closure, context)?.is_truthy() {
                    then_body.execute(closure, context)
                } else if let Some(else_body) = else_body {
                    else_body.execute(closure, context)
                } else {
                    Ok(Value::None)
                }
            }

            Statement::Return(value) => {
                Err(Unwind::Return(value.execute(closure, context)?))
            }

            Statement::ClassDefinition(class) => {
                closure.insert(class.name().to_string(), Value::Class(Rc::clone(class)));
                Ok(Value::None)
            }

            Statement::MethodBody(body) => match body.execute(closure, context) {
                Ok(_) => Ok(Value::None),
                Err(Unwind::Return(value)) => Ok(value),
                Err(error) => Err(error),
            },

            Statement::Compound(statements) => {
                for statement in statements {
                    statement.execute(closure, context)?;
                }
                Ok(Value::None)
            }
        }
    }
}

fn variable_value(names: &[String], closure: &Closure) -> ExecResult {
    let Some((first, fields)) = names.split_first() else {
        return Err(RuntimeError::UndefinedVariable {
            name: String::new(),
        }
        .into());
    };
    let mut value = closure
        .get(first)
        .cloned()
        .ok_or_else(|| RuntimeError::UndefinedVariable {
            name: first.clone(),
        })?;
    for field in fields {
        let type_name = value.type_name();
        let Value::Instance(instance) = value else {
            return Err(RuntimeError::NoFields { type_name }.into());
        };
        let next = instance
            .fields()
            .get(field)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownField {
                field: field.clone(),
                class: instance.class().name().to_string(),
            })?;
        value = next;
    }
    Ok(value)
}

fn unsupported(operation: &'static str, lhs: &Value, rhs: &Value) -> Unwind {
    RuntimeError::UnsupportedOperation {
        operation,
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    }
    .into()
}

fn write_output(context: &mut dyn Context, text: &str) -> Result<(), RuntimeError> {
    context
        .output_stream()
        .write_all(text.as_bytes())
        .map_err(|_| RuntimeError::OutputStream)
}
