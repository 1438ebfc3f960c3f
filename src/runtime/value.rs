use std::rc::Rc;

use crate::runtime::{Class, ClassInstance, Context, Unwind};

/// A Mython runtime value.
///
/// Classes and instances are reference-counted and observably shared;
/// binding `self` inside a method call is just another `Rc` clone of the
/// instance. The immutable primitives are cloned by value, which is
/// indistinguishable from sharing them.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Number(i32),
    String(String),
    Bool(bool),
    Class(Rc<Class>),
    Instance(Rc<ClassInstance>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Number(_) => "int",
            Value::String(_) => "str",
            Value::Bool(_) => "bool",
            Value::Class(_) => "type",
            Value::Instance(_) => "instance",
        }
    }

    /// Truthiness used by control flow and the logical operators. Instances
    /// and classes are always true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Number(value) => *value != 0,
            Value::String(value) => !value.is_empty(),
            Value::Bool(value) => *value,
            Value::Class(_) | Value::Instance(_) => true,
        }
    }

    /// Renders the value the way `print` shows it. An instance defers to its
    /// zero-argument `__str__` when the class chain defines one, and falls
    /// back to an address-style token otherwise.
    pub fn to_output(&self, context: &mut dyn Context) -> Result<String, Unwind> {
        match self {
            Value::None => Ok("None".to_string()),
            Value::Number(value) => Ok(value.to_string()),
            Value::String(value) => Ok(value.clone()),
            Value::Bool(true) => Ok("True".to_string()),
            Value::Bool(false) => Ok("False".to_string()),
            Value::Class(class) => Ok(format!("Class {}", class.name())),
            Value::Instance(instance) => {
                if instance.has_method("__str__", 0) {
                    let rendered = instance.call("__str__", Vec::new(), context)?;
                    rendered.to_output(context)
                } else {
                    Ok(format!("{:p}", Rc::as_ptr(instance)))
                }
            }
        }
    }
}
