//! Value comparisons. Equality and ordering are primitive on same-kind
//! payloads and dispatch to `__eq__`/`__lt__` between instances; everything
//! else is derived from those two.

use std::rc::Rc;

use crate::runtime::{ClassInstance, Context, RuntimeError, Unwind, Value};

/// `==`: same-kind primitives by payload, instances through the left side's
/// `__eq__`, and `None` equals `None`.
pub fn equal(lhs: &Value, rhs: &Value, context: &mut dyn Context) -> Result<bool, Unwind> {
    match (lhs, rhs) {
        (Value::Number(lhs), Value::Number(rhs)) => Ok(lhs == rhs),
        (Value::String(lhs), Value::String(rhs)) => Ok(lhs == rhs),
        (Value::Bool(lhs), Value::Bool(rhs)) => Ok(lhs == rhs),
        (Value::None, Value::None) => Ok(true),
        (Value::Instance(instance), Value::Instance(_)) => {
            dispatch(instance, "__eq__", rhs, context)
        }
        _ => Err(not_comparable(lhs, rhs)),
    }
}

/// `<`: same-kind primitives by payload (strings byte-wise), instances
/// through the left side's `__lt__`.
pub fn less(lhs: &Value, rhs: &Value, context: &mut dyn Context) -> Result<bool, Unwind> {
    match (lhs, rhs) {
        (Value::Number(lhs), Value::Number(rhs)) => Ok(lhs < rhs),
        (Value::String(lhs), Value::String(rhs)) => Ok(lhs < rhs),
        (Value::Bool(lhs), Value::Bool(rhs)) => Ok(lhs < rhs),
        (Value::Instance(instance), Value::Instance(_)) => {
            dispatch(instance, "__lt__", rhs, context)
        }
        _ => Err(not_comparable(lhs, rhs)),
    }
}

pub fn not_equal(lhs: &Value, rhs: &Value, context: &mut dyn Context) -> Result<bool, Unwind> {
    Ok(!equal(lhs, rhs, context)?)
}

pub fn greater(lhs: &Value, rhs: &Value, context: &mut dyn Context) -> Result<bool, Unwind> {
    Ok(!less(lhs, rhs, context)? && !equal(lhs, rhs, context)?)
}

pub fn less_or_equal(lhs: &Value, rhs: &Value, context: &mut dyn Context) -> Result<bool, Unwind> {
    Ok(less(lhs, rhs, context)? || equal(lhs, rhs, context)?)
}

pub fn greater_or_equal(
    lhs: &Value,
    rhs: &Value,
    context: &mut dyn Context,
) -> Result<bool, Unwind> {
    Ok(!less(lhs, rhs, context)?)
}

fn dispatch(
    instance: &Rc<ClassInstance>,
    method: &'static str,
    rhs: &Value,
    context: &mut dyn Context,
) -> Result<bool, Unwind> {
    match instance.call(method, vec![rhs.clone()], context)? {
        Value::Bool(value) => Ok(value),
        other => Err(RuntimeError::NonBoolComparison {
            method,
            type_name: other.type_name(),
        }
        .into()),
    }
}

fn not_comparable(lhs: &Value, rhs: &Value) -> Unwind {
    RuntimeError::NotComparable {
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;
    use crate::runtime::{Class, DummyContext, Method};

    fn check<F>(comparator: F, lhs: &Value, rhs: &Value) -> bool
    where
        F: Fn(&Value, &Value, &mut dyn Context) -> Result<bool, Unwind>,
    {
        comparator(lhs, rhs, &mut DummyContext::new()).expect("comparison should succeed")
    }

    fn expect_error<F>(comparator: F, lhs: &Value, rhs: &Value) -> RuntimeError
    where
        F: Fn(&Value, &Value, &mut dyn Context) -> Result<bool, Unwind>,
    {
        match comparator(lhs, rhs, &mut DummyContext::new()) {
            Err(Unwind::Error(error)) => error,
            other => panic!("expected a runtime error, got {other:?}"),
        }
    }

    #[test]
    fn exactly_one_of_less_equal_greater_holds_for_numbers() {
        let pairs = [(1, 2), (2, 1), (2, 2), (-3, 3), (0, 0)];
        for (lhs, rhs) in pairs {
            let lhs = Value::Number(lhs);
            let rhs = Value::Number(rhs);
            let outcomes = [
                check(less, &lhs, &rhs),
                check(equal, &lhs, &rhs),
                check(less, &rhs, &lhs),
            ];
            assert_eq!(
                outcomes.iter().filter(|held| **held).count(),
                1,
                "trichotomy violated for {lhs:?} and {rhs:?}"
            );
        }
    }

    #[test]
    fn derived_comparators_follow_their_definitions() {
        let one = Value::Number(1);
        let two = Value::Number(2);
        assert!(check(not_equal, &one, &two));
        assert!(!check(not_equal, &one, &one));
        assert!(check(greater, &two, &one));
        assert!(!check(greater, &one, &one));
        assert!(check(less_or_equal, &one, &two));
        assert!(check(less_or_equal, &one, &one));
        assert!(check(greater_or_equal, &one, &one));
        assert!(!check(greater_or_equal, &one, &two));
    }

    #[test]
    fn strings_compare_byte_wise() {
        let a = Value::String("ab".to_string());
        let b = Value::String("b".to_string());
        assert!(check(less, &a, &b));
        assert!(check(equal, &a, &a));
        assert!(!check(equal, &a, &b));
    }

    #[test]
    fn none_equals_none_but_has_no_ordering() {
        assert!(check(equal, &Value::None, &Value::None));
        assert_eq!(
            expect_error(less, &Value::None, &Value::None),
            RuntimeError::NotComparable {
                lhs: "NoneType",
                rhs: "NoneType"
            }
        );
    }

    #[test]
    fn mixed_kinds_are_not_comparable() {
        let error = expect_error(equal, &Value::Number(1), &Value::String("1".to_string()));
        assert_eq!(
            error,
            RuntimeError::NotComparable {
                lhs: "int",
                rhs: "str"
            }
        );
    }

    fn always_class(result: Statement) -> Rc<Class> {
        Rc::new(Class::new(
            "Probe".to_string(),
            vec![Method {
                name: "__eq__".to_string(),
                formal_params: vec!["other".to_string()],
                body: Statement::MethodBody(Box::new(Statement::Return(Box::new(result)))),
            }],
            None,
        ))
    }

    #[test]
    fn instance_equality_dispatches_to_eq() {
        let class = always_class(Statement::BoolLiteral(true));
        let lhs = Value::Instance(Rc::new(ClassInstance::new(Rc::clone(&class))));
        let rhs = Value::Instance(Rc::new(ClassInstance::new(class)));
        assert!(check(equal, &lhs, &rhs));
        assert!(!check(not_equal, &lhs, &rhs));
    }

    #[test]
    fn non_bool_eq_results_are_rejected() {
        let class = always_class(Statement::NumberLiteral(1));
        let lhs = Value::Instance(Rc::new(ClassInstance::new(Rc::clone(&class))));
        let rhs = Value::Instance(Rc::new(ClassInstance::new(class)));
        assert_eq!(
            expect_error(equal, &lhs, &rhs),
            RuntimeError::NonBoolComparison {
                method: "__eq__",
                type_name: "int"
            }
        );
    }

    #[test]
    fn instances_without_eq_error_out() {
        let class = Rc::new(Class::new("Plain".to_string(), Vec::new(), None));
        let lhs = Value::Instance(Rc::new(ClassInstance::new(Rc::clone(&class))));
        let rhs = Value::Instance(Rc::new(ClassInstance::new(class)));
        assert_eq!(
            expect_error(equal, &lhs, &rhs),
            RuntimeError::UnknownMethod {
                class: "Plain".to_string(),
                method: "__eq__".to_string(),
                arity: 1,
            }
        );
    }
}
