use std::cell::{OnceCell, Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::ast::Statement;
use crate::runtime::{Closure, Context, ExecResult, RuntimeError, Value};

/// A named method. `formal_params` excludes the implicit `self`; `body` is
/// the method's suite wrapped in a `MethodBody` node by the parser.
#[derive(Debug, PartialEq)]
pub struct Method {
    pub name: String,
    pub formal_params: Vec<String>,
    pub body: Statement,
}

/// A user class: a name, its methods in declaration order, and an optional
/// base class kept alive through the `Rc`.
///
/// Construction is two-phase so that a method body can instantiate its own
/// class: the parser registers a declared class first and installs the
/// method list once the class body has been parsed.
#[derive(Debug, PartialEq)]
pub struct Class {
    name: String,
    methods: OnceCell<Vec<Method>>,
    parent: Option<Rc<Class>>,
}

impl Class {
    pub fn new(name: String, methods: Vec<Method>, parent: Option<Rc<Class>>) -> Self {
        let class = Self::declare(name, parent);
        class.define_methods(methods);
        class
    }

    /// A class whose methods are still being parsed.
    pub fn declare(name: String, parent: Option<Rc<Class>>) -> Self {
        Self {
            name,
            methods: OnceCell::new(),
            parent,
        }
    }

    /// Installs the method list. A class's methods are defined exactly once;
    /// later calls are ignored.
    pub fn define_methods(&self, methods: Vec<Method>) {
        let _ = self.methods.set(methods);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Rc<Class>> {
        self.parent.as_ref()
    }

    /// Resolves a method by name: the class's own list first, in declaration
    /// order, then the parent chain.
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods
            .get()
            .and_then(|methods| methods.iter().find(|method| method.name == name))
            .or_else(|| self.parent.as_deref().and_then(|parent| parent.method(name)))
    }
}

/// A class instance: a shared reference to its class plus a field map.
#[derive(Debug)]
pub struct ClassInstance {
    class: Rc<Class>,
    fields: RefCell<Closure>,
}

impl ClassInstance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: RefCell::new(Closure::new()),
        }
    }

    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn fields(&self) -> Ref<'_, Closure> {
        self.fields.borrow()
    }

    pub fn fields_mut(&self) -> RefMut<'_, Closure> {
        self.fields.borrow_mut()
    }

    /// True when the class chain resolves `method` to a method taking
    /// exactly `argument_count` arguments besides `self`.
    pub fn has_method(&self, method: &str, argument_count: usize) -> bool {
        self.class
            .method(method)
            .is_some_and(|resolved| resolved.formal_params.len() == argument_count)
    }

    /// Calls a method on this instance. Builds a fresh closure binding
    /// `self` and the formal parameters; the caller's locals stay invisible.
    /// The `MethodBody` wrapper around the body turns a `return` into the
    /// call's result.
    pub fn call(
        self: &Rc<Self>,
        method: &str,
        actual_args: Vec<Value>,
        context: &mut dyn Context,
    ) -> ExecResult {
        let resolved = self
            .class
            .method(method)
            .filter(|resolved| resolved.formal_params.len() == actual_args.len());
        let Some(resolved) = resolved else {
            return Err(RuntimeError::UnknownMethod {
                class: self.class.name().to_string(),
                method: method.to_string(),
                arity: actual_args.len(),
            }
            .into());
        };

        let mut closure = Closure::new();
        closure.insert("self".to_string(), Value::Instance(Rc::clone(self)));
        for (param, value) in resolved.formal_params.iter().zip(actual_args) {
            closure.insert(param.clone(), value);
        }
        resolved.body.execute(&mut closure, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{DummyContext, Unwind};

    fn method(name: &str, params: &[&str], body: Statement) -> Method {
        Method {
            name: name.to_string(),
            formal_params: params.iter().map(|param| param.to_string()).collect(),
            body: Statement::MethodBody(Box::new(body)),
        }
    }

    fn returning(value: i32) -> Statement {
        Statement::Return(Box::new(Statement::NumberLiteral(value)))
    }

    #[test]
    fn resolution_prefers_own_methods_over_the_parent() {
        let parent = Rc::new(Class::new(
            "Base".to_string(),
            vec![
                method("greet", &[], returning(1)),
                method("base_only", &[], returning(3)),
            ],
            None,
        ));
        let child = Class::new(
            "Derived".to_string(),
            vec![method("greet", &[], returning(2))],
            Some(Rc::clone(&parent)),
        );

        let greet = child.method("greet").expect("greet must resolve");
        assert_eq!(greet.body, method("greet", &[], returning(2)).body);
        assert!(child.method("base_only").is_some());
        assert!(child.method("missing").is_none());
    }

    #[test]
    fn resolution_is_stable_for_duplicate_names() {
        let class = Class::new(
            "Twice".to_string(),
            vec![
                method("pick", &[], returning(1)),
                method("pick", &[], returning(2)),
            ],
            None,
        );
        // Declaration order wins, consistently across lookups.
        for _ in 0..3 {
            let resolved = class.method("pick").expect("pick must resolve");
            assert_eq!(resolved.body, method("pick", &[], returning(1)).body);
        }
    }

    #[test]
    fn has_method_requires_matching_arity() {
        let class = Rc::new(Class::new(
            "Sized".to_string(),
            vec![method("take", &["a", "b"], returning(0))],
            None,
        ));
        let instance = ClassInstance::new(class);
        assert!(instance.has_method("take", 2));
        assert!(!instance.has_method("take", 1));
        assert!(!instance.has_method("missing", 0));
    }

    #[test]
    fn call_binds_parameters_and_self() {
        let class = Rc::new(Class::new(
            "Echo".to_string(),
            vec![
                method(
                    "id",
                    &["value"],
                    Statement::Return(Box::new(Statement::VariableValue(vec![
                        "value".to_string(),
                    ]))),
                ),
                method(
                    "me",
                    &[],
                    Statement::Return(Box::new(Statement::VariableValue(vec![
                        "self".to_string(),
                    ]))),
                ),
            ],
            None,
        ));
        let instance = Rc::new(ClassInstance::new(class));
        let mut context = DummyContext::new();

        let result = instance
            .call("id", vec![Value::Number(5)], &mut context)
            .expect("call should succeed");
        assert!(matches!(result, Value::Number(5)));

        let result = instance
            .call("me", Vec::new(), &mut context)
            .expect("call should succeed");
        let Value::Instance(returned) = result else {
            panic!("'me' must return the instance");
        };
        assert!(Rc::ptr_eq(&returned, &instance));
    }

    #[test]
    fn call_rejects_unknown_methods_and_wrong_arity() {
        let class = Rc::new(Class::new(
            "Strict".to_string(),
            vec![method("one", &["a"], returning(0))],
            None,
        ));
        let instance = Rc::new(ClassInstance::new(class));
        let mut context = DummyContext::new();

        let result = instance.call("one", Vec::new(), &mut context);
        let Err(Unwind::Error(error)) = result else {
            panic!("expected a runtime error");
        };
        assert_eq!(
            error,
            RuntimeError::UnknownMethod {
                class: "Strict".to_string(),
                method: "one".to_string(),
                arity: 0,
            }
        );
    }

    #[test]
    fn fields_are_a_plain_unique_key_map() {
        let class = Rc::new(Class::new("Bag".to_string(), Vec::new(), None));
        let instance = ClassInstance::new(class);
        instance
            .fields_mut()
            .insert("x".to_string(), Value::Number(1));
        instance
            .fields_mut()
            .insert("x".to_string(), Value::Number(2));
        assert_eq!(instance.fields().len(), 1);
        assert!(matches!(instance.fields().get("x"), Some(Value::Number(2))));
    }
}
