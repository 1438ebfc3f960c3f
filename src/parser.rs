//! Recursive-descent parser over the pull-model lexer.
//!
//! Classes are parse-time entities: each `class` definition is turned into a
//! shared `runtime::Class` immediately and recorded in a name table, so that
//! `Name(args)` object expressions and base-class references resolve while
//! parsing. The produced tree is rooted in a `Compound`.

pub mod ast;

use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{Context, Result, bail, ensure};

use crate::ast::{ComparisonOp, Statement};
use crate::lexer::Lexer;
use crate::runtime::{Class, Method};
use crate::token::Token;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    classes: HashMap<String, Rc<Class>>,
}

/// Parses a whole program into its root `Compound` node.
pub fn parse(lexer: Lexer<'_>) -> Result<Statement> {
    Parser {
        lexer,
        classes: HashMap::new(),
    }
    .parse_program()
}

impl<'a> Parser<'a> {
    fn parse_program(mut self) -> Result<Statement> {
        let mut statements = Vec::new();
        while !matches!(self.lexer.current(), Token::Eof) {
            if self.accept(&Token::Newline)? {
                continue;
            }
            statements.push(self.parse_statement()?);
        }
        Ok(Statement::Compound(statements))
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        if matches!(self.lexer.current(), Token::Class) {
            return self.parse_class_definition();
        }
        if matches!(self.lexer.current(), Token::If) {
            return self.parse_if_else();
        }
        if matches!(self.lexer.current(), Token::Return) {
            return self.parse_return();
        }
        if matches!(self.lexer.current(), Token::Print) {
            return self.parse_print();
        }
        self.parse_simple_statement()
    }

    fn parse_class_definition(&mut self) -> Result<Statement> {
        self.expect_token(&Token::Class)?;
        let name = self.expect_id()?;
        let parent = if self.accept(&Token::Char('('))? {
            let parent_name = self.expect_id()?;
            self.expect_token(&Token::Char(')'))?;
            let parent = self
                .classes
                .get(&parent_name)
                .cloned()
                .with_context(|| {
                    format!("Unknown base class '{parent_name}' for class '{name}'")
                })?;
            Some(parent)
        } else {
            None
        };
        self.expect_token(&Token::Char(':'))?;
        self.expect_token(&Token::Newline)?;
        self.expect_token(&Token::Indent)?;

        // Register the name before the body parses, so methods can
        // instantiate their own class.
        let class = Rc::new(Class::declare(name.clone(), parent));
        self.classes.insert(name.clone(), Rc::clone(&class));

        let mut methods = Vec::new();
        while !matches!(self.lexer.current(), Token::Dedent | Token::Eof) {
            if self.accept(&Token::Newline)? {
                continue;
            }
            methods.push(self.parse_method(&name)?);
        }
        self.expect_token(&Token::Dedent)?;

        class.define_methods(methods);
        Ok(Statement::ClassDefinition(class))
    }

    fn parse_method(&mut self, class_name: &str) -> Result<Method> {
        self.expect_token(&Token::Def)?;
        let name = self.expect_id()?;
        self.expect_token(&Token::Char('('))?;
        let receiver = self.expect_id()?;
        ensure!(
            receiver == "self",
            "First parameter of method '{class_name}.{name}' must be 'self', got '{receiver}'"
        );
        let mut formal_params = Vec::new();
        while self.accept(&Token::Char(','))? {
            formal_params.push(self.expect_id()?);
        }
        self.expect_token(&Token::Char(')'))?;
        self.expect_token(&Token::Char(':'))?;
        let body = self.parse_suite()?;
        Ok(Method {
            name,
            formal_params,
            body: Statement::MethodBody(Box::new(body)),
        })
    }

    fn parse_if_else(&mut self) -> Result<Statement> {
        self.expect_token(&Token::If)?;
        let condition = self.parse_test()?;
        self.expect_token(&Token::Char(':'))?;
        let then_body = self.parse_suite()?;
        let else_body = if self.accept(&Token::Else)? {
            self.expect_token(&Token::Char(':'))?;
            Some(Box::new(self.parse_suite()?))
        } else {
            None
        };
        Ok(Statement::IfElse {
            condition: Box::new(condition),
            then_body: Box::new(then_body),
            else_body,
        })
    }

    fn parse_return(&mut self) -> Result<Statement> {
        self.expect_token(&Token::Return)?;
        let value = self.parse_test()?;
        self.expect_token(&Token::Newline)?;
        Ok(Statement::Return(Box::new(value)))
    }

    fn parse_print(&mut self) -> Result<Statement> {
        self.expect_token(&Token::Print)?;
        let mut args = Vec::new();
        if !matches!(self.lexer.current(), Token::Newline) {
            args.push(self.parse_test()?);
            while self.accept(&Token::Char(','))? {
                args.push(self.parse_test()?);
            }
        }
        self.expect_token(&Token::Newline)?;
        Ok(Statement::Print(args))
    }

    /// An assignment, a field assignment, or a bare expression statement.
    fn parse_simple_statement(&mut self) -> Result<Statement> {
        let expression = self.parse_test()?;
        if !self.accept(&Token::Char('='))? {
            self.expect_token(&Token::Newline)?;
            return Ok(expression);
        }
        let value = Box::new(self.parse_test()?);
        self.expect_token(&Token::Newline)?;

        let Statement::VariableValue(mut names) = expression else {
            bail!("Left side of an assignment must be a variable or a field");
        };
        let Some(field) = names.pop() else {
            bail!("Left side of an assignment must be a variable or a field");
        };
        if names.is_empty() {
            Ok(Statement::Assignment { name: field, value })
        } else {
            Ok(Statement::FieldAssignment {
                object: Box::new(Statement::VariableValue(names)),
                field,
                value,
            })
        }
    }

    /// `NEWLINE INDENT statement+ DEDENT`, as a `Compound`.
    fn parse_suite(&mut self) -> Result<Statement> {
        self.expect_token(&Token::Newline)?;
        self.expect_token(&Token::Indent)?;
        let mut statements = Vec::new();
        while !matches!(self.lexer.current(), Token::Dedent | Token::Eof) {
            if self.accept(&Token::Newline)? {
                continue;
            }
            statements.push(self.parse_statement()?);
        }
        self.expect_token(&Token::Dedent)?;
        Ok(Statement::Compound(statements))
    }

    fn parse_test(&mut self) -> Result<Statement> {
        let mut lhs = self.parse_and_test()?;
        while self.accept(&Token::Or)? {
            let rhs = self.parse_and_test()?;
            lhs = Statement::Or {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_and_test(&mut self) -> Result<Statement> {
        let mut lhs = self.parse_not_test()?;
        while self.accept(&Token::And)? {
            let rhs = self.parse_not_test()?;
            lhs = Statement::And {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_not_test(&mut self) -> Result<Statement> {
        if self.accept(&Token::Not)? {
            Ok(Statement::Not(Box::new(self.parse_not_test()?)))
        } else {
            self.parse_comparison()
        }
    }

    /// A single, non-associative comparison between two sums.
    fn parse_comparison(&mut self) -> Result<Statement> {
        let lhs = self.parse_sum()?;
        let op = match self.lexer.current() {
            Token::Eq => Some(ComparisonOp::Equal),
            Token::NotEq => Some(ComparisonOp::NotEqual),
            Token::Char('<') => Some(ComparisonOp::Less),
            Token::Char('>') => Some(ComparisonOp::Greater),
            Token::LessOrEq => Some(ComparisonOp::LessOrEqual),
            Token::GreaterOrEq => Some(ComparisonOp::GreaterOrEqual),
            _ => None,
        };
        let Some(op) = op else {
            return Ok(lhs);
        };
        self.lexer.next_token()?;
        let rhs = self.parse_sum()?;
        Ok(Statement::Comparison {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_sum(&mut self) -> Result<Statement> {
        let mut lhs = self.parse_term()?;
        loop {
            if self.accept(&Token::Char('+'))? {
                let rhs = self.parse_term()?;
                lhs = Statement::Add {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
            } else if self.accept(&Token::Char('-'))? {
                let rhs = self.parse_term()?;
                lhs = Statement::Sub {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_term(&mut self) -> Result<Statement> {
        let mut lhs = self.parse_factor()?;
        loop {
            if self.accept(&Token::Char('*'))? {
                let rhs = self.parse_factor()?;
                lhs = Statement::Mult {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
            } else if self.accept(&Token::Char('/'))? {
                let rhs = self.parse_factor()?;
                lhs = Statement::Div {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_factor(&mut self) -> Result<Statement> {
        let token = self.lexer.current().clone();
        match token {
            Token::Number(value) => {
                self.lexer.next_token()?;
                let value = i32::try_from(value).with_context(|| {
                    format!("Number literal {value} does not fit a Mython number")
                })?;
                Ok(Statement::NumberLiteral(value))
            }
            Token::String(value) => {
                self.lexer.next_token()?;
                Ok(Statement::StringLiteral(value))
            }
            Token::True => {
                self.lexer.next_token()?;
                Ok(Statement::BoolLiteral(true))
            }
            Token::False => {
                self.lexer.next_token()?;
                Ok(Statement::BoolLiteral(false))
            }
            Token::None => {
                self.lexer.next_token()?;
                Ok(Statement::NoneLiteral)
            }
            Token::Char('(') => {
                self.lexer.next_token()?;
                let inner = self.parse_test()?;
                self.expect_token(&Token::Char(')'))?;
                Ok(inner)
            }
            Token::Id(_) => self.parse_name_chain(),
            other => bail!("Unexpected token {other:?} in an expression"),
        }
    }

    /// A dotted id chain, optionally called: `a.b` reads fields, `a.b.c(..)`
    /// is a method call, `Name(..)` instantiates a declared class and
    /// `str(x)` is the stringify form.
    fn parse_name_chain(&mut self) -> Result<Statement> {
        let mut names = vec![self.expect_id()?];
        while self.accept(&Token::Char('.'))? {
            names.push(self.expect_id()?);
        }
        if !matches!(self.lexer.current(), Token::Char('(')) {
            return Ok(Statement::VariableValue(names));
        }

        let args = self.parse_call_args()?;
        if names.len() >= 2 {
            let method = names.pop().context("dotted name cannot be empty")?;
            return Ok(Statement::MethodCall {
                object: Box::new(Statement::VariableValue(names)),
                method,
                args,
            });
        }

        let name = names.pop().context("name chain cannot be empty")?;
        if name == "str" {
            ensure!(
                args.len() == 1,
                "str() takes exactly one argument, got {}",
                args.len()
            );
            let argument = args.into_iter().next().context("str() argument missing")?;
            return Ok(Statement::Stringify(Box::new(argument)));
        }
        let Some(class) = self.classes.get(&name) else {
            bail!("Unknown class '{name}' in an object expression");
        };
        Ok(Statement::NewInstance {
            class: Rc::clone(class),
            args,
        })
    }

    fn parse_call_args(&mut self) -> Result<Vec<Statement>> {
        self.expect_token(&Token::Char('('))?;
        let mut args = Vec::new();
        if !self.accept(&Token::Char(')'))? {
            args.push(self.parse_test()?);
            while self.accept(&Token::Char(','))? {
                args.push(self.parse_test()?);
            }
            self.expect_token(&Token::Char(')'))?;
        }
        Ok(args)
    }

    /// Consumes the current token after asserting it equals `expected`.
    fn expect_token(&mut self, expected: &Token) -> Result<()> {
        self.lexer.expect(expected)?;
        self.lexer.next_token()?;
        Ok(())
    }

    /// Consumes the current token if it equals `token`.
    fn accept(&mut self, token: &Token) -> Result<bool> {
        if self.lexer.current() == token {
            self.lexer.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consumes the current token after asserting it is an identifier.
    fn expect_id(&mut self) -> Result<String> {
        let name = self.lexer.expect_id()?.to_string();
        self.lexer.next_token()?;
        Ok(name)
    }
}
