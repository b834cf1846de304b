//! Runtime values. The tag set is closed: numbers, booleans, strings,
//! callables, and prototypes. "No value" is represented as `Option<Value>`
//! by the evaluator rather than a variant here.

use std::fmt::{self, Debug, Display};
use std::rc::Rc;

use crate::lexer::Token;
use crate::parser::ast::{Expression, Statement};

use super::environment::{Environment, SharedEnv};
use super::RuntimeError;

#[derive(Clone)]
pub enum Value {
    Number(f64),
    Boolean(bool),
    Str(String),
    Callable(Callable),
    Prototype(Prototype),
}

pub type NativeFn = fn(&[Value], &SharedEnv) -> Result<Option<Value>, RuntimeError>;

/// The code half of a callable: either a built-in function or the recorded
/// pieces of a lambda expression.
#[derive(Clone)]
pub enum Procedure {
    Native(NativeFn),
    Lambda(Rc<LambdaProcedure>),
}

pub struct LambdaProcedure {
    pub params: Vec<Token>,
    pub default_params: Vec<(Token, Expression)>,
    pub body: Statement,
}

/// A first-class subroutine value: an arity range, the procedure, and the
/// environment it closed over. Property access rebinds `env` to the owning
/// prototype's method environment, which is how methods come to see `this`.
#[derive(Clone)]
pub struct Callable {
    pub min_arity: usize,
    pub max_arity: usize,
    pub procedure: Procedure,
    pub env: SharedEnv,
}

/// A prototype value. `method_env` is the union of the other three
/// environments plus a `this` binding; `public_env` is the only surface
/// reachable from the outside.
#[derive(Clone)]
pub struct Prototype {
    pub constructor: Callable,
    pub surrounding_env: SharedEnv,
    pub public_env: SharedEnv,
    pub private_env: SharedEnv,
    pub method_env: SharedEnv,
}

impl Prototype {
    /// Instantiation copy: every sub-environment is copied entry by entry,
    /// the method environment is rebuilt from the copies, and `this` is
    /// re-bound to the new instance. The constructor is carried over.
    pub fn copy(&self) -> Prototype {
        let surrounding_env = Environment::shared();
        surrounding_env
            .borrow_mut()
            .copy_over(&self.surrounding_env.borrow());
        let public_env = Environment::shared();
        public_env.borrow_mut().copy_over(&self.public_env.borrow());
        let private_env = Environment::shared();
        private_env
            .borrow_mut()
            .copy_over(&self.private_env.borrow());

        let method_env = Environment::unionize(&[&surrounding_env, &public_env, &private_env]);
        let copy = Prototype {
            constructor: self.constructor.clone(),
            surrounding_env,
            public_env,
            private_env,
            method_env,
        };
        copy.method_env.borrow_mut().define(
            &Token::identifier("this"),
            Some(Value::Prototype(copy.clone())),
        );
        copy
    }
}

// Callables and prototypes have no value equality; comparing them is only
// meaningful for the primitive tags.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(left), Value::Number(right)) => left == right,
            (Value::Boolean(left), Value::Boolean(right)) => left == right,
            (Value::Str(left), Value::Str(right)) => left == right,
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(value) => write!(f, "{value}"),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::Str(value) => f.write_str(value),
            Value::Callable(_) => f.write_str("<subroutine>"),
            Value::Prototype(_) => f.write_str("<prototype>"),
        }
    }
}

// Hand-written so that a prototype's self-referential environments do not
// send the derived formatter into a cycle.
impl Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(value) => write!(f, "Number({value})"),
            Value::Boolean(value) => write!(f, "Boolean({value})"),
            Value::Str(value) => write!(f, "Str({value:?})"),
            Value::Callable(callable) => write!(
                f,
                "Callable({}..{})",
                callable.min_arity, callable.max_arity
            ),
            Value::Prototype(_) => f.write_str("Prototype"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formatting() {
        assert_eq!("15", Value::Number(15.0).to_string());
        assert_eq!("4.25", Value::Number(4.25).to_string());
        assert_eq!("true", Value::Boolean(true).to_string());
        assert_eq!("hello", Value::Str("hello".into()).to_string());
    }

    #[test]
    fn test_primitive_equality() {
        assert_eq!(Value::Number(1.0), Value::Number(1.0));
        assert_ne!(Value::Number(1.0), Value::Boolean(true));
        assert_eq!(Value::Str("a".into()), Value::Str("a".into()));
    }
}
