//! # Interpreter Module
//!
//! The tree-walking evaluator. Expressions evaluate to `Option<Value>`
//! (absent stands for void) and statements run for their side effects,
//! threading an explicit environment handle through every step. `return`
//! is not an error and not an exception: statement execution yields a
//! [`ControlFlow`] that either falls through or carries the return value up
//! to the nearest callable frame.

pub mod environment;
pub mod native;
pub mod persistent_map;
pub mod value;

use std::rc::Rc;
use std::{error::Error, fmt::Display};

use crate::lexer::{Token, TokenKind};
use crate::parser::ast::{Expression, Literal, PrototypeExpression, Statement};

use self::environment::{Environment, SharedEnv};
use self::value::{Callable, LambdaProcedure, Procedure, Prototype, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub message: String,
    pub token: Option<Token>,
}

impl RuntimeError {
    pub fn new(message: impl ToString, token: Option<Token>) -> Self {
        Self {
            message: message.to_string(),
            token,
        }
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for RuntimeError {}

/// Result of executing a statement: either fall through to the next one or
/// unwind to the nearest enclosing callable with a return value.
#[derive(Debug, PartialEq)]
pub enum ControlFlow {
    Normal,
    Return(Option<Value>),
}

pub struct Interpreter {
    globals: SharedEnv,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Environment::shared();
        native::install(&globals);
        Self { globals }
    }

    pub fn globals(&self) -> &SharedEnv {
        &self.globals
    }

    /// Executes top-level statements in order. The first runtime error
    /// aborts the rest of the program and is handed back to the caller.
    pub fn interpret(&self, statements: &[Statement]) -> Result<(), RuntimeError> {
        for statement in statements {
            if let ControlFlow::Return(_) = self.execute(statement, &self.globals)? {
                return Err(RuntimeError::new("Can not return from the top level.", None));
            }
        }
        Ok(())
    }

    fn execute(&self, statement: &Statement, env: &SharedEnv) -> Result<ControlFlow, RuntimeError> {
        match statement {
            Statement::Expression { expr } => {
                self.opt_evaluate(expr, env)?;
                Ok(ControlFlow::Normal)
            }
            Statement::Variable { name, initializer } => {
                let value = match initializer {
                    Some(expr) => Some(self.evaluate(expr, env)?),
                    None => None,
                };
                // A subroutine has to be visible from its own body, so the
                // binding is repeated inside the captured environment.
                if let Some(Value::Callable(callable)) = &value {
                    callable.env.borrow_mut().define(name, value.clone());
                }
                env.borrow_mut().define(name, value);
                Ok(ControlFlow::Normal)
            }
            Statement::Scope { statements } => {
                let scoped = Environment::nested(env);
                for statement in statements {
                    if let ControlFlow::Return(value) = self.execute(statement, &scoped)? {
                        return Ok(ControlFlow::Return(value));
                    }
                }
                Ok(ControlFlow::Normal)
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_true(&self.opt_evaluate(condition, env)?) {
                    self.execute(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch, env)
                } else {
                    Ok(ControlFlow::Normal)
                }
            }
            Statement::For {
                initializer,
                condition,
                body,
                update,
            } => {
                let loop_env = Environment::nested(env);
                if let Some(initializer) = initializer {
                    self.execute(initializer, &loop_env)?;
                }
                while is_true(&self.opt_evaluate(condition, &loop_env)?) {
                    if let Some(body) = body {
                        if let ControlFlow::Return(value) = self.execute(body, &loop_env)? {
                            return Ok(ControlFlow::Return(value));
                        }
                    }
                    if let Some(update) = update {
                        self.execute(update, &loop_env)?;
                    }
                }
                Ok(ControlFlow::Normal)
            }
            Statement::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.opt_evaluate(expr, env)?,
                    None => None,
                };
                Ok(ControlFlow::Return(value))
            }
        }
    }

    /// Evaluation that insists on a value; void results are an error here.
    fn evaluate(&self, expr: &Expression, env: &SharedEnv) -> Result<Value, RuntimeError> {
        match self.opt_evaluate(expr, env)? {
            Some(value) => Ok(value),
            None => Err(RuntimeError::new("Expected a value!", None)),
        }
    }

    fn opt_evaluate(
        &self,
        expr: &Expression,
        env: &SharedEnv,
    ) -> Result<Option<Value>, RuntimeError> {
        match expr {
            Expression::Literal(literal) => Ok(Some(match literal {
                Literal::Number(value) => Value::Number(*value),
                Literal::Boolean(value) => Value::Boolean(*value),
                Literal::Str(value) => Value::Str(value.clone()),
            })),
            Expression::Unary { op, right } => {
                let right = self.evaluate(right, env)?;
                match (op.kind, right) {
                    (TokenKind::Exclamation, Value::Boolean(value)) => {
                        Ok(Some(Value::Boolean(!value)))
                    }
                    (TokenKind::Dash, Value::Number(value)) => Ok(Some(Value::Number(-value))),
                    _ => Err(RuntimeError::new(
                        "Not a supported unary operator.",
                        Some(op.clone()),
                    )),
                }
            }
            Expression::Binary { left, op, right } => {
                let left = self.evaluate(left, env)?;
                let right = self.evaluate(right, env)?;
                binary_operation(&left, op, &right).map(Some)
            }
            Expression::Group { expr } => self.opt_evaluate(expr, env),
            Expression::Ternary {
                then_expr,
                condition,
                else_expr,
            } => {
                if is_true(&self.opt_evaluate(condition, env)?) {
                    self.opt_evaluate(then_expr, env)
                } else {
                    self.opt_evaluate(else_expr, env)
                }
            }
            Expression::Variable { name } => env.borrow().get(name),
            Expression::Assignment { name, value } => {
                let value = self.evaluate(value, env)?;
                env.borrow_mut().assign(name, Some(value.clone()))?;
                Ok(Some(value))
            }
            Expression::Call {
                callee,
                args,
                closing_paren,
            } => {
                let callee = self.evaluate(callee, env)?;
                let mut arguments = vec![];
                for arg in args {
                    arguments.push(self.evaluate(arg, env)?);
                }
                match callee {
                    Value::Callable(callable) => {
                        check_arity(&callable, arguments.len(), "Method", closing_paren)?;
                        let env = Rc::clone(&callable.env);
                        self.invoke(&callable, &arguments, &env)
                    }
                    Value::Prototype(prototype) => {
                        let instance = prototype.copy();
                        check_arity(
                            &instance.constructor,
                            arguments.len(),
                            "Constructor",
                            closing_paren,
                        )?;
                        // The constructor runs directly against the copy's
                        // method environment rather than its captured one.
                        self.invoke(&instance.constructor, &arguments, &instance.method_env)?;
                        Ok(Some(Value::Prototype(instance)))
                    }
                    _ => Err(RuntimeError::new(
                        "Only functions and prototypes may be called.",
                        Some(closing_paren.clone()),
                    )),
                }
            }
            Expression::Lambda(lambda) => Ok(Some(Value::Callable(Callable {
                min_arity: lambda.params.len(),
                max_arity: lambda.params.len() + lambda.default_params.len(),
                procedure: Procedure::Lambda(Rc::new(LambdaProcedure {
                    params: lambda.params.clone(),
                    default_params: lambda.default_params.clone(),
                    body: (*lambda.body).clone(),
                })),
                env: Environment::persisted(env),
            }))),
            Expression::Prototype(prototype) => {
                self.prototype_expression(prototype, env).map(Some)
            }
            Expression::Get { object, property } => {
                let object = self.evaluate(object, env)?;
                let Value::Prototype(prototype) = object else {
                    return Err(RuntimeError::new(
                        "Can only receive properties from prototypes.",
                        Some(property.clone()),
                    ));
                };
                let public = prototype.public_env.borrow().get(property);
                match public {
                    Ok(Some(Value::Callable(mut callable))) => {
                        // Methods resolve names against the prototype they
                        // were fetched from, `this` included.
                        callable.env = Rc::clone(&prototype.method_env);
                        Ok(Some(Value::Callable(callable)))
                    }
                    Ok(value) => Ok(value),
                    Err(_) => {
                        if prototype.private_env.borrow().get(property).is_ok() {
                            Err(RuntimeError::new(
                                "Requested property is private.",
                                Some(property.clone()),
                            ))
                        } else {
                            Err(RuntimeError::new(
                                "Property not found in prototype.",
                                Some(property.clone()),
                            ))
                        }
                    }
                }
            }
            Expression::Set {
                object,
                property,
                value,
            } => {
                let object = self.evaluate(object, env)?;
                let Value::Prototype(prototype) = object else {
                    return Err(RuntimeError::new(
                        "Can only set properties of prototypes.",
                        Some(property.clone()),
                    ));
                };
                let value = self.evaluate(value, env)?;
                let assigned = prototype.public_env.borrow_mut().assign(property, Some(value));
                if assigned.is_err() {
                    if prototype.private_env.borrow().get(property).is_ok() {
                        return Err(RuntimeError::new(
                            "Requested property is private.",
                            Some(property.clone()),
                        ));
                    }
                    return Err(RuntimeError::new(
                        "Property not found in prototype.",
                        Some(property.clone()),
                    ));
                }
                Ok(None)
            }
        }
    }

    /// Runs a callable against `env` as the enclosing scope. Plain calls
    /// pass the callable's own captured environment; prototype construction
    /// and method calls substitute a method environment instead.
    fn invoke(
        &self,
        callable: &Callable,
        args: &[Value],
        env: &SharedEnv,
    ) -> Result<Option<Value>, RuntimeError> {
        match &callable.procedure {
            Procedure::Native(function) => function(args, env),
            Procedure::Lambda(lambda) => {
                let scoped = Environment::nested(env);
                let required = lambda.params.len();
                for index in 0..required + lambda.default_params.len() {
                    if index < required {
                        scoped
                            .borrow_mut()
                            .define(&lambda.params[index], Some(args[index].clone()));
                    } else if index < args.len() {
                        let (name, _) = &lambda.default_params[index - required];
                        scoped.borrow_mut().define(name, Some(args[index].clone()));
                    } else {
                        let (name, default) = &lambda.default_params[index - required];
                        let value = self.evaluate(default, &scoped)?;
                        scoped.borrow_mut().define(name, Some(value));
                    }
                }
                match self.execute(&lambda.body, &scoped)? {
                    ControlFlow::Return(value) => Ok(value),
                    ControlFlow::Normal => Ok(None),
                }
            }
        }
    }

    fn prototype_expression(
        &self,
        prototype: &PrototypeExpression,
        env: &SharedEnv,
    ) -> Result<Value, RuntimeError> {
        let surrounding_env = Environment::persisted(env);
        let public_env = Environment::members();
        let private_env = Environment::members();

        if let Some(parent_name) = &prototype.parent {
            let parent = env.borrow().get(parent_name)?;
            let Some(Value::Prototype(parent)) = parent else {
                return Err(RuntimeError::new(
                    "Can only inherit from other prototypes.",
                    Some(parent_name.clone()),
                ));
            };
            private_env
                .borrow_mut()
                .copy_over(&parent.private_env.borrow());
            public_env
                .borrow_mut()
                .copy_over(&parent.public_env.borrow());
            surrounding_env.borrow_mut().define(
                &Token::identifier("parent"),
                Some(Value::Prototype(parent)),
            );
        }

        for statement in &prototype.public_properties {
            self.execute(statement, &public_env)?;
        }
        for statement in &prototype.private_properties {
            self.execute(statement, &private_env)?;
        }

        let constructor = Callable {
            min_arity: 0,
            max_arity: 0,
            procedure: Procedure::Native(native::do_nothing),
            env: Rc::clone(&surrounding_env),
        };
        let method_env = Environment::unionize(&[&surrounding_env, &public_env, &private_env]);
        let mut instance = Prototype {
            constructor,
            surrounding_env,
            public_env,
            private_env,
            method_env,
        };

        if let Some(expr) = &prototype.constructor {
            let Value::Callable(constructor) = self.evaluate(expr, &instance.method_env)? else {
                return Err(RuntimeError::new("The constructor must be a subroutine.", None));
            };
            instance.constructor = constructor;
        }

        instance.method_env.borrow_mut().define(
            &Token::identifier("this"),
            Some(Value::Prototype(instance.clone())),
        );
        Ok(Value::Prototype(instance))
    }
}

/// Truthiness: booleans by value, numbers truthy iff non-zero, strings
/// truthy iff non-empty, everything else (absent included) is false.
fn is_true(value: &Option<Value>) -> bool {
    match value {
        Some(Value::Boolean(value)) => *value,
        Some(Value::Number(value)) => *value != 0.0,
        Some(Value::Str(value)) => !value.is_empty(),
        _ => false,
    }
}

fn check_arity(
    callable: &Callable,
    received: usize,
    what: &str,
    paren: &Token,
) -> Result<(), RuntimeError> {
    if received < callable.min_arity || received > callable.max_arity {
        return Err(RuntimeError::new(
            format!(
                "{what} expected at least {} arguments, at most {} arguments, and received {received} arguments.",
                callable.min_arity, callable.max_arity
            ),
            Some(paren.clone()),
        ));
    }
    Ok(())
}

/// Binary dispatch keys off the left operand's tag; mixed-tag operands are
/// a type mismatch.
fn binary_operation(left: &Value, op: &Token, right: &Value) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Str(left), Value::Str(right)) => string_operation(left, op, right),
        (Value::Boolean(left), Value::Boolean(right)) => boolean_operation(*left, op, *right),
        (Value::Number(left), Value::Number(right)) => numeric_operation(*left, op, *right),
        _ => Err(RuntimeError::new(
            "Type mismatch between operands!",
            Some(op.clone()),
        )),
    }
}

fn string_operation(left: &str, op: &Token, right: &str) -> Result<Value, RuntimeError> {
    match op.kind {
        TokenKind::Plus => Ok(Value::Str(format!("{left}{right}"))),
        TokenKind::EqualTo => Ok(Value::Boolean(left == right)),
        TokenKind::NotEqualTo => Ok(Value::Boolean(left != right)),
        TokenKind::LessThan => Ok(Value::Boolean(left < right)),
        TokenKind::GreaterThan => Ok(Value::Boolean(left > right)),
        TokenKind::LessThanOrEqualTo => Ok(Value::Boolean(left <= right)),
        TokenKind::GreaterThanOrEqualTo => Ok(Value::Boolean(left >= right)),
        _ => Err(RuntimeError::new(
            "Not a supported string operator.",
            Some(op.clone()),
        )),
    }
}

// `and`/`or` land here with both sides already evaluated; there is no
// short-circuit at this level.
fn boolean_operation(left: bool, op: &Token, right: bool) -> Result<Value, RuntimeError> {
    match op.kind {
        TokenKind::And => Ok(Value::Boolean(left && right)),
        TokenKind::Or => Ok(Value::Boolean(left || right)),
        TokenKind::EqualTo => Ok(Value::Boolean(left == right)),
        TokenKind::NotEqualTo => Ok(Value::Boolean(left != right)),
        _ => Err(RuntimeError::new(
            "Not a supported boolean operator.",
            Some(op.clone()),
        )),
    }
}

fn numeric_operation(left: f64, op: &Token, right: f64) -> Result<Value, RuntimeError> {
    match op.kind {
        TokenKind::EqualTo => Ok(Value::Boolean(left == right)),
        TokenKind::NotEqualTo => Ok(Value::Boolean(left != right)),
        TokenKind::LessThan => Ok(Value::Boolean(left < right)),
        TokenKind::LessThanOrEqualTo => Ok(Value::Boolean(left <= right)),
        TokenKind::GreaterThan => Ok(Value::Boolean(left > right)),
        TokenKind::GreaterThanOrEqualTo => Ok(Value::Boolean(left >= right)),
        TokenKind::Asterisk => Ok(Value::Number(left * right)),
        TokenKind::Plus => Ok(Value::Number(left + right)),
        TokenKind::Dash => Ok(Value::Number(left - right)),
        TokenKind::ForwardSlash => {
            if right == 0.0 {
                return Err(RuntimeError::new(
                    "Attempted to divide by zero!",
                    Some(op.clone()),
                ));
            }
            Ok(Value::Number(left / right))
        }
        TokenKind::Modulus => {
            if right == 0.0 {
                return Err(RuntimeError::new(
                    "Attempted to take the remainder of a division by zero!",
                    Some(op.clone()),
                ));
            }
            Ok(Value::Number(left % right))
        }
        _ => Err(RuntimeError::new(
            "Not a supported binary operator.",
            Some(op.clone()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::reporter::ErrorReporter;

    use super::*;

    fn run(source: &str) -> Interpreter {
        let interpreter = Interpreter::new();
        match try_run_with(&interpreter, source) {
            Ok(()) => interpreter,
            Err(error) => panic!("program failed with \"{error}\":\n{source}"),
        }
    }

    fn run_error(source: &str) -> RuntimeError {
        let interpreter = Interpreter::new();
        match try_run_with(&interpreter, source) {
            Ok(()) => panic!("expected a runtime error:\n{source}"),
            Err(error) => error,
        }
    }

    fn try_run_with(interpreter: &Interpreter, source: &str) -> Result<(), RuntimeError> {
        let mut reporter = ErrorReporter::default();
        let tokens = Lexer::new(source, &mut reporter).lex();
        let statements: Vec<_> = Parser::new(tokens, &mut reporter)
            .parse()
            .into_iter()
            .flatten()
            .collect();
        assert!(!reporter.had_error(), "unexpected diagnostic:\n{source}");
        interpreter.interpret(&statements)
    }

    fn global(interpreter: &Interpreter, name: &str) -> Option<Value> {
        interpreter
            .globals()
            .borrow()
            .get(&Token::identifier(name))
            .unwrap_or_else(|error| panic!("{error}"))
    }

    fn global_number(interpreter: &Interpreter, name: &str) -> f64 {
        match global(interpreter, name) {
            Some(Value::Number(value)) => value,
            other => panic!("expected {name} to be a number, got {other:?}"),
        }
    }

    fn global_str(interpreter: &Interpreter, name: &str) -> String {
        match global(interpreter, name) {
            Some(Value::Str(value)) => value,
            other => panic!("expected {name} to be a string, got {other:?}"),
        }
    }

    #[test]
    fn test_arithmetic_precedence() {
        let interpreter = run("variable r = (2 + 2) * (4.25 - 1 / 2);");

        assert_eq!(15.0, global_number(&interpreter, "r"));
    }

    #[test]
    fn test_string_concatenation_and_comparison() {
        let interpreter = run(
            "variable s = \"aard\" + \"vark\";\
             variable lt = \"aardvark\" < \"zoology\";",
        );

        assert_eq!("aardvark", global_str(&interpreter, "s"));
        assert_eq!(Some(Value::Boolean(true)), global(&interpreter, "lt"));
    }

    #[test]
    fn test_modulus_follows_floating_remainder() {
        let interpreter = run("variable r = 7.5 mod 2;");

        assert_eq!(1.5, global_number(&interpreter, "r"));
    }

    #[test]
    fn test_division_by_zero_is_a_runtime_error() {
        let error = run_error("variable r = 1 / 0;");

        assert_eq!("Attempted to divide by zero!", error.message);
    }

    #[test]
    fn test_type_mismatch_is_a_runtime_error() {
        let error = run_error("variable r = 1 + \"one\";");

        assert_eq!("Type mismatch between operands!", error.message);
    }

    #[test]
    fn test_unary_operators() {
        let interpreter = run("variable n = -4; variable b = !false;");

        assert_eq!(-4.0, global_number(&interpreter, "n"));
        assert_eq!(Some(Value::Boolean(true)), global(&interpreter, "b"));
    }

    #[test]
    fn test_ternary_picks_one_branch() {
        let interpreter = run(
            "variable hot = \"yes\" if 1 else \"no\";\
             variable cold = \"yes\" if \"\" else \"no\";",
        );

        assert_eq!("yes", global_str(&interpreter, "hot"));
        assert_eq!("no", global_str(&interpreter, "cold"));
    }

    #[test]
    fn test_recursive_closure() {
        let interpreter = run(
            "subroutine fib(n) { return n if n < 2 else fib(n-1) + fib(n-2); }\
             variable r = fib(10);",
        );

        assert_eq!(55.0, global_number(&interpreter, "r"));
    }

    #[test]
    fn test_return_stops_the_body() {
        let interpreter = run(
            "variable touched = false;\
             subroutine f() { return 1; touched = true; }\
             variable r = f();",
        );

        assert_eq!(1.0, global_number(&interpreter, "r"));
        assert_eq!(Some(Value::Boolean(false)), global(&interpreter, "touched"));
    }

    #[test]
    fn test_bare_return_yields_no_value() {
        let error = run_error("subroutine f() { return; } variable r = f();");

        assert_eq!("Expected a value!", error.message);
    }

    #[test]
    fn test_return_at_the_top_level_is_an_error() {
        let error = run_error("return 1;");

        assert_eq!("Can not return from the top level.", error.message);
    }

    #[test]
    fn test_default_parameters() {
        let interpreter = run(
            "subroutine greet(name, greeting = \"hello\") { return greeting + \" \" + name; }\
             variable a = greet(\"Lis\");\
             variable b = greet(\"Lis\", \"hi\");",
        );

        assert_eq!("hello Lis", global_str(&interpreter, "a"));
        assert_eq!("hi Lis", global_str(&interpreter, "b"));
    }

    #[test]
    fn test_default_parameter_expressions_see_earlier_parameters() {
        let interpreter = run(
            "subroutine double(n, m = n * 2) { return m; }\
             variable r = double(21);",
        );

        assert_eq!(42.0, global_number(&interpreter, "r"));
    }

    #[test]
    fn test_arity_is_validated() {
        let error = run_error("subroutine f(a) { } f(1, 2);");

        assert!(error.message.contains("expected at least 1"));
    }

    #[test]
    fn test_calling_a_number_is_an_error() {
        let error = run_error("variable x = 4; x();");

        assert_eq!("Only functions and prototypes may be called.", error.message);
    }

    #[test]
    fn test_constants_are_immutable() {
        let error = run_error("constant pi = 3.14; pi = 3;");

        assert!(error.message.contains("pi"));
    }

    #[test]
    fn test_scopes_shadow_and_restore() {
        let interpreter = run(
            "variable x = 1;\
             variable seen = 0;\
             { variable x = 2; seen = x; }\
             variable after = x;",
        );

        assert_eq!(2.0, global_number(&interpreter, "seen"));
        assert_eq!(1.0, global_number(&interpreter, "after"));
    }

    #[test]
    fn test_while_loop() {
        let interpreter = run(
            "variable n = 0;\
             while n < 5 { n = n + 1; }",
        );

        assert_eq!(5.0, global_number(&interpreter, "n"));
    }

    #[test]
    fn test_for_loop() {
        let interpreter = run(
            "variable sum = 0;\
             for variable i = 1; i <= 4; i = i + 1 { sum = sum + i; }",
        );

        assert_eq!(10.0, global_number(&interpreter, "sum"));
    }

    #[test]
    fn test_eager_logical_operators() {
        let interpreter = run("variable r = false and true or true;");

        // `or` binds tighter than `and` in this grammar, so this reads as
        // `false and (true or true)`.
        assert_eq!(Some(Value::Boolean(false)), global(&interpreter, "r"));
    }

    #[test]
    fn test_closures_share_preexisting_bindings() {
        let interpreter = run(
            "variable n = 0;\
             subroutine bump() { n = n + 1; }\
             subroutine current() { return n; }\
             bump(); bump();\
             variable r = current();",
        );

        assert_eq!(2.0, global_number(&interpreter, "r"));
    }

    #[test]
    fn test_lambdas_are_first_class() {
        let interpreter = run(
            "variable twice = lambda (f, x) { return f(f(x)); };\
             variable r = twice(lambda (n) { return n + 1; }, 5);",
        );

        assert_eq!(7.0, global_number(&interpreter, "r"));
    }

    #[test]
    fn test_native_builtins() {
        let interpreter = run(
            "variable r = min(3, 7) + max(1, 2) + pow(2, 3);\
             variable h = hypotenuse(3, 4);",
        );

        assert_eq!(13.0, global_number(&interpreter, "r"));
        assert_eq!(5.0, global_number(&interpreter, "h"));
    }

    #[test]
    fn test_prototype_with_private_state() {
        let interpreter = run(
            "prototype Counter {\
               constructor lambda () { }\
               public:\
                 subroutine bump() { n = n + 1; }\
                 subroutine value() { return n; }\
               private:\
                 variable n = 0;\
             }\
             variable c = Counter();\
             c.bump(); c.bump(); c.bump();\
             variable r = c.value();",
        );

        assert_eq!(3.0, global_number(&interpreter, "r"));
    }

    #[test]
    fn test_private_property_access_is_an_error() {
        let error = run_error(
            "prototype Counter {\
               public:\
                 subroutine value() { return n; }\
               private:\
                 variable n = 0;\
             }\
             variable c = Counter();\
             c.n;",
        );

        assert_eq!("Requested property is private.", error.message);
    }

    #[test]
    fn test_unknown_property_access_is_an_error() {
        let error = run_error(
            "prototype Empty { }\
             variable e = Empty();\
             e.missing;",
        );

        assert_eq!("Property not found in prototype.", error.message);
    }

    #[test]
    fn test_instances_do_not_share_state() {
        let interpreter = run(
            "prototype Counter {\
               public:\
                 subroutine bump() { n = n + 1; }\
                 subroutine value() { return n; }\
               private:\
                 variable n = 0;\
             }\
             variable a = Counter();\
             variable b = Counter();\
             a.bump(); a.bump();\
             variable ra = a.value();\
             variable rb = b.value();",
        );

        assert_eq!(2.0, global_number(&interpreter, "ra"));
        assert_eq!(0.0, global_number(&interpreter, "rb"));
    }

    #[test]
    fn test_constructor_runs_against_the_instance() {
        let interpreter = run(
            "prototype Point {\
               constructor lambda (ix, iy) { x = ix; y = iy; }\
               public:\
                 variable x = 0;\
                 variable y = 0;\
             }\
             variable p = Point(3, 4);\
             variable r = p.x + p.y;",
        );

        assert_eq!(7.0, global_number(&interpreter, "r"));
    }

    #[test]
    fn test_public_properties_can_be_set_from_outside() {
        let interpreter = run(
            "prototype Point {\
               public:\
                 variable x = 0;\
             }\
             variable p = Point();\
             p.x = 9;\
             variable r = p.x;",
        );

        assert_eq!(9.0, global_number(&interpreter, "r"));
    }

    #[test]
    fn test_setting_a_private_property_is_an_error() {
        let error = run_error(
            "prototype Hidden {\
               private:\
                 variable n = 0;\
             }\
             variable h = Hidden();\
             h.n = 1;",
        );

        assert_eq!("Requested property is private.", error.message);
    }

    #[test]
    fn test_methods_see_this() {
        let interpreter = run(
            "prototype Chain {\
               public:\
                 subroutine itself() { return this; }\
                 subroutine tag() { return 7; }\
             }\
             variable c = Chain();\
             variable r = c.itself().tag();",
        );

        assert_eq!(7.0, global_number(&interpreter, "r"));
    }

    #[test]
    fn test_inheritance_preloads_parent_properties() {
        let interpreter = run(
            "prototype A {\
               public:\
                 subroutine greet() { return \"A\"; }\
                 variable shared = 1;\
             }\
             prototype B from A {\
               public:\
                 subroutine own() { return shared + 1; }\
             }\
             variable b = B();\
             variable greeting = b.greet();\
             variable r = b.own();",
        );

        assert_eq!("A", global_str(&interpreter, "greeting"));
        assert_eq!(2.0, global_number(&interpreter, "r"));
    }

    #[test]
    fn test_parent_is_bound_in_the_child() {
        let interpreter = run(
            "prototype A {\
               public:\
                 subroutine greet() { return \"A\"; }\
             }\
             prototype B from A {\
               public:\
                 subroutine who() { return parent.greet(); }\
             }\
             variable b = B();\
             variable r = b.who();",
        );

        assert_eq!("A", global_str(&interpreter, "r"));
    }

    #[test]
    fn test_inheriting_from_a_non_prototype_is_an_error() {
        let error = run_error("variable A = 4; prototype B from A { }");

        assert_eq!("Can only inherit from other prototypes.", error.message);
    }

    #[test]
    fn test_runtime_error_stops_later_statements() {
        let interpreter = Interpreter::new();
        let result = try_run_with(
            &interpreter,
            "variable r = 0;\
             undefined_name;\
             r = 1;",
        );

        assert!(result.is_err());
        assert_eq!(0.0, global_number(&interpreter, "r"));
    }
}
