//! Built-in subroutines and numeric constants registered in the global
//! environment. Natives receive their already-evaluated arguments and the
//! environment they were bound with; arity has been validated by the call
//! machinery before they run.

use std::io;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::lexer::Token;

use super::environment::SharedEnv;
use super::value::{Callable, Procedure, Value};
use super::RuntimeError;

macro_rules! native {
    ($env:expr, $name:expr, $min:expr, $max:expr, $function:expr) => {
        $env.borrow_mut().define(
            &Token::identifier($name),
            Some(Value::Callable(Callable {
                min_arity: $min,
                max_arity: $max,
                procedure: Procedure::Native($function),
                env: Rc::clone($env),
            })),
        );
    };
}

macro_rules! constant {
    ($env:expr, $name:expr, $value:expr) => {
        $env.borrow_mut()
            .define(&Token::identifier($name), Some(Value::Number($value)));
    };
}

pub fn install(global: &SharedEnv) {
    native!(global, "doNothing", 0, 0, do_nothing);
    native!(global, "print", 1, 1, print);
    native!(global, "input", 0, 1, input);
    native!(global, "time", 0, 0, time);

    native!(global, "min", 2, 2, min);
    native!(global, "max", 2, 2, max);
    native!(global, "abs", 1, 1, abs);
    native!(global, "round", 1, 1, round);
    native!(global, "floor", 1, 1, floor);
    native!(global, "ceil", 1, 1, ceil);
    native!(global, "truncate", 1, 1, truncate);

    native!(global, "pow", 2, 2, pow);
    native!(global, "exp", 1, 1, exp);
    native!(global, "sqrt", 1, 1, sqrt);
    native!(global, "cbrt", 1, 1, cbrt);
    native!(global, "hypotenuse", 2, 3, hypotenuse);
    native!(global, "log", 1, 1, log);
    native!(global, "lg", 1, 1, lg);
    native!(global, "ln", 1, 1, ln);

    native!(global, "sin", 1, 1, sin);
    native!(global, "cos", 1, 1, cos);
    native!(global, "tan", 1, 1, tan);
    native!(global, "sinh", 1, 1, sinh);
    native!(global, "cosh", 1, 1, cosh);
    native!(global, "tanh", 1, 1, tanh);
    native!(global, "arcsin", 1, 1, arcsin);
    native!(global, "arccos", 1, 1, arccos);
    native!(global, "arctan", 1, 2, arctan);
    native!(global, "arcsinh", 1, 1, arcsinh);
    native!(global, "arccosh", 1, 1, arccosh);
    native!(global, "arctanh", 1, 1, arctanh);

    native!(global, "isnan", 1, 1, isnan);

    constant!(global, "PI", std::f64::consts::PI);
    constant!(global, "E_V", std::f64::consts::E);
    constant!(global, "MIN_VALUE", f64::MIN_POSITIVE);
    constant!(global, "MAX_VALUE", f64::MAX);
    constant!(global, "NaN", f64::NAN);
}

fn number(args: &[Value], index: usize) -> Result<f64, RuntimeError> {
    match args.get(index) {
        Some(Value::Number(value)) => Ok(*value),
        _ => Err(RuntimeError::new("Expected a number argument.", None)),
    }
}

pub fn do_nothing(_args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(None)
}

fn print(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    match args.first() {
        Some(value) => println!("{value}"),
        None => println!(),
    }
    Ok(None)
}

fn input(args: &[Value], env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    if !args.is_empty() {
        print(args, env)?;
    }
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .map_err(|error| RuntimeError::new(format!("Failed to read input: {error}"), None))?;
    let line = line.trim_end_matches('\n').trim_end_matches('\r');
    Ok(Some(Value::Str(line.to_string())))
}

fn time(_args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|error| RuntimeError::new(format!("Failed to read the clock: {error}"), None))?;
    Ok(Some(Value::Number(now.as_secs_f64())))
}

fn min(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.min(number(args, 1)?))))
}

fn max(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.max(number(args, 1)?))))
}

fn abs(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.abs())))
}

fn round(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.round())))
}

fn floor(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.floor())))
}

fn ceil(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.ceil())))
}

fn truncate(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.trunc())))
}

fn pow(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.powf(number(args, 1)?))))
}

fn exp(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.exp())))
}

fn sqrt(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.sqrt())))
}

fn cbrt(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.cbrt())))
}

fn hypotenuse(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    let hypot = number(args, 0)?.hypot(number(args, 1)?);
    if args.len() == 2 {
        return Ok(Some(Value::Number(hypot)));
    }
    Ok(Some(Value::Number(hypot.hypot(number(args, 2)?))))
}

fn log(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.log10())))
}

fn lg(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.log2())))
}

fn ln(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.ln())))
}

fn sin(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.sin())))
}

fn cos(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.cos())))
}

fn tan(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.tan())))
}

fn sinh(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.sinh())))
}

fn cosh(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.cosh())))
}

fn tanh(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.tanh())))
}

fn arcsin(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.asin())))
}

fn arccos(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.acos())))
}

/// One argument is a plain arctangent; two arguments behave like `atan2`.
fn arctan(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    let y = number(args, 0)?;
    if args.len() == 1 {
        return Ok(Some(Value::Number(y.atan())));
    }
    Ok(Some(Value::Number(y.atan2(number(args, 1)?))))
}

fn arcsinh(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.asinh())))
}

fn arccosh(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.acosh())))
}

fn arctanh(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(args, 0)?.atanh())))
}

fn isnan(args: &[Value], _env: &SharedEnv) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Boolean(number(args, 0)?.is_nan())))
}
