use std::cmp::Ordering;
use std::collections::HashMap;

use num::{BigInt, Signed, ToPrimitive, Zero};

use crate::equality::ExprEq;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::runtime::{BuiltinFn, Environment, Procedure};

fn arity(name: &'static str, expected: &str, got: usize) -> Error {
    Error::ArityMismatch {
        name: name.to_string(),
        expected: expected.to_string(),
        got,
    }
}

fn boolean(holds: bool) -> Option<Expr> {
    Some(Expr::int(if holds { 1 } else { 0 }))
}

fn big_to_f64(n: &BigInt) -> f64 {
    n.to_f64().unwrap_or(if n.is_negative() {
        f64::NEG_INFINITY
    } else {
        f64::INFINITY
    })
}

/// A numeric argument, already shape-checked. Mixing an integer with a
/// float coerces the operation to floats; there is no further tower.
#[derive(Clone, Debug)]
enum Num {
    Int(BigInt),
    Float(f64),
}

impl Num {
    fn from_expr(name: &'static str, expr: &Expr) -> Result<Num> {
        match expr {
            Expr::Integer(n) => Ok(Num::Int(n.clone())),
            Expr::Float(x) => Ok(Num::Float(*x)),
            other => Err(Error::TypeError(format!(
                "'{}' needs numeric args, got a {}",
                name,
                other.kind_name()
            ))),
        }
    }

    fn to_f64(&self) -> f64 {
        match self {
            Num::Int(n) => big_to_f64(n),
            Num::Float(x) => *x,
        }
    }

    fn into_expr(self) -> Expr {
        match self {
            Num::Int(n) => Expr::Integer(n),
            Num::Float(x) => Expr::Float(x),
        }
    }

    fn combine(
        self,
        other: Num,
        int_op: fn(BigInt, BigInt) -> BigInt,
        float_op: fn(f64, f64) -> f64,
    ) -> Num {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => Num::Int(int_op(a, b)),
            (a, b) => Num::Float(float_op(a.to_f64(), b.to_f64())),
        }
    }

    fn add(self, other: Num) -> Num {
        self.combine(other, |a, b| a + b, |a, b| a + b)
    }

    fn sub(self, other: Num) -> Num {
        self.combine(other, |a, b| a - b, |a, b| a - b)
    }

    fn mul(self, other: Num) -> Num {
        self.combine(other, |a, b| a * b, |a, b| a * b)
    }

    fn neg(self) -> Num {
        match self {
            Num::Int(n) => Num::Int(-n),
            Num::Float(x) => Num::Float(-x),
        }
    }

    fn is_zero(&self) -> bool {
        match self {
            Num::Int(n) => n.is_zero(),
            Num::Float(x) => *x == 0.0,
        }
    }

    fn compare(&self, other: &Num) -> Option<Ordering> {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => Some(a.cmp(b)),
            (a, b) => a.to_f64().partial_cmp(&b.to_f64()),
        }
    }
}

fn numbers(name: &'static str, args: &[Expr]) -> Result<Vec<Num>> {
    args.iter().map(|arg| Num::from_expr(name, arg)).collect()
}

// Section: arithmetic

fn sum(args: Vec<Expr>) -> Result<Option<Expr>> {
    let mut nums = numbers("+", &args)?.into_iter();
    let first = nums.next().ok_or_else(|| arity("+", "at least 1", 0))?;
    Ok(Some(nums.fold(first, Num::add).into_expr()))
}

fn difference(args: Vec<Expr>) -> Result<Option<Expr>> {
    let nums = numbers("-", &args)?;
    match nums.as_slice() {
        [only] => Ok(Some(only.clone().neg().into_expr())),
        [a, b] => Ok(Some(a.clone().sub(b.clone()).into_expr())),
        _ => Err(arity("-", "1 or 2", args.len())),
    }
}

fn product(args: Vec<Expr>) -> Result<Option<Expr>> {
    if args.len() < 2 {
        return Err(arity("*", "at least 2", args.len()));
    }
    let mut nums = numbers("*", &args)?.into_iter();
    let first = nums.next().ok_or_else(|| arity("*", "at least 2", 0))?;
    Ok(Some(nums.fold(first, Num::mul).into_expr()))
}

// True division: the result is always a float.
fn division(args: Vec<Expr>) -> Result<Option<Expr>> {
    let nums = numbers("/", &args)?;
    match nums.as_slice() {
        [a, b] => {
            if b.is_zero() {
                return Err(Error::TypeError("division by zero".to_string()));
            }
            Ok(Some(Expr::Float(a.to_f64() / b.to_f64())))
        }
        _ => Err(arity("/", "exactly 2", args.len())),
    }
}

// Section: comparisons and predicates

fn comparison<F>(name: &'static str, args: Vec<Expr>, cmp: F) -> Result<Option<Expr>>
where
    F: Fn(&Num, &Num) -> bool,
{
    if args.len() < 2 {
        return Err(arity(name, "at least 2", args.len()));
    }
    let nums = numbers(name, &args)?;
    Ok(boolean(nums.windows(2).all(|pair| cmp(&pair[0], &pair[1]))))
}

fn num_eq(args: Vec<Expr>) -> Result<Option<Expr>> {
    comparison("=", args, |a, b| a.compare(b) == Some(Ordering::Equal))
}

fn less(args: Vec<Expr>) -> Result<Option<Expr>> {
    comparison("<", args, |a, b| a.compare(b) == Some(Ordering::Less))
}

fn greater(args: Vec<Expr>) -> Result<Option<Expr>> {
    comparison(">", args, |a, b| a.compare(b) == Some(Ordering::Greater))
}

fn less_equal(args: Vec<Expr>) -> Result<Option<Expr>> {
    comparison("<=", args, |a, b| {
        matches!(a.compare(b), Some(Ordering::Less) | Some(Ordering::Equal))
    })
}

fn greater_equal(args: Vec<Expr>) -> Result<Option<Expr>> {
    comparison(">=", args, |a, b| {
        matches!(a.compare(b), Some(Ordering::Greater) | Some(Ordering::Equal))
    })
}

fn not(args: Vec<Expr>) -> Result<Option<Expr>> {
    match args.as_slice() {
        [value] => Ok(boolean(!value.truthy())),
        _ => Err(arity("not", "exactly 1", args.len())),
    }
}

fn identical(args: Vec<Expr>) -> Result<Option<Expr>> {
    match args.as_slice() {
        [a, b] => Ok(boolean(ExprEq::eq(a, b))),
        _ => Err(arity("eq?", "exactly 2", args.len())),
    }
}

fn structural_equal(args: Vec<Expr>) -> Result<Option<Expr>> {
    match args.as_slice() {
        [a, b] => Ok(boolean(a.equal(b))),
        _ => Err(arity("equal?", "exactly 2", args.len())),
    }
}

fn is_list(args: Vec<Expr>) -> Result<Option<Expr>> {
    match args.as_slice() {
        [value] => Ok(boolean(value.as_list().is_some())),
        _ => Err(arity("list?", "exactly 1", args.len())),
    }
}

fn is_null(args: Vec<Expr>) -> Result<Option<Expr>> {
    match args.as_slice() {
        [value] => Ok(boolean(value.as_list().map_or(false, |items| items.is_empty()))),
        _ => Err(arity("null?", "exactly 1", args.len())),
    }
}

fn is_symbol(args: Vec<Expr>) -> Result<Option<Expr>> {
    match args.as_slice() {
        [value] => Ok(boolean(value.as_symbol().is_some())),
        _ => Err(arity("symbol?", "exactly 1", args.len())),
    }
}

// Section: lists

// Prepends onto a proper list. There is no pair cell in this language, so a
// non-list second argument is an error rather than a dotted pair.
fn cons(args: Vec<Expr>) -> Result<Option<Expr>> {
    if args.len() != 2 {
        return Err(arity("cons", "exactly 2", args.len()));
    }
    match args[1].clone() {
        Expr::List(mut items) => {
            items.insert(0, args[0].clone());
            Ok(Some(Expr::List(items)))
        }
        other => Err(Error::TypeError(format!(
            "'cons' needs a list as its second arg, got a {}",
            other.kind_name()
        ))),
    }
}

fn car(args: Vec<Expr>) -> Result<Option<Expr>> {
    match args.as_slice() {
        [value] => match value.as_list() {
            Some([first, ..]) => Ok(Some(first.clone())),
            Some([]) => Err(Error::TypeError("'car' of empty list".to_string())),
            None => Err(Error::TypeError(format!(
                "'car' needs a list, got a {}",
                value.kind_name()
            ))),
        },
        _ => Err(arity("car", "exactly 1", args.len())),
    }
}

fn cdr(args: Vec<Expr>) -> Result<Option<Expr>> {
    match args.as_slice() {
        [value] => match value.as_list() {
            Some([_, rest @ ..]) => Ok(Some(Expr::List(rest.to_vec()))),
            Some([]) => Err(Error::TypeError("'cdr' of empty list".to_string())),
            None => Err(Error::TypeError(format!(
                "'cdr' needs a list, got a {}",
                value.kind_name()
            ))),
        },
        _ => Err(arity("cdr", "exactly 1", args.len())),
    }
}

fn length(args: Vec<Expr>) -> Result<Option<Expr>> {
    match args.as_slice() {
        [value] => match value.as_list() {
            Some(items) => Ok(Some(Expr::int(items.len() as i64))),
            None => Err(Error::TypeError(format!(
                "'length' needs a list, got a {}",
                value.kind_name()
            ))),
        },
        _ => Err(arity("length", "exactly 1", args.len())),
    }
}

fn append(args: Vec<Expr>) -> Result<Option<Expr>> {
    let mut result = Vec::new();
    for arg in &args {
        match arg.as_list() {
            Some(items) => result.extend_from_slice(items),
            None => {
                return Err(Error::TypeError(format!(
                    "'append' needs lists, got a {}",
                    arg.kind_name()
                )));
            }
        }
    }
    Ok(Some(Expr::List(result)))
}

fn list(args: Vec<Expr>) -> Result<Option<Expr>> {
    Ok(Some(Expr::List(args)))
}

// Section: output

fn display(args: Vec<Expr>) -> Result<Option<Expr>> {
    let rendered: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
    println!("{}", rendered.join(" "));
    Ok(None)
}

/// The root environment: every primitive, nothing else.
pub fn initial_environment() -> Environment {
    fn builtin(name: &'static str, func: BuiltinFn) -> Expr {
        Expr::Procedure(Procedure::builtin(name, func))
    }

    let pre_hashmap = hashmap! {
        "+" => builtin("+", sum),
        "-" => builtin("-", difference),
        "*" => builtin("*", product),
        "/" => builtin("/", division),
        "=" => builtin("=", num_eq),
        "<" => builtin("<", less),
        ">" => builtin(">", greater),
        "<=" => builtin("<=", less_equal),
        ">=" => builtin(">=", greater_equal),
        "not" => builtin("not", not),
        "eq?" => builtin("eq?", identical),
        "equal?" => builtin("equal?", structural_equal),
        "cons" => builtin("cons", cons),
        "car" => builtin("car", car),
        "cdr" => builtin("cdr", cdr),
        "length" => builtin("length", length),
        "append" => builtin("append", append),
        "list" => builtin("list", list),
        "list?" => builtin("list?", is_list),
        "null?" => builtin("null?", is_null),
        "symbol?" => builtin("symbol?", is_symbol),
        "display" => builtin("display", display),
    };

    let mut hashmap = HashMap::new();
    for (key, value) in pre_hashmap {
        hashmap.insert(key.to_string(), value);
    }
    Environment::from_hashmap(hashmap)
}
