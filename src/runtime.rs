use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::expr::Expr;

/// Ceiling on evaluator nesting. The interpreter performs no tail-call
/// elimination, so deep recursion in the interpreted language consumes host
/// stack; past this depth evaluation fails with `TooDeep` instead of
/// crashing the host.
pub const MAX_EVAL_DEPTH: usize = 1024;

// Clone-by-reference environment
#[derive(Clone, Debug)]
pub struct Environment(Rc<RefCell<EnvironmentData>>);

#[derive(Debug)]
struct EnvironmentData {
    outer: Option<Environment>,
    local: HashMap<String, Expr>,
}

// Frame identity, not structural: a procedure stored in a frame can capture
// that same frame.
impl PartialEq for Environment {
    fn eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Environment {
    pub fn from_hashmap(local: HashMap<String, Expr>) -> Environment {
        Environment(Rc::new(RefCell::new(EnvironmentData { outer: None, local })))
    }

    pub fn make_child(&self) -> Environment {
        Environment(Rc::new(RefCell::new(EnvironmentData {
            outer: Some(self.clone()),
            local: HashMap::new(),
        })))
    }

    /// Search this frame, then outward through the chain.
    pub fn lookup(&self, name: &str) -> Result<Expr> {
        let data = self.0.borrow();
        if let Some(value) = data.local.get(name) {
            Ok(value.clone())
        } else if let Some(ref outer) = data.outer {
            outer.lookup(name)
        } else {
            Err(Error::UnboundVariable(name.to_string()))
        }
    }

    /// Bind `name` in this frame only, shadowing any outer binding.
    pub fn define(&self, name: &str, value: Expr) {
        self.0.borrow_mut().local.insert(name.to_string(), value);
    }

    /// Overwrite `name` in the nearest frame that already binds it.
    pub fn assign(&self, name: &str, value: Expr) -> Result<()> {
        let mut data = self.0.borrow_mut();
        if data.local.contains_key(name) {
            data.local.insert(name.to_string(), value);
            Ok(())
        } else {
            match data.outer.clone() {
                Some(outer) => {
                    drop(data);
                    outer.assign(name, value)
                }
                None => Err(Error::UnboundVariable(name.to_string())),
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct Procedure(ProcEnum);

#[derive(Clone, Debug)]
enum ProcEnum {
    Builtin(Builtin),
    Lambda(Rc<Lambda>),
}

pub type BuiltinFn = fn(Vec<Expr>) -> Result<Option<Expr>>;

#[derive(Clone, Copy, Debug)]
struct Builtin {
    name: &'static str,
    func: BuiltinFn,
}

/// A closure: parameter names, one body expression, and the defining
/// environment captured by reference. Immutable after creation.
#[derive(Debug)]
struct Lambda {
    params: Params,
    body: Expr,
    environment: Environment,
}

#[derive(Debug, PartialEq)]
enum Params {
    Fixed(Vec<String>),
    /// A single name binding the entire argument list.
    Variadic(String),
}

impl Procedure {
    pub fn builtin(name: &'static str, func: BuiltinFn) -> Procedure {
        Procedure(ProcEnum::Builtin(Builtin { name, func }))
    }

    fn lambda(lambda: Lambda) -> Procedure {
        Procedure(ProcEnum::Lambda(Rc::new(lambda)))
    }

    /// Closure identity: builtins by name, lambdas by allocation.
    pub fn same(&self, other: &Procedure) -> bool {
        match (&self.0, &other.0) {
            (ProcEnum::Builtin(a), ProcEnum::Builtin(b)) => a.name == b.name,
            (ProcEnum::Lambda(a), ProcEnum::Lambda(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn apply(&self, args: Vec<Expr>, depth: usize) -> Result<Option<Expr>> {
        match &self.0 {
            ProcEnum::Builtin(builtin) => (builtin.func)(args),
            ProcEnum::Lambda(lambda) => {
                let frame = lambda.environment.make_child();
                lambda.params.bind(args, &frame)?;
                lambda.body.eval_at(&frame, depth + 1)
            }
        }
    }
}

impl PartialEq for Procedure {
    fn eq(&self, other: &Procedure) -> bool {
        self.same(other)
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.0 {
            ProcEnum::Builtin(builtin) => write!(f, "#<builtin {}>", builtin.name),
            ProcEnum::Lambda(_) => write!(f, "#<procedure>"),
        }
    }
}

impl Params {
    fn from_expr(expr: &Expr) -> Result<Params> {
        match expr {
            Expr::Symbol(name) => Ok(Params::Variadic(name.clone())),
            Expr::List(items) => {
                let mut names: Vec<String> = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_symbol() {
                        Some(name) if names.iter().any(|seen| seen == name) => {
                            return Err(Error::MalformedForm(format!(
                                "duplicate lambda parameter '{}'",
                                name
                            )));
                        }
                        Some(name) => names.push(name.to_string()),
                        None => {
                            return Err(Error::MalformedForm(format!(
                                "lambda parameter '{}' is not a symbol",
                                item
                            )));
                        }
                    }
                }
                Ok(Params::Fixed(names))
            }
            _ => Err(Error::MalformedForm(
                "lambda parameters must be a symbol or a list of symbols".to_string(),
            )),
        }
    }

    fn bind(&self, args: Vec<Expr>, frame: &Environment) -> Result<()> {
        match self {
            Params::Fixed(names) => {
                if args.len() != names.len() {
                    return Err(Error::ArityMismatch {
                        name: "procedure".to_string(),
                        expected: names.len().to_string(),
                        got: args.len(),
                    });
                }
                for (name, arg) in names.iter().zip(args) {
                    frame.define(name, arg);
                }
                Ok(())
            }
            Params::Variadic(name) => {
                frame.define(name, Expr::List(args));
                Ok(())
            }
        }
    }
}

impl Expr {
    /// Evaluate this expression against `env`. `None` is the "no value"
    /// result of `define`/`set!`/`display`, which the REPL does not print.
    pub fn eval(&self, env: &Environment) -> Result<Option<Expr>> {
        self.eval_at(env, 0)
    }

    fn eval_at(&self, env: &Environment, depth: usize) -> Result<Option<Expr>> {
        if depth >= MAX_EVAL_DEPTH {
            return Err(Error::TooDeep);
        }
        match self {
            Expr::Symbol(name) => env.lookup(name).map(Some),
            Expr::Integer(_) | Expr::Float(_) | Expr::Procedure(_) => Ok(Some(self.clone())),
            Expr::List(items) => eval_list(items, env, depth),
        }
    }
}

fn eval_list(items: &[Expr], env: &Environment, depth: usize) -> Result<Option<Expr>> {
    let head = match items.first() {
        Some(head) => head,
        None => {
            return Err(Error::MalformedForm(
                "cannot evaluate an empty list".to_string(),
            ));
        }
    };
    if let Expr::Symbol(keyword) = head {
        match keyword.as_str() {
            "quote" => return quote(&items[1..]),
            "if" => return conditional(&items[1..], env, depth),
            "set!" => return set(&items[1..], env, depth),
            "define" => return define(&items[1..], env, depth),
            "lambda" => return lambda(&items[1..], env),
            "begin" => return begin(&items[1..], env, depth),
            _ => {}
        }
    }
    apply(items, env, depth)
}

/// Unwrap an intermediate result that must carry a value.
fn required(value: Option<Expr>, what: &str) -> Result<Expr> {
    value.ok_or_else(|| Error::TypeError(format!("{} produced no value", what)))
}

fn quote(operands: &[Expr]) -> Result<Option<Expr>> {
    match operands {
        [quoted] => Ok(Some(quoted.clone())),
        _ => Err(Error::MalformedForm(format!(
            "quote needs exactly 1 operand, got {}",
            operands.len()
        ))),
    }
}

fn conditional(operands: &[Expr], env: &Environment, depth: usize) -> Result<Option<Expr>> {
    match operands {
        [pred, conseq, alt] => {
            let test = required(pred.eval_at(env, depth + 1)?, "if predicate")?;
            let branch = if test.truthy() { conseq } else { alt };
            branch.eval_at(env, depth + 1)
        }
        _ => Err(Error::MalformedForm(format!(
            "if needs a predicate and two branches, got {} operands",
            operands.len()
        ))),
    }
}

fn set(operands: &[Expr], env: &Environment, depth: usize) -> Result<Option<Expr>> {
    match operands {
        [Expr::Symbol(name), value_expr] => {
            let value = required(value_expr.eval_at(env, depth + 1)?, "set! value")?;
            env.assign(name, value)?;
            Ok(None)
        }
        _ => Err(Error::MalformedForm(
            "set! needs a variable name and a value".to_string(),
        )),
    }
}

fn define(operands: &[Expr], env: &Environment, depth: usize) -> Result<Option<Expr>> {
    match operands {
        [Expr::Symbol(name), value_expr] => {
            let value = required(value_expr.eval_at(env, depth + 1)?, "define value")?;
            env.define(name, value);
            Ok(None)
        }
        _ => Err(Error::MalformedForm(
            "define needs a variable name and a value".to_string(),
        )),
    }
}

fn lambda(operands: &[Expr], env: &Environment) -> Result<Option<Expr>> {
    match operands {
        [params_expr, body] => {
            let params = Params::from_expr(params_expr)?;
            Ok(Some(Expr::Procedure(Procedure::lambda(Lambda {
                params,
                body: body.clone(),
                environment: env.clone(),
            }))))
        }
        _ => Err(Error::MalformedForm(
            "lambda needs a parameter list and a body".to_string(),
        )),
    }
}

fn begin(operands: &[Expr], env: &Environment, depth: usize) -> Result<Option<Expr>> {
    let (last, rest) = match operands.split_last() {
        Some(split) => split,
        None => {
            return Err(Error::MalformedForm(
                "begin needs at least one sub-expression".to_string(),
            ));
        }
    };
    for expr in rest {
        expr.eval_at(env, depth + 1)?;
    }
    last.eval_at(env, depth + 1)
}

// Procedure call: evaluate every element left-to-right, operator included.
fn apply(items: &[Expr], env: &Environment, depth: usize) -> Result<Option<Expr>> {
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        values.push(required(item.eval_at(env, depth + 1)?, "operand")?);
    }
    let callee = values.remove(0);
    match callee {
        Expr::Procedure(procedure) => procedure.apply(values, depth),
        other => Err(Error::NotCallable {
            head: items[0].to_string(),
            kind: other.kind_name(),
        }),
    }
}

/// Evaluate a top-level sequence against one environment and return the
/// last result. Intermediate "no value" results do not short-circuit.
pub fn evaluate_all(exprs: &[Expr], env: &Environment) -> Result<Option<Expr>> {
    let mut last = None;
    for expr in exprs {
        last = expr.eval(env)?;
    }
    Ok(last)
}

#[cfg(test)]
mod test {
    use num::BigInt;

    use crate::builtin::initial_environment;
    use crate::error::{Error, Result};
    use crate::expr::Expr;
    use crate::read::read_all;

    use super::{evaluate_all, Environment};

    fn run_in(input: &str, env: &Environment) -> Result<Option<Expr>> {
        let mut last = None;
        for item in read_all(input) {
            last = item?.eval(env)?;
        }
        Ok(last)
    }

    fn run(input: &str) -> Result<Option<Expr>> {
        run_in(input, &initial_environment())
    }

    fn comparison(input: &str, output: Expr) {
        assert_eq!(run(input).unwrap(), Some(output));
    }

    #[test]
    fn test_self_evaluating() {
        comparison("123", Expr::int(123));
        comparison("1.5", Expr::Float(1.5));
    }

    #[test]
    fn test_nested_arithmetic() {
        comparison("(+ 1 2 (+ 30 40 50) 3)", Expr::int(126));
        comparison("(* 2 3 (* 5 6 7) 4)", Expr::int(5040));
        comparison("(- 100 (- (- 50 20) 5))", Expr::int(75));
        comparison("(/ 360 (/ (/ 60 2) 10))", Expr::Float(120.0));
    }

    #[test]
    fn test_variable_reference() {
        comparison("(define x 123) x", Expr::int(123));
        assert_eq!(run("nope"), Err(Error::UnboundVariable("nope".to_string())));
    }

    #[test]
    fn test_quote_leaves_operand_unevaluated() {
        comparison(
            "(quote (+ 2 3))",
            Expr::List(vec![Expr::Symbol("+".to_string()), Expr::int(2), Expr::int(3)]),
        );
        assert!(matches!(
            run("(quote a b)"),
            Err(Error::MalformedForm(_))
        ));
    }

    #[test]
    fn test_if_zero_is_the_sole_falsy_integer() {
        comparison("(if 0 123 456)", Expr::int(456));
        comparison("(if 1 123 456)", Expr::int(123));
        comparison("(if (quote ()) 123 456)", Expr::int(123));
        assert!(matches!(run("(if 1 2)"), Err(Error::MalformedForm(_))));
    }

    #[test]
    fn test_if_only_evaluates_the_taken_branch() {
        comparison("(if 1 123 undefined-name)", Expr::int(123));
    }

    #[test]
    fn test_define_and_set_return_no_value() {
        assert_eq!(run("(define x 5)"), Ok(None));
        assert_eq!(run("(define x 5) (set! x 6)"), Ok(None));
    }

    #[test]
    fn test_set_requires_an_existing_binding() {
        assert_eq!(
            run("(set! nope 1)"),
            Err(Error::UnboundVariable("nope".to_string()))
        );
    }

    #[test]
    fn test_set_mutates_the_owning_frame() {
        comparison(
            "(define x 1) (define f (lambda (y) (set! x y))) (f 42) x",
            Expr::int(42),
        );
    }

    #[test]
    fn test_define_in_inner_frame_leaves_outer_alone() {
        let env = initial_environment();
        run_in(
            "(define x 1) (define f (lambda () (begin (define x 2) x))) (f)",
            &env,
        )
        .unwrap();
        assert_eq!(env.lookup("x"), Ok(Expr::int(1)));
    }

    #[test]
    fn test_lambda_application() {
        comparison("((lambda (x) (+ x 4)) 10)", Expr::int(14));
        comparison("(define f (lambda (x) (+ x 4))) (f 10)", Expr::int(14));
    }

    #[test]
    fn test_closure_captures_environment_by_reference() {
        comparison(
            "(define n 1) (define f (lambda (x) (+ x n))) (set! n 10) (f 5)",
            Expr::int(15),
        );
        comparison(
            "(define make-adder (lambda (n) (lambda (x) (+ x n)))) \
             ((make-adder 3) 4)",
            Expr::int(7),
        );
    }

    #[test]
    fn test_variadic_lambda_binds_the_whole_argument_list() {
        comparison("((lambda args (length args)) 1 2 3)", Expr::int(3));
        comparison("((lambda args args))", Expr::List(vec![]));
    }

    #[test]
    fn test_lambda_arity_and_shape_errors() {
        assert!(matches!(
            run("((lambda (x) x) 1 2)"),
            Err(Error::ArityMismatch { .. })
        ));
        assert!(matches!(
            run("(lambda (x x) x)"),
            Err(Error::MalformedForm(_))
        ));
        assert!(matches!(
            run("(lambda (1) x)"),
            Err(Error::MalformedForm(_))
        ));
    }

    #[test]
    fn test_begin() {
        comparison("(begin (define x 2) (+ x 1))", Expr::int(3));
        assert!(matches!(run("(begin)"), Err(Error::MalformedForm(_))));
    }

    #[test]
    fn test_application_errors() {
        assert_eq!(
            run("(1 2)"),
            Err(Error::NotCallable {
                head: "1".to_string(),
                kind: "integer",
            })
        );
        assert_eq!(
            run("((quote (a)) 2)"),
            Err(Error::NotCallable {
                head: "(quote (a))".to_string(),
                kind: "list",
            })
        );
        assert!(matches!(run("()"), Err(Error::MalformedForm(_))));
    }

    #[test]
    fn test_no_value_in_argument_position() {
        assert!(matches!(
            run("(+ 1 (define x 2))"),
            Err(Error::TypeError(_))
        ));
    }

    #[test]
    fn test_evaluate_all_returns_the_last_result() {
        let env = initial_environment();
        let exprs: Vec<Expr> = read_all("(define x 1) (+ x 1) (define y 2)")
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(evaluate_all(&exprs, &env), Ok(None));
        let exprs: Vec<Expr> = read_all("(define z 5) (+ z 1)")
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(evaluate_all(&exprs, &env), Ok(Some(Expr::int(6))));
    }

    #[test]
    fn test_recursive_factorial() {
        let env = initial_environment();
        run_in(
            "(define fact (lambda (n) (if (= n 0) 1 (* n (fact (- n 1))))))",
            &env,
        )
        .unwrap();
        assert_eq!(run_in("(fact 10)", &env), Ok(Some(Expr::int(3628800))));

        let fact_100: BigInt = "9332621544394415268169923885626670049071596826438162146859\
                                2963895217599993229915608941463976156518286253697920827223\
                                758251185210916864000000000000000000000000"
            .parse()
            .unwrap();
        assert_eq!(
            run_in("(fact 100)", &env),
            Ok(Some(Expr::Integer(fact_100)))
        );
    }

    #[test]
    fn test_runaway_recursion_is_cut_off() {
        assert_eq!(
            run("(define loop (lambda (n) (loop (+ n 1)))) (loop 0)"),
            Err(Error::TooDeep)
        );
    }
}
