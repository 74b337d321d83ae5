use std::fmt;

use num::{BigInt, Zero};

use crate::runtime::Procedure;

/// The language's universal value/AST type. Lists double as source syntax
/// and runtime data; `Procedure` never appears in parsed syntax and is only
/// constructed by evaluating `lambda` or installing a builtin.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Integer(BigInt),
    Float(f64),
    Symbol(String),
    List(Vec<Expr>),
    Procedure(Procedure),
}

impl Expr {
    pub fn int(n: i64) -> Expr {
        Expr::Integer(BigInt::from(n))
    }

    pub fn as_symbol(&self) -> Option<&str> {
        if let Expr::Symbol(ref name) = *self {
            Some(name)
        } else {
            None
        }
    }

    pub fn as_list(&self) -> Option<&[Expr]> {
        if let Expr::List(ref items) = *self {
            Some(items)
        } else {
            None
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Integer(_) => "integer",
            Expr::Float(_) => "float",
            Expr::Symbol(_) => "symbol",
            Expr::List(_) => "list",
            Expr::Procedure(_) => "procedure",
        }
    }

    /// Numeric zero is the sole falsy value; everything else is truthy.
    pub fn truthy(&self) -> bool {
        match self {
            Expr::Integer(n) => !n.is_zero(),
            Expr::Float(x) => *x != 0.0,
            _ => true,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Integer(n) => write!(f, "{}", n),
            // Whole floats keep a decimal point so they re-read as floats.
            Expr::Float(x) if x.is_finite() && x.fract() == 0.0 => {
                write!(f, "{:.1}", x)
            }
            Expr::Float(x) => write!(f, "{}", x),
            Expr::Symbol(name) => write!(f, "{}", name),
            Expr::List(items) => {
                write!(f, "(")?;
                for (n, item) in items.iter().enumerate() {
                    if n > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Expr::Procedure(procedure) => write!(f, "{}", procedure),
        }
    }
}
