use crate::expr::Expr;

/// The seam between Rust equality and the language's `eq?`/`equal?`
/// primitives.
pub trait ExprEq {
    /// Identity-flavored equality. Lists are owned vectors here, so object
    /// identity only exists for the empty list and for procedures.
    fn eq(&self, other: &Self) -> bool;

    /// Structural equality.
    fn equal(&self, other: &Self) -> bool {
        ExprEq::eq(self, other)
    }
}

impl ExprEq for Expr {
    fn eq(&self, other: &Expr) -> bool {
        match (self, other) {
            (Expr::List(a), Expr::List(b)) => a.is_empty() && b.is_empty(),
            (Expr::Procedure(p), Expr::Procedure(q)) => p.same(q),
            (Expr::Integer(_), Expr::Integer(_))
            | (Expr::Float(_), Expr::Float(_))
            | (Expr::Symbol(_), Expr::Symbol(_)) => self == other,
            _ => false,
        }
    }

    fn equal(&self, other: &Expr) -> bool {
        match (self, other) {
            (Expr::List(a), Expr::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equal(y))
            }
            _ => ExprEq::eq(self, other),
        }
    }
}
