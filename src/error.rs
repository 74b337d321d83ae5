use std::fmt;

/// Phase of reading during which the token sequence ran out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadPhase {
    StartOfExpression,
    MidExpression,
}

impl fmt::Display for ReadPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReadPhase::StartOfExpression => write!(f, "at start of expression"),
            ReadPhase::MidExpression => write!(f, "mid expression"),
        }
    }
}

/// Everything that can go wrong while reading or evaluating. All of these
/// abort the current top-level expression and propagate to the caller; the
/// core never recovers from them itself.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Token sequence exhausted while an expression was still expected.
    UnexpectedEof(ReadPhase),

    /// A `)` with no matching open context.
    UnexpectedCloseParen,

    /// Lookup or assignment of a name absent from the whole frame chain.
    UnboundVariable(String),

    /// A special form invoked with the wrong shape.
    MalformedForm(String),

    /// Application where the operator position is not a procedure. Carries
    /// the unevaluated operator text and the offending value's kind.
    NotCallable {
        head: String,
        kind: &'static str,
    },

    /// A primitive or fixed-arity procedure called with the wrong number of
    /// arguments.
    ArityMismatch {
        name: String,
        expected: String,
        got: usize,
    },

    /// A primitive given an argument of the wrong shape.
    TypeError(String),

    /// Evaluation nested past the supported depth.
    TooDeep,
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnexpectedEof(phase) => {
                write!(f, "unexpected EOF while reading ({})", phase)
            }
            Error::UnexpectedCloseParen => write!(f, "unexpected \")\""),
            Error::UnboundVariable(name) => write!(f, "unbound variable '{}'", name),
            Error::MalformedForm(detail) => write!(f, "malformed form: {}", detail),
            Error::NotCallable { head, kind } => {
                write!(f, "cannot call '{}': a {} is not a procedure", head, kind)
            }
            Error::ArityMismatch {
                name,
                expected,
                got,
            } => write!(f, "'{}' needs {} args, not {}", name, expected, got),
            Error::TypeError(detail) => write!(f, "type error: {}", detail),
            Error::TooDeep => write!(f, "evaluation nested too deeply"),
        }
    }
}

impl std::error::Error for Error {}
