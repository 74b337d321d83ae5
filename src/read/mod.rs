pub mod lexer;

use std::collections::VecDeque;

use num::BigInt;

use crate::error::{Error, ReadPhase, Result};
use crate::expr::Expr;

use self::lexer::Token;

/// Classify one token's text: integer, then float, then a symbol holding
/// the text verbatim. Total.
pub fn atom(text: &str) -> Expr {
    if let Ok(n) = text.parse::<BigInt>() {
        Expr::Integer(n)
    } else if let Ok(x) = text.parse::<f64>() {
        Expr::Float(x)
    } else {
        Expr::Symbol(text.to_string())
    }
}

/// Remove and return exactly one complete expression from the front of
/// `tokens`.
pub fn read_one(tokens: &mut VecDeque<Token>) -> Result<Expr> {
    match tokens.pop_front() {
        None => Err(Error::UnexpectedEof(ReadPhase::StartOfExpression)),
        Some(Token::LeftParen) => {
            let mut items = Vec::new();
            loop {
                match tokens.front() {
                    None => return Err(Error::UnexpectedEof(ReadPhase::MidExpression)),
                    Some(Token::RightParen) => {
                        tokens.pop_front();
                        return Ok(Expr::List(items));
                    }
                    Some(_) => items.push(read_one(tokens)?),
                }
            }
        }
        Some(Token::RightParen) => Err(Error::UnexpectedCloseParen),
        Some(Token::Atom(text)) => Ok(atom(&text)),
    }
}

/// Tokenize `source` once and yield its top-level expressions lazily.
/// Empty input yields an empty stream, not an error.
pub fn read_all(source: &str) -> ExprStream {
    ExprStream {
        tokens: lexer::tokenize(source).into(),
    }
}

/// A finite, non-restartable stream of expressions. The first read error
/// discards the remaining tokens.
#[derive(Debug)]
pub struct ExprStream {
    tokens: VecDeque<Token>,
}

impl Iterator for ExprStream {
    type Item = Result<Expr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.tokens.is_empty() {
            return None;
        }
        let result = read_one(&mut self.tokens);
        if result.is_err() {
            self.tokens.clear();
        }
        Some(result)
    }
}

#[cfg(test)]
mod test {
    use super::lexer::tokenize;
    use super::{atom, read_all, read_one};
    use crate::error::{Error, ReadPhase};
    use crate::expr::Expr;

    #[test]
    fn test_atom_classification() {
        assert_eq!(atom("123"), Expr::int(123));
        assert_eq!(atom("-42"), Expr::int(-42));
        assert_eq!(atom("123.456"), Expr::Float(123.456));
        assert_eq!(atom("abc"), Expr::Symbol("abc".to_string()));
        assert_eq!(atom("+"), Expr::Symbol("+".to_string()));
        assert_eq!(atom("1x"), Expr::Symbol("1x".to_string()));
    }

    #[test]
    fn test_read_one_atom_and_list() {
        let mut tokens = tokenize("( 1 2 3 )").into();
        assert_eq!(
            read_one(&mut tokens).unwrap(),
            Expr::List(vec![Expr::int(1), Expr::int(2), Expr::int(3)])
        );
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_read_one_nested() {
        let mut tokens = tokenize("(+ (quote x) 2.5)").into();
        assert_eq!(
            read_one(&mut tokens).unwrap(),
            Expr::List(vec![
                Expr::Symbol("+".to_string()),
                Expr::List(vec![
                    Expr::Symbol("quote".to_string()),
                    Expr::Symbol("x".to_string()),
                ]),
                Expr::Float(2.5),
            ])
        );
    }

    #[test]
    fn test_read_one_errors() {
        let mut empty = tokenize("").into();
        assert_eq!(
            read_one(&mut empty),
            Err(Error::UnexpectedEof(ReadPhase::StartOfExpression))
        );

        let mut unclosed = tokenize("(").into();
        assert_eq!(
            read_one(&mut unclosed),
            Err(Error::UnexpectedEof(ReadPhase::MidExpression))
        );

        let mut bare_close = tokenize(")").into();
        assert_eq!(read_one(&mut bare_close), Err(Error::UnexpectedCloseParen));
    }

    #[test]
    fn test_read_all() {
        let exprs: Vec<_> = read_all("1 (2 3) x").collect();
        assert_eq!(exprs.len(), 3);
        assert!(exprs.iter().all(|item| item.is_ok()));
        assert_eq!(read_all("").count(), 0);
    }

    #[test]
    fn test_read_all_stops_after_error() {
        let mut stream = read_all(") 1 2");
        assert_eq!(stream.next(), Some(Err(Error::UnexpectedCloseParen)));
        assert_eq!(stream.next(), None);
    }

    #[test]
    fn test_round_trip() {
        for source in &["(+ 1 (2.5 x) (quote (a b)))", "abc", "(())", "-7"] {
            let mut tokens = tokenize(source).into();
            let expr = read_one(&mut tokens).unwrap();
            assert_eq!(&expr.to_string(), source);
        }
    }
}
