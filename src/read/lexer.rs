/// Lexical tokens. Parentheses are always their own single-character token;
/// anything else is an unclassified atom. The lexer knows nothing about
/// string literals, comments, or escaping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    LeftParen,
    RightParen,
    Atom(String),
}

impl Token {
    /// The token's literal source text.
    pub fn text(&self) -> &str {
        match self {
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::Atom(text) => text,
        }
    }
}

/// Split source text into tokens. Whitespace separates atoms; `(` and `)`
/// never need separation. Total: every input tokenizes, empty input to an
/// empty sequence.
pub fn tokenize(input: &str) -> Vec<Token> {
    input
        .replace('(', " ( ")
        .replace(')', " ) ")
        .split_whitespace()
        .map(|word| match word {
            "(" => Token::LeftParen,
            ")" => Token::RightParen,
            _ => Token::Atom(word.to_string()),
        })
        .collect()
}

#[test]
fn test_tokenize() {
    assert_eq!(
        tokenize("(set var 123)"),
        vec![
            Token::LeftParen,
            Token::Atom("set".to_string()),
            Token::Atom("var".to_string()),
            Token::Atom("123".to_string()),
            Token::RightParen,
        ]
    );
}

#[test]
fn test_tokenize_parens_need_no_spaces() {
    assert_eq!(
        tokenize("(a(b))"),
        vec![
            Token::LeftParen,
            Token::Atom("a".to_string()),
            Token::LeftParen,
            Token::Atom("b".to_string()),
            Token::RightParen,
            Token::RightParen,
        ]
    );
}

#[test]
fn test_tokenize_empty() {
    assert_eq!(tokenize(""), Vec::new());
    assert_eq!(tokenize("  \t\n "), Vec::new());
}

#[test]
fn test_tokenize_rejoin_recovers_canonical_input() {
    let input = "( + 1 ( 2 3 ) abc )";
    let rejoined = tokenize(input)
        .iter()
        .map(|token| token.text().to_string())
        .collect::<Vec<_>>()
        .join(" ");
    assert_eq!(rejoined, input);
}
