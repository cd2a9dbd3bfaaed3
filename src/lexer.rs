use log::trace;
use logos::Logos;

use crate::error::{Error, Result};
use crate::token::{Span, Token, TokenKind};

pub struct Lexer<'a> {
  source: &'a str,
}

impl<'a> Lexer<'a> {
  pub fn new(source: &'a str) -> Self {
    Lexer { source }
  }

  /// Splits the whole source into tokens, stopping at the first lexeme no
  /// rule accepts.
  pub fn lex(self) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();

    for (kind, range) in TokenKind::lexer(self.source).spanned() {
      let slice = &self.source[range.clone()];
      let span = Span(range.start, range.end);

      let Ok(kind) = kind else {
        return Err(Error::LexError {
          span,
          found: slice.to_owned(),
        });
      };

      trace!("token {:?} {:?}", kind, slice);
      tokens.push(Token::new(kind, slice.to_owned(), span));
    }

    Ok(tokens)
  }
}

#[cfg(test)]
mod tests {
  use super::Lexer;
  use crate::error::Error;
  use crate::token::TokenKind;

  fn kinds(input: &str) -> Vec<TokenKind> {
    Lexer::new(input)
      .lex()
      .unwrap()
      .into_iter()
      .map(|token| token.kind)
      .collect()
  }

  #[test]
  fn test_declaration() {
    assert_eq!(
      kinds("inteiro a = 10;"),
      vec![
        TokenKind::TypeName,
        TokenKind::Identifier,
        TokenKind::Equal,
        TokenKind::Integer,
        TokenKind::Semicolon,
      ]
    );
  }

  #[test]
  fn test_keywords_and_operators() {
    assert_eq!(
      kinds("se (a >= 1 e b != 2 ou !c) senao"),
      vec![
        TokenKind::Se,
        TokenKind::LeftParen,
        TokenKind::Identifier,
        TokenKind::GreaterEqual,
        TokenKind::Integer,
        TokenKind::And,
        TokenKind::Identifier,
        TokenKind::BangEqual,
        TokenKind::Integer,
        TokenKind::Or,
        TokenKind::Bang,
        TokenKind::Identifier,
        TokenKind::RightParen,
        TokenKind::Senao,
      ]
    );
  }

  #[test]
  fn test_literals() {
    let tokens = Lexer::new(r#"3.25 7 "ola \"mundo\"" 'x' verdadeiro"#).lex().unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Real);
    assert_eq!(tokens[0].slice, "3.25");
    assert_eq!(tokens[1].kind, TokenKind::Integer);
    assert_eq!(tokens[2].kind, TokenKind::String);
    assert_eq!(tokens[2].slice, r#""ola \"mundo\"""#);
    assert_eq!(tokens[3].kind, TokenKind::Character);
    assert_eq!(tokens[4].kind, TokenKind::Boolean);
  }

  #[test]
  fn test_type_names() {
    assert_eq!(
      kinds("inteiro real caractere logico cadeia vazio"),
      vec![TokenKind::TypeName; 6]
    );
  }

  #[test]
  fn test_identifier_prefix_is_not_keyword() {
    let tokens = Lexer::new("senaoX escrevaTudo e2").lex().unwrap();

    assert!(tokens.iter().all(|token| token.kind == TokenKind::Identifier));
  }

  #[test]
  fn test_comments_are_skipped() {
    assert_eq!(
      kinds("// linha\n/* bloco\n com **varias** */ leia"),
      vec![TokenKind::Leia]
    );
  }

  #[test]
  fn test_spans_are_byte_offsets() {
    let tokens = Lexer::new("leia(x);").lex().unwrap();

    assert_eq!(tokens[2].slice, "x");
    assert_eq!((tokens[2].span.0, tokens[2].span.1), (5, 6));
  }

  #[test]
  fn test_unexpected_character() {
    match Lexer::new("inteiro @").lex() {
      Err(Error::LexError { span, found }) => {
        assert_eq!(found, "@");
        assert_eq!(span.0, 8);
      }
      other => panic!("expected lex error, got {:?}", other),
    }
  }
}
