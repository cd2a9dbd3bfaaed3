use std::fmt;

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, Hash, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+|//[^\n]*|/\*([^*]|\*+[^*/])*\*+/")]
pub enum TokenKind {
  #[token("(")]
  LeftParen,

  #[token(")")]
  RightParen,

  #[token("{")]
  LeftBrace,

  #[token("}")]
  RightBrace,

  #[token(",")]
  Comma,

  #[token(";")]
  Semicolon,

  #[token("=")]
  Equal,

  #[token("==")]
  EqualEqual,

  #[token("!")]
  Bang,

  #[token("!=")]
  BangEqual,

  #[token(">")]
  Greater,

  #[token(">=")]
  GreaterEqual,

  #[token("<")]
  Less,

  #[token("<=")]
  LessEqual,

  #[token("+")]
  Plus,

  #[token("-")]
  Minus,

  #[token("*")]
  Star,

  #[token("/")]
  Slash,

  #[token("%")]
  Percent,

  #[token("e", priority = 3)]
  And,

  #[token("ou")]
  Or,

  #[regex("[a-zA-Z_][a-zA-Z0-9_]*")]
  Identifier,

  #[regex(r#""([^"\\]|\\.)*""#)]
  String,

  #[regex(r"'([^'\\]|\\.)'")]
  Character,

  #[regex("[0-9]+")]
  Integer,

  #[regex(r"[0-9]+\.[0-9]+")]
  Real,

  #[token("verdadeiro")]
  #[token("falso")]
  Boolean,

  #[token("programa")]
  Programa,

  #[token("funcao")]
  Funcao,

  #[token("se")]
  Se,

  #[token("senao")]
  Senao,

  #[token("enquanto")]
  Enquanto,

  #[token("para")]
  Para,

  #[token("escreva")]
  Escreva,

  #[token("leia")]
  Leia,

  #[token("retorne")]
  Retorne,

  #[token("inteiro")]
  #[token("real")]
  #[token("caractere")]
  #[token("logico")]
  #[token("cadeia")]
  #[token("vazio")]
  TypeName,
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      TokenKind::LeftParen => "'('",
      TokenKind::RightParen => "')'",
      TokenKind::LeftBrace => "'{'",
      TokenKind::RightBrace => "'}'",
      TokenKind::Comma => "','",
      TokenKind::Semicolon => "';'",
      TokenKind::Equal => "'='",
      TokenKind::EqualEqual => "'=='",
      TokenKind::Bang => "'!'",
      TokenKind::BangEqual => "'!='",
      TokenKind::Greater => "'>'",
      TokenKind::GreaterEqual => "'>='",
      TokenKind::Less => "'<'",
      TokenKind::LessEqual => "'<='",
      TokenKind::Plus => "'+'",
      TokenKind::Minus => "'-'",
      TokenKind::Star => "'*'",
      TokenKind::Slash => "'/'",
      TokenKind::Percent => "'%'",
      TokenKind::And => "'e'",
      TokenKind::Or => "'ou'",
      TokenKind::Identifier => "identificador",
      TokenKind::String => "cadeia",
      TokenKind::Character => "caractere",
      TokenKind::Integer => "inteiro",
      TokenKind::Real => "real",
      TokenKind::Boolean => "lógico",
      TokenKind::Programa => "'programa'",
      TokenKind::Funcao => "'funcao'",
      TokenKind::Se => "'se'",
      TokenKind::Senao => "'senao'",
      TokenKind::Enquanto => "'enquanto'",
      TokenKind::Para => "'para'",
      TokenKind::Escreva => "'escreva'",
      TokenKind::Leia => "'leia'",
      TokenKind::Retorne => "'retorne'",
      TokenKind::TypeName => "tipo",
    };

    f.write_str(text)
  }
}

/// Byte range of a lexeme in the source.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Span(pub usize, pub usize);

impl fmt::Display for Span {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub slice: String,
  pub span: Span,
}

impl Token {
  pub fn new(kind: TokenKind, slice: String, span: Span) -> Token {
    Token {
      kind,
      slice,
      span,
    }
  }
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.slice)
  }
}
