use std::io;
use thiserror::Error;

use crate::token::Span;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure a run can observe, from lexing to evaluation.
///
/// None of these are recovered inside the interpreter; they travel up to the
/// caller of [`crate::run`] (or the binary), which reports and stops.
#[derive(Error, Debug)]
pub enum Error {
  #[error("Caractere inesperado '{found}' na posição {span}.")]
  LexError { span: Span, found: String },

  #[error("Erro de sintaxe na posição {span}: esperado {expected}, encontrado '{found}'.")]
  ParseError {
    span: Span,
    expected: String,
    found: String,
  },

  #[error("Árvore sintática malformada: {0}")]
  MalformedTree(String),

  #[error("Tipo de nó desconhecido: {0}")]
  UnknownNodeKind(String),

  #[error("Operador desconhecido: {0}")]
  UnknownOperator(String),

  #[error("Variável '{0}' não definida.")]
  UndefinedVariable(String),

  #[error("'{0}' não é uma função.")]
  NotCallable(String),

  #[error("Número incorreto de argumentos para '{name}': esperado {expected}, recebido {found}.")]
  ArgumentCountMismatch {
    name: String,
    expected: usize,
    found: usize,
  },

  #[error("Divisão por zero.")]
  DivisionByZero,

  #[error("Módulo por zero.")]
  ModuloByZero,

  #[error("Tipos incompatíveis: {0}")]
  TypeMismatch(String),

  #[error("Estouro de inteiro em '{0}'.")]
  IntegerOverflow(String),

  #[error("Limite de {0} chamadas aninhadas excedido.")]
  RecursionLimit(usize),

  #[error("Erro de leitura: entrada inesperada.")]
  InputExhausted,

  #[error("Erro de entrada/saída: {0}")]
  Io(#[from] io::Error),
}

impl Error {
  pub fn type_mismatch(message: impl Into<String>) -> Self {
    Error::TypeMismatch(message.into())
  }

  pub fn malformed(message: impl Into<String>) -> Self {
    Error::MalformedTree(message.into())
  }
}
