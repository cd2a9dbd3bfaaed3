pub mod ast;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod token;
pub mod transformer;
pub mod tree;

use std::io::{BufRead, Write};

use crate::ast::Program;
use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;

pub use crate::error::Error;

/// Source text to AST: lex, parse into the concrete tree, transform.
pub fn compile(source: &str) -> Result<Program> {
  let tokens = Lexer::new(source).lex()?;
  let tree = parser::parse(&tokens)?;
  transformer::transform(&tree)
}

/// Compiles and runs `source`, reading `leia` lines from `input` and
/// sending `escreva` output to `output`.
pub fn run<R: BufRead, W: Write>(source: &str, input: R, output: W) -> Result<()> {
  let program = compile(source)?;
  Evaluator::with_io(input, output).eval(&program)
}
