//! Concrete parse tree handed from the parser to the transformer.
//!
//! The tree mirrors the grammar rule by rule. Punctuation and statement
//! keywords are dropped while parsing, so a node's children are only the
//! pieces that carry meaning: sub-rules, operator tokens, literals,
//! identifiers and type keywords.

use std::fmt;

use crate::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
  Program,
  Block,
  Declaration,
  VariableDeclaration,
  VariableDeclarationBase,
  FunctionDeclaration,
  Parameters,
  Parameter,
  Type,
  Command,
  Assignment,
  AssignmentBase,
  If,
  While,
  For,
  Write,
  Read,
  Return,
  CallCommand,
  ExpressionList,
  Expression,
  LogicalExpression,
  RelationalExpression,
  AdditiveExpression,
  MultiplicativeExpression,
  UnaryExpression,
  PrimaryExpression,
  IdentifierExpression,
  FunctionCall,
}

impl fmt::Display for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseTree {
  Node { rule: Rule, children: Vec<ParseTree> },
  Leaf(Token),
}

impl ParseTree {
  pub fn node(rule: Rule, children: Vec<ParseTree>) -> Self {
    ParseTree::Node { rule, children }
  }

  pub fn rule(&self) -> Option<Rule> {
    match self {
      ParseTree::Node { rule, .. } => Some(*rule),
      ParseTree::Leaf(_) => None,
    }
  }

  /// Short label used in malformed-tree messages.
  pub fn describe(&self) -> String {
    match self {
      ParseTree::Node { rule, children } => format!("{}({} filhos)", rule, children.len()),
      ParseTree::Leaf(token) => format!("{:?} '{}'", token.kind, token.slice),
    }
  }
}
