use std::ops::Range;

use chumsky::prelude::*;
use log::debug;

use crate::error::{Error, Result};
use crate::token::{Span, Token, TokenKind};
use crate::tree::{ParseTree, Rule};

const LOGICAL_OPERATORS: &[TokenKind] = &[TokenKind::And, TokenKind::Or];

const RELATIONAL_OPERATORS: &[TokenKind] = &[
  TokenKind::EqualEqual,
  TokenKind::BangEqual,
  TokenKind::Less,
  TokenKind::LessEqual,
  TokenKind::Greater,
  TokenKind::GreaterEqual,
];

const ADDITIVE_OPERATORS: &[TokenKind] = &[TokenKind::Plus, TokenKind::Minus];

const MULTIPLICATIVE_OPERATORS: &[TokenKind] = &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent];

const UNARY_OPERATORS: &[TokenKind] = &[TokenKind::Minus, TokenKind::Plus, TokenKind::Bang];

const LITERALS: &[TokenKind] = &[
  TokenKind::Integer,
  TokenKind::Real,
  TokenKind::String,
  TokenKind::Character,
  TokenKind::Boolean,
];

/// Parses a token stream into the concrete [`ParseTree`], rooted at a
/// `Program` node.
pub fn parse(tokens: &[Token]) -> Result<ParseTree> {
  debug!("parsing {} tokens", tokens.len());

  let kinds: Vec<TokenKind> = tokens.iter().map(|token| token.kind).collect();

  parser(tokens)
    .parse(kinds.as_slice())
    .map_err(|errors| syntax_error(tokens, errors))
}

/// The grammar runs over token kinds; spans are indices into `tokens`, which
/// is where leaves get their lexemes back from.
pub fn parser<'a>(tokens: &'a [Token]) -> impl Parser<TokenKind, ParseTree, Error = Simple<TokenKind>> + 'a {
  let expression = expression(tokens);

  let type_name = leaf(tokens, TokenKind::TypeName).map(|name| ParseTree::node(Rule::Type, vec![name]));

  let variable_declaration_base = type_name
    .clone()
    .then(leaf(tokens, TokenKind::Identifier))
    .then(just(TokenKind::Equal).ignore_then(expression.clone()).or_not())
    .map(|((r#type, name), initializer)| {
      let mut children = vec![r#type, name];
      children.extend(initializer);
      ParseTree::node(Rule::VariableDeclarationBase, children)
    });

  let assignment_base = leaf(tokens, TokenKind::Identifier)
    .then_ignore(just(TokenKind::Equal))
    .then(expression.clone())
    .map(|(name, value)| ParseTree::node(Rule::AssignmentBase, vec![name, value]));

  let parameters = type_name
    .clone()
    .then(leaf(tokens, TokenKind::Identifier))
    .map(|(r#type, name)| ParseTree::node(Rule::Parameter, vec![r#type, name]))
    .separated_by(just(TokenKind::Comma))
    .at_least(1)
    .map(|parameters| ParseTree::node(Rule::Parameters, parameters));

  let block = recursive(|block| {
    let command = {
      let block = block.clone();
      let variable_declaration_base = variable_declaration_base.clone();
      recursive(move |command| {
      let if_command = just(TokenKind::Se)
        .ignore_then(
          expression
            .clone()
            .delimited_by(just(TokenKind::LeftParen), just(TokenKind::RightParen)),
        )
        .then(command.clone())
        .then(just(TokenKind::Senao).ignore_then(command.clone()).or_not())
        .map(|((condition, then_branch), else_branch)| {
          let mut children = vec![condition, then_branch];
          children.extend(else_branch);
          ParseTree::node(Rule::If, children)
        });

      let while_command = just(TokenKind::Enquanto)
        .ignore_then(
          expression
            .clone()
            .delimited_by(just(TokenKind::LeftParen), just(TokenKind::RightParen)),
        )
        .then(command.clone())
        .map(|(condition, body)| ParseTree::node(Rule::While, vec![condition, body]));

      let for_command = just(TokenKind::Para)
        .ignore_then(
          variable_declaration_base
            .clone()
            .or(assignment_base.clone())
            .then_ignore(just(TokenKind::Semicolon))
            .then(expression.clone())
            .then_ignore(just(TokenKind::Semicolon))
            .then(assignment_base.clone())
            .delimited_by(just(TokenKind::LeftParen), just(TokenKind::RightParen)),
        )
        .then(command.clone())
        .map(|(((initializer, condition), increment), body)| {
          ParseTree::node(Rule::For, vec![initializer, condition, increment, body])
        });

      let write_command = just(TokenKind::Escreva)
        .ignore_then(
          expression_list(expression.clone())
            .or_not()
            .delimited_by(just(TokenKind::LeftParen), just(TokenKind::RightParen)),
        )
        .then_ignore(just(TokenKind::Semicolon))
        .map(|list| ParseTree::node(Rule::Write, list.into_iter().collect()));

      let read_command = just(TokenKind::Leia)
        .ignore_then(
          leaf(tokens, TokenKind::Identifier)
            .delimited_by(just(TokenKind::LeftParen), just(TokenKind::RightParen)),
        )
        .then_ignore(just(TokenKind::Semicolon))
        .map(|name| ParseTree::node(Rule::Read, vec![name]));

      let return_command = just(TokenKind::Retorne)
        .ignore_then(expression.clone().or_not())
        .then_ignore(just(TokenKind::Semicolon))
        .map(|value| ParseTree::node(Rule::Return, value.into_iter().collect()));

      let call_command = function_call(tokens, expression.clone())
        .then_ignore(just(TokenKind::Semicolon))
        .map(|call| ParseTree::node(Rule::CallCommand, vec![call]));

      let assignment = assignment_base
        .clone()
        .then_ignore(just(TokenKind::Semicolon))
        .map(|assignment| ParseTree::node(Rule::Assignment, vec![assignment]));

      choice((
        block.clone(),
        if_command,
        while_command,
        for_command,
        write_command,
        read_command,
        return_command,
        call_command,
        assignment,
      ))
      .map(|command| ParseTree::node(Rule::Command, vec![command]))
      .boxed()
    })
    };

    let variable_declaration = variable_declaration_base
      .clone()
      .then_ignore(just(TokenKind::Semicolon))
      .map(|base| {
        let declaration = ParseTree::node(Rule::VariableDeclaration, vec![base]);
        ParseTree::node(Rule::Declaration, vec![declaration])
      });

    let function_declaration = just(TokenKind::Funcao)
      .ignore_then(type_name.clone())
      .then(leaf(tokens, TokenKind::Identifier))
      .then(
        parameters
          .clone()
          .or_not()
          .delimited_by(just(TokenKind::LeftParen), just(TokenKind::RightParen)),
      )
      .then(block.clone())
      .map(|(((return_type, name), parameters), body)| {
        let mut children = vec![return_type, name];
        children.extend(parameters);
        children.push(body);

        let declaration = ParseTree::node(Rule::FunctionDeclaration, children);
        ParseTree::node(Rule::Declaration, vec![declaration])
      });

    choice((variable_declaration, function_declaration, command))
      .repeated()
      .delimited_by(just(TokenKind::LeftBrace), just(TokenKind::RightBrace))
      .map(|items| ParseTree::node(Rule::Block, items))
  });

  just(TokenKind::Programa)
    .ignore_then(block)
    .then_ignore(end())
    .map(|block| ParseTree::node(Rule::Program, vec![block]))
}

fn expression<'a>(
  tokens: &'a [Token],
) -> impl Parser<TokenKind, ParseTree, Error = Simple<TokenKind>> + Clone + 'a {
  recursive(move |expression| {
    let literal = one_of(LITERALS).try_map(located(tokens));

    let identifier = leaf(tokens, TokenKind::Identifier)
      .map(|name| ParseTree::node(Rule::IdentifierExpression, vec![name]));

    let parenthesized = expression
      .clone()
      .delimited_by(just(TokenKind::LeftParen), just(TokenKind::RightParen));

    let primary = choice((
      literal,
      function_call(tokens, expression.clone()),
      identifier,
      parenthesized,
    ))
    .map(|inner| ParseTree::node(Rule::PrimaryExpression, vec![inner]));

    let unary = recursive(move |unary| {
      one_of(UNARY_OPERATORS)
        .try_map(located(tokens))
        .then(unary)
        .map(|(operator, operand)| ParseTree::node(Rule::UnaryExpression, vec![operator, operand]))
        .or(primary.map(|primary| ParseTree::node(Rule::UnaryExpression, vec![primary])))
    });

    let multiplicative = chain(tokens, Rule::MultiplicativeExpression, MULTIPLICATIVE_OPERATORS, unary);
    let additive = chain(tokens, Rule::AdditiveExpression, ADDITIVE_OPERATORS, multiplicative);
    let relational = chain(tokens, Rule::RelationalExpression, RELATIONAL_OPERATORS, additive);
    let logical = chain(tokens, Rule::LogicalExpression, LOGICAL_OPERATORS, relational);

    logical.map(|logical| ParseTree::node(Rule::Expression, vec![logical]))
  })
}

/// One precedence level: `operand (operator operand)*`, kept flat.
fn chain<'a, P>(
  tokens: &'a [Token],
  rule: Rule,
  operators: &'static [TokenKind],
  operand: P,
) -> BoxedParser<'a, TokenKind, ParseTree, Simple<TokenKind>>
where
  P: Parser<TokenKind, ParseTree, Error = Simple<TokenKind>> + Clone + 'a,
{
  operand
    .clone()
    .then(one_of(operators).try_map(located(tokens)).then(operand).repeated())
    .map(move |(first, rest)| {
      let mut children = vec![first];
      for (operator, operand) in rest {
        children.push(operator);
        children.push(operand);
      }
      ParseTree::node(rule, children)
    })
    .boxed()
}

fn expression_list<'a, P>(expression: P) -> impl Parser<TokenKind, ParseTree, Error = Simple<TokenKind>> + Clone + 'a
where
  P: Parser<TokenKind, ParseTree, Error = Simple<TokenKind>> + Clone + 'a,
{
  expression
    .separated_by(just(TokenKind::Comma))
    .at_least(1)
    .map(|expressions| ParseTree::node(Rule::ExpressionList, expressions))
}

fn function_call<'a, P>(
  tokens: &'a [Token],
  expression: P,
) -> impl Parser<TokenKind, ParseTree, Error = Simple<TokenKind>> + Clone + 'a
where
  P: Parser<TokenKind, ParseTree, Error = Simple<TokenKind>> + Clone + 'a,
{
  leaf(tokens, TokenKind::Identifier)
    .then(
      expression_list(expression)
        .or_not()
        .delimited_by(just(TokenKind::LeftParen), just(TokenKind::RightParen)),
    )
    .map(|(name, arguments)| {
      let mut children = vec![name];
      children.extend(arguments);
      ParseTree::node(Rule::FunctionCall, children)
    })
}

fn leaf<'a>(
  tokens: &'a [Token],
  kind: TokenKind,
) -> impl Parser<TokenKind, ParseTree, Error = Simple<TokenKind>> + Clone + 'a {
  just(kind).try_map(located(tokens))
}

/// Turns a matched kind back into the full token it came from.
fn located(
  tokens: &[Token],
) -> impl Fn(TokenKind, Range<usize>) -> std::result::Result<ParseTree, Simple<TokenKind>> + Clone + '_ {
  move |_, span| match tokens.get(span.start) {
    Some(token) => Ok(ParseTree::Leaf(token.clone())),
    None => Err(Simple::custom(span, "token fora da entrada")),
  }
}

fn syntax_error(tokens: &[Token], errors: Vec<Simple<TokenKind>>) -> Error {
  let end = tokens.last().map_or(Span(0, 0), |token| Span(token.span.1, token.span.1));

  let Some(error) = errors.into_iter().max_by_key(|error| error.span().start) else {
    return Error::ParseError {
      span: end,
      expected: TokenKind::Programa.to_string(),
      found: "fim do arquivo".to_owned(),
    };
  };

  let mut expected: Vec<String> = error
    .expected()
    .map(|kind| match kind {
      Some(kind) => kind.to_string(),
      None => "fim do arquivo".to_owned(),
    })
    .collect();
  expected.sort();
  expected.dedup();

  let expected = if expected.is_empty() {
    error.label().unwrap_or("token válido").to_owned()
  } else {
    expected.join(" ou ")
  };

  match tokens.get(error.span().start) {
    Some(token) => Error::ParseError {
      span: token.span,
      expected,
      found: token.to_string(),
    },
    None => Error::ParseError {
      span: end,
      expected,
      found: "fim do arquivo".to_owned(),
    },
  }
}

#[cfg(test)]
mod tests {
  use super::parse;
  use crate::error::Error;
  use crate::lexer::Lexer;
  use crate::token::TokenKind;
  use crate::tree::{ParseTree, Rule};

  fn parse_source(input: &str) -> Result<ParseTree, Error> {
    let tokens = Lexer::new(input).lex().unwrap();
    parse(&tokens)
  }

  fn children(tree: &ParseTree) -> &[ParseTree] {
    match tree {
      ParseTree::Node { children, .. } => children,
      ParseTree::Leaf(token) => panic!("expected node, got leaf {:?}", token),
    }
  }

  #[test]
  fn test_program_wraps_block() {
    let tree = parse_source("programa { inteiro a = 1; escreva(a); }").unwrap();

    assert_eq!(tree.rule(), Some(Rule::Program));
    let block = &children(&tree)[0];
    assert_eq!(block.rule(), Some(Rule::Block));
    assert_eq!(children(block).len(), 2);
    assert_eq!(children(block)[0].rule(), Some(Rule::Declaration));
    assert_eq!(children(block)[1].rule(), Some(Rule::Command));
  }

  #[test]
  fn test_operator_chain_is_flat() {
    let tree = parse_source("programa { escreva(1 - 2 - 3); }").unwrap();

    let block = &children(&tree)[0];
    let write = &children(&children(block)[0])[0];
    let list = &children(write)[0];
    let expression = &children(list)[0];
    let logical = &children(expression)[0];
    let relational = &children(logical)[0];
    let additive = &children(relational)[0];

    assert_eq!(additive.rule(), Some(Rule::AdditiveExpression));
    assert_eq!(children(additive).len(), 5);
    match &children(additive)[1] {
      ParseTree::Leaf(token) => assert_eq!(token.kind, TokenKind::Minus),
      other => panic!("expected operator leaf, got {:?}", other),
    }
  }

  #[test]
  fn test_leaves_keep_lexemes() {
    let tree = parse_source("programa { leia(idade); }").unwrap();

    let block = &children(&tree)[0];
    let read = &children(&children(block)[0])[0];
    assert_eq!(read.rule(), Some(Rule::Read));
    match &children(read)[0] {
      ParseTree::Leaf(token) => {
        assert_eq!(token.slice, "idade");
        assert_eq!((token.span.0, token.span.1), (16, 21));
      }
      other => panic!("expected identifier leaf, got {:?}", other),
    }
  }

  #[test]
  fn test_optional_slots_are_omitted() {
    let tree = parse_source("programa { funcao vazio f() { retorne; } escreva(); }").unwrap();

    let block = &children(&tree)[0];
    let function = &children(&children(block)[0])[0];
    assert_eq!(function.rule(), Some(Rule::FunctionDeclaration));
    assert_eq!(children(function).len(), 3);

    let write = &children(&children(block)[1])[0];
    assert_eq!(write.rule(), Some(Rule::Write));
    assert!(children(write).is_empty());
  }

  #[test]
  fn test_dangling_else_binds_to_nearest_if() {
    let tree = parse_source("programa { se (a) se (b) escreva(1); senao escreva(2); }").unwrap();

    let block = &children(&tree)[0];
    let outer = &children(&children(block)[0])[0];
    assert_eq!(outer.rule(), Some(Rule::If));
    assert_eq!(children(outer).len(), 2);

    let inner = &children(&children(outer)[1])[0];
    assert_eq!(inner.rule(), Some(Rule::If));
    assert_eq!(children(inner).len(), 3);
  }

  #[test]
  fn test_call_as_command() {
    let tree = parse_source("programa { f(1, 2); }").unwrap();

    let block = &children(&tree)[0];
    let command = &children(&children(block)[0])[0];
    assert_eq!(command.rule(), Some(Rule::CallCommand));
  }

  #[test]
  fn test_missing_semicolon() {
    match parse_source("programa { inteiro a = 1 }") {
      Err(Error::ParseError { expected, found, .. }) => {
        assert!(expected.contains("';'"), "expected list was {}", expected);
        assert_eq!(found, "}");
      }
      other => panic!("expected parse error, got {:?}", other),
    }
  }

  #[test]
  fn test_unterminated_block() {
    match parse_source("programa { escreva(1);") {
      Err(Error::ParseError { found, .. }) => assert_eq!(found, "fim do arquivo"),
      other => panic!("expected parse error, got {:?}", other),
    }
  }

  #[test]
  fn test_trailing_input_is_rejected() {
    match parse_source("programa { } escreva(1);") {
      Err(Error::ParseError { found, .. }) => assert_eq!(found, "escreva"),
      other => panic!("expected parse error, got {:?}", other),
    }
  }
}
