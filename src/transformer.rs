//! Maps the concrete [`ParseTree`] onto the [`crate::ast`] types.
//!
//! Every rule handler checks the shape it receives and reports anything
//! unexpected as [`Error::MalformedTree`]. A tree that reaches this module
//! badly shaped means the parser and this module disagree about the grammar,
//! not that the user program is wrong.

use std::rc::Rc;

use log::debug;

use crate::ast::{
  Assignment, BinaryOperator, Call, Expression, ForInitializer, FunctionDeclaration, Literal,
  Param, Program, Statement, Type, UnaryOperator, VariableDeclaration,
};
use crate::error::{Error, Result};
use crate::token::{Token, TokenKind};
use crate::tree::{ParseTree, Rule};

pub fn transform(tree: &ParseTree) -> Result<Program> {
  let [block] = children(tree, Rule::Program)? else {
    return Err(arity(tree));
  };

  let program = block_items(block)?;
  debug!("transformed program with {} top-level items", program.len());

  Ok(program)
}

fn children(tree: &ParseTree, expected: Rule) -> Result<&[ParseTree]> {
  match tree {
    ParseTree::Node { rule, children } if *rule == expected => Ok(children),
    other => Err(Error::malformed(format!(
      "esperado {}, encontrado {}",
      expected,
      other.describe()
    ))),
  }
}

fn token(tree: &ParseTree, kind: TokenKind) -> Result<&Token> {
  match tree {
    ParseTree::Leaf(token) if token.kind == kind => Ok(token),
    other => Err(Error::malformed(format!(
      "esperado token {:?}, encontrado {}",
      kind,
      other.describe()
    ))),
  }
}

fn identifier(tree: &ParseTree) -> Result<String> {
  token(tree, TokenKind::Identifier).map(|token| token.slice.clone())
}

fn arity(tree: &ParseTree) -> Error {
  Error::malformed(format!("aridade inesperada em {}", tree.describe()))
}

fn unknown(tree: &ParseTree) -> Error {
  Error::UnknownNodeKind(tree.describe())
}

fn block_items(tree: &ParseTree) -> Result<Vec<Statement>> {
  children(tree, Rule::Block)?.iter().map(item).collect()
}

fn item(tree: &ParseTree) -> Result<Statement> {
  match tree.rule() {
    Some(Rule::Declaration) => declaration(tree),
    Some(Rule::Command) => command(tree),
    _ => Err(unknown(tree)),
  }
}

fn declaration(tree: &ParseTree) -> Result<Statement> {
  let [inner] = children(tree, Rule::Declaration)? else {
    return Err(arity(tree));
  };

  match inner.rule() {
    Some(Rule::VariableDeclaration) => {
      let [base] = children(inner, Rule::VariableDeclaration)? else {
        return Err(arity(inner));
      };
      Ok(Statement::VariableDeclaration(variable_declaration_base(base)?))
    }
    Some(Rule::FunctionDeclaration) => {
      Ok(Statement::FunctionDeclaration(Rc::new(function_declaration(inner)?)))
    }
    _ => Err(unknown(inner)),
  }
}

fn type_label(tree: &ParseTree) -> Result<Type> {
  let [keyword] = children(tree, Rule::Type)? else {
    return Err(arity(tree));
  };

  Ok(Type(token(keyword, TokenKind::TypeName)?.slice.clone()))
}

fn variable_declaration_base(tree: &ParseTree) -> Result<VariableDeclaration> {
  let (r#type, name, initializer) = match children(tree, Rule::VariableDeclarationBase)? {
    [r#type, name] => (r#type, name, None),
    [r#type, name, value] => (r#type, name, Some(expression(value)?)),
    _ => return Err(arity(tree)),
  };

  Ok(VariableDeclaration {
    r#type: type_label(r#type)?,
    name: identifier(name)?,
    initializer,
  })
}

fn function_declaration(tree: &ParseTree) -> Result<FunctionDeclaration> {
  let (return_type, name, parameters, body) = match children(tree, Rule::FunctionDeclaration)? {
    [return_type, name, body] => (return_type, name, Vec::new(), body),
    [return_type, name, list, body] => (return_type, name, parameters(list)?, body),
    _ => return Err(arity(tree)),
  };

  Ok(FunctionDeclaration {
    return_type: type_label(return_type)?,
    name: identifier(name)?,
    parameters,
    body: block_items(body)?,
  })
}

fn parameters(tree: &ParseTree) -> Result<Vec<Param>> {
  children(tree, Rule::Parameters)?
    .iter()
    .map(|parameter| {
      let [r#type, name] = children(parameter, Rule::Parameter)? else {
        return Err(arity(parameter));
      };

      Ok(Param {
        r#type: type_label(r#type)?,
        name: identifier(name)?,
      })
    })
    .collect()
}

fn command(tree: &ParseTree) -> Result<Statement> {
  let [inner] = children(tree, Rule::Command)? else {
    return Err(arity(tree));
  };

  let Some(rule) = inner.rule() else {
    return Err(unknown(inner));
  };

  match rule {
    Rule::Block => Ok(Statement::Block(block_items(inner)?)),
    Rule::Assignment => {
      let [base] = children(inner, Rule::Assignment)? else {
        return Err(arity(inner));
      };
      Ok(Statement::Assignment(assignment_base(base)?))
    }
    Rule::If => if_command(inner),
    Rule::While => {
      let [condition, body] = children(inner, Rule::While)? else {
        return Err(arity(inner));
      };
      Ok(Statement::While {
        condition: expression(condition)?,
        body: Box::new(command(body)?),
      })
    }
    Rule::For => for_command(inner),
    Rule::Write => {
      let expressions = match children(inner, Rule::Write)? {
        [] => Vec::new(),
        [list] => expression_list(list)?,
        _ => return Err(arity(inner)),
      };
      Ok(Statement::Write(expressions))
    }
    Rule::Read => {
      let [name] = children(inner, Rule::Read)? else {
        return Err(arity(inner));
      };
      Ok(Statement::Read(identifier(name)?))
    }
    Rule::Return => {
      let value = match children(inner, Rule::Return)? {
        [] => None,
        [value] => Some(expression(value)?),
        _ => return Err(arity(inner)),
      };
      Ok(Statement::Return(value))
    }
    Rule::CallCommand => {
      let [call] = children(inner, Rule::CallCommand)? else {
        return Err(arity(inner));
      };
      Ok(Statement::Call(function_call(call)?))
    }
    _ => Err(unknown(inner)),
  }
}

fn assignment_base(tree: &ParseTree) -> Result<Assignment> {
  let [name, value] = children(tree, Rule::AssignmentBase)? else {
    return Err(arity(tree));
  };

  Ok(Assignment {
    name: identifier(name)?,
    value: expression(value)?,
  })
}

fn if_command(tree: &ParseTree) -> Result<Statement> {
  let (condition, then_branch, else_branch) = match children(tree, Rule::If)? {
    [condition, then_branch] => (condition, then_branch, None),
    [condition, then_branch, else_branch] => {
      (condition, then_branch, Some(Box::new(command(else_branch)?)))
    }
    _ => return Err(arity(tree)),
  };

  Ok(Statement::If {
    condition: expression(condition)?,
    then_branch: Box::new(command(then_branch)?),
    else_branch,
  })
}

fn for_command(tree: &ParseTree) -> Result<Statement> {
  let [initializer, condition, increment, body] = children(tree, Rule::For)? else {
    return Err(arity(tree));
  };

  let initializer = match initializer.rule() {
    Some(Rule::VariableDeclarationBase) => {
      ForInitializer::Declaration(variable_declaration_base(initializer)?)
    }
    Some(Rule::AssignmentBase) => ForInitializer::Assignment(assignment_base(initializer)?),
    _ => return Err(unknown(initializer)),
  };

  Ok(Statement::For {
    initializer,
    condition: expression(condition)?,
    increment: assignment_base(increment)?,
    body: Box::new(command(body)?),
  })
}

fn expression_list(tree: &ParseTree) -> Result<Vec<Expression>> {
  children(tree, Rule::ExpressionList)?
    .iter()
    .map(expression)
    .collect()
}

fn expression(tree: &ParseTree) -> Result<Expression> {
  let [inner] = children(tree, Rule::Expression)? else {
    return Err(arity(tree));
  };

  logical(inner)
}

fn logical(tree: &ParseTree) -> Result<Expression> {
  binary_chain(tree, Rule::LogicalExpression, relational)
}

fn relational(tree: &ParseTree) -> Result<Expression> {
  binary_chain(tree, Rule::RelationalExpression, additive)
}

fn additive(tree: &ParseTree) -> Result<Expression> {
  binary_chain(tree, Rule::AdditiveExpression, multiplicative)
}

fn multiplicative(tree: &ParseTree) -> Result<Expression> {
  binary_chain(tree, Rule::MultiplicativeExpression, unary)
}

/// Folds `[a, op1, b, op2, c]` into `(a op1 b) op2 c`.
fn binary_chain(
  tree: &ParseTree,
  rule: Rule,
  operand: fn(&ParseTree) -> Result<Expression>,
) -> Result<Expression> {
  let items = children(tree, rule)?;
  let Some((first, rest)) = items.split_first() else {
    return Err(arity(tree));
  };
  if rest.len() % 2 != 0 {
    return Err(arity(tree));
  }

  let mut expression = operand(first)?;
  for pair in rest.chunks(2) {
    let operator = binary_operator(&pair[0])?;
    let right = operand(&pair[1])?;
    expression = Expression::Binary {
      left: Box::new(expression),
      operator,
      right: Box::new(right),
    };
  }

  Ok(expression)
}

fn operator_token(tree: &ParseTree) -> Result<&Token> {
  match tree {
    ParseTree::Leaf(token) => Ok(token),
    other => Err(Error::malformed(format!(
      "esperado operador, encontrado {}",
      other.describe()
    ))),
  }
}

fn binary_operator(tree: &ParseTree) -> Result<BinaryOperator> {
  let token = operator_token(tree)?;
  BinaryOperator::from_symbol(&token.slice).ok_or_else(|| Error::UnknownOperator(token.slice.clone()))
}

fn unary(tree: &ParseTree) -> Result<Expression> {
  match children(tree, Rule::UnaryExpression)? {
    [primary_expression] => primary(primary_expression),
    [operator, operand] => {
      let token = operator_token(operator)?;
      let operator = UnaryOperator::from_symbol(&token.slice)
        .ok_or_else(|| Error::UnknownOperator(token.slice.clone()))?;

      Ok(Expression::Unary {
        operator,
        operand: Box::new(unary(operand)?),
      })
    }
    _ => Err(arity(tree)),
  }
}

fn primary(tree: &ParseTree) -> Result<Expression> {
  let [inner] = children(tree, Rule::PrimaryExpression)? else {
    return Err(arity(tree));
  };

  match inner {
    ParseTree::Leaf(token) => literal(token).map(Expression::Literal),
    ParseTree::Node { rule: Rule::IdentifierExpression, children } => match children.as_slice() {
      [name] => Ok(Expression::Variable(identifier(name)?)),
      _ => Err(arity(inner)),
    },
    ParseTree::Node { rule: Rule::FunctionCall, .. } => function_call(inner).map(Expression::FunctionCall),
    ParseTree::Node { rule: Rule::Expression, .. } => expression(inner),
    _ => Err(unknown(inner)),
  }
}

fn function_call(tree: &ParseTree) -> Result<Call> {
  let (name, arguments) = match children(tree, Rule::FunctionCall)? {
    [name] => (name, Vec::new()),
    [name, list] => (name, expression_list(list)?),
    _ => return Err(arity(tree)),
  };

  Ok(Call {
    name: identifier(name)?,
    arguments,
  })
}

fn literal(token: &Token) -> Result<Literal> {
  match token.kind {
    TokenKind::Integer => token
      .slice
      .parse::<i64>()
      .map(Literal::Integer)
      .map_err(|_| Error::IntegerOverflow(token.slice.clone())),
    TokenKind::Real => token
      .slice
      .parse::<f64>()
      .map(Literal::Real)
      .map_err(|_| Error::malformed(format!("número real inválido '{}'", token.slice))),
    TokenKind::String => strip_quotes(&token.slice, '"').map(Literal::Text),
    TokenKind::Character => strip_quotes(&token.slice, '\'').map(Literal::Text),
    TokenKind::Boolean => Ok(Literal::Boolean(token.slice == "verdadeiro")),
    _ => Err(Error::malformed(format!(
      "esperado literal, encontrado {:?} '{}'",
      token.kind, token.slice
    ))),
  }
}

/// Quotes come off; the text between them is kept exactly as written.
fn strip_quotes(lexeme: &str, quote: char) -> Result<String> {
  lexeme
    .strip_prefix(quote)
    .and_then(|rest| rest.strip_suffix(quote))
    .map(str::to_owned)
    .ok_or_else(|| Error::malformed(format!("literal sem aspas {}", lexeme)))
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::transform;
  use crate::ast::{
    Assignment, BinaryOperator, Call, Expression, ForInitializer, Literal, Statement, Type,
    UnaryOperator, VariableDeclaration,
  };
  use crate::error::Error;
  use crate::lexer::Lexer;
  use crate::parser::parse;
  use crate::token::{Span, Token, TokenKind};
  use crate::tree::{ParseTree, Rule};

  fn program(input: &str) -> Vec<Statement> {
    let tokens = Lexer::new(input).lex().unwrap();
    let tree = parse(&tokens).unwrap();
    transform(&tree).unwrap()
  }

  fn single_write(input: &str) -> Expression {
    match program(&format!("programa {{ escreva({}); }}", input)).remove(0) {
      Statement::Write(mut expressions) => expressions.remove(0),
      other => panic!("expected write, got {:?}", other),
    }
  }

  fn int(value: i64) -> Box<Expression> {
    Box::new(Expression::Literal(Literal::Integer(value)))
  }

  fn leaf(kind: TokenKind, slice: &str) -> ParseTree {
    ParseTree::Leaf(Token::new(kind, slice.to_owned(), Span(0, 0)))
  }

  #[test]
  fn test_left_fold() {
    assert_eq!(
      single_write("1 - 2 - 3"),
      Expression::Binary {
        left: Box::new(Expression::Binary {
          left: int(1),
          operator: BinaryOperator::Subtract,
          right: int(2),
        }),
        operator: BinaryOperator::Subtract,
        right: int(3),
      }
    );
  }

  #[test]
  fn test_precedence() {
    assert_eq!(
      single_write("1 + 2 * 3"),
      Expression::Binary {
        left: int(1),
        operator: BinaryOperator::Add,
        right: Box::new(Expression::Binary {
          left: int(2),
          operator: BinaryOperator::Multiply,
          right: int(3),
        }),
      }
    );
  }

  #[test]
  fn test_logical_operators_share_a_level() {
    let expression = single_write("a ou b e c");

    match expression {
      Expression::Binary { left, operator: BinaryOperator::And, .. } => {
        assert!(matches!(*left, Expression::Binary { operator: BinaryOperator::Or, .. }));
      }
      other => panic!("expected left-folded logical chain, got {:?}", other),
    }
  }

  #[test]
  fn test_literal_decoding() {
    assert_eq!(single_write("2.5"), Expression::Literal(Literal::Real(2.5)));
    assert_eq!(single_write(r#""a b""#), Expression::Literal(Literal::Text("a b".to_owned())));
    assert_eq!(single_write("'x'"), Expression::Literal(Literal::Text("x".to_owned())));
    assert_eq!(single_write("falso"), Expression::Literal(Literal::Boolean(false)));
    assert_eq!(
      single_write("-!x"),
      Expression::Unary {
        operator: UnaryOperator::Negate,
        operand: Box::new(Expression::Unary {
          operator: UnaryOperator::Not,
          operand: Box::new(Expression::Variable("x".to_owned())),
        }),
      }
    );
  }

  #[test]
  fn test_backslashes_are_kept_verbatim() {
    assert_eq!(
      single_write(r#""a\tb\n""#),
      Expression::Literal(Literal::Text(r"a\tb\n".to_owned()))
    );
    assert_eq!(
      single_write(r#""diz \"oi\"""#),
      Expression::Literal(Literal::Text(r#"diz \"oi\""#.to_owned()))
    );
    assert_eq!(single_write(r"'\n'"), Expression::Literal(Literal::Text(r"\n".to_owned())));
  }

  #[test]
  fn test_optional_clauses() {
    let statements = program(
      "programa { inteiro a; se (a) escreva(1); funcao vazio f() { retorne; } g(); }",
    );

    assert_eq!(
      statements[0],
      Statement::VariableDeclaration(VariableDeclaration {
        r#type: Type("inteiro".to_owned()),
        name: "a".to_owned(),
        initializer: None,
      })
    );
    assert!(matches!(statements[1], Statement::If { else_branch: None, .. }));
    match &statements[2] {
      Statement::FunctionDeclaration(function) => {
        assert!(function.parameters.is_empty());
        assert_eq!(function.body, vec![Statement::Return(None)]);
      }
      other => panic!("expected function, got {:?}", other),
    }
    assert_eq!(
      statements[3],
      Statement::Call(Call { name: "g".to_owned(), arguments: vec![] })
    );
  }

  #[test]
  fn test_for_loop() {
    let statements = program("programa { para (inteiro i = 0; i < 3; i = i + 1) escreva(i); }");

    match &statements[0] {
      Statement::For { initializer, increment, .. } => {
        assert!(matches!(initializer, ForInitializer::Declaration(d) if d.name == "i"));
        assert_eq!(
          increment,
          &Assignment {
            name: "i".to_owned(),
            value: Expression::Binary {
              left: Box::new(Expression::Variable("i".to_owned())),
              operator: BinaryOperator::Add,
              right: int(1),
            },
          }
        );
      }
      other => panic!("expected for loop, got {:?}", other),
    }
  }

  #[test]
  fn test_malformed_tree() {
    let tree = ParseTree::node(
      Rule::Program,
      vec![ParseTree::node(
        Rule::Block,
        vec![ParseTree::node(
          Rule::Command,
          vec![ParseTree::node(Rule::Read, vec![])],
        )],
      )],
    );

    assert!(matches!(transform(&tree), Err(Error::MalformedTree(_))));
  }

  #[test]
  fn test_wrong_leaf_kind() {
    let tree = ParseTree::node(
      Rule::Program,
      vec![ParseTree::node(
        Rule::Block,
        vec![ParseTree::node(
          Rule::Command,
          vec![ParseTree::node(Rule::Read, vec![leaf(TokenKind::Integer, "1")])],
        )],
      )],
    );

    assert!(matches!(transform(&tree), Err(Error::MalformedTree(_))));
  }

  #[test]
  fn test_unknown_node_kind() {
    let tree = ParseTree::node(
      Rule::Program,
      vec![ParseTree::node(Rule::Block, vec![ParseTree::node(Rule::Type, vec![])])],
    );

    assert!(matches!(transform(&tree), Err(Error::UnknownNodeKind(_))));
  }
}
