use std::fmt;
use std::rc::Rc;

/// Top-level declarations and commands, run directly in the global frame.
pub type Program = Vec<Statement>;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
  VariableDeclaration(VariableDeclaration),
  FunctionDeclaration(Rc<FunctionDeclaration>),
  Assignment(Assignment),
  If {
    condition: Expression,
    then_branch: Box<Statement>,
    else_branch: Option<Box<Statement>>,
  },
  While {
    condition: Expression,
    body: Box<Statement>,
  },
  For {
    initializer: ForInitializer,
    condition: Expression,
    increment: Assignment,
    body: Box<Statement>,
  },
  Write(Vec<Expression>),
  Read(String),
  Return(Option<Expression>),
  Block(Vec<Statement>),
  Call(Call),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
  pub r#type: Type,
  pub name: String,
  pub initializer: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
  pub return_type: Type,
  pub name: String,
  pub parameters: Vec<Param>,
  pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
  pub r#type: Type,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
  pub name: String,
  pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInitializer {
  Declaration(VariableDeclaration),
  Assignment(Assignment),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
  pub name: String,
  pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
  Binary {
    left: Box<Expression>,
    operator: BinaryOperator,
    right: Box<Expression>,
  },
  Unary {
    operator: UnaryOperator,
    operand: Box<Expression>,
  },
  Literal(Literal),
  Variable(String),
  FunctionCall(Call),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
  Integer(i64),
  Real(f64),
  Text(String),
  Boolean(bool),
}

/// Advisory type label; never checked against runtime values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
  Add,
  Subtract,
  Multiply,
  Divide,
  Modulo,
  Equal,
  NotEqual,
  Less,
  LessEqual,
  Greater,
  GreaterEqual,
  And,
  Or,
}

impl BinaryOperator {
  pub fn from_symbol(symbol: &str) -> Option<Self> {
    let operator = match symbol {
      "+" => BinaryOperator::Add,
      "-" => BinaryOperator::Subtract,
      "*" => BinaryOperator::Multiply,
      "/" => BinaryOperator::Divide,
      "%" => BinaryOperator::Modulo,
      "==" => BinaryOperator::Equal,
      "!=" => BinaryOperator::NotEqual,
      "<" => BinaryOperator::Less,
      "<=" => BinaryOperator::LessEqual,
      ">" => BinaryOperator::Greater,
      ">=" => BinaryOperator::GreaterEqual,
      "e" => BinaryOperator::And,
      "ou" => BinaryOperator::Or,
      _ => return None,
    };

    Some(operator)
  }

  pub fn symbol(self) -> &'static str {
    match self {
      BinaryOperator::Add => "+",
      BinaryOperator::Subtract => "-",
      BinaryOperator::Multiply => "*",
      BinaryOperator::Divide => "/",
      BinaryOperator::Modulo => "%",
      BinaryOperator::Equal => "==",
      BinaryOperator::NotEqual => "!=",
      BinaryOperator::Less => "<",
      BinaryOperator::LessEqual => "<=",
      BinaryOperator::Greater => ">",
      BinaryOperator::GreaterEqual => ">=",
      BinaryOperator::And => "e",
      BinaryOperator::Or => "ou",
    }
  }
}

impl fmt::Display for BinaryOperator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.symbol())
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
  Negate,
  Identity,
  Not,
}

impl UnaryOperator {
  pub fn from_symbol(symbol: &str) -> Option<Self> {
    match symbol {
      "-" => Some(UnaryOperator::Negate),
      "+" => Some(UnaryOperator::Identity),
      "!" => Some(UnaryOperator::Not),
      _ => None,
    }
  }
}

impl fmt::Display for UnaryOperator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      UnaryOperator::Negate => "-",
      UnaryOperator::Identity => "+",
      UnaryOperator::Not => "!",
    })
  }
}
