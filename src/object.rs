use std::cell::RefCell;
use std::fmt;
use std::fmt::Formatter;
use std::rc::Rc;

use crate::ast::FunctionDeclaration;
use crate::env::Env;

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
  Boolean(bool),
  Function(Rc<Function>),
}

/// A function declaration closed over the frame it was declared in.
///
/// The frame is shared, not copied: later changes to the captured
/// variables are visible to every call.
pub struct Function {
  pub declaration: Rc<FunctionDeclaration>,
  pub closure: Rc<RefCell<Env>>,
}

impl Function {
  pub fn new(declaration: Rc<FunctionDeclaration>, closure: Rc<RefCell<Env>>) -> Self {
    Function { declaration, closure }
  }

  pub fn name(&self) -> &str {
    &self.declaration.name
  }

  pub fn arity(&self) -> usize {
    self.declaration.parameters.len()
  }
}

// The captured frame usually holds this very function, so neither Debug nor
// PartialEq may walk into it.
impl fmt::Debug for Function {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.debug_struct("Function")
      .field("name", &self.declaration.name)
      .field("arity", &self.arity())
      .finish_non_exhaustive()
  }
}

impl PartialEq for Function {
  fn eq(&self, other: &Self) -> bool {
    Rc::ptr_eq(&self.declaration, &other.declaration) && Rc::ptr_eq(&self.closure, &other.closure)
  }
}

impl Object {
  pub fn type_name(&self) -> &'static str {
    match self {
      Object::Null => "nulo",
      Object::Integer(_) => "inteiro",
      Object::Real(_) => "real",
      Object::Text(_) => "cadeia",
      Object::Boolean(_) => "logico",
      Object::Function(_) => "funcao",
    }
  }

  pub fn is_numeric(&self) -> bool {
    matches!(self, Object::Integer(_) | Object::Real(_))
  }

  /// Turns one line of input into the most specific value it spells:
  /// integer, then real, then plain text.
  pub fn from_input(line: &str) -> Object {
    let trimmed = line.trim();

    if let Ok(value) = trimmed.parse::<i64>() {
      return Object::Integer(value);
    }

    if let Ok(value) = trimmed.parse::<f64>() {
      return Object::Real(value);
    }

    Object::Text(line.to_owned())
  }
}

fn write_real(f: &mut Formatter<'_>, value: f64) -> fmt::Result {
  let text = value.to_string();

  if value.is_finite() && !text.contains('.') {
    write!(f, "{}.0", text)
  } else {
    f.write_str(&text)
  }
}

impl fmt::Display for Object {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Object::Null => f.write_str("nulo"),
      Object::Integer(n) => write!(f, "{}", n),
      Object::Real(n) => write_real(f, *n),
      Object::Text(s) => write!(f, "{}", s),
      Object::Boolean(true) => f.write_str("verdadeiro"),
      Object::Boolean(false) => f.write_str("falso"),
      Object::Function(function) => write!(f, "<funcao {}>", function.name()),
    }
  }
}
