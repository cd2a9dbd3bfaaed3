use std::cell::RefCell;
use std::cmp::Ordering;
use std::io::{self, BufRead, Stdout, StdinLock, Write};
use std::rc::Rc;

use log::{debug, trace, warn};

use crate::ast::{
  Assignment, BinaryOperator, Call, Expression, ForInitializer, Literal, Program, Statement,
  UnaryOperator, VariableDeclaration,
};
use crate::env::Env;
use crate::error::{Error, Result};
use crate::object::{Function, Object};

pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Stack left below which a call moves onto a fresh segment.
const RED_ZONE: usize = 100 * 1024;

/// Size of each segment `stacker` allocates.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// How a statement finished: fell through, or hit `retorne` with a value
/// that has to travel up to the nearest call.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
  Normal,
  Return(Object),
}

pub struct Evaluator<R, W> {
  pub globals: Rc<RefCell<Env>>,
  input: R,
  output: W,
  depth: usize,
  max_depth: usize,
}

impl Evaluator<StdinLock<'static>, Stdout> {
  pub fn new() -> Self {
    Evaluator::with_io(io::stdin().lock(), io::stdout())
  }
}

impl<R: BufRead, W: Write> Evaluator<R, W> {
  pub fn with_io(input: R, output: W) -> Self {
    Evaluator {
      globals: Rc::new(RefCell::new(Env::new())),
      input,
      output,
      depth: 0,
      max_depth: DEFAULT_MAX_DEPTH,
    }
  }

  pub fn with_max_depth(mut self, max_depth: usize) -> Self {
    self.max_depth = max_depth;
    self
  }

  pub fn into_output(self) -> W {
    self.output
  }

  /// Runs the program directly in the global frame.
  pub fn eval(&mut self, program: &Program) -> Result<()> {
    let globals = Rc::clone(&self.globals);

    for statement in program {
      if let Flow::Return(value) = self.execute(statement, &globals)? {
        warn!("'retorne' fora de função com valor {}; encerrando o programa", value);
        break;
      }
    }

    self.output.flush()?;
    Ok(())
  }

  fn execute_block(&mut self, statements: &[Statement], env: &Rc<RefCell<Env>>) -> Result<Flow> {
    let frame = Env::enclosed(env);

    for statement in statements {
      if let Flow::Return(value) = self.execute(statement, &frame)? {
        return Ok(Flow::Return(value));
      }
    }

    Ok(Flow::Normal)
  }

  pub fn execute(&mut self, statement: &Statement, env: &Rc<RefCell<Env>>) -> Result<Flow> {
    match statement {
      Statement::VariableDeclaration(declaration) => self.declare(declaration, env)?,
      Statement::FunctionDeclaration(declaration) => {
        let function = Function::new(Rc::clone(declaration), Rc::clone(env));
        env
          .borrow_mut()
          .define(&declaration.name, Object::Function(Rc::new(function)));
      }
      Statement::Assignment(assignment) => self.assign(assignment, env)?,
      Statement::If { condition, then_branch, else_branch } => {
        if self.condition(condition, env)? {
          return self.execute(then_branch, env);
        }
        if let Some(else_branch) = else_branch {
          return self.execute(else_branch, env);
        }
      }
      Statement::While { condition, body } => {
        while self.condition(condition, env)? {
          if let Flow::Return(value) = self.execute(body, env)? {
            return Ok(Flow::Return(value));
          }
        }
      }
      Statement::For { initializer, condition, increment, body } => {
        let frame = Env::enclosed(env);
        debug!("entering 'para' frame");

        match initializer {
          ForInitializer::Declaration(declaration) => self.declare(declaration, &frame)?,
          ForInitializer::Assignment(assignment) => self.assign(assignment, &frame)?,
        }

        while self.condition(condition, &frame)? {
          if let Flow::Return(value) = self.execute(body, &frame)? {
            return Ok(Flow::Return(value));
          }
          self.assign(increment, &frame)?;
        }
      }
      Statement::Write(expressions) => {
        let mut line = String::new();
        for expression in expressions {
          line.push_str(&self.evaluate(expression, env)?.to_string());
        }
        trace!("escreva {:?}", line);
        writeln!(self.output, "{}", line)?;
      }
      Statement::Read(name) => {
        let value = self.read_line()?;
        env.borrow_mut().assign(name, value)?;
      }
      Statement::Return(value) => {
        let value = match value {
          Some(expression) => self.evaluate(expression, env)?,
          None => Object::Null,
        };
        return Ok(Flow::Return(value));
      }
      Statement::Block(statements) => return self.execute_block(statements, env),
      Statement::Call(call) => {
        self.call(call, env)?;
      }
    }

    Ok(Flow::Normal)
  }

  fn declare(&mut self, declaration: &VariableDeclaration, env: &Rc<RefCell<Env>>) -> Result<()> {
    let value = match &declaration.initializer {
      Some(initializer) => self.evaluate(initializer, env)?,
      None => Object::Null,
    };

    env.borrow_mut().define(&declaration.name, value);
    Ok(())
  }

  fn assign(&mut self, assignment: &Assignment, env: &Rc<RefCell<Env>>) -> Result<()> {
    let value = self.evaluate(&assignment.value, env)?;
    env.borrow_mut().assign(&assignment.name, value)
  }

  fn condition(&mut self, condition: &Expression, env: &Rc<RefCell<Env>>) -> Result<bool> {
    match self.evaluate(condition, env)? {
      Object::Boolean(value) => Ok(value),
      other => Err(Error::type_mismatch(format!(
        "condição deve ser logico, encontrado {}",
        other.type_name()
      ))),
    }
  }

  fn read_line(&mut self) -> Result<Object> {
    let mut line = String::new();

    if self.input.read_line(&mut line)? == 0 {
      return Err(Error::InputExhausted);
    }

    let line = line.strip_suffix('\n').unwrap_or(&line);
    let line = line.strip_suffix('\r').unwrap_or(line);

    Ok(Object::from_input(line))
  }

  pub fn evaluate(&mut self, expression: &Expression, env: &Rc<RefCell<Env>>) -> Result<Object> {
    match expression {
      Expression::Literal(literal) => Ok(match literal {
        Literal::Integer(value) => Object::Integer(*value),
        Literal::Real(value) => Object::Real(*value),
        Literal::Text(value) => Object::Text(value.clone()),
        Literal::Boolean(value) => Object::Boolean(*value),
      }),
      Expression::Variable(name) => env.borrow().get(name),
      Expression::Unary { operator, operand } => {
        let operand = self.evaluate(operand, env)?;
        Self::eval_unary_expression(*operator, operand)
      }
      Expression::Binary { left, operator: BinaryOperator::And, right } => {
        self.eval_logical_expression(left, BinaryOperator::And, right, env)
      }
      Expression::Binary { left, operator: BinaryOperator::Or, right } => {
        self.eval_logical_expression(left, BinaryOperator::Or, right, env)
      }
      Expression::Binary { left, operator, right } => {
        let left = self.evaluate(left, env)?;
        let right = self.evaluate(right, env)?;
        Self::eval_binary_expression(left, *operator, right)
      }
      Expression::FunctionCall(call) => self.call(call, env),
    }
  }

  fn logical_operand(operator: BinaryOperator, value: Object) -> Result<bool> {
    match value {
      Object::Boolean(value) => Ok(value),
      other => Err(Error::type_mismatch(format!(
        "operador '{}' exige operandos logico, encontrado {}",
        operator,
        other.type_name()
      ))),
    }
  }

  fn eval_logical_expression(
    &mut self,
    left: &Expression,
    operator: BinaryOperator,
    right: &Expression,
    env: &Rc<RefCell<Env>>,
  ) -> Result<Object> {
    let left = Self::logical_operand(operator, self.evaluate(left, env)?)?;

    let short_circuit = match operator {
      BinaryOperator::And => !left,
      _ => left,
    };
    if short_circuit {
      return Ok(Object::Boolean(left));
    }

    let right = Self::logical_operand(operator, self.evaluate(right, env)?)?;
    Ok(Object::Boolean(right))
  }

  fn eval_unary_expression(operator: UnaryOperator, operand: Object) -> Result<Object> {
    match (operator, operand) {
      (UnaryOperator::Negate, Object::Integer(value)) => value
        .checked_neg()
        .map(Object::Integer)
        .ok_or_else(|| Error::IntegerOverflow(format!("-{}", value))),
      (UnaryOperator::Negate, Object::Real(value)) => Ok(Object::Real(-value)),
      (UnaryOperator::Identity, value @ (Object::Integer(_) | Object::Real(_))) => Ok(value),
      (UnaryOperator::Not, Object::Boolean(value)) => Ok(Object::Boolean(!value)),
      (operator, operand) => Err(Error::type_mismatch(format!(
        "operador '{}' não se aplica a {}",
        operator,
        operand.type_name()
      ))),
    }
  }

  pub fn eval_binary_expression(left: Object, operator: BinaryOperator, right: Object) -> Result<Object> {
    match operator {
      BinaryOperator::Add
      | BinaryOperator::Subtract
      | BinaryOperator::Multiply
      | BinaryOperator::Divide
      | BinaryOperator::Modulo => Self::eval_arithmetic(left, operator, right),
      BinaryOperator::Equal
      | BinaryOperator::NotEqual
      | BinaryOperator::Less
      | BinaryOperator::LessEqual
      | BinaryOperator::Greater
      | BinaryOperator::GreaterEqual => Self::eval_comparison(left, operator, right),
      BinaryOperator::And | BinaryOperator::Or => Err(Error::UnknownOperator(format!(
        "'{}' sem curto-circuito",
        operator
      ))),
    }
  }

  fn mismatch(left: &Object, operator: BinaryOperator, right: &Object) -> Error {
    Error::type_mismatch(format!(
      "{} {} {}",
      left.type_name(),
      operator,
      right.type_name()
    ))
  }

  fn eval_arithmetic(left: Object, operator: BinaryOperator, right: Object) -> Result<Object> {
    match (left, right) {
      (Object::Integer(left), Object::Integer(right)) => Self::eval_integer(left, operator, right),
      (left @ (Object::Integer(_) | Object::Real(_)), right @ (Object::Integer(_) | Object::Real(_))) => {
        Self::eval_real(as_real(&left), operator, as_real(&right))
      }
      (Object::Text(left), Object::Text(right)) if operator == BinaryOperator::Add => {
        Ok(Object::Text(left + &right))
      }
      // Text on the left absorbs a number on the right, for building messages with `+`.
      (Object::Text(left), right) if right.is_numeric() && operator == BinaryOperator::Add => {
        Ok(Object::Text(left + &right.to_string()))
      }
      (left, right) => Err(Self::mismatch(&left, operator, &right)),
    }
  }

  fn eval_integer(left: i64, operator: BinaryOperator, right: i64) -> Result<Object> {
    let overflow = || Error::IntegerOverflow(format!("{} {} {}", left, operator, right));

    let value = match operator {
      BinaryOperator::Add => left.checked_add(right).ok_or_else(overflow)?,
      BinaryOperator::Subtract => left.checked_sub(right).ok_or_else(overflow)?,
      BinaryOperator::Multiply => left.checked_mul(right).ok_or_else(overflow)?,
      BinaryOperator::Divide => {
        if right == 0 {
          return Err(Error::DivisionByZero);
        }
        return Ok(Object::Real(left as f64 / right as f64));
      }
      BinaryOperator::Modulo => {
        if right == 0 {
          return Err(Error::ModuloByZero);
        }
        // Result takes the divisor's sign. `MIN % -1` is 0, not an overflow.
        let remainder = left.wrapping_rem(right);
        if remainder != 0 && (remainder < 0) != (right < 0) {
          remainder + right
        } else {
          remainder
        }
      }
      _ => return Err(Error::UnknownOperator(operator.to_string())),
    };

    Ok(Object::Integer(value))
  }

  fn eval_real(left: f64, operator: BinaryOperator, right: f64) -> Result<Object> {
    let value = match operator {
      BinaryOperator::Add => left + right,
      BinaryOperator::Subtract => left - right,
      BinaryOperator::Multiply => left * right,
      BinaryOperator::Divide => {
        if right == 0.0 {
          return Err(Error::DivisionByZero);
        }
        left / right
      }
      BinaryOperator::Modulo => {
        if right == 0.0 {
          return Err(Error::ModuloByZero);
        }
        let remainder = left % right;
        if remainder != 0.0 && (remainder < 0.0) != (right < 0.0) {
          remainder + right
        } else {
          remainder
        }
      }
      _ => return Err(Error::UnknownOperator(operator.to_string())),
    };

    Ok(Object::Real(value))
  }

  fn eval_comparison(left: Object, operator: BinaryOperator, right: Object) -> Result<Object> {
    let ordering = match (&left, &right) {
      (Object::Integer(a), Object::Integer(b)) => Some(a.cmp(b)),
      (Object::Integer(_) | Object::Real(_), Object::Integer(_) | Object::Real(_)) => {
        as_real(&left).partial_cmp(&as_real(&right))
      }
      (Object::Text(a), Object::Text(b)) => Some(a.cmp(b)),
      (Object::Boolean(a), Object::Boolean(b)) => Some(a.cmp(b)),
      _ => return Err(Self::mismatch(&left, operator, &right)),
    };

    let value = match operator {
      BinaryOperator::Equal => ordering == Some(Ordering::Equal),
      BinaryOperator::NotEqual => ordering != Some(Ordering::Equal),
      BinaryOperator::Less => ordering == Some(Ordering::Less),
      BinaryOperator::LessEqual => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
      BinaryOperator::Greater => ordering == Some(Ordering::Greater),
      BinaryOperator::GreaterEqual => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
      _ => return Err(Error::UnknownOperator(operator.to_string())),
    };

    Ok(Object::Boolean(value))
  }

  fn call(&mut self, call: &Call, env: &Rc<RefCell<Env>>) -> Result<Object> {
    let function = match env.borrow().get(&call.name)? {
      Object::Function(function) => function,
      _ => return Err(Error::NotCallable(call.name.clone())),
    };

    if call.arguments.len() != function.arity() {
      return Err(Error::ArgumentCountMismatch {
        name: call.name.clone(),
        expected: function.arity(),
        found: call.arguments.len(),
      });
    }

    let arguments = call
      .arguments
      .iter()
      .map(|argument| self.evaluate(argument, env))
      .collect::<Result<Vec<_>>>()?;

    if self.depth >= self.max_depth {
      return Err(Error::RecursionLimit(self.max_depth));
    }

    debug!("call {}({} args) at depth {}", function.name(), arguments.len(), self.depth);

    let frame = Env::enclosed(&function.closure);
    for (parameter, argument) in function.declaration.parameters.iter().zip(arguments) {
      frame.borrow_mut().define(&parameter.name, argument);
    }

    self.depth += 1;
    let flow = stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || {
      self.execute_block(&function.declaration.body, &frame)
    });
    self.depth -= 1;

    match flow? {
      Flow::Return(value) => Ok(value),
      Flow::Normal => Ok(Object::Null),
    }
  }
}

fn as_real(object: &Object) -> f64 {
  match object {
    Object::Integer(value) => *value as f64,
    Object::Real(value) => *value,
    _ => f64::NAN,
  }
}
