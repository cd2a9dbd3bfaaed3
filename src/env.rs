use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use log::trace;

use crate::error::{Error, Result};
use crate::object::Object;

type Objects = IndexMap<String, Object>;

/// One scope frame: its own bindings plus a link to the enclosing frame.
#[derive(Debug, Default)]
pub struct Env {
  pub objects: Objects,
  pub parent: Option<Rc<RefCell<Env>>>,
}

impl Env {
  pub fn new() -> Self {
    Self {
      objects: IndexMap::new(),
      parent: None,
    }
  }

  pub fn new_with_parent(parent: Rc<RefCell<Env>>) -> Self {
    Self {
      objects: IndexMap::new(),
      parent: Some(parent),
    }
  }

  /// Child frame of `parent`, ready to be threaded through the evaluator.
  pub fn enclosed(parent: &Rc<RefCell<Env>>) -> Rc<RefCell<Env>> {
    Rc::new(RefCell::new(Env::new_with_parent(Rc::clone(parent))))
  }

  /// Binds `name` in this frame, replacing any earlier binding here.
  pub fn define(&mut self, name: &str, value: Object) {
    trace!("define {} = {}", name, value);
    self.objects.insert(name.to_owned(), value);
  }

  pub fn get(&self, name: &str) -> Result<Object> {
    if let Some(object) = self.objects.get(name) {
      return Ok(object.clone());
    }

    match self.parent {
      Some(ref parent) => parent.borrow().get(name),
      None => Err(Error::UndefinedVariable(name.to_owned())),
    }
  }

  /// Overwrites the nearest existing binding; never creates one.
  pub fn assign(&mut self, name: &str, value: Object) -> Result<()> {
    if let Some(slot) = self.objects.get_mut(name) {
      trace!("assign {} = {}", name, value);
      *slot = value;
      return Ok(());
    }

    match self.parent {
      Some(ref parent) => parent.borrow_mut().assign(name, value),
      None => Err(Error::UndefinedVariable(name.to_owned())),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::rc::Rc;

  use super::Env;
  use crate::error::Error;
  use crate::object::Object;

  #[test]
  fn test_define_overwrites_in_same_frame() {
    let mut env = Env::new();
    env.define("a", Object::Integer(1));
    env.define("a", Object::Integer(2));

    assert_eq!(env.get("a").unwrap(), Object::Integer(2));
    assert_eq!(env.objects.len(), 1);
  }

  #[test]
  fn test_lookup_walks_parents() {
    let global = Rc::new(RefCell::new(Env::new()));
    global.borrow_mut().define("a", Object::Integer(1));

    let inner = Env::enclosed(&Env::enclosed(&global));

    assert_eq!(inner.borrow().get("a").unwrap(), Object::Integer(1));
    assert!(matches!(inner.borrow().get("b"), Err(Error::UndefinedVariable(name)) if name == "b"));
  }

  #[test]
  fn test_assign_updates_nearest_binding() {
    let global = Rc::new(RefCell::new(Env::new()));
    global.borrow_mut().define("a", Object::Integer(1));

    let inner = Env::enclosed(&global);
    inner.borrow_mut().assign("a", Object::Integer(5)).unwrap();

    assert_eq!(global.borrow().get("a").unwrap(), Object::Integer(5));
    assert!(inner.borrow().objects.is_empty());
  }

  #[test]
  fn test_shadowing() {
    let global = Rc::new(RefCell::new(Env::new()));
    global.borrow_mut().define("a", Object::Integer(1));

    let inner = Env::enclosed(&global);
    inner.borrow_mut().define("a", Object::Text("dentro".to_owned()));
    inner.borrow_mut().assign("a", Object::Text("mudou".to_owned())).unwrap();

    assert_eq!(inner.borrow().get("a").unwrap(), Object::Text("mudou".to_owned()));
    assert_eq!(global.borrow().get("a").unwrap(), Object::Integer(1));
  }

  #[test]
  fn test_assign_never_creates() {
    let mut env = Env::new();

    assert!(matches!(env.assign("x", Object::Null), Err(Error::UndefinedVariable(_))));
    assert!(env.objects.is_empty());
  }
}
