use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to one scope.  Closures keep their defining scope alive
/// through this; parents never point down at children.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn enclosing(&self) -> Option<EnvRef> {
        self.enclosing.clone()
    }

    /// Bind `name` in this scope, replacing any previous binding here.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Read `name` directly from this scope only.
    pub fn get_here(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}

/// Walk exactly `distance` enclosing links up from `env`.
pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
    let mut current: EnvRef = Rc::clone(env);

    for _ in 0..distance {
        let next: EnvRef = current.borrow().enclosing()?;
        current = next;
    }

    Some(current)
}

/// Read a binding the resolver located `distance` scopes out.
pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Option<Value> {
    debug!("get_at distance={} name={}", distance, name);

    ancestor(env, distance)?.borrow().get_here(name)
}

/// Overwrite a binding the resolver located `distance` scopes out.
pub fn assign_at(env: &EnvRef, distance: usize, name: &str, value: Value) -> bool {
    debug!("assign_at distance={} name={}", distance, name);

    match ancestor(env, distance) {
        Some(scope) => {
            let mut scope = scope.borrow_mut();

            if scope.values.contains_key(name) {
                scope.define(name, value);
                true
            } else {
                false
            }
        }
        None => false,
    }
}
