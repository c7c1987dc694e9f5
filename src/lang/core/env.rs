//! Typed environments for the core language.
//!
//! An environment pairs an insertion-ordered sequence of typed local
//! bindings with a registry of global definitions. Environments are
//! persistent: extension returns a new environment and never mutates the
//! caller's, which is what lets closures capture their defining scope as a
//! cheap snapshot.

use std::sync::Arc;

use crate::lang::core::semantics::{Neutral, Value};
use crate::lang::core::{prim, Definition, LocalVar};

/// A value paired with its type.
#[derive(Debug, Clone)]
pub struct Typed {
    pub value: Arc<Value>,
    pub r#type: Arc<Value>,
}

impl Typed {
    pub fn new(value: Arc<Value>, r#type: Arc<Value>) -> Typed {
        Typed { value, r#type }
    }
}

/// The ambient environment of evaluation and inference.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Local bindings, in binding order. Lookup scans from the most recent
    /// binding, so shadowing is positional.
    locals: im::Vector<(LocalVar, Typed)>,
    /// Global definitions, registered by the elaborator before the core
    /// runs and read-only during evaluation.
    definitions: im::HashMap<String, Arc<Definition>>,
    /// The definition whose body is currently being evaluated, if any.
    /// Self-calls freeze to neutral invocations while this is set.
    current_definition: Option<String>,
}

impl Environment {
    /// An environment with no locals and no definitions.
    pub fn new() -> Environment {
        Environment {
            locals: im::Vector::new(),
            definitions: im::HashMap::new(),
            current_definition: None,
        }
    }

    /// Look up a local binding by variable identity.
    pub fn lookup_local(&self, var: &LocalVar) -> Option<&Typed> {
        self.locals
            .iter()
            .rev()
            .find(|(bound, _)| bound == var)
            .map(|(_, typed)| typed)
    }

    /// Search for a binding whose *value* is the given neutral variable and
    /// return its type. Pattern binders are bound this way while clause
    /// bodies are residualized.
    pub fn lookup_neutral_type(&self, var: &LocalVar) -> Option<&Typed> {
        self.locals.iter().rev().find_map(|(_, typed)| {
            match typed.value.as_ref() {
                Value::Neutral(Neutral::Var(bound)) if bound == var => Some(typed),
                _ => None,
            }
        })
    }

    /// Extend with a local binding for the duration of some lexical scope.
    pub fn with_local(&self, var: LocalVar, typed: Typed) -> Environment {
        let mut locals = self.locals.clone();
        locals.push_back((var, typed));
        Environment {
            locals,
            definitions: self.definitions.clone(),
            current_definition: self.current_definition.clone(),
        }
    }

    /// Register a global definition.
    pub fn define(&self, definition: Definition) -> Environment {
        Environment {
            locals: self.locals.clone(),
            definitions: self
                .definitions
                .update(definition.name().to_owned(), Arc::new(definition)),
            current_definition: self.current_definition.clone(),
        }
    }

    /// Look up a global definition by name.
    pub fn definition(&self, name: &str) -> Option<&Arc<Definition>> {
        self.definitions.get(name)
    }

    /// Mark a definition as currently being evaluated.
    pub fn with_current_definition(&self, name: impl Into<String>) -> Environment {
        Environment {
            locals: self.locals.clone(),
            definitions: self.definitions.clone(),
            current_definition: Some(name.into()),
        }
    }

    /// Clear the current-definition marker.
    pub fn without_current_definition(&self) -> Environment {
        Environment {
            locals: self.locals.clone(),
            definitions: self.definitions.clone(),
            current_definition: None,
        }
    }

    pub fn current_definition(&self) -> Option<&str> {
        self.current_definition.as_deref()
    }
}

impl Default for Environment {
    /// An environment preloaded with the native prelude.
    fn default() -> Environment {
        let mut env = Environment::new();
        for definition in prim::default_definitions() {
            env = env.define(definition);
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_shadowing() {
        let x = LocalVar::fresh("x");
        let universe = Arc::new(Value::Universe);

        let first = Typed::new(
            Arc::new(Value::Neutral(Neutral::Var(x.clone()))),
            universe.clone(),
        );
        let second = Typed::new(Arc::new(Value::Universe), universe.clone());

        let env = Environment::new()
            .with_local(x.clone(), first)
            .with_local(x.clone(), second);

        match env.lookup_local(&x).unwrap().value.as_ref() {
            Value::Universe => {}
            value => panic!("expected the most recent binding, found {:?}", value),
        }
    }

    #[test]
    fn extension_does_not_leak() {
        let x = LocalVar::fresh("x");
        let env = Environment::new();
        let _extended = env.with_local(
            x.clone(),
            Typed::new(Arc::new(Value::Universe), Arc::new(Value::Universe)),
        );

        assert!(env.lookup_local(&x).is_none());
    }
}
