use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};

use crate::common::data::Data;

#[derive(Clone)]
struct Binding {
    value: Data,
    constant: bool,
}

/// What happened when assigning to a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assigned {
    Done,
    /// The name is bound by a `const`; nothing was changed.
    Constant,
    /// The name is bound nowhere in this scope chain.
    Unbound,
}

/// One level of lexical scope: a function body or a block.
/// Scopes are shared, as closures keep the scope they were declared in.
#[derive(Default)]
pub struct Scope {
    bindings: RefCell<HashMap<String, Binding>>,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    pub fn root() -> Rc<Scope> { Rc::new(Scope::default()) }

    pub fn child(parent: &Rc<Scope>) -> Rc<Scope> {
        Rc::new(Scope {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// Binds a name in this scope, shadowing outer bindings.
    pub fn declare(&self, name: &str, value: Data, constant: bool) {
        self.bindings
            .borrow_mut()
            .insert(name.to_string(), Binding { value, constant });
    }

    /// Binds a name to `undefined` unless this scope already binds it.
    /// Used for hoisted `var`s, which may be declared more than once.
    pub fn hoist(&self, name: &str) {
        self.bindings
            .borrow_mut()
            .entry(name.to_string())
            .or_insert(Binding {
                value: Data::Undefined,
                constant: false,
            });
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    /// Looks a name up through this scope and its ancestors.
    pub fn lookup(&self, name: &str) -> Option<Data> {
        if let Some(binding) = self.bindings.borrow().get(name) {
            return Some(binding.value.clone());
        }
        self.parent.as_ref()?.lookup(name)
    }

    /// Rebinds the innermost binding of a name.
    pub fn assign(&self, name: &str, value: Data) -> Assigned {
        if let Some(binding) = self.bindings.borrow_mut().get_mut(name) {
            if binding.constant {
                return Assigned::Constant;
            }
            binding.value = value;
            return Assigned::Done;
        }

        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => Assigned::Unbound,
        }
    }

    /// The outermost scope of this chain.
    pub fn root_of(self: &Rc<Scope>) -> Rc<Scope> {
        let mut scope = Rc::clone(self);
        while let Some(parent) = scope.parent.clone() {
            scope = parent;
        }
        scope
    }

    /// Drops every binding, breaking reference cycles between closures
    /// and the scopes they were declared in.
    pub fn clear(&self) { self.bindings.borrow_mut().clear(); }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> =
            self.bindings.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("Scope")
            .field("names", &names)
            .field("parent", &self.parent)
            .finish()
    }
}
