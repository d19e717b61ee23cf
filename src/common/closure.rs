use std::rc::Rc;

use crate::{
    common::data::Data,
    construct::tree::Function,
    vm::scope::Scope,
};

/// Wraps a `Function` with the scope it was declared in,
/// so that names it closes over outlive the block that declared them.
#[derive(Debug)]
pub struct Closure {
    pub function: Rc<Function>,
    pub scope: Rc<Scope>,
}

impl Closure {
    pub fn wrap(function: Rc<Function>, scope: Rc<Scope>) -> Closure {
        Closure { function, scope }
    }

    pub fn name(&self) -> &str {
        self.function.name.as_deref().unwrap_or("anonymous")
    }
}

/// The signature of a builtin function.
/// Builtins receive the value they were called on (`undefined` for plain
/// calls) and their arguments by value, and report failures as plain
/// messages; the VM attaches the location of the call.
pub type NativeFn = fn(Data, Vec<Data>) -> Result<Data, String>;

/// A builtin function exposed to template code.
#[derive(Clone, Copy)]
pub struct Native {
    pub name: &'static str,
    pub fun: NativeFn,
}

impl Native {
    pub fn new(name: &'static str, fun: NativeFn) -> Native {
        Native { name, fun }
    }

    pub fn call(&self, this: Data, args: Vec<Data>) -> Result<Data, String> {
        (self.fun)(this, args)
    }
}
