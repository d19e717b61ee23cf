//! This module contains the runtime: a tree-walking VM for generated
//! scripts, the scopes it binds names in, and the tracebacks it raises.
//! `Renderer` is the entry point; the other modules are public for
//! documentation visibility.

pub mod scope;
pub mod trace;
pub mod vm;

use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    common::{data::Data, source::Source},
    config::Config,
    construct::tree::Program,
    vm::{
        trace::{Kind, Trace},
        vm::VM,
    },
};

/// A compiled template, ready to render any number of times.
///
/// Rendering never mutates the renderer: each call runs on a fresh VM,
/// with its own copy of the input data. A `Renderer` shares its program
/// through `Rc`, so it stays on the thread that compiled it.
#[derive(Debug)]
pub struct Renderer {
    program: Program,
    source: Rc<Source>,
    config: Config,
}

impl Renderer {
    pub fn new(program: Program, source: Rc<Source>, config: Config) -> Renderer {
        Renderer {
            program,
            source,
            config,
        }
    }

    /// The script this template was compiled to.
    pub fn source(&self) -> &str { &self.source.contents }

    /// Renders the template with the fields of `data` in scope.
    /// `Value::Null` renders without data.
    pub fn render(&self, data: &Value) -> Result<String, Trace> {
        let context = Data::from_json(data);
        let mut vm = VM::init(context, &self.config);
        let output = match vm.run(&self.program)? {
            Data::Undefined => String::new(),
            output => output.to_string(),
        };
        debug!(length = output.len(), "rendered template");
        Ok(output)
    }

    /// Renders with any serializable value as data.
    pub fn render_serialize<T: Serialize>(&self, data: &T) -> Result<String, Trace> {
        let value = serde_json::to_value(data)
            .map_err(|e| Trace::error(Kind::Data, &e.to_string(), vec![]))?;
        self.render(&value)
    }
}
