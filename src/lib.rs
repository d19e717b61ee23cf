//! # Pointy
//! A small template engine in the style of Razor: markup with `@`
//! directives, compiled once into a renderer that can be run with any
//! number of data objects.
//!
//! ## Rendering a template
//! ```
//! use serde_json::json;
//!
//! let html = pointy::render(
//!     "<ul>@for (var i = 0; i < items.length; i++) {<li>@items[i]</li>}</ul>",
//!     &json!({ "items": ["<a>", "b"] }),
//! ).unwrap();
//! assert_eq!(html, "<ul><li>&lt;a&gt;</li><li>b</li></ul>");
//! ```
//!
//! Compile once and keep the `Renderer` around to render repeatedly:
//! ```
//! use serde_json::json;
//!
//! let renderer = pointy::compile("Hello, @name!").unwrap();
//! assert_eq!(renderer.render(&json!({ "name": "world" })).unwrap(), "Hello, world!");
//! ```
//!
//! ## Overview of the compilation process
//! A template is a `Source`. The `Parser` splits it into `Part`s: plain
//! content, code, expressions and comments, collected in a `Template`.
//! The `Compiler` lowers those parts into a script that pushes content
//! and escaped expression values onto an output array, which is lexed
//! and read into a tree. The `Renderer` walks that tree on a fresh VM for
//! every render, resolving free names in the data it is given.
//!
//! Errors are reported per stage: a `Syntax` error while parsing or
//! compiling, a `Trace` while rendering.

pub mod common;
pub mod compiler;
pub mod config;
pub mod construct;
pub mod core;
pub mod vm;

use std::fmt;

use serde_json::Value;

pub use crate::{
    common::source::Source,
    compiler::{
        syntax::Syntax,
        template::{Part, Template},
        Parser,
    },
    config::Config,
    vm::{trace::Trace, Renderer},
};

/// An error from any stage of turning a template into output.
#[derive(Debug)]
pub enum Error {
    Parse(Syntax),
    Compile(Syntax),
    Render(Trace),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(syntax) => write!(f, "error parsing template: {}", syntax),
            Error::Compile(syntax) => write!(f, "error compiling template: {}", syntax),
            Error::Render(trace) => write!(f, "error rendering template: {}", trace),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(syntax) | Error::Compile(syntax) => Some(syntax),
            Error::Render(trace) => Some(trace),
        }
    }
}

/// Splits a template into its parts.
pub fn parse(source: &str) -> Result<Template, Syntax> {
    Parser::parse(Source::source(source))
}

/// Parses and compiles a template with the default configuration.
pub fn compile(source: &str) -> Result<Renderer, Error> {
    compile_with(source, &Config::default())
}

pub fn compile_with(source: &str, config: &Config) -> Result<Renderer, Error> {
    let template = Parser::parse_with(Source::source(source), config).map_err(Error::Parse)?;
    template.compile_with(config).map_err(Error::Compile)
}

/// Compiles a template and renders it once.
/// Nothing is cached: use `compile` to render the same template repeatedly.
pub fn render(source: &str, data: &Value) -> Result<String, Error> {
    compile(source)?.render(data).map_err(Error::Render)
}
