use std::fmt::{self, Display, Formatter};

use crate::{
    compiler::{gen::Compiler, syntax::Syntax},
    config::Config,
    vm::Renderer,
};

/// One typed fragment of a template, in source order.
#[derive(Debug, Clone, PartialEq, Eq, proptest_derive::Arbitrary)]
pub enum Part {
    /// Literal output text.
    Content(String),
    /// A statement fragment, spliced verbatim into the renderer.
    Code(String),
    /// A value whose escaped form is written to the output.
    Expression(String),
    /// Ignored.
    Comment(String),
}

impl Part {
    pub fn value(&self) -> &str {
        match self {
            Part::Content(v)
            | Part::Code(v)
            | Part::Expression(v)
            | Part::Comment(v) => v,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Part::Content(_) => "content",
            Part::Code(_) => "code",
            Part::Expression(_) => "expression",
            Part::Comment(_) => "comment",
        }
    }
}

impl Display for Part {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.kind(), self.value())
    }
}

/// The parsed form of a template: an ordered, append-only list of parts.
///
/// Appending keeps two invariants. Consecutive content merges, as does
/// consecutive code, while every expression and comment is its own part.
/// And whenever anything other than content is appended, trailing
/// indentation on the content before it is trimmed back to its newline,
/// so the whitespace used to lay out the template source does not leak
/// into the output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    parts: Vec<Part>,
}

impl Template {
    pub fn new() -> Template { Template { parts: vec![] } }

    pub fn parts(&self) -> &[Part] { &self.parts }

    pub fn into_parts(self) -> Vec<Part> { self.parts }

    pub fn last(&self) -> Option<&Part> { self.parts.last() }

    /// Appends a part, dispatching on its kind.
    pub fn add(&mut self, part: Part) {
        match part {
            Part::Content(c) => self.add_content(&c),
            Part::Code(c) => self.add_code(&c),
            Part::Expression(e) => self.add_expression(&e),
            Part::Comment(c) => self.add_comment(&c),
        }
    }

    pub fn add_content(&mut self, content: &str) {
        if content.is_empty() {
            return;
        }
        match self.parts.last_mut() {
            Some(Part::Content(last)) => last.push_str(content),
            _ => self.parts.push(Part::Content(content.to_string())),
        }
    }

    pub fn add_code(&mut self, code: &str) {
        if code.is_empty() {
            return;
        }
        self.trim_last_content();
        match self.parts.last_mut() {
            Some(Part::Code(last)) => last.push_str(code),
            _ => self.parts.push(Part::Code(code.to_string())),
        }
    }

    pub fn add_expression(&mut self, expression: &str) {
        if expression.is_empty() {
            return;
        }
        self.trim_last_content();
        self.parts.push(Part::Expression(expression.to_string()));
    }

    pub fn add_comment(&mut self, comment: &str) {
        if comment.is_empty() {
            return;
        }
        self.trim_last_content();
        self.parts.push(Part::Comment(comment.to_string()));
    }

    /// Cuts trailing whitespace on the last content part back to the first
    /// newline it contains, if anything follows that newline.
    fn trim_last_content(&mut self) {
        if let Some(Part::Content(last)) = self.parts.last_mut() {
            let text_end = last.trim_end().len();
            if let Some(newline) = last[text_end..].find('\n') {
                let cut = text_end + newline + 1;
                if cut < last.len() {
                    last.truncate(cut);
                }
            }
        }
    }

    /// Compiles this template into a renderer with the default
    /// configuration.
    pub fn compile(&self) -> Result<Renderer, Syntax> {
        self.compile_with(&Config::default())
    }

    pub fn compile_with(&self, config: &Config) -> Result<Renderer, Syntax> {
        Compiler::compile(self, config)
    }
}
