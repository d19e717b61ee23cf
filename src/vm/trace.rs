use std::fmt;

use crate::common::span::Span;

/// What went wrong while rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// A name that is bound nowhere.
    Reference,
    /// An operation on a value that doesn't support it.
    Type,
    /// A value outside of what an operation accepts, e.g. the call depth.
    Range,
    /// A value raised by template code with `throw`.
    Thrown,
    /// Input data that could not be serialized.
    Data,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Reference => "Reference Error",
            Kind::Type => "Type Error",
            Kind::Range => "Range Error",
            Kind::Thrown => "Uncaught",
            Kind::Data => "Data Error",
        };
        write!(f, "{}", name)
    }
}

/// Represents a runtime error, i.e. a traceback
#[derive(Debug, PartialEq, Eq)]
pub struct Trace {
    kind: Kind,
    message: String,
    /// The failing expression first, then each enclosing call.
    spans: Vec<Span>,
}

impl Trace {
    pub fn error(kind: Kind, message: &str, spans: Vec<Span>) -> Trace {
        Trace {
            kind,
            message: message.to_string(),
            spans,
        }
    }

    pub fn kind(&self) -> Kind { self.kind }

    pub fn message(&self) -> &str { &self.message }

    pub fn spans(&self) -> &[Span] { &self.spans }

    /// Adds the span of a call the error is unwinding through.
    pub fn add_context(mut self, span: Span) -> Trace {
        self.spans.push(span);
        self
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Traceback, most recent call last:")?;

        for span in self.spans.iter().rev() {
            fmt::Display::fmt(span, f)?;
        }

        write!(f, "Runtime {}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Trace {}
