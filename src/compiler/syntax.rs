use std::fmt;

use crate::common::span::Span;

/// Represents a note attached to a Syntax error,
/// i.e. a location in source code with an optional
/// specific hint or tip corresponding this this specific location
#[derive(Debug, PartialEq, Eq)]
pub struct Note {
    pub span: Span,
    pub hint: Option<String>,
}

impl Note {
    pub fn new(span: Span) -> Note { Note { span, hint: None } }

    pub fn new_with_hint(hint: &str, span: &Span) -> Note {
        Note {
            span: span.clone(),
            hint: Some(hint.to_string()),
        }
    }
}

/// Represents a static error found before anything is rendered:
/// malformed template syntax while parsing, or a generated script
/// that does not read while compiling.
/// The `reason` is fixed per failure, so callers can match on it.
#[derive(Debug, PartialEq, Eq)]
pub struct Syntax {
    pub reason: String,
    pub notes: Vec<Note>,
}

impl Syntax {
    /// Creates a new static error with a single note that does not have a
    /// hint.
    pub fn error(reason: &str, span: &Span) -> Syntax {
        Syntax::error_with_note(reason, Note::new(span.clone()))
    }

    /// Creates a new static error with a single note that may or may not
    /// have a hint.
    pub fn error_with_note(reason: &str, note: Note) -> Syntax {
        Syntax {
            reason: reason.to_string(),
            notes: vec![note],
        }
    }

    /// Creates a syntax error without a note. This syntax error will not
    /// contain any location information, so only use it if you plan to add
    /// additional notes with [`Syntax::add_note`] later.
    pub fn error_no_note(reason: &str) -> Syntax {
        Syntax {
            reason: reason.to_string(),
            notes: vec![],
        }
    }

    /// Extend a syntax error by adding another note to the error.
    pub fn add_note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for note in self.notes.iter() {
            let formatted = note.span.format();
            write!(f, "{}", formatted)?;

            if let Some(ref hint) = note.hint {
                let gutter = " ".repeat(formatted.gutter_padding());
                writeln!(f, "{} |- note: {}", gutter, hint)?;
                writeln!(f, "{} |", gutter)?;
            }
        }
        write!(f, "Syntax Error: {}", self.reason)
    }
}

impl std::error::Error for Syntax {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::source::Source;

    #[test]
    fn error() {
        // This is just a demo to check formatting
        let source = Source::source("<p>@if (ready {</p>");
        let error = Syntax::error("expected )", &Span::point(&source, 19));

        let target = r#"In ./template:1:20
  |
1 | <p>@if (ready {</p>
  |                    ^
Syntax Error: expected )"#;

        assert_eq!(format!("{}", error), target);
    }

    #[test]
    fn hint() {
        let source = Source::source("@ foo");
        let error = Syntax::error_with_note(
            "@ cannot be followed by  ",
            Note::new_with_hint("write @@ for a literal @", &Span::new(&source, 0, 1)),
        );

        let formatted = format!("{}", error);
        assert!(formatted.contains("|- note: write @@ for a literal @"));
        assert!(formatted.ends_with("Syntax Error: @ cannot be followed by  "));
    }

    #[test]
    fn no_note() {
        let error = Syntax::error_no_note("expected }");
        assert_eq!(format!("{}", error), "Syntax Error: expected }");
    }
}
