use std::{
    fmt::{self, Debug, Display, Formatter},
    rc::Rc,
};

use crate::common::source::Source;

/// A `Span` refers to a section of a source,
/// much like a `&str`, but with a reference to a `Source` rather than a
/// `String`. A `Span` is meant to be paired with other datastructures,
/// to be used during error reporting.
#[derive(Clone, Eq, PartialEq)]
pub struct Span {
    source: Rc<Source>,
    offset: usize,
    length: usize,
}

impl Span {
    /// Create a new `Span` from an offset with a length.
    /// All `Span`s have access to the `Source` from whence they came,
    /// So they can't be misinterpreted or miscombined.
    pub fn new(source: &Rc<Source>, offset: usize, length: usize) -> Span {
        Span {
            source: Rc::clone(source),
            offset,
            length,
        }
    }

    /// A `Span` that points at a specific point in the source.
    /// Has a length of `0`.
    pub fn point(source: &Rc<Source>, offset: usize) -> Span {
        Span::new(source, offset, 0)
    }

    pub fn offset(&self) -> usize { self.offset }

    /// Return the index of the end of the `Span`.
    pub fn end(&self) -> usize { self.offset + self.length }

    pub fn len(&self) -> usize { self.length }

    pub fn is_empty(&self) -> bool { self.length == 0 }

    pub fn source(&self) -> &Rc<Source> { &self.source }

    /// Creates a new `Span` which spans the space of the previous two.
    /// ```plain
    /// hello this is cool
    /// ^^^^^              | Span a
    ///            ^^      | Span b
    /// ^^^^^^^^^^^^^      | combined
    /// ```
    pub fn combine(a: &Span, b: &Span) -> Span {
        if a.source != b.source {
            panic!("Can't combine two Spans with separate sources");
        }

        let offset = a.offset.min(b.offset);
        let end = a.end().max(b.end());
        Span::new(&a.source, offset, end - offset)
    }

    /// Returns the contents of a `Span`.
    /// This indexes into the source file,
    /// so if the `Span` is along an invalid byte boundary the program will
    /// panic.
    pub fn contents(&self) -> String {
        self.source.contents[self.offset..self.end()].to_string()
    }

    pub fn lines(&self) -> Vec<String> {
        let start_line = self.line(self.offset);
        let end_line = self.line(self.end());
        self.source
            .contents
            .split('\n')
            .skip(start_line)
            .take(end_line - start_line + 1)
            .map(|s| s.to_string())
            .collect()
    }

    pub fn path(&self) -> String {
        self.source.path.to_string_lossy().to_string()
    }

    /// The zero-based line `index` falls on.
    pub fn line(&self, index: usize) -> usize {
        self.source.contents[..index].matches('\n').count()
    }

    /// The zero-based column (in characters) of `index` on its line.
    pub fn col(&self, index: usize) -> usize {
        let before = &self.source.contents[..index];
        match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count(),
            None => before.chars().count(),
        }
    }

    pub fn format(&self) -> FormattedSpan {
        FormattedSpan {
            path: self.path(),
            start: self.line(self.offset),
            lines: self.lines(),
            start_col: self.col(self.offset),
            end_col: self.col(self.end()),
        }
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("contents", &self.contents())
            .field("start", &self.offset)
            .field("end", &self.end())
            .finish()
    }
}

impl Display for Span {
    /// Given a `Span`, `fmt` will print out where the `Span` occurs in its
    /// source. Single-line `Span`s:
    /// ```plain
    /// 12 | <li>@item.name(</li>
    ///    |     ^^^^^^^^^^^^^^^^
    /// ```
    /// Multi-line `Span`s:
    /// ```plain
    /// 12 > @if (ready) {
    /// 13 >     <p>@message</p>
    /// 14 > }
    /// ```
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

/// Represents a formatted span, ready to be displayed.
/// Contains information about where the span is from,
/// and where in the text it starts and ends
/// relative to the lines in the source.
pub struct FormattedSpan {
    pub path: String,
    pub start: usize,
    pub lines: Vec<String>,
    pub start_col: usize,
    pub end_col: usize,
}

impl FormattedSpan {
    pub fn is_multiline(&self) -> bool { self.lines.len() != 1 }

    pub fn gutter_padding(&self) -> usize {
        (self.start + self.lines.len()).to_string().len()
    }

    /// If a single line span, returns the number of carrots between cols.
    pub fn carrots(&self) -> Option<usize> {
        if self.lines.len() == 1 {
            Some(self.end_col.saturating_sub(self.start_col).max(1))
        } else {
            None
        }
    }
}

impl Display for FormattedSpan {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "In {}:{}:{}",
            self.path,
            self.start + 1,
            self.start_col + 1
        )?;
        let gutter = " ".repeat(self.gutter_padding());
        writeln!(f, "{} |", gutter)?;

        match self.carrots() {
            Some(carrots) => {
                let line_no = (self.start + 1).to_string();
                let padding = " ".repeat(self.gutter_padding() - line_no.len());
                writeln!(f, "{}{} | {}", line_no, padding, self.lines[0])?;
                writeln!(
                    f,
                    "{} | {}{}",
                    gutter,
                    " ".repeat(self.start_col),
                    "^".repeat(carrots),
                )?;
            },
            None => {
                for (index, line) in self.lines.iter().enumerate() {
                    let line_no = (self.start + index + 1).to_string();
                    let padding =
                        " ".repeat(self.gutter_padding() - line_no.len());
                    writeln!(f, "{}{} > {}", line_no, padding, line)?;
                }
            },
        }

        Ok(())
    }
}

/// A wrapper for spanning types.
/// For example, a token or a statement of the generated script
/// can be spanned to indicate where it was read from (a `Spanned<Token>`).
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub item: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    /// Takes a generic item, and wraps in in a `Span` to make it `Spanned`.
    pub fn new(item: T, span: Span) -> Spanned<T> { Spanned { item, span } }

    /// Joins a slice of spanned items into a single span.
    /// Returns `None` if the slice is empty.
    pub fn build(spanneds: &[Spanned<T>]) -> Option<Span> {
        let first = spanneds.first()?;
        let last = spanneds.last()?;
        Some(Span::combine(&first.span, &last.span))
    }

    /// Applies a function to a `Spanned`'s item.
    pub fn map<B>(self, f: impl FnOnce(T) -> B) -> Spanned<B> {
        Spanned::new(f(self.item), self.span)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn combination() {
        let source = Source::source("heck, that's awesome");
        let a = Span::new(&source, 0, 5);
        let b = Span::new(&source, 11, 2);

        assert_eq!(Span::combine(&a, &b), Span::new(&source, 0, 13));
    }

    #[test]
    fn lines_and_columns() {
        let source = Source::source("<ul>\n  <li>@item</li>\n</ul>");
        let span = Span::new(&source, 11, 5);

        assert_eq!(span.contents(), "@item");
        assert_eq!(span.line(span.offset()), 1);
        assert_eq!(span.col(span.offset()), 6);
        assert_eq!(span.lines(), vec!["  <li>@item</li>".to_string()]);
    }

    #[test]
    fn single_line_format() {
        let source = Source::source("foo @ bar");
        let span = Span::point(&source, 4);

        let target = "In ./template:1:5\n  |\n1 | foo @ bar\n  |     ^\n";
        assert_eq!(format!("{}", span), target);
    }

    #[test]
    fn multiline_format() {
        let source = Source::source("a\nb\nc");
        let span = Span::new(&source, 0, 3);
        let formatted = span.format();

        assert!(formatted.is_multiline());
        assert_eq!(formatted.lines, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn empty() {
        let source = Source::source("");
        let span = Span::point(&source, 0);
        format!("{}", span);
    }
}
