use std::rc::Rc;

use regex::Regex;

use crate::{
    common::{source::Source, span::Span},
    compiler::syntax::Syntax,
};

/// How a pattern is matched against the remaining source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mode {
    /// The match may start anywhere after the cursor,
    /// instead of exactly at it.
    pub ahead: bool,
    /// Return (and move to) the start of the match instead of its end.
    pub exclude_end: bool,
    /// Leave the cursor where it is.
    pub keep: bool,
}

impl Mode {
    pub const ANCHORED: Mode = Mode {
        ahead: false,
        exclude_end: false,
        keep: false,
    };
    pub const UNTIL: Mode = Mode {
        ahead: true,
        exclude_end: false,
        keep: false,
    };
    pub const TO: Mode = Mode {
        ahead: true,
        exclude_end: true,
        keep: false,
    };
    pub const CHECK: Mode = Mode {
        ahead: false,
        exclude_end: false,
        keep: true,
    };
}

/// A cursor over an immutable source.
/// The scanner knows nothing about the template grammar:
/// it matches patterns, peeks, and moves forward.
/// Every operation returns `None` once the cursor reached the end.
#[derive(Debug)]
pub struct Scanner {
    source: Rc<Source>,
    index: usize,
}

impl Scanner {
    pub fn new(source: Rc<Source>) -> Scanner { Scanner { source, index: 0 } }

    pub fn source(&self) -> &Rc<Source> { &self.source }

    /// The byte offset of the cursor.
    pub fn index(&self) -> usize { self.index }

    pub fn has_terminated(&self) -> bool {
        self.index >= self.source.contents.len()
    }

    /// Returns all characters after the cursor.
    fn remaining(&self) -> &str { &self.source.contents[self.index..] }

    /// Advances the cursor by `n` characters, stopping at the end.
    pub fn consume(&mut self, n: usize) {
        let skipped: usize =
            self.remaining().chars().take(n).map(char::len_utf8).sum();
        self.index += skipped;
    }

    /// Returns the character under the cursor and moves past it.
    pub fn scan_char(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += c.len_utf8();
        Some(c)
    }

    /// Matches `re` against the remaining source according to `mode`.
    /// Returns the text between the cursor and the end (or start) of the
    /// match, moving the cursor there unless the mode keeps it.
    pub fn scan_with(&mut self, re: &Regex, mode: Mode) -> Option<String> {
        let (value, index) = self.probe(re, mode)?;
        if !mode.keep {
            self.index = index;
        }
        Some(value)
    }

    fn probe(&self, re: &Regex, mode: Mode) -> Option<(String, usize)> {
        if self.has_terminated() {
            return None;
        }

        let found = re.find_at(&self.source.contents, self.index)?;
        if found.start() != self.index && !mode.ahead {
            return None;
        }

        let end = if mode.exclude_end {
            found.start()
        } else {
            found.end()
        };
        Some((self.source.contents[self.index..end].to_string(), end))
    }

    /// Like `scan_with`, but a failed match is a syntax error at the
    /// cursor.
    pub fn require(
        &mut self,
        re: &Regex,
        mode: Mode,
        reason: &str,
    ) -> Result<String, Syntax> {
        self.scan_with(re, mode).ok_or_else(|| self.error(reason))
    }

    /// Matches `re` exactly at the cursor.
    pub fn scan(&mut self, re: &Regex) -> Option<String> {
        self.scan_with(re, Mode::ANCHORED)
    }

    /// Searches ahead for `re`, returning everything through the match.
    pub fn scan_until(&mut self, re: &Regex) -> Option<String> {
        self.scan_with(re, Mode::UNTIL)
    }

    /// Searches ahead for `re`, returning everything before the match.
    /// The cursor lands on the start of the match.
    pub fn scan_to(&mut self, re: &Regex) -> Option<String> {
        self.scan_with(re, Mode::TO)
    }

    /// Matches `re` exactly at the cursor without moving it.
    pub fn check(&self, re: &Regex) -> Option<String> {
        self.probe(re, Mode::CHECK).map(|(value, _)| value)
    }

    /// The character under the cursor.
    pub fn peek(&self) -> Option<char> { self.remaining().chars().next() }

    /// Up to `n` characters from the cursor.
    pub fn peek_str(&self, n: usize) -> Option<&str> {
        if self.has_terminated() {
            return None;
        }
        let remaining = self.remaining();
        let end = remaining
            .char_indices()
            .nth(n)
            .map(|(i, _)| i)
            .unwrap_or(remaining.len());
        Some(&remaining[..end])
    }

    /// The character `n` places after the cursor.
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining().chars().nth(n)
    }

    /// Consumes and returns everything that is left.
    pub fn scan_rest(&mut self) -> String {
        let rest = self.remaining().to_string();
        self.index = self.source.contents.len();
        rest
    }

    /// A syntax error pointing at the cursor.
    pub fn error(&self, reason: &str) -> Syntax {
        Syntax::error(reason, &Span::point(&self.source, self.index))
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    fn scanner(source: &str) -> Scanner { Scanner::new(Source::source(source)) }

    fn re(pattern: &str) -> Regex { Regex::new(pattern).unwrap() }

    #[test]
    fn scan_returns_the_matched_text() {
        let mut scanner = scanner("foobar");
        assert_eq!(scanner.scan(&re("foo")).as_deref(), Some("foo"));
    }

    #[test]
    fn scan_is_anchored() {
        let mut scanner = scanner("foobar");
        assert_eq!(scanner.scan(&re("bar")), None);
        assert_eq!(scanner.index(), 0);
    }

    #[test]
    fn scan_resumes_after_the_last_match() {
        let mut scanner = scanner("foobar");
        assert_eq!(scanner.scan(&re("foo")).as_deref(), Some("foo"));
        assert_eq!(scanner.scan(&re("bar")).as_deref(), Some("bar"));
        assert_eq!(scanner.scan(&re("baz")), None);
    }

    #[test]
    fn scan_until_includes_the_match() {
        let mut scanner = scanner("foobar");
        assert_eq!(scanner.scan_until(&re("bar")).as_deref(), Some("foobar"));
        assert!(scanner.has_terminated());
        assert_eq!(scanner.scan_until(&re("baz")), None);
    }

    #[test]
    fn scan_to_excludes_the_match() {
        let mut scanner = scanner("foobar");
        assert_eq!(scanner.scan_to(&re("bar")).as_deref(), Some("foo"));
        assert_eq!(scanner.index(), 3);
        assert_eq!(scanner.scan_to(&re("baz")), None);
    }

    #[test]
    fn require_fails_with_the_reason() {
        let mut scanner = scanner("foobar");
        assert_eq!(scanner.require(&re("o"), Mode::TO, "expected o").unwrap(), "f");
        let error = scanner.require(&re("z"), Mode::TO, "expected z").unwrap_err();
        assert_eq!(error.reason, "expected z");
        assert_eq!(error.notes[0].span.offset(), 1);
    }

    #[test]
    fn check_does_not_advance() {
        let scanner = scanner("foobar");
        assert_eq!(scanner.check(&re("foo")).as_deref(), Some("foo"));
        assert_eq!(scanner.index(), 0);
        assert_eq!(scanner.check(&re("bar")), None);
    }

    #[test]
    fn peek() {
        let mut scanner = scanner("foobar");
        assert_eq!(scanner.peek(), Some('f'));
        assert_eq!(scanner.peek_str(3), Some("foo"));
        assert_eq!(scanner.peek_str(10), Some("foobar"));
        assert_eq!(scanner.peek_nth(1), Some('o'));
        assert_eq!(scanner.index(), 0);

        scanner.consume(6);
        assert_eq!(scanner.peek(), None);
        assert_eq!(scanner.peek_str(2), None);
    }

    #[test]
    fn has_terminated() {
        let mut scanner = scanner("foobar");
        assert!(!scanner.has_terminated());
        scanner.scan(&re("foo"));
        assert!(!scanner.has_terminated());
        scanner.scan(&re("bar"));
        assert!(scanner.has_terminated());
    }

    #[test]
    fn consume_is_clamped_and_counts_characters() {
        let mut scanner = scanner("héllo");
        scanner.consume(2);
        assert_eq!(scanner.peek(), Some('l'));
        scanner.consume(100);
        assert!(scanner.has_terminated());
        assert_eq!(scanner.scan_char(), None);
    }

    #[test]
    fn empty_matches_are_not_failures() {
        let mut scanner = scanner("foo");
        assert_eq!(scanner.scan(&re(r"(\s*\n)?")).as_deref(), Some(""));
        assert_eq!(scanner.index(), 0);
    }

    proptest! {
        #[test]
        fn cursor_stays_in_bounds(s in "\\PC*", steps in proptest::collection::vec(0usize..4, 0..16)) {
            let mut scanner = scanner(&s);
            let word = re(r"\w+");
            let space = re(r"\s");
            for step in steps {
                match step {
                    0 => { scanner.scan_char(); },
                    1 => { scanner.scan(&word); },
                    2 => { scanner.scan_to(&space); },
                    _ => { scanner.consume(2); },
                }
                prop_assert!(scanner.index() <= s.len());
                prop_assert!(s.is_char_boundary(scanner.index()));
            }
        }
    }
}
