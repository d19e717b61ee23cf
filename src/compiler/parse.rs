use std::{rc::Rc, sync::LazyLock};

use regex::Regex;
use tracing::debug;

use crate::{
    common::{source::Source, span::Span},
    compiler::{
        scan::{Mode, Scanner},
        syntax::{Note, Syntax},
        template::{Part, Template},
    },
    config::Config,
    construct::token::Delim,
};

/// Identifiers after `@` that start a block instead of an expression.
const KEYWORDS: [&str; 4] = ["if", "for", "while", "function"];

/// Start tags that never get an end tag.
const VOID_TAGS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link",
    "meta", "source", "track", "wbr",
];

const TEXT_TAG: &str = "text";
const TEXT_END: &str = "</text>";

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).unwrap());
    };
}

pattern!(AT, "@");
pattern!(WORD, "[A-Za-z0-9_]+");
pattern!(NON_SPACE, r"\S");
pattern!(SPACE, r"\s+");
pattern!(NEWLINE, r"\n");
pattern!(TRAILING_NEWLINE, r"(\s*\n)?");
pattern!(OPEN_PAREN, r"\(");
pattern!(OPEN_CURLY, r"\{");
pattern!(ELSE, r"\s*else\b");
pattern!(IF, r"if\b");
pattern!(COMMENT_END, r"\*@");
pattern!(CODE_END, r"\{|;|\}");
pattern!(TAG_NAME_END, r"\s|>");
pattern!(TAG_END, ">");
pattern!(START_TAG, "@|>");
pattern!(PARENS, r"\(|\)");
pattern!(CURLIES, r"\{|\}");
pattern!(SQUARES, r"\[|\]");

fn is_word(c: char) -> bool { c.is_ascii_alphanumeric() || c == '_' }

/// The scanner pattern finding the next opening or closing delimiter.
fn group_pattern(delim: Delim) -> &'static Regex {
    match delim {
        Delim::Paren => &PARENS,
        Delim::Curly => &CURLIES,
        Delim::Square => &SQUARES,
    }
}

/// Drops whitespace up to and including its last newline,
/// so markup inside a block keeps its own indentation only.
fn strip_leading_line(whitespace: &str) -> &str {
    match whitespace.rfind('\n') {
        Some(newline) => &whitespace[newline + 1..],
        None => whitespace,
    }
}

/// Recursive-descent parser for templates.
///
/// Walks the source with a `Scanner`, switching between literal
/// content and directives at every `@`, and appends what it finds to a
/// `Template`. The same character means different things depending on
/// where the parser is: a `{` is content at the top level, opens a
/// block after a keyword, and is just code inside a block.
#[derive(Debug)]
pub struct Parser {
    scanner: Scanner,
    template: Template,
    depth: usize,
    max_nesting: usize,
}

impl Parser {
    /// Parses a template with the default configuration.
    pub fn parse(source: Rc<Source>) -> Result<Template, Syntax> {
        Parser::parse_with(source, &Config::default())
    }

    pub fn parse_with(
        source: Rc<Source>,
        config: &Config,
    ) -> Result<Template, Syntax> {
        let mut parser = Parser {
            scanner: Scanner::new(source),
            template: Template::new(),
            depth: 0,
            max_nesting: config.max_nesting,
        };

        parser.document()?;
        debug!(parts = parser.template.parts().len(), "parsed template");
        Ok(parser.template)
    }

    /// Runs a recursive rule one level deeper,
    /// failing once the configured nesting depth is exceeded.
    fn nested<T>(
        &mut self,
        rule: impl FnOnce(&mut Parser) -> Result<T, Syntax>,
    ) -> Result<T, Syntax> {
        if self.depth >= self.max_nesting {
            return Err(self.scanner.error("nesting too deep"));
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn document(&mut self) -> Result<(), Syntax> {
        while let Some(content) = self.content(&AT) {
            self.template.add_content(&content);
            self.code()?;
        }
        Ok(())
    }

    /// Scans literal content up to the next directive or `terminator`.
    /// Returns `None` if there is nothing left to scan.
    fn content(&mut self, terminator: &Regex) -> Option<String> {
        if self.scanner.has_terminated() {
            return None;
        }

        let mut content = String::new();
        while let Some(value) = self.scanner.scan_to(terminator) {
            content.push_str(&value);

            if self.scanner.peek() != Some('@') {
                // it must be an end tag
                if let Some(end) = self.scanner.scan(terminator) {
                    content.push_str(&end);
                }
                return Some(content);
            }

            let next = self.scanner.peek_nth(1);
            if next == Some('*') {
                // a comment starts
                return Some(content);
            } else if value.chars().last().map_or(false, is_word) {
                // part of a word, like an email address
                content.push('@');
                self.scanner.consume(1);
            } else if next == Some('@') {
                // an escaped @
                content.push('@');
                self.scanner.consume(2);
            } else {
                return Some(content);
            }
        }

        content.push_str(&self.scanner.scan_rest());
        Some(content)
    }

    /// Parses the directive under the cursor, `@` included.
    fn code(&mut self) -> Result<(), Syntax> {
        if self.scanner.has_terminated() {
            return Ok(());
        }

        // eat the @
        self.scanner.consume(1);
        match self.scanner.peek() {
            Some('(') => {
                let expression = self.balance(Delim::Paren, true, true)?;
                self.template.add_expression(&expression);
            },
            Some('{') => self.block(true)?,
            Some('*') => {
                self.scanner.consume(1);
                let comment = self.scanner.require(&COMMENT_END, Mode::TO, "expected *@")?;
                self.template.add_comment(&comment);
                // eat the *@
                self.scanner.consume(2);
            },
            _ => self.block_or_expression()?,
        }
        Ok(())
    }

    fn block_or_expression(&mut self) -> Result<(), Syntax> {
        let identifier = match self.scanner.scan(&WORD) {
            Some(identifier) => identifier,
            None => {
                let found = match self.scanner.peek() {
                    Some(c) => c.to_string(),
                    None => "end of input".to_string(),
                };
                let at = Span::new(
                    self.scanner.source(),
                    self.scanner.index() - 1,
                    1,
                );
                return Err(Syntax::error_with_note(
                    &format!("@ cannot be followed by {}", found),
                    Note::new_with_hint("write @@ for a literal @", &at),
                ));
            },
        };

        if KEYWORDS.contains(&identifier.as_str()) {
            self.template.add_code(&identifier);
            self.keyword(&identifier)
        } else {
            self.expression(identifier)
        }
    }

    fn keyword(&mut self, keyword: &str) -> Result<(), Syntax> {
        match keyword {
            "if" => self.if_chain(),
            _ => self.outer_block(),
        }
    }

    /// `if (...) { ... }`, followed by any number of `else if` links and
    /// an optional final `else`.
    fn if_chain(&mut self) -> Result<(), Syntax> {
        loop {
            let code = self.scanner.require(&OPEN_PAREN, Mode::TO, "expected (")?;
            self.template.add_code(&code);
            self.balance(Delim::Paren, false, false)?;
            self.outer_block()?;

            let mut code = match self.scanner.check(&ELSE) {
                Some(code) => code,
                None => return Ok(()),
            };
            self.scanner.consume(code.chars().count());
            code.push_str(&self.scanner.scan(&SPACE).unwrap_or_default());
            self.template.add_code(&code);

            if self.scanner.peek() == Some('{') {
                return self.outer_block();
            }

            let code =
                self.scanner.require(&IF, Mode::ANCHORED, "expected if or {")?;
            self.template.add_code(&code);
        }
    }

    /// The block following a keyword and its header.
    fn outer_block(&mut self) -> Result<(), Syntax> {
        let code = self.scanner.require(&OPEN_CURLY, Mode::TO, "expected {")?;
        self.template.add_code(&code);
        self.block(false)?;
        // eat the following newline (if any)
        self.scanner.scan(&TRAILING_NEWLINE);
        Ok(())
    }

    /// Extends an identifier with the calls, indexing and member accesses
    /// that immediately follow it.
    fn expression(&mut self, mut code: String) -> Result<(), Syntax> {
        loop {
            match self.scanner.peek() {
                Some('(') => {
                    code.push_str(&self.balance(Delim::Paren, false, true)?)
                },
                Some('[') => {
                    code.push_str(&self.balance(Delim::Square, false, true)?)
                },
                Some('.') if self.scanner.peek_nth(1).map_or(false, is_word) => {
                    self.scanner.consume(1);
                    code.push('.');
                    code.push_str(&self.scanner.scan(&WORD).unwrap_or_default());
                },
                // a lone dot, or anything else, is content
                _ => break,
            }
        }

        self.template.add_expression(&code);
        Ok(())
    }

    /// Consumes a balanced group of `delim`, the opener under the cursor.
    ///
    /// In expression mode the group's text is returned.
    /// Otherwise it is emitted as code as it goes: each nested group is
    /// preceded by a flush of the text before it, and the closing fragment
    /// is emitted last.
    fn balance(
        &mut self,
        delim: Delim,
        strip: bool,
        expression: bool,
    ) -> Result<String, Syntax> {
        self.nested(|parser| parser.balance_group(delim, strip, expression))
    }

    fn balance_group(
        &mut self,
        delim: Delim,
        strip: bool,
        expression: bool,
    ) -> Result<String, Syntax> {
        let mut code = String::new();
        if let Some(open) = self.scanner.scan_char() {
            if !strip {
                code.push(open);
            }
        }

        loop {
            let chunk = self.scanner.require(
                group_pattern(delim),
                Mode::TO,
                &format!("expected {}", delim.close()),
            )?;
            code.push_str(&chunk);

            if self.scanner.peek() == Some(delim.close()) {
                self.scanner.consume(1);
                if !strip {
                    code.push(delim.close());
                }
                if !expression {
                    self.template.add_code(&code);
                }
                return Ok(code);
            }

            if !expression {
                self.template.add_code(&code);
            }
            let nested = self.balance(delim, false, expression)?;
            if expression {
                code.push_str(&nested);
            } else {
                code.clear();
            }
        }
    }

    /// A `{ ... }` block, the `{` under the cursor.
    /// Stripped blocks (`@{ ... }`) don't emit their own braces.
    fn block(&mut self, strip: bool) -> Result<(), Syntax> {
        self.nested(|parser| parser.block_body(strip))
    }

    fn block_body(&mut self, strip: bool) -> Result<(), Syntax> {
        // the {
        self.scanner.consume(1);
        if !strip {
            self.template.add_code("{");
        }

        loop {
            let next = self.scanner.require(&NON_SPACE, Mode::TO, "expected }")?;

            if self.scanner.peek() == Some('}') {
                // whitespace after markup is part of the markup
                if let Some(Part::Content(_)) = self.template.last() {
                    self.template.add_content(&next);
                } else {
                    self.template.add_code(&next);
                }
                self.scanner.consume(1);
                if !strip {
                    self.template.add_code("}");
                }
                return Ok(());
            }

            if self.scanner.peek() == Some('<') {
                self.template.add_content(strip_leading_line(&next));
                self.tag()?;
            } else if self.scanner.peek_str(2) == Some("@:") {
                let mut line = strip_leading_line(&next).to_string();
                self.scanner.consume(2);
                let rest = self
                    .scanner
                    .scan_until(&NEWLINE)
                    .unwrap_or_else(|| self.scanner.scan_rest());
                line.push_str(&rest);
                self.template.add_content(&line);
            } else if self.scanner.peek() == Some('@') {
                // a directive right after markup, like `<br>@name`
                if let Some(Part::Content(_)) = self.template.last() {
                    self.template.add_content(&next);
                } else {
                    self.template.add_code(&next);
                }
                self.code()?;
            } else {
                let code = self.scanner.require(&CODE_END, Mode::TO, "expected }")?;
                self.template.add_code(&format!("{}{}", next, code));

                match self.scanner.peek() {
                    Some('{') => self.block(false)?,
                    // a statement without a `;`, the block closes next
                    Some('}') => self.template.add_code(";"),
                    _ => {
                        self.scanner.consume(1);
                        self.template.add_code(";");
                    },
                }
            }
        }
    }

    /// A markup element inside a block, the `<` under the cursor.
    fn tag(&mut self) -> Result<(), Syntax> {
        self.nested(|parser| parser.tag_body())
    }

    fn tag_body(&mut self) -> Result<(), Syntax> {
        self.scanner.consume(1);
        let name = self.scanner.require(&TAG_NAME_END, Mode::TO, "expected >")?;

        let mut content = String::new();
        if name == TEXT_TAG {
            // <text> only groups content, it is never output
            self.scanner.require(&TAG_END, Mode::UNTIL, "expected >")?;
        } else {
            content.push('<');
            content.push_str(&name);
            content.push_str(&self.content(&START_TAG).unwrap_or_default());
            // directives in attributes, up to the end of the start tag
            while !content.ends_with('>') && self.scanner.peek() == Some('@') {
                self.template.add_content(&content);
                self.code()?;
                content = self.content(&START_TAG).unwrap_or_default();
            }

            let void = VOID_TAGS.contains(&name.to_ascii_lowercase().as_str());
            if void || content.ends_with("/>") {
                self.template.add_content(&content);
                return Ok(());
            }
        }

        let end_tag = Regex::new(&format!("(?i)@|</{}>", regex::escape(&name)))
            .map_err(|_| self.scanner.error("expected >"))?;
        content.push_str(&self.content(&end_tag).unwrap_or_default());
        self.interleave(&mut content, &end_tag)?;

        if name == TEXT_TAG {
            let cut = content.len().saturating_sub(TEXT_END.len());
            let closed = content
                .get(cut..)
                .map_or(false, |end| end.eq_ignore_ascii_case(TEXT_END));
            if closed {
                content.truncate(cut);
            }
        }

        self.template.add_content(&content);
        Ok(())
    }

    /// Alternates between directives and content for as long as the
    /// content stops at an `@`.
    fn interleave(
        &mut self,
        content: &mut String,
        terminator: &Regex,
    ) -> Result<(), Syntax> {
        while self.scanner.peek() == Some('@') {
            self.template.add_content(content);
            self.code()?;
            *content = self.content(terminator).unwrap_or_default();
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    fn parse(source: &str) -> Result<Template, Syntax> {
        Parser::parse(Source::source(source))
    }

    fn parts(source: &str) -> Vec<Part> {
        match parse(source) {
            Ok(template) => template.into_parts(),
            Err(error) => panic!("{}", error),
        }
    }

    fn reason(source: &str) -> String {
        match parse(source) {
            Ok(template) => panic!("expected an error, got {:?}", template),
            Err(error) => error.reason,
        }
    }

    fn content(s: &str) -> Part { Part::Content(s.to_string()) }
    fn code(s: &str) -> Part { Part::Code(s.to_string()) }
    fn expr(s: &str) -> Part { Part::Expression(s.to_string()) }
    fn comment(s: &str) -> Part { Part::Comment(s.to_string()) }

    #[test]
    fn content_only() {
        assert_eq!(parts("foo"), vec![content("foo")]);
    }

    #[test]
    fn empty_template() {
        assert_eq!(parts(""), vec![]);
    }

    #[test]
    fn single_expression() {
        assert_eq!(parts("@foo"), vec![expr("foo")]);
    }

    #[test]
    fn email_address() {
        assert_eq!(parts("foo@bar.com"), vec![content("foo@bar.com")]);
    }

    #[test]
    fn escaped_at() {
        assert_eq!(parts("@@foo"), vec![content("@foo")]);
    }

    #[test]
    fn content_then_expression() {
        assert_eq!(parts("foo @bar"), vec![content("foo "), expr("bar")]);
        assert_eq!(
            parts("foo @bar baz"),
            vec![content("foo "), expr("bar"), content(" baz")]
        );
    }

    #[test]
    fn expression_inside_markup() {
        assert_eq!(
            parts("<foo>@bar</foo>"),
            vec![content("<foo>"), expr("bar"), content("</foo>")]
        );
    }

    #[test]
    fn no_space_after_at() {
        assert_eq!(reason("@ foo"), "@ cannot be followed by  ");
        assert_eq!(reason("foo @"), "@ cannot be followed by end of input");
    }

    #[test]
    fn if_requires_a_block() {
        assert_eq!(reason("@if (foo)"), "expected {");
    }

    #[test]
    fn if_requires_a_condition() {
        assert_eq!(reason("@if foo {}"), "expected (");
    }

    #[test]
    fn less_than_inside_parens() {
        assert_eq!(parts("@if(foo<bar){}"), vec![code("if(foo<bar){}")]);
    }

    #[test]
    fn markup_inside_if() {
        assert_eq!(
            parts("@if (foo) { <bar>baz</bar> }"),
            vec![code("if (foo) {"), content(" <bar>baz</bar> "), code("}")]
        );
    }

    #[test]
    fn expression_inside_markup_inside_if() {
        assert_eq!(
            parts("@if (foo) { <bar>@baz</bar> }"),
            vec![
                code("if (foo) {"),
                content(" <bar>"),
                expr("baz"),
                content("</bar> "),
                code("}"),
            ]
        );
    }

    #[test]
    fn escaped_at_inside_markup_inside_if() {
        assert_eq!(
            parts("@if (foo) { <bar>@@baz</bar> }"),
            vec![code("if (foo) {"), content(" <bar>@baz</bar> "), code("}")]
        );
    }

    #[test]
    fn indentation_is_eaten() {
        let source = "<ul>\n  @for (var i = 0; i < foos.length; i++) {\n    var foo = foos[i];\n    <li>@foo</li>\n  }\n</ul>";
        assert_eq!(
            parts(source),
            vec![
                content("<ul>\n"),
                code("for (var i = 0; i < foos.length; i++) {\n    var foo = foos[i];"),
                content("    <li>"),
                expr("foo"),
                content("</li>\n"),
                code("}"),
                content("</ul>"),
            ]
        );
    }

    #[test]
    fn less_than_inside_nested_blocks() {
        assert_eq!(
            parts("@if (foo) { if (bar < baz) { <quux>lol</quux> } }"),
            vec![
                code("if (foo) { if (bar < baz) {"),
                content(" <quux>lol</quux> "),
                code("} }"),
            ]
        );
    }

    #[test]
    fn nested_parens() {
        assert_eq!(
            parts("@if ((foo + bar) / baz) {}"),
            vec![code("if ((foo + bar) / baz) {}")]
        );
    }

    #[test]
    fn unclosed_parens() {
        assert_eq!(reason("@if (foo {}"), "expected )");
        assert_eq!(reason("@foo[bar"), "expected ]");
    }

    #[test]
    fn member_access() {
        assert_eq!(parts("@foo.bar"), vec![expr("foo.bar")]);
    }

    #[test]
    fn dot_then_space_is_content() {
        assert_eq!(parts("@foo. bar"), vec![expr("foo"), content(". bar")]);
        assert_eq!(parts("@foo."), vec![expr("foo"), content(".")]);
    }

    #[test]
    fn calls_and_indexing() {
        assert_eq!(parts("@foo(bar)"), vec![expr("foo(bar)")]);
        assert_eq!(parts("@foo(bar)(baz)"), vec![expr("foo(bar)(baz)")]);
        assert_eq!(parts("@foo(bar(baz))"), vec![expr("foo(bar(baz))")]);
        assert_eq!(parts("@foo[bar]"), vec![expr("foo[bar]")]);
        assert_eq!(parts("@foo[bar][baz]"), vec![expr("foo[bar][baz]")]);
        assert_eq!(parts("@foo[bar[baz]]"), vec![expr("foo[bar[baz]]")]);
        assert_eq!(parts("@a.b(c)[d].e"), vec![expr("a.b(c)[d].e")]);
    }

    #[test]
    fn parenthesized_expression() {
        assert_eq!(parts("@(foo + bar)"), vec![expr("foo + bar")]);
        assert_eq!(parts("@((a) + (b))"), vec![expr("(a) + (b)")]);
    }

    #[test]
    fn braced_code() {
        assert_eq!(parts("@{foo; bar;}"), vec![code("foo; bar;")]);
    }

    #[test]
    fn braced_code_with_markup() {
        assert_eq!(
            parts("@{ var x = 1; <p>@x</p> }"),
            vec![
                code(" var x = 1;"),
                content(" <p>"),
                expr("x"),
                content("</p> "),
            ]
        );
    }

    #[test]
    fn text_tags_are_stripped() {
        assert_eq!(
            parts("@if (foo) { <text>bar</text> }"),
            vec![code("if (foo) {"), content(" bar "), code("}")]
        );
    }

    #[test]
    fn text_lines() {
        assert_eq!(
            parts("@if (foo) {\n  @:bar\n  @:baz\n}"),
            vec![code("if (foo) {"), content("  bar\n  baz\n"), code("}")]
        );
    }

    #[test]
    fn comments() {
        assert_eq!(
            parts("foo@*bar*@baz"),
            vec![content("foo"), comment("bar"), content("baz")]
        );
        assert_eq!(reason("foo@*bar"), "expected *@");
    }

    #[test]
    fn code_inside_start_tags() {
        assert_eq!(
            parts("<foo @if(false){<text>bar=\"baz\"</text>}></foo>"),
            vec![
                content("<foo "),
                code("if(false){"),
                content("bar=\"baz\""),
                code("}"),
                content("></foo>"),
            ]
        );
    }

    #[test]
    fn code_inside_start_tags_inside_code() {
        assert_eq!(
            parts("@if(true){<foo @if(false){<text>bar=\"baz\"</text>}></foo>}"),
            vec![
                code("if(true){"),
                content("<foo "),
                code("if(false){"),
                content("bar=\"baz\""),
                code("}"),
                content("></foo>"),
                code("}"),
            ]
        );
    }

    #[test]
    fn if_else() {
        assert_eq!(
            parts("@if (foo) { <bar></bar> } else { <baz></baz> }"),
            vec![
                code("if (foo) {"),
                content(" <bar></bar> "),
                code("} else {"),
                content(" <baz></baz> "),
                code("}"),
            ]
        );
    }

    #[test]
    fn if_else_if_else() {
        assert_eq!(
            parts("@if (foo) { <foo></foo> } else if (bar) { <bar></bar> } else { <baz></baz> }"),
            vec![
                code("if (foo) {"),
                content(" <foo></foo> "),
                code("} else if (bar) {"),
                content(" <bar></bar> "),
                code("} else {"),
                content(" <baz></baz> "),
                code("}"),
            ]
        );
    }

    #[test]
    fn else_requires_if_or_block() {
        assert_eq!(reason("@if (a) {} else (b)"), "expected if or {");
    }

    #[test]
    fn else_must_be_a_whole_word() {
        assert_eq!(
            parts("@if (a) {} elsewhere"),
            vec![code("if (a) {}"), content(" elsewhere")]
        );
    }

    #[test]
    fn trailing_newline_after_blocks_is_eaten() {
        assert_eq!(
            parts("@while (x) {\n}\nafter"),
            vec![code("while (x) {\n}"), content("after")]
        );
    }

    #[test]
    fn functions() {
        assert_eq!(
            parts("before @function foo() { return 42; } @foo() after"),
            vec![
                content("before "),
                code("function foo() { return 42; }"),
                content(" "),
                expr("foo()"),
                content(" after"),
            ]
        );
    }

    #[test]
    fn void_and_self_closing_tags() {
        assert_eq!(
            parts("@if (a) { <br> <img src=\"@src\"/> }"),
            vec![
                code("if (a) {"),
                content(" <br> <img src=\""),
                expr("src"),
                content("\"/> "),
                code("}"),
            ]
        );
    }

    #[test]
    fn directives_in_attributes_and_body() {
        assert_eq!(
            parts("@if (a) { <p title=\"@t\">@b</p> }after"),
            vec![
                code("if (a) {"),
                content(" <p title=\""),
                expr("t"),
                content("\">"),
                expr("b"),
                content("</p> "),
                code("}"),
                content("after"),
            ]
        );
    }

    #[test]
    fn directives_after_void_tags() {
        assert_eq!(
            parts("@if (a) { <img src=\"@s\">@b }"),
            vec![
                code("if (a) {"),
                content(" <img src=\""),
                expr("s"),
                content("\">"),
                expr("b"),
                code(" }"),
            ]
        );
    }

    #[test]
    fn statements_without_semicolons() {
        assert_eq!(parts("@{ x = 1 }@x"), vec![code(" x = 1 ;"), expr("x")]);
        assert_eq!(
            parts("@{ var xs = []; xs.push(1) }"),
            vec![code(" var xs = []; xs.push(1) ;")]
        );
        assert_eq!(
            parts("@if (a) { total += 1 }"),
            vec![code("if (a) { total += 1 ;}")]
        );
    }

    #[test]
    fn end_tags_are_case_insensitive() {
        assert_eq!(
            parts("@if (a) { <p>x</P> }"),
            vec![code("if (a) {"), content(" <p>x</P> "), code("}")]
        );
    }

    #[test]
    fn unclosed_block() {
        assert_eq!(reason("@if (a) { <p>x</p>"), "expected }");
        assert_eq!(reason("@for (;;) { x = 1"), "expected }");
    }

    #[test]
    fn nesting_is_limited() {
        let config = Config {
            max_nesting: 8,
            ..Config::default()
        };
        let deep = format!("@({}{})", "(".repeat(16), ")".repeat(16));
        let error = Parser::parse_with(Source::source(&deep), &config).unwrap_err();
        assert_eq!(error.reason, "nesting too deep");

        let shallow = format!("@({}{})", "(".repeat(4), ")".repeat(4));
        assert!(Parser::parse_with(Source::source(&shallow), &config).is_ok());
    }

    #[test]
    fn errors_point_at_the_cursor() {
        let error = parse("@if (foo").unwrap_err();
        assert_eq!(error.notes[0].span.offset(), 8);
    }

    proptest! {
        #[test]
        fn doesnt_crash(s in "\\PC*") {
            let result = parse(&s);
            format!("{:?}", result);
        }

        #[test]
        fn plain_text_is_one_content_part(s in "[a-zA-Z0-9 ,.<>/\n]+") {
            prop_assert_eq!(parts(&s), vec![content(&s)]);
        }

        #[test]
        fn comments_vanish(s in "[^*]*") {
            let source = format!("a@*{}*@b", s);
            let kinds: Vec<_> = parts(&source).iter().map(|p| p.kind()).collect();
            if s.is_empty() {
                prop_assert_eq!(kinds, vec!["content"]);
            } else {
                prop_assert_eq!(kinds, vec!["content", "comment", "content"]);
            }
        }

        #[test]
        fn nested_groups_are_one_expression(depth in 1usize..32) {
            let group = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
            let source = format!("@f{}", group);
            prop_assert_eq!(parts(&source), vec![expr(&format!("f{}", group))]);
        }
    }
}
