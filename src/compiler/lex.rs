use std::{rc::Rc, str::FromStr};

use crate::{
    common::{
        lit::Lit,
        source::Source,
        span::{Span, Spanned},
    },
    compiler::syntax::{Note, Syntax},
    construct::token::{Delim, Token, Tokens},
};

/// Operators, longest first so that `===` is never read as `==` then `=`.
const OPS: [&str; 28] = [
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=",
    "*=", "/=", "%=", "+", "-", "*", "/", "%", "<", ">", "=", "!", "?", ":",
    ".", ",",
];

#[derive(Debug)]
pub struct Lexer {
    source: Rc<Source>,
    index: usize,
    tokens: Tokens,
}

impl Lexer {
    /// Lexes a generated script into a flat stream of tokens,
    /// terminated by a single `Token::End`.
    pub fn lex(source: Rc<Source>) -> Result<Tokens, Syntax> {
        // build a base lexer for this file
        let mut lexer = Lexer {
            source,
            index: 0,
            tokens: vec![],
        };

        // prime the lexer
        lexer.strip()?;

        // consume!
        while lexer.index < lexer.source.contents.len() {
            let token = lexer.next_token()?;
            lexer.tokens.push(token);

            // Strip whitespace and comments
            lexer.strip()?;
        }

        let end = Span::point(&lexer.source, lexer.index);
        lexer.tokens.push(Spanned::new(Token::End, end));
        Ok(lexer.tokens)
    }

    /// Returns all characters after the current index position.
    fn remaining(&self) -> &str { &self.source.contents[self.index..] }

    /// Skips whitespace, `// line` comments and `/* block */` comments.
    fn strip(&mut self) -> Result<(), Syntax> {
        loop {
            let remaining = self.remaining();
            let trimmed = remaining.trim_start();
            let mut new_index = self.index + (remaining.len() - trimmed.len());

            if let Some(comment) = trimmed.strip_prefix("//") {
                let line = comment.find('\n').unwrap_or(comment.len());
                new_index += 2 + line;
            } else if let Some(comment) = trimmed.strip_prefix("/*") {
                let end = comment.find("*/").ok_or_else(|| {
                    Syntax::error(
                        "Unterminated block comment",
                        &Span::new(&self.source, new_index, 2),
                    )
                })?;
                new_index += 2 + end + 2;
            }

            // If nothing was stripped, we're done
            let old_index = self.index;
            self.index = new_index;
            if old_index == new_index {
                return Ok(());
            }
        }
    }

    /// Counts the bytes at the start of `s` matching `pred`.
    fn take_while(s: &str, pred: impl Fn(char) -> bool) -> usize {
        s.find(|c| !pred(c)).unwrap_or(s.len())
    }

    fn number(&self) -> Result<(Token, usize), Syntax> {
        let remaining = self.remaining();

        if let Some(hex) = remaining
            .strip_prefix("0x")
            .or_else(|| remaining.strip_prefix("0X"))
        {
            let len = Lexer::take_while(hex, |c| c.is_ascii_hexdigit());
            let number = i64::from_str_radix(&hex[..len], 16).map_err(|_| {
                Syntax::error(
                    "Invalid hexadecimal literal",
                    &Span::new(&self.source, self.index, len + 2),
                )
            })?;
            return Ok((Token::Lit(Lit::Number(number as f64)), len + 2));
        }

        let digits = |from: usize| {
            Lexer::take_while(&remaining[from..], |c| c.is_ascii_digit())
        };

        let mut len = digits(0);
        // There's a decimal point
        if remaining[len..].starts_with('.') {
            len += 1;
            len += digits(len);
        }
        // There's an exponent
        if remaining[len..].starts_with(['e', 'E']) {
            let mut exponent = len + 1;
            if remaining[exponent..].starts_with(['+', '-']) {
                exponent += 1;
            }
            let exponent_digits = digits(exponent);
            if exponent_digits > 0 {
                len = exponent + exponent_digits;
            }
        }

        let number = f64::from_str(&remaining[..len]).map_err(|_| {
            Syntax::error(
                "Invalid number literal",
                &Span::new(&self.source, self.index, len),
            )
        })?;
        Ok((Token::Lit(Lit::Number(number)), len))
    }

    fn hex_escape(
        &self,
        chars: &mut std::str::CharIndices,
        digits: usize,
        start: usize,
    ) -> Result<char, Syntax> {
        let mut code = 0;
        for _ in 0..digits {
            let digit = chars
                .next()
                .and_then(|(_, c)| c.to_digit(16))
                .ok_or_else(|| {
                    Syntax::error(
                        "Invalid escape sequence in string literal",
                        &Span::new(&self.source, self.index + start, 2),
                    )
                })?;
            code = code * 16 + digit;
        }
        // lone surrogates have no char, so they become the replacement char
        Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn string(&self, quote: char) -> Result<(Token, usize), Syntax> {
        // expects opening quote to be under the cursor
        let remaining = self.remaining();
        let mut chars = remaining.char_indices();
        chars.next();
        let mut string = String::new();

        while let Some((offset, c)) = chars.next() {
            match c {
                c if c == quote => {
                    return Ok((
                        Token::Lit(Lit::String(string)),
                        offset + c.len_utf8(),
                    ))
                },
                '\n' => break,
                '\\' => {
                    let (_, escaped) = match chars.next() {
                        Some(escaped) => escaped,
                        None => break,
                    };
                    match escaped {
                        'n' => string.push('\n'),
                        'r' => string.push('\r'),
                        't' => string.push('\t'),
                        'b' => string.push('\u{8}'),
                        'f' => string.push('\u{c}'),
                        'v' => string.push('\u{b}'),
                        '0' => string.push('\0'),
                        'x' => string.push(self.hex_escape(&mut chars, 2, offset)?),
                        'u' => string.push(self.hex_escape(&mut chars, 4, offset)?),
                        // an escaped newline continues the line
                        '\n' => (),
                        // anything else stands for itself, quotes included
                        other => string.push(other),
                    }
                },
                c => string.push(c),
            }
        }

        Err(Syntax::error_with_note(
            "Unterminated string literal",
            Note::new_with_hint(
                &format!("add a closing {} before the end of the line", quote),
                &Span::point(&self.source, self.index),
            ),
        ))
    }

    /// Parses the next token.
    /// Expects all whitespace and comments to be stripped.
    fn next_token(&mut self) -> Result<Spanned<Token>, Syntax> {
        let remaining = self.remaining();
        let mut chars = remaining.chars();
        let first = match chars.next() {
            Some(c) => c,
            None => {
                return Err(Syntax::error(
                    "Unexpected end of source",
                    &Span::point(&self.source, self.index),
                ))
            },
        };
        let second = chars.next();

        let (token, len) = match first {
            // separator
            ';' => (Token::Sep, 1),

            // grouping
            '(' => (Token::Open(Delim::Paren), 1),
            '{' => (Token::Open(Delim::Curly), 1),
            '[' => (Token::Open(Delim::Square), 1),
            ')' => (Token::Close(Delim::Paren), 1),
            '}' => (Token::Close(Delim::Curly), 1),
            ']' => (Token::Close(Delim::Square), 1),

            // names, and the literals spelled like names
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let len = Lexer::take_while(remaining, |n| {
                    n.is_alphanumeric() || n == '_' || n == '$'
                });
                let token = match &remaining[..len] {
                    "true" => Token::Lit(Lit::Boolean(true)),
                    "false" => Token::Lit(Lit::Boolean(false)),
                    "null" => Token::Lit(Lit::Null),
                    "undefined" => Token::Lit(Lit::Undefined),
                    name => Token::Iden(name.to_string()),
                };
                (token, len)
            },

            // number literals: 42, 4.2, .42, 4e2, 0x2A
            c if c.is_ascii_digit() => self.number()?,
            '.' if second.map_or(false, |n| n.is_ascii_digit()) => {
                self.number()?
            },

            // strings
            q @ ('"' | '\'') => self.string(q)?,

            // operators
            _ => match OPS.iter().find(|op| remaining.starts_with(*op)) {
                Some(op) => (Token::Op(op.to_string()), op.len()),
                None => {
                    return Err(Syntax::error(
                        &format!("Unexpected character `{}`", first),
                        &Span::new(&self.source, self.index, first.len_utf8()),
                    ))
                },
            },
        };

        let spanned = Spanned::new(token, Span::new(&self.source, self.index, len));
        self.index += len;
        Ok(spanned)
    }
}
