use std::fmt::Display;

use crate::common::{lit::Lit, span::Spanned};

/// These are the different tokens the lexer will output
/// for a generated script.
/// `Token`s with data contain that data,
/// e.g. a number will be a `Lit::Number(...)`, not just a string.
/// `Token`s can be spanned using `Spanned<Token>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Delimiters
    Open(Delim),
    Close(Delim),

    // Names
    Iden(String),
    Op(String),

    // Values
    Lit(Lit),

    // Context
    Sep,
    End,
}

pub type Tokens = Vec<Spanned<Token>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, proptest_derive::Arbitrary)]
pub enum Delim {
    Paren,
    Curly,
    Square,
}

impl Delim {
    pub fn open(&self) -> char {
        match self {
            Delim::Paren => '(',
            Delim::Curly => '{',
            Delim::Square => '[',
        }
    }

    pub fn close(&self) -> char {
        match self {
            Delim::Paren => ')',
            Delim::Curly => '}',
            Delim::Square => ']',
        }
    }
}

/// Reserved words of the script language.
/// They can't be used as variable names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResIden {
    Var,
    Let,
    Const,
    If,
    Else,
    For,
    In,
    While,
    Do,
    Function,
    Return,
    Break,
    Continue,
    Throw,
    TypeOf,
    This,
}

impl ResIden {
    pub fn try_new(name: &str) -> Option<ResIden> {
        use ResIden::*;
        Some(match name {
            "var" => Var,
            "let" => Let,
            "const" => Const,
            "if" => If,
            "else" => Else,
            "for" => For,
            "in" => In,
            "while" => While,
            "do" => Do,
            "function" => Function,
            "return" => Return,
            "break" => Break,
            "continue" => Continue,
            "throw" => Throw,
            "typeof" => TypeOf,
            "this" => This,
            _ => {
                return None;
            },
        })
    }
}

impl Display for Delim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Delim::Paren => "parenthesis",
            Delim::Curly => "curly brackets",
            Delim::Square => "square brackets",
        };

        write!(f, "{}", message)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // pretty formatting for tokens
        // just use debug if you're not printing a message or something.
        let message = match self {
            Token::Open(delim) => format!("`{}`", delim.open()),
            Token::Close(delim) => format!("`{}`", delim.close()),
            Token::Iden(i) => format!("the identifier `{}`", i),
            Token::Op(o) => format!("the operator `{}`", o),
            Token::Lit(l) => format!("the literal `{}`", l),
            Token::Sep => "a `;`".to_string(),
            Token::End => "the end of source".to_string(),
        };

        write!(f, "{}", message)
    }
}
