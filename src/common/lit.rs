use std::fmt::{Display, Formatter, Result};

use crate::common::data::Data;

/// Literal values as they appear in the generated script.
#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Number(f64),
    /// A UTF-8 encoded string, escapes already resolved.
    String(String),
    Boolean(bool),
    Null,
    Undefined,
}

impl Lit {
    /// Converts a literal into runtime data.
    pub fn to_data(self) -> Data {
        match self {
            Lit::Number(n) => Data::Number(n),
            Lit::String(s) => Data::String(s),
            Lit::Boolean(b) => Data::Boolean(b),
            Lit::Null => Data::Null,
            Lit::Undefined => Data::Undefined,
        }
    }
}

impl Display for Lit {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Lit::Number(n) => write!(f, "{}", n),
            Lit::String(s) => write!(f, "{:?}", s),
            Lit::Boolean(b) => write!(f, "{}", b),
            Lit::Null => write!(f, "null"),
            Lit::Undefined => write!(f, "undefined"),
        }
    }
}
