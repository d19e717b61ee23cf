use std::{
    cell::RefCell,
    fmt::{Debug, Display, Formatter, Result},
    rc::Rc,
};

use indexmap::IndexMap;
use serde_json::Value;

use crate::common::closure::{Closure, Native};

/// Integers up to this magnitude are exactly representable.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A shared, mutable list.
pub type Array = Rc<RefCell<Vec<Data>>>;
/// A shared, mutable record that remembers insertion order.
pub type Object = Rc<RefCell<IndexMap<String, Data>>>;

/// Values that flow through a running template.
/// Compound values are reference counted, so cloning a `Data` never
/// copies an array or an object: mutations through one handle are
/// visible through all of them, as template authors expect.
#[derive(Clone)]
pub enum Data {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Array),
    Object(Object),
    Function(Rc<Closure>),
    Native(Native),
}

impl Data {
    pub fn array(items: Vec<Data>) -> Data {
        Data::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(fields: IndexMap<String, Data>) -> Data {
        Data::Object(Rc::new(RefCell::new(fields)))
    }

    pub fn string(s: impl Into<String>) -> Data { Data::String(s.into()) }

    /// Whether this value counts as `true` in a condition.
    /// `false`, `0`, `NaN`, `""`, `null` and `undefined` do not.
    pub fn truthy(&self) -> bool {
        match self {
            Data::Undefined | Data::Null => false,
            Data::Boolean(b) => *b,
            Data::Number(n) => *n != 0.0 && !n.is_nan(),
            Data::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// The name `typeof` reports for this value.
    pub fn type_of(&self) -> &'static str {
        match self {
            Data::Undefined => "undefined",
            Data::Null | Data::Array(_) | Data::Object(_) => "object",
            Data::Boolean(_) => "boolean",
            Data::Number(_) => "number",
            Data::String(_) => "string",
            Data::Function(_) | Data::Native(_) => "function",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Data::Undefined | Data::Null)
    }

    /// Numeric coercion.
    pub fn to_number(&self) -> f64 {
        match self {
            Data::Undefined => f64::NAN,
            Data::Null => 0.0,
            Data::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            },
            Data::Number(n) => *n,
            Data::String(s) => parse_number(s),
            Data::Array(a) => {
                let items = a.borrow();
                match items.len() {
                    0 => 0.0,
                    1 => items[0].to_number(),
                    _ => f64::NAN,
                }
            },
            _ => f64::NAN,
        }
    }

    /// Identity comparison, as done by `===`.
    pub fn strict_eq(&self, other: &Data) -> bool {
        match (self, other) {
            (Data::Undefined, Data::Undefined) => true,
            (Data::Null, Data::Null) => true,
            (Data::Boolean(a), Data::Boolean(b)) => a == b,
            (Data::Number(a), Data::Number(b)) => a == b,
            (Data::String(a), Data::String(b)) => a == b,
            (Data::Array(a), Data::Array(b)) => Rc::ptr_eq(a, b),
            (Data::Object(a), Data::Object(b)) => Rc::ptr_eq(a, b),
            (Data::Function(a), Data::Function(b)) => Rc::ptr_eq(a, b),
            (Data::Native(a), Data::Native(b)) => a.name == b.name,
            _ => false,
        }
    }

    /// Coercing comparison, as done by `==`.
    pub fn loose_eq(&self, other: &Data) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => {
                a.is_nullish() && b.is_nullish()
            },
            (Data::Boolean(b), other) | (other, Data::Boolean(b)) => {
                Data::Number(if *b { 1.0 } else { 0.0 }).loose_eq(other)
            },
            (Data::Number(n), Data::String(_)) => *n == other.to_number(),
            (Data::String(_), Data::Number(n)) => self.to_number() == *n,
            (Data::Number(_) | Data::String(_), Data::Array(_) | Data::Object(_))
            | (Data::Array(_) | Data::Object(_), Data::Number(_) | Data::String(_)) => {
                let (primitive, compound) = match self {
                    Data::Array(_) | Data::Object(_) => (other, self),
                    _ => (self, other),
                };
                primitive.loose_eq(&Data::String(compound.to_string()))
            },
            (a, b) => a.strict_eq(b),
        }
    }

    /// Converts input data into runtime data.
    pub fn from_json(value: &Value) -> Data {
        match value {
            Value::Null => Data::Null,
            Value::Bool(b) => Data::Boolean(*b),
            Value::Number(n) => Data::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Data::String(s.clone()),
            Value::Array(items) => {
                Data::array(items.iter().map(Data::from_json).collect())
            },
            Value::Object(fields) => Data::object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Data::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts runtime data back into a JSON value.
    /// Functions and `undefined` have no JSON form and yield `None`;
    /// inside arrays they become `null`, inside objects they are skipped.
    pub fn to_json(&self) -> Option<Value> {
        Some(match self {
            Data::Undefined | Data::Function(_) | Data::Native(_) => {
                return None
            },
            Data::Null => Value::Null,
            Data::Boolean(b) => Value::Bool(*b),
            // integral numbers serialize without a fraction
            Data::Number(n) if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER => {
                Value::from(*n as i64)
            },
            Data::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Data::String(s) => Value::String(s.clone()),
            Data::Array(a) => Value::Array(
                a.borrow()
                    .iter()
                    .map(|item| item.to_json().unwrap_or(Value::Null))
                    .collect(),
            ),
            Data::Object(o) => Value::Object(
                o.borrow()
                    .iter()
                    .filter_map(|(k, v)| Some((k.clone(), v.to_json()?)))
                    .collect(),
            ),
        })
    }
}

impl From<&Value> for Data {
    fn from(value: &Value) -> Data { Data::from_json(value) }
}

/// Parses the numeric form of a string.
/// Surrounding whitespace is ignored and the empty string is `0`;
/// anything that is not a number is `NaN`.
pub fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => (),
    }

    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return i64::from_str_radix(hex, 16)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }

    let numeric = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !numeric {
        return f64::NAN;
    }

    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Formats a number the way template output expects:
/// integral values print without a fraction, very large and very small
/// magnitudes use exponent notation.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let formatted = format!("{:e}", n);
        return match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => {
                format!("{}e+{}", mantissa, exp)
            },
            _ => formatted,
        };
    }

    format!("{}", n)
}

impl Display for Data {
    /// Displays data the way it is written into template output.
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Data::Undefined => write!(f, "undefined"),
            Data::Null => write!(f, "null"),
            Data::Boolean(b) => write!(f, "{}", b),
            Data::Number(n) => write!(f, "{}", format_number(*n)),
            Data::String(s) => write!(f, "{}", s),
            Data::Array(a) => {
                for (index, item) in a.borrow().iter().enumerate() {
                    if index > 0 {
                        write!(f, ",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{}", item)?;
                    }
                }
                Ok(())
            },
            Data::Object(_) => write!(f, "[object Object]"),
            Data::Function(c) => write!(f, "function {}() {{ ... }}", c.name()),
            Data::Native(n) => {
                write!(f, "function {}() {{ [native code] }}", n.name)
            },
        }
    }
}

impl Debug for Data {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Data::Undefined => write!(f, "Undefined"),
            Data::Null => write!(f, "Null"),
            Data::Boolean(b) => write!(f, "Boolean({:?})", b),
            Data::Number(n) => write!(f, "Number({:?})", n),
            Data::String(s) => write!(f, "String({:?})", s),
            Data::Array(a) => write!(f, "Array({:?})", a.borrow()),
            Data::Object(o) => write!(f, "Object({:?})", o.borrow()),
            Data::Function(c) => write!(f, "Function({})", c.name()),
            Data::Native(n) => write!(f, "Native({})", n.name),
        }
    }
}
