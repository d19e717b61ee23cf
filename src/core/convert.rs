//! Conversions between values: the global conversion functions,
//! methods on numbers and booleans, and `JSON`.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::{
    common::{
        closure::{Native, NativeFn},
        data::{format_number, Data},
        escape::encode_html,
    },
    core::extract::{arg, integer},
};

/// The longest prefix of a string `parseFloat` understands.
static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(Infinity|\d+\.?\d*([eE][+-]?\d+)?|\.\d+([eE][+-]?\d+)?)")
        .unwrap()
});

/// Escapes the string form of a value for HTML.
/// Falsy values pass through untouched, so that
/// `null` and `undefined` do not print.
pub fn escape(_: Data, args: Vec<Data>) -> Result<Data, String> {
    let value = arg(&args, 0);
    if !value.truthy() {
        return Ok(value);
    }
    Ok(Data::String(encode_html(&value.to_string())))
}

pub fn string(_: Data, args: Vec<Data>) -> Result<Data, String> {
    Ok(Data::String(match args.first() {
        Some(value) => value.to_string(),
        None => String::new(),
    }))
}

pub fn number(_: Data, args: Vec<Data>) -> Result<Data, String> {
    Ok(Data::Number(match args.first() {
        Some(value) => value.to_number(),
        None => 0.0,
    }))
}

pub fn boolean(_: Data, args: Vec<Data>) -> Result<Data, String> {
    Ok(Data::Boolean(arg(&args, 0).truthy()))
}

pub fn is_nan(_: Data, args: Vec<Data>) -> Result<Data, String> {
    Ok(Data::Boolean(arg(&args, 0).to_number().is_nan()))
}

/// Parses the longest integer prefix of a string.
/// The radix defaults to 10, or 16 when the digits start with `0x`.
pub fn parse_int(_: Data, args: Vec<Data>) -> Result<Data, String> {
    let string = arg(&args, 0).to_string();
    let mut digits = string.trim_start();

    let negative = digits.starts_with('-');
    if let Some(rest) = digits.strip_prefix(['-', '+']) {
        digits = rest;
    }

    let mut radix = match arg(&args, 1) {
        Data::Undefined => 0,
        value => integer(value.to_number()) as i64,
    };
    let hex = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X"));
    if let (Some(rest), 0 | 16) = (hex, radix) {
        digits = rest;
        radix = 16;
    }
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return Ok(Data::Number(f64::NAN));
    }

    let mut result: Option<f64> = None;
    for c in digits.chars() {
        match c.to_digit(radix as u32) {
            Some(digit) => {
                result = Some(result.unwrap_or(0.0) * radix as f64 + digit as f64)
            },
            None => break,
        }
    }

    Ok(Data::Number(match result {
        Some(n) if negative => -n,
        Some(n) => n,
        None => f64::NAN,
    }))
}

pub fn parse_float(_: Data, args: Vec<Data>) -> Result<Data, String> {
    let string = arg(&args, 0).to_string();
    let trimmed = string.trim_start();
    let n = match FLOAT_PREFIX.find(trimmed) {
        Some(prefix) => match prefix.as_str().trim_start_matches('+') {
            "Infinity" => f64::INFINITY,
            "-Infinity" => f64::NEG_INFINITY,
            other => other.parse().unwrap_or(f64::NAN),
        },
        None => f64::NAN,
    };
    Ok(Data::Number(n))
}

/// Formats a number with a fixed number of fraction digits.
/// Ties are rounded away from zero.
pub fn to_fixed(this: Data, args: Vec<Data>) -> Result<Data, String> {
    let n = this.to_number();
    let digits = integer(arg(&args, 0).to_number());
    if !(0.0..=100.0).contains(&digits) {
        return Err("toFixed() digits argument must be between 0 and 100".into());
    }
    if n.is_nan() || n.abs() >= 1e21 {
        return Ok(Data::String(format_number(n)));
    }

    let digits = digits as usize;
    let factor = 10f64.powi(digits as i32);
    let scaled = n.abs() * factor;
    let rounded = if scaled.fract() == 0.5 {
        scaled.trunc() + 1.0
    } else {
        scaled.round()
    };
    let magnitude = format!("{:.*}", digits, rounded / factor);
    // -0 prints without a sign
    let sign = if n < 0.0 && rounded != 0.0 { "-" } else { "" };
    Ok(Data::String(format!("{}{}", sign, magnitude)))
}

/// Writes a number in another base.
/// Fractions are written out to at most 52 digits.
fn in_radix(n: f64, radix: u32) -> String {
    if !n.is_finite() {
        return format_number(n);
    }

    let mut whole = n.abs().trunc();
    let mut fraction = n.abs().fract();
    let mut digits = vec![];
    loop {
        let digit = (whole % radix as f64) as u32;
        digits.push(std::char::from_digit(digit, radix).unwrap_or('0'));
        whole = (whole / radix as f64).trunc();
        if whole == 0.0 {
            break;
        }
    }
    if n < 0.0 {
        digits.push('-');
    }
    let mut written: String = digits.into_iter().rev().collect();

    if fraction > 0.0 {
        written.push('.');
        for _ in 0..52 {
            fraction *= radix as f64;
            let digit = fraction.trunc() as u32;
            written.push(std::char::from_digit(digit, radix).unwrap_or('0'));
            fraction = fraction.fract();
            if fraction == 0.0 {
                break;
            }
        }
    }
    written
}

pub fn number_to_string(this: Data, args: Vec<Data>) -> Result<Data, String> {
    let n = this.to_number();
    let radix = match arg(&args, 0) {
        Data::Undefined => 10.0,
        value => integer(value.to_number()),
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err("toString() radix must be between 2 and 36".into());
    }

    Ok(Data::String(if radix == 10.0 {
        format_number(n)
    } else {
        in_radix(n, radix as u32)
    }))
}

pub fn boolean_to_string(this: Data, _: Vec<Data>) -> Result<Data, String> {
    Ok(Data::String(this.to_string()))
}

/// Serializes a value as JSON.
/// A positive number (at most 10) or a non-empty string as the third
/// argument pretty-prints with that indentation; the replacer is ignored.
pub fn stringify(_: Data, args: Vec<Data>) -> Result<Data, String> {
    let value = match arg(&args, 0).to_json() {
        Some(value) => value,
        None => return Ok(Data::Undefined),
    };

    let indent = match arg(&args, 2) {
        Data::Number(n) if n >= 1.0 => " ".repeat(n.min(10.0) as usize),
        Data::String(s) => s.chars().take(10).collect(),
        _ => String::new(),
    };

    if indent.is_empty() {
        return serde_json::to_string(&value)
            .map(Data::String)
            .map_err(|e| e.to_string());
    }

    let mut written = vec![];
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = Serializer::with_formatter(&mut written, formatter);
    value.serialize(&mut serializer).map_err(|e| e.to_string())?;
    String::from_utf8(written)
        .map(Data::String)
        .map_err(|e| e.to_string())
}

/// The `JSON` global.
pub fn json() -> Data {
    let mut json = IndexMap::new();
    json.insert(
        "stringify".to_string(),
        Data::Native(Native::new("stringify", stringify)),
    );
    Data::object(json)
}

static NUMBER_METHODS: [(&str, NativeFn); 2] =
    [("toFixed", to_fixed), ("toString", number_to_string)];

/// Looks up a method on numbers.
pub fn number_method(name: &str) -> Option<Native> {
    NUMBER_METHODS
        .iter()
        .find(|(method, _)| *method == name)
        .map(|(method, fun)| Native::new(*method, *fun))
}

/// Looks up a method on booleans.
pub fn boolean_method(name: &str) -> Option<Native> {
    (name == "toString").then(|| Native::new("toString", boolean_to_string))
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn call(fun: NativeFn, this: Data, args: Vec<Data>) -> String {
        fun(this, args).unwrap().to_string()
    }

    fn n(n: f64) -> Data { Data::Number(n) }
    fn s(s: &str) -> Data { Data::string(s) }

    #[test]
    fn escaping() {
        assert_eq!(call(escape, Data::Undefined, vec![s("<b>")]), "&lt;b&gt;");
        assert_eq!(call(escape, Data::Undefined, vec![n(3.0)]), "3");
        assert!(matches!(escape(Data::Undefined, vec![Data::Null]), Ok(Data::Null)));
        assert!(matches!(escape(Data::Undefined, vec![n(0.0)]), Ok(Data::Number(_))));
    }

    #[test]
    fn constructors() {
        assert_eq!(call(string, Data::Undefined, vec![]), "");
        assert_eq!(call(string, Data::Undefined, vec![Data::Null]), "null");
        assert_eq!(call(number, Data::Undefined, vec![]), "0");
        assert_eq!(call(number, Data::Undefined, vec![s(" 12 ")]), "12");
        assert_eq!(call(boolean, Data::Undefined, vec![s("")]), "false");
        assert_eq!(call(is_nan, Data::Undefined, vec![s("x")]), "true");
    }

    #[test]
    fn integer_prefixes() {
        assert_eq!(call(parse_int, Data::Undefined, vec![s("  42px")]), "42");
        assert_eq!(call(parse_int, Data::Undefined, vec![s("-17.9")]), "-17");
        assert_eq!(call(parse_int, Data::Undefined, vec![s("0x1f")]), "31");
        assert_eq!(call(parse_int, Data::Undefined, vec![s("ff"), n(16.0)]), "255");
        assert_eq!(call(parse_int, Data::Undefined, vec![s("101"), n(2.0)]), "5");
        assert_eq!(call(parse_int, Data::Undefined, vec![s("px")]), "NaN");
        assert_eq!(call(parse_int, Data::Undefined, vec![s("1"), n(40.0)]), "NaN");
    }

    #[test]
    fn float_prefixes() {
        assert_eq!(call(parse_float, Data::Undefined, vec![s("3.25em")]), "3.25");
        assert_eq!(call(parse_float, Data::Undefined, vec![s(".5")]), "0.5");
        assert_eq!(call(parse_float, Data::Undefined, vec![s("1e3x")]), "1000");
        assert_eq!(call(parse_float, Data::Undefined, vec![s("-Infinity")]), "-Infinity");
        assert_eq!(call(parse_float, Data::Undefined, vec![s("e3")]), "NaN");
    }

    #[test]
    fn fixed_digits() {
        assert_eq!(call(to_fixed, n(3.14159), vec![n(2.0)]), "3.14");
        assert_eq!(call(to_fixed, n(2.5), vec![]), "3");
        assert_eq!(call(to_fixed, n(-2.5), vec![]), "-3");
        assert_eq!(call(to_fixed, n(1.0), vec![n(3.0)]), "1.000");
        assert_eq!(call(to_fixed, n(-0.0001), vec![n(2.0)]), "0.00");
        assert!(to_fixed(n(1.0), vec![n(101.0)]).is_err());
    }

    #[test]
    fn radix() {
        assert_eq!(call(number_to_string, n(255.0), vec![n(16.0)]), "ff");
        assert_eq!(call(number_to_string, n(-5.0), vec![n(2.0)]), "-101");
        assert_eq!(call(number_to_string, n(0.5), vec![n(2.0)]), "0.1");
        assert_eq!(call(number_to_string, n(1.5), vec![]), "1.5");
        assert!(number_to_string(n(1.0), vec![n(1.0)]).is_err());
    }

    #[test]
    fn json_output() {
        let data = Data::from_json(&json!({ "a": [1, "x", null], "b": true }));
        assert_eq!(
            call(stringify, Data::Undefined, vec![data.clone()]),
            r#"{"a":[1,"x",null],"b":true}"#
        );
        assert_eq!(
            call(stringify, Data::Undefined, vec![data, Data::Null, n(2.0)]),
            "{\n  \"a\": [\n    1,\n    \"x\",\n    null\n  ],\n  \"b\": true\n}"
        );
        assert!(matches!(
            stringify(Data::Undefined, vec![Data::Undefined]),
            Ok(Data::Undefined)
        ));
    }

    #[test]
    fn methods() {
        assert!(number_method("toFixed").is_some());
        assert!(number_method("trim").is_none());
        assert_eq!(
            boolean_method("toString").unwrap().call(Data::Boolean(true), vec![]).unwrap().to_string(),
            "true"
        );
    }
}
