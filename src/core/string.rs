//! Methods on strings.
//! Positions count characters, not bytes.

use crate::{
    common::{
        closure::{Native, NativeFn},
        data::Data,
    },
    core::extract::{arg, integer, number, relative_arg},
};

fn chars(this: &Data) -> Vec<char> { this.to_string().chars().collect() }

fn collect(chars: &[char]) -> Data { Data::String(chars.iter().collect()) }

/// Finds `needle` in `haystack`, starting at character `from`.
fn find(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    (from..haystack.len())
        .find(|start| haystack[*start..].starts_with(needle))
}

pub fn char_at(this: Data, args: Vec<Data>) -> Result<Data, String> {
    let chars = chars(&this);
    let index = integer(number(&args, 0));
    let found = if index >= 0.0 {
        chars.get(index as usize)
    } else {
        None
    };
    Ok(Data::String(found.map(char::to_string).unwrap_or_default()))
}

pub fn index_of(this: Data, args: Vec<Data>) -> Result<Data, String> {
    let chars = chars(&this);
    let needle: Vec<char> = arg(&args, 0).to_string().chars().collect();
    let from = integer(number(&args, 1)).max(0.0) as usize;
    let index = find(&chars, &needle, from).map_or(-1.0, |i| i as f64);
    Ok(Data::Number(index))
}

pub fn slice(this: Data, args: Vec<Data>) -> Result<Data, String> {
    let chars = chars(&this);
    let len = chars.len();
    let start = relative_arg(&args, 0, len, 0);
    let end = relative_arg(&args, 1, len, len);
    Ok(collect(if start < end { &chars[start..end] } else { &[] }))
}

/// Like `slice`, but negative indices are `0` and the bounds may be swapped.
pub fn substring(this: Data, args: Vec<Data>) -> Result<Data, String> {
    let chars = chars(&this);
    let len = chars.len();
    let clamp = |data: Data, default: usize| match data {
        Data::Undefined => default,
        value => integer(value.to_number()).max(0.0).min(len as f64) as usize,
    };
    let start = clamp(arg(&args, 0), 0);
    let end = clamp(arg(&args, 1), len);
    let (start, end) = if start > end { (end, start) } else { (start, end) };
    Ok(collect(&chars[start..end]))
}

pub fn to_upper_case(this: Data, _: Vec<Data>) -> Result<Data, String> {
    Ok(Data::String(this.to_string().to_uppercase()))
}

pub fn to_lower_case(this: Data, _: Vec<Data>) -> Result<Data, String> {
    Ok(Data::String(this.to_string().to_lowercase()))
}

pub fn trim(this: Data, _: Vec<Data>) -> Result<Data, String> {
    Ok(Data::String(this.to_string().trim().to_string()))
}

pub fn to_string(this: Data, _: Vec<Data>) -> Result<Data, String> {
    Ok(Data::String(this.to_string()))
}

/// Splits on a literal separator.
/// Without a separator the whole string is the only piece,
/// an empty separator splits into characters.
pub fn split(this: Data, args: Vec<Data>) -> Result<Data, String> {
    let string = this.to_string();
    let limit = match arg(&args, 1) {
        Data::Undefined => usize::MAX,
        value => integer(value.to_number()).max(0.0) as usize,
    };

    let pieces: Vec<Data> = match arg(&args, 0) {
        Data::Undefined => vec![Data::String(string)],
        separator => {
            let separator = separator.to_string();
            if separator.is_empty() {
                string.chars().map(|c| Data::String(c.to_string())).collect()
            } else {
                string.split(separator.as_str()).map(Data::string).collect()
            }
        },
    };

    Ok(Data::array(pieces.into_iter().take(limit).collect()))
}

/// Replaces the first occurrence of a literal pattern.
pub fn replace(this: Data, args: Vec<Data>) -> Result<Data, String> {
    let string = this.to_string();
    let pattern = arg(&args, 0).to_string();
    let replacement = arg(&args, 1).to_string();
    Ok(Data::String(string.replacen(&pattern, &replacement, 1)))
}

static METHODS: [(&str, NativeFn); 10] = [
    ("charAt", char_at),
    ("indexOf", index_of),
    ("slice", slice),
    ("substring", substring),
    ("toUpperCase", to_upper_case),
    ("toLowerCase", to_lower_case),
    ("trim", trim),
    ("split", split),
    ("replace", replace),
    ("toString", to_string),
];

/// Looks up a string method by name.
pub fn method(name: &str) -> Option<Native> {
    METHODS
        .iter()
        .find(|(method, _)| *method == name)
        .map(|(method, fun)| Native::new(*method, *fun))
}

#[cfg(test)]
mod test {
    use super::*;

    fn call(name: &str, this: &str, args: Vec<Data>) -> Data {
        let native = method(name).unwrap();
        native.call(Data::string(this), args).unwrap()
    }

    fn n(n: f64) -> Data { Data::Number(n) }
    fn s(s: &str) -> Data { Data::string(s) }

    #[test]
    fn positions_count_characters() {
        assert_eq!(call("charAt", "héllo", vec![n(1.0)]).to_string(), "é");
        assert_eq!(call("charAt", "abc", vec![n(5.0)]).to_string(), "");
        assert_eq!(call("indexOf", "héllo", vec![s("l")]).to_string(), "2");
        assert_eq!(call("indexOf", "abc", vec![s("z")]).to_string(), "-1");
        assert_eq!(call("indexOf", "abab", vec![s("ab"), n(1.0)]).to_string(), "2");
    }

    #[test]
    fn slicing() {
        assert_eq!(call("slice", "template", vec![n(1.0), n(4.0)]).to_string(), "emp");
        assert_eq!(call("slice", "template", vec![n(-4.0)]).to_string(), "late");
        assert_eq!(call("slice", "template", vec![n(4.0), n(1.0)]).to_string(), "");
        assert_eq!(call("substring", "template", vec![n(4.0), n(1.0)]).to_string(), "emp");
        assert_eq!(call("substring", "template", vec![n(-3.0)]).to_string(), "template");
    }

    #[test]
    fn case_and_whitespace() {
        assert_eq!(call("toUpperCase", "abc", vec![]).to_string(), "ABC");
        assert_eq!(call("toLowerCase", "ABC", vec![]).to_string(), "abc");
        assert_eq!(call("trim", "  x \n", vec![]).to_string(), "x");
    }

    #[test]
    fn splitting() {
        assert_eq!(call("split", "a,b,c", vec![s(",")]).to_string(), "a,b,c");
        match call("split", "a,b,c", vec![s(","), n(2.0)]) {
            Data::Array(items) => assert_eq!(items.borrow().len(), 2),
            other => panic!("{:?}", other),
        }
        match call("split", "abc", vec![s("")]) {
            Data::Array(items) => assert_eq!(items.borrow().len(), 3),
            other => panic!("{:?}", other),
        }
        match call("split", "abc", vec![]) {
            Data::Array(items) => assert_eq!(items.borrow().len(), 1),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn replace_only_the_first_occurrence() {
        assert_eq!(call("replace", "a-b-c", vec![s("-"), s("+")]).to_string(), "a+b-c");
    }

    #[test]
    fn unknown_methods() {
        assert!(method("bogus").is_none());
    }
}
