//! Methods on arrays.
//! Methods taking a callback need to call back into template code, so they
//! are run by the VM; see `Callback`.

use crate::{
    common::{
        closure::{Native, NativeFn},
        data::Data,
    },
    core::extract::{arg, relative_arg, this_array},
};

/// Array methods that call a function for each item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    Map,
    Filter,
    ForEach,
}

impl Callback {
    pub fn from_name(name: &str) -> Option<Callback> {
        Some(match name {
            "map" => Callback::Map,
            "filter" => Callback::Filter,
            "forEach" => Callback::ForEach,
            _ => return None,
        })
    }
}

/// Stands in for the callback methods outside of a method call.
fn callback(_: Data, _: Vec<Data>) -> Result<Data, String> {
    Err("Array callback methods must be called on an array".to_string())
}

/// Appends items, returns the new length.
pub fn push(this: Data, args: Vec<Data>) -> Result<Data, String> {
    let array = this_array(&this, "push")?;
    let mut items = array.borrow_mut();
    items.extend(args);
    Ok(Data::Number(items.len() as f64))
}

pub fn pop(this: Data, _: Vec<Data>) -> Result<Data, String> {
    let array = this_array(&this, "pop")?;
    let popped = array.borrow_mut().pop();
    Ok(popped.unwrap_or(Data::Undefined))
}

/// Joins the items' string forms, `null` and `undefined` as empty strings.
pub fn join(this: Data, args: Vec<Data>) -> Result<Data, String> {
    let array = this_array(&this, "join")?;
    let separator = match arg(&args, 0) {
        Data::Undefined => ",".to_string(),
        other => other.to_string(),
    };

    let items = array.borrow();
    let mut joined = String::new();
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            joined.push_str(&separator);
        }
        if !item.is_nullish() {
            joined.push_str(&item.to_string());
        }
    }
    Ok(Data::String(joined))
}

pub fn index_of(this: Data, args: Vec<Data>) -> Result<Data, String> {
    let array = this_array(&this, "indexOf")?;
    let needle = arg(&args, 0);
    let index = array
        .borrow()
        .iter()
        .position(|item| item.strict_eq(&needle))
        .map_or(-1.0, |i| i as f64);
    Ok(Data::Number(index))
}

pub fn slice(this: Data, args: Vec<Data>) -> Result<Data, String> {
    let array = this_array(&this, "slice")?;
    let items = array.borrow();
    let len = items.len();
    let start = relative_arg(&args, 0, len, 0);
    let end = relative_arg(&args, 1, len, len);
    let sliced = if start < end {
        items[start..end].to_vec()
    } else {
        vec![]
    };
    Ok(Data::array(sliced))
}

/// A new array with the items of this one, then the arguments.
/// Array arguments are spread one level.
pub fn concat(this: Data, args: Vec<Data>) -> Result<Data, String> {
    let array = this_array(&this, "concat")?;
    let mut items = array.borrow().clone();
    for arg in args {
        match arg {
            Data::Array(other) => items.extend(other.borrow().iter().cloned()),
            other => items.push(other),
        }
    }
    Ok(Data::array(items))
}

/// Reverses in place and returns the same array.
pub fn reverse(this: Data, _: Vec<Data>) -> Result<Data, String> {
    let array = this_array(&this, "reverse")?;
    array.borrow_mut().reverse();
    Ok(this)
}

static METHODS: [(&str, NativeFn); 10] = [
    ("push", push),
    ("pop", pop),
    ("join", join),
    ("indexOf", index_of),
    ("slice", slice),
    ("concat", concat),
    ("reverse", reverse),
    ("map", callback),
    ("filter", callback),
    ("forEach", callback),
];

/// Looks up an array method by name.
pub fn method(name: &str) -> Option<Native> {
    METHODS
        .iter()
        .find(|(method, _)| *method == name)
        .map(|(method, fun)| Native::new(*method, *fun))
}
