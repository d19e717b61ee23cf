//! The core library: builtin globals and the methods
//! available on strings, arrays, numbers and booleans.

pub mod array;
pub mod convert;
pub mod extract;
pub mod math;
pub mod string;

use std::collections::HashMap;

use crate::common::{
    closure::{Native, NativeFn},
    data::Data,
};

/// The names every template can see, unless shadowed.
pub fn globals() -> HashMap<String, Data> {
    let functions: [(&'static str, NativeFn); 7] = [
        ("$escape", convert::escape),
        ("String", convert::string),
        ("Number", convert::number),
        ("Boolean", convert::boolean),
        ("parseInt", convert::parse_int),
        ("parseFloat", convert::parse_float),
        ("isNaN", convert::is_nan),
    ];

    let mut globals: HashMap<String, Data> = functions
        .into_iter()
        .map(|(name, fun)| (name.to_string(), Data::Native(Native::new(name, fun))))
        .collect();
    globals.insert("Math".to_string(), math::object());
    globals.insert("JSON".to_string(), convert::json());
    globals
}

/// Looks up a builtin method on a value.
/// Properties that depend on the value itself, like `length`,
/// are resolved by the VM before falling back to this.
pub fn member(value: &Data, name: &str) -> Option<Data> {
    let method = match value {
        Data::String(_) => string::method(name),
        Data::Array(_) => array::method(name),
        Data::Number(_) => convert::number_method(name),
        Data::Boolean(_) => convert::boolean_method(name),
        _ => None,
    };
    method.map(Data::Native)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn globals_are_builtins() {
        let globals = globals();
        for name in ["$escape", "String", "parseInt", "isNaN", "Math", "JSON"] {
            assert!(globals.contains_key(name), "missing {}", name);
        }
        assert_eq!(globals["Math"].type_of(), "object");
    }

    #[test]
    fn members_by_type() {
        assert!(member(&Data::string("x"), "toUpperCase").is_some());
        assert!(member(&Data::array(vec![]), "push").is_some());
        assert!(member(&Data::Number(1.0), "toFixed").is_some());
        assert!(member(&Data::Boolean(true), "toString").is_some());
        assert!(member(&Data::Number(1.0), "push").is_none());
        assert!(member(&Data::Null, "toString").is_none());
    }
}
