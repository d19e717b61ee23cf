use crate::common::data::{Array, Data};

/// The argument at `index`, `undefined` if it wasn't passed.
pub fn arg(args: &[Data], index: usize) -> Data {
    args.get(index).cloned().unwrap_or(Data::Undefined)
}

/// The numeric value of the argument at `index`.
pub fn number(args: &[Data], index: usize) -> f64 { arg(args, index).to_number() }

/// Truncates towards zero; `NaN` becomes `0`.
pub fn integer(n: f64) -> f64 {
    if n.is_nan() {
        0.0
    } else {
        n.trunc()
    }
}

/// Resolves a `slice`-style index, where negative indices count from the
/// end, to a position in `0..=len`.
pub fn relative(index: f64, len: usize) -> usize {
    let index = integer(index);
    if index < 0.0 {
        (len as f64 + index).max(0.0) as usize
    } else {
        index.min(len as f64) as usize
    }
}

/// Like `relative`, but an `undefined` argument means `default`.
pub fn relative_arg(args: &[Data], index: usize, len: usize, default: usize) -> usize {
    match arg(args, index) {
        Data::Undefined => default,
        value => relative(value.to_number(), len),
    }
}

/// The array a method was called on.
pub fn this_array(this: &Data, method: &str) -> Result<Array, String> {
    match this {
        Data::Array(array) => Ok(array.clone()),
        other => Err(format!(
            "Array.prototype.{} called on {}",
            method,
            other.type_of()
        )),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn relative_indices() {
        assert_eq!(relative(1.0, 5), 1);
        assert_eq!(relative(-1.0, 5), 4);
        assert_eq!(relative(-10.0, 5), 0);
        assert_eq!(relative(10.0, 5), 5);
        assert_eq!(relative(f64::NAN, 5), 0);
        assert_eq!(relative(2.7, 5), 2);
    }

    #[test]
    fn missing_arguments_are_undefined() {
        assert!(matches!(arg(&[], 0), Data::Undefined));
        assert!(number(&[], 0).is_nan());
        assert_eq!(relative_arg(&[], 1, 5, 5), 5);
    }
}
