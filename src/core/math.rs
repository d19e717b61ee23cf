use indexmap::IndexMap;

use crate::{
    common::{
        closure::{Native, NativeFn},
        data::Data,
    },
    core::extract::number,
};

/// Rounds half way cases up, towards positive infinity.
pub fn round(_: Data, args: Vec<Data>) -> Result<Data, String> {
    let n = number(&args, 0);
    let rounded = (n + 0.5).floor();
    // keep the sign of values that round to zero, e.g. -0.2
    Ok(Data::Number(if rounded == 0.0 && n < 0.0 { -0.0 } else { rounded }))
}

pub fn floor(_: Data, args: Vec<Data>) -> Result<Data, String> {
    Ok(Data::Number(number(&args, 0).floor()))
}

pub fn ceil(_: Data, args: Vec<Data>) -> Result<Data, String> {
    Ok(Data::Number(number(&args, 0).ceil()))
}

pub fn abs(_: Data, args: Vec<Data>) -> Result<Data, String> {
    Ok(Data::Number(number(&args, 0).abs()))
}

pub fn sqrt(_: Data, args: Vec<Data>) -> Result<Data, String> {
    Ok(Data::Number(number(&args, 0).sqrt()))
}

pub fn pow(_: Data, args: Vec<Data>) -> Result<Data, String> {
    Ok(Data::Number(number(&args, 0).powf(number(&args, 1))))
}

/// The smallest argument; `Infinity` without arguments, `NaN` if any
/// argument is not a number.
pub fn min(_: Data, args: Vec<Data>) -> Result<Data, String> {
    let mut result = f64::INFINITY;
    for arg in args.iter() {
        let n = arg.to_number();
        if n.is_nan() {
            return Ok(Data::Number(f64::NAN));
        }
        result = result.min(n);
    }
    Ok(Data::Number(result))
}

/// The largest argument; `-Infinity` without arguments, `NaN` if any
/// argument is not a number.
pub fn max(_: Data, args: Vec<Data>) -> Result<Data, String> {
    let mut result = f64::NEG_INFINITY;
    for arg in args.iter() {
        let n = arg.to_number();
        if n.is_nan() {
            return Ok(Data::Number(f64::NAN));
        }
        result = result.max(n);
    }
    Ok(Data::Number(result))
}

/// The `Math` global.
pub fn object() -> Data {
    let mut math = IndexMap::new();
    let functions: [(&'static str, NativeFn); 8] = [
        ("floor", floor),
        ("ceil", ceil),
        ("round", round),
        ("abs", abs),
        ("min", min),
        ("max", max),
        ("pow", pow),
        ("sqrt", sqrt),
    ];
    for (name, fun) in functions {
        math.insert(name.to_string(), Data::Native(Native::new(name, fun)));
    }
    math.insert("PI".to_string(), Data::Number(std::f64::consts::PI));
    Data::object(math)
}

#[cfg(test)]
mod test {
    use super::*;

    fn call(fun: NativeFn, args: &[f64]) -> f64 {
        let args = args.iter().map(|n| Data::Number(*n)).collect();
        match fun(Data::Undefined, args) {
            Ok(Data::Number(n)) => n,
            other => panic!("expected a number, got {:?}", other),
        }
    }

    #[test]
    fn rounding() {
        assert_eq!(call(round, &[2.5]), 3.0);
        assert_eq!(call(round, &[-2.5]), -2.0);
        assert_eq!(call(round, &[2.4]), 2.0);
        assert_eq!(call(floor, &[-1.5]), -2.0);
        assert_eq!(call(ceil, &[1.2]), 2.0);
    }

    #[test]
    fn extremes() {
        assert_eq!(call(min, &[3.0, 1.0, 2.0]), 1.0);
        assert_eq!(call(max, &[3.0, 1.0, 2.0]), 3.0);
        assert_eq!(call(min, &[]), f64::INFINITY);
        assert!(call(max, &[1.0, f64::NAN]).is_nan());
    }

    #[test]
    fn powers() {
        assert_eq!(call(pow, &[2.0, 10.0]), 1024.0);
        assert_eq!(call(sqrt, &[9.0]), 3.0);
        assert_eq!(call(abs, &[-4.0]), 4.0);
    }

    #[test]
    fn missing_arguments() {
        assert!(call(floor, &[]).is_nan());
    }
}
