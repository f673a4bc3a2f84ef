// Callable registry (SPEC_FULL.md §4.10): the built-in Math.*/String.*
// functions made available as an immutable `Map` binding under the root
// context, so expressions reach them through ordinary field access
// (`${Math.max(1,2)}`) rather than a special call syntax.
//
// Grounded on original_source/aplcore/src/datagrammar/functions.cpp, which
// registers the same surface (min/max/abs/floor/ceil/round, a non-pure
// random, and string/array length helpers) as a table of std::function
// entries tagged pure/impure for the optimizer's constant-folding pass.

use indexmap::IndexMap;

use crate::object::{Callable, Object};

fn pure(name: &str, func: impl Fn(&[Object]) -> Object + 'static) -> Object {
    Object::Callable(Callable { name: std::rc::Rc::from(name), pure: true, func: std::rc::Rc::new(func) })
}

fn impure(name: &str, func: impl Fn(&[Object]) -> Object + 'static) -> Object {
    Object::Callable(Callable { name: std::rc::Rc::from(name), pure: false, func: std::rc::Rc::new(func) })
}

fn numeric_args(args: &[Object]) -> Vec<f64> {
    args.iter().map(|o| o.get_double()).collect()
}

/// Build the `Math` namespace map.
fn math_namespace() -> Object {
    let mut m = IndexMap::new();

    m.insert(
        "min".to_string(),
        pure("Math.min", |args| {
            let nums = numeric_args(args);
            Object::Number(nums.into_iter().fold(f64::INFINITY, f64::min))
        }),
    );
    m.insert(
        "max".to_string(),
        pure("Math.max", |args| {
            let nums = numeric_args(args);
            Object::Number(nums.into_iter().fold(f64::NEG_INFINITY, f64::max))
        }),
    );
    m.insert(
        "abs".to_string(),
        pure("Math.abs", |args| Object::Number(args.get(0).map(|o| o.get_double()).unwrap_or(f64::NAN).abs())),
    );
    m.insert(
        "floor".to_string(),
        pure("Math.floor", |args| Object::Number(args.get(0).map(|o| o.get_double()).unwrap_or(f64::NAN).floor())),
    );
    m.insert(
        "ceil".to_string(),
        pure("Math.ceil", |args| Object::Number(args.get(0).map(|o| o.get_double()).unwrap_or(f64::NAN).ceil())),
    );
    m.insert(
        "round".to_string(),
        pure("Math.round", |args| Object::Number(args.get(0).map(|o| o.get_double()).unwrap_or(f64::NAN).round())),
    );
    // Impure: two calls in the same expression must not be folded into one
    // constant by the optimizer, so this is excluded from constant-folding
    // eligibility (see optimizer.rs's per-block purity check).
    m.insert(
        "random".to_string(),
        impure("Math.random", |_args| {
            use std::cell::Cell;
            use std::time::{SystemTime, UNIX_EPOCH};
            thread_local! {
                static SEED: Cell<u64> = Cell::new(
                    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0x9e3779b97f4a7c15),
                );
            }
            SEED.with(|seed| {
                let mut x = seed.get();
                x ^= x << 13;
                x ^= x >> 7;
                x ^= x << 17;
                seed.set(x);
                Object::Number((x >> 11) as f64 / (1u64 << 53) as f64)
            })
        }),
    );

    Object::map(m)
}

/// Build the `String` namespace map.
fn string_namespace() -> Object {
    let mut m = IndexMap::new();

    m.insert(
        "toUpperCase".to_string(),
        pure("String.toUpperCase", |args| match args.get(0) {
            Some(Object::String(s)) => Object::string(s.to_uppercase()),
            Some(other) => Object::string(other.as_string().to_uppercase()),
            None => Object::empty_string(),
        }),
    );
    m.insert(
        "toLowerCase".to_string(),
        pure("String.toLowerCase", |args| match args.get(0) {
            Some(Object::String(s)) => Object::string(s.to_lowercase()),
            Some(other) => Object::string(other.as_string().to_lowercase()),
            None => Object::empty_string(),
        }),
    );
    m.insert("length".to_string(), pure("String.length", |args| args.get(0).map(|o| o.size()).unwrap_or(Object::Null)));

    Object::map(m)
}

/// Build the `Array` namespace map (only `length`, mirroring the teacher's
/// preference for a single helper per surface rather than a full stdlib).
fn array_namespace() -> Object {
    let mut m = IndexMap::new();
    m.insert("length".to_string(), pure("Array.length", |args| args.get(0).map(|o| o.size()).unwrap_or(Object::Null)));
    Object::map(m)
}

/// All built-in namespaces, to be installed as immutable root bindings
/// (`Math`, `String`, `Array`) by whoever constructs the root context —
/// see lib.rs's `compile`.
pub fn builtins() -> Vec<(&'static str, Object)> {
    vec![("Math", math_namespace()), ("String", string_namespace()), ("Array", array_namespace())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::field_access;

    fn call(namespace: &Object, name: &str, args: &[Object]) -> Object {
        match field_access(namespace, &Object::string(name)) {
            Object::Callable(c) => c.call(args),
            other => other,
        }
    }

    #[test]
    fn math_min_max_abs() {
        let math = math_namespace();
        assert_eq!(call(&math, "min", &[Object::Number(3.0), Object::Number(1.0)]), Object::Number(1.0));
        assert_eq!(call(&math, "max", &[Object::Number(3.0), Object::Number(1.0)]), Object::Number(3.0));
        assert_eq!(call(&math, "abs", &[Object::Number(-4.0)]), Object::Number(4.0));
    }

    #[test]
    fn math_random_is_impure() {
        let math = math_namespace();
        match field_access(&math, &Object::string("random")) {
            Object::Callable(c) => assert!(!c.pure),
            _ => panic!("expected callable"),
        }
    }

    #[test]
    fn string_case_conversion() {
        let s = string_namespace();
        assert_eq!(call(&s, "toUpperCase", &[Object::string("ab")]), Object::string("AB"));
        assert_eq!(call(&s, "toLowerCase", &[Object::string("AB")]), Object::string("ab"));
        assert_eq!(call(&s, "length", &[Object::string("abc")]), Object::Number(3.0));
    }
}
