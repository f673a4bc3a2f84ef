// The value model (C1 in SPEC_FULL.md): every datum that can flow through
// a compiled expression is an Object.
//
// Mirrors the teacher's vm::Value (src/vm.rs, now gone from this tree) in
// spirit: a small, cheaply-cloned sum type with Rc-backed compound
// variants. Arithmetic/comparison semantics are ported from
// original_source/aplcore/src/datagrammar/functions.cpp.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::bytecode::Bytecode;
use crate::symbol::BoundSymbol;

pub type ArrayHandle = Rc<RefCell<Vec<Object>>>;
pub type MapHandle = Rc<RefCell<IndexMap<String, Object>>>;

#[derive(Clone)]
pub struct Callable {
    pub name: Rc<str>,
    pub pure: bool,
    pub func: Rc<dyn Fn(&[Object]) -> Object>,
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable<{}, pure={}>", self.name, self.pure)
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Rc::ptr_eq(&self.func, &other.func)
    }
}

impl Callable {
    pub fn call(&self, args: &[Object]) -> Object {
        (self.func)(args)
    }
}

#[derive(Clone, Debug)]
pub enum Object {
    Null,
    Boolean(bool),
    Number(f64),
    String(Rc<str>),
    AbsoluteDimension(f64),
    RelativeDimension(f64),
    AutoDimension,
    Color(u32),
    Array(ArrayHandle),
    Map(MapHandle),
    BoundSymbol(BoundSymbol),
    Bytecode(Rc<RefCell<Bytecode>>),
    Callable(Callable),
}

impl Object {
    pub fn empty_string() -> Object {
        Object::String(Rc::from(""))
    }

    pub fn empty_array() -> Object {
        Object::Array(Rc::new(RefCell::new(Vec::new())))
    }

    pub fn empty_map() -> Object {
        Object::Map(Rc::new(RefCell::new(IndexMap::new())))
    }

    pub fn string<S: Into<String>>(s: S) -> Object {
        Object::String(Rc::from(s.into()))
    }

    pub fn array(items: Vec<Object>) -> Object {
        Object::Array(Rc::new(RefCell::new(items)))
    }

    pub fn map(items: IndexMap<String, Object>) -> Object {
        Object::Map(Rc::new(RefCell::new(items)))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Object::Number(_))
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Object::Number(v) if v.is_nan())
    }

    pub fn is_absolute_dimension(&self) -> bool {
        matches!(self, Object::AbsoluteDimension(_))
    }

    pub fn is_relative_dimension(&self) -> bool {
        matches!(self, Object::RelativeDimension(_))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Object::Callable(_))
    }

    pub fn is_pure(&self) -> bool {
        match self {
            Object::Callable(c) => c.pure,
            _ => true,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Object::Map(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Object::Array(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Object::String(_))
    }

    // Whether the value reduces to "on"/non-empty/non-zero/non-null.
    pub fn truthy(&self) -> bool {
        match self {
            Object::Null => false,
            Object::Boolean(v) => *v,
            Object::Number(v) => *v != 0.0,
            Object::String(s) => !s.is_empty(),
            Object::AbsoluteDimension(v) => *v != 0.0,
            Object::RelativeDimension(v) => *v != 0.0,
            Object::AutoDimension => false,
            Object::Color(c) => *c != 0,
            Object::Array(a) => !a.borrow().is_empty(),
            Object::Map(m) => !m.borrow().is_empty(),
            Object::BoundSymbol(_) => false,
            Object::Bytecode(_) => false,
            Object::Callable(_) => true,
        }
    }

    pub fn get_double(&self) -> f64 {
        match self {
            Object::Number(v) => *v,
            Object::AbsoluteDimension(v) => *v,
            Object::RelativeDimension(v) => *v,
            Object::Boolean(v) => {
                if *v {
                    1.0
                } else {
                    0.0
                }
            }
            _ => f64::NAN,
        }
    }

    // String coercion used by "+" and MERGE_STRING.
    pub fn as_string(&self) -> String {
        match self {
            Object::Null => String::new(),
            Object::Boolean(v) => v.to_string(),
            Object::Number(v) => format_number(*v),
            Object::String(s) => s.to_string(),
            Object::AbsoluteDimension(v) => format!("{}dp", format_number(*v)),
            Object::RelativeDimension(v) => format!("{}%", format_number(*v)),
            Object::AutoDimension => "auto".to_string(),
            Object::Color(c) => format!("#{:08x}", c),
            Object::Array(a) => {
                let items: Vec<String> = a.borrow().iter().map(|o| o.as_string()).collect();
                format!("[{}]", items.join(", "))
            }
            Object::Map(m) => {
                let items: Vec<String> = m
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.as_string()))
                    .collect();
                format!("{{{}}}", items.join(", "))
            }
            Object::BoundSymbol(b) => b.to_debug_string(),
            Object::Bytecode(_) => "<bytecode>".to_string(),
            Object::Callable(c) => format!("<function {}>", c.name),
        }
    }

    pub fn size(&self) -> Object {
        match self {
            Object::Array(a) => Object::Number(a.borrow().len() as f64),
            Object::Map(m) => Object::Number(m.borrow().len() as f64),
            Object::String(s) => Object::Number(s.chars().count() as f64),
            _ => Object::Null,
        }
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        use Object::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Number(a), Number(b)) => a == b,
            (String(a), String(b)) => a == b,
            (AbsoluteDimension(a), AbsoluteDimension(b)) => a == b,
            (RelativeDimension(a), RelativeDimension(b)) => a == b,
            (AutoDimension, AutoDimension) => true,
            (Color(a), Color(b)) => a == b,
            (Array(a), Array(b)) => *a.borrow() == *b.borrow(),
            (Map(a), Map(b)) => *a.borrow() == *b.borrow(),
            (BoundSymbol(a), BoundSymbol(b)) => a == b,
            (Bytecode(a), Bytecode(b)) => Rc::ptr_eq(a, b),
            (Callable(a), Callable(b)) => a == b,
            _ => false,
        }
    }
}

/// Raw scalar comparison: -1, 0, 1. Falls back to -1 ("incomparable") for
/// anything the original engine does not define an order over — including
/// mixed Absolute/Relative dimensions. See DESIGN.md's Open Question notes.
pub fn compare(a: &Object, b: &Object) -> i32 {
    fn cmp_f64(a: f64, b: f64) -> i32 {
        if a == b {
            0
        } else if a < b {
            -1
        } else {
            1
        }
    }

    use Object::*;
    match (a, b) {
        (Number(x), Number(y)) => cmp_f64(*x, *y),
        (Number(x), AbsoluteDimension(y)) => cmp_f64(*x, *y),
        (Number(x), RelativeDimension(y)) => cmp_f64(*x, *y),
        (AbsoluteDimension(x), Number(y)) => cmp_f64(*x, *y),
        (AbsoluteDimension(x), AbsoluteDimension(y)) => cmp_f64(*x, *y),
        (RelativeDimension(x), Number(y)) => cmp_f64(*x, *y),
        (RelativeDimension(x), RelativeDimension(y)) => cmp_f64(*x, *y),
        (String(x), String(y)) => {
            if x == y {
                0
            } else if x < y {
                -1
            } else {
                1
            }
        }
        (Boolean(x), Boolean(y)) if x == y => 0,
        (Color(x), Color(y)) if x == y => 0,
        (Null, Null) => 0,
        (AutoDimension, AutoDimension) => 0,
        _ => -1,
    }
}

/// `==`/`!=`/`<`/`<=`/`>`/`>=` as used by BC_OPCODE_COMPARE_OP. NaN on
/// either side makes every comparison false except `!=`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Lte,
    Eq,
    Neq,
    Gt,
    Gte,
}

pub fn compare_op(op: Comparison, a: &Object, b: &Object) -> bool {
    if a.is_nan() || b.is_nan() {
        return op == Comparison::Neq;
    }
    let value = compare(a, b);
    match op {
        Comparison::Lt => value == -1,
        Comparison::Lte => value != 1,
        Comparison::Eq => value == 0,
        Comparison::Neq => value != 0,
        Comparison::Gt => value == 1,
        Comparison::Gte => value != -1,
    }
}

// ---- Arithmetic, per spec.md §4.7 / functions.cpp ----

pub fn unary_plus(a: &Object) -> Object {
    match a {
        Object::Number(_) => a.clone(),
        Object::AbsoluteDimension(_) | Object::RelativeDimension(_) => a.clone(),
        _ => Object::Number(f64::NAN),
    }
}

pub fn unary_minus(a: &Object) -> Object {
    match a {
        Object::Number(v) => Object::Number(-v),
        Object::AbsoluteDimension(v) => Object::AbsoluteDimension(-v),
        Object::RelativeDimension(v) => Object::RelativeDimension(-v),
        _ => Object::Number(f64::NAN),
    }
}

pub fn unary_not(a: &Object) -> Object {
    Object::Boolean(!a.truthy())
}

pub fn multiply(a: &Object, b: &Object) -> Object {
    use Object::*;
    match (a, b) {
        (Number(x), Number(y)) => Number(x * y),
        (Number(x), AbsoluteDimension(y)) => AbsoluteDimension(x * y),
        (Number(x), RelativeDimension(y)) => RelativeDimension(x * y),
        (AbsoluteDimension(x), Number(y)) => AbsoluteDimension(x * y),
        (RelativeDimension(x), Number(y)) => RelativeDimension(x * y),
        _ => Number(f64::NAN),
    }
}

pub fn divide(a: &Object, b: &Object) -> Object {
    use Object::*;
    match (a, b) {
        (Number(x), Number(y)) => Number(x / y),
        (AbsoluteDimension(x), Number(y)) => AbsoluteDimension(x / y),
        (RelativeDimension(x), Number(y)) => RelativeDimension(x / y),
        (AbsoluteDimension(x), AbsoluteDimension(y)) => Number(x / y),
        (RelativeDimension(x), RelativeDimension(y)) => Number(x / y),
        _ => Number(f64::NAN),
    }
}

pub fn remainder(a: &Object, b: &Object) -> Object {
    use Object::*;
    match (a, b) {
        (Number(x), Number(y)) => Number(x % y),
        (AbsoluteDimension(x), Number(y)) => AbsoluteDimension(x % y),
        (RelativeDimension(x), Number(y)) => RelativeDimension(x % y),
        (AbsoluteDimension(x), AbsoluteDimension(y)) => Number(x % y),
        (RelativeDimension(x), RelativeDimension(y)) => Number(x % y),
        _ => Number(f64::NAN),
    }
}

pub fn add(a: &Object, b: &Object) -> Object {
    use Object::*;
    match (a, b) {
        (Number(x), Number(y)) => Number(x + y),
        (Number(x), AbsoluteDimension(y)) => AbsoluteDimension(x + y),
        (Number(x), RelativeDimension(y)) => RelativeDimension(x + y),
        (AbsoluteDimension(x), Number(y)) => AbsoluteDimension(x + y),
        (AbsoluteDimension(x), AbsoluteDimension(y)) => AbsoluteDimension(x + y),
        (RelativeDimension(x), Number(y)) => RelativeDimension(x + y),
        (RelativeDimension(x), RelativeDimension(y)) => RelativeDimension(x + y),
        _ => Object::string(a.as_string() + &b.as_string()),
    }
}

pub fn subtract(a: &Object, b: &Object) -> Object {
    use Object::*;
    match (a, b) {
        (Number(x), Number(y)) => Number(x - y),
        (Number(x), AbsoluteDimension(y)) => AbsoluteDimension(x - y),
        (Number(x), RelativeDimension(y)) => RelativeDimension(x - y),
        (AbsoluteDimension(x), Number(y)) => AbsoluteDimension(x - y),
        (AbsoluteDimension(x), AbsoluteDimension(y)) => AbsoluteDimension(x - y),
        (RelativeDimension(x), Number(y)) => RelativeDimension(x - y),
        (RelativeDimension(x), RelativeDimension(y)) => RelativeDimension(x - y),
        _ => Number(f64::NAN),
    }
}

/// A.B — field access. Non-Map targets yield Null, except Array.length.
pub fn field_access(target: &Object, key: &Object) -> Object {
    match (target, key) {
        (Object::Map(m), Object::String(k)) => m.borrow().get(k.as_ref()).cloned().unwrap_or(Object::Null),
        (Object::Array(_), Object::String(k)) if k.as_ref() == "length" => target.size(),
        _ => Object::Null,
    }
}

/// A[B] — index access. Supports Map-by-string (same as field access),
/// Array.length, and negative-modulo numeric indices.
pub fn array_access(target: &Object, index: &Object) -> Object {
    match (target, index) {
        (Object::Map(m), Object::String(k)) => m.borrow().get(k.as_ref()).cloned().unwrap_or(Object::Null),
        (Object::Array(_), Object::String(k)) if k.as_ref() == "length" => target.size(),
        (Object::Array(a), Object::Number(n)) => {
            let items = a.borrow();
            let len = items.len() as i64;
            let mut idx = n.round() as i64;
            if idx < 0 {
                idx += len;
            }
            if idx < 0 || idx >= len {
                Object::Null
            } else {
                items[idx as usize].clone()
            }
        }
        _ => Object::Null,
    }
}

/// String merge used by MERGE_STRING: identity through an empty string,
/// concatenation via string coercion otherwise.
pub fn merge(a: &Object, b: &Object) -> Object {
    if let Object::String(s) = a {
        if s.is_empty() {
            return b.clone();
        }
    }
    if let Object::String(s) = b {
        if s.is_empty() {
            return a.clone();
        }
    }
    Object::string(a.as_string() + &b.as_string())
}
