// Binding context (C2 in SPEC_FULL.md): a parent-chained scope of named
// bindings.
//
// Generalizes the teacher's Env<T> (src/env.rs — a RefCell<Map<T>> plus an
// Option<Node<Env<T>>> parent) to carry a ContextObject instead of a bare
// value, per original_source/aplcore/include/apl/engine/context.h and
// contextobject.h.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::object::Object;

/// A single binding: its current value, mutability class, and provenance
/// (a path string recorded for diagnostics only — never consulted by
/// evaluation).
#[derive(Clone, Debug)]
pub struct ContextObject {
    pub value: Object,
    pub mutable: bool,
    pub user_writable: bool,
    pub provenance: String,
}

impl ContextObject {
    pub fn immutable(value: Object) -> ContextObject {
        ContextObject { value, mutable: false, user_writable: false, provenance: String::new() }
    }

    pub fn mutable(value: Object) -> ContextObject {
        ContextObject { value, mutable: true, user_writable: false, provenance: String::new() }
    }

    pub fn with_provenance(mut self, provenance: impl Into<String>) -> ContextObject {
        self.provenance = provenance.into();
        self
    }
}

/// A node in the binding-context tree. Children hold a strong `Rc` to
/// their parent; `BoundSymbol` (C3) instead holds a `Weak<Context>` back
/// into this tree, so the two together never form a cycle.
pub struct Context {
    scope: RefCell<HashMap<String, ContextObject>>,
    parent: Option<Rc<Context>>,
}

impl Context {
    pub fn root() -> Rc<Context> {
        Rc::new(Context { scope: RefCell::new(HashMap::new()), parent: None })
    }

    pub fn chain(parent: &Rc<Context>) -> Rc<Context> {
        Rc::new(Context { scope: RefCell::new(HashMap::new()), parent: Some(parent.clone()) })
    }

    /// Walk this node and its ancestors for `name`.
    pub fn find(&self, name: &str) -> Option<ContextObject> {
        if let Some(obj) = self.scope.borrow().get(name) {
            Some(obj.clone())
        } else if let Some(parent) = &self.parent {
            parent.find(name)
        } else {
            None
        }
    }

    pub fn is_mutable(&self, name: &str) -> bool {
        self.find(name).map(|o| o.mutable).unwrap_or(false)
    }

    /// Define a binding in *this* node's scope (shadowing any parent
    /// binding of the same name).
    pub fn define(&self, name: impl Into<String>, value: ContextObject) {
        self.scope.borrow_mut().insert(name.into(), value);
    }

    /// Write to a mutable binding found anywhere in the chain. A no-op on
    /// an immutable binding or when the new value already equals the old
    /// one. Returns whether the binding actually changed — the signal a
    /// reactive layer (C10) uses to mark dependents dirty.
    pub fn set(self: &Rc<Self>, name: &str, value: Object) -> bool {
        if self.set_local(name, &value) {
            return true;
        }
        match &self.parent {
            Some(parent) => parent.set(name, value),
            None => false,
        }
    }

    fn set_local(&self, name: &str, value: &Object) -> bool {
        let mut scope = self.scope.borrow_mut();
        match scope.get_mut(name) {
            Some(obj) if obj.mutable => {
                if obj.value == *value {
                    false
                } else {
                    obj.value = value.clone();
                    true
                }
            }
            Some(_) => false,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_parent_chain() {
        let root = Context::root();
        root.define("a", ContextObject::immutable(Object::Number(1.0)));
        let child = Context::chain(&root);
        child.define("b", ContextObject::immutable(Object::Number(2.0)));

        assert_eq!(child.find("a").unwrap().value, Object::Number(1.0));
        assert_eq!(child.find("b").unwrap().value, Object::Number(2.0));
        assert!(root.find("b").is_none());
    }

    #[test]
    fn set_is_noop_on_immutable_binding() {
        let root = Context::root();
        root.define("a", ContextObject::immutable(Object::Number(1.0)));
        assert!(!root.set("a", Object::Number(2.0)));
        assert_eq!(root.find("a").unwrap().value, Object::Number(1.0));
    }

    #[test]
    fn set_is_noop_on_equal_value() {
        let root = Context::root();
        root.define("a", ContextObject::mutable(Object::Number(1.0)));
        assert!(!root.set("a", Object::Number(1.0)));
        assert!(root.set("a", Object::Number(2.0)));
        assert_eq!(root.find("a").unwrap().value, Object::Number(2.0));
    }
}
