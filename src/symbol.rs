// Bound symbol (C3 in SPEC_FULL.md): a late-resolved (context, name) pair
// captured at compile time whenever an identifier refers to a *mutable*
// binding.
//
// Grounded on original_source/aplcore/src/datagrammar/boundsymbol.cpp:
// a weak context reference (to avoid the cycle a strong reference would
// create against the context's own strong-parent chain), resolved on
// demand, with structural equality on (context identity, name).

use std::rc::{Rc, Weak};

use crate::context::Context;
use crate::object::Object;

#[derive(Clone, Debug)]
pub struct BoundSymbol {
    context: Weak<Context>,
    pub name: Rc<str>,
}

impl BoundSymbol {
    pub fn new(context: &Rc<Context>, name: impl Into<Rc<str>>) -> BoundSymbol {
        BoundSymbol { context: Rc::downgrade(context), name: name.into() }
    }

    /// Resolve against the current value of the named binding. A context
    /// that has since been released resolves to Null rather than erroring
    /// — see SPEC_FULL.md §5.
    pub fn resolve(&self) -> Object {
        match self.context.upgrade() {
            Some(ctx) => ctx.find(&self.name).map(|o| o.value).unwrap_or(Object::Null),
            None => Object::Null,
        }
    }

    pub fn context(&self) -> Option<Rc<Context>> {
        self.context.upgrade()
    }

    pub fn to_debug_string(&self) -> String {
        format!("BoundSymbol<{}>", self.name)
    }
}

impl PartialEq for BoundSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.context.ptr_eq(&other.context) && self.name == other.name
    }
}

impl Eq for BoundSymbol {}

impl std::hash::Hash for BoundSymbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Hash on name plus the context's weak pointer address so that
        // symbols from distinct contexts never collide merely by name.
        self.name.hash(state);
        (self.context.as_ptr() as *const () as usize).hash(state);
    }
}
