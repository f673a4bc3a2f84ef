// Reactive dependency interface (C10 in SPEC_FULL.md).
//
// This has no counterpart in the teacher: it is the hook a host
// application implements to re-run `eval` when a bound symbol's underlying
// value changes. The engine itself never schedules re-evaluation — it only
// reports, via `extract::symbols`, which symbols a compiled expression
// touched, and via `Context::set`'s return value, whether a write actually
// changed anything.

use crate::symbol::BoundSymbol;

/// Implemented by a host that wants to know when a symbol a compiled
/// expression depends on has changed value, so it can re-run `eval`.
pub trait DependencyObserver {
    fn on_symbol_changed(&self, symbol: &BoundSymbol);
}

/// Convenience: write `value` into `name` in `context` and, if the write
/// actually changed the binding, notify `observer` for every symbol in
/// `dependencies` that names the same binding.
pub fn notify_on_write(
    context: &std::rc::Rc<crate::context::Context>,
    name: &str,
    value: crate::object::Object,
    dependencies: &std::collections::HashSet<BoundSymbol>,
    observer: &dyn DependencyObserver,
) {
    if !context.set(name, value) {
        return;
    }
    for symbol in dependencies {
        if symbol.name.as_ref() == name {
            observer.on_symbol_changed(symbol);
        }
    }
}
