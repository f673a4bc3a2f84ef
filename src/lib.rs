//! A PEG-parsed, bytecode-compiled data-binding expression engine for
//! `${...}` templates: parse, peephole-optimize, and stack-evaluate a
//! small expression language against a hierarchical binding context.

pub mod assembler;
pub mod bytecode;
pub mod config;
pub mod context;
pub mod dimension;
pub mod error;
pub mod evaluator;
pub mod extract;
pub mod functions;
pub mod object;
pub mod optimizer;
pub mod parser;
pub mod reactive;
pub mod session;
pub mod symbol;

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

pub use bytecode::Bytecode;
pub use context::{Context, ContextObject};
pub use object::Object;
pub use symbol::BoundSymbol;

use config::Config;
use session::{LogSession, Session};

/// Builds a root context with `Math`/`String`/`Array` installed as
/// immutable bindings, the starting point for any caller that wants the
/// built-in function namespaces available to compiled expressions.
pub fn root_context() -> Rc<Context> {
    let ctx = Context::root();
    for (name, value) in functions::builtins() {
        ctx.define(name, ContextObject::immutable(value));
    }
    ctx
}

/// Compile `text` against `context` using default configuration (a
/// zero-sized viewport) and log-crate-backed diagnostics.
pub fn compile(context: &Rc<Context>, text: &str) -> Object {
    compile_with(context, text, &Config::default(), &LogSession)
}

/// Compile `text`, routing parse diagnostics through `session` and
/// resolving `vh`/`vw` dimension literals against `config.viewport`.
pub fn compile_with(context: &Rc<Context>, text: &str, config: &Config, session: &dyn Session) -> Object {
    parser::compile(context, &config.viewport, config.limits.max_nesting_depth, text, session)
}

/// Evaluate a compiled expression, logging diagnostics through the default
/// `log`-crate-backed session. Optimizes `bytecode` in place first if it
/// hasn't been already, same lazy-optimize-before-use idiom as `symbols`.
pub fn eval(bytecode: &mut Bytecode) -> Object {
    eval_with(bytecode, &LogSession)
}

pub fn eval_with(bytecode: &mut Bytecode, session: &dyn Session) -> Object {
    if !bytecode.optimized {
        optimizer::optimize(bytecode);
    }
    evaluator::eval(bytecode, session)
}

/// Peephole-optimizes `bytecode` and, if the result touches no bound
/// symbol and invoked no impure call, collapses it to the plain constant
/// it always evaluates to. Otherwise returns the optimized code wrapped
/// back up as `Object::Bytecode`.
pub fn simplify(mut bytecode: Bytecode) -> Object {
    optimizer::optimize(&mut bytecode);
    if bytecode.instructions.len() == 1 {
        let instr = bytecode.instructions[0];
        if instr.op.is_load() && instr.op != bytecode::Opcode::LoadBoundSymbol {
            return eval_with(&mut bytecode, &session::NullSession);
        }
    }
    Object::Bytecode(Rc::new(RefCell::new(bytecode)))
}

/// Optimizes `bytecode` in place (if not already optimized) and returns
/// every bound symbol its now-reachable instructions depend on.
pub fn symbols(bytecode: &mut Bytecode) -> HashSet<BoundSymbol> {
    if !bytecode.optimized {
        optimizer::optimize(bytecode);
    }
    extract::symbols(bytecode)
}

impl Object {
    /// `eval(&self)` for an already-compiled expression: bytecode is
    /// evaluated against its originating context, anything else (a
    /// literal produced by `compile` for text with no `${...}`) is
    /// returned unchanged.
    pub fn eval_bytecode(&self) -> Object {
        match self {
            Object::Bytecode(rc) => eval_with(&mut rc.borrow_mut(), &LogSession),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use context::ContextObject;

    #[test]
    fn literal_text_round_trips_without_bytecode() {
        let ctx = root_context();
        let result = compile(&ctx, "hello");
        assert_eq!(result, Object::string("hello"));
        assert_eq!(result.eval_bytecode(), Object::string("hello"));
    }

    #[test]
    fn dimension_arithmetic_end_to_end() {
        let ctx = root_context();
        let result = compile(&ctx, "${10dp + 5dp}");
        assert_eq!(result.eval_bytecode(), Object::AbsoluteDimension(15.0));
    }

    #[test]
    fn short_circuit_and_end_to_end() {
        let ctx = root_context();
        ctx.define("ready", ContextObject::mutable(Object::Boolean(false)));
        let result = compile(&ctx, "${ready && Math.max(1, 2)}");
        assert_eq!(result.eval_bytecode(), Object::Boolean(false));
    }

    #[test]
    fn ternary_with_constant_condition_folds() {
        let ctx = root_context();
        let result = compile(&ctx, "${1 != 2 ? 10 : 3}");
        let bc = match result {
            Object::Bytecode(rc) => rc,
            other => panic!("expected bytecode, got {:?}", other),
        };
        let owned = Rc::try_unwrap(bc).map(|cell| cell.into_inner()).unwrap_or_else(|rc| rc.borrow().clone());
        let simplified = simplify(owned);
        assert_eq!(simplified, Object::Number(10.0));
    }

    #[test]
    fn known_array_literal_folds_to_constant() {
        let ctx = root_context();
        let result = compile(&ctx, "${[1, 2, 3][1]}");
        assert_eq!(result.eval_bytecode(), Object::Number(2.0));
    }

    #[test]
    fn reactive_dependency_and_mutation() {
        let ctx = root_context();
        ctx.define("count", ContextObject::mutable(Object::Number(1.0)));
        let result = compile(&ctx, "${count + 1}");
        let mut bc = match result {
            Object::Bytecode(rc) => match Rc::try_unwrap(rc) {
                Ok(cell) => cell.into_inner(),
                Err(rc) => rc.borrow().clone(),
            },
            other => panic!("expected bytecode, got {:?}", other),
        };
        let deps = symbols(&mut bc);
        assert_eq!(deps.len(), 1);
        assert_eq!(eval_with(&mut bc, &session::NullSession), Object::Number(2.0));

        ctx.set("count", Object::Number(41.0));
        assert_eq!(eval_with(&mut bc, &session::NullSession), Object::Number(42.0));
    }

    #[test]
    fn string_interpolation_round_trip() {
        let ctx = root_context();
        ctx.define("name", ContextObject::mutable(Object::string("world")));
        let result = compile(&ctx, "hello ${name}!");
        assert_eq!(result.eval_bytecode(), Object::string("hello world!"));
    }
}
