// Symbol extraction (C9 in SPEC_FULL.md): which mutable bindings a
// compiled expression depends on, for a reactive layer to decide what to
// re-evaluate when a binding changes.
//
// Grounded on original_source/aplcore/src/datagrammar/node.cpp's symbol
// collector: a single linear scan of the instruction stream recording the
// name carried by every LOAD_BOUND_SYMBOL it encounters. Per DESIGN.md's
// Open Question decision, a trailing attribute/array access off a bound
// symbol (`a.b`, `a[i]`) is not tracked as a separate dependency — only the
// root symbol `a` is recorded, matching the original engine's behavior.

use std::collections::HashSet;

use crate::bytecode::{Bytecode, Opcode};
use crate::object::Object;
use crate::symbol::BoundSymbol;

/// Collects every bound symbol a compiled expression's *reachable* code
/// touches. Call after `simplify`/`optimize` to ensure branches that can
/// never execute (their condition folded to a constant) are already
/// pruned from the instruction stream and so never contribute a symbol.
pub fn symbols(bc: &Bytecode) -> HashSet<BoundSymbol> {
    let mut found = HashSet::new();
    let context = match bc.get_context() {
        Some(ctx) => ctx,
        None => return found,
    };

    for instr in &bc.instructions {
        if instr.op == Opcode::LoadBoundSymbol {
            if let Some(Object::String(name)) = bc.data.get(instr.operand as usize) {
                found.insert(BoundSymbol::new(&context, name.as_ref()));
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::Assembler;
    use crate::context::{Context, ContextObject};
    use crate::optimizer;

    #[test]
    fn collects_referenced_symbols() {
        let ctx = Context::root();
        ctx.define("a", ContextObject::mutable(Object::Number(1.0)));
        let mut asm = Assembler::new();
        asm.load_bound_symbol("a").unwrap();
        let bc = asm.finish(&ctx);
        let found = symbols(&bc);
        assert_eq!(found.len(), 1);
        assert!(found.contains(&BoundSymbol::new(&ctx, "a")));
    }

    #[test]
    fn dead_branch_contributes_no_symbols() {
        let ctx = Context::root();
        ctx.define("a", ContextObject::mutable(Object::Number(1.0)));
        let mut asm = Assembler::new();
        // `false ? a : 10`
        asm.load_operand(Object::Boolean(false)).unwrap();
        let jump_to_else = asm.emit_jump(crate::bytecode::Opcode::PopJumpIfFalse);
        asm.load_bound_symbol("a").unwrap();
        let jump_to_end = asm.emit_jump(crate::bytecode::Opcode::Jump);
        asm.patch_jump_here(jump_to_else);
        asm.load_operand(Object::Number(10.0)).unwrap();
        asm.patch_jump_here(jump_to_end);
        let mut bc = asm.finish(&ctx);
        optimizer::optimize(&mut bc);
        assert!(symbols(&bc).is_empty());
    }
}
