// Peephole bytecode optimizer (C8 in SPEC_FULL.md).
//
// Grounded on original_source/aplcore/src/datagrammar/bytecodeoptimizer.cpp:
// that file finds basic blocks over a relative-jump instruction set and
// folds constants block-by-block with a live-constant counter. This port
// keeps the same two ideas — fold straight runs of literal loads, then
// statically resolve (and delete) branches whose condition has become a
// compile-time constant — but works over this crate's absolute-index jump
// encoding with a pattern-matching pass instead of a full relative-offset
// basic-block table, since the assembler always emits the well-nested
// if/and/or/nullc shapes described below and nothing else jumps into their
// middle.
//
// Reduction rules (mirroring simplifyOperations' comment block):
//   Load(A) Load(B) BinaryOp    -> Load(A op B)     if A, B known
//   Load(A) UnaryOp             -> Load(op A)       if A known
//   Load(A1)..Load(AN) MergeString(N)   -> Load(merge(A1..AN))  if all known
//   Load(A1)..Load(AN) AppendArray(N)   -> Load([A1..AN])       if all known
//   cond-known PopJumpIfFalse/JumpIf*OrPop -> delete the dead branch

use std::collections::HashMap;
use std::ops::Range;

use crate::bytecode::{constant_value, Bytecode, Constant, Instruction, Opcode};
use crate::object::{self, Comparison, Object};

pub fn optimize(bc: &mut Bytecode) {
    loop {
        let folded = fold_straight_line_runs(&mut bc.instructions, &mut bc.data);
        let branches = fold_dead_branches(&mut bc.instructions, &bc.data);
        if !folded && !branches {
            break;
        }
    }
    compact_data_pool(bc);
    bc.optimized = true;
}

fn literal_value(instr: &Instruction, data: &[Object]) -> Option<Object> {
    match instr.op {
        Opcode::LoadConstant => Some(constant_value(instr.constant())),
        Opcode::LoadImmediate => Some(Object::Number(instr.operand as f64)),
        Opcode::LoadData => data.get(instr.operand as usize).cloned(),
        _ => None,
    }
}

fn make_load(value: Object, data: &mut Vec<Object>) -> Instruction {
    match &value {
        Object::Null => Instruction::new(Opcode::LoadConstant, Constant::Null as i32),
        Object::Boolean(false) => Instruction::new(Opcode::LoadConstant, Constant::False as i32),
        Object::Boolean(true) => Instruction::new(Opcode::LoadConstant, Constant::True as i32),
        Object::String(s) if s.is_empty() => Instruction::new(Opcode::LoadConstant, Constant::EmptyString as i32),
        Object::Number(n) if crate::bytecode::fits_in_bci(*n) => Instruction::new(Opcode::LoadImmediate, *n as i32),
        _ => {
            let idx = match data.iter().position(|existing| *existing == value) {
                Some(pos) => pos,
                None => {
                    data.push(value);
                    data.len() - 1
                }
            };
            Instruction::new(Opcode::LoadData, idx as i32)
        }
    }
}

/// Folds maximal contiguous runs of literal loads feeding a single pure
/// operator into one literal load. Returns whether anything changed.
fn fold_straight_line_runs(instructions: &mut Vec<Instruction>, data: &mut Vec<Object>) -> bool {
    let mut i = 0;
    let mut changed = false;
    'outer: while i < instructions.len() {
        let op = instructions[i].op;
        let arity = match op {
            Opcode::UnaryPlus | Opcode::UnaryMinus | Opcode::UnaryNot => Some(1),
            Opcode::BinaryMultiply
            | Opcode::BinaryDivide
            | Opcode::BinaryRemainder
            | Opcode::BinaryAdd
            | Opcode::BinarySubtract
            | Opcode::CompareOp
            | Opcode::ArrayAccess => Some(2),
            Opcode::AttributeAccess => Some(1),
            Opcode::MergeString | Opcode::AppendArray => Some(instructions[i].operand as usize),
            Opcode::AppendMap => Some((instructions[i].operand as usize) * 2),
            Opcode::CallFunction => Some(instructions[i].operand as usize + 1),
            _ => None,
        };

        let arity = match arity {
            Some(n) if n > 0 && n <= i => n,
            _ => {
                i += 1;
                continue 'outer;
            }
        };

        let window_start = i - arity;
        let mut operands = Vec::with_capacity(arity);
        for instr in &instructions[window_start..i] {
            match literal_value(instr, data) {
                Some(v) => operands.push(v),
                None => {
                    i += 1;
                    continue 'outer;
                }
            }
        }

        if op == Opcode::CallFunction {
            match &operands[0] {
                Object::Callable(c) if c.pure => {}
                _ => {
                    i += 1;
                    continue 'outer;
                }
            }
        }

        let folded = match op {
            Opcode::UnaryPlus => object::unary_plus(&operands[0]),
            Opcode::UnaryMinus => object::unary_minus(&operands[0]),
            Opcode::UnaryNot => object::unary_not(&operands[0]),
            Opcode::BinaryMultiply => object::multiply(&operands[0], &operands[1]),
            Opcode::BinaryDivide => object::divide(&operands[0], &operands[1]),
            Opcode::BinaryRemainder => object::remainder(&operands[0], &operands[1]),
            Opcode::BinaryAdd => object::add(&operands[0], &operands[1]),
            Opcode::BinarySubtract => object::subtract(&operands[0], &operands[1]),
            Opcode::CompareOp => Object::Boolean(object::compare_op(instructions[i].comparison(), &operands[0], &operands[1])),
            Opcode::ArrayAccess => object::array_access(&operands[0], &operands[1]),
            Opcode::AttributeAccess => attribute_fold(instructions, data, i, operands[0].clone()),
            Opcode::MergeString => operands.into_iter().reduce(|a, b| object::merge(&a, &b)).unwrap_or_else(Object::empty_string),
            Opcode::AppendArray => Object::array(operands),
            Opcode::AppendMap => {
                let mut map = indexmap::IndexMap::new();
                let mut it = operands.into_iter();
                while let (Some(k), Some(v)) = (it.next(), it.next()) {
                    map.insert(k.as_string(), v);
                }
                Object::map(map)
            }
            Opcode::CallFunction => match &operands[0] {
                Object::Callable(c) => c.call(&operands[1..]),
                _ => unreachable!(),
            },
            _ => unreachable!(),
        };

        let new_instr = make_load(folded, data);
        let removed_len = i - window_start + 1;
        instructions.splice(window_start..=i, std::iter::once(new_instr));
        remap_after_shrink(instructions, window_start, removed_len);
        changed = true;
        i = window_start + 1;
    }
    changed
}

/// AttributeAccess takes its key from its own operand (a data-pool string
/// index), not a stack value, so it folds with arity 1 (the target only).
fn attribute_fold(instructions: &[Instruction], data: &[Object], at: usize, target: Object) -> Object {
    let key = data.get(instructions[at].operand as usize).cloned().unwrap_or(Object::Null);
    object::field_access(&target, &key)
}

/// Every jump operand referring to an instruction at or after
/// `removed_at + removed_len` (pre-shrink index space) shifts down by
/// `removed_len - 1` (the window collapsed to one instruction); operands
/// referring inside the removed window no longer make sense but cannot
/// occur since jumps never target the interior of a folded pure run.
fn remap_after_shrink(instructions: &mut [Instruction], removed_at: usize, removed_len: usize) {
    if removed_len <= 1 {
        return;
    }
    let shift = (removed_len - 1) as i32;
    let boundary = (removed_at + removed_len) as i32;
    for instr in instructions.iter_mut() {
        if instr.op.is_jump() && instr.operand >= boundary {
            instr.operand -= shift;
        }
    }
}

/// Generic splice: keep only the instructions covered by `ranges` (in
/// order), dropping everything else, and rewrite every jump operand that
/// pointed at a kept instruction (or one-past-the-end of a kept range) to
/// its new position.
fn splice_ranges(instructions: &[Instruction], ranges: &[Range<usize>]) -> Vec<Instruction> {
    let mut map: HashMap<usize, usize> = HashMap::new();
    let mut out = Vec::new();
    for range in ranges {
        for old in range.clone() {
            map.insert(old, out.len());
            out.push(instructions[old]);
        }
        map.entry(range.end).or_insert(out.len());
    }
    for instr in out.iter_mut() {
        if instr.op.is_jump() {
            if let Some(&new_target) = map.get(&(instr.operand as usize)) {
                instr.operand = new_target as i32;
            }
        }
    }
    out
}

/// Resolves `cond ? then : else`, `a && b`, `a || b`, `a ?? b` shapes whose
/// condition is now a literal load immediately preceding the branch
/// instruction, deleting whichever side can no longer run. The condition
/// load may be `LoadConstant`/`LoadImmediate` or a `LoadData`-pooled
/// constant (e.g. a non-empty string/array/map literal) — any pure value
/// the live-constant counter `k` would count, per spec.md §4.5.
fn fold_dead_branches(instructions: &mut Vec<Instruction>, data: &[Object]) -> bool {
    for i in 0..instructions.len() {
        if i == 0 {
            continue;
        }
        let cond_idx = i - 1;
        let cond = match instructions[cond_idx].op {
            Opcode::LoadConstant | Opcode::LoadImmediate | Opcode::LoadData => {
                match literal_value(&instructions[cond_idx], data) {
                    Some(v) => v,
                    None => continue,
                }
            }
            _ => continue,
        };

        match instructions[i].op {
            Opcode::PopJumpIfFalse => {
                let else_start = instructions[i].operand as usize;
                if else_start == 0 || else_start - 1 >= instructions.len() {
                    continue;
                }
                let jump_to_end_idx = else_start - 1;
                if instructions[jump_to_end_idx].op != Opcode::Jump {
                    continue;
                }
                let end = instructions[jump_to_end_idx].operand as usize;
                let then_range = (i + 1)..jump_to_end_idx;
                let else_range = else_start..end;

                let new_instructions = if cond.truthy() {
                    splice_ranges(instructions, &[0..cond_idx, then_range, end..instructions.len()])
                } else {
                    splice_ranges(instructions, &[0..cond_idx, else_range, end..instructions.len()])
                };
                *instructions = new_instructions;
                return true;
            }
            Opcode::JumpIfFalseOrPop | Opcode::JumpIfTrueOrPop | Opcode::JumpIfNotNullOrPop => {
                let end = instructions[i].operand as usize;
                let short_circuits = match instructions[i].op {
                    Opcode::JumpIfFalseOrPop => !cond.truthy(),
                    Opcode::JumpIfTrueOrPop => cond.truthy(),
                    Opcode::JumpIfNotNullOrPop => !cond.is_null(),
                    _ => unreachable!(),
                };
                let new_instructions = if short_circuits {
                    // Keep the condition value only; drop the jump and RHS.
                    splice_ranges(instructions, &[0..i, end..instructions.len()])
                } else {
                    // Drop the condition load and the jump; evaluate RHS.
                    splice_ranges(instructions, &[0..cond_idx, (i + 1)..end, end..instructions.len()])
                };
                *instructions = new_instructions;
                return true;
            }
            _ => {}
        }
    }
    false
}

/// Drops data-pool entries no instruction references any more (left behind
/// by dead-branch elimination) and renumbers the survivors.
fn compact_data_pool(bc: &mut Bytecode) {
    let mut used: Vec<bool> = vec![false; bc.data.len()];
    for instr in &bc.instructions {
        if matches!(instr.op, Opcode::LoadData | Opcode::LoadBoundSymbol | Opcode::AttributeAccess) {
            if let Some(slot) = used.get_mut(instr.operand as usize) {
                *slot = true;
            }
        }
    }
    if used.iter().all(|&b| b) {
        return;
    }
    let mut remap = vec![0usize; bc.data.len()];
    let mut new_data = Vec::new();
    for (old_idx, keep) in used.into_iter().enumerate() {
        if keep {
            remap[old_idx] = new_data.len();
            new_data.push(bc.data[old_idx].clone());
        }
    }
    for instr in bc.instructions.iter_mut() {
        if matches!(instr.op, Opcode::LoadData | Opcode::LoadBoundSymbol | Opcode::AttributeAccess) {
            instr.operand = remap[instr.operand as usize] as i32;
        }
    }
    bc.data = new_data;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::Assembler;
    use crate::context::Context;
    use crate::object::Comparison as Cmp;

    fn eval_all(bc: &Bytecode) -> Object {
        crate::evaluator::eval(bc, &crate::session::NullSession)
    }

    #[test]
    fn folds_constant_comparison() {
        let ctx = Context::root();
        let mut asm = Assembler::new();
        asm.load_operand(Object::Number(1.0)).unwrap();
        asm.load_operand(Object::Number(2.0)).unwrap();
        asm.emit_compare(Cmp::Neq);
        let mut bc = asm.finish(&ctx);
        optimize(&mut bc);
        assert_eq!(bc.instructions.len(), 1);
        assert_eq!(eval_all(&bc), Object::Boolean(true));
    }

    #[test]
    fn dead_else_branch_is_removed() {
        let ctx = Context::root();
        let mut asm = Assembler::new();
        // equivalent to `1 != 2 ? 10 : 3`
        asm.load_operand(Object::Number(1.0)).unwrap();
        asm.load_operand(Object::Number(2.0)).unwrap();
        asm.emit_compare(Cmp::Neq);
        let jump_to_else = asm.emit_jump(Opcode::PopJumpIfFalse);
        asm.load_operand(Object::Number(10.0)).unwrap();
        let jump_to_end = asm.emit_jump(Opcode::Jump);
        asm.patch_jump_here(jump_to_else);
        asm.load_operand(Object::Number(3.0)).unwrap();
        asm.patch_jump_here(jump_to_end);
        let mut bc = asm.finish(&ctx);
        optimize(&mut bc);
        assert_eq!(bc.instructions.len(), 1);
        assert_eq!(eval_all(&bc), Object::Number(10.0));
    }

    #[test]
    fn dead_branch_with_string_condition_is_pruned() {
        let ctx = Context::root();
        ctx.define("a", crate::context::ContextObject::mutable(Object::Number(1.0)));
        ctx.define("b", crate::context::ContextObject::mutable(Object::Number(2.0)));
        let mut asm = Assembler::new();
        // equivalent to `'nonempty' ? a : b`
        asm.load_operand(Object::string("nonempty")).unwrap();
        let jump_to_else = asm.emit_jump(Opcode::PopJumpIfFalse);
        asm.load_bound_symbol("a").unwrap();
        let jump_to_end = asm.emit_jump(Opcode::Jump);
        asm.patch_jump_here(jump_to_else);
        asm.load_bound_symbol("b").unwrap();
        asm.patch_jump_here(jump_to_end);
        let mut bc = asm.finish(&ctx);
        optimize(&mut bc);
        assert!(crate::extract::symbols(&bc).iter().all(|s| s.name.as_ref() != "b"));
        assert_eq!(eval_all(&bc), Object::Number(1.0));
    }

    fn builtin(namespace: &str, name: &str) -> Object {
        let ns = crate::functions::builtins().into_iter().find(|(n, _)| *n == namespace).unwrap().1;
        crate::object::field_access(&ns, &Object::string(name))
    }

    #[test]
    fn folds_pure_call_with_known_args() {
        let ctx = Context::root();
        let mut asm = Assembler::new();
        asm.load_operand(builtin("Math", "max")).unwrap();
        asm.load_operand(Object::Number(1.0)).unwrap();
        asm.load_operand(Object::Number(2.0)).unwrap();
        asm.emit_call(2);
        let mut bc = asm.finish(&ctx);
        optimize(&mut bc);
        assert_eq!(bc.instructions.len(), 1);
        assert_eq!(eval_all(&bc), Object::Number(2.0));
    }

    #[test]
    fn impure_call_is_not_folded() {
        let ctx = Context::root();
        let mut asm = Assembler::new();
        asm.load_operand(builtin("Math", "random")).unwrap();
        asm.emit_call(0);
        let mut bc = asm.finish(&ctx);
        optimize(&mut bc);
        assert_eq!(bc.instructions.len(), 2);
    }
}
