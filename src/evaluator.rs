// Stack-based bytecode evaluator (C7 in SPEC_FULL.md).
//
// Grounded on original_source/aplcore/src/datagrammar/bytecodeevaluator.cpp:
// a plain operand-stack interpreter over the instruction stream, no
// exceptions — anything unexpected is reported through the diagnostic
// sink and answered with Null (or NaN for arithmetic), never propagated as
// an error to the caller.

use indexmap::IndexMap;

use crate::bytecode::{constant_value, Bytecode, Instruction, Opcode};
use crate::error::EvalDiagnostic;
use crate::object::{self, Object};
use crate::session::Session;
use crate::symbol::BoundSymbol;

/// Evaluate a compiled expression against the context it was compiled
/// against. A single-instruction program (the common case for a literal
/// wrapped in `${...}`) is answered directly, skipping the stack loop.
pub fn eval(bc: &Bytecode, session: &dyn Session) -> Object {
    if bc.instructions.len() == 1 {
        return eval_trivial(&bc.instructions[0], bc, session);
    }

    let mut stack: Vec<Object> = Vec::with_capacity(bc.instructions.len());
    let mut pc: usize = 0;

    while pc < bc.instructions.len() {
        let instr = bc.instructions[pc];
        match instr.op {
            Opcode::Nop => {}

            Opcode::LoadConstant => stack.push(constant_value(instr.constant())),
            Opcode::LoadImmediate => stack.push(Object::Number(instr.operand as f64)),
            Opcode::LoadData => stack.push(bc.data.get(instr.operand as usize).cloned().unwrap_or(Object::Null)),
            Opcode::LoadBoundSymbol => stack.push(resolve_bound_symbol(bc, instr.operand as usize)),

            Opcode::AttributeAccess => {
                let target = pop(&mut stack);
                let key = bc.data.get(instr.operand as usize).cloned().unwrap_or(Object::Null);
                stack.push(object::field_access(&target, &key));
            }
            Opcode::ArrayAccess => {
                let index = pop(&mut stack);
                let target = pop(&mut stack);
                stack.push(object::array_access(&target, &index));
            }

            Opcode::UnaryPlus => {
                let a = pop(&mut stack);
                stack.push(object::unary_plus(&a));
            }
            Opcode::UnaryMinus => {
                let a = pop(&mut stack);
                stack.push(object::unary_minus(&a));
            }
            Opcode::UnaryNot => {
                let a = pop(&mut stack);
                stack.push(object::unary_not(&a));
            }

            Opcode::BinaryMultiply => binary(&mut stack, object::multiply),
            Opcode::BinaryDivide => binary(&mut stack, object::divide),
            Opcode::BinaryRemainder => binary(&mut stack, object::remainder),
            Opcode::BinaryAdd => binary(&mut stack, object::add),
            Opcode::BinarySubtract => binary(&mut stack, object::subtract),

            Opcode::CompareOp => {
                let cmp = instr.comparison();
                let b = pop(&mut stack);
                let a = pop(&mut stack);
                stack.push(Object::Boolean(object::compare_op(cmp, &a, &b)));
            }

            Opcode::Jump => {
                pc = instr.operand as usize;
                continue;
            }
            Opcode::JumpIfFalseOrPop => {
                if !peek(&stack).truthy() {
                    pc = instr.operand as usize;
                    continue;
                }
                stack.pop();
            }
            Opcode::JumpIfTrueOrPop => {
                if peek(&stack).truthy() {
                    pc = instr.operand as usize;
                    continue;
                }
                stack.pop();
            }
            Opcode::JumpIfNotNullOrPop => {
                if !peek(&stack).is_null() {
                    pc = instr.operand as usize;
                    continue;
                }
                stack.pop();
            }
            Opcode::PopJumpIfFalse => {
                let cond = pop(&mut stack);
                if !cond.truthy() {
                    pc = instr.operand as usize;
                    continue;
                }
            }

            Opcode::MergeString => {
                let n = instr.operand as usize;
                let parts = drain_last(&mut stack, n);
                stack.push(parts.into_iter().reduce(|a, b| object::merge(&a, &b)).unwrap_or_else(Object::empty_string));
            }
            Opcode::AppendArray => {
                let n = instr.operand as usize;
                stack.push(Object::array(drain_last(&mut stack, n)));
            }
            Opcode::AppendMap => {
                let n = instr.operand as usize;
                let items = drain_last(&mut stack, n * 2);
                let mut map = IndexMap::new();
                let mut it = items.into_iter();
                while let (Some(k), Some(v)) = (it.next(), it.next()) {
                    map.insert(k.as_string(), v);
                }
                stack.push(Object::map(map));
            }

            Opcode::CallFunction => {
                let argc = instr.operand as usize;
                let args = drain_last(&mut stack, argc);
                let callee = pop(&mut stack);
                match callee {
                    Object::Callable(c) => stack.push(c.call(&args)),
                    _ => {
                        session.eval_diagnostic(&EvalDiagnostic::NonCallableInvoked);
                        stack.push(Object::Null);
                    }
                }
            }
        }
        pc += 1;
    }

    if stack.len() != 1 {
        session.eval_diagnostic(&EvalDiagnostic::StackDepthNotOne(stack.len()));
        return stack.pop().unwrap_or(Object::Null);
    }
    stack.pop().unwrap()
}

fn eval_trivial(instr: &Instruction, bc: &Bytecode, session: &dyn Session) -> Object {
    match instr.op {
        Opcode::LoadConstant => constant_value(instr.constant()),
        Opcode::LoadImmediate => Object::Number(instr.operand as f64),
        Opcode::LoadData => bc.data.get(instr.operand as usize).cloned().unwrap_or(Object::Null),
        Opcode::LoadBoundSymbol => resolve_bound_symbol(bc, instr.operand as usize),
        _ => {
            session.eval_diagnostic(&EvalDiagnostic::UnexpectedTrivialInstruction);
            Object::Null
        }
    }
}

fn resolve_bound_symbol(bc: &Bytecode, data_index: usize) -> Object {
    let name = match bc.data.get(data_index) {
        Some(Object::String(s)) => s.clone(),
        _ => return Object::Null,
    };
    match bc.get_context() {
        Some(ctx) => BoundSymbol::new(&ctx, name.as_ref()).resolve(),
        None => Object::Null,
    }
}

fn pop(stack: &mut Vec<Object>) -> Object {
    stack.pop().unwrap_or(Object::Null)
}

fn peek(stack: &[Object]) -> Object {
    stack.last().cloned().unwrap_or(Object::Null)
}

fn binary(stack: &mut Vec<Object>, f: fn(&Object, &Object) -> Object) {
    let b = pop(stack);
    let a = pop(stack);
    stack.push(f(&a, &b));
}

fn drain_last(stack: &mut Vec<Object>, n: usize) -> Vec<Object> {
    let start = stack.len().saturating_sub(n);
    stack.split_off(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::Assembler;
    use crate::context::{Context, ContextObject};
    use crate::object::Comparison as Cmp;
    use crate::session::NullSession;

    #[test]
    fn trivial_number_fast_path() {
        let ctx = Context::root();
        let mut asm = Assembler::new();
        asm.load_operand(Object::Number(3.0)).unwrap();
        let bc = asm.finish(&ctx);
        assert_eq!(bc.instructions.len(), 1);
        assert_eq!(eval(&bc, &NullSession), Object::Number(3.0));
    }

    #[test]
    fn short_circuit_and() {
        let ctx = Context::root();
        let mut asm = Assembler::new();
        asm.load_operand(Object::Boolean(false)).unwrap();
        let jump = asm.emit_jump(Opcode::JumpIfFalseOrPop);
        asm.load_operand(Object::Boolean(true)).unwrap();
        asm.patch_jump_here(jump);
        let bc = asm.finish(&ctx);
        assert_eq!(eval(&bc, &NullSession), Object::Boolean(false));
    }

    #[test]
    fn bound_symbol_resolves_live_value() {
        let ctx = Context::root();
        ctx.define("x", ContextObject::mutable(Object::Number(41.0)));
        let mut asm = Assembler::new();
        asm.load_bound_symbol("x").unwrap();
        asm.load_operand(Object::Number(1.0)).unwrap();
        asm.emit(Opcode::BinaryAdd);
        let bc = asm.finish(&ctx);
        assert_eq!(eval(&bc, &NullSession), Object::Number(42.0));

        ctx.set("x", Object::Number(100.0));
        assert_eq!(eval(&bc, &NullSession), Object::Number(101.0));
    }

    #[test]
    fn compare_nan_is_always_unequal() {
        let ctx = Context::root();
        let mut asm = Assembler::new();
        asm.load_operand(Object::Number(f64::NAN)).unwrap();
        asm.load_operand(Object::Number(f64::NAN)).unwrap();
        asm.emit_compare(Cmp::Neq);
        let bc = asm.finish(&ctx);
        assert_eq!(eval(&bc, &NullSession), Object::Boolean(true));
    }
}
