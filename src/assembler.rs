// Byte code assembler (C5 in SPEC_FULL.md): a thin code-emission layer the
// parser drives one production at a time. Keeps the instruction stream,
// the data pool, and a pending-jump-patch list; never inspects expression
// syntax itself.
//
// Grounded on original_source/aplcore/include/apl/datagrammar/
// bytecodeassembler.h's ByteCodeAssembler, narrowed from its PEGTL-action
// surface to the handful of emit/patch primitives a hand-written recursive
// descent parser actually needs.

use crate::bytecode::{fits_in_bci, Bytecode, Constant, Instruction, Opcode};
use crate::context::Context;
use crate::error::ParseErrorKind;
use crate::object::{Comparison, Object};
use std::rc::Rc;

/// Marks a position in the instruction stream to jump to or patch later.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Label(pub usize);

pub struct Assembler {
    instructions: Vec<Instruction>,
    data: Vec<Object>,
}

impl Assembler {
    pub fn new() -> Assembler {
        Assembler { instructions: Vec::new(), data: Vec::new() }
    }

    pub fn here(&self) -> Label {
        Label(self.instructions.len())
    }

    fn push(&mut self, op: Opcode, operand: i32) -> Label {
        let label = self.here();
        self.instructions.push(Instruction::new(op, operand));
        label
    }

    /// Loads a constant-foldable value at parse time: numbers within the
    /// BCI range become LOAD_IMMEDIATE, known sentinel constants become
    /// LOAD_CONSTANT, and anything else is pushed into the data pool
    /// (deduplicated) and emitted as LOAD_DATA.
    pub fn load_operand(&mut self, value: Object) -> Result<Label, ParseErrorKind> {
        match &value {
            Object::Null => Ok(self.push(Opcode::LoadConstant, Constant::Null as i32)),
            Object::Boolean(false) => Ok(self.push(Opcode::LoadConstant, Constant::False as i32)),
            Object::Boolean(true) => Ok(self.push(Opcode::LoadConstant, Constant::True as i32)),
            Object::String(s) if s.is_empty() => Ok(self.push(Opcode::LoadConstant, Constant::EmptyString as i32)),
            Object::Number(n) if fits_in_bci(*n) => Ok(self.push(Opcode::LoadImmediate, *n as i32)),
            _ => {
                let idx = self.intern_data(value);
                if idx > crate::bytecode::MAX_BCI_VALUE as usize {
                    return Err(ParseErrorKind::BciOverflow);
                }
                Ok(self.push(Opcode::LoadData, idx as i32))
            }
        }
    }

    fn intern_data(&mut self, value: Object) -> usize {
        if let Some(pos) = self.data.iter().position(|existing| *existing == value) {
            return pos;
        }
        self.data.push(value);
        self.data.len() - 1
    }

    pub fn load_bound_symbol(&mut self, name: &str) -> Result<Label, ParseErrorKind> {
        let idx = self.intern_data(Object::string(name));
        if idx > crate::bytecode::MAX_BCI_VALUE as usize {
            return Err(ParseErrorKind::BciOverflow);
        }
        Ok(self.push(Opcode::LoadBoundSymbol, idx as i32))
    }

    /// `a.name` — the attribute name is known at parse time, so it rides
    /// in the instruction's own operand (a data-pool index) instead of
    /// being pushed as a separate stack value; only the target is popped
    /// at evaluation time.
    pub fn emit_attribute_access(&mut self, name: &str) -> Result<Label, ParseErrorKind> {
        let idx = self.intern_data(Object::string(name));
        if idx > crate::bytecode::MAX_BCI_VALUE as usize {
            return Err(ParseErrorKind::BciOverflow);
        }
        Ok(self.push(Opcode::AttributeAccess, idx as i32))
    }

    pub fn emit(&mut self, op: Opcode) -> Label {
        self.push(op, 0)
    }

    pub fn emit_compare(&mut self, cmp: Comparison) -> Label {
        self.push(Opcode::CompareOp, crate::bytecode::comparison_operand(cmp))
    }

    pub fn emit_call(&mut self, argc: usize) -> Label {
        self.push(Opcode::CallFunction, argc as i32)
    }

    pub fn emit_merge_string(&mut self, n: usize) -> Label {
        self.push(Opcode::MergeString, n as i32)
    }

    pub fn emit_append_array(&mut self, n: usize) -> Label {
        self.push(Opcode::AppendArray, n as i32)
    }

    pub fn emit_append_map(&mut self, n: usize) -> Label {
        self.push(Opcode::AppendMap, n as i32)
    }

    /// Emits a jump with a placeholder target, to be patched via
    /// `patch_jump_here` once the target location is known.
    pub fn emit_jump(&mut self, op: Opcode) -> Label {
        self.push(op, -1)
    }

    /// Patches a previously emitted jump to target the current position.
    pub fn patch_jump_here(&mut self, jump: Label) {
        let target = self.instructions.len() as i32;
        self.instructions[jump.0].operand = target;
    }

    pub fn patch_jump_to(&mut self, jump: Label, target: Label) {
        self.instructions[jump.0].operand = target.0 as i32;
    }

    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    pub fn finish(self, context: &Rc<Context>) -> Bytecode {
        let mut bc = Bytecode::new(context);
        bc.instructions = self.instructions;
        bc.data = self.data;
        bc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Opcode;

    #[test]
    fn dedupes_data_pool_entries() {
        let mut asm = Assembler::new();
        asm.load_operand(Object::string("hello")).unwrap();
        asm.load_operand(Object::string("hello")).unwrap();
        assert_eq!(asm.data.len(), 1);
    }

    #[test]
    fn jump_patches_to_current_position() {
        let mut asm = Assembler::new();
        let j = asm.emit_jump(Opcode::Jump);
        asm.emit(Opcode::Nop);
        asm.patch_jump_here(j);
        assert_eq!(asm.instructions[j.0].operand, 2);
    }
}
