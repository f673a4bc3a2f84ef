// Bytecode representation (C6 in SPEC_FULL.md).
//
// Grounded on original_source/aplcore/include/apl/datagrammar/bytecode.h:
// a fixed-width (opcode, signed-24-bit operand) instruction plus a heap
// side data pool, restated with the teacher's own Opcode/Program split
// (src/vm.rs) in mind.

use std::rc::{Rc, Weak};

use crate::context::Context;
use crate::object::{Comparison, Object};

pub const BCI_BITS: u32 = 24;
pub const MAX_BCI_VALUE: i32 = (1 << (BCI_BITS - 1)) - 1;
pub const MIN_BCI_VALUE: i32 = -(1 << (BCI_BITS - 1));

pub fn fits_in_bci(value: f64) -> bool {
    let v = value as i32;
    value == v as f64 && v <= MAX_BCI_VALUE && v >= MIN_BCI_VALUE
}

/// Constants enumerable without a data-pool entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Constant {
    Null = 0,
    False,
    True,
    EmptyString,
    EmptyArray,
    EmptyMap,
}

pub fn constant_value(c: Constant) -> Object {
    match c {
        Constant::Null => Object::Null,
        Constant::False => Object::Boolean(false),
        Constant::True => Object::Boolean(true),
        Constant::EmptyString => Object::empty_string(),
        Constant::EmptyArray => Object::empty_array(),
        Constant::EmptyMap => Object::empty_map(),
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Opcode {
    Nop,
    CallFunction,
    LoadConstant,
    LoadImmediate,
    LoadData,
    LoadBoundSymbol,
    AttributeAccess,
    ArrayAccess,
    UnaryPlus,
    UnaryMinus,
    UnaryNot,
    BinaryMultiply,
    BinaryDivide,
    BinaryRemainder,
    BinaryAdd,
    BinarySubtract,
    CompareOp,
    Jump,
    JumpIfFalseOrPop,
    JumpIfTrueOrPop,
    JumpIfNotNullOrPop,
    PopJumpIfFalse,
    MergeString,
    AppendArray,
    AppendMap,
}

impl Opcode {
    /// Whether this opcode is one of the four "loads"; used by the
    /// optimizer/extractor to recognize constant-on-stack positions.
    pub fn is_load(&self) -> bool {
        matches!(
            self,
            Opcode::LoadConstant | Opcode::LoadImmediate | Opcode::LoadData | Opcode::LoadBoundSymbol
        )
    }

    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            Opcode::Jump
                | Opcode::JumpIfFalseOrPop
                | Opcode::JumpIfTrueOrPop
                | Opcode::JumpIfNotNullOrPop
                | Opcode::PopJumpIfFalse
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub op: Opcode,
    pub operand: i32,
}

impl Instruction {
    pub fn new(op: Opcode, operand: i32) -> Instruction {
        Instruction { op, operand }
    }

    pub fn comparison(&self) -> Comparison {
        match self.operand {
            0 => Comparison::Lt,
            1 => Comparison::Lte,
            2 => Comparison::Eq,
            3 => Comparison::Neq,
            4 => Comparison::Gt,
            _ => Comparison::Gte,
        }
    }

    pub fn constant(&self) -> Constant {
        match self.operand {
            0 => Constant::Null,
            1 => Constant::False,
            2 => Constant::True,
            3 => Constant::EmptyString,
            4 => Constant::EmptyArray,
            _ => Constant::EmptyMap,
        }
    }
}

pub fn comparison_operand(c: Comparison) -> i32 {
    match c {
        Comparison::Lt => 0,
        Comparison::Lte => 1,
        Comparison::Eq => 2,
        Comparison::Neq => 3,
        Comparison::Gt => 4,
        Comparison::Gte => 5,
    }
}

/// A compiled expression: a weak reference to the context it was compiled
/// against (so a live expression never keeps its defining scope alive),
/// the instruction stream, and the heap-side data pool.
#[derive(Clone)]
pub struct Bytecode {
    pub context: Weak<Context>,
    pub instructions: Vec<Instruction>,
    pub data: Vec<Object>,
    pub optimized: bool,
}

impl Bytecode {
    pub fn new(context: &Rc<Context>) -> Bytecode {
        Bytecode { context: Rc::downgrade(context), instructions: Vec::new(), data: Vec::new(), optimized: false }
    }

    pub fn get_context(&self) -> Option<Rc<Context>> {
        self.context.upgrade()
    }

    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }
}
