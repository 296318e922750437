/// A single bytecode instruction.
///
/// The original source represents the instruction stream as a flat array of
/// fixed-width words (an opcode word followed by however many operand words
/// that opcode needs), made self-describing only by each opcode having a
/// statically-known operand count (see `original_source/src/bytecode.c`).
/// This is a documented REDESIGN (`SPEC_FULL.md` §4.5): operands are fields
/// on the enum variant instead, so the compiler and VM can never
/// misinterpret how many words an instruction occupies — a whole bug class
/// the word-array encoding is prone to. The operational semantics of every
/// variant match the corresponding `OPCODE_*` exactly.
///
/// `L*` fields are local-slot indices; `K*` fields are constant-pool or
/// global-table indices; jump targets are instruction indices into the
/// owning `CodeBlock`'s `code` vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `dst <- clone(src)`
    Move { src: u32, dst: u32 },
    /// `dst <- array of cloned slot values`
    ArrayLiteral { elements: Vec<u32>, dst: u32 },
    /// `dst <- clone(constants[index])`
    LoadConstant { index: u32, dst: u32 },
    /// `dst <- fetch global[index]`
    LoadGlobal { index: u32, dst: u32 },
    /// `global[index] <- clone(src); dst <- src`
    StoreGlobal { index: u32, src: u32, dst: u32 },
    Jump { target: u32 },
    JumpIfTrue { cond: u32, target: u32 },
    JumpIfFalse { cond: u32, target: u32 },
    /// `dst <- call(callee, args)`
    Call { callee: u32, args: Vec<u32>, dst: u32 },
    /// `ip <- past the end; locals[0] is the result`
    Return,
    Not { src: u32, dst: u32 },
    Negate { src: u32, dst: u32 },
    Add { lhs: u32, rhs: u32, dst: u32 },
    Subtract { lhs: u32, rhs: u32, dst: u32 },
    Multiply { lhs: u32, rhs: u32, dst: u32 },
    Divide { lhs: u32, rhs: u32, dst: u32 },
    Modulo { lhs: u32, rhs: u32, dst: u32 },
    Equal { lhs: u32, rhs: u32, dst: u32 },
    NotEqual { lhs: u32, rhs: u32, dst: u32 },
    LessThan { lhs: u32, rhs: u32, dst: u32 },
    LessThanOrEqual { lhs: u32, rhs: u32, dst: u32 },
    GreaterThan { lhs: u32, rhs: u32, dst: u32 },
    GreaterThanOrEqual { lhs: u32, rhs: u32, dst: u32 },
    /// `dst <- src[index]`
    Index { src: u32, index: u32, dst: u32 },
    /// `src[index] <- val; dst <- val`
    IndexAssign { src: u32, index: u32, val: u32, dst: u32 },
}
