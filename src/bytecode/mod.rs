pub mod ir;
pub mod op;

pub use ir::Program;
pub use op::{DecodeError, Instruction, Opcode, ParamMode};
