//! IntCode virtual machine and amplifier pipeline.
//!
//! ```text
//! src/
//! ├── frontend/  - program source loader (comma separated integers)
//! ├── bytecode/  - program image, opcode and parameter-mode decoding
//! └── runtime/   - memory, interpreter, ring scheduler
//! ```
//!
//! # Quick Start
//!
//! ```
//! use intcode::{parse_program, run_with_inputs};
//!
//! let program = parse_program("3,9,8,9,10,9,4,9,99,-1,8").unwrap();
//! assert_eq!(run_with_inputs(&program, &[8]).unwrap(), vec![1]);
//! ```

pub mod bytecode;
pub mod frontend;
pub mod runtime;

pub use bytecode::{Instruction, Opcode, ParamMode, Program};
pub use frontend::{ProgramParseError, parse_program};
pub use runtime::{
    BestPhases, Fault, Pipeline, PipelineError, RunError, RunOutcome, Status, Vm, VmConfig,
    best_phases, max_output, run_phases, run_with_inputs,
};
