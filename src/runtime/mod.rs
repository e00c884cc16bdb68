pub mod memory;
pub mod pipeline;
pub mod runtime_error;
pub mod vm;

pub use memory::Memory;
pub use pipeline::{BestPhases, Pipeline, PipelineError, best_phases, max_output, run_phases};
pub use runtime_error::{Fault, RunError};
pub use vm::{RunOutcome, Status, Step, Vm, VmConfig, run_with_inputs};
