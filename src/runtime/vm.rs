use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, trace};

use crate::bytecode::{Instruction, Opcode, ParamMode, Program};
use crate::runtime::memory::Memory;
use crate::runtime::runtime_error::{Fault, RunError};

#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Instructions allowed per `run()` call. `None` means unbounded.
    pub max_steps: Option<usize>,
    /// Writes at or above this address fault instead of growing memory.
    pub max_memory: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            max_steps: None,
            max_memory: 1 << 24,
        }
    }
}

/// Why `run()` returned control to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    /// Opcode 99 executed, or the instruction pointer left memory.
    Halted,
    /// Opcode 3 found the input queue empty. The same instruction runs
    /// again on the next `run()`.
    NeedsInput,
}

/// Result of executing a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Executed,
    Halted,
    NeedsInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Status {
    Ready,
    Blocked,
    Halted,
    Faulted(Fault),
}

/// One IntCode interpreter instance.
///
/// Owns a private copy of the program image, the instruction pointer, the
/// relative base and both queues. State survives across `run()` calls so an
/// instance blocked on input can be resumed once a value is pushed.
pub struct Vm {
    memory: Memory,
    ip: usize,
    relative_base: i64,
    input: VecDeque<i64>,
    output: VecDeque<i64>,
    status: Status,
    // Safety limits
    config: VmConfig,
    steps: usize,
    inputs_supplied: usize,
}

impl Vm {
    pub fn new(program: &Program) -> Self {
        Self::with_config(program, VmConfig::default())
    }

    pub fn with_config(program: &Program, config: VmConfig) -> Self {
        Self {
            memory: Memory::new(program.cells().to_vec()),
            ip: 0,
            relative_base: 0,
            input: VecDeque::new(),
            output: VecDeque::new(),
            status: Status::Ready,
            config,
            steps: 0,
            inputs_supplied: 0,
        }
    }

    // Queues

    pub fn push_input(&mut self, value: i64) {
        self.input.push_back(value);
        self.inputs_supplied += 1;
    }

    pub fn extend_input(&mut self, values: impl IntoIterator<Item = i64>) {
        for value in values {
            self.push_input(value);
        }
    }

    /// Number of queued inputs not yet consumed.
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    /// Outputs produced since the last `take_output`, oldest first.
    pub fn output(&self) -> &VecDeque<i64> {
        &self.output
    }

    /// Drain the output queue.
    pub fn take_output(&mut self) -> Vec<i64> {
        self.output.drain(..).collect()
    }

    // Inspection

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn read(&self, address: usize) -> i64 {
        self.memory.read(address)
    }

    pub fn instruction_pointer(&self) -> usize {
        self.ip
    }

    pub fn relative_base(&self) -> i64 {
        self.relative_base
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_halted(&self) -> bool {
        self.status == Status::Halted
    }

    // Execution

    /// Execute from the current instruction pointer until the program halts,
    /// blocks on input, or faults.
    ///
    /// Calling `run()` on a halted instance returns `Halted` without executing
    /// anything; on a faulted instance it returns the original fault.
    pub fn run(&mut self) -> Result<RunOutcome, Fault> {
        self.steps = 0;

        loop {
            self.check_limits()?;

            match self.step()? {
                Step::Executed => {}
                Step::Halted => return Ok(RunOutcome::Halted),
                Step::NeedsInput => return Ok(RunOutcome::NeedsInput),
            }
        }
    }

    /// Execute exactly one instruction.
    pub fn step(&mut self) -> Result<Step, Fault> {
        match &self.status {
            Status::Halted => return Ok(Step::Halted),
            Status::Faulted(fault) => return Err(fault.clone()),
            Status::Ready | Status::Blocked => {}
        }

        match self.exec() {
            Ok(Step::Executed) => {
                self.status = Status::Ready;
                Ok(Step::Executed)
            }
            Ok(Step::Halted) => {
                debug!(target: "intcode::vm", ip = self.ip, "halted");
                self.status = Status::Halted;
                Ok(Step::Halted)
            }
            Ok(Step::NeedsInput) => {
                debug!(target: "intcode::vm", ip = self.ip, "blocked on input");
                self.status = Status::Blocked;
                Ok(Step::NeedsInput)
            }
            Err(fault) => Err(self.fail(fault)),
        }
    }

    /// Run to halt and return every output. Blocking for input after the
    /// queue ran dry is an error.
    pub fn run_to_completion(&mut self) -> Result<Vec<i64>, RunError> {
        match self.run()? {
            RunOutcome::Halted => Ok(self.take_output()),
            RunOutcome::NeedsInput => Err(RunError::InputExhausted {
                ip: self.ip,
                supplied: self.inputs_supplied,
            }),
        }
    }

    fn check_limits(&mut self) -> Result<(), Fault> {
        if !matches!(self.status, Status::Ready | Status::Blocked) {
            return Ok(());
        }

        self.steps += 1;

        if let Some(max) = self.config.max_steps {
            if self.steps > max {
                let fault = Fault::StepLimitExceeded {
                    ip: self.ip,
                    limit: max,
                };
                return Err(self.fail(fault));
            }
        }

        Ok(())
    }

    fn fail(&mut self, fault: Fault) -> Fault {
        debug!(target: "intcode::vm", ip = self.ip, %fault, "faulted");
        self.status = Status::Faulted(fault.clone());
        fault
    }

    fn exec(&mut self) -> Result<Step, Fault> {
        let ip = self.ip;

        if ip >= self.memory.len() {
            debug!(target: "intcode::vm", ip, "instruction pointer past end of memory");
            return Ok(Step::Halted);
        }

        let ins =
            Instruction::decode(self.memory.read(ip)).map_err(|e| Fault::from_decode(ip, e))?;

        trace!(
            target: "intcode::vm",
            ip,
            op = ins.opcode.mnemonic(),
            base = self.relative_base,
            "exec"
        );

        match ins.opcode {
            Opcode::Add => {
                let a = self.load(&ins, 1)?;
                let b = self.load(&ins, 2)?;
                let sum = a
                    .checked_add(b)
                    .ok_or(Fault::ArithmeticOverflow { ip, op: "add" })?;
                self.store(&ins, 3, sum)?;
            }
            Opcode::Mul => {
                let a = self.load(&ins, 1)?;
                let b = self.load(&ins, 2)?;
                let product = a
                    .checked_mul(b)
                    .ok_or(Fault::ArithmeticOverflow { ip, op: "mul" })?;
                self.store(&ins, 3, product)?;
            }
            Opcode::Input => {
                let Some(&value) = self.input.front() else {
                    return Ok(Step::NeedsInput);
                };
                self.store(&ins, 1, value)?;
                self.input.pop_front();
            }
            Opcode::Output => {
                let a = self.load(&ins, 1)?;
                self.output.push_back(a);
            }
            Opcode::JumpIfTrue => {
                let a = self.load(&ins, 1)?;
                let target = self.load(&ins, 2)?;
                if a != 0 {
                    self.jump(target)?;
                    return Ok(Step::Executed);
                }
            }
            Opcode::JumpIfFalse => {
                let a = self.load(&ins, 1)?;
                let target = self.load(&ins, 2)?;
                if a == 0 {
                    self.jump(target)?;
                    return Ok(Step::Executed);
                }
            }
            Opcode::LessThan => {
                let a = self.load(&ins, 1)?;
                let b = self.load(&ins, 2)?;
                self.store(&ins, 3, i64::from(a < b))?;
            }
            Opcode::Equals => {
                let a = self.load(&ins, 1)?;
                let b = self.load(&ins, 2)?;
                self.store(&ins, 3, i64::from(a == b))?;
            }
            Opcode::AdjustBase => {
                let a = self.load(&ins, 1)?;
                self.relative_base = self.relative_base.checked_add(a).ok_or(
                    Fault::ArithmeticOverflow {
                        ip,
                        op: "adjust base",
                    },
                )?;
            }
            Opcode::Halt => return Ok(Step::Halted),
        }

        self.ip += ins.width();
        Ok(Step::Executed)
    }

    // Operand access. `n` is the 1-based parameter index.

    fn param(&self, n: usize) -> i64 {
        self.memory.read(self.ip + n)
    }

    fn address(&self, ins: &Instruction, n: usize) -> Result<usize, Fault> {
        let ip = self.ip;
        let raw = self.param(n);

        let address = match ins.mode(n) {
            ParamMode::Position => raw,
            ParamMode::Relative => {
                raw.checked_add(self.relative_base)
                    .ok_or(Fault::ArithmeticOverflow {
                        ip,
                        op: "relative address",
                    })?
            }
            ParamMode::Immediate => {
                return Err(Fault::InvalidParameterMode {
                    ip,
                    param: n,
                    mode: 1,
                });
            }
        };

        usize::try_from(address).map_err(|_| Fault::InvalidAddress { ip, address })
    }

    fn load(&self, ins: &Instruction, n: usize) -> Result<i64, Fault> {
        match ins.mode(n) {
            ParamMode::Immediate => Ok(self.param(n)),
            ParamMode::Position | ParamMode::Relative => {
                Ok(self.memory.read(self.address(ins, n)?))
            }
        }
    }

    fn store(&mut self, ins: &Instruction, n: usize, value: i64) -> Result<(), Fault> {
        let address = self.address(ins, n)?;

        if address >= self.config.max_memory {
            return Err(Fault::MemoryLimitExceeded {
                ip: self.ip,
                address,
                limit: self.config.max_memory,
            });
        }

        self.memory.write(address, value);
        Ok(())
    }

    fn jump(&mut self, target: i64) -> Result<(), Fault> {
        self.ip = usize::try_from(target).map_err(|_| Fault::InvalidAddress {
            ip: self.ip,
            address: target,
        })?;
        Ok(())
    }
}

/// Run `program` on a fresh instance with `inputs` preloaded and collect
/// every output.
pub fn run_with_inputs(program: &Program, inputs: &[i64]) -> Result<Vec<i64>, RunError> {
    let mut vm = Vm::new(program);
    vm.extend_input(inputs.iter().copied());
    vm.run_to_completion()
}
