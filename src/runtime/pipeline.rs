//! Ring scheduler that chains several IntCode instances.
//!
//! Each stage gets its own copy of the program and is seeded with a phase
//! setting. Stages are resumed in order; whatever a stage writes to its
//! output queue is drained and appended to the next stage's input queue,
//! with the last stage feeding the first. The ring stops once no live stage
//! has input left to consume.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::bytecode::Program;
use crate::runtime::runtime_error::Fault;
use crate::runtime::vm::{Status, Vm, VmConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("pipeline has no stages")]
    NoStages,

    #[error("stage {index} faulted: {source}")]
    Stage {
        index: usize,
        #[source]
        source: Fault,
    },

    /// The ring quiesced while some stages were still waiting for input.
    #[error("pipeline deadlocked: stages {blocked:?} wait for input that never arrives")]
    Deadlock { blocked: Vec<usize> },

    #[error("every stage halted but the last stage produced no output")]
    NoOutput,
}

struct Stage {
    phase: i64,
    vm: Vm,
}

impl Stage {
    fn runnable(&self) -> bool {
        !self.vm.is_halted() && self.vm.pending_input() > 0
    }
}

/// One ring of stages for a fixed phase assignment.
pub struct Pipeline {
    stages: Vec<Stage>,
    last_output: Option<i64>,
}

impl Pipeline {
    pub fn new(program: &Program, phases: &[i64]) -> Result<Self, PipelineError> {
        Self::with_config(program, phases, &VmConfig::default())
    }

    /// Build one stage per phase. Each phase is queued as its stage's first
    /// input, ahead of anything an upstream stage produces later.
    pub fn with_config(
        program: &Program,
        phases: &[i64],
        config: &VmConfig,
    ) -> Result<Self, PipelineError> {
        if phases.is_empty() {
            return Err(PipelineError::NoStages);
        }

        let stages = phases
            .iter()
            .map(|&phase| {
                let mut vm = Vm::with_config(program, config.clone());
                vm.push_input(phase);
                Stage { phase, vm }
            })
            .collect();

        Ok(Self {
            stages,
            last_output: None,
        })
    }

    /// Queue a value on the first stage's input.
    pub fn feed(&mut self, signal: i64) {
        self.stages[0].vm.push_input(signal);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Most recent value emitted by the last stage.
    pub fn last_output(&self) -> Option<i64> {
        self.last_output
    }

    pub fn stage_status(&self, index: usize) -> Option<&Status> {
        self.stages.get(index).map(|stage| stage.vm.status())
    }

    /// Drive the ring until it quiesces and return the last stage's final
    /// output.
    pub fn run(&mut self) -> Result<i64, PipelineError> {
        let count = self.stages.len();
        let mut rounds = 0usize;

        while self.stages.iter().any(Stage::runnable) {
            rounds += 1;

            for index in 0..count {
                if !self.stages[index].runnable() {
                    continue;
                }

                let stage = &mut self.stages[index];
                let outcome = stage
                    .vm
                    .run()
                    .map_err(|source| PipelineError::Stage { index, source })?;
                let produced = stage.vm.take_output();

                debug!(
                    target: "intcode::pipeline",
                    stage = index,
                    phase = stage.phase,
                    ?outcome,
                    produced = produced.len(),
                    "stage yielded"
                );

                if index == count - 1 {
                    if let Some(&last) = produced.last() {
                        self.last_output = Some(last);
                    }
                }

                self.stages[(index + 1) % count].vm.extend_input(produced);
            }
        }

        let blocked: Vec<usize> = self
            .stages
            .iter()
            .enumerate()
            .filter(|(_, stage)| !stage.vm.is_halted())
            .map(|(index, _)| index)
            .collect();

        debug!(target: "intcode::pipeline", rounds, ?blocked, "ring quiesced");

        if !blocked.is_empty() {
            return Err(PipelineError::Deadlock { blocked });
        }

        self.last_output.ok_or(PipelineError::NoOutput)
    }
}

/// Run a single ring for `phases`, feeding `signal` to the first stage.
pub fn run_phases(
    program: &Program,
    phases: &[i64],
    signal: i64,
    config: &VmConfig,
) -> Result<i64, PipelineError> {
    let mut pipeline = Pipeline::with_config(program, phases, config)?;
    pipeline.feed(signal);
    pipeline.run()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestPhases {
    pub phases: Vec<i64>,
    pub output: i64,
}

/// Try every ordering of `phases` and keep the one whose ring produces the
/// largest final output. Ties keep the first ordering found.
pub fn best_phases(
    program: &Program,
    phases: &[i64],
    signal: i64,
    config: &VmConfig,
) -> Result<BestPhases, PipelineError> {
    if phases.is_empty() {
        return Err(PipelineError::NoStages);
    }

    let mut order = phases.to_vec();
    let mut best: Option<BestPhases> = None;
    let mut tried = 0usize;

    for_each_permutation(&mut order, |candidate| -> Result<(), PipelineError> {
        tried += 1;
        let output = run_phases(program, candidate, signal, config)?;

        if best.as_ref().is_none_or(|b| output > b.output) {
            best = Some(BestPhases {
                phases: candidate.to_vec(),
                output,
            });
        }
        Ok(())
    })?;

    let best = best.ok_or(PipelineError::NoOutput)?;
    info!(
        target: "intcode::pipeline",
        tried,
        phases = ?best.phases,
        output = best.output,
        "best phase order"
    );
    Ok(best)
}

/// Best final output over all permutations of `phases`, starting from a
/// signal of 0.
pub fn max_output(program: &Program, phases: &[i64]) -> Result<i64, PipelineError> {
    best_phases(program, phases, 0, &VmConfig::default()).map(|best| best.output)
}

/// Heap's algorithm. Visits every ordering of `items` exactly once, in place.
fn for_each_permutation<E, F>(items: &mut [i64], mut visit: F) -> Result<(), E>
where
    F: FnMut(&[i64]) -> Result<(), E>,
{
    let n = items.len();
    let mut counters = vec![0usize; n];

    visit(items)?;

    let mut i = 1;
    while i < n {
        if counters[i] < i {
            if i % 2 == 0 {
                items.swap(0, i);
            } else {
                items.swap(counters[i], i);
            }
            visit(items)?;
            counters[i] += 1;
            i = 1;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const FEEDBACK_A: &[i64] = &[
        3, 26, 1001, 26, -4, 26, 3, 27, 1002, 27, 2, 27, 1, 27, 26, 27, 4, 27, 1001, 28, -1, 28,
        1005, 28, 6, 99, 0, 0, 5,
    ];

    const FEEDBACK_B: &[i64] = &[
        3, 52, 1001, 52, -5, 52, 3, 53, 1, 52, 56, 54, 1007, 54, 5, 55, 1005, 55, 26, 1001, 54, -5,
        54, 1105, 1, 12, 1, 53, 54, 53, 1008, 54, 0, 55, 1001, 55, 1, 55, 2, 53, 55, 53, 4, 53,
        1001, 56, -1, 56, 1005, 56, 6, 99, 0, 0, 0, 0, 10,
    ];

    fn program(cells: &[i64]) -> Program {
        Program::from(cells)
    }

    #[test]
    fn test_feedback_golden() {
        let output = run_phases(
            &program(FEEDBACK_A),
            &[9, 8, 7, 6, 5],
            0,
            &VmConfig::default(),
        );
        assert_eq!(output, Ok(139629729));
    }

    #[test]
    fn test_feedback_all_stages_halt() {
        let mut pipeline = Pipeline::new(&program(FEEDBACK_A), &[9, 8, 7, 6, 5]).unwrap();
        pipeline.feed(0);
        assert_eq!(pipeline.run(), Ok(139629729));
        assert_eq!(pipeline.last_output(), Some(139629729));
        for index in 0..pipeline.len() {
            assert_eq!(pipeline.stage_status(index), Some(&Status::Halted));
        }
    }

    #[test]
    fn test_feedback_search() {
        let best = best_phases(&program(FEEDBACK_A), &[5, 6, 7, 8, 9], 0, &VmConfig::default())
            .unwrap();
        assert_eq!(best.output, 139629729);
        assert_eq!(best.phases, vec![9, 8, 7, 6, 5]);

        let best = best_phases(&program(FEEDBACK_B), &[5, 6, 7, 8, 9], 0, &VmConfig::default())
            .unwrap();
        assert_eq!(best.output, 18216);
        assert_eq!(best.phases, vec![9, 7, 8, 5, 6]);
    }

    #[test]
    fn test_serial_chain_search() {
        let cases: [(&[i64], i64); 3] = [
            (
                &[3, 15, 3, 16, 1002, 16, 10, 16, 1, 16, 15, 15, 4, 15, 99, 0, 0],
                43210,
            ),
            (
                &[
                    3, 23, 3, 24, 1002, 24, 10, 24, 1002, 23, -1, 23, 101, 5, 23, 23, 1, 24, 23,
                    23, 4, 23, 99, 0, 0,
                ],
                54321,
            ),
            (
                &[
                    3, 31, 3, 32, 1002, 32, 10, 32, 1001, 31, -2, 31, 1007, 31, 0, 33, 1002, 33, 7,
                    33, 1, 33, 31, 31, 1, 32, 31, 31, 4, 31, 99, 0, 0, 0,
                ],
                65210,
            ),
        ];

        for (cells, expected) in cases {
            assert_eq!(max_output(&program(cells), &[0, 1, 2, 3, 4]), Ok(expected));
        }
    }

    #[test]
    fn test_serial_fixed_order() {
        let prog = program(&[3, 15, 3, 16, 1002, 16, 10, 16, 1, 16, 15, 15, 4, 15, 99, 0, 0]);
        assert_eq!(
            run_phases(&prog, &[4, 3, 2, 1, 0], 0, &VmConfig::default()),
            Ok(43210)
        );
    }

    #[test]
    fn test_no_stages() {
        assert!(matches!(
            Pipeline::new(&program(&[99]), &[]),
            Err(PipelineError::NoStages)
        ));
        assert_eq!(max_output(&program(&[99]), &[]), Err(PipelineError::NoStages));
    }

    #[test]
    fn test_deadlock_is_reported() {
        // Each stage reads forever and never writes.
        let prog = program(&[3, 0, 3, 0, 3, 0, 99]);
        assert_eq!(
            run_phases(&prog, &[1, 2], 0, &VmConfig::default()),
            Err(PipelineError::Deadlock {
                blocked: vec![0, 1]
            })
        );
    }

    #[test]
    fn test_partial_deadlock() {
        // Stage 0 gets phase + signal and halts, stage 1 starves.
        let prog = program(&[3, 0, 3, 0, 99]);
        assert_eq!(
            run_phases(&prog, &[1, 2], 0, &VmConfig::default()),
            Err(PipelineError::Deadlock { blocked: vec![1] })
        );
    }

    #[test]
    fn test_no_output() {
        assert_eq!(
            run_phases(&program(&[99]), &[0, 1], 0, &VmConfig::default()),
            Err(PipelineError::NoOutput)
        );
    }

    #[test]
    fn test_stage_fault() {
        assert_eq!(
            run_phases(&program(&[3, 0, 42]), &[0, 1], 0, &VmConfig::default()),
            Err(PipelineError::Stage {
                index: 0,
                source: Fault::UnknownOpcode { ip: 2, opcode: 42 }
            })
        );
    }

    #[test]
    fn test_single_stage_feeds_itself() {
        // in a; out a+1; in b; out b; halt. The second read is satisfied by
        // the stage's own first output.
        let prog = program(&[3, 20, 3, 20, 101, 1, 20, 21, 4, 21, 3, 22, 4, 22, 99]);
        let mut pipeline = Pipeline::new(&prog, &[7]).unwrap();
        pipeline.feed(40);
        assert_eq!(pipeline.run(), Ok(41));
    }

    #[test]
    fn test_permutations_are_complete() {
        let mut items = vec![1, 2, 3, 4];
        let mut seen = HashSet::new();
        let result: Result<(), ()> = for_each_permutation(&mut items, |p| {
            seen.insert(p.to_vec());
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(seen.len(), 24);
    }

    #[test]
    fn test_permutation_visit_can_stop_early() {
        let mut items = vec![1, 2, 3];
        let mut visits = 0;
        let result = for_each_permutation(&mut items, |_| {
            visits += 1;
            if visits == 2 { Err("stop") } else { Ok(()) }
        });
        assert_eq!(result, Err("stop"));
        assert_eq!(visits, 2);
    }
}
