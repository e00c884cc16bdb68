use serde::Serialize;
use thiserror::Error;

use crate::bytecode::DecodeError;

/// A fatal runtime fault. The faulting instance never executes again.
///
/// Every variant records the instruction pointer of the instruction that
/// faulted.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum Fault {
    #[error("unknown opcode {opcode} at ip={ip}")]
    UnknownOpcode { ip: usize, opcode: i64 },

    /// A mode digit outside {0, 1, 2}, or Immediate mode on a write target.
    #[error("invalid mode {mode} for parameter {param} at ip={ip}")]
    InvalidParameterMode { ip: usize, param: usize, mode: i64 },

    #[error("negative address {address} at ip={ip}")]
    InvalidAddress { ip: usize, address: i64 },

    #[error("integer overflow in {op} at ip={ip}")]
    ArithmeticOverflow { ip: usize, op: &'static str },

    #[error("write to address {address} exceeds memory limit ({limit}) at ip={ip}")]
    MemoryLimitExceeded {
        ip: usize,
        address: usize,
        limit: usize,
    },

    #[error("execution step limit exceeded ({limit}) at ip={ip}")]
    StepLimitExceeded { ip: usize, limit: usize },
}

impl Fault {
    pub fn ip(&self) -> usize {
        match self {
            Fault::UnknownOpcode { ip, .. }
            | Fault::InvalidParameterMode { ip, .. }
            | Fault::InvalidAddress { ip, .. }
            | Fault::ArithmeticOverflow { ip, .. }
            | Fault::MemoryLimitExceeded { ip, .. }
            | Fault::StepLimitExceeded { ip, .. } => *ip,
        }
    }

    pub(crate) fn from_decode(ip: usize, err: DecodeError) -> Self {
        match err {
            DecodeError::UnknownOpcode(opcode) => Fault::UnknownOpcode { ip, opcode },
            DecodeError::InvalidMode { param, mode } => {
                Fault::InvalidParameterMode { ip, param, mode }
            }
        }
    }
}

/// Error from running a program to completion with a fixed input list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error(transparent)]
    Fault(#[from] Fault),

    /// The program asked for more input than was supplied.
    #[error("program needs input at ip={ip} but all {supplied} inputs were consumed")]
    InputExhausted { ip: usize, supplied: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_ip() {
        let fault = Fault::UnknownOpcode { ip: 12, opcode: 42 };
        assert_eq!(fault.to_string(), "unknown opcode 42 at ip=12");
        assert_eq!(fault.ip(), 12);
    }

    #[test]
    fn test_from_decode() {
        let fault = Fault::from_decode(3, DecodeError::InvalidMode { param: 2, mode: 7 });
        assert_eq!(
            fault,
            Fault::InvalidParameterMode {
                ip: 3,
                param: 2,
                mode: 7
            }
        );
    }

    #[test]
    fn test_run_error_is_transparent_over_fault() {
        let err: RunError = Fault::InvalidAddress { ip: 0, address: -5 }.into();
        assert_eq!(err.to_string(), "negative address -5 at ip=0");
    }
}
