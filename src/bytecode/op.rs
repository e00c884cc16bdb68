use serde::{Deserialize, Serialize};

// =============================================================================
// OPCODE - IntCode instructions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Opcode {
    // arithmetic
    Add,
    Mul,

    // I/O
    /// Suspends the instance when the input queue is empty.
    Input,
    Output,

    // control flow
    JumpIfTrue,
    JumpIfFalse,

    // comparison
    LessThan,
    Equals,

    // registers
    AdjustBase,

    Halt,
}

impl Opcode {
    pub fn from_code(code: i64) -> Option<Self> {
        use Opcode::*;
        Some(match code {
            1 => Add,
            2 => Mul,
            3 => Input,
            4 => Output,
            5 => JumpIfTrue,
            6 => JumpIfFalse,
            7 => LessThan,
            8 => Equals,
            9 => AdjustBase,
            99 => Halt,
            _ => return None,
        })
    }

    pub fn code(self) -> i64 {
        use Opcode::*;
        match self {
            Add => 1,
            Mul => 2,
            Input => 3,
            Output => 4,
            JumpIfTrue => 5,
            JumpIfFalse => 6,
            LessThan => 7,
            Equals => 8,
            AdjustBase => 9,
            Halt => 99,
        }
    }

    /// Number of parameters following the instruction word.
    pub fn arity(self) -> usize {
        use Opcode::*;
        match self {
            Add | Mul | LessThan | Equals => 3,
            JumpIfTrue | JumpIfFalse => 2,
            Input | Output | AdjustBase => 1,
            Halt => 0,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        use Opcode::*;
        match self {
            Add => "add",
            Mul => "mul",
            Input => "in",
            Output => "out",
            JumpIfTrue => "jnz",
            JumpIfFalse => "jz",
            LessThan => "lt",
            Equals => "eq",
            AdjustBase => "arb",
            Halt => "halt",
        }
    }
}

/// Addressing mode of a single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParamMode {
    /// The parameter is an address.
    #[default]
    Position,
    /// The parameter is the operand itself. Never valid for a write target.
    Immediate,
    /// The parameter plus the relative base is an address.
    Relative,
}

impl ParamMode {
    pub fn from_digit(digit: i64) -> Option<Self> {
        match digit {
            0 => Some(ParamMode::Position),
            1 => Some(ParamMode::Immediate),
            2 => Some(ParamMode::Relative),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    UnknownOpcode(i64),
    /// `param` is 1-based; 4 means stray digits above the third mode.
    InvalidMode { param: usize, mode: i64 },
}

/// A decoded instruction word: opcode plus one mode per parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub modes: [ParamMode; 3],
}

impl Instruction {
    /// Decode an instruction word such as `1002` into `Mul` with modes
    /// `[Position, Immediate, Position]`.
    ///
    /// Missing mode digits default to `Position`.
    pub fn decode(word: i64) -> Result<Self, DecodeError> {
        if word < 0 {
            return Err(DecodeError::UnknownOpcode(word));
        }

        let opcode = Opcode::from_code(word % 100).ok_or(DecodeError::UnknownOpcode(word % 100))?;

        let mut rest = word / 100;
        let mut modes = [ParamMode::Position; 3];
        for (i, mode) in modes.iter_mut().enumerate() {
            let digit = rest % 10;
            *mode = ParamMode::from_digit(digit).ok_or(DecodeError::InvalidMode {
                param: i + 1,
                mode: digit,
            })?;
            rest /= 10;
        }

        if rest != 0 {
            return Err(DecodeError::InvalidMode {
                param: 4,
                mode: rest,
            });
        }

        Ok(Instruction { opcode, modes })
    }

    /// Mode of the 1-based parameter `param`.
    pub fn mode(&self, param: usize) -> ParamMode {
        self.modes[param - 1]
    }

    /// Distance from this instruction to the next one in memory.
    pub fn width(&self) -> usize {
        self.opcode.arity() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_opcode() {
        let ins = Instruction::decode(1).unwrap();
        assert_eq!(ins.opcode, Opcode::Add);
        assert_eq!(ins.modes, [ParamMode::Position; 3]);
        assert_eq!(ins.width(), 4);
    }

    #[test]
    fn test_decode_modes_right_to_left() {
        let ins = Instruction::decode(1002).unwrap();
        assert_eq!(ins.opcode, Opcode::Mul);
        assert_eq!(ins.mode(1), ParamMode::Position);
        assert_eq!(ins.mode(2), ParamMode::Immediate);
        assert_eq!(ins.mode(3), ParamMode::Position);

        let ins = Instruction::decode(21107).unwrap();
        assert_eq!(ins.opcode, Opcode::LessThan);
        assert_eq!(
            ins.modes,
            [ParamMode::Immediate, ParamMode::Immediate, ParamMode::Relative]
        );
    }

    #[test]
    fn test_decode_halt() {
        let ins = Instruction::decode(99).unwrap();
        assert_eq!(ins.opcode, Opcode::Halt);
        assert_eq!(ins.width(), 1);
    }

    #[test]
    fn test_unknown_opcode() {
        assert_eq!(Instruction::decode(42), Err(DecodeError::UnknownOpcode(42)));
        assert_eq!(Instruction::decode(0), Err(DecodeError::UnknownOpcode(0)));
        assert_eq!(Instruction::decode(-1), Err(DecodeError::UnknownOpcode(-1)));
    }

    #[test]
    fn test_invalid_mode_digit() {
        assert_eq!(
            Instruction::decode(301),
            Err(DecodeError::InvalidMode { param: 1, mode: 3 })
        );
        assert_eq!(
            Instruction::decode(90001),
            Err(DecodeError::InvalidMode { param: 3, mode: 9 })
        );
    }

    #[test]
    fn test_stray_high_digits() {
        assert_eq!(
            Instruction::decode(100001),
            Err(DecodeError::InvalidMode { param: 4, mode: 1 })
        );
    }

    #[test]
    fn test_opcode_code_round_trip() {
        for code in [1, 2, 3, 4, 5, 6, 7, 8, 9, 99] {
            assert_eq!(Opcode::from_code(code).map(Opcode::code), Some(code));
        }
    }
}
