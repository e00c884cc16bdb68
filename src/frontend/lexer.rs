use thiserror::Error;

use crate::bytecode::Program;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

/// A token in the program source that is not a signed 64-bit integer.
///
/// `line` and `col` are 1-based and point at the first character of the
/// offending token; `index` counts integers, empty tokens excluded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{col}: invalid integer '{token}' (cell {index})")]
pub struct ProgramParseError {
    pub token: String,
    pub index: usize,
    pub line: usize,
    pub col: usize,
}

/// Splits comma separated program text into cells.
///
/// Whitespace around a cell is ignored and empty cells are skipped, so a
/// trailing comma or newline is harmless.
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            col: self.col,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current();
        if ch == Some('\n') {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        self.pos += 1;
        ch
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current(), Some(ch) if ch.is_whitespace()) {
            self.advance();
        }
    }

    /// Read one raw cell up to the next delimiter. Returns the trimmed text
    /// and where it started, or `None` at end of input.
    fn next_cell(&mut self) -> Option<(String, Span)> {
        self.skip_whitespace();
        self.current()?;

        let start = self.span();
        let mut text = String::new();
        while let Some(ch) = self.current() {
            if ch == ',' {
                self.advance();
                break;
            }
            text.push(ch);
            self.advance();
        }

        Some((text.trim_end().to_string(), start))
    }

    pub fn tokenize(&mut self) -> Result<Vec<i64>, ProgramParseError> {
        let mut cells = Vec::new();

        while let Some((text, span)) = self.next_cell() {
            if text.is_empty() {
                continue;
            }

            let value = text.parse::<i64>().map_err(|_| ProgramParseError {
                token: text.clone(),
                index: cells.len(),
                line: span.line,
                col: span.col,
            })?;
            cells.push(value);
        }

        Ok(cells)
    }
}

/// Parse program source such as `"1,0,0,0,99\n"` into a program image.
pub fn parse_program(source: &str) -> Result<Program, ProgramParseError> {
    Lexer::new(source).tokenize().map(Program::new)
}

impl std::str::FromStr for Program {
    type Err = ProgramParseError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        parse_program(source)
    }
}
