pub mod lexer;

pub use lexer::{Lexer, ProgramParseError, Span, parse_program};
