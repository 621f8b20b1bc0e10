//! Plasticine BASIC Interpreter
//!
//! A small interpreter for a line-numbered BASIC dialect. Source text is
//! tokenized, parsed into a flat list of statements and executed by walking
//! the tree while a program counter moves over the statement list.

pub mod console;
pub mod executor;
pub mod parser;
pub mod program;
pub mod tokenizer;
pub mod variables;

// Re-export core types for convenience
pub use crate::error::{BasicError, LexError, ParseError, Result, RuntimeError, RuntimeErrorKind};
pub use console::{BufferConsole, Console, RandomSource, TerminalColor};
pub use executor::Executor;
pub use parser::{parse, BinaryOperator, Expression, Statement, StatementKind};
pub use program::Program;
pub use tokenizer::{tokenize, Token, TokenKind};
pub use variables::{ExecutionContext, Value};

/// Tokenize, parse and execute a complete program
///
/// Each phase fails fast: nothing reaches the next phase once one has failed.
pub fn run_source(
    source: &str,
    console: &mut dyn Console,
    random: &mut dyn RandomSource,
) -> Result<ExecutionContext> {
    let tokens = tokenize(source)?;
    let program = parse(&tokens)?;
    let mut executor = Executor::new(console, random);
    executor.execute(&program)?;
    Ok(executor.into_context())
}

/// Core error handling types for the interpreter
pub mod error {
    use std::fmt;

    /// Result type for operations spanning several phases
    pub type Result<T> = std::result::Result<T, BasicError>;

    /// Why the tokenizer gave up
    #[derive(Debug, Clone, PartialEq)]
    pub enum LexErrorReason {
        UnterminatedString,
        UnexpectedCharacter(char),
        InvalidNumber(String),
    }

    /// Malformed source text
    #[derive(Debug, Clone, PartialEq)]
    pub struct LexError {
        pub line: usize,
        pub column: usize,
        pub reason: LexErrorReason,
    }

    impl fmt::Display for LexError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match &self.reason {
                LexErrorReason::UnterminatedString => write!(
                    f,
                    "Unterminated string literal at line {}, column {}",
                    self.line, self.column
                ),
                LexErrorReason::UnexpectedCharacter(ch) => write!(
                    f,
                    "Unexpected character '{}' at line {}, column {}",
                    ch, self.line, self.column
                ),
                LexErrorReason::InvalidNumber(text) => write!(
                    f,
                    "Invalid number '{}' at line {}, column {}",
                    text, self.line, self.column
                ),
            }
        }
    }

    impl std::error::Error for LexError {}

    /// Malformed grammar, reported at the offending token
    #[derive(Debug, Clone, PartialEq)]
    pub struct ParseError {
        pub line: usize,
        pub column: usize,
        pub expected: String,
        pub found: String,
    }

    impl fmt::Display for ParseError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "Error at {}:{} - expected {}, found '{}'",
                self.line, self.column, self.expected, self.found
            )
        }
    }

    impl std::error::Error for ParseError {}

    /// Runtime error conditions
    #[derive(Debug, Clone, PartialEq)]
    pub enum RuntimeErrorKind {
        /// Operand kinds do not fit the operator
        TypeMismatch { details: String },
        UndefinedVariable(String),
        /// GOTO/GOSUB target with no matching label
        UndefinedLine(u32),
        NextWithoutFor(String),
        MismatchedNext { active: String, found: String },
        ReturnWithoutGosub,
        MissingColor,
        EndOfInput,
        Io(String),
    }

    /// A failure while executing a program
    #[derive(Debug, Clone, PartialEq)]
    pub struct RuntimeError {
        pub kind: RuntimeErrorKind,
        /// Label of the failing statement, if it carried one
        pub line: Option<u32>,
    }

    impl RuntimeError {
        pub fn new(kind: RuntimeErrorKind) -> Self {
            Self { kind, line: None }
        }

        pub fn type_mismatch(details: impl Into<String>) -> Self {
            Self::new(RuntimeErrorKind::TypeMismatch {
                details: details.into(),
            })
        }

        /// Attach a line label unless one is already present
        pub fn at_line(mut self, line: Option<u32>) -> Self {
            if self.line.is_none() {
                self.line = line;
            }
            self
        }

        /// Type errors are reported apart from every other runtime failure
        pub fn is_type_error(&self) -> bool {
            matches!(self.kind, RuntimeErrorKind::TypeMismatch { .. })
        }
    }

    impl From<RuntimeErrorKind> for RuntimeError {
        fn from(kind: RuntimeErrorKind) -> Self {
            RuntimeError::new(kind)
        }
    }

    impl From<std::io::Error> for RuntimeError {
        fn from(err: std::io::Error) -> Self {
            RuntimeError::new(RuntimeErrorKind::Io(err.to_string()))
        }
    }

    impl fmt::Display for RuntimeErrorKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                RuntimeErrorKind::TypeMismatch { details } => write!(f, "{}", details),
                RuntimeErrorKind::UndefinedVariable(name) => {
                    write!(f, "Undefined variable '{}'", name)
                }
                RuntimeErrorKind::UndefinedLine(line) => write!(f, "Line {} not found", line),
                RuntimeErrorKind::NextWithoutFor(name) => write!(f, "NEXT {} without FOR", name),
                RuntimeErrorKind::MismatchedNext { active, found } => write!(
                    f,
                    "NEXT {} does not match the active FOR {}",
                    found, active
                ),
                RuntimeErrorKind::ReturnWithoutGosub => write!(f, "RETURN without GOSUB"),
                RuntimeErrorKind::MissingColor => write!(f, "No color specified"),
                RuntimeErrorKind::EndOfInput => write!(f, "End of input reached during INPUT"),
                RuntimeErrorKind::Io(msg) => write!(f, "I/O error: {}", msg),
            }
        }
    }

    impl fmt::Display for RuntimeError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self.line {
                Some(line) => write!(f, "{} at line {}", self.kind, line),
                None => write!(f, "{}", self.kind),
            }
        }
    }

    impl std::error::Error for RuntimeError {}

    /// Any error raised by one of the three phases
    #[derive(Debug, Clone, PartialEq)]
    pub enum BasicError {
        Lex(LexError),
        Parse(ParseError),
        Runtime(RuntimeError),
    }

    impl fmt::Display for BasicError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                BasicError::Lex(e) => write!(f, "Syntax error: {}", e),
                BasicError::Parse(e) => write!(f, "Syntax error: {}", e),
                BasicError::Runtime(e) if e.is_type_error() => write!(f, "Type error: {}", e),
                BasicError::Runtime(e) => write!(f, "Runtime error: {}", e),
            }
        }
    }

    impl std::error::Error for BasicError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                BasicError::Lex(e) => Some(e),
                BasicError::Parse(e) => Some(e),
                BasicError::Runtime(e) => Some(e),
            }
        }
    }

    impl From<LexError> for BasicError {
        fn from(err: LexError) -> Self {
            BasicError::Lex(err)
        }
    }

    impl From<ParseError> for BasicError {
        fn from(err: ParseError) -> Self {
            BasicError::Parse(err)
        }
    }

    impl From<RuntimeError> for BasicError {
        fn from(err: RuntimeError) -> Self {
            BasicError::Runtime(err)
        }
    }
}
