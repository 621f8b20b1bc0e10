//! Tokenizer for Plasticine BASIC source code
//!
//! Converts source text into an ordered list of tokens carrying their
//! line/column position. Newlines are kept as explicit `EndOfLine` tokens
//! because they separate statements.

use crate::error::{LexError, LexErrorReason};
use std::fmt;

/// Kind of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Special
    EndOfLine,
    EndOfFile,

    // Literals
    NumberLiteral,
    /// Integer numeral at the start of a line, i.e. a statement label
    LineNumber,
    StringLiteral,
    Identifier,
    /// Raw text following REM up to the end of the line
    Comment,

    // Keywords
    Let,
    Print,
    PrintLine,
    Input,
    If,
    Then,
    Else,
    Goto,
    Gosub,
    Return,
    For,
    To,
    Step,
    Next,
    Rem,
    End,
    Stop,
    Random,
    SetForegroundColor,
    SetBackgroundColor,

    // Operators
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulus,
    Power,
    Assign,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    // Punctuation
    LeftParen,
    RightParen,
    Comma,
    Colon,
}

/// A single token with its source position
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }
}

/// Textual form of the token, suitable for tokenizing again
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::StringLiteral => write!(f, "\"{}\"", self.lexeme),
            TokenKind::EndOfLine => writeln!(f),
            TokenKind::EndOfFile => Ok(()),
            _ => write!(f, "{}", self.lexeme),
        }
    }
}

// Keyword spellings, matched case-insensitively
const KEYWORDS: &[(&str, TokenKind)] = &[
    ("LET", TokenKind::Let),
    ("PRINT", TokenKind::Print),
    ("PRINTLINE", TokenKind::PrintLine),
    ("INPUT", TokenKind::Input),
    ("IF", TokenKind::If),
    ("THEN", TokenKind::Then),
    ("ELSE", TokenKind::Else),
    ("GOTO", TokenKind::Goto),
    ("GOSUB", TokenKind::Gosub),
    ("RETURN", TokenKind::Return),
    ("FOR", TokenKind::For),
    ("TO", TokenKind::To),
    ("STEP", TokenKind::Step),
    ("NEXT", TokenKind::Next),
    ("REM", TokenKind::Rem),
    ("END", TokenKind::End),
    ("STOP", TokenKind::Stop),
    ("RANDOM", TokenKind::Random),
    ("FGCOLOR", TokenKind::SetForegroundColor),
    ("BGCOLOR", TokenKind::SetBackgroundColor),
];

/// Look up the keyword kind for a word, if it is one
pub fn keyword_kind(word: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(spelling, _)| spelling.eq_ignore_ascii_case(word))
        .map(|&(_, kind)| kind)
}

/// Tokenize a complete program
///
/// Fails on the first lexical error; no partial token list is returned.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let normalized = source.replace("\r\n", "\n");
    Lexer::new(&normalized).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        loop {
            self.skip_whitespace();
            let Some(current) = self.peek(0) else {
                break;
            };

            if current == '\n' {
                self.push(TokenKind::EndOfLine, "\n", self.line, self.column);
                self.advance();
                self.line += 1;
                self.column = 1;
            } else if current.is_alphabetic() {
                self.read_word();
            } else if current.is_ascii_digit() {
                self.read_number()?;
            } else if current == '"' {
                self.read_string()?;
            } else {
                self.read_symbol(current)?;
            }
        }

        self.push(TokenKind::EndOfFile, "", self.line, self.column);
        Ok(self.tokens)
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
        self.column += 1;
    }

    fn push(&mut self, kind: TokenKind, lexeme: impl Into<String>, line: usize, column: usize) {
        self.tokens.push(Token::new(kind, lexeme, line, column));
    }

    fn error(&self, reason: LexErrorReason, line: usize, column: usize) -> LexError {
        LexError {
            line,
            column,
            reason,
        }
    }

    /// Skip horizontal whitespace; newlines are tokens
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek(0) {
            if ch == '\n' || !ch.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    fn slice(&self, start: usize) -> String {
        self.chars[start..self.pos].iter().collect()
    }

    /// Whether an integer numeral here would be a statement label
    fn at_statement_start(&self) -> bool {
        match self.tokens.last() {
            None => true,
            Some(token) => matches!(token.kind, TokenKind::EndOfLine | TokenKind::Colon),
        }
    }

    fn read_word(&mut self) {
        let (start, column) = (self.pos, self.column);
        while let Some(ch) = self.peek(0) {
            if !(ch.is_alphanumeric() || ch == '_') {
                break;
            }
            self.advance();
        }

        let word = self.slice(start);
        let kind = keyword_kind(&word).unwrap_or(TokenKind::Identifier);
        self.push(kind, word, self.line, column);

        if kind == TokenKind::Rem {
            self.read_comment();
        }
    }

    /// Everything after REM up to the newline is one comment token
    fn read_comment(&mut self) {
        self.skip_whitespace();
        let (start, column) = (self.pos, self.column);
        while let Some(ch) = self.peek(0) {
            if ch == '\n' {
                break;
            }
            self.advance();
        }

        let text = self.slice(start);
        let text = text.trim_end();
        if !text.is_empty() {
            self.push(TokenKind::Comment, text, self.line, column);
        }
    }

    fn read_number(&mut self) -> Result<(), LexError> {
        let (start, column) = (self.pos, self.column);
        while let Some(ch) = self.peek(0) {
            if !(ch.is_ascii_digit() || ch == '.') {
                break;
            }
            self.advance();
        }

        let text = self.slice(start);
        let dots = text.matches('.').count();
        if dots > 1 {
            return Err(self.error(LexErrorReason::InvalidNumber(text), self.line, column));
        }

        let kind = if dots == 0 && self.at_statement_start() {
            TokenKind::LineNumber
        } else {
            TokenKind::NumberLiteral
        };
        self.push(kind, text, self.line, column);
        Ok(())
    }

    /// String literals have no escape sequences and may span lines
    fn read_string(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        self.advance(); // opening quote
        let start = self.pos;

        loop {
            match self.peek(0) {
                None => {
                    return Err(self.error(LexErrorReason::UnterminatedString, line, column));
                }
                Some('"') => break,
                Some('\n') => {
                    self.pos += 1;
                    self.line += 1;
                    self.column = 1;
                }
                Some(_) => self.advance(),
            }
        }

        let text = self.slice(start);
        self.advance(); // closing quote
        self.push(TokenKind::StringLiteral, text, line, column);
        Ok(())
    }

    fn read_symbol(&mut self, current: char) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);

        // Two-character operators first
        let pair = match (current, self.peek(1)) {
            ('<', Some('>')) => Some((TokenKind::NotEqual, "<>")),
            ('<', Some('=')) => Some((TokenKind::LessThanOrEqual, "<=")),
            ('>', Some('=')) => Some((TokenKind::GreaterThanOrEqual, ">=")),
            _ => None,
        };
        if let Some((kind, lexeme)) = pair {
            self.advance();
            self.advance();
            self.push(kind, lexeme, line, column);
            return Ok(());
        }

        let kind = match current {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Multiply,
            '/' => TokenKind::Divide,
            '%' => TokenKind::Modulus,
            '^' => TokenKind::Power,
            '=' => TokenKind::Assign,
            '<' => TokenKind::LessThan,
            '>' => TokenKind::GreaterThan,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            other => {
                return Err(self.error(LexErrorReason::UnexpectedCharacter(other), line, column));
            }
        };

        self.advance();
        self.push(kind, current.to_string(), line, column);
        Ok(())
    }
}
