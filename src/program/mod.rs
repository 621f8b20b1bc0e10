//! Program storage for Plasticine BASIC
//!
//! A program is the flat, ordered statement list produced by the parser.
//! Jumps are resolved through an index from line label to statement position.

use crate::parser::Statement;
use std::collections::HashMap;

/// A parsed program
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    statements: Vec<Statement>,
}

impl Program {
    /// Create a program from statements in execution order
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Get the statement at a position
    pub fn get(&self, index: usize) -> Option<&Statement> {
        self.statements.get(index)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Map every line label to the index of its statement
    ///
    /// The parser rejects duplicate labels; for programs built by hand the
    /// first occurrence wins.
    pub fn line_index(&self) -> HashMap<u32, usize> {
        let mut index = HashMap::new();
        for (position, statement) in self.statements.iter().enumerate() {
            if let Some(line) = statement.line {
                index.entry(line).or_insert(position);
            }
        }
        index
    }
}
