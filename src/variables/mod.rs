//! Variable storage for Plasticine BASIC
//!
//! Variables are untyped: any name can hold a number, a piece of text or a
//! comparison result, and assigning replaces whatever was there.

use std::collections::HashMap;
use std::fmt;

/// A runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    /// Result of a comparison
    Boolean(bool),
}

impl Value {
    /// Name of the value's kind, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
        }
    }

    /// Get the numeric value, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the text, if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret a line typed at an INPUT prompt
    ///
    /// Anything that reads as a finite number is stored numeric, everything
    /// else is kept verbatim as text.
    pub fn from_input(line: &str) -> Self {
        match line.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => Value::Text(line.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Boolean(true) => write!(f, "True"),
            Value::Boolean(false) => write!(f, "False"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

/// Variable bindings and run state for one execution
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    variables: HashMap<String, Value>,
    running: bool,
}

impl ExecutionContext {
    /// Create an empty, running context
    pub fn new() -> Self {
        Self {
            variables: HashMap::new(),
            running: true,
        }
    }

    /// Bind a variable, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Get a variable
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Check if a variable exists
    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Number of bound variables
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Clear the running flag (END)
    pub fn halt(&mut self) {
        self.running = false;
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
