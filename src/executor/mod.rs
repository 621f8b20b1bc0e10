//! Execution engine for Plasticine BASIC programs
//!
//! Walks the flat statement list with a program counter. GOTO and GOSUB
//! resolve labels through the program's line index, GOSUB/RETURN use a call
//! stack of statement positions and FOR/NEXT a stack of loop frames.

use crate::console::{Console, RandomSource};
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::parser::{BinaryOperator, Expression, Statement, StatementKind};
use crate::program::Program;
use crate::variables::{ExecutionContext, Value};
use std::collections::HashMap;

/// RANDOM binds an integer in 1..=RANDOM_MAX
pub const RANDOM_MAX: f64 = 100.0;

type ExecResult<T> = Result<T, RuntimeError>;

/// FOR loop bookkeeping
#[derive(Debug, Clone, PartialEq)]
struct LoopFrame {
    variable: String,
    end: f64,
    step: f64,
    /// Position of the FOR statement; the body starts right after it
    for_index: usize,
}

/// Program executor
pub struct Executor<'a> {
    context: ExecutionContext,
    line_index: HashMap<u32, usize>,
    // Positions of the GOSUB statements awaiting RETURN
    return_stack: Vec<usize>,
    for_loops: Vec<LoopFrame>,
    pc: usize,
    // Where the run loop continues after the current statement
    next_pc: usize,
    console: &'a mut dyn Console,
    random: &'a mut dyn RandomSource,
}

impl<'a> Executor<'a> {
    /// Create a new executor bound to its collaborators
    pub fn new(console: &'a mut dyn Console, random: &'a mut dyn RandomSource) -> Self {
        Self {
            context: ExecutionContext::new(),
            line_index: HashMap::new(),
            return_stack: Vec::new(),
            for_loops: Vec::new(),
            pc: 0,
            next_pc: 0,
            console,
            random,
        }
    }

    /// Run a program until END, the last statement, or the first error
    ///
    /// Output and variable changes made before an error are kept.
    pub fn execute(&mut self, program: &Program) -> ExecResult<()> {
        self.context = ExecutionContext::new();
        self.return_stack.clear();
        self.for_loops.clear();
        self.line_index = program.line_index();
        self.pc = 0;

        while self.context.is_running() {
            let Some(statement) = program.get(self.pc) else {
                break;
            };
            self.execute_statement(statement)
                .map_err(|e| e.at_line(statement.line))?;
            self.pc = self.next_pc;
        }

        Ok(())
    }

    /// Execute one statement at the current program counter
    pub fn execute_statement(&mut self, statement: &Statement) -> ExecResult<()> {
        self.next_pc = self.pc + 1;
        self.dispatch(statement)
    }

    fn dispatch(&mut self, statement: &Statement) -> ExecResult<()> {
        match &statement.kind {
            StatementKind::Let {
                variable,
                expression,
            } => {
                let value = self.evaluate(expression)?;
                self.context.set(variable.clone(), value);
                Ok(())
            }
            StatementKind::Print { values } => self.execute_print(values),
            StatementKind::PrintLine { values } => {
                self.execute_print(values)?;
                self.console.write_line("")?;
                Ok(())
            }
            StatementKind::Input { variables } => self.execute_input(variables),
            StatementKind::If {
                condition,
                then_branch,
            } => {
                let value = self.evaluate(condition)?;
                if is_truthy(&value)? {
                    // Runs in place: the branch sees the IF's program counter
                    self.dispatch(then_branch)?;
                }
                Ok(())
            }
            StatementKind::Goto { target } => {
                self.next_pc = self.resolve_line(*target)?;
                Ok(())
            }
            StatementKind::Gosub { target } => {
                let index = self.resolve_line(*target)?;
                self.return_stack.push(self.pc);
                self.next_pc = index;
                Ok(())
            }
            StatementKind::Return => {
                let gosub_index = self
                    .return_stack
                    .pop()
                    .ok_or_else(|| RuntimeError::new(RuntimeErrorKind::ReturnWithoutGosub))?;
                self.next_pc = gosub_index + 1;
                Ok(())
            }
            StatementKind::For {
                variable,
                start,
                end,
                step,
            } => self.execute_for(variable, start, end, step.as_ref()),
            StatementKind::Next { variable } => self.execute_next(variable),
            StatementKind::End => {
                self.context.halt();
                Ok(())
            }
            StatementKind::Comment { .. } => Ok(()),
            StatementKind::Random { variable } => {
                let draw = self.random.next_uniform();
                let value = (draw * RANDOM_MAX).floor() + 1.0;
                self.context.set(variable.clone(), Value::Number(value));
                Ok(())
            }
            StatementKind::SetForegroundColor { color } => {
                let color = color.ok_or_else(|| RuntimeError::new(RuntimeErrorKind::MissingColor))?;
                self.console.set_foreground_color(color)?;
                Ok(())
            }
            StatementKind::SetBackgroundColor { color } => {
                let color = color.ok_or_else(|| RuntimeError::new(RuntimeErrorKind::MissingColor))?;
                self.console.set_background_color(color)?;
                Ok(())
            }
        }
    }

    /// Write each value in order, with no separator
    fn execute_print(&mut self, values: &[Expression]) -> ExecResult<()> {
        for expression in values {
            let value = self.evaluate(expression)?;
            self.console.write(&value.to_string())?;
        }
        Ok(())
    }

    /// Prompt for and read one line per variable
    fn execute_input(&mut self, variables: &[String]) -> ExecResult<()> {
        for variable in variables {
            self.console
                .write(&format!("Enter value for {}: ", variable))?;
            let line = self
                .console
                .read_line()?
                .ok_or_else(|| RuntimeError::new(RuntimeErrorKind::EndOfInput))?;
            let line = line.trim_end_matches(&['\r', '\n'][..]);
            self.context.set(variable.clone(), Value::from_input(line));
        }
        Ok(())
    }

    fn execute_for(
        &mut self,
        variable: &str,
        start: &Expression,
        end: &Expression,
        step: Option<&Expression>,
    ) -> ExecResult<()> {
        let start = self.evaluate_number(start, "FOR start value")?;
        let end = self.evaluate_number(end, "FOR end value")?;
        let step = match step {
            Some(expr) => self.evaluate_number(expr, "STEP value")?,
            None => 1.0,
        };

        self.context.set(variable, Value::Number(start));

        // Re-entering a running loop drops it together with any inner loops
        if let Some(position) = self.for_loops.iter().rposition(|f| f.variable == variable) {
            self.for_loops.truncate(position);
        }
        self.for_loops.push(LoopFrame {
            variable: variable.to_string(),
            end,
            step,
            for_index: self.pc,
        });
        Ok(())
    }

    fn execute_next(&mut self, variable: &str) -> ExecResult<()> {
        let frame = self.for_loops.last().ok_or_else(|| {
            RuntimeError::new(RuntimeErrorKind::NextWithoutFor(variable.to_string()))
        })?;
        if frame.variable != variable {
            return Err(RuntimeError::new(RuntimeErrorKind::MismatchedNext {
                active: frame.variable.clone(),
                found: variable.to_string(),
            }));
        }
        let (end, step, for_index) = (frame.end, frame.step, frame.for_index);

        let current = match self.context.get(variable) {
            Some(Value::Number(n)) => *n,
            Some(other) => {
                return Err(RuntimeError::type_mismatch(format!(
                    "Loop variable '{}' holds {}, not a number",
                    variable,
                    other.kind_name()
                )));
            }
            None => {
                return Err(RuntimeError::new(RuntimeErrorKind::UndefinedVariable(
                    variable.to_string(),
                )));
            }
        };

        let value = current + step;
        self.context.set(variable, Value::Number(value));

        let continues = (step > 0.0 && value <= end) || (step < 0.0 && value >= end);
        if continues {
            self.next_pc = for_index + 1;
        } else {
            self.for_loops.pop();
        }
        Ok(())
    }

    fn resolve_line(&self, target: u32) -> ExecResult<usize> {
        self.line_index
            .get(&target)
            .copied()
            .ok_or_else(|| RuntimeError::new(RuntimeErrorKind::UndefinedLine(target)))
    }

    /// Evaluate an expression
    pub fn evaluate(&self, expression: &Expression) -> ExecResult<Value> {
        match expression {
            Expression::Number(n) => Ok(Value::Number(*n)),
            Expression::String(s) => Ok(Value::Text(s.clone())),
            Expression::Variable(name) => self.context.get(name).cloned().ok_or_else(|| {
                RuntimeError::new(RuntimeErrorKind::UndefinedVariable(name.clone()))
            }),
            Expression::Negate(operand) => match self.evaluate(operand)? {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(RuntimeError::type_mismatch(format!(
                    "Cannot negate {}",
                    other.kind_name()
                ))),
            },
            Expression::BinaryOp { left, op, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                apply_binary(*op, &left, &right)
            }
        }
    }

    fn evaluate_number(&self, expression: &Expression, what: &str) -> ExecResult<f64> {
        match self.evaluate(expression)? {
            Value::Number(n) => Ok(n),
            other => Err(RuntimeError::type_mismatch(format!(
                "{} must be a number, found {}",
                what,
                other.kind_name()
            ))),
        }
    }

    /// Get a variable's current value
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.context.get(name)
    }

    /// Consume the executor, keeping the final variable state
    pub fn into_context(self) -> ExecutionContext {
        self.context
    }

    /// Number of active FOR loops
    pub fn loop_depth(&self) -> usize {
        self.for_loops.len()
    }

    /// Number of pending GOSUB returns
    pub fn call_depth(&self) -> usize {
        self.return_stack.len()
    }
}

/// IF conditions accept comparison results and numbers (nonzero is true)
fn is_truthy(value: &Value) -> ExecResult<bool> {
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::Number(n) => Ok(*n != 0.0),
        Value::Text(_) => Err(RuntimeError::type_mismatch(
            "IF condition must be a number or comparison, found text",
        )),
    }
}

fn operand_mismatch(op: BinaryOperator, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::type_mismatch(format!(
        "Operator '{}' cannot be applied to {} and {}",
        op.symbol(),
        left.kind_name(),
        right.kind_name()
    ))
}

/// Apply a binary operator to two evaluated operands
fn apply_binary(op: BinaryOperator, left: &Value, right: &Value) -> ExecResult<Value> {
    use BinaryOperator::*;

    match op {
        // Text on either side turns + into concatenation
        Add => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Text(_), _) | (_, Value::Text(_)) => {
                Ok(Value::Text(format!("{}{}", left, right)))
            }
            _ => Err(operand_mismatch(op, left, right)),
        },
        Equal => Ok(Value::Boolean(left == right)),
        NotEqual => Ok(Value::Boolean(left != right)),
        Subtract => arithmetic(op, left, right, |a, b| a - b),
        Multiply => arithmetic(op, left, right, |a, b| a * b),
        // Division by zero yields infinity or NaN
        Divide => arithmetic(op, left, right, |a, b| a / b),
        Modulo => arithmetic(op, left, right, |a, b| a % b),
        Power => arithmetic(op, left, right, f64::powf),
        LessThan => comparison(op, left, right, |a, b| a < b),
        LessThanOrEqual => comparison(op, left, right, |a, b| a <= b),
        GreaterThan => comparison(op, left, right, |a, b| a > b),
        GreaterThanOrEqual => comparison(op, left, right, |a, b| a >= b),
    }
}

fn numeric_operands(op: BinaryOperator, left: &Value, right: &Value) -> ExecResult<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(operand_mismatch(op, left, right)),
    }
}

fn arithmetic(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
    apply: impl FnOnce(f64, f64) -> f64,
) -> ExecResult<Value> {
    let (a, b) = numeric_operands(op, left, right)?;
    Ok(Value::Number(apply(a, b)))
}

fn comparison(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
    apply: impl FnOnce(f64, f64) -> bool,
) -> ExecResult<Value> {
    let (a, b) = numeric_operands(op, left, right)?;
    Ok(Value::Boolean(apply(a, b)))
}
