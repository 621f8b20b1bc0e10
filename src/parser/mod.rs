//! Parser for Plasticine BASIC statements and expressions
//!
//! Turns the token list into a flat `Program`. Statements are dispatched on
//! their leading keyword; expressions use precedence climbing.

use crate::console::TerminalColor;
use crate::error::ParseError;
use crate::program::Program;
use crate::tokenizer::{Token, TokenKind};
use std::collections::HashSet;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl BinaryOperator {
    /// Canonical source spelling
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Power => "^",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
        }
    }

    /// Binding strength, higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Power => 4,
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo => 3,
            BinaryOperator::Add | BinaryOperator::Subtract => 2,
            _ => 1,
        }
    }

    /// Map an operator token to its operator; `=` is always equality here
    fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Plus => Some(BinaryOperator::Add),
            TokenKind::Minus => Some(BinaryOperator::Subtract),
            TokenKind::Multiply => Some(BinaryOperator::Multiply),
            TokenKind::Divide => Some(BinaryOperator::Divide),
            TokenKind::Modulus => Some(BinaryOperator::Modulo),
            TokenKind::Power => Some(BinaryOperator::Power),
            TokenKind::Assign => Some(BinaryOperator::Equal),
            TokenKind::NotEqual => Some(BinaryOperator::NotEqual),
            TokenKind::LessThan => Some(BinaryOperator::LessThan),
            TokenKind::LessThanOrEqual => Some(BinaryOperator::LessThanOrEqual),
            TokenKind::GreaterThan => Some(BinaryOperator::GreaterThan),
            TokenKind::GreaterThanOrEqual => Some(BinaryOperator::GreaterThanOrEqual),
            _ => None,
        }
    }
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Variable reference
    Variable(String),
    /// Binary operation
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    /// Unary minus
    ///
    /// Applies to the primary right after the sign, so it binds tighter than
    /// every binary operator: `-2 ^ 2` is `(-2) ^ 2`.
    Negate(Box<Expression>),
}

impl Expression {
    pub fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Self {
        Expression::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }
}

/// Statement variants
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// LET name = expr
    Let { variable: String, expression: Expression },
    /// PRINT a, b, ... (no line terminator)
    Print { values: Vec<Expression> },
    /// PRINTLINE a, b, ... (line terminator after the values)
    PrintLine { values: Vec<Expression> },
    /// INPUT a, b, ...
    Input { variables: Vec<String> },
    /// IF condition THEN statement [ELSE statement]
    ///
    /// When ELSE is present its statement replaces the THEN statement, so
    /// `then_branch` holds the ELSE statement and runs only when the
    /// condition is true.
    If {
        condition: Expression,
        then_branch: Box<Statement>,
    },
    Goto { target: u32 },
    Gosub { target: u32 },
    Return,
    For {
        variable: String,
        start: Expression,
        end: Expression,
        step: Option<Expression>,
    },
    Next { variable: String },
    /// END and STOP
    End,
    /// REM
    Comment { text: String },
    /// RANDOM name
    Random { variable: String },
    SetForegroundColor { color: Option<TerminalColor> },
    SetBackgroundColor { color: Option<TerminalColor> },
}

/// A statement with its optional line label
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub line: Option<u32>,
    pub kind: StatementKind,
}

impl Statement {
    /// Create an unlabelled statement
    pub fn new(kind: StatementKind) -> Self {
        Self { line: None, kind }
    }

    /// Create a labelled statement
    pub fn labelled(line: u32, kind: StatementKind) -> Self {
        Self {
            line: Some(line),
            kind,
        }
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Deepest nesting accepted in expressions and IF branches
const MAX_DEPTH: usize = 256;

/// Parse a complete token list into a program
///
/// Stops at the first malformed construct. Duplicate line labels are
/// rejected at the second occurrence.
pub fn parse(tokens: &[Token]) -> ParseResult<Program> {
    let mut parser = Parser::new(tokens);
    let mut statements = Vec::new();
    let mut labels = HashSet::new();

    loop {
        parser.skip_end_of_line();
        if parser.at_end() {
            break;
        }

        let label_token = parser.peek().clone();
        let statement = parser.parse_statement()?;

        if let Some(line) = statement.line {
            if !labels.insert(line) {
                return Err(parser.error_at(&label_token, "a unique line number"));
            }
        }

        match parser.peek().kind {
            TokenKind::EndOfLine | TokenKind::EndOfFile => {}
            _ => return Err(parser.error("end of line")),
        }
        statements.push(statement);
    }

    Ok(Program::new(statements))
}

/// Parse a standalone expression, requiring all tokens to be consumed
pub fn parse_expression(tokens: &[Token]) -> ParseResult<Expression> {
    let mut parser = Parser::new(tokens);
    let expression = parser.parse_expression()?;
    match parser.peek().kind {
        TokenKind::EndOfLine | TokenKind::EndOfFile => Ok(expression),
        _ => Err(parser.error("end of expression")),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    eof: Token,
    // Current nesting of parentheses, signs and IF branches
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        let (line, column) = tokens.last().map_or((1, 1), |t| (t.line, t.column));
        Self {
            tokens,
            pos: 0,
            eof: Token::new(TokenKind::EndOfFile, "", line, column),
            depth: 0,
        }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::EndOfFile
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_end_of_line(&mut self) {
        while self.check(TokenKind::EndOfLine) {
            self.advance();
        }
    }

    fn error_at(&self, token: &Token, expected: &str) -> ParseError {
        let found = match token.kind {
            TokenKind::EndOfFile => "end of file".to_string(),
            TokenKind::EndOfLine => "end of line".to_string(),
            _ => token.lexeme.clone(),
        };
        ParseError {
            line: token.line,
            column: token.column,
            expected: expected.to_string(),
            found,
        }
    }

    fn error(&self, expected: &str) -> ParseError {
        self.error_at(self.peek(), expected)
    }

    fn enter(&mut self) -> ParseResult<()> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("a shallower expression"));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(expected))
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> ParseResult<String> {
        Ok(self.expect(TokenKind::Identifier, expected)?.lexeme)
    }

    /// Whether the current token closes a statement's argument list
    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::EndOfLine | TokenKind::EndOfFile | TokenKind::Else
        )
    }

    /// Consume a leading line label, if there is one
    fn parse_label(&mut self) -> ParseResult<Option<u32>> {
        let token = self.peek();
        let is_label = match token.kind {
            TokenKind::LineNumber => true,
            TokenKind::NumberLiteral => !token.lexeme.contains('.'),
            _ => false,
        };
        if !is_label {
            return Ok(None);
        }

        let line = token
            .lexeme
            .parse::<u32>()
            .map_err(|_| self.error("a line number"))?;
        self.advance();
        Ok(Some(line))
    }

    /// Parse a line-number operand of GOTO or GOSUB
    fn parse_target(&mut self, keyword: &str) -> ParseResult<u32> {
        let token = self.peek();
        let expected = format!("line number after {}", keyword);
        let valid = matches!(token.kind, TokenKind::NumberLiteral | TokenKind::LineNumber)
            && !token.lexeme.contains('.');
        if !valid {
            return Err(self.error(&expected));
        }

        let target = token
            .lexeme
            .parse::<u32>()
            .map_err(|_| self.error(&expected))?;
        self.advance();
        Ok(target)
    }

    /// Parse one statement, including its optional label
    fn parse_statement(&mut self) -> ParseResult<Statement> {
        let line = self.parse_label()?;
        let kind = self.parse_statement_kind()?;
        Ok(Statement { line, kind })
    }

    /// Parse a statement body, starting at its keyword
    fn parse_statement_kind(&mut self) -> ParseResult<StatementKind> {
        let keyword = self.advance();

        let kind = match keyword.kind {
            TokenKind::Let => self.parse_let()?,
            TokenKind::Print => StatementKind::Print {
                values: self.parse_print_values()?,
            },
            TokenKind::PrintLine => StatementKind::PrintLine {
                values: self.parse_print_values()?,
            },
            TokenKind::Input => self.parse_input()?,
            TokenKind::If => self.parse_if()?,
            TokenKind::Goto => StatementKind::Goto {
                target: self.parse_target("GOTO")?,
            },
            TokenKind::Gosub => StatementKind::Gosub {
                target: self.parse_target("GOSUB")?,
            },
            TokenKind::Return => StatementKind::Return,
            TokenKind::For => self.parse_for()?,
            TokenKind::Next => StatementKind::Next {
                variable: self.expect_identifier("variable name after NEXT")?,
            },
            TokenKind::End | TokenKind::Stop => StatementKind::End,
            TokenKind::Rem => {
                let text = if self.check(TokenKind::Comment) {
                    self.advance().lexeme
                } else {
                    String::new()
                };
                StatementKind::Comment { text }
            }
            TokenKind::Random => StatementKind::Random {
                variable: self.expect_identifier("variable name after RANDOM")?,
            },
            TokenKind::SetForegroundColor => StatementKind::SetForegroundColor {
                color: Some(self.parse_color("FGCOLOR")?),
            },
            TokenKind::SetBackgroundColor => StatementKind::SetBackgroundColor {
                color: Some(self.parse_color("BGCOLOR")?),
            },
            _ => return Err(self.error_at(&keyword, "a statement")),
        };

        Ok(kind)
    }

    /// Parse LET statement (after the keyword)
    fn parse_let(&mut self) -> ParseResult<StatementKind> {
        let variable = self.expect_identifier("variable name after LET")?;
        self.expect(TokenKind::Assign, "'=' after variable name")?;
        let expression = self.parse_expression()?;
        Ok(StatementKind::Let {
            variable,
            expression,
        })
    }

    /// Parse the comma-separated value list of PRINT and PRINTLINE
    fn parse_print_values(&mut self) -> ParseResult<Vec<Expression>> {
        let mut values = Vec::new();
        if self.at_statement_end() {
            return Ok(values);
        }

        loop {
            values.push(self.parse_expression()?);
            if !self.matches(TokenKind::Comma) {
                break;
            }
        }
        Ok(values)
    }

    /// Parse INPUT statement
    fn parse_input(&mut self) -> ParseResult<StatementKind> {
        let mut variables = vec![self.expect_identifier("variable name after INPUT")?];
        while self.matches(TokenKind::Comma) {
            variables.push(self.expect_identifier("variable name after ','")?);
        }
        Ok(StatementKind::Input { variables })
    }

    /// Parse IF statement
    fn parse_if(&mut self) -> ParseResult<StatementKind> {
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Then, "THEN after IF condition")?;
        // Branches carry no label of their own
        self.enter()?;
        let mut then_branch = self.parse_statement_kind()?;

        // ELSE takes the place of the THEN branch
        if self.matches(TokenKind::Else) {
            then_branch = self.parse_statement_kind()?;
        }
        self.leave();

        Ok(StatementKind::If {
            condition,
            then_branch: Box::new(Statement::new(then_branch)),
        })
    }

    /// Parse FOR statement
    fn parse_for(&mut self) -> ParseResult<StatementKind> {
        let variable = self.expect_identifier("variable name after FOR")?;
        self.expect(TokenKind::Assign, "'=' after variable name")?;
        let start = self.parse_expression()?;
        self.expect(TokenKind::To, "TO after start expression")?;
        let end = self.parse_expression()?;
        let step = if self.matches(TokenKind::Step) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        Ok(StatementKind::For {
            variable,
            start,
            end,
            step,
        })
    }

    /// Parse the color name of FGCOLOR / BGCOLOR
    fn parse_color(&mut self, keyword: &str) -> ParseResult<TerminalColor> {
        let expected = format!("color name after {}", keyword);
        if !self.check(TokenKind::Identifier) {
            return Err(self.error(&expected));
        }
        let color = TerminalColor::from_name(&self.peek().lexeme)
            .ok_or_else(|| self.error("a known color name"))?;
        self.advance();
        Ok(color)
    }

    /// Parse a full expression
    fn parse_expression(&mut self) -> ParseResult<Expression> {
        let (expression, _) = self.parse_expr_precedence(0)?;
        Ok(expression)
    }

    /// Parse expression with precedence climbing algorithm
    ///
    /// Returns the expression with the depth of its tree.
    fn parse_expr_precedence(&mut self, min_prec: u8) -> ParseResult<(Expression, usize)> {
        let (mut left, mut depth) = self.parse_primary()?;

        while let Some(op) = BinaryOperator::from_token(self.peek().kind) {
            let prec = op.precedence();
            if prec <= min_prec {
                break;
            }
            let operator = self.advance();

            // Operators of equal precedence associate to the left
            let (right, right_depth) = self.parse_expr_precedence(prec)?;
            depth = depth.max(right_depth) + 1;
            if depth > MAX_DEPTH {
                return Err(self.error_at(&operator, "a shallower expression"));
            }
            left = Expression::binary(left, op, right);
        }

        Ok((left, depth))
    }

    /// Parse a primary expression (literal, variable, unary or parenthesized)
    fn parse_primary(&mut self) -> ParseResult<(Expression, usize)> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::NumberLiteral | TokenKind::LineNumber => {
                let value = token
                    .lexeme
                    .parse::<f64>()
                    .map_err(|_| self.error("a number"))?;
                self.advance();
                Ok((Expression::Number(value), 1))
            }
            TokenKind::StringLiteral => {
                self.advance();
                Ok((Expression::String(token.lexeme), 1))
            }
            TokenKind::Identifier => {
                self.advance();
                Ok((Expression::Variable(token.lexeme), 1))
            }
            TokenKind::Minus => {
                self.advance();
                self.enter()?;
                let (operand, depth) = self.parse_primary()?;
                self.leave();
                Ok((Expression::Negate(Box::new(operand)), depth + 1))
            }
            TokenKind::Plus => {
                self.advance();
                self.enter()?;
                let operand = self.parse_primary()?;
                self.leave();
                Ok(operand)
            }
            TokenKind::LeftParen => {
                self.advance();
                self.enter()?;
                let inner = self.parse_expr_precedence(0)?;
                self.expect(TokenKind::RightParen, "')' after expression")?;
                self.leave();
                Ok(inner)
            }
            _ => Err(self.error("an expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn parse_source(source: &str) -> ParseResult<Program> {
        parse(&tokenize(source).unwrap())
    }

    fn single(source: &str) -> Statement {
        let program = parse_source(source).unwrap();
        assert_eq!(program.len(), 1);
        program.statements()[0].clone()
    }

    fn expr(source: &str) -> Expression {
        parse_expression(&tokenize(source).unwrap()).unwrap()
    }

    fn num(n: f64) -> Expression {
        Expression::Number(n)
    }

    fn var(name: &str) -> Expression {
        Expression::Variable(name.to_string())
    }

    #[test]
    fn test_parse_labelled_let() {
        let stmt = single("10 LET x = 1 + 1");
        assert_eq!(stmt.line, Some(10));
        assert_eq!(
            stmt.kind,
            StatementKind::Let {
                variable: "x".to_string(),
                expression: Expression::binary(num(1.0), BinaryOperator::Add, num(1.0)),
            }
        );
    }

    #[test]
    fn test_parse_unlabelled_statement() {
        let stmt = single("END");
        assert_eq!(stmt, Statement::new(StatementKind::End));
    }

    #[test]
    fn test_blank_lines_produce_no_statements() {
        let program = parse_source("\n\n10 END\n\n\n20 END\n").unwrap();
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn test_empty_source() {
        assert!(parse_source("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_operator_precedence() {
        // 2 + 3 * 4 = 2 + (3 * 4)
        assert_eq!(
            expr("2 + 3 * 4"),
            Expression::binary(
                num(2.0),
                BinaryOperator::Add,
                Expression::binary(num(3.0), BinaryOperator::Multiply, num(4.0)),
            )
        );
    }

    #[test]
    fn test_parse_left_associativity() {
        // 8 - 2 - 1 = (8 - 2) - 1
        assert_eq!(
            expr("8 - 2 - 1"),
            Expression::binary(
                Expression::binary(num(8.0), BinaryOperator::Subtract, num(2.0)),
                BinaryOperator::Subtract,
                num(1.0),
            )
        );
        // 2 ^ 3 ^ 2 = (2 ^ 3) ^ 2
        assert_eq!(
            expr("2 ^ 3 ^ 2"),
            Expression::binary(
                Expression::binary(num(2.0), BinaryOperator::Power, num(3.0)),
                BinaryOperator::Power,
                num(2.0),
            )
        );
    }

    #[test]
    fn test_power_binds_tighter_than_multiply() {
        assert_eq!(
            expr("2 * 3 ^ 2"),
            Expression::binary(
                num(2.0),
                BinaryOperator::Multiply,
                Expression::binary(num(3.0), BinaryOperator::Power, num(2.0)),
            )
        );
    }

    #[test]
    fn test_comparison_binds_loosest() {
        assert_eq!(
            expr("a + 1 < b % 2"),
            Expression::binary(
                Expression::binary(var("a"), BinaryOperator::Add, num(1.0)),
                BinaryOperator::LessThan,
                Expression::binary(var("b"), BinaryOperator::Modulo, num(2.0)),
            )
        );
    }

    #[test]
    fn test_assign_token_becomes_equality() {
        let e = expr("x = 3");
        assert_eq!(e, Expression::binary(var("x"), BinaryOperator::Equal, num(3.0)));
        if let Expression::BinaryOp { op, .. } = e {
            assert_eq!(op.symbol(), "=");
        }
    }

    #[test]
    fn test_parse_parenthesized_expression() {
        assert_eq!(
            expr("(2 + 3) * 4"),
            Expression::binary(
                Expression::binary(num(2.0), BinaryOperator::Add, num(3.0)),
                BinaryOperator::Multiply,
                num(4.0),
            )
        );
    }

    #[test]
    fn test_parse_unary_minus() {
        assert_eq!(expr("-5"), Expression::Negate(Box::new(num(5.0))));
        assert_eq!(expr("+5"), num(5.0));
    }

    #[test]
    fn test_missing_close_paren() {
        let err = parse_expression(&tokenize("(1 + 2").unwrap()).unwrap_err();
        assert_eq!(err.expected, "')' after expression");
        assert_eq!(err.found, "end of file");
    }

    #[test]
    fn test_parse_print_and_printline() {
        let stmt = single("PRINT \"a\", x, 1");
        assert_eq!(
            stmt.kind,
            StatementKind::Print {
                values: vec![Expression::String("a".to_string()), var("x"), num(1.0)],
            }
        );

        let stmt = single("PRINTLINE");
        assert_eq!(stmt.kind, StatementKind::PrintLine { values: vec![] });
    }

    #[test]
    fn test_parse_input() {
        let stmt = single("INPUT a, b");
        assert_eq!(
            stmt.kind,
            StatementKind::Input {
                variables: vec!["a".to_string(), "b".to_string()],
            }
        );
    }

    #[test]
    fn test_input_requires_variable() {
        let err = parse_source("INPUT").unwrap_err();
        assert_eq!(err.expected, "variable name after INPUT");
    }

    #[test]
    fn test_parse_goto_and_gosub() {
        assert_eq!(single("GOTO 100").kind, StatementKind::Goto { target: 100 });
        assert_eq!(single("GOSUB 200").kind, StatementKind::Gosub { target: 200 });
        assert_eq!(single("RETURN").kind, StatementKind::Return);
    }

    #[test]
    fn test_goto_requires_integer() {
        let err = parse_source("GOTO 1.5").unwrap_err();
        assert_eq!(err.expected, "line number after GOTO");
        assert_eq!(err.found, "1.5");
    }

    #[test]
    fn test_parse_for_loop() {
        let stmt = single("30 FOR i = 1 TO 10");
        assert_eq!(stmt.line, Some(30));
        assert_eq!(
            stmt.kind,
            StatementKind::For {
                variable: "i".to_string(),
                start: num(1.0),
                end: num(10.0),
                step: None,
            }
        );
    }

    #[test]
    fn test_parse_for_loop_with_step() {
        let stmt = single("FOR i = 3 TO 1 STEP -1");
        assert_eq!(
            stmt.kind,
            StatementKind::For {
                variable: "i".to_string(),
                start: num(3.0),
                end: num(1.0),
                step: Some(Expression::Negate(Box::new(num(1.0)))),
            }
        );
    }

    #[test]
    fn test_parse_next() {
        let stmt = single("40 NEXT i");
        assert_eq!(stmt.line, Some(40));
        assert_eq!(stmt.kind, StatementKind::Next { variable: "i".to_string() });
    }

    #[test]
    fn test_parse_if_then() {
        let stmt = single("IF x > 1 THEN GOTO 50");
        assert_eq!(
            stmt.kind,
            StatementKind::If {
                condition: Expression::binary(var("x"), BinaryOperator::GreaterThan, num(1.0)),
                then_branch: Box::new(Statement::new(StatementKind::Goto { target: 50 })),
            }
        );
    }

    #[test]
    fn test_else_branch_replaces_then_branch() {
        let stmt = single("IF x THEN PRINT \"yes\" ELSE PRINT \"no\"");
        match stmt.kind {
            StatementKind::If { then_branch, .. } => assert_eq!(
                then_branch.kind,
                StatementKind::Print {
                    values: vec![Expression::String("no".to_string())],
                }
            ),
            other => panic!("expected IF, got {:?}", other),
        }
    }

    #[test]
    fn test_if_requires_then() {
        let err = parse_source("IF x PRINT 1").unwrap_err();
        assert_eq!(err.expected, "THEN after IF condition");
        assert_eq!(err.found, "PRINT");
    }

    #[test]
    fn test_parse_comment() {
        assert_eq!(
            single("REM hello: world").kind,
            StatementKind::Comment { text: "hello: world".to_string() }
        );
        assert_eq!(single("REM").kind, StatementKind::Comment { text: String::new() });
    }

    #[test]
    fn test_parse_random() {
        assert_eq!(
            single("RANDOM r").kind,
            StatementKind::Random { variable: "r".to_string() }
        );
    }

    #[test]
    fn test_parse_colors() {
        assert_eq!(
            single("FGCOLOR DarkRed").kind,
            StatementKind::SetForegroundColor { color: Some(TerminalColor::DarkRed) }
        );
        assert_eq!(
            single("BGCOLOR lightgray").kind,
            StatementKind::SetBackgroundColor { color: Some(TerminalColor::Gray) }
        );
    }

    #[test]
    fn test_unknown_color_is_rejected() {
        let err = parse_source("FGCOLOR chartreuse").unwrap_err();
        assert_eq!(err.expected, "a known color name");
        assert_eq!(err.found, "chartreuse");
    }

    #[test]
    fn test_stop_parses_as_end() {
        assert_eq!(single("STOP").kind, StatementKind::End);
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let err = parse_source("10 PRINT 1\n10 PRINT 2").unwrap_err();
        assert_eq!(err.expected, "a unique line number");
        assert_eq!((err.line, err.column), (2, 1));
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse_source("PRINT 1 2").unwrap_err();
        assert_eq!(err.expected, "end of line");
        assert_eq!(err.found, "2");
    }

    #[test]
    fn test_colon_is_not_a_separator() {
        let err = parse_source("PRINT 1 : PRINT 2").unwrap_err();
        assert_eq!(err.found, ":");
    }

    #[test]
    fn test_unknown_statement() {
        let err = parse_source("10 x = 1").unwrap_err();
        assert_eq!(err.expected, "a statement");
        assert_eq!(err.found, "x");
        assert_eq!((err.line, err.column), (1, 4));
    }

    #[test]
    fn test_label_out_of_range() {
        let err = parse_source("99999999999 PRINT 1").unwrap_err();
        assert_eq!(err.expected, "a line number");
        assert_eq!(err.found, "99999999999");
        assert_eq!((err.line, err.column), (1, 1));
    }

    #[test]
    fn test_if_branch_takes_no_label() {
        let err = parse_source("20 IF 1 THEN 10 PRINT 2").unwrap_err();
        assert_eq!(err.expected, "a statement");
        assert_eq!(err.found, "10");

        let err = parse_source("IF 1 THEN PRINT 1 ELSE 30 PRINT 2").unwrap_err();
        assert_eq!(err.found, "30");
    }

    #[test]
    fn test_negate_binds_tighter_than_power() {
        assert_eq!(
            expr("-2 ^ 2"),
            Expression::binary(
                Expression::Negate(Box::new(num(2.0))),
                BinaryOperator::Power,
                num(2.0)
            )
        );
    }

    #[test]
    fn test_moderate_nesting_accepted() {
        let source = format!("PRINT {}1{}", "(".repeat(100), ")".repeat(100));
        let stmt = single(&source);
        assert_eq!(
            stmt.kind,
            StatementKind::Print {
                values: vec![num(1.0)]
            }
        );
    }

    #[test]
    fn test_deep_parentheses_rejected() {
        let source = format!("PRINT {}1{}", "(".repeat(10_000), ")".repeat(10_000));
        let err = parse_source(&source).unwrap_err();
        assert_eq!(err.expected, "a shallower expression");
        assert_eq!(err.found, "(");
    }

    #[test]
    fn test_deep_sign_chain_rejected() {
        let source = format!("PRINT {}1", "-".repeat(10_000));
        let err = parse_source(&source).unwrap_err();
        assert_eq!(err.expected, "a shallower expression");
    }

    #[test]
    fn test_long_operator_chain_rejected() {
        let source = format!("LET x = 1{}", " + 1".repeat(10_000));
        let err = parse_source(&source).unwrap_err();
        assert_eq!(err.expected, "a shallower expression");
        assert_eq!(err.found, "+");
    }

    #[test]
    fn test_deep_if_nesting_rejected() {
        let source = format!("{}PRINT 1", "IF 1 THEN ".repeat(10_000));
        let err = parse_source(&source).unwrap_err();
        assert_eq!(err.expected, "a shallower expression");

        let shallow = format!("{}PRINT 1", "IF 1 THEN ".repeat(10));
        assert!(parse_source(&shallow).is_ok());
    }
}
