//! Calculator Tool
//!
//! Evaluates plain arithmetic with a recursive-descent parser over numeric
//! literals, `+ - * /`, and parentheses. There is no identifier resolution
//! and no function-call syntax, so no general evaluation capability exists
//! to sandbox. Input is additionally restricted to a character whitelist
//! before parsing; that check is the security boundary, not a parsing aid.

use async_trait::async_trait;
use thiserror::Error;

use agent_core::{
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema,
};

/// Tool for evaluating simple arithmetic expressions
pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "calculate".into(),
            description: "Solves simple arithmetic expressions (+, -, *, /, parentheses).".into(),
            parameters: vec![ParameterSchema {
                name: "expression".into(),
                param_type: "string".into(),
                description: "Arithmetic expression to evaluate (e.g., '2 + 2 * 3')".into(),
                required: true,
                enum_values: None,
            }],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let Some(expr) = call.str_arg("expression") else {
            return Ok(ToolResult::failure(
                "calculate",
                "Error: missing 'expression'.",
            ));
        };

        if !is_whitelisted(expr) {
            return Ok(ToolResult::failure(
                "calculate",
                "Error: expression contains unsupported characters.",
            ));
        }

        match evaluate(expr) {
            Ok(value) => Ok(ToolResult::success("calculate", format_number(value))),
            Err(e) => Ok(ToolResult::failure("calculate", format!("Error: {e}"))),
        }
    }
}

/// Whitelist: digits, the four operators, parentheses, decimal point,
/// whitespace. Everything else is rejected before the parser ever runs.
fn is_whitelisted(expr: &str) -> bool {
    expr.chars()
        .all(|c| c.is_ascii_digit() || "+-*/().".contains(c) || c.is_whitespace())
}

/// Render integral results without a trailing fraction
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("expected ')'")]
    UnclosedParen,

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("division by zero")]
    DivisionByZero,
}

/// Evaluate a whitelisted arithmetic expression.
///
/// Grammar, lowest precedence first:
/// ```text
/// expression := term (('+' | '-') term)*
/// term       := factor (('*' | '/') factor)*
/// factor     := '-' factor | '(' expression ')' | number
/// ```
pub fn evaluate(expr: &str) -> Result<f64, EvalError> {
    let mut parser = Parser::new(expr);
    let value = parser.expression()?;
    parser.skip_whitespace();
    match parser.peek() {
        None => Ok(value),
        Some(c) => Err(EvalError::UnexpectedChar(c)),
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(expr: &str) -> Self {
        Self {
            chars: expr.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expression(&mut self) -> Result<f64, EvalError> {
        let mut value = self.term()?;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('+') => {
                    self.bump();
                    value += self.term()?;
                }
                Some('-') => {
                    self.bump();
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.factor()?;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('*') => {
                    self.bump();
                    value *= self.factor()?;
                }
                Some('/') => {
                    self.bump();
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn factor(&mut self) -> Result<f64, EvalError> {
        self.skip_whitespace();
        match self.peek() {
            Some('-') => {
                self.bump();
                Ok(-self.factor()?)
            }
            Some('(') => {
                self.bump();
                let value = self.expression()?;
                self.skip_whitespace();
                if self.bump() == Some(')') {
                    Ok(value)
                } else {
                    Err(EvalError::UnclosedParen)
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => Err(EvalError::UnexpectedChar(c)),
            None => Err(EvalError::UnexpectedEnd),
        }
    }

    fn number(&mut self) -> Result<f64, EvalError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        {
            self.pos += 1;
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse::<f64>()
            .map_err(|_| EvalError::InvalidNumber(literal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn call_with_expression(expr: &str) -> ToolCall {
        let mut arguments = Map::new();
        arguments.insert("expression".into(), expr.into());
        ToolCall {
            id: "call_0".into(),
            arguments,
        }
    }

    #[test]
    fn test_basic_arithmetic() {
        assert_eq!(evaluate("2 + 2").unwrap(), 4.0);
        assert_eq!(evaluate("10 * 5").unwrap(), 50.0);
        assert_eq!(evaluate("7 - 10").unwrap(), -3.0);
        assert_eq!(evaluate("9 / 2").unwrap(), 4.5);
    }

    #[test]
    fn test_precedence_and_grouping() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("12*(3+4)").unwrap(), 84.0);
        assert_eq!(evaluate("100 / 5 / 2").unwrap(), 10.0);
        assert_eq!(evaluate("10 - 2 - 3").unwrap(), 5.0);
    }

    #[test]
    fn test_unary_minus_and_decimals() {
        assert_eq!(evaluate("-4 + 1").unwrap(), -3.0);
        assert_eq!(evaluate("2 * -3").unwrap(), -6.0);
        assert_eq!(evaluate("1.5 * 2").unwrap(), 3.0);
        assert_eq!(evaluate("-(2 + 3)").unwrap(), -5.0);
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(evaluate("1 / 0"), Err(EvalError::DivisionByZero));
        assert_eq!(evaluate("1 / (2 - 2)"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_malformed_expressions() {
        assert_eq!(evaluate("(1 + 2"), Err(EvalError::UnclosedParen));
        assert_eq!(evaluate("1 +"), Err(EvalError::UnexpectedEnd));
        assert_eq!(evaluate("1 2").unwrap_err(), EvalError::UnexpectedChar('2'));
        assert_eq!(
            evaluate("1.2.3"),
            Err(EvalError::InvalidNumber("1.2.3".into()))
        );
    }

    #[test]
    fn test_whitelist() {
        assert!(is_whitelisted("12 * (3 + 4) / 2.5"));
        assert!(!is_whitelisted("2 + a"));
        assert!(!is_whitelisted("__import__('os')"));
        assert!(!is_whitelisted("x = 1"));
        assert!(!is_whitelisted("pow(2, 8)"));
    }

    #[tokio::test]
    async fn test_execute_returns_integral_text() {
        let result = CalculatorTool
            .execute(&call_with_expression("2+2"))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "4");
    }

    #[tokio::test]
    async fn test_execute_rejects_forbidden_characters() {
        let result = CalculatorTool
            .execute(&call_with_expression("2 + two"))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("unsupported characters"));
    }

    #[tokio::test]
    async fn test_execute_requires_expression() {
        let call = ToolCall {
            id: "call_0".into(),
            arguments: Map::new(),
        };
        let result = CalculatorTool.execute(&call).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.output, "Error: missing 'expression'.");
    }

    #[tokio::test]
    async fn test_execute_reports_division_by_zero() {
        let result = CalculatorTool
            .execute(&call_with_expression("3 / 0"))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("division by zero"));
    }
}
