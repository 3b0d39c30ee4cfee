//! Expression parsing and evaluation for parameter constraints
//!
//! Constraints link a computed parameter to other parameters, possibly on
//! other models, e.g. `length = 2 * sphere.radius + 5`. Identifiers are bare
//! parameter names or `unit.parameter` references; resolution is up to the
//! [`EvaluationContext`].

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0, one_of},
    combinator::{map, recognize},
    multi::{many0, separated_list0},
    number::complete::double,
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};
use std::collections::HashMap;
use thiserror::Error;

/// Error that can occur during expression parsing or evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Failed to parse expression: {message}")]
    ParseError { message: String },

    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Undefined function: {name}")]
    UndefinedFunction { name: String },

    #[error("Circular dependency in expression for parameter '{name}'")]
    CircularDependency { name: String },
}

/// Result type for expression evaluation
type ExprResult<T> = Result<T, ExpressionError>;

type PResult<'a, T> = IResult<&'a str, T>;

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Constant number
    Number(f64),

    /// Variable reference
    Variable(String),

    /// Unary operations
    Unary(UnaryOp, Box<Expression>),

    /// Binary operations
    Binary(BinaryOp, Box<Expression>, Box<Expression>),

    /// Function call
    Function(String, Vec<Expression>),
}

/// Unary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
}

/// Binary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Context for expression evaluation, providing variable values
pub trait EvaluationContext {
    /// Get the value of a variable
    fn get_variable(&self, name: &str) -> ExprResult<f64>;

    /// Check if a variable exists
    fn has_variable(&self, name: &str) -> bool;
}

impl EvaluationContext for HashMap<String, f64> {
    fn get_variable(&self, name: &str) -> ExprResult<f64> {
        self.get(name)
            .copied()
            .ok_or_else(|| ExpressionError::UndefinedVariable {
                name: name.to_string(),
            })
    }

    fn has_variable(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

impl Expression {
    /// Parse an expression from a string
    ///
    /// # Examples
    ///
    /// ```
    /// use multifit_rs::parameters::Expression;
    /// use std::collections::HashMap;
    ///
    /// let expr = Expression::parse("2 * sphere.radius + 1").unwrap();
    /// let mut ctx = HashMap::new();
    /// ctx.insert("sphere.radius".to_string(), 3.0);
    /// assert_eq!(expr.evaluate(&ctx).unwrap(), 7.0);
    /// ```
    pub fn parse(input: &str) -> ExprResult<Self> {
        match expr_parser(input) {
            Ok((remainder, expr)) => {
                if remainder.trim().is_empty() {
                    Ok(expr)
                } else {
                    Err(ExpressionError::ParseError {
                        message: format!("Unexpected trailing characters: '{}'", remainder.trim()),
                    })
                }
            }
            Err(e) => Err(ExpressionError::ParseError {
                message: format!("'{}': {:?}", input, e),
            }),
        }
    }

    /// Evaluate the expression with the given context
    pub fn evaluate<C: EvaluationContext + ?Sized>(&self, context: &C) -> ExprResult<f64> {
        match self {
            Self::Number(n) => Ok(*n),

            Self::Variable(name) => context.get_variable(name),

            Self::Unary(UnaryOp::Neg, expr) => Ok(-expr.evaluate(context)?),

            Self::Binary(op, left, right) => {
                let lhs = left.evaluate(context)?;
                let rhs = right.evaluate(context)?;

                match op {
                    BinaryOp::Add => Ok(lhs + rhs),
                    BinaryOp::Sub => Ok(lhs - rhs),
                    BinaryOp::Mul => Ok(lhs * rhs),
                    BinaryOp::Div if rhs == 0.0 => Err(ExpressionError::DivisionByZero),
                    BinaryOp::Div => Ok(lhs / rhs),
                    BinaryOp::Pow => Ok(lhs.powf(rhs)),
                }
            }

            Self::Function(name, args) => {
                let values = args
                    .iter()
                    .map(|arg| arg.evaluate(context))
                    .collect::<ExprResult<Vec<f64>>>()?;
                call_function(name, &values)
            }
        }
    }

    /// Find all variable names used in the expression, sorted and unique
    pub fn variables(&self) -> Vec<String> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars.sort();
        vars.dedup();
        vars
    }

    fn collect_variables(&self, vars: &mut Vec<String>) {
        match self {
            Self::Number(_) => {}
            Self::Variable(name) => vars.push(name.clone()),
            Self::Unary(_, expr) => expr.collect_variables(vars),
            Self::Binary(_, left, right) => {
                left.collect_variables(vars);
                right.collect_variables(vars);
            }
            Self::Function(_, args) => {
                for arg in args {
                    arg.collect_variables(vars);
                }
            }
        }
    }
}

fn call_function(name: &str, args: &[f64]) -> ExprResult<f64> {
    let unary = |f: fn(f64) -> f64| {
        if args.len() == 1 {
            Ok(f(args[0]))
        } else {
            Err(ExpressionError::InvalidOperation {
                message: format!("{}() requires 1 argument, got {}", name, args.len()),
            })
        }
    };

    match name {
        "sin" => unary(f64::sin),
        "cos" => unary(f64::cos),
        "tan" => unary(f64::tan),
        "exp" => unary(f64::exp),
        "log" | "ln" => unary(f64::ln),
        "log10" => unary(f64::log10),
        "sqrt" => unary(f64::sqrt),
        "abs" => unary(f64::abs),
        "min" | "max" if args.len() < 2 => Err(ExpressionError::InvalidOperation {
            message: format!("{}() requires at least 2 arguments, got {}", name, args.len()),
        }),
        "min" => Ok(args.iter().fold(f64::INFINITY, |a, &b| a.min(b))),
        "max" => Ok(args.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b))),
        _ => Err(ExpressionError::UndefinedFunction {
            name: name.to_string(),
        }),
    }
}

// Parser functions using nom

fn ws(input: &str) -> PResult<'_, &str> {
    multispace0(input)
}

fn number(input: &str) -> PResult<'_, f64> {
    double(input)
}

/// Identifier: a name, optionally qualified with dots (`unit.parameter`)
fn identifier(input: &str) -> PResult<'_, String> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_"), tag(".")))),
        )),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

fn operator<'a>(input: &'a str, ops: &'static str) -> PResult<'a, char> {
    preceded(multispace0, one_of(ops)).parse(input)
}

fn function_call(input: &str) -> PResult<'_, Expression> {
    map(
        pair(
            identifier,
            delimited(
                preceded(multispace0, char('(')),
                separated_list0(preceded(multispace0, char(',')), expr_parser),
                preceded(multispace0, char(')')),
            ),
        ),
        |(name, args)| Expression::Function(name, args),
    )
    .parse(input)
}

fn parens(input: &str) -> PResult<'_, Expression> {
    delimited(char('('), expr_parser, preceded(multispace0, char(')'))).parse(input)
}

fn primary(input: &str) -> PResult<'_, Expression> {
    let (input, _) = ws(input)?;

    match input.chars().next() {
        Some(c) if c.is_ascii_digit() || c == '.' => {
            let (rest, value) = number(input)?;
            Ok((rest, Expression::Number(value)))
        }
        Some('(') => parens(input),
        _ => alt((function_call, map(identifier, Expression::Variable))).parse(input),
    }
}

/// primary ('^' unary)?, right associative
fn power(input: &str) -> PResult<'_, Expression> {
    let (input, base) = primary(input)?;

    match operator(input, "^") {
        Ok((rest, _)) => {
            let (rest, exponent) = unary(rest)?;
            Ok((
                rest,
                Expression::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)),
            ))
        }
        Err(_) => Ok((input, base)),
    }
}

/// '-' unary | power
fn unary(input: &str) -> PResult<'_, Expression> {
    match operator(input, "-") {
        Ok((rest, _)) => {
            let (rest, operand) = unary(rest)?;
            Ok((rest, Expression::Unary(UnaryOp::Neg, Box::new(operand))))
        }
        Err(_) => power(input),
    }
}

/// unary (('*' | '/') unary)*, left associative
fn term(input: &str) -> PResult<'_, Expression> {
    let (mut input, mut left) = unary(input)?;

    loop {
        let (rest, op) = match operator(input, "*/") {
            Ok(found) => found,
            Err(_) => return Ok((input, left)),
        };
        let (rest, right) = unary(rest)?;
        let op = if op == '*' { BinaryOp::Mul } else { BinaryOp::Div };
        left = Expression::Binary(op, Box::new(left), Box::new(right));
        input = rest;
    }
}

/// term (('+' | '-') term)*, left associative
fn expr_parser(input: &str) -> PResult<'_, Expression> {
    let (mut input, mut left) = term(input)?;

    loop {
        let (rest, op) = match operator(input, "+-") {
            Ok(found) => found,
            Err(_) => return Ok((input, left)),
        };
        let (rest, right) = term(rest)?;
        let op = if op == '+' { BinaryOp::Add } else { BinaryOp::Sub };
        left = Expression::Binary(op, Box::new(left), Box::new(right));
        input = rest;
    }
}
