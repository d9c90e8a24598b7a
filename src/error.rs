//! Error types for formula rewriting and captured-call evaluation.

use thiserror::Error;

/// Raised while turning an expression into a term tree. Every variant
/// aborts the whole transformation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("malformed formula `{expr}`: {message}")]
    Syntax { message: String, expr: String },
    #[error("unsupported syntax: `{expr}` contains an escape marker")]
    Unsupported { expr: String },
    #[error("function `{name}` in `{expr}` is not defined in scope")]
    UnresolvedFunction { name: String, expr: String },
    #[error("parse error at offset {offset}: {message}")]
    Parse { offset: usize, message: String },
}

/// Raised when a captured call is evaluated against a data row.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("variable `{name}` is not bound")]
    UnboundVariable { name: String },
    #[error("function `{name}` is not defined")]
    UndefinedFunction { name: String },
    #[error("`{name}` expects {expected} arguments, got {actual}")]
    Arity {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("expected a value for each of {variables:?}, got {actual}")]
    Bindings {
        variables: Vec<String>,
        actual: usize,
    },
    #[error("`{expr}` cannot be evaluated")]
    NotEvaluable { expr: String },
}

pub type Result<T> = std::result::Result<T, FormulaError>;
