//! termula -- write a model formula once, bind data later
//!
//! Termula turns a dependence expression such as `y ~ a + b * log(c)`
//! into a normalized term tree from which a model matrix can be built.
//! The formula operators `~`, `+`, `&` and `*` are kept as structure;
//! every other function application is captured together with its free
//! variables, so that it can be evaluated once rows of data arrive.
//!
//! Functions are looked up in an explicit [`Scope`] when the formula is
//! built, not when data is bound.
//!
//! Expanding interactions, distributing `&` over `+` and similar term
//! algebra is left to the consumer of the term tree.
//!
//! ```
//! use termula::{Env, Formula, Scope, Term};
//!
//! let scope = Scope::with_builtins();
//! let formula = Formula::parse("y ~ a + log(c)", &scope).unwrap();
//! assert_eq!(formula.lhs(), &Term::column("y"));
//!
//! let calls = formula.rhs().captured_calls();
//! assert_eq!(calls[0].free_variables(), &["c".to_string()][..]);
//!
//! let mut row = Env::new();
//! row.insert("c".to_string(), 1.0);
//! assert_eq!(calls[0].evaluate(&row), Ok(0.0));
//! ```
extern crate nom;

pub mod capture;
pub mod error;
pub mod evaluator;
pub mod formula;
pub mod free_vars;
pub mod node;
pub mod parse;
pub mod rewrite;
pub mod term;
pub mod validate;

pub use capture::{capture_call, CallClosure, CapturedCall};
pub use error::{EvalError, FormulaError, Result};
pub use evaluator::{Env, Function, Scope};
pub use formula::Formula;
pub use node::Node;
pub use parse::parse;
pub use rewrite::{rewrite, Rewriter};
pub use term::{Special, Term};
