use indexmap::IndexSet;
use serde::Serialize;
use std::fmt;

use crate::capture::CapturedCall;
use crate::node::{precedence, Node};

/// Operators that carry formula-level meaning and are kept as structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Special {
    /// `+`, sum of terms
    Sum,
    /// `&`, interaction
    Interaction,
    /// `*`, main effects plus all interactions
    Expand,
    /// `~`, separates response from predictors
    Tilde,
}

impl Special {
    pub const ALL: [Special; 4] = [
        Special::Sum,
        Special::Interaction,
        Special::Expand,
        Special::Tilde,
    ];

    pub fn from_symbol(op: &str) -> Option<Special> {
        match op {
            "+" => Some(Special::Sum),
            "&" => Some(Special::Interaction),
            "*" => Some(Special::Expand),
            "~" => Some(Special::Tilde),
            _ => None,
        }
    }

    fn precedence(self) -> u8 {
        match self {
            Special::Tilde => 0,
            Special::Sum => 1,
            Special::Interaction | Special::Expand => 2,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Special::Sum => "+",
            Special::Interaction => "&",
            Special::Expand => "*",
            Special::Tilde => "~",
        }
    }
}

/// A normalized formula term tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Term {
    /// A named data column, resolved when the model matrix is built.
    Column { name: String },
    /// A literal; `1` requests an intercept, `0` or `-1` suppresses it.
    Constant { value: f64 },
    /// Missing left-hand side of a one-sided formula.
    Absent,
    Op { op: Special, args: Vec<Term> },
    Captured(CapturedCall),
}

impl Term {
    pub fn column<S: Into<String>>(name: S) -> Term {
        Term::Column { name: name.into() }
    }

    pub fn constant(value: f64) -> Term {
        Term::Constant { value }
    }

    pub fn op(op: Special, args: Vec<Term>) -> Term {
        Term::Op { op, args }
    }

    /// Column names this term reads, in order of first appearance.
    /// Free variables of captured calls count as columns.
    pub fn columns(&self) -> IndexSet<String> {
        let mut out = IndexSet::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns(&self, out: &mut IndexSet<String>) {
        match self {
            Term::Column { name } => {
                out.insert(name.clone());
            }
            Term::Op { args, .. } => args.iter().for_each(|a| a.collect_columns(out)),
            Term::Captured(call) => {
                out.extend(call.free_variables().iter().cloned());
            }
            Term::Constant { .. } | Term::Absent => {}
        }
    }

    /// Every captured call in the tree, outer calls before those nested
    /// in their lowered arguments.
    pub fn captured_calls(&self) -> Vec<&CapturedCall> {
        let mut out = Vec::new();
        self.collect_captured(&mut out);
        out
    }

    fn collect_captured<'t>(&'t self, out: &mut Vec<&'t CapturedCall>) {
        match self {
            Term::Op { args, .. } => args.iter().for_each(|a| a.collect_captured(out)),
            Term::Captured(call) => {
                out.push(call);
                call.lowered_args()
                    .iter()
                    .for_each(|a| a.collect_captured(out));
            }
            _ => {}
        }
    }

    /// Binding strength of the operator this term prints with, if infix.
    /// A captured call prints as written, so its original decides.
    fn binding(&self) -> Option<u8> {
        match self {
            Term::Op { op, .. } => Some(op.precedence()),
            Term::Captured(call) => match call.original() {
                Node::Call { op, args } if args.len() >= 2 => precedence(op),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Term::Column { name } => write!(f, "{}", name),
            Term::Constant { value } => write!(f, "{}", value),
            Term::Absent => Ok(()),
            Term::Captured(call) => write!(f, "{}", call.original()),
            Term::Op { op, args } => {
                let parent = op.precedence();
                let parts: Vec<String> = args
                    .iter()
                    .map(|arg| match arg.binding() {
                        Some(p) if p <= parent => format!("({})", arg),
                        _ => match arg {
                            Term::Constant { value } if *value < 0.0 => format!("({})", value),
                            _ => arg.to_string(),
                        },
                    })
                    .collect();
                write!(f, "{}", parts.join(&format!(" {} ", op.symbol())).trim_start())
            }
        }
    }
}
