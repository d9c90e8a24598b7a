use serde::Serialize;
use std::fmt;

/// Operator of the escape/splice marker, `$x`.
pub const ESCAPE: &str = "$";

/// An expression as produced by the parser, before any formula-level
/// interpretation.
///
/// Nodes are plain data; cloning one is a structural deep copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Call { op: String, args: Vec<Node> },
    Symbol { name: String },
    Number { value: f64 },
    Absent,
}

impl Node {
    pub fn call<S: Into<String>>(op: S, args: Vec<Node>) -> Node {
        Node::Call {
            op: op.into(),
            args,
        }
    }

    pub fn symbol<S: Into<String>>(name: S) -> Node {
        Node::Symbol { name: name.into() }
    }

    pub fn number(value: f64) -> Node {
        Node::Number { value }
    }

    /// Wrap `inner` in an escape marker.
    pub fn escape(inner: Node) -> Node {
        Node::call(ESCAPE, vec![inner])
    }

    /// Operator and arguments if this is a call.
    pub fn as_call(&self) -> Option<(&str, &[Node])> {
        match self {
            Node::Call { op, args } => Some((op.as_str(), args.as_slice())),
            _ => None,
        }
    }

    pub fn is_escape(&self) -> bool {
        matches!(self, Node::Call { op, .. } if op == ESCAPE)
    }

    /// Visit this node and every descendant, parents before children.
    pub fn walk<'n, F: FnMut(&'n Node)>(&'n self, f: &mut F) {
        f(self);
        if let Node::Call { args, .. } = self {
            for arg in args {
                arg.walk(f);
            }
        }
    }
}

/// Binding strength of infix operators; `None` for prefix calls.
pub(crate) fn precedence(op: &str) -> Option<u8> {
    match op {
        "~" => Some(0),
        "+" | "-" => Some(1),
        "*" | "/" | "&" => Some(2),
        "^" => Some(3),
        _ => None,
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Node::Symbol { name } => write!(f, "{}", name),
            Node::Number { value } => write!(f, "{}", value),
            Node::Absent => Ok(()),
            Node::Call { op, args } if op == ESCAPE && args.len() == 1 => {
                write!(f, "${}", Operand(&args[0], 4))
            }
            Node::Call { op, args } if op == "-" && args.len() == 1 => {
                write!(f, "-{}", Operand(&args[0], 4))
            }
            Node::Call { op, args } if precedence(op).is_some() && args.len() >= 2 => {
                let parent = precedence(op).unwrap_or(0);
                let parts: Vec<String> = args
                    .iter()
                    .map(|arg| Operand(arg, parent).to_string())
                    .collect();
                // `~(Absent, x)` prints as `~ x`
                write!(f, "{}", parts.join(&format!(" {} ", op)).trim_start())
            }
            Node::Call { op, args } => {
                write!(f, "{}(", op)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn is_negation(node: &Node) -> bool {
    matches!(node, Node::Call { op, args } if op == "-" && args.len() == 1)
}

/// An operand of an operator binding with strength `.1`; parenthesized
/// unless it binds tighter.
struct Operand<'n>(&'n Node, u8);

impl<'n> fmt::Display for Operand<'n> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            Node::Call { op, args } if args.len() >= 2 => match precedence(op) {
                Some(p) if p <= self.1 => write!(f, "({})", self.0),
                _ => write!(f, "{}", self.0),
            },
            // `-a` and `$a` bind looser than `^`
            prefix if self.1 >= 3 && (prefix.is_escape() || is_negation(prefix)) => {
                write!(f, "({})", prefix)
            }
            Node::Number { value } if *value < 0.0 => write!(f, "({})", value),
            other => write!(f, "{}", other),
        }
    }
}
