use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::EvalError;
use crate::node::Node;

/// One data row: variable name to value.
pub type Env = HashMap<String, f64>;

type Callable = dyn Fn(&[f64]) -> Result<f64, EvalError> + Send + Sync;

/// A named function that captured calls can apply to data values.
#[derive(Clone)]
pub struct Function {
    name: String,
    arity: Option<usize>,
    f: Arc<Callable>,
}

impl Function {
    /// `arity` of `None` accepts any number of arguments.
    pub fn new<S, F>(name: S, arity: Option<usize>, f: F) -> Function
    where
        S: Into<String>,
        F: Fn(&[f64]) -> Result<f64, EvalError> + Send + Sync + 'static,
    {
        Function {
            name: name.into(),
            arity,
            f: Arc::new(f),
        }
    }

    fn unary<S: Into<String>>(name: S, f: fn(f64) -> f64) -> Function {
        Function::new(name, Some(1), move |args| Ok(f(args[0])))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    pub fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        match self.arity {
            Some(expected) if expected != args.len() => Err(EvalError::Arity {
                name: self.name.clone(),
                expected,
                actual: args.len(),
            }),
            _ => (self.f)(args),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Functions are identified by name and arity.
impl PartialEq for Function {
    fn eq(&self, other: &Function) -> bool {
        self.name == other.name && self.arity == other.arity
    }
}

impl Serialize for Function {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

/// The functions visible when a formula is written.
///
/// A scope is handed explicitly to the rewriter; captured calls keep a
/// clone of it. Cloning is cheap and yields a snapshot: functions defined
/// afterwards are not seen by calls captured earlier.
#[derive(Clone, Default, Debug)]
pub struct Scope {
    functions: Arc<HashMap<String, Function>>,
}

impl Scope {
    pub fn new() -> Scope {
        Scope::default()
    }

    /// A scope with arithmetic operators and common elementary functions.
    /// `&` of numeric values is their product, as an interaction column.
    pub fn with_builtins() -> Scope {
        let mut scope = Scope::new();
        scope.insert(Function::new("+", None, |args| Ok(args.iter().sum())));
        scope.insert(Function::new("*", None, |args| Ok(args.iter().product())));
        scope.insert(Function::new("&", None, |args| Ok(args.iter().product())));
        scope.insert(Function::new("-", None, |args| match args {
            [x] => Ok(-x),
            [x, y] => Ok(x - y),
            _ => Err(EvalError::Arity {
                name: "-".to_string(),
                expected: 2,
                actual: args.len(),
            }),
        }));
        scope.insert(Function::new("/", Some(2), |args| Ok(args[0] / args[1])));
        scope.insert(Function::new("^", Some(2), |args| Ok(args[0].powf(args[1]))));
        scope.insert(Function::unary("log", f64::ln));
        scope.insert(Function::unary("exp", f64::exp));
        scope.insert(Function::unary("sqrt", f64::sqrt));
        scope.insert(Function::unary("abs", f64::abs));
        scope.insert(Function::unary("sin", f64::sin));
        scope.insert(Function::unary("cos", f64::cos));
        scope
    }

    /// Define (or shadow) `name`.
    pub fn define<S, F>(&mut self, name: S, arity: Option<usize>, f: F)
    where
        S: Into<String>,
        F: Fn(&[f64]) -> Result<f64, EvalError> + Send + Sync + 'static,
    {
        self.insert(Function::new(name, arity, f));
    }

    pub fn insert(&mut self, function: Function) {
        Arc::make_mut(&mut self.functions).insert(function.name.clone(), function);
    }

    pub fn resolve(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Evaluate `node` with symbols bound from `env`.
    pub fn eval(&self, node: &Node, env: &Env) -> Result<f64, EvalError> {
        match node {
            Node::Number { value } => Ok(*value),
            Node::Symbol { name } => env
                .get(name)
                .copied()
                .ok_or_else(|| EvalError::UnboundVariable { name: name.clone() }),
            Node::Call { op, args } => {
                let function = self
                    .resolve(op)
                    .ok_or_else(|| EvalError::UndefinedFunction { name: op.clone() })?;
                self.apply(function, args, env)
            }
            Node::Absent => Err(EvalError::NotEvaluable {
                expr: "<absent>".to_string(),
            }),
        }
    }

    /// Evaluate `args` in `env` and apply `function` to them.
    pub fn apply(&self, function: &Function, args: &[Node], env: &Env) -> Result<f64, EvalError> {
        let values = args
            .iter()
            .map(|arg| self.eval(arg, env))
            .collect::<Result<Vec<f64>, EvalError>>()?;
        function.apply(&values)
    }
}
