use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0, one_of},
    combinator::recognize,
    number::complete::double,
    error::ErrorKind,
    sequence::pair,
    IResult,
};

use crate::error::FormulaError;
use crate::node::Node;

/// Skip whitespace, then expect one of the characters in `set`.
fn w_punct<'a>(input: &'a str, set: &'static str) -> IResult<&'a str, char> {
    let (input, _) = multispace0(input)?;
    one_of(set)(input)
}

fn w_number(input: &str) -> IResult<&str, Node> {
    let (input, n) = double(input)?;
    Ok((input, Node::number(n)))
}

fn w_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.'),
    ))(input)
}

fn w_args(input: &str) -> IResult<&str, Vec<Node>> {
    let (mut input, _) = char('(')(input)?;
    let mut args = Vec::new();
    if let Ok((rest, _)) = w_punct(input, ")") {
        return Ok((rest, args));
    }
    loop {
        let (rest, arg) = w_tilde(input)?;
        args.push(arg);
        let (rest, sep) = w_punct(rest, ",)")?;
        input = rest;
        if sep == ')' {
            return Ok((input, args));
        }
    }
}

fn w_call_or_symbol(input: &str) -> IResult<&str, Node> {
    let (input, name) = w_identifier(input)?;
    // `f(x)` is a call, `f (x)` is not
    if input.starts_with('(') {
        let (input, args) = w_args(input)?;
        Ok((input, Node::call(name, args)))
    } else {
        Ok((input, Node::symbol(name)))
    }
}

fn w_group(input: &str) -> IResult<&str, Node> {
    let (input, _) = char('(')(input)?;
    let (input, inner) = w_tilde(input)?;
    let (input, _) = w_punct(input, ")")?;
    Ok((input, inner))
}

fn w_atom(input: &str) -> IResult<&str, Node> {
    let (input, _) = multispace0(input)?;
    alt((w_group, w_call_or_symbol, w_number))(input)
}

/// `^` binds tighter than unary minus and associates to the right.
fn w_power(input: &str) -> IResult<&str, Node> {
    let (input, base) = w_atom(input)?;
    match w_punct(input, "^") {
        Ok((rest, _)) => {
            let (rest, exponent) = w_unary(rest)?;
            Ok((rest, Node::call("^", vec![base, exponent])))
        }
        Err(_) => Ok((input, base)),
    }
}

fn w_unary(input: &str) -> IResult<&str, Node> {
    match w_punct(input, "-$") {
        Ok((rest, '-')) => {
            let (rest, operand) = w_unary(rest)?;
            let negated = match operand {
                Node::Number { value } => Node::number(-value),
                other => Node::call("-", vec![other]),
            };
            Ok((rest, negated))
        }
        Ok((rest, _)) => {
            let (rest, operand) = w_unary(rest)?;
            Ok((rest, Node::escape(operand)))
        }
        Err(_) => w_power(input),
    }
}

/// Append `rhs` to `acc` if `extend`, else build the binary call `op(acc, rhs)`.
fn chain(acc: Node, op: char, rhs: Node, extend: bool) -> Node {
    match acc {
        Node::Call { op: acc_op, mut args } if extend => {
            args.push(rhs);
            Node::Call { op: acc_op, args }
        }
        other => Node::call(op.to_string(), vec![other, rhs]),
    }
}

/// Left-associative binary level over `ops`. Runs of the `nary` operator
/// collapse into one call, so `a + b + c` is `+(a, b, c)`; parentheses
/// break a run.
fn w_binary<'a>(
    input: &'a str,
    ops: &'static str,
    nary: char,
    operand: fn(&'a str) -> IResult<&'a str, Node>,
) -> IResult<&'a str, Node> {
    let (mut input, mut acc) = operand(input)?;
    let mut previous = None;
    loop {
        match w_punct(input, ops) {
            Ok((rest, op)) => {
                let (rest, rhs) = operand(rest)?;
                acc = chain(acc, op, rhs, op == nary && previous == Some(nary));
                previous = Some(op);
                input = rest;
            }
            Err(_) => return Ok((input, acc)),
        }
    }
}

fn w_product(input: &str) -> IResult<&str, Node> {
    w_binary(input, "*/&", '*', w_unary)
}

fn w_sum(input: &str) -> IResult<&str, Node> {
    w_binary(input, "+-", '+', w_product)
}

/// `lhs ~ rhs`. A leading `~` leaves the left side absent; further `~`
/// add arguments to the same call.
fn w_tilde(input: &str) -> IResult<&str, Node> {
    let (mut input, mut sides) = match w_punct(input, "~") {
        Ok((rest, _)) => (rest, vec![Node::Absent]),
        Err(_) => {
            let (rest, lhs) = w_sum(input)?;
            match w_punct(rest, "~") {
                Ok((rest, _)) => (rest, vec![lhs]),
                Err(_) => return Ok((rest, lhs)),
            }
        }
    };
    loop {
        let (rest, side) = w_sum(input)?;
        sides.push(side);
        match w_punct(rest, "~") {
            Ok((rest, _)) => input = rest,
            Err(_) => return Ok((rest, Node::call("~", sides))),
        }
    }
}

/// What the failing parser was looking for, in words.
fn expected(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Alt => "an expression",
        ErrorKind::OneOf => "`,` or `)`",
        ErrorKind::Char => "`(`",
        ErrorKind::Float => "a number",
        ErrorKind::TakeWhile1 => "a name",
        _ => "a formula",
    }
}

/// Parse the longest expression at the start of `input`, returning the
/// unparsed remainder alongside the AST.
pub fn parse_expr(input: &str) -> IResult<&str, Node> {
    w_tilde(input)
}

/// Parse a formula string such as `y ~ a + b * log(c)` into an
/// expression tree. The whole input must be consumed.
///
/// The result is plain syntax; nothing is checked beyond the grammar.
pub fn parse(input: &str) -> Result<Node, FormulaError> {
    match parse_expr(input) {
        Ok((rest, node)) => {
            let trailing = rest.trim_start();
            if trailing.is_empty() {
                Ok(node)
            } else {
                Err(FormulaError::Parse {
                    offset: input.len() - trailing.len(),
                    message: format!("unexpected `{}`", trailing),
                })
            }
        }
        Err(nom::Err::Error((rest, kind))) | Err(nom::Err::Failure((rest, kind))) => {
            Err(FormulaError::Parse {
                offset: input.len() - rest.len(),
                message: format!("expected {}", expected(kind)),
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(FormulaError::Parse {
            offset: input.len(),
            message: "unexpected end of input".to_string(),
        }),
    }
}
