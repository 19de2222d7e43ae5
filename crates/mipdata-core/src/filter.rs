//! Boolean row filters over the canonical metadata columns.
//!
//! A filter is a small expression such as `n_vars > 100 and "benchmark" in tags`.
//! Several filters passed together are conjoined.
//!
//! ```text
//! expr     := and ( ("or" | "||" | "|") and )*
//! and      := unary ( ("and" | "&&" | "&") unary )*
//! unary    := ("not" | "~" | "!") unary | "(" expr ")" | compare
//! compare  := operand op operand
//! op       := "==" | "!=" | "<" | "<=" | ">" | ">=" | "in" | "not in"
//! operand  := number | 'text' | "text" | column | "[" literal, ... "]"
//! ```

use std::cmp::Ordering;

use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, take_while};
use nom::character::complete::{char as pchar, multispace0, multispace1, satisfy};
use nom::combinator::{all_consuming, map, map_res, not, opt, peek, recognize, value};
use nom::multi::{many0, separated_list0};
use nom::number::complete::recognize_float;
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use thiserror::Error;

use crate::normalize::parse_tags;
use crate::table::{CacheRow, Column};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("cannot parse {expression:?}: {message}")]
    Syntax { expression: String, message: String },

    #[error("unknown column {column:?} in {expression:?}")]
    UnknownColumn { expression: String, column: String },

    #[error("cannot compare {left} with {right} using {op}")]
    TypeMismatch {
        left: &'static str,
        right: &'static str,
        op: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

impl Op {
    fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "==",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::In => "in",
            Op::NotIn => "not in",
        }
    }
}

/// A value a column or literal evaluates to.
#[derive(Debug, Clone, PartialEq)]
enum Value {
    Null,
    Number(f64),
    Text(String),
    List(Vec<Value>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::List(_) => "list",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Operand<F> {
    Field(F),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq)]
enum Expr<F> {
    And(Box<Expr<F>>, Box<Expr<F>>),
    Or(Box<Expr<F>>, Box<Expr<F>>),
    Not(Box<Expr<F>>),
    Compare {
        lhs: Operand<F>,
        op: Op,
        rhs: Operand<F>,
    },
}

impl<F> Expr<F> {
    fn try_map_fields<G, E>(self, f: &mut impl FnMut(F) -> Result<G, E>) -> Result<Expr<G>, E> {
        Ok(match self {
            Expr::And(a, b) => Expr::And(Box::new(a.try_map_fields(f)?), Box::new(b.try_map_fields(f)?)),
            Expr::Or(a, b) => Expr::Or(Box::new(a.try_map_fields(f)?), Box::new(b.try_map_fields(f)?)),
            Expr::Not(e) => Expr::Not(Box::new(e.try_map_fields(f)?)),
            Expr::Compare { lhs, op, rhs } => Expr::Compare {
                lhs: lhs.try_map_field(f)?,
                op,
                rhs: rhs.try_map_field(f)?,
            },
        })
    }
}

impl<F> Operand<F> {
    fn try_map_field<G, E>(self, f: &mut impl FnMut(F) -> Result<G, E>) -> Result<Operand<G>, E> {
        Ok(match self {
            Operand::Field(field) => Operand::Field(f(field)?),
            Operand::Literal(v) => Operand::Literal(v),
        })
    }
}

/// A parsed, column-checked filter expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    source: String,
    expr: Expr<Column>,
}

impl Filter {
    /// Parse one filter expression and check its column names.
    pub fn parse(expression: &str) -> Result<Self, FilterError> {
        let (_, expr) = all_consuming(ws(or_expr))(expression).map_err(|e| FilterError::Syntax {
            expression: expression.to_owned(),
            message: describe(&e),
        })?;
        let expr = expr.try_map_fields(&mut |name: &str| {
            name.parse::<Column>().map_err(|column| FilterError::UnknownColumn {
                expression: expression.to_owned(),
                column,
            })
        })?;
        Ok(Self {
            source: expression.to_owned(),
            expr,
        })
    }

    /// Parse several expressions at once.
    pub fn parse_all<S: AsRef<str>>(expressions: &[S]) -> Result<Vec<Self>, FilterError> {
        expressions.iter().map(|e| Self::parse(e.as_ref())).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, row: &CacheRow) -> Result<bool, FilterError> {
        eval(&self.expr, row)
    }

    /// Whether `row` satisfies every filter.
    pub fn matches_all(filters: &[Filter], row: &CacheRow) -> Result<bool, FilterError> {
        for filter in filters {
            if !filter.matches(row)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

// ==================== Evaluation ====================

fn column_value(row: &CacheRow, column: Column) -> Value {
    let text = |s: &str| Value::Text(s.to_owned());
    let count = |n: u64| Value::Number(n as f64);
    match column {
        Column::Name => text(&row.name),
        Column::Status => text(&row.status),
        Column::NVars => count(row.n_vars),
        Column::NBins => count(row.n_bins),
        Column::NInts => count(row.n_ints),
        Column::NConts => count(row.n_conts),
        Column::NCons => count(row.n_cons),
        Column::NNz => count(row.n_nz),
        Column::Group => row.group.as_deref().map_or(Value::Null, text),
        Column::Primal => row.primal.map_or(Value::Null, Value::Number),
        Column::Tags => Value::List(parse_tags(&row.tags).into_iter().map(Value::Text).collect()),
        Column::Type => text(row.problem_type.as_str()),
        Column::OptimizationStatus => text(row.optimization_status.as_str()),
    }
}

fn resolve(operand: &Operand<Column>, row: &CacheRow) -> Value {
    match operand {
        Operand::Field(column) => column_value(row, *column),
        Operand::Literal(v) => v.clone(),
    }
}

fn eval(expr: &Expr<Column>, row: &CacheRow) -> Result<bool, FilterError> {
    match expr {
        Expr::And(a, b) => Ok(eval(a, row)? && eval(b, row)?),
        Expr::Or(a, b) => Ok(eval(a, row)? || eval(b, row)?),
        Expr::Not(e) => Ok(!eval(e, row)?),
        Expr::Compare { lhs, op, rhs } => compare(&resolve(lhs, row), *op, &resolve(rhs, row)),
    }
}

fn compare(left: &Value, op: Op, right: &Value) -> Result<bool, FilterError> {
    let mismatch = || FilterError::TypeMismatch {
        left: left.kind(),
        right: right.kind(),
        op: op.as_str(),
    };
    match op {
        Op::Eq => Ok(scalar_eq(left, right)),
        Op::Ne => Ok(!scalar_eq(left, right)),
        Op::In => contains(right, left).ok_or_else(mismatch),
        Op::NotIn => contains(right, left).map(|found| !found).ok_or_else(mismatch),
        Op::Lt | Op::Le | Op::Gt | Op::Ge => {
            let ordering = match (left, right) {
                (Value::Null, _) | (_, Value::Null) => return Ok(false),
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
                _ => return Err(mismatch()),
            };
            Ok(ordering.is_some_and(|o| match op {
                Op::Lt => o == Ordering::Less,
                Op::Le => o != Ordering::Greater,
                Op::Gt => o == Ordering::Greater,
                _ => o != Ordering::Less,
            }))
        }
    }
}

fn scalar_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => false,
        (a, b) => a == b,
    }
}

/// Membership test; `None` when `haystack` cannot contain `needle`.
fn contains(haystack: &Value, needle: &Value) -> Option<bool> {
    match (haystack, needle) {
        (Value::Null, _) | (_, Value::Null) => Some(false),
        (Value::List(items), Value::List(needles)) => {
            Some(needles.iter().any(|n| items.iter().any(|i| scalar_eq(i, n))))
        }
        (Value::List(items), needle) => Some(items.iter().any(|i| scalar_eq(i, needle))),
        (Value::Text(text), Value::Text(needle)) => Some(text.contains(needle.as_str())),
        _ => None,
    }
}

// ==================== Parsing ====================

fn describe(e: &nom::Err<nom::error::Error<&str>>) -> String {
    match e {
        nom::Err::Incomplete(_) => "unexpected end of expression".to_string(),
        nom::Err::Error(e) | nom::Err::Failure(e) if e.input.is_empty() => {
            "unexpected end of expression".to_string()
        }
        nom::Err::Error(e) | nom::Err::Failure(e) => format!("unexpected input at {:?}", e.input),
    }
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// A keyword not immediately followed by more identifier characters.
fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag(kw), not(peek(satisfy(is_ident_char))))
}

fn or_expr(input: &str) -> IResult<&str, Expr<&str>> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(preceded(ws(alt((keyword("or"), tag("||"), tag("|")))), and_expr))(input)?;
    Ok((
        input,
        rest.into_iter()
            .fold(first, |acc, e| Expr::Or(Box::new(acc), Box::new(e))),
    ))
}

fn and_expr(input: &str) -> IResult<&str, Expr<&str>> {
    let (input, first) = unary(input)?;
    let (input, rest) = many0(preceded(ws(alt((keyword("and"), tag("&&"), tag("&")))), unary))(input)?;
    Ok((
        input,
        rest.into_iter()
            .fold(first, |acc, e| Expr::And(Box::new(acc), Box::new(e))),
    ))
}

fn unary(input: &str) -> IResult<&str, Expr<&str>> {
    alt((
        map(
            preceded(ws(alt((keyword("not"), tag("~"), terminated(tag("!"), not(peek(pchar('='))))))), unary),
            |e| Expr::Not(Box::new(e)),
        ),
        delimited(ws(pchar('(')), or_expr, ws(pchar(')'))),
        comparison,
    ))(input)
}

fn comparison(input: &str) -> IResult<&str, Expr<&str>> {
    map(tuple((ws(operand), operator, ws(operand))), |(lhs, op, rhs)| {
        Expr::Compare { lhs, op, rhs }
    })(input)
}

fn operator(input: &str) -> IResult<&str, Op> {
    alt((
        value(Op::Le, tag("<=")),
        value(Op::Ge, tag(">=")),
        value(Op::Eq, tag("==")),
        value(Op::Ne, tag("!=")),
        value(Op::Lt, tag("<")),
        value(Op::Gt, tag(">")),
        value(Op::NotIn, tuple((keyword("not"), multispace1, keyword("in")))),
        value(Op::In, keyword("in")),
    ))(input)
}

fn operand(input: &str) -> IResult<&str, Operand<&str>> {
    alt((
        map(list_literal, |items| Operand::Literal(Value::List(items))),
        map(scalar_literal, Operand::Literal),
        map(identifier, Operand::Field),
    ))(input)
}

fn scalar_literal(input: &str) -> IResult<&str, Value> {
    alt((map(string_literal, Value::Text), map(number, Value::Number)))(input)
}

fn list_literal(input: &str) -> IResult<&str, Vec<Value>> {
    delimited(
        pchar('['),
        separated_list0(pchar(','), ws(scalar_literal)),
        preceded(multispace0, pchar(']')),
    )(input)
}

fn string_literal(input: &str) -> IResult<&str, String> {
    let quoted = |q: char| {
        map(
            delimited(pchar(q), opt(is_not(if q == '"' { "\"" } else { "'" })), pchar(q)),
            |s: Option<&str>| s.unwrap_or_default().to_owned(),
        )
    };
    alt((quoted('"'), quoted('\'')))(input)
}

fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        terminated(recognize_float, not(peek(satisfy(is_ident_char)))),
        str::parse::<f64>,
    )(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(is_ident_char),
    ))(input)
}
