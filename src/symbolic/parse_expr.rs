//! Parser of user formulas into [`Expr`].
//!
//! Grammar, lowest precedence first:
//! ```text
//! expr  := term (("+" | "-") term)*
//! term  := unary (("*" | "/") unary)*
//! unary := ("-" | "+") unary | power
//! power := atom (("^" | "**") unary)?          right-associative
//! atom  := number | name "(" expr ")" | name | "(" expr ")"
//! ```
//! so `-x^2` is `-(x^2)` and `2^3^2` is `2^9`. `pi` and `e` are constants.
//!
//! # Example
//! ```
//! use RustedNumLab::symbolic::symbolic_engine::Expr;
//! let expr = Expr::parse_expression("x^2 * ln(x + y)").unwrap();
//! let f = expr.lambdify2D("x", "y").unwrap();
//! assert!((f(2.0, -1.0) - 0.0).abs() < 1e-12);
//! ```
use crate::symbolic::symbolic_engine::{Expr, ExprError};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace0, one_of},
    combinator::{all_consuming, map, map_res, opt, recognize},
    error::{Error, ErrorKind},
    multi::many0,
    sequence::{delimited, pair, preceded},
};

fn ws<'a, O, P>(inner: P) -> impl Parser<&'a str, Output = O, Error = Error<&'a str>>
where
    P: Parser<&'a str, Output = O, Error = Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

/// 12, 1.5, .5, 3., 1e-3, 2.5E+4
fn number(input: &str) -> IResult<&str, f64> {
    let mantissa = alt((
        recognize((digit1, opt((char('.'), digit0)))),
        recognize((char('.'), digit1)),
    ));
    let exponent = opt((one_of("eE"), opt(one_of("+-")), digit1));
    map_res(recognize((mantissa, exponent)), |s: &str| s.parse::<f64>()).parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

/// deepest allowed nesting of brackets, calls, signs and exponents
pub const MAX_NESTING: usize = 100;

/// function call, named constant or variable
fn name_or_call(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (rest, name) = identifier(input)?;
    let (after_ws, _) = multispace0(rest)?;
    if after_ws.starts_with('(') {
        let (rest, arg) = delimited(char('('), |i| expr(i, depth + 1), ws(char(')'))).parse(after_ws)?;
        match Expr::apply_function(name, arg) {
            Ok(call) => Ok((rest, call)),
            // unknown name: stop here, no other branch can succeed
            Err(_) => Err(nom::Err::Failure(Error::new(input, ErrorKind::Verify))),
        }
    } else if let Some(value) = Expr::named_constant(name) {
        Ok((rest, Expr::Const(value)))
    } else {
        Ok((rest, Expr::var(name)))
    }
}

fn atom(input: &str, depth: usize) -> IResult<&str, Expr> {
    ws(alt((
        map(number, Expr::Const),
        |i| name_or_call(i, depth),
        delimited(char('('), |i| expr(i, depth + 1), ws(char(')'))),
    )))
    .parse(input)
}

fn power(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, base) = atom(input, depth)?;
    let (input, exponent) =
        opt(preceded(ws(alt((tag("**"), tag("^")))), |i| unary(i, depth + 1))).parse(input)?;
    Ok(match exponent {
        Some(exponent) => (input, Expr::Pow(Box::new(base), Box::new(exponent))),
        None => (input, base),
    })
}

/// every recursive path passes through here, so the nesting limit is checked once
fn unary(input: &str, depth: usize) -> IResult<&str, Expr> {
    if depth > MAX_NESTING {
        return Err(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge)));
    }
    alt((
        map(preceded(ws(char('-')), |i| unary(i, depth + 1)), |e| match e {
            Expr::Const(c) => Expr::Const(-c),
            e => Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(e)),
        }),
        preceded(ws(char('+')), |i| unary(i, depth + 1)),
        |i| power(i, depth),
    ))
    .parse(input)
}

fn term(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, first) = unary(input, depth)?;
    let (input, rest) = many0((ws(one_of("*/")), |i| unary(i, depth))).parse(input)?;
    let folded = rest.into_iter().fold(first, |acc, (op, rhs)| match op {
        '*' => Expr::Mul(Box::new(acc), Box::new(rhs)),
        _ => Expr::Div(Box::new(acc), Box::new(rhs)),
    });
    Ok((input, folded))
}

fn expr(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, first) = term(input, depth)?;
    let (input, rest) = many0((ws(one_of("+-")), |i| term(i, depth))).parse(input)?;
    let folded = rest.into_iter().fold(first, |acc, (op, rhs)| match op {
        '+' => Expr::Add(Box::new(acc), Box::new(rhs)),
        _ => Expr::Sub(Box::new(acc), Box::new(rhs)),
    });
    Ok((input, folded))
}

impl Expr {
    /// Parses a formula; the whole string must be a single expression.
    pub fn parse_expression(input: &str) -> Result<Expr, ExprError> {
        let parse_error = |message: String| ExprError::Parse {
            input: input.to_string(),
            message,
        };
        match all_consuming(delimited(multispace0, |i| expr(i, 0), multispace0)).parse(input) {
            Ok((_, parsed)) => Ok(parsed),
            Err(nom::Err::Failure(e)) if e.code == ErrorKind::TooLarge => Err(parse_error(format!(
                "expression is nested deeper than {} levels",
                MAX_NESTING
            ))),
            Err(nom::Err::Failure(e)) if e.code == ErrorKind::Verify => {
                let name = identifier(e.input).map(|(_, n)| n).unwrap_or(e.input);
                Err(ExprError::UnknownFunction(name.to_string()))
            }
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                if e.input.trim().is_empty() {
                    Err(parse_error("unexpected end of expression".to_string()))
                } else {
                    Err(parse_error(format!("unexpected input at '{}'", e.input)))
                }
            }
            Err(nom::Err::Incomplete(_)) => Err(parse_error("incomplete expression".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{E, PI};

    fn eval1(input: &str, x: f64) -> f64 {
        Expr::parse_expression(input).unwrap().lambdify1D("x").unwrap()(x)
    }

    #[test]
    fn test_number() {
        assert_eq!(number("12+x"), Ok(("+x", 12.0)));
        assert_eq!(number("1.5e-3"), Ok(("", 1.5e-3)));
        assert_eq!(number(".5"), Ok(("", 0.5)));
        assert_eq!(number("3."), Ok(("", 3.0)));
        // a dangling exponent marker is not part of the number
        assert_eq!(number("2e"), Ok(("e", 2.0)));
        assert!(number("x").is_err());
    }

    #[test]
    fn test_precedence() {
        assert_relative_eq!(eval1("1 + 2 * 3", 0.0), 7.0);
        assert_relative_eq!(eval1("(1 + 2) * 3", 0.0), 9.0);
        assert_relative_eq!(eval1("8 / 4 / 2", 0.0), 1.0);
        assert_relative_eq!(eval1("10 - 4 - 3", 0.0), 3.0);
        assert_relative_eq!(eval1("2^3^2", 0.0), 512.0);
        assert_relative_eq!(eval1("2**3", 0.0), 8.0);
    }

    #[test]
    fn test_unary_minus() {
        assert_relative_eq!(eval1("-x^2", 3.0), -9.0);
        assert_relative_eq!(eval1("(-x)^2", 3.0), 9.0);
        assert_relative_eq!(eval1("2^-1", 0.0), 0.5);
        assert_relative_eq!(eval1("x * -2", 1.5), -3.0);
        assert_eq!(Expr::parse_expression("-2").unwrap(), Expr::Const(-2.0));
    }

    #[test]
    fn test_functions_and_constants() {
        assert_relative_eq!(eval1("sin(x)/x", 1.0), 1.0_f64.sin());
        assert_relative_eq!(eval1("exp(ln(x))", 2.5), 2.5, epsilon = 1e-12);
        assert_relative_eq!(eval1("tg(pi/4)", 0.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(eval1("arctg(1) * 4", 0.0), PI, epsilon = 1e-12);
        assert_relative_eq!(eval1("e", 0.0), E);
        assert_relative_eq!(eval1("sqrt(abs(x))", -16.0), 4.0);
        assert_relative_eq!(eval1("cos (x)", 0.0), 1.0);
    }

    #[test]
    fn test_two_variables() {
        let expr = Expr::parse_expression("y - x*y + x_1").unwrap();
        let vars: Vec<String> = expr.variables().into_iter().collect();
        assert_eq!(vars, vec!["x", "x_1", "y"]);
        let f = expr.lambdify(&["x", "y", "x_1"]).unwrap();
        assert_relative_eq!(f(&[2.0, 3.0, 1.0]), -2.0);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Expr::parse_expression("gamma(x)"),
            Err(ExprError::UnknownFunction(name)) if name == "gamma"
        ));
        assert!(matches!(
            Expr::parse_expression("x + sinh(x)"),
            Err(ExprError::UnknownFunction(name)) if name == "sinh"
        ));
        assert!(matches!(Expr::parse_expression(""), Err(ExprError::Parse { .. })));
        assert!(matches!(Expr::parse_expression("(x + 1"), Err(ExprError::Parse { .. })));
        assert!(matches!(Expr::parse_expression("x +"), Err(ExprError::Parse { .. })));
        assert!(matches!(Expr::parse_expression("2x"), Err(ExprError::Parse { .. })));
        assert!(matches!(
            Expr::parse_expression("x; rm -rf /"),
            Err(ExprError::Parse { .. })
        ));
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let moderate = format!("{}x{}", "(".repeat(50), ")".repeat(50));
        assert_relative_eq!(eval1(&moderate, 2.0), 2.0);
        let deep = [
            format!("{}x{}", "(".repeat(10_000), ")".repeat(10_000)),
            format!("{}x{}", "sin(".repeat(10_000), ")".repeat(10_000)),
            format!("{}x", "-".repeat(10_000)),
            format!("{}2", "2^".repeat(10_000)),
        ];
        for input in &deep {
            match Expr::parse_expression(input) {
                Err(ExprError::Parse { message, .. }) => assert!(message.contains("nested")),
                other => panic!("unexpected {:?}", other.map(|_| ())),
            }
        }
    }

    #[test]
    fn test_undefined_values_are_nan() {
        assert!(eval1("ln(x)", -1.0).is_nan());
        assert!(eval1("1/x", 0.0).is_infinite());
    }
}
