//! # Symbolic Engine Module
//!
//! Expression tree for formulas typed by a student or a task author ("sin(x)/x",
//! "x + y^2", ...). Strings are never executed: they are parsed into [`Expr`] by
//! [`crate::symbolic::parse_expr`] and turned into ordinary Rust closures by the
//! `lambdify*` methods, so the numerical code only ever sees `Fn(f64) -> f64`.
//!
//! ## Main Structures and Methods
//! - `Expr` - recursive AST over `Var`, `Const`, arithmetic and elementary functions
//! - `parse_expression(&str)` - parse a user formula
//! - `lambdify(&[vars])` - closure over a slice of argument values
//! - `lambdify1D(var)` / `lambdify2D(x, y)` - closures for quadrature and ODE right-hand sides
//! - `variables()` - names of free variables
//!
//! Trigonometric functions follow the mathematical notation used in the course
//! (`tg`, `ctg`, `arctg`), `tan`/`cot`/`atan` are accepted as input aliases.
#![allow(non_camel_case_types)]

use std::collections::BTreeSet;
use std::f64::consts::{E, PI};
use std::fmt;

/// Closure produced from an expression: arguments in the order given to `lambdify`
pub type Lambdified = Box<dyn Fn(&[f64]) -> f64 + Send + Sync>;
pub type Lambdified1D = Box<dyn Fn(f64) -> f64 + Send + Sync>;
pub type Lambdified2D = Box<dyn Fn(f64, f64) -> f64 + Send + Sync>;

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Symbolic variable with a name (e.g., "x", "y")
    Var(String),
    /// Numerical constant value
    Const(f64),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    /// base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    Exp(Box<Expr>),
    /// natural logarithm
    Ln(Box<Expr>),
    sin(Box<Expr>),
    cos(Box<Expr>),
    tg(Box<Expr>),
    ctg(Box<Expr>),
    arcsin(Box<Expr>),
    arccos(Box<Expr>),
    arctg(Box<Expr>),
    arcctg(Box<Expr>),
    sqrt(Box<Expr>),
    abs(Box<Expr>),
}

/// Error types of the expression front end
#[derive(Debug, Clone, PartialEq)]
pub enum ExprError {
    Parse { input: String, message: String },
    UnknownVariable(String),
    UnknownFunction(String),
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExprError::Parse { input, message } => {
                write!(f, "Cannot parse expression '{}': {}", input, message)
            }
            ExprError::UnknownVariable(name) => {
                write!(f, "Variable '{}' is not an argument of the function", name)
            }
            ExprError::UnknownFunction(name) => write!(f, "Unknown function '{}'", name),
        }
    }
}

impl std::error::Error for ExprError {}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            Expr::Sub(lhs, rhs) => write!(f, "({} - {})", lhs, rhs),
            Expr::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
            Expr::Div(lhs, rhs) => write!(f, "({} / {})", lhs, rhs),
            Expr::Pow(base, exp) => write!(f, "({}^{})", base, exp),
            Expr::Exp(expr) => write!(f, "exp({})", expr),
            Expr::Ln(expr) => write!(f, "ln({})", expr),
            Expr::sin(expr) => write!(f, "sin({})", expr),
            Expr::cos(expr) => write!(f, "cos({})", expr),
            Expr::tg(expr) => write!(f, "tg({})", expr),
            Expr::ctg(expr) => write!(f, "ctg({})", expr),
            Expr::arcsin(expr) => write!(f, "arcsin({})", expr),
            Expr::arccos(expr) => write!(f, "arccos({})", expr),
            Expr::arctg(expr) => write!(f, "arctg({})", expr),
            Expr::arcctg(expr) => write!(f, "arcctg({})", expr),
            Expr::sqrt(expr) => write!(f, "sqrt({})", expr),
            Expr::abs(expr) => write!(f, "abs({})", expr),
        }
    }
}

impl Expr {
    pub fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    /// Builds `name(arg)` for a function name as written by the user.
    pub fn apply_function(name: &str, arg: Expr) -> Result<Expr, ExprError> {
        let arg = Box::new(arg);
        let expr = match name {
            "exp" => Expr::Exp(arg),
            "ln" | "log" => Expr::Ln(arg),
            "sin" => Expr::sin(arg),
            "cos" => Expr::cos(arg),
            "tg" | "tan" => Expr::tg(arg),
            "ctg" | "cot" => Expr::ctg(arg),
            "arcsin" | "asin" => Expr::arcsin(arg),
            "arccos" | "acos" => Expr::arccos(arg),
            "arctg" | "atan" | "arctan" => Expr::arctg(arg),
            "arcctg" | "acot" | "arccot" => Expr::arcctg(arg),
            "sqrt" => Expr::sqrt(arg),
            "abs" => Expr::abs(arg),
            _ => return Err(ExprError::UnknownFunction(name.to_string())),
        };
        Ok(expr)
    }

    /// Named constants recognised by the parser
    pub fn named_constant(name: &str) -> Option<f64> {
        match name {
            "pi" | "PI" => Some(PI),
            "e" => Some(E),
            _ => None,
        }
    }

    /// Names of all free variables, sorted
    pub fn variables(&self) -> BTreeSet<String> {
        let mut vars = BTreeSet::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables(&self, vars: &mut BTreeSet<String>) {
        match self {
            Expr::Var(name) => {
                vars.insert(name.clone());
            }
            Expr::Const(_) => {}
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => {
                lhs.collect_variables(vars);
                rhs.collect_variables(vars);
            }
            Expr::Exp(e)
            | Expr::Ln(e)
            | Expr::sin(e)
            | Expr::cos(e)
            | Expr::tg(e)
            | Expr::ctg(e)
            | Expr::arcsin(e)
            | Expr::arccos(e)
            | Expr::arctg(e)
            | Expr::arcctg(e)
            | Expr::sqrt(e)
            | Expr::abs(e) => e.collect_variables(vars),
        }
    }

    /// Turns the expression into a closure of `args.len()` arguments, given in the order of `args`.
    ///
    /// Fails if the expression has a free variable that is not in `args`. Undefined
    /// operations (ln of a negative number, division by zero) produce NaN or infinity
    /// at evaluation time, never a panic.
    pub fn lambdify(&self, args: &[&str]) -> Result<Lambdified, ExprError> {
        if let Some(unknown) = self.variables().into_iter().find(|v| !args.contains(&v.as_str())) {
            return Err(ExprError::UnknownVariable(unknown));
        }
        Ok(self.compile(args))
    }

    /// variables are known to be bound here
    fn compile(&self, args: &[&str]) -> Lambdified {
        match self {
            Expr::Var(name) => {
                let index = args.iter().position(|a| a == name).unwrap_or(0);
                Box::new(move |values: &[f64]| values[index])
            }
            Expr::Const(val) => {
                let val = *val;
                Box::new(move |_| val)
            }
            Expr::Add(lhs, rhs) => {
                let (l, r) = (lhs.compile(args), rhs.compile(args));
                Box::new(move |v| l(v) + r(v))
            }
            Expr::Sub(lhs, rhs) => {
                let (l, r) = (lhs.compile(args), rhs.compile(args));
                Box::new(move |v| l(v) - r(v))
            }
            Expr::Mul(lhs, rhs) => {
                let (l, r) = (lhs.compile(args), rhs.compile(args));
                Box::new(move |v| l(v) * r(v))
            }
            Expr::Div(lhs, rhs) => {
                let (l, r) = (lhs.compile(args), rhs.compile(args));
                Box::new(move |v| l(v) / r(v))
            }
            Expr::Pow(base, exp) => match exp.as_ref() {
                // integer powers of negative bases are defined
                Expr::Const(p) if p.fract() == 0.0 && p.abs() <= i32::MAX as f64 => {
                    let p = *p as i32;
                    let b = base.compile(args);
                    Box::new(move |v| b(v).powi(p))
                }
                _ => {
                    let (b, e) = (base.compile(args), exp.compile(args));
                    Box::new(move |v| b(v).powf(e(v)))
                }
            },
            Expr::Exp(e) => Self::unary(e, args, f64::exp),
            Expr::Ln(e) => Self::unary(e, args, f64::ln),
            Expr::sin(e) => Self::unary(e, args, f64::sin),
            Expr::cos(e) => Self::unary(e, args, f64::cos),
            Expr::tg(e) => Self::unary(e, args, f64::tan),
            Expr::ctg(e) => Self::unary(e, args, |x| 1.0 / x.tan()),
            Expr::arcsin(e) => Self::unary(e, args, f64::asin),
            Expr::arccos(e) => Self::unary(e, args, f64::acos),
            Expr::arctg(e) => Self::unary(e, args, f64::atan),
            Expr::arcctg(e) => Self::unary(e, args, |x| PI / 2.0 - x.atan()),
            Expr::sqrt(e) => Self::unary(e, args, f64::sqrt),
            Expr::abs(e) => Self::unary(e, args, f64::abs),
        }
    }

    fn unary(inner: &Expr, args: &[&str], op: fn(f64) -> f64) -> Lambdified {
        let inner = inner.compile(args);
        Box::new(move |v| op(inner(v)))
    }

    /// Function of one variable; constants are accepted as constant functions.
    pub fn lambdify1D(&self, var: &str) -> Result<Lambdified1D, ExprError> {
        let f = self.lambdify(&[var])?;
        Ok(Box::new(move |x| f(&[x])))
    }

    /// Function of two variables, e.g. the right-hand side f(x, y) of y' = f(x, y).
    pub fn lambdify2D(&self, x: &str, y: &str) -> Result<Lambdified2D, ExprError> {
        let f = self.lambdify(&[x, y])?;
        Ok(Box::new(move |a, b| f(&[a, b])))
    }

    /// Evaluates with the given variable values
    pub fn eval(&self, args: &[&str], values: &[f64]) -> Result<f64, ExprError> {
        if values.len() != args.len() {
            return Err(ExprError::Parse {
                input: self.to_string(),
                message: format!("{} values for {} arguments", values.len(), args.len()),
            });
        }
        Ok(self.lambdify(args)?(values))
    }
}
