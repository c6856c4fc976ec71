use std::fmt;

/// Error types shared by quadrature, ODE and interpolation routines.
///
/// Shape violations (`InvalidDomain`, `DegenerateInterpolation`, `EmptyNodeSet`) are
/// detected before the user function is evaluated even once. `UndefinedEvaluation` is
/// returned only when an aggregate value was requested and not a single sample of the
/// function was finite; isolated bad samples are tolerated (skipped in point series,
/// NaN in scalar results).
#[derive(Debug, Clone, PartialEq)]
pub enum NumError {
    InvalidDomain { argument: String, message: String },
    UndefinedEvaluation { x: f64, message: String },
    DegenerateInterpolation { x: f64, first: usize, second: usize },
    EmptyNodeSet,
}

impl NumError {
    pub fn invalid_domain(argument: &str, message: impl Into<String>) -> Self {
        NumError::InvalidDomain {
            argument: argument.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for NumError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NumError::InvalidDomain { argument, message } => {
                write!(f, "Invalid domain: argument '{}' {}", argument, message)
            }
            NumError::UndefinedEvaluation { x, message } => {
                write!(f, "Function is undefined near x = {}: {}", x, message)
            }
            NumError::DegenerateInterpolation { x, first, second } => write!(
                f,
                "Degenerate interpolation: nodes {} and {} share the same x = {}",
                first, second, x
            ),
            NumError::EmptyNodeSet => write!(f, "Interpolation needs at least one node"),
        }
    }
}

impl std::error::Error for NumError {}

/// a < b, both finite
pub(crate) fn check_interval(a: f64, b: f64) -> Result<(), NumError> {
    if !a.is_finite() {
        return Err(NumError::invalid_domain("a", format!("must be finite, got {}", a)));
    }
    if !b.is_finite() {
        return Err(NumError::invalid_domain("b", format!("must be finite, got {}", b)));
    }
    if a >= b {
        return Err(NumError::invalid_domain(
            "a",
            format!("must be less than b, got a = {} and b = {}", a, b),
        ));
    }
    Ok(())
}

pub(crate) fn check_positive(argument: &str, value: f64) -> Result<(), NumError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(NumError::invalid_domain(
            argument,
            format!("must be a positive finite number, got {}", value),
        ));
    }
    Ok(())
}

pub(crate) fn check_count(argument: &str, value: usize, max: usize) -> Result<(), NumError> {
    if value == 0 {
        return Err(NumError::invalid_domain(argument, "must be at least 1, got 0"));
    }
    if value > max {
        return Err(NumError::invalid_domain(
            argument,
            format!("must not exceed {}, got {}", max, value),
        ));
    }
    Ok(())
}
