//! # Quadrature
//!
//! Composite Newton-Cotes rules on a uniform grid `x_i = a + i*h`, `h = (b - a)/n`:
//!
//! | Method               | Error order | Derivative used for step count |
//! |----------------------|-------------|--------------------------------|
//! | left rectangles      | O(h)        | f'                             |
//! | right rectangles     | O(h)        | f'                             |
//! | midpoint rectangles  | O(h^2)      | f'                             |
//! | trapezoidal          | O(h^2)      | f''                            |
//! | Simpson              | O(h^4)      | f''''                          |
//!
//! Sums are accumulated left to right in ascending index order, so results are
//! reproducible to the last bit. Simpson's rule needs an even number of subintervals;
//! an odd `n` is bumped to `n + 1` here and the adjusted value is returned in
//! [`Quadrature::n`].
//!
//! A sample where the integrand is undefined turns the scalar result into NaN (never
//! +-inf) and is counted in [`Quadrature::nonfinite_samples`]; only an integrand that is
//! undefined at every node is reported as an error.
//!
//! # Example
//! ```
//! use RustedNumLab::numerical::quadrature::{QuadMethod, integrate};
//! let f = |x: f64| x * x;
//! let result = integrate(QuadMethod::Simpson, &f, 0.0, 3.0, 5).unwrap();
//! assert_eq!(result.n, 6);
//! assert!((result.value - 9.0).abs() < 1e-12);
//! ```
use crate::numerical::errors::{NumError, check_count, check_interval, check_positive};
use crate::numerical::sampling::linspace;
use gauss_quad::GaussLegendre;
use log::{debug, info, warn};
use std::cell::Cell;
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use tabled::{builder::Builder, settings::Style};

/// number of points where |f^(k)| is sampled for the step count estimate
pub const DERIVATIVE_SAMPLES: usize = 100;
/// finite difference step for the 1st and 2nd derivative
pub const DERIVATIVE_STEP: f64 = 1e-3;
/// finite difference step for the 3rd and 4th derivative (h^4 in the denominator)
pub const HIGH_DERIVATIVE_STEP: f64 = 1e-2;
/// upper limit for the number of subintervals
pub const MAX_STEP_COUNT: usize = 100_000_000;
/// degree of the Gauss-Legendre rule used for reference values
pub const REFERENCE_DEGREE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum QuadMethod {
    #[strum(to_string = "left rectangles", serialize = "left", serialize = "left_rectangles")]
    LeftRectangles,
    #[strum(to_string = "right rectangles", serialize = "right", serialize = "right_rectangles")]
    RightRectangles,
    #[strum(
        to_string = "midpoint rectangles",
        serialize = "midpoint",
        serialize = "middle",
        serialize = "midpoint_rectangles"
    )]
    MidpointRectangles,
    #[strum(to_string = "trapezoidal", serialize = "trapezoid", serialize = "trap")]
    Trapezoidal,
    #[strum(to_string = "Simpson", serialize = "simpson")]
    Simpson,
}

impl QuadMethod {
    /// power of h in the error term of the composite rule
    pub fn error_order(&self) -> u32 {
        match self {
            QuadMethod::LeftRectangles | QuadMethod::RightRectangles => 1,
            QuadMethod::MidpointRectangles | QuadMethod::Trapezoidal => 2,
            QuadMethod::Simpson => 4,
        }
    }

    /// order of the derivative bounding the error in the step count estimate
    pub fn derivative_order(&self) -> usize {
        match self {
            QuadMethod::LeftRectangles
            | QuadMethod::RightRectangles
            | QuadMethod::MidpointRectangles => 1,
            QuadMethod::Trapezoidal => 2,
            QuadMethod::Simpson => 4,
        }
    }

    /// Number of subintervals actually used for a requested `n`.
    pub fn adjust_n(&self, n: usize) -> usize {
        match self {
            QuadMethod::Simpson if n % 2 != 0 => n + 1,
            _ => n,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            QuadMethod::LeftRectangles => "h * sum f(a + i*h), i = 0..n-1",
            QuadMethod::RightRectangles => "h * sum f(a + i*h), i = 1..n",
            QuadMethod::MidpointRectangles => "h * sum f(a + (i + 0.5)*h), i = 0..n-1",
            QuadMethod::Trapezoidal => "h * [f(a)/2 + sum f(x_i) + f(b)/2]",
            QuadMethod::Simpson => "h/3 * [f(a) + 4*sum_odd f(x_i) + 2*sum_even f(x_i) + f(b)]",
        }
    }
}

/// Result of a single quadrature
#[derive(Debug, Clone, PartialEq)]
pub struct Quadrature {
    pub method: QuadMethod,
    pub value: f64,
    /// number of subintervals used (after adjustment for Simpson's rule)
    pub n: usize,
    pub h: f64,
    pub nonfinite_samples: usize,
}

/// Counts evaluations and maps every non-finite value to NaN
struct GuardedFn<'a, F> {
    f: &'a F,
    evaluations: Cell<usize>,
    nonfinite: Cell<usize>,
}

impl<'a, F> GuardedFn<'a, F>
where
    F: Fn(f64) -> f64,
{
    fn new(f: &'a F) -> Self {
        GuardedFn {
            f,
            evaluations: Cell::new(0),
            nonfinite: Cell::new(0),
        }
    }

    fn eval(&self, x: f64) -> f64 {
        self.evaluations.set(self.evaluations.get() + 1);
        let y = (self.f)(x);
        if y.is_finite() {
            y
        } else {
            self.nonfinite.set(self.nonfinite.get() + 1);
            f64::NAN
        }
    }
}

////////////////////////////////////RAW RULES///////////////////////////////////////////////
// no validation: callers check a < b and n >= 1 (even n for Simpson)

pub(crate) fn left_sum<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64, n: usize) -> f64 {
    let h = (b - a) / n as f64;
    let mut sum = 0.0;
    for i in 0..n {
        sum += f(a + i as f64 * h);
    }
    h * sum
}

pub(crate) fn right_sum<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64, n: usize) -> f64 {
    let h = (b - a) / n as f64;
    let mut sum = 0.0;
    for i in 1..=n {
        sum += f(a + i as f64 * h);
    }
    h * sum
}

pub(crate) fn midpoint_sum<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64, n: usize) -> f64 {
    let h = (b - a) / n as f64;
    let mut sum = 0.0;
    for i in 0..n {
        sum += f(a + (i as f64 + 0.5) * h);
    }
    h * sum
}

pub(crate) fn trapezoidal_sum<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64, n: usize) -> f64 {
    let h = (b - a) / n as f64;
    let mut sum = f(a) / 2.0;
    for i in 1..n {
        sum += f(a + i as f64 * h);
    }
    sum += f(b) / 2.0;
    h * sum
}

pub(crate) fn simpson_sum<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64, n: usize) -> f64 {
    let h = (b - a) / n as f64;
    let mut odd = 0.0;
    let mut even = 0.0;
    for i in 1..n {
        let fx = f(a + i as f64 * h);
        if i % 2 == 1 {
            odd += fx;
        } else {
            even += fx;
        }
    }
    h / 3.0 * (f(a) + 4.0 * odd + 2.0 * even + f(b))
}

fn raw_rule<F: Fn(f64) -> f64>(method: QuadMethod, f: &F, a: f64, b: f64, n: usize) -> f64 {
    match method {
        QuadMethod::LeftRectangles => left_sum(f, a, b, n),
        QuadMethod::RightRectangles => right_sum(f, a, b, n),
        QuadMethod::MidpointRectangles => midpoint_sum(f, a, b, n),
        QuadMethod::Trapezoidal => trapezoidal_sum(f, a, b, n),
        QuadMethod::Simpson => simpson_sum(f, a, b, n),
    }
}

//////////////////////////////////////PUBLIC API////////////////////////////////////////////

/// Approximates the integral of `f` over [a, b] with `n` subintervals.
pub fn integrate<F>(method: QuadMethod, f: &F, a: f64, b: f64, n: usize) -> Result<Quadrature, NumError>
where
    F: Fn(f64) -> f64,
{
    check_interval(a, b)?;
    check_count("n", n, MAX_STEP_COUNT)?;
    let n_used = method.adjust_n(n);
    if n_used != n {
        info!("{}: n = {} is odd, using n = {}", method, n, n_used);
    }
    let guarded = GuardedFn::new(f);
    let value = raw_rule(method, &|x| guarded.eval(x), a, b, n_used);
    let evaluations = guarded.evaluations.get();
    let nonfinite = guarded.nonfinite.get();
    if nonfinite == evaluations {
        return Err(NumError::UndefinedEvaluation {
            x: a,
            message: format!("all {} samples on [{}, {}] are non-finite", evaluations, a, b),
        });
    }
    if nonfinite > 0 {
        warn!(
            "{}: {} of {} samples are non-finite, result is NaN",
            method, nonfinite, evaluations
        );
    }
    debug!("{}: n = {}, value = {}", method, n_used, value);
    Ok(Quadrature {
        method,
        value,
        n: n_used,
        h: (b - a) / n_used as f64,
        nonfinite_samples: nonfinite,
    })
}

pub fn left_rectangles<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64, n: usize) -> Result<f64, NumError> {
    integrate(QuadMethod::LeftRectangles, f, a, b, n).map(|q| q.value)
}

pub fn right_rectangles<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64, n: usize) -> Result<f64, NumError> {
    integrate(QuadMethod::RightRectangles, f, a, b, n).map(|q| q.value)
}

pub fn midpoint_rectangles<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64, n: usize) -> Result<f64, NumError> {
    integrate(QuadMethod::MidpointRectangles, f, a, b, n).map(|q| q.value)
}

pub fn trapezoidal<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64, n: usize) -> Result<f64, NumError> {
    integrate(QuadMethod::Trapezoidal, f, a, b, n).map(|q| q.value)
}

pub fn simpson<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64, n: usize) -> Result<f64, NumError> {
    integrate(QuadMethod::Simpson, f, a, b, n).map(|q| q.value)
}

/// Illustrative signed error estimate of the composite rule.
///
/// These are the leading error terms with the derivative factor dropped, meant for
/// display next to the result. They are not rigorous bounds: see
/// [`estimate_step_count`] for the bound that includes max |f^(k)|.
pub fn theoretical_error(method: QuadMethod, a: f64, b: f64, n: usize) -> Result<f64, NumError> {
    check_interval(a, b)?;
    check_count("n", n, MAX_STEP_COUNT)?;
    let n = method.adjust_n(n);
    let len = b - a;
    let h = len / n as f64;
    let err = match method {
        QuadMethod::LeftRectangles => len * h / 2.0,
        QuadMethod::RightRectangles => -len * h / 2.0,
        QuadMethod::MidpointRectangles => len * h.powi(2) / 24.0,
        QuadMethod::Trapezoidal => -len * h.powi(2) / 12.0,
        QuadMethod::Simpson => -len * h.powi(4) / 180.0,
    };
    Ok(err)
}

/// Runge estimate |I_n - I_2n|
pub fn runge_error<F>(method: QuadMethod, f: &F, a: f64, b: f64, n: usize) -> Result<f64, NumError>
where
    F: Fn(f64) -> f64,
{
    let coarse = integrate(method, f, a, b, n)?;
    let fine = integrate(method, f, a, b, 2 * coarse.n)?;
    Ok((coarse.value - fine.value).abs())
}

/// Central finite difference approximation of f^(order)(x), order 1..=4
fn finite_difference<F: Fn(f64) -> f64>(f: &F, x: f64, order: usize) -> f64 {
    match order {
        1 => {
            let h = DERIVATIVE_STEP;
            (f(x + h) - f(x - h)) / (2.0 * h)
        }
        2 => {
            let h = DERIVATIVE_STEP;
            (f(x + h) - 2.0 * f(x) + f(x - h)) / (h * h)
        }
        3 => {
            let h = HIGH_DERIVATIVE_STEP;
            (f(x + 2.0 * h) - 2.0 * f(x + h) + 2.0 * f(x - h) - f(x - 2.0 * h)) / (2.0 * h.powi(3))
        }
        _ => {
            let h = HIGH_DERIVATIVE_STEP;
            (f(x + 2.0 * h) - 4.0 * f(x + h) + 6.0 * f(x) - 4.0 * f(x - h) + f(x - 2.0 * h))
                / h.powi(4)
        }
    }
}

/// max |f^(order)| over [`DERIVATIVE_SAMPLES`] equally spaced points of [a, b]
pub fn max_derivative<F>(f: &F, a: f64, b: f64, order: usize) -> Result<f64, NumError>
where
    F: Fn(f64) -> f64,
{
    check_interval(a, b)?;
    if !(1..=4).contains(&order) {
        return Err(NumError::invalid_domain(
            "order",
            format!("must be between 1 and 4, got {}", order),
        ));
    }
    let mut max: Option<f64> = None;
    for x in linspace(a, b, DERIVATIVE_SAMPLES) {
        let d = finite_difference(f, x, order).abs();
        if d.is_finite() {
            max = Some(max.map_or(d, |m: f64| m.max(d)));
        }
    }
    max.ok_or_else(|| NumError::UndefinedEvaluation {
        x: a,
        message: format!("derivative of order {} is undefined at every sample", order),
    })
}

/// Smallest `n` for which the theoretical error bound of `method` does not exceed `epsilon`.
///
/// The bound uses the maximum of the relevant derivative sampled on a grid, so the result
/// is an approximate upper estimate, not a guarantee. Never below 1; even for Simpson.
/// The Simpson formula scales with (b - a)^4, so for b - a > 1 the result can fall
/// short of the requested precision.
pub fn estimate_step_count<F>(method: QuadMethod, f: &F, a: f64, b: f64, epsilon: f64) -> Result<usize, NumError>
where
    F: Fn(f64) -> f64,
{
    check_interval(a, b)?;
    check_positive("epsilon", epsilon)?;
    let m = max_derivative(f, a, b, method.derivative_order())?;
    let len = b - a;
    let raw = match method {
        QuadMethod::LeftRectangles
        | QuadMethod::RightRectangles
        | QuadMethod::MidpointRectangles => len.powi(2) * m / (2.0 * epsilon),
        QuadMethod::Trapezoidal => (len.powi(3) * m / (12.0 * epsilon)).sqrt(),
        QuadMethod::Simpson => (len.powi(4) * m / (180.0 * epsilon)).powf(0.25),
    };
    let raw = raw.ceil();
    if raw > MAX_STEP_COUNT as f64 {
        return Err(NumError::invalid_domain(
            "epsilon",
            format!(
                "= {} needs about {} subintervals for {}, more than {}",
                epsilon, raw, method, MAX_STEP_COUNT
            ),
        ));
    }
    let n = method.adjust_n((raw as usize).max(1));
    info!(
        "{}: max|f^({})| = {:.6e}, n = {} for epsilon = {:e}",
        method,
        method.derivative_order(),
        m,
        n,
        epsilon
    );
    Ok(n)
}

/// High-order Gauss-Legendre value of the integral, used as "exact" value in reports.
pub fn reference_value<F>(f: &F, a: f64, b: f64) -> Result<f64, NumError>
where
    F: Fn(f64) -> f64,
{
    check_interval(a, b)?;
    let quad = GaussLegendre::new(REFERENCE_DEGREE).map_err(|e| NumError::UndefinedEvaluation {
        x: a,
        message: format!("failed to create Gauss-Legendre rule: {:?}", e),
    })?;
    Ok(quad.integrate(a, b, |x| f(x)))
}

////////////////////////////////////////REPORT//////////////////////////////////////////////

/// One line of a method comparison
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSummary {
    pub quadrature: Quadrature,
    pub theoretical_error: f64,
    pub runge_error: f64,
    /// |value - exact| when an exact value is known
    pub actual_error: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureReport {
    pub a: f64,
    pub b: f64,
    pub exact: Option<f64>,
    pub rows: Vec<MethodSummary>,
}

impl QuadratureReport {
    pub fn row(&self, method: QuadMethod) -> Option<&MethodSummary> {
        self.rows.iter().find(|r| r.quadrature.method == method)
    }

    pub fn to_table(&self) -> String {
        let mut records = vec![vec![
            "method".to_string(),
            "n".to_string(),
            "value".to_string(),
            "theoretical error".to_string(),
            "Runge error".to_string(),
            "actual error".to_string(),
        ]];
        for row in &self.rows {
            records.push(vec![
                row.quadrature.method.to_string(),
                row.quadrature.n.to_string(),
                format!("{:.10}", row.quadrature.value),
                format!("{:.3e}", row.theoretical_error),
                format!("{:.3e}", row.runge_error),
                row.actual_error
                    .map_or("-".to_string(), |e| format!("{:.3e}", e)),
            ]);
        }
        let mut table = Builder::from(records).build();
        table.with(Style::modern_rounded());
        table.to_string()
    }
}

impl fmt::Display for QuadratureReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "integral over [{}, {}]", self.a, self.b)?;
        if let Some(exact) = self.exact {
            writeln!(f, "exact value: {}", exact)?;
        }
        write!(f, "{}", self.to_table())
    }
}

/// Runs `methods` with the same `n` and collects value, error estimates and actual error.
pub fn compare_methods<F>(
    methods: &[QuadMethod],
    f: &F,
    a: f64,
    b: f64,
    n: usize,
    exact: Option<f64>,
) -> Result<QuadratureReport, NumError>
where
    F: Fn(f64) -> f64,
{
    check_interval(a, b)?;
    check_count("n", n, MAX_STEP_COUNT)?;
    let mut rows = Vec::with_capacity(methods.len());
    for &method in methods {
        let quadrature = integrate(method, f, a, b, n)?;
        let theoretical_error = theoretical_error(method, a, b, n)?;
        let runge_error = runge_error(method, f, a, b, n)?;
        let actual_error = exact.map(|e| (quadrature.value - e).abs());
        rows.push(MethodSummary {
            quadrature,
            theoretical_error,
            runge_error,
            actual_error,
        });
    }
    Ok(QuadratureReport { a, b, exact, rows })
}

/// [`compare_methods`] over every available rule
pub fn compare_all_methods<F>(f: &F, a: f64, b: f64, n: usize, exact: Option<f64>) -> Result<QuadratureReport, NumError>
where
    F: Fn(f64) -> f64,
{
    let methods: Vec<QuadMethod> = QuadMethod::iter().collect();
    compare_methods(&methods, f, a, b, n, exact)
}
