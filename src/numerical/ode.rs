//! Fixed-step explicit integrators for a scalar first-order ODE y' = f(x, y).
//!
//! All methods start from (x0, y0) and step while `x < x_end - h/2`; the half step
//! absorbs the floating-point drift of `x += h` at the right boundary.
//!
//! | Method                  | Update                                        | Order |
//! |-------------------------|-----------------------------------------------|-------|
//! | Euler                   | y += h f(x, y)                                | 1     |
//! | improved Euler (Cauchy) | y += h f(x + h/2, y + h/2 f(x, y))            | 2     |
//! | Runge-Kutta 4           | y += h/6 (k1 + 2 k2 + 2 k3 + k4)              | 4     |
//!
//! When f does not depend on y the problem reduces to a quadrature and the exact
//! solution is computed with the trapezoidal rule, see [`exact_solution_by_quadrature`].
//! ```
//! use RustedNumLab::numerical::ode::{OdeMethod, solve_ode};
//! let f = |_x: f64, y: f64| y;
//! let solution = solve_ode(OdeMethod::RungeKutta4, &f, 0.0, 1.0, 1.0, 0.01).unwrap();
//! let last = solution.last().unwrap();
//! assert!((last.y - std::f64::consts::E).abs() < 1e-6);
//! ```
use crate::Utils::logger::save_columns_to_csv;
use crate::numerical::errors::{NumError, check_positive};
use crate::numerical::quadrature::trapezoidal_sum;
use crate::numerical::sampling::SampledPoint;
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use std::fmt;
use std::path::Path;
use strum_macros::{Display, EnumIter, EnumString};
use tabled::{builder::Builder, settings::Style};

/// perturbation of y in the independence test
pub const INDEPENDENCE_DELTA: f64 = 1e-6;
/// |f(x, y) - f(x, y + delta)| below this means f does not depend on y
pub const INDEPENDENCE_TOLERANCE: f64 = 1e-10;
/// subintervals of the trapezoidal rule used for the exact solution
pub const EXACT_SOLUTION_STEPS: usize = 1000;
/// refuse grids longer than this
pub const MAX_STEPS: usize = 10_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum OdeMethod {
    #[strum(to_string = "Euler", serialize = "euler")]
    Euler,
    #[strum(
        to_string = "improved Euler",
        serialize = "improved_euler",
        serialize = "cauchy",
        serialize = "heun"
    )]
    ImprovedEuler,
    #[strum(
        to_string = "Runge-Kutta 4",
        serialize = "rk4",
        serialize = "runge_kutta",
        serialize = "runge_kutta4"
    )]
    RungeKutta4,
}

impl OdeMethod {
    pub fn order(&self) -> u32 {
        match self {
            OdeMethod::Euler => 1,
            OdeMethod::ImprovedEuler => 2,
            OdeMethod::RungeKutta4 => 4,
        }
    }

    /// one step from (x, y) with step h
    pub fn step<F>(&self, f: &F, x: f64, y: f64, h: f64) -> f64
    where
        F: Fn(f64, f64) -> f64,
    {
        match self {
            OdeMethod::Euler => y + h * f(x, y),
            OdeMethod::ImprovedEuler => {
                let k1 = f(x, y);
                y + h * f(x + h / 2.0, y + h / 2.0 * k1)
            }
            OdeMethod::RungeKutta4 => {
                let k1 = f(x, y);
                let k2 = f(x + h / 2.0, y + h / 2.0 * k1);
                let k3 = f(x + h / 2.0, y + h / 2.0 * k2);
                let k4 = f(x + h, y + h * k3);
                y + h / 6.0 * (k1 + 2.0 * k2 + 2.0 * k3 + k4)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolverStatus {
    Finished,
    /// a step produced a non-finite value at `at_x`; the trajectory ends before it
    Stopped { at_x: f64 },
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SolverStatus::Finished => write!(f, "finished"),
            SolverStatus::Stopped { at_x } => write!(f, "stopped at x = {}", at_x),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OdeSolution {
    pub method: OdeMethod,
    pub h: f64,
    pub x: DVector<f64>,
    pub y: DVector<f64>,
    pub status: SolverStatus,
}

impl OdeSolution {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> Vec<SampledPoint> {
        self.x
            .iter()
            .zip(self.y.iter())
            .map(|(&x, &y)| SampledPoint::new(x, y))
            .collect()
    }

    pub fn last(&self) -> Option<SampledPoint> {
        let n = self.len();
        if n == 0 {
            None
        } else {
            Some(SampledPoint::new(self.x[n - 1], self.y[n - 1]))
        }
    }

    /// max |y_i - exact(x_i)| over the grid, ignoring points where `exact` is undefined
    pub fn max_abs_error<E>(&self, exact: &E) -> f64
    where
        E: Fn(f64) -> f64,
    {
        self.x
            .iter()
            .zip(self.y.iter())
            .map(|(&x, &y)| (y - exact(x)).abs())
            .filter(|e| e.is_finite())
            .fold(0.0, f64::max)
    }

    pub fn save_to_csv(&self, path: &Path) -> Result<(), csv::Error> {
        let columns = DMatrix::from_column_slice(self.len(), 1, self.y.as_slice());
        save_columns_to_csv(&self.x, &columns, &["x", "y"], path)
    }
}

fn check_problem(x0: f64, y0: f64, x_end: f64, h: f64) -> Result<(), NumError> {
    if !x0.is_finite() {
        return Err(NumError::invalid_domain("x0", format!("must be finite, got {}", x0)));
    }
    if !y0.is_finite() {
        return Err(NumError::invalid_domain("y0", format!("must be finite, got {}", y0)));
    }
    if !(x_end.is_finite() && x_end > x0) {
        return Err(NumError::invalid_domain(
            "x_end",
            format!("must be finite and greater than x0 = {}, got {}", x0, x_end),
        ));
    }
    check_positive("h", h)?;
    let steps = (x_end - x0) / h;
    if steps > MAX_STEPS as f64 {
        return Err(NumError::invalid_domain(
            "h",
            format!("= {} gives about {:.0} steps, more than {}", h, steps, MAX_STEPS),
        ));
    }
    Ok(())
}

/// Integrates y' = f(x, y), y(x0) = y0 from x0 to x_end with the fixed step h.
pub fn solve_ode<F>(method: OdeMethod, f: &F, x0: f64, y0: f64, x_end: f64, h: f64) -> Result<OdeSolution, NumError>
where
    F: Fn(f64, f64) -> f64,
{
    check_problem(x0, y0, x_end, h)?;
    let capacity = ((x_end - x0) / h).ceil() as usize + 1;
    let mut xs = Vec::with_capacity(capacity);
    let mut ys = Vec::with_capacity(capacity);
    xs.push(x0);
    ys.push(y0);
    let mut x = x0;
    let mut y = y0;
    let mut step = 0usize;
    let mut status = SolverStatus::Finished;
    // grid points are x0 + i*h, so the loop advances even when x + h rounds back to x
    while x < x_end - h / 2.0 {
        let y_next = method.step(f, x, y, h);
        step += 1;
        x = x0 + step as f64 * h;
        if !y_next.is_finite() {
            warn!("{}: solution is undefined at x = {}, integration stopped", method, x);
            status = SolverStatus::Stopped { at_x: x };
            break;
        }
        y = y_next;
        xs.push(x);
        ys.push(y);
    }
    if xs.len() == 1 && status == SolverStatus::Finished {
        warn!("{}: step h = {} is longer than the interval, no steps made", method, h);
    }
    debug!("{}: {} points, status {}", method, xs.len(), status);
    Ok(OdeSolution {
        method,
        h,
        x: DVector::from_vec(xs),
        y: DVector::from_vec(ys),
        status,
    })
}

pub fn euler<F: Fn(f64, f64) -> f64>(f: &F, x0: f64, y0: f64, x_end: f64, h: f64) -> Result<OdeSolution, NumError> {
    solve_ode(OdeMethod::Euler, f, x0, y0, x_end, h)
}

pub fn improved_euler<F: Fn(f64, f64) -> f64>(f: &F, x0: f64, y0: f64, x_end: f64, h: f64) -> Result<OdeSolution, NumError> {
    solve_ode(OdeMethod::ImprovedEuler, f, x0, y0, x_end, h)
}

pub fn runge_kutta4<F: Fn(f64, f64) -> f64>(f: &F, x0: f64, y0: f64, x_end: f64, h: f64) -> Result<OdeSolution, NumError> {
    solve_ode(OdeMethod::RungeKutta4, f, x0, y0, x_end, h)
}

/// True when f(x, .) looks constant near y.
///
/// A single finite-difference probe at one point: a function that is flat in y only
/// locally is reported as independent.
pub fn is_independent_of_y<F>(f: &F, x: f64, y: f64) -> bool
where
    F: Fn(f64, f64) -> f64,
{
    (f(x, y) - f(x, y + INDEPENDENCE_DELTA)).abs() < INDEPENDENCE_TOLERANCE
}

/// y0 + integral of f(t, 0) from x0 to x (trapezoidal rule, [`EXACT_SOLUTION_STEPS`] subintervals).
///
/// Only meaningful when [`is_independent_of_y`] holds. Undefined integrands give NaN.
pub fn exact_solution_by_quadrature<F>(f: &F, x0: f64, y0: f64, x: f64) -> f64
where
    F: Fn(f64, f64) -> f64,
{
    if x == x0 {
        return y0;
    }
    let g = |t: f64| f(t, 0.0);
    let integral = if x > x0 {
        trapezoidal_sum(&g, x0, x, EXACT_SOLUTION_STEPS)
    } else {
        -trapezoidal_sum(&g, x, x0, EXACT_SOLUTION_STEPS)
    };
    let value = y0 + integral;
    if value.is_finite() { value } else { f64::NAN }
}

/// [`exact_solution_by_quadrature`] at every x of `xs`, evaluated in parallel.
/// Points where the exact value is undefined are skipped.
pub fn exact_trajectory<F>(f: &F, x0: f64, y0: f64, xs: &[f64]) -> Vec<SampledPoint>
where
    F: Fn(f64, f64) -> f64 + Sync,
{
    xs.par_iter()
        .filter_map(|&x| {
            let y = exact_solution_by_quadrature(f, x0, y0, x);
            if y.is_finite() {
                Some(SampledPoint::new(x, y))
            } else {
                None
            }
        })
        .collect()
}

////////////////////////////////////////REPORT//////////////////////////////////////////////

/// Several methods on the same problem, with the exact solution when f does not depend on y
#[derive(Debug, Clone, PartialEq)]
pub struct OdeReport {
    pub solutions: Vec<OdeSolution>,
    pub exact: Option<Vec<SampledPoint>>,
}

impl OdeReport {
    pub fn solution(&self, method: OdeMethod) -> Option<&OdeSolution> {
        self.solutions.iter().find(|s| s.method == method)
    }

    /// exact value at `x` if it was computed
    fn exact_at(&self, x: f64) -> Option<f64> {
        self.exact
            .as_ref()
            .and_then(|e| e.iter().find(|p| p.x == x).map(|p| p.y))
    }

    /// max error of each method against the exact solution
    pub fn max_errors(&self) -> Vec<(OdeMethod, f64)> {
        if self.exact.is_none() {
            return Vec::new();
        }
        self.solutions
            .iter()
            .map(|s| {
                let err = s
                    .points()
                    .iter()
                    .filter_map(|p| self.exact_at(p.x).map(|e| (p.y - e).abs()))
                    .fold(0.0, f64::max);
                (s.method, err)
            })
            .collect()
    }

    /// x column followed by one column per method (NaN past a stopped solution)
    pub fn to_matrix(&self) -> (DVector<f64>, DMatrix<f64>, Vec<String>) {
        let grid = self
            .solutions
            .iter()
            .max_by_key(|s| s.len())
            .map(|s| s.x.clone())
            .unwrap_or_else(|| DVector::zeros(0));
        let extra = if self.exact.is_some() { 1 } else { 0 };
        let mut columns = DMatrix::from_element(grid.len(), self.solutions.len() + extra, f64::NAN);
        let mut headers: Vec<String> = vec!["x".to_string()];
        for (j, s) in self.solutions.iter().enumerate() {
            headers.push(s.method.to_string());
            for i in 0..s.len() {
                columns[(i, j)] = s.y[i];
            }
        }
        if extra == 1 {
            headers.push("exact".to_string());
            let j = self.solutions.len();
            for (i, &x) in grid.iter().enumerate() {
                if let Some(e) = self.exact_at(x) {
                    columns[(i, j)] = e;
                }
            }
        }
        (grid, columns, headers)
    }

    pub fn to_table(&self) -> String {
        let (grid, columns, headers) = self.to_matrix();
        let mut records = vec![headers];
        for (i, x) in grid.iter().enumerate() {
            let mut row = vec![format!("{:.6}", x)];
            row.extend(columns.row(i).iter().map(|v| {
                if v.is_finite() {
                    format!("{:.8}", v)
                } else {
                    "-".to_string()
                }
            }));
            records.push(row);
        }
        let mut table = Builder::from(records).build();
        table.with(Style::modern_rounded());
        table.to_string()
    }

    pub fn save_to_csv(&self, path: &Path) -> Result<(), csv::Error> {
        let (grid, columns, headers) = self.to_matrix();
        let headers: Vec<&str> = headers.iter().map(|s| s.as_str()).collect();
        save_columns_to_csv(&grid, &columns, &headers, path)
    }
}

/// Solves the problem with every method in `methods`; adds the exact solution when
/// f(x0, .) does not depend on y.
pub fn compare_ode_methods<F>(
    methods: &[OdeMethod],
    f: &F,
    x0: f64,
    y0: f64,
    x_end: f64,
    h: f64,
) -> Result<OdeReport, NumError>
where
    F: Fn(f64, f64) -> f64 + Sync,
{
    check_problem(x0, y0, x_end, h)?;
    let mut solutions = Vec::with_capacity(methods.len());
    for &method in methods {
        solutions.push(solve_ode(method, f, x0, y0, x_end, h)?);
    }
    let exact = if is_independent_of_y(f, x0, y0) {
        info!("right-hand side does not depend on y, computing exact solution by quadrature");
        let grid: Vec<f64> = solutions
            .iter()
            .max_by_key(|s| s.len())
            .map(|s| s.x.iter().copied().collect())
            .unwrap_or_default();
        Some(exact_trajectory(f, x0, y0, &grid))
    } else {
        None
    };
    Ok(OdeReport { solutions, exact })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::str::FromStr;

    #[test]
    fn test_euler_single_steps() {
        // y' = y, y(0) = 1, h = 0.5: 1 -> 1.5 -> 2.25
        let f = |_x: f64, y: f64| y;
        let s = euler(&f, 0.0, 1.0, 1.0, 0.5).unwrap();
        assert_eq!(s.len(), 3);
        assert_relative_eq!(s.y[1], 1.5);
        assert_relative_eq!(s.y[2], 2.25);
        assert_eq!(s.status, SolverStatus::Finished);
    }

    #[test]
    fn test_improved_euler_step() {
        // y' = x: exact for a midpoint rule, y(1) = 0.5
        let f = |x: f64, _y: f64| x;
        let s = improved_euler(&f, 0.0, 0.0, 1.0, 0.1).unwrap();
        assert_relative_eq!(s.last().unwrap().y, 0.5, epsilon = 1e-12);
        assert_relative_eq!(s.last().unwrap().x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_runge_kutta_on_polynomial_rhs() {
        // y' = 3x^2, y(0) = 0 -> y = x^3, RK4 reduces to Simpson and is exact
        let f = |x: f64, _y: f64| 3.0 * x * x;
        let s = runge_kutta4(&f, 0.0, 0.0, 2.0, 0.25).unwrap();
        for p in s.points() {
            assert_relative_eq!(p.y, p.x.powi(3), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_half_step_tolerance_at_boundary() {
        // 0.1 is inexact, yet exactly 10 steps are made
        let f = |_x: f64, _y: f64| 1.0;
        let s = euler(&f, 0.0, 0.0, 1.0, 0.1).unwrap();
        assert_eq!(s.len(), 11);
        // a step longer than twice the interval makes no steps at all
        let s = euler(&f, 0.0, 0.0, 1.0, 2.5).unwrap();
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_validation_happens_before_evaluation() {
        use std::cell::Cell;
        let calls = Cell::new(0);
        let f = |_x: f64, y: f64| {
            calls.set(calls.get() + 1);
            y
        };
        assert!(solve_ode(OdeMethod::Euler, &f, 1.0, 1.0, 1.0, 0.1).is_err());
        assert!(solve_ode(OdeMethod::Euler, &f, 0.0, 1.0, 1.0, 0.0).is_err());
        assert!(solve_ode(OdeMethod::Euler, &f, 0.0, 1.0, 1.0, -0.1).is_err());
        assert!(solve_ode(OdeMethod::Euler, &f, 0.0, f64::NAN, 1.0, 0.1).is_err());
        assert!(solve_ode(OdeMethod::Euler, &f, 0.0, 1.0, 1.0, 1e-9).is_err());
        assert_eq!(calls.get(), 0);
        match solve_ode(OdeMethod::RungeKutta4, &f, 0.0, 1.0, -1.0, 0.1) {
            Err(NumError::InvalidDomain { argument, .. }) => assert_eq!(argument, "x_end"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_steps_below_ulp_still_reach_the_end() {
        // at x = 1e16 the float spacing is 2, so x + 1 == x
        let f = |_x: f64, _y: f64| 0.0;
        let x0 = 1e16;
        let x_end = 1e16 + 4.0;
        let s = solve_ode(OdeMethod::Euler, &f, x0, 0.0, x_end, 1.0).unwrap();
        assert!(s.len() <= 5);
        assert_eq!(s.last().unwrap().x, x_end);
        assert_eq!(s.status, SolverStatus::Finished);
    }

    #[test]
    fn test_nonfinite_step_stops_integration() {
        // y' = 1/(x - 0.5) is undefined at x = 0.5
        let f = |x: f64, _y: f64| 1.0 / (x - 0.5);
        let s = euler(&f, 0.0, 0.0, 1.0, 0.25).unwrap();
        // steps from x = 0, 0.25 are fine, the step from x = 0.5 divides by zero
        assert_eq!(s.len(), 3);
        assert_eq!(s.status, SolverStatus::Stopped { at_x: 0.75 });
        assert!(s.y.iter().all(|y| y.is_finite()));
    }

    #[test]
    fn test_independence_detection() {
        let depends = |x: f64, y: f64| x + y;
        let independent = |x: f64, _y: f64| x.cos();
        assert!(!is_independent_of_y(&depends, 0.0, 1.0));
        assert!(is_independent_of_y(&independent, 0.0, 1.0));
    }

    #[test]
    fn test_exact_solution_by_quadrature() {
        // y' = cos(x), y(0) = 1 -> y = 1 + sin(x)
        let f = |x: f64, _y: f64| x.cos();
        let y = exact_solution_by_quadrature(&f, 0.0, 1.0, 1.0);
        assert_relative_eq!(y, 1.0 + 1.0_f64.sin(), epsilon = 1e-6);
        assert_eq!(exact_solution_by_quadrature(&f, 0.0, 1.0, 0.0), 1.0);
        // backwards from x0
        let y = exact_solution_by_quadrature(&f, 0.0, 1.0, -1.0);
        assert_relative_eq!(y, 1.0 - 1.0_f64.sin(), epsilon = 1e-6);
    }

    #[test]
    fn test_exact_trajectory_matches_pointwise() {
        let f = |x: f64, _y: f64| 2.0 * x;
        let xs: Vec<f64> = (0..=10).map(|i| i as f64 * 0.1).collect();
        let trajectory = exact_trajectory(&f, 0.0, 0.0, &xs);
        assert_eq!(trajectory.len(), xs.len());
        for (p, &x) in trajectory.iter().zip(xs.iter()) {
            assert_eq!(p.x, x);
            assert_eq!(p.y, exact_solution_by_quadrature(&f, 0.0, 0.0, x));
        }
    }

    #[test]
    fn test_compare_methods_with_exact() {
        let f = |x: f64, _y: f64| x.exp();
        let methods = [OdeMethod::Euler, OdeMethod::ImprovedEuler, OdeMethod::RungeKutta4];
        let report = compare_ode_methods(&methods, &f, 0.0, 1.0, 1.0, 0.1).unwrap();
        assert!(report.exact.is_some());
        let errors = report.max_errors();
        assert_eq!(errors.len(), 3);
        // higher order, smaller error
        assert!(errors[0].1 > errors[1].1);
        assert!(errors[1].1 > errors[2].1);
        let table = report.to_table();
        assert!(table.contains("Runge-Kutta 4"));
        assert!(table.contains("exact"));

        // y' = y depends on y: no exact column
        let g = |_x: f64, y: f64| y;
        let report = compare_ode_methods(&methods, &g, 0.0, 1.0, 1.0, 0.1).unwrap();
        assert!(report.exact.is_none());
        assert!(report.max_errors().is_empty());
    }

    #[test]
    fn test_method_names() {
        assert_eq!(OdeMethod::from_str("rk4").unwrap(), OdeMethod::RungeKutta4);
        assert_eq!(OdeMethod::from_str("Cauchy").unwrap(), OdeMethod::ImprovedEuler);
        assert_eq!(OdeMethod::from_str("EULER").unwrap(), OdeMethod::Euler);
        assert_eq!(OdeMethod::ImprovedEuler.to_string(), "improved Euler");
    }
}
