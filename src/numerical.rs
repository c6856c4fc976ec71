/// error types shared by all numerical routines
pub mod errors;
/// grids and tolerant sampling of user functions into point series
pub mod sampling;
/// # Quadrature
/// left, right and midpoint rectangles, trapezoidal rule and Simpson's rule; step count for
/// a target precision, theoretical and Runge error estimates, method comparison report.
/// Example#
/// ```
/// use RustedNumLab::numerical::quadrature::{QuadMethod, compare_all_methods, estimate_step_count, integrate};
/// let f = |x: f64| x.sin();
/// let b = std::f64::consts::PI;
/// let n = estimate_step_count(QuadMethod::Trapezoidal, &f, 0.0, b, 1e-4).unwrap();
/// let result = integrate(QuadMethod::Trapezoidal, &f, 0.0, b, n).unwrap();
/// assert!((result.value - 2.0).abs() <= 1e-4);
/// let report = compare_all_methods(&f, 0.0, b, 10, Some(2.0)).unwrap();
/// println!("{}", report);
/// ```
pub mod quadrature;
/// # Fixed-step ODE solvers
/// Euler, improved Euler (Cauchy) and classic Runge-Kutta 4 for a scalar problem
/// y' = f(x, y), y(x0) = y0 on [x0, x_end]. When f does not depend on y the exact
/// solution is computed by quadrature for comparison.
/// Example#
/// ```
/// use RustedNumLab::numerical::ode::{OdeMethod, compare_ode_methods};
/// let f = |x: f64, _y: f64| x.cos();
/// let report = compare_ode_methods(&[OdeMethod::Euler, OdeMethod::RungeKutta4], &f, 0.0, 0.0, 1.0, 0.1).unwrap();
/// for (method, err) in report.max_errors() {
///     println!("{}: {:.3e}", method, err);
/// }
/// ```
pub mod ode;
/// # Polynomial interpolation
/// Lagrange form (value and coefficients) and Aitken's scheme (value and full table).
/// Example#
/// ```
/// use RustedNumLab::numerical::interpolation::{NodeSet, aitken_table, lagrange_coefficients, polynomial_to_string};
/// let nodes = NodeSet::new(&[(0.0, 1.0), (1.0, 0.0), (2.0, 1.0)]).unwrap();
/// assert_eq!(polynomial_to_string(&lagrange_coefficients(&nodes), "x"), "x^2 - 2x + 1");
/// println!("{}", aitken_table(&nodes, 0.5));
/// ```
pub mod interpolation;
/// task files: settings and quadrature/ode/interpolation tasks, solved into reports
pub mod tasks;
