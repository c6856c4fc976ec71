//! Polynomial interpolation through a set of nodes (x_i, y_i) with distinct x_i.
//!
//! Two ways to evaluate the same unique interpolating polynomial of degree n - 1:
//!
//! * Lagrange form `L(x) = sum_i y_i prod_{j != i} (x - x_j)/(x_i - x_j)`, also expanded
//!   into coefficients for display as a simplified polynomial;
//! * Aitken's scheme
//!   `L_{i,j}(x) = [(x - x_i) L_{i+1,j}(x) - (x - x_j) L_{i,j-1}(x)] / (x_j - x_i)`,
//!   `L_{i,i} = y_i`, available as a full triangular table for step-by-step display.
//!
//! Duplicate x values are rejected when the [`NodeSet`] is built.
use crate::numerical::errors::NumError;
use crate::numerical::sampling::{SampledPoint, linspace};
use itertools::Itertools;
use log::debug;
use nalgebra::DVector;
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};
use tabled::{builder::Builder, settings::Style};

/// coefficients smaller than this are dropped from the printed polynomial
pub const COEFFICIENT_CUTOFF: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum InterpMethod {
    #[strum(to_string = "Lagrange", serialize = "lagrange")]
    Lagrange,
    #[strum(to_string = "Aitken", serialize = "aitken")]
    Aitken,
}

/// Validated interpolation nodes: at least one node, finite coordinates, distinct x.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSet {
    x: DVector<f64>,
    y: DVector<f64>,
}

impl NodeSet {
    pub fn new(points: &[(f64, f64)]) -> Result<Self, NumError> {
        let (x, y): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
        Self::from_vectors(x, y)
    }

    pub fn from_vectors(x: Vec<f64>, y: Vec<f64>) -> Result<Self, NumError> {
        if x.len() != y.len() {
            return Err(NumError::invalid_domain(
                "y_nodes",
                format!("has {} values for {} x nodes", y.len(), x.len()),
            ));
        }
        if x.is_empty() {
            return Err(NumError::EmptyNodeSet);
        }
        for (i, (xi, yi)) in x.iter().zip(y.iter()).enumerate() {
            if !xi.is_finite() || !yi.is_finite() {
                return Err(NumError::invalid_domain(
                    "nodes",
                    format!("node {} = ({}, {}) is not finite", i, xi, yi),
                ));
            }
        }
        for i in 0..x.len() {
            for j in (i + 1)..x.len() {
                if x[i] == x[j] {
                    return Err(NumError::DegenerateInterpolation {
                        x: x[i],
                        first: i,
                        second: j,
                    });
                }
            }
        }
        Ok(NodeSet {
            x: DVector::from_vec(x),
            y: DVector::from_vec(y),
        })
    }

    /// nodes (x_i, f(x_i)) of a known function
    pub fn from_function<F>(f: &F, xs: &[f64]) -> Result<Self, NumError>
    where
        F: Fn(f64) -> f64,
    {
        let ys: Vec<f64> = xs.iter().map(|&x| f(x)).collect();
        Self::from_vectors(xs.to_vec(), ys)
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self) -> &DVector<f64> {
        &self.x
    }

    pub fn y(&self) -> &DVector<f64> {
        &self.y
    }

    pub fn degree(&self) -> usize {
        self.len() - 1
    }

    /// (min x, max x)
    pub fn span(&self) -> (f64, f64) {
        (self.x.min(), self.x.max())
    }

    pub fn points(&self) -> Vec<SampledPoint> {
        self.x
            .iter()
            .zip(self.y.iter())
            .map(|(&x, &y)| SampledPoint::new(x, y))
            .collect()
    }
}

///////////////////////////////////////LAGRANGE/////////////////////////////////////////////

pub fn lagrange_evaluate(nodes: &NodeSet, x: f64) -> f64 {
    let n = nodes.len();
    let (xs, ys) = (&nodes.x, &nodes.y);
    let mut result = 0.0;
    for i in 0..n {
        let mut term = ys[i];
        for j in 0..n {
            if i != j {
                term *= (x - xs[j]) / (xs[i] - xs[j]);
            }
        }
        result += term;
    }
    result
}

/// (c_0 + c_1 X + ...) * (X - root)
fn multiply_by_root(coeffs: &[f64], root: f64) -> Vec<f64> {
    let mut product = vec![0.0; coeffs.len() + 1];
    for (k, &c) in coeffs.iter().enumerate() {
        product[k] -= root * c;
        product[k + 1] += c;
    }
    product
}

/// Coefficients of the interpolating polynomial in ascending powers, `c[k]` multiplies x^k.
pub fn lagrange_coefficients(nodes: &NodeSet) -> Vec<f64> {
    let n = nodes.len();
    let (xs, ys) = (&nodes.x, &nodes.y);
    let mut coeffs = vec![0.0; n];
    for i in 0..n {
        let mut basis = vec![1.0];
        let mut denominator = 1.0;
        for j in 0..n {
            if i != j {
                basis = multiply_by_root(&basis, xs[j]);
                denominator *= xs[i] - xs[j];
            }
        }
        let scale = ys[i] / denominator;
        for (c, b) in coeffs.iter_mut().zip(basis.iter()) {
            *c += scale * b;
        }
    }
    debug!("interpolating polynomial coefficients: {:?}", coeffs);
    coeffs
}

/// Horner evaluation of ascending-power coefficients
pub fn polynomial_evaluate(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

fn format_number(value: f64) -> String {
    let s = format!("{:.6}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Human-readable polynomial, highest power first, e.g. `2x^2 - 3x + 1`.
pub fn polynomial_to_string(coeffs: &[f64], var: &str) -> String {
    let terms: Vec<(usize, f64)> = coeffs
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, c)| c.abs() > COEFFICIENT_CUTOFF)
        .collect();
    if terms.is_empty() {
        return "0".to_string();
    }
    terms
        .iter()
        .rev()
        .enumerate()
        .map(|(position, &(power, c))| {
            let sign = match (position, c < 0.0) {
                (0, true) => "-".to_string(),
                (0, false) => String::new(),
                (_, true) => "- ".to_string(),
                (_, false) => "+ ".to_string(),
            };
            let magnitude = format_number(c.abs());
            let body = match power {
                0 => magnitude,
                _ => {
                    let coefficient = if magnitude == "1" { String::new() } else { magnitude };
                    if power == 1 {
                        format!("{}{}", coefficient, var)
                    } else {
                        format!("{}{}^{}", coefficient, var, power)
                    }
                }
            };
            format!("{}{}", sign, body)
        })
        .join(" ")
}

////////////////////////////////////////AITKEN//////////////////////////////////////////////

pub fn aitken_evaluate(nodes: &NodeSet, x: f64) -> f64 {
    let n = nodes.len();
    let xs = &nodes.x;
    // p[i] holds L_{i, i+k} after level k
    let mut p: Vec<f64> = nodes.y.iter().copied().collect();
    for k in 1..n {
        for i in 0..(n - k) {
            let j = i + k;
            p[i] = ((x - xs[i]) * p[i + 1] - (x - xs[j]) * p[i]) / (xs[j] - xs[i]);
        }
    }
    p[0]
}

/// Triangular table of Aitken's scheme at a fixed x.
///
/// `rows[k][j]` holds `L_{j-k, j}(x)`, the value at x of the polynomial through nodes
/// `j-k ..= j`, for `j >= k`, and `None` below the diagonal. The diagonal entry
/// `rows[j][j]` is `L_{0, j}(x)`; the last one is the interpolated value.
#[derive(Debug, Clone, PartialEq)]
pub struct AitkenTable {
    pub x: f64,
    pub nodes: Vec<f64>,
    pub rows: Vec<Vec<Option<f64>>>,
}

impl AitkenTable {
    /// Last diagonal entry; NaN for an empty table.
    pub fn value(&self) -> f64 {
        self.rows
            .len()
            .checked_sub(1)
            .and_then(|k| self.get(k, k))
            .unwrap_or(f64::NAN)
    }

    pub fn get(&self, k: usize, j: usize) -> Option<f64> {
        self.rows.get(k).and_then(|row| row.get(j).copied().flatten())
    }

    pub fn to_table(&self) -> String {
        let mut header = vec!["k \\ x_j".to_string()];
        header.extend(self.nodes.iter().map(|x| format_number(*x)));
        let mut records = vec![header];
        for (k, row) in self.rows.iter().enumerate() {
            let mut record = vec![k.to_string()];
            record.extend(
                row.iter()
                    .map(|v| v.map_or(String::new(), |v| format!("{:.8}", v))),
            );
            records.push(record);
        }
        let mut table = Builder::from(records).build();
        table.with(Style::modern_rounded());
        table.to_string()
    }
}

impl fmt::Display for AitkenTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Aitken scheme at x = {}", self.x)?;
        write!(f, "{}", self.to_table())
    }
}

pub fn aitken_table(nodes: &NodeSet, x: f64) -> AitkenTable {
    let n = nodes.len();
    let xs = &nodes.x;
    let mut rows: Vec<Vec<Option<f64>>> = Vec::with_capacity(n);
    rows.push(nodes.y.iter().map(|&y| Some(y)).collect());
    for k in 1..n {
        let mut row = vec![None; n];
        for j in k..n {
            let i = j - k;
            // L_{i+1, j} and L_{i, j-1} sit on the previous level
            let upper = rows[k - 1][j].unwrap_or(f64::NAN);
            let lower = rows[k - 1][j - 1].unwrap_or(f64::NAN);
            row[j] = Some(((x - xs[i]) * upper - (x - xs[j]) * lower) / (xs[j] - xs[i]));
        }
        rows.push(row);
    }
    AitkenTable {
        x,
        nodes: xs.iter().copied().collect(),
        rows,
    }
}

/////////////////////////////////////////CURVES/////////////////////////////////////////////

pub fn interpolate(method: InterpMethod, nodes: &NodeSet, x: f64) -> f64 {
    match method {
        InterpMethod::Lagrange => lagrange_evaluate(nodes, x),
        InterpMethod::Aitken => aitken_evaluate(nodes, x),
    }
}

/// Dense curve of the interpolating polynomial over the node span, for plotting.
pub fn interpolate_curve(method: InterpMethod, nodes: &NodeSet, points: usize) -> Result<Vec<SampledPoint>, NumError> {
    if points < 2 {
        return Err(NumError::invalid_domain(
            "points",
            format!("must be at least 2, got {}", points),
        ));
    }
    let (min, max) = nodes.span();
    if nodes.len() == 1 {
        return Ok(nodes.points());
    }
    Ok(linspace(min, max, points)
        .into_iter()
        .map(|x| SampledPoint::new(x, interpolate(method, nodes, x)))
        .filter(|p| p.y.is_finite())
        .collect())
}

/// max |L(x) - f(x)| on `points` equally spaced points of the node span
pub fn max_interpolation_error<F>(method: InterpMethod, nodes: &NodeSet, f: &F, points: usize) -> Result<f64, NumError>
where
    F: Fn(f64) -> f64,
{
    let curve = interpolate_curve(method, nodes, points)?;
    Ok(curve
        .iter()
        .map(|p| (p.y - f(p.x)).abs())
        .filter(|e| e.is_finite())
        .fold(0.0, f64::max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn parabola_nodes() -> NodeSet {
        // (x - 1)^2 = x^2 - 2x + 1
        NodeSet::new(&[(0.0, 1.0), (1.0, 0.0), (2.0, 1.0)]).unwrap()
    }

    #[test]
    fn test_lagrange_linear_interpolation() {
        // f(x) = 2x + 1
        let nodes = NodeSet::new(&[(0.0, 1.0), (1.0, 3.0)]).unwrap();
        assert_relative_eq!(lagrange_evaluate(&nodes, 0.0), 1.0, epsilon = 1e-10);
        assert_relative_eq!(lagrange_evaluate(&nodes, 0.5), 2.0, epsilon = 1e-10);
        assert_relative_eq!(lagrange_evaluate(&nodes, 2.0), 5.0, epsilon = 1e-10);
    }

    #[test]
    fn test_lagrange_quadratic_interpolation() {
        let nodes = parabola_nodes();
        assert_relative_eq!(lagrange_evaluate(&nodes, 0.5), 0.25, epsilon = 1e-10);
        assert_relative_eq!(lagrange_evaluate(&nodes, 1.5), 0.25, epsilon = 1e-10);
        assert_relative_eq!(lagrange_evaluate(&nodes, 3.0), 4.0, epsilon = 1e-10);
    }

    #[test]
    fn test_lagrange_coefficients() {
        let coeffs = lagrange_coefficients(&parabola_nodes());
        assert_eq!(coeffs.len(), 3);
        assert_relative_eq!(coeffs[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(coeffs[1], -2.0, epsilon = 1e-12);
        assert_relative_eq!(coeffs[2], 1.0, epsilon = 1e-12);
        for x in [-1.0, 0.3, 2.7] {
            assert_relative_eq!(
                polynomial_evaluate(&coeffs, x),
                lagrange_evaluate(&parabola_nodes(), x),
                epsilon = 1e-10
            );
        }
    }

    #[test]
    fn test_polynomial_to_string() {
        assert_eq!(polynomial_to_string(&[1.0, -2.0, 1.0], "x"), "x^2 - 2x + 1");
        assert_eq!(polynomial_to_string(&[0.0, 0.5, -3.0], "x"), "-3x^2 + 0.5x");
        assert_eq!(polynomial_to_string(&[2.0, 1e-15], "t"), "2");
        assert_eq!(polynomial_to_string(&[0.0, 0.0], "x"), "0");
        assert_eq!(polynomial_to_string(&[-1.25], "x"), "-1.25");
    }

    #[test]
    fn test_aitken_matches_lagrange() {
        let nodes = NodeSet::new(&[(-2.0, 4.0), (-0.5, 0.25), (1.0, 1.0), (3.5, 12.25)]).unwrap();
        for x in [-3.0, -1.0, 0.0, 0.7, 2.0, 5.0] {
            assert_relative_eq!(
                aitken_evaluate(&nodes, x),
                lagrange_evaluate(&nodes, x),
                epsilon = 1e-10
            );
        }
    }

    #[test]
    fn test_aitken_table_layout() {
        let nodes = parabola_nodes();
        let table = aitken_table(&nodes, 0.5);
        assert_eq!(table.rows.len(), 3);
        // level 0 are the node values
        assert_eq!(table.get(0, 0), Some(1.0));
        assert_eq!(table.get(0, 2), Some(1.0));
        // below the diagonal nothing is defined
        assert_eq!(table.get(1, 0), None);
        assert_eq!(table.get(2, 1), None);
        // L_{0,1}(0.5): line through (0, 1) and (1, 0)
        assert_relative_eq!(table.get(1, 1).unwrap(), 0.5, epsilon = 1e-12);
        // L_{1,2}(0.5): line through (1, 0) and (2, 1)
        assert_relative_eq!(table.get(1, 2).unwrap(), -0.5, epsilon = 1e-12);
        assert_relative_eq!(table.value(), 0.25, epsilon = 1e-12);
        assert_eq!(table.value(), aitken_evaluate(&nodes, 0.5));
        let rendered = table.to_table();
        assert!(rendered.contains("0.25000000"));
    }

    #[test]
    fn test_empty_aitken_table_has_no_value() {
        let table = AitkenTable { x: 0.0, nodes: vec![], rows: vec![] };
        assert!(table.value().is_nan());
        let table = AitkenTable { x: 0.0, nodes: vec![1.0], rows: vec![vec![]] };
        assert!(table.value().is_nan());
    }

    #[test]
    fn test_single_node() {
        let nodes = NodeSet::new(&[(1.0, 5.0)]).unwrap();
        assert_eq!(nodes.degree(), 0);
        assert_relative_eq!(lagrange_evaluate(&nodes, 10.0), 5.0);
        assert_relative_eq!(aitken_evaluate(&nodes, 10.0), 5.0);
        assert_eq!(lagrange_coefficients(&nodes), vec![5.0]);
        assert_eq!(aitken_table(&nodes, 3.0).value(), 5.0);
        assert_eq!(interpolate_curve(InterpMethod::Lagrange, &nodes, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_node_set_validation() {
        match NodeSet::new(&[(0.0, 1.0), (1.0, 2.0), (0.0, 3.0)]) {
            Err(NumError::DegenerateInterpolation { x, first, second }) => {
                assert_eq!(x, 0.0);
                assert_eq!(first, 0);
                assert_eq!(second, 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(NodeSet::new(&[]), Err(NumError::EmptyNodeSet));
        assert!(NodeSet::from_vectors(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(NodeSet::new(&[(0.0, f64::NAN)]).is_err());
    }

    #[test]
    fn test_curve_and_error_against_function() {
        let f = |x: f64| x.sin();
        let xs = linspace(0.0, std::f64::consts::PI, 5);
        let nodes = NodeSet::from_function(&f, &xs).unwrap();
        let curve = interpolate_curve(InterpMethod::Aitken, &nodes, 50).unwrap();
        assert_eq!(curve.len(), 50);
        assert_abs_diff_eq!(curve[0].x, 0.0);
        assert_abs_diff_eq!(curve[49].x, std::f64::consts::PI, epsilon = 1e-12);
        let err = max_interpolation_error(InterpMethod::Lagrange, &nodes, &f, 200).unwrap();
        // remainder bound max|f^(5)|/5! * max|prod(x - x_i)| is below 0.01
        assert!(err < 0.02);
        assert!(interpolate_curve(InterpMethod::Lagrange, &nodes, 1).is_err());
    }
}
