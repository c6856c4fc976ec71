//! Sampling of user functions over a grid.
//!
//! Point series are produced for tables and charts, so a sample where the function is
//! undefined (log of a negative number, division by zero, ...) is skipped instead of
//! aborting the whole series.
use crate::numerical::errors::{NumError, check_interval};
use log::debug;
use rayon::prelude::*;

/// A single (x, y) pair of a sampled function, trajectory or interpolation curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledPoint {
    pub x: f64,
    pub y: f64,
}

impl SampledPoint {
    pub fn new(x: f64, y: f64) -> Self {
        SampledPoint { x, y }
    }
}

impl From<(f64, f64)> for SampledPoint {
    fn from((x, y): (f64, f64)) -> Self {
        SampledPoint { x, y }
    }
}

impl From<SampledPoint> for (f64, f64) {
    fn from(p: SampledPoint) -> Self {
        (p.x, p.y)
    }
}

/// `points` equally spaced values from `start` to `end`, both ends included
pub fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (points - 1) as f64;
            (0..points).map(|i| start + i as f64 * step).collect()
        }
    }
}

fn check_grid(a: f64, b: f64, points: usize) -> Result<(), NumError> {
    check_interval(a, b)?;
    if points < 2 {
        return Err(NumError::invalid_domain(
            "points",
            "must be at least 2 to cover an interval",
        ));
    }
    Ok(())
}

/// Samples `f` on `points` equally spaced nodes of [a, b]; non-finite values are skipped.
pub fn sample_function<F>(f: &F, a: f64, b: f64, points: usize) -> Result<Vec<SampledPoint>, NumError>
where
    F: Fn(f64) -> f64,
{
    check_grid(a, b, points)?;
    let series: Vec<SampledPoint> = linspace(a, b, points)
        .into_iter()
        .filter_map(|x| {
            let y = f(x);
            if y.is_finite() {
                Some(SampledPoint::new(x, y))
            } else {
                None
            }
        })
        .collect();
    if series.len() < points {
        debug!("skipped {} undefined samples", points - series.len());
    }
    Ok(series)
}

/// Same as [`sample_function`] but evaluates the grid on the rayon thread pool.
/// The order of the returned points is the grid order.
pub fn sample_function_par<F>(
    f: &F,
    a: f64,
    b: f64,
    points: usize,
) -> Result<Vec<SampledPoint>, NumError>
where
    F: Fn(f64) -> f64 + Sync,
{
    check_grid(a, b, points)?;
    let series: Vec<SampledPoint> = linspace(a, b, points)
        .into_par_iter()
        .filter_map(|x| {
            let y = f(x);
            if y.is_finite() {
                Some(SampledPoint::new(x, y))
            } else {
                None
            }
        })
        .collect();
    if series.len() < points {
        debug!("skipped {} undefined samples", points - series.len());
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linspace() {
        let grid = linspace(0.0, 1.0, 5);
        assert_eq!(grid.len(), 5);
        assert_relative_eq!(grid[0], 0.0);
        assert_relative_eq!(grid[2], 0.5);
        assert_relative_eq!(grid[4], 1.0);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
        assert!(linspace(2.0, 3.0, 0).is_empty());
    }

    #[test]
    fn test_sample_skips_undefined_points() {
        // ln(x) is undefined at x <= 0
        let f = |x: f64| x.ln();
        let series = sample_function(&f, -1.0, 1.0, 5).unwrap();
        // grid: -1, -0.5, 0, 0.5, 1 -> only 0.5 and 1 survive
        assert_eq!(series.len(), 2);
        assert_relative_eq!(series[0].x, 0.5);
        assert_relative_eq!(series[1].y, 0.0);
    }

    #[test]
    fn test_parallel_sampling_keeps_order() {
        let f = |x: f64| 1.0 / (x - 0.5);
        // the grid step 0.125 hits the pole at x = 0.5 exactly
        let serial = sample_function(&f, 0.0, 1.0, 9).unwrap();
        let parallel = sample_function_par(&f, 0.0, 1.0, 9).unwrap();
        assert_eq!(serial, parallel);
        assert_eq!(serial.len(), 8);
        assert!(serial.windows(2).all(|w| w[0].x < w[1].x));
    }

    #[test]
    fn test_sampling_rejects_bad_grid() {
        let f = |x: f64| x;
        assert!(sample_function(&f, 1.0, 0.0, 10).is_err());
        assert!(sample_function(&f, 0.0, 1.0, 1).is_err());
        assert!(sample_function_par(&f, 0.0, 1.0, 0).is_err());
    }
}
