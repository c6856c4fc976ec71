//! Logging setup and CSV export of computed series.
use crate::numerical::sampling::SampledPoint;
use chrono::Local;
use csv::Writer;
use log::{LevelFilter, info};
use nalgebra::{DMatrix, DVector};
use simplelog::*;
use std::fs::File;
use std::path::Path;

/// maps the `loglevel` setting of a task file to a filter
pub fn parse_log_level(level: &str) -> Option<LevelFilter> {
    match level.to_lowercase().as_str() {
        "off" | "none" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// log_2026-10-18_12-00-00.txt
pub fn default_log_file_name() -> String {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("log_{}.txt", date_and_time)
}

/// Terminal logger plus an optional file logger.
///
/// Returns false if a global logger was already installed (for example by an earlier
/// task in the same process); logging then keeps going to the existing logger.
pub fn init_logger(level: LevelFilter, log_file: Option<&str>) -> bool {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(filename) = log_file {
        match File::create(filename) {
            Ok(file) => loggers.push(WriteLogger::new(level, Config::default(), file)),
            Err(e) => eprintln!("cannot create log file {}: {}", filename, e),
        }
    }
    CombinedLogger::init(loggers).is_ok()
}

/// Writes `x` as the first column followed by the columns of `columns`.
/// NaN entries (no value at that x) are written as empty cells.
pub fn save_columns_to_csv(
    x: &DVector<f64>,
    columns: &DMatrix<f64>,
    headers: &[&str],
    path: &Path,
) -> Result<(), csv::Error> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(headers)?;
    for (i, row) in columns.row_iter().enumerate() {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(x[i].to_string());
        record.extend(row.iter().map(|&val| {
            if val.is_nan() {
                String::new()
            } else {
                val.to_string()
            }
        }));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    info!("result saved to {}", path.display());
    Ok(())
}

/// Saves a point series (sampled function, interpolation curve) as two columns.
pub fn save_points_to_csv(
    points: &[SampledPoint],
    headers: [&str; 2],
    path: &Path,
) -> Result<(), csv::Error> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(headers)?;
    for p in points {
        writer.write_record(&[p.x.to_string(), p.y.to_string()])?;
    }
    writer.flush()?;
    info!("{} points saved to {}", points.len(), path.display());
    Ok(())
}
