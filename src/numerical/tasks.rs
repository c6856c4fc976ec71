//! # Task documents
//!
//! A task file describes what to compute in the `title key: values` format of
//! [`crate::Utils::task_parser`]:
//! ```text
//! settings
//!   loglevel: info
//!   plot_points: 200
//!   csv: results
//! quadrature
//!   function: "sin(x)"
//!   a: 0
//!   b: pi
//!   epsilon: 1e-4
//!   method: simpson, trapezoid
//!   exact: 2
//! ode
//!   function: "x + y"
//!   x0: 0  y0: 1  x_end: 1  h: 0.1
//!   method: rk4, euler
//! interpolation
//!   x_nodes: 0, 1, 2
//!   y_nodes: 1, 3, 2
//!   x: 0.5, 1.5
//! ```
//! Numbers may also be written as constant expressions (`pi/2`). A missing `method`
//! key means every method. `exact: auto` takes a high-order Gauss-Legendre value as
//! the exact integral.
use crate::Utils::logger::{default_log_file_name, parse_log_level, save_points_to_csv};
use crate::Utils::task_parser::{SectionMap, Value, parse_document_as};
use crate::numerical::errors::NumError;
use crate::numerical::interpolation::{
    AitkenTable, InterpMethod, NodeSet, aitken_table, interpolate, interpolate_curve,
    lagrange_coefficients, max_interpolation_error, polynomial_to_string,
};
use crate::numerical::ode::{OdeMethod, OdeReport, compare_ode_methods};
use crate::numerical::quadrature::{
    QuadMethod, QuadratureReport, compare_methods, estimate_step_count, reference_value,
};
use crate::numerical::sampling::SampledPoint;
use crate::symbolic::symbolic_engine::{Expr, ExprError, Lambdified1D};
use csv::Writer;
use log::{LevelFilter, debug, info};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use strum::IntoEnumIterator;
use tabled::{builder::Builder, settings::Style};

pub const DEFAULT_PLOT_POINTS: usize = 100;

const SECTIONS: [&str; 4] = ["settings", "quadrature", "ode", "interpolation"];
const SETTINGS_KEYS: [&str; 4] = ["loglevel", "log_file", "plot_points", "csv"];
const QUADRATURE_KEYS: [&str; 7] = ["function", "a", "b", "n", "epsilon", "method", "exact"];
const ODE_KEYS: [&str; 6] = ["function", "x0", "y0", "x_end", "h", "method"];
const INTERPOLATION_KEYS: [&str; 5] = ["x_nodes", "y_nodes", "function", "x", "method"];

#[derive(Debug)]
pub enum TaskError {
    Parse(String),
    MissingKey { section: String, key: String },
    InvalidValue { section: String, key: String, message: String },
    UnknownSection(String),
    Expr(ExprError),
    Numerical(NumError),
    Io(std::io::Error),
    Csv(csv::Error),
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskError::Parse(msg) => write!(f, "Task file error: {}", msg),
            TaskError::MissingKey { section, key } => {
                write!(f, "Section '{}' needs the key '{}'", section, key)
            }
            TaskError::InvalidValue { section, key, message } => {
                write!(f, "Invalid value of '{}' in section '{}': {}", key, section, message)
            }
            TaskError::UnknownSection(name) => write!(
                f,
                "Unknown section '{}', expected one of: {}",
                name,
                SECTIONS.join(", ")
            ),
            TaskError::Expr(e) => write!(f, "{}", e),
            TaskError::Numerical(e) => write!(f, "{}", e),
            TaskError::Io(e) => write!(f, "I/O error: {}", e),
            TaskError::Csv(e) => write!(f, "CSV error: {}", e),
        }
    }
}

impl std::error::Error for TaskError {}

impl From<ExprError> for TaskError {
    fn from(e: ExprError) -> Self {
        TaskError::Expr(e)
    }
}

impl From<NumError> for TaskError {
    fn from(e: NumError) -> Self {
        TaskError::Numerical(e)
    }
}

impl From<std::io::Error> for TaskError {
    fn from(e: std::io::Error) -> Self {
        TaskError::Io(e)
    }
}

impl From<csv::Error> for TaskError {
    fn from(e: csv::Error) -> Self {
        TaskError::Csv(e)
    }
}

/// numbers, or strings holding a constant expression such as "pi/2"
fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Float(_) | Value::Integer(_) => value.as_f64(),
        Value::String(s) => Expr::parse_expression(s)
            .ok()?
            .eval(&[], &[])
            .ok()
            .filter(|v| v.is_finite()),
        Value::Boolean(_) => None,
    }
}

/// typed access to one section of the document
struct Section<'a> {
    name: &'a str,
    map: &'a SectionMap,
}

impl<'a> Section<'a> {
    fn new(name: &'a str, map: &'a SectionMap) -> Self {
        Section { name, map }
    }

    fn invalid(&self, key: &str, message: impl Into<String>) -> TaskError {
        TaskError::InvalidValue {
            section: self.name.to_string(),
            key: key.to_string(),
            message: message.into(),
        }
    }

    fn missing(&self, key: &str) -> TaskError {
        TaskError::MissingKey {
            section: self.name.to_string(),
            key: key.to_string(),
        }
    }

    fn check_keys(&self, known: &[&str]) -> Result<(), TaskError> {
        let mut keys: Vec<&String> = self.map.keys().collect();
        keys.sort();
        match keys.into_iter().find(|k| !known.contains(&k.as_str())) {
            Some(key) => Err(self.invalid(key, format!("unknown key, expected one of: {}", known.join(", ")))),
            None => Ok(()),
        }
    }

    /// None for an absent key or a key with an empty list
    fn values(&self, key: &str) -> Option<&'a [Value]> {
        self.map
            .get(key)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.is_empty())
    }

    fn single(&self, key: &str) -> Result<Option<&'a Value>, TaskError> {
        match self.values(key) {
            None => Ok(None),
            Some([value]) => Ok(Some(value)),
            Some(values) => Err(self.invalid(key, format!("expected one value, got {}", values.len()))),
        }
    }

    fn optional_f64(&self, key: &str) -> Result<Option<f64>, TaskError> {
        match self.single(key)? {
            None => Ok(None),
            Some(v) => value_to_f64(v)
                .map(Some)
                .ok_or_else(|| self.invalid(key, format!("'{}' is not a number", v))),
        }
    }

    fn required_f64(&self, key: &str) -> Result<f64, TaskError> {
        self.optional_f64(key)?.ok_or_else(|| self.missing(key))
    }

    fn optional_count(&self, key: &str) -> Result<Option<usize>, TaskError> {
        match self.single(key)? {
            None => Ok(None),
            Some(v) => match v.as_integer() {
                Some(i) if i >= 1 => Ok(Some(i as usize)),
                _ => Err(self.invalid(key, format!("'{}' is not a positive integer", v))),
            },
        }
    }

    fn optional_string(&self, key: &str) -> Result<Option<String>, TaskError> {
        Ok(self.single(key)?.map(|v| v.to_string_value()))
    }

    fn required_string(&self, key: &str) -> Result<String, TaskError> {
        self.optional_string(key)?.ok_or_else(|| self.missing(key))
    }

    fn f64_list(&self, key: &str) -> Result<Vec<f64>, TaskError> {
        self.values(key)
            .unwrap_or(&[])
            .iter()
            .map(|v| value_to_f64(v).ok_or_else(|| self.invalid(key, format!("'{}' is not a number", v))))
            .collect()
    }

    /// method names through strum; every method when the key is absent
    fn methods<M>(&self, key: &str) -> Result<Vec<M>, TaskError>
    where
        M: FromStr + IntoEnumIterator,
    {
        match self.values(key) {
            None => Ok(M::iter().collect()),
            Some(values) => values
                .iter()
                .map(|v| {
                    let name = v.to_string_value();
                    M::from_str(&name).map_err(|_| self.invalid(key, format!("unknown method '{}'", name)))
                })
                .collect(),
        }
    }
}

/// Parses a formula of one variable; the variable may have any name.
fn function_of_one_variable(source: &str) -> Result<Lambdified1D, TaskError> {
    let expr = Expr::parse_expression(source)?;
    let vars = expr.variables();
    let var = match vars.len() {
        1 => vars.into_iter().next().unwrap_or_default(),
        _ => "x".to_string(),
    };
    Ok(expr.lambdify1D(&var)?)
}

//////////////////////////////////////SETTINGS/////////////////////////////////////////

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub loglevel: LevelFilter,
    pub log_file: Option<String>,
    /// points of dense curves (interpolation polynomial, error sampling)
    pub plot_points: usize,
    /// directory for CSV results
    pub csv: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            loglevel: LevelFilter::Info,
            log_file: None,
            plot_points: DEFAULT_PLOT_POINTS,
            csv: None,
        }
    }
}

impl Settings {
    fn from_section(section: &Section) -> Result<Self, TaskError> {
        section.check_keys(&SETTINGS_KEYS)?;
        let mut settings = Settings::default();
        if let Some(level) = section.optional_string("loglevel")? {
            settings.loglevel = parse_log_level(&level)
                .ok_or_else(|| section.invalid("loglevel", format!("unknown level '{}'", level)))?;
        }
        settings.log_file = section.optional_string("log_file")?.map(|name| {
            if name == "auto" { default_log_file_name() } else { name }
        });
        if let Some(points) = section.optional_count("plot_points")? {
            if points < 2 {
                return Err(section.invalid("plot_points", "must be at least 2"));
            }
            settings.plot_points = points;
        }
        settings.csv = section.optional_string("csv")?;
        Ok(settings)
    }
}

//////////////////////////////////////TASKS/////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Partition {
    /// fixed number of subintervals
    Count(usize),
    /// number of subintervals estimated per method from the target precision
    Precision(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExactValue {
    Given(f64),
    /// Gauss-Legendre value of the integral
    Reference,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureTask {
    pub function: String,
    pub a: f64,
    pub b: f64,
    pub partition: Partition,
    pub methods: Vec<QuadMethod>,
    pub exact: Option<ExactValue>,
}

impl QuadratureTask {
    fn from_section(section: &Section) -> Result<Self, TaskError> {
        section.check_keys(&QUADRATURE_KEYS)?;
        let partition = match (section.optional_count("n")?, section.optional_f64("epsilon")?) {
            (Some(n), epsilon) => {
                if epsilon.is_some() {
                    debug!("both n and epsilon are given, n = {} is used", n);
                }
                Partition::Count(n)
            }
            (None, Some(epsilon)) => Partition::Precision(epsilon),
            (None, None) => return Err(section.missing("n")),
        };
        let exact = match section.single("exact")? {
            None => None,
            Some(Value::String(s)) if s == "auto" => Some(ExactValue::Reference),
            Some(_) => section.optional_f64("exact")?.map(ExactValue::Given),
        };
        Ok(QuadratureTask {
            function: section.required_string("function")?,
            a: section.required_f64("a")?,
            b: section.required_f64("b")?,
            partition,
            methods: section.methods("method")?,
            exact,
        })
    }

    pub fn solve(&self) -> Result<QuadratureReport, TaskError> {
        let f = function_of_one_variable(&self.function)?;
        let exact = match self.exact {
            Some(ExactValue::Given(value)) => Some(value),
            Some(ExactValue::Reference) => Some(reference_value(&f, self.a, self.b)?),
            None => None,
        };
        let report = match self.partition {
            Partition::Count(n) => compare_methods(&self.methods, &f, self.a, self.b, n, exact)?,
            Partition::Precision(epsilon) => {
                let mut rows = Vec::with_capacity(self.methods.len());
                for &method in &self.methods {
                    let n = estimate_step_count(method, &f, self.a, self.b, epsilon)?;
                    rows.extend(compare_methods(&[method], &f, self.a, self.b, n, exact)?.rows);
                }
                QuadratureReport {
                    a: self.a,
                    b: self.b,
                    exact,
                    rows,
                }
            }
        };
        Ok(report)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OdeTask {
    /// right-hand side f(x, y) of y' = f(x, y)
    pub function: String,
    pub x0: f64,
    pub y0: f64,
    pub x_end: f64,
    pub h: f64,
    pub methods: Vec<OdeMethod>,
}

impl OdeTask {
    fn from_section(section: &Section) -> Result<Self, TaskError> {
        section.check_keys(&ODE_KEYS)?;
        Ok(OdeTask {
            function: section.required_string("function")?,
            x0: section.required_f64("x0")?,
            y0: section.required_f64("y0")?,
            x_end: section.required_f64("x_end")?,
            h: section.required_f64("h")?,
            methods: section.methods("method")?,
        })
    }

    pub fn solve(&self) -> Result<OdeReport, TaskError> {
        let f = Expr::parse_expression(&self.function)?.lambdify2D("x", "y")?;
        Ok(compare_ode_methods(&self.methods, &f, self.x0, self.y0, self.x_end, self.h)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationTask {
    pub x_nodes: Vec<f64>,
    /// node values; taken from `function` when absent
    pub y_nodes: Option<Vec<f64>>,
    /// interpolated function, also used for the error of the polynomial
    pub function: Option<String>,
    /// points where the polynomial is evaluated
    pub x: Vec<f64>,
    pub methods: Vec<InterpMethod>,
    pub curve_points: usize,
}

impl InterpolationTask {
    fn from_section(section: &Section, curve_points: usize) -> Result<Self, TaskError> {
        section.check_keys(&INTERPOLATION_KEYS)?;
        let x_nodes = section.f64_list("x_nodes")?;
        if x_nodes.is_empty() {
            return Err(section.missing("x_nodes"));
        }
        let y_nodes = match section.values("y_nodes") {
            Some(_) => Some(section.f64_list("y_nodes")?),
            None => None,
        };
        let function = section.optional_string("function")?;
        if y_nodes.is_none() && function.is_none() {
            return Err(section.missing("y_nodes"));
        }
        Ok(InterpolationTask {
            x_nodes,
            y_nodes,
            function,
            x: section.f64_list("x")?,
            methods: section.methods("method")?,
            curve_points,
        })
    }

    pub fn solve(&self) -> Result<InterpolationReport, TaskError> {
        let f = match &self.function {
            Some(source) => Some(function_of_one_variable(source)?),
            None => None,
        };
        let nodes = match (&self.y_nodes, &f) {
            (Some(y), _) => NodeSet::from_vectors(self.x_nodes.clone(), y.clone())?,
            (None, Some(f)) => NodeSet::from_function(f, &self.x_nodes)?,
            (None, None) => {
                return Err(TaskError::MissingKey {
                    section: "interpolation".to_string(),
                    key: "y_nodes".to_string(),
                });
            }
        };
        let polynomial = polynomial_to_string(&lagrange_coefficients(&nodes), "x");
        let values = self
            .x
            .iter()
            .map(|&x| {
                let row = self.methods.iter().map(|&m| (m, interpolate(m, &nodes, x))).collect();
                (x, row)
            })
            .collect();
        let aitken_tables = if self.methods.contains(&InterpMethod::Aitken) {
            self.x.iter().map(|&x| aitken_table(&nodes, x)).collect()
        } else {
            Vec::new()
        };
        let method = self.methods.first().copied().unwrap_or(InterpMethod::Lagrange);
        let curve = interpolate_curve(method, &nodes, self.curve_points)?;
        let max_error = match &f {
            Some(f) => Some(max_interpolation_error(method, &nodes, f, self.curve_points)?),
            None => None,
        };
        Ok(InterpolationReport {
            nodes,
            polynomial,
            values,
            aitken_tables,
            curve,
            max_error,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationReport {
    pub nodes: NodeSet,
    /// Lagrange polynomial in ascending-power form, e.g. "x^2 - 2x + 1"
    pub polynomial: String,
    /// value of every requested method at every requested x
    pub values: Vec<(f64, Vec<(InterpMethod, f64)>)>,
    pub aitken_tables: Vec<AitkenTable>,
    pub curve: Vec<SampledPoint>,
    /// max |L(x) - f(x)| over the node span, when the function is known
    pub max_error: Option<f64>,
}

impl InterpolationReport {
    pub fn to_table(&self) -> String {
        let mut header = vec!["x".to_string()];
        if let Some((_, row)) = self.values.first() {
            header.extend(row.iter().map(|(m, _)| m.to_string()));
        }
        let mut records = vec![header];
        for (x, row) in &self.values {
            let mut record = vec![format!("{}", x)];
            record.extend(row.iter().map(|(_, v)| format!("{:.10}", v)));
            records.push(record);
        }
        let mut table = Builder::from(records).build();
        table.with(Style::modern_rounded());
        table.to_string()
    }
}

impl fmt::Display for InterpolationReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} nodes, L(x) = {}", self.nodes.len(), self.polynomial)?;
        if !self.values.is_empty() {
            writeln!(f, "{}", self.to_table())?;
        }
        for table in &self.aitken_tables {
            writeln!(f, "{}", table)?;
        }
        if let Some(err) = self.max_error {
            writeln!(f, "max interpolation error: {:.3e}", err)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NumericalTask {
    Quadrature(QuadratureTask),
    Ode(OdeTask),
    Interpolation(InterpolationTask),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskReport {
    Quadrature(QuadratureReport),
    Ode(OdeReport),
    Interpolation(InterpolationReport),
}

impl NumericalTask {
    pub fn name(&self) -> &'static str {
        match self {
            NumericalTask::Quadrature(_) => "quadrature",
            NumericalTask::Ode(_) => "ode",
            NumericalTask::Interpolation(_) => "interpolation",
        }
    }

    pub fn solve(&self) -> Result<TaskReport, TaskError> {
        Ok(match self {
            NumericalTask::Quadrature(task) => TaskReport::Quadrature(task.solve()?),
            NumericalTask::Ode(task) => TaskReport::Ode(task.solve()?),
            NumericalTask::Interpolation(task) => TaskReport::Interpolation(task.solve()?),
        })
    }
}

impl TaskReport {
    /// Writes the report into `dir` as quadrature.csv, ode.csv or interpolation.csv.
    pub fn save_to_csv(&self, dir: &Path) -> Result<(), TaskError> {
        fs::create_dir_all(dir)?;
        match self {
            TaskReport::Quadrature(report) => {
                let path = dir.join("quadrature.csv");
                let mut writer = Writer::from_path(&path)?;
                writer.write_record(["method", "n", "h", "value", "theoretical_error", "runge_error", "actual_error"])?;
                for row in &report.rows {
                    writer.write_record(&[
                        row.quadrature.method.to_string(),
                        row.quadrature.n.to_string(),
                        row.quadrature.h.to_string(),
                        row.quadrature.value.to_string(),
                        row.theoretical_error.to_string(),
                        row.runge_error.to_string(),
                        row.actual_error.map_or(String::new(), |e| e.to_string()),
                    ])?;
                }
                writer.flush()?;
                info!("result saved to {}", path.display());
            }
            TaskReport::Ode(report) => report.save_to_csv(&dir.join("ode.csv"))?,
            TaskReport::Interpolation(report) => {
                save_points_to_csv(&report.curve, ["x", "L(x)"], &dir.join("interpolation.csv"))?
            }
        }
        Ok(())
    }
}

impl fmt::Display for TaskReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskReport::Quadrature(report) => write!(f, "{}", report),
            TaskReport::Ode(report) => {
                writeln!(f, "{}", report.to_table())?;
                for (method, err) in report.max_errors() {
                    writeln!(f, "{}: max error {:.3e}", method, err)?;
                }
                Ok(())
            }
            TaskReport::Interpolation(report) => write!(f, "{}", report),
        }
    }
}

//////////////////////////////////////DOCUMENT//////////////////////////////////////////

#[derive(Debug, Clone, PartialEq)]
pub struct TaskDocument {
    pub settings: Settings,
    /// in the order quadrature, ode, interpolation
    pub tasks: Vec<NumericalTask>,
}

impl TaskDocument {
    pub fn parse(input: &str) -> Result<Self, TaskError> {
        let doc = parse_document_as(input, None).map_err(TaskError::Parse)?;
        let mut titles: Vec<&String> = doc.keys().collect();
        titles.sort();
        if let Some(unknown) = titles.into_iter().find(|t| !SECTIONS.contains(&t.as_str())) {
            return Err(TaskError::UnknownSection(unknown.clone()));
        }
        let settings = match doc.get("settings") {
            Some(map) => Settings::from_section(&Section::new("settings", map))?,
            None => Settings::default(),
        };
        let mut tasks = Vec::new();
        if let Some(map) = doc.get("quadrature") {
            let task = QuadratureTask::from_section(&Section::new("quadrature", map))?;
            tasks.push(NumericalTask::Quadrature(task));
        }
        if let Some(map) = doc.get("ode") {
            tasks.push(NumericalTask::Ode(OdeTask::from_section(&Section::new("ode", map))?));
        }
        if let Some(map) = doc.get("interpolation") {
            let task = InterpolationTask::from_section(&Section::new("interpolation", map), settings.plot_points)?;
            tasks.push(NumericalTask::Interpolation(task));
        }
        if tasks.is_empty() {
            return Err(TaskError::Parse(
                "no quadrature, ode or interpolation section".to_string(),
            ));
        }
        Ok(TaskDocument { settings, tasks })
    }

    pub fn from_file(path: &Path) -> Result<Self, TaskError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Solves every task, logs the reports and writes CSV files if `settings.csv` is set.
    pub fn run(&self) -> Result<Vec<TaskReport>, TaskError> {
        let mut reports = Vec::with_capacity(self.tasks.len());
        for task in &self.tasks {
            info!("solving {} task", task.name());
            let report = task.solve()?;
            info!("\n{}", report);
            if let Some(dir) = &self.settings.csv {
                report.save_to_csv(Path::new(dir))?;
            }
            reports.push(report);
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;
    use tempfile::tempdir;

    const FULL_TASK: &str = r#"
# lab 2, variant 7
settings
  loglevel: warn
  plot_points: 50
quadrature
  function: "x^2 + 1"
  a: 0
  b: 3
  n: 6
  method: simpson, trapezoid
  exact: 12
ode
  function: "2*x"
  x0: 0
  y0: 1
  x_end: 1
  h: 0.1
  method: rk4
interpolation
  x_nodes: 0, 1, 2
  y_nodes: 1, 0, 1
  x: 0.5
"#;

    #[test]
    fn test_parse_full_document() {
        let doc = TaskDocument::parse(FULL_TASK).unwrap();
        assert_eq!(doc.settings.loglevel, LevelFilter::Warn);
        assert_eq!(doc.settings.plot_points, 50);
        assert_eq!(doc.tasks.len(), 3);
        let names: Vec<&str> = doc.tasks.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["quadrature", "ode", "interpolation"]);
        match &doc.tasks[0] {
            NumericalTask::Quadrature(task) => {
                assert_eq!(task.function, "x^2 + 1");
                assert_eq!(task.partition, Partition::Count(6));
                assert_eq!(task.methods, vec![QuadMethod::Simpson, QuadMethod::Trapezoidal]);
                assert_eq!(task.exact, Some(ExactValue::Given(12.0)));
            }
            other => panic!("unexpected task {:?}", other),
        }
        match &doc.tasks[2] {
            NumericalTask::Interpolation(task) => {
                assert_eq!(task.methods, vec![InterpMethod::Lagrange, InterpMethod::Aitken]);
                assert_eq!(task.curve_points, 50);
            }
            other => panic!("unexpected task {:?}", other),
        }
    }

    #[test]
    fn test_run_full_document() {
        let doc = TaskDocument::parse(FULL_TASK).unwrap();
        let reports = doc.run().unwrap();
        match &reports[0] {
            TaskReport::Quadrature(report) => {
                let simpson = report.row(QuadMethod::Simpson).unwrap();
                assert_relative_eq!(simpson.quadrature.value, 12.0, epsilon = 1e-10);
                assert!(simpson.actual_error.unwrap() < 1e-10);
            }
            other => panic!("unexpected report {:?}", other),
        }
        match &reports[1] {
            TaskReport::Ode(report) => {
                // y' = 2x does not depend on y, so the exact solution is available
                assert!(report.exact.is_some());
                let rk4 = report.solution(OdeMethod::RungeKutta4).unwrap();
                assert_relative_eq!(rk4.last().unwrap().y, 2.0, epsilon = 1e-10);
            }
            other => panic!("unexpected report {:?}", other),
        }
        match &reports[2] {
            TaskReport::Interpolation(report) => {
                assert_eq!(report.polynomial, "x^2 - 2x + 1");
                let (x, row) = &report.values[0];
                assert_relative_eq!(*x, 0.5);
                for (_, value) in row {
                    assert_relative_eq!(*value, 0.25, epsilon = 1e-12);
                }
                assert_eq!(report.aitken_tables.len(), 1);
                assert_eq!(report.curve.len(), 50);
            }
            other => panic!("unexpected report {:?}", other),
        }
    }

    #[test]
    fn test_precision_driven_quadrature() {
        let input = "quadrature\n function: \"sin(x)\"\n a: 0\n b: 2*pi\n epsilon: 1e-4\n method: trapezoid, simpson\n exact: 0";
        let doc = TaskDocument::parse(input).unwrap();
        let report = match doc.tasks[0].solve().unwrap() {
            TaskReport::Quadrature(report) => report,
            other => panic!("unexpected report {:?}", other),
        };
        assert_relative_eq!(report.b, 2.0 * PI);
        for row in &report.rows {
            assert!(row.actual_error.unwrap() <= 1e-4, "{} missed the precision", row.quadrature.method);
        }
        let simpson = report.row(QuadMethod::Simpson).unwrap();
        let trapezoid = report.row(QuadMethod::Trapezoidal).unwrap();
        assert!(simpson.quadrature.n < trapezoid.quadrature.n);
        assert_eq!(simpson.quadrature.n % 2, 0);
    }

    #[test]
    fn test_reference_exact_value() {
        let input = "quadrature function: exp(t) a: 0 b: 1 n: 10 method: midpoint exact: auto";
        let doc = TaskDocument::parse(input).unwrap();
        match doc.tasks[0].solve().unwrap() {
            TaskReport::Quadrature(report) => {
                assert_relative_eq!(report.exact.unwrap(), 1f64.exp() - 1.0, epsilon = 1e-12);
            }
            other => panic!("unexpected report {:?}", other),
        }
    }

    #[test]
    fn test_interpolation_from_function() {
        let input = "interpolation\n x_nodes: 0, 0.5, 1\n function: \"x^2\"\n x: 0.25\n method: aitken";
        let doc = TaskDocument::parse(input).unwrap();
        match doc.tasks[0].solve().unwrap() {
            TaskReport::Interpolation(report) => {
                assert_relative_eq!(report.values[0].1[0].1, 0.0625, epsilon = 1e-12);
                assert!(report.max_error.unwrap() < 1e-12);
                assert_eq!(report.nodes.len(), 3);
            }
            other => panic!("unexpected report {:?}", other),
        }
    }

    #[test]
    fn test_document_errors() {
        assert!(matches!(
            TaskDocument::parse("plots width: 10"),
            Err(TaskError::UnknownSection(name)) if name == "plots"
        ));
        assert!(matches!(
            TaskDocument::parse("quadrature function: x a: 0 b: 1"),
            Err(TaskError::MissingKey { key, .. }) if key == "n"
        ));
        assert!(matches!(
            TaskDocument::parse("ode function: x x0: 0 y0: 1 x_end: 1 h: 0.1 method: adams"),
            Err(TaskError::InvalidValue { key, .. }) if key == "method"
        ));
        assert!(matches!(
            TaskDocument::parse("quadrature function: x a: 0 b: 1 n: 0"),
            Err(TaskError::InvalidValue { key, .. }) if key == "n"
        ));
        assert!(matches!(
            TaskDocument::parse("ode function: x x0: 0 y0: 1 x_end: 1 h: 0.1 step: 2"),
            Err(TaskError::InvalidValue { key, .. }) if key == "step"
        ));
        assert!(matches!(
            TaskDocument::parse("settings loglevel: info"),
            Err(TaskError::Parse(_))
        ));
        assert!(matches!(TaskDocument::parse("%%%"), Err(TaskError::Parse(_))));
    }

    #[test]
    fn test_solve_errors() {
        let doc = TaskDocument::parse("quadrature function: \"x\" a: 2 b: 1 n: 4").unwrap();
        assert!(matches!(
            doc.tasks[0].solve(),
            Err(TaskError::Numerical(NumError::InvalidDomain { .. }))
        ));
        let doc = TaskDocument::parse("ode function: \"x + z\" x0: 0 y0: 1 x_end: 1 h: 0.1").unwrap();
        assert!(matches!(
            doc.tasks[0].solve(),
            Err(TaskError::Expr(ExprError::UnknownVariable(_)))
        ));
        let doc = TaskDocument::parse("interpolation x_nodes: 0, 1, 1 y_nodes: 1, 2, 3").unwrap();
        assert!(matches!(
            doc.tasks[0].solve(),
            Err(TaskError::Numerical(NumError::DegenerateInterpolation { .. }))
        ));
    }

    #[test]
    fn test_csv_output() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("results");
        let input = format!(
            "settings csv: \"{}\"\node function: \"y\" x0: 0 y0: 1 x_end: 0.5 h: 0.1 method: euler, rk4\ninterpolation x_nodes: 0, 1 y_nodes: 0, 2",
            out.display()
        );
        let doc = TaskDocument::parse(&input).unwrap();
        doc.run().unwrap();
        let ode = fs::read_to_string(out.join("ode.csv")).unwrap();
        let lines: Vec<&str> = ode.lines().collect();
        assert_eq!(lines[0], "x,Euler,Runge-Kutta 4");
        assert_eq!(lines.len(), 7);
        let curve = fs::read_to_string(out.join("interpolation.csv")).unwrap();
        assert_eq!(curve.lines().count(), DEFAULT_PLOT_POINTS + 1);
    }
}
