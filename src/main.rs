#![allow(non_snake_case)]
use RustedNumLab::Utils::logger::init_logger;
use RustedNumLab::numerical::tasks::TaskDocument;
use log::{error, info};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let Some(task_file) = args.get(1) else {
        eprintln!("usage: {} <task-file>", args.first().map_or("RustedNumLab", |s| s.as_str()));
        return ExitCode::FAILURE;
    };
    let document = match TaskDocument::from_file(Path::new(task_file)) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let settings = &document.settings;
    init_logger(settings.loglevel, settings.log_file.as_deref());
    info!("task file {}: {} task(s)", task_file, document.tasks.len());
    match document.run() {
        Ok(reports) => {
            info!("Program ended, {} report(s)", reports.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
