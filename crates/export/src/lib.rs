//! Export helpers for result databases (JSON) and trajectory traces (CSV).

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

pub mod db;
pub mod trace;

pub use db::{FlightDb, FlightRow, db_paths, read_db, write_db};
pub use trace::{BodySample, TracePoint, body_trace, flight_trace, write_body_trace, write_flight_trace};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to access output: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid sampling step {0}")]
    InvalidStep(f64),
    #[error("database holds {len} flights, index {index} is out of range")]
    MissingFlight { index: usize, len: usize },
}

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}
