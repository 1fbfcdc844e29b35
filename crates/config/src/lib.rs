//! Problem-file models and loaders.
//!
//! A problem file describes the nodes of a mission, the grids of both approximations, the
//! cost weights and the launch window. It is YAML unless the extension is `.toml`.

use std::fs::File;
use std::path::Path;

use pathfinder_ephemeris::EphemerisError;
use pathfinder_transfer::MissionError;
use serde::Deserialize;
use thiserror::Error;

pub mod date;
pub mod nodes;
pub mod problem;
pub mod template;

pub use date::{parse_start_date, seconds_since_j2000};
pub use nodes::{EphemerisConfig, FlyByConfig, NodeConfig, ParkingConfig};
pub use problem::{Problem, ProblemConfig, RefineSection, SearchSection, TimeSettings};
pub use template::{DEFAULT_PROBLEM, write_default_problem};

/// Errors that can occur while loading or validating a problem file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read problem file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("field '{0}' must be set")]
    MissingField(String),
    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
    #[error("invalid start date `{value}`: expected YYYY-MM-DD or RFC 3339")]
    Date {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
    #[error(transparent)]
    Mission(#[from] MissionError),
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Unwrap an optional field or report its dotted path.
pub(crate) fn require<T>(value: Option<T>, field: impl FnOnce() -> String) -> Result<T, ConfigError> {
    value.ok_or_else(|| ConfigError::MissingField(field()))
}

/// Read and validate the problem file at `path`.
///
/// Relative ephemeris table paths are resolved against the problem file's directory.
pub fn load_problem<P: AsRef<Path>>(path: P) -> Result<Problem, ConfigError> {
    let path = path.as_ref();
    let config: ProblemConfig = load_record(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    config.build(base_dir)
}

fn load_record<T, P>(path: P) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.extension().map(|ext| ext == "toml").unwrap_or(false) {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn default_problem_loads_back() {
        let file = write_temp(".yaml", DEFAULT_PROBLEM);
        let problem = load_problem(file.path()).unwrap();
        assert_eq!(problem.mission.nodes.len(), 2);
        assert!(problem.sweep.dt > 0.0);
    }

    #[test]
    fn missing_time_step_names_its_path() {
        let mut value: serde_yaml::Value = serde_yaml::from_str(DEFAULT_PROBLEM).unwrap();
        value["fax"].as_mapping_mut().unwrap().remove("time_step");
        let file = write_temp(".yaml", &serde_yaml::to_string(&value).unwrap());
        let err = load_problem(file.path()).unwrap_err();
        assert_eq!(err.to_string(), "field 'Mission.Fax.time_step' must be set");
    }

    #[test]
    fn toml_extension_switches_parser() {
        let toml = r#"
keep_factor = 0.5

[functionality]
correction = 0.0
mismatch = 0.0
impulse = 1.0
time = 0.0

[time_settings]
start_date = "2026-01-01"
t0 = 0.0
t1 = 0.0
dt = 0.0

[fax]
period_factor = 1.0
toss_angles = 8
time_step = 864000.0
time_tolerance = 3600.0

[sax]
period_factor = 1.0
time_step = 864000.0
time_tolerance = 3600.0

[[nodes]]
type = "departure.circular"
parking_radius = 6.7e6
ephemeris = { body = "earth" }

[[nodes]]
type = "arrival.energy"
parking_radius = 3.6e6
energy_constant = -5.0e6
ephemeris = { body = "mars" }
"#;
        let file = write_temp(".toml", toml);
        let problem = load_problem(file.path()).unwrap();
        assert_eq!(problem.mission.legs(), 1);
        assert_eq!(problem.sweep.offsets(), vec![0.0]);
        assert_eq!(problem.weights.impulse, 1.0);
    }

    #[test]
    fn yaml_parse_errors_surface() {
        let file = write_temp(".yaml", "nodes: [");
        assert!(matches!(load_problem(file.path()), Err(ConfigError::Parse(_))));
    }
}
