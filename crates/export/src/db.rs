//! First- and second-approximation result databases.
//!
//! Both are written as pretty JSON objects `{ "flights": [...] }`, one row per chain.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use pathfinder_transfer::{CostWeights, FlightChain, RefinedChain};
use serde::{Deserialize, Serialize};

use crate::{ExportError, writer_for_path};

/// One stored chain with its cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRow {
    /// Launch offset (s) of the first-approximation run the chain came from.
    pub offset: i64,
    pub functionality: f64,
    /// Refinement iterations; absent for first-approximation rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<usize>,
    pub chain: FlightChain,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightDb {
    pub flights: Vec<FlightRow>,
}

impl FlightDb {
    pub fn from_first(first: &BTreeMap<i64, Vec<FlightChain>>, weights: &CostWeights) -> Self {
        let flights = first
            .iter()
            .flat_map(|(&offset, chains)| {
                chains.iter().map(move |chain| FlightRow {
                    offset,
                    functionality: weights.score(chain),
                    iterations: None,
                    chain: chain.clone(),
                })
            })
            .collect();
        Self { flights }
    }

    pub fn from_second(second: &BTreeMap<i64, Vec<RefinedChain>>) -> Self {
        let flights = second
            .iter()
            .flat_map(|(&offset, refined)| {
                refined.iter().map(move |result| FlightRow {
                    offset,
                    functionality: result.cost,
                    iterations: Some(result.iterations),
                    chain: result.chain.clone(),
                })
            })
            .collect();
        Self { flights }
    }

    pub fn flight(&self, index: usize) -> Result<&FlightRow, ExportError> {
        self.flights.get(index).ok_or(ExportError::MissingFlight {
            index,
            len: self.flights.len(),
        })
    }
}

/// `<problem>.fax.json` and `<problem>.sax.json` next to the problem file.
pub fn db_paths(problem: &Path) -> (PathBuf, PathBuf) {
    let with_suffix = |suffix: &str| {
        let mut name = problem.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    };
    (with_suffix(".fax.json"), with_suffix(".sax.json"))
}

pub fn write_db(path: &Path, db: &FlightDb) -> Result<(), ExportError> {
    let mut writer = writer_for_path(path)?;
    serde_json::to_writer_pretty(&mut writer, db)?;
    writer.flush()?;
    tracing::debug!(path = %path.display(), flights = db.flights.len(), "wrote flight database");
    Ok(())
}

pub fn read_db(path: &Path) -> Result<FlightDb, ExportError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathfinder_transfer::FlightInfo;

    fn chain(impulse: f64) -> FlightChain {
        let mut leg = FlightInfo {
            impulse,
            total_impulse: impulse,
            total_time: 1.5e7,
            abs_time: 1.5e7,
            ..FlightInfo::default()
        };
        leg.link.t1 = 1.5e7;
        leg.link.r0 = [1.496e11, 0.0, 0.0];
        FlightChain::from_legs(vec![leg]).unwrap()
    }

    #[test]
    fn first_rows_carry_offset_and_cost() {
        let mut first = BTreeMap::new();
        first.insert(0, vec![chain(3.0e3), chain(4.0e3)]);
        first.insert(86_400, vec![chain(5.0e3)]);
        let weights = CostWeights {
            impulse: 2.0,
            ..CostWeights::default()
        };
        let db = FlightDb::from_first(&first, &weights);
        let offsets: Vec<i64> = db.flights.iter().map(|row| row.offset).collect();
        assert_eq!(offsets, vec![0, 0, 86_400]);
        assert_eq!(db.flights[2].functionality, 1.0e4);
        assert!(db.flights.iter().all(|row| row.iterations.is_none()));
    }

    #[test]
    fn suffixes_are_appended_to_the_problem_name() {
        let (fax, sax) = db_paths(Path::new("runs/problem.yaml"));
        assert_eq!(fax, PathBuf::from("runs/problem.yaml.fax.json"));
        assert_eq!(sax, PathBuf::from("runs/problem.yaml.sax.json"));
    }

    #[test]
    fn missing_index_is_reported() {
        let err = FlightDb::default().flight(2).unwrap_err();
        assert_eq!(err.to_string(), "database holds 0 flights, index 2 is out of range");
    }
}
