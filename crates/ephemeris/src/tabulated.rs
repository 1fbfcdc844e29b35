//! Ephemerides read from a precomputed state table.
//!
//! Tables are CSV files with the header `t,x,y,z,vx,vy,vz` (s, m, m/s), sorted by time.
//! Lookups between rows interpolate linearly; lookups outside the table clamp to the
//! first or last row.

use std::io::Read;
use std::path::{Path, PathBuf};

use pathfinder_core::vector::{Vector3, lerp};
use serde::Deserialize;

use crate::{Ephemerides, EphemerisError, StateVector, require_positive};

#[derive(Debug, Deserialize)]
struct Row {
    t: f64,
    x: f64,
    y: f64,
    z: f64,
    vx: f64,
    vy: f64,
    vz: f64,
}

#[derive(Debug, Clone)]
pub struct TabulatedEphemeris {
    times: Vec<f64>,
    states: Vec<StateVector>,
    gm: f64,
    period: f64,
    /// Added to query times before the table lookup.
    epoch_offset: f64,
}

impl TabulatedEphemeris {
    pub fn load<P: AsRef<Path>>(
        path: P,
        gm: f64,
        period: f64,
        epoch_offset: f64,
    ) -> Result<Self, EphemerisError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, path.to_path_buf(), gm, period, epoch_offset)
    }

    /// Parse a table from any reader; `origin` only labels errors.
    pub fn from_reader<R: Read>(
        reader: R,
        origin: PathBuf,
        gm: f64,
        period: f64,
        epoch_offset: f64,
    ) -> Result<Self, EphemerisError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut times = Vec::new();
        let mut states = Vec::new();
        for (row_index, record) in csv_reader.deserialize::<Row>().enumerate() {
            let row = record?;
            if let Some(&last) = times.last() {
                if row.t <= last {
                    return Err(EphemerisError::UnsortedTable {
                        path: origin,
                        row: row_index + 1,
                    });
                }
            }
            times.push(row.t);
            states.push(StateVector {
                position: [row.x, row.y, row.z],
                velocity: [row.vx, row.vy, row.vz],
            });
        }
        if times.is_empty() {
            return Err(EphemerisError::EmptyTable { path: origin });
        }
        tracing::debug!(rows = times.len(), path = %origin.display(), "loaded ephemeris table");
        Ok(Self {
            times,
            states,
            gm: require_positive("gm", gm)?,
            period: require_positive("period", period)?,
            epoch_offset,
        })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time span covered by the table, in query time.
    pub fn span(&self) -> (f64, f64) {
        let first = self.times.first().copied().unwrap_or_default();
        let last = self.times.last().copied().unwrap_or_default();
        (first - self.epoch_offset, last - self.epoch_offset)
    }

    fn interpolate(&self, t: f64) -> StateVector {
        let t = t + self.epoch_offset;
        let upper = self.times.partition_point(|&sample| sample <= t);
        if upper == 0 {
            return self.states[0];
        }
        if upper == self.times.len() {
            return self.states[upper - 1];
        }
        let (t0, t1) = (self.times[upper - 1], self.times[upper]);
        let (s0, s1) = (&self.states[upper - 1], &self.states[upper]);
        let fraction = (t - t0) / (t1 - t0);
        StateVector {
            position: lerp(&s0.position, &s1.position, fraction),
            velocity: lerp(&s0.velocity, &s1.velocity, fraction),
        }
    }
}

impl Ephemerides for TabulatedEphemeris {
    fn position(&self, t: f64) -> Vector3 {
        self.interpolate(t).position
    }

    fn velocity(&self, t: f64) -> Vector3 {
        self.interpolate(t).velocity
    }

    fn state(&self, t: f64) -> StateVector {
        self.interpolate(t)
    }

    fn gravitational_parameter(&self, _t: f64) -> f64 {
        self.gm
    }

    fn period(&self, _t: f64) -> f64 {
        self.period
    }
}
