//! Ephemerides providers consumed by the trajectory search.
//!
//! Every backend answers the same five queries through [`Ephemerides`]. Handles are
//! shared as [`SharedEphemerides`] and passed explicitly to whoever needs them.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use pathfinder_core::vector::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod catalog;
pub mod circular;
pub mod sampled;
pub mod tabulated;

pub use catalog::{BODY_CATALOG, BodyDescriptor, find_body};
pub use circular::CircularOrbit;
pub use sampled::SampledEphemeris;
pub use tabulated::TabulatedEphemeris;

/// Position and velocity of a body at one instant (m, m/s).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    pub position: Vector3,
    pub velocity: Vector3,
}

/// Time-indexed body state lookup. Times are seconds from the mission epoch.
pub trait Ephemerides: fmt::Debug + Send + Sync {
    fn position(&self, t: f64) -> Vector3;

    fn velocity(&self, t: f64) -> Vector3;

    fn state(&self, t: f64) -> StateVector {
        StateVector {
            position: self.position(t),
            velocity: self.velocity(t),
        }
    }

    /// Gravitational parameter of the body itself (m³/s²).
    fn gravitational_parameter(&self, t: f64) -> f64;

    /// Orbital period of the body about the central body (s).
    fn period(&self, t: f64) -> f64;
}

/// Shared handle to an ephemerides backend.
pub type SharedEphemerides = Arc<dyn Ephemerides>;

/// Errors surfaced while constructing or loading ephemerides.
#[derive(Debug, Error)]
pub enum EphemerisError {
    #[error("failed to read ephemeris table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse ephemeris table: {0}")]
    Csv(#[from] csv::Error),
    #[error("ephemeris table {path} holds no samples")]
    EmptyTable { path: PathBuf },
    #[error("ephemeris table {path} is not sorted by time at row {row}")]
    UnsortedTable { path: PathBuf, row: usize },
    #[error("invalid ephemeris parameter `{name}` = {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("unknown body `{0}`")]
    UnknownBody(String),
}

pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<f64, EphemerisError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(EphemerisError::InvalidParameter { name, value })
    }
}
