//! Scalar cost ("functionality") of a complete flight chain.

use serde::{Deserialize, Serialize};

use crate::solver::FlightChain;

/// Weights of the chain totals in the cost. Unset weights are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostWeights {
    pub correction: f64,
    pub mismatch: f64,
    pub impulse: f64,
    pub time: f64,
}

impl CostWeights {
    pub fn score(&self, chain: &FlightChain) -> f64 {
        self.correction * chain.correction
            + self.mismatch * chain.mismatch
            + self.impulse * chain.impulse
            + self.time * chain.total_time
    }
}
