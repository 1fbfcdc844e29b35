//! Two-phase mission solver.
//!
//! The first approximation enumerates chains over a discrete grid of toss angles and
//! departure times; the second refines retained chains continuously with burn points
//! inserted on every leg.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cost::CostWeights;
use crate::link::Link;
use crate::mission::{Mission, MissionError};

pub mod flight;
pub mod refine;

pub use flight::{Waypoint, compute_flight};
pub use refine::SecondApprox;

/// One leg of a chain with its node costs and the totals accumulated up to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightInfo {
    pub link: Link,
    pub impulse: f64,
    pub mismatch: f64,
    pub correction: f64,
    pub total_impulse: f64,
    pub total_mismatch: f64,
    pub total_correction: f64,
    /// Flight time from the chain's departure to the end of this leg.
    pub total_time: f64,
    /// Absolute epoch at the end of this leg.
    pub abs_time: f64,
}

/// Complete flight through every mission node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightChain {
    pub legs: Vec<FlightInfo>,
    pub impulse: f64,
    pub mismatch: f64,
    pub correction: f64,
    pub total_time: f64,
    pub start_time: f64,
}

impl FlightChain {
    /// Chain totals are the accumulated totals of the last leg; `None` for no legs.
    pub fn from_legs(legs: Vec<FlightInfo>) -> Option<Self> {
        let last = *legs.last()?;
        let start_time = legs[0].link.t0;
        Some(Self {
            impulse: last.total_impulse,
            mismatch: last.total_mismatch,
            correction: last.total_correction,
            total_time: last.total_time,
            start_time,
            legs,
        })
    }
}

/// Outcome of refining one chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinedChain {
    pub chain: FlightChain,
    pub cost: f64,
    pub iterations: usize,
}

/// Launch-window sweep: offsets `0, dt, …` up to `span`, then filtering and refinement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    pub span: f64,
    /// Offset step; zero runs a single pass at offset zero.
    pub dt: f64,
    /// Share of the observed cost range kept for refinement, in `(0, 1]`.
    pub keep_factor: f64,
    pub refine: bool,
}

impl Sweep {
    pub fn offsets(&self) -> Vec<f64> {
        if !(self.dt > 0.0) {
            return vec![0.0];
        }
        let count = (self.span / self.dt).floor().max(0.0) as usize;
        (0..=count).map(|i| i as f64 * self.dt).collect()
    }
}

/// Stores the chains found by both approximations, keyed by launch offset in seconds.
#[derive(Debug)]
pub struct PathFinder {
    mission: Mission,
    weights: CostWeights,
    first: BTreeMap<i64, Vec<FlightChain>>,
    second: BTreeMap<i64, Vec<RefinedChain>>,
}

impl PathFinder {
    pub fn new(mission: Mission, weights: CostWeights) -> Self {
        Self {
            mission,
            weights,
            first: BTreeMap::new(),
            second: BTreeMap::new(),
        }
    }

    pub fn mission(&self) -> &Mission {
        &self.mission
    }

    pub fn weights(&self) -> &CostWeights {
        &self.weights
    }

    /// Enumerate chains launched at `t0 + offset`, replacing any earlier run at that offset.
    pub fn first_approx(&mut self, offset: f64) -> Result<&[FlightChain], MissionError> {
        let angles = self.mission.fax.toss_angles();
        let waypoints: Vec<Waypoint<'_>> = self
            .mission
            .nodes
            .iter()
            .map(|node| Waypoint {
                node,
                toss_angles: &angles,
            })
            .collect();
        let chains = compute_flight(
            &waypoints,
            self.mission.t0 + offset,
            self.mission.gm,
            &self.mission.fax,
            false,
        )?;
        info!(offset, chains = chains.len(), "first approximation");

        let bucket = self.first.entry(offset.round() as i64).or_default();
        *bucket = chains;
        Ok(bucket.as_slice())
    }

    /// Smallest and largest finite cost over every stored first-approximation chain.
    pub fn cost_bounds(&self) -> Option<(f64, f64)> {
        self.first
            .values()
            .flatten()
            .map(|chain| self.weights.score(chain))
            .filter(|cost| cost.is_finite())
            .fold(None, |bounds, cost| match bounds {
                None => Some((cost, cost)),
                Some((lo, hi)) => Some((f64::min(lo, cost), f64::max(hi, cost))),
            })
    }

    /// Threshold keeping `keep_factor` of the observed cost range.
    pub fn keep_threshold(&self, keep_factor: f64) -> Option<f64> {
        self.cost_bounds().map(|(lo, hi)| lo + (hi - lo) * keep_factor)
    }

    /// Drop chains costing more than `threshold` and any offset left empty.
    pub fn filter(&mut self, threshold: f64) {
        let weights = self.weights;
        for chains in self.first.values_mut() {
            chains.retain(|chain| weights.score(chain) <= threshold);
        }
        self.first.retain(|_, chains| !chains.is_empty());
    }

    /// Refine every stored first-approximation chain; chains that never reach a finite
    /// cost are left out.
    pub fn second_approx(&mut self) -> Result<(), MissionError> {
        let solver = SecondApprox::new(&self.mission, &self.weights);
        let mut second = BTreeMap::new();
        for (&offset, chains) in &self.first {
            let mut refined = Vec::new();
            for chain in chains {
                if let Some(result) = solver.refine(chain)? {
                    refined.push(result);
                }
            }
            if !refined.is_empty() {
                second.insert(offset, refined);
            }
        }
        self.second = second;
        Ok(())
    }

    /// Run every offset of `sweep`, filter, and optionally refine.
    pub fn sweep(&mut self, sweep: &Sweep) -> Result<(), MissionError> {
        for offset in sweep.offsets() {
            self.first_approx(offset)?;
        }
        if let Some(threshold) = self.keep_threshold(sweep.keep_factor) {
            self.filter(threshold);
        }
        if sweep.refine {
            self.second_approx()?;
        }
        Ok(())
    }

    pub fn first_db(&self) -> &BTreeMap<i64, Vec<FlightChain>> {
        &self.first
    }

    pub fn second_db(&self) -> &BTreeMap<i64, Vec<RefinedChain>> {
        &self.second
    }

    pub fn first_len(&self) -> usize {
        self.first.values().map(Vec::len).sum()
    }

    pub fn second_len(&self) -> usize {
        self.second.values().map(Vec::len).sum()
    }
}
