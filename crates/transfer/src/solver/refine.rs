//! Continuous refinement of first-approximation chains.
//!
//! Every leg is split by a free burn point. The parameter vector holds five entries per
//! mission leg (leg toss angle, burn toss angle, burn position) and the launch epoch last.

use std::slice;

use pathfinder_minimize::{MinimizeError, StopCriteria, minimize};
use tracing::{debug, info, warn};

use crate::cost::CostWeights;
use crate::mission::{Mission, MissionError};
use crate::nodes::Node;

use super::flight::{Waypoint, compute_flight};
use super::{FlightChain, RefinedChain};

const PER_LEG: usize = 5;

/// Refines chains of one mission under one cost.
#[derive(Debug, Clone, Copy)]
pub struct SecondApprox<'a> {
    mission: &'a Mission,
    weights: &'a CostWeights,
}

impl<'a> SecondApprox<'a> {
    pub fn new(mission: &'a Mission, weights: &'a CostWeights) -> Self {
        Self { mission, weights }
    }

    /// Minimize the cost around `seed`.
    ///
    /// Returns `Ok(None)` when no chain with a finite cost can be rebuilt from the seed.
    pub fn refine(&self, seed: &FlightChain) -> Result<Option<RefinedChain>, MissionError> {
        let expected = self.mission.legs();
        if seed.legs.len() != expected {
            return Err(MissionError::ChainShape {
                expected,
                found: seed.legs.len(),
            });
        }
        let (x0, steps) = self.initial_simplex(seed);
        if self.evaluate(&x0)?.is_none() {
            warn!(start_time = seed.start_time, "dropping chain without a finite refined cost");
            return Ok(None);
        }

        let mut failure = None;
        let (point, iterations) = {
            let objective = |x: &[f64]| match self.evaluate(x) {
                Ok(Some((cost, _))) => cost,
                Ok(None) => f64::NAN,
                Err(err) => {
                    failure.get_or_insert(err);
                    f64::NAN
                }
            };
            match minimize(objective, &x0, &steps, self.stop_criteria()) {
                Ok(min) => {
                    debug!(stop = ?min.stop, iterations = min.iterations, "simplex stopped");
                    (min.point, min.iterations)
                }
                Err(MinimizeError::Unevaluable) => (x0.clone(), 0),
                Err(err) => return Err(err.into()),
            }
        };
        if let Some(err) = failure {
            return Err(err);
        }

        let Some((cost, chain)) = self.evaluate(&point)? else {
            warn!(start_time = seed.start_time, "refined point lost its chain");
            return Ok(None);
        };
        info!(iterations, cost, "refined chain");
        Ok(Some(RefinedChain {
            chain,
            cost,
            iterations,
        }))
    }

    /// The run ends at `max_iterations`, once the simplex is smaller than
    /// `simplex_tolerance`, or once the best cost moves by less than `min_delta` in one
    /// iteration.
    fn stop_criteria(&self) -> StopCriteria {
        let sax = &self.mission.sax;
        StopCriteria {
            min_delta: Some(sax.min_delta),
            ..StopCriteria::new(sax.max_iterations, sax.simplex_tolerance)
        }
    }

    fn initial_simplex(&self, seed: &FlightChain) -> (Vec<f64>, Vec<f64>) {
        let sax = &self.mission.sax;
        let mut x0 = Vec::with_capacity(PER_LEG * seed.legs.len() + 1);
        let mut steps = Vec::with_capacity(x0.capacity());
        for leg in &seed.legs {
            let (point, toss) = leg.link.burn_seed(sax.burn_arc_fraction);
            x0.extend([leg.link.f0, toss]);
            x0.extend(point);
            steps.extend([sax.toss_angle_step; 2]);
            steps.extend([sax.burn_point_step; 3]);
        }
        x0.push(seed.start_time);
        steps.push(sax.time_step);
        (x0, steps)
    }

    /// Best chain through the mission nodes with a burn inserted on every leg.
    fn evaluate(&self, x: &[f64]) -> Result<Option<(f64, FlightChain)>, MissionError> {
        let legs = self.mission.legs();
        let burns: Vec<Node> = (0..legs)
            .map(|i| {
                let at = PER_LEG * i + 2;
                self.mission.sax.burn.spawn([x[at], x[at + 1], x[at + 2]])
            })
            .collect();

        let mut waypoints = Vec::with_capacity(2 * legs + 1);
        for (i, burn) in burns.iter().enumerate() {
            waypoints.push(Waypoint {
                node: &self.mission.nodes[i],
                toss_angles: slice::from_ref(&x[PER_LEG * i]),
            });
            waypoints.push(Waypoint {
                node: burn,
                toss_angles: slice::from_ref(&x[PER_LEG * i + 1]),
            });
        }
        waypoints.push(Waypoint {
            node: &self.mission.nodes[legs],
            toss_angles: &[],
        });

        let chains = compute_flight(
            &waypoints,
            x[PER_LEG * legs],
            self.mission.gm,
            &self.mission.sax.search,
            true,
        )?;
        let best = chains
            .into_iter()
            .map(|chain| (self.weights.score(&chain), chain))
            .filter(|(cost, _)| cost.is_finite())
            .min_by(|a, b| a.0.total_cmp(&b.0));
        Ok(best)
    }
}
