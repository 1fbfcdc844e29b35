//! Top-level problem file and its conversion into a validated mission.

use std::path::Path;

use chrono::{DateTime, Utc};
use pathfinder_core::constants::GM_SUN;
use pathfinder_transfer::{
    BurnNodeTemplate, Ceiling, CostWeights, Mission, RefineConfig, SearchConfig, Sweep,
};
use serde::Deserialize;
use tracing::debug;

use crate::nodes::{EphemerisContext, NodeConfig};
use crate::{ConfigError, parse_start_date, require, seconds_since_j2000};

/// Raw problem file. Every section is optional at parse time; [`ProblemConfig::build`]
/// reports the first missing field by its dotted path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProblemConfig {
    pub functionality: CostWeights,
    pub time_settings: TimeSettings,
    pub keep_factor: Option<f64>,
    pub gm: Option<f64>,
    pub fax: SearchSection,
    pub sax: RefineSection,
    pub nodes: Vec<NodeConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TimeSettings {
    pub start_date: Option<String>,
    pub t0: Option<f64>,
    pub t1: Option<f64>,
    pub dt: Option<f64>,
    /// Sampling step of the cached ephemerides; unset queries the backends directly.
    pub discretisation: Option<f64>,
    pub chunk_size: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub period_factor: Option<f64>,
    pub toss_angles: Option<usize>,
    pub time_step: Option<f64>,
    pub time_tolerance: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RefineSection {
    pub period_factor: Option<f64>,
    pub toss_angles: Option<usize>,
    pub time_step: Option<f64>,
    pub time_tolerance: Option<f64>,
    pub burn_arc_fraction: Option<f64>,
    pub min_delta: Option<f64>,
    pub max_iterations: Option<usize>,
    pub toss_angle_step: Option<f64>,
    pub burn_point_step: Option<f64>,
    pub time_step_init: Option<f64>,
    pub simplex_tolerance: Option<f64>,
    pub burn_impulse_limit: Option<f64>,
    pub burn_impulse_a: Option<f64>,
    pub burn_impulse_k: Option<f64>,
}

/// Everything a solver run needs.
#[derive(Debug)]
pub struct Problem {
    pub mission: Mission,
    pub weights: CostWeights,
    pub sweep: Sweep,
    /// Calendar date of mission time zero.
    pub start_date: DateTime<Utc>,
}

/// Chunk length used when `discretisation` is set without `chunk_size`, in steps.
const DEFAULT_CHUNK_STEPS: f64 = 256.0;

impl ProblemConfig {
    pub fn build(&self, base_dir: &Path) -> Result<Problem, ConfigError> {
        let time = &self.time_settings;
        let start_date = parse_start_date(require(time.start_date.as_deref(), || {
            "Mission.TimeSettings.start_date".to_string()
        })?)?;
        let t0 = require(time.t0, || "Mission.TimeSettings.t0".to_string())?;
        let t1 = require(time.t1, || "Mission.TimeSettings.t1".to_string())?;
        let dt = require(time.dt, || "Mission.TimeSettings.dt".to_string())?;
        if !(t1 >= t0) {
            return Err(ConfigError::invalid("Mission.TimeSettings.t1", "must not precede t0"));
        }
        if !(dt >= 0.0) {
            return Err(ConfigError::invalid("Mission.TimeSettings.dt", "must not be negative"));
        }
        let keep_factor = require(self.keep_factor, || "Mission.keep_factor".to_string())?;
        if !(keep_factor > 0.0 && keep_factor <= 1.0) {
            return Err(ConfigError::invalid("Mission.keep_factor", "must lie in (0, 1]"));
        }

        let discretisation = time
            .discretisation
            .map(|step| (step, time.chunk_size.unwrap_or(step * DEFAULT_CHUNK_STEPS)));
        let context = EphemerisContext {
            base_dir,
            epoch: seconds_since_j2000(&start_date),
            discretisation,
        };
        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| node.build(index, &context))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(nodes = nodes.len(), %start_date, "problem nodes resolved");

        let mission = Mission::new(
            nodes,
            self.gm.unwrap_or(GM_SUN),
            t0,
            self.fax.build("Mission.Fax")?,
            self.sax.build("Mission.Sax")?,
        )?;
        Ok(Problem {
            mission,
            weights: self.functionality,
            sweep: Sweep {
                span: t1 - t0,
                dt,
                keep_factor,
                refine: true,
            },
            start_date,
        })
    }
}

impl SearchSection {
    pub fn build(&self, section: &str) -> Result<SearchConfig, ConfigError> {
        Ok(SearchConfig::new(
            require(self.period_factor, || format!("{section}.period_factor"))?,
            require(self.toss_angles, || format!("{section}.toss_angles"))?,
            require(self.time_step, || format!("{section}.time_step"))?,
            require(self.time_tolerance, || format!("{section}.time_tolerance"))?,
        ))
    }
}

impl RefineSection {
    pub fn build(&self, section: &str) -> Result<RefineConfig, ConfigError> {
        let search = SearchSection {
            period_factor: self.period_factor,
            toss_angles: Some(self.toss_angles.unwrap_or(1)),
            time_step: self.time_step,
            time_tolerance: self.time_tolerance,
        }
        .build(section)?;
        let impulse = Ceiling::new(
            self.burn_impulse_limit.unwrap_or(0.0),
            self.burn_impulse_a.unwrap_or(1.0),
            self.burn_impulse_k.unwrap_or(4.0),
        );
        let mut refine = RefineConfig::new(search, BurnNodeTemplate { impulse });
        if let Some(value) = self.burn_arc_fraction {
            refine.burn_arc_fraction = value;
        }
        if let Some(value) = self.min_delta {
            refine.min_delta = value;
        }
        if let Some(value) = self.max_iterations {
            refine.max_iterations = value;
        }
        if let Some(value) = self.toss_angle_step {
            refine.toss_angle_step = value;
        }
        if let Some(value) = self.burn_point_step {
            refine.burn_point_step = value;
        }
        if let Some(value) = self.time_step_init {
            refine.time_step = value;
        }
        if let Some(value) = self.simplex_tolerance {
            refine.simplex_tolerance = value;
        }
        Ok(refine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_PROBLEM;

    fn default_config() -> ProblemConfig {
        serde_yaml::from_str(DEFAULT_PROBLEM).unwrap()
    }

    #[test]
    fn template_fills_refinement_settings() {
        let problem = default_config().build(Path::new(".")).unwrap();
        assert_eq!(problem.mission.sax.max_iterations, 50);
        assert_eq!(problem.mission.sax.time_step, 43_200.0);
        assert_eq!(problem.mission.sax.search.toss_angle_count, 1);
        assert_eq!(problem.mission.fax.toss_angle_count, 36);
        assert_eq!(problem.mission.gm, GM_SUN);
        assert_eq!(problem.sweep.offsets().len(), 3);
    }

    #[test]
    fn missing_start_date_is_reported() {
        let mut config = default_config();
        config.time_settings.start_date = None;
        let err = config.build(Path::new(".")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "field 'Mission.TimeSettings.start_date' must be set"
        );
    }

    #[test]
    fn keep_factor_is_bounded() {
        let mut config = default_config();
        config.keep_factor = Some(1.5);
        assert!(matches!(
            config.build(Path::new(".")),
            Err(ConfigError::Invalid { ref field, .. }) if field == "Mission.keep_factor"
        ));
    }

    #[test]
    fn mission_validation_errors_pass_through() {
        let mut config = default_config();
        config.nodes.truncate(1);
        assert!(matches!(config.build(Path::new(".")), Err(ConfigError::Mission(_))));
    }

    #[test]
    fn discretisation_wraps_every_body() {
        let mut config = default_config();
        config.time_settings.discretisation = Some(86_400.0);
        let problem = config.build(Path::new(".")).unwrap();
        let earth = problem.mission.nodes[0].anchor.state(0.0).unwrap();
        assert!(pathfinder_core::vector::norm(&earth.position) > 1.4e11);
    }
}
