//! Default problem file written by `pathfinder-init`.

use std::path::Path;

use crate::ConfigError;

/// Earth to Mars with catalogue ephemerides. Times are seconds from `start_date`,
/// distances metres.
pub const DEFAULT_PROBLEM: &str = r#"# Trajectory search problem.
# Times are seconds from start_date, distances metres, speeds m/s.

# cost = correction*C + mismatch*M + impulse*I + time*T
functionality:
  correction: 1.0
  mismatch: 1.0
  impulse: 1.0
  time: 0.0

time_settings:
  start_date: "2026-09-01"
  # launch offsets t0, t0 + dt, ... up to t1
  t0: 0.0
  t1: 2592000.0
  dt: 1296000.0
  # uncomment to sample body ephemerides on a fixed step
  # discretisation: 3600.0
  # chunk_size: 2592000.0

# share of the first-approximation cost range kept for refinement
keep_factor: 0.5

# central body GM, defaults to the Sun
# gm: 1.32712440018e20

# first approximation: discrete toss angles and departure-time grid
fax:
  period_factor: 1.0
  toss_angles: 36
  time_step: 432000.0
  time_tolerance: 3600.0

# second approximation: continuous refinement with a burn on every leg
sax:
  period_factor: 1.0
  time_step: 432000.0
  time_tolerance: 3600.0
  burn_arc_fraction: 0.5
  min_delta: 0.1
  max_iterations: 50
  toss_angle_step: 0.001
  burn_point_step: 1000000.0
  time_step_init: 43200.0
  # burn_impulse_limit: 0.0 disables the ceiling
  burn_impulse_limit: 0.0
  burn_impulse_a: 1.0
  burn_impulse_k: 4.0

# node types: departure.circular, departure.energy, arrival.circular, arrival.energy, flyby
# ephemeris: {body: name} | {circular: {gm, radius, period, phase}} | {table: {path, gm, period, epoch_offset}}
nodes:
  - type: departure.circular
    ephemeris:
      body: earth
    parking_radius: 6671000.0
  - type: arrival.circular
    ephemeris:
      body: mars
    parking_radius: 3690000.0
"#;

/// Write [`DEFAULT_PROBLEM`] to `path`, creating parent directories.
pub fn write_default_problem(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, DEFAULT_PROBLEM)?;
    Ok(())
}
