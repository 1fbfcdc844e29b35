//! Mission node entries of the problem file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pathfinder_ephemeris::{
    BodyDescriptor, CircularOrbit, SampledEphemeris, SharedEphemerides, TabulatedEphemeris,
    find_body,
};
use pathfinder_transfer::{Ceiling, FlyByNode, Node, ParkingNode, ParkingOrbit};
use serde::Deserialize;

use crate::{ConfigError, require};

/// One node, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum NodeConfig {
    #[serde(rename = "departure.circular")]
    DepartureCircular(ParkingConfig),
    #[serde(rename = "departure.energy")]
    DepartureEnergy(ParkingConfig),
    #[serde(rename = "arrival.circular")]
    ArrivalCircular(ParkingConfig),
    #[serde(rename = "arrival.energy")]
    ArrivalEnergy(ParkingConfig),
    #[serde(rename = "flyby")]
    FlyBy(FlyByConfig),
}

fn one() -> f64 {
    1.0
}

fn four() -> f64 {
    4.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParkingConfig {
    #[serde(default)]
    pub ephemeris: Option<EphemerisConfig>,
    /// Defaults to the catalogue value for `body` ephemerides.
    #[serde(default)]
    pub sphere_radius: Option<f64>,
    #[serde(default)]
    pub parking_radius: Option<f64>,
    /// Orbital energy of the parking orbit; only read by `*.energy` nodes.
    #[serde(default)]
    pub energy_constant: Option<f64>,
    #[serde(default)]
    pub impulse_limit: f64,
    #[serde(default = "one")]
    pub impulse_a: f64,
    #[serde(default = "four")]
    pub impulse_k: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlyByConfig {
    #[serde(default)]
    pub ephemeris: Option<EphemerisConfig>,
    #[serde(default)]
    pub sphere_radius: Option<f64>,
    #[serde(default)]
    pub planet_radius: Option<f64>,
    #[serde(default)]
    pub mismatch_limit: f64,
    #[serde(default = "one")]
    pub mismatch_a: f64,
    #[serde(default = "four")]
    pub mismatch_k: f64,
    #[serde(default = "one")]
    pub kink_a: f64,
    #[serde(default = "one")]
    pub kink_k: f64,
}

/// Exactly one of the three sources must be given.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EphemerisConfig {
    /// Catalogue body name.
    pub body: Option<String>,
    pub circular: Option<CircularConfig>,
    pub table: Option<TableConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CircularConfig {
    pub gm: f64,
    pub radius: f64,
    pub period: f64,
    #[serde(default)]
    pub phase: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    pub path: PathBuf,
    pub gm: f64,
    pub period: f64,
    #[serde(default)]
    pub epoch_offset: f64,
}

/// What ephemeris resolution needs besides the entry itself.
#[derive(Debug, Clone, Copy)]
pub struct EphemerisContext<'a> {
    pub base_dir: &'a Path,
    /// Seconds from J2000 to mission time zero.
    pub epoch: f64,
    /// `(step, chunk_size)` of the sampled cache.
    pub discretisation: Option<(f64, f64)>,
}

struct Resolved {
    handle: SharedEphemerides,
    body: Option<&'static BodyDescriptor>,
}

impl NodeConfig {
    pub fn build(&self, index: usize, context: &EphemerisContext<'_>) -> Result<Node, ConfigError> {
        let section = format!("Mission.Nodes[{index}]");
        match self {
            NodeConfig::DepartureCircular(config) => {
                let (handle, params) = config.build(&section, false, context)?;
                Ok(Node::departure(handle, params))
            }
            NodeConfig::DepartureEnergy(config) => {
                let (handle, params) = config.build(&section, true, context)?;
                Ok(Node::departure(handle, params))
            }
            NodeConfig::ArrivalCircular(config) => {
                let (handle, params) = config.build(&section, false, context)?;
                Ok(Node::arrival(handle, params))
            }
            NodeConfig::ArrivalEnergy(config) => {
                let (handle, params) = config.build(&section, true, context)?;
                Ok(Node::arrival(handle, params))
            }
            NodeConfig::FlyBy(config) => {
                let (handle, params) = config.build(&section, context)?;
                Ok(Node::flyby(handle, params))
            }
        }
    }
}

impl ParkingConfig {
    fn build(
        &self,
        section: &str,
        energy: bool,
        context: &EphemerisContext<'_>,
    ) -> Result<(SharedEphemerides, ParkingNode), ConfigError> {
        let resolved = resolve(self.ephemeris.as_ref(), section, context)?;
        let sphere_radius = require(
            self.sphere_radius.or(resolved.body.map(|b| b.sphere_radius)),
            || format!("{section}.sphere_radius"),
        )?;
        let parking_radius = require(self.parking_radius, || format!("{section}.parking_radius"))?;
        let parking = if energy {
            ParkingOrbit::Energy(require(self.energy_constant, || {
                format!("{section}.energy_constant")
            })?)
        } else {
            ParkingOrbit::Circular
        };
        let params = ParkingNode {
            parking,
            parking_radius,
            sphere_radius,
            impulse: Ceiling::new(self.impulse_limit, self.impulse_a, self.impulse_k),
        };
        Ok((resolved.handle, params))
    }
}

impl FlyByConfig {
    fn build(
        &self,
        section: &str,
        context: &EphemerisContext<'_>,
    ) -> Result<(SharedEphemerides, FlyByNode), ConfigError> {
        let resolved = resolve(self.ephemeris.as_ref(), section, context)?;
        let sphere_radius = require(
            self.sphere_radius.or(resolved.body.map(|b| b.sphere_radius)),
            || format!("{section}.sphere_radius"),
        )?;
        let planet_radius = require(
            self.planet_radius.or(resolved.body.map(|b| b.radius)),
            || format!("{section}.planet_radius"),
        )?;
        let params = FlyByNode {
            planet_radius,
            sphere_radius,
            mismatch: Ceiling::new(self.mismatch_limit, self.mismatch_a, self.mismatch_k),
            kink_a: self.kink_a,
            kink_k: self.kink_k,
        };
        Ok((resolved.handle, params))
    }
}

fn resolve(
    config: Option<&EphemerisConfig>,
    section: &str,
    context: &EphemerisContext<'_>,
) -> Result<Resolved, ConfigError> {
    let config = require(config, || format!("{section}.ephemeris"))?;
    let resolved = match (&config.body, &config.circular, &config.table) {
        (Some(name), None, None) => {
            let body = find_body(name)?;
            let handle: SharedEphemerides = Arc::new(body.circular_orbit(context.epoch)?);
            Resolved {
                handle,
                body: Some(body),
            }
        }
        (None, Some(circular), None) => {
            let handle: SharedEphemerides = Arc::new(CircularOrbit::new(
                circular.gm,
                circular.radius,
                circular.period,
                circular.phase,
            )?);
            Resolved { handle, body: None }
        }
        (None, None, Some(table)) => {
            let path = context.base_dir.join(&table.path);
            let handle: SharedEphemerides = Arc::new(TabulatedEphemeris::load(
                path,
                table.gm,
                table.period,
                table.epoch_offset,
            )?);
            Resolved { handle, body: None }
        }
        _ => {
            return Err(ConfigError::invalid(
                format!("{section}.ephemeris"),
                "set exactly one of `body`, `circular` or `table`",
            ));
        }
    };

    match context.discretisation {
        Some((step, chunk_size)) => Ok(Resolved {
            handle: Arc::new(SampledEphemeris::new(resolved.handle, step, chunk_size)?),
            body: resolved.body,
        }),
        None => Ok(resolved),
    }
}
