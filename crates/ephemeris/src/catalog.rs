//! Built-in catalogue of mean circular heliocentric orbits.

use std::f64::consts::TAU;

use pathfinder_core::constants::SECONDS_PER_DAY;

use crate::{CircularOrbit, EphemerisError};

/// Mean orbital and physical constants of a catalogued body (SI units).
#[derive(Debug, Clone, Copy)]
pub struct BodyDescriptor {
    pub name: &'static str,
    /// Gravitational parameter (m³/s²).
    pub gm: f64,
    /// Mean heliocentric distance (m).
    pub orbit_radius: f64,
    /// Sidereal period (days).
    pub period_days: f64,
    /// Mean longitude at J2000 (deg).
    pub mean_longitude_deg: f64,
    /// Equatorial radius (m).
    pub radius: f64,
    /// Sphere-of-influence radius (m).
    pub sphere_radius: f64,
}

impl BodyDescriptor {
    pub fn period(&self) -> f64 {
        self.period_days * SECONDS_PER_DAY
    }

    /// Circular orbit whose `t = 0` sits `seconds_since_j2000` after J2000.
    pub fn circular_orbit(&self, seconds_since_j2000: f64) -> Result<CircularOrbit, EphemerisError> {
        let period = self.period();
        let phase = self.mean_longitude_deg.to_radians() + TAU * seconds_since_j2000 / period;
        CircularOrbit::new(self.gm, self.orbit_radius, period, phase.rem_euclid(TAU))
    }
}

/// Bodies available by name.
pub const BODY_CATALOG: &[BodyDescriptor] = &[
    BodyDescriptor {
        name: "mercury",
        gm: 2.2032e13,
        orbit_radius: 5.790_9e10,
        period_days: 87.969,
        mean_longitude_deg: 252.25,
        radius: 2.439_7e6,
        sphere_radius: 1.12e8,
    },
    BodyDescriptor {
        name: "venus",
        gm: 3.248_59e14,
        orbit_radius: 1.082_09e11,
        period_days: 224.701,
        mean_longitude_deg: 181.98,
        radius: 6.051_8e6,
        sphere_radius: 6.16e8,
    },
    BodyDescriptor {
        name: "earth",
        gm: 3.986_004e14,
        orbit_radius: 1.495_98e11,
        period_days: 365.256,
        mean_longitude_deg: 100.46,
        radius: 6.371e6,
        sphere_radius: 9.25e8,
    },
    BodyDescriptor {
        name: "mars",
        gm: 4.282_837e13,
        orbit_radius: 2.279_56e11,
        period_days: 686.980,
        mean_longitude_deg: 355.45,
        radius: 3.389_5e6,
        sphere_radius: 5.77e8,
    },
    BodyDescriptor {
        name: "jupiter",
        gm: 1.266_865_34e17,
        orbit_radius: 7.784_79e11,
        period_days: 4_332.59,
        mean_longitude_deg: 34.40,
        radius: 6.991_1e7,
        sphere_radius: 4.82e10,
    },
];

/// Case-insensitive lookup in [`BODY_CATALOG`].
pub fn find_body(name: &str) -> Result<&'static BodyDescriptor, EphemerisError> {
    let lower = name.trim().to_ascii_lowercase();
    BODY_CATALOG
        .iter()
        .find(|body| body.name == lower)
        .ok_or_else(|| EphemerisError::UnknownBody(name.to_string()))
}
