//! Closed-form circular orbit in the reference xy-plane.

use std::f64::consts::TAU;

use pathfinder_core::vector::Vector3;
use serde::{Deserialize, Serialize};

use crate::{Ephemerides, EphemerisError, require_positive};

/// Body on a circular, counter-clockwise orbit about the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircularOrbit {
    /// Gravitational parameter of the body (m³/s²).
    pub gm: f64,
    /// Orbit radius (m).
    pub radius: f64,
    /// Orbital period (s).
    pub period: f64,
    /// Angular position at `t = 0` (rad).
    pub phase: f64,
}

impl CircularOrbit {
    pub fn new(gm: f64, radius: f64, period: f64, phase: f64) -> Result<Self, EphemerisError> {
        Ok(Self {
            gm: require_positive("gm", gm)?,
            radius: require_positive("radius", radius)?,
            period: require_positive("period", period)?,
            phase,
        })
    }

    /// Angular position at time `t`.
    #[inline]
    pub fn angle(&self, t: f64) -> f64 {
        self.phase + TAU * t / self.period
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        TAU * self.radius / self.period
    }
}

impl Ephemerides for CircularOrbit {
    fn position(&self, t: f64) -> Vector3 {
        let (s, c) = self.angle(t).sin_cos();
        [self.radius * c, self.radius * s, 0.0]
    }

    fn velocity(&self, t: f64) -> Vector3 {
        let (s, c) = self.angle(t).sin_cos();
        let v = self.speed();
        [-v * s, v * c, 0.0]
    }

    fn gravitational_parameter(&self, _t: f64) -> f64 {
        self.gm
    }

    fn period(&self, _t: f64) -> f64 {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pathfinder_core::vector::{dot, norm};

    #[test]
    fn quarter_period_moves_quarter_turn() {
        let orbit = CircularOrbit::new(3.986e14, 1.496e11, 3.16e7, 0.0).unwrap();
        let p = orbit.position(3.16e7 / 4.0);
        assert_abs_diff_eq!(p[0], 0.0, epsilon = 1.0);
        assert_abs_diff_eq!(p[1], 1.496e11, epsilon = 1.0);
    }

    #[test]
    fn velocity_is_tangential() {
        let orbit = CircularOrbit::new(1.0, 2.0e11, 5.0e7, 1.3).unwrap();
        let state = orbit.state(1.2e6);
        let cosine = dot(&state.position, &state.velocity)
            / (norm(&state.position) * norm(&state.velocity));
        assert_abs_diff_eq!(cosine, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(norm(&state.velocity), orbit.speed(), epsilon = 1e-9);
    }

    #[test]
    fn rejects_non_positive_period() {
        assert!(matches!(
            CircularOrbit::new(1.0, 1.0, 0.0, 0.0),
            Err(EphemerisError::InvalidParameter { name: "period", .. })
        ));
    }
}
