//! Closed-form elliptic transfer between two coplanar radii.
//!
//! Angles named `big_q*` are measured from a fixed in-plane reference direction,
//! angles named `q*` from periapsis. The toss angle `f0` is the direction of the
//! departure velocity in the reference frame.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use pathfinder_core::angle::normalize;
use serde::{Deserialize, Serialize};

/// Highest eccentricity accepted for a transfer arc.
pub const ECCENTRICITY_CEILING: f64 = 0.99;

/// Relative radius difference below which both radii are treated as equal.
const RADIUS_RATIO_EPS: f64 = 1e-4;
/// Toss angles closer than this to the radial direction have no solution.
const RADIAL_TOSS_EPS: f64 = 1e-4;
const CIRCULAR_EPS: f64 = 1e-6;
const KEPLER_ITERATIONS: usize = 64;
const KEPLER_TOL: f64 = 1e-14;

/// Elliptic transfer arc with its time of flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferOrbit {
    /// Eccentricity.
    pub e: f64,
    /// Semi-latus rectum.
    pub p: f64,
    /// Semi-major axis.
    pub a: f64,
    /// Argument of periapsis relative to the reference direction (`q = Q + w`).
    pub w: f64,
    /// Departure true anomaly.
    pub q0: f64,
    /// Arrival true anomaly, always in `(q0, q0 + 2π]`.
    pub q1: f64,
    /// `true` when the arc is flown with increasing anomaly (short-way branch).
    pub prograde: bool,
    /// Time of flight.
    pub dt: f64,
}

impl TransferOrbit {
    /// Solve the transfer from `(r0, big_q0)` to `(r1, big_q1)` leaving along `f0`.
    ///
    /// Returns `None` when no ellipse with `0 ≤ e < eccentricity_ceiling` connects the
    /// two points or the time of flight is not finite.
    pub fn solve(
        r0: f64,
        r1: f64,
        big_q0: f64,
        big_q1: f64,
        f0: f64,
        gm: f64,
        eccentricity_ceiling: f64,
    ) -> Option<Self> {
        let (e, p, w, q0, q1) = shape(r0, r1, big_q0, big_q1, f0, eccentricity_ceiling)?;
        let a = semi_major_axis(e, p);
        let prograde = is_prograde(big_q0, f0);
        let m0 = mean_anomaly(eccentric_anomaly(q0, e), e);
        let m1 = mean_anomaly(eccentric_anomaly(q1, e), e);
        let dt = time_of_flight(m0, m1, a, gm, prograde);
        if !dt.is_finite() || dt < 0.0 {
            return None;
        }
        Some(Self {
            e,
            p,
            a,
            w,
            q0,
            q1,
            prograde,
            dt,
        })
    }

    #[inline]
    pub fn radius_at(&self, q: f64) -> f64 {
        crate::radius(self.p, self.e, q)
    }

    #[inline]
    pub fn speed_at(&self, q: f64, gm: f64) -> f64 {
        speed(q, self.e, self.p, gm)
    }

    /// Velocity direction at periapsis anomaly `q`, given the matching reference anomaly.
    #[inline]
    pub fn direction_at(&self, big_q: f64, q: f64) -> f64 {
        flight_direction(big_q, q, self.e, self.prograde)
    }

    /// Anomaly swept along the direction of flight.
    pub fn swept_angle(&self) -> f64 {
        if self.prograde {
            self.q1 - self.q0
        } else {
            TAU - (self.q1 - self.q0)
        }
    }

    /// Periapsis anomaly reached after flying `fraction` of the arc.
    pub fn anomaly_at_fraction(&self, fraction: f64) -> f64 {
        let swept = self.swept_angle() * fraction;
        if self.prograde {
            self.q0 + swept
        } else {
            self.q0 - swept
        }
    }

    /// Orbital period.
    pub fn period(&self, gm: f64) -> f64 {
        TAU * (self.a.powi(3) / gm).sqrt()
    }

    /// True anomaly reached `dt` seconds after passing `q_start`, in `[0, 2π)`.
    pub fn propagate(&self, q_start: f64, dt: f64, gm: f64) -> f64 {
        let n = (gm / self.a.powi(3)).sqrt();
        let m_start = mean_anomaly(eccentric_anomaly(normalize(q_start), self.e), self.e);
        let m = if self.prograde {
            m_start + n * dt
        } else {
            m_start - n * dt
        };
        let big_e = solve_kepler(normalize(m), self.e);
        normalize(true_from_eccentric(big_e, self.e))
    }
}

/// Eccentricity, semi-latus rectum, argument of periapsis and periapsis anomalies
/// `(e, p, w, q0, q1)` for the first admissible root.
pub fn shape(
    r0: f64,
    r1: f64,
    big_q0: f64,
    big_q1: f64,
    f0: f64,
    eccentricity_ceiling: f64,
) -> Option<(f64, f64, f64, f64, f64)> {
    if (big_q0 - f0).abs() <= RADIAL_TOSS_EPS {
        return None;
    }
    let w0 = argument_of_periapsis(r0, r1, big_q0, big_q1, f0);
    for k in 0..2 {
        let wk = w0 + k as f64 * PI;
        let (q0, q1) = periapsis_anomalies(big_q0, big_q1, wk);
        let (e, p) = eccentricity_and_semi_latus(r0, r1, q0, q1);
        if p <= 0.0 || e.abs() > 1.0 {
            break;
        }
        if (0.0..eccentricity_ceiling).contains(&e) {
            return Some((e, p, wk, q0, q1));
        }
    }
    None
}

/// Argument of periapsis satisfying the boundary conditions.
pub fn argument_of_periapsis(r0: f64, r1: f64, big_q0: f64, big_q1: f64, f0: f64) -> f64 {
    let delta = r0 / r1 - 1.0;
    if delta.abs() > RADIUS_RATIO_EPS {
        let num = 1.0 - (big_q1 - big_q0).cos();
        let den = delta * (big_q0 - f0).tan() - (big_q1 - big_q0).sin();
        (num / den).atan() - big_q0
    } else {
        FRAC_PI_2 * sign(big_q0 - big_q1)
    }
}

/// Periapsis anomalies of both endpoints, with `q1` lifted above `q0`.
pub fn periapsis_anomalies(big_q0: f64, big_q1: f64, w: f64) -> (f64, f64) {
    let q0 = normalize(big_q0 + w);
    let q1 = normalize(big_q1 + w);
    if q1 > q0 { (q0, q1) } else { (q0, q1 + TAU) }
}

pub fn eccentricity_and_semi_latus(r0: f64, r1: f64, q0: f64, q1: f64) -> (f64, f64) {
    let delta = r0 / r1 - 1.0;
    if delta.abs() > RADIUS_RATIO_EPS {
        let (c0, c1) = (q0.cos(), q1.cos());
        let den = r0 * c0 - r1 * c1;
        ((r1 - r0) / den, (c0 - c1) / den * r0 * r1)
    } else {
        (0.0, r0)
    }
}

/// Direction of flight: increasing anomaly when the toss points less than π ahead of
/// the departure radius vector.
#[inline]
pub fn is_prograde(big_q0: f64, f0: f64) -> bool {
    normalize(f0 - big_q0) < PI
}

#[inline]
pub fn semi_major_axis(e: f64, p: f64) -> f64 {
    p / (1.0 - e * e)
}

/// Eccentric anomaly for `q ∈ [0, 4π)`, continuous across turns.
pub fn eccentric_anomaly(q: f64, e: f64) -> f64 {
    if e.abs() < CIRCULAR_EPS {
        return q;
    }
    let c = q.cos();
    let ac = ((e + c) / (1.0 + e * c)).clamp(-1.0, 1.0).acos();
    if q < PI {
        ac
    } else if q < TAU {
        TAU - ac
    } else if q < 3.0 * PI {
        ac + TAU
    } else {
        2.0 * TAU - ac
    }
}

#[inline]
pub fn mean_anomaly(big_e: f64, e: f64) -> f64 {
    big_e - e * big_e.sin()
}

pub fn time_of_flight(m0: f64, m1: f64, a: f64, gm: f64, prograde: bool) -> f64 {
    let c = (a * a / gm * a).sqrt();
    if prograde {
        c * (m1 - m0)
    } else {
        c * (TAU - (m1 - m0))
    }
}

/// Speed at periapsis anomaly `q`.
pub fn speed(q: f64, e: f64, p: f64, gm: f64) -> f64 {
    (gm / p * (1.0 + 2.0 * e * q.cos() + e * e)).sqrt()
}

/// Reference-frame direction of the velocity at `(big_q, q)`.
pub fn flight_direction(big_q: f64, q: f64, e: f64, prograde: bool) -> f64 {
    let gamma = (e * q.sin() / (1.0 + e * q.cos())).atan();
    let f = big_q + FRAC_PI_2 - gamma;
    normalize(if prograde { f } else { f + PI })
}

/// Solve Kepler's equation `M = E − e·sin E` by Newton iteration.
pub fn solve_kepler(m: f64, e: f64) -> f64 {
    let mut big_e = if e < 0.8 { m } else { PI };
    for _ in 0..KEPLER_ITERATIONS {
        let step = (big_e - e * big_e.sin() - m) / (1.0 - e * big_e.cos());
        big_e -= step;
        if step.abs() < KEPLER_TOL {
            break;
        }
    }
    big_e
}

pub fn true_from_eccentric(big_e: f64, e: f64) -> f64 {
    2.0 * ((1.0 + e).sqrt() * (big_e / 2.0).sin()).atan2((1.0 - e).sqrt() * (big_e / 2.0).cos())
}

#[inline]
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const GM_SUN: f64 = 1.327e20;
    const R_EARTH_ORBIT: f64 = 1.496e11;
    const R_MARS_ORBIT: f64 = 2.279e11;

    fn earth_to_mars(big_q0_deg: f64, big_q1_deg: f64, f0_deg: f64) -> Option<TransferOrbit> {
        TransferOrbit::solve(
            R_EARTH_ORBIT,
            R_MARS_ORBIT,
            big_q0_deg.to_radians(),
            big_q1_deg.to_radians(),
            f0_deg.to_radians(),
            GM_SUN,
            ECCENTRICITY_CEILING,
        )
    }

    #[test]
    fn earth_mars_reference_transfer() {
        let orbit = earth_to_mars(10.0, 260.0, 120.0).expect("transfer exists");
        assert_abs_diff_eq!(orbit.e, 0.364, epsilon = 1e-3);
        assert_relative_eq!(orbit.p, 1.498e11, max_relative = 1e-3);
        assert_relative_eq!(orbit.dt, 2.069e7, max_relative = 1e-3);
        assert!(orbit.prograde);
    }

    #[test]
    fn solution_matches_boundary_conditions() {
        let orbit = earth_to_mars(10.0, 260.0, 120.0).unwrap();
        assert_relative_eq!(orbit.radius_at(orbit.q0), R_EARTH_ORBIT, max_relative = 1e-9);
        assert_relative_eq!(orbit.radius_at(orbit.q1), R_MARS_ORBIT, max_relative = 1e-9);
        assert_abs_diff_eq!(
            orbit.direction_at(10f64.to_radians(), orbit.q0),
            120f64.to_radians(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn propagation_reproduces_arrival_anomaly() {
        let cases = [
            (10.0, 260.0, 120.0),
            (0.0, 100.0, 80.0),
            (0.0, 60.0, 250.0),
            (0.0, 180.0, 280.0),
            (0.0, 300.0, 340.0),
        ];
        for (big_q0, big_q1, f0) in cases {
            let orbit = earth_to_mars(big_q0, big_q1, f0).expect("transfer exists");
            let q = orbit.propagate(orbit.q0, orbit.dt, GM_SUN);
            let expected = normalize(orbit.q1);
            let diff = (q - expected).abs();
            assert!(
                diff.min(TAU - diff) < 1e-8,
                "({big_q0}, {big_q1}, {f0}): got {q}, expected {expected}"
            );
        }
    }

    #[test]
    fn accepted_elements_stay_in_bounds() {
        for big_q1 in (10..360).step_by(25) {
            for f0 in (5..360).step_by(20) {
                if let Some(orbit) = earth_to_mars(0.0, big_q1 as f64, f0 as f64) {
                    assert!((0.0..ECCENTRICITY_CEILING).contains(&orbit.e));
                    assert!(orbit.p > 0.0);
                    assert!(orbit.dt >= 0.0 && orbit.dt.is_finite());
                }
            }
        }
    }

    #[test]
    fn radial_toss_has_no_solution() {
        assert!(earth_to_mars(30.0, 200.0, 30.0).is_none());
    }

    #[test]
    fn lower_ceiling_rejects_eccentric_arc() {
        let orbit = TransferOrbit::solve(
            R_EARTH_ORBIT,
            R_MARS_ORBIT,
            10f64.to_radians(),
            260f64.to_radians(),
            120f64.to_radians(),
            GM_SUN,
            0.3,
        );
        assert!(orbit.is_none());
    }

    #[test]
    fn equal_radii_give_circle() {
        let orbit = TransferOrbit::solve(1.0e11, 1.0e11, 0.0, 1.0, 1.2, GM_SUN, ECCENTRICITY_CEILING)
            .expect("circle");
        assert_eq!(orbit.e, 0.0);
        assert_relative_eq!(orbit.a, 1.0e11, max_relative = 1e-12);
    }

    #[test]
    fn arc_fraction_runs_along_flight_direction() {
        let orbit = earth_to_mars(0.0, 60.0, 250.0).unwrap();
        assert!(!orbit.prograde);
        let mid = orbit.anomaly_at_fraction(0.5);
        assert_abs_diff_eq!(orbit.q0 - mid, orbit.swept_angle() / 2.0, epsilon = 1e-12);
    }
}
