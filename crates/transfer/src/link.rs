//! Transfer arcs lifted from the orbital plane into 3D.
//!
//! A leg is always solved in the plane spanned by the departure and arrival radius
//! vectors, with the departure radius as the reference direction (`Q0 = 0`). [`Frame`]
//! maps in-plane angles back to heliocentric vectors.

use std::f64::consts::PI;

use pathfinder_core::angle::normalize;
use pathfinder_core::vector::{self, Vector3};
use pathfinder_ephemeris::StateVector;
use pathfinder_orbits::TransferOrbit;
use pathfinder_orbits::elliptic::flight_direction;
use serde::{Deserialize, Serialize};

const ECLIPTIC_NORMAL: Vector3 = [0.0, 0.0, 1.0];

/// Orbital-plane basis: `x` along the departure radius, `z` along the orbit normal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub x: Vector3,
    pub y: Vector3,
    pub z: Vector3,
}

impl Frame {
    /// Basis for a transfer from `r0` to `r1`, where `big_q1` is the in-plane angle of
    /// `r1` measured from `r0`.
    ///
    /// Collinear radii fall back to the plane containing the ecliptic normal.
    pub fn new(r0: &Vector3, r1: &Vector3, big_q1: f64) -> Option<Self> {
        let x = vector::normalize(r0)?;
        let normal = vector::normalize(&vector::cross(r0, r1)).or_else(|| {
            let side = vector::cross(&x, &ECLIPTIC_NORMAL);
            vector::normalize(&vector::cross(&side, &x))
        })?;
        let z = if big_q1 <= PI {
            normal
        } else {
            vector::scale(&normal, -1.0)
        };
        let y = vector::cross(&z, &x);
        Some(Self { x, y, z })
    }

    /// Vector of magnitude `magnitude` pointing `direction` radians from `x` towards `y`.
    pub fn in_plane(&self, magnitude: f64, direction: f64) -> Vector3 {
        let (s, c) = direction.sin_cos();
        vector::add(
            &vector::scale(&self.x, magnitude * c),
            &vector::scale(&self.y, magnitude * s),
        )
    }
}

/// One feasible transfer arc.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Departure epoch.
    pub t0: f64,
    /// Arrival epoch, `t0 + dt`.
    pub t1: f64,
    pub r0: Vector3,
    pub r1: Vector3,
    pub v0: Vector3,
    pub v1: Vector3,
    /// Departure velocity relative to the departure body.
    pub w0: Vector3,
    /// Arrival velocity relative to the arrival body.
    pub w1: Vector3,
    /// In-plane angle of `r0`; always zero.
    pub big_q0: f64,
    /// In-plane angle of `r1` measured from `r0`.
    pub big_q1: f64,
    /// Toss angle at departure.
    pub f0: f64,
    /// Velocity direction at arrival, in the same in-plane convention.
    pub f1: f64,
    pub orbit: TransferOrbit,
    pub frame: Frame,
}

impl Link {
    #[inline]
    pub fn dt(&self) -> f64 {
        self.orbit.dt
    }

    /// Heliocentric point at periapsis anomaly `q`.
    pub fn trajectory_point(&self, q: f64) -> Vector3 {
        let r = self.orbit.radius_at(q);
        let direction = vector::rotate_about_axis(&self.frame.x, &self.frame.z, q - self.orbit.q0);
        vector::scale(&direction, r)
    }

    /// Point reached after flying `fraction` of the swept arc.
    pub fn point_at_fraction(&self, fraction: f64) -> Vector3 {
        self.trajectory_point(self.orbit.anomaly_at_fraction(fraction))
    }

    /// Position and departure toss angle for a burn placed `fraction` along the arc.
    ///
    /// The toss angle is measured from the burn point's own radius vector, which is the
    /// reference direction of any leg starting there.
    pub fn burn_seed(&self, fraction: f64) -> (Vector3, f64) {
        let q = self.orbit.anomaly_at_fraction(fraction);
        let toss = flight_direction(0.0, q, self.orbit.e, self.orbit.prograde);
        (self.trajectory_point(q), toss)
    }
}

/// Departure conditions of one leg for one toss angle.
#[derive(Debug, Clone, Copy)]
pub struct Departure {
    pub t0: f64,
    pub origin: StateVector,
    pub f0: f64,
    pub gm: f64,
    pub eccentricity_ceiling: f64,
}

impl Departure {
    pub fn new(t0: f64, origin: StateVector, f0: f64, gm: f64, eccentricity_ceiling: f64) -> Self {
        Self {
            t0,
            origin,
            f0: normalize(f0),
            gm,
            eccentricity_ceiling,
        }
    }

    /// Transfer orbit reaching `r1`, with the in-plane angle of `r1`.
    pub fn transfer_to(&self, r1: &Vector3) -> Option<(TransferOrbit, f64)> {
        let r0 = &self.origin.position;
        let big_q1 = vector::angle_about_z(r0, r1);
        let orbit = TransferOrbit::solve(
            vector::norm(r0),
            vector::norm(r1),
            0.0,
            big_q1,
            self.f0,
            self.gm,
            self.eccentricity_ceiling,
        )?;
        Some((orbit, big_q1))
    }

    /// Arrival-time mismatch `t − (t0 + dt)` for a transfer reaching `r1` at `t`.
    pub fn mismatch(&self, t: f64, r1: &Vector3) -> Option<f64> {
        let (orbit, _) = self.transfer_to(r1)?;
        Some(t - (self.t0 + orbit.dt))
    }

    /// Complete link to `arrival`, whose velocity is subtracted to get `w1`.
    pub fn link_to(&self, arrival: &StateVector) -> Option<Link> {
        let (orbit, big_q1) = self.transfer_to(&arrival.position)?;
        let frame = Frame::new(&self.origin.position, &arrival.position, big_q1)?;
        let f1 = orbit.direction_at(big_q1, orbit.q1);
        let v0 = frame.in_plane(orbit.speed_at(orbit.q0, self.gm), self.f0);
        let v1 = frame.in_plane(orbit.speed_at(orbit.q1, self.gm), f1);
        Some(Link {
            t0: self.t0,
            t1: self.t0 + orbit.dt,
            r0: self.origin.position,
            r1: arrival.position,
            v0,
            v1,
            w0: vector::sub(&v0, &self.origin.velocity),
            w1: vector::sub(&v1, &arrival.velocity),
            big_q0: 0.0,
            big_q1,
            f0: self.f0,
            f1,
            orbit,
            frame,
        })
    }
}
