//! Two-body orbit helpers: closed-form elliptic transfers, hyperbolic flyby
//! geometry, and patched-conic impulse estimates.
//!
//! Energies in this crate are the "energy constant" `h = v² − 2·GM/r`, i.e. twice the
//! specific orbital energy. A circular orbit at radius `r` has `h = −GM/r`.

pub mod elliptic;
pub mod hyperbolic;
pub mod patched;

pub use elliptic::{ECCENTRICITY_CEILING, TransferOrbit};

/// Energy constant for speed `v` at radius `r`.
#[inline]
pub fn energy(v: f64, r: f64, gm: f64) -> f64 {
    v * v - 2.0 * gm / r
}

/// Speed at radius `r` on an orbit with energy constant `h`.
#[inline]
pub fn speed_from_energy(h: f64, r: f64, gm: f64) -> f64 {
    (h + 2.0 * gm / r).sqrt()
}

/// Speed at `r1` on the orbit passing radius `r0` with speed `v0`.
#[inline]
pub fn speed_at_radius(v0: f64, r0: f64, r1: f64, gm: f64) -> f64 {
    (v0 * v0 - 2.0 * gm / r0 + 2.0 * gm / r1).sqrt()
}

/// Circular energy constant at radius `r`.
#[inline]
pub fn circular_energy(r: f64, gm: f64) -> f64 {
    -gm / r
}

/// Conic radius `p / (1 + e·cos q)`.
#[inline]
pub fn radius(p: f64, e: f64, q: f64) -> f64 {
    p / (1.0 + e * q.cos())
}
