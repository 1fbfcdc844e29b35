//! Patched-conic impulse estimates between a parking orbit and the sphere of influence.

use crate::{speed_at_radius, speed_from_energy};

/// Impulse to leave a parking orbit (energy constant `h0` at `r_park`) and cross the
/// sphere of radius `r_sphere` with body-relative speed `w_out`.
///
/// When `w_out` is below the escape speed at the sphere the transfer is split into
/// an escape burn at periapsis and a top-up at the sphere.
pub fn escape_impulse(r_park: f64, r_sphere: f64, h0: f64, w_out: f64, gm: f64) -> f64 {
    let v0 = speed_from_energy(h0, r_park, gm);
    let v_escape_sphere = speed_from_energy(0.0, r_sphere, gm);
    if w_out > v_escape_sphere {
        let v1 = speed_at_radius(w_out, r_sphere, r_park, gm);
        (v1 - v0).abs()
    } else {
        let v1 = speed_from_energy(0.0, r_park, gm);
        (v1 - v0).abs() + (v_escape_sphere - w_out)
    }
}

/// Impulse to settle into a parking orbit (energy constant `h1` at `r_park`) after
/// entering the sphere of radius `r_sphere` with body-relative speed `w_in`.
pub fn capture_impulse(r_sphere: f64, r_park: f64, h1: f64, w_in: f64, gm: f64) -> f64 {
    let h = crate::energy(w_in, r_sphere, gm);
    let arrival = speed_from_energy(h, r_park, gm);
    let parked = speed_from_energy(h1, r_park, gm);
    (parked - arrival).abs()
}
