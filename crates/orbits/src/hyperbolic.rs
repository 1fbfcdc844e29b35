//! Flyby geometry on the hyperbola inside a body's sphere of influence.

/// Smallest impact parameter at sphere radius `r` that keeps periapsis above `r_planet`
/// for a body-relative speed `v`.
pub fn min_impact_parameter(v: f64, r: f64, r_planet: f64, gm: f64) -> f64 {
    r_planet / v * (2.0 * gm / r_planet + v * v - 2.0 * gm / r).sqrt()
}

/// Maximum velocity turn achievable on the hyperbola entering the sphere of radius `r`
/// with speed `v` and impact parameter `b`.
///
/// The hyperbola is symmetric about periapsis, so the turn between the entry and exit
/// velocities is twice the true anomaly at the sphere boundary minus twice the
/// flight-path angle there.
pub fn max_turn_angle(v: f64, b: f64, r: f64, gm: f64) -> f64 {
    let rgm = r * gm;
    let e = eccentricity(v, b, r, gm);
    let cos_theta = ((b * b * v * v - rgm) / (rgm * e)).clamp(-1.0, 1.0);
    let theta = cos_theta.acos();
    let gamma = (e * theta.sin() / (1.0 + e * cos_theta)).atan();
    2.0 * (theta - gamma)
}

/// Eccentricity of the flyby hyperbola for `(v, b)` at the sphere radius `r`.
pub fn eccentricity(v: f64, b: f64, r: f64, gm: f64) -> f64 {
    let energy = crate::energy(v, r, gm);
    let momentum = b * v;
    (1.0 + energy * momentum * momentum / (gm * gm)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const GM_EARTH: f64 = 3.986e14;
    const R_EARTH: f64 = 6.371e6;
    const R_SPHERE: f64 = 9.25e8;

    #[test]
    fn min_impact_parameter_reaches_planet_surface() {
        let v = 5_000.0;
        let b = min_impact_parameter(v, R_SPHERE, R_EARTH, GM_EARTH);
        // angular momentum at the sphere equals angular momentum at periapsis
        let vp = crate::speed_at_radius(v, R_SPHERE, R_EARTH, GM_EARTH);
        assert_abs_diff_eq!(b * v, R_EARTH * vp, epsilon = 1e-3 * b * v);
    }

    #[test]
    fn turn_tends_to_asymptotic_value_far_out() {
        let v_inf: f64 = 4_000.0;
        let r_far = 1.0e13;
        let v = crate::speed_at_radius(v_inf, f64::INFINITY, r_far, GM_EARTH);
        let b = min_impact_parameter(v, r_far, R_EARTH, GM_EARTH);
        let e = eccentricity(v, b, r_far, GM_EARTH);
        let expected = 2.0 * (1.0 / e).asin();
        assert_abs_diff_eq!(max_turn_angle(v, b, r_far, GM_EARTH), expected, epsilon = 1e-4);
    }

    #[test]
    fn weak_gravity_barely_turns() {
        let turn = max_turn_angle(30_000.0, 1.0e8, R_SPHERE, 1.0);
        assert!(turn.abs() < 1e-6);
    }

    #[test]
    fn closer_pass_turns_more() {
        let v = 6_000.0;
        let b = min_impact_parameter(v, R_SPHERE, R_EARTH, GM_EARTH);
        let near = max_turn_angle(v, b, R_SPHERE, GM_EARTH);
        let far = max_turn_angle(v, 4.0 * b, R_SPHERE, GM_EARTH);
        assert!(near > far && far > 0.0);
        assert!(near < std::f64::consts::PI);
    }
}
