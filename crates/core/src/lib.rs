//! Constants, angle and 3-vector primitives shared by the pathfinder crates.

/// Physical constants in SI units.
pub mod constants {
    /// Gravitational parameter of the Sun (m³/s²).
    pub const GM_SUN: f64 = 1.327_124_400_18e20;
    /// Seconds per Julian day.
    pub const SECONDS_PER_DAY: f64 = 86_400.0;
}

/// Angle helpers. All angles are radians.
pub mod angle {
    use std::f64::consts::TAU;

    /// Wrap an angle into `[0, 2π)`.
    #[inline]
    pub fn normalize(f: f64) -> f64 {
        let wrapped = f - TAU * (f / TAU).floor();
        // floor rounding can land exactly on TAU for tiny negative inputs
        if wrapped >= TAU { 0.0 } else { wrapped }
    }

    /// `count` evenly spaced samples over `[begin, end)`.
    pub fn make_range(begin: f64, end: f64, count: usize) -> Vec<f64> {
        if count == 0 {
            return Vec::new();
        }
        let step = (end - begin) / count as f64;
        (0..count).map(|i| begin + step * i as f64).collect()
    }
}

/// Minimal vector helpers to avoid ad-hoc `[f64; 3]` math everywhere.
pub mod vector {
    use std::f64::consts::TAU;

    /// Alias for a 3D vector in metres or m/s depending on context.
    pub type Vector3 = [f64; 3];

    pub const ZERO: Vector3 = [0.0; 3];

    /// Euclidean norm of a vector.
    #[inline]
    pub fn norm(v: &Vector3) -> f64 {
        dot(v, v).sqrt()
    }

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    /// Cross product `a × b`.
    #[inline]
    pub fn cross(a: &Vector3, b: &Vector3) -> Vector3 {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    /// Vector addition.
    #[inline]
    pub fn add(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    /// Vector subtraction.
    #[inline]
    pub fn sub(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    /// Scale a vector by a scalar.
    #[inline]
    pub fn scale(v: &Vector3, s: f64) -> Vector3 {
        [v[0] * s, v[1] * s, v[2] * s]
    }

    /// Unit vector along `v`, or `None` for a (near) zero vector.
    pub fn normalize(v: &Vector3) -> Option<Vector3> {
        let n = norm(v);
        if n > f64::EPSILON && n.is_finite() {
            Some(scale(v, 1.0 / n))
        } else {
            None
        }
    }

    /// Unsigned angle between two vectors in `[0, π]`.
    pub fn angle_between(a: &Vector3, b: &Vector3) -> f64 {
        norm(&cross(a, b)).atan2(dot(a, b))
    }

    /// Angle swept from `a` to `b` counter-clockwise about +z, in `[0, 2π)`.
    ///
    /// Vectors need not lie in the xy-plane: the magnitude comes from the full
    /// 3D angle, the sense from the z component of `a × b`.
    pub fn angle_about_z(a: &Vector3, b: &Vector3) -> f64 {
        let n = cross(a, b);
        let theta = norm(&n).atan2(dot(a, b));
        if n[2] < 0.0 { TAU - theta } else { theta }
    }

    /// Rotate `v` by `angle` about the unit `axis` (Rodrigues' formula).
    pub fn rotate_about_axis(v: &Vector3, axis: &Vector3, angle: f64) -> Vector3 {
        let (s, c) = angle.sin_cos();
        let k_cross_v = cross(axis, v);
        let k_dot_v = dot(axis, v);
        [
            v[0] * c + k_cross_v[0] * s + axis[0] * k_dot_v * (1.0 - c),
            v[1] * c + k_cross_v[1] * s + axis[1] * k_dot_v * (1.0 - c),
            v[2] * c + k_cross_v[2] * s + axis[2] * k_dot_v * (1.0 - c),
        ]
    }

    /// Linear interpolation between two vectors.
    #[inline]
    pub fn lerp(a: &Vector3, b: &Vector3, s: f64) -> Vector3 {
        add(a, &scale(&sub(b, a), s))
    }
}
