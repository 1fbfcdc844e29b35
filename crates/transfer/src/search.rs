//! Departure-time search for one leg.
//!
//! The departure epoch `t0` and toss angle are fixed; the arrival epoch `t` is scanned
//! on a uniform grid. At each sample the transfer to the target's position at `t` is
//! solved and the mismatch `g(t) = t − (t0 + dt)` recorded. A link exists wherever `g`
//! vanishes. A sliding window of three samples spots exact zeros, sign changes and
//! near-tangent minima of `|g|`, each refined on its own bracket.

use std::f64::consts::TAU;

use pathfinder_core::angle::make_range;
use pathfinder_core::vector::{self, Vector3, ZERO};
use pathfinder_ephemeris::{Ephemerides, StateVector};
use pathfinder_minimize::{StopCriteria, minimize};
use pathfinder_orbits::ECCENTRICITY_CEILING;

use crate::link::{Departure, Link};

/// Initial simplex step of the extremum refinement, as a fraction of the bracket.
const EXTREMUM_STEP_DIVISOR: f64 = 50.0;
/// Magnitude change treated as flat by the extremum detector.
const FLAT_EPS: f64 = 1e-12;

/// Grid and tolerance settings for the departure-time search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    /// Window length as a multiple of the period at the mean of both radii.
    pub period_factor: f64,
    /// Number of toss angles spread over `[0, 2π)`.
    pub toss_angle_count: usize,
    /// Grid step (s).
    pub time_step: f64,
    /// Largest `|g|` accepted for a refined root (s).
    pub time_tolerance: f64,
    /// Samples with `|g|` within `time_step · zero_fraction` are taken as roots.
    pub zero_fraction: f64,
    /// Refinement gives up once its bracket shrinks below `time_tolerance · refine_fraction`.
    pub refine_fraction: f64,
    pub eccentricity_ceiling: f64,
    /// The middle sample of an extremum window may rise by at most this share of the
    /// window's total rise.
    pub extremum_rise_fraction: f64,
    pub max_bisections: usize,
    pub extremum_iterations: usize,
}

impl SearchConfig {
    pub fn new(period_factor: f64, toss_angle_count: usize, time_step: f64, time_tolerance: f64) -> Self {
        Self {
            period_factor,
            toss_angle_count,
            time_step,
            time_tolerance,
            zero_fraction: 0.1,
            refine_fraction: 0.01,
            eccentricity_ceiling: ECCENTRICITY_CEILING,
            extremum_rise_fraction: 0.25,
            max_bisections: 200,
            extremum_iterations: 100,
        }
    }

    #[inline]
    pub fn zero_band(&self) -> f64 {
        self.time_step * self.zero_fraction
    }

    #[inline]
    pub fn bracket_tolerance(&self) -> f64 {
        self.time_tolerance * self.refine_fraction
    }

    /// Evenly spaced toss angles over `[0, 2π)`.
    pub fn toss_angles(&self) -> Vec<f64> {
        make_range(0.0, TAU, self.toss_angle_count)
    }
}

/// How a root of the mismatch function was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// A grid sample already sat within the zero band.
    Zero,
    /// Bisection between two samples of opposite sign.
    SignChange,
    /// Minimization of `|g|` between three samples of equal sign.
    Extremum,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub time: f64,
    pub pattern: Pattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Positive,
    Negative,
    Zero,
    Undefined,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    t: f64,
    g: f64,
    sign: Sign,
}

impl Sample {
    const EMPTY: Sample = Sample {
        t: f64::NAN,
        g: f64::NAN,
        sign: Sign::Undefined,
    };

    fn new(t: f64, g: f64, zero_band: f64) -> Self {
        let sign = if g.is_nan() {
            Sign::Undefined
        } else if g.abs() <= zero_band {
            Sign::Zero
        } else if g > 0.0 {
            Sign::Positive
        } else {
            Sign::Negative
        };
        Self { t, g, sign }
    }

    fn is_signed(&self) -> bool {
        matches!(self.sign, Sign::Positive | Sign::Negative)
    }
}

/// Newest sample first.
struct Window([Sample; 3]);

impl Window {
    fn new() -> Self {
        Self([Sample::EMPTY; 3])
    }

    fn push(&mut self, sample: Sample) {
        self.0.rotate_right(1);
        self.0[0] = sample;
    }

    /// Detected pattern with the bracket `(older, newer)` to refine on.
    fn pattern(&self, rise_fraction: f64) -> Option<(Pattern, Sample, Sample)> {
        let [s0, s1, s2] = self.0;
        if s0.sign == Sign::Zero {
            return Some((Pattern::Zero, s0, s0));
        }
        if s0.is_signed() && s1.is_signed() && s0.sign != s1.sign {
            return Some((Pattern::SignChange, s1, s0));
        }
        if s0.is_signed() && s0.sign == s1.sign && s1.sign == s2.sign {
            let (newest, middle, oldest) = (s0.g.abs(), s1.g.abs(), s2.g.abs());
            let rise_mid = middle - oldest;
            let rise = newest - oldest;
            let flat_dip = rise.abs() <= FLAT_EPS && rise_mid < 0.0;
            let bent = rise > 0.0 && rise_mid < rise * rise_fraction;
            if flat_dip || bent {
                return Some((Pattern::Extremum, s2, s0));
            }
        }
        None
    }
}

/// Scan `mismatch` over `[start, end)` and refine every detected root.
///
/// `mismatch` returns `None` where no transfer exists. Brackets whose refinement fails
/// are skipped.
pub fn scan<G>(mut mismatch: G, start: f64, end: f64, config: &SearchConfig) -> Vec<Crossing>
where
    G: FnMut(f64) -> Option<f64>,
{
    let mut found = Vec::new();
    if !(config.time_step > 0.0) {
        return found;
    }
    let zero_band = config.zero_band();
    let mut window = Window::new();
    for i in 0u64.. {
        let t = start + i as f64 * config.time_step;
        if !(t < end) {
            break;
        }
        let g = mismatch(t).unwrap_or(f64::NAN);
        window.push(Sample::new(t, g, zero_band));

        let Some((pattern, older, newer)) = window.pattern(config.extremum_rise_fraction) else {
            continue;
        };
        let refined = match pattern {
            Pattern::Zero => Some(newer.t),
            Pattern::SignChange => bisect(&mut mismatch, older, newer, config),
            Pattern::Extremum => descend(&mut mismatch, older, newer, config),
        };
        match refined {
            Some(time) => found.push(Crossing { time, pattern }),
            None => tracing::trace!(?pattern, lo = older.t, hi = newer.t, "bracket skipped"),
        }
    }
    found
}

fn bisect<G>(mismatch: &mut G, older: Sample, newer: Sample, config: &SearchConfig) -> Option<f64>
where
    G: FnMut(f64) -> Option<f64>,
{
    let (mut t0, mut g0, mut t1) = (older.t, older.g, newer.t);
    let min_width = config.bracket_tolerance();
    for _ in 0..config.max_bisections {
        let tm = 0.5 * (t0 + t1);
        let gm = mismatch(tm).filter(|g| !g.is_nan())?;
        if gm.abs() <= config.time_tolerance {
            return Some(tm);
        }
        if gm.signum() == g0.signum() {
            t0 = tm;
            g0 = gm;
        } else {
            t1 = tm;
        }
        if (t1 - t0).abs() <= min_width {
            return None;
        }
    }
    None
}

fn descend<G>(mismatch: &mut G, older: Sample, newer: Sample, config: &SearchConfig) -> Option<f64>
where
    G: FnMut(f64) -> Option<f64>,
{
    let (lo, hi) = (older.t, newer.t);
    let objective = |x: &[f64]| {
        let t = x[0];
        if !(lo..=hi).contains(&t) {
            return f64::NAN;
        }
        mismatch(t).map_or(f64::NAN, f64::abs)
    };
    let start = [0.5 * (lo + hi)];
    let step = [(hi - lo) / EXTREMUM_STEP_DIVISOR];
    let criteria = StopCriteria {
        target: Some(config.time_tolerance),
        ..StopCriteria::new(config.extremum_iterations, config.bracket_tolerance())
    };
    let min = minimize(objective, &start, &step, criteria).ok()?;
    (min.value <= config.time_tolerance).then_some(min.point[0])
}

/// Arrival side of a leg.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Body(&'a dyn Ephemerides),
    Point(Vector3),
}

impl Target<'_> {
    pub fn position(&self, t: f64) -> Vector3 {
        match self {
            Target::Body(body) => body.position(t),
            Target::Point(position) => *position,
        }
    }

    pub fn state(&self, t: f64) -> StateVector {
        match self {
            Target::Body(body) => body.state(t),
            Target::Point(position) => StateVector {
                position: *position,
                velocity: ZERO,
            },
        }
    }
}

/// Length of the arrival window: `period_factor` periods of a circular orbit at the mean
/// of both radii.
pub fn window_length(r_a: &Vector3, r_b: &Vector3, gm: f64, period_factor: f64) -> f64 {
    let a = 0.5 * (vector::norm(r_a) + vector::norm(r_b));
    TAU * (a.powi(3) / gm).sqrt() * period_factor
}

/// One leg to search: departure state at `t0` and the arrival target.
#[derive(Debug, Clone, Copy)]
pub struct Leg<'a> {
    pub origin: StateVector,
    pub target: Target<'a>,
    pub t0: f64,
    /// Latest arrival epoch scanned (exclusive).
    pub end: f64,
    pub gm: f64,
}

impl Leg<'_> {
    /// Every link for every toss angle, concatenated in toss-angle order.
    ///
    /// A fixed target yields at most one link per angle and no time search.
    pub fn find_links(&self, toss_angles: &[f64], config: &SearchConfig) -> Vec<Link> {
        toss_angles
            .iter()
            .flat_map(|&f0| self.links_for(f0, config))
            .collect()
    }

    fn links_for(&self, f0: f64, config: &SearchConfig) -> Vec<Link> {
        let departure = Departure::new(self.t0, self.origin, f0, self.gm, config.eccentricity_ceiling);
        match self.target {
            Target::Point(position) => departure
                .link_to(&StateVector {
                    position,
                    velocity: ZERO,
                })
                .into_iter()
                .collect(),
            Target::Body(body) => {
                let crossings = scan(
                    |t| departure.mismatch(t, &body.position(t)),
                    self.t0,
                    self.end,
                    config,
                );
                crossings
                    .into_iter()
                    .filter_map(|crossing| {
                        tracing::debug!(
                            f0,
                            time = crossing.time,
                            pattern = ?crossing.pattern,
                            "refined link"
                        );
                        departure.link_to(&body.state(crossing.time))
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pathfinder_ephemeris::CircularOrbit;

    const GM_SUN: f64 = 1.327e20;

    fn unit_grid() -> SearchConfig {
        SearchConfig::new(1.0, 1, 1.0, 1e-3)
    }

    #[test]
    fn single_sign_change_gives_one_root() {
        let found = scan(|t| Some(t - 5.5), 0.0, 10.0, &unit_grid());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern, Pattern::SignChange);
        assert_abs_diff_eq!(found[0].time, 5.5, epsilon = 1e-3);
    }

    #[test]
    fn tangency_gives_one_extremum() {
        let found = scan(|t| Some((t - 5.5).powi(2)), 0.0, 10.0, &unit_grid());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern, Pattern::Extremum);
        assert_abs_diff_eq!(found[0].time, 5.5, epsilon = 0.04);
    }

    #[test]
    fn parabola_above_axis_has_no_root() {
        let found = scan(|t| Some((t - 5.5).powi(2) + 1.0), 0.0, 10.0, &unit_grid());
        assert!(found.is_empty());
    }

    #[test]
    fn sample_in_zero_band_is_accepted_directly() {
        let found = scan(|t| Some(t - 4.05), 0.0, 10.0, &unit_grid());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern, Pattern::Zero);
        assert_eq!(found[0].time, 4.0);
    }

    #[test]
    fn undefined_samples_do_not_trigger_patterns() {
        let g = |t: f64| if (3.0..4.0).contains(&t) { None } else { Some(t - 5.5) };
        let found = scan(g, 0.0, 10.0, &unit_grid());
        assert_eq!(found.len(), 1);
        assert_abs_diff_eq!(found[0].time, 5.5, epsilon = 1e-3);

        // undefined across the crossing: the bracket cannot be refined
        let g = |t: f64| if t > 5.0 && t < 6.0 { None } else { Some(t - 5.5) };
        assert!(scan(g, 0.0, 10.0, &unit_grid()).is_empty());
    }

    #[test]
    fn discontinuity_is_not_a_root() {
        let g = |t: f64| Some(if t < 5.5 { -1.0 } else { 1.0 });
        assert!(scan(g, 0.0, 10.0, &unit_grid()).is_empty());
    }

    fn earth_like() -> CircularOrbit {
        CircularOrbit::new(3.986e14, 149.6e9, 31.6e6, 0.0).unwrap()
    }

    fn leg_to(body: &CircularOrbit, config: &SearchConfig) -> Vec<Link> {
        let origin = earth_like().state(0.0);
        let leg = Leg {
            origin,
            target: Target::Body(body),
            t0: 0.0,
            end: body.period,
            gm: GM_SUN,
        };
        leg.find_links(&[70f64.to_radians()], config)
    }

    fn grid_for(body: &CircularOrbit) -> SearchConfig {
        SearchConfig::new(1.0, 1, body.period / 160.0, 86_400.0)
    }

    #[test]
    fn finds_inner_planet_link_by_bisection() {
        let venus = CircularOrbit::new(3.248e14, 108.2e9, 19.4e6, 240f64.to_radians()).unwrap();
        let links = leg_to(&venus, &grid_for(&venus));
        assert_eq!(links.len(), 1);
        let link = &links[0];
        assert_abs_diff_eq!(link.t1, 1.279e7, epsilon = 2.0e5);
        assert!(link.orbit.e >= 0.0 && link.orbit.e < 0.99 && link.orbit.p > 0.0);
        // arrival epoch is within the time tolerance of the refined sample
        let arrival = venus.position(link.t1);
        let one_day_of_travel = vector::norm(&venus.velocity(0.0)) * 86_400.0;
        assert!(vector::norm(&vector::sub(&arrival, &link.r1)) < one_day_of_travel);
    }

    #[test]
    fn finds_outer_planet_link_on_grid_sample() {
        let mars = CircularOrbit::new(4.282e13, 227.9e9, 59.4e6, 0.0).unwrap();
        let links = leg_to(&mars, &grid_for(&mars));
        assert_eq!(links.len(), 1);
        assert_abs_diff_eq!(links[0].t1, 1.745e7, epsilon = 2.0e5);
        // relative velocity at arrival excludes the body's own motion
        let w1 = vector::sub(&links[0].v1, &mars.velocity(1.745e7));
        assert!(vector::norm(&vector::sub(&w1, &links[0].w1)) < 100.0);
    }

    #[test]
    fn fixed_target_gives_one_link_per_angle() {
        let origin = earth_like().state(0.0);
        let leg = Leg {
            origin,
            target: Target::Point([0.0, 2.0e11, 0.0]),
            t0: 1_000.0,
            end: f64::INFINITY,
            gm: GM_SUN,
        };
        let angles = [60f64.to_radians(), 80f64.to_radians()];
        let links = leg.find_links(&angles, &SearchConfig::new(1.0, 2, 86_400.0, 3_600.0));
        assert_eq!(links.len(), 2);
        for link in &links {
            assert_eq!(link.t0, 1_000.0);
            assert_abs_diff_eq!(link.t1, 1_000.0 + link.dt());
            assert_eq!(link.w1, link.v1);
        }
    }

    #[test]
    fn window_is_a_mean_radius_period() {
        let r = 1.0e11;
        let length = window_length(&[r, 0.0, 0.0], &[0.0, r, 0.0], GM_SUN, 2.0);
        assert_abs_diff_eq!(length, 2.0 * TAU * (r.powi(3) / GM_SUN).sqrt(), epsilon = 1e-3);
    }
}
