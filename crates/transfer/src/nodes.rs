//! Per-node feasibility and cost model.
//!
//! Every mission node is an [`Anchor`] (where the node is) plus a [`NodeKind`] (what
//! happens there). [`Node::check`] turns the relative velocities of the incoming and
//! outgoing legs into the node's impulse, speed mismatch and soft-constraint penalty.

use pathfinder_core::vector::{self, Vector3, ZERO};
use pathfinder_ephemeris::{SharedEphemerides, StateVector};
use pathfinder_orbits::{circular_energy, energy, hyperbolic, patched};

use crate::search::Target;

/// Where a node sits: on a body's ephemeris or at a fixed heliocentric point.
#[derive(Debug, Clone)]
pub enum Anchor {
    /// Moves with a body; `None` until an ephemeris is bound.
    Script(Option<SharedEphemerides>),
    /// Fixed point with zero velocity.
    Static(Vector3),
}

impl Anchor {
    pub fn is_valid(&self) -> bool {
        match self {
            Anchor::Script(ephemeris) => ephemeris.is_some(),
            Anchor::Static(_) => true,
        }
    }

    pub fn state(&self, t: f64) -> Option<StateVector> {
        match self {
            Anchor::Script(ephemeris) => ephemeris.as_ref().map(|e| e.state(t)),
            Anchor::Static(position) => Some(StateVector {
                position: *position,
                velocity: ZERO,
            }),
        }
    }

    pub fn target(&self) -> Option<Target<'_>> {
        match self {
            Anchor::Script(ephemeris) => ephemeris.as_deref().map(|body| Target::Body(body)),
            Anchor::Static(position) => Some(Target::Point(*position)),
        }
    }

    /// Gravitational parameter of the bound body.
    pub fn gravitational_parameter(&self) -> Option<f64> {
        match self {
            Anchor::Script(ephemeris) => ephemeris.as_ref().map(|e| e.gravitational_parameter(0.0)),
            Anchor::Static(_) => None,
        }
    }
}

/// Soft upper bound on a node quantity.
///
/// A limit `≤ 0` disables the bound. Near an enabled bound the penalty
/// `a·|limit − value|^(−k)` grows without limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ceiling {
    pub limit: f64,
    pub a: f64,
    pub k: f64,
}

impl Ceiling {
    pub const DISABLED: Ceiling = Ceiling {
        limit: 0.0,
        a: 1.0,
        k: 4.0,
    };

    pub fn new(limit: f64, a: f64, k: f64) -> Self {
        Self { limit, a, k }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.limit > 0.0
    }

    #[inline]
    pub fn exceeded(&self, value: f64) -> bool {
        self.is_enabled() && value > self.limit
    }

    pub fn penalty(&self, value: f64) -> f64 {
        penalty(value, self.limit, self.a, self.k)
    }
}

impl Default for Ceiling {
    fn default() -> Self {
        Self::DISABLED
    }
}

/// `a·|limit − value|^(−k)`.
pub fn penalty(value: f64, limit: f64, a: f64, k: f64) -> f64 {
    a * (limit - value).abs().powf(-k)
}

/// Energy constant of the parking orbit at a departure or arrival node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParkingOrbit {
    /// Circular orbit at the parking radius.
    Circular,
    /// Fixed energy constant `h = v² − 2·GM/r`.
    Energy(f64),
}

impl ParkingOrbit {
    fn energy(&self, parking_radius: f64, gm: f64) -> f64 {
        match self {
            ParkingOrbit::Circular => circular_energy(parking_radius, gm),
            ParkingOrbit::Energy(h) => *h,
        }
    }
}

/// Departure from, or arrival into, a parking orbit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParkingNode {
    pub parking: ParkingOrbit,
    pub parking_radius: f64,
    pub sphere_radius: f64,
    pub impulse: Ceiling,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyByNode {
    pub planet_radius: f64,
    pub sphere_radius: f64,
    pub mismatch: Ceiling,
    pub kink_a: f64,
    pub kink_k: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurnNode {
    pub impulse: Ceiling,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Departure(ParkingNode),
    Arrival(ParkingNode),
    FlyBy(FlyByNode),
    Burn(BurnNode),
}

/// Outcome of [`Node::check`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeCheck {
    pub impulse: f64,
    pub mismatch: f64,
    pub correction: f64,
    pub feasible: bool,
}

impl NodeCheck {
    fn infeasible(self) -> Self {
        Self {
            feasible: false,
            ..self
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub anchor: Anchor,
    pub kind: NodeKind,
}

impl Node {
    pub fn departure(ephemeris: SharedEphemerides, params: ParkingNode) -> Self {
        Self {
            anchor: Anchor::Script(Some(ephemeris)),
            kind: NodeKind::Departure(params),
        }
    }

    pub fn arrival(ephemeris: SharedEphemerides, params: ParkingNode) -> Self {
        Self {
            anchor: Anchor::Script(Some(ephemeris)),
            kind: NodeKind::Arrival(params),
        }
    }

    pub fn flyby(ephemeris: SharedEphemerides, params: FlyByNode) -> Self {
        Self {
            anchor: Anchor::Script(Some(ephemeris)),
            kind: NodeKind::FlyBy(params),
        }
    }

    pub fn burn(position: Vector3, params: BurnNode) -> Self {
        Self {
            anchor: Anchor::Static(position),
            kind: NodeKind::Burn(params),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.anchor.is_valid()
    }

    /// Feasibility and cost of passing the node with body-relative velocity `w_in` on the
    /// incoming leg and `w_out` on the outgoing one.
    ///
    /// Penalty terms are only generated when `with_correction` is set.
    pub fn check(&self, w_in: &Vector3, w_out: &Vector3, with_correction: bool) -> NodeCheck {
        let gm = self.anchor.gravitational_parameter();
        match (&self.kind, gm) {
            (NodeKind::Departure(node), Some(gm)) => {
                let h0 = node.parking.energy(node.parking_radius, gm);
                let impulse = patched::escape_impulse(
                    node.parking_radius,
                    node.sphere_radius,
                    h0,
                    vector::norm(w_out),
                    gm,
                );
                impulse_check(impulse, &node.impulse, with_correction)
            }
            (NodeKind::Arrival(node), Some(gm)) => {
                let h1 = node.parking.energy(node.parking_radius, gm);
                let impulse = patched::capture_impulse(
                    node.sphere_radius,
                    node.parking_radius,
                    h1,
                    vector::norm(w_in),
                    gm,
                );
                impulse_check(impulse, &node.impulse, with_correction)
            }
            (NodeKind::FlyBy(node), Some(gm)) => flyby_check(node, w_in, w_out, gm, with_correction),
            (NodeKind::Burn(node), _) => {
                let impulse = vector::norm(&vector::sub(w_out, w_in));
                impulse_check(impulse, &node.impulse, with_correction)
            }
            (_, None) => NodeCheck::default(),
        }
    }
}

fn impulse_check(impulse: f64, ceiling: &Ceiling, with_correction: bool) -> NodeCheck {
    let check = NodeCheck {
        impulse,
        feasible: true,
        ..NodeCheck::default()
    };
    if ceiling.exceeded(impulse) {
        return check.infeasible();
    }
    if with_correction && ceiling.is_enabled() {
        return NodeCheck {
            correction: ceiling.penalty(impulse),
            ..check
        };
    }
    check
}

fn flyby_check(node: &FlyByNode, w_in: &Vector3, w_out: &Vector3, gm: f64, with_correction: bool) -> NodeCheck {
    let (speed_in, speed_out) = (vector::norm(w_in), vector::norm(w_out));
    let mut check = NodeCheck {
        mismatch: (speed_out - speed_in).abs(),
        feasible: true,
        ..NodeCheck::default()
    };
    if node.mismatch.exceeded(check.mismatch) {
        return check.infeasible();
    }

    let speed = 0.5 * (speed_in + speed_out);
    if energy(speed, node.sphere_radius, gm) <= 0.0 {
        return check.infeasible();
    }

    let b_min = hyperbolic::min_impact_parameter(speed, node.sphere_radius, node.planet_radius, gm);
    let max_turn = hyperbolic::max_turn_angle(speed, b_min, node.sphere_radius, gm);
    let turn = vector::angle_between(w_in, w_out);
    if !(turn < max_turn) {
        return check.infeasible();
    }

    if with_correction {
        if node.mismatch.is_enabled() {
            check.correction += node.mismatch.penalty(check.mismatch);
        }
        check.correction += penalty(turn, max_turn, node.kink_a, node.kink_k);
    }
    check
}
