//! Validated mission description consumed by the solver.

use pathfinder_core::vector::Vector3;

use crate::nodes::{BurnNode, Ceiling, Node, NodeKind, ParkingNode};
use crate::path_tree::TreeError;
use crate::search::SearchConfig;

/// Mission construction and structural errors.
#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error("invalid mission field `{field}`: {reason}")]
    Config { field: String, reason: String },
    #[error("node #{index} is not bound to an ephemeris")]
    UnboundNode { index: usize },
    #[error("flight has {found} legs, the mission needs {expected}")]
    ChainShape { expected: usize, found: usize },
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error("minimizer failed: {0}")]
    Minimize(#[from] pathfinder_minimize::MinimizeError),
}

impl MissionError {
    fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        MissionError::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Produces the burn nodes inserted between mission nodes during refinement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurnNodeTemplate {
    pub impulse: Ceiling,
}

impl BurnNodeTemplate {
    pub fn spawn(&self, position: Vector3) -> Node {
        Node::burn(position, BurnNode { impulse: self.impulse })
    }
}

/// Settings of the continuous refinement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefineConfig {
    /// Departure-time search used while rebuilding chains.
    pub search: SearchConfig,
    /// Where along each leg the burn point is seeded, in `(0, 1)`.
    pub burn_arc_fraction: f64,
    /// Stop once the best cost changes by less than this between iterations.
    pub min_delta: f64,
    pub max_iterations: usize,
    pub toss_angle_step: f64,
    /// Initial simplex step of the burn coordinates (m).
    pub burn_point_step: f64,
    /// Initial simplex step of the launch epoch (s).
    pub time_step: f64,
    /// Stop once the simplex is smaller than this.
    pub simplex_tolerance: f64,
    pub burn: BurnNodeTemplate,
}

impl RefineConfig {
    pub fn new(search: SearchConfig, burn: BurnNodeTemplate) -> Self {
        Self {
            search,
            burn_arc_fraction: 0.5,
            min_delta: 0.1,
            max_iterations: 100,
            toss_angle_step: 0.001,
            burn_point_step: 1.0e6,
            time_step: 43_200.0,
            simplex_tolerance: 1.0e-3,
            burn,
        }
    }
}

/// Ordered node sequence plus every solver setting.
#[derive(Debug, Clone)]
pub struct Mission {
    pub nodes: Vec<Node>,
    /// Central body gravitational parameter.
    pub gm: f64,
    /// Base launch epoch; first-approximation offsets are added to it.
    pub t0: f64,
    pub fax: SearchConfig,
    pub sax: RefineConfig,
}

impl Mission {
    pub fn new(
        nodes: Vec<Node>,
        gm: f64,
        t0: f64,
        fax: SearchConfig,
        sax: RefineConfig,
    ) -> Result<Self, MissionError> {
        if nodes.len() < 2 {
            return Err(MissionError::config("nodes", "a mission needs at least two nodes"));
        }
        positive("gm", gm)?;
        if !t0.is_finite() {
            return Err(MissionError::config("t0", "must be finite"));
        }
        validate_search("fax", &fax)?;
        validate_search("sax", &sax.search)?;
        validate_refine(&sax)?;
        for (index, node) in nodes.iter().enumerate() {
            validate_node(index, node)?;
        }
        Ok(Self {
            nodes,
            gm,
            t0,
            fax,
            sax,
        })
    }

    /// Number of legs between consecutive nodes.
    pub fn legs(&self) -> usize {
        self.nodes.len() - 1
    }
}

fn positive(field: &str, value: f64) -> Result<f64, MissionError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(MissionError::config(field, format!("must be positive, got {value}")))
    }
}

fn validate_search(section: &str, config: &SearchConfig) -> Result<(), MissionError> {
    positive(&format!("{section}.period_factor"), config.period_factor)?;
    positive(&format!("{section}.time_step"), config.time_step)?;
    positive(&format!("{section}.time_tolerance"), config.time_tolerance)?;
    positive(&format!("{section}.refine_fraction"), config.refine_fraction)?;
    if config.toss_angle_count == 0 {
        return Err(MissionError::config(
            format!("{section}.toss_angle_count"),
            "at least one toss angle is required",
        ));
    }
    if !(0.0..1.0).contains(&config.eccentricity_ceiling) {
        return Err(MissionError::config(
            format!("{section}.eccentricity_ceiling"),
            "must lie in [0, 1)",
        ));
    }
    Ok(())
}

fn validate_refine(config: &RefineConfig) -> Result<(), MissionError> {
    if !(config.burn_arc_fraction > 0.0 && config.burn_arc_fraction < 1.0) {
        return Err(MissionError::config("sax.burn_arc_fraction", "must lie in (0, 1)"));
    }
    positive("sax.min_delta", config.min_delta)?;
    positive("sax.toss_angle_step", config.toss_angle_step)?;
    positive("sax.burn_point_step", config.burn_point_step)?;
    positive("sax.time_step", config.time_step)?;
    if config.max_iterations == 0 {
        return Err(MissionError::config("sax.max_iterations", "must be at least 1"));
    }
    if config.simplex_tolerance < 0.0 {
        return Err(MissionError::config("sax.simplex_tolerance", "must not be negative"));
    }
    Ok(())
}

fn validate_node(index: usize, node: &Node) -> Result<(), MissionError> {
    if !node.is_valid() {
        return Err(MissionError::UnboundNode { index });
    }
    let field = |name: &str| format!("nodes[{index}].{name}");
    if !matches!(node.kind, NodeKind::Burn(_)) {
        let gm = node.anchor.gravitational_parameter().unwrap_or(f64::NAN);
        positive(&field("gm"), gm)?;
    }
    match &node.kind {
        NodeKind::Departure(parking) | NodeKind::Arrival(parking) => validate_parking(parking, &field),
        NodeKind::FlyBy(flyby) => {
            positive(&field("planet_radius"), flyby.planet_radius)?;
            if !(flyby.sphere_radius > flyby.planet_radius) {
                return Err(MissionError::config(
                    field("sphere_radius"),
                    "must exceed the planet radius",
                ));
            }
            Ok(())
        }
        NodeKind::Burn(_) => Ok(()),
    }
}

fn validate_parking(parking: &ParkingNode, field: &dyn Fn(&str) -> String) -> Result<(), MissionError> {
    positive(&field("parking_radius"), parking.parking_radius)?;
    if !(parking.sphere_radius > parking.parking_radius) {
        return Err(MissionError::config(
            field("sphere_radius"),
            "must exceed the parking radius",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Anchor, FlyByNode, ParkingOrbit};
    use pathfinder_ephemeris::{CircularOrbit, SharedEphemerides};
    use std::sync::Arc;

    fn body() -> SharedEphemerides {
        Arc::new(CircularOrbit::new(3.986e14, 1.496e11, 3.156e7, 0.0).unwrap())
    }

    fn parking() -> ParkingNode {
        ParkingNode {
            parking: ParkingOrbit::Circular,
            parking_radius: 6.7e6,
            sphere_radius: 9.25e8,
            impulse: Ceiling::DISABLED,
        }
    }

    fn search() -> SearchConfig {
        SearchConfig::new(1.0, 12, 86_400.0, 3_600.0)
    }

    fn refine() -> RefineConfig {
        RefineConfig::new(
            search(),
            BurnNodeTemplate {
                impulse: Ceiling::new(1_000.0, 1.0, 4.0),
            },
        )
    }

    fn build(nodes: Vec<Node>) -> Result<Mission, MissionError> {
        Mission::new(nodes, 1.327e20, 0.0, search(), refine())
    }

    #[test]
    fn accepts_departure_arrival_pair() {
        let mission = build(vec![
            Node::departure(body(), parking()),
            Node::arrival(body(), parking()),
        ])
        .unwrap();
        assert_eq!(mission.legs(), 1);
    }

    #[test]
    fn rejects_single_node() {
        let err = build(vec![Node::departure(body(), parking())]).unwrap_err();
        assert!(matches!(err, MissionError::Config { ref field, .. } if field == "nodes"));
    }

    #[test]
    fn reports_unbound_node_index() {
        let unbound = Node {
            anchor: Anchor::Script(None),
            kind: NodeKind::Arrival(parking()),
        };
        let err = build(vec![Node::departure(body(), parking()), unbound]).unwrap_err();
        assert!(matches!(err, MissionError::UnboundNode { index: 1 }));
    }

    #[test]
    fn rejects_bad_search_grid() {
        let mut fax = search();
        fax.time_step = 0.0;
        let err = Mission::new(
            vec![Node::departure(body(), parking()), Node::arrival(body(), parking())],
            1.327e20,
            0.0,
            fax,
            refine(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("fax.time_step"));
    }

    #[test]
    fn rejects_flyby_inside_planet() {
        let flyby = Node::flyby(
            body(),
            FlyByNode {
                planet_radius: 6.4e6,
                sphere_radius: 1.0e6,
                mismatch: Ceiling::DISABLED,
                kink_a: 1.0,
                kink_k: 1.0,
            },
        );
        let err = build(vec![
            Node::departure(body(), parking()),
            flyby,
            Node::arrival(body(), parking()),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("nodes[1].sphere_radius"));
    }

    #[test]
    fn rejects_burn_fraction_at_the_ends() {
        let mut sax = refine();
        sax.burn_arc_fraction = 1.0;
        let err = Mission::new(
            vec![Node::departure(body(), parking()), Node::arrival(body(), parking())],
            1.327e20,
            0.0,
            search(),
            sax,
        )
        .unwrap_err();
        assert!(err.to_string().contains("burn_arc_fraction"));
    }

    #[test]
    fn template_spawns_static_burns() {
        let node = refine().burn.spawn([1.0, 2.0, 3.0]);
        match node.anchor {
            Anchor::Static(position) => assert_eq!(position, [1.0, 2.0, 3.0]),
            Anchor::Script(_) => panic!("burn nodes are static"),
        }
        assert!(matches!(node.kind, NodeKind::Burn(_)));
    }
}
