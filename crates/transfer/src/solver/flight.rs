//! Leg-by-leg chain construction shared by both approximations.

use pathfinder_core::vector::ZERO;
use tracing::debug;

use crate::link::Link;
use crate::mission::MissionError;
use crate::nodes::Node;
use crate::path_tree::PathTree;
use crate::search::{Leg, SearchConfig, window_length};

use super::{FlightChain, FlightInfo};

/// A node together with the toss angles tried on the leg leaving it.
#[derive(Debug, Clone, Copy)]
pub struct Waypoint<'a> {
    pub node: &'a Node,
    pub toss_angles: &'a [f64],
}

fn accumulate(parent: &mut FlightInfo, child: &mut FlightInfo) {
    child.total_impulse += parent.total_impulse;
    child.total_mismatch += parent.total_mismatch;
    child.total_correction += parent.total_correction;
    child.total_time += parent.total_time;
    child.abs_time += parent.abs_time;
}

/// Every feasible chain through `waypoints`, departing the first one at `t0`.
///
/// Each layer of the tree holds the legs of one mission leg; a path survives a layer only
/// if the node it leaves (and, on the last leg, the node it reaches) accepts the link.
pub fn compute_flight(
    waypoints: &[Waypoint<'_>],
    t0: f64,
    gm: f64,
    search: &SearchConfig,
    with_correction: bool,
) -> Result<Vec<FlightChain>, MissionError> {
    let mut tree = PathTree::<FlightInfo>::new();
    tree.set_on_added(accumulate);
    let seed = FlightInfo {
        abs_time: t0,
        ..FlightInfo::default()
    };
    let mut open = vec![tree.append(seed, PathTree::<FlightInfo>::ROOT)?];

    let legs = waypoints.len().saturating_sub(1);
    for (index, pair) in waypoints.windows(2).enumerate() {
        let (from, to) = (&pair[0], &pair[1]);
        let last = index + 1 == legs;
        let mut next = Vec::new();
        for parent_id in open {
            let parent = *tree.get(parent_id)?;
            for child in extend(&parent, from, to, index, last, gm, search, with_correction)? {
                next.push(tree.append(child, parent_id)?);
            }
        }
        debug!(leg = index, paths = next.len(), "leg layer appended");
        open = next;
        if open.is_empty() {
            break;
        }
    }

    let chains = tree
        .full_paths(&open, true)?
        .into_iter()
        .filter_map(FlightChain::from_legs)
        .collect();
    Ok(chains)
}

#[allow(clippy::too_many_arguments)]
fn extend(
    parent: &FlightInfo,
    from: &Waypoint<'_>,
    to: &Waypoint<'_>,
    index: usize,
    last: bool,
    gm: f64,
    search: &SearchConfig,
    with_correction: bool,
) -> Result<Vec<FlightInfo>, MissionError> {
    let origin = from
        .node
        .anchor
        .state(parent.abs_time)
        .ok_or(MissionError::UnboundNode { index })?;
    let target = to
        .node
        .anchor
        .target()
        .ok_or(MissionError::UnboundNode { index: index + 1 })?;
    let end = parent.abs_time
        + window_length(
            &origin.position,
            &target.position(parent.abs_time),
            gm,
            search.period_factor,
        );
    let leg = Leg {
        origin,
        target,
        t0: parent.abs_time,
        end,
        gm,
    };

    let children = leg
        .find_links(from.toss_angles, search)
        .into_iter()
        .filter_map(|link| {
            let leaving = from.node.check(&parent.link.w1, &link.w0, with_correction);
            if !leaving.feasible {
                return None;
            }
            let (mut impulse, mut mismatch, mut correction) =
                (leaving.impulse, leaving.mismatch, leaving.correction);
            if last {
                let reaching = to.node.check(&link.w1, &ZERO, with_correction);
                if !reaching.feasible {
                    return None;
                }
                impulse += reaching.impulse;
                mismatch += reaching.mismatch;
                correction += reaching.correction;
            }
            Some(leg_info(link, impulse, mismatch, correction))
        })
        .collect();
    Ok(children)
}

/// Payload of a freshly found leg; totals are completed by the tree callback.
fn leg_info(link: Link, impulse: f64, mismatch: f64, correction: f64) -> FlightInfo {
    let dt = link.dt();
    FlightInfo {
        link,
        impulse,
        mismatch,
        correction,
        total_impulse: impulse,
        total_mismatch: mismatch,
        total_correction: correction,
        total_time: dt,
        abs_time: dt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Anchor, BurnNode, Ceiling, NodeKind, ParkingNode, ParkingOrbit};
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use pathfinder_core::vector::norm;
    use pathfinder_ephemeris::{CircularOrbit, SharedEphemerides};
    use std::sync::Arc;

    const GM_SUN: f64 = 1.327e20;

    fn earth() -> SharedEphemerides {
        Arc::new(CircularOrbit::new(3.986e14, 1.496e11, 3.156e7, 0.0).unwrap())
    }

    fn departure() -> Node {
        Node::departure(
            earth(),
            ParkingNode {
                parking: ParkingOrbit::Circular,
                parking_radius: 6.7e6,
                sphere_radius: 9.25e8,
                impulse: Ceiling::DISABLED,
            },
        )
    }

    fn point(x: f64, y: f64) -> Node {
        Node::burn(
            [x, y, 0.0],
            BurnNode {
                impulse: Ceiling::DISABLED,
            },
        )
    }

    fn search() -> SearchConfig {
        SearchConfig::new(1.0, 4, 86_400.0, 3_600.0)
    }

    #[test]
    fn single_leg_to_a_fixed_point() {
        let (start, target) = (departure(), point(0.0, 2.0e11));
        let angles = [80f64.to_radians(), 85f64.to_radians()];
        let waypoints = [
            Waypoint {
                node: &start,
                toss_angles: &angles,
            },
            Waypoint {
                node: &target,
                toss_angles: &[],
            },
        ];
        let chains = compute_flight(&waypoints, 1_000.0, GM_SUN, &search(), false).unwrap();
        assert_eq!(chains.len(), 2);
        for chain in &chains {
            assert_eq!(chain.legs.len(), 1);
            let leg = &chain.legs[0];
            assert_eq!(chain.start_time, 1_000.0);
            assert_relative_eq!(chain.total_time, leg.link.dt());
            assert_relative_eq!(leg.abs_time, leg.link.t1);
            // a static arrival point brakes the whole arrival velocity
            assert!(chain.impulse > norm(&leg.link.w1));
            assert_relative_eq!(chain.impulse, leg.impulse);
        }
    }

    #[test]
    fn totals_accumulate_along_the_chain() {
        let (start, mid, end) = (departure(), point(0.0, 1.8e11), point(-2.2e11, 0.0));
        let angles = [80f64.to_radians()];
        let mid_angles = [80f64.to_radians()];
        let waypoints = [
            Waypoint {
                node: &start,
                toss_angles: &angles,
            },
            Waypoint {
                node: &mid,
                toss_angles: &mid_angles,
            },
            Waypoint {
                node: &end,
                toss_angles: &[],
            },
        ];
        let chains = compute_flight(&waypoints, 0.0, GM_SUN, &search(), false).unwrap();
        assert_eq!(chains.len(), 1);
        let chain = &chains[0];
        let (first, second) = (&chain.legs[0], &chain.legs[1]);
        assert_abs_diff_eq!(second.link.t0, first.link.t1);
        assert_relative_eq!(chain.total_time, first.link.dt() + second.link.dt());
        assert_relative_eq!(chain.impulse, first.impulse + second.impulse);
        assert_relative_eq!(second.total_impulse, chain.impulse);
        assert_relative_eq!(second.abs_time, second.link.t1);
    }

    #[test]
    fn unbound_target_is_reported() {
        let start = departure();
        let unbound = Node {
            anchor: Anchor::Script(None),
            kind: NodeKind::Burn(BurnNode {
                impulse: Ceiling::DISABLED,
            }),
        };
        let angles = [1.0];
        let waypoints = [
            Waypoint {
                node: &start,
                toss_angles: &angles,
            },
            Waypoint {
                node: &unbound,
                toss_angles: &[],
            },
        ];
        let err = compute_flight(&waypoints, 0.0, GM_SUN, &search(), false).unwrap_err();
        assert!(matches!(err, MissionError::UnboundNode { index: 1 }));
    }

    #[test]
    fn impulse_ceiling_prunes_every_link() {
        let start = Node::departure(
            earth(),
            ParkingNode {
                parking: ParkingOrbit::Circular,
                parking_radius: 6.7e6,
                sphere_radius: 9.25e8,
                impulse: Ceiling::new(1.0, 1.0, 4.0),
            },
        );
        let target = point(0.0, 2.0e11);
        let angles = search().toss_angles();
        let waypoints = [
            Waypoint {
                node: &start,
                toss_angles: &angles,
            },
            Waypoint {
                node: &target,
                toss_angles: &[],
            },
        ];
        assert!(compute_flight(&waypoints, 0.0, GM_SUN, &search(), false)
            .unwrap()
            .is_empty());
    }
}
