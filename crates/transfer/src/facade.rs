//! Re-exported APIs for consumers of the transfer crate.

pub use crate::cost::CostWeights;
pub use crate::link::{Departure, Frame, Link};
pub use crate::mission::{BurnNodeTemplate, Mission, MissionError, RefineConfig};
pub use crate::nodes::{
    Anchor, BurnNode, Ceiling, FlyByNode, Node, NodeCheck, NodeKind, ParkingNode, ParkingOrbit,
};
pub use crate::path_tree::{PathId, PathTree, TreeError};
pub use crate::search::{Crossing, Leg, Pattern, SearchConfig, Target, scan, window_length};
pub use crate::solver::{
    FlightChain, FlightInfo, PathFinder, RefinedChain, SecondApprox, Sweep, Waypoint,
    compute_flight,
};
