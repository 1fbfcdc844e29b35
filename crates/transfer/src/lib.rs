//! Multi-leg transfer search: link search, path tree, node model and the mission solver.

pub mod cost;
pub mod link;
pub mod mission;
pub mod nodes;
pub mod path_tree;
pub mod search;
pub mod solver;

pub use facade::*;

mod facade;
