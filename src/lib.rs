//! Multi-leg spacecraft trajectory search.
//!
//! The workspace crates are re-exported here so front-ends and integration tests depend on
//! one package: ephemerides feed the link search, the path tree enumerates chains, the
//! node model prunes them and the two-phase solver ranks and refines what survives.

pub use pathfinder_config as config;
pub use pathfinder_core as base;
pub use pathfinder_ephemeris as ephemeris;
pub use pathfinder_export as export;
pub use pathfinder_minimize as minimize;
pub use pathfinder_orbits as orbits;
pub use pathfinder_transfer as transfer;

/// Returns the version of the library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
