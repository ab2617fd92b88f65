//! Shared data structures for the navigation pipeline
//!
//! - Input: `Location` fixes from the host's positioning source
//! - Route model: `Route` → `RouteLeg` → `LegStep` with maneuvers and instructions
//! - Output: `NavigationUpdate`, one per processed fix

mod location;
mod route;
mod update;

pub use location::*;
pub use route::*;
pub use update::*;
