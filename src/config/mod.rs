//! Navigation Configuration Module
//!
//! Session options loaded from TOML, with every field defaulted to the
//! values in [`defaults`].
//!
//! ## Loading Order
//!
//! 1. `NAVIGATION_CONFIG` environment variable (path to TOML file)
//! 2. `navigation.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Options are built once and shared with the session as an `Arc`:
//!
//! ```ignore
//! let options = Arc::new(NavigationOptions::load());
//! let processor = RouteProcessor::new(route, options)?;
//! ```

mod options;
pub mod defaults;
pub mod validation;

pub use options::*;
