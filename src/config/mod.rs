//! Configuration module for treesum
//!
//! CLI arguments and the runtime configuration derived from them.

mod settings;

pub use settings::*;
