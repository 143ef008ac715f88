//! Core engines
//!
//! The create/update and verify pipelines, plus the worker pool they
//! share for hashing files in parallel.

mod create;
mod pool;
mod verify;

pub use create::*;
pub use pool::*;
pub use verify::*;
