//! File system traversal
//!
//! Walks the base directory and yields the regular, readable files that
//! make up a manifest.

mod scanner;

pub use scanner::*;
