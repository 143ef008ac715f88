//! Hash computation module
//!
//! From-scratch XXH64 and XXH3-128, RustCrypto digests, running checksums,
//! and the registry that maps names and digest widths onto them.

mod algorithm;
pub mod bytes;
mod checksum;
mod file;
pub mod wide;
mod xxh3;
mod xxh64;

pub use algorithm::*;
pub use checksum::{Adler32, Crc32c};
pub use file::*;
pub use xxh3::XxHash3;
pub use xxh64::XxHash64;
