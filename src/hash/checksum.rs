//! CRC32C and Adler-32 running checksums
//!
//! CRC32 (IEEE) comes from `crc32fast` and CRC32C from `crc32c`; both are
//! wrapped so every running checksum has the same `update`/`value`/`reset`
//! shape. Adler-32 is small enough to keep here.

/// CRC-32C (Castagnoli)
#[derive(Debug, Clone)]
pub struct Crc32c {
    state: u32,
}

impl Crc32c {
    /// Create a fresh checksum
    pub fn new() -> Self {
        Self { state: 0 }
    }

    /// Feed more input
    pub fn update(&mut self, data: &[u8]) {
        self.state = crc32c::crc32c_append(self.state, data);
    }

    /// Current checksum value
    pub fn value(&self) -> u32 {
        self.state
    }

    /// Return to the initial state
    pub fn reset(&mut self) {
        self.state = 0;
    }
}

impl Default for Crc32c {
    fn default() -> Self {
        Self::new()
    }
}

const ADLER_MOD: u32 = 65_521;
// Largest n such that 255n(n+1)/2 + (n+1)(MOD-1) fits in u32.
const ADLER_NMAX: usize = 5552;

/// Adler-32 running checksum
#[derive(Debug, Clone)]
pub struct Adler32 {
    a: u32,
    b: u32,
}

impl Adler32 {
    /// Create a fresh checksum
    pub fn new() -> Self {
        Self { a: 1, b: 0 }
    }

    /// Feed more input
    pub fn update(&mut self, data: &[u8]) {
        for chunk in data.chunks(ADLER_NMAX) {
            for &byte in chunk {
                self.a += byte as u32;
                self.b += self.a;
            }
            self.a %= ADLER_MOD;
            self.b %= ADLER_MOD;
        }
    }

    /// Current checksum value
    pub fn value(&self) -> u32 {
        (self.b << 16) | self.a
    }

    /// Return to the initial state
    pub fn reset(&mut self) {
        self.a = 1;
        self.b = 0;
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Hex-encode a 32-bit checksum as 8 lowercase digits
pub fn hex32(value: u32) -> String {
    format!("{:08x}", value)
}
