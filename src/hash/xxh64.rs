//! Streaming XXH64
//!
//! Input is consumed in 32-byte blocks across four lane accumulators. A
//! partial block is kept in an internal buffer until more bytes arrive or
//! the digest is taken, so files can be fed in arbitrary read chunks.

use super::bytes::{read_u32_le, read_u64_le};

pub(crate) const PRIME64_1: u64 = 0x9E37_79B1_85EB_CA87;
pub(crate) const PRIME64_2: u64 = 0xC2B2_AE3D_27D4_EB4F;
pub(crate) const PRIME64_3: u64 = 0x1656_67B1_9E37_79F9;
pub(crate) const PRIME64_4: u64 = 0x85EB_CA77_C2B2_AE63;
pub(crate) const PRIME64_5: u64 = 0x27D4_EB2F_1656_67C5;

const BLOCK_LEN: usize = 32;

#[inline(always)]
fn round(acc: u64, input: u64) -> u64 {
    acc.wrapping_add(input.wrapping_mul(PRIME64_2))
        .rotate_left(31)
        .wrapping_mul(PRIME64_1)
}

#[inline(always)]
fn merge_round(acc: u64, lane: u64) -> u64 {
    (acc ^ round(0, lane))
        .wrapping_mul(PRIME64_1)
        .wrapping_add(PRIME64_4)
}

/// Final XXH64 bit mixing.
#[inline(always)]
pub(crate) fn avalanche(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(PRIME64_2);
    h ^= h >> 29;
    h = h.wrapping_mul(PRIME64_3);
    h ^ (h >> 32)
}

/// Streaming XXH64 state
#[derive(Debug, Clone)]
pub struct XxHash64 {
    seed: u64,
    lanes: [u64; 4],
    total_len: u64,
    pending: [u8; BLOCK_LEN],
    pending_len: usize,
}

impl XxHash64 {
    /// Create a hasher for the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            lanes: Self::initial_lanes(seed),
            total_len: 0,
            pending: [0; BLOCK_LEN],
            pending_len: 0,
        }
    }

    fn initial_lanes(seed: u64) -> [u64; 4] {
        [
            seed.wrapping_add(PRIME64_1).wrapping_add(PRIME64_2),
            seed.wrapping_add(PRIME64_2),
            seed,
            seed.wrapping_sub(PRIME64_1),
        ]
    }

    /// Seed this hasher was created with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline(always)]
    fn consume_block(lanes: &mut [u64; 4], block: &[u8]) {
        lanes[0] = round(lanes[0], read_u64_le(block, 0));
        lanes[1] = round(lanes[1], read_u64_le(block, 8));
        lanes[2] = round(lanes[2], read_u64_le(block, 16));
        lanes[3] = round(lanes[3], read_u64_le(block, 24));
    }

    /// Feed more input
    pub fn update(&mut self, mut data: &[u8]) {
        self.total_len += data.len() as u64;

        if self.pending_len + data.len() < BLOCK_LEN {
            self.pending[self.pending_len..self.pending_len + data.len()].copy_from_slice(data);
            self.pending_len += data.len();
            return;
        }

        if self.pending_len > 0 {
            let fill = BLOCK_LEN - self.pending_len;
            self.pending[self.pending_len..].copy_from_slice(&data[..fill]);
            let block = self.pending;
            Self::consume_block(&mut self.lanes, &block);
            data = &data[fill..];
            self.pending_len = 0;
        }

        let mut chunks = data.chunks_exact(BLOCK_LEN);
        for block in &mut chunks {
            Self::consume_block(&mut self.lanes, block);
        }

        let rest = chunks.remainder();
        self.pending[..rest.len()].copy_from_slice(rest);
        self.pending_len = rest.len();
    }

    /// Compute the hash of everything fed so far. The state is left intact.
    pub fn digest(&self) -> u64 {
        let mut h = if self.total_len >= BLOCK_LEN as u64 {
            let [v1, v2, v3, v4] = self.lanes;
            let mut acc = v1
                .rotate_left(1)
                .wrapping_add(v2.rotate_left(7))
                .wrapping_add(v3.rotate_left(12))
                .wrapping_add(v4.rotate_left(18));
            for lane in self.lanes {
                acc = merge_round(acc, lane);
            }
            acc
        } else {
            self.seed.wrapping_add(PRIME64_5)
        };

        h = h.wrapping_add(self.total_len);

        let tail = &self.pending[..self.pending_len];
        let mut offset = 0;
        while offset + 8 <= tail.len() {
            let k1 = round(0, read_u64_le(tail, offset));
            h = (h ^ k1)
                .rotate_left(27)
                .wrapping_mul(PRIME64_1)
                .wrapping_add(PRIME64_4);
            offset += 8;
        }
        if offset + 4 <= tail.len() {
            h = (h ^ (read_u32_le(tail, offset) as u64).wrapping_mul(PRIME64_1))
                .rotate_left(23)
                .wrapping_mul(PRIME64_2)
                .wrapping_add(PRIME64_3);
            offset += 4;
        }
        for &byte in &tail[offset..] {
            h = (h ^ (byte as u64).wrapping_mul(PRIME64_5))
                .rotate_left(11)
                .wrapping_mul(PRIME64_1);
        }

        avalanche(h)
    }

    /// Return to the freshly seeded state
    pub fn reset(&mut self) {
        self.lanes = Self::initial_lanes(self.seed);
        self.total_len = 0;
        self.pending_len = 0;
    }

    /// Hash a whole buffer in one call
    pub fn oneshot(seed: u64, data: &[u8]) -> u64 {
        let mut hasher = Self::new(seed);
        hasher.update(data);
        hasher.digest()
    }
}

impl Default for XxHash64 {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i.wrapping_mul(131) ^ (i >> 3)) as u8).collect()
    }

    const LENGTHS: &[usize] = &[
        0, 1, 3, 4, 7, 8, 9, 15, 16, 17, 31, 32, 33, 35, 36, 40, 63, 64, 65, 100, 128, 255, 256,
        1000, 1024, 4096, 10_007,
    ];

    #[test]
    fn test_known_vectors() {
        assert_eq!(XxHash64::oneshot(0, b""), 0xEF46_DB37_51D8_E999);
        assert_eq!(XxHash64::oneshot(0, b"a"), 0xD24E_C4F1_A98C_6E5B);
        assert_eq!(XxHash64::oneshot(0, b"abc"), 0x44BC_2CF5_AD77_0999);
    }

    #[test]
    fn test_matches_reference() {
        for &seed in &[0u64, 0x9E37_79B9_7F4A_7C15] {
            for &len in LENGTHS {
                let data = sample(len);
                assert_eq!(
                    XxHash64::oneshot(seed, &data),
                    xxhash_rust::xxh64::xxh64(&data, seed),
                    "len={} seed={:#x}",
                    len,
                    seed
                );
            }
        }
    }

    #[test]
    fn test_chunked_updates_match_oneshot() {
        let data = sample(3000);
        for &chunk in &[1usize, 5, 31, 32, 33, 100, 257] {
            let mut hasher = XxHash64::new(42);
            for part in data.chunks(chunk) {
                hasher.update(part);
            }
            assert_eq!(hasher.digest(), xxhash_rust::xxh64::xxh64(&data, 42), "chunk={}", chunk);
        }
    }

    #[test]
    fn test_reset_reuses_state() {
        let mut hasher = XxHash64::new(7);
        hasher.update(&sample(77));
        hasher.reset();
        hasher.update(b"hello");
        assert_eq!(hasher.digest(), XxHash64::oneshot(7, b"hello"));
        assert_eq!(hasher.seed(), 7);
    }
}
