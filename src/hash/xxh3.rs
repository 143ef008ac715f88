//! Streaming XXH3 128-bit
//!
//! Inputs up to 240 bytes are hashed by one of the short-input routines
//! once the digest is requested. Longer inputs are folded stripe by stripe
//! into eight accumulators, with a scramble after every 1024-byte block.
//! The streaming buffer holds four stripes; it is only drained when more
//! input follows, so the final (possibly overlapping) stripe is always
//! available at digest time.

use super::bytes::{read_u32_le, read_u64_le};
use super::wide::{mul128, mul_fold64};
use super::xxh64::{avalanche as xxh64_avalanche, PRIME64_1, PRIME64_2, PRIME64_3, PRIME64_4, PRIME64_5};

const PRIME32_1: u64 = 0x9E37_79B1;
const PRIME32_2: u64 = 0x85EB_CA77;
const PRIME32_3: u64 = 0xC2B2_AE3D;

const SECRET_LEN: usize = 192;
const STRIPE_LEN: usize = 64;
const SECRET_CONSUME_RATE: usize = 8;
const STRIPES_PER_BLOCK: usize = (SECRET_LEN - STRIPE_LEN) / SECRET_CONSUME_RATE;
const SECRET_LAST_ACC_START: usize = 7;
const SECRET_MERGE_ACCS_START: usize = 11;
const MID_SIZE_MAX: usize = 240;

const BUFFER_STRIPES: usize = 4;
const BUFFER_LEN: usize = BUFFER_STRIPES * STRIPE_LEN;

/// Default secret table
const K_SECRET: [u8; SECRET_LEN] = [
    0xb8, 0xfe, 0x6c, 0x39, 0x23, 0xa4, 0x4b, 0xbe, 0x7c, 0x01, 0x81, 0x2c, 0xf7, 0x21, 0xad, 0x1c,
    0xde, 0xd4, 0x6d, 0xe9, 0x83, 0x90, 0x97, 0xdb, 0x72, 0x40, 0xa4, 0xa4, 0xb7, 0xb3, 0x67, 0x1f,
    0xcb, 0x79, 0xe6, 0x4e, 0xcc, 0xc0, 0xe5, 0x78, 0x82, 0x5a, 0xd0, 0x7d, 0xcc, 0xff, 0x72, 0x21,
    0xb8, 0x08, 0x46, 0x74, 0xf7, 0x43, 0x24, 0x8e, 0xe0, 0x35, 0x90, 0xe6, 0x81, 0x3a, 0x26, 0x4c,
    0x3c, 0x28, 0x52, 0xbb, 0x91, 0xc3, 0x00, 0xcb, 0x88, 0xd0, 0x65, 0x8b, 0x1b, 0x53, 0x2e, 0xa3,
    0x71, 0x64, 0x48, 0x97, 0xa2, 0x0d, 0xf9, 0x4e, 0x38, 0x19, 0xef, 0x46, 0xa9, 0xde, 0xac, 0xd8,
    0xa8, 0xfa, 0x76, 0x3f, 0xe3, 0x9c, 0x34, 0x3f, 0xf9, 0xdc, 0xbb, 0xc7, 0xc7, 0x0b, 0x4f, 0x1d,
    0x8a, 0x51, 0xe0, 0x4b, 0xcd, 0xb4, 0x59, 0x31, 0xc8, 0x9f, 0x7e, 0xc9, 0xd9, 0x78, 0x73, 0x64,
    0xea, 0xc5, 0xac, 0x83, 0x34, 0xd3, 0xeb, 0xc3, 0xc5, 0x81, 0xa0, 0xff, 0xfa, 0x13, 0x63, 0xeb,
    0x17, 0x0d, 0xdd, 0x51, 0xb7, 0xf0, 0xda, 0x49, 0xd3, 0x16, 0x55, 0x26, 0x29, 0xd4, 0x68, 0x9e,
    0x2b, 0x16, 0xbe, 0x58, 0x7d, 0x47, 0xa1, 0xfc, 0x8f, 0xf8, 0xb8, 0xd1, 0x7a, 0xd0, 0x31, 0xce,
    0x45, 0xcb, 0x3a, 0x8f, 0x95, 0x16, 0x04, 0x28, 0xaf, 0xd7, 0xfb, 0xca, 0xbb, 0x4b, 0x40, 0x7e,
];

const INITIAL_ACC: [u64; 8] = [
    PRIME32_3, PRIME64_1, PRIME64_2, PRIME64_3, PRIME64_4, PRIME32_2, PRIME64_5, PRIME32_1,
];

#[inline(always)]
fn avalanche(mut h: u64) -> u64 {
    h ^= h >> 37;
    h = h.wrapping_mul(0x1656_6791_9E37_79F9);
    h ^ (h >> 32)
}

#[inline(always)]
fn mix32(seed: u64, secret_off: usize, acc: u64, in0: u64, in1: u64, in2: u64, in3: u64) -> u64 {
    let folded = mul_fold64(
        in0 ^ read_u64_le(&K_SECRET, secret_off).wrapping_add(seed),
        in1 ^ read_u64_le(&K_SECRET, secret_off + 8).wrapping_sub(seed),
    );
    acc.wrapping_add(folded) ^ in2.wrapping_add(in3)
}

#[inline(always)]
fn mix_two_accs(lhs: u64, rhs: u64, secret: &[u8], offset: usize) -> u64 {
    mul_fold64(
        lhs ^ read_u64_le(secret, offset),
        rhs ^ read_u64_le(secret, offset + 8),
    )
}

#[inline(always)]
fn accumulate_stripe(acc: &mut [u64; 8], stripe: &[u8], secret: &[u8], secret_off: usize) {
    for lane in 0..8 {
        let value = read_u64_le(stripe, 8 * lane);
        let key = value ^ read_u64_le(secret, secret_off + 8 * lane);
        acc[lane ^ 1] = acc[lane ^ 1].wrapping_add(value);
        acc[lane] = acc[lane].wrapping_add((key & 0xFFFF_FFFF).wrapping_mul(key >> 32));
    }
}

#[inline(always)]
fn scramble(acc: &mut [u64; 8], secret: &[u8]) {
    let base = SECRET_LEN - STRIPE_LEN;
    for (lane, value) in acc.iter_mut().enumerate() {
        let key = read_u64_le(secret, base + 8 * lane);
        *value = (*value ^ (*value >> 47) ^ key).wrapping_mul(PRIME32_1);
    }
}

/// Fold the low/high halves into the canonical 128-bit value
#[inline(always)]
fn combine(low: u64, high: u64) -> u128 {
    ((high as u128) << 64) | low as u128
}

fn len_0_to_16(data: &[u8], seed: u64) -> u128 {
    let len = data.len();
    if len > 8 {
        let bitflip_lo = (read_u64_le(&K_SECRET, 32) ^ read_u64_le(&K_SECRET, 40)).wrapping_sub(seed);
        let bitflip_hi = (read_u64_le(&K_SECRET, 48) ^ read_u64_le(&K_SECRET, 56)).wrapping_add(seed);
        let mut input_hi = read_u64_le(data, len - 8);
        let input_lo = read_u64_le(data, 0) ^ input_hi ^ bitflip_lo;

        let product = mul128(input_lo, PRIME64_1);
        let mut m_lo = (product as u64).wrapping_add(((len - 1) as u64) << 54);
        let mut m_hi = (product >> 64) as u64;
        input_hi ^= bitflip_hi;
        m_hi = m_hi
            .wrapping_add(input_hi)
            .wrapping_add((input_hi & 0xFFFF_FFFF).wrapping_mul(PRIME32_2 - 1));
        m_lo ^= m_hi.swap_bytes();

        let h = mul128(m_lo, PRIME64_2);
        let low = avalanche(h as u64);
        let high = avalanche(((h >> 64) as u64).wrapping_add(m_hi.wrapping_mul(PRIME64_2)));
        return combine(low, high);
    }

    if len >= 4 {
        let seed = seed ^ ((seed as u32).swap_bytes() as u64) << 32;
        let input_lo = read_u32_le(data, 0) as u64;
        let input_hi = read_u32_le(data, len - 4) as u64;
        let bitflip = (read_u64_le(&K_SECRET, 16) ^ read_u64_le(&K_SECRET, 24)).wrapping_add(seed);
        let keyed = input_lo.wrapping_add(input_hi << 32) ^ bitflip;

        let product = mul128(keyed, PRIME64_1.wrapping_add((len as u64) << 2));
        let mut m_lo = product as u64;
        let mut m_hi = (product >> 64) as u64;
        m_hi = m_hi.wrapping_add(m_lo << 1);
        m_lo ^= m_hi >> 3;

        m_lo ^= m_lo >> 35;
        m_lo = m_lo.wrapping_mul(0x9FB2_1C65_1E98_DF25);
        m_lo ^= m_lo >> 28;
        return combine(m_lo, avalanche(m_hi));
    }

    if len > 0 {
        let c1 = data[0] as u32;
        let c2 = data[len >> 1] as u32;
        let c3 = data[len - 1] as u32;
        let combined_lo = (c1 << 16) | (c2 << 24) | c3 | ((len as u32) << 8);
        let combined_hi = combined_lo.swap_bytes().rotate_left(13);
        let bitflip_lo = ((read_u32_le(&K_SECRET, 0) ^ read_u32_le(&K_SECRET, 4)) as u64).wrapping_add(seed);
        let bitflip_hi = ((read_u32_le(&K_SECRET, 8) ^ read_u32_le(&K_SECRET, 12)) as u64).wrapping_sub(seed);
        return combine(
            xxh64_avalanche(combined_lo as u64 ^ bitflip_lo),
            xxh64_avalanche(combined_hi as u64 ^ bitflip_hi),
        );
    }

    combine(
        xxh64_avalanche(seed ^ read_u64_le(&K_SECRET, 64) ^ read_u64_le(&K_SECRET, 72)),
        xxh64_avalanche(seed ^ read_u64_le(&K_SECRET, 80) ^ read_u64_le(&K_SECRET, 88)),
    )
}

#[inline(always)]
fn mid_finalize(acc0: u64, acc1: u64, len: usize, seed: u64) -> u128 {
    let low = avalanche(acc0.wrapping_add(acc1));
    let high = avalanche(
        acc0.wrapping_mul(PRIME64_1)
            .wrapping_add(acc1.wrapping_mul(PRIME64_4))
            .wrapping_add((len as u64).wrapping_sub(seed).wrapping_mul(PRIME64_2)),
    )
    .wrapping_neg();
    combine(low, high)
}

fn len_17_to_128(data: &[u8], seed: u64) -> u128 {
    let len = data.len();
    let mut acc0 = (len as u64).wrapping_mul(PRIME64_1);
    let mut acc1 = 0u64;

    // Rounds run from the innermost pair outwards: 48/len-64, 32/len-48, 16/len-32, 0/len-16.
    let rounds = (len - 1) / 32;
    for round in (0..=rounds).rev() {
        let head = 16 * round;
        let tail = len - 16 * (round + 1);
        let in0 = read_u64_le(data, head);
        let in1 = read_u64_le(data, head + 8);
        let in2 = read_u64_le(data, tail);
        let in3 = read_u64_le(data, tail + 8);
        acc0 = mix32(seed, 32 * round, acc0, in0, in1, in2, in3);
        acc1 = mix32(seed, 32 * round + 16, acc1, in2, in3, in0, in1);
    }

    mid_finalize(acc0, acc1, len, seed)
}

fn len_129_to_240(data: &[u8], seed: u64) -> u128 {
    let len = data.len();
    let rounds = len / 32;
    let mut acc0 = (len as u64).wrapping_mul(PRIME64_1);
    let mut acc1 = 0u64;

    let read_round = |round: usize, secret_off: usize, seed: u64, acc0: &mut u64, acc1: &mut u64| {
        let in0 = read_u64_le(data, 32 * round);
        let in1 = read_u64_le(data, 32 * round + 8);
        let in2 = read_u64_le(data, 32 * round + 16);
        let in3 = read_u64_le(data, 32 * round + 24);
        *acc0 = mix32(seed, secret_off, *acc0, in0, in1, in2, in3);
        *acc1 = mix32(seed, secret_off + 16, *acc1, in2, in3, in0, in1);
    };

    for round in 0..4 {
        read_round(round, 32 * round, seed, &mut acc0, &mut acc1);
    }
    acc0 = avalanche(acc0);
    acc1 = avalanche(acc1);

    for round in 4..rounds {
        read_round(round, 3 + 32 * (round - 4), seed, &mut acc0, &mut acc1);
    }

    let in0 = read_u64_le(data, len - 16);
    let in1 = read_u64_le(data, len - 8);
    let in2 = read_u64_le(data, len - 32);
    let in3 = read_u64_le(data, len - 24);
    let last_off = 136 - 17 - 16;
    let neg_seed = seed.wrapping_neg();
    acc0 = mix32(neg_seed, last_off, acc0, in0, in1, in2, in3);
    acc1 = mix32(neg_seed, last_off + 16, acc1, in2, in3, in0, in1);

    mid_finalize(acc0, acc1, len, seed)
}

fn short_hash(data: &[u8], seed: u64) -> u128 {
    match data.len() {
        0..=16 => len_0_to_16(data, seed),
        17..=128 => len_17_to_128(data, seed),
        _ => len_129_to_240(data, seed),
    }
}

fn custom_secret(seed: u64) -> [u8; SECRET_LEN] {
    if seed == 0 {
        return K_SECRET;
    }
    let mut secret = [0u8; SECRET_LEN];
    for round in 0..SECRET_LEN / 16 {
        let lo = read_u64_le(&K_SECRET, 16 * round).wrapping_add(seed);
        let hi = read_u64_le(&K_SECRET, 16 * round + 8).wrapping_sub(seed);
        secret[16 * round..16 * round + 8].copy_from_slice(&lo.to_le_bytes());
        secret[16 * round + 8..16 * round + 16].copy_from_slice(&hi.to_le_bytes());
    }
    secret
}

/// Streaming XXH3 128-bit state
#[derive(Clone)]
pub struct XxHash3 {
    seed: u64,
    secret: [u8; SECRET_LEN],
    acc: [u64; 8],
    stripes_in_block: usize,
    buffer: [u8; BUFFER_LEN],
    buffered: usize,
    last_stripe: [u8; STRIPE_LEN],
    total_len: u64,
}

impl std::fmt::Debug for XxHash3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XxHash3")
            .field("seed", &self.seed)
            .field("total_len", &self.total_len)
            .finish_non_exhaustive()
    }
}

impl XxHash3 {
    /// Create a hasher for the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            secret: custom_secret(seed),
            acc: INITIAL_ACC,
            stripes_in_block: 0,
            buffer: [0; BUFFER_LEN],
            buffered: 0,
            last_stripe: [0; STRIPE_LEN],
            total_len: 0,
        }
    }

    /// Seed this hasher was created with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn consume_stripes(
        acc: &mut [u64; 8],
        stripes_in_block: &mut usize,
        secret: &[u8],
        data: &[u8],
        count: usize,
    ) {
        for stripe in data.chunks_exact(STRIPE_LEN).take(count) {
            accumulate_stripe(acc, stripe, secret, *stripes_in_block * SECRET_CONSUME_RATE);
            *stripes_in_block += 1;
            if *stripes_in_block == STRIPES_PER_BLOCK {
                scramble(acc, secret);
                *stripes_in_block = 0;
            }
        }
    }

    /// Feed more input
    pub fn update(&mut self, mut data: &[u8]) {
        self.total_len += data.len() as u64;

        if self.buffered + data.len() <= BUFFER_LEN {
            self.buffer[self.buffered..self.buffered + data.len()].copy_from_slice(data);
            self.buffered += data.len();
            return;
        }

        if self.buffered > 0 {
            let fill = BUFFER_LEN - self.buffered;
            self.buffer[self.buffered..].copy_from_slice(&data[..fill]);
            data = &data[fill..];
            Self::consume_stripes(
                &mut self.acc,
                &mut self.stripes_in_block,
                &self.secret,
                &self.buffer,
                BUFFER_STRIPES,
            );
            self.last_stripe.copy_from_slice(&self.buffer[BUFFER_LEN - STRIPE_LEN..]);
            self.buffered = 0;
        }

        // Keep at least one byte back so the buffer is never empty at digest time.
        while data.len() > BUFFER_LEN {
            Self::consume_stripes(
                &mut self.acc,
                &mut self.stripes_in_block,
                &self.secret,
                &data[..BUFFER_LEN],
                BUFFER_STRIPES,
            );
            self.last_stripe.copy_from_slice(&data[BUFFER_LEN - STRIPE_LEN..BUFFER_LEN]);
            data = &data[BUFFER_LEN..];
        }

        self.buffer[..data.len()].copy_from_slice(data);
        self.buffered = data.len();
    }

    /// Compute the 128-bit hash of everything fed so far. The state is left intact.
    pub fn digest128(&self) -> u128 {
        if self.total_len <= MID_SIZE_MAX as u64 {
            return short_hash(&self.buffer[..self.buffered], self.seed);
        }

        let mut acc = self.acc;
        let mut stripes_in_block = self.stripes_in_block;
        let pending = &self.buffer[..self.buffered];
        Self::consume_stripes(
            &mut acc,
            &mut stripes_in_block,
            &self.secret,
            pending,
            (self.buffered - 1) / STRIPE_LEN,
        );

        let mut tail = [0u8; STRIPE_LEN];
        if self.buffered >= STRIPE_LEN {
            tail.copy_from_slice(&pending[self.buffered - STRIPE_LEN..]);
        } else {
            let carried = STRIPE_LEN - self.buffered;
            tail[..carried].copy_from_slice(&self.last_stripe[self.buffered..]);
            tail[carried..].copy_from_slice(pending);
        }
        accumulate_stripe(
            &mut acc,
            &tail,
            &self.secret,
            SECRET_LEN - STRIPE_LEN - SECRET_LAST_ACC_START,
        );

        let len = self.total_len;
        let merge = |start: u64, offset: usize| {
            let mut result = start;
            for pair in 0..4 {
                result = result.wrapping_add(mix_two_accs(
                    acc[2 * pair],
                    acc[2 * pair + 1],
                    &self.secret,
                    offset + 16 * pair,
                ));
            }
            avalanche(result)
        };
        let low = merge(len.wrapping_mul(PRIME64_1), SECRET_MERGE_ACCS_START);
        let high = merge(
            !len.wrapping_mul(PRIME64_2),
            SECRET_LEN - STRIPE_LEN - SECRET_MERGE_ACCS_START,
        );
        combine(low, high)
    }

    /// Return to the freshly seeded state, keeping the derived secret
    pub fn reset(&mut self) {
        self.acc = INITIAL_ACC;
        self.stripes_in_block = 0;
        self.buffered = 0;
        self.total_len = 0;
    }

    /// Hash a whole buffer in one call
    pub fn oneshot(seed: u64, data: &[u8]) -> u128 {
        let mut hasher = Self::new(seed);
        hasher.update(data);
        hasher.digest128()
    }
}

impl Default for XxHash3 {
    fn default() -> Self {
        Self::new(0)
    }
}
