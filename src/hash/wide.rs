//! 64x64 -> 128 bit multiplication helpers used by XXH3

/// Full 128-bit product of two `u64` values.
#[inline(always)]
pub fn mul128(lhs: u64, rhs: u64) -> u128 {
    (lhs as u128) * (rhs as u128)
}

/// Multiply and fold the 128-bit product by xoring its halves.
#[inline(always)]
pub fn mul_fold64(lhs: u64, rhs: u64) -> u64 {
    let product = mul128(lhs, rhs);
    (product as u64) ^ ((product >> 64) as u64)
}
