//! Little-endian integer reads from byte slices

/// Read a `u32` stored little-endian at `offset`.
///
/// Panics if fewer than four bytes are available; callers index within
/// bounds they have already checked.
#[inline(always)]
pub fn read_u32_le(buf: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(word)
}

/// Read a `u64` stored little-endian at `offset`.
#[inline(always)]
pub fn read_u64_le(buf: &[u8], offset: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(word)
}
