//! Bit-twiddling helpers shared by the migrators and word-based encodings.

use crate::{Error, Result};

/// Selects the bits of `value` chosen by `mask`, least significant first, and
/// packs them into the low bits of the result.
///
/// Non-contiguous masks are compacted: the selected groups are concatenated
/// in low-to-high order of the mask.
///
/// ```
/// use siq::extract_masked_bits;
///
/// assert_eq!(extract_masked_bits(0b1011_0110, 0b1111_0000), 0b1011);
/// assert_eq!(extract_masked_bits(0b1011_0110, 0b1000_0010), 0b11);
/// assert_eq!(extract_masked_bits(12345, u128::MAX), 12345);
/// assert_eq!(extract_masked_bits(12345, 0), 0);
/// ```
pub const fn extract_masked_bits(value: u128, mask: u128) -> u128 {
    if mask == u128::MAX {
        return value;
    }
    let mut out = 0;
    let mut width = 0;
    let mut rest = mask;
    while rest != 0 {
        let bit = rest.trailing_zeros();
        out |= ((value >> bit) & 1) << width;
        width += 1;
        rest &= rest - 1;
    }
    out
}

/// Population count with infinite two's-complement semantics.
///
/// A negative number has infinitely many leading ones, so for those the zero
/// bits are counted instead and the count is bit-complemented.
///
/// ```
/// use siq::count_set_bits;
///
/// assert_eq!(count_set_bits(0xfff), 12);
/// assert_eq!(count_set_bits(-1), !0);
/// assert_eq!(count_set_bits(-4096), !12);
/// ```
pub const fn count_set_bits(value: i128) -> i32 {
    if value < 0 {
        !count_set_bits(!value)
    } else {
        value.count_ones() as i32
    }
}

fn check_width(width: u32) -> Result<()> {
    if width == 0 || width > 32 {
        return Err(Error::InvalidChunkWidth(width));
    }
    Ok(())
}

/// Splits `bytes` into `width`-bit integers, most significant bit first.
///
/// The last chunk is padded with zero bits on the right.
///
/// # Errors
///
/// Returns [`Error::InvalidChunkWidth`] unless `1 <= width <= 32`.
pub fn split_into_chunks(bytes: &[u8], width: u32) -> Result<Vec<u32>> {
    check_width(width)?;
    let total = bytes.len() as u64 * 8;
    let mut chunks = Vec::with_capacity(total.div_ceil(u64::from(width)) as usize);
    let mask = (1_u64 << width) - 1;
    let mut acc = 0_u64;
    let mut bits = 0_u32;

    for &b in bytes {
        acc = (acc << 8) | u64::from(b);
        bits += 8;
        while bits >= width {
            bits -= width;
            chunks.push(((acc >> bits) & mask) as u32);
        }
        acc &= (1_u64 << bits) - 1;
    }
    if bits > 0 {
        chunks.push(((acc << (width - bits)) & mask) as u32);
    }
    Ok(chunks)
}

/// Joins `width`-bit integers back into bytes, most significant bit first.
///
/// Produces `ceil(chunks.len() * width / 8)` bytes; trailing bits of the
/// last byte are zero. Bits of a chunk above `width` are ignored.
///
/// # Errors
///
/// Returns [`Error::InvalidChunkWidth`] unless `1 <= width <= 32`.
pub fn join_chunks(chunks: &[u32], width: u32) -> Result<Vec<u8>> {
    check_width(width)?;
    let total = chunks.len() as u64 * u64::from(width);
    let mut bytes = Vec::with_capacity(total.div_ceil(8) as usize);
    let mask = (1_u64 << width) - 1;
    let mut acc = 0_u64;
    let mut bits = 0_u32;

    for &chunk in chunks {
        acc = (acc << width) | (u64::from(chunk) & mask);
        bits += width;
        while bits >= 8 {
            bits -= 8;
            bytes.push((acc >> bits) as u8);
        }
        acc &= (1_u64 << bits) - 1;
    }
    if bits > 0 {
        bytes.push((acc << (8 - bits)) as u8);
    }
    Ok(bytes)
}
