// Copyright 2025 the Difrast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Triangle ID <-> `f32` conversion supporting very large triangle IDs.
//!
//! Rasterizer outputs store the triangle ID in a float channel next to numeric values such
//! as barycentrics and depth. IDs up to and including 16 777 216, and all negative
//! sentinels, are converted with a plain numeric cast and stay compatible with buffers
//! written by older versions. Larger IDs are offset into an exponent range above 2^24 and
//! stored by bit pattern, so they map to unique floats that are not equal to the ID.
//!
//! The largest ID that survives the round trip without producing an infinity or NaN is
//! [`TRIIDX_MAX`]. Past it, [`triidx_to_float`] returns `+inf` and then NaNs.

use crate::bits::{float_bits_to_int, int_bits_to_float};

/// Largest ID, inclusive, stored as a numerically equal float.
pub const TRIIDX_DIRECT_MAX: i32 = 0x0100_0000;

/// Offset added to the bit pattern of IDs above [`TRIIDX_DIRECT_MAX`].
pub const TRIIDX_BIAS: i32 = 0x4A80_0000;

/// Largest ID that converts to a finite float and back.
///
/// `TRIIDX_BIAS + TRIIDX_MAX` is the bit pattern of `f32::MAX`.
pub const TRIIDX_MAX: i32 = 889_192_447;

// Decode compares the float value, encode the integer. Both sides cut at 2^24.
const DIRECT_MAX_F32: f32 = 16_777_216.0;

const _: () = assert!(TRIIDX_BIAS + TRIIDX_MAX == 0x7F7F_FFFF);

/// Encodes a triangle ID into a float.
#[inline]
pub fn triidx_to_float(x: i32) -> f32 {
    if x <= TRIIDX_DIRECT_MAX {
        return x as f32;
    }
    int_bits_to_float(TRIIDX_BIAS.wrapping_add(x))
}

/// Decodes a float written by [`triidx_to_float`] back into a triangle ID.
#[inline]
pub fn float_to_triidx(x: f32) -> i32 {
    if x <= DIRECT_MAX_F32 {
        return x as i32;
    }
    float_bits_to_int(x).wrapping_sub(TRIIDX_BIAS)
}

/// Encodes a buffer of triangle IDs.
///
/// Only `min(ids.len(), out.len())` elements are written.
pub fn encode_slice(ids: &[i32], out: &mut [f32]) {
    for (o, &id) in out.iter_mut().zip(ids) {
        *o = triidx_to_float(id);
    }
}

/// Decodes a buffer of encoded triangle IDs.
///
/// Only `min(values.len(), out.len())` elements are written.
pub fn decode_slice(values: &[f32], out: &mut [i32]) {
    for (o, &v) in out.iter_mut().zip(values) {
        *o = float_to_triidx(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_range_is_numeric() {
        for i in [0, 1, 2, 1000, 65_535, 16_777_215, 16_777_216] {
            assert_eq!(triidx_to_float(i), i as f32);
            assert_eq!(float_to_triidx(triidx_to_float(i)), i);
        }
    }

    #[test]
    fn first_offset_id_lands_above_direct_range() {
        let f = triidx_to_float(TRIIDX_DIRECT_MAX + 1);
        assert_eq!(float_bits_to_int(f), 0x4B80_0001);
        assert!(f > DIRECT_MAX_F32);
        assert_eq!(float_to_triidx(f), TRIIDX_DIRECT_MAX + 1);
    }

    #[test]
    fn negative_sentinels_pass_through() {
        for i in [-1, -2, -16_777_216] {
            assert_eq!(triidx_to_float(i), i as f32);
            assert_eq!(float_to_triidx(triidx_to_float(i)), i);
        }
    }

    #[test]
    fn ceiling_and_one_past() {
        let f = triidx_to_float(TRIIDX_MAX);
        assert_eq!(f, f32::MAX);
        assert_eq!(float_to_triidx(f), TRIIDX_MAX);
        assert_eq!(triidx_to_float(TRIIDX_MAX + 1), f32::INFINITY);
        assert!(triidx_to_float(TRIIDX_MAX + 2).is_nan());
    }

    #[test]
    fn slices() {
        let ids = [-1, 0, 7, 16_777_217, TRIIDX_MAX];
        let mut encoded = [0.0; 5];
        encode_slice(&ids, &mut encoded);
        let mut decoded = [0; 5];
        decode_slice(&encoded, &mut decoded);
        assert_eq!(decoded, ids);
    }
}
