// Copyright 2025 the Difrast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bit reinterpretation between `f32` and `i32`.
//!
//! These are the equivalents of the `__float_as_int` / `__int_as_float` device
//! intrinsics. No numeric conversion takes place: the 32 bits are carried over as-is.

static_assertions::assert_eq_size!(f32, i32);
static_assertions::assert_eq_align!(f32, i32);

/// Returns the bit pattern of `x` as a signed integer.
#[inline(always)]
pub fn float_bits_to_int(x: f32) -> i32 {
    bytemuck::cast(x)
}

/// Returns the float whose bit pattern is `x`.
#[inline(always)]
pub fn int_bits_to_float(x: i32) -> f32 {
    bytemuck::cast(x)
}
