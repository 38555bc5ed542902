// Copyright 2025 the Difrast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leaf utilities shared by the difrast kernels.
//!
//! # Contents
//!
//! - [`bits`]: reinterpretation of 32-bit floats as integers and back.
//! - [`triidx`]: lossless packing of triangle indices into `f32` buffers that are shared
//!   with numeric rasterizer outputs.
//! - [`math`]: small componentwise vector types with the usual operators.
//! - [`launch`]: block and grid sizing for 2D work areas.
//!
//! Everything in this crate is pure and infallible, except for the validation performed by
//! [`launch::LaunchConfig::for_area`].

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![allow(
    clippy::cast_possible_truncation,
    reason = "Triangle indices and float values are converted with `as` on purpose, \
matching the saturating numeric casts of the device code."
)]

pub mod bits;
pub mod error;
pub mod launch;
pub mod math;
pub mod triidx;

pub use error::{LaunchError, Result};
pub use launch::{Dim3, LaunchConfig, WarpSize};
pub use triidx::{float_to_triidx, triidx_to_float};
