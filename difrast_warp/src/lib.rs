// Copyright 2025 the Difrast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Warp-level primitives of the difrast gradient kernels, running on a CPU model of a GPU.
//!
//! Backward passes of a differentiable rasterizer scatter gradients with atomic adds, and
//! neighbouring lanes usually hit the same few addresses. The [`CoalescedAccumulator`]
//! partitions the lanes of a warp by a caller-supplied key, sums each partition in block
//! scratch, and lets a single lane per partition issue the global atomic.
//!
//! Kernels are plain closures run by [`launch`]. Every simulated thread gets a
//! [`LaneContext`] with its indices and the warp-synchronous instructions
//! ([`LaneContext::sync`], [`LaneContext::ballot_sync`], [`LaneContext::match_any_sync`]).
//! The [`ballot`] module emulates the vote instructions through shared memory for targets
//! that lack them.
//!
//! ```
//! use difrast_common::{Dim3, LaunchConfig, WarpSize};
//! use difrast_warp::{launch, atomic, CaScratch, CoalescedAccumulator, DefaultCoalescing};
//!
//! let config = LaunchConfig::new(Dim3::ONE, Dim3::new(64, 1, 1), WarpSize::W32).unwrap();
//! let grad = atomic::zeroed_buffer(4);
//! launch(&config, CaScratch::for_launch, |ctx, scratch| {
//!     let pixel = ctx.thread_rank() % 4;
//!     let mut ca = CoalescedAccumulator::<DefaultCoalescing>::new(ctx, scratch);
//!     ca.set_group(pixel);
//!     ca.add(&grad, pixel as usize, 1.0);
//! });
//! assert_eq!(atomic::snapshot(&grad), [16.0; 4]);
//! ```
//!
//! # Features
//!
//! - `multithreading` (enabled by default): run the blocks of a launch on the rayon pool.
//! - `native-match`: group lanes with the native match instruction by default.
//! - `no-coalesce`: issue one atomic per lane by default. Takes precedence over
//!   `native-match`.

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
    reason = "Lane, warp and thread indices are bounded by the launch limits."
)]

pub mod accumulate;
pub mod atomic;
pub mod ballot;
mod dispatch;
mod lane;
pub mod partition;
mod scratch;

pub use accumulate::{Coalesced, CoalescedAccumulator, Coalescing, DefaultCoalescing, Direct};
pub use atomic::AtomicF32;
pub use dispatch::launch;
pub use lane::{LaneContext, LaneMask};
pub use partition::{Group, GroupMatch, NativeMatch, SharedMemoryMatch};
pub use scratch::CaScratch;
