// Copyright 2025 the Difrast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// Errors that can occur when configuring a kernel launch.
///
/// The kernel primitives themselves never fail; precondition violations there are
/// undefined by contract.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum LaunchError {
    /// A block or work area with a zero dimension was requested.
    #[error("Launch dimensions must be non-zero, got {0}x{1}x{2}")]
    EmptyDimension(u32, u32, u32),
    /// The block holds more threads than the hardware allows.
    #[error("Block of {threads} threads exceeds the limit of {max} threads per block")]
    BlockTooLarge { threads: u32, max: u32 },
    /// One grid axis holds more blocks than the hardware allows.
    #[error("Grid axis {axis} has {count} blocks, limit is {max}")]
    GridTooLarge { axis: char, count: u32, max: u32 },
    /// Only 32 and 64 lane warps exist.
    #[error("Unsupported warp width {0}, expected 32 or 64")]
    UnsupportedWarpWidth(u32),
}

pub type Result<T, E = LaunchError> = std::result::Result<T, E>;
