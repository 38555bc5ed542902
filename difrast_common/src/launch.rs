// Copyright 2025 the Difrast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Block and grid sizing for kernels covering a 2D (optionally layered) work area.

use bytemuck::{Pod, Zeroable};

use crate::error::{LaunchError, Result};

/// Maximum number of threads in one block.
pub const MAX_THREADS_PER_BLOCK: u32 = 1024;

/// Maximum number of blocks along each grid axis.
pub const MAX_GRID_DIM: [u32; 3] = [i32::MAX as u32, 65_535, 65_535];

/// A three-dimensional extent, used both for block sizes and for grid sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Zeroable, Pod)]
#[repr(C)]
pub struct Dim3 {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Dim3 {
    pub const ONE: Self = Self::new(1, 1, 1);

    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Number of elements covered by this extent.
    pub const fn volume(self) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64
    }

    pub fn is_empty(self) -> bool {
        self.x == 0 || self.y == 0 || self.z == 0
    }

    pub fn to_array(self) -> [u32; 3] {
        [self.x, self.y, self.z]
    }
}

impl Default for Dim3 {
    fn default() -> Self {
        Self::ONE
    }
}

impl From<(u32, u32, u32)> for Dim3 {
    fn from((x, y, z): (u32, u32, u32)) -> Self {
        Self::new(x, y, z)
    }
}

/// Width of the lock-step execution group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WarpSize {
    #[default]
    W32,
    W64,
}

impl WarpSize {
    /// Number of lanes in one warp.
    pub const fn lanes(self) -> u32 {
        match self {
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }

    /// Mask with one bit set per lane of the warp.
    pub const fn full_mask(self) -> u64 {
        match self {
            Self::W32 => 0xFFFF_FFFF,
            Self::W64 => u64::MAX,
        }
    }
}

impl TryFrom<u32> for WarpSize {
    type Error = LaunchError;

    fn try_from(lanes: u32) -> Result<Self> {
        match lanes {
            32 => Ok(Self::W32),
            64 => Ok(Self::W64),
            other => Err(LaunchError::UnsupportedWarpWidth(other)),
        }
    }
}

/// Chooses a block size for a `width` x `height` work area.
///
/// The result starts at `max_width` x `max_height` and is reshaped for buffers narrower or
/// shorter than that: a narrow buffer gets the smallest power-of-two divisor of `max_width`
/// that still covers its width, with the height grown to keep the thread count; a short
/// buffer trades height for width until the block fits vertically.
pub fn launch_block_size(max_width: u32, max_height: u32, width: u32, height: u32) -> Dim3 {
    let max_threads = max_width.saturating_mul(max_height);
    if max_threads <= 1 || width.saturating_mul(height) <= 1 {
        // Degenerate.
        return Dim3::ONE;
    }

    let mut bw = max_width;
    let mut bh = max_height;

    if width < bw {
        while (bw >> 1) >= width {
            bw >>= 1;
        }
        bh = (max_threads / bw).min(height);
    } else if height < bh {
        while bh > height {
            bh >>= 1;
            if bw < width {
                bw <<= 1;
            }
        }
    }

    Dim3::new(bw, bh, 1)
}

/// Number of blocks of size `block` needed to cover `width` x `height` x `depth` items.
pub fn launch_grid_size(block: Dim3, width: u32, height: u32, depth: u32) -> Dim3 {
    Dim3::new(
        width.div_ceil(block.x),
        height.div_ceil(block.y),
        depth.div_ceil(block.z),
    )
}

/// Grid, block and warp layout of one kernel launch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Number of blocks along each axis.
    pub grid: Dim3,
    /// Number of threads along each axis of a block.
    pub block: Dim3,
    /// Warp width of the target.
    pub warp_size: WarpSize,
}

impl LaunchConfig {
    /// Validates a launch against the hardware limits.
    pub fn new(grid: Dim3, block: Dim3, warp_size: WarpSize) -> Result<Self> {
        for dim in [grid, block] {
            if dim.is_empty() {
                return Err(LaunchError::EmptyDimension(dim.x, dim.y, dim.z));
            }
        }
        let threads = block.volume();
        if threads > MAX_THREADS_PER_BLOCK as u64 {
            return Err(LaunchError::BlockTooLarge {
                threads: threads.min(u32::MAX as u64) as u32,
                max: MAX_THREADS_PER_BLOCK,
            });
        }
        for ((axis, count), max) in ['x', 'y', 'z']
            .into_iter()
            .zip(grid.to_array())
            .zip(MAX_GRID_DIM)
        {
            if count > max {
                return Err(LaunchError::GridTooLarge { axis, count, max });
            }
        }
        Ok(Self {
            grid,
            block,
            warp_size,
        })
    }

    /// Sizes a launch covering a `width` x `height` x `depth` work area, with blocks of at
    /// most `max_width` x `max_height` threads.
    pub fn for_area(
        max_width: u32,
        max_height: u32,
        width: u32,
        height: u32,
        depth: u32,
    ) -> Result<Self> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(LaunchError::EmptyDimension(width, height, depth));
        }
        let block = launch_block_size(max_width, max_height, width, height);
        let grid = launch_grid_size(block, width, height, depth);
        let config = Self::new(grid, block, WarpSize::default()).inspect_err(|err| {
            log::warn!("Rejected launch for {width}x{height}x{depth} work area: {err}");
        })?;
        log::debug!(
            "Launch for {width}x{height}x{depth}: block {}x{}x{}, grid {}x{}x{}",
            block.x,
            block.y,
            block.z,
            grid.x,
            grid.y,
            grid.z
        );
        Ok(config)
    }

    /// Returns the same launch for a different warp width.
    pub fn with_warp_size(self, warp_size: WarpSize) -> Self {
        Self { warp_size, ..self }
    }

    /// Number of threads in one block.
    pub fn threads_per_block(&self) -> u32 {
        // Bounded by `MAX_THREADS_PER_BLOCK` in `new`.
        self.block.volume() as u32
    }

    /// Number of warps in one block; the last one may be partially populated.
    pub fn warps_per_block(&self) -> u32 {
        self.threads_per_block().div_ceil(self.warp_size.lanes())
    }

    /// Total number of blocks in the grid.
    pub fn block_count(&self) -> u64 {
        self.grid.volume()
    }
}
