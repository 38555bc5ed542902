// Copyright 2025 the Difrast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Block-shared scratch memory used by the coalescing protocol.

use std::sync::atomic::AtomicU32;

use difrast_common::{LaunchConfig, WarpSize};

use crate::atomic::AtomicF32;

/// Shared memory of one block for coalesced atomics and ballot emulation.
///
/// Both arrays hold one row of `W` cells per warp. `temp` holds the partial sums, one slot
/// per possible leader lane; `sync` holds the per-lane values published to the other lanes
/// by the emulated vote instructions.
///
/// A block must get its own scratch, and a warp must not start a new accumulation before
/// all its lanes finished the previous one.
pub struct CaScratch {
    warp_size: WarpSize,
    temp: Vec<AtomicF32>,
    sync: Vec<AtomicU32>,
}

impl CaScratch {
    /// Allocates scratch for blocks of `threads_per_block` threads, rounded up to whole warps.
    pub fn new(threads_per_block: u32, warp_size: WarpSize) -> Self {
        let warps = threads_per_block.div_ceil(warp_size.lanes());
        let len = (warps * warp_size.lanes()) as usize;
        Self {
            warp_size,
            temp: (0..len).map(|_| AtomicF32::default()).collect(),
            sync: (0..len).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    /// Allocates scratch sized for one block of `config`.
    pub fn for_launch(config: &LaunchConfig) -> Self {
        Self::new(config.threads_per_block(), config.warp_size)
    }

    pub fn warp_size(&self) -> WarpSize {
        self.warp_size
    }

    /// Number of warp rows.
    pub fn warps(&self) -> u32 {
        (self.sync.len() / self.warp_size.lanes() as usize) as u32
    }

    /// Partial sum slots of all warps, `W` per warp.
    pub fn temp(&self) -> &[AtomicF32] {
        &self.temp
    }

    /// Vote cells of all warps, `W` per warp.
    pub fn sync(&self) -> &[AtomicU32] {
        &self.sync
    }

    /// Partial sum slot of leader lane `leader` in warp `warp`.
    pub fn slot(&self, warp: u32, leader: u32) -> &AtomicF32 {
        &self.temp[(warp * self.warp_size.lanes() + leader) as usize]
    }
}

impl core::fmt::Debug for CaScratch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CaScratch")
            .field("warp_size", &self.warp_size)
            .field("warps", &self.warps())
            .finish_non_exhaustive()
    }
}
