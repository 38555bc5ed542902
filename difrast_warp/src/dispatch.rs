// Copyright 2025 the Difrast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Kernel launches on simulated hardware.
//!
//! Each thread of a block runs on its own OS thread so that warp barriers behave like they
//! do on a GPU: a lane blocks until the rest of its warp arrives. Independent blocks run on
//! the rayon pool when the `multithreading` feature is enabled.

use difrast_common::{Dim3, LaunchConfig};

use crate::lane::{LaneContext, LaneMask, PoisonOnUnwind, WarpState};

/// Runs `kernel` once for every thread of the launch.
///
/// `make_shared` is called once per block and its result is the block's shared memory,
/// handed to every thread of that block. The call returns when all blocks have finished.
///
/// # Panics
///
/// If any thread of the kernel panics. A panicking lane poisons its warp, so the other
/// lanes of that warp panic at their next [`LaneContext::sync`] instead of waiting for it.
pub fn launch<S, M, K>(config: &LaunchConfig, make_shared: M, kernel: K)
where
    S: Sync,
    M: Fn(&LaunchConfig) -> S + Sync,
    K: Fn(&LaneContext<'_>, &S) + Sync,
{
    log::debug!(
        "Launching {} blocks of {} threads ({} warps of {} lanes)",
        config.block_count(),
        config.threads_per_block(),
        config.warps_per_block(),
        config.warp_size.lanes()
    );
    let blocks = config.block_count();

    #[cfg(feature = "multithreading")]
    {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
        (0..blocks).into_par_iter().for_each(|block| {
            run_block(config, unflatten(block, config.grid), &make_shared, &kernel);
        });
    }
    #[cfg(not(feature = "multithreading"))]
    for block in 0..blocks {
        run_block(config, unflatten(block, config.grid), &make_shared, &kernel);
    }
}

/// Splits a linear index into coordinates within `dim`, `x` varying fastest.
fn unflatten(index: u64, dim: Dim3) -> Dim3 {
    let (dx, dy) = (dim.x as u64, dim.y as u64);
    Dim3::new(
        (index % dx) as u32,
        ((index / dx) % dy) as u32,
        (index / (dx * dy)) as u32,
    )
}

fn run_block<S, M, K>(config: &LaunchConfig, block_idx: Dim3, make_shared: &M, kernel: &K)
where
    S: Sync,
    M: Fn(&LaunchConfig) -> S,
    K: Fn(&LaneContext<'_>, &S) + Sync,
{
    log::trace!("Block {block_idx:?} starting");
    let shared = make_shared(config);
    let threads = config.threads_per_block();
    let lanes = config.warp_size.lanes();
    let warps: Vec<WarpState> = (0..config.warps_per_block())
        .map(|warp| {
            let launched = (threads - warp * lanes).min(lanes);
            WarpState::new(config.warp_size, LaneMask::first(launched))
        })
        .collect();

    std::thread::scope(|s| {
        for rank in 0..threads {
            let ctx = LaneContext {
                thread_idx: unflatten(rank as u64, config.block),
                block_idx,
                block_dim: config.block,
                grid_dim: config.grid,
                warp_size: config.warp_size,
                lane: rank % lanes,
                warp: rank / lanes,
                state: &warps[(rank / lanes) as usize],
            };
            let shared = &shared;
            s.spawn(move || {
                let _poison = PoisonOnUnwind(ctx.state);
                kernel(&ctx, shared);
            });
        }
    });
    log::trace!("Block {block_idx:?} finished");
}
