// Copyright 2025 the Difrast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vote instructions emulated through block-shared memory.
//!
//! For targets without native cross-lane votes. Every lane publishes its predicate into its
//! cell of the warp's row in `s_ballot`, the converged lanes meet at a barrier, and then each
//! lane reads the whole row. This costs `O(W)` per lane instead of one instruction.
//!
//! All lanes of the warp must call these from the same program point. `s_ballot` must hold
//! one row of `W` cells for every warp of the block, see [`CaScratch::sync`].
//!
//! [`CaScratch::sync`]: crate::CaScratch::sync

use std::sync::atomic::{AtomicU32, Ordering};

use crate::lane::{LaneContext, LaneMask};

/// The row of `s_ballot` that belongs to the calling lane's warp.
pub(crate) fn warp_row<'s>(ctx: &LaneContext<'_>, s_ballot: &'s [AtomicU32]) -> &'s [AtomicU32] {
    let w = ctx.warp_size().lanes() as usize;
    let start = ctx.warp() as usize * w;
    debug_assert!(
        s_ballot.len() >= start + w,
        "ballot scratch of {} cells is too small for warp {}",
        s_ballot.len(),
        ctx.warp()
    );
    &s_ballot[start..start + w]
}

/// Publishes `value` for this lane and returns the lanes of `mask` whose published value
/// satisfies `keep`.
///
/// Lanes of `mask` that are not executing are never reported.
pub(crate) fn poll(
    ctx: &LaneContext<'_>,
    s_ballot: &[AtomicU32],
    mask: LaneMask,
    value: u32,
    keep: impl Fn(u32) -> bool,
) -> LaneMask {
    let row = warp_row(ctx, s_ballot);
    row[ctx.lane() as usize].store(value, Ordering::Relaxed);
    ctx.sync();
    let mut result = LaneMask::EMPTY;
    for lane in (mask & ctx.active_mask()).iter() {
        if keep(row[lane as usize].load(Ordering::Relaxed)) {
            result |= LaneMask::single(lane);
        }
    }
    // Lanes run freely between barriers; keep the row until everyone has read it.
    ctx.sync();
    result
}

/// Lanes of `mask` whose `condition` holds, the emulation of `__ballot_sync`.
pub fn ballot_sync(
    ctx: &LaneContext<'_>,
    s_ballot: &[AtomicU32],
    mask: LaneMask,
    condition: bool,
) -> LaneMask {
    poll(ctx, s_ballot, mask, u32::from(condition), |v| v != 0)
}

/// Whether `condition` holds on every executing lane of `mask`, the emulation of
/// `__all_sync`.
pub fn all_sync(
    ctx: &LaneContext<'_>,
    s_ballot: &[AtomicU32],
    mask: LaneMask,
    condition: bool,
) -> bool {
    let voters = mask & ctx.active_mask();
    poll(ctx, s_ballot, mask, u32::from(condition), |v| v != 0) == voters
}
