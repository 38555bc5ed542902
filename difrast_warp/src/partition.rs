// Copyright 2025 the Difrast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Partitioning of a warp's lanes into groups sharing a key.
//!
//! Every lane supplies a key. Lanes of the mask with equal keys form a group, led by the
//! lowest lane of the group. The leader's lane index selects the group's partial sum slot in
//! the warp's row of [`CaScratch::temp`].

use crate::atomic::AtomicF32;
use crate::ballot;
use crate::lane::{LaneContext, LaneMask};
use crate::scratch::CaScratch;

/// A way of finding the lanes that share this lane's key.
pub trait GroupMatch {
    /// Lanes of `mask` whose key equals `key`.
    ///
    /// Must be called by every executing lane of the warp.
    fn match_any(ctx: &LaneContext<'_>, scratch: &CaScratch, mask: LaneMask, key: u32)
        -> LaneMask;
}

/// Key matching through the `sync` row of the block scratch.
///
/// Every lane compares its key with the key of every other lane. This is the reference
/// algorithm; it works on any target.
#[derive(Clone, Copy, Debug, Default)]
pub struct SharedMemoryMatch;

impl GroupMatch for SharedMemoryMatch {
    fn match_any(
        ctx: &LaneContext<'_>,
        scratch: &CaScratch,
        mask: LaneMask,
        key: u32,
    ) -> LaneMask {
        ballot::poll(ctx, scratch.sync(), mask, key, |other| other == key)
    }
}

/// Key matching with the native `match_any_sync` instruction.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeMatch;

impl GroupMatch for NativeMatch {
    fn match_any(
        ctx: &LaneContext<'_>,
        _scratch: &CaScratch,
        mask: LaneMask,
        key: u32,
    ) -> LaneMask {
        ctx.match_any_sync(mask, key)
    }
}

/// This lane's view of its group after partitioning.
#[derive(Clone, Copy, Debug)]
pub struct Group<'s> {
    members: LaneMask,
    leader: u32,
    is_leader: bool,
    slot: &'s AtomicF32,
}

impl<'s> Group<'s> {
    /// Partitions the executing lanes of `mask` by `key` using `M`.
    ///
    /// A lane outside `mask` still has to call this, and ends up alone in its group.
    pub fn new<M: GroupMatch>(
        ctx: &LaneContext<'_>,
        scratch: &'s CaScratch,
        key: u32,
        mask: LaneMask,
    ) -> Self {
        debug_assert_eq!(
            scratch.warp_size(),
            ctx.warp_size(),
            "scratch was allocated for a different warp width"
        );
        debug_assert!(
            ctx.warp() < scratch.warps(),
            "scratch holds {} warps, lane belongs to warp {}",
            scratch.warps(),
            ctx.warp()
        );
        let lane = ctx.lane();
        let mut members = M::match_any(ctx, scratch, mask, key);
        if !members.contains(lane) {
            members = LaneMask::single(lane);
        }
        // `members` contains this lane, so it is never empty.
        let leader = members.lowest().unwrap_or(lane);
        Self {
            members,
            leader,
            is_leader: leader == lane,
            slot: scratch.slot(ctx.warp(), leader),
        }
    }

    /// Lanes sharing this lane's key.
    pub fn members(&self) -> LaneMask {
        self.members
    }

    /// Lowest lane of the group.
    pub fn leader(&self) -> u32 {
        self.leader
    }

    pub fn is_leader(&self) -> bool {
        self.is_leader
    }

    /// The group's partial sum slot.
    pub fn slot(&self) -> &'s AtomicF32 {
        self.slot
    }
}
