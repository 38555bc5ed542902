// Copyright 2025 the Difrast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lanes, lane masks and the per-lane execution context.

use core::fmt;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};

use difrast_common::{Dim3, WarpSize};

/// A set of lanes within one warp, bit `i` standing for lane `i`.
///
/// Bits at or above the warp width are always clear.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LaneMask(pub u64);

impl LaneMask {
    pub const EMPTY: Self = Self(0);

    /// Every lane of a warp.
    pub const fn full(warp_size: WarpSize) -> Self {
        Self(warp_size.full_mask())
    }

    /// The lowest `n` lanes.
    pub const fn first(n: u32) -> Self {
        if n >= 64 {
            Self(u64::MAX)
        } else {
            Self((1 << n) - 1)
        }
    }

    pub const fn single(lane: u32) -> Self {
        Self(1 << lane)
    }

    pub const fn contains(self, lane: u32) -> bool {
        lane < 64 && (self.0 >> lane) & 1 == 1
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of lanes in the set.
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Index of the lowest lane in the set, the equivalent of `ffs(mask) - 1`.
    pub const fn lowest(self) -> Option<u32> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros())
        }
    }

    /// Lane indices in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u32> {
        let mut bits = self.0;
        core::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let lane = bits.trailing_zeros();
            bits &= bits - 1;
            Some(lane)
        })
    }
}

impl FromIterator<u32> for LaneMask {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::EMPTY, |mask, lane| mask | Self::single(lane))
    }
}

impl BitAnd for LaneMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for LaneMask {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl BitOr for LaneMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for LaneMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for LaneMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LaneMask({:#018x})", self.0)
    }
}

/// A barrier for the lanes of one warp that can be poisoned.
///
/// Once poisoned, every lane waiting in it or arriving later panics instead of blocking.
/// A lane that unwinds poisons its warp, so the remaining lanes never wait for it.
struct WarpBarrier {
    lanes: usize,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

#[derive(Default)]
struct BarrierState {
    arrived: usize,
    generation: u64,
    poisoned: bool,
}

impl WarpBarrier {
    fn new(lanes: usize) -> Self {
        Self {
            lanes,
            state: Mutex::new(BarrierState::default()),
            cvar: Condvar::new(),
        }
    }

    fn wait(&self) {
        // A lane that panicked holding the lock leaves consistent state behind.
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.poisoned {
            let generation = state.generation;
            state.arrived += 1;
            if state.arrived == self.lanes {
                state.arrived = 0;
                state.generation = generation.wrapping_add(1);
                self.cvar.notify_all();
                return;
            }
            state = self
                .cvar
                .wait_while(state, |s| s.generation == generation && !s.poisoned)
                .unwrap_or_else(PoisonError::into_inner);
            if !state.poisoned {
                return;
            }
        }
        drop(state);
        panic!("warp barrier poisoned: another lane of this warp panicked");
    }

    fn poison(&self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .poisoned = true;
        self.cvar.notify_all();
    }
}

/// State the simulated hardware keeps per warp.
///
/// The barrier joins the lanes that were launched in this warp, which is the converged
/// thread set every warp-synchronous primitive is called from. The vote row stands in for
/// the cross-lane network used by the native vote and match instructions.
pub(crate) struct WarpState {
    active: LaneMask,
    barrier: WarpBarrier,
    vote: Vec<AtomicU32>,
}

impl WarpState {
    pub(crate) fn new(warp_size: WarpSize, active: LaneMask) -> Self {
        Self {
            active,
            barrier: WarpBarrier::new(active.count() as usize),
            vote: (0..warp_size.lanes()).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    /// Releases the other lanes of the warp from current and future waits.
    pub(crate) fn poison(&self) {
        self.barrier.poison();
    }
}

/// Poisons a warp if the lane holding it unwinds.
pub(crate) struct PoisonOnUnwind<'w>(pub(crate) &'w WarpState);

impl Drop for PoisonOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.poison();
        }
    }
}

/// Everything one simulated lane knows about where it runs.
pub struct LaneContext<'w> {
    pub(crate) thread_idx: Dim3,
    pub(crate) block_idx: Dim3,
    pub(crate) block_dim: Dim3,
    pub(crate) grid_dim: Dim3,
    pub(crate) warp_size: WarpSize,
    pub(crate) lane: u32,
    pub(crate) warp: u32,
    pub(crate) state: &'w WarpState,
}

impl LaneContext<'_> {
    pub fn thread_idx(&self) -> Dim3 {
        self.thread_idx
    }

    pub fn block_idx(&self) -> Dim3 {
        self.block_idx
    }

    pub fn block_dim(&self) -> Dim3 {
        self.block_dim
    }

    pub fn grid_dim(&self) -> Dim3 {
        self.grid_dim
    }

    pub fn warp_size(&self) -> WarpSize {
        self.warp_size
    }

    /// Index of this lane within its warp.
    pub fn lane(&self) -> u32 {
        self.lane
    }

    /// Index of this lane's warp within the block.
    pub fn warp(&self) -> u32 {
        self.warp
    }

    /// Linear index of this thread within the block.
    pub fn thread_rank(&self) -> u32 {
        self.warp * self.warp_size.lanes() + self.lane
    }

    /// Lanes of this warp that are executing.
    pub fn active_mask(&self) -> LaneMask {
        self.state.active
    }

    /// Waits until every active lane of the warp has arrived.
    ///
    /// Every active lane must reach the same sequence of calls; a lane skipping one leaves
    /// the others blocked forever. If another lane of the warp panicked, this panics too.
    pub fn sync(&self) {
        self.state.barrier.wait();
    }

    /// Native vote: lanes of `mask` whose `key` equals this lane's key.
    pub fn match_any_sync(&self, mask: LaneMask, key: u32) -> LaneMask {
        self.exchange(key, |other| other == key, mask)
    }

    /// Native vote: lanes of `mask` whose predicate holds.
    pub fn ballot_sync(&self, mask: LaneMask, predicate: bool) -> LaneMask {
        self.exchange(u32::from(predicate), |other| other != 0, mask)
    }

    /// Native vote: whether the predicate holds on every lane of `mask`.
    pub fn all_sync(&self, mask: LaneMask, predicate: bool) -> bool {
        let voters = mask & self.active_mask();
        self.ballot_sync(mask, predicate) == voters
    }

    fn exchange(&self, value: u32, keep: impl Fn(u32) -> bool, mask: LaneMask) -> LaneMask {
        self.state.vote[self.lane as usize].store(value, Ordering::Relaxed);
        self.sync();
        let result = (mask & self.active_mask())
            .iter()
            .filter(|&lane| keep(self.state.vote[lane as usize].load(Ordering::Relaxed)))
            .collect();
        // The vote row is reused by the next call.
        self.sync();
        result
    }
}

impl fmt::Debug for LaneContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaneContext")
            .field("block_idx", &self.block_idx)
            .field("thread_idx", &self.thread_idx)
            .field("warp", &self.warp)
            .field("lane", &self.lane)
            .field("active", &self.state.active)
            .finish_non_exhaustive()
    }
}
