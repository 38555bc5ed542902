// Copyright 2025 the Difrast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coalesced atomic accumulation.
//!
//! Many lanes of a warp often add gradients into the same few addresses. Instead of one
//! contended atomic per lane, lanes sharing a key first sum into their group's slot in block
//! scratch with a cheap local atomic, then the group leader adds the slot into the target
//! with a single atomic.
//!
//! The way groups are formed is a [`Coalescing`] strategy picked at build time through
//! [`DefaultCoalescing`]; any strategy can also be named explicitly.

use core::marker::PhantomData;

use crate::atomic::AtomicF32;
use crate::lane::{LaneContext, LaneMask};
use crate::partition::{Group, GroupMatch};
use crate::scratch::CaScratch;

/// Bit position where the mip level is folded into texture keys.
pub const TEXTURE_LEVEL_SHIFT: u32 = 27;

/// How an accumulator forms groups.
pub trait Coalescing {
    /// Forms this lane's group, or `None` when every lane issues its own atomic.
    fn set_group<'s>(
        ctx: &LaneContext<'_>,
        scratch: &'s CaScratch,
        key: u32,
        mask: LaneMask,
    ) -> Option<Group<'s>>;
}

/// Group lanes by key using the matching strategy `M`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Coalesced<M>(PhantomData<M>);

impl<M: GroupMatch> Coalescing for Coalesced<M> {
    fn set_group<'s>(
        ctx: &LaneContext<'_>,
        scratch: &'s CaScratch,
        key: u32,
        mask: LaneMask,
    ) -> Option<Group<'s>> {
        Some(Group::new::<M>(ctx, scratch, key, mask))
    }
}

/// No grouping; every add goes straight to the target.
#[derive(Clone, Copy, Debug, Default)]
pub struct Direct;

impl Coalescing for Direct {
    fn set_group<'s>(
        _ctx: &LaneContext<'_>,
        _scratch: &'s CaScratch,
        _key: u32,
        _mask: LaneMask,
    ) -> Option<Group<'s>> {
        None
    }
}

/// Strategy selected by the `native-match` and `no-coalesce` features.
#[cfg(feature = "no-coalesce")]
pub type DefaultCoalescing = Direct;

/// Strategy selected by the `native-match` and `no-coalesce` features.
#[cfg(all(feature = "native-match", not(feature = "no-coalesce")))]
pub type DefaultCoalescing = Coalesced<crate::partition::NativeMatch>;

/// Strategy selected by the `native-match` and `no-coalesce` features.
#[cfg(not(any(feature = "native-match", feature = "no-coalesce")))]
pub type DefaultCoalescing = Coalesced<crate::partition::SharedMemoryMatch>;

/// Texture gradient key: `idx` with the mip level folded into the high bits.
///
/// Equal texel indices on different levels give different keys as long as `level < 32` and
/// `idx < 1 << 27`. Outside that domain keys of different texels can collide, and colliding
/// lanes would be summed into one texel; debug builds check it.
pub fn texture_key(level: u32, idx: u32) -> u32 {
    debug_assert!(
        level < 32 && idx < 1 << TEXTURE_LEVEL_SHIFT,
        "texel {idx} of level {level} does not fit a texture key"
    );
    idx ^ (level << TEXTURE_LEVEL_SHIFT)
}

/// Per-lane handle for coalesced adds.
///
/// Call [`set_group`](Self::set_group) or [`set_group_mask`](Self::set_group_mask) from
/// all lanes of the warp, then add. Adds before any group was set go straight to the target.
///
/// ```ignore
/// let mut ca = CoalescedAccumulator::<DefaultCoalescing>::new(ctx, scratch);
/// ca.set_group(pixel);
/// ca.add(&grad, pixel as usize, value);
/// ```
pub struct CoalescedAccumulator<'a, S: Coalescing = DefaultCoalescing> {
    ctx: &'a LaneContext<'a>,
    scratch: &'a CaScratch,
    group: Option<Group<'a>>,
    _strategy: PhantomData<S>,
}

impl<'a, S: Coalescing> CoalescedAccumulator<'a, S> {
    pub fn new(ctx: &'a LaneContext<'a>, scratch: &'a CaScratch) -> Self {
        Self {
            ctx,
            scratch,
            group: None,
            _strategy: PhantomData,
        }
    }

    /// Groups all executing lanes of the warp by `key`.
    pub fn set_group(&mut self, key: u32) {
        self.set_group_mask(key, LaneMask::full(self.ctx.warp_size()));
    }

    /// Groups the executing lanes of `mask` by `key`.
    ///
    /// Lanes outside `mask` must call this as well; they end up in a group of their own.
    pub fn set_group_mask(&mut self, key: u32, mask: LaneMask) {
        self.group = S::set_group(self.ctx, self.scratch, key, mask);
    }

    /// The current group, if the strategy forms groups.
    pub fn group(&self) -> Option<&Group<'a>> {
        self.group.as_ref()
    }

    /// Adds `value` to `target[index]`.
    ///
    /// Every lane of a group must pass the same `target` and `index`; the leader's are the
    /// ones used.
    pub fn add(&self, target: &[AtomicF32], index: usize, value: f32) {
        let Some(group) = &self.group else {
            target[index].fetch_add(value);
            return;
        };
        if group.is_leader() {
            group.slot().store(0.0);
        }
        // The simulated lanes do not run in lock-step, so the three phases are fenced.
        self.ctx.sync();
        group.slot().fetch_add(value);
        self.ctx.sync();
        if group.is_leader() {
            target[index].fetch_add(group.slot().load());
        }
    }

    /// Adds `x`, `y` and `w` to `target[base]`, `target[base + 1]` and `target[base + 3]`.
    pub fn add3_xyw(&self, target: &[AtomicF32], base: usize, x: f32, y: f32, w: f32) {
        self.add(target, base, x);
        self.add(target, base + 1, y);
        self.add(target, base + 3, w);
    }

    /// Adds `value` to texel `idx` of one mip level, grouping by texel and level.
    ///
    /// `target` is the gradient buffer of that level. This sets the group itself, so it
    /// must be called by all lanes of the warp. `level` and `idx` must lie in the domain of
    /// [`texture_key`].
    pub fn add_texture(&mut self, target: &[AtomicF32], level: u32, idx: u32, value: f32) {
        self.set_group(texture_key(level, idx));
        self.add(target, idx as usize, value);
    }
}

impl<S: Coalescing> core::fmt::Debug for CoalescedAccumulator<'_, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CoalescedAccumulator")
            .field("ctx", self.ctx)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}
