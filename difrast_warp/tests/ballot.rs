// Copyright 2025 the Difrast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shared-memory vote emulation against the native instructions and a host-side model.

use std::sync::atomic::{AtomicU64, Ordering};

use difrast_common::{Dim3, LaunchConfig, WarpSize};
use difrast_warp::{ballot, launch, CaScratch, LaneMask};
use rand::prelude::StdRng;
use rand::{Rng, SeedableRng};

struct Votes {
    predicates: Vec<bool>,
    /// One mask per warp.
    masks: Vec<u64>,
}

impl Votes {
    fn random(rng: &mut StdRng, threads: u32, warp_size: WarpSize) -> Self {
        let warps = threads.div_ceil(warp_size.lanes());
        // Bias towards mostly-true predicates so `all` is sometimes satisfied.
        let p_true = rng.gen_range(0.5..1.0);
        Self {
            predicates: (0..threads).map(|_| rng.gen_bool(p_true)).collect(),
            masks: (0..warps)
                .map(|w| match w % 3 {
                    0 => warp_size.full_mask(),
                    _ => rng.gen::<u64>() & warp_size.full_mask(),
                })
                .collect(),
        }
    }

    /// Host-side ballot of `warp`, given the lanes launched in it.
    fn expected(&self, warp: u32, warp_size: WarpSize, threads: u32) -> u64 {
        let w = warp_size.lanes();
        (0..w)
            .filter(|&lane| {
                let rank = warp * w + lane;
                rank < threads
                    && self.masks[warp as usize] >> lane & 1 == 1
                    && self.predicates[rank as usize]
            })
            .fold(0, |m, lane| m | 1 << lane)
    }

    fn voters(&self, warp: u32, warp_size: WarpSize, threads: u32) -> u64 {
        let launched = (threads - warp * warp_size.lanes()).min(warp_size.lanes());
        self.masks[warp as usize] & LaneMask::first(launched).0
    }
}

struct Outcome {
    emulated: Vec<AtomicU64>,
    native: Vec<AtomicU64>,
    emulated_all: Vec<AtomicU64>,
    native_all: Vec<AtomicU64>,
}

fn run(config: &LaunchConfig, votes: &Votes) -> Outcome {
    let threads = config.threads_per_block() as usize;
    let cells = || (0..threads).map(|_| AtomicU64::new(u64::MAX)).collect::<Vec<_>>();
    let out = Outcome {
        emulated: cells(),
        native: cells(),
        emulated_all: cells(),
        native_all: cells(),
    };
    launch(config, CaScratch::for_launch, |ctx, scratch| {
        let rank = ctx.thread_rank() as usize;
        let mask = LaneMask(votes.masks[ctx.warp() as usize]);
        let pred = votes.predicates[rank];

        let emulated = ballot::ballot_sync(ctx, scratch.sync(), mask, pred);
        let native = ctx.ballot_sync(mask, pred);
        let emulated_all = ballot::all_sync(ctx, scratch.sync(), mask, pred);
        let native_all = ctx.all_sync(mask, pred);

        out.emulated[rank].store(emulated.0, Ordering::Relaxed);
        out.native[rank].store(native.0, Ordering::Relaxed);
        out.emulated_all[rank].store(u64::from(emulated_all), Ordering::Relaxed);
        out.native_all[rank].store(u64::from(native_all), Ordering::Relaxed);
    });
    out
}

fn check(config: &LaunchConfig, votes: &Votes) {
    let out = run(config, votes);
    let warp_size = config.warp_size;
    let threads = config.threads_per_block();
    for rank in 0..threads {
        let warp = rank / warp_size.lanes();
        let expected = votes.expected(warp, warp_size, threads);
        let all = expected == votes.voters(warp, warp_size, threads);
        let r = rank as usize;
        assert_eq!(
            out.emulated[r].load(Ordering::Relaxed),
            expected,
            "emulated ballot, thread {rank}"
        );
        assert_eq!(
            out.native[r].load(Ordering::Relaxed),
            expected,
            "native ballot, thread {rank}"
        );
        assert_eq!(
            out.emulated_all[r].load(Ordering::Relaxed),
            u64::from(all),
            "emulated all, thread {rank}"
        );
        assert_eq!(
            out.native_all[r].load(Ordering::Relaxed),
            u64::from(all),
            "native all, thread {rank}"
        );
    }
}

#[test]
fn ballot_matches_model_on_full_warps() {
    let mut rng = StdRng::seed_from_u64(0x0ba1_107);
    for warp_size in [WarpSize::W32, WarpSize::W64] {
        let config = LaunchConfig::new(Dim3::ONE, Dim3::new(16, 8, 1), warp_size).unwrap();
        for _ in 0..8 {
            let votes = Votes::random(&mut rng, config.threads_per_block(), warp_size);
            check(&config, &votes);
        }
    }
}

#[test]
fn ballot_ignores_lanes_that_were_not_launched() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    // 40 threads: the second W32 warp has 8 lanes, the only W64 warp has 40.
    for warp_size in [WarpSize::W32, WarpSize::W64] {
        let config = LaunchConfig::new(Dim3::ONE, Dim3::new(8, 5, 1), warp_size).unwrap();
        for _ in 0..8 {
            let mut votes = Votes::random(&mut rng, config.threads_per_block(), warp_size);
            // Full masks also name the lanes that do not exist.
            votes.masks.fill(warp_size.full_mask());
            check(&config, &votes);
        }
    }
}

#[test]
fn all_holds_for_uniform_predicates() {
    let config = LaunchConfig::new(Dim3::ONE, Dim3::new(64, 1, 1), WarpSize::W32).unwrap();
    let votes = Votes {
        predicates: vec![true; 64],
        masks: vec![0xFFFF_FFFF, 0x0000_F0F0],
    };
    let out = run(&config, &votes);
    for cell in &out.emulated_all {
        assert_eq!(cell.load(Ordering::Relaxed), 1);
    }
    assert_eq!(out.emulated[40].load(Ordering::Relaxed), 0x0000_F0F0);
}

#[test]
fn empty_mask_votes_nothing() {
    let config = LaunchConfig::new(Dim3::ONE, Dim3::new(32, 1, 1), WarpSize::W32).unwrap();
    let votes = Votes {
        predicates: vec![false; 32],
        masks: vec![0],
    };
    let out = run(&config, &votes);
    for rank in 0..32 {
        assert_eq!(out.emulated[rank].load(Ordering::Relaxed), 0);
        // Vacuously true.
        assert_eq!(out.emulated_all[rank].load(Ordering::Relaxed), 1);
    }
}
