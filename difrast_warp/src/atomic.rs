// Copyright 2025 the Difrast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Floating point atomics for target buffers and shared scratch.

use core::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// An `f32` cell supporting atomic addition, stored by bit pattern.
#[derive(Default)]
#[repr(transparent)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Release);
    }

    /// Adds `value` and returns the previous contents, like `atomicAdd`.
    pub fn fetch_add(&self, value: f32) -> f32 {
        let prev = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f32::from_bits(bits) + value).to_bits())
            });
        // The closure never declines the update.
        match prev {
            Ok(bits) | Err(bits) => f32::from_bits(bits),
        }
    }

    pub fn into_inner(self) -> f32 {
        f32::from_bits(self.0.into_inner())
    }
}

impl From<f32> for AtomicF32 {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for AtomicF32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.load(), f)
    }
}

/// Builds an atomic target buffer holding `values`.
pub fn atomic_buffer(values: &[f32]) -> Vec<AtomicF32> {
    values.iter().copied().map(AtomicF32::new).collect()
}

/// Builds an atomic target buffer of `len` zeros.
pub fn zeroed_buffer(len: usize) -> Vec<AtomicF32> {
    (0..len).map(|_| AtomicF32::default()).collect()
}

/// Reads the current contents of an atomic buffer.
pub fn snapshot(buffer: &[AtomicF32]) -> Vec<f32> {
    buffer.iter().map(AtomicF32::load).collect()
}
