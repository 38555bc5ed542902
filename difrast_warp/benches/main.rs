// Copyright 2025 the Difrast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(missing_docs, reason = "Not needed for benchmarks")]

mod accumulate;

use criterion::{criterion_group, criterion_main};

criterion_group!(a, accumulate::accumulate);
criterion_group!(c, codec::codec);
criterion_main!(a, c);
