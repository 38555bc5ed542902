use criterion::Criterion;
use difrast_common::{Dim3, LaunchConfig, WarpSize};
use difrast_warp::atomic::zeroed_buffer;
use difrast_warp::{
    launch, CaScratch, Coalesced, CoalescedAccumulator, Coalescing, Direct, NativeMatch,
    SharedMemoryMatch,
};
use rand::prelude::StdRng;
use rand::{Rng, SeedableRng};

const SEED: [u8; 32] = [0; 32];
const TARGETS: u32 = 16;

fn scatter<S: Coalescing>(config: &LaunchConfig, keys: &[u32]) {
    let target = zeroed_buffer(TARGETS as usize);
    launch(config, CaScratch::for_launch, |ctx, scratch| {
        let key = keys[ctx.thread_rank() as usize];
        let mut ca = CoalescedAccumulator::<S>::new(ctx, scratch);
        ca.set_group(key);
        for _ in 0..64 {
            ca.add(&target, key as usize, 1.0);
        }
    });
}

pub fn accumulate(c: &mut Criterion) {
    let mut g = c.benchmark_group("accumulate");
    let config = LaunchConfig::new(Dim3::ONE, Dim3::new(16, 8, 1), WarpSize::W32).unwrap();
    let mut rng = StdRng::from_seed(SEED);
    let keys: Vec<u32> = (0..config.threads_per_block())
        .map(|_| rng.gen_range(0..TARGETS))
        .collect();

    macro_rules! strategy {
        ($name:ident, $strategy:ty) => {
            g.bench_function(stringify!($name), |b| {
                b.iter(|| scatter::<$strategy>(&config, &keys));
            });
        };
    }

    strategy!(shared_memory_match, Coalesced<SharedMemoryMatch>);
    strategy!(native_match, Coalesced<NativeMatch>);
    strategy!(direct, Direct);
}
