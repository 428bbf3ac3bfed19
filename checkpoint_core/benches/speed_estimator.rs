use checkpoint_core::{LinearCalibration, RangingCfg, SpeedEstimator, WeightAverager};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

// Synthetic vehicle pass: absent, approach, stop, leave, with a little jitter
fn synth_pass(n: usize, seed: u32) -> Vec<u16> {
    let mut state = seed.max(1);
    let mut jitter = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        (x % 7) as u16
    };
    (0..n)
        .map(|i| {
            let phase = i % 200;
            let base = match phase {
                0..=39 => 1200,
                40..=99 => 900 - (phase as u16 - 40) * 12,
                100..=139 => 180,
                _ => 180 + (phase as u16 - 140) * 15,
            };
            base + jitter()
        })
        .collect()
}

fn bench_speed(c: &mut Criterion) {
    let trace = synth_pass(10_000, 0xC0FFEE);
    c.bench_function("speed_estimator_10k", |b| {
        b.iter_batched(
            || SpeedEstimator::new(RangingCfg::default()),
            |mut est| {
                for &cm in &trace {
                    est.push_sample(cm);
                    black_box(est.estimate_speed());
                }
                black_box(est.peak_speed())
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_weight(c: &mut Criterion) {
    c.bench_function("weight_averager_10k", |b| {
        b.iter_batched(
            || WeightAverager::new(LinearCalibration::default()),
            |mut avg| {
                for i in 0..10_000u16 {
                    black_box(avg.push_and_maybe_average([i % 3300, 3300 - i % 3300]));
                }
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_speed, bench_weight);
criterion_main!(benches);
