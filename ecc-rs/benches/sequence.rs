use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ecc_rs::extrema::{ExtremaFinder, ExtremaFinderConfig, ExtremaType, Series};
use ecc_rs::kernel::KernelLifecycle;
use rand::rngs::ThreadRng;
use rand::Rng;

/// Build an eccentric inspiral of `n` samples with a little sample noise
/// from `rng` riding on the modulation.
fn synthetic_inspiral(mut rng: ThreadRng, n: usize, modulation: f64) -> Series {
    let t_start = -2000.0;
    let t_end = -10.0;
    let dt = (t_end - t_start) / (n - 1) as f64;

    let t: Vec<f64> = (0..n).map(|i| t_start + dt * i as f64).collect();
    let trend: Vec<f64> = t.iter().map(|&ti| 2.9 * (10.0 - ti).powf(-0.375)).collect();

    let mut phase = Vec::with_capacity(n);
    phase.push(0.0);
    for i in 1..n {
        let p = phase[i - 1] + 0.5 * (trend[i - 1] + trend[i]) * dt;
        phase.push(p);
    }

    let omega: Vec<f64> = trend
        .iter()
        .zip(phase.iter())
        .map(|(&tr, &ph)| {
            let noise = 1.0 + rng.random_range(-1e-5..1e-5);
            tr * (1.0 + modulation * (ph / 2.0).sin()) * noise
        })
        .collect();

    Series::try_new(t, phase, omega).expect("synthetic series is valid")
}

fn bench_sequence_walk(c: &mut Criterion) {
    let finder = ExtremaFinder::try_new(ExtremaFinderConfig::default()).expect("valid config");

    let mut group = c.benchmark_group("sequence_walk");
    for &n in &[1000usize, 2000, 4000] {
        let series = synthetic_inspiral(rand::rng(), n, 0.1);
        group.bench_with_input(BenchmarkId::new("maxima", n), &series, |b, series| {
            b.iter(|| {
                finder
                    .find_extrema(black_box(series), ExtremaType::Maxima)
                    .expect("walk succeeds")
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sequence_walk);
criterion_main!(benches);
