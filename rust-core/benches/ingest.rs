use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pulse_spectrum::{EngineKind, RecursiveBandpassFilter, SpectralAnalyzer};
use std::f64::consts::PI;

fn pulse_signal(len: usize) -> Vec<f64> {
    (0..len)
        .map(|k| 120.0 + (2.0 * PI * 1.2 * k as f64 / 8.0).sin())
        .collect()
}

fn benchmark_filter_block(c: &mut Criterion) {
    let signal = pulse_signal(4096);
    let mut filter = RecursiveBandpassFilter::new();

    c.bench_function("bandpass_block_4096", |b| {
        b.iter(|| {
            let mut block = signal.clone();
            filter.process_block_inplace(black_box(&mut block));
        })
    });
}

/// One full window per iteration, for both transform engines
fn benchmark_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyzer_window");

    for engine in [EngineKind::Complex, EngineKind::Real] {
        for (effective, padding) in [(100, 400), (128, 896)] {
            let mut analyzer = SpectralAnalyzer::new();
            analyzer.set_engine(engine);
            analyzer
                .set_sample_settings(effective, padding, 0)
                .expect("valid sizes");
            analyzer.set_sample_interval(125.0).expect("valid interval");

            let signal = pulse_signal(effective);
            let id = BenchmarkId::new(format!("{:?}", engine), effective + padding);

            group.bench_with_input(id, &signal, |b, signal| {
                b.iter(|| {
                    for &sample in signal {
                        black_box(analyzer.add_sample(sample));
                    }
                    black_box(analyzer.peak_index())
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, benchmark_filter_block, benchmark_window);
criterion_main!(benches);
