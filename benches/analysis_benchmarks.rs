use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::Array3;
use optimap_core::{
    filter_stack_spatial, filter_temporal, map_snr, model_stack_propagation, model_transient, FilterOrder,
    PropagationSpec, SpatialKernel, TransientType, WaveformSpec,
};

const DURATIONS_MS: &[f64] = &[500.0, 2000.0, 10_000.0];
const KERNEL_SIZES: &[usize] = &[3, 5, 7];
const STACK_SIZES: &[(usize, usize)] = &[(32, 32), (64, 64), (128, 128)];

fn synthetic_stack(height: usize, width: usize) -> Array3<f64> {
    let waveform = WaveformSpec::builder(TransientType::Ca)
        .duration_ms(150.0)
        .onset_ms(15.0)
        .fps(500)
        .baseline(1000)
        .amplitude(100)
        .noise(5.0)
        .seed(1)
        .build()
        .unwrap();
    let spec = PropagationSpec::new(waveform).with_size(height, width);
    model_stack_propagation(&spec).unwrap().1
}

fn benchmark_transient_synthesis(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesis");

    for &duration in DURATIONS_MS {
        let spec = WaveformSpec::builder(TransientType::Vm)
            .duration_ms(duration)
            .baseline(1000)
            .amplitude(100)
            .noise(5.0)
            .seed(7)
            .build()
            .unwrap();
        group.throughput(Throughput::Elements(spec.frame_count() as u64));
        group.bench_with_input(BenchmarkId::new("model_transient", duration), &spec, |b, spec| {
            b.iter(|| model_transient(black_box(spec)).unwrap());
        });
    }

    group.sample_size(10);
    group.bench_function("model_stack_propagation_50x100", |b| {
        let spec = PropagationSpec::default_for(TransientType::Ca).unwrap();
        b.iter(|| model_stack_propagation(black_box(&spec)).unwrap());
    });

    group.finish();
}

fn benchmark_spatial_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial");
    group.sample_size(20);
    let stack = synthetic_stack(64, 64);

    for kernel in [SpatialKernel::Gaussian, SpatialKernel::Mean, SpatialKernel::Median] {
        for &size in KERNEL_SIZES {
            group.bench_with_input(
                BenchmarkId::new(kernel.name(), size),
                &size,
                |b, &size| b.iter(|| filter_stack_spatial(black_box(stack.view()), kernel, size).unwrap()),
            );
        }
    }

    group.finish();
}

fn benchmark_temporal_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("temporal");

    for &duration in DURATIONS_MS {
        let spec = WaveformSpec::builder(TransientType::Ca)
            .duration_ms(duration)
            .baseline(1000)
            .amplitude(100)
            .noise(5.0)
            .seed(3)
            .build()
            .unwrap();
        let signal = model_transient(&spec).unwrap();
        group.throughput(Throughput::Elements(signal.len() as u64));

        for (name, order) in [("auto", FilterOrder::Auto), ("order_50", FilterOrder::Explicit(50))] {
            group.bench_with_input(BenchmarkId::new(name, duration), &signal, |b, signal| {
                b.iter(|| filter_temporal(black_box(signal.data().view()), 1000.0, 100.0, order).unwrap());
            });
        }
    }

    group.finish();
}

fn benchmark_snr_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("snr_map");
    group.sample_size(20);

    for &(height, width) in STACK_SIZES {
        let stack = synthetic_stack(height, width);
        group.throughput(Throughput::Elements((height * width) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", height, width)),
            &stack,
            |b, stack| b.iter(|| map_snr(black_box(stack.view()), 10).unwrap()),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_transient_synthesis,
    benchmark_spatial_filtering,
    benchmark_temporal_filtering,
    benchmark_snr_map
);
criterion_main!(benches);
