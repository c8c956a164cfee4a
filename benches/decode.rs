//! Benchmarks for payload rendering.
//!
//! Run with `cargo bench`. Measures the full render pass (range scan plus
//! pixel conversion) for the common sample kinds at a 256x256 frame.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fitspix::pixels::{DecodedImage, SampleKind, Transform};

const WIDTH: usize = 256;
const HEIGHT: usize = 256;

fn payload_i16() -> Vec<u8> {
    (0..WIDTH * HEIGHT)
        .map(|i| (i % 4096) as i16)
        .flat_map(|v| v.to_be_bytes())
        .collect()
}

fn payload_f32() -> Vec<u8> {
    (0..WIDTH * HEIGHT)
        .map(|i| (i % 4096) as f32 / 4096.0)
        .flat_map(|v| v.to_be_bytes())
        .collect()
}

fn bench_render_i16(c: &mut Criterion) {
    let payload = payload_i16();
    c.bench_function("render_256x256_i16", |b| {
        b.iter(|| {
            let mut image = DecodedImage::new(
                black_box(&payload),
                WIDTH,
                HEIGHT,
                SampleKind::Int16,
                0.0,
                1.0,
            )
            .unwrap();
            image.render(Transform::None, None, None).unwrap();
            black_box(image.pixels_flat32().len())
        })
    });
}

fn bench_render_f32(c: &mut Criterion) {
    let payload = payload_f32();
    c.bench_function("render_256x256_f32", |b| {
        b.iter(|| {
            let mut image = DecodedImage::new(
                black_box(&payload),
                WIDTH,
                HEIGHT,
                SampleKind::Float32,
                0.0,
                1.0,
            )
            .unwrap();
            image.render(Transform::None, None, None).unwrap();
            black_box(image.pixels_flat32().len())
        })
    });
}

fn bench_stretch(c: &mut Criterion) {
    let payload = payload_i16();
    c.bench_function("stretch_256x256_i16", |b| {
        b.iter(|| {
            let mut image = DecodedImage::new(
                black_box(&payload),
                WIDTH,
                HEIGHT,
                SampleKind::Int16,
                0.0,
                1.0,
            )
            .unwrap();
            black_box(image.stretch_range(0.01).unwrap())
        })
    });
}

criterion_group!(benches, bench_render_i16, bench_render_f32, bench_stretch);
criterion_main!(benches);
