//! # Line Extraction Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};

use drive_lib::per::{extract, ColorRange, CropRegion, Hsv};

fn extract_benchmark(c: &mut Criterion) {
    // ---- Build a frame with a line and some clutter ----

    let frame = RgbImage::from_fn(320, 240, |x, y| {
        if (x as i64 - 140 - (y as i64 / 4)).abs() < 12 {
            // Slanted blue line
            Rgb([20, 40, 230])
        } else if (x / 7 + y / 5) % 11 == 0 {
            // Small blue speckles
            Rgb([10, 10, 200])
        } else {
            Rgb([((x * 3) % 120) as u8, 110, ((y * 5) % 90) as u8])
        }
    });

    let range = ColorRange::new(Hsv::new(100, 150, 150), Hsv::new(130, 255, 255));

    c.bench_function("extract (floor crop)", |b| {
        b.iter(|| extract(black_box(&frame), &range, 30, &CropRegion::default()))
    });

    c.bench_function("extract (full frame)", |b| {
        b.iter(|| extract(black_box(&frame), &range, 30, &CropRegion::FULL))
    });
}

criterion_group!(benches, extract_benchmark);
criterion_main!(benches);
