// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the pressguard-document crate: the noise/blur
// filter and A4 recomposition on a page-sized raster.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgb, RgbImage};

use pressguard_core::{KernelSize, Orientation};
use pressguard_document::{NoiseBlurFilter, PdfWriter};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// A4 landscape at 100 dpi is roughly 1169x827 pixels. Horizontal black bars
/// stand in for lines of text.
fn page_raster() -> RgbImage {
    let (width, height) = (1169u32, 827u32);
    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    for y in (40..height - 40).step_by(24) {
        for dy in 0..8 {
            for x in 60..width - 60 {
                img.put_pixel(x, y + dy, Rgb([20, 20, 20]));
            }
        }
    }
    img
}

fn bench_noise_blur(c: &mut Criterion) {
    let raster = page_raster();
    let filter = NoiseBlurFilter::new(KernelSize::square(5), 0.5, Some(1)).unwrap();

    c.bench_function("noise_blur 5x5 sigma 0.5 (A4 @ 100dpi)", |b| {
        b.iter(|| black_box(filter.apply(black_box(&raster), 1)));
    });
}

fn bench_compose_page(c: &mut Criterion) {
    let raster = page_raster();
    let writer = PdfWriter::new(Orientation::Landscape);

    c.bench_function("compose_page (A4 @ 100dpi)", |b| {
        b.iter(|| black_box(writer.compose_page(black_box(&raster)).unwrap()));
    });
}

criterion_group!(benches, bench_noise_blur, bench_compose_page);
criterion_main!(benches);
