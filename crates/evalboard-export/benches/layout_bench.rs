//! evalboard-export 성능 벤치마크
//!
//! 실행: cargo bench -p evalboard-export
//!
//! 벤치마크 대상:
//! - 페이지 배치 계산 (plan_content)
//! - PDF 조립 (render_pdf)

use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use evalboard_core::ports::render_surface::Bitmap;
use evalboard_export::layout::{plan_content, PageGeometry};
use evalboard_export::pdf::{render_pdf, CoverPage};

/// 페이지 배치 벤치마크
fn bench_plan_content(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_content");

    // 한 페이지, 높이 맞춤, 다중 분할
    let captures = [(4800, 3600), (3000, 5100), (3600, 36000)];

    for (width, height) in captures {
        group.bench_with_input(
            BenchmarkId::new("capture", format!("{width}x{height}")),
            &(width, height),
            |b, &(w, h)| b.iter(|| plan_content(black_box(w), black_box(h), &PageGeometry::A4)),
        );
    }

    group.finish();
}

/// PDF 조립 벤치마크
fn bench_render_pdf(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_pdf");
    group.sample_size(10);

    let cover = CoverPage::new(
        "Jane Doe",
        "Q3 2026",
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap_or_default(),
    );
    let resolutions = [(1200, 900), (2400, 6000)];

    for (width, height) in resolutions {
        let capture = Bitmap::filled(width, height, [235, 240, 250, 255]);
        group.throughput(Throughput::Bytes(capture.rgba.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("capture", format!("{width}x{height}")),
            &capture,
            |b, capture| b.iter(|| render_pdf(&cover, black_box(capture), &PageGeometry::A4)),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_plan_content, bench_render_pdf);
criterion_main!(benches);
