use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docscan::{DetectorConfig, DocScanner, DocShapeDetector, GlobalConfig, Mat, ShapeDetector};
use ndarray::Array3;

fn document_photo(rows: usize, cols: usize) -> Mat {
    let (x0, x1) = (cols / 6, cols * 5 / 6);
    let (y0, y1) = (rows / 8, rows * 7 / 8);
    Mat::new(Array3::from_shape_fn((rows, cols, 3), |(y, x, c)| {
        if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
            40 + c as u8 * 10
        } else {
            225
        }
    }))
    .expect("synthetic photo")
}

fn benchmark_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("detection");
    group.sample_size(10);

    for (rows, cols) in [(800, 600), (2000, 1500)] {
        let img = document_photo(rows, cols);
        group.bench_with_input(
            BenchmarkId::new("multi_level", format!("{cols}x{rows}")),
            &img,
            |b, img| {
                let detector = DocShapeDetector::default();
                b.iter(|| detector.detect_shape(black_box(img)));
            },
        );
        group.bench_with_input(
            BenchmarkId::new("single_pass", format!("{cols}x{rows}")),
            &img,
            |b, img| {
                let detector = DocShapeDetector::new(DetectorConfig::single_pass());
                b.iter(|| detector.detect_shape(black_box(img)));
            },
        );
    }

    group.finish();
}

fn benchmark_warp(c: &mut Criterion) {
    let mut group = c.benchmark_group("warp");
    group.sample_size(20);

    let img = document_photo(2000, 1500);
    let scanner = DocScanner::new(GlobalConfig::default());
    let shape = scanner.detect(&img).expect("detect");
    group.bench_function("rectify_2000x1500", |b| {
        b.iter(|| scanner.scan(black_box(&img), black_box(&shape)).expect("scan"));
    });

    group.finish();
}

criterion_group!(benches, benchmark_detection, benchmark_warp);
criterion_main!(benches);
