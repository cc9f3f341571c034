// Benchmarks for lookup, resolution and delivery

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::path::PathBuf;
use tokio::runtime::Runtime;
use mimedrop::{
    fix_extension, BufferedResponse, ByteSource, ContentDeliveryService, Disposition,
    MimeExtensionRegistry,
};

fn setup_test_environment() -> (Runtime, PathBuf) {
    let rt = Runtime::new().unwrap();
    let test_dir = std::env::temp_dir().join("mimedrop_bench");

    if test_dir.exists() {
        std::fs::remove_dir_all(&test_dir).ok();
    }
    std::fs::create_dir_all(&test_dir).unwrap();

    (rt, test_dir)
}

fn bench_registry_lookup(c: &mut Criterion) {
    let registry = MimeExtensionRegistry::global();
    let mut group = c.benchmark_group("registry_lookup");

    group.bench_function("forward", |b| {
        b.iter(|| registry.lookup(black_box("application/zip")))
    });
    group.bench_function("reverse", |b| b.iter(|| registry.lookup(black_box(".wav"))));
    group.bench_function("miss", |b| {
        b.iter(|| registry.lookup(black_box("unknown/type")).is_err())
    });

    group.finish();
}

fn bench_fix_extension(c: &mut Criterion) {
    c.bench_function("fix_extension", |b| {
        b.iter(|| fix_extension(black_box("notes.txt"), black_box("image/png")))
    });
}

fn bench_file_delivery(c: &mut Criterion) {
    let (rt, test_dir) = setup_test_environment();
    let service = ContentDeliveryService::new();
    let mut group = c.benchmark_group("file_delivery");

    for size in [1024, 1024 * 100, 1024 * 1024].iter() {
        let path = test_dir.join(format!("src_{}.bin", size));
        std::fs::write(&path, vec![b'a'; *size]).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.to_async(&rt).iter(|| async {
                let mut response = BufferedResponse::new();
                let _ = service
                    .deliver(
                        &mut response,
                        "src.bin",
                        "application/octet-stream",
                        ByteSource::file(&path),
                        Disposition::Attachment,
                    )
                    .await
                    .unwrap();
                black_box(response.body().len())
            });
        });
    }

    group.finish();
    std::fs::remove_dir_all(&test_dir).ok();
}

criterion_group!(
    benches,
    bench_registry_lookup,
    bench_fix_extension,
    bench_file_delivery
);
criterion_main!(benches);
