//! Performance benchmarks for treesum
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fs::File;
use std::io::Write;
use tempfile::TempDir;
use treesum::core::CreateOrUpdateEngine;
use treesum::fs::{ScanConfig, TreeScanner};
use treesum::hash::{hash_bytes, AlgorithmRegistry};

/// Create a test file of the specified size
fn create_test_file(dir: &std::path::Path, name: &str, size: usize) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();

    let chunk_size = 64 * 1024;
    let chunk: Vec<u8> = (0..chunk_size).map(|i| (i % 251) as u8).collect();
    let mut remaining = size;

    while remaining > 0 {
        let to_write = remaining.min(chunk_size);
        file.write_all(&chunk[..to_write]).unwrap();
        remaining -= to_write;
    }

    path
}

fn create_test_tree(files_per_dir: usize, size: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    for i in 0..10 {
        let subdir = dir.path().join(format!("subdir_{}", i));
        std::fs::create_dir_all(&subdir).unwrap();
        for j in 0..files_per_dir {
            create_test_file(&subdir, &format!("file_{}.bin", j), size);
        }
    }
    dir
}

fn bench_hash_algorithms(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_algorithms");
    let registry = AlgorithmRegistry::standard();

    let data_size = 10 * 1024 * 1024; // 10 MB
    let data: Vec<u8> = (0..data_size).map(|i| (i % 251) as u8).collect();

    group.throughput(Throughput::Bytes(data_size as u64));

    for algorithm in registry.algorithms() {
        group.bench_with_input(
            BenchmarkId::new("hash", algorithm.name),
            &data,
            |b, data| {
                b.iter(|| black_box(hash_bytes(&algorithm, 0, data)));
            },
        );
    }

    group.finish();
}

fn bench_xxh3_short_inputs(c: &mut Criterion) {
    let mut group = c.benchmark_group("xxh3_short");
    let algorithm = AlgorithmRegistry::standard().by_name("XXH128").unwrap();

    for size in [8usize, 64, 200, 1000] {
        let data = vec![0x5au8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| black_box(hash_bytes(&algorithm, 7, data)));
        });
    }

    group.finish();
}

fn bench_directory_scan(c: &mut Criterion) {
    let dir = create_test_tree(100, 1024);

    c.bench_function("scan_1000_files", |b| {
        b.iter(|| {
            let scanner = TreeScanner::new(ScanConfig::default());
            black_box(scanner.collect(dir.path()).unwrap())
        });
    });
}

fn bench_create_manifest(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_manifest");
    let dir = create_test_tree(20, 256 * 1024);
    let algorithm = AlgorithmRegistry::standard().by_name("XXH64").unwrap();

    for threads in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::new("threads", threads), &threads, |b, &threads| {
            b.iter(|| {
                let mut out = Vec::new();
                CreateOrUpdateEngine::new(dir.path(), algorithm)
                    .with_threads(threads)
                    .run(&mut out, None)
                    .unwrap();
                black_box(out)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_hash_algorithms,
    bench_xxh3_short_inputs,
    bench_directory_scan,
    bench_create_manifest
);

criterion_main!(benches);
