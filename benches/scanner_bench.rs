//! Benchmark tests for the walker-based classifiers

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rusty_tidy::classify::{aggregate_sizes, classify_empty, find_duplicates, EmptyOptions, HashAlgorithm};
use rusty_tidy::{CancelToken, ExclusionRules, WalkOptions};
use std::fs::{self, File};
use std::io::Write;
use tempfile::TempDir;

/// Create a benchmark directory with the given number of files spread over
/// `dir_count` subdirectories. Every fourth file repeats earlier content.
fn create_benchmark_dir(file_count: usize, dir_count: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let files_per_dir = file_count / dir_count.max(1);

    for d in 0..dir_count {
        let subdir = root.join(format!("dir{}", d));
        fs::create_dir(&subdir).unwrap();

        for f in 0..files_per_dir {
            let mut file = File::create(subdir.join(format!("file{}.txt", f))).unwrap();
            let seed = if f % 4 == 0 { 0 } else { d * files_per_dir + f };
            write!(file, "{}", seed).unwrap();
            file.write_all(&vec![b'x'; 1024]).unwrap();
        }
    }

    dir
}

/// Nested empty directories, `width` wide and `depth` deep.
fn create_empty_tree(width: usize, depth: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    for w in 0..width {
        let mut current = dir.path().join(format!("branch{}", w));
        for level in 0..depth {
            current = current.join(format!("level{}", level));
        }
        fs::create_dir_all(&current).unwrap();
    }
    dir
}

fn benchmark_duplicates(c: &mut Criterion) {
    let mut group = c.benchmark_group("duplicates");
    let rules = ExclusionRules::none();
    let cancel = CancelToken::new();

    for size in [100, 500, 1000].iter() {
        let dir = create_benchmark_dir(*size, 10);

        for threads in [1, 4] {
            let options = WalkOptions::new().with_threads(threads);
            group.bench_with_input(
                BenchmarkId::new(format!("sha256_{}_threads", threads), size),
                size,
                |b, _| {
                    b.iter(|| {
                        find_duplicates(
                            black_box(dir.path()),
                            HashAlgorithm::Sha256,
                            &options,
                            &rules,
                            &cancel,
                        )
                    })
                },
            );
        }
    }

    group.finish();
}

fn benchmark_sizes(c: &mut Criterion) {
    let dir = create_benchmark_dir(1000, 20);
    let options = WalkOptions::default();
    let rules = ExclusionRules::none();
    let cancel = CancelToken::new();

    c.bench_function("aggregate_sizes", |b| {
        b.iter(|| aggregate_sizes(black_box(dir.path()), &options, &rules, &cancel))
    });
}

fn benchmark_empty(c: &mut Criterion) {
    let mut group = c.benchmark_group("empty_dirs");
    let dir = create_empty_tree(50, 6);
    let rules = ExclusionRules::none();
    let cancel = CancelToken::new();

    let shallow = EmptyOptions::new();
    let deep = EmptyOptions::new().with_recursive(true);

    group.bench_function("shallow", |b| {
        b.iter(|| classify_empty(black_box(dir.path()), &shallow, &rules, &cancel))
    });

    group.bench_function("recursive", |b| {
        b.iter(|| classify_empty(black_box(dir.path()), &deep, &rules, &cancel))
    });

    group.finish();
}

criterion_group!(benches, benchmark_duplicates, benchmark_sizes, benchmark_empty);
criterion_main!(benches);
