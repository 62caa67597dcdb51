// Copyright 2026 Radixtx Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Benchmarks for core tree operations
//!
//! Run with: cargo bench --bench radix_ops
//!
//! The dense workload fans every node out to the full working alphabet at
//! each level, which stresses edge binary search and path copying; the
//! sparse workload uses long shared prefixes, which stresses splitting.

use criterion::{criterion_group, criterion_main, Criterion};
use radixtx::Tree;
use std::hint::black_box;

/// All keys for a dense node fanout under one prefix.
fn dense_keys_for_prefix(prefix: &str) -> Vec<String> {
    (0..256)
        .map(|i| format!("{}{}", prefix, (b'a' + (i % 26) as u8) as char))
        .collect()
}

/// Dense inputs: every node carries a full fanout, `levels` deep.
fn dense_test_data(levels: usize) -> Vec<String> {
    let mut inputs = Vec::new();
    let mut prefixes = vec![String::new()];
    for _ in 0..levels {
        let mut next = Vec::new();
        for prefix in &prefixes {
            let keys = dense_keys_for_prefix(prefix);
            inputs.extend(keys.iter().cloned());
            next.extend(keys);
        }
        prefixes = next;
    }
    inputs
}

fn sparse_test_data(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("service/region-{:02}/instance/{:06}", i % 16, i))
        .collect()
}

fn bench_insert(c: &mut Criterion) {
    let dense = dense_test_data(2);
    c.bench_function("dense_insert", |b| {
        b.iter(|| {
            let tree = Tree::new();
            for key in &dense {
                tree.insert(black_box(key.as_bytes()), 0u64);
            }
            black_box(tree.len())
        })
    });

    let sparse = sparse_test_data(10_000);
    c.bench_function("sparse_bulk_insert", |b| {
        b.iter(|| {
            let tree = Tree::new();
            let mut txn = tree.txn();
            for (i, key) in sparse.iter().enumerate() {
                txn.insert(black_box(key.as_bytes()), i as u64);
            }
            txn.commit();
            black_box(tree.len())
        })
    });
}

fn bench_get(c: &mut Criterion) {
    let dense = dense_test_data(2);
    let tree = Tree::new();
    for key in &dense {
        tree.insert(key.as_bytes(), 0u64);
    }
    let root = tree.root();

    c.bench_function("dense_get", |b| {
        b.iter(|| {
            for key in &dense {
                black_box(root.get(black_box(key.as_bytes())));
            }
        })
    });
}

fn bench_iterate(c: &mut Criterion) {
    let sparse = sparse_test_data(10_000);
    let tree = Tree::new();
    for (i, key) in sparse.iter().enumerate() {
        tree.insert(key.as_bytes(), i as u64);
    }
    let root = tree.root();

    c.bench_function("full_scan", |b| {
        b.iter(|| black_box(root.iter().count()))
    });

    c.bench_function("seek_lower_bound_scan", |b| {
        b.iter(|| {
            let mut it = root.iter();
            it.seek_lower_bound(black_box(b"service/region-08/"));
            black_box(it.count())
        })
    });
}

criterion_group!(benches, bench_insert, bench_get, bench_iterate);
criterion_main!(benches);
