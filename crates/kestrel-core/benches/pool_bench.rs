// Copyright 2025 eraflo
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

use criterion::{criterion_group, criterion_main, Criterion};
use kestrel_core::pool::{InitOutcome, Pool};
use kestrel_core::{BufferId, MAX_POOL_SIZE};
use std::hint::black_box;

fn bench_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("Resource Pool");

    group.bench_function("Alloc/Init/Free churn (1k)", |b| {
        let mut pool = Pool::<BufferId, u32>::new(1024);
        b.iter(|| {
            let ids: Vec<_> = (0..1024).map(|_| pool.alloc()).collect();
            for (i, &id) in ids.iter().enumerate() {
                let _ = pool.init(id, InitOutcome::Ready(i as u32));
            }
            for id in ids {
                black_box(pool.free(id).ok());
            }
        });
    });

    // Lookups on a full pool, half of them through stale ids.
    let mut pool = Pool::<BufferId, u32>::new(MAX_POOL_SIZE);
    let mut ids = Vec::with_capacity(MAX_POOL_SIZE);
    for i in 0..MAX_POOL_SIZE {
        let id = pool.alloc();
        let _ = pool.init(id, InitOutcome::Ready(i as u32));
        ids.push(id);
    }
    for id in ids.iter_mut().step_by(2) {
        let _ = pool.free(*id);
        let fresh = pool.alloc();
        let _ = pool.init(fresh, InitOutcome::Ready(0));
    }

    group.bench_function("Lookup (65k, half stale)", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for &id in &ids {
                if let Some(value) = pool.get(id) {
                    sum += u64::from(*value);
                }
            }
            black_box(sum)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_pool);
criterion_main!(benches);
