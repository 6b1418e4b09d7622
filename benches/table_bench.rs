use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use lua_table::{Table, Value};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> Value {
    Value::from(format!("k{:016x}", n))
}

fn bench_insert_strings(c: &mut Criterion) {
    let keys: Vec<Value> = lcg(1).take(10_000).map(key).collect();
    c.bench_function("table_insert_str_10k", |b| {
        b.iter_batched(
            || Table::<Value>::new(),
            |mut t| {
                for (i, k) in keys.iter().enumerate() {
                    t.set(k.clone(), Value::Integer(i as i64)).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_push_sequence(c: &mut Criterion) {
    c.bench_function("table_push_10k", |b| {
        b.iter_batched(
            || Table::<Value>::new(),
            |mut t| {
                for i in 0..10_000 {
                    t.set_int(i + 1, Value::Integer(i)).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("table_get_hit", |b| {
        let mut t: Table<Value> = Table::new();
        let keys: Vec<Value> = lcg(7).take(20_000).map(key).collect();
        for (i, k) in keys.iter().enumerate() {
            t.set(k.clone(), Value::Integer(i as i64)).unwrap();
        }
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(t.get(k));
        })
    });
}

fn bench_get_miss(c: &mut Criterion) {
    c.bench_function("table_get_miss", |b| {
        let mut t: Table<Value> = Table::new();
        for (i, x) in lcg(11).take(10_000).enumerate() {
            t.set(key(x), Value::Integer(i as i64)).unwrap();
        }
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            let k = key(miss.next().unwrap());
            black_box(t.get(&k));
        })
    });
}

fn bench_next_traversal(c: &mut Criterion) {
    c.bench_function("table_next_10k_mixed", |b| {
        let mut t: Table<Value> = Table::new();
        for (i, x) in lcg(3).take(5_000).enumerate() {
            t.set(key(x), Value::Integer(i as i64)).unwrap();
            t.set_int(i as i64 + 1, Value::Integer(i as i64)).unwrap();
        }
        b.iter(|| {
            let mut n = 0usize;
            let mut k = Value::Nil;
            while let Some((nk, _)) = t.next(&k).unwrap() {
                n += 1;
                k = nk;
            }
            black_box(n)
        })
    });
}

fn bench_length(c: &mut Criterion) {
    c.bench_function("table_length_border", |b| {
        let mut t: Table<Value> = Table::new();
        for i in 1..=100_000 {
            t.set_int(i, Value::Integer(i)).unwrap();
        }
        b.iter(|| black_box(t.length()))
    });
}

fn bench_sort(c: &mut Criterion) {
    let values: Vec<i64> = lcg(5).take(10_000).map(|x| (x >> 33) as i64).collect();
    c.bench_function("table_sort_10k", |b| {
        b.iter_batched(
            || {
                let mut t = Table::<Value>::new();
                for v in &values {
                    t.push(Value::Integer(*v)).unwrap();
                }
                t
            },
            |mut t| {
                t.sort().unwrap();
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert_strings, bench_push_sequence, bench_get_hit, bench_get_miss,
        bench_next_traversal, bench_length, bench_sort
}
criterion_main!(benches);
