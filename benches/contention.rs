use criterion::{black_box, criterion_group, criterion_main, Criterion};
use custody::{
    lock::{ExclusiveOnly, SharedOnly, Untracked},
    Protected,
};

fn bench_uncontended_write(c: &mut Criterion) {
    let value: Protected<u64> = Protected::new(0u64);
    c.bench_function("uncontended_write_shared_exclusive", |b| {
        b.iter(|| {
            let proxy = value.get_write().unwrap();
            *proxy.write() += 1;
            black_box(&proxy);
        });
    });
}

fn bench_uncontended_write_exclusive_only(c: &mut Criterion) {
    let value: Protected<u64, ExclusiveOnly> = Protected::new(0);
    c.bench_function("uncontended_write_exclusive_only", |b| {
        b.iter(|| {
            let proxy = value.get_write().unwrap();
            *proxy.write() += 1;
            black_box(&proxy);
        });
    });
}

fn bench_uncontended_write_untracked(c: &mut Criterion) {
    let value: Protected<u64, Untracked> = Protected::new(0);
    c.bench_function("uncontended_write_untracked", |b| {
        b.iter(|| {
            let proxy = value.get_write().unwrap();
            *proxy.write() += 1;
            black_box(&proxy);
        });
    });
}

fn bench_uncontended_read(c: &mut Criterion) {
    let value: Protected<u64> = Protected::new(0u64);
    c.bench_function("uncontended_read_shared_exclusive", |b| {
        b.iter(|| {
            let proxy = value.get_read().unwrap();
            black_box(*proxy.read());
        });
    });
}

fn bench_uncontended_read_shared_only(c: &mut Criterion) {
    let value: Protected<u64, SharedOnly> = Protected::new(0);
    c.bench_function("uncontended_read_shared_only", |b| {
        b.iter(|| {
            let proxy = value.get_read().unwrap();
            black_box(*proxy.read());
        });
    });
}

fn bench_authorized_write(c: &mut Criterion) {
    let value: Protected<u64> = Protected::new(0u64);
    let auth = value.new_authorization();
    c.bench_function("authorized_write_shared_exclusive", |b| {
        b.iter(|| {
            let proxy = value.get_write_auth(&auth).unwrap();
            *proxy.write() += 1;
            black_box(&proxy);
        });
    });
}

fn bench_proxy_clone(c: &mut Criterion) {
    let value: Protected<u64> = Protected::new(0u64);
    let proxy = value.get_read().unwrap();
    c.bench_function("read_proxy_clone", |b| {
        b.iter(|| {
            black_box(proxy.clone());
        });
    });
}

criterion_group!(
    benches,
    bench_uncontended_write,
    bench_uncontended_write_exclusive_only,
    bench_uncontended_write_untracked,
    bench_uncontended_read,
    bench_uncontended_read_shared_only,
    bench_authorized_write,
    bench_proxy_clone,
);
criterion_main!(benches);
