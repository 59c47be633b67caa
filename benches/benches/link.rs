use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use loopline_core::{FileBackedRegion, LoopbackLink, REGION_SIZE};

const SAMPLE_RATE: f64 = 48_000.0;
const BLOCK: usize = 128;

fn linked_pair(dir: &tempfile::TempDir) -> (LoopbackLink, LoopbackLink) {
    let path = dir.path().join("ring.shm");
    let send = LoopbackLink::from_region(Box::new(
        FileBackedRegion::acquire(&path, REGION_SIZE).expect("create region"),
    ))
    .expect("send link");
    let ret = LoopbackLink::from_region(Box::new(
        FileBackedRegion::acquire(&path, REGION_SIZE).expect("attach region"),
    ))
    .expect("return link");
    (send, ret)
}

fn hot_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("link");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("write_block128_stereo", |b| {
        let dir = tempfile::tempdir().expect("tempdir");
        let (send, _ret) = linked_pair(&dir);
        let left = vec![0.25f32; BLOCK];
        let right = vec![-0.25f32; BLOCK];
        b.iter(|| send.write(&left, Some(&right)));
    });

    group.bench_function("write_block128_feedback_limited", |b| {
        let dir = tempfile::tempdir().expect("tempdir");
        let (send, ret) = linked_pair(&dir);
        ret.set_feedback(0.9);
        ret.set_anti_feedback(true);
        let left = vec![0.25f32; BLOCK];
        let right = vec![-0.25f32; BLOCK];
        b.iter(|| send.write(&left, Some(&right)));
    });

    group.bench_function("read_block128_stereo", |b| {
        let dir = tempfile::tempdir().expect("tempdir");
        let (send, ret) = linked_pair(&dir);
        ret.set_delay_ms(100.0);
        // Warm the ring far past the underrun threshold.
        let warmup = vec![0.5f32; 16_384];
        send.write(&warmup, None);
        let mut left = vec![0.0f32; BLOCK];
        let mut right = vec![0.0f32; BLOCK];
        b.iter(|| ret.read(&mut left, Some(&mut right), SAMPLE_RATE, true));
    });

    group.finish();
}

criterion_group!(benches, hot_path);
criterion_main!(benches);
