use loopline_core::{FileBackedRegion, LoopbackLink, CAPACITY, PEAK_CEILING, REGION_SIZE};

// 2048 samples at this rate is 62.5 ms, comfortably inside the delay
// clamp range, so a 2048-sample delay survives the ms round trip exactly.
const SAMPLE_RATE: f64 = 32_768.0;
const BLOCK: usize = 2048;

fn fresh_link(dir: &tempfile::TempDir) -> LoopbackLink {
    let region = FileBackedRegion::acquire(&dir.path().join("ring.shm"), REGION_SIZE)
        .expect("acquire region");
    LoopbackLink::from_region(Box::new(region)).expect("link")
}

fn block_delay_ms() -> f32 {
    (BLOCK as f64 / SAMPLE_RATE * 1000.0) as f32
}

#[test]
fn constant_block_round_trips_exactly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let link = fresh_link(&dir);
    link.set_delay_ms(block_delay_ms());

    let ones = vec![1.0f32; BLOCK];
    link.write(&ones, Some(&ones));

    let mut left = vec![-1.0f32; BLOCK];
    let mut right = vec![-1.0f32; BLOCK];
    link.read(&mut left, Some(&mut right), SAMPLE_RATE, true);

    assert!(left.iter().all(|&s| s == 1.0));
    assert!(right.iter().all(|&s| s == 1.0));
    assert_eq!(link.total_written(), BLOCK as u64);
    assert_eq!(link.total_read(), BLOCK as u64);
}

#[test]
fn zero_feedback_preserves_samples_bit_exactly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let link = fresh_link(&dir);
    link.set_delay_ms(block_delay_ms());
    link.set_feedback(0.0);

    let ramp: Vec<f32> = (0..BLOCK).map(|i| i as f32 / BLOCK as f32 - 0.5).collect();
    link.write(&ramp, None);

    let mut left = vec![0.0f32; BLOCK];
    let mut right = vec![0.0f32; BLOCK];
    link.read(&mut left, Some(&mut right), SAMPLE_RATE, true);

    assert_eq!(left, ramp);
    // Mono input duplicates into the right channel.
    assert_eq!(right, ramp);
}

#[test]
fn ring_slots_hold_only_the_most_recent_write() {
    let dir = tempfile::tempdir().expect("tempdir");
    let link = fresh_link(&dir);
    link.set_delay_ms(block_delay_ms());

    // Push more than a full capacity of a deterministic pattern so every
    // slot is overwritten at least once.
    let total = CAPACITY + 2 * BLOCK;
    let mut written = 0usize;
    let mut block = vec![0.0f32; BLOCK];
    while written < total {
        for (i, sample) in block.iter_mut().enumerate() {
            *sample = ((written + i) % 1000) as f32;
        }
        link.write(&block, None);
        written += BLOCK;
    }

    // The reader sits `BLOCK` samples behind the live write point, so the
    // output must be the pattern from the second-to-last block, i.e. the
    // latest value stored in those slots, not the lap-older one.
    let mut out = vec![0.0f32; BLOCK];
    link.read(&mut out, None, SAMPLE_RATE, true);
    for (i, &sample) in out.iter().enumerate() {
        let logical_time = total - BLOCK + i;
        assert_eq!(sample, (logical_time % 1000) as f32, "slot offset {i}");
    }
}

#[test]
fn feedback_grows_unbounded_without_limiter() {
    let dir = tempfile::tempdir().expect("tempdir");
    let link = fresh_link(&dir);
    link.set_delay_ms(block_delay_ms());
    link.set_feedback(0.9);
    link.set_anti_feedback(false);

    let lap = vec![1.0f32; CAPACITY];
    link.write(&lap, None); // resident zeros: stores 1.0
    link.write(&lap, None); // second visit: 1 + 0.9 = 1.9
    let tail = vec![1.0f32; 2 * BLOCK]; // third visit: 1 + 0.9 * 1.9 = 2.71
    link.write(&tail, None);

    let mut out = vec![0.0f32; BLOCK];
    link.read(&mut out, None, SAMPLE_RATE, true);
    assert!(
        out.iter().all(|&s| s > PEAK_CEILING),
        "limiter must not gate when disabled"
    );
}

#[test]
fn anti_feedback_caps_stored_magnitude() {
    let dir = tempfile::tempdir().expect("tempdir");
    let link = fresh_link(&dir);
    link.set_delay_ms(block_delay_ms());
    link.set_feedback(0.95);
    link.set_anti_feedback(true);

    let lap = vec![4.0f32; CAPACITY];
    link.write(&lap, None);
    link.write(&lap, None);
    let tail = vec![4.0f32; 2 * BLOCK];
    link.write(&tail, None);

    let mut out = vec![0.0f32; BLOCK];
    link.read(&mut out, None, SAMPLE_RATE, true);
    assert!(
        out.iter().all(|&s| s.abs() <= PEAK_CEILING + f32::EPSILON),
        "no stored sample may exceed the ceiling with the limiter on"
    );
}
