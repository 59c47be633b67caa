use std::path::Path;

use loopline_core::{CrossProcessRegion, FileBackedRegion, LoopbackLink, RingState, CAPACITY, REGION_SIZE};

const SAMPLE_RATE: f64 = 32_768.0;

fn fresh_link(path: &Path) -> LoopbackLink {
    let region = FileBackedRegion::acquire(path, REGION_SIZE).expect("acquire region");
    LoopbackLink::from_region(Box::new(region)).expect("link")
}

/// Second mapping of the same region, for inspecting raw slot contents
/// without going through the read path.
struct SlotInspector {
    region: FileBackedRegion,
}

impl SlotInspector {
    fn attach(path: &Path) -> Self {
        Self {
            region: FileBackedRegion::acquire(path, REGION_SIZE).expect("attach region"),
        }
    }

    fn left(&self, idx: usize) -> f32 {
        assert!(idx < CAPACITY);
        let state = self.region.as_ptr().cast::<RingState>().as_ptr();
        // SAFETY: idx is bounds-checked and the mapping covers a RingState.
        unsafe { std::ptr::addr_of!((*state).left).cast::<f32>().add(idx).read_volatile() }
    }

    fn right(&self, idx: usize) -> f32 {
        assert!(idx < CAPACITY);
        let state = self.region.as_ptr().cast::<RingState>().as_ptr();
        // SAFETY: as above.
        unsafe {
            std::ptr::addr_of!((*state).right)
                .cast::<f32>()
                .add(idx)
                .read_volatile()
        }
    }
}

#[test]
fn clear_buffer_zeroes_every_slot_and_both_cursors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ring.shm");
    let link = fresh_link(&path);

    let noise: Vec<f32> = (0..8192).map(|i| (i as f32).sin()).collect();
    link.write(&noise, None);
    assert_eq!(link.num_available(), 8192);

    link.clear_buffer();
    assert_eq!(link.num_available(), 0);

    let inspect = SlotInspector::attach(&path);
    // Full scan: every slot, both channels.
    for idx in 0..CAPACITY {
        assert_eq!(inspect.left(idx), 0.0, "left slot {idx}");
        assert_eq!(inspect.right(idx), 0.0, "right slot {idx}");
    }
}

#[test]
fn fade_out_ramps_then_zeroes_the_buffered_span() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ring.shm");
    let link = fresh_link(&path);

    let available = 8192usize;
    let ones = vec![1.0f32; available];
    link.write(&ones, Some(&ones));

    // 125 ms at 32768 Hz is 4096 fade samples, half the buffered span.
    link.fade_out_buffer(125.0, SAMPLE_RATE);
    let fade_samples = 4096usize;

    let inspect = SlotInspector::attach(&path);
    for i in 0..fade_samples {
        let expected = 1.0 - i as f32 / fade_samples as f32;
        assert_eq!(inspect.left(i), expected, "ramp offset {i}");
        assert_eq!(inspect.right(i), expected, "ramp offset {i}");
    }
    for i in fade_samples..available {
        assert_eq!(inspect.left(i), 0.0, "tail offset {i}");
        assert_eq!(inspect.right(i), 0.0, "tail offset {i}");
    }

    // Cursors stay put; the fade only attenuates content.
    assert_eq!(link.num_available(), available);
}

#[test]
fn fade_longer_than_buffered_span_is_capped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ring.shm");
    let link = fresh_link(&path);

    let ones = vec![1.0f32; 2048];
    link.write(&ones, None);

    // Ten seconds of fade against 2048 buffered samples: the whole span
    // becomes the ramp, nothing past it is touched.
    link.fade_out_buffer(10_000.0, SAMPLE_RATE);

    let inspect = SlotInspector::attach(&path);
    for i in 0..2048 {
        let expected = 1.0 - i as f32 / 2048.0;
        assert_eq!(inspect.left(i), expected, "ramp offset {i}");
    }
    assert_eq!(inspect.left(2048), 0.0);
}
