//! Binary layout of the shared ring state.
//!
//! The struct below is mapped directly over the shared-memory region by both
//! plugin binaries. There is no version header: any structural change breaks
//! compatibility between independently built Send and Return binaries, which
//! is why the region identifier carries a version suffix instead.

use std::sync::atomic::{AtomicU32, AtomicU64};

use crate::config::SharedConfig;

/// Ring capacity in samples per channel. Must stay a power of two so
/// wraparound is a bitmask instead of a modulo.
pub const CAPACITY: usize = 524_288;

/// Index mask for ring wraparound.
pub const MASK: usize = CAPACITY - 1;

/// Identifier both binaries use to find the same OS mapping. The suffix is
/// bumped whenever [`RingState`]'s layout changes.
pub const REGION_KEY: &str = "loopline-audio-v1";

const _: () = assert!(CAPACITY.is_power_of_two());

/// Everything that lives inside the shared mapping. Field order matters.
///
/// The sample arrays are plain `f32` slots deliberately left non-atomic: the
/// single-producer/single-consumer protocol synchronizes them through
/// acquire/release on the two cursors, and they are only ever touched through
/// volatile pointer accesses, never through a Rust reference.
#[repr(C)]
pub struct RingState {
    /// Next index the Send side will store to. Mutated only by the writer.
    pub write_pos: AtomicU32,
    /// Next index the Return side will consume. Mutated only by the reader.
    pub read_pos: AtomicU32,
    pub left: [f32; CAPACITY],
    pub right: [f32; CAPACITY],
    /// Lifetime sample counters. Diagnostic only, never used for indexing.
    pub total_written: AtomicU64,
    pub total_read: AtomicU64,
    pub config: SharedConfig,
}

/// Number of bytes a region must provide to hold one [`RingState`].
pub const REGION_SIZE: usize = std::mem::size_of::<RingState>();
