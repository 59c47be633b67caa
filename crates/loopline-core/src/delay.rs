//! Read-position planning for the delay line.
//!
//! Converts the configured delay time into a target ring position relative to
//! the live write cursor. The target is recomputed from scratch every block,
//! so moving the delay control relocates the read head immediately; the
//! resulting discontinuity is a documented trade-off of the design. Keeping
//! the policy in this component means a smoothing or crossfade strategy can
//! replace it without touching the ring mechanics.

use crate::layout::{CAPACITY, MASK};

/// Shortest delay the reader will honor. Guards against feedback
/// self-oscillation at pathologically short delay settings.
pub const MIN_DELAY_SAMPLES: usize = 2048;

/// Longest delay the reader will honor: half the ring, so the requested
/// history can never outrun what the ring holds.
pub const MAX_DELAY_SAMPLES: usize = CAPACITY / 2;

/// Per-block read decision derived from the cursors and the delay setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPlan {
    /// Ring index that yields exactly `delay_samples` of lag behind the
    /// write cursor.
    pub target: usize,
    /// Samples currently buffered between the cursors.
    pub available: usize,
    /// Clamped delay expressed in samples.
    pub delay_samples: usize,
}

impl ReadPlan {
    /// True when the ring has not yet accumulated enough history to satisfy
    /// the requested delay without touching stale slots. The reader must
    /// emit silence and leave its cursor alone until this clears.
    #[inline]
    pub fn underrun(&self) -> bool {
        self.available < self.delay_samples / 2
    }
}

/// Stateless planner for the consumer side.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelayLineReader;

impl DelayLineReader {
    /// Converts a delay time to samples, clamped to the honored range.
    #[inline]
    pub fn delay_samples(&self, delay_ms: f32, sample_rate: f64) -> usize {
        let raw = (f64::from(delay_ms) / 1000.0 * sample_rate).round();
        if raw <= 0.0 {
            return MIN_DELAY_SAMPLES;
        }
        (raw as usize).clamp(MIN_DELAY_SAMPLES, MAX_DELAY_SAMPLES)
    }

    /// Plans one block read given the current cursors.
    #[inline]
    pub fn plan(
        &self,
        write_pos: usize,
        read_pos: usize,
        delay_ms: f32,
        sample_rate: f64,
    ) -> ReadPlan {
        let delay_samples = self.delay_samples(delay_ms, sample_rate);
        ReadPlan {
            target: write_pos.wrapping_sub(delay_samples) & MASK,
            available: write_pos.wrapping_sub(read_pos) & MASK,
            delay_samples,
        }
    }
}
