//! Feedback mixing applied on the write path.
//!
//! The Send side mixes each incoming sample with whatever is already resident
//! at the destination ring slot. Because the reader later consumes that same
//! slot, the resident content is last cycle's audio at the configured delay,
//! which turns the ring into a single-tap recirculating echo.

/// Feedback below this level is treated as off and the input passes through
/// untouched.
pub const FEEDBACK_FLOOR: f32 = 0.001;

/// Amplitude ceiling enforced by the anti-feedback limiter.
pub const PEAK_CEILING: f32 = 0.95;

/// Mixes one incoming sample with the resident buffer content.
///
/// Channels are processed independently; the caller invokes this once per
/// channel per sample.
#[inline]
pub fn mix_feedback(input: f32, resident: f32, feedback: f32, anti_feedback: bool) -> f32 {
    if feedback <= FEEDBACK_FLOOR {
        return input;
    }
    let mixed = input + resident * feedback;
    if anti_feedback {
        limit_peak(mixed)
    } else {
        mixed
    }
}

/// One-sample peak limiter: rescales anything above [`PEAK_CEILING`] back to
/// the ceiling. No look-ahead, no release; instantaneous by design so a
/// runaway feedback loop can never store a sample above the ceiling.
#[inline]
pub fn limit_peak(sample: f32) -> f32 {
    let magnitude = sample.abs();
    if magnitude > PEAK_CEILING {
        sample * (PEAK_CEILING / magnitude)
    } else {
        sample
    }
}
