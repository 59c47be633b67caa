//! Cross-process configuration scalars shared between the Send and Return
//! instances. The Return side writes them from its parameter layer; both
//! audio callbacks read them once per block with relaxed ordering, so a
//! setting may lag the audio path by at most one block.

use std::sync::atomic::{AtomicBool, Ordering};

use atomic_float::AtomicF32;

pub const DELAY_MS_MIN: f32 = 50.0;
pub const DELAY_MS_MAX: f32 = 3000.0;
pub const DELAY_MS_DEFAULT: f32 = 500.0;

pub const FEEDBACK_MIN: f32 = 0.0;
pub const FEEDBACK_MAX: f32 = 0.95;

pub const SMOOTHING_MIN: f32 = 0.0;
pub const SMOOTHING_MAX: f32 = 0.99;
pub const SMOOTHING_DEFAULT: f32 = 0.8;

/// Settings block embedded in the shared ring state.
///
/// Field order is part of the cross-process binary layout; reordering breaks
/// compatibility between independently built Send and Return binaries.
#[repr(C)]
pub struct SharedConfig {
    delay_ms: AtomicF32,
    feedback: AtomicF32,
    anti_feedback: AtomicBool,
    /// Reserved. Stored, clamped, and exposed, but not consumed by the
    /// read/write paths.
    smoothing: AtomicF32,
}

impl SharedConfig {
    /// Stores the documented defaults. Called once by the process that
    /// zero-initialized the region; attachers must leave settings untouched.
    pub(crate) fn init_defaults(&self) {
        self.delay_ms.store(DELAY_MS_DEFAULT, Ordering::Relaxed);
        self.feedback.store(0.0, Ordering::Relaxed);
        self.anti_feedback.store(false, Ordering::Relaxed);
        self.smoothing.store(SMOOTHING_DEFAULT, Ordering::Relaxed);
    }

    pub fn set_delay_ms(&self, ms: f32) {
        self.delay_ms
            .store(ms.clamp(DELAY_MS_MIN, DELAY_MS_MAX), Ordering::Relaxed);
    }

    pub fn set_feedback(&self, amount: f32) {
        self.feedback
            .store(amount.clamp(FEEDBACK_MIN, FEEDBACK_MAX), Ordering::Relaxed);
    }

    pub fn set_anti_feedback(&self, enabled: bool) {
        self.anti_feedback.store(enabled, Ordering::Relaxed);
    }

    pub fn set_smoothing(&self, amount: f32) {
        self.smoothing.store(
            amount.clamp(SMOOTHING_MIN, SMOOTHING_MAX),
            Ordering::Relaxed,
        );
    }

    pub fn delay_ms(&self) -> f32 {
        self.delay_ms.load(Ordering::Relaxed)
    }

    pub fn feedback(&self) -> f32 {
        self.feedback.load(Ordering::Relaxed)
    }

    pub fn anti_feedback(&self) -> bool {
        self.anti_feedback.load(Ordering::Relaxed)
    }

    pub fn smoothing(&self) -> f32 {
        self.smoothing.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeroed() -> SharedConfig {
        // SAFETY: every field is an atomic over a plain scalar, for which the
        // all-zero bit pattern is a valid value.
        unsafe { std::mem::zeroed() }
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = zeroed();
        config.init_defaults();
        assert_eq!(config.delay_ms(), 500.0);
        assert_eq!(config.feedback(), 0.0);
        assert!(!config.anti_feedback());
        assert_eq!(config.smoothing(), 0.8);
    }

    #[test]
    fn setters_clamp_out_of_range_input() {
        let config = zeroed();
        config.set_delay_ms(10.0);
        assert_eq!(config.delay_ms(), DELAY_MS_MIN);
        config.set_delay_ms(10_000.0);
        assert_eq!(config.delay_ms(), DELAY_MS_MAX);
        config.set_feedback(1.5);
        assert_eq!(config.feedback(), FEEDBACK_MAX);
        config.set_feedback(-0.2);
        assert_eq!(config.feedback(), 0.0);
        config.set_smoothing(2.0);
        assert_eq!(config.smoothing(), SMOOTHING_MAX);
    }
}
