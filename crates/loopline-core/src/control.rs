//! Maintenance operations on the buffered audio.
//!
//! Both operations walk the sample arrays wholesale and are linear in the
//! ring capacity or the buffered span. They belong on the Return instance's
//! UI thread, never on an audio callback, and are advisory with respect to
//! the audio threads: nothing sequences them against a concurrent block
//! write/read, so they are for "stop and wipe" style user actions where a
//! momentary race is inaudible or irrelevant.

use std::sync::atomic::Ordering;

use crate::layout::{CAPACITY, MASK};
use crate::link::LoopbackLink;

impl LoopbackLink {
    /// Zeroes every sample slot and resets both cursors to zero.
    pub fn clear_buffer(&self) {
        let Some(shared) = &self.shared else {
            return;
        };
        let (left_ch, right_ch) = shared.channels();
        // SAFETY: the channel pointers cover CAPACITY f32 slots each inside
        // the live mapping.
        unsafe {
            std::ptr::write_bytes(left_ch, 0, CAPACITY);
            std::ptr::write_bytes(right_ch, 0, CAPACITY);
        }
        let header = shared.header();
        header.write_pos.store(0, Ordering::Release);
        header.read_pos.store(0, Ordering::Release);
        tracing::debug!("ring buffer cleared");
    }

    /// Attenuates the currently buffered span so it drains to silence as the
    /// reader catches up: a linear ramp from full level to zero over
    /// `fade_ms` (capped at the buffered span), then hard zeros for the
    /// rest. Cursors are left untouched.
    pub fn fade_out_buffer(&self, fade_ms: f32, sample_rate: f64) {
        let Some(shared) = &self.shared else {
            return;
        };
        let header = shared.header();
        let write_pos = header.write_pos.load(Ordering::Acquire) as usize;
        let read_pos = header.read_pos.load(Ordering::Acquire) as usize;
        let available = write_pos.wrapping_sub(read_pos) & MASK;

        let requested = (f64::from(fade_ms) / 1000.0 * sample_rate).round().max(0.0) as usize;
        let fade_samples = requested.min(available);

        let (left_ch, right_ch) = shared.channels();
        for i in 0..fade_samples {
            let idx = (read_pos + i) & MASK;
            let gain = 1.0 - (i as f32 / fade_samples as f32);
            // SAFETY: idx < CAPACITY by the mask.
            unsafe {
                let slot_l = left_ch.add(idx);
                let slot_r = right_ch.add(idx);
                slot_l.write_volatile(slot_l.read_volatile() * gain);
                slot_r.write_volatile(slot_r.read_volatile() * gain);
            }
        }
        for i in fade_samples..available {
            let idx = (read_pos + i) & MASK;
            // SAFETY: idx < CAPACITY by the mask.
            unsafe {
                left_ch.add(idx).write_volatile(0.0);
                right_ch.add(idx).write_volatile(0.0);
            }
        }
        tracing::debug!(fade_samples, available, "ring buffer faded out");
    }
}
