//! Activity counters for the editors' meters and indicators.
//!
//! Observability only: nothing here participates in correctness decisions,
//! and a degraded link reports zeros/defaults so a UI can keep polling
//! without caring whether the region ever came up.

use std::sync::atomic::Ordering;

use crate::config::DELAY_MS_DEFAULT;
use crate::layout::MASK;
use crate::link::LoopbackLink;

/// Point-in-time view of the ring's activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivitySnapshot {
    pub total_written: u64,
    pub total_read: u64,
    pub available: usize,
}

impl LoopbackLink {
    /// Samples currently buffered between the cursors.
    pub fn num_available(&self) -> usize {
        let Some(shared) = &self.shared else {
            return 0;
        };
        let header = shared.header();
        let write_pos = header.write_pos.load(Ordering::Acquire) as usize;
        let read_pos = header.read_pos.load(Ordering::Acquire) as usize;
        write_pos.wrapping_sub(read_pos) & MASK
    }

    /// Lifetime samples the Send side has stored.
    pub fn total_written(&self) -> u64 {
        self.shared
            .as_ref()
            .map_or(0, |s| s.header().total_written.load(Ordering::Relaxed))
    }

    /// Lifetime samples the Return side has consumed.
    pub fn total_read(&self) -> u64 {
        self.shared
            .as_ref()
            .map_or(0, |s| s.header().total_read.load(Ordering::Relaxed))
    }

    pub fn delay_ms(&self) -> f32 {
        self.shared
            .as_ref()
            .map_or(DELAY_MS_DEFAULT, |s| s.header().config.delay_ms())
    }

    pub fn feedback(&self) -> f32 {
        self.shared.as_ref().map_or(0.0, |s| s.header().config.feedback())
    }

    pub fn anti_feedback(&self) -> bool {
        self.shared
            .as_ref()
            .map_or(false, |s| s.header().config.anti_feedback())
    }

    pub fn smoothing(&self) -> f32 {
        self.shared
            .as_ref()
            .map_or(0.0, |s| s.header().config.smoothing())
    }

    pub fn activity(&self) -> ActivitySnapshot {
        ActivitySnapshot {
            total_written: self.total_written(),
            total_read: self.total_read(),
            available: self.num_available(),
        }
    }
}
