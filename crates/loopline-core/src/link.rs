//! The shared-audio link handle.
//!
//! One `LoopbackLink` is acquired per plugin instance at construction time
//! and passed by reference into the audio path; there is no global state.
//! The Send instance is the single writer of the sample stream, the Return
//! instance the single reader, and acquire/release ordering on the two
//! cursors is the only synchronization between them. Configuration scalars
//! use relaxed ordering; a setting lagging the audio path by one block is
//! acceptable.

use std::ptr::NonNull;

use crate::delay::DelayLineReader;
use crate::layout::{RingState, MASK, REGION_KEY, REGION_SIZE};
use crate::mixer::mix_feedback;
use crate::region::{acquire_native, CrossProcessRegion, RegionError};

use std::sync::atomic::Ordering;

pub(crate) struct SharedState {
    // Keeps the mapping alive for as long as `state` is dereferenced.
    _region: Box<dyn CrossProcessRegion>,
    state: NonNull<RingState>,
}

// SAFETY: the pointed-to state is designed for concurrent access from
// multiple processes; moving the handle between threads changes nothing.
unsafe impl Send for SharedState {}
unsafe impl Sync for SharedState {}

impl SharedState {
    /// Header view for the atomic fields. The sample arrays are never read
    /// through this reference; they are only touched through the raw
    /// channel pointers so concurrent mutation by the peer process stays
    /// outside any Rust reference.
    pub(crate) fn header(&self) -> &RingState {
        // SAFETY: the mapping outlives `self` and is large enough for a
        // RingState (checked at attach). All fields reachable through the
        // reference that we actually access are atomics.
        unsafe { self.state.as_ref() }
    }

    /// Raw pointers to the first slot of each channel array.
    pub(crate) fn channels(&self) -> (*mut f32, *mut f32) {
        let state = self.state.as_ptr();
        // SAFETY: projections inside the mapped RingState; no reference is
        // created to the arrays themselves.
        unsafe {
            (
                std::ptr::addr_of_mut!((*state).left).cast::<f32>(),
                std::ptr::addr_of_mut!((*state).right).cast::<f32>(),
            )
        }
    }
}

/// Handle to the cross-process audio stream shared by the Send and Return
/// plugins.
///
/// When the OS region cannot be acquired the link still constructs, but in a
/// degraded state: writes become no-ops, reads emit silence, and telemetry
/// reports zeros. An audio plugin must keep running either way.
pub struct LoopbackLink {
    pub(crate) shared: Option<SharedState>,
    reader: DelayLineReader,
}

impl LoopbackLink {
    /// Acquires (or attaches to) the platform's native region under the
    /// fixed [`REGION_KEY`]. Never fails; a degraded link is returned when
    /// the OS primitive is unavailable.
    pub fn connect() -> Self {
        match acquire_native(REGION_KEY, REGION_SIZE) {
            Ok(region) => match Self::from_region(region) {
                Ok(link) => link,
                Err(err) => {
                    tracing::warn!(%err, "shared region unusable, running degraded");
                    Self::disconnected()
                }
            },
            Err(err) => {
                tracing::warn!(%err, "shared region unavailable, running degraded");
                Self::disconnected()
            }
        }
    }

    /// Wraps an explicit region, e.g. a file-backed one in tests.
    pub fn from_region(region: Box<dyn CrossProcessRegion>) -> Result<Self, RegionError> {
        if region.len() < REGION_SIZE {
            return Err(RegionError::TooSmall {
                expected: REGION_SIZE,
                actual: region.len(),
            });
        }
        let state = region.as_ptr().cast::<RingState>();
        let shared = SharedState {
            _region: region,
            state,
        };
        if shared._region.created() {
            // The block arrived zero-filled; only the configuration
            // defaults are missing.
            shared.header().config.init_defaults();
            tracing::info!("ring state initialized with default configuration");
        } else {
            tracing::info!("attached to existing ring state");
        }
        Ok(Self {
            shared: Some(shared),
            reader: DelayLineReader,
        })
    }

    /// A link with no backing region; every operation is a safe no-op.
    pub fn disconnected() -> Self {
        Self {
            shared: None,
            reader: DelayLineReader,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.shared.is_some()
    }

    /// Writes one block into the ring, mixing feedback into the resident
    /// content. `right` may be omitted for mono sources, in which case the
    /// left samples are duplicated into the right channel.
    ///
    /// Contract: called only by the single designated writer (the Send
    /// instance), at most once concurrently. No allocation, no locks,
    /// bounded work proportional to the block length.
    pub fn write(&self, left: &[f32], right: Option<&[f32]>) {
        let Some(shared) = &self.shared else {
            return;
        };
        let n = left.len();
        if n == 0 {
            return;
        }
        debug_assert!(right.map_or(true, |r| r.len() == n));

        let header = shared.header();
        let write_pos = header.write_pos.load(Ordering::Acquire) as usize;
        let feedback = header.config.feedback();
        let anti_feedback = header.config.anti_feedback();
        let (left_ch, right_ch) = shared.channels();

        for i in 0..n {
            let idx = (write_pos + i) & MASK;
            let in_l = left[i];
            let in_r = right.map_or(in_l, |r| r[i]);
            // SAFETY: idx < CAPACITY by the mask; the channel pointers cover
            // CAPACITY slots inside the live mapping. Volatile accesses keep
            // the compiler from caching slots the peer process may read.
            unsafe {
                let slot_l = left_ch.add(idx);
                let slot_r = right_ch.add(idx);
                let resident_l = slot_l.read_volatile();
                let resident_r = slot_r.read_volatile();
                slot_l.write_volatile(mix_feedback(in_l, resident_l, feedback, anti_feedback));
                slot_r.write_volatile(mix_feedback(in_r, resident_r, feedback, anti_feedback));
            }
        }

        // Release so a reader observing the advanced cursor also observes
        // the samples stored above.
        header
            .write_pos
            .store(((write_pos + n) & MASK) as u32, Ordering::Release);
        header.total_written.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Reads one block of delayed audio. Fills the destinations with silence
    /// without touching the read cursor when the link is degraded, playback
    /// is stopped, or the ring has not yet buffered enough history for the
    /// configured delay.
    ///
    /// Contract: called only by the single designated reader (the Return
    /// instance), at most once concurrently.
    pub fn read(
        &self,
        left: &mut [f32],
        mut right: Option<&mut [f32]>,
        sample_rate: f64,
        is_playing: bool,
    ) {
        let n = left.len();
        let Some(shared) = &self.shared else {
            silence(left, right);
            return;
        };
        if !is_playing || n == 0 {
            silence(left, right);
            return;
        }

        let header = shared.header();
        let write_pos = header.write_pos.load(Ordering::Acquire) as usize;
        let read_pos = header.read_pos.load(Ordering::Acquire) as usize;
        let delay_ms = header.config.delay_ms();

        let plan = self.reader.plan(write_pos, read_pos, delay_ms, sample_rate);
        if plan.underrun() {
            silence(left, right);
            return;
        }

        let (left_ch, right_ch) = shared.channels();
        for i in 0..n {
            let idx = (plan.target + i) & MASK;
            // SAFETY: idx < CAPACITY by the mask; pointers cover CAPACITY
            // slots inside the live mapping.
            unsafe {
                left[i] = left_ch.add(idx).read_volatile();
                if let Some(r) = right.as_deref_mut() {
                    r[i] = right_ch.add(idx).read_volatile();
                }
            }
        }

        header
            .read_pos
            .store(((plan.target + n) & MASK) as u32, Ordering::Release);
        header.total_read.fetch_add(n as u64, Ordering::Relaxed);
    }

    // -- configuration (Return instance's UI/parameter layer) --

    pub fn set_delay_ms(&self, ms: f32) {
        if let Some(shared) = &self.shared {
            shared.header().config.set_delay_ms(ms);
        }
    }

    pub fn set_feedback(&self, amount: f32) {
        if let Some(shared) = &self.shared {
            shared.header().config.set_feedback(amount);
        }
    }

    pub fn set_anti_feedback(&self, enabled: bool) {
        if let Some(shared) = &self.shared {
            shared.header().config.set_anti_feedback(enabled);
        }
    }

    pub fn set_smoothing(&self, amount: f32) {
        if let Some(shared) = &self.shared {
            shared.header().config.set_smoothing(amount);
        }
    }
}

fn silence(left: &mut [f32], right: Option<&mut [f32]>) {
    left.fill(0.0);
    if let Some(r) = right {
        r.fill(0.0);
    }
}
