//! Loopline core engine
//! =====================
//!
//! Cross-process, lock-free audio ring buffer shared by the Loopline Send
//! and Return plugins. A Send instance on one mixer channel writes each
//! audio block into an OS shared-memory region; a Return instance on another
//! channel (in a different process) reads it back with a configurable delay,
//! optional recirculating feedback, and a one-sample anti-feedback limiter.
//!
//! Real-time constraints: the block write/read paths never lock, never
//! block, and never allocate. Maintenance operations (clear, fade-out) are
//! linear in the buffer and belong on a UI thread.

#![deny(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod control;
pub mod delay;
pub mod layout;
pub mod link;
pub mod mixer;
pub mod region;
pub mod telemetry;

pub use config::{DELAY_MS_DEFAULT, DELAY_MS_MAX, DELAY_MS_MIN, FEEDBACK_MAX, SMOOTHING_MAX};
pub use delay::{DelayLineReader, ReadPlan, MAX_DELAY_SAMPLES, MIN_DELAY_SAMPLES};
pub use layout::{RingState, CAPACITY, REGION_KEY, REGION_SIZE};
pub use link::LoopbackLink;
pub use mixer::PEAK_CEILING;
pub use region::{CrossProcessRegion, FileBackedRegion, RegionError};
#[cfg(unix)]
pub use region::PosixShmRegion;
#[cfg(windows)]
pub use region::WindowsMappingRegion;
pub use telemetry::ActivitySnapshot;
