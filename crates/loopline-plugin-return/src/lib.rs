//! Loopline Return – consumer side of the cross-process loopback.
//!
//! Sits on a different mixer channel (usually in a different process) from
//! the Send instance, replaces its input with the delayed stream out of the
//! shared ring, and owns the user-facing controls: delay time, feedback,
//! anti-feedback, manual stop, and the clear/fade maintenance actions.
//!
//! Host transport state is deliberately ignored: hosts report it too
//! inconsistently to gate the stream on, so playback is only ever stopped by
//! the manual stop control.

mod state;

use std::sync::atomic::{AtomicBool, Ordering};

use loopline_core::{LoopbackLink, DELAY_MS_DEFAULT, DELAY_MS_MAX, DELAY_MS_MIN};
use loopline_plugin_sdk::prelude::*;

pub use state::{SessionState, STATE_SIZE};

pub const PARAM_DELAY_MS: &str = "delayMs";
pub const PARAM_FEEDBACK: &str = "feedback";
pub const PARAM_ANTI_FEEDBACK: &str = "antiFeedback";

/// Nudges the first sample of a block so hosts with silence detection never
/// smart-disable the plugin while the ring is warming up.
const KEEPALIVE_OFFSET: f32 = 1e-7;

pub struct ReturnProcessor {
    link: LoopbackLink,
    params: ParameterSet,
    manual_stop: AtomicBool,
    sample_rate: f64,
}

impl ReturnProcessor {
    pub fn new() -> Self {
        let link = LoopbackLink::connect();
        if !link.is_connected() {
            tracing::warn!("return instance running without a shared region");
        }
        Self::build(link)
    }

    /// Builds the processor over an explicit link, used by tests.
    pub fn with_link(link: LoopbackLink) -> Self {
        Self::build(link)
    }

    fn build(link: LoopbackLink) -> Self {
        Self {
            link,
            params: Self::parameter_layout(),
            manual_stop: AtomicBool::new(false),
            sample_rate: 44_100.0,
        }
    }

    fn parameter_layout() -> ParameterSet {
        ParameterSet::new(vec![
            ParameterDefinition::new(
                PARAM_DELAY_MS,
                "Buffer Length",
                ParameterKind::continuous(DELAY_MS_MIN..=DELAY_MS_MAX, DELAY_MS_DEFAULT),
            )
            .with_unit("ms"),
            ParameterDefinition::new(
                PARAM_FEEDBACK,
                "Feedback",
                ParameterKind::continuous(0.0..=95.0, 0.0),
            )
            .with_unit("%"),
            ParameterDefinition::new(
                PARAM_ANTI_FEEDBACK,
                "Anti-Feedback",
                ParameterKind::Toggle { default: false },
            ),
        ])
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    /// Stores a parameter value (clamped into range) for the next block.
    pub fn set_parameter(&mut self, id: &str, value: ParameterValue) {
        if let Err(err) = self.params.set(&id.into(), value) {
            tracing::warn!(%err, id, "ignoring parameter update");
        }
    }

    /// Engages or releases the manual stop. Stopped, the processor emits
    /// silence and leaves the ring untouched so audio resumes where it left
    /// off.
    pub fn set_manual_stop(&self, stop: bool) {
        self.manual_stop.store(stop, Ordering::Relaxed);
    }

    pub fn manual_stop(&self) -> bool {
        self.manual_stop.load(Ordering::Relaxed)
    }

    // -- maintenance, wired to editor buttons (UI thread, not audio) --

    pub fn clear_buffer(&self) {
        self.link.clear_buffer();
    }

    pub fn fade_out_buffer(&self, fade_ms: f32) {
        self.link.fade_out_buffer(fade_ms, self.sample_rate);
    }

    // -- telemetry for the editor's meters --

    pub fn num_available(&self) -> usize {
        self.link.num_available()
    }

    pub fn total_written(&self) -> u64 {
        self.link.total_written()
    }

    pub fn total_read(&self) -> u64 {
        self.link.total_read()
    }

    // -- session persistence --

    pub fn save_state(&self) -> Vec<u8> {
        SessionState {
            delay_ms: self.param_f32(PARAM_DELAY_MS, DELAY_MS_DEFAULT),
            feedback_percent: self.param_f32(PARAM_FEEDBACK, 0.0),
            anti_feedback: self.param_bool(PARAM_ANTI_FEEDBACK),
        }
        .encode()
    }

    /// Restores a saved blob. Values pass through the same clamps as live
    /// parameter changes; malformed blobs are ignored.
    pub fn load_state(&mut self, bytes: &[u8]) {
        let Some(state) = SessionState::decode(bytes) else {
            tracing::warn!(len = bytes.len(), "discarding malformed session state");
            return;
        };
        self.set_parameter(PARAM_DELAY_MS, ParameterValue::Continuous(state.delay_ms));
        self.set_parameter(
            PARAM_FEEDBACK,
            ParameterValue::Continuous(state.feedback_percent),
        );
        self.set_parameter(
            PARAM_ANTI_FEEDBACK,
            ParameterValue::Toggle(state.anti_feedback),
        );
    }

    fn param_f32(&self, id: &str, fallback: f32) -> f32 {
        self.params.get(&id.into()).map_or(fallback, |v| v.as_f32())
    }

    fn param_bool(&self, id: &str) -> bool {
        self.params.get(&id.into()).is_some_and(|v| v.as_bool())
    }

    /// Pushes the current parameter values into the shared config channel.
    fn publish_config(&self) {
        self.link
            .set_delay_ms(self.param_f32(PARAM_DELAY_MS, DELAY_MS_DEFAULT));
        self.link
            .set_feedback(self.param_f32(PARAM_FEEDBACK, 0.0) / 100.0);
        self.link
            .set_anti_feedback(self.param_bool(PARAM_ANTI_FEEDBACK));
    }
}

impl Default for ReturnProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioProcessor for ReturnProcessor {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new("com.loopline.return", "Loopline Return", "Loopline")
            .with_description("Plays the cross-process loopback ring back with delay and feedback")
    }

    fn prepare(&mut self, config: &BufferConfig) -> anyhow::Result<()> {
        self.sample_rate = config.sample_rate;
        Ok(())
    }

    fn process(&mut self, buffer: &mut AudioBuffer) -> anyhow::Result<()> {
        buffer.clear();
        self.publish_config();

        let playing = !self.manual_stop.load(Ordering::Relaxed);
        let sample_rate = self.sample_rate;
        let (left, mut right) = buffer.split_stereo();
        self.link.read(left, right.as_deref_mut(), sample_rate, playing);

        if playing && !left.is_empty() {
            left[0] += KEEPALIVE_OFFSET;
            if let Some(r) = right {
                if !r.is_empty() {
                    r[0] += KEEPALIVE_OFFSET;
                }
            }
        }
        Ok(())
    }
}
