//! Loopline Send – producer side of the cross-process loopback.
//!
//! Sits on a mixer channel like any insert effect, copies every block into
//! the shared ring, and passes the audio through unchanged. All the
//! interesting state lives in the shared region; this crate is a thin shell
//! around [`LoopbackLink::write`].

use loopline_core::LoopbackLink;
use loopline_plugin_sdk::prelude::*;

pub struct SendProcessor {
    link: LoopbackLink,
}

impl SendProcessor {
    /// Connects to the shared region (creating it when this instance is the
    /// first plugin up). Construction never fails; without a region the
    /// processor is a plain pass-through.
    pub fn new() -> Self {
        let link = LoopbackLink::connect();
        if !link.is_connected() {
            tracing::warn!("send instance running without a shared region");
        }
        Self { link }
    }

    /// Builds the processor over an explicit link, used by tests.
    pub fn with_link(link: LoopbackLink) -> Self {
        Self { link }
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Lifetime sample count for the editor's activity indicator. The
    /// editor polls this on a timer and treats a changing value as "alive".
    pub fn total_written(&self) -> u64 {
        self.link.total_written()
    }
}

impl Default for SendProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioProcessor for SendProcessor {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new("com.loopline.send", "Loopline Send", "Loopline")
            .with_description("Writes the channel's audio into the cross-process loopback ring")
    }

    fn prepare(&mut self, _config: &BufferConfig) -> anyhow::Result<()> {
        Ok(())
    }

    fn process(&mut self, buffer: &mut AudioBuffer) -> anyhow::Result<()> {
        let (left, right) = buffer.split_stereo();
        self.link.write(left, right.as_deref());
        // Audio passes through unchanged.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopline_core::{FileBackedRegion, REGION_SIZE};

    fn processor(dir: &tempfile::TempDir) -> SendProcessor {
        let region = FileBackedRegion::acquire(&dir.path().join("ring.shm"), REGION_SIZE)
            .expect("region");
        SendProcessor::with_link(LoopbackLink::from_region(Box::new(region)).expect("link"))
    }

    #[test]
    fn process_leaves_audio_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut send = processor(&dir);

        let mut buffer = AudioBuffer::new(2, 64);
        for (i, sample) in buffer.channel_mut(0).iter_mut().enumerate() {
            *sample = i as f32;
        }
        let before = buffer.channel(0).to_vec();

        send.process(&mut buffer).expect("process");
        assert_eq!(buffer.channel(0), before.as_slice());
    }

    #[test]
    fn process_advances_the_shared_counters() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut send = processor(&dir);

        let mut buffer = AudioBuffer::new(2, 128);
        send.process(&mut buffer).expect("process");
        send.process(&mut buffer).expect("process");
        assert_eq!(send.total_written(), 256);
    }

    #[test]
    fn disconnected_processor_is_still_a_pass_through() {
        let mut send = SendProcessor::with_link(LoopbackLink::disconnected());
        assert!(!send.is_connected());

        let mut buffer = AudioBuffer::new(1, 32);
        buffer.channel_mut(0).fill(0.5);
        send.process(&mut buffer).expect("process");
        assert!(buffer.channel(0).iter().all(|&s| s == 0.5));
        assert_eq!(send.total_written(), 0);
    }
}
