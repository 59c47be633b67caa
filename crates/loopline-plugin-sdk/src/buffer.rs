use serde::{Deserialize, Serialize};

/// Channel configuration a processor can be asked to run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    pub fn channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }
}

/// Configuration handed to processors during preparation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BufferConfig {
    pub sample_rate: f64,
    pub block_size: usize,
    pub layout: ChannelLayout,
}

impl BufferConfig {
    pub fn new(sample_rate: f64, block_size: usize, layout: ChannelLayout) -> Self {
        Self {
            sample_rate,
            block_size,
            layout,
        }
    }
}

/// Non-interleaved audio block passed through the processing chain.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    pub fn new(num_channels: usize, block_size: usize) -> Self {
        let channels = (0..num_channels).map(|_| vec![0.0; block_size]).collect();
        Self { channels }
    }

    pub fn from_config(config: &BufferConfig) -> Self {
        Self::new(config.layout.channels(), config.block_size)
    }

    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn len(&self) -> usize {
        self.channels
            .first()
            .map(|channel| channel.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    /// Left channel plus an optional right channel, the shape the loopback
    /// link's write/read calls want.
    pub fn split_stereo(&mut self) -> (&mut [f32], Option<&mut [f32]>) {
        match self.channels.split_first_mut() {
            Some((left, rest)) => (left.as_mut_slice(), rest.first_mut().map(Vec::as_mut_slice)),
            None => (&mut [], None),
        }
    }

    pub fn as_slice(&self) -> &[Vec<f32>] {
        &self.channels
    }
}
