use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buffer::{AudioBuffer, BufferConfig, ChannelLayout};

/// Metadata describing a plugin to a host shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub id: String,
    pub name: String,
    pub vendor: String,
    pub version: Option<String>,
    pub description: Option<String>,
}

impl PluginDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, vendor: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            vendor: vendor.into(),
            version: None,
            description: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Display for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.vendor)
    }
}

/// Errors a processor can report outside the audio path.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin reported an invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("plugin is not ready to process")]
    NotPrepared,
}

/// Audio processor trait implemented by the Send and Return plugins.
///
/// `process` runs on the host's real-time callback: implementations must not
/// lock, block, or allocate there. Failures inside the callback degrade to
/// silence instead of surfacing as errors.
pub trait AudioProcessor: Send + Sync {
    fn descriptor(&self) -> PluginDescriptor;

    fn prepare(&mut self, config: &BufferConfig) -> anyhow::Result<()>;

    fn process(&mut self, buffer: &mut AudioBuffer) -> anyhow::Result<()>;

    fn supports_layout(&self, layout: ChannelLayout) -> bool {
        matches!(layout, ChannelLayout::Mono | ChannelLayout::Stereo)
    }

    /// Processing latency in samples. The loopback path reports zero; the
    /// cross-process delay is the effect, not plugin latency to compensate.
    fn latency_samples(&self) -> usize {
        0
    }
}
