//! Loopline Plugin SDK
//! ====================
//!
//! Shared abstractions for the Loopline Send and Return processors: the
//! [`AudioProcessor`] trait host shells drive, the non-interleaved
//! [`AudioBuffer`] they exchange, and parameter definitions with
//! clamp-on-write validation.

mod buffer;
mod parameters;
mod processor;

pub use buffer::{AudioBuffer, BufferConfig, ChannelLayout};
pub use parameters::{
    ParameterDefinition, ParameterId, ParameterKind, ParameterSet, ParameterValue,
    PluginParameterError,
};
pub use processor::{AudioProcessor, PluginDescriptor, PluginError};

/// Common imports for the plugin crates.
pub mod prelude {
    pub use crate::{
        AudioBuffer, AudioProcessor, BufferConfig, ChannelLayout, ParameterDefinition,
        ParameterId, ParameterKind, ParameterSet, ParameterValue, PluginDescriptor,
    };
}
