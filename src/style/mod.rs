//! Voice style transfer
//!
//! A `StyleTransfer` turns an enhanced recording into a named voice style.
//! Styles resolve either to a built-in DSP preset or, when a bridge URL is
//! configured, to a remote style-transfer service.

mod bridge;
mod preset;

use tracing::debug;

use crate::config::StyleConfig;
use crate::engine::AudioBuffer;
use crate::error::Result;

pub use bridge::BridgeStyleTransfer;
pub use preset::{PresetRegistry, PresetStyle, DEFAULT_STYLE, OUTPUT_PEAK_DB};

/// Applies a voice style to audio
pub trait StyleTransfer {
    /// Style model name
    fn name(&self) -> &str;

    /// Produce the styled version of `audio`
    fn apply(&self, audio: &AudioBuffer) -> Result<AudioBuffer>;
}

/// Resolve a style model by name
///
/// With a bridge configured every name is forwarded to it and validated
/// remotely. Otherwise the name must match a built-in preset.
pub fn create_style(name: &str, config: &StyleConfig) -> Result<Box<dyn StyleTransfer>> {
    match &config.bridge_url {
        Some(url) => {
            debug!("Using style bridge at {} for '{}'", url, name);
            Ok(Box::new(BridgeStyleTransfer::new(
                name,
                url,
                config.bridge_timeout_ms,
            )))
        }
        None => {
            let preset = PresetRegistry::with_defaults().get(name)?;
            debug!("Using preset style '{}'", preset.name());
            Ok(Box::new(preset))
        }
    }
}
