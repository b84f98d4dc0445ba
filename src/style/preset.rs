//! Built-in DSP voice presets
//!
//! Each preset is a fixed EQ + compressor chain followed by peak
//! normalisation, so every preset leaves the output at the same peak level.

use std::collections::BTreeMap;

use super::StyleTransfer;
use crate::dsp::{Compressor, CompressorParams, EQBand, EffectChain, ParametricEQ};
use crate::engine::AudioBuffer;
use crate::error::{Result, StudioError};

/// Style used when none is requested
pub const DEFAULT_STYLE: &str = "professional-male";

/// Peak level of every preset's output (dBFS)
pub const OUTPUT_PEAK_DB: f32 = -1.0;

/// A named EQ + compression voice treatment
#[derive(Debug, Clone)]
pub struct PresetStyle {
    name: String,
    description: String,
    bands: Vec<EQBand>,
    compressor: CompressorParams,
}

impl PresetStyle {
    /// Create a preset, validating the EQ bands and compressor settings
    pub fn new(
        name: &str,
        description: &str,
        bands: Vec<EQBand>,
        compressor: CompressorParams,
    ) -> Result<Self> {
        for band in &bands {
            band.validate()?;
        }
        compressor.validate()?;
        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            bands,
            compressor,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn bands(&self) -> &[EQBand] {
        &self.bands
    }

    pub fn compressor(&self) -> &CompressorParams {
        &self.compressor
    }

    fn build_chain(&self) -> Result<EffectChain> {
        Ok(EffectChain::new()
            .with(Box::new(ParametricEQ::with_bands(self.bands.clone())?))
            .with(Box::new(Compressor::with_params(self.compressor.clone())?)))
    }
}

impl StyleTransfer for PresetStyle {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, audio: &AudioBuffer) -> Result<AudioBuffer> {
        let mut chain = self.build_chain()?;
        let mut output = audio.clone();
        chain.prepare(output.sample_rate);
        chain.process(&mut output)?;
        output.normalize_peak(OUTPUT_PEAK_DB);
        Ok(output)
    }
}

/// Lookup table of presets by name
#[derive(Debug, Clone, Default)]
pub struct PresetRegistry {
    presets: BTreeMap<String, PresetStyle>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the five shipped presets
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for preset in default_presets() {
            registry.register(preset);
        }
        registry
    }

    /// Add a preset, replacing any preset with the same name
    pub fn register(&mut self, preset: PresetStyle) {
        self.presets.insert(preset.name.clone(), preset);
    }

    /// Clone out a preset by name
    pub fn get(&self, name: &str) -> Result<PresetStyle> {
        self.presets
            .get(name)
            .cloned()
            .ok_or_else(|| StudioError::UnknownStyle {
                style: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Registered preset names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

fn compressor(threshold_db: f32, ratio: f32, attack_ms: f32, release_ms: f32) -> CompressorParams {
    CompressorParams {
        threshold_db,
        ratio,
        attack_ms,
        release_ms,
        knee_db: 6.0,
        makeup_gain_db: 0.0,
    }
}

fn default_presets() -> Vec<PresetStyle> {
    let definitions = vec![
        (
            "professional-male",
            "Tight low end, presence lift and steady level for male voices",
            vec![
                EQBand::high_pass(80.0),
                EQBand::peak(250.0, -2.0, 1.2),
                EQBand::peak(3500.0, 3.0, 1.0),
                EQBand::high_shelf(10000.0, 1.5),
            ],
            compressor(-20.0, 3.0, 10.0, 120.0),
        ),
        (
            "professional-female",
            "Clear mids and air with gentle compression for female voices",
            vec![
                EQBand::high_pass(120.0),
                EQBand::peak(400.0, -2.0, 1.2),
                EQBand::peak(5000.0, 2.5, 1.0),
                EQBand::high_shelf(12000.0, 2.0),
            ],
            compressor(-20.0, 3.0, 8.0, 100.0),
        ),
        (
            "warm-narrator",
            "Full low mids and soft highs for long-form narration",
            vec![
                EQBand::high_pass(60.0),
                EQBand::low_shelf(200.0, 3.0),
                EQBand::peak(3000.0, -1.5, 1.0),
                EQBand::high_shelf(8000.0, -2.0),
            ],
            compressor(-24.0, 2.5, 15.0, 200.0),
        ),
        (
            "broadcast",
            "Forward, dense radio sound with heavy compression",
            vec![
                EQBand::high_pass(90.0),
                EQBand::low_shelf(150.0, 2.0),
                EQBand::peak(2500.0, 4.0, 0.9),
                EQBand::high_shelf(9000.0, 2.0),
            ],
            compressor(-26.0, 6.0, 3.0, 80.0),
        ),
        (
            "telephone",
            "Narrow 300 Hz to 3.4 kHz band-limited phone line",
            vec![
                EQBand::high_pass(300.0),
                EQBand::high_pass(300.0),
                EQBand::peak(1500.0, 4.0, 1.5),
                EQBand::low_pass(3400.0),
                EQBand::low_pass(3400.0),
            ],
            compressor(-18.0, 8.0, 2.0, 60.0),
        ),
    ];

    definitions
        .into_iter()
        .filter_map(|(name, description, bands, comp)| {
            PresetStyle::new(name, description, bands, comp).ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{calculate_peak, calculate_rms, generate_test_tone, INTERNAL_SAMPLE_RATE};
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    #[test]
    fn test_all_presets_registered() {
        let registry = PresetRegistry::with_defaults();
        assert_eq!(
            registry.names(),
            vec![
                "broadcast",
                "professional-female",
                "professional-male",
                "telephone",
                "warm-narrator"
            ]
        );
    }

    #[test_case("professional-male")]
    #[test_case("professional-female")]
    #[test_case("warm-narrator")]
    #[test_case("broadcast")]
    #[test_case("telephone")]
    fn test_preset_output_is_peak_normalised(name: &str) {
        let mut audio = generate_test_tone(1000.0, 0.5, INTERNAL_SAMPLE_RATE);
        audio.apply_gain(-12.0);

        let styled = PresetRegistry::with_defaults()
            .get(name)
            .unwrap()
            .apply(&audio)
            .unwrap();

        assert_eq!(styled.len(), audio.len());
        assert!(styled.is_finite());
        assert_abs_diff_eq!(calculate_peak(&styled), OUTPUT_PEAK_DB, epsilon = 0.01);
    }

    #[test]
    fn test_telephone_removes_low_frequencies() {
        let audio = generate_test_tone(100.0, 0.5, INTERNAL_SAMPLE_RATE);
        let low = PresetRegistry::with_defaults()
            .get("telephone")
            .unwrap()
            .build_chain()
            .and_then(|mut chain| {
                let mut out = audio.clone();
                chain.process(&mut out)?;
                Ok(out)
            })
            .unwrap();

        assert!(calculate_rms(&low) < calculate_rms(&audio) - 20.0);
    }

    #[test]
    fn test_silence_stays_silent() {
        let silent = AudioBuffer::new(4800, crate::engine::ChannelLayout::Mono);
        let styled = PresetRegistry::with_defaults()
            .get(DEFAULT_STYLE)
            .unwrap()
            .apply(&silent)
            .unwrap();
        assert_eq!(styled, silent);
    }

    #[test]
    fn test_invalid_preset_rejected() {
        let result = PresetStyle::new(
            "bad",
            "",
            vec![EQBand::peak(5.0, 0.0, 1.0)],
            CompressorParams::default(),
        );
        assert!(result.is_err());
    }
}
