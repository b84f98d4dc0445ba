//! DSP Benchmarks
//!
//! Throughput of the voice-engine processing stages on 10 s of audio.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use voice_studio::dsp::PitchShifter;
use voice_studio::enhance::{noise_reduction_gate, EnhanceOptions, Enhancer, VoiceEnhancer};
use voice_studio::engine::{generate_test_tone, INTERNAL_SAMPLE_RATE};
use voice_studio::features::{MelConfig, MelFilterbank};
use voice_studio::style::{PresetRegistry, StyleTransfer};

fn benchmark_enhance(c: &mut Criterion) {
    let audio = generate_test_tone(220.0, 10.0, INTERNAL_SAMPLE_RATE);
    let enhancer = VoiceEnhancer::new();
    let options = EnhanceOptions {
        noise_reduction: true,
        pitch_shift: 3.0,
    };

    c.bench_function("enhance_gate_pitch_10s", |b| {
        b.iter(|| enhancer.process(black_box(&audio), &options).unwrap())
    });
}

fn benchmark_components(c: &mut Criterion) {
    let audio = generate_test_tone(220.0, 10.0, INTERNAL_SAMPLE_RATE);

    c.bench_function("noise_gate_setup_10s", |b| {
        b.iter(|| noise_reduction_gate(black_box(&audio)).unwrap())
    });
    c.bench_function("pitch_shifter_new", |b| {
        b.iter(|| PitchShifter::new(black_box(-5.0)).unwrap())
    });
}

fn benchmark_presets(c: &mut Criterion) {
    let audio = generate_test_tone(220.0, 10.0, INTERNAL_SAMPLE_RATE);
    let registry = PresetRegistry::with_defaults();

    for name in ["professional-male", "telephone"] {
        let preset = registry.get(name).unwrap();
        c.bench_function(&format!("preset_{}_10s", name), |b| {
            b.iter(|| preset.apply(black_box(&audio)).unwrap())
        });
    }
}

fn benchmark_mel(c: &mut Criterion) {
    let config = MelConfig::default();
    let samples = generate_test_tone(220.0, 10.0, config.sample_rate).to_mono();
    let filterbank = MelFilterbank::new(config).unwrap();

    c.bench_function("log_mel_10s", |b| {
        b.iter(|| filterbank.compute_log(black_box(&samples)))
    });
}

criterion_group!(
    benches,
    benchmark_enhance,
    benchmark_components,
    benchmark_presets,
    benchmark_mel
);
criterion_main!(benches);
