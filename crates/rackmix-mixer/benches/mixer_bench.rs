//! Criterion benchmarks for the rackmix mixer engine
//!
//! Run with: cargo bench -p rackmix-mixer
#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rackmix_core::Jack;
use rackmix_mixer::{EcoMode, Mixer, MixerInputs, MixerLayout, MixerOutputs, StereoPanLaw};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZE: usize = 256;

fn loaded_mixer(layout: MixerLayout) -> (Mixer, MixerInputs) {
    let mut mixer = Mixer::new(layout, SAMPLE_RATE).expect("valid layout");
    mixer.global_mut().pan_law_stereo = StereoPanLaw::TruePan;
    let params = Arc::clone(mixer.params());
    let map = mixer.param_map().clone();
    let mut inputs: MixerInputs = MixerInputs::new(&layout);
    for (t, ports) in inputs.tracks.iter_mut().enumerate() {
        ports.left = Jack::mono(0.5);
        if t % 2 == 0 {
            ports.right = Jack::mono(-0.5);
        }
        params.set(map.tracks[t].strip.pan, t as f32 / layout.tracks as f32);
        params.set(map.tracks[t].group, (t % (layout.groups + 1)) as f32);
    }
    for ports in &mut inputs.auxes {
        ports.left = Jack::mono(0.1);
    }
    (mixer, inputs)
}

fn bench_full_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("MixerFrame");

    for (name, layout) in [("junior", MixerLayout::JUNIOR), ("full", MixerLayout::FULL)] {
        for divisor in [1, 4, 32] {
            group.bench_with_input(BenchmarkId::new(name, divisor), &divisor, |b, &divisor| {
                let (mut mixer, inputs) = loaded_mixer(layout);
                mixer.global_mut().eco_mode = EcoMode::from_divisor(divisor);
                let mut outputs = MixerOutputs::new(&layout);
                b.iter(|| {
                    for _ in 0..BLOCK_SIZE {
                        mixer.process(black_box(&inputs), &mut outputs);
                    }
                    black_box(outputs.main)
                });
            });
        }
    }

    group.finish();
}

fn bench_solo_and_links(c: &mut Criterion) {
    let mut group = c.benchmark_group("ControlPlane");

    group.bench_function("soloed_linked_full", |b| {
        let layout = MixerLayout::FULL;
        let (mut mixer, inputs) = loaded_mixer(layout);
        let params = Arc::clone(mixer.params());
        let map = mixer.param_map().clone();
        params.set_bool(map.tracks[3].strip.solo, true);
        params.set_bool(map.groups[1].solo, true);
        mixer.global_mut().set_link_bit_mask(0xFF);
        mixer.global_mut().eco_mode = EcoMode::OFF;
        let mut outputs = MixerOutputs::new(&layout);
        let mut fader = 0.0f32;
        b.iter(|| {
            fader = (fader + 0.01) % 1.0;
            params.set(map.tracks[0].strip.fader, fader);
            for _ in 0..BLOCK_SIZE {
                mixer.process(&inputs, &mut outputs);
            }
            black_box(outputs.main)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_full_frame, bench_solo_and_links);
criterion_main!(benches);
