//! Offline rendering of a session to a WAV file.
//!
//! Every connected track is fed a sine at its own pitch, so the rendered
//! file shows what the session's faders, pans, mutes, solos and groups do
//! to a known mix.

use anyhow::Context;
use clap::Args;
use hound::{SampleFormat, WavSpec, WavWriter};
use indicatif::{ProgressBar, ProgressStyle};
use rackmix_config::Session;
use rackmix_core::{Snapshot, VuLevels, linear_to_db};
use rackmix_mixer::{ChannelId, METER_STRIDE, Mixer, MixerInputs, MixerOutputs};
use std::f32::consts::TAU;
use std::path::{Path, PathBuf};

/// Pitch of track 1; each following track sits a fourth higher.
const BASE_HZ: f32 = 110.0;

/// Volts mapped to digital full scale (the master clip ceiling).
const FULL_SCALE_V: f32 = 10.0;

const PROGRESS_CHUNK: usize = 4096;

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Session file (TOML); a default full-size mixer when omitted
    #[arg(short, long)]
    session: Option<PathBuf>,

    /// Length of the render in seconds
    #[arg(long, default_value = "5.0")]
    seconds: f32,

    /// Override the session sample rate
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Number of tracks fed a test tone (default: all)
    #[arg(long)]
    sources: Option<usize>,

    /// Peak voltage of each test tone
    #[arg(long, default_value = "5.0")]
    level: f32,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,
}

/// Sine oscillators driving the track inputs.
pub struct ToneBank {
    phases: Vec<f32>,
    increments: Vec<f32>,
    level: f32,
}

impl ToneBank {
    /// `count` oscillators at `level` volts peak.
    pub fn new(count: usize, level: f32, sample_rate: f32) -> Self {
        Self {
            phases: vec![0.0; count],
            increments: (0..count).map(|i| source_frequency(i) / sample_rate).collect(),
            level,
        }
    }

    /// Write the next sample of every oscillator into its track's left jack.
    pub fn feed(&mut self, inputs: &mut MixerInputs) {
        let voices = self.phases.iter_mut().zip(&self.increments);
        for ((phase, inc), ports) in voices.zip(&mut inputs.tracks) {
            ports.left.set(self.level * (TAU * *phase).sin());
            *phase += inc;
            if *phase >= 1.0 {
                *phase -= 1.0;
            }
        }
    }
}

/// Test-tone frequency of track `index`.
pub fn source_frequency(index: usize) -> f32 {
    BASE_HZ * 2.0f32.powf(index as f32 * 5.0 / 12.0)
}

/// Run `frames` frames through `mixer`, returning the main output in volts.
pub fn render(
    mixer: &mut Mixer,
    tones: &mut ToneBank,
    frames: usize,
    mut progress: impl FnMut(usize),
) -> Vec<(f32, f32)> {
    let layout = *mixer.layout();
    let mut inputs = MixerInputs::new(&layout);
    let mut outputs = MixerOutputs::new(&layout);
    let mut out = Vec::with_capacity(frames);

    for i in 0..frames {
        tones.feed(&mut inputs);
        mixer.process(&inputs, &mut outputs);
        out.push(outputs.main);
        if (i + 1) % PROGRESS_CHUNK == 0 {
            progress(i + 1);
        }
    }
    progress(frames);
    out
}

/// Peak and RMS of one channel, in volts.
pub fn channel_stats(samples: impl Iterator<Item = f32>) -> (f32, f32) {
    let mut peak = 0.0f32;
    let mut sum = 0.0f64;
    let mut n = 0usize;
    for s in samples {
        peak = peak.max(s.abs());
        sum += f64::from(s * s);
        n += 1;
    }
    let rms = if n == 0 { 0.0 } else { (sum / n as f64).sqrt() as f32 };
    (peak, rms)
}

fn write_output(
    path: &Path,
    samples: &[(f32, f32)],
    sample_rate: u32,
    bit_depth: u16,
) -> anyhow::Result<()> {
    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: bit_depth,
        sample_format: if bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };
    let mut writer = WavWriter::create(path, spec)?;

    if bit_depth == 32 {
        for &(l, r) in samples {
            writer.write_sample(l / FULL_SCALE_V)?;
            writer.write_sample(r / FULL_SCALE_V)?;
        }
    } else {
        let max_val = (1i32 << (bit_depth - 1)) as f32;
        let quantize = |v: f32| (v / FULL_SCALE_V * max_val).clamp(-max_val, max_val - 1.0) as i32;
        for &(l, r) in samples {
            writer.write_sample(quantize(l))?;
            writer.write_sample(quantize(r))?;
        }
    }

    writer.finalize()?;
    Ok(())
}

fn print_meters(mixer: &Mixer) {
    let cell = mixer.meters();
    let mut snapshot = Snapshot::for_cell(&cell);
    if !cell.try_read(&mut snapshot) || snapshot.version == 0 {
        return;
    }
    let Some(offset) = mixer.meter_offset(ChannelId::Master) else {
        return;
    };
    let mut levels = [0.0; METER_STRIDE];
    levels.copy_from_slice(&snapshot.values[offset..offset + METER_STRIDE]);
    let vu = VuLevels::from_array(levels);
    println!(
        "  Master meter: peak {:.2} V / {:.2} V, RMS {:.2} V / {:.2} V",
        vu.peak_l, vu.peak_r, vu.rms_l, vu.rms_r
    );
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if !matches!(args.bit_depth, 16 | 24 | 32) {
        anyhow::bail!("Unsupported bit depth {} (expected 16, 24, or 32)", args.bit_depth);
    }
    if args.seconds.is_nan() || args.seconds <= 0.0 {
        anyhow::bail!("--seconds must be positive");
    }

    let mut session = match &args.session {
        Some(path) => {
            println!("Loading {}...", path.display());
            Session::load(path).with_context(|| format!("loading session {}", path.display()))?
        }
        None => Session::default(),
    };
    if let Some(sr) = args.sample_rate {
        session.sample_rate = sr;
    }

    for issue in session.issues() {
        tracing::warn!(%issue, "session value will be clamped or ignored");
    }

    let mut mixer = session.build_mixer()?;
    let layout = *mixer.layout();
    let sample_rate = session.sample_rate;
    let frames = (args.seconds * sample_rate as f32) as usize;
    let sources = args.sources.unwrap_or(layout.tracks).min(layout.tracks);

    println!(
        "Session '{}': {} tracks, {} groups, {} aux returns at {} Hz",
        session.name, layout.tracks, layout.groups, layout.auxes, sample_rate
    );
    println!(
        "Rendering {:.2}s with {} test tone(s) ({:.0} Hz to {:.0} Hz)...",
        args.seconds,
        sources,
        source_frequency(0),
        source_frequency(sources.saturating_sub(1))
    );

    let pb = ProgressBar::new(frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let mut tones = ToneBank::new(sources, args.level, sample_rate as f32);
    let output = render(&mut mixer, &mut tones, frames, |pos| pb.set_position(pos as u64));
    pb.finish_with_message("done");

    let (peak_l, rms_l) = channel_stats(output.iter().map(|s| s.0));
    let (peak_r, rms_r) = channel_stats(output.iter().map(|s| s.1));
    println!("\nStats (dBFS, {FULL_SCALE_V} V = 0 dB):");
    println!(
        "  Left:  RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(rms_l / FULL_SCALE_V),
        linear_to_db(peak_l / FULL_SCALE_V)
    );
    println!(
        "  Right: RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(rms_r / FULL_SCALE_V),
        linear_to_db(peak_r / FULL_SCALE_V)
    );
    print_meters(&mixer);

    println!("\nWriting {}...", args.output.display());
    write_output(&args.output, &output, sample_rate, args.bit_depth)?;
    tracing::info!(frames, path = %args.output.display(), "render complete");
    println!("Done!");

    Ok(())
}
