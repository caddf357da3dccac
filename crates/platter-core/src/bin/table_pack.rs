//! Generate the binary tables the visualization engine loads at runtime
//!
//! Usage: `table-pack <input.wav> <output-dir>`
//!
//! Produces three files in the output directory:
//!
//! - `<stem>.dat` - min/max waveform envelope of the input track
//! - `fir.dat`    - Kaiser-windowed sinc interpolation kernel
//! - `cqt.dat`    - sparse constant-Q compression matrix for the track's
//!                  sample rate

use std::path::Path;

use anyhow::{bail, Context, Result};

use platter_core::dsp::generate::{
    constant_q_matrix, quantize_envelope_16, sinc_kernel, waveform_envelope,
};
use platter_core::table::writer::{encode_cqt, encode_fir, encode_waveform, WaveformPayload};
use platter_core::SAMPLE_RATE;

/// Envelope resolution: one min/max pair per this many source frames
const SAMPLES_PER_PIXEL: usize = 512;

/// Kernel shape matching the runtime resampler's expectations
const NUM_CROSSINGS: u32 = 9;
const SAMPLES_PER_CROSSING: u32 = 32;
const CUTOFF_CYCLE: f32 = 0.9;
const KAISER_BETA: f32 = 6.0;

/// Constant-Q geometry: quarter-tone bins from low C up to the top of the
/// audible range (capped below Nyquist for low-rate material)
const FFT_SIZE: usize = 2048;
const BINS_PER_OCTAVE: u32 = 24;
const MIN_FREQ: f32 = 32.7;
const MAX_FREQ: f32 = 16000.0;
const SPARSITY_THRESHOLD: f32 = 1e-4;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        bail!("usage: table-pack <input.wav> <output-dir>");
    }
    let input = Path::new(&args[1]);
    let out_dir = Path::new(&args[2]);
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {:?}", out_dir))?;

    let (samples, sample_rate, channels) =
        read_wav_mono(input).with_context(|| format!("reading {:?}", input))?;
    log::info!(
        "[PACK] {:?}: {} frames at {} Hz ({} channels)",
        input,
        samples.len(),
        sample_rate,
        channels
    );
    if sample_rate != SAMPLE_RATE {
        log::warn!(
            "[PACK] {} Hz input; analysis assumes {} Hz, so the constant-Q table will only fit tracks at this rate",
            sample_rate,
            SAMPLE_RATE
        );
    }

    // waveform envelope
    let pairs = waveform_envelope(&samples, SAMPLES_PER_PIXEL);
    let quantized = quantize_envelope_16(&pairs);
    let waveform_bytes = encode_waveform(
        1,
        sample_rate as i32,
        SAMPLES_PER_PIXEL as i32,
        channels as i32,
        WaveformPayload::Bits16(&quantized),
    );
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("track");
    write_table(&out_dir.join(format!("{}.dat", stem)), &waveform_bytes)?;

    // interpolation kernel
    let kernel = sinc_kernel(NUM_CROSSINGS, SAMPLES_PER_CROSSING, CUTOFF_CYCLE, KAISER_BETA)?;
    write_table(&out_dir.join("fir.dat"), &encode_fir(&kernel))?;

    // constant-Q matrix for this track's rate
    let nyquist = sample_rate as f32 / 2.0;
    let matrix = constant_q_matrix(
        sample_rate,
        FFT_SIZE,
        BINS_PER_OCTAVE,
        MIN_FREQ,
        MAX_FREQ.min(nyquist * 0.95),
        SPARSITY_THRESHOLD,
    )?;
    write_table(&out_dir.join("cqt.dat"), &encode_cqt(&matrix))?;

    Ok(())
}

/// Decode a WAV file to mono float samples
fn read_wav_mono(path: &Path) -> Result<(Vec<f32>, u32, u16)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1);

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mono: Vec<f32> = interleaved
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok((mono, spec.sample_rate, channels))
}

fn write_table(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {:?}", path))?;
    log::info!("[PACK] wrote {:?} ({} bytes)", path, bytes.len());
    Ok(())
}
