//! Offline table generation
//!
//! Builds the three table kinds from scratch: Kaiser-windowed sinc kernels
//! for the resampler, sparse constant-Q matrices for spectral compression,
//! and min/max waveform envelopes from decoded PCM. table-pack drives these
//! to produce shippable files; the DSP tests use the kernel generator for
//! synthetic fixtures.

use std::f64::consts::PI;

use rayon::prelude::*;

use crate::table::{CqtHeader, CqtMatrix, FirHeader, FirKernel, TableError, TableResult};

// ────────────────────────────────────────────────────────────────────────────────
// FIR kernel generation
// ────────────────────────────────────────────────────────────────────────────────

/// Generate a Kaiser-windowed sinc interpolation kernel
///
/// The kernel covers `numCrossings` zero crossings sampled at
/// `samplesPerCrossing` taps each, centered at `halfCrossings` crossings from
/// the left edge. Taps are normalized so that summing every
/// `samplesPerCrossing`-th tap (the zero-offset evaluation) gives unity gain.
/// `cutoff_cycle` scales the sinc argument below Nyquist; `kaiser_beta`
/// controls window steepness. Both are recorded in the header for provenance.
pub fn sinc_kernel(
    num_crossings: u32,
    samples_per_crossing: u32,
    cutoff_cycle: f32,
    kaiser_beta: f32,
) -> TableResult<FirKernel> {
    let header = FirHeader {
        num_crossings,
        samples_per_crossing,
        cutoff_cycle,
        kaiser_beta,
    };
    if num_crossings < 2 || samples_per_crossing == 0 {
        return Err(TableError::MalformedHeader(format!(
            "kernel needs numCrossings >= 2 and samplesPerCrossing >= 1 (got {}, {})",
            num_crossings, samples_per_crossing
        )));
    }
    if !(0.0..=1.0).contains(&cutoff_cycle) || cutoff_cycle == 0.0 {
        return Err(TableError::MalformedHeader(format!(
            "cutoff cycle {} outside (0, 1]",
            cutoff_cycle
        )));
    }

    let filter_size = samples_per_crossing as usize * (num_crossings as usize - 1) - 1;
    let spc = samples_per_crossing as f64;
    let half = ((num_crossings - 1) / 2) as f64;
    let center = half * spc;
    let span = center.max((filter_size - 1) as f64 - center).max(1.0);
    let cutoff = cutoff_cycle as f64;
    let beta = kaiser_beta as f64;
    let i0_beta = bessel_i0(beta);

    let mut coeffs: Vec<f32> = (0..filter_size)
        .map(|i| {
            let crossings = (i as f64 - center) / spc;
            let x = PI * cutoff * crossings;
            let sinc = if x.abs() < 1e-12 { 1.0 } else { x.sin() / x };

            let edge = (i as f64 - center) / span;
            let window = bessel_i0(beta * (1.0 - edge * edge).max(0.0).sqrt()) / i0_beta;

            (cutoff * sinc * window) as f32
        })
        .collect();

    // Unity gain at the zero fractional offset
    let dc: f32 = coeffs
        .iter()
        .step_by(samples_per_crossing as usize)
        .sum();
    if dc.abs() < 1e-6 {
        return Err(TableError::MalformedHeader(
            "degenerate kernel: zero gain at integer offsets".to_string(),
        ));
    }
    for c in &mut coeffs {
        *c /= dc;
    }

    // Finite-difference slopes; the final tap ramps toward the implicit zero
    // one position past the table
    let mut deltas: Vec<f32> = coeffs.windows(2).map(|w| w[1] - w[0]).collect();
    deltas.push(-coeffs[filter_size - 1]);

    FirKernel::from_parts(header, coeffs, deltas)
}

/// Modified Bessel function of the first kind, order zero
fn bessel_i0(x: f64) -> f64 {
    let y = x * x / 4.0;
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..=24 {
        term *= y / ((k * k) as f64);
        sum += term;
        if term < 1e-12 * sum {
            break;
        }
    }
    sum
}

// ────────────────────────────────────────────────────────────────────────────────
// Constant-Q matrix generation
// ────────────────────────────────────────────────────────────────────────────────

/// Build a sparse constant-Q compression matrix for one sample rate
///
/// Center frequencies run from `min_freq` upward at `bins_per_octave` bins
/// per octave until `max_freq`. Each output bin collects FFT rows under a
/// triangular weight spanning its log-spaced neighbors, normalized per
/// column; weights below `threshold` are dropped to keep the matrix sparse.
pub fn constant_q_matrix(
    sample_rate: u32,
    fft_size: usize,
    bins_per_octave: u32,
    min_freq: f32,
    max_freq: f32,
    threshold: f32,
) -> TableResult<CqtMatrix> {
    if sample_rate == 0 || fft_size < 2 || bins_per_octave == 0 {
        return Err(TableError::MalformedHeader(format!(
            "constant-Q geometry invalid: rate={} fft={} bins/octave={}",
            sample_rate, fft_size, bins_per_octave
        )));
    }
    let nyquist = sample_rate as f32 / 2.0;
    if min_freq <= 0.0 || max_freq <= min_freq || max_freq > nyquist {
        return Err(TableError::MalformedHeader(format!(
            "constant-Q range {}..{} outside (0, {}]",
            min_freq, max_freq, nyquist
        )));
    }

    let rows = fft_size / 2;
    let hz_per_row = sample_rate as f32 / fft_size as f32;
    let octaves = (max_freq / min_freq).log2();
    let cols = (bins_per_octave as f32 * octaves).floor() as usize + 1;
    let ratio = 2.0f32.powf(1.0 / bins_per_octave as f32);

    let mut values = Vec::new();
    let mut inner_index = Vec::new();
    let mut outer_ptr = Vec::with_capacity(cols + 1);
    outer_ptr.push(0i32);

    for c in 0..cols {
        let f_center = min_freq * ratio.powi(c as i32);
        let f_lo = f_center / ratio;
        let f_hi = (f_center * ratio).min(nyquist);

        // Triangular weights over the FFT rows covered by this bin
        let row_lo = (f_lo / hz_per_row).floor().max(0.0) as usize;
        let row_hi = ((f_hi / hz_per_row).ceil() as usize).min(rows.saturating_sub(1));

        let mut column: Vec<(usize, f32)> = Vec::new();
        let mut sum = 0.0f32;
        for r in row_lo..=row_hi {
            let f = r as f32 * hz_per_row;
            let w = if f <= f_center {
                (f - f_lo) / (f_center - f_lo)
            } else {
                (f_hi - f) / (f_hi - f_center)
            };
            if w > 0.0 {
                column.push((r, w));
                sum += w;
            }
        }

        if sum > 0.0 {
            for (r, w) in column {
                let normalized = w / sum;
                if normalized >= threshold {
                    values.push(normalized);
                    inner_index.push(r as i32);
                }
            }
        }
        outer_ptr.push(values.len() as i32);
    }

    if values.is_empty() {
        return Err(TableError::MalformedHeader(
            "constant-Q matrix has no spectral overlap".to_string(),
        ));
    }

    let header = CqtHeader {
        sample_rate,
        bins_per_octave,
        min_freq,
        max_freq,
        num_rows: rows as u32,
        num_cols: cols as u32,
        inner_ptr_size: values.len() as u32,
        outer_ptr_size: outer_ptr.len() as u32,
    };
    CqtMatrix::from_parts(header, values, inner_index, outer_ptr)
}

// ────────────────────────────────────────────────────────────────────────────────
// Waveform envelope generation
// ────────────────────────────────────────────────────────────────────────────────

/// Per-pixel (min, max) envelope over fixed sample windows
///
/// Columns are independent, so long tracks fan out across the rayon pool.
pub fn waveform_envelope(samples: &[f32], samples_per_pixel: usize) -> Vec<(f32, f32)> {
    assert!(samples_per_pixel > 0, "samples per pixel must be nonzero");
    samples
        .par_chunks(samples_per_pixel)
        .map(|window| {
            window.iter().fold((f32::MAX, f32::MIN), |(lo, hi), &s| {
                (lo.min(s), hi.max(s))
            })
        })
        .collect()
}

/// Quantize an envelope to interleaved signed 16-bit payload samples
///
/// Scales so the loudest excursion hits the full integer range; the decoder's
/// normalization pass then restores peak 1.0 exactly.
pub fn quantize_envelope_16(pairs: &[(f32, f32)]) -> Vec<i16> {
    let peak = envelope_peak(pairs);
    let scale = if peak > 0.0 { i16::MAX as f32 / peak } else { 0.0 };
    pairs
        .iter()
        .flat_map(|&(lo, hi)| [quantize(lo, scale), quantize(hi, scale)])
        .collect()
}

/// Quantize an envelope to interleaved signed 8-bit payload samples
pub fn quantize_envelope_8(pairs: &[(f32, f32)]) -> Vec<i8> {
    let peak = envelope_peak(pairs);
    let scale = if peak > 0.0 { i8::MAX as f32 / peak } else { 0.0 };
    pairs
        .iter()
        .flat_map(|&(lo, hi)| {
            [
                (lo * scale).round().clamp(i8::MIN as f32, i8::MAX as f32) as i8,
                (hi * scale).round().clamp(i8::MIN as f32, i8::MAX as f32) as i8,
            ]
        })
        .collect()
}

fn envelope_peak(pairs: &[(f32, f32)]) -> f32 {
    pairs
        .iter()
        .fold(0.0f32, |m, &(lo, hi)| m.max(lo.abs()).max(hi.abs()))
}

fn quantize(v: f32, scale: f32) -> i16 {
    (v * scale)
        .round()
        .clamp(i16::MIN as f32, i16::MAX as f32) as i16
}
