//! Stereo FFT analysis source
//!
//! Keeps a sliding window of the most recent stereo frames and produces
//! Hann-windowed magnitude spectra per channel on demand. The FFT plan,
//! window and scratch space are allocated once; per-frame work reuses them.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use platter_core::StereoFrame;

/// Raw frames served to the phase display each frame
pub const PHASE_FRAME_COUNT: usize = 256;

const FFT_MIN: usize = 256;
const FFT_MAX: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StereoChannel {
    Left,
    Right,
}

/// Where the scheduler pulls spectra and raw frames from
///
/// The player side feeds samples in; the scheduler polls once per accepted
/// frame. Implementations must make `fill_spectrum` allocation-free in
/// steady state.
pub trait AnalysisSource {
    /// False while the source cannot produce a stable frame yet
    fn ready(&self) -> bool;

    /// Dense magnitude rows per spectrum (the constant-Q input dimension)
    fn spectrum_rows(&self) -> usize;

    /// Fill `out` with the current magnitude spectrum of one channel
    fn fill_spectrum(&mut self, channel: StereoChannel, out: &mut [f32]);

    /// Most recent raw frames, newest last
    fn phase_frames(&self) -> &[StereoFrame];
}

/// FFT-backed analysis over a sliding stereo window
pub struct FftAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    window: Vec<f32>,
    /// Amplitude normalization: an on-bin unit sine reads ~1.0
    scale: f32,
    samples: Vec<StereoFrame>,
    buf: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl FftAnalyzer {
    /// Build an analyzer; `fft_size` is rounded up to a power of two and
    /// clamped to a sane range
    pub fn new(fft_size: usize) -> Self {
        let n = fft_size.next_power_of_two().clamp(FFT_MIN, FFT_MAX);
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n);

        let window: Vec<f32> = (0..n)
            .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos()))
            .collect();
        let win_sum: f32 = window.iter().sum();
        let scale = 2.0 / win_sum;

        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Self {
            fft,
            fft_size: n,
            window,
            scale,
            samples: Vec::with_capacity(n),
            buf: vec![Complex::new(0.0, 0.0); n],
            scratch,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Push new frames, keeping only the most recent window
    pub fn feed(&mut self, frames: &[StereoFrame]) {
        if frames.len() >= self.fft_size {
            self.samples.clear();
            self.samples
                .extend_from_slice(&frames[frames.len() - self.fft_size..]);
            return;
        }
        let overflow = (self.samples.len() + frames.len()).saturating_sub(self.fft_size);
        if overflow > 0 {
            self.samples.drain(..overflow);
        }
        self.samples.extend_from_slice(frames);
    }
}

impl AnalysisSource for FftAnalyzer {
    fn ready(&self) -> bool {
        self.samples.len() >= self.fft_size
    }

    fn spectrum_rows(&self) -> usize {
        self.fft_size / 2
    }

    fn fill_spectrum(&mut self, channel: StereoChannel, out: &mut [f32]) {
        let n = self.fft_size;
        let available = self.samples.len().min(n);
        let tail = &self.samples[self.samples.len() - available..];

        // zero-pad on the left when underfull; ready() normally gates this
        let pad = n - available;
        for slot in &mut self.buf[..pad] {
            *slot = Complex::new(0.0, 0.0);
        }
        for (i, frame) in tail.iter().enumerate() {
            let s = match channel {
                StereoChannel::Left => frame.left,
                StereoChannel::Right => frame.right,
            };
            self.buf[pad + i] = Complex::new(s * self.window[pad + i], 0.0);
        }

        self.fft.process_with_scratch(&mut self.buf, &mut self.scratch);

        let rows = out.len().min(n / 2);
        for (k, slot) in out.iter_mut().take(rows).enumerate() {
            *slot = self.buf[k].norm() * self.scale;
        }
        for slot in out.iter_mut().skip(rows) {
            *slot = 0.0;
        }
    }

    fn phase_frames(&self) -> &[StereoFrame] {
        let start = self.samples.len().saturating_sub(PHASE_FRAME_COUNT);
        &self.samples[start..]
    }
}
