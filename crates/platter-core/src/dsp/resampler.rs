//! Circular windowed-sinc resampler
//!
//! Projects a fixed-length ring of constant-Q bins onto the fixed circle
//! resolution using band-limited interpolation. The input is a closed
//! spectral ring (left channel bins followed by the mirrored right channel),
//! so the interpolation window wraps modulo the input length instead of
//! clamping at the ends.
//!
//! Per output sample the kernel is evaluated at one fractional offset: the
//! stored taps sit `samplesPerCrossing` apart, and the delta array linearly
//! interpolates between adjacent taps. Index arithmetic here is the part that
//! silently aliases when it is off by one, so the tests cross-check against a
//! naive dense interpolation that recomputes every output position from
//! scratch.

use std::sync::Arc;

use crate::table::FirKernel;

/// Resamples a fixed-size circular source onto a fixed output sample count
#[derive(Debug, Clone)]
pub struct RingResampler {
    kernel: Arc<FirKernel>,
    input_len: usize,
    output_len: usize,
    /// Input samples advanced per output sample (`input_len / output_len`)
    step: f64,
}

impl RingResampler {
    /// Create a resampler for a fixed input/output geometry
    pub fn new(kernel: Arc<FirKernel>, input_len: usize, output_len: usize) -> Self {
        assert!(input_len > 0, "resampler input length must be nonzero");
        assert!(output_len > 0, "resampler output length must be nonzero");
        let step = input_len as f64 / output_len as f64;
        Self {
            kernel,
            input_len,
            output_len,
            step,
        }
    }

    #[inline]
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    #[inline]
    pub fn output_len(&self) -> usize {
        self.output_len
    }

    #[inline]
    pub fn kernel(&self) -> &FirKernel {
        &self.kernel
    }

    /// Fill `output` with the band-limited projection of the circular `input`
    ///
    /// Starts from input position zero each call, so identical inputs always
    /// produce identical outputs. Allocation-free. Non-finite accumulations
    /// clamp to 0.
    pub fn resample(&self, input: &[f32], output: &mut [f32]) {
        assert_eq!(input.len(), self.input_len, "input ring length mismatch");
        assert_eq!(output.len(), self.output_len, "output length mismatch");

        let spc = self.kernel.samples_per_crossing();
        let filter_size = self.kernel.filter_size();
        let half = self.kernel.half_crossings() as isize;
        let ring = self.input_len as isize;

        let mut current_input: isize = 0;
        let mut fraction: f64 = 0.0;

        for out in output.iter_mut() {
            // Fractional tap offset for this output position
            let index = fraction * spc as f64;
            let integral = index as usize;
            let frac_part = (index - integral as f64) as f32;

            // Window: taps every samplesPerCrossing, paired with input
            // samples walking down from +halfCrossings around the cursor
            let mut acc = 0.0f32;
            let mut i = integral;
            let mut j = half;
            while i < filter_size {
                let src = (current_input + j).rem_euclid(ring) as usize;
                acc += self.kernel.tap(i, frac_part) * input[src];
                i += spc;
                j -= 1;
            }
            *out = if acc.is_finite() { acc } else { 0.0 };

            // Advance the cursor, carrying whole input steps
            fraction += self.step;
            while fraction >= 1.0 {
                fraction -= 1.0;
                current_input = (current_input + 1) % ring;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::generate::sinc_kernel;

    /// Naive O(input * output) reference: recompute every output position
    /// directly instead of stepping a cursor, and evaluate the kernel by
    /// fractional position instead of splitting into integral/fractional
    /// parts. Any off-by-one in the fast path's stepping or wrapping shows
    /// up as a mismatch.
    fn dense_reference(kernel: &FirKernel, input: &[f32], output_len: usize) -> Vec<f32> {
        let n_in = input.len();
        let spc = kernel.samples_per_crossing() as f64;
        let filter_size = kernel.filter_size() as f64;
        let half = kernel.half_crossings() as f64;
        let step = n_in as f64 / output_len as f64;

        (0..output_len)
            .map(|o| {
                let p = o as f64 * step;
                let mut acc = 0.0f64;
                for (m, &sample) in input.iter().enumerate() {
                    // Signed ring distance from the output position to bin m
                    let mut d = m as f64 - p;
                    d -= (d / n_in as f64).round() * n_in as f64;

                    let t = spc * (half - d);
                    if t >= 0.0 && t < filter_size {
                        let ft = t.floor() as usize;
                        let frac = (t - ft as f64) as f32;
                        acc += kernel.tap(ft, frac) as f64 * sample as f64;
                    }
                }
                acc as f32
            })
            .collect()
    }

    fn test_kernel(num_crossings: u32, samples_per_crossing: u32) -> Arc<FirKernel> {
        Arc::new(sinc_kernel(num_crossings, samples_per_crossing, 1.0, 6.0).unwrap())
    }

    fn ring_signal(n: usize) -> Vec<f32> {
        use std::f32::consts::TAU;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                (TAU * t).sin() + 0.3 * (2.0 * TAU * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_matches_dense_reference() {
        for (num_crossings, spc, n_in, n_out) in
            [(4u32, 8u32, 16usize, 40usize), (9, 32, 16, 64), (9, 32, 24, 100)]
        {
            let kernel = test_kernel(num_crossings, spc);
            let resampler = RingResampler::new(kernel.clone(), n_in, n_out);
            let input = ring_signal(n_in);

            let mut fast = vec![0.0f32; n_out];
            resampler.resample(&input, &mut fast);
            let reference = dense_reference(&kernel, &input, n_out);

            for (o, (got, want)) in fast.iter().zip(&reference).enumerate() {
                assert!(
                    (got - want).abs() < 1e-3,
                    "output {} diverged: fast={} reference={} ({}x{} kernel, {}->{})",
                    o,
                    got,
                    want,
                    num_crossings,
                    spc,
                    n_in,
                    n_out
                );
            }
        }
    }

    #[test]
    fn test_rotation_shifts_output() {
        let kernel = test_kernel(9, 32);
        let n_in = 16;
        let n_out = 64;
        let shift_ratio = n_out / n_in;
        let resampler = RingResampler::new(kernel, n_in, n_out);
        let input = ring_signal(n_in);

        let mut base = vec![0.0f32; n_out];
        resampler.resample(&input, &mut base);

        for k in [1usize, 3, 5] {
            let rotated: Vec<f32> = (0..n_in).map(|i| input[(i + k) % n_in]).collect();
            let mut out = vec![0.0f32; n_out];
            resampler.resample(&rotated, &mut out);

            // Rotating the ring by k bins shifts the output by k * N_out/N_in
            for o in 0..n_out {
                let want = base[(o + k * shift_ratio) % n_out];
                assert!(
                    (out[o] - want).abs() < 1e-3,
                    "rotation {} broke at output {}: {} vs {}",
                    k,
                    o,
                    out[o],
                    want
                );
            }
        }
    }

    #[test]
    fn test_smooth_circle_from_coarse_bins() {
        // 16 sinusoidal bins through the small kernel onto 512 samples must
        // come out as a smooth closed curve: no step between neighbors, no
        // seam where the ring wraps.
        let kernel = test_kernel(4, 8);
        let resampler = RingResampler::new(kernel, 16, 512);
        let input: Vec<f32> = (0..16)
            .map(|i| (std::f32::consts::TAU * i as f32 / 16.0).sin())
            .collect();

        let mut output = vec![0.0f32; 512];
        resampler.resample(&input, &mut output);

        let mut max_step = 0.0f32;
        for o in 0..512 {
            let diff = (output[(o + 1) % 512] - output[o]).abs();
            max_step = max_step.max(diff);
        }
        assert!(max_step < 0.05, "adjacent outputs jumped by {}", max_step);

        let peak = output.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.5, "signal vanished in resampling (peak {})", peak);
    }

    #[test]
    fn test_window_wraps_around_ring() {
        // An impulse at bin 0 must influence outputs on both sides of the
        // wrap point, and fade out on the far side of the ring.
        let kernel = test_kernel(4, 8);
        let resampler = RingResampler::new(kernel, 8, 32);
        let mut input = vec![0.0f32; 8];
        input[0] = 1.0;

        let mut output = vec![0.0f32; 32];
        resampler.resample(&input, &mut output);

        assert!(output[0] > 0.5, "impulse missing at its own position");
        assert!(
            output[31].abs() > 0.05,
            "window did not wrap below zero (got {})",
            output[31]
        );
        assert!(
            output[16].abs() < 0.05,
            "impulse leaked to the far side of the ring ({})",
            output[16]
        );
    }

    #[test]
    fn test_nan_input_clamps() {
        let kernel = test_kernel(4, 8);
        let resampler = RingResampler::new(kernel, 8, 16);
        let mut input = vec![0.0f32; 8];
        input[3] = f32::NAN;

        let mut output = vec![0.0f32; 16];
        resampler.resample(&input, &mut output);
        assert!(output.iter().all(|s| s.is_finite()));
    }
}
