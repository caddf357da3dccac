//! Frame scheduler
//!
//! Runs once per ticker callback and decides whether the frame is worth
//! rendering at all:
//!
//! - on the mobile profile, frames are throttled to 30 fps; the last-frame
//!   timestamp is rounded onto the interval grid so the cap does not drift
//! - while paused, unchanged hover and position accumulate idle time; past
//!   the configured timeout the scheduler unsubscribes from the ticker
//!   entirely and waits for input to wake it
//! - page visibility suspends and resumes independently of the idle clock
//!
//! An accepted frame pulls left/right spectra, compresses them through the
//! constant-Q matrix, joins them into a closed spectral ring (left bins
//! followed by the mirrored right bins), resamples the ring onto the circle
//! grid and hands everything to the render backend. All buffers are sized
//! once at construction; the per-frame path does not allocate.

use std::sync::Arc;

use platter_core::config::{EngineConfig, RenderProfile};
use platter_core::dsp::RingResampler;
use platter_core::player::PlayerAtomics;
use platter_core::table::{CqtMatrix, FirKernel, WaveformTable};
use platter_core::CIRCLE_SAMPLES;

use crate::analysis::{AnalysisSource, StereoChannel};
use crate::render::{FrameParams, RenderBackend};
use crate::ticker::FrameTicker;

/// Per-frame visualization driver
pub struct RenderScheduler<T: FrameTicker, B: RenderBackend, A: AnalysisSource> {
    ticker: T,
    backend: B,
    analysis: A,
    atomics: Arc<PlayerAtomics>,
    cqt: Arc<CqtMatrix>,
    resampler: RingResampler,
    waveform: Option<WaveformTable>,

    profile: RenderProfile,
    idle_timeout_ms: f64,

    subscribed: bool,
    visible: bool,
    /// Throttle grid anchor (mobile profile only)
    throttle_anchor_ms: Option<f64>,
    /// Raw timestamp of the previous accepted frame, for idle accounting
    prev_frame_ms: Option<f64>,
    idle_ms: f64,
    hover: Option<f64>,
    last_hover: Option<f64>,
    last_position: f64,

    // per-frame scratch, allocated once
    spectrum_left: Vec<f32>,
    spectrum_right: Vec<f32>,
    bins_left: Vec<f32>,
    bins_right: Vec<f32>,
    ring: Vec<f32>,
    circle: Vec<f32>,
}

impl<T: FrameTicker, B: RenderBackend, A: AnalysisSource> RenderScheduler<T, B, A> {
    /// Wire the scheduler up and subscribe to the ticker
    ///
    /// Panics if the analysis row count does not match the constant-Q
    /// matrix input dimension; the two tables are built for each other.
    pub fn new(
        mut ticker: T,
        backend: B,
        analysis: A,
        atomics: Arc<PlayerAtomics>,
        cqt: Arc<CqtMatrix>,
        kernel: Arc<FirKernel>,
        config: &EngineConfig,
    ) -> Self {
        assert_eq!(
            analysis.spectrum_rows(),
            cqt.rows(),
            "analysis rows must match the constant-Q input dimension"
        );

        let rows = cqt.rows();
        let cols = cqt.cols();
        let resampler = RingResampler::new(kernel, cols * 2, CIRCLE_SAMPLES);
        ticker.subscribe();

        Self {
            ticker,
            backend,
            analysis,
            atomics,
            cqt,
            resampler,
            waveform: None,
            profile: config.profile,
            idle_timeout_ms: config.idle_timeout_seconds * 1000.0,
            subscribed: true,
            visible: true,
            throttle_anchor_ms: None,
            prev_frame_ms: None,
            idle_ms: 0.0,
            hover: None,
            last_hover: None,
            last_position: 0.0,
            spectrum_left: vec![0.0; rows],
            spectrum_right: vec![0.0; rows],
            bins_left: vec![0.0; cols],
            bins_right: vec![0.0; cols],
            ring: vec![0.0; cols * 2],
            circle: vec![0.0; CIRCLE_SAMPLES],
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn ticker(&self) -> &T {
        &self.ticker
    }

    /// Swap the waveform drawn under the spectrum (changes on track switch)
    pub fn set_waveform(&mut self, waveform: Option<WaveformTable>) {
        self.waveform = waveform;
        self.wake();
    }

    /// Pointer moved over (or left) the seek area; `hover` is the 0..1
    /// track fraction under the pointer
    pub fn pointer_hover(&mut self, hover: Option<f64>) {
        self.hover = hover;
        self.wake();
    }

    /// The displayed position jumped (seek, transport action)
    pub fn position_changed(&mut self) {
        self.wake();
    }

    /// Page/tab visibility change, independent of the idle timeout
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.idle_ms = 0.0;
            self.prev_frame_ms = None;
            self.resubscribe();
        } else {
            self.suspend();
            log::debug!("[VIZ] hidden, rendering suspended");
        }
    }

    /// Ticker callback: process one frame at `now_ms` milliseconds
    pub fn frame(&mut self, now_ms: f64) {
        if !self.subscribed || !self.visible {
            return;
        }
        if !self.analysis.ready() {
            return; // keep showing the last good frame
        }

        // frame-rate cap: round the anchor onto the interval grid so the
        // cap holds exactly over time instead of drifting per frame
        if let Some(interval) = self.profile.min_frame_interval_ms() {
            match self.throttle_anchor_ms {
                Some(anchor) if now_ms - anchor < interval => return,
                Some(anchor) => {
                    self.throttle_anchor_ms = Some(now_ms - ((now_ms - anchor) % interval));
                }
                None => self.throttle_anchor_ms = Some(now_ms),
            }
        }

        let dt = self
            .prev_frame_ms
            .map(|prev| (now_ms - prev).max(0.0))
            .unwrap_or(0.0);
        self.prev_frame_ms = Some(now_ms);

        let position = self.atomics.position();
        let duration = self.atomics.duration();

        if self.atomics.is_playing() {
            self.idle_ms = 0.0;
        } else {
            let changed = self.hover != self.last_hover || position != self.last_position;
            if changed {
                self.idle_ms = 0.0;
            } else {
                self.idle_ms += dt;
            }
            if self.idle_ms >= self.idle_timeout_ms {
                self.suspend();
                log::debug!("[VIZ] idle for {:.1}s, rendering suspended", self.idle_ms / 1000.0);
                return;
            }
        }
        self.last_hover = self.hover;
        self.last_position = position;

        self.render(position, duration);
    }

    fn render(&mut self, position: f64, duration: f64) {
        self.analysis
            .fill_spectrum(StereoChannel::Left, &mut self.spectrum_left);
        self.analysis
            .fill_spectrum(StereoChannel::Right, &mut self.spectrum_right);
        self.cqt.apply(&self.spectrum_left, &mut self.bins_left);
        self.cqt.apply(&self.spectrum_right, &mut self.bins_right);

        // closed spectral ring: left bins, then the right bins mirrored so
        // both channels meet at the top and bottom of the circle
        let cols = self.bins_left.len();
        self.ring[..cols].copy_from_slice(&self.bins_left);
        for (slot, v) in self.ring[cols..].iter_mut().zip(self.bins_right.iter().rev()) {
            *slot = *v;
        }
        self.resampler.resample(&self.ring, &mut self.circle);

        let half = cols / 2;
        let low_energy = band_mean(&self.bins_left[..half], &self.bins_right[..half]);
        let high_energy = band_mean(&self.bins_left[half..], &self.bins_right[half..]);

        self.backend.draw_seek_area(self.hover);
        if let Some(table) = &self.waveform {
            self.backend.draw_waveform(table, position, duration);
        }
        let params = FrameParams {
            low_energy,
            high_energy,
            bins: &self.circle,
            phase: self.analysis.phase_frames(),
            position,
            duration,
        };
        self.backend.draw_constant_q_bins(&params);
        self.backend.draw_phase(params.phase);
        self.backend.draw_playback_head(position, duration);
    }

    /// Reset the idle clock and resume rendering if it had stopped
    fn wake(&mut self) {
        self.idle_ms = 0.0;
        self.prev_frame_ms = None;
        self.throttle_anchor_ms = None;
        if self.visible {
            self.resubscribe();
        }
    }

    fn resubscribe(&mut self) {
        if !self.subscribed {
            self.ticker.subscribe();
            self.subscribed = true;
            log::debug!("[VIZ] rendering resumed");
        }
    }

    fn suspend(&mut self) {
        if self.subscribed {
            self.ticker.unsubscribe();
            self.subscribed = false;
        }
    }
}

fn band_mean(left: &[f32], right: &[f32]) -> f32 {
    let count = left.len() + right.len();
    if count == 0 {
        return 0.0;
    }
    let sum: f32 = left.iter().chain(right).sum();
    sum / count as f32
}
