//! Drawing capability interface
//!
//! The scheduler never draws; it hands each accepted frame to a
//! [`RenderBackend`]. Backends exist per output (canvas, GPU, terminal) and
//! only depend on this interface.

use platter_core::table::WaveformTable;
use platter_core::StereoFrame;

/// Everything the spectral ring draw step needs for one frame
pub struct FrameParams<'a> {
    /// Average energy across the lower half of the constant-Q bins
    pub low_energy: f32,
    /// Average energy across the upper half
    pub high_energy: f32,
    /// Spectral ring resampled onto the circle grid
    pub bins: &'a [f32],
    /// Most recent raw frames for the phase display
    pub phase: &'a [StereoFrame],
    /// Playback position in seconds
    pub position: f64,
    /// Track duration in seconds
    pub duration: f64,
}

/// One drawing surface
///
/// Calls arrive back-to-front within a frame: seek area, waveform ring,
/// constant-Q bins, phase figure, playback head.
pub trait RenderBackend {
    /// Draw the resampled spectral ring
    fn draw_constant_q_bins(&mut self, params: &FrameParams);

    /// Draw the circular waveform from its precomputed envelope
    fn draw_waveform(&mut self, table: &WaveformTable, position: f64, duration: f64);

    /// Draw the rotating playback head
    fn draw_playback_head(&mut self, position: f64, duration: f64);

    /// Draw the seek affordance; `hover` is the pointer's 0..1 track
    /// fraction when it is over the seek area
    fn draw_seek_area(&mut self, hover: Option<f64>);

    /// Draw the stereo phase figure from raw frames
    fn draw_phase(&mut self, frames: &[StereoFrame]);
}
