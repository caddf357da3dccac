//! Common types for Platter
//!
//! Fundamental types shared across the table loaders, the playback engine and
//! the visualization pipeline: stereo frame handling, playback state and the
//! fixed circle resolution everything is projected onto.

/// Default sample rate assumed for analysis when a table doesn't carry one
/// (44.1kHz - the rate the shipped constant-Q tables are built for)
pub const SAMPLE_RATE: u32 = 44100;

/// Number of playback channels in the dual-buffer player
pub const NUM_CHANNELS: usize = 2;

/// Number of output points on the circular sample grid
///
/// Spectral bins and waveform envelopes are resampled onto this many
/// angularly-evenly-spaced points before drawing.
pub const CIRCLE_SAMPLES: usize = 1024;

/// Audio sample type (32-bit float for processing)
pub type Sample = f32;

/// A single stereo frame (left and right channels)
///
/// Uses `#[repr(C)]` for a predictable [left, right] layout so a
/// `&[StereoFrame]` converts to interleaved `&[f32]` (and back) with bytemuck,
/// letting host audio callbacks hand frames over without per-sample copies.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StereoFrame {
    pub left: Sample,
    pub right: Sample,
}

impl StereoFrame {
    /// Create a new stereo frame
    #[inline]
    pub fn new(left: Sample, right: Sample) -> Self {
        Self { left, right }
    }

    /// Create a silent frame
    #[inline]
    pub fn silence() -> Self {
        Self::default()
    }

    /// Create a mono frame (same value in both channels)
    #[inline]
    pub fn mono(value: Sample) -> Self {
        Self { left: value, right: value }
    }

    /// Mono mixdown: (left + right) / 2
    #[inline]
    pub fn mid(&self) -> Sample {
        (self.left + self.right) * 0.5
    }

    /// Peak amplitude (max of abs(left), abs(right))
    #[inline]
    pub fn peak(&self) -> Sample {
        self.left.abs().max(self.right.abs())
    }
}

/// Reinterpret an interleaved [L, R, L, R, ...] slice as stereo frames
///
/// Zero-copy thanks to `#[repr(C)]`. Panics if the slice length is odd.
#[inline]
pub fn frames_from_interleaved(interleaved: &[Sample]) -> &[StereoFrame] {
    bytemuck::cast_slice(interleaved)
}

/// Reinterpret stereo frames as an interleaved [L, R, L, R, ...] slice
#[inline]
pub fn frames_as_interleaved(frames: &[StereoFrame]) -> &[Sample] {
    bytemuck::cast_slice(frames)
}

/// Global playback state of the dual-buffer player
///
/// `Loading` only covers the initial preload; a crossfade between tracks
/// keeps the player in `Playing` while the channels swap underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
}

impl PlayerState {
    /// Encode for atomic storage
    #[inline]
    pub fn as_u8(self) -> u8 {
        match self {
            PlayerState::Idle => 0,
            PlayerState::Loading => 1,
            PlayerState::Playing => 2,
            PlayerState::Paused => 3,
        }
    }

    /// Decode from atomic storage (unknown values read as Idle)
    #[inline]
    pub fn from_u8(raw: u8) -> Self {
        match raw {
            1 => PlayerState::Loading,
            2 => PlayerState::Playing,
            3 => PlayerState::Paused,
            _ => PlayerState::Idle,
        }
    }
}
