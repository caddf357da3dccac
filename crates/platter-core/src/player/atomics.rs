//! Lock-free playback state for UI and scheduler access
//!
//! The player is the single writer; the render scheduler and any UI thread
//! read these without taking a lock. Floating-point values travel as raw bits
//! in integer atomics. All operations use `Ordering::Relaxed` since readers
//! only need visibility, not ordering against other memory.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};

use crate::types::PlayerState;

/// Atomic mirror of the audible playback state
pub struct PlayerAtomics {
    /// Playback position of the active channel in seconds (f64 bits)
    position: AtomicU64,
    /// Duration of the active channel's track in seconds (f64 bits)
    duration: AtomicU64,
    /// Volume of the active channel in [0, 1] (f32 bits)
    volume: AtomicU32,
    /// Global player state (PlayerState encoding)
    state: AtomicU8,
    /// Index of the audibly active channel (0 or 1)
    current_channel: AtomicU8,
    /// Whether the active channel is advancing
    playing: AtomicBool,
}

impl PlayerAtomics {
    pub fn new() -> Self {
        Self {
            position: AtomicU64::new(0f64.to_bits()),
            duration: AtomicU64::new(0f64.to_bits()),
            volume: AtomicU32::new(0f32.to_bits()),
            state: AtomicU8::new(PlayerState::Idle.as_u8()),
            current_channel: AtomicU8::new(0),
            playing: AtomicBool::new(false),
        }
    }

    /// Current playback position in seconds (lock-free)
    #[inline]
    pub fn position(&self) -> f64 {
        f64::from_bits(self.position.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set_position(&self, seconds: f64) {
        self.position.store(seconds.to_bits(), Ordering::Relaxed);
    }

    /// Active track duration in seconds (lock-free)
    #[inline]
    pub fn duration(&self) -> f64 {
        f64::from_bits(self.duration.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set_duration(&self, seconds: f64) {
        self.duration.store(seconds.to_bits(), Ordering::Relaxed);
    }

    /// Active channel volume (lock-free)
    #[inline]
    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set_volume(&self, volume: f32) {
        self.volume.store(volume.to_bits(), Ordering::Relaxed);
    }

    /// Global player state (lock-free)
    #[inline]
    pub fn state(&self) -> PlayerState {
        PlayerState::from_u8(self.state.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set_state(&self, state: PlayerState) {
        self.state.store(state.as_u8(), Ordering::Relaxed);
    }

    /// Index of the audible channel (lock-free)
    #[inline]
    pub fn current_channel(&self) -> usize {
        self.current_channel.load(Ordering::Relaxed) as usize
    }

    #[inline]
    pub fn set_current_channel(&self, index: usize) {
        self.current_channel.store(index as u8, Ordering::Relaxed);
    }

    /// Whether playback is advancing (lock-free)
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Relaxed);
    }
}

impl Default for PlayerAtomics {
    fn default() -> Self {
        Self::new()
    }
}
