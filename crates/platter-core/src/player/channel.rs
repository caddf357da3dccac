//! Per-channel playback state
//!
//! Each of the player's two buffers tracks its own lifecycle: empty, loading,
//! ready (decoded but paused at zero) or playing. A generation counter guards
//! against stale loader results: every queued load bumps the counter, and a
//! result only lands if its generation still matches.

use crate::player::fade::VolumeRamp;
use crate::player::loader::TrackInfo;
use crate::table::WaveformTable;

/// Lifecycle of one playback buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Empty,
    Loading,
    Ready,
    Playing,
}

/// One of the player's two playback buffers
#[derive(Default)]
pub struct PlaybackChannel {
    src: Option<String>,
    state: ChannelState,
    generation: u64,
    volume: f32,
    position: f64,
    track: Option<TrackInfo>,
    waveform: Option<WaveformTable>,
    ramp: Option<VolumeRamp>,
}

impl PlaybackChannel {
    /// Begin loading a new source, superseding any in-flight load
    ///
    /// Returns the generation to stamp on the load request.
    pub fn begin_load(&mut self, src: &str) -> u64 {
        self.generation += 1;
        self.src = Some(src.to_string());
        self.state = ChannelState::Loading;
        self.track = None;
        self.waveform = None;
        self.position = 0.0;
        self.generation
    }

    /// Land a successful load if the generation still matches
    ///
    /// Returns false for stale results, which the caller drops.
    pub fn complete_load(
        &mut self,
        generation: u64,
        info: TrackInfo,
        waveform: WaveformTable,
    ) -> bool {
        if generation != self.generation {
            return false;
        }
        self.track = Some(info);
        self.waveform = Some(waveform);
        self.position = 0.0;
        self.state = ChannelState::Ready;
        true
    }

    /// Land a failed load if the generation still matches
    ///
    /// Clears the source so a retry of the same track re-queues instead of
    /// being treated as already loaded.
    pub fn fail_load(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.src = None;
        self.track = None;
        self.waveform = None;
        self.state = ChannelState::Empty;
        true
    }

    /// Start playback; no-op unless a decoded track is sitting ready
    pub fn play(&mut self) {
        if self.track.is_some() && matches!(self.state, ChannelState::Ready) {
            self.state = ChannelState::Playing;
        }
    }

    /// Pause playback, keeping position
    pub fn pause(&mut self) {
        if matches!(self.state, ChannelState::Playing) {
            self.state = ChannelState::Ready;
        }
    }

    /// Rewind to the start of the track
    pub fn reset(&mut self) {
        self.position = 0.0;
    }

    /// Advance the playhead while playing, clamped to track duration
    pub fn advance(&mut self, dt: f64) {
        if !matches!(self.state, ChannelState::Playing) {
            return;
        }
        if let Some(track) = &self.track {
            self.position = (self.position + dt).min(track.duration);
        }
    }

    /// Tick the active volume ramp
    ///
    /// Returns the new volume when the ramp moved it, None when no ramp is
    /// running. A completed ramp is dropped after reporting its final value.
    pub fn tick_ramp(&mut self, dt: f64) -> Option<f32> {
        let ramp = self.ramp.as_mut()?;
        let value = ramp.advance(dt);
        self.volume = value;
        if ramp.is_complete() {
            self.ramp = None;
        }
        Some(value)
    }

    /// Replace the current ramp with a new fade from the present volume
    pub fn set_ramp(&mut self, ramp: VolumeRamp) {
        self.ramp = Some(ramp);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        self.ramp = None;
    }

    pub fn set_position(&mut self, position: f64) {
        let limit = self.duration();
        self.position = position.clamp(0.0, limit);
    }

    /// Whether this channel already holds (or is loading) the given source
    pub fn matches(&self, src: &str) -> bool {
        self.src.as_deref() == Some(src)
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> f64 {
        self.track.as_ref().map(|t| t.duration).unwrap_or(0.0)
    }

    pub fn track(&self) -> Option<&TrackInfo> {
        self.track.as_ref()
    }

    pub fn waveform(&self) -> Option<&WaveformTable> {
        self.waveform.as_ref()
    }

    pub fn is_ramping(&self) -> bool {
        self.ramp.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::writer::{encode_waveform, WaveformPayload};

    fn test_waveform() -> WaveformTable {
        let payload: Vec<i16> = vec![-100, 200, -300, 400];
        let bytes = encode_waveform(1, 44100, 512, 2, WaveformPayload::Bits16(&payload));
        WaveformTable::decode(&bytes).unwrap()
    }

    fn test_info(duration: f64) -> TrackInfo {
        TrackInfo {
            duration,
            sample_rate: 44100,
        }
    }

    #[test]
    fn test_load_lifecycle() {
        let mut ch = PlaybackChannel::default();
        assert_eq!(ch.state(), ChannelState::Empty);

        let gen = ch.begin_load("a.wav");
        assert_eq!(ch.state(), ChannelState::Loading);
        assert!(ch.matches("a.wav"));

        assert!(ch.complete_load(gen, test_info(120.0), test_waveform()));
        assert_eq!(ch.state(), ChannelState::Ready);
        assert_eq!(ch.position(), 0.0);
        assert_eq!(ch.duration(), 120.0);

        ch.play();
        assert_eq!(ch.state(), ChannelState::Playing);
        ch.pause();
        assert_eq!(ch.state(), ChannelState::Ready);
    }

    #[test]
    fn test_stale_generation_is_dropped() {
        let mut ch = PlaybackChannel::default();
        let first = ch.begin_load("a.wav");
        let second = ch.begin_load("b.wav");
        assert!(second > first);

        // result for the superseded load must not land
        assert!(!ch.complete_load(first, test_info(60.0), test_waveform()));
        assert_eq!(ch.state(), ChannelState::Loading);
        assert!(ch.track().is_none());

        assert!(ch.complete_load(second, test_info(90.0), test_waveform()));
        assert_eq!(ch.duration(), 90.0);
    }

    #[test]
    fn test_failed_load_clears_source() {
        let mut ch = PlaybackChannel::default();
        let gen = ch.begin_load("broken.wav");
        assert!(ch.fail_load(gen));
        assert_eq!(ch.state(), ChannelState::Empty);
        // retrying the same source must look like a fresh load
        assert!(!ch.matches("broken.wav"));
    }

    #[test]
    fn test_play_requires_loaded_track() {
        let mut ch = PlaybackChannel::default();
        ch.play();
        assert_eq!(ch.state(), ChannelState::Empty);

        ch.begin_load("a.wav");
        ch.play();
        assert_eq!(ch.state(), ChannelState::Loading);
    }

    #[test]
    fn test_advance_clamps_at_duration() {
        let mut ch = PlaybackChannel::default();
        let gen = ch.begin_load("a.wav");
        ch.complete_load(gen, test_info(2.0), test_waveform());
        ch.play();

        ch.advance(1.5);
        assert!((ch.position() - 1.5).abs() < 1e-9);
        ch.advance(5.0);
        assert_eq!(ch.position(), 2.0);

        // paused channels do not move
        ch.pause();
        ch.set_position(1.0);
        ch.advance(0.5);
        assert_eq!(ch.position(), 1.0);
    }

    #[test]
    fn test_ramp_updates_volume_and_clears() {
        let mut ch = PlaybackChannel::default();
        ch.set_volume(1.0);
        ch.set_ramp(VolumeRamp::new(1.0, 0.0, 0.4));

        let v = ch.tick_ramp(0.2).unwrap();
        assert!((v - 0.5).abs() < 1e-6);
        assert!(ch.is_ramping());

        let v = ch.tick_ramp(0.3).unwrap();
        assert_eq!(v, 0.0);
        assert!(!ch.is_ramping());
        assert!(ch.tick_ramp(0.1).is_none());
    }

    #[test]
    fn test_set_position_clamps_to_track() {
        let mut ch = PlaybackChannel::default();
        let gen = ch.begin_load("a.wav");
        ch.complete_load(gen, test_info(10.0), test_waveform());

        ch.set_position(25.0);
        assert_eq!(ch.position(), 10.0);
        ch.set_position(-3.0);
        assert_eq!(ch.position(), 0.0);
    }
}
