//! Dual-buffer gapless playback engine
//!
//! The player owns two playback channels and keeps exactly one audible at
//! steady state. Track switches run as a crossfade state machine:
//!
//! - fade the active channel down, then pause it and rewind
//! - wait for the inactive channel's load to finish (it was queued up front,
//!   so the fetch overlaps the fade)
//! - flip the current-channel selector and fade the new channel up, starting
//!   playback once the ramp lands at full volume
//!
//! While a track plays, a look-ahead inside a one-second window near the end
//! preloads the queued next track into the inactive channel, so the switch
//! that follows never blocks on a fetch. Loads are superseded by generation
//! counter: a stale result is dropped on the floor instead of flipping
//! volume late.
//!
//! The player is tick-driven: the owner calls [`GaplessPlayer::update`] once
//! per frame with the elapsed time, and reads position/volume/state through
//! shared [`PlayerAtomics`].

pub mod atomics;
pub mod channel;
pub mod fade;
pub mod loader;

use std::sync::Arc;

use crossbeam::channel::Receiver;

use crate::types::{PlayerState, NUM_CHANNELS};

pub use atomics::PlayerAtomics;
pub use channel::{ChannelState, PlaybackChannel};
pub use fade::VolumeRamp;
pub use loader::{
    ByteFetch, FsFetch, LoadDispatch, LoadError, LoadRequest, LoadResult, LoadedTrack, TrackDecoder,
    TrackInfo, TrackLoader, WavDecoder,
};

use crate::table::WaveformTable;

/// How many seconds before track end the preload look-ahead opens
const PRELOAD_LEAD_SECONDS: f64 = 10.0;
/// Width of the look-ahead window; narrow so the trigger cannot churn
const PRELOAD_WINDOW_SECONDS: f64 = 1.0;

/// Callbacks surfaced to the drawing layer
///
/// All methods default to no-ops so callers only wire what they draw.
pub trait PlayerEvents {
    /// A track switch started waiting on its load
    fn on_loading(&mut self) {}
    /// The awaited load settled, successfully or not
    fn on_loaded(&mut self) {}
    /// The audible channel's volume moved
    fn on_volume_change(&mut self, _volume: f32) {}
}

/// Event sink that ignores everything
pub struct NullEvents;

impl PlayerEvents for NullEvents {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FadePhase {
    FadingOut,
    AwaitingLoad,
    FadingIn,
}

struct Crossfade {
    /// Channel index being switched to
    target: usize,
    fade: bool,
    phase: FadePhase,
}

/// Dual-buffer player with crossfade switching and gapless look-ahead
pub struct GaplessPlayer<L: LoadDispatch, E: PlayerEvents> {
    channels: [PlaybackChannel; NUM_CHANNELS],
    current_channel: usize,
    state: PlayerState,
    crossfade: Option<Crossfade>,
    next_track: Option<(String, String)>,
    fade_seconds: f64,
    dispatch: L,
    results: Receiver<LoadResult>,
    events: E,
    atomics: Arc<PlayerAtomics>,
}

impl<L: LoadDispatch, E: PlayerEvents> GaplessPlayer<L, E> {
    pub fn new(dispatch: L, results: Receiver<LoadResult>, events: E, fade_seconds: f64) -> Self {
        Self {
            channels: [PlaybackChannel::default(), PlaybackChannel::default()],
            current_channel: 0,
            state: PlayerState::Idle,
            crossfade: None,
            next_track: None,
            fade_seconds: fade_seconds.max(0.0),
            dispatch,
            results,
            events,
            atomics: Arc::new(PlayerAtomics::new()),
        }
    }

    /// Shared snapshot handle for UI threads
    pub fn atomics(&self) -> Arc<PlayerAtomics> {
        Arc::clone(&self.atomics)
    }

    // ────────────────────────────────────────────────────────────────────────────
    // Transport interface
    // ────────────────────────────────────────────────────────────────────────────

    /// Load the first track into channel 0 without starting playback
    pub fn initialize(&mut self, track_src: &str, waveform_src: &str) {
        self.current_channel = 0;
        self.state = PlayerState::Loading;
        self.events.on_loading();
        self.queue_load(0, track_src, waveform_src);
        self.publish_atomics();
        log::info!("[PLAYER] initializing with '{}'", track_src);
    }

    /// Switch to a new track, crossfading when `fade` is set
    ///
    /// The load is queued into the inactive channel immediately so it runs
    /// under the fade-out; a channel that already holds the source (the
    /// preloaded gapless case) is reused without reloading.
    pub fn set_track(&mut self, track_src: &str, waveform_src: &str, fade: bool) {
        let target = 1 - self.current_channel;
        if !self.channels[target].matches(track_src) {
            self.queue_load(target, track_src, waveform_src);
        }

        if fade {
            let active = &mut self.channels[self.current_channel];
            let from = active.volume();
            active.set_ramp(VolumeRamp::new(from, 0.0, self.fade_seconds));
            self.crossfade = Some(Crossfade {
                target,
                fade: true,
                phase: FadePhase::FadingOut,
            });
        } else {
            let active = &mut self.channels[self.current_channel];
            active.set_volume(0.0);
            active.pause();
            active.reset();
            self.events.on_volume_change(0.0);
            self.crossfade = Some(Crossfade {
                target,
                fade: false,
                phase: FadePhase::AwaitingLoad,
            });
            self.events.on_loading();
        }
        log::info!("[PLAYER] switching to '{}' (fade: {})", track_src, fade);
    }

    /// Register the upcoming track for the gapless look-ahead
    pub fn set_next_track(&mut self, track_src: &str, waveform_src: &str) {
        self.next_track = Some((track_src.to_string(), waveform_src.to_string()));
    }

    pub fn clear_next_track(&mut self) {
        self.next_track = None;
    }

    pub fn play(&mut self) {
        if self.crossfade.is_some() {
            return; // the state machine owns playback until the switch lands
        }
        let active = &mut self.channels[self.current_channel];
        active.play();
        if active.state() == ChannelState::Playing {
            self.state = PlayerState::Playing;
        }
        self.publish_atomics();
    }

    pub fn pause(&mut self) {
        self.channels[self.current_channel].pause();
        if self.state == PlayerState::Playing {
            self.state = PlayerState::Paused;
        }
        self.publish_atomics();
    }

    /// Rewind the active channel to the start
    pub fn reset_track(&mut self) {
        self.channels[self.current_channel].reset();
        self.publish_atomics();
    }

    /// Playback position as a 0..1 fraction of the track
    pub fn position_percent(&self) -> f64 {
        let active = &self.channels[self.current_channel];
        let duration = active.duration();
        if duration <= 0.0 {
            return 0.0;
        }
        active.position() / duration
    }

    pub fn set_position_percent(&mut self, percent: f64) {
        let duration = self.channels[self.current_channel].duration();
        self.channels[self.current_channel].set_position(percent.clamp(0.0, 1.0) * duration);
        self.publish_atomics();
    }

    pub fn position_seconds(&self) -> f64 {
        self.channels[self.current_channel].position()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.channels[self.current_channel].duration()
    }

    pub fn volume(&self) -> f32 {
        self.channels[self.current_channel].volume()
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.channels[self.current_channel].state() == ChannelState::Playing
    }

    /// Source of the audible channel, if any
    pub fn track_src(&self) -> Option<&str> {
        self.channels[self.current_channel].src()
    }

    /// Waveform paired with the audible channel, for the drawing layer
    pub fn current_waveform(&self) -> Option<&WaveformTable> {
        self.channels[self.current_channel].waveform()
    }

    // ────────────────────────────────────────────────────────────────────────────
    // Tick
    // ────────────────────────────────────────────────────────────────────────────

    /// Advance the player by `dt` seconds of wall time
    ///
    /// Drains loader results, ticks volume ramps and playhead positions,
    /// drives any crossfade in progress and fires the gapless look-ahead.
    pub fn update(&mut self, dt: f64) {
        while let Ok(result) = self.results.try_recv() {
            self.handle_result(result);
        }

        for index in 0..NUM_CHANNELS {
            if let Some(volume) = self.channels[index].tick_ramp(dt) {
                if index == self.current_channel {
                    self.events.on_volume_change(volume);
                }
            }
            self.channels[index].advance(dt);
        }

        self.update_crossfade();
        self.check_preload();
        self.publish_atomics();
    }

    fn queue_load(&mut self, target: usize, track_src: &str, waveform_src: &str) {
        let generation = self.channels[target].begin_load(track_src);
        self.dispatch.dispatch(LoadRequest {
            channel: target,
            generation,
            track_src: track_src.to_string(),
            waveform_src: waveform_src.to_string(),
        });
    }

    fn handle_result(&mut self, result: LoadResult) {
        let LoadResult {
            channel,
            generation,
            outcome,
        } = result;

        match outcome {
            Ok(loaded) => {
                let landed =
                    self.channels[channel].complete_load(generation, loaded.info, loaded.waveform);
                if !landed {
                    log::debug!("[PLAYER] stale load result for channel {} ignored", channel);
                    return;
                }

                let awaited = self
                    .crossfade
                    .as_ref()
                    .map(|cf| cf.target == channel)
                    .unwrap_or(false);
                if !awaited && channel == self.current_channel && self.state == PlayerState::Loading
                {
                    // the initialize path: come up at full volume, paused
                    self.channels[channel].set_volume(1.0);
                    self.events.on_volume_change(1.0);
                    self.events.on_loaded();
                    self.state = PlayerState::Paused;
                }
            }
            Err(error) => {
                if !self.channels[channel].fail_load(generation) {
                    log::debug!("[PLAYER] stale load failure for channel {} ignored", channel);
                    return;
                }
                log::warn!("[PLAYER] load failed on channel {}: {}", channel, error);

                let awaited = self
                    .crossfade
                    .as_ref()
                    .map(|cf| cf.target == channel)
                    .unwrap_or(false);
                if awaited {
                    // the switch cannot finish: report settled, stay put
                    self.crossfade = None;
                    self.channels[self.current_channel].pause();
                    self.events.on_loaded();
                    self.state = PlayerState::Paused;
                } else if channel == self.current_channel && self.state == PlayerState::Loading {
                    self.events.on_loaded();
                    self.state = PlayerState::Paused;
                }
            }
        }
    }

    fn update_crossfade(&mut self) {
        // phases may collapse within one tick (a preloaded target skips the
        // wait entirely), so loop until the machine stops moving
        loop {
            let (target, fade, phase) = match &self.crossfade {
                Some(cf) => (cf.target, cf.fade, cf.phase),
                None => return,
            };

            match phase {
                FadePhase::FadingOut => {
                    if self.channels[self.current_channel].is_ramping() {
                        return;
                    }
                    let active = &mut self.channels[self.current_channel];
                    active.pause();
                    active.reset();
                    self.events.on_loading();
                    if let Some(cf) = self.crossfade.as_mut() {
                        cf.phase = FadePhase::AwaitingLoad;
                    }
                }
                FadePhase::AwaitingLoad => {
                    if self.channels[target].state() != ChannelState::Ready {
                        return;
                    }
                    self.events.on_loaded();
                    self.current_channel = target;
                    if fade {
                        let incoming = &mut self.channels[target];
                        incoming.set_volume(0.0);
                        incoming.set_ramp(VolumeRamp::new(0.0, 1.0, self.fade_seconds));
                        self.events.on_volume_change(0.0);
                        if let Some(cf) = self.crossfade.as_mut() {
                            cf.phase = FadePhase::FadingIn;
                        }
                        return;
                    }
                    self.channels[target].set_volume(1.0);
                    self.events.on_volume_change(1.0);
                    self.channels[target].play();
                    self.crossfade = None;
                    self.state = PlayerState::Playing;
                    return;
                }
                FadePhase::FadingIn => {
                    if self.channels[self.current_channel].is_ramping() {
                        return;
                    }
                    self.channels[self.current_channel].play();
                    self.crossfade = None;
                    self.state = PlayerState::Playing;
                    return;
                }
            }
        }
    }

    fn check_preload(&mut self) {
        if self.crossfade.is_some() {
            return;
        }
        let active = &self.channels[self.current_channel];
        if active.state() != ChannelState::Playing {
            return;
        }
        let Some((next_src, next_waveform)) = self.next_track.clone() else {
            return;
        };

        let duration = active.duration();
        let lower = (duration - PRELOAD_LEAD_SECONDS).max(0.0);
        let upper = (duration - PRELOAD_LEAD_SECONDS + PRELOAD_WINDOW_SECONDS)
            .max(lower + PRELOAD_WINDOW_SECONDS);
        let position = active.position();
        if position < lower || position >= upper {
            return;
        }

        let target = 1 - self.current_channel;
        if self.channels[target].matches(&next_src) {
            return; // already preloaded (or in flight)
        }
        log::info!("[PLAYER] preloading next track '{}'", next_src);
        self.queue_load(target, &next_src, &next_waveform);
    }

    fn publish_atomics(&self) {
        let active = &self.channels[self.current_channel];
        self.atomics.set_position(active.position());
        self.atomics.set_duration(active.duration());
        self.atomics.set_volume(active.volume());
        self.atomics.set_state(self.state);
        self.atomics.set_current_channel(self.current_channel);
        self.atomics
            .set_playing(active.state() == ChannelState::Playing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::writer::{encode_waveform, WaveformPayload};
    use crossbeam::channel::Sender;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct FakeDispatch {
        requests: Rc<RefCell<Vec<LoadRequest>>>,
    }

    impl LoadDispatch for FakeDispatch {
        fn dispatch(&mut self, request: LoadRequest) {
            self.requests.borrow_mut().push(request);
        }
    }

    #[derive(Default)]
    struct Recorder {
        log: Vec<&'static str>,
        volumes: Vec<f32>,
    }

    struct RecordingEvents(Rc<RefCell<Recorder>>);

    impl PlayerEvents for RecordingEvents {
        fn on_loading(&mut self) {
            self.0.borrow_mut().log.push("loading");
        }
        fn on_loaded(&mut self) {
            self.0.borrow_mut().log.push("loaded");
        }
        fn on_volume_change(&mut self, volume: f32) {
            self.0.borrow_mut().volumes.push(volume);
        }
    }

    type TestPlayer = GaplessPlayer<FakeDispatch, RecordingEvents>;

    fn test_player() -> (
        TestPlayer,
        Sender<LoadResult>,
        Rc<RefCell<Vec<LoadRequest>>>,
        Rc<RefCell<Recorder>>,
    ) {
        let (tx, rx) = crossbeam::channel::unbounded();
        let requests = Rc::new(RefCell::new(Vec::new()));
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let player = GaplessPlayer::new(
            FakeDispatch {
                requests: requests.clone(),
            },
            rx,
            RecordingEvents(recorder.clone()),
            0.4,
        );
        (player, tx, requests, recorder)
    }

    fn test_waveform() -> WaveformTable {
        let payload: Vec<i16> = vec![-100, 200, -300, 400];
        let bytes = encode_waveform(1, 44100, 512, 2, WaveformPayload::Bits16(&payload));
        WaveformTable::decode(&bytes).unwrap()
    }

    fn success(request: &LoadRequest, duration: f64) -> LoadResult {
        LoadResult {
            channel: request.channel,
            generation: request.generation,
            outcome: Ok(LoadedTrack {
                info: TrackInfo {
                    duration,
                    sample_rate: 44100,
                },
                waveform: test_waveform(),
            }),
        }
    }

    fn failure(request: &LoadRequest) -> LoadResult {
        LoadResult {
            channel: request.channel,
            generation: request.generation,
            outcome: Err(LoadError::Fetch {
                src: request.track_src.clone(),
                reason: "connection refused".to_string(),
            }),
        }
    }

    /// Bring a fresh player up with an initial track, landed and playing
    fn playing_player(
        duration: f64,
    ) -> (
        TestPlayer,
        Sender<LoadResult>,
        Rc<RefCell<Vec<LoadRequest>>>,
        Rc<RefCell<Recorder>>,
    ) {
        let (mut player, tx, requests, recorder) = test_player();
        player.initialize("first.wav", "first.dat");
        let request = requests.borrow().last().unwrap().clone();
        tx.send(success(&request, duration)).unwrap();
        player.update(0.016);
        player.play();
        (player, tx, requests, recorder)
    }

    fn run_fade(player: &mut TestPlayer) {
        for _ in 0..5 {
            player.update(0.1);
        }
    }

    #[test]
    fn test_initialize_lands_paused_at_full_volume() {
        let (mut player, tx, requests, recorder) = test_player();
        player.initialize("first.wav", "first.dat");

        assert_eq!(player.state(), PlayerState::Loading);
        assert_eq!(recorder.borrow().log, vec!["loading"]);
        {
            let reqs = requests.borrow();
            assert_eq!(reqs.len(), 1);
            assert_eq!(reqs[0].channel, 0);
            assert_eq!(reqs[0].track_src, "first.wav");
        }

        let request = requests.borrow()[0].clone();
        tx.send(success(&request, 120.0)).unwrap();
        player.update(0.016);

        assert_eq!(player.state(), PlayerState::Paused);
        assert!(!player.is_playing());
        assert_eq!(player.volume(), 1.0);
        assert_eq!(player.duration_seconds(), 120.0);
        assert_eq!(recorder.borrow().log, vec!["loading", "loaded"]);

        // snapshot side
        let atomics = player.atomics();
        assert_eq!(atomics.duration(), 120.0);
        assert_eq!(atomics.state(), PlayerState::Paused);
        assert!(!atomics.is_playing());

        player.play();
        assert_eq!(player.state(), PlayerState::Playing);
        player.update(0.5);
        assert!((player.position_seconds() - 0.5).abs() < 1e-9);
        assert!((atomics.position() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_superseded_track_never_becomes_audible() {
        let (mut player, tx, requests, _recorder) = playing_player(120.0);

        player.set_track("a.wav", "a.dat", true);
        let request_a = requests.borrow().last().unwrap().clone();
        assert_eq!(request_a.channel, 1);

        // second switch queued before the first load settles
        player.set_track("b.wav", "b.dat", true);
        let request_b = requests.borrow().last().unwrap().clone();
        assert_eq!(request_b.channel, 1);
        assert!(request_b.generation > request_a.generation);

        // the stale result arrives first and must be dropped
        tx.send(success(&request_a, 60.0)).unwrap();
        player.update(0.016);
        assert_eq!(player.track_src(), Some("first.wav"));

        tx.send(success(&request_b, 90.0)).unwrap();
        run_fade(&mut player); // fade-out + await + flip
        run_fade(&mut player); // fade-in

        assert_eq!(player.track_src(), Some("b.wav"));
        assert_eq!(player.duration_seconds(), 90.0);
        assert!(player.is_playing());
    }

    #[test]
    fn test_crossfade_runs_full_sequence() {
        let (mut player, tx, requests, recorder) = playing_player(120.0);
        player.update(0.016);
        recorder.borrow_mut().volumes.clear();

        player.set_track("next.wav", "next.dat", true);
        let request = requests.borrow().last().unwrap().clone();

        // fade-out: volume walks down while the load is still in flight
        player.update(0.2);
        let mid_fade = player.volume();
        assert!(mid_fade > 0.0 && mid_fade < 1.0);
        assert!(player.is_playing());

        player.update(0.2);
        assert_eq!(player.volume(), 0.0);
        assert!(!player.is_playing());
        assert_eq!(player.position_seconds(), 0.0); // rewound after the fade
        assert_eq!(recorder.borrow().log, vec!["loading", "loaded", "loading"]);

        // load settles, playback flips and fades back in
        tx.send(success(&request, 200.0)).unwrap();
        player.update(0.2);
        assert_eq!(
            recorder.borrow().log,
            vec!["loading", "loaded", "loading", "loaded"]
        );
        assert_eq!(player.track_src(), Some("next.wav"));
        assert!(!player.is_playing()); // not until the ramp tops out

        run_fade(&mut player);
        assert_eq!(player.volume(), 1.0);
        assert!(player.is_playing());
        assert_eq!(player.state(), PlayerState::Playing);

        // ramp reported every step: down to the trough, then back up to 1.0
        let volumes = recorder.borrow().volumes.clone();
        let trough = volumes.iter().position(|v| *v == 0.0).unwrap();
        assert!(volumes[..=trough].windows(2).all(|w| w[1] <= w[0]));
        assert!(volumes[trough..].windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(*volumes.last().unwrap(), 1.0);
    }

    #[test]
    fn test_no_fade_switch_is_immediate() {
        let (mut player, tx, requests, recorder) = playing_player(120.0);
        player.update(1.0);

        player.set_track("next.wav", "next.dat", false);
        // active channel is silenced and rewound synchronously
        assert_eq!(player.volume(), 0.0);
        assert!(!player.is_playing());
        assert_eq!(player.position_seconds(), 0.0);
        assert!(recorder.borrow().log.ends_with(&["loading"]));

        let request = requests.borrow().last().unwrap().clone();
        tx.send(success(&request, 30.0)).unwrap();
        player.update(0.016);

        assert_eq!(player.track_src(), Some("next.wav"));
        assert_eq!(player.volume(), 1.0);
        assert!(player.is_playing());
        assert!(recorder.borrow().log.ends_with(&["loading", "loaded"]));
    }

    #[test]
    fn test_preloaded_target_skips_reload() {
        let (mut player, tx, requests, _recorder) = playing_player(120.0);

        player.set_next_track("next.wav", "next.dat");
        player.set_position_percent(110.5 / 120.0);
        player.update(0.016);

        // look-ahead queued the next track into the inactive channel
        assert_eq!(requests.borrow().len(), 2);
        let preload = requests.borrow().last().unwrap().clone();
        assert_eq!(preload.channel, 1);
        assert_eq!(preload.track_src, "next.wav");

        // further ticks inside the window must not re-queue
        player.update(0.016);
        player.update(0.016);
        assert_eq!(requests.borrow().len(), 2);

        tx.send(success(&preload, 180.0)).unwrap();
        player.update(0.016);

        // the switch reuses the preloaded channel: no third request
        player.set_track("next.wav", "next.dat", true);
        assert_eq!(requests.borrow().len(), 2);
        run_fade(&mut player);
        run_fade(&mut player);
        assert_eq!(player.track_src(), Some("next.wav"));
        assert!(player.is_playing());
    }

    #[test]
    fn test_short_track_preload_window_clamps_to_start() {
        let (mut player, _tx, requests, _recorder) = playing_player(5.0);

        player.set_next_track("next.wav", "next.dat");
        // for a 5s track the window collapses to [0, 1)
        player.update(0.5);
        assert_eq!(requests.borrow().len(), 2);
        assert_eq!(requests.borrow().last().unwrap().track_src, "next.wav");

        // past the window nothing further fires
        player.update(1.0);
        player.update(1.0);
        assert_eq!(requests.borrow().len(), 2);
    }

    #[test]
    fn test_load_failure_settles_without_playback() {
        let (mut player, tx, requests, recorder) = playing_player(120.0);

        player.set_track("broken.wav", "broken.dat", true);
        let request = requests.borrow().last().unwrap().clone();
        run_fade(&mut player); // fade-out completes, machine now awaits the load

        tx.send(failure(&request)).unwrap();
        player.update(0.016);

        // loaded still fires so the drawing layer clears its indicator
        assert!(recorder.borrow().log.ends_with(&["loading", "loaded"]));
        assert_eq!(player.state(), PlayerState::Paused);
        assert!(!player.is_playing());
        assert_eq!(player.track_src(), Some("first.wav"));

        // the failed source was cleared, so a retry issues a fresh request
        player.set_track("broken.wav", "broken.dat", true);
        let retry = requests.borrow().last().unwrap().clone();
        assert_eq!(retry.track_src, "broken.wav");
        assert!(retry.generation > request.generation);
    }

    #[test]
    fn test_position_percent_maps_to_duration() {
        let (mut player, _tx, _requests, _recorder) = playing_player(120.0);

        player.set_position_percent(0.25);
        assert!((player.position_seconds() - 30.0).abs() < 1e-9);
        assert!((player.position_percent() - 0.25).abs() < 1e-9);

        player.set_position_percent(4.0);
        assert_eq!(player.position_seconds(), 120.0);
        player.set_position_percent(-1.0);
        assert_eq!(player.position_seconds(), 0.0);
    }

    #[test]
    fn test_playhead_clamps_at_track_end() {
        let (mut player, _tx, _requests, _recorder) = playing_player(2.0);
        player.update(1.5);
        player.update(1.5);
        assert_eq!(player.position_seconds(), 2.0);
        assert!((player.position_percent() - 1.0).abs() < 1e-9);
    }

    fn write_fixture(dir: &std::path::Path, name: &str, seconds: f64) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(dir.join(format!("{name}.wav")), spec).unwrap();
        for i in 0..(seconds * 8000.0) as usize {
            let s = ((i as f32 * 0.05).sin() * 8000.0) as i16;
            writer.write_sample(s).unwrap();
            writer.write_sample(-s).unwrap();
        }
        writer.finalize().unwrap();

        let payload: Vec<i16> = vec![-500, 1000, -800, 600];
        let bytes = encode_waveform(1, 8000, 512, 2, WaveformPayload::Bits16(&payload));
        std::fs::write(dir.join(format!("{name}.dat")), bytes).unwrap();
    }

    /// Drives update() until `done` holds or the background loader times out.
    fn pump<L: LoadDispatch, E: PlayerEvents>(
        player: &mut GaplessPlayer<L, E>,
        done: impl Fn(&GaplessPlayer<L, E>) -> bool,
    ) {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while !done(player) {
            assert!(
                std::time::Instant::now() < deadline,
                "loader result never reached the player"
            );
            player.update(0.016);
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
    }

    #[test]
    fn test_player_runs_against_background_loader() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "first", 2.0);
        write_fixture(dir.path(), "second", 1.0);

        let loader = TrackLoader::spawn(FsFetch::new(dir.path()), WavDecoder);
        let results = loader.result_receiver();
        let mut player = GaplessPlayer::new(loader, results, NullEvents, 0.0);

        player.initialize("first.wav", "first.dat");
        pump(&mut player, |p| p.state() != PlayerState::Loading);

        assert_eq!(player.state(), PlayerState::Paused);
        assert!((player.duration_seconds() - 2.0).abs() < 1e-6);
        assert!(player.current_waveform().is_some());

        player.play();
        assert!(player.is_playing());
        player.update(0.25);
        assert!((player.position_seconds() - 0.25).abs() < 1e-9);

        // a no-fade switch settles on the real loader thread too
        player.set_track("second.wav", "second.dat", false);
        pump(&mut player, |p| p.track_src() == Some("second.wav"));

        assert!(player.is_playing());
        assert!((player.duration_seconds() - 1.0).abs() < 1e-6);
        assert_eq!(player.position_seconds(), 0.0);
    }
}
