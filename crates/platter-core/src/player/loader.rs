//! Background track loading service
//!
//! Fetching and decoding a track (plus its paired waveform table) happens off
//! the playback tick on a dedicated thread. Requests and results travel over
//! crossbeam channels; the player drains the result receiver once per tick
//! and drops any result whose generation no longer matches the channel it was
//! issued for, so a superseded load can never flip volume or start playback
//! late.

use std::io::Read;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use thiserror::Error;

use crate::table::{TableError, WaveformTable};

// ────────────────────────────────────────────────────────────────────────────────
// Errors and capability traits
// ────────────────────────────────────────────────────────────────────────────────

/// Errors from a playback channel load
///
/// These are recoverable: the player surfaces them through the loaded
/// callback without starting playback, and the caller may re-queue.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Source bytes could not be fetched
    #[error("fetch failed for {src}: {reason}")]
    Fetch { src: String, reason: String },

    /// Fetched bytes could not be decoded as audio
    #[error("decode failed for {src}: {reason}")]
    Decode { src: String, reason: String },

    /// The paired waveform table was invalid
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Byte-fetch capability: maps a source identifier to raw bytes
///
/// HTTP, filesystem or cache-backed; the loader does not care which.
pub trait ByteFetch: Send + 'static {
    fn fetch(&self, src: &str) -> Result<Vec<u8>, LoadError>;
}

/// Audio probe capability: extracts playable metadata from fetched bytes
pub trait TrackDecoder: Send + 'static {
    fn probe(&self, src: &str, bytes: &[u8]) -> Result<TrackInfo, LoadError>;
}

/// Metadata the player needs from a decoded track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    /// Track duration in seconds
    pub duration: f64,
    /// Decoded sample rate
    pub sample_rate: u32,
}

// ────────────────────────────────────────────────────────────────────────────────
// Requests and results
// ────────────────────────────────────────────────────────────────────────────────

/// Request to load a track and its waveform table into one playback channel
#[derive(Debug, Clone)]
pub struct LoadRequest {
    /// Target playback channel (0 or 1)
    pub channel: usize,
    /// Generation the channel was at when this load was queued
    pub generation: u64,
    /// Audio source identifier
    pub track_src: String,
    /// Waveform table source identifier
    pub waveform_src: String,
}

/// Completed load, successful or not
pub struct LoadResult {
    pub channel: usize,
    pub generation: u64,
    pub outcome: Result<LoadedTrack, LoadError>,
}

/// Everything a channel needs to become ready
pub struct LoadedTrack {
    pub info: TrackInfo,
    pub waveform: WaveformTable,
}

/// Sink for load requests
///
/// The player only needs to hand requests somewhere; splitting this out keeps
/// the crossfade logic testable with a captured request list instead of a
/// live thread.
pub trait LoadDispatch {
    fn dispatch(&mut self, request: LoadRequest);
}

// ────────────────────────────────────────────────────────────────────────────────
// TrackLoader service
// ────────────────────────────────────────────────────────────────────────────────

/// Background loader thread handle
///
/// Dropping the loader closes the request channel and lets the thread drain
/// and exit.
pub struct TrackLoader {
    request_tx: Sender<LoadRequest>,
    result_rx: Receiver<LoadResult>,
    _handle: JoinHandle<()>,
}

impl TrackLoader {
    /// Spawn the loader thread with the given fetch and decode capabilities
    pub fn spawn(fetch: impl ByteFetch, decoder: impl TrackDecoder) -> Self {
        let (request_tx, request_rx) = channel::unbounded::<LoadRequest>();
        let (result_tx, result_rx) = channel::unbounded::<LoadResult>();

        let handle = thread::Builder::new()
            .name("track-loader".to_string())
            .spawn(move || {
                loader_thread(request_rx, result_tx, fetch, decoder);
            })
            .expect("Failed to spawn track loader thread");

        Self {
            request_tx,
            result_rx,
            _handle: handle,
        }
    }

    /// Queue a load request (non-blocking)
    pub fn request(&self, request: LoadRequest) {
        if self.request_tx.send(request).is_err() {
            log::error!("[LOADER] loader thread is gone, request dropped");
        }
    }

    /// Clonable receiver for the player's per-tick drain
    pub fn result_receiver(&self) -> Receiver<LoadResult> {
        self.result_rx.clone()
    }

    /// Pop one completed load if available
    pub fn try_recv(&self) -> Option<LoadResult> {
        match self.result_rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

impl LoadDispatch for TrackLoader {
    fn dispatch(&mut self, request: LoadRequest) {
        self.request(request);
    }
}

fn loader_thread(
    request_rx: Receiver<LoadRequest>,
    result_tx: Sender<LoadResult>,
    fetch: impl ByteFetch,
    decoder: impl TrackDecoder,
) {
    log::info!("[LOADER] track loader started");

    for request in request_rx.iter() {
        let started = Instant::now();
        let channel = request.channel;
        let generation = request.generation;
        let src = request.track_src.clone();

        let outcome = handle_load(request, &fetch, &decoder);
        match &outcome {
            Ok(loaded) => log::info!(
                "[LOADER] loaded '{}' ({:.1}s) in {}ms",
                src,
                loaded.info.duration,
                started.elapsed().as_millis()
            ),
            Err(e) => log::warn!("[LOADER] load failed for '{}': {}", src, e),
        }

        let sent = result_tx.send(LoadResult {
            channel,
            generation,
            outcome,
        });
        if sent.is_err() {
            break; // player side hung up
        }
    }

    log::info!("[LOADER] track loader stopped");
}

fn handle_load(
    request: LoadRequest,
    fetch: &impl ByteFetch,
    decoder: &impl TrackDecoder,
) -> Result<LoadedTrack, LoadError> {
    let track_bytes = fetch.fetch(&request.track_src)?;
    let info = decoder.probe(&request.track_src, &track_bytes)?;

    let waveform_bytes = fetch.fetch(&request.waveform_src)?;
    let waveform = WaveformTable::decode(&waveform_bytes)?;

    Ok(LoadedTrack { info, waveform })
}

// ────────────────────────────────────────────────────────────────────────────────
// Shipped capabilities
// ────────────────────────────────────────────────────────────────────────────────

/// Filesystem fetcher: resolves sources relative to a root directory
pub struct FsFetch {
    root: PathBuf,
}

impl FsFetch {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ByteFetch for FsFetch {
    fn fetch(&self, src: &str) -> Result<Vec<u8>, LoadError> {
        let path = self.root.join(src);
        let mut bytes = Vec::new();
        std::fs::File::open(&path)
            .and_then(|mut f| f.read_to_end(&mut bytes))
            .map_err(|e| LoadError::Fetch {
                src: src.to_string(),
                reason: e.to_string(),
            })?;
        Ok(bytes)
    }
}

/// WAV probe backed by hound
pub struct WavDecoder;

impl TrackDecoder for WavDecoder {
    fn probe(&self, src: &str, bytes: &[u8]) -> Result<TrackInfo, LoadError> {
        let reader =
            hound::WavReader::new(std::io::Cursor::new(bytes)).map_err(|e| LoadError::Decode {
                src: src.to_string(),
                reason: e.to_string(),
            })?;
        let spec = reader.spec();
        let frames = reader.duration();
        Ok(TrackInfo {
            duration: frames as f64 / spec.sample_rate as f64,
            sample_rate: spec.sample_rate,
        })
    }
}
