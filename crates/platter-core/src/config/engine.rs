//! Engine configuration
//!
//! One YAML file holds the playback and rendering knobs that differ between
//! installs: crossfade length, idle shutoff, render profile and where the
//! precomputed tables live.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::default_media_root;

/// Rendering profile, selecting the frame-rate policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderProfile {
    /// Render at the display's native refresh rate
    #[default]
    Desktop,
    /// Throttle to 30 fps to save battery
    Mobile,
}

impl RenderProfile {
    /// Minimum interval between processed frames, if throttled
    pub fn min_frame_interval_ms(&self) -> Option<f64> {
        match self {
            RenderProfile::Desktop => None,
            RenderProfile::Mobile => Some(1000.0 / 30.0),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Render profile controlling frame throttling
    /// Default: desktop (uncapped)
    pub profile: RenderProfile,

    /// Crossfade ramp length in seconds for track switches
    /// Default: 0.4
    pub fade_seconds: f64,

    /// Seconds of paused inactivity before rendering suspends
    /// Default: 3.5
    pub idle_timeout_seconds: f64,

    /// Directory holding tracks and their sidecar tables
    /// Default: `~/Music/platter`
    pub media_root: PathBuf,

    /// Interpolation kernel table file, relative to `media_root`
    /// Default: fir.dat
    pub fir_table: String,

    /// Constant-Q table file, relative to `media_root`
    /// Default: cqt.dat
    pub cqt_table: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profile: RenderProfile::default(),
            fade_seconds: 0.4,
            idle_timeout_seconds: 3.5,
            media_root: default_media_root(),
            fir_table: "fir.dat".to_string(),
            cqt_table: "cqt.dat".to_string(),
        }
    }
}
