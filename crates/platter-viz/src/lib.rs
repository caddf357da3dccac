//! Circular spectrum visualization for the platter playback engine
//!
//! This crate turns the player's audio into the frame-by-frame data a
//! drawing layer needs, without doing any drawing itself:
//!
//! - **Analysis**: Hann-windowed FFT over the most recent stereo frames,
//!   producing the dense magnitude rows the constant-Q matrix consumes
//! - **Projection**: left and mirrored right constant-Q bins concatenated
//!   into a closed spectral ring and sinc-resampled onto the fixed circle
//! - **Scheduling**: a frame-ticker callback with mobile throttling, an
//!   idle shutoff for paused decks and page-visibility coupling
//!
//! ## Capability seams
//!
//! Hosts plug in at three traits: [`FrameTicker`] (who calls us),
//! [`AnalysisSource`] (where samples come from) and [`RenderBackend`]
//! (where the frame goes). The shipped [`FftAnalyzer`] covers the common
//! analysis case; backends are always host-provided.

pub mod analysis;
pub mod render;
pub mod scheduler;
pub mod ticker;

pub use analysis::{AnalysisSource, FftAnalyzer, StereoChannel, PHASE_FRAME_COUNT};
pub use render::{FrameParams, RenderBackend};
pub use scheduler::RenderScheduler;
pub use ticker::{FrameTicker, TickerFlag};
