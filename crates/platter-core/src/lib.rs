//! Platter Core - Binary DSP tables, circular resampling and gapless playback

pub mod config;
pub mod dsp;
pub mod player;
pub mod table;
pub mod types;

pub use types::*;
