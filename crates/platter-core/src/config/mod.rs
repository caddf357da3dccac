//! Configuration for the playback and visualization engine
//!
//! - generic YAML load/save helpers
//! - standard media and config file locations
//! - the engine knob set shared by the player and the render scheduler

mod engine;
mod io;
mod paths;

pub use engine::{EngineConfig, RenderProfile};
pub use io::{load_config, save_config};
pub use paths::{default_config_path, default_media_root};
