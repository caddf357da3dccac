//! Standard locations for platter media and configuration

use std::path::PathBuf;

/// Root directory for tracks and their sidecar tables
///
/// Returns `~/Music/platter`.
pub fn default_media_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Music")
        .join("platter")
}

/// Config file location under the media root
pub fn default_config_path(filename: &str) -> PathBuf {
    default_media_root().join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_root_ends_with_platter() {
        assert!(default_media_root().ends_with("platter"));
    }

    #[test]
    fn test_config_path_includes_filename() {
        assert!(default_config_path("engine.yaml").ends_with("engine.yaml"));
    }
}
