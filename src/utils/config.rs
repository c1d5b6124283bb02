//! Configuration file management.
//!
//! Handles loading user preferences from `~/.pulse-viz.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_PARTICLE_COUNT: usize = 500;
const CONSTRAINED_PARTICLE_COUNT: usize = 150;
const DEFAULT_VOLUME: f32 = 0.8;
const DEFAULT_TRACKS_FILE: &str = "tracks.toml";

const CONFIG_TEMPLATE: &str = r#"# pulse-viz configuration file

# Track list location (default: tracks.toml in the working directory)
# tracks_file = "tracks.toml"

# Start in fullscreen (default: false)
# fullscreen = false

# Initial playback volume, 0.0 - 1.0 (default: 0.8)
# default_volume = 0.8

# =============================================================================
# Performance
# =============================================================================

# Ambient particle count (default: 500)
# particle_count = 500

# Constrained profile for weaker machines: caps particles at 150 unless
# particle_count is set explicitly (default: false)
# constrained = false
"#;

#[derive(Serialize, Deserialize, Default)]
pub struct Config {
    pub tracks_file: Option<String>,
    pub fullscreen: Option<bool>,
    pub default_volume: Option<f32>,
    pub particle_count: Option<usize>,
    pub constrained: Option<bool>,
}

impl Config {
    fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".pulse-viz.toml"))
    }

    pub fn load() -> Self {
        let path = match Self::path() {
            Some(p) => p,
            None => return Self::default(),
        };

        // Create template file if it doesn't exist
        if !path.exists() {
            let _ = fs::write(&path, CONFIG_TEMPLATE);
            println!("Created config template at {:?}", path);
        }

        fs::read_to_string(&path)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    pub fn tracks_file(&self) -> PathBuf {
        PathBuf::from(self.tracks_file.as_deref().unwrap_or(DEFAULT_TRACKS_FILE))
    }

    pub fn fullscreen(&self) -> bool {
        self.fullscreen.unwrap_or(false)
    }

    pub fn default_volume(&self) -> f32 {
        self.default_volume.unwrap_or(DEFAULT_VOLUME).clamp(0.0, 1.0)
    }

    /// Particle pool size. An explicit `particle_count` always wins; the
    /// constrained profile only lowers the default.
    pub fn particle_count(&self) -> usize {
        if let Some(n) = self.particle_count {
            return n;
        }
        if self.constrained.unwrap_or(false) {
            CONSTRAINED_PARTICLE_COUNT
        } else {
            DEFAULT_PARTICLE_COUNT
        }
    }
}
