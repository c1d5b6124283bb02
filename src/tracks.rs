//! Track metadata loading and color normalization.
//!
//! Tracks are described in a TOML file (`tracks.toml` by default): title,
//! audio file, thumbnail, a three-color theme and an optional beat
//! sensitivity. Theme colors may be RGB triples or hex strings; both are
//! normalized to one canonical triple at load time.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// An RGB color in the 0-255 float convention used throughout the renderer.
pub type Rgb = [f32; 3];

/// Fallback for malformed color fields: opaque white.
pub const FALLBACK_COLOR: Rgb = [255.0, 255.0, 255.0];

const DEFAULT_SENSITIVITY: f32 = 1.0;

/// A theme color as written in the track file: either a triple or a hex
/// string like `"#00FF00"` / `"#0f0"`.
#[derive(Deserialize, Clone, Debug)]
#[serde(untagged)]
pub enum ColorSpec {
    Triple([f32; 3]),
    Hex(String),
}

impl ColorSpec {
    /// Normalize to a canonical RGB triple. Malformed input falls back to
    /// opaque white rather than failing the load.
    pub fn normalize(&self) -> Rgb {
        match self {
            ColorSpec::Triple(t) => [
                t[0].clamp(0.0, 255.0),
                t[1].clamp(0.0, 255.0),
                t[2].clamp(0.0, 255.0),
            ],
            ColorSpec::Hex(s) => parse_hex(s).unwrap_or(FALLBACK_COLOR),
        }
    }
}

fn parse_hex(s: &str) -> Option<Rgb> {
    let hex = s.strip_prefix('#')?;
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let value = u32::from_str_radix(&expanded, 16).ok()?;
    Some([
        ((value >> 16) & 0xFF) as f32,
        ((value >> 8) & 0xFF) as f32,
        (value & 0xFF) as f32,
    ])
}

/// One entry as deserialized from the track file.
#[derive(Deserialize)]
struct TrackSpec {
    title: String,
    audio: PathBuf,
    #[serde(default)]
    thumbnail: Option<PathBuf>,
    base: Option<ColorSpec>,
    accent: Option<ColorSpec>,
    pulse: Option<ColorSpec>,
    sensitivity: Option<f32>,
}

#[derive(Deserialize)]
struct TrackFile {
    #[serde(default)]
    tracks: Vec<TrackSpec>,
}

/// Immutable track metadata, colors already normalized.
#[derive(Clone, Debug)]
pub struct Track {
    pub title: String,
    pub audio: PathBuf,
    #[allow(dead_code)]
    pub thumbnail: Option<PathBuf>,
    pub base: Rgb,
    pub accent: Rgb,
    pub pulse: Rgb,
    pub sensitivity: f32,
}

impl From<TrackSpec> for Track {
    fn from(spec: TrackSpec) -> Self {
        let normalize = |c: &Option<ColorSpec>| {
            c.as_ref().map(ColorSpec::normalize).unwrap_or(FALLBACK_COLOR)
        };
        Self {
            title: spec.title,
            audio: spec.audio,
            thumbnail: spec.thumbnail,
            base: normalize(&spec.base),
            accent: normalize(&spec.accent),
            pulse: normalize(&spec.pulse),
            sensitivity: spec.sensitivity.unwrap_or(DEFAULT_SENSITIVITY),
        }
    }
}

/// Load the track list. A missing or unparseable file yields an empty list
/// (the app then runs in the idle scene) with a warning, never a crash.
pub fn load_tracks(path: &std::path::Path) -> Vec<Track> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("No track file at {:?}: {}", path, e);
            return Vec::new();
        }
    };

    match toml::from_str::<TrackFile>(&contents) {
        Ok(file) => {
            let tracks: Vec<Track> = file.tracks.into_iter().map(Track::from).collect();
            println!("Loaded {} tracks from {:?}", tracks.len(), path);
            tracks
        }
        Err(e) => {
            eprintln!("Failed to parse {:?}: {}", path, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_string_normalizes_to_triple() {
        let c = ColorSpec::Hex("#00FF00".to_string());
        assert_eq!(c.normalize(), [0.0, 255.0, 0.0]);
    }

    #[test]
    fn short_hex_expands() {
        let c = ColorSpec::Hex("#0f0".to_string());
        assert_eq!(c.normalize(), [0.0, 255.0, 0.0]);
    }

    #[test]
    fn triple_passes_through_unchanged() {
        let c = ColorSpec::Triple([10.0, 20.0, 30.0]);
        assert_eq!(c.normalize(), [10.0, 20.0, 30.0]);
    }

    #[test]
    fn invalid_hex_falls_back_to_white() {
        assert_eq!(
            ColorSpec::Hex("not-a-color".to_string()).normalize(),
            FALLBACK_COLOR
        );
        assert_eq!(ColorSpec::Hex("#12345".to_string()).normalize(), FALLBACK_COLOR);
    }

    #[test]
    fn out_of_range_triple_is_clamped() {
        let c = ColorSpec::Triple([-5.0, 300.0, 128.0]);
        assert_eq!(c.normalize(), [0.0, 255.0, 128.0]);
    }

    #[test]
    fn track_file_parses_mixed_color_forms() {
        let toml_src = r##"
            [[tracks]]
            title = "First"
            audio = "music/first.mp3"
            base = [0, 180, 255]
            accent = "#A0C8FF"
            pulse = [80, 200, 255]
            sensitivity = 1.5

            [[tracks]]
            title = "Second"
            audio = "music/second.mp3"
        "##;
        let file: TrackFile = toml::from_str(toml_src).unwrap();
        let tracks: Vec<Track> = file.tracks.into_iter().map(Track::from).collect();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].base, [0.0, 180.0, 255.0]);
        assert_eq!(tracks[0].accent, [160.0, 200.0, 255.0]);
        assert_eq!(tracks[0].sensitivity, 1.5);
        // Missing fields default to white / 1.0
        assert_eq!(tracks[1].base, FALLBACK_COLOR);
        assert_eq!(tracks[1].sensitivity, 1.0);
    }
}
