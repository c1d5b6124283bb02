mod config;

pub use config::Config;

/// Format a duration in seconds as `m:ss` for the HUD time readout.
pub fn format_time(secs: f32) -> String {
    let total = secs.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
