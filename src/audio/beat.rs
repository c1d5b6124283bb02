//! Per-frame beat predicate.
//!
//! A frame counts as a beat when mid-band energy rises far enough above the
//! spectrum average; how far is scaled by the per-track sensitivity.

use super::AnalysisSnapshot;

/// Energy offset above average required for a beat at sensitivity 1.0.
const BEAT_OFFSET: f32 = 30.0;

pub struct BeatDetector {
    sensitivity: f32,
}

impl BeatDetector {
    pub fn new() -> Self {
        Self { sensitivity: 1.0 }
    }

    /// Set the per-track sensitivity (higher = harder to trigger).
    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity.max(0.0);
    }

    /// Stateless per-frame predicate: `mid > average + 30 * sensitivity`.
    pub fn is_beat(&self, snapshot: &AnalysisSnapshot) -> bool {
        snapshot.mid > snapshot.average + BEAT_OFFSET * self.sensitivity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(mid: f32, average: f32) -> AnalysisSnapshot {
        AnalysisSnapshot {
            spectrum: vec![average; 8],
            waveform: vec![0.0; 8],
            bass: 0.0,
            mid,
            treble: 0.0,
            average,
        }
    }

    #[test]
    fn beat_fires_at_default_sensitivity() {
        let detector = BeatDetector::new();
        // 80 > 40 + 30
        assert!(detector.is_beat(&snapshot(80.0, 40.0)));
    }

    #[test]
    fn higher_sensitivity_suppresses_the_same_frame() {
        let mut detector = BeatDetector::new();
        detector.set_sensitivity(2.0);
        // 80 < 40 + 60
        assert!(!detector.is_beat(&snapshot(80.0, 40.0)));
    }

    #[test]
    fn threshold_is_strict() {
        let detector = BeatDetector::new();
        assert!(!detector.is_beat(&snapshot(70.0, 40.0)));
    }
}
