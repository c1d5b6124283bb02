//! Spectrum analysis over the decoded track buffer.
//!
//! Produces one `AnalysisSnapshot` per render tick: a 256-bin byte spectrum
//! (0-255, temporally smoothed), a waveform window and bass/mid/treble band
//! energies following the p5.js band conventions the visuals were tuned
//! against. The analyzer is attached to the decoded samples of whichever
//! track is active; re-attaching discards all prior state so a track switch
//! never bleeds stale spectrum data into the new track's first frames.

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Number of spectrum bins handed to the renderer.
pub const NUM_BINS: usize = 256;

/// Samples in the per-tick waveform window.
pub const WAVEFORM_SAMPLES: usize = 1024;

/// FFT size - large enough for usable low-frequency resolution
/// (at 44.1kHz: ~21.5 Hz per raw bin).
const FFT_SIZE: usize = 2048;

/// Temporal smoothing factor for spectrum bins (p5.FFT default 0.9).
const SMOOTHING: f32 = 0.9;

/// Band edges in Hz (bass / mid / treble, p5.js getEnergy convention).
const BASS_HZ: (f32, f32) = (20.0, 140.0);
const MID_HZ: (f32, f32) = (400.0, 2600.0);
const TREBLE_HZ: (f32, f32) = (5200.0, 14000.0);

/// Per-frame analysis results. Transient: recomputed every tick, never stored
/// beyond the frame that consumed it.
#[derive(Clone)]
pub struct AnalysisSnapshot {
    /// Spectrum magnitudes, 0-255 per bin.
    pub spectrum: Vec<f32>,
    /// Raw waveform window, -1..1.
    pub waveform: Vec<f32>,
    /// Bass band energy, 0-255.
    pub bass: f32,
    /// Mid band energy, 0-255.
    pub mid: f32,
    /// Treble band energy, 0-255.
    pub treble: f32,
    /// Arithmetic mean of the spectrum bins.
    pub average: f32,
}

struct AttachedSource {
    samples: Vec<f32>,
    sample_rate: f32,
}

/// FFT wrapper bound to the currently playing track's decoded samples.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    fft_buffer: Vec<Complex<f32>>,
    fft_window: Vec<f32>,
    smoothed: Vec<f32>,
    source: Option<AttachedSource>,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        // Pre-compute Hann window
        let fft_window: Vec<f32> = (0..FFT_SIZE)
            .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / FFT_SIZE as f32).cos()))
            .collect();

        Self {
            fft,
            fft_buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            fft_window,
            smoothed: vec![0.0; NUM_BINS],
            source: None,
        }
    }

    /// Bind to a newly decoded track. Clears all smoothing state first.
    pub fn attach(&mut self, samples: Vec<f32>, sample_rate: f32) {
        self.detach();
        if sample_rate <= 0.0 {
            eprintln!("Refusing analyzer attach with sample rate {}", sample_rate);
            return;
        }
        self.source = Some(AttachedSource {
            samples,
            sample_rate,
        });
    }

    /// Drop the current source and reset smoothing state.
    pub fn detach(&mut self) {
        self.source = None;
        self.smoothed.iter_mut().for_each(|b| *b = 0.0);
    }

    pub fn is_attached(&self) -> bool {
        self.source.is_some()
    }

    /// Analyze the window at `position` seconds into the track. Returns
    /// `None` when no source is attached or the playhead is outside the
    /// decoded buffer; callers fall back to the idle scene.
    pub fn analyze(&mut self, position: f32) -> Option<AnalysisSnapshot> {
        let source = self.source.as_ref()?;
        if position < 0.0 {
            return None;
        }

        let start = (position * source.sample_rate) as usize;
        if start >= source.samples.len() {
            return None;
        }

        // Window + zero-pad past the end of the buffer
        let available = &source.samples[start..];
        for i in 0..FFT_SIZE {
            let s = available.get(i).copied().unwrap_or(0.0);
            self.fft_buffer[i] = Complex::new(s * self.fft_window[i], 0.0);
        }
        self.fft.process(&mut self.fft_buffer);

        // Collapse FFT_SIZE/2 raw bins into NUM_BINS byte-scale bins,
        // smoothing each against the previous frame.
        let group = (FFT_SIZE / 2) / NUM_BINS;
        let mut spectrum = vec![0.0; NUM_BINS];
        for (i, bin) in spectrum.iter_mut().enumerate() {
            let lo = i * group;
            let raw: f32 = self.fft_buffer[lo..lo + group]
                .iter()
                .map(|c| c.norm() / FFT_SIZE as f32)
                .sum::<f32>()
                / group as f32;

            // Web-Audio-style byte mapping: -100..-30 dB onto 0..255
            let db = 20.0 * (raw + 1e-10).log10();
            let byte = ((db + 100.0) / 70.0 * 255.0).clamp(0.0, 255.0);

            self.smoothed[i] = self.smoothed[i] * SMOOTHING + byte * (1.0 - SMOOTHING);
            *bin = self.smoothed[i];
        }

        let bin_width = source.sample_rate / 2.0 / NUM_BINS as f32;
        let bass = band_energy(&spectrum, bin_width, BASS_HZ);
        let mid = band_energy(&spectrum, bin_width, MID_HZ);
        let treble = band_energy(&spectrum, bin_width, TREBLE_HZ);
        let average = spectrum.iter().sum::<f32>() / NUM_BINS as f32;

        let waveform: Vec<f32> = (0..WAVEFORM_SAMPLES)
            .map(|i| available.get(i).copied().unwrap_or(0.0))
            .collect();

        Some(AnalysisSnapshot {
            spectrum,
            waveform,
            bass,
            mid,
            treble,
            average,
        })
    }
}

/// Average bin magnitude over a frequency range, 0-255.
fn band_energy(spectrum: &[f32], bin_width: f32, range: (f32, f32)) -> f32 {
    let lo = ((range.0 / bin_width) as usize).min(spectrum.len() - 1);
    let hi = ((range.1 / bin_width).ceil() as usize)
        .clamp(lo + 1, spectrum.len());
    spectrum[lo..hi].iter().sum::<f32>() / (hi - lo) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, rate: f32, secs: f32) -> Vec<f32> {
        let n = (rate * secs) as usize;
        (0..n)
            .map(|i| (std::f32::consts::TAU * freq * i as f32 / rate).sin() * 0.8)
            .collect()
    }

    #[test]
    fn unattached_analyzer_returns_none() {
        let mut analyzer = SpectrumAnalyzer::new();
        assert!(analyzer.analyze(0.0).is_none());
    }

    #[test]
    fn position_past_end_returns_none() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.attach(vec![0.0; 4410], 44100.0);
        assert!(analyzer.analyze(0.05).is_some());
        assert!(analyzer.analyze(10.0).is_none());
        assert!(analyzer.analyze(-1.0).is_none());
    }

    #[test]
    fn pure_tone_lands_in_its_band() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.attach(sine(1000.0, 44100.0, 2.0), 44100.0);

        // Let smoothing settle
        let mut snapshot = None;
        for _ in 0..60 {
            snapshot = analyzer.analyze(0.5);
        }
        let s = snapshot.unwrap();
        assert!(s.mid > s.bass, "mid {} should exceed bass {}", s.mid, s.bass);
        assert!(s.mid > s.treble, "mid {} should exceed treble {}", s.mid, s.treble);
        assert!(s.spectrum.len() == NUM_BINS);
        assert!(s.waveform.len() == WAVEFORM_SAMPLES);
    }

    #[test]
    fn reattach_discards_prior_state() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.attach(sine(1000.0, 44100.0, 1.0), 44100.0);
        for _ in 0..60 {
            analyzer.analyze(0.2);
        }

        // New attach must start from cleared smoothing: silence should not
        // inherit the previous track's energy.
        analyzer.attach(vec![0.0; 44100], 44100.0);
        let s = analyzer.analyze(0.2).unwrap();
        assert!(
            s.average < 1.0,
            "stale spectrum bled through a track switch: {}",
            s.average
        );
    }

    #[test]
    fn detach_makes_analysis_unavailable() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.attach(vec![0.1; 44100], 44100.0);
        assert!(analyzer.is_attached());
        analyzer.detach();
        assert!(!analyzer.is_attached());
        assert!(analyzer.analyze(0.0).is_none());
    }
}
