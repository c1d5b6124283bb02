//! Visualizer session: the state machine behind the render loop.
//!
//! Owns the track list, the playback transport, the analyzer and the frame
//! renderer, and wires them together once per tick. Track switches are
//! asynchronous: selecting a track stops playback, detaches analysis and
//! requests a background decode; the completed decode is picked up on a
//! later tick and playback starts from zero.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;

use crate::audio::{
    spawn_decode, AnalysisSnapshot, BeatDetector, LoadedTrack, SpectrumAnalyzer, Transport,
};
use crate::renderer::FrameRenderer;
use crate::tracks::Track;
use nannou::prelude::*;

/// Seek step for the arrow keys, in seconds.
pub const SEEK_STEP: f32 = 5.0;

/// Volume step for the arrow keys.
pub const VOLUME_STEP: f32 = 0.05;

pub struct VisualizerSession {
    tracks: Vec<Track>,
    current: Option<usize>,
    transport: Box<dyn Transport>,
    analyzer: SpectrumAnalyzer,
    beat: BeatDetector,
    renderer: FrameRenderer,
    loader_tx: Sender<LoadedTrack>,
    loader_rx: Receiver<LoadedTrack>,
    last_snapshot: Option<AnalysisSnapshot>,
    volume: f32,
    muted: bool,
}

impl VisualizerSession {
    pub fn new(
        tracks: Vec<Track>,
        transport: Box<dyn Transport>,
        particle_count: usize,
        volume: f32,
    ) -> Self {
        let (loader_tx, loader_rx) = channel();
        Self {
            tracks,
            current: None,
            transport,
            analyzer: SpectrumAnalyzer::new(),
            beat: BeatDetector::new(),
            renderer: FrameRenderer::new(particle_count),
            loader_tx,
            loader_rx,
            last_snapshot: None,
            volume: volume.clamp(0.0, 1.0),
            muted: false,
        }
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.map(|i| &self.tracks[i])
    }

    /// Switch to the track at `index`. Out-of-range selections are ignored.
    /// Playback stops and analysis detaches immediately so no frame is ever
    /// rendered from the old track's data; the theme transition and the
    /// decode request start right away.
    pub fn set_active_track(&mut self, index: usize) {
        let Some(track) = self.tracks.get(index) else {
            eprintln!("No track {} ({} loaded)", index + 1, self.tracks.len());
            return;
        };

        // Stop before detach: the transport must never report progress into
        // a buffer the analyzer no longer holds.
        self.transport.stop();
        self.analyzer.detach();
        self.last_snapshot = None;

        self.current = Some(index);
        self.beat.set_sensitivity(track.sensitivity);
        self.renderer.set_track_theme(track);

        println!("Switching to track {}: {}", index + 1, track.title);
        spawn_decode(index, track.audio.clone(), self.loader_tx.clone());
    }

    /// Consume finished decodes. Completions for a track that is no longer
    /// selected are dropped; the winner is whatever matches the current
    /// selection.
    fn poll_loader(&mut self) {
        while let Ok(loaded) = self.loader_rx.try_recv() {
            if Some(loaded.index) != self.current {
                println!("Discarding stale decode of {:?}", loaded.path);
                continue;
            }
            if !self.transport.load(&loaded.path, loaded.duration) {
                eprintln!("Transport rejected {:?}", loaded.path);
                continue;
            }
            self.analyzer.attach(loaded.samples, loaded.sample_rate);
            self.transport
                .play(Duration::ZERO, 1.0, self.effective_volume());
        }
    }

    /// One tick: pick up decode completions, analyze at the playhead and
    /// advance the renderer. Analysis gaps (nothing attached, playhead past
    /// the end) degrade to the idle scene rather than freezing a stale frame.
    pub fn update(&mut self) {
        self.poll_loader();

        let position = self.transport.current_time().as_secs_f32();
        let snapshot = self.analyzer.analyze(position);
        let beat = snapshot
            .as_ref()
            .map(|s| self.beat.is_beat(s))
            .unwrap_or(false);

        self.renderer.update(snapshot.as_ref(), beat);
        self.last_snapshot = snapshot;
    }

    pub fn draw(&self, draw: &Draw, bounds: Rect) {
        self.renderer.draw(draw, bounds, self.last_snapshot.as_ref());
    }

    pub fn toggle_play(&mut self) {
        if self.transport.is_playing() {
            self.transport.pause();
        } else if self.analyzer.is_attached() {
            let position = self.transport.current_time();
            self.transport.play(position, 1.0, self.effective_volume());
        }
    }

    /// Restart the current track from the beginning.
    pub fn replay(&mut self) {
        if self.analyzer.is_attached() {
            self.transport.play(Duration::ZERO, 1.0, self.effective_volume());
        }
    }

    /// Seek relative to the playhead, clamped into the track.
    pub fn seek_by(&mut self, delta_secs: f32) {
        let duration = self.transport.duration();
        if duration.is_zero() {
            return;
        }
        let target = (self.transport.current_time().as_secs_f32() + delta_secs)
            .clamp(0.0, duration.as_secs_f32());
        self.transport.seek(Duration::from_secs_f32(target));
    }

    pub fn adjust_volume(&mut self, delta: f32) {
        self.volume = (self.volume + delta).clamp(0.0, 1.0);
        let v = self.effective_volume();
        self.transport.set_volume(v);
        println!("Volume {:.0}%{}", self.volume * 100.0, if self.muted { " (muted)" } else { "" });
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        let v = self.effective_volume();
        self.transport.set_volume(v);
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    /// Playhead as a fraction of the track, for the HUD progress readout.
    /// `None` until a track with a known duration is loaded.
    pub fn playback_fraction(&self) -> Option<f32> {
        let duration = self.transport.duration();
        if duration.is_zero() {
            return None;
        }
        Some(
            (self.transport.current_time().as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0),
        )
    }

    pub fn current_time(&self) -> Duration {
        self.transport.current_time()
    }

    pub fn duration(&self) -> Duration {
        self.transport.duration()
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }
}
