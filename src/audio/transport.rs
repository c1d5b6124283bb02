//! Playback transport and asynchronous track decoding.
//!
//! The session drives everything through the `Transport` trait; the rodio
//! implementation owns the output device and sink. Decoding runs on a worker
//! thread per request and reports a `LoadedTrack` over a channel so the
//! render loop never blocks on file IO - completions are consumed at the
//! start of the next tick.

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Duration;

/// Playback controls the visualizer core reads and drives. Implemented by
/// the rodio sink in production and by fakes in tests.
pub trait Transport {
    /// Bind the transport to a new audio file. Returns false when the
    /// transport cannot play it (the session then stays idle).
    fn load(&mut self, path: &Path, duration: Duration) -> bool;

    /// Start playback at `offset` with the given rate and volume.
    fn play(&mut self, offset: Duration, rate: f32, volume: f32);

    fn pause(&mut self);

    fn stop(&mut self);

    fn seek(&mut self, position: Duration);

    fn set_volume(&mut self, volume: f32);

    fn is_playing(&self) -> bool;

    fn current_time(&self) -> Duration;

    /// Total track length; zero when nothing is loaded.
    fn duration(&self) -> Duration;
}

/// Transport backed by a rodio output stream.
pub struct RodioTransport {
    // Dropping the stream kills audio, keep it alive for the app lifetime.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Sink,
    path: Option<PathBuf>,
    duration: Duration,
}

impl RodioTransport {
    /// Open the default output device. `None` when no device is available;
    /// callers degrade to the idle scene instead of crashing.
    pub fn new() -> Option<Self> {
        let (stream, handle) = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(e) => {
                eprintln!("No audio output device: {}", e);
                return None;
            }
        };
        let sink = match Sink::try_new(&handle) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to create audio sink: {}", e);
                return None;
            }
        };
        Some(Self {
            _stream: stream,
            handle,
            sink,
            path: None,
            duration: Duration::ZERO,
        })
    }

    fn fresh_sink(&mut self) {
        match Sink::try_new(&self.handle) {
            Ok(s) => self.sink = s,
            Err(e) => eprintln!("Failed to rebuild audio sink: {}", e),
        }
    }
}

impl Transport for RodioTransport {
    fn load(&mut self, path: &Path, duration: Duration) -> bool {
        self.sink.stop();
        self.path = Some(path.to_path_buf());
        self.duration = duration;
        true
    }

    fn play(&mut self, offset: Duration, rate: f32, volume: f32) {
        let Some(path) = self.path.clone() else {
            return;
        };
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Failed to open {:?}: {}", path, e);
                return;
            }
        };
        let source = match Decoder::new(BufReader::new(file)) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to decode {:?}: {}", path, e);
                return;
            }
        };

        self.fresh_sink();
        self.sink.set_speed(rate);
        self.sink.set_volume(volume);
        self.sink.append(source);
        if offset > Duration::ZERO {
            if let Err(e) = self.sink.try_seek(offset) {
                eprintln!("Seek to {:?} failed: {}", offset, e);
            }
        }
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn stop(&mut self) {
        self.sink.stop();
    }

    fn seek(&mut self, position: Duration) {
        if let Err(e) = self.sink.try_seek(position) {
            eprintln!("Seek to {:?} failed: {}", position, e);
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume.clamp(0.0, 1.0));
    }

    fn is_playing(&self) -> bool {
        !self.sink.empty() && !self.sink.is_paused()
    }

    fn current_time(&self) -> Duration {
        self.sink.get_pos()
    }

    fn duration(&self) -> Duration {
        self.duration
    }
}

/// No-op transport used when the output device cannot be opened. The
/// session behaves as if nothing is ever playing, keeping the idle scene up.
pub struct NullTransport;

impl Transport for NullTransport {
    fn load(&mut self, _path: &Path, _duration: Duration) -> bool {
        false
    }
    fn play(&mut self, _offset: Duration, _rate: f32, _volume: f32) {}
    fn pause(&mut self) {}
    fn stop(&mut self) {}
    fn seek(&mut self, _position: Duration) {}
    fn set_volume(&mut self, _volume: f32) {}
    fn is_playing(&self) -> bool {
        false
    }
    fn current_time(&self) -> Duration {
        Duration::ZERO
    }
    fn duration(&self) -> Duration {
        Duration::ZERO
    }
}

/// A finished decode: mono samples ready for the analyzer.
pub struct LoadedTrack {
    /// Track index the request was issued for; stale completions (issued
    /// before a later switch) are discarded by the session.
    pub index: usize,
    pub path: PathBuf,
    pub samples: Vec<f32>,
    pub sample_rate: f32,
    pub duration: Duration,
}

/// Decode `path` on a worker thread, downmixed to mono. The result arrives
/// on `tx`; a failed decode only logs (the session stays idle for that
/// track).
pub fn spawn_decode(index: usize, path: PathBuf, tx: Sender<LoadedTrack>) {
    std::thread::spawn(move || {
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Failed to open {:?}: {}", path, e);
                return;
            }
        };
        let decoder = match Decoder::new(BufReader::new(file)) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("Failed to decode {:?}: {}", path, e);
                return;
            }
        };

        let channels = decoder.channels().max(1) as usize;
        let sample_rate = decoder.sample_rate() as f32;

        let interleaved: Vec<f32> = decoder.convert_samples::<f32>().collect();
        let samples: Vec<f32> = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        let duration = Duration::from_secs_f32(samples.len() as f32 / sample_rate);
        println!(
            "Decoded {:?}: {:.1}s at {} Hz",
            path,
            duration.as_secs_f32(),
            sample_rate
        );

        // Receiver gone means the app quit mid-decode
        let _ = tx.send(LoadedTrack {
            index,
            path,
            samples,
            sample_rate,
            duration,
        });
    });
}
