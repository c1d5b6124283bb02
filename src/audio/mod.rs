mod analyzer;
mod beat;
mod transport;

pub use analyzer::{AnalysisSnapshot, SpectrumAnalyzer, NUM_BINS};
pub use beat::BeatDetector;
pub use transport::{spawn_decode, LoadedTrack, NullTransport, RodioTransport, Transport};
