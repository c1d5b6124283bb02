//! Track color palette with transition lerp and perpetual drift.
//!
//! On a track switch the engine captures the on-screen palette and glides
//! toward the new track's theme at a fixed per-frame step. Independently of
//! any switch, a slow sinusoidal phase keeps rotating the theme roles
//! (base -> accent -> pulse -> base), so the palette never settles on a
//! static color even long after a transition has finished.

use crate::tracks::{Rgb, Track};
use nannou::color::{srgba, Srgba};

/// Per-frame lerp fraction step during a palette transition.
const LERP_STEP: f32 = 0.02;

/// Per-tick advance of the drift clock (0.01 at 60fps ~ one role cycle
/// every couple of minutes).
const DRIFT_TICK: f32 = 0.01;

/// Drift phase rate relative to the drift clock.
const DRIFT_RATE: f32 = 0.1;

pub fn lerp_rgb(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Convert a 0-255 triple to a drawable color; alpha is a per-draw-call
/// parameter, never palette state.
pub fn rgba8(c: Rgb, alpha: u8) -> Srgba<u8> {
    srgba(
        c[0].clamp(0.0, 255.0) as u8,
        c[1].clamp(0.0, 255.0) as u8,
        c[2].clamp(0.0, 255.0) as u8,
        alpha,
    )
}

/// The three theme colors driving every layer of a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub base: Rgb,
    pub accent: Rgb,
    pub pulse: Rgb,
}

impl Palette {
    pub fn from_track(track: &Track) -> Self {
        Self {
            base: track.base,
            accent: track.accent,
            pulse: track.pulse,
        }
    }

    fn lerp(a: &Palette, b: &Palette, t: f32) -> Self {
        Self {
            base: lerp_rgb(a.base, b.base, t),
            accent: lerp_rgb(a.accent, b.accent, t),
            pulse: lerp_rgb(a.pulse, b.pulse, t),
        }
    }
}

impl Default for Palette {
    /// Pre-track default: the cool blue theme the idle scene starts with.
    fn default() -> Self {
        Self {
            base: [0.0, 180.0, 255.0],
            accent: [160.0, 200.0, 255.0],
            pulse: [80.0, 200.0, 255.0],
        }
    }
}

pub struct PaletteEngine {
    current: Palette,
    transition_start: Palette,
    target: Palette,
    lerp_amt: f32,
    drift_clock: f32,
}

impl PaletteEngine {
    pub fn new() -> Self {
        let palette = Palette::default();
        Self {
            current: palette,
            transition_start: palette,
            target: palette,
            lerp_amt: 1.0,
            drift_clock: 0.0,
        }
    }

    /// Begin a transition toward a new theme: the visible palette becomes
    /// the start point and the lerp fraction resets to exactly zero.
    pub fn set_target(&mut self, target: Palette) {
        self.transition_start = self.current;
        self.target = target;
        self.lerp_amt = 0.0;
    }

    /// Advance one frame: step the transition (if any) and the drift phase,
    /// then recompute the visible palette. The drifted target keeps moving
    /// even when the transition fraction sits at 1.0.
    pub fn tick(&mut self) {
        self.drift_clock += DRIFT_TICK;
        if self.lerp_amt < 1.0 {
            self.lerp_amt = (self.lerp_amt + LERP_STEP).min(1.0);
        }

        let cycle = ((self.drift_clock * DRIFT_RATE).sin() + 1.0) * 0.5;
        let drifted = Palette {
            base: lerp_rgb(self.target.base, self.target.accent, cycle),
            accent: lerp_rgb(self.target.accent, self.target.pulse, cycle),
            pulse: lerp_rgb(self.target.pulse, self.target.base, cycle),
        };

        self.current = Palette::lerp(&self.transition_start, &drifted, self.lerp_amt);
    }

    /// The palette rendered this frame.
    pub fn current(&self) -> &Palette {
        &self.current
    }

    /// The transition target (the active track's theme).
    pub fn target(&self) -> &Palette {
        &self.target
    }

    pub fn lerp_amt(&self) -> f32 {
        self.lerp_amt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme(v: f32) -> Palette {
        Palette {
            base: [v, 0.0, 0.0],
            accent: [0.0, v, 0.0],
            pulse: [0.0, 0.0, v],
        }
    }

    #[test]
    fn lerp_fraction_monotonic_within_transition() {
        let mut engine = PaletteEngine::new();
        engine.set_target(theme(200.0));
        assert_eq!(engine.lerp_amt(), 0.0);

        let mut prev = 0.0;
        for _ in 0..100 {
            engine.tick();
            assert!(engine.lerp_amt() >= prev, "lerp fraction decreased");
            prev = engine.lerp_amt();
        }
        assert_eq!(prev, 1.0);
    }

    #[test]
    fn lerp_fraction_resets_on_every_switch() {
        let mut engine = PaletteEngine::new();
        engine.set_target(theme(200.0));
        for _ in 0..10 {
            engine.tick();
        }
        assert!(engine.lerp_amt() > 0.0);

        engine.set_target(theme(50.0));
        assert_eq!(engine.lerp_amt(), 0.0);
        assert_eq!(*engine.target(), theme(50.0));
    }

    #[test]
    fn palette_keeps_drifting_after_transition_completes() {
        let mut engine = PaletteEngine::new();
        engine.set_target(theme(200.0));
        for _ in 0..60 {
            engine.tick();
        }
        assert_eq!(engine.lerp_amt(), 1.0);

        let settled = *engine.current();
        for _ in 0..600 {
            engine.tick();
        }
        assert_ne!(
            *engine.current(),
            settled,
            "palette settled instead of drifting"
        );
    }

    #[test]
    fn channels_stay_in_color_bounds() {
        let mut engine = PaletteEngine::new();
        engine.set_target(theme(255.0));
        for _ in 0..500 {
            engine.tick();
            let p = engine.current();
            for c in [p.base, p.accent, p.pulse] {
                for ch in c {
                    assert!((0.0..=255.0).contains(&ch), "channel out of range: {}", ch);
                }
            }
        }
    }
}
