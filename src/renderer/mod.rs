//! Frame composition.
//!
//! `FrameRenderer` owns the palette engine, the particle pool and the swirl
//! trail, and layers them with the spectrum-driven geometry into one frame
//! per tick. With no analysis available it falls back to an idle ambient
//! scene, so a missing or not-yet-decoded audio source never breaks the
//! render loop.

pub mod palette;
pub mod particles;
pub mod swirl;

use nannou::prelude::*;

use crate::audio::{AnalysisSnapshot, NUM_BINS};
use crate::tracks::Track;
use palette::{lerp_rgb, rgba8, Palette, PaletteEngine};
use particles::ParticleField;
use swirl::SwirlTrail;

/// Base radius the bass pulse and swirl rings breathe around.
const BASE_PULSE_RADIUS: f32 = 160.0;

/// Every k-th spectrum bin becomes a radial line.
const BIN_STEP: usize = 4;

/// Fixed brighten offset applied to radial line colors.
const LINE_BRIGHTEN: f32 = 30.0;

/// Segments used to approximate one rotating arc.
const ARC_SEGMENTS: usize = 16;

pub struct FrameRenderer {
    palette: PaletteEngine,
    particles: ParticleField,
    swirl: SwirlTrail,
    /// Animation clock, advanced a fixed step per tick.
    t: f32,
}

impl FrameRenderer {
    pub fn new(particle_count: usize) -> Self {
        Self {
            palette: PaletteEngine::new(),
            particles: ParticleField::new(particle_count),
            swirl: SwirlTrail::new(),
            t: 0.0,
        }
    }

    /// Start the palette transition toward a track's theme.
    pub fn set_track_theme(&mut self, track: &Track) {
        self.palette.set_target(Palette::from_track(track));
    }

    pub fn palette(&self) -> &PaletteEngine {
        &self.palette
    }

    /// Advance all animated state one tick. `snapshot` is `None` whenever
    /// nothing is attached; the swirl trail only accumulates while analysis
    /// is live.
    pub fn update(&mut self, snapshot: Option<&AnalysisSnapshot>, beat: bool) {
        self.t += 0.01;
        self.palette.tick();
        self.particles.update(beat);

        match snapshot {
            Some(s) => {
                let pulse = map_range(
                    s.bass,
                    0.0,
                    255.0,
                    BASE_PULSE_RADIUS * 0.8,
                    BASE_PULSE_RADIUS * 1.3,
                );
                self.swirl.push_frame(&s.waveform, pulse, self.t);
            }
            None => self.swirl.clear(),
        }
    }

    pub fn draw(&self, draw: &Draw, bounds: Rect, snapshot: Option<&AnalysisSnapshot>) {
        // Translucent wash instead of a hard clear keeps short motion trails
        draw.rect()
            .xy(bounds.xy())
            .wh(bounds.wh())
            .color(srgba(0u8, 0u8, 0u8, 25u8));

        let center = bounds.xy() + vec2(0.0, bounds.h() * 0.1);
        let palette = self.palette.current();

        let Some(s) = snapshot else {
            self.draw_idle(draw, bounds, center, palette);
            return;
        };

        self.draw_spectrum_lines(draw, center, palette, s);
        self.draw_bass_pulse(draw, center, palette, s);
        self.draw_rings(draw, center, palette);
        self.draw_arcs(draw, center, palette);
        self.particles.draw(draw, center, palette);
        self.swirl.draw(draw, center, palette, self.t);
    }

    /// Ambient scene shown before any track is selected or while audio is
    /// still loading.
    fn draw_idle(&self, draw: &Draw, bounds: Rect, center: Vec2, palette: &Palette) {
        self.particles.draw(draw, center, palette);

        draw.ellipse()
            .xy(center)
            .radius(400.0)
            .color(rgba8(palette.accent, 10));

        let cycle = ((self.t * 0.05).sin() + 1.0) * 0.5;
        let tint = lerp_rgb(palette.base, palette.pulse, cycle);
        draw.rect()
            .xy(bounds.xy())
            .wh(bounds.wh())
            .color(rgba8(tint, 20));

        draw.text("Select a track to play")
            .xy(bounds.xy())
            .color(WHITE)
            .font_size(24);
    }

    /// One radial line per k-th bin: angle from bin index, length from bin
    /// magnitude, color swept base to accent and lightened a fixed amount.
    fn draw_spectrum_lines(
        &self,
        draw: &Draw,
        center: Vec2,
        palette: &Palette,
        s: &AnalysisSnapshot,
    ) {
        for i in (0..NUM_BINS).step_by(BIN_STEP) {
            let angle = i as f32 / NUM_BINS as f32 * TAU;
            let r = map_range(s.spectrum[i], 0.0, 256.0, 100.0, 230.0);
            let tip = center + vec2(r * angle.cos(), r * angle.sin());

            let col = lerp_rgb(palette.base, palette.accent, i as f32 / NUM_BINS as f32);
            let lightened = [
                (col[0] + LINE_BRIGHTEN).min(255.0),
                (col[1] + LINE_BRIGHTEN).min(255.0),
                (col[2] + LINE_BRIGHTEN).min(255.0),
            ];

            draw.line()
                .start(center)
                .end(tip)
                .weight(1.0)
                .color(rgba8(lightened, 230));
        }
    }

    fn draw_bass_pulse(&self, draw: &Draw, center: Vec2, palette: &Palette, s: &AnalysisSnapshot) {
        draw.ellipse()
            .xy(center)
            .radius((30.0 + s.bass / 2.0) / 2.0)
            .color(rgba8(palette.pulse, 30));
    }

    /// Four concentric rings, color blended base -> mid -> pulse in two
    /// segments (mid = base/accent average), alpha falling with ring index.
    fn draw_rings(&self, draw: &Draw, center: Vec2, palette: &Palette) {
        let mid = lerp_rgb(palette.base, palette.accent, 0.5);

        for i in 1..=4u32 {
            let blend = (i - 1) as f32 / 3.0;
            let ring_col = if blend < 0.5 {
                lerp_rgb(palette.base, mid, blend * 2.0)
            } else {
                lerp_rgb(mid, palette.pulse, (blend - 0.5) * 2.0)
            };
            let alpha = (40 - i * 5) as u8;
            let diameter = i as f32 * 100.0 + (self.t * 1.5 + i as f32).sin() * 5.0;

            draw.ellipse()
                .xy(center)
                .radius(diameter / 2.0)
                .no_fill()
                .stroke(rgba8(ring_col, alpha))
                .stroke_weight(1.0);
        }
    }

    /// Six slowly rotating arcs with accent/pulse color oscillating over
    /// time and angular offset.
    fn draw_arcs(&self, draw: &Draw, center: Vec2, palette: &Palette) {
        let radius = (240.0 + (self.t * 1.1).sin() * 12.0) / 2.0;

        let mut a = 0.0;
        while a < TAU {
            let mix = (self.t * 0.3 + a).sin() * 0.5 + 0.5;
            let col = lerp_rgb(palette.accent, palette.pulse, mix);
            let start = a + self.t * 0.4;
            let span = PI / 6.0;

            let points: Vec<Vec2> = (0..=ARC_SEGMENTS)
                .map(|j| {
                    let angle = start + span * j as f32 / ARC_SEGMENTS as f32;
                    center + vec2(radius * angle.cos(), radius * angle.sin())
                })
                .collect();

            draw.polyline()
                .weight(1.0)
                .points(points)
                .color(rgba8(col, 25));

            a += PI / 3.0;
        }
    }

    #[cfg(test)]
    fn swirl_len(&self) -> usize {
        self.swirl.len()
    }
}
