//! Ambient orbiting particle pool.
//!
//! A fixed-size band of drifting particles around the center. Motion is
//! polar (slow orbit) with a Perlin-perturbed radius and small independent
//! per-axis noise offsets, so the drift looks organic while staying fully
//! deterministic between resets. Particles fade multiplicatively and flash
//! back to full brightness on a fraction of beats.

use super::palette::{lerp_rgb, rgba8, Palette};
use nannou::prelude::*;
use noise::{NoiseFn, Perlin};
use rand::Rng;

/// Orbit band the particles live in.
const MIN_RADIUS: f32 = 140.0;
const MAX_RADIUS: f32 = 260.0;
/// How far outside the band a particle may wander before being reset.
const RESET_MARGIN: f32 = 20.0;

/// Multiplicative alpha fade per frame.
const ALPHA_DECAY: f32 = 0.94;
/// Chance for any one particle to flash on a beat frame.
const BEAT_FLASH_CHANCE: f32 = 0.05;

/// Default pool size; constrained profiles configure a smaller one.
pub const DEFAULT_PARTICLE_COUNT: usize = 500;

struct Particle {
    angle: f32,
    radius: f32,
    speed: f32,
    /// Fixed per-particle noise seed: motion is deterministic after spawn.
    seed: f32,
    size: f32,
    alpha: f32,
    position: Vec2,
}

impl Particle {
    fn spawn(rng: &mut impl Rng) -> Self {
        Self {
            angle: rng.random_range(0.0..TAU),
            radius: rng.random_range(MIN_RADIUS..MAX_RADIUS),
            speed: rng.random_range(0.00005..0.0006),
            seed: rng.random_range(0.0..1000.0),
            size: rng.random_range(1.0..2.5),
            alpha: rng.random_range(60.0..140.0),
            position: Vec2::ZERO,
        }
    }
}

pub struct ParticleField {
    particles: Vec<Particle>,
    noise: Perlin,
    frame: f32,
}

impl ParticleField {
    pub fn new(count: usize) -> Self {
        let mut rng = rand::rng();
        Self {
            particles: (0..count).map(|_| Particle::spawn(&mut rng)).collect(),
            noise: Perlin::new(rng.random()),
            frame: 0.0,
        }
    }

    /// Advance every particle one frame. A particle leaving the orbit band
    /// is fully respawned; on beat frames a random few flash bright.
    pub fn update(&mut self, beat: bool) {
        self.frame += 1.0;
        let mut rng = rand::rng();

        for p in &mut self.particles {
            p.angle += p.speed;
            p.radius += (self.frame * 0.005 + p.seed).sin() * 0.25;

            if p.radius < MIN_RADIUS - RESET_MARGIN || p.radius > MAX_RADIUS + RESET_MARGIN {
                *p = Particle::spawn(&mut rng);
            }

            let nx = self
                .noise
                .get([p.seed as f64, (self.frame * 0.001) as f64]) as f32
                * 2.0;
            let ny = self
                .noise
                .get([(p.seed + 999.0) as f64, (self.frame * 0.001) as f64])
                as f32
                * 2.0;

            // Polar position + noise jitter + slow orbital drift
            p.position = vec2(
                p.radius * p.angle.cos() + nx + (self.frame * 0.002 + p.seed).sin() * 0.2,
                p.radius * p.angle.sin() + ny + (self.frame * 0.002 + p.seed).cos() * 0.2,
            );

            if beat && rng.random::<f32>() < BEAT_FLASH_CHANCE {
                p.alpha = 255.0;
            }
            p.alpha *= ALPHA_DECAY;
        }
    }

    pub fn draw(&self, draw: &Draw, center: Vec2, palette: &Palette) {
        for p in &self.particles {
            let phase = (p.angle * 3.0 + self.frame * 0.015 + p.seed).sin() * 0.5 + 0.5;
            let color = lerp_rgb(palette.base, palette.accent, phase);
            draw.ellipse()
                .xy(center + p.position)
                .radius(p.size)
                .color(rgba8(color, p.alpha.clamp(0.0, 255.0) as u8));
        }
    }

    #[cfg(test)]
    fn radii(&self) -> Vec<f32> {
        self.particles.iter().map(|p| p.radius).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_size_is_fixed() {
        let mut field = ParticleField::new(150);
        for _ in 0..200 {
            field.update(false);
        }
        assert_eq!(field.particles.len(), 150);
    }

    #[test]
    fn radii_stay_within_band_after_any_update() {
        let mut field = ParticleField::new(300);
        for frame in 0..2000 {
            field.update(frame % 7 == 0);
            for r in field.radii() {
                assert!(
                    (MIN_RADIUS - RESET_MARGIN..=MAX_RADIUS + RESET_MARGIN).contains(&r),
                    "radius {} escaped the orbit band",
                    r
                );
            }
        }
    }

    #[test]
    fn alpha_decays_without_beats() {
        let mut field = ParticleField::new(50);
        for _ in 0..300 {
            field.update(false);
        }
        // Long enough that every particle has faded well below spawn level
        // unless it was reset; resets respawn at most at 140.
        assert!(field.particles.iter().all(|p| p.alpha <= 140.0));
    }
}
