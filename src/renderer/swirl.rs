//! Rotating waveform trail.
//!
//! Each tick the current waveform is wrapped onto a ring and pushed into a
//! bounded FIFO. Rendering replays the buffer oldest to newest with a
//! rotation proportional to age, faint and thin for the oldest layer, bold
//! and thick for the newest - the decaying rotating-trail illusion.

use super::palette::{lerp_rgb, rgba8, Palette};
use nannou::prelude::*;
use std::collections::VecDeque;

/// Trail depth: the buffer never holds more than this many rings.
pub const MAX_LAYERS: usize = 15;

/// Points sampled around each ring.
const DETAIL: usize = 180;

pub struct SwirlTrail {
    layers: VecDeque<Vec<Vec2>>,
}

impl SwirlTrail {
    pub fn new() -> Self {
        Self {
            layers: VecDeque::with_capacity(MAX_LAYERS + 1),
        }
    }

    /// Sample the waveform onto a ring and push it, evicting the oldest
    /// layer beyond capacity.
    pub fn push_frame(&mut self, waveform: &[f32], pulse_radius: f32, time: f32) {
        let ring: Vec<Vec2> = (0..DETAIL)
            .map(|i| {
                let angle = i as f32 / DETAIL as f32 * TAU;
                let amp = if waveform.is_empty() {
                    0.0
                } else {
                    waveform[i * waveform.len() / DETAIL]
                };
                let dynamic = (time * 2.0 + angle * 6.0 + amp * 8.0).sin();
                let r = pulse_radius + dynamic * 40.0 + amp * 80.0;
                vec2(r * angle.cos(), r * angle.sin())
            })
            .collect();

        self.layers.push_back(ring);
        while self.layers.len() > MAX_LAYERS {
            self.layers.pop_front();
        }
    }

    /// Draw oldest to newest. Older layers have rotated further; alpha and
    /// stroke weight grow with recency.
    pub fn draw(&self, draw: &Draw, center: Vec2, palette: &Palette, time: f32) {
        let count = self.layers.len().max(1) as f32;
        let color = lerp_rgb(palette.accent, palette.pulse, 0.2);

        for (i, layer) in self.layers.iter().enumerate() {
            let recency = i as f32 / count;
            let alpha = 15.0 + recency * 185.0;
            let weight = 0.3 + recency * 1.7;
            // Oldest layers have rotated furthest
            let rotation = time * 0.15 * (count - i as f32);
            let (sin_r, cos_r) = rotation.sin_cos();

            let mut points: Vec<Vec2> = layer
                .iter()
                .map(|p| center + vec2(p.x * cos_r - p.y * sin_r, p.x * sin_r + p.y * cos_r))
                .collect();
            if let Some(&first) = points.first() {
                points.push(first);
            }

            draw.polyline()
                .weight(weight)
                .points(points)
                .color(rgba8(color, alpha as u8));
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Clear the trail, e.g. when playback goes idle.
    pub fn clear(&mut self) {
        self.layers.clear();
    }

    #[cfg(test)]
    fn oldest(&self) -> Option<&Vec<Vec2>> {
        self.layers.front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_never_exceeds_capacity() {
        let mut trail = SwirlTrail::new();
        for i in 0..100 {
            trail.push_frame(&[0.0; 64], 100.0 + i as f32, 0.0);
            assert!(trail.len() <= MAX_LAYERS);
        }
        assert_eq!(trail.len(), MAX_LAYERS);
    }

    #[test]
    fn eviction_is_oldest_first() {
        let mut trail = SwirlTrail::new();
        // With zero waveform and time, a ring's first point sits at
        // x = pulse_radius, making frames distinguishable by push order.
        for i in 0..40 {
            trail.push_frame(&[], i as f32, 0.0);
        }
        let oldest_x = trail.oldest().unwrap()[0].x;
        // 40 pushed, 15 kept: the oldest survivor is push #25 (radius 25)
        assert!(
            (oldest_x - 25.0).abs() < 1e-3,
            "expected oldest ring radius 25, got {}",
            oldest_x
        );
    }

    #[test]
    fn rings_have_detail_points() {
        let mut trail = SwirlTrail::new();
        trail.push_frame(&[0.5; 32], 120.0, 1.0);
        assert_eq!(trail.oldest().unwrap().len(), DETAIL);
    }
}
