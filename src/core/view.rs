//! Rendering-side attributes, kept apart from the physics record.

use crate::core::particle::Particle;
use rand::Rng;

/// Cosmetic per-particle colour in HSL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tint {
    /// Hue in degrees, `[0, 360)`.
    pub hue: f32,
    /// Saturation in `[0, 1]`.
    pub saturation: f32,
    /// Lightness in `[0, 1]`.
    pub lightness: f32,
}

impl Tint {
    /// Random hue at fixed saturation 0.7 and lightness 0.6.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self {
            hue: rng.random_range(0.0..360.0),
            saturation: 0.7,
            lightness: 0.6,
        }
    }

    /// Convert to 8-bit sRGB channels.
    pub fn to_rgb(&self) -> [u8; 3] {
        let s = self.saturation.clamp(0.0, 1.0);
        let l = self.lightness.clamp(0.0, 1.0);
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let h = self.hue.rem_euclid(360.0) / 60.0;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        [to_u8(r), to_u8(g), to_u8(b)]
    }
}

/// What a renderer needs to draw one disc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleView {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub tint: Tint,
}

impl ParticleView {
    pub fn compose(p: &Particle, tint: Tint) -> Self {
        Self {
            x: p.r[0],
            y: p.r[1],
            radius: p.radius,
            tint,
        }
    }
}
