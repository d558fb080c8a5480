//! Cosmetic particle effects
//!
//! Collisions push short-lived particles here; the renderer reads them and the
//! tick ages them. Nothing in this module feeds back into ball physics.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Maximum live effects
pub const MAX_EFFECTS: usize = 256;

/// Particles emitted when a scoring bumper is first hit
pub const SCORE_BURST_COUNT: usize = 8;

/// Structured particle color, independent of any rendering backend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectColor {
    /// White impact spark with the given opacity
    Spark { alpha: f32 },
    /// Saturated score confetti; hue in degrees
    Score { hue: f32 },
}

impl EffectColor {
    /// Linear RGBA in [0, 1]
    pub fn to_rgba(self) -> [f32; 4] {
        match self {
            EffectColor::Spark { alpha } => [1.0, 1.0, 1.0, alpha],
            EffectColor::Score { hue } => {
                let [r, g, b] = hsl_to_rgb(hue, 1.0, 0.6);
                [r, g, b, 1.0]
            }
        }
    }
}

fn hsl_to_rgb(hue: f32, s: f32, l: f32) -> [f32; 3] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let h = hue.rem_euclid(360.0) / 60.0;
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
    [r + m, g + m, b + m]
}

/// A single transient particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionEffect {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    /// Seconds remaining
    pub life: f32,
    pub color: EffectColor,
}

/// Live particle pool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Effects {
    pub particles: Vec<CollisionEffect>,
}

impl Effects {
    pub fn new() -> Self {
        Self {
            particles: Vec::with_capacity(MAX_EFFECTS),
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    fn push(&mut self, effect: CollisionEffect) {
        if self.particles.len() >= MAX_EFFECTS {
            // Remove oldest particles to make room
            self.particles.remove(0);
        }
        self.particles.push(effect);
    }

    /// Impact sparks thrown back along the contact normal
    ///
    /// Emits ⌊2 + intensity⌋ particles.
    pub fn spark_burst(&mut self, rng: &mut Pcg32, position: Vec2, normal: Vec2, intensity: f32) {
        let count = (2.0 + intensity.max(0.0)).floor() as usize;
        for _ in 0..count {
            let angle = rng.random::<f32>() * std::f32::consts::TAU;
            let speed = rng.random::<f32>() * 2.0 + 1.0;
            let jitter = Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5) * 3.0;
            self.push(CollisionEffect {
                position: position + jitter,
                velocity: crate::direction(angle) * speed - normal * 1.5,
                radius: rng.random::<f32>() * 1.5 + 0.5,
                life: 0.4 + rng.random::<f32>() * 0.3,
                color: EffectColor::Spark {
                    alpha: 0.8 + rng.random::<f32>() * 0.2,
                },
            });
        }
    }

    /// Confetti for a freshly scored bumper
    pub fn score_burst(&mut self, rng: &mut Pcg32, position: Vec2) {
        for _ in 0..SCORE_BURST_COUNT {
            let velocity = Vec2::new(
                (rng.random::<f32>() - 0.5) * 8.0,
                (rng.random::<f32>() - 0.5) * 8.0 - 4.0,
            );
            self.push(CollisionEffect {
                position,
                velocity,
                radius: rng.random::<f32>() * 3.0 + 2.0,
                life: 1.0 + rng.random::<f32>() * 0.5,
                color: EffectColor::Score {
                    hue: 60.0 + rng.random::<f32>() * 30.0,
                },
            });
        }
    }

    /// Advance particles by `dt` seconds and drop the expired ones
    pub fn age(&mut self, dt: f32) {
        for effect in self.particles.iter_mut() {
            // Velocities are tuned in units per 60 Hz frame
            effect.position += effect.velocity * dt * 60.0;
            effect.velocity.y += 0.2;
            effect.life -= dt;
        }
        self.particles.retain(|e| e.life > 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_spark_count_follows_intensity() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut effects = Effects::new();
        effects.spark_burst(&mut rng, Vec2::ZERO, Vec2::Y, 0.0);
        assert_eq!(effects.len(), 2);
        effects.spark_burst(&mut rng, Vec2::ZERO, Vec2::Y, 2.7);
        assert_eq!(effects.len(), 6);
    }

    #[test]
    fn test_score_burst() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut effects = Effects::new();
        effects.score_burst(&mut rng, Vec2::new(10.0, 10.0));
        assert_eq!(effects.len(), SCORE_BURST_COUNT);
        assert!(effects
            .particles
            .iter()
            .all(|p| matches!(p.color, EffectColor::Score { .. })));
    }

    #[test]
    fn test_age_expires_particles() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut effects = Effects::new();
        effects.spark_burst(&mut rng, Vec2::ZERO, Vec2::Y, 1.0);
        effects.age(0.016);
        assert_eq!(effects.len(), 3);
        // Sparks live at most 0.7 s
        effects.age(0.8);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_pool_is_capped() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut effects = Effects::new();
        for _ in 0..100 {
            effects.score_burst(&mut rng, Vec2::ZERO);
        }
        assert_eq!(effects.len(), MAX_EFFECTS);
    }

    #[test]
    fn test_colors_are_structured() {
        assert_eq!(EffectColor::Spark { alpha: 0.9 }.to_rgba(), [1.0, 1.0, 1.0, 0.9]);
        let [r, g, b, a] = EffectColor::Score { hue: 60.0 }.to_rgba();
        // Yellow
        assert!((r - 1.0).abs() < 1e-5 && (g - 1.0).abs() < 1e-5);
        assert!((b - 0.2).abs() < 1e-5);
        assert_eq!(a, 1.0);
    }
}
