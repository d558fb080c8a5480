//! Shock absorbers: static angled rails with a spring animation
//!
//! The compression value only drives rendering; collision physics does not
//! read it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionResult, segment_circle_collision};
use super::flipper::FlipperSide;
use crate::consts::*;
use crate::direction;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShockAbsorber {
    pub side: FlipperSide,
    /// Segment midpoint
    pub position: Vec2,
    pub angle: f32,
    pub length: f32,
    pub width: f32,
    pub start_point: Vec2,
    pub end_point: Vec2,
    /// 0 = relaxed, 1 = fully compressed
    pub compression: f32,
    pub is_compressed: bool,
    /// Timestamp (ms) of the last hit
    pub compression_time: f64,
}

impl ShockAbsorber {
    pub fn new(side: FlipperSide, position: Vec2, angle: f32, length: f32) -> Self {
        let mut shock = Self {
            side,
            position,
            angle,
            length,
            width: SHOCK_WIDTH,
            start_point: Vec2::ZERO,
            end_point: Vec2::ZERO,
            compression: 0.0,
            is_compressed: false,
            compression_time: 0.0,
        };
        shock.update_points();
        shock
    }

    pub fn left(table_width: f32, table_height: f32) -> Self {
        Self::new(
            FlipperSide::Left,
            Vec2::new(table_width * 0.17, table_height * 0.75),
            std::f32::consts::PI * 0.33,
            467.0,
        )
    }

    pub fn right(table_width: f32, table_height: f32) -> Self {
        Self::new(
            FlipperSide::Right,
            Vec2::new(table_width * 0.8, table_height * 0.85),
            std::f32::consts::PI * 0.75,
            250.0,
        )
    }

    /// Recompute the segment endpoints from position, angle and length
    pub fn update_points(&mut self) {
        let half = direction(self.angle) * (self.length * 0.5);
        self.start_point = self.position - half;
        self.end_point = self.position + half;
    }

    pub fn check_collision(&self, ball_pos: Vec2, ball_radius: f32) -> CollisionResult {
        segment_circle_collision(
            self.start_point,
            self.end_point,
            ball_pos,
            ball_radius + self.width * 0.5,
        )
    }

    /// Push away from the rail toward the table center, plus an upward kick
    pub fn kick(&self) -> Vec2 {
        Vec2::new(-1.5 * self.side.sign(), -2.0)
    }

    #[inline]
    pub fn spin(&self) -> f32 {
        0.1 * self.side.sign()
    }

    /// Register a hit at `now_ms`
    pub fn compress(&mut self, now_ms: f64) {
        self.compression = (self.compression + 0.3).min(1.0);
        self.is_compressed = true;
        self.compression_time = now_ms;
    }

    /// Relax the spring; `dt` in seconds
    pub fn decay(&mut self, dt: f32) {
        if self.is_compressed {
            self.compression = (self.compression - dt * SHOCK_DECAY_RATE).max(0.0);
            if self.compression <= 0.0 {
                self.is_compressed = false;
            }
        }
    }

    pub fn reset(&mut self) {
        self.compression = 0.0;
        self.is_compressed = false;
        self.update_points();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_are_symmetric() {
        let shock = ShockAbsorber::right(600.0, 800.0);
        let mid = (shock.start_point + shock.end_point) / 2.0;
        assert!((mid - shock.position).length() < 1e-3);
        assert!(((shock.end_point - shock.start_point).length() - 250.0).abs() < 1e-3);
    }

    #[test]
    fn test_compression_saturates_and_decays() {
        let mut shock = ShockAbsorber::left(600.0, 800.0);
        for _ in 0..5 {
            shock.compress(1000.0);
        }
        assert_eq!(shock.compression, 1.0);
        assert!(shock.is_compressed);

        shock.decay(0.1);
        assert!((shock.compression - 0.7).abs() < 1e-5);
        assert!(shock.is_compressed);

        shock.decay(1.0);
        assert_eq!(shock.compression, 0.0);
        assert!(!shock.is_compressed);
    }

    #[test]
    fn test_kick_points_inward() {
        let left = ShockAbsorber::left(600.0, 800.0);
        let right = ShockAbsorber::right(600.0, 800.0);
        assert!(left.kick().x > 0.0);
        assert!(right.kick().x < 0.0);
        assert_eq!(left.kick().y, -2.0);
        assert_eq!(left.spin(), -0.1);
    }

    #[test]
    fn test_collision_on_rail() {
        let shock = ShockAbsorber::right(600.0, 800.0);
        let result = shock.check_collision(shock.position + Vec2::new(0.0, -15.0), BALL_RADIUS);
        assert!(result.hit);
        assert!(result.penetration > 0.0);
    }
}
