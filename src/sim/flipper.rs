//! Player flippers
//!
//! A flipper is a line segment from its pivot to a derived end point. The
//! angle chases a target angle (rest or fully actuated) at a fixed angular
//! speed and snaps onto it once close enough.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionResult, segment_circle_collision};
use crate::consts::*;
use crate::direction;

/// Which flipper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlipperSide {
    Left,
    Right,
}

impl FlipperSide {
    /// -1 for left, +1 for right
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            FlipperSide::Left => -1.0,
            FlipperSide::Right => 1.0,
        }
    }
}

/// Button transition for a flipper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlipperAction {
    Down,
    Up,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flipper {
    pub side: FlipperSide,
    pub pivot: Vec2,
    pub angle: f32,
    pub target_angle: f32,
    /// Rest angle
    pub initial_angle: f32,
    /// Fully actuated angle
    pub max_angle: f32,
    pub length: f32,
    pub width: f32,
    /// radians per second
    pub rotation_speed: f32,
    pub is_pressed: bool,
    pub end_point: Vec2,
}

impl Flipper {
    pub fn new(side: FlipperSide, pivot: Vec2, initial_angle: f32, max_angle: f32) -> Self {
        let mut flipper = Self {
            side,
            pivot,
            angle: initial_angle,
            target_angle: initial_angle,
            initial_angle,
            max_angle,
            length: FLIPPER_LENGTH,
            width: FLIPPER_WIDTH,
            rotation_speed: FLIPPER_ROTATION_SPEED,
            is_pressed: false,
            end_point: Vec2::ZERO,
        };
        flipper.update_end_point();
        flipper
    }

    /// Left flipper: rests pointing down-right, swings up (counter-clockwise on screen)
    pub fn left(table_width: f32, table_height: f32) -> Self {
        let pivot = Vec2::new(
            table_width / 2.0 - FLIPPER_GAP / 2.0 - 20.0,
            table_height - 80.0,
        );
        let rest = FLIPPER_REST_DEG.to_radians();
        Self::new(FlipperSide::Left, pivot, rest, rest - FLIPPER_STROKE_DEG.to_radians())
    }

    /// Right flipper, mirrored
    pub fn right(table_width: f32, table_height: f32) -> Self {
        let pivot = Vec2::new(
            table_width / 2.0 + FLIPPER_GAP / 2.0 + 20.0,
            table_height - 80.0,
        );
        let rest = std::f32::consts::PI - FLIPPER_REST_DEG.to_radians();
        Self::new(FlipperSide::Right, pivot, rest, rest + FLIPPER_STROKE_DEG.to_radians())
    }

    #[inline]
    pub fn update_end_point(&mut self) {
        self.end_point = self.pivot + direction(self.angle) * self.length;
    }

    /// Button pressed: swing toward the actuated angle (ignored while held)
    pub fn press(&mut self) {
        if !self.is_pressed {
            self.is_pressed = true;
            self.target_angle = self.max_angle;
        }
    }

    /// Button released: fall back to rest
    pub fn release(&mut self) {
        self.is_pressed = false;
        self.target_angle = self.initial_angle;
    }

    /// Return to rest immediately
    pub fn reset(&mut self) {
        self.angle = self.initial_angle;
        self.target_angle = self.initial_angle;
        self.is_pressed = false;
        self.update_end_point();
    }

    /// Move the angle toward the target; `dt` in seconds
    pub fn update_angle(&mut self, dt: f32) {
        let diff = self.target_angle - self.angle;
        // Doubled for a snappier stroke
        let max_step = self.rotation_speed * dt * 2.0;

        if diff.abs() > FLIPPER_SNAP_EPSILON {
            let step = diff.abs().min(max_step);
            if step >= diff.abs() {
                self.angle = self.target_angle;
            } else {
                self.angle += step * diff.signum();
            }
        } else {
            self.angle = self.target_angle;
        }

        self.update_end_point();
    }

    /// Segment test against the ball; contact radius includes half the flipper width
    pub fn check_collision(&self, ball_pos: Vec2, ball_radius: f32) -> CollisionResult {
        segment_circle_collision(self.pivot, self.end_point, ball_pos, ball_radius + self.width / 2.0)
    }

    /// Restitution for the current button state
    #[inline]
    pub fn restitution(&self) -> f32 {
        if self.is_pressed { 1.8 } else { 1.2 }
    }

    /// Direct velocity kick applied after the impulse response
    pub fn kick(&self) -> Vec2 {
        if self.is_pressed {
            Vec2::new(4.0 * self.side.sign(), -9.0)
        } else {
            Vec2::new(0.0, -3.0)
        }
    }

    /// Spin added on a pressed hit
    #[inline]
    pub fn spin(&self) -> f32 {
        if self.is_pressed { 0.3 * self.side.sign() } else { 0.0 }
    }

    fn angle_bounds(&self) -> (f32, f32) {
        (
            self.initial_angle.min(self.max_angle),
            self.initial_angle.max(self.max_angle),
        )
    }

    /// True when the angle lies within the stroke
    pub fn angle_in_range(&self) -> bool {
        let (lo, hi) = self.angle_bounds();
        self.angle >= lo && self.angle <= hi
    }
}
