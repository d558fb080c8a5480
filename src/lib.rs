//! Flipper Table - a single-ball pinball simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (ball dynamics, collisions, game state)
//! - `settings`: Table configuration loaded from JSON

pub mod settings;
pub mod sim;

pub use settings::{ConfigError, Settings};
pub use sim::Session;

use glam::Vec2;

/// Table tuning constants
pub mod consts {
    /// Nominal frame length in milliseconds (used for the first update)
    pub const NOMINAL_FRAME_MS: f64 = 16.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 12.0;
    /// Gravity added to velocity.y every frame (units/frame²)
    pub const GRAVITY: f32 = 0.3;
    /// Per-axis velocity multiplier each frame
    pub const AIR_DRAG: f32 = 0.99;
    pub const ANGULAR_DAMPING: f32 = 0.985;
    pub const SPIN_COUPLING: f32 = 0.005;
    pub const MAX_ANGULAR_VELOCITY: f32 = 3.0;
    /// Maximum ball speed (units/frame)
    pub const BALL_MAX_SPEED: f32 = 30.0;
    /// Minimum speed after any impulse response
    pub const BALL_MIN_SPEED: f32 = 3.0;
    /// Idle sway in the launcher
    pub const SWAY_AMPLITUDE: f32 = 1.5;
    pub const SWAY_FREQUENCY: f32 = 3.0;
    pub const IDLE_SPIN: f32 = 0.05;

    /// Launcher
    pub const LAUNCH_BASE_SPEED: f32 = 12.0;
    pub const LAUNCH_POWER_GAIN: f32 = 1.5;
    /// Horizontal share of the launch speed
    pub const LAUNCH_LATERAL_SHARE: f32 = 0.4;
    pub const MAX_DRAG_DISTANCE: f32 = 108.0;
    /// Drags weaker than this are cancelled instead of launched
    pub const MIN_LAUNCH_POWER: f32 = 0.1;
    /// Power used by the launch key
    pub const KEY_LAUNCH_POWER: f32 = 0.8;

    /// Launch channel
    pub const CHANNEL_WIDTH: f32 = 40.0;
    pub const CHANNEL_EXIT_WIDTH: f32 = 40.0;
    pub const CHANNEL_SEGMENTS: usize = 50;
    pub const CHANNEL_MIN_CONTROL_SEPARATION: f32 = 150.0;
    /// Half thickness of the channel walls once the ball has left
    pub const CHANNEL_WALL_HALF_THICKNESS: f32 = 7.5;

    /// Flippers
    pub const FLIPPER_LENGTH: f32 = 80.0;
    pub const FLIPPER_WIDTH: f32 = 15.0;
    pub const FLIPPER_REST_DEG: f32 = 15.0;
    pub const FLIPPER_STROKE_DEG: f32 = 65.0;
    /// radians per second
    pub const FLIPPER_ROTATION_SPEED: f32 = std::f32::consts::PI * 12.0;
    pub const FLIPPER_GAP: f32 = 220.0;
    pub const FLIPPER_SNAP_EPSILON: f32 = 0.001;

    /// Shock absorbers
    pub const SHOCK_WIDTH: f32 = 20.0;
    /// Compression lost per second
    pub const SHOCK_DECAY_RATE: f32 = 3.0;

    /// Bumpers
    pub const BUMPER_RADIUS: f32 = 20.0;
    pub const BUMPER_BOOST: f32 = 1.1;
    pub const GRID_CELL_SIZE: f32 = 50.0;
    pub const LEVEL_CLEAR_BONUS: u64 = 1000;

    /// Delays (milliseconds)
    pub const LEVEL_ADVANCE_DELAY_MS: f64 = 1500.0;
    pub const GAME_OVER_DELAY_MS: f64 = 100.0;
}

/// Perpendicular of a vector, rotated a quarter turn: (-y, x)
#[inline]
pub fn perp(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Unit vector at the given angle
#[inline]
pub fn direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}
