//! Table entities and game state
//!
//! Velocities are in units per nominal frame; the ball integrator does not
//! scale by the frame delta.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Not started yet (or stopped)
    #[default]
    Idle,
    /// Active gameplay
    Playing,
    /// Ball drained; only a restart leaves this phase
    GameOver,
}

/// Notable things that happened during a tick (for audio/HUD consumers)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Launched { power: f32 },
    BumperHit { id: u32, score: u64 },
    LevelCleared,
    LevelAdvanced { level: u32 },
    BallDrained,
    GameOver { score: u64 },
}

/// The ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub rotation: f32,
    pub angular_velocity: f32,
    pub is_launched: bool,
    /// Timestamp (ms) of the last impulse response
    pub last_collision_time: f64,
}

impl Ball {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            radius: BALL_RADIUS,
            rotation: 0.0,
            angular_velocity: 0.0,
            is_launched: false,
            last_collision_time: 0.0,
        }
    }

    /// Put the ball back, unlaunched and at rest
    pub fn reset_to(&mut self, position: Vec2) {
        self.position = position;
        self.velocity = Vec2::ZERO;
        self.is_launched = false;
        self.angular_velocity = 0.0;
        self.rotation = 0.0;
    }

    /// Advance one frame of free flight
    pub fn integrate(&mut self) {
        self.position += self.velocity;

        self.velocity.y += GRAVITY;
        self.velocity *= AIR_DRAG;

        self.rotation += self.angular_velocity;
        self.angular_velocity *= ANGULAR_DAMPING;
        self.angular_velocity += (self.velocity.x - self.velocity.y) * SPIN_COUPLING;
        self.angular_velocity = self
            .angular_velocity
            .clamp(-MAX_ANGULAR_VELOCITY, MAX_ANGULAR_VELOCITY);

        self.velocity = self.velocity.clamp_length_max(BALL_MAX_SPEED);
    }

    /// Idle wobble in the launcher, driven by the frame timestamp in seconds
    pub fn sway(&mut self, anchor: Vec2, time_secs: f64) {
        let offset = (time_secs * SWAY_FREQUENCY as f64).sin() as f32 * SWAY_AMPLITUDE;
        self.position = Vec2::new(anchor.x + offset, anchor.y);
        self.rotation += IDLE_SPIN;
    }

    /// Fire the ball along `direction` with the given power in [0, 1]
    ///
    /// `spin` is a small sideways nudge; `spin_factor` converts it to angular velocity.
    pub fn launch(&mut self, direction: Vec2, power: f32, spin: f32, spin_factor: f32, now_ms: f64) -> f32 {
        let speed = LAUNCH_BASE_SPEED * (1.0 + power * LAUNCH_POWER_GAIN);
        self.velocity = Vec2::new(
            direction.x * speed * LAUNCH_LATERAL_SHARE + spin,
            direction.y * speed,
        );
        self.angular_velocity = spin * spin_factor;
        self.is_launched = true;
        self.last_collision_time = now_ms;
        speed
    }

    /// Lowest point of the ball
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.position.y + self.radius
    }
}

/// Plunger driven by a downward drag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Launcher {
    /// Where the unlaunched ball rests
    pub position: Vec2,
    pub drag_start: Option<Vec2>,
    pub drag_end: Option<Vec2>,
    pub is_dragging: bool,
    pub max_drag_distance: f32,
    /// Current launch power in [0, 1]
    pub power: f32,
}

impl Launcher {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            drag_start: None,
            drag_end: None,
            is_dragging: false,
            max_drag_distance: MAX_DRAG_DISTANCE,
            power: 0.0,
        }
    }

    pub fn start_drag(&mut self, at: Vec2) {
        self.drag_start = Some(at);
        self.drag_end = Some(at);
        self.is_dragging = true;
    }

    /// Track the pointer; only downward motion counts, clamped to the max distance
    pub fn update_drag(&mut self, at: Vec2) {
        let Some(start) = self.drag_start else {
            return;
        };
        if !self.is_dragging {
            return;
        }

        let distance = (at.y - start.y).max(0.0);
        let clamped = distance.min(self.max_drag_distance);
        self.drag_end = Some(Vec2::new(start.x, start.y + clamped));
        self.power = clamped / self.max_drag_distance;
    }

    /// Power implied by the current drag, if one is complete
    pub fn drag_power(&self) -> Option<f32> {
        let (start, end) = (self.drag_start?, self.drag_end?);
        let distance = (end - start).length().min(self.max_drag_distance);
        Some(distance / self.max_drag_distance)
    }

    /// Forget the drag but keep the power reading
    pub fn clear_drag(&mut self) {
        self.drag_start = None;
        self.drag_end = None;
        self.is_dragging = false;
    }

    /// Abandon the drag entirely
    pub fn cancel(&mut self) {
        self.clear_drag();
        self.power = 0.0;
    }
}

/// A scoring bumper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBumper {
    pub id: u32,
    pub position: Vec2,
    pub radius: f32,
    pub score_value: u64,
    /// Cleared once per level when first hit
    pub is_active: bool,
}

impl ScoreBumper {
    pub fn new(id: u32, position: Vec2, score_value: u64) -> Self {
        Self {
            id,
            position,
            radius: BUMPER_RADIUS,
            score_value,
            is_active: true,
        }
    }
}

/// The standard five-bumper cluster in the upper half of the table
pub fn default_bumpers(width: f32, height: f32) -> Vec<ScoreBumper> {
    [
        (0.3, 0.3, 100),
        (0.7, 0.3, 100),
        (0.5, 0.4, 150),
        (0.4, 0.5, 200),
        (0.6, 0.5, 200),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (fx, fy, score))| ScoreBumper::new(i as u32 + 1, Vec2::new(width * fx, height * fy), score))
    .collect()
}

/// Table walls; the bottom edge is the drain, not a bouncing wall
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Walls {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Walls {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            left: 0.0,
            right: width,
            top: 0.0,
            bottom: height,
        }
    }
}

/// Score and progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub phase: GamePhase,
    pub score: u64,
    /// Single-ball play: always 1
    pub lives: u8,
    pub level: u32,
    /// Impulse responses and channel wall contacts this session
    pub collision_count: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            phase: GamePhase::Idle,
            score: 0,
            lives: 1,
            level: 1,
            collision_count: 0,
        }
    }
}

impl GameState {
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Fresh game at level 1
    pub fn begin(&mut self) {
        *self = Self {
            phase: GamePhase::Playing,
            ..Self::default()
        };
    }
}
