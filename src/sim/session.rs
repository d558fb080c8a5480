//! The table session
//!
//! `Session` owns every piece of table state and is driven by one writer:
//! control calls and input take effect immediately, `update` (in `tick`)
//! advances the simulation one frame at a time.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::bezier::CurveSample;
use super::channel::LauncherChannel;
use super::effects::{CollisionEffect, Effects};
use super::flipper::{Flipper, FlipperAction, FlipperSide};
use super::grid::BumperGrid;
use super::input::InputQueue;
use super::schedule::{ScheduledAction, Scheduler};
use super::shock::ShockAbsorber;
use super::snapshot::{DebugInfo, LaunchDiagnostics};
use super::state::{Ball, GameEvent, GamePhase, GameState, Launcher, ScoreBumper, Walls, default_bumpers};
use crate::consts::*;
use crate::settings::{ConfigError, Settings};

/// Spin spread and spin-to-angular-velocity factor for a drag launch
const DRAG_LAUNCH_SPIN: (f32, f32) = (0.5, 0.3);
/// Same for a direct power launch
const POWER_LAUNCH_SPIN: (f32, f32) = (0.3, 0.2);

/// Frame timestamps
///
/// `now_ms` is the host's timestamp for the current frame; `elapsed_ms` is
/// the sum of frame deltas since start and is the time base for scheduled
/// actions. The simulation never reads a platform clock.
#[derive(Debug, Clone, Default)]
pub(crate) struct FrameClock {
    pub(crate) last_ms: Option<f64>,
    pub(crate) now_ms: f64,
    pub(crate) elapsed_ms: f64,
}

impl FrameClock {
    fn reset(&mut self) {
        self.last_ms = None;
        self.elapsed_ms = 0.0;
    }

    /// Timestamp one nominal frame after the previous one
    pub(crate) fn next_nominal_ms(&self) -> f64 {
        self.last_ms.map_or(0.0, |last| last + NOMINAL_FRAME_MS)
    }

    /// Record a new frame timestamp and return the delta in milliseconds
    pub(crate) fn advance(&mut self, now_ms: f64) -> f64 {
        let delta = match self.last_ms {
            Some(last) => (now_ms - last).max(0.0),
            None => NOMINAL_FRAME_MS,
        };
        self.last_ms = Some(now_ms);
        self.now_ms = now_ms;
        self.elapsed_ms += delta;
        delta
    }
}

pub struct Session {
    pub(crate) settings: Settings,
    pub(crate) walls: Walls,
    pub(crate) ball: Ball,
    pub(crate) launcher: Launcher,
    pub(crate) channel: LauncherChannel,
    pub(crate) left_flipper: Flipper,
    pub(crate) right_flipper: Flipper,
    pub(crate) left_shock: ShockAbsorber,
    pub(crate) right_shock: ShockAbsorber,
    pub(crate) bumpers: Vec<ScoreBumper>,
    pub(crate) grid: BumperGrid,
    pub(crate) effects: Effects,
    pub(crate) game: GameState,
    /// One-way latch, cleared only by a ball reset
    pub(crate) has_exited_launcher: bool,
    pub(crate) scheduler: Scheduler,
    pub(crate) rng: Pcg32,
    pub(crate) clock: FrameClock,
    pub(crate) input: InputQueue,
    pub(crate) events: Vec<GameEvent>,
    pub(crate) debug: DebugInfo,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Session {
    /// Build an idle session; `settings` must already be valid
    pub fn new(settings: Settings) -> Self {
        let (w, h) = (settings.table_width, settings.table_height);
        let launcher = Launcher::new(Vec2::new(w - 40.0, h - 100.0));
        let bumpers = default_bumpers(w, h);
        let mut grid = BumperGrid::new();
        grid.rebuild(&bumpers);

        Self {
            walls: Walls::new(w, h),
            ball: Ball::new(launcher.position),
            launcher,
            channel: LauncherChannel::new(w, h, settings.channel_segments),
            left_flipper: Flipper::left(w, h),
            right_flipper: Flipper::right(w, h),
            left_shock: ShockAbsorber::left(w, h),
            right_shock: ShockAbsorber::right(w, h),
            bumpers,
            grid,
            effects: Effects::new(),
            game: GameState::default(),
            has_exited_launcher: false,
            scheduler: Scheduler::new(),
            rng: Pcg32::seed_from_u64(settings.seed),
            clock: FrameClock::default(),
            input: InputQueue::new(),
            events: Vec::new(),
            debug: DebugInfo {
                enabled: settings.debug,
                ..DebugInfo::default()
            },
            settings,
        }
    }

    /// Validate `settings`, then build the session
    pub fn try_new(settings: Settings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self::new(settings))
    }

    // === Session control ===

    /// Begin a fresh game and attach input
    pub fn start(&mut self) {
        self.game.begin();
        self.effects.clear();
        self.events.clear();

        for bumper in &mut self.bumpers {
            bumper.is_active = true;
        }
        self.left_flipper.reset();
        self.right_flipper.reset();
        self.channel.optimize_control_points();
        self.left_shock.reset();
        self.right_shock.reset();
        self.grid.rebuild(&self.bumpers);

        self.scheduler.bump_epoch();
        self.clock.reset();
        self.reset_ball();
        self.input.attach();

        log::info!("Session started (epoch {})", self.scheduler.epoch());
    }

    pub fn restart(&mut self) {
        log::info!("Restarting session");
        self.start();
    }

    /// Detach input and drop back to idle
    pub fn stop(&mut self) {
        self.input.detach();
        self.scheduler.bump_epoch();
        self.left_flipper.release();
        self.right_flipper.release();
        if self.game.is_playing() {
            self.game.phase = GamePhase::Idle;
        }
        log::info!("Session stopped");
    }

    /// Finish the game; only `restart` leaves the game-over phase
    pub fn end(&mut self) {
        if self.game.is_game_over() {
            return;
        }
        self.game.phase = GamePhase::GameOver;
        self.scheduler.bump_epoch();
        self.left_flipper.release();
        self.right_flipper.release();
        self.events.push(GameEvent::GameOver { score: self.game.score });
        log::info!(
            "Game over: score {} at level {}",
            self.game.score,
            self.game.level
        );
    }

    /// Return the ball to the channel start, unlaunched
    ///
    /// Also cancels a pending game over. Calling it twice is the same as once.
    pub fn reset_ball(&mut self) {
        self.ball.reset_to(self.channel.curve.p0);
        self.launcher.cancel();
        self.has_exited_launcher = false;
        self.scheduler.cancel(ScheduledAction::EndGame);
    }

    /// Award the level bonus and rearm the table
    pub fn advance_level(&mut self) {
        if !self.game.is_playing() {
            return;
        }
        self.game.level += 1;
        self.game.score += LEVEL_CLEAR_BONUS;
        self.reset_ball();
        for bumper in &mut self.bumpers {
            bumper.is_active = true;
        }
        self.grid.rebuild(&self.bumpers);
        self.scheduler.bump_epoch();
        self.events.push(GameEvent::LevelAdvanced { level: self.game.level });
        log::info!("Advanced to level {} (score {})", self.game.level, self.game.score);
    }

    // === Player input ===

    pub fn start_drag(&mut self, x: f32, y: f32) {
        if self.ball.is_launched {
            return;
        }
        self.launcher.start_drag(Vec2::new(x, y));
    }

    pub fn update_drag(&mut self, x: f32, y: f32) {
        self.launcher.update_drag(Vec2::new(x, y));
    }

    /// Release the plunger: launch if the pull was strong enough, else cancel
    pub fn end_drag(&mut self) {
        if self.launcher.is_dragging && self.launcher.power > MIN_LAUNCH_POWER {
            self.launch_from_drag();
        } else {
            self.launcher.cancel();
        }
    }

    fn launch_from_drag(&mut self) {
        if !self.ball.is_launched {
            if let Some(power) = self.launcher.drag_power() {
                self.launcher.power = power;
                self.launch(power, DRAG_LAUNCH_SPIN);
            }
        }
        self.launcher.clear_drag();
    }

    /// Launch immediately with `power` clamped to [0, 1]
    pub fn launch_ball_with_power(&mut self, power: f32) {
        if self.ball.is_launched {
            return;
        }
        let power = power.clamp(0.0, 1.0);
        self.launcher.power = power;
        self.launch(power, POWER_LAUNCH_SPIN);
    }

    /// Fire along the channel's start tangent
    fn launch(&mut self, power: f32, (spread, spin_factor): (f32, f32)) {
        let Some(start) = self.channel.generate_channel_points().first().copied() else {
            return;
        };

        let spin = (self.rng.random::<f32>() - 0.5) * spread;
        let speed = self
            .ball
            .launch(start.tangent, power, spin, spin_factor, self.clock.now_ms);
        self.has_exited_launcher = false;
        self.events.push(GameEvent::Launched { power });

        if self.debug.enabled {
            let launch = LaunchDiagnostics {
                power,
                speed,
                direction: start.tangent,
                velocity: self.ball.velocity,
                start_curvature: start.curvature,
            };
            log::info!(
                "Launch: power {:.2} speed {:.1} direction ({:.3}, {:.3}) velocity ({:.2}, {:.2}) curvature {:.4}",
                launch.power,
                launch.speed,
                launch.direction.x,
                launch.direction.y,
                launch.velocity.x,
                launch.velocity.y,
                launch.start_curvature
            );
            self.debug.last_launch = Some(launch);
        }
    }

    /// Press or release a flipper; ignored unless playing
    pub fn control_flipper(&mut self, side: FlipperSide, action: FlipperAction) {
        if !self.game.is_playing() {
            return;
        }
        let flipper = self.flipper_mut(side);
        match action {
            FlipperAction::Down => flipper.press(),
            FlipperAction::Up => flipper.release(),
        }
    }

    pub fn set_debug(&mut self, enabled: bool) {
        self.debug.enabled = enabled;
        log::info!("Debug mode {}", if enabled { "on" } else { "off" });
    }

    pub fn toggle_debug(&mut self) {
        self.set_debug(!self.debug.enabled);
    }

    // === Read-only state ===

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn launcher(&self) -> &Launcher {
        &self.launcher
    }

    pub fn channel(&self) -> &LauncherChannel {
        &self.channel
    }

    /// Current channel centerline samples
    pub fn channel_points(&self) -> Vec<CurveSample> {
        self.channel.generate_channel_points()
    }

    pub fn flipper(&self, side: FlipperSide) -> &Flipper {
        match side {
            FlipperSide::Left => &self.left_flipper,
            FlipperSide::Right => &self.right_flipper,
        }
    }

    pub(crate) fn flipper_mut(&mut self, side: FlipperSide) -> &mut Flipper {
        match side {
            FlipperSide::Left => &mut self.left_flipper,
            FlipperSide::Right => &mut self.right_flipper,
        }
    }

    pub fn left_flipper(&self) -> &Flipper {
        &self.left_flipper
    }

    pub fn right_flipper(&self) -> &Flipper {
        &self.right_flipper
    }

    pub fn shock_absorber(&self, side: FlipperSide) -> &ShockAbsorber {
        match side {
            FlipperSide::Left => &self.left_shock,
            FlipperSide::Right => &self.right_shock,
        }
    }

    pub(crate) fn shock_absorber_mut(&mut self, side: FlipperSide) -> &mut ShockAbsorber {
        match side {
            FlipperSide::Left => &mut self.left_shock,
            FlipperSide::Right => &mut self.right_shock,
        }
    }

    pub fn bumpers(&self) -> &[ScoreBumper] {
        &self.bumpers
    }

    pub fn effects(&self) -> &[CollisionEffect] {
        &self.effects.particles
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.game.is_playing()
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.game.is_game_over()
    }

    pub fn has_exited_launcher(&self) -> bool {
        self.has_exited_launcher
    }

    /// Whether the ball currently overlaps the launch channel
    pub fn is_ball_in_channel(&self) -> bool {
        self.channel.contains(
            &self.channel.generate_channel_points(),
            self.ball.position,
            self.ball.radius,
        )
    }

    pub fn debug_info(&self) -> &DebugInfo {
        &self.debug
    }

    pub fn is_input_attached(&self) -> bool {
        self.input.is_attached()
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
