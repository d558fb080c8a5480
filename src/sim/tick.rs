//! Per-frame update
//!
//! Fixed order each frame:
//! 1. Apply buffered input
//! 2. Integrate the ball (or sway it in the launcher)
//! 3. Swing the flippers (left, right)
//! 4. Age particle effects
//! 5. Relax the shock absorbers
//! 6. Collision pass, only while the ball is launched: channel or channel
//!    walls, table walls, shock absorbers, flippers, nearby bumpers, drain
//! 7. Fire due scheduled actions

use glam::Vec2;

use super::channel::{ChannelContact, WALL_FRICTION, WALL_RESTITUTION};
use super::collision::{circle_circle_collision, resolve_impulse, segment_circle_collision};
use super::flipper::FlipperSide;
use super::schedule::ScheduledAction;
use super::session::Session;
use super::snapshot::DropDiagnostics;
use super::state::GameEvent;
use crate::consts::*;

const TABLE_WALL_RESTITUTION: f32 = 0.8;
const TABLE_WALL_FRICTION: f32 = 0.2;
const SHOCK_RESTITUTION: f32 = 1.0;
const SHOCK_FRICTION: f32 = 0.1;
/// Shock absorbers throw an extra burst of this intensity
const SHOCK_SPARK_INTENSITY: f32 = 1.0;
const FLIPPER_FRICTION: f32 = 0.08;
/// Flipper contacts separating faster than this are ignored
const FLIPPER_SEPARATION_SPEED: f32 = 0.5;
const BUMPER_RESTITUTION: f32 = 1.2;
const BUMPER_FRICTION: f32 = 0.05;
/// Spark intensity per unit of closing speed
const SPARK_PER_SPEED: f32 = 0.1;

impl Session {
    /// Advance one frame
    ///
    /// `now_ms` is the host's frame timestamp; `None` steps a nominal 16 ms
    /// past the previous frame. The first frame after `start` counts as a
    /// nominal 16 ms either way. Does nothing unless playing.
    pub fn update(&mut self, now_ms: Option<f64>) {
        if !self.game.is_playing() {
            return;
        }
        self.process_input();
        if !self.game.is_playing() {
            return;
        }

        let now = now_ms.unwrap_or_else(|| self.clock.next_nominal_ms());
        let dt = (self.clock.advance(now) / 1000.0) as f32;

        if self.ball.is_launched {
            self.ball.integrate();
        } else {
            self.ball.sway(self.launcher.position, now / 1000.0);
        }

        self.left_flipper.update_angle(dt);
        self.right_flipper.update_angle(dt);
        self.effects.age(dt);
        self.left_shock.decay(dt);
        self.right_shock.decay(dt);

        if self.ball.is_launched {
            self.check_collisions();
        }

        self.fire_scheduled();
    }

    fn check_collisions(&mut self) {
        if self.has_exited_launcher {
            self.check_channel_walls();
        } else {
            self.apply_channel();
        }

        self.check_table_walls();

        self.check_shock_absorber(FlipperSide::Left);
        self.check_shock_absorber(FlipperSide::Right);

        self.check_flipper(FlipperSide::Left);
        self.check_flipper(FlipperSide::Right);

        self.check_bumpers();

        // Must run last
        self.check_drain();
    }

    /// Impulse response against a surface, plus sparks and bookkeeping
    ///
    /// Returns false when the ball was already separating.
    pub(crate) fn respond(&mut self, normal: Vec2, point: Vec2, restitution: f32, friction: f32) -> bool {
        let Some(impulse) = resolve_impulse(self.ball.velocity, normal, restitution, friction) else {
            return false;
        };
        self.ball.velocity = impulse.velocity;
        self.effects
            .spark_burst(&mut self.rng, point, normal, impulse.closing_speed * SPARK_PER_SPEED);
        self.ball.last_collision_time = self.clock.now_ms;
        self.game.collision_count += 1;
        true
    }

    fn apply_channel(&mut self) {
        let samples = self.channel.generate_channel_points();
        match self.channel.constrain(&samples, &mut self.ball) {
            ChannelContact::Exited => {
                self.has_exited_launcher = true;
                log::debug!(
                    "Ball left the launch channel at ({:.1}, {:.1})",
                    self.ball.position.x,
                    self.ball.position.y
                );
            }
            ChannelContact::Contained { wall_contact: true } => {
                self.game.collision_count += 1;
            }
            ChannelContact::Contained { wall_contact: false } | ChannelContact::Outside => {}
        }
    }

    /// Channel side walls behave as ordinary walls once the ball is out
    fn check_channel_walls(&mut self) {
        let samples = self.channel.generate_channel_points();
        let contact_radius = self.ball.radius + CHANNEL_WALL_HALF_THICKNESS;
        for (start, end) in self.channel.wall_segments(&samples) {
            let result = segment_circle_collision(start, end, self.ball.position, contact_radius);
            if result.hit {
                self.respond(result.normal, result.point, WALL_RESTITUTION, WALL_FRICTION);
                break;
            }
        }
    }

    /// Left, right and top; the bottom is the drain
    fn check_table_walls(&mut self) {
        let walls = self.walls;
        let r = self.ball.radius;

        if self.ball.position.x - r <= walls.left {
            self.ball.position.x = walls.left + r;
            let point = Vec2::new(walls.left, self.ball.position.y);
            self.respond(Vec2::X, point, TABLE_WALL_RESTITUTION, TABLE_WALL_FRICTION);
        }

        if self.ball.position.x + r >= walls.right {
            self.ball.position.x = walls.right - r;
            let point = Vec2::new(walls.right, self.ball.position.y);
            self.respond(Vec2::NEG_X, point, TABLE_WALL_RESTITUTION, TABLE_WALL_FRICTION);
        }

        if self.ball.position.y - r <= walls.top {
            self.ball.position.y = walls.top + r;
            let point = Vec2::new(self.ball.position.x, walls.top);
            self.respond(Vec2::Y, point, TABLE_WALL_RESTITUTION, TABLE_WALL_FRICTION);
        }
    }

    fn check_shock_absorber(&mut self, side: FlipperSide) {
        let shock = self.shock_absorber(side);
        let result = shock.check_collision(self.ball.position, self.ball.radius);
        if !result.hit {
            return;
        }
        let (kick, spin) = (shock.kick(), shock.spin());

        self.respond(result.normal, result.point, SHOCK_RESTITUTION, SHOCK_FRICTION);
        self.ball.velocity += kick;
        self.ball.angular_velocity += spin;

        let now = self.clock.now_ms;
        self.shock_absorber_mut(side).compress(now);
        self.effects
            .spark_burst(&mut self.rng, result.point, result.normal, SHOCK_SPARK_INTENSITY);

        self.ball.position += result.normal * result.penetration;
    }

    fn check_flipper(&mut self, side: FlipperSide) {
        let flipper = self.flipper(side);
        let result = flipper.check_collision(self.ball.position, self.ball.radius);
        if !result.hit {
            return;
        }
        if self.ball.velocity.dot(result.normal) >= FLIPPER_SEPARATION_SPEED {
            return;
        }
        let (restitution, kick, spin) = (flipper.restitution(), flipper.kick(), flipper.spin());

        self.respond(result.normal, result.point, restitution, FLIPPER_FRICTION);
        self.ball.velocity += kick;
        self.ball.angular_velocity += spin;

        if result.penetration > 0.0 {
            self.ball.position += result.normal * (result.penetration * 2.0);
        }
    }

    fn check_bumpers(&mut self) {
        for idx in self.grid.nearby(self.ball.position) {
            let Some(bumper) = self.bumpers.get(idx) else {
                continue;
            };
            let result = circle_circle_collision(
                self.ball.position,
                self.ball.radius,
                bumper.position,
                bumper.radius,
            );
            if !result.hit {
                continue;
            }
            let center = bumper.position;

            self.respond(result.normal, center, BUMPER_RESTITUTION, BUMPER_FRICTION);
            self.ball.velocity *= BUMPER_BOOST;

            let bumper = &mut self.bumpers[idx];
            if !bumper.is_active {
                continue;
            }
            bumper.is_active = false;
            let (id, score) = (bumper.id, bumper.score_value);
            self.game.score += score;
            self.effects.score_burst(&mut self.rng, center);
            self.events.push(GameEvent::BumperHit { id, score });

            if self.bumpers.iter().all(|b| !b.is_active) {
                let due = self.clock.elapsed_ms + LEVEL_ADVANCE_DELAY_MS;
                if self.scheduler.schedule(ScheduledAction::AdvanceLevel, due) {
                    self.events.push(GameEvent::LevelCleared);
                    log::info!("Level {} cleared", self.game.level);
                }
            }
        }
    }

    /// Ball reached the bottom edge: pin it there and end the game shortly
    fn check_drain(&mut self) {
        let bottom = self.walls.bottom;
        if self.ball.bottom() < bottom {
            return;
        }
        self.ball.position.y = bottom - self.ball.radius;

        let due = self.clock.elapsed_ms + GAME_OVER_DELAY_MS;
        if !self.scheduler.schedule(ScheduledAction::EndGame, due) {
            return;
        }
        self.events.push(GameEvent::BallDrained);

        if self.debug.enabled {
            let drop = DropDiagnostics {
                position: self.ball.position,
                velocity: self.ball.velocity,
                bottom_wall: bottom,
                score: self.game.score,
            };
            log::info!(
                "Ball drained at ({:.1}, {:.1}) velocity ({:.2}, {:.2}), score {}",
                drop.position.x,
                drop.position.y,
                drop.velocity.x,
                drop.velocity.y,
                drop.score
            );
            self.debug.last_drop = Some(drop);
        }
    }

    fn fire_scheduled(&mut self) {
        while let Some(action) = self.scheduler.pop_due(self.clock.elapsed_ms) {
            match action {
                ScheduledAction::AdvanceLevel => self.advance_level(),
                ScheduledAction::EndGame => self.end(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::state::GamePhase;

    const FRAME_MS: f64 = 16.0;

    fn started() -> Session {
        let mut session = Session::new(Settings::default());
        session.start();
        session
    }

    /// Launched ball placed by hand, clear of the launch channel
    fn free_ball(session: &mut Session, position: Vec2, velocity: Vec2) {
        session.ball.is_launched = true;
        session.has_exited_launcher = true;
        session.ball.position = position;
        session.ball.velocity = velocity;
    }

    #[test]
    fn test_update_is_noop_when_idle() {
        let mut session = Session::new(Settings::default());
        let before = session.ball().clone();
        session.update(Some(0.0));
        assert_eq!(session.ball(), &before);
        assert_eq!(session.clock.last_ms, None);
    }

    #[test]
    fn test_first_frame_is_nominal() {
        let mut session = started();
        session.update(Some(5000.0));
        assert_eq!(session.clock.elapsed_ms, 16.0);
        session.update(Some(5033.0));
        assert_eq!(session.clock.elapsed_ms, 49.0);
    }

    #[test]
    fn test_untimed_update_steps_nominally() {
        let mut session = started();
        session.update(None);
        session.update(None);
        assert_eq!(session.clock.now_ms, 16.0);
        assert_eq!(session.clock.elapsed_ms, 32.0);

        session.update(Some(100.0));
        session.update(None);
        assert_eq!(session.clock.now_ms, 116.0);
        assert_eq!(session.clock.elapsed_ms, 32.0 + 84.0 + 16.0);
    }

    #[test]
    fn test_unlaunched_ball_sways_in_launcher() {
        let mut session = started();
        for i in 0..30 {
            session.update(Some(i as f64 * 33.0));
            let ball = session.ball();
            assert!((ball.position.x - session.launcher().position.x).abs() <= SWAY_AMPLITUDE);
            assert_eq!(ball.position.y, session.launcher().position.y);
        }
        assert_eq!(session.game().collision_count, 0);
    }

    #[test]
    fn test_launch_travels_up_the_channel() {
        let mut session = started();
        session.launch_ball_with_power(1.0);
        for i in 0..3 {
            session.update(Some(i as f64 * FRAME_MS));
        }
        assert!(session.ball().position.y < 720.0);
        assert!(!session.has_exited_launcher());
        assert!(session.is_ball_in_channel());
        assert!(session.is_playing());
    }

    #[test]
    fn test_left_wall_bounce() {
        let mut session = started();
        free_ball(&mut session, Vec2::new(13.0, 300.0), Vec2::new(-5.0, 0.0));
        session.update(Some(0.0));
        assert_eq!(session.ball().position.x, BALL_RADIUS);
        assert!(session.ball().velocity.x > 0.0);
        assert_eq!(session.game().collision_count, 1);
        assert!(!session.effects().is_empty());
    }

    #[test]
    fn test_idle_flipper_bats_ball_up() {
        let mut session = started();
        let flipper = session.left_flipper().clone();
        let mid = (flipper.pivot + flipper.end_point) / 2.0;
        free_ball(&mut session, mid + Vec2::new(0.0, -18.0), Vec2::new(0.0, 2.0));
        let before = session.ball().position.y;

        session.update(Some(0.0));
        assert!(session.ball().velocity.y < -3.0);
        assert!(session.ball().position.y < before);
        assert!(session.game().collision_count >= 1);
    }

    #[test]
    fn test_shock_absorber_kicks_and_compresses() {
        let mut session = started();
        let shock = session.shock_absorber(FlipperSide::Right).clone();
        free_ball(&mut session, shock.position + Vec2::new(0.0, -25.0), Vec2::new(0.0, 3.0));

        session.update(Some(0.0));
        let shock = session.shock_absorber(FlipperSide::Right);
        assert!(shock.is_compressed);
        assert!((shock.compression - 0.3).abs() < 1e-6);
        assert!(session.ball().velocity.x < 0.0);
        assert!(session.ball().velocity.y < 0.0);
    }

    #[test]
    fn test_shock_absorber_reaches_into_channel() {
        let mut session = started();
        session.launch_ball_with_power(1.0);
        session.ball.position = Vec2::new(560.0, 625.0);
        session.ball.velocity = Vec2::new(0.0, -5.0);
        let reach = session
            .shock_absorber(FlipperSide::Right)
            .check_collision(Vec2::new(560.0, 620.0), BALL_RADIUS);
        assert!(reach.hit);

        session.update(Some(0.0));
        assert!(!session.has_exited_launcher());
        assert!(session.shock_absorber(FlipperSide::Right).is_compressed);
        assert!(!session.shock_absorber(FlipperSide::Left).is_compressed);
        assert!(session.game().collision_count >= 1);
    }

    #[test]
    fn test_channel_wall_after_exit() {
        let mut session = started();
        let samples = session.channel_points();
        let walls = session.channel().wall_segments(&samples);
        let (start, end) = walls[20];
        let normal = crate::perp(samples[10].tangent);
        free_ball(&mut session, (start + end) / 2.0 - normal * 15.0, normal * 4.0);

        session.update(Some(0.0));
        assert_eq!(session.game().collision_count, 1);
        assert!(session.ball().velocity.dot(normal) < 0.0);
    }

    #[test]
    fn test_ball_at_bumper_center_stays_finite() {
        let mut session = started();
        let center = session.bumpers()[0].position;
        free_ball(&mut session, center, Vec2::ZERO);

        session.update(Some(0.0));
        let ball = session.ball();
        assert!(ball.position.is_finite());
        assert!(ball.velocity.is_finite());
        assert!(ball.velocity.y < 0.0);
        assert_eq!(session.game().score, 100);
        assert!(!session.bumpers()[0].is_active);
    }

    #[test]
    fn test_bumper_scores_once() {
        let mut session = started();
        let center = session.bumpers()[2].position;
        free_ball(&mut session, center + Vec2::new(0.0, 30.0), Vec2::new(0.0, -5.0));
        session.update(Some(0.0));
        assert_eq!(session.game().score, 150);

        free_ball(&mut session, center + Vec2::new(0.0, 30.0), Vec2::new(0.0, -5.0));
        session.update(Some(FRAME_MS));
        assert_eq!(session.game().score, 150);

        let hits: Vec<_> = session
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::BumperHit { .. }))
            .collect();
        assert_eq!(hits, vec![GameEvent::BumperHit { id: 3, score: 150 }]);
    }

    /// Knock out the last active bumper; the other four are already cleared
    fn clear_level(session: &mut Session) {
        for bumper in &mut session.bumpers[..4] {
            bumper.is_active = false;
        }
        let center = session.bumpers[4].position;
        free_ball(session, center + Vec2::new(0.0, 30.0), Vec2::new(0.0, -5.0));
        session.update(Some(0.0));
        assert!(session.bumpers.iter().all(|b| !b.is_active));
        // Park the ball so nothing else happens while the timer runs
        session.reset_ball();
    }

    #[test]
    fn test_level_advances_once_after_delay() {
        let mut session = started();
        clear_level(&mut session);
        assert_eq!(session.game().score, 200);
        assert!(session.drain_events().contains(&GameEvent::LevelCleared));

        let mut t = 0.0;
        while session.clock.elapsed_ms + FRAME_MS < FRAME_MS + LEVEL_ADVANCE_DELAY_MS {
            t += FRAME_MS;
            session.update(Some(t));
            assert_eq!(session.game().level, 1);
        }

        t += FRAME_MS;
        session.update(Some(t));
        assert_eq!(session.game().level, 2);
        assert_eq!(session.game().score, 1200);
        assert!(session.bumpers().iter().all(|b| b.is_active));
        assert_eq!(session.grid.len(), 5);
        assert!(!session.ball().is_launched);
        assert_eq!(session.ball().position, session.channel().curve.p0);

        for _ in 0..200 {
            t += FRAME_MS;
            session.update(Some(t));
        }
        assert_eq!(session.game().level, 2);
        let advances = session
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::LevelAdvanced { .. }))
            .count();
        assert_eq!(advances, 1);
    }

    #[test]
    fn test_restart_drops_pending_level_advance() {
        let mut session = started();
        clear_level(&mut session);
        session.restart();

        for i in 0..200 {
            session.update(Some(i as f64 * FRAME_MS));
        }
        assert_eq!(session.game().level, 1);
        assert_eq!(session.game().score, 0);
    }

    #[test]
    fn test_drain_ends_game_after_grace() {
        let mut session = started();
        session.set_debug(true);
        free_ball(&mut session, Vec2::new(300.0, 785.0), Vec2::new(0.0, 5.0));

        session.update(Some(0.0));
        assert_eq!(session.ball().bottom(), 800.0);
        assert!(session.is_playing());
        assert!(session.debug_info().last_drop.is_some());

        let mut t = 0.0;
        while session.is_playing() {
            t += FRAME_MS;
            session.update(Some(t));
        }
        assert!(session.is_game_over());
        assert!(!session.is_playing());
        assert!(session.clock.elapsed_ms >= FRAME_MS + GAME_OVER_DELAY_MS);
        assert!(session.clock.elapsed_ms < FRAME_MS + GAME_OVER_DELAY_MS + 2.0 * FRAME_MS);

        let events = session.drain_events();
        assert_eq!(events.iter().filter(|e| **e == GameEvent::BallDrained).count(), 1);
        assert!(matches!(events.last(), Some(GameEvent::GameOver { .. })));

        // Frozen from here on
        let ball = session.ball().clone();
        let game = session.game().clone();
        let elapsed = session.clock.elapsed_ms;
        session.control_flipper(FlipperSide::Left, crate::sim::flipper::FlipperAction::Down);
        for _ in 0..10 {
            t += FRAME_MS;
            session.update(Some(t));
        }
        assert_eq!(session.ball(), &ball);
        assert_eq!(session.game(), &game);
        assert_eq!(session.clock.elapsed_ms, elapsed);
        assert_eq!(session.game().phase, GamePhase::GameOver);
        assert!(!session.left_flipper().is_pressed);
    }

    #[test]
    fn test_reset_ball_cancels_pending_game_over() {
        let mut session = started();
        free_ball(&mut session, Vec2::new(300.0, 785.0), Vec2::new(0.0, 5.0));
        session.update(Some(0.0));
        session.reset_ball();

        for i in 1..50 {
            session.update(Some(i as f64 * FRAME_MS));
        }
        assert!(session.is_playing());
    }

    #[test]
    fn test_same_seed_same_game() {
        let run = || {
            let mut session = started();
            session.launch_ball_with_power(0.9);
            for i in 0..240 {
                if i % 40 == 0 {
                    session.control_flipper(FlipperSide::Left, crate::sim::flipper::FlipperAction::Down);
                }
                if i % 40 == 10 {
                    session.control_flipper(FlipperSide::Left, crate::sim::flipper::FlipperAction::Up);
                }
                session.update(Some(i as f64 * FRAME_MS));
            }
            session.snapshot()
        };
        let (a, b) = (run(), run());
        assert_eq!(a.ball, b.ball);
        assert_eq!(a.game, b.game);
        assert_eq!(a.effects.len(), b.effects.len());
    }
}
