//! Flipper Table headless driver
//!
//! Plays a scripted session at 60 Hz: pulls the plunger, then taps whichever
//! flipper the ball is falling onto, until the ball drains or the frame limit
//! is reached. The final table snapshot is printed as JSON.
//!
//! Usage: `flipper-table [settings.json] [max-frames]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Flipper Table (native) starting...");

    if let Err(err) = native::run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No headless driver on the web; frontends embed the library directly
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use glam::Vec2;

    use flipper_table::sim::{FlipperSide, GameEvent, InputEvent, Key, Session};
    use flipper_table::{ConfigError, Settings};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// One minute of play
    const DEFAULT_MAX_FRAMES: u64 = 60 * 60;
    /// Plunger pull, one step per frame
    const PULL_STEPS: u32 = 10;
    const PULL_STEP: f32 = 10.0;
    /// How close the ball must be to a flipper pivot to trigger a tap
    const TAP_RANGE: f32 = 110.0;

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let mut args = std::env::args().skip(1);
        let settings = match args.next() {
            Some(path) => Settings::load_from(path)?,
            None => Settings::default(),
        };
        let max_frames = match args.next() {
            Some(n) => n.parse::<u64>().map_err(|_| {
                ConfigError::Invalid(format!("max-frames must be a positive integer, got {n:?}"))
            })?,
            None => DEFAULT_MAX_FRAMES,
        };

        let mut session = Session::try_new(settings)?;
        session.start();

        let grip = session.launcher().position;
        let mut frame = 0u64;
        while frame < max_frames && !session.is_game_over() {
            script_plunger(&mut session, frame, grip);
            script_flippers(&mut session);

            session.update(Some(frame as f64 * FRAME_MS));
            for event in session.drain_events() {
                report(&event);
            }
            frame += 1;
        }

        let game = session.game();
        log::info!(
            "Stopped after {frame} frames: score {} level {} collisions {}",
            game.score,
            game.level,
            game.collision_count
        );
        session.stop();

        println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
        Ok(())
    }

    /// Grab the ball, pull down for `PULL_STEPS` frames, let go
    fn script_plunger(session: &mut Session, frame: u64, grip: Vec2) {
        let pull = PULL_STEPS as u64;
        let event = match frame {
            0 => InputEvent::PointerDown(grip),
            f if f <= pull => InputEvent::PointerMove(grip + Vec2::new(0.0, f as f32 * PULL_STEP)),
            f if f == pull + 1 => InputEvent::PointerUp,
            _ => return,
        };
        session.push_input(event);
    }

    /// Hold a flipper while the ball is dropping toward it
    fn script_flippers(session: &mut Session) {
        let ball = session.ball();
        if !ball.is_launched || !session.has_exited_launcher() {
            return;
        }
        let (position, falling) = (ball.position, ball.velocity.y > 0.0);

        for (side, key) in [(FlipperSide::Left, Key::Left), (FlipperSide::Right, Key::Right)] {
            let flipper = session.flipper(side);
            let in_range = position.distance(flipper.pivot) < TAP_RANGE && position.y < flipper.pivot.y;
            let event = match (in_range && falling, flipper.is_pressed) {
                (true, false) => InputEvent::KeyDown(key),
                (false, true) => InputEvent::KeyUp(key),
                _ => continue,
            };
            session.push_input(event);
        }
    }

    fn report(event: &GameEvent) {
        match event {
            GameEvent::Launched { power } => log::info!("Launched at power {power:.2}"),
            GameEvent::BumperHit { id, score } => log::info!("Bumper {id} hit for {score}"),
            GameEvent::LevelCleared => log::info!("All bumpers cleared"),
            GameEvent::LevelAdvanced { level } => log::info!("Level {level}"),
            GameEvent::BallDrained => log::info!("Ball drained"),
            GameEvent::GameOver { score } => log::info!("Game over with {score} points"),
        }
    }
}
