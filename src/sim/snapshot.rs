//! Read-only view of the table for renderers and tooling

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bezier::CurveSample;
use super::effects::CollisionEffect;
use super::flipper::Flipper;
use super::session::Session;
use super::shock::ShockAbsorber;
use super::state::{Ball, GameState, Launcher, ScoreBumper};

/// Parameters of the last launch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchDiagnostics {
    pub power: f32,
    pub speed: f32,
    pub direction: Vec2,
    pub velocity: Vec2,
    /// Channel curvature at the launch point
    pub start_curvature: f32,
}

/// Ball state at the moment it hit the drain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropDiagnostics {
    pub position: Vec2,
    pub velocity: Vec2,
    pub bottom_wall: f32,
    pub score: u64,
}

/// Debug overlay data; recorded only while enabled
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugInfo {
    pub enabled: bool,
    pub last_launch: Option<LaunchDiagnostics>,
    pub last_drop: Option<DropDiagnostics>,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub ball: Ball,
    pub launcher: Launcher,
    pub flippers: [Flipper; 2],
    pub shock_absorbers: [ShockAbsorber; 2],
    pub bumpers: Vec<ScoreBumper>,
    pub channel_control_points: [Vec2; 4],
    pub channel: Vec<CurveSample>,
    pub channel_width: f32,
    pub effects: Vec<CollisionEffect>,
    pub game: GameState,
    pub has_exited_launcher: bool,
    pub ball_in_channel: bool,
    pub debug: DebugInfo,
}

impl Session {
    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            ball: self.ball.clone(),
            launcher: self.launcher.clone(),
            flippers: [self.left_flipper.clone(), self.right_flipper.clone()],
            shock_absorbers: [self.left_shock.clone(), self.right_shock.clone()],
            bumpers: self.bumpers.clone(),
            channel_control_points: self.channel.control_points(),
            channel: self.channel.generate_channel_points(),
            channel_width: self.channel.width,
            effects: self.effects.particles.clone(),
            game: self.game.clone(),
            has_exited_launcher: self.has_exited_launcher,
            ball_in_channel: self.is_ball_in_channel(),
            debug: self.debug.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::CHANNEL_SEGMENTS;

    #[test]
    fn test_snapshot_of_fresh_session() {
        let mut session = Session::default();
        session.start();
        let snap = session.snapshot();
        assert_eq!(snap.bumpers.len(), 5);
        assert_eq!(snap.channel.len(), CHANNEL_SEGMENTS + 1);
        assert!(snap.ball_in_channel);
        assert!(snap.game.is_playing());
        assert!(snap.debug.last_launch.is_none());
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut session = Session::default();
        session.start();
        session.launch_ball_with_power(0.6);
        session.update(Some(0.0));

        let json = serde_json::to_string(&session.snapshot()).unwrap();
        let back: TableSnapshot = serde_json::from_str(&json).unwrap();
        assert!((back.ball.position - session.ball().position).length() < 1e-3);
        assert!(back.ball.is_launched);
        assert_eq!(back.game, *session.game());
        assert_eq!(back.bumpers.len(), 5);
    }
}
