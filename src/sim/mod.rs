//! Deterministic table simulation
//!
//! All gameplay logic lives here:
//! - Velocities in units per nominal frame; y grows downward
//! - Seeded RNG only (particle jitter, launch spin)
//! - Fixed collision order each frame
//! - No rendering or platform dependencies

pub mod bezier;
pub mod channel;
pub mod collision;
pub mod effects;
pub mod flipper;
pub mod grid;
pub mod input;
pub mod schedule;
pub mod session;
pub mod shock;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use bezier::{CubicBezier, CurveSample};
pub use channel::{ChannelContact, LauncherChannel};
pub use collision::{CollisionResult, circle_circle_collision, resolve_impulse, segment_circle_collision};
pub use effects::{CollisionEffect, EffectColor, Effects};
pub use flipper::{Flipper, FlipperAction, FlipperSide};
pub use grid::BumperGrid;
pub use input::{InputEvent, Key};
pub use schedule::{ScheduledAction, Scheduler};
pub use session::Session;
pub use shock::ShockAbsorber;
pub use snapshot::{DebugInfo, DropDiagnostics, LaunchDiagnostics, TableSnapshot};
pub use state::{Ball, GameEvent, GamePhase, GameState, Launcher, ScoreBumper, Walls};
