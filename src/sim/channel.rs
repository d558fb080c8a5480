//! Curved launch channel
//!
//! The ball leaves the plunger through a Bezier tunnel that runs from the
//! bottom-right corner up to the top of the table. While the ball is inside,
//! it is held within the tunnel band and nudged along the curve; once it
//! leaves through the exit, the tunnel's side walls become ordinary walls.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bezier::{CubicBezier, CurveSample};
use super::collision::reflect_velocity;
use super::state::Ball;
use crate::consts::*;
use crate::perp;

/// Beyond this parameter the ball may leave through the exit
const EXIT_PARAMETER: f32 = 0.9;
/// Beyond this parameter containment queries use the exit width
const EXIT_FLARE_PARAMETER: f32 = 0.8;
const WALL_REFLECTION: f32 = 1.5;
const CURVATURE_PUSH: f32 = 0.3;
const WALL_DAMPING: f32 = 0.97;
const TANGENT_PUSH: f32 = 0.5;
const TANGENT_GRAVITY: f32 = 0.2;

/// Restitution of the channel walls once the ball is out
pub const WALL_RESTITUTION: f32 = 0.9;
pub const WALL_FRICTION: f32 = 0.2;

/// What the channel did to the ball this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelContact {
    /// Not within the tunnel band; nothing applied
    Outside,
    /// Held in the band; `wall_contact` when it was pushed off a side wall
    Contained { wall_contact: bool },
    /// Left through the exit
    Exited,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LauncherChannel {
    pub curve: CubicBezier,
    pub width: f32,
    pub exit_width: f32,
    pub segments: usize,
}

impl LauncherChannel {
    /// Channel for a table of the given size, control points already optimized
    pub fn new(table_width: f32, table_height: f32, segments: usize) -> Self {
        let start = Vec2::new(table_width - 40.0, table_height);
        let end = Vec2::new(table_width * 0.6, 60.0);
        let mut channel = Self {
            curve: CubicBezier::new(start, start, end, end),
            width: CHANNEL_WIDTH,
            exit_width: CHANNEL_EXIT_WIDTH,
            segments,
        };
        channel.optimize_control_points();
        channel
    }

    /// Re-derive the inner control points from the fixed anchors
    ///
    /// P1 sits straight above the start so the launch leaves vertically; P2
    /// sits right of and above the end so the exit runs roughly horizontal.
    /// Whenever P1 lies below P2 it is lifted to `CHANNEL_MIN_CONTROL_SEPARATION`
    /// above P2, which stretches the vertical launch leg up past the exit.
    pub fn optimize_control_points(&mut self) {
        let start = self.curve.p0;
        let end = self.curve.p3;

        let mut p1 = Vec2::new(start.x, start.y - 200.0);
        let p2 = Vec2::new(end.x + 100.0, end.y - 50.0);

        if p1.y > p2.y {
            p1.y = p2.y - CHANNEL_MIN_CONTROL_SEPARATION;
        }

        self.curve.p1 = p1;
        self.curve.p2 = p2;
    }

    pub fn control_points(&self) -> [Vec2; 4] {
        [self.curve.p0, self.curve.p1, self.curve.p2, self.curve.p3]
    }

    /// Fresh centerline samples, `segments + 1` of them
    pub fn generate_channel_points(&self) -> Vec<CurveSample> {
        self.curve.samples(self.segments)
    }

    /// Hold the ball inside the tunnel band
    pub fn constrain(&self, samples: &[CurveSample], ball: &mut Ball) -> ChannelContact {
        let Some((index, nearest)) = nearest_sample(samples, ball.position) else {
            return ChannelContact::Outside;
        };

        let normal = perp(nearest.tangent);
        let offset = (ball.position - nearest.point).dot(normal);

        if sample_parameter(index, samples.len()) > EXIT_PARAMETER {
            if let Some(exit) = samples.last() {
                if ball.position.distance(exit.point) > self.exit_width / 2.0 {
                    return ChannelContact::Exited;
                }
            }
        }

        let half_width = self.width / 2.0;
        if offset.abs() > half_width + ball.radius {
            return ChannelContact::Outside;
        }

        let mut wall_contact = false;
        if offset.abs() > half_width - ball.radius {
            let side = offset.signum();
            let penetration = offset.abs() - (half_width - ball.radius);
            ball.position -= normal * side * penetration;

            // Only moving into the wall bounces
            if ball.velocity.dot(normal) * side > 0.0 {
                ball.velocity = reflect_velocity(ball.velocity, normal, WALL_REFLECTION);
            }

            ball.velocity += normal * nearest.curvature * CURVATURE_PUSH * side;
            ball.velocity *= WALL_DAMPING;
            wall_contact = true;
        }

        ball.velocity += nearest.tangent * TANGENT_PUSH;
        ball.velocity.y += TANGENT_GRAVITY * nearest.tangent.y.abs();

        ChannelContact::Contained { wall_contact }
    }

    /// Side wall segments, left then right for each pair of consecutive samples
    pub fn wall_segments(&self, samples: &[CurveSample]) -> Vec<(Vec2, Vec2)> {
        let half_width = self.width / 2.0;
        samples
            .windows(2)
            .flat_map(|pair| {
                let (a, b) = (pair[0], pair[1]);
                let na = perp(a.tangent) * half_width;
                let nb = perp(b.tangent) * half_width;
                [(a.point + na, b.point + nb), (a.point - na, b.point - nb)]
            })
            .collect()
    }

    /// True when a ball at `position` overlaps the tunnel anywhere
    pub fn contains(&self, samples: &[CurveSample], position: Vec2, radius: f32) -> bool {
        samples.iter().enumerate().any(|(i, sample)| {
            let half_width = if sample_parameter(i, samples.len()) > EXIT_FLARE_PARAMETER {
                self.exit_width / 2.0
            } else {
                self.width / 2.0
            };
            position.distance(sample.point) < half_width + radius
        })
    }
}

/// Curve parameter of the i-th of `count` uniform samples
#[inline]
fn sample_parameter(index: usize, count: usize) -> f32 {
    if count < 2 {
        return 0.0;
    }
    index as f32 / (count - 1) as f32
}

/// Closest sample to `position`; the first one wins ties
fn nearest_sample(samples: &[CurveSample], position: Vec2) -> Option<(usize, CurveSample)> {
    let mut best: Option<(usize, CurveSample, f32)> = None;
    for (i, sample) in samples.iter().enumerate() {
        let d = position.distance_squared(sample.point);
        if best.is_none_or(|(_, _, best_d)| d < best_d) {
            best = Some((i, *sample, d));
        }
    }
    best.map(|(i, sample, _)| (i, sample))
}
