//! Collision detection and impulse response
//!
//! Every contact on the table reduces to one of two narrow-phase tests (ball
//! vs. line segment, ball vs. circle) followed by the same impulse response
//! with per-surface restitution and friction.

use glam::Vec2;

use crate::consts::BALL_MIN_SPEED;
use crate::perp;

/// Fallback normal when the ball center coincides with the contact point
pub const FALLBACK_NORMAL: Vec2 = Vec2::new(0.0, -1.0);

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Closest point on the obstacle
    pub point: Vec2,
    /// Unit normal from the obstacle toward the ball center
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check a ball against a line segment
///
/// `contact_radius` is the ball radius plus half the segment's thickness.
/// A zero-length segment never collides.
pub fn segment_circle_collision(
    start: Vec2,
    end: Vec2,
    center: Vec2,
    contact_radius: f32,
) -> CollisionResult {
    let line_vec = end - start;
    let line_len_sq = line_vec.length_squared();

    if line_len_sq < 0.0001 {
        return CollisionResult::miss(); // Degenerate segment
    }

    let t = ((center - start).dot(line_vec) / line_len_sq).clamp(0.0, 1.0);
    let closest = start + line_vec * t;
    let offset = center - closest;
    let dist = offset.length();

    if dist >= contact_radius {
        return CollisionResult::miss();
    }

    let normal = if dist > f32::EPSILON {
        offset / dist
    } else {
        // Ball center is on the line - use the perpendicular facing up the table
        let n = perp(line_vec).normalize();
        if n.y > 0.0 { -n } else { n }
    };

    CollisionResult {
        hit: true,
        point: closest,
        normal,
        penetration: contact_radius - dist,
    }
}

/// Check a ball against a circular obstacle
pub fn circle_circle_collision(
    center: Vec2,
    radius: f32,
    other_center: Vec2,
    other_radius: f32,
) -> CollisionResult {
    let offset = center - other_center;
    let dist = offset.length();
    let min_dist = radius + other_radius;

    if dist >= min_dist {
        return CollisionResult::miss();
    }

    let normal = if dist > f32::EPSILON {
        offset / dist
    } else {
        FALLBACK_NORMAL
    };

    CollisionResult {
        hit: true,
        point: other_center + normal * other_radius,
        normal,
        penetration: min_dist - dist,
    }
}

/// Outcome of a successful impulse response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impulse {
    /// Velocity after normal and friction impulses and the speed floor
    pub velocity: Vec2,
    /// |v·n| before the response
    pub closing_speed: f32,
}

/// Apply restitution and friction impulses against a surface
///
/// Returns `None` when the ball is already separating (v·n >= 0).
/// The normal impulse is j = -(1 + r)(v·n); the tangential impulse removes
/// `friction` of the tangential velocity. A non-zero result slower than
/// `BALL_MIN_SPEED` is rescaled up to it.
pub fn resolve_impulse(velocity: Vec2, normal: Vec2, restitution: f32, friction: f32) -> Option<Impulse> {
    let vn = velocity.dot(normal);
    if vn >= 0.0 {
        return None;
    }

    let j = -(1.0 + restitution) * vn;
    let mut vel = velocity + normal * j;

    let tangent = perp(normal);
    let jt = -vel.dot(tangent) * friction;
    vel += tangent * jt;

    let speed = vel.length();
    if speed > 0.0 && speed < BALL_MIN_SPEED {
        vel *= BALL_MIN_SPEED / speed;
    }

    Some(Impulse {
        velocity: vel,
        closing_speed: -vn,
    })
}

/// Remove `factor` times the normal component of the velocity
///
/// A factor of 2 is a mirror reflection; the launch channel uses 1.5.
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2, factor: f32) -> Vec2 {
    velocity - factor * velocity.dot(normal) * normal
}
