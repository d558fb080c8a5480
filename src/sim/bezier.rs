//! Cubic Bezier geometry for the launch channel
//!
//! The channel centerline is a cubic curve:
//! P(t) = (1-t)³P0 + 3(1-t)²t·P1 + 3(1-t)t²·P2 + t³P3
//!
//! Besides position we need the first derivative (tangent), the second
//! derivative and the unsigned curvature κ = |x'y'' - y'x''| / (x'² + y'²)^1.5.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Below this the curvature denominator is treated as zero
pub const CURVATURE_EPSILON: f32 = 1e-4;

/// A cubic Bezier curve defined by four control points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    pub p0: Vec2,
    pub p1: Vec2,
    pub p2: Vec2,
    pub p3: Vec2,
}

/// One sample along the curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveSample {
    pub point: Vec2,
    /// Unit tangent (zero if the derivative vanishes)
    pub tangent: Vec2,
    pub curvature: f32,
}

impl CubicBezier {
    pub fn new(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Position at parameter t
    pub fn point(&self, t: f32) -> Vec2 {
        let u = 1.0 - t;
        let uu = u * u;
        let tt = t * t;
        self.p0 * (uu * u) + self.p1 * (3.0 * uu * t) + self.p2 * (3.0 * u * tt) + self.p3 * (tt * t)
    }

    /// First derivative dP/dt
    pub fn derivative(&self, t: f32) -> Vec2 {
        let u = 1.0 - t;
        (self.p1 - self.p0) * (3.0 * u * u)
            + (self.p2 - self.p1) * (6.0 * u * t)
            + (self.p3 - self.p2) * (3.0 * t * t)
    }

    /// Second derivative d²P/dt²
    pub fn second_derivative(&self, t: f32) -> Vec2 {
        let u = 1.0 - t;
        (self.p2 - 2.0 * self.p1 + self.p0) * (6.0 * u) + (self.p3 - 2.0 * self.p2 + self.p1) * (6.0 * t)
    }

    /// Unsigned curvature at parameter t
    pub fn curvature(&self, t: f32) -> f32 {
        curvature(self.derivative(t), self.second_derivative(t))
    }

    /// Evaluate point, unit tangent and curvature at t
    pub fn sample(&self, t: f32) -> CurveSample {
        let d1 = self.derivative(t);
        let d2 = self.second_derivative(t);
        CurveSample {
            point: self.point(t),
            tangent: d1.normalize_or_zero(),
            curvature: curvature(d1, d2),
        }
    }

    /// `segments + 1` samples at uniform parameter steps, t = 0 through t = 1
    pub fn samples(&self, segments: usize) -> Vec<CurveSample> {
        debug_assert!(segments > 0, "curve sampling needs at least one segment");
        let n = segments.max(1);
        (0..=n).map(|i| self.sample(i as f32 / n as f32)).collect()
    }
}

/// Curvature from first and second derivatives; 0 when the tangent vanishes
#[inline]
pub fn curvature(d1: Vec2, d2: Vec2) -> f32 {
    let numerator = d1.perp_dot(d2).abs();
    let denominator = d1.length_squared().powf(1.5);
    if denominator > CURVATURE_EPSILON {
        numerator / denominator
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn channel_like() -> CubicBezier {
        CubicBezier::new(
            Vec2::new(560.0, 800.0),
            Vec2::new(560.0, 600.0),
            Vec2::new(460.0, 10.0),
            Vec2::new(360.0, 60.0),
        )
    }

    #[test]
    fn test_endpoints() {
        let c = channel_like();
        assert_eq!(c.point(0.0), c.p0);
        assert!((c.point(1.0) - c.p3).length() < 1e-3);
    }

    #[test]
    fn test_start_tangent_points_up() {
        let s = channel_like().sample(0.0);
        assert!(s.tangent.x.abs() < 1e-6);
        assert!((s.tangent.y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_straight_line_has_zero_curvature() {
        let c = CubicBezier::new(
            Vec2::ZERO,
            Vec2::new(1.0, 1.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(3.0, 3.0),
        );
        for i in 0..=10 {
            assert!(c.curvature(i as f32 / 10.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_degenerate_curve_is_neutral() {
        let p = Vec2::new(5.0, 5.0);
        let c = CubicBezier::new(p, p, p, p);
        let s = c.sample(0.5);
        assert_eq!(s.tangent, Vec2::ZERO);
        assert_eq!(s.curvature, 0.0);
    }

    #[test]
    fn test_samples_count_and_order() {
        let samples = channel_like().samples(50);
        assert_eq!(samples.len(), 51);
        assert_eq!(samples[0].point, Vec2::new(560.0, 800.0));
        for s in &samples {
            assert!(s.curvature.is_finite());
            assert!(!s.tangent.is_nan());
        }
    }

    #[test]
    fn test_samples_are_recomputed() {
        let c = channel_like();
        assert_eq!(c.samples(8), c.samples(8));
    }

    proptest! {
        #[test]
        fn derivative_matches_finite_difference(t in 0.0f32..=1.0) {
            // Scale down so f32 finite differences stay well conditioned
            let c = CubicBezier::new(
                Vec2::new(0.56, 0.8),
                Vec2::new(0.56, 0.6),
                Vec2::new(0.46, 0.01),
                Vec2::new(0.36, 0.06),
            );
            // The polynomial is defined outside [0, 1], so a central difference works at the ends too
            let h = 1e-3;
            let fd = (c.point(t + h) - c.point(t - h)) / (2.0 * h);
            prop_assert!((fd - c.derivative(t)).length() < 1e-3);
        }

        #[test]
        fn curvature_is_always_finite(t in 0.0f32..=1.0, x in -500.0f32..500.0, y in -500.0f32..500.0) {
            let c = CubicBezier::new(Vec2::ZERO, Vec2::new(x, y), Vec2::new(y, x), Vec2::new(100.0, 0.0));
            let k = c.curvature(t);
            prop_assert!(k.is_finite());
            prop_assert!(k >= 0.0);
        }
    }
}
