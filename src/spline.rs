//! Spline segments between waypoint pairs
//!
//! Each segment is a pure function of a local parameter u in [0, 1] and
//! evaluates position and its first two derivatives. Endpoint tangents
//! come from the waypoint headings scaled by the smoothness constant
//! alpha, so consecutive segments share tangent direction at the joint.
//! The quintic Hermite variant additionally pins the second derivative
//! to zero at both ends, which makes the joins C2-continuous.

use nalgebra::Vector2;

use crate::common::{PathType, Waypoint};

type Vec2 = Vector2<f64>;

/// One piece of a piecewise spline path. Closed variant set so the
/// evaluation contract is exhaustively checked.
#[derive(Debug, Clone)]
pub enum SplineSegment {
    /// Cubic Bezier built from Hermite endpoint/tangent data
    Bezier { control: [Vec2; 4] },
    /// Cubic Hermite on endpoint positions and tangents
    CubicHermite { p0: Vec2, p1: Vec2, m0: Vec2, m1: Vec2 },
    /// Quintic Hermite with zero second derivative at both ends
    QuinticHermite { p0: Vec2, p1: Vec2, m0: Vec2, m1: Vec2 },
}

impl SplineSegment {
    /// Build the segment joining `start` to `end` with tangent magnitude
    /// `alpha` at both ends.
    pub fn from_waypoints(start: &Waypoint, end: &Waypoint, alpha: f64, kind: PathType) -> Self {
        let p0 = start.position();
        let p1 = end.position();
        let m0 = start.tangent(alpha);
        let m1 = end.tangent(alpha);
        match kind {
            PathType::Bezier => SplineSegment::Bezier {
                // Same curve as the cubic Hermite, Bernstein control net
                control: [p0, p0 + m0 / 3.0, p1 - m1 / 3.0, p1],
            },
            PathType::CubicHermite => SplineSegment::CubicHermite { p0, p1, m0, m1 },
            PathType::QuinticHermite => SplineSegment::QuinticHermite { p0, p1, m0, m1 },
        }
    }

    /// Position at local parameter `u`
    pub fn at(&self, u: f64) -> Vec2 {
        match self {
            SplineSegment::Bezier { control } => {
                let s = 1.0 - u;
                control[0] * (s * s * s)
                    + control[1] * (3.0 * s * s * u)
                    + control[2] * (3.0 * s * u * u)
                    + control[3] * (u * u * u)
            }
            SplineSegment::CubicHermite { p0, p1, m0, m1 } => {
                let u2 = u * u;
                let u3 = u2 * u;
                p0 * (2.0 * u3 - 3.0 * u2 + 1.0)
                    + m0 * (u3 - 2.0 * u2 + u)
                    + p1 * (-2.0 * u3 + 3.0 * u2)
                    + m1 * (u3 - u2)
            }
            SplineSegment::QuinticHermite { p0, p1, m0, m1 } => {
                let u3 = u * u * u;
                let u4 = u3 * u;
                let u5 = u4 * u;
                p0 * (1.0 - 10.0 * u3 + 15.0 * u4 - 6.0 * u5)
                    + m0 * (u - 6.0 * u3 + 8.0 * u4 - 3.0 * u5)
                    + p1 * (10.0 * u3 - 15.0 * u4 + 6.0 * u5)
                    + m1 * (-4.0 * u3 + 7.0 * u4 - 3.0 * u5)
            }
        }
    }

    /// First derivative with respect to `u`
    pub fn deriv_at(&self, u: f64) -> Vec2 {
        match self {
            SplineSegment::Bezier { control } => {
                let s = 1.0 - u;
                (control[1] - control[0]) * (3.0 * s * s)
                    + (control[2] - control[1]) * (6.0 * s * u)
                    + (control[3] - control[2]) * (3.0 * u * u)
            }
            SplineSegment::CubicHermite { p0, p1, m0, m1 } => {
                let u2 = u * u;
                p0 * (6.0 * u2 - 6.0 * u)
                    + m0 * (3.0 * u2 - 4.0 * u + 1.0)
                    + p1 * (-6.0 * u2 + 6.0 * u)
                    + m1 * (3.0 * u2 - 2.0 * u)
            }
            SplineSegment::QuinticHermite { p0, p1, m0, m1 } => {
                let u2 = u * u;
                let u3 = u2 * u;
                let u4 = u3 * u;
                p0 * (-30.0 * u2 + 60.0 * u3 - 30.0 * u4)
                    + m0 * (1.0 - 18.0 * u2 + 32.0 * u3 - 15.0 * u4)
                    + p1 * (30.0 * u2 - 60.0 * u3 + 30.0 * u4)
                    + m1 * (-12.0 * u2 + 28.0 * u3 - 15.0 * u4)
            }
        }
    }

    /// Second derivative with respect to `u`
    pub fn second_deriv_at(&self, u: f64) -> Vec2 {
        match self {
            SplineSegment::Bezier { control } => {
                let s = 1.0 - u;
                (control[2] - control[1] * 2.0 + control[0]) * (6.0 * s)
                    + (control[3] - control[2] * 2.0 + control[1]) * (6.0 * u)
            }
            SplineSegment::CubicHermite { p0, p1, m0, m1 } => {
                p0 * (12.0 * u - 6.0)
                    + m0 * (6.0 * u - 4.0)
                    + p1 * (-12.0 * u + 6.0)
                    + m1 * (6.0 * u - 2.0)
            }
            SplineSegment::QuinticHermite { p0, p1, m0, m1 } => {
                let u2 = u * u;
                let u3 = u2 * u;
                p0 * (-60.0 * u + 180.0 * u2 - 120.0 * u3)
                    + m0 * (-36.0 * u + 96.0 * u2 - 60.0 * u3)
                    + p1 * (60.0 * u - 180.0 * u2 + 120.0 * u3)
                    + m1 * (-24.0 * u + 84.0 * u2 - 60.0 * u3)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sample_segment(kind: PathType) -> SplineSegment {
        let start = Waypoint::new(0.0, 0.0, 0.0);
        let end = Waypoint::new(5.0, 3.0, PI / 4.0);
        SplineSegment::from_waypoints(&start, &end, 4.0, kind)
    }

    #[test]
    fn test_endpoints_match_waypoints() {
        for kind in [PathType::Bezier, PathType::CubicHermite, PathType::QuinticHermite].iter() {
            let seg = sample_segment(*kind);
            let p0 = seg.at(0.0);
            let p1 = seg.at(1.0);
            assert!(p0.norm() < 1e-10, "{:?} start", kind);
            assert!((p1 - Vector2::new(5.0, 3.0)).norm() < 1e-10, "{:?} end", kind);
        }
    }

    #[test]
    fn test_endpoint_tangents() {
        for kind in [PathType::Bezier, PathType::CubicHermite, PathType::QuinticHermite].iter() {
            let seg = sample_segment(*kind);
            let d0 = seg.deriv_at(0.0);
            let d1 = seg.deriv_at(1.0);
            assert!((d0 - Vector2::new(4.0, 0.0)).norm() < 1e-10, "{:?} start tangent", kind);
            let expected = Vector2::new(4.0 * (PI / 4.0).cos(), 4.0 * (PI / 4.0).sin());
            assert!((d1 - expected).norm() < 1e-10, "{:?} end tangent", kind);
        }
    }

    #[test]
    fn test_derivatives_against_finite_differences() {
        let h = 1e-6;
        for kind in [PathType::Bezier, PathType::CubicHermite, PathType::QuinticHermite].iter() {
            let seg = sample_segment(*kind);
            for i in 1..10 {
                let u = i as f64 / 10.0;
                let numeric_d = (seg.at(u + h) - seg.at(u - h)) / (2.0 * h);
                assert!((numeric_d - seg.deriv_at(u)).norm() < 1e-4, "{:?} first deriv", kind);
                let numeric_dd =
                    (seg.deriv_at(u + h) - seg.deriv_at(u - h)) / (2.0 * h);
                assert!(
                    (numeric_dd - seg.second_deriv_at(u)).norm() < 1e-4,
                    "{:?} second deriv",
                    kind
                );
            }
        }
    }

    #[test]
    fn test_quintic_zero_second_derivative_at_ends() {
        let seg = sample_segment(PathType::QuinticHermite);
        assert!(seg.second_deriv_at(0.0).norm() < 1e-10);
        assert!(seg.second_deriv_at(1.0).norm() < 1e-10);
    }

    #[test]
    fn test_bezier_matches_cubic_hermite() {
        // The Bezier control net is derived from the same Hermite data,
        // so the two variants trace the identical curve.
        let bezier = sample_segment(PathType::Bezier);
        let hermite = sample_segment(PathType::CubicHermite);
        for i in 0..=20 {
            let u = i as f64 / 20.0;
            assert!((bezier.at(u) - hermite.at(u)).norm() < 1e-10);
        }
    }
}
