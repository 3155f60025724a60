//! Piecewise spline path built from a waypoint chain
//!
//! A path owns one spline segment per consecutive waypoint pair and maps
//! a global parameter t in [0, 1] onto (segment index, local parameter).
//! Arc length is integrated numerically into a monotone lookup table so
//! fractional distance can be converted back to a parameter, and wheel
//! positions are derived by offsetting perpendicular to the tangent.
//! The mirror and retrace transforms are pure: they rebuild segments
//! from transformed waypoints and return a new path.

use itertools::Itertools;
use log::debug;
use nalgebra::Vector2;
use std::f64::consts::{FRAC_PI_2, PI};

use crate::common::{
    mirror_angle, normalize_angle, PathType, TrajectoryError, TrajectoryResult, Waypoint,
};
use crate::spline::SplineSegment;

type Vec2 = Vector2<f64>;

#[derive(Debug, Clone)]
pub struct Path {
    waypoints: Vec<Waypoint>,
    segments: Vec<SplineSegment>,
    alpha: f64,
    path_type: PathType,
    /// Half the wheelbase width; NaN for paths never queried for wheels
    base_radius: f64,
    /// Flips the left/right wheel offset sign so a front-back mirrored or
    /// retraced path keeps the physical wheel identity
    driving_backwards: bool,
    /// Monotone (cumulative length, parameter) pairs, built by
    /// `compute_length`
    length_table: Vec<(f64, f64)>,
    total_length: f64,
}

impl Path {
    pub fn new(
        waypoints: Vec<Waypoint>,
        alpha: f64,
        path_type: PathType,
        base_radius: f64,
    ) -> TrajectoryResult<Self> {
        if waypoints.len() < 2 {
            return Err(TrajectoryError::InvalidConfiguration(format!(
                "need at least 2 waypoints, got {}",
                waypoints.len()
            )));
        }
        if !alpha.is_finite() {
            return Err(TrajectoryError::InvalidConfiguration(format!(
                "alpha must be finite, got {}",
                alpha
            )));
        }
        Ok(Self::assemble(waypoints, alpha, path_type, base_radius, false))
    }

    /// Rebuild from already-validated waypoints; shared by the transforms
    fn assemble(
        waypoints: Vec<Waypoint>,
        alpha: f64,
        path_type: PathType,
        base_radius: f64,
        driving_backwards: bool,
    ) -> Self {
        let segments = waypoints
            .windows(2)
            .map(|pair| SplineSegment::from_waypoints(&pair[0], &pair[1], alpha, path_type))
            .collect();
        Path {
            waypoints,
            segments,
            alpha,
            path_type,
            base_radius,
            driving_backwards,
            length_table: Vec::new(),
            total_length: 0.0,
        }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn path_type(&self) -> PathType {
        self.path_type
    }

    pub fn base_radius(&self) -> f64 {
        self.base_radius
    }

    pub fn driving_backwards(&self) -> bool {
        self.driving_backwards
    }

    /// Total arc length from the last `compute_length` call
    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    /// Global parameter to (segment index, local parameter); t >= 1
    /// clamps to the last segment's end.
    fn locate(&self, t: f64) -> (usize, f64) {
        let n = self.segments.len();
        if t >= 1.0 {
            return (n - 1, 1.0);
        }
        let scaled = t.max(0.0) * n as f64;
        let index = (scaled as usize).min(n - 1);
        (index, scaled - index as f64)
    }

    pub fn at(&self, t: f64) -> Vec2 {
        let (i, u) = self.locate(t);
        self.segments[i].at(u)
    }

    pub fn deriv_at(&self, t: f64) -> Vec2 {
        let (i, u) = self.locate(t);
        self.segments[i].deriv_at(u)
    }

    pub fn second_deriv_at(&self, t: f64) -> Vec2 {
        let (i, u) = self.locate(t);
        self.segments[i].second_deriv_at(u)
    }

    /// Direction of travel at t, from the tangent
    pub fn heading_at(&self, t: f64) -> f64 {
        let d = self.deriv_at(t);
        d[1].atan2(d[0])
    }

    /// Signed curvature at t: (x'y'' - y'x'') / (x'^2 + y'^2)^(3/2).
    /// Zero where the tangent degenerates.
    pub fn curvature_at(&self, t: f64) -> f64 {
        let d = self.deriv_at(t);
        let dd = self.second_deriv_at(t);
        let speed_sq = d[0] * d[0] + d[1] * d[1];
        if speed_sq < 1e-12 {
            return 0.0;
        }
        (d[0] * dd[1] - d[1] * dd[0]) / speed_sq.powf(1.5)
    }

    /// Left and right wheel positions at t, offset perpendicular to the
    /// heading by the base radius. The offset sign inverts when driving
    /// backwards so the physical left wheel stays the left wheel.
    pub fn wheels_at(&self, t: f64) -> (Vec2, Vec2) {
        let center = self.at(t);
        let heading = self.heading_at(t);
        let sign = if self.driving_backwards { -1.0 } else { 1.0 };
        let offset = Vec2::new(-heading.sin(), heading.cos()) * (self.base_radius * sign);
        (center + offset, center - offset)
    }

    /// Integrate arc length by chord summation over `samples` uniform
    /// parameter steps, building the length lookup table as a side
    /// effect. Must be called before `s2t`.
    pub fn compute_length(&mut self, samples: usize) -> f64 {
        let samples = samples.max(1);
        let points: Vec<Vec2> = (0..=samples)
            .map(|i| self.at(i as f64 / samples as f64))
            .collect();
        let mut table = Vec::with_capacity(samples + 1);
        table.push((0.0, 0.0));
        let mut cumulative = 0.0;
        for (i, (a, b)) in points.iter().tuple_windows().enumerate() {
            cumulative += (b - a).norm();
            table.push((cumulative, (i + 1) as f64 / samples as f64));
        }
        self.total_length = cumulative;
        self.length_table = table;
        debug!(
            "arc-length table built: {} samples, total length {:.4}",
            samples, cumulative
        );
        cumulative
    }

    /// Fractional arc length to global parameter via binary search over
    /// the lookup table and linear interpolation between the bracketing
    /// entries. Returns 0 for s <= 0 and 1 for s >= 1.
    pub fn s2t(&self, s: f64) -> f64 {
        if s <= 0.0 {
            return 0.0;
        }
        if s >= 1.0 {
            return 1.0;
        }
        if self.length_table.len() < 2 {
            // Table not built; fall back to the raw parameter
            return s;
        }
        let target = s * self.total_length;
        let hi = self
            .length_table
            .partition_point(|&(length, _)| length < target)
            .clamp(1, self.length_table.len() - 1);
        let (len_lo, t_lo) = self.length_table[hi - 1];
        let (len_hi, t_hi) = self.length_table[hi];
        let span = len_hi - len_lo;
        if span <= f64::EPSILON {
            return t_hi;
        }
        t_lo + (target - len_lo) / span * (t_hi - t_lo)
    }

    fn reflect_point(p: Vec2, origin: Vec2, angle: f64) -> Vec2 {
        let d = p - origin;
        let c = (2.0 * angle).cos();
        let s = (2.0 * angle).sin();
        origin + Vec2::new(c * d[0] + s * d[1], s * d[0] - c * d[1])
    }

    fn reflect_waypoints(&self, angle: f64) -> Vec<Waypoint> {
        let origin = self.waypoints[0].position();
        self.waypoints
            .iter()
            .map(|wp| {
                let p = Self::reflect_point(wp.position(), origin, angle);
                Waypoint {
                    x: p[0],
                    y: p[1],
                    heading: mirror_angle(wp.heading, angle),
                    velocity: wp.velocity,
                }
            })
            .collect()
    }

    /// Reflect across the line through the first waypoint at the first
    /// waypoint's heading angle.
    pub fn mirror_left_right(&self) -> Path {
        let waypoints = self.reflect_waypoints(self.waypoints[0].heading);
        Self::assemble(
            waypoints,
            self.alpha,
            self.path_type,
            self.base_radius,
            self.driving_backwards,
        )
    }

    /// Reflect across the perpendicular line (first heading + 90 deg);
    /// the result is driven backwards.
    pub fn mirror_front_back(&self) -> Path {
        let waypoints = self.reflect_waypoints(self.waypoints[0].heading + FRAC_PI_2);
        Self::assemble(
            waypoints,
            self.alpha,
            self.path_type,
            self.base_radius,
            !self.driving_backwards,
        )
    }

    /// Reverse the waypoint order and flip each heading by pi; the
    /// result is driven backwards.
    pub fn retrace(&self) -> Path {
        let waypoints = self
            .waypoints
            .iter()
            .rev()
            .map(|wp| Waypoint {
                x: wp.x,
                y: wp.y,
                heading: normalize_angle(wp.heading + PI),
                velocity: wp.velocity,
            })
            .collect();
        Self::assemble(
            waypoints,
            self.alpha,
            self.path_type,
            self.base_radius,
            !self.driving_backwards,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curved_path() -> Path {
        let waypoints = vec![
            Waypoint::new(0.0, 0.0, 0.0),
            Waypoint::new(6.0, 4.0, FRAC_PI_2),
            Waypoint::new(4.0, 10.0, PI),
        ];
        Path::new(waypoints, 5.0, PathType::QuinticHermite, 0.5).unwrap()
    }

    #[test]
    fn test_rejects_single_waypoint() {
        let result = Path::new(
            vec![Waypoint::new(0.0, 0.0, 0.0)],
            5.0,
            PathType::QuinticHermite,
            f64::NAN,
        );
        assert!(matches!(result, Err(TrajectoryError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_rejects_non_finite_alpha() {
        let waypoints = vec![Waypoint::new(0.0, 0.0, 0.0), Waypoint::new(1.0, 0.0, 0.0)];
        let result = Path::new(waypoints, f64::NAN, PathType::Bezier, f64::NAN);
        assert!(matches!(result, Err(TrajectoryError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_endpoints_and_clamp() {
        let path = curved_path();
        assert!(path.at(0.0).norm() < 1e-10);
        let end = path.at(1.0);
        assert!((end - Vector2::new(4.0, 10.0)).norm() < 1e-10);
        // Parameters past 1 clamp to the last segment's end
        assert!((path.at(1.5) - end).norm() < 1e-10);
    }

    #[test]
    fn test_interior_waypoint_hit() {
        let path = curved_path();
        // Two segments: the middle waypoint sits at t = 0.5
        let mid = path.at(0.5);
        assert!((mid - Vector2::new(6.0, 4.0)).norm() < 1e-10);
    }

    #[test]
    fn test_straight_path_length() {
        let waypoints = vec![Waypoint::new(0.0, 0.0, 0.0), Waypoint::new(10.0, 0.0, 0.0)];
        let mut path = Path::new(waypoints, 10.0, PathType::QuinticHermite, f64::NAN).unwrap();
        let length = path.compute_length(1000);
        assert!((length - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_s2t_endpoints_and_monotonicity() {
        let mut path = curved_path();
        path.compute_length(500);
        assert!(path.s2t(0.0).abs() < 1e-12);
        assert!((path.s2t(1.0) - 1.0).abs() < 1e-12);
        let mut prev = 0.0;
        for i in 0..=100 {
            let t = path.s2t(i as f64 / 100.0);
            assert!(t >= prev - 1e-12);
            prev = t;
        }
    }

    #[test]
    fn test_s2t_halfway_on_straight_line() {
        let waypoints = vec![Waypoint::new(0.0, 0.0, 0.0), Waypoint::new(8.0, 0.0, 0.0)];
        let mut path = Path::new(waypoints, 8.0, PathType::CubicHermite, f64::NAN).unwrap();
        path.compute_length(1000);
        let t = path.s2t(0.5);
        let p = path.at(t);
        assert!((p[0] - 4.0).abs() < 1e-2);
    }

    #[test]
    fn test_wheel_offsets() {
        let waypoints = vec![Waypoint::new(0.0, 0.0, 0.0), Waypoint::new(10.0, 0.0, 0.0)];
        let path = Path::new(waypoints, 10.0, PathType::QuinticHermite, 0.75).unwrap();
        let (left, right) = path.wheels_at(0.5);
        // Heading +x: left wheel sits at +y, separation is the full width
        assert!((left[1] - 0.75).abs() < 1e-10);
        assert!((right[1] + 0.75).abs() < 1e-10);
        assert!(((left - right).norm() - 1.5).abs() < 1e-10);
    }

    #[test]
    fn test_wheel_offsets_flip_when_backwards() {
        let waypoints = vec![Waypoint::new(0.0, 0.0, 0.0), Waypoint::new(10.0, 0.0, 0.0)];
        let path = Path::new(waypoints, 10.0, PathType::QuinticHermite, 0.75).unwrap();
        let reversed = path.retrace();
        let (fwd_left, _) = path.wheels_at(0.5);
        let (rev_left, _) = reversed.wheels_at(0.5);
        // Retraced path drives backwards; physical left stays at +y
        assert!((fwd_left[1] - rev_left[1]).abs() < 1e-10);
    }

    #[test]
    fn test_mirror_left_right_involution() {
        let path = curved_path();
        let twice = path.mirror_left_right().mirror_left_right();
        for (a, b) in path.waypoints().iter().zip(twice.waypoints()) {
            assert!((a.x - b.x).abs() < 1e-9);
            assert!((a.y - b.y).abs() < 1e-9);
            assert!(normalize_angle(a.heading - b.heading).abs() < 1e-9);
        }
    }

    #[test]
    fn test_mirror_front_back_involution() {
        let path = curved_path();
        let twice = path.mirror_front_back().mirror_front_back();
        assert_eq!(twice.driving_backwards(), path.driving_backwards());
        for (a, b) in path.waypoints().iter().zip(twice.waypoints()) {
            assert!((a.x - b.x).abs() < 1e-9);
            assert!((a.y - b.y).abs() < 1e-9);
            assert!(normalize_angle(a.heading - b.heading).abs() < 1e-9);
        }
    }

    #[test]
    fn test_retrace_involution() {
        let path = curved_path();
        let twice = path.retrace().retrace();
        assert_eq!(twice.driving_backwards(), path.driving_backwards());
        for (a, b) in path.waypoints().iter().zip(twice.waypoints()) {
            assert!((a.x - b.x).abs() < 1e-12);
            assert!((a.y - b.y).abs() < 1e-12);
            assert!(normalize_angle(a.heading - b.heading).abs() < 1e-9);
        }
    }

    #[test]
    fn test_mirror_preserves_lengths() {
        let mut path = curved_path();
        let original = path.compute_length(500);
        let mut mirrored = path.mirror_left_right();
        let reflected = mirrored.compute_length(500);
        assert!((original - reflected).abs() < 1e-9);
    }
}
