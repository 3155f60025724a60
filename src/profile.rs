//! Two-pass constrained velocity profiling
//!
//! Turns a geometric path into time-stamped motion samples. The forward
//! pass grows velocity under the acceleration limit, clamping to a
//! per-sample speed cap; the backward pass shrinks it again wherever the
//! deceleration limit would otherwise be violated; time is then assigned
//! by solving the constant-acceleration kinematic equation per step.
//! For tank drive the speed cap at each sample is derived from the path
//! curvature so the outer wheel never exceeds the velocity limit, and
//! per-wheel channels are derived from the center-line profile.

use itertools::Itertools;
use log::debug;

use crate::common::{
    Moment, RobotSpecs, TankMoment, TrajectoryError, TrajectoryResult, TOLERANCE,
};
use crate::path::Path;

/// Center-line profile: one entry per sample point, parallel arrays in
/// the teacher-planner style.
#[derive(Debug)]
pub(crate) struct CenterProfile {
    /// Path parameter per sample
    pub params: Vec<f64>,
    /// Cumulative distance along the center line
    pub distance: Vec<f64>,
    pub velocity: Vec<f64>,
    /// Acceleration over the interval starting at each sample
    pub acceleration: Vec<f64>,
    pub time: Vec<f64>,
    pub heading: Vec<f64>,
    pub curvature: Vec<f64>,
}

/// Whole-body speed cap at a given curvature so the outer wheel stays
/// within `max_velocity`: 2*vmax / (2 + width/r) with r = |1/kappa|.
fn curvature_speed_cap(curvature: f64, max_velocity: f64, base_width: f64) -> f64 {
    let kappa = curvature.abs();
    if kappa < TOLERANCE {
        return max_velocity;
    }
    2.0 * max_velocity / (2.0 + base_width * kappa)
}

/// Solve d = v*dt + a*dt^2/2 for the smallest non-negative root.
/// Discriminants within tolerance of zero are snapped to zero to absorb
/// rounding noise; a step with no non-negative real root is a
/// generation failure.
fn solve_step_time(distance: f64, velocity: f64, acceleration: f64) -> TrajectoryResult<f64> {
    if distance.abs() < TOLERANCE {
        // Zero-length step policy: no ground covered, no time spent
        return Ok(0.0);
    }
    if acceleration.abs() < TOLERANCE {
        if velocity.abs() < TOLERANCE {
            return Err(TrajectoryError::GenerationFailure(format!(
                "cannot cover {:.6} with zero velocity and zero acceleration",
                distance
            )));
        }
        return Ok(distance / velocity);
    }
    let mut discriminant = velocity * velocity + 2.0 * acceleration * distance;
    if discriminant.abs() < TOLERANCE {
        discriminant = 0.0;
    }
    if discriminant < 0.0 {
        return Err(TrajectoryError::GenerationFailure(format!(
            "no real root for step (d={:.6}, v={:.6}, a={:.6})",
            distance, velocity, acceleration
        )));
    }
    let root = discriminant.sqrt();
    let dt = (-velocity + root) / acceleration;
    if dt.is_finite() && dt >= 0.0 {
        return Ok(dt);
    }
    let dt = (-velocity - root) / acceleration;
    if dt.is_finite() && dt >= 0.0 {
        return Ok(dt);
    }
    Err(TrajectoryError::GenerationFailure(format!(
        "no positive root for step (d={:.6}, v={:.6}, a={:.6})",
        distance, velocity, acceleration
    )))
}

/// Map waypoint-pinned velocities onto sample indices: waypoint k of a
/// K-waypoint path sits at t = k/(K-1), hence sample round(t*n).
fn pinned_velocities(path: &Path, sample_count: usize) -> Vec<Option<f64>> {
    let mut pinned = vec![None; sample_count + 1];
    let segments = path.segment_count() as f64;
    for (k, wp) in path.waypoints().iter().enumerate() {
        if let Some(v) = wp.velocity {
            let index = ((k as f64 / segments) * sample_count as f64).round() as usize;
            pinned[index.min(sample_count)] = Some(v);
        }
    }
    // Unconstrained boundaries start and end at rest
    if pinned[0].is_none() {
        pinned[0] = Some(0.0);
    }
    if pinned[sample_count].is_none() {
        pinned[sample_count] = Some(0.0);
    }
    pinned
}

/// Run the forward/backward profiler over `sample_count` uniform steps
/// of the path parameter. `tank` selects curvature-derived speed caps.
pub(crate) fn profile_center(
    path: &Path,
    specs: &RobotSpecs,
    sample_count: usize,
    tank: bool,
) -> TrajectoryResult<CenterProfile> {
    let n = sample_count + 1;
    let max_a = specs.max_acceleration;

    let params: Vec<f64> = (0..n).map(|i| i as f64 / sample_count as f64).collect();
    let positions: Vec<_> = params.iter().map(|&t| path.at(t)).collect();
    let heading: Vec<f64> = params.iter().map(|&t| path.heading_at(t)).collect();
    let curvature: Vec<f64> = params.iter().map(|&t| path.curvature_at(t)).collect();

    let mut distance = Vec::with_capacity(n);
    distance.push(0.0);
    let mut cumulative = 0.0;
    for (a, b) in positions.iter().tuple_windows() {
        cumulative += (b - a).norm();
        distance.push(cumulative);
    }

    let caps: Vec<f64> = if tank {
        curvature
            .iter()
            .map(|&k| curvature_speed_cap(k, specs.max_velocity, specs.base_width))
            .collect()
    } else {
        vec![specs.max_velocity; n]
    };

    let pinned = pinned_velocities(path, sample_count);

    // Forward pass: grow velocity under the acceleration limit, clamp to
    // the per-sample cap. Clamped and pinned samples store the exact
    // connecting acceleration for the preceding interval, which is zero
    // once the profile is riding the cap.
    let mut velocity = vec![0.0; n];
    let mut acceleration = vec![0.0; n];
    velocity[0] = pinned[0].unwrap_or(0.0);
    if velocity[0].abs() > caps[0] + TOLERANCE {
        return Err(TrajectoryError::GenerationFailure(format!(
            "start velocity {:.4} exceeds the speed cap {:.4}",
            velocity[0], caps[0]
        )));
    }
    for i in 1..n {
        let dd = distance[i] - distance[i - 1];
        let reachable = (velocity[i - 1] * velocity[i - 1] + 2.0 * max_a * dd).sqrt();
        velocity[i] = match pinned[i] {
            Some(v) => {
                if v.abs() > caps[i] + TOLERANCE {
                    return Err(TrajectoryError::GenerationFailure(format!(
                        "waypoint velocity {:.4} exceeds the speed cap {:.4} at sample {}",
                        v, caps[i], i
                    )));
                }
                if v.abs() > reachable + TOLERANCE {
                    return Err(TrajectoryError::GenerationFailure(format!(
                        "waypoint velocity {:.4} not reachable at sample {} (max {:.4})",
                        v, i, reachable
                    )));
                }
                v
            }
            None => reachable.min(caps[i]),
        };
        acceleration[i - 1] = if dd > TOLERANCE {
            (velocity[i] * velocity[i] - velocity[i - 1] * velocity[i - 1]) / (2.0 * dd)
        } else {
            0.0
        };
    }
    // Terminal sample: boundary velocity, no further acceleration
    acceleration[n - 1] = 0.0;

    // Backward pass: wherever the forward profile cannot slow down to
    // what follows, overwrite with the deceleration-limited velocity.
    for i in (0..n - 1).rev() {
        let dd = distance[i + 1] - distance[i];
        let reachable = (velocity[i + 1] * velocity[i + 1] + 2.0 * max_a * dd).sqrt();
        if reachable < velocity[i] - TOLERANCE {
            if pinned[i].is_some() {
                return Err(TrajectoryError::GenerationFailure(format!(
                    "waypoint velocity {:.4} at sample {} cannot slow to {:.4} in time",
                    velocity[i],
                    i,
                    velocity[i + 1]
                )));
            }
            velocity[i] = reachable;
            acceleration[i] = -max_a;
        }
    }

    // Time assignment: constant-acceleration solve per interval
    let mut time = vec![0.0; n];
    for i in 0..n - 1 {
        let dd = distance[i + 1] - distance[i];
        let dv = velocity[i + 1] - velocity[i];
        if dd.abs() < TOLERANCE && dv.abs() < TOLERANCE {
            time[i + 1] = time[i];
            continue;
        }
        let dt = solve_step_time(dd, velocity[i], acceleration[i])?;
        time[i + 1] = time[i] + dt;
    }

    debug!(
        "profiled {} samples over {:.4} units in {:.4} s (tank caps: {})",
        n,
        cumulative,
        time[n - 1],
        tank
    );

    Ok(CenterProfile {
        params,
        distance,
        velocity,
        acceleration,
        time,
        heading,
        curvature,
    })
}

/// Package a center-line profile as basic moments.
pub(crate) fn basic_moments(profile: &CenterProfile, path: &Path) -> Vec<Moment> {
    let backwards = path.driving_backwards();
    let initial_facing = facing_of(profile.heading[0], backwards);
    (0..profile.params.len())
        .map(|i| Moment {
            position: profile.distance[i],
            velocity: profile.velocity[i],
            acceleration: profile.acceleration[i],
            heading: profile.heading[i],
            time: profile.time[i],
            initial_facing,
            backwards,
        })
        .collect()
}

/// Derive per-wheel channels from a center-line profile.
///
/// Wheel linear velocity is v*(1 -+ kappa*r); the outer wheel gets the
/// larger magnitude. Wheel positions integrate each wheel's own curve
/// from `wheels_at`, with the chord sign negated while that wheel moves
/// backwards. Wheel acceleration is the forward finite difference of
/// wheel velocity over the center-line time step, so it is a derived
/// quantity and not separately capped.
pub(crate) fn tank_moments(
    profile: &CenterProfile,
    path: &Path,
    specs: &RobotSpecs,
) -> Vec<TankMoment> {
    let n = profile.params.len();
    let radius = specs.base_width / 2.0;
    let backwards = path.driving_backwards();
    let initial_facing = facing_of(profile.heading[0], backwards);

    let mut left_velocity = Vec::with_capacity(n);
    let mut right_velocity = Vec::with_capacity(n);
    for i in 0..n {
        let v = profile.velocity[i];
        let omega_term = profile.curvature[i] * radius;
        left_velocity.push(v * (1.0 - omega_term));
        right_velocity.push(v * (1.0 + omega_term));
    }

    let mut left_position = vec![0.0; n];
    let mut right_position = vec![0.0; n];
    let mut prev_wheels = path.wheels_at(profile.params[0]);
    for i in 1..n {
        let wheels = path.wheels_at(profile.params[i]);
        let left_delta = (wheels.0 - prev_wheels.0).norm();
        let right_delta = (wheels.1 - prev_wheels.1).norm();
        let left_sign = if left_velocity[i] < 0.0 { -1.0 } else { 1.0 };
        let right_sign = if right_velocity[i] < 0.0 { -1.0 } else { 1.0 };
        left_position[i] = left_position[i - 1] + left_sign * left_delta;
        right_position[i] = right_position[i - 1] + right_sign * right_delta;
        prev_wheels = wheels;
    }

    let mut left_acceleration = vec![0.0; n];
    let mut right_acceleration = vec![0.0; n];
    for i in 0..n - 1 {
        let dt = profile.time[i + 1] - profile.time[i];
        if dt > TOLERANCE {
            left_acceleration[i] = (left_velocity[i + 1] - left_velocity[i]) / dt;
            right_acceleration[i] = (right_velocity[i + 1] - right_velocity[i]) / dt;
        }
    }

    (0..n)
        .map(|i| TankMoment {
            left_position: left_position[i],
            left_velocity: left_velocity[i],
            left_acceleration: left_acceleration[i],
            right_position: right_position[i],
            right_velocity: right_velocity[i],
            right_acceleration: right_acceleration[i],
            heading: profile.heading[i],
            time: profile.time[i],
            initial_facing,
            backwards,
        })
        .collect()
}

/// Direction the robot's front points given the direction of travel.
pub(crate) fn facing_of(heading: f64, backwards: bool) -> f64 {
    if backwards {
        crate::common::normalize_angle(heading + std::f64::consts::PI)
    } else {
        heading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{PathType, Waypoint};
    use std::f64::consts::FRAC_PI_2;

    fn straight_path(length: f64) -> Path {
        let waypoints = vec![
            Waypoint::new(0.0, 0.0, 0.0),
            Waypoint::new(length, 0.0, 0.0),
        ];
        Path::new(waypoints, length, PathType::QuinticHermite, f64::NAN).unwrap()
    }

    fn specs() -> RobotSpecs {
        RobotSpecs::new(5.0, 3.5, 2.0)
    }

    #[test]
    fn test_velocity_within_limits() {
        let path = straight_path(100.0);
        let profile = profile_center(&path, &specs(), 1000, false).unwrap();
        for &v in &profile.velocity {
            assert!(v.abs() <= 5.0 + 1e-7);
        }
        for &a in &profile.acceleration {
            assert!(a.abs() <= 3.5 + 1e-7);
        }
    }

    #[test]
    fn test_rest_to_rest_boundaries() {
        let path = straight_path(50.0);
        let profile = profile_center(&path, &specs(), 500, false).unwrap();
        assert!(profile.velocity[0].abs() < 1e-9);
        assert!(profile.velocity.last().unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_trapezoid_reaches_cruise() {
        // 100 units is plenty of room to reach the 5.0 cap
        let path = straight_path(100.0);
        let profile = profile_center(&path, &specs(), 1000, false).unwrap();
        let peak = profile.velocity.iter().cloned().fold(0.0, f64::max);
        assert!((peak - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_short_move_stays_triangular() {
        // 1 unit cannot reach the cap: peak is sqrt(a*d) under symmetric
        // accel/decel
        let path = straight_path(1.0);
        let profile = profile_center(&path, &specs(), 500, false).unwrap();
        let peak = profile.velocity.iter().cloned().fold(0.0, f64::max);
        let expected = (3.5_f64 * 1.0).sqrt();
        assert!((peak - expected).abs() < 0.05);
    }

    #[test]
    fn test_time_strictly_monotonic_while_moving() {
        let path = straight_path(20.0);
        let profile = profile_center(&path, &specs(), 400, false).unwrap();
        for pair in profile.time.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
        assert!(profile.time.last().unwrap() > &0.0);
    }

    #[test]
    fn test_boundary_velocities_respected() {
        let waypoints = vec![
            Waypoint::with_velocity(0.0, 0.0, 0.0, 1.0),
            Waypoint::with_velocity(50.0, 0.0, 0.0, 2.0),
        ];
        let path = Path::new(waypoints, 50.0, PathType::QuinticHermite, f64::NAN).unwrap();
        let profile = profile_center(&path, &specs(), 500, false).unwrap();
        assert!((profile.velocity[0] - 1.0).abs() < 1e-9);
        assert!((profile.velocity.last().unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_infeasible_middle_waypoint_fails() {
        let waypoints = vec![
            Waypoint::new(0.0, 0.0, 0.0),
            Waypoint::with_velocity(25.0, 0.0, 0.0, 50.0),
            Waypoint::new(50.0, 0.0, 0.0),
        ];
        let path = Path::new(waypoints, 50.0, PathType::QuinticHermite, f64::NAN).unwrap();
        let result = profile_center(&path, &specs(), 500, false);
        assert!(matches!(result, Err(TrajectoryError::GenerationFailure(_))));
    }

    #[test]
    fn test_tank_caps_slow_the_turn() {
        // Quarter-ish turn: curvature forces the cap below max velocity
        let waypoints = vec![
            Waypoint::new(0.0, 0.0, 0.0),
            Waypoint::new(5.0, 5.0, FRAC_PI_2),
        ];
        let path = Path::new(waypoints, 5.0, PathType::QuinticHermite, 1.0).unwrap();
        let profile = profile_center(&path, &specs(), 500, true).unwrap();
        let peak = profile.velocity.iter().cloned().fold(0.0, f64::max);
        assert!(peak < 5.0);
    }

    #[test]
    fn test_tank_wheel_velocities_within_limit() {
        let waypoints = vec![
            Waypoint::new(0.0, 0.0, 0.0),
            Waypoint::new(5.0, 5.0, FRAC_PI_2),
        ];
        let path = Path::new(waypoints, 5.0, PathType::QuinticHermite, 1.0).unwrap();
        let sp = specs();
        let profile = profile_center(&path, &sp, 500, true).unwrap();
        let moments = tank_moments(&profile, &path, &sp);
        for m in &moments {
            assert!(m.left_velocity.abs() <= 5.0 + 1e-6);
            assert!(m.right_velocity.abs() <= 5.0 + 1e-6);
        }
    }

    #[test]
    fn test_tank_straight_wheels_match_center() {
        let waypoints = vec![
            Waypoint::new(0.0, 0.0, 0.0),
            Waypoint::new(30.0, 0.0, 0.0),
        ];
        let path = Path::new(waypoints, 30.0, PathType::QuinticHermite, 1.0).unwrap();
        let sp = specs();
        let profile = profile_center(&path, &sp, 300, true).unwrap();
        let moments = tank_moments(&profile, &path, &sp);
        for (m, &v) in moments.iter().zip(&profile.velocity) {
            assert!((m.left_velocity - v).abs() < 1e-9);
            assert!((m.right_velocity - v).abs() < 1e-9);
        }
        let last = moments.last().unwrap();
        assert!((last.left_position - 30.0).abs() < 0.05);
        assert!((last.right_position - 30.0).abs() < 0.05);
    }

    #[test]
    fn test_solve_step_time_zero_step() {
        assert!(solve_step_time(0.0, 0.0, 0.0).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_solve_step_time_cruise() {
        let dt = solve_step_time(1.0, 2.0, 0.0).unwrap();
        assert!((dt - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_solve_step_time_acceleration() {
        // From rest at 2 m/s^2 over 1 m: dt = 1 s
        let dt = solve_step_time(1.0, 0.0, 2.0).unwrap();
        assert!((dt - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_solve_step_time_stall_fails() {
        assert!(solve_step_time(1.0, 0.0, 0.0).is_err());
    }
}
