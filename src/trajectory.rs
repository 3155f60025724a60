//! Time-indexed trajectory facade
//!
//! Wraps the generated moment array together with its path, exposes
//! continuous-time query by binary search plus interpolation, and
//! re-exposes the geometric transforms at the trajectory level by
//! remapping the existing moments instead of regenerating them.
//! Generation is deterministic and side-effect free; transforms always
//! return a new trajectory and never mutate the original.

use log::info;
use std::f64::consts::{FRAC_PI_2, PI};

use crate::common::{
    mirror_angle, normalize_angle, Moment, PathType, RobotSpecs, TankMoment, TimedSample,
    TrajectoryError, TrajectoryParams, TrajectoryResult, Waypoint, TOLERANCE,
};
use crate::path::Path;
use crate::profile::{basic_moments, facing_of, profile_center, tank_moments};

/// A generated motion profile: the moment array plus the path it was
/// profiled on. `Trajectory<Moment>` is the center-line flavor,
/// `Trajectory<TankMoment>` carries independent wheel channels.
#[derive(Debug, Clone)]
pub struct Trajectory<M> {
    moments: Vec<M>,
    path: Path,
}

/// Tank-drive trajectory with per-wheel moments
pub type TankTrajectory = Trajectory<TankMoment>;

fn validate(specs: &RobotSpecs, params: &TrajectoryParams, tank: bool) -> TrajectoryResult<()> {
    if !specs.max_velocity.is_finite() || specs.max_velocity <= 0.0 {
        return Err(TrajectoryError::InvalidConfiguration(format!(
            "max_velocity must be finite and positive, got {}",
            specs.max_velocity
        )));
    }
    if !specs.max_acceleration.is_finite() || specs.max_acceleration <= 0.0 {
        return Err(TrajectoryError::InvalidConfiguration(format!(
            "max_acceleration must be finite and positive, got {}",
            specs.max_acceleration
        )));
    }
    if tank && (!specs.base_width.is_finite() || specs.base_width <= 0.0) {
        return Err(TrajectoryError::InvalidConfiguration(format!(
            "tank drive needs a finite positive base_width, got {}",
            specs.base_width
        )));
    }
    if params.sample_count < 1 {
        return Err(TrajectoryError::InvalidConfiguration(
            "sample_count must be at least 1".to_string(),
        ));
    }
    Ok(())
}

impl<M: TimedSample> Trajectory<M> {
    /// Wrap a pre-computed moment array and its path; used by the
    /// transforms to avoid redundant regeneration and by callers that
    /// obtained moments elsewhere.
    pub fn from_moments(moments: Vec<M>, path: Path) -> TrajectoryResult<Self> {
        if moments.is_empty() {
            return Err(TrajectoryError::InvalidConfiguration(
                "moment array must not be empty".to_string(),
            ));
        }
        Ok(Trajectory { moments, path })
    }

    /// Sample the trajectory at a time. Times before the first moment
    /// clamp to it, times past the last clamp to the last; otherwise the
    /// bracketing pair is found by binary search and every numeric field
    /// is interpolated at the local fraction.
    pub fn get(&self, time: f64) -> M {
        let first = self.moments[0];
        if time <= first.time() {
            return first;
        }
        let last = self.moments[self.moments.len() - 1];
        if time >= last.time() {
            return last;
        }
        let upper = self.moments.partition_point(|m| m.time() <= time);
        let before = self.moments[upper - 1];
        let after = self.moments[upper];
        let span = after.time() - before.time();
        if span < TOLERANCE {
            return after;
        }
        before.interpolate(&after, (time - before.time()) / span)
    }

    /// Duration of the profile: the last moment's time stamp
    pub fn total_time(&self) -> f64 {
        self.moments[self.moments.len() - 1].time()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn moments(&self) -> &[M] {
        &self.moments
    }
}

impl Trajectory<Moment> {
    /// Generate a center-line trajectory from robot limits and waypoint
    /// parameters.
    pub fn new(specs: &RobotSpecs, params: &TrajectoryParams) -> TrajectoryResult<Self> {
        if params.is_tank {
            return Err(TrajectoryError::InvalidConfiguration(
                "params request tank drive; use TankTrajectory::new".to_string(),
            ));
        }
        validate(specs, params, false)?;
        let mut path = Path::new(
            params.waypoints.clone(),
            params.alpha,
            params.path_type,
            f64::NAN,
        )?;
        path.compute_length(params.sample_count);
        let profile = profile_center(&path, specs, params.sample_count, false)?;
        let moments = basic_moments(&profile, &path);
        info!(
            "generated trajectory: {} moments over {:.3} s",
            moments.len(),
            moments[moments.len() - 1].time
        );
        Ok(Trajectory { moments, path })
    }

    /// Straight-line trajectory along +x from the origin
    pub fn straight(
        specs: &RobotSpecs,
        distance: f64,
        sample_count: usize,
    ) -> TrajectoryResult<Self> {
        let params = TrajectoryParams {
            waypoints: vec![
                Waypoint::new(0.0, 0.0, 0.0),
                Waypoint::new(distance, 0.0, 0.0),
            ],
            alpha: distance,
            sample_count,
            path_type: PathType::QuinticHermite,
            is_tank: false,
        };
        Self::new(specs, &params)
    }

    /// Mirror across the line through the first waypoint at its heading.
    /// Path lengths are preserved, so only headings change.
    pub fn mirror_left_right(&self) -> Self {
        let reference = self.path.waypoints()[0].heading;
        let path = self.path.mirror_left_right();
        let moments: Vec<Moment> = self
            .moments
            .iter()
            .map(|m| Moment {
                heading: mirror_angle(m.heading, reference),
                ..*m
            })
            .collect();
        Self::refresh_facing(moments, path)
    }

    /// Mirror across the perpendicular line: the robot covers the same
    /// ground driving backwards, so the scalar channels negate.
    pub fn mirror_front_back(&self) -> Self {
        let reference = self.path.waypoints()[0].heading + FRAC_PI_2;
        let path = self.path.mirror_front_back();
        let moments: Vec<Moment> = self
            .moments
            .iter()
            .map(|m| Moment {
                position: -m.position,
                velocity: -m.velocity,
                acceleration: -m.acceleration,
                heading: mirror_angle(m.heading, reference),
                time: m.time,
                initial_facing: m.initial_facing,
                backwards: !m.backwards,
            })
            .collect();
        Self::refresh_facing(moments, path)
    }

    /// Drive the same path end-to-start in reverse: moments reverse,
    /// distances remap against the final distance, times against the
    /// final time, headings flip by pi.
    pub fn retrace(&self) -> Self {
        let last = self.moments[self.moments.len() - 1];
        let path = self.path.retrace();
        let moments: Vec<Moment> = self
            .moments
            .iter()
            .rev()
            .map(|m| Moment {
                position: -(last.position - m.position),
                velocity: -m.velocity,
                acceleration: m.acceleration,
                heading: normalize_angle(m.heading + PI),
                time: last.time - m.time,
                initial_facing: m.initial_facing,
                backwards: !m.backwards,
            })
            .collect();
        Self::refresh_facing(moments, path)
    }

    fn refresh_facing(mut moments: Vec<Moment>, path: Path) -> Self {
        let facing = facing_of(moments[0].heading, moments[0].backwards);
        for m in &mut moments {
            m.initial_facing = facing;
        }
        Trajectory { moments, path }
    }
}

impl Trajectory<TankMoment> {
    /// Generate a tank-drive trajectory: the center line is profiled
    /// against curvature-derived speed caps, then split into wheel
    /// channels.
    pub fn new(specs: &RobotSpecs, params: &TrajectoryParams) -> TrajectoryResult<Self> {
        if !params.is_tank {
            return Err(TrajectoryError::InvalidConfiguration(
                "params request a basic trajectory; use Trajectory::new".to_string(),
            ));
        }
        validate(specs, params, true)?;
        let mut path = Path::new(
            params.waypoints.clone(),
            params.alpha,
            params.path_type,
            specs.base_width / 2.0,
        )?;
        path.compute_length(params.sample_count);
        let profile = profile_center(&path, specs, params.sample_count, true)?;
        let moments = tank_moments(&profile, &path, specs);
        info!(
            "generated tank trajectory: {} moments over {:.3} s",
            moments.len(),
            moments[moments.len() - 1].time
        );
        Ok(Trajectory { moments, path })
    }

    /// Mirror across the line through the first waypoint at its heading;
    /// the wheel channels swap sides.
    pub fn mirror_left_right(&self) -> Self {
        let reference = self.path.waypoints()[0].heading;
        let path = self.path.mirror_left_right();
        let moments: Vec<TankMoment> = self
            .moments
            .iter()
            .map(|m| TankMoment {
                left_position: m.right_position,
                left_velocity: m.right_velocity,
                left_acceleration: m.right_acceleration,
                right_position: m.left_position,
                right_velocity: m.left_velocity,
                right_acceleration: m.left_acceleration,
                heading: mirror_angle(m.heading, reference),
                time: m.time,
                initial_facing: m.initial_facing,
                backwards: m.backwards,
            })
            .collect();
        Self::refresh_facing(moments, path)
    }

    /// Mirror across the perpendicular line; each wheel covers its own
    /// ground in reverse, so both channels negate without swapping.
    pub fn mirror_front_back(&self) -> Self {
        let reference = self.path.waypoints()[0].heading + FRAC_PI_2;
        let path = self.path.mirror_front_back();
        let moments: Vec<TankMoment> = self
            .moments
            .iter()
            .map(|m| TankMoment {
                left_position: -m.left_position,
                left_velocity: -m.left_velocity,
                left_acceleration: -m.left_acceleration,
                right_position: -m.right_position,
                right_velocity: -m.right_velocity,
                right_acceleration: -m.right_acceleration,
                heading: mirror_angle(m.heading, reference),
                time: m.time,
                initial_facing: m.initial_facing,
                backwards: !m.backwards,
            })
            .collect();
        Self::refresh_facing(moments, path)
    }

    /// Drive the same path end-to-start in reverse; each wheel's
    /// distance remaps against its own final value.
    pub fn retrace(&self) -> Self {
        let last = self.moments[self.moments.len() - 1];
        let path = self.path.retrace();
        let moments: Vec<TankMoment> = self
            .moments
            .iter()
            .rev()
            .map(|m| TankMoment {
                left_position: -(last.left_position - m.left_position),
                left_velocity: -m.left_velocity,
                left_acceleration: m.left_acceleration,
                right_position: -(last.right_position - m.right_position),
                right_velocity: -m.right_velocity,
                right_acceleration: m.right_acceleration,
                heading: normalize_angle(m.heading + PI),
                time: last.time - m.time,
                initial_facing: m.initial_facing,
                backwards: !m.backwards,
            })
            .collect();
        Self::refresh_facing(moments, path)
    }

    fn refresh_facing(mut moments: Vec<TankMoment>, path: Path) -> Self {
        let facing = facing_of(moments[0].heading, moments[0].backwards);
        for m in &mut moments {
            m.initial_facing = facing;
        }
        Trajectory { moments, path }
    }
}
