//! Common types used throughout trajectory_planner

use nalgebra::Vector2;
use std::f64::consts::PI;

/// Absolute tolerance used for floating-point comparisons: quadratic
/// discriminant snapping, zero-length steps, and binary-search brackets.
pub const TOLERANCE: f64 = 1e-9;

/// A required pose the path must pass through, with an optional
/// boundary/through velocity. Heading is an absolute angle from the
/// +x axis in radians, not a direction of travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub velocity: Option<f64>,
}

impl Waypoint {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading, velocity: None }
    }

    pub fn with_velocity(x: f64, y: f64, heading: f64, velocity: f64) -> Self {
        Self { x, y, heading, velocity: Some(velocity) }
    }

    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Endpoint tangent vector for spline construction, scaled by the
    /// turn-smoothness constant alpha.
    pub fn tangent(&self, alpha: f64) -> Vector2<f64> {
        Vector2::new(alpha * self.heading.cos(), alpha * self.heading.sin())
    }
}

/// Physical limits of the robot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotSpecs {
    pub max_velocity: f64,
    pub max_acceleration: f64,
    pub base_width: f64,
}

impl RobotSpecs {
    pub fn new(max_velocity: f64, max_acceleration: f64, base_width: f64) -> Self {
        Self { max_velocity, max_acceleration, base_width }
    }
}

/// Spline basis used between consecutive waypoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathType {
    /// Cubic Bezier; cheap, acceleration may jump at segment joins
    Bezier,
    /// Cubic Hermite; same join characteristic, different basis
    CubicHermite,
    /// Quintic Hermite with zero endpoint second derivative; C2 joins,
    /// recommended default
    QuinticHermite,
}

/// Profiler configuration
#[derive(Debug, Clone)]
pub struct TrajectoryParams {
    pub waypoints: Vec<Waypoint>,
    pub alpha: f64,
    pub sample_count: usize,
    pub path_type: PathType,
    pub is_tank: bool,
}

/// A single time-stamped sample of a center-line trajectory.
///
/// `position` is the distance travelled along the path, `initial_facing`
/// is the direction the robot's front points at the first sample, and
/// `backwards` marks that travel direction and facing are opposed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moment {
    pub position: f64,
    pub velocity: f64,
    pub acceleration: f64,
    pub heading: f64,
    pub time: f64,
    pub initial_facing: f64,
    pub backwards: bool,
}

/// A single time-stamped sample of a tank-drive trajectory, with
/// independent left/right wheel channels in place of the scalar
/// center-line fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankMoment {
    pub left_position: f64,
    pub left_velocity: f64,
    pub left_acceleration: f64,
    pub right_position: f64,
    pub right_velocity: f64,
    pub right_acceleration: f64,
    pub heading: f64,
    pub time: f64,
    pub initial_facing: f64,
    pub backwards: bool,
}

/// Capability shared by moment types so that one time-indexed binary
/// search and interpolation routine serves both the basic and the
/// tank-drive query paths.
pub trait TimedSample: Copy {
    fn time(&self) -> f64;

    /// Linear interpolation of every numeric field toward `other` at
    /// `frac` in [0, 1]; headings interpolate angularly.
    fn interpolate(&self, other: &Self, frac: f64) -> Self;
}

impl TimedSample for Moment {
    fn time(&self) -> f64 {
        self.time
    }

    fn interpolate(&self, other: &Self, frac: f64) -> Self {
        Moment {
            position: lerp(self.position, other.position, frac),
            velocity: lerp(self.velocity, other.velocity, frac),
            acceleration: lerp(self.acceleration, other.acceleration, frac),
            heading: lerp_angle(self.heading, other.heading, frac),
            time: lerp(self.time, other.time, frac),
            initial_facing: self.initial_facing,
            backwards: self.backwards,
        }
    }
}

impl TimedSample for TankMoment {
    fn time(&self) -> f64 {
        self.time
    }

    fn interpolate(&self, other: &Self, frac: f64) -> Self {
        TankMoment {
            left_position: lerp(self.left_position, other.left_position, frac),
            left_velocity: lerp(self.left_velocity, other.left_velocity, frac),
            left_acceleration: lerp(self.left_acceleration, other.left_acceleration, frac),
            right_position: lerp(self.right_position, other.right_position, frac),
            right_velocity: lerp(self.right_velocity, other.right_velocity, frac),
            right_acceleration: lerp(self.right_acceleration, other.right_acceleration, frac),
            heading: lerp_angle(self.heading, other.heading, frac),
            time: lerp(self.time, other.time, frac),
            initial_facing: self.initial_facing,
            backwards: self.backwards,
        }
    }
}

pub fn lerp(a: f64, b: f64, frac: f64) -> f64 {
    a + (b - a) * frac
}

/// Normalize an angle to (-pi, pi]
pub fn normalize_angle(theta: f64) -> f64 {
    let mut theta = theta;
    while theta > PI {
        theta -= 2.0 * PI;
    }
    while theta <= -PI {
        theta += 2.0 * PI;
    }
    theta
}

/// Reflection of an angle about a reference angle
pub fn mirror_angle(theta: f64, reference: f64) -> f64 {
    normalize_angle(2.0 * reference - theta)
}

/// Angular interpolation through the (cos, sin) unit vectors, avoiding
/// wraparound artifacts near +-pi.
pub fn lerp_angle(from: f64, to: f64, frac: f64) -> f64 {
    let c = lerp(from.cos(), to.cos(), frac);
    let s = lerp(from.sin(), to.sin(), frac);
    s.atan2(c)
}
