//! trajectory_planner - constrained trajectory generation for wheeled robots
//!
//! This crate turns a sequence of waypoints into a time-parameterized
//! motion profile: a piecewise spline path is arc-length parameterized,
//! run through a forward/backward constrained velocity profiler, and
//! (for differential drive) split into per-wheel channels limited by
//! turning curvature. Followers sample the result at arbitrary times.

// Core modules
pub mod common;

// Geometry and profiling modules
pub mod spline;
pub mod path;
pub mod profile;
pub mod trajectory;

// Re-export common types for convenience
pub use common::{Moment, PathType, RobotSpecs, TankMoment, TrajectoryParams, Waypoint};
pub use common::{TimedSample, TrajectoryError, TrajectoryResult};
pub use path::Path;
pub use spline::SplineSegment;
pub use trajectory::{TankTrajectory, Trajectory};
