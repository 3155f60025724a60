//! Error types for trajectory_planner

use std::fmt;

/// Main error type for trajectory generation
#[derive(Debug)]
pub enum TrajectoryError {
    /// Inputs rejected at construction: non-finite limits, too few
    /// waypoints, zero sample count, tank drive without a base width
    InvalidConfiguration(String),
    /// Inputs were individually valid but jointly infeasible: a waypoint
    /// velocity the two passes cannot reach, or a time-assignment step
    /// with no positive real root
    GenerationFailure(String),
}

impl fmt::Display for TrajectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrajectoryError::InvalidConfiguration(msg) => {
                write!(f, "Invalid configuration: {}", msg)
            }
            TrajectoryError::GenerationFailure(msg) => {
                write!(f, "Trajectory generation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for TrajectoryError {}

/// Result type alias for trajectory operations
pub type TrajectoryResult<T> = Result<T, TrajectoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrajectoryError::InvalidConfiguration("need at least 2 waypoints".to_string());
        assert_eq!(
            format!("{}", err),
            "Invalid configuration: need at least 2 waypoints"
        );
    }

    #[test]
    fn test_generation_failure_display() {
        let err = TrajectoryError::GenerationFailure("no positive root".to_string());
        assert_eq!(
            format!("{}", err),
            "Trajectory generation failed: no positive root"
        );
    }
}
