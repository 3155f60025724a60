//! Common types and error definitions for trajectory_planner
//!
//! This module provides the foundational building blocks used across
//! the path, profiling, and trajectory modules.

pub mod types;
pub mod error;

pub use types::*;
pub use error::*;
