//! Savings estimation for optimization scenarios
//!
//! This module provides estimates for:
//! - Idle elimination (switching off during low-current periods)
//! - Heat recovery (recovering waste heat during high-temperature periods)
//! - The aggregated total impact against the session baseline

mod estimator;

pub use estimator::{SavingsConfig, SavingsEstimator, HOURS_PER_YEAR};
