// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for the scheduler
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

use crate::cost::TaskCost;

/// Main error type for scheduler operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    /// Raised at construction when any `ResourceBudget` dimension is <= 0
    #[error("invalid budget: {0}")]
    InvalidBudget(String),

    /// Raised from `schedule` only when `reject_if_no_budget` is set and the
    /// current budget cannot cover the task's cost at submission time
    #[error(
        "budget exhausted for task {task_id}: required {required:?}, {api_tokens_available:.2} api tokens available"
    )]
    BudgetExhausted {
        /// The task that was rejected
        task_id: String,
        /// The cost that could not be admitted
        required: TaskCost,
        /// API tokens available in the bucket at rejection time
        api_tokens_available: f64,
    },

    /// Raised when a scheduler configuration value is out of range
    #[error("invalid scheduler config: {0}")]
    InvalidConfig(String),
}

/// Result type alias for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_budget_display() {
        let err = SchedulerError::InvalidBudget("compute_units must be > 0".to_string());
        assert!(err.to_string().contains("compute_units must be > 0"));
    }

    #[test]
    fn budget_exhausted_display() {
        let err = SchedulerError::BudgetExhausted {
            task_id: "demo-1".to_string(),
            required: TaskCost {
                api_calls: 3,
                ..Default::default()
            },
            api_tokens_available: 1.5,
        };
        let msg = err.to_string();
        assert!(msg.contains("demo-1"));
        assert!(msg.contains("1.50"));
    }

    #[test]
    fn invalid_config_display() {
        let err = SchedulerError::InvalidConfig("scan_depth must be > 0".to_string());
        assert!(err.to_string().contains("scan_depth"));
    }
}
