// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Resource budget and per-task cost types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};

/// Immutable configuration of the maximum capacity across three dimensions.
///
/// All three dimensions must be strictly positive; use [`ResourceBudget::new`]
/// to construct one, which validates eagerly rather than deferring the
/// failure to first use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceBudget {
    /// Sustained rate limit and token-bucket ceiling for API calls.
    pub api_calls_per_minute: u32,
    /// Instantaneous ceiling on reserved compute.
    pub compute_units: f64,
    /// Instantaneous ceiling on reserved memory, in megabytes.
    pub memory_mb: u32,
}

impl ResourceBudget {
    /// Creates a budget, rejecting any non-positive dimension.
    pub fn new(api_calls_per_minute: u32, compute_units: f64, memory_mb: u32) -> Result<Self> {
        if api_calls_per_minute == 0 {
            return Err(SchedulerError::InvalidBudget(
                "api_calls_per_minute must be > 0".to_string(),
            ));
        }
        if !(compute_units > 0.0) {
            return Err(SchedulerError::InvalidBudget(
                "compute_units must be > 0".to_string(),
            ));
        }
        if memory_mb == 0 {
            return Err(SchedulerError::InvalidBudget(
                "memory_mb must be > 0".to_string(),
            ));
        }
        Ok(Self {
            api_calls_per_minute,
            compute_units,
            memory_mb,
        })
    }
}

impl Default for ResourceBudget {
    /// A moderate default: 60 api/min, 100.0 compute, 512 MB.
    fn default() -> Self {
        Self {
            api_calls_per_minute: 60,
            compute_units: 100.0,
            memory_mb: 512,
        }
    }
}

/// The estimated resource footprint of one task.
///
/// `estimated_duration` is informational only and is never consulted by the
/// scheduling decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskCost {
    /// Number of rate-limited API calls this task will make.
    pub api_calls: u32,
    /// Instantaneous compute reservation.
    pub compute_units: f64,
    /// Instantaneous memory reservation, in megabytes.
    pub memory_mb: u32,
    /// Informational estimate of how long the task will take.
    #[serde(with = "duration_secs")]
    pub estimated_duration: Duration,
}

impl Default for TaskCost {
    fn default() -> Self {
        Self {
            api_calls: 0,
            compute_units: 1.0,
            memory_mb: 10,
            estimated_duration: Duration::from_secs_f64(1.0),
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}

/// A point-in-time snapshot of reserved (instantaneous) and consumed
/// (rate-limited) resource usage, in the same three dimensions as
/// [`ResourceBudget`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// API calls, as a float so it can double as a cumulative spend counter.
    pub api_calls: f64,
    /// Compute units currently reserved (or cumulatively spent).
    pub compute_units: f64,
    /// Memory, in megabytes, currently reserved (or cumulatively spent).
    pub memory_mb: f64,
}
