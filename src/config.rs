// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Scheduler configuration.
//!
//! A `serde`-deserializable struct with `#[serde(default)]` fields and a
//! hand-written `Default` impl, loadable from a TOML file via
//! `SchedulerConfig::from_toml_str`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cost::ResourceBudget;
use crate::error::{Result, SchedulerError};

/// Default number of top-of-queue candidates `execute_next` inspects before
/// giving up for this call. A tuning constant, not a fixed semantic
/// requirement — raising it trades latency for a better chance of finding
/// an affordable candidate under a contested budget.
pub const DEFAULT_SCAN_DEPTH: usize = 5;

/// Default cadence of the background token refiller.
pub const DEFAULT_REFILL_INTERVAL: Duration = Duration::from_secs(1);

/// Tunable scheduler behavior, separate from the per-instance
/// [`ResourceBudget`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// The resource budget used by [`crate::Scheduler::from_config`] and
    /// [`crate::Scheduler::new_default`]. Ignored by [`crate::Scheduler::new`]
    /// and [`crate::Scheduler::with_config`], which take an explicit budget.
    #[serde(default)]
    pub default_budget: ResourceBudget,

    /// How many top-of-queue candidates `execute_next` inspects before
    /// giving up. Must be at least 1.
    #[serde(default = "default_scan_depth")]
    pub scan_depth: usize,

    /// How often the background refiller wakes to top up the API token
    /// bucket.
    #[serde(default = "default_refill_interval", with = "duration_secs")]
    pub refill_interval: Duration,
}

fn default_scan_depth() -> usize {
    DEFAULT_SCAN_DEPTH
}

fn default_refill_interval() -> Duration {
    DEFAULT_REFILL_INTERVAL
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_budget: ResourceBudget::default(),
            scan_depth: DEFAULT_SCAN_DEPTH,
            refill_interval: DEFAULT_REFILL_INTERVAL,
        }
    }
}

impl SchedulerConfig {
    /// Parses a `SchedulerConfig` from a TOML document, validating that
    /// `scan_depth` is non-zero.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: SchedulerConfig = toml::from_str(s)
            .map_err(|e| SchedulerError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.scan_depth == 0 {
            return Err(SchedulerError::InvalidConfig(
                "scan_depth must be >= 1".to_string(),
            ));
        }
        // `ResourceBudget`'s derived `Deserialize` bypasses the validating
        // `ResourceBudget::new` constructor, so a config loaded from TOML
        // must be re-checked here to uphold "any non-positive dimension is
        // invalid and must be rejected at construction" for `default_budget`
        // too.
        ResourceBudget::new(
            self.default_budget.api_calls_per_minute,
            self.default_budget.compute_units,
            self.default_budget.memory_mb,
        )
        .map_err(|e| SchedulerError::InvalidConfig(format!("default_budget: {e}")))?;
        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_module_constants() {
        let config = SchedulerConfig::default();
        assert_eq!(config.scan_depth, 5);
        assert_eq!(config.refill_interval, Duration::from_secs(1));
        assert_eq!(config.default_budget, ResourceBudget::default());
    }

    #[test]
    fn loads_from_toml() {
        let toml_src = r#"
            scan_depth = 3

            [default_budget]
            api_calls_per_minute = 30
            compute_units = 50.0
            memory_mb = 256
        "#;
        let config = SchedulerConfig::from_toml_str(toml_src).unwrap();
        assert_eq!(config.scan_depth, 3);
        assert_eq!(config.default_budget.api_calls_per_minute, 30);
    }

    #[test]
    fn rejects_zero_scan_depth() {
        let toml_src = "scan_depth = 0";
        assert!(matches!(
            SchedulerConfig::from_toml_str(toml_src),
            Err(SchedulerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_invalid_default_budget() {
        let toml_src = r#"
            [default_budget]
            api_calls_per_minute = 30
            compute_units = 0.0
            memory_mb = 256
        "#;
        assert!(matches!(
            SchedulerConfig::from_toml_str(toml_src),
            Err(SchedulerError::InvalidConfig(_))
        ));
    }
}
