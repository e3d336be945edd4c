// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Task priority levels.

use serde::{Deserialize, Serialize};

/// Ordered task priority. Lower numeric value is more urgent; the `Ord`
/// derive follows declaration order, so `TaskPriority::Critical <
/// TaskPriority::Low` holds directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskPriority {
    /// Must execute; user-facing or otherwise time-critical work.
    Critical = 1,
    /// Important but can wait briefly.
    High = 2,
    /// Standard background work.
    Normal = 3,
    /// Best-effort; deferred first under contention.
    Low = 4,
}

impl TaskPriority {
    /// The integer weight used in the priority score: 1 for `Critical`
    /// through 4 for `Low`.
    pub fn level(self) -> u8 {
        match self {
            TaskPriority::Critical => 1,
            TaskPriority::High => 2,
            TaskPriority::Normal => 3,
            TaskPriority::Low => 4,
        }
    }

    /// Human-readable name, as exposed by `get_queue_status`.
    pub fn name(self) -> &'static str {
        match self {
            TaskPriority::Critical => "CRITICAL",
            TaskPriority::High => "HIGH",
            TaskPriority::Normal => "NORMAL",
            TaskPriority::Low => "LOW",
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Normal
    }
}
