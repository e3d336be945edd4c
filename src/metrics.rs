// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Metrics counters and the public snapshot types returned by
//! `get_metrics`/`get_queue_status`.

use std::time::Duration;

use serde::Serialize;

use crate::cost::{TaskCost, UsageSnapshot};
use crate::priority::TaskPriority;

/// Internal running counters, mutated only under the scheduler lock.
#[derive(Debug, Default)]
pub(crate) struct MetricsCounters {
    pub(crate) tasks_queued: u64,
    pub(crate) tasks_executed: u64,
    pub(crate) tasks_rejected: u64,
    /// Counts deferral *events* (one per pop-and-requeue during the top-N
    /// scan), not distinct deferred tasks. A persistently-unaffordable
    /// head inflates this counter across repeated `execute_next` calls,
    /// which is intentional: it is what makes head-of-line blocking
    /// observable.
    pub(crate) tasks_deferred: u64,
    pub(crate) tasks_currently_executing: u64,
    pub(crate) total_cost_spent: UsageSnapshot,
}

impl MetricsCounters {
    pub(crate) fn record_execution(&mut self, cost: &TaskCost) {
        self.tasks_executed += 1;
        self.total_cost_spent.api_calls += cost.api_calls as f64;
        self.total_cost_spent.compute_units += cost.compute_units;
        self.total_cost_spent.memory_mb += cost.memory_mb as f64;
    }

    pub(crate) fn record_rejection(&mut self) {
        self.tasks_rejected += 1;
    }

    pub(crate) fn record_deferral(&mut self) {
        self.tasks_deferred += 1;
    }
}

/// A point-in-time snapshot of scheduler counters and usage, as returned by
/// `Scheduler::metrics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulerMetrics {
    /// Human-readable scheduler identifier, used as the task-id prefix.
    pub name: String,
    /// Number of tasks currently sitting in the queue.
    pub queue_size: usize,
    /// Total admissions ever recorded (not decremented on dispatch).
    pub tasks_queued: u64,
    /// Tasks that ran to completion successfully. A failing task is not
    /// counted here.
    pub tasks_executed: u64,
    /// Tasks rejected at submission by `reject_if_no_budget`.
    pub tasks_rejected: u64,
    /// Deferral events during top-N scans (see `MetricsCounters`).
    pub tasks_deferred: u64,
    /// Tasks currently running (dispatched, reservation held, callable not
    /// yet resolved).
    pub tasks_currently_executing: u64,
    /// Live reserved compute/memory usage right now.
    pub current_usage: UsageSnapshot,
    /// Cumulative cost of every task that has completed successfully.
    pub total_cost_spent: UsageSnapshot,
    /// API tokens currently available in the rate-limiting bucket.
    pub api_tokens_available: f64,
}

/// A point-in-time view of one queued task, as returned by
/// `Scheduler::queue_status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueEntry {
    /// The task's unique identifier.
    pub task_id: String,
    /// The task's priority level name (e.g. `"CRITICAL"`).
    pub priority: &'static str,
    /// The task's estimated resource cost.
    pub cost: TaskCost,
    /// Wall-clock age since submission.
    pub age: Duration,
    /// Frozen priority score used for queue ordering.
    pub priority_score: f64,
}

impl QueueEntry {
    pub(crate) fn new(
        task_id: String,
        priority: TaskPriority,
        cost: TaskCost,
        age: Duration,
        priority_score: f64,
    ) -> Self {
        Self {
            task_id,
            priority: priority.name(),
            cost,
            age,
            priority_score,
        }
    }
}
