// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! The opaque, callable unit of scheduled work.

use std::any::Any;
use std::pin::Pin;
use std::time::{Duration, Instant};

use futures::future::Future;

use crate::cost::TaskCost;
use crate::priority::TaskPriority;

/// A type-erased future: something that produces a value, possibly later,
/// and may fail.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// The error type a task callable may fail with. Boxed and type-erased so
/// the scheduler stays agnostic to what kind of work it runs.
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// The value a task callable resolves to, type-erased behind `Any` so the
/// scheduler can host heterogeneous task bodies in one queue.
pub type TaskOutput = std::result::Result<Box<dyn Any + Send>, TaskError>;

/// A boxed, one-shot callable: bound arguments are captured in the closure
/// itself rather than threaded through the scheduler, which keeps the
/// scheduler's surface free of generics over argument tuples.
pub type TaskFn = Box<dyn FnOnce() -> BoxFuture<TaskOutput> + Send>;

/// Computes a task's queue ordering score.
///
/// `score = priority_level * 10.0 + (compute_units + api_calls * 0.5) * 0.1
/// - age_in_minutes * 0.5`
///
/// The score is a small tiebreaker on top of a dominant priority term, with
/// an unbounded age term that guarantees eventual promotion of old work.
pub(crate) fn priority_score(priority: TaskPriority, cost: &TaskCost, age: Duration) -> f64 {
    let priority_term = priority.level() as f64 * 10.0;
    let cost_term = (cost.compute_units + cost.api_calls as f64 * 0.5) * 0.1;
    let age_minutes = age.as_secs_f64() / 60.0;
    priority_term + cost_term - age_minutes * 0.5
}

/// One queued unit of work.
///
/// `priority_score` is computed once against the submission-time
/// `created_at` and frozen for the lifetime of this value — the queue is
/// never re-scored as time passes.
pub struct ScheduledTask {
    pub(crate) task_id: String,
    pub(crate) priority: TaskPriority,
    pub(crate) cost: TaskCost,
    pub(crate) created_at: Instant,
    pub(crate) priority_score: f64,
    func: TaskFn,
}

impl ScheduledTask {
    pub(crate) fn new(
        task_id: String,
        priority: TaskPriority,
        cost: TaskCost,
        func: TaskFn,
    ) -> Self {
        let created_at = Instant::now();
        let priority_score = priority_score(priority, &cost, Duration::ZERO);
        Self {
            task_id,
            priority,
            cost,
            created_at,
            priority_score,
            func,
        }
    }

    /// Wall-clock age since submission.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Consumes this task, returning its callable for execution.
    pub(crate) fn into_func(self) -> TaskFn {
        self.func
    }
}

impl std::fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("task_id", &self.task_id)
            .field("priority", &self.priority)
            .field("cost", &self.cost)
            .field("priority_score", &self.priority_score)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_dominated_by_priority() {
        let cost = TaskCost::default();
        let critical = priority_score(TaskPriority::Critical, &cost, Duration::ZERO);
        let low = priority_score(TaskPriority::Low, &cost, Duration::ZERO);
        assert!(critical < low);
    }

    #[test]
    fn score_decreases_with_age() {
        let cost = TaskCost::default();
        let fresh = priority_score(TaskPriority::Low, &cost, Duration::ZERO);
        let aged = priority_score(TaskPriority::Low, &cost, Duration::from_secs(20 * 60));
        assert!(aged < fresh, "older low-priority task should score lower (more urgent)");
    }

    #[test]
    fn cheaper_task_scores_lower_within_same_priority() {
        let cheap = TaskCost {
            api_calls: 0,
            compute_units: 0.5,
            ..Default::default()
        };
        let expensive = TaskCost {
            api_calls: 10,
            compute_units: 20.0,
            ..Default::default()
        };
        let cheap_score = priority_score(TaskPriority::Normal, &cheap, Duration::ZERO);
        let expensive_score = priority_score(TaskPriority::Normal, &expensive, Duration::ZERO);
        assert!(cheap_score < expensive_score);
    }

    #[test]
    fn low_task_overtakes_fresh_normal_after_twenty_minutes() {
        let cost = TaskCost::default();
        let fresh_normal = priority_score(TaskPriority::Normal, &cost, Duration::ZERO);
        let aged_low = priority_score(TaskPriority::Low, &cost, Duration::from_secs(20 * 60 + 1));
        assert!(aged_low < fresh_normal);
    }
}
