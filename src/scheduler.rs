// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! The scheduler core: orchestrates submission, selection, execution, and
//! metrics behind a single serializing lock.
//!
//! The lock is a plain `std::sync::Mutex`, not `tokio::sync::Mutex`: every
//! critical section here is pure arithmetic over the queue/accountant/
//! metrics and never awaits, so there is no reason to pay for an
//! async-aware lock. This also lets [`ReservationGuard`] release its
//! reservation synchronously from `Drop`, the same RAII discipline used to
//! return a resource to its owner unconditionally, regardless of how the
//! holder's scope ends.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::budget::BudgetAccountant;
use crate::config::SchedulerConfig;
use crate::cost::{ResourceBudget, TaskCost, UsageSnapshot};
use crate::error::{Result, SchedulerError};
use crate::metrics::{MetricsCounters, QueueEntry, SchedulerMetrics};
use crate::priority::TaskPriority;
use crate::queue::PriorityQueue;
use crate::refiller;
use crate::task::{ScheduledTask, TaskFn, TaskOutput};

/// All shared, mutable scheduler state, guarded by one lock.
pub(crate) struct SchedulerState {
    pub(crate) queue: PriorityQueue,
    pub(crate) accountant: BudgetAccountant,
    pub(crate) metrics: MetricsCounters,
}

impl SchedulerState {
    pub(crate) fn new(budget: ResourceBudget) -> Self {
        Self {
            queue: PriorityQueue::new(),
            accountant: BudgetAccountant::new(budget),
            metrics: MetricsCounters::default(),
        }
    }
}

/// RAII reservation release.
///
/// Dispatch reserves compute/memory (and consumes API tokens) before the
/// lock is released and the callable runs. Whatever happens next — the
/// callable resolves `Ok`, resolves `Err`, or the host cancels the
/// `execute_next` future entirely — this guard's `Drop` guarantees the
/// compute/memory reservation is released exactly once. Without it, a
/// cancelled future between reservation and release would leak capacity
/// forever.
///
/// The normal path calls [`ReservationGuard::disarm`] after releasing the
/// reservation manually (so it can be combined with the metrics update in
/// one lock acquisition); the guard's `Drop` is then a no-op. Only the
/// cancellation path relies on the `Drop` impl actually doing the release.
struct ReservationGuard {
    state: Arc<Mutex<SchedulerState>>,
    cost: TaskCost,
    armed: bool,
}

impl ReservationGuard {
    fn new(state: Arc<Mutex<SchedulerState>>, cost: TaskCost) -> Self {
        Self {
            state,
            cost,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ReservationGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.accountant.release(&self.cost);
        guard.metrics.tasks_currently_executing =
            guard.metrics.tasks_currently_executing.saturating_sub(1);
        tracing::warn!("task execution was cancelled; reservation released without a result");
    }
}

/// A cost-aware, priority-ordered, single-lock task scheduler.
///
/// See the crate-level docs for the full design. In short: producers call
/// [`Scheduler::schedule`] to place tasks, consumers call
/// [`Scheduler::execute_next`] to run the most eligible one, and a
/// background refiller (started with [`Scheduler::start`]) keeps the API
/// rate limiter's token bucket topped up.
pub struct Scheduler {
    name: String,
    config: SchedulerConfig,
    state: Arc<Mutex<SchedulerState>>,
    next_task_id: AtomicU64,
    refill_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Creates a scheduler with the given budget (or
    /// [`ResourceBudget::default`] via `new_default`) and default config.
    pub fn new(budget: ResourceBudget, name: impl Into<String>) -> Self {
        Self::with_config(budget, name, SchedulerConfig::default())
    }

    /// Creates a scheduler using `config.default_budget` as its budget and
    /// the rest of `config` for tuning (`scan_depth`, `refill_interval`).
    pub fn from_config(config: SchedulerConfig, name: impl Into<String>) -> Self {
        let budget = config.default_budget;
        Self::with_config(budget, name, config)
    }

    /// Creates a scheduler using [`SchedulerConfig::default`]'s
    /// `default_budget` and default tuning, for callers that don't need a
    /// custom budget or config.
    pub fn new_default(name: impl Into<String>) -> Self {
        Self::from_config(SchedulerConfig::default(), name)
    }

    /// Creates a scheduler with an explicit [`SchedulerConfig`], overriding
    /// `scan_depth` and `refill_interval` independently of the budget.
    pub fn with_config(
        budget: ResourceBudget,
        name: impl Into<String>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            state: Arc::new(Mutex::new(SchedulerState::new(budget))),
            next_task_id: AtomicU64::new(0),
            refill_handle: Mutex::new(None),
        }
    }

    /// The scheduler's name, used as the task-id prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Launches the background token refiller. Idempotent: calling this
    /// while already started is a no-op.
    pub fn start(&self) {
        let mut handle_guard = self.refill_handle.lock().unwrap();
        if handle_guard.is_some() {
            return;
        }
        *handle_guard = Some(refiller::spawn(
            Arc::clone(&self.state),
            self.config.refill_interval,
        ));
        tracing::debug!(name = %self.name, "scheduler refiller started");
    }

    /// Stops the refiller and awaits its cleanup. Cancellation mid-sleep is
    /// expected and swallowed silently. A no-op if not started.
    pub async fn stop(&self) {
        let handle = self.refill_handle.lock().unwrap().take();
        if let Some(handle) = handle {
            handle.abort();
            match handle.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => tracing::error!(error = %e, "refiller task panicked"),
            }
        }
        tracing::debug!(name = %self.name, "scheduler refiller stopped");
    }

    fn next_task_id(&self) -> String {
        let n = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.name, n)
    }

    /// Submits a task for execution.
    ///
    /// Admission happens only if `reject_if_no_budget` is set *and*
    /// `can_afford(cost)` is false at the moment of submission; otherwise
    /// the task is always queued. Returns the assigned task id.
    pub fn schedule(
        &self,
        func: TaskFn,
        priority: TaskPriority,
        cost: TaskCost,
        reject_if_no_budget: bool,
    ) -> Result<String> {
        let task_id = self.next_task_id();
        let mut state = self.state.lock().unwrap();

        if reject_if_no_budget && !state.accountant.can_afford(&cost) {
            state.metrics.record_rejection();
            let api_tokens_available = state.accountant.tokens_available();
            tracing::warn!(task_id = %task_id, "rejecting task: budget exhausted");
            return Err(SchedulerError::BudgetExhausted {
                task_id,
                required: cost,
                api_tokens_available,
            });
        }

        let task = ScheduledTask::new(task_id.clone(), priority, cost, func);
        state.queue.push(task);
        state.metrics.tasks_queued += 1;
        tracing::debug!(task_id = %task_id, ?priority, "task admitted");
        Ok(task_id)
    }

    /// Selects and runs at most one task.
    ///
    /// Scans up to `config.scan_depth` candidates from the top of the
    /// queue, dispatching the first affordable one and returning any
    /// unaffordable candidates to the heap. Returns `None` if the queue is
    /// empty or no candidate in the scanned window is affordable right now.
    pub async fn execute_next(&self) -> Option<TaskOutput> {
        let (task_id, cost, func) = {
            let mut state = self.state.lock().unwrap();
            if state.queue.is_empty() {
                return None;
            }

            let mut skipped = Vec::new();
            let mut chosen = None;

            for _ in 0..self.config.scan_depth {
                let Some(candidate) = state.queue.pop() else {
                    break;
                };
                if state.accountant.can_afford(&candidate.cost) {
                    chosen = Some(candidate);
                    break;
                }
                state.metrics.record_deferral();
                skipped.push(candidate);
            }

            for task in skipped {
                state.queue.push(task);
            }

            let Some(task) = chosen else {
                return None;
            };

            state.accountant.reserve(&task.cost);
            state.metrics.tasks_currently_executing += 1;
            let task_id = task.task_id.clone();
            let cost = task.cost;
            tracing::debug!(task_id = %task_id, "task dispatched");
            (task_id, cost, task.into_func())
        };

        let mut guard = ReservationGuard::new(Arc::clone(&self.state), cost);
        let output = func().await;

        {
            let mut state = self.state.lock().unwrap();
            state.accountant.release(&cost);
            state.metrics.tasks_currently_executing =
                state.metrics.tasks_currently_executing.saturating_sub(1);
            match &output {
                Ok(_) => state.metrics.record_execution(&cost),
                Err(e) => {
                    tracing::warn!(task_id = %task_id, error = %e, "task execution failed");
                }
            }
        }
        guard.disarm();

        Some(output)
    }

    /// Repeatedly calls [`Scheduler::execute_next`] until it yields no
    /// result, pausing briefly between iterations so a chronically
    /// unaffordable head doesn't spin the caller in a tight loop.
    pub async fn execute_all(&self) -> Vec<TaskOutput> {
        let mut results = Vec::new();
        while let Some(output) = self.execute_next().await {
            results.push(output);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        results
    }

    /// A snapshot of counters and current usage.
    pub fn metrics(&self) -> SchedulerMetrics {
        let state = self.state.lock().unwrap();
        SchedulerMetrics {
            name: self.name.clone(),
            queue_size: state.queue.len(),
            tasks_queued: state.metrics.tasks_queued,
            tasks_executed: state.metrics.tasks_executed,
            tasks_rejected: state.metrics.tasks_rejected,
            tasks_deferred: state.metrics.tasks_deferred,
            tasks_currently_executing: state.metrics.tasks_currently_executing,
            current_usage: state.accountant.current_usage(),
            total_cost_spent: state.metrics.total_cost_spent,
            api_tokens_available: state.accountant.tokens_available(),
        }
    }

    /// A point-in-time view of queued tasks, sorted by priority score
    /// (ascending — the next one to dispatch first). Does not mutate the
    /// queue.
    pub fn queue_status(&self) -> Vec<QueueEntry> {
        let state = self.state.lock().unwrap();
        let mut entries: Vec<QueueEntry> = state
            .queue
            .iter()
            .map(|task| {
                QueueEntry::new(
                    task.task_id.clone(),
                    task.priority,
                    task.cost,
                    task.age(),
                    task.priority_score,
                )
            })
            .collect();
        entries.sort_by(|a, b| {
            a.priority_score
                .partial_cmp(&b.priority_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        entries
    }

    /// The budget this scheduler was constructed with.
    pub fn budget(&self) -> ResourceBudget {
        self.state.lock().unwrap().accountant.budget()
    }

    /// Live reserved compute/memory usage right now.
    pub fn current_usage(&self) -> UsageSnapshot {
        self.state.lock().unwrap().accountant.current_usage()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.refill_handle.lock().unwrap().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_uses_configs_default_budget() {
        let mut config = SchedulerConfig::default();
        config.default_budget = ResourceBudget::new(30, 5.0, 64).unwrap();
        config.scan_depth = 2;

        let scheduler = Scheduler::from_config(config, "wired");
        assert_eq!(scheduler.budget(), ResourceBudget::new(30, 5.0, 64).unwrap());
    }

    #[test]
    fn new_default_uses_scheduler_configs_default_budget() {
        let scheduler = Scheduler::new_default("nd");
        assert_eq!(scheduler.budget(), SchedulerConfig::default().default_budget);
    }
}
