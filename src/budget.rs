// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Budget accounting: a token bucket for the API rate limit, plus plain
//! reservation counters for compute and memory.
//!
//! Deliberately single-threaded arithmetic (`f64` fields, no atomics): this
//! accountant only ever runs behind the scheduler's single lock, so there
//! is no concurrent access to race against.

use std::time::Duration;

use crate::cost::{ResourceBudget, TaskCost, UsageSnapshot};

/// Token bucket rate limiter for API calls.
///
/// Capacity is `budget.api_calls_per_minute`; fill rate is
/// `capacity / 60` tokens per second. Refill is proportional to elapsed
/// wall-clock time, which keeps the accounting correct across refiller
/// delay or clock jitter.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TokenBucket {
    tokens: f64,
    capacity: f64,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            capacity,
        }
    }

    fn available(&self) -> f64 {
        self.tokens
    }

    /// Consumes tokens unconditionally. Callers must have already checked
    /// `available() >= amount` via `can_afford`; tokens are never refunded
    /// once consumed (they model an irreversibly consumed external rate).
    fn consume(&mut self, amount: f64) {
        self.tokens = (self.tokens - amount).max(0.0);
    }

    /// Adds tokens proportional to `elapsed`, capped at capacity.
    fn refill(&mut self, elapsed: Duration, tokens_per_minute: f64) {
        let tokens_per_second = tokens_per_minute / 60.0;
        let added = tokens_per_second * elapsed.as_secs_f64();
        if added > 0.0 {
            self.tokens = (self.tokens + added).min(self.capacity);
        }
    }
}

/// Tracks live resource usage across the three budget dimensions and
/// answers the admission question `can_afford`.
pub(crate) struct BudgetAccountant {
    budget: ResourceBudget,
    tokens: TokenBucket,
    reserved: UsageSnapshot,
}

impl BudgetAccountant {
    pub(crate) fn new(budget: ResourceBudget) -> Self {
        Self {
            budget,
            tokens: TokenBucket::new(budget.api_calls_per_minute as f64),
            reserved: UsageSnapshot::default(),
        }
    }

    /// `can_afford(cost)`: true iff api tokens, compute, and memory all fit
    /// within budget simultaneously.
    pub(crate) fn can_afford(&self, cost: &TaskCost) -> bool {
        self.tokens.available() >= cost.api_calls as f64
            && self.reserved.compute_units + cost.compute_units <= self.budget.compute_units
            && self.reserved.memory_mb + cost.memory_mb as f64 <= self.budget.memory_mb as f64
    }

    /// Applies a reservation: consumes API tokens and increments the
    /// compute/memory counters. Must only be called after `can_afford`
    /// returned `true` for the same cost, atomically under the scheduler
    /// lock.
    pub(crate) fn reserve(&mut self, cost: &TaskCost) {
        self.tokens.consume(cost.api_calls as f64);
        self.reserved.compute_units += cost.compute_units;
        self.reserved.memory_mb += cost.memory_mb as f64;
    }

    /// Releases a reservation on task completion (success or failure).
    /// API tokens are never refunded — they model an irreversibly
    /// consumed external rate, not a held resource.
    pub(crate) fn release(&mut self, cost: &TaskCost) {
        self.reserved.compute_units = (self.reserved.compute_units - cost.compute_units).max(0.0);
        self.reserved.memory_mb = (self.reserved.memory_mb - cost.memory_mb as f64).max(0.0);
    }

    pub(crate) fn refill_tokens(&mut self, elapsed: Duration) {
        self.tokens
            .refill(elapsed, self.budget.api_calls_per_minute as f64);
    }

    pub(crate) fn tokens_available(&self) -> f64 {
        self.tokens.available()
    }

    pub(crate) fn current_usage(&self) -> UsageSnapshot {
        UsageSnapshot {
            api_calls: 0.0,
            compute_units: self.reserved.compute_units,
            memory_mb: self.reserved.memory_mb,
        }
    }

    pub(crate) fn budget(&self) -> ResourceBudget {
        self.budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(api: u32, compute: f64, memory: u32) -> ResourceBudget {
        ResourceBudget::new(api, compute, memory).unwrap()
    }

    #[test]
    fn fresh_accountant_starts_at_full_tokens_and_zero_usage() {
        let acc = BudgetAccountant::new(budget(60, 100.0, 512));
        assert_eq!(acc.tokens_available(), 60.0);
        assert_eq!(acc.current_usage().compute_units, 0.0);
        assert_eq!(acc.current_usage().memory_mb, 0.0);
    }

    #[test]
    fn reserve_then_release_returns_to_zero() {
        let mut acc = BudgetAccountant::new(budget(60, 100.0, 512));
        let cost = TaskCost {
            api_calls: 5,
            compute_units: 10.0,
            memory_mb: 20,
            ..Default::default()
        };
        assert!(acc.can_afford(&cost));
        acc.reserve(&cost);
        assert_eq!(acc.current_usage().compute_units, 10.0);
        assert_eq!(acc.current_usage().memory_mb, 20.0);
        assert_eq!(acc.tokens_available(), 55.0);

        acc.release(&cost);
        assert_eq!(acc.current_usage().compute_units, 0.0);
        assert_eq!(acc.current_usage().memory_mb, 0.0);
        // tokens are not refunded on release
        assert_eq!(acc.tokens_available(), 55.0);
    }

    #[test]
    fn cannot_afford_beyond_any_single_dimension() {
        let acc = BudgetAccountant::new(budget(5, 10.0, 50));
        assert!(!acc.can_afford(&TaskCost {
            api_calls: 6,
            ..Default::default()
        }));
        assert!(!acc.can_afford(&TaskCost {
            compute_units: 11.0,
            ..Default::default()
        }));
        assert!(!acc.can_afford(&TaskCost {
            memory_mb: 51,
            ..Default::default()
        }));
    }

    #[test]
    fn refill_is_proportional_and_capped() {
        let mut acc = BudgetAccountant::new(budget(60, 100.0, 512));
        acc.reserve(&TaskCost {
            api_calls: 60,
            ..Default::default()
        });
        assert_eq!(acc.tokens_available(), 0.0);

        acc.refill_tokens(Duration::from_secs(30));
        assert!((acc.tokens_available() - 30.0).abs() < 1e-9);

        acc.refill_tokens(Duration::from_secs(120));
        assert_eq!(acc.tokens_available(), 60.0, "refill caps at capacity");
    }

    #[test]
    fn exact_full_budget_task_is_affordable_and_returns_to_zero() {
        let mut acc = BudgetAccountant::new(budget(60, 100.0, 512));
        let cost = TaskCost {
            api_calls: 60,
            compute_units: 100.0,
            memory_mb: 512,
            ..Default::default()
        };
        assert!(acc.can_afford(&cost));
        acc.reserve(&cost);
        acc.release(&cost);
        assert_eq!(acc.current_usage().compute_units, 0.0);
        assert_eq!(acc.current_usage().memory_mb, 0.0);
    }
}
