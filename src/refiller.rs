// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! The background token refiller: a long-lived activity that wakes on a
//! fixed cadence and tops up the API token bucket proportionally to
//! elapsed wall-clock time.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::scheduler::SchedulerState;

/// Spawns the refiller loop, returning a handle the caller can abort.
///
/// The loop acquires the scheduler lock only for the brief arithmetic of
/// `refill_tokens`; it never holds the lock across the `sleep`. Any
/// unexpected failure acquiring the lock (a poisoned mutex, left behind by
/// a panicking holder) is recovered rather than propagated, so a single bad
/// tick can never take the refiller down.
pub(crate) fn spawn(state: Arc<Mutex<SchedulerState>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_tick = Instant::now();
        loop {
            tokio::time::sleep(interval).await;

            let now = Instant::now();
            let elapsed = now.duration_since(last_tick);
            last_tick = now;

            let mut guard = match state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => {
                    tracing::warn!("scheduler lock poisoned during refill, recovering");
                    poisoned.into_inner()
                }
            };
            guard.accountant.refill_tokens(elapsed);
            tracing::debug!(
                elapsed_ms = elapsed.as_millis() as u64,
                tokens_available = guard.accountant.tokens_available(),
                "refilled api token bucket"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{ResourceBudget, TaskCost};
    use crate::scheduler::SchedulerState;

    #[tokio::test]
    async fn refiller_tops_up_tokens_over_time() {
        let budget = ResourceBudget::new(60, 100.0, 512).unwrap();
        let state = Arc::new(Mutex::new(SchedulerState::new(budget)));

        {
            let mut guard = state.lock().unwrap();
            guard.accountant.reserve(&TaskCost {
                api_calls: 60,
                ..Default::default()
            });
        }
        assert_eq!(state.lock().unwrap().accountant.tokens_available(), 0.0);

        let handle = spawn(Arc::clone(&state), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(120)).await;
        handle.abort();
        let _ = handle.await;

        assert!(state.lock().unwrap().accountant.tokens_available() > 0.0);
    }

    #[tokio::test]
    async fn stopping_mid_sleep_is_silent() {
        let budget = ResourceBudget::new(60, 100.0, 512).unwrap();
        let state = Arc::new(Mutex::new(SchedulerState::new(budget)));
        let handle = spawn(state, Duration::from_secs(30));
        handle.abort();
        let result = handle.await;
        assert!(result.is_err());
        assert!(result.unwrap_err().is_cancelled());
    }
}
