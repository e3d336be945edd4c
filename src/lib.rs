// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! A cost-aware task scheduler: accepts callable units of work tagged with
//! a priority and an estimated resource cost, and decides — under a fixed
//! resource budget — which work to run next.
//!
//! It balances three concerns a pure priority queue can't: urgency
//! (critical work first), efficiency (don't waste scarce capacity on
//! oversized tasks), and fairness over time (prevent cheap low-priority
//! work from starving indefinitely).
//!
//! Architecture:
//! - [`queue`]: the priority queue, ordered by a frozen priority score.
//! - [`budget`]: the budget accountant — a token bucket for the
//!   rate-limited API dimension, plus reservation counters for compute and
//!   memory.
//! - [`refiller`]: the background activity that keeps the token bucket
//!   topped up.
//! - [`scheduler`]: the core that ties the above together behind one lock.
//!
//! ```
//! use cost_scheduler::{Scheduler, ResourceBudget, TaskCost, TaskPriority};
//! use futures::FutureExt;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let scheduler = Scheduler::new(ResourceBudget::default(), "example");
//! scheduler.start();
//!
//! scheduler
//!     .schedule(
//!         Box::new(|| async { Ok(Box::new(42) as Box<dyn std::any::Any + Send>) }.boxed()),
//!         TaskPriority::High,
//!         TaskCost::default(),
//!         false,
//!     )
//!     .unwrap();
//!
//! let result = scheduler.execute_next().await;
//! assert!(result.is_some());
//! scheduler.stop().await;
//! # }
//! ```

mod budget;
mod queue;
mod refiller;

pub mod config;
pub mod cost;
pub mod error;
pub mod metrics;
pub mod priority;
pub mod scheduler;
pub mod task;

pub use config::SchedulerConfig;
pub use cost::{ResourceBudget, TaskCost, UsageSnapshot};
pub use error::{Result, SchedulerError};
pub use metrics::{QueueEntry, SchedulerMetrics};
pub use priority::TaskPriority;
pub use scheduler::Scheduler;
pub use task::{BoxFuture, TaskError, TaskFn, TaskOutput};
