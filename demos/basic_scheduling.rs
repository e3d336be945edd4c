// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Demo driver for the cost-aware scheduler.
//!
//! Not part of the library's public contract — a thin consumer of it.
//! Exercises basic priority ordering and a budget exhaustion walkthrough.

use std::any::Any;
use std::time::Duration;

use cost_scheduler::{ResourceBudget, Scheduler, TaskCost, TaskPriority};
use futures::FutureExt;

fn any_str(s: impl Into<String>) -> Box<dyn Any + Send> {
    Box::new(s.into())
}

/// Simulates an API call: high API cost, low compute.
fn api_call_task(label: String, api_name: String) -> cost_scheduler::TaskFn {
    Box::new(move || {
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(any_str(format!("{label}: called {api_name} API")))
        }
        .boxed()
    })
}

/// Simulates a compute-heavy task: low API cost, high compute.
fn compute_task(label: String, complexity: String) -> cost_scheduler::TaskFn {
    Box::new(move || {
        async move {
            tokio::time::sleep(Duration::from_millis(40)).await;
            Ok(any_str(format!("{label}: completed {complexity} computation")))
        }
        .boxed()
    })
}

async fn demo_basic_priority_ordering() {
    println!("\n{}", "=".repeat(60));
    println!("DEMO 1: Basic Priority-Based Scheduling");
    println!("{}", "=".repeat(60));

    let budget = ResourceBudget::new(100, 50.0, 256).unwrap();
    let scheduler = Scheduler::new(budget, "demo1");
    scheduler.start();

    let tasks = [
        ("LOW priority task", TaskPriority::Low),
        ("CRITICAL priority task", TaskPriority::Critical),
        ("NORMAL priority task", TaskPriority::Normal),
        ("HIGH priority task", TaskPriority::High),
    ];

    for (label, priority) in tasks {
        let cost = TaskCost {
            api_calls: 1,
            compute_units: 1.0,
            ..Default::default()
        };
        let id = scheduler
            .schedule(
                api_call_task(label.to_string(), "demo".to_string()),
                priority,
                cost,
                false,
            )
            .unwrap();
        println!("  scheduled {label} as {id}");
    }

    println!("\nqueue status (sorted by priority score):");
    for entry in scheduler.queue_status() {
        println!(
            "  [{}] age: {:?} | api_calls: {}",
            entry.priority, entry.age, entry.cost.api_calls
        );
    }

    println!("\nexecuting (expect CRITICAL -> HIGH -> NORMAL -> LOW):");
    for _ in 0..4 {
        if let Some(Ok(result)) = scheduler.execute_next().await {
            if let Some(s) = result.downcast_ref::<String>() {
                println!("  {s}");
            }
        }
    }

    scheduler.stop().await;
}

async fn demo_budget_exhaustion() {
    println!("\n{}", "=".repeat(60));
    println!("DEMO 2: Budget Exhaustion and Rejection");
    println!("{}", "=".repeat(60));

    let budget = ResourceBudget::new(5, 10.0, 50).unwrap();
    let scheduler = Scheduler::new(budget, "demo2");
    scheduler.start();

    for i in 0..3 {
        let cost = TaskCost {
            api_calls: 3,
            compute_units: 2.0,
            ..Default::default()
        };
        match scheduler.schedule(
            compute_task(format!("task-{i}"), "matrix".to_string()),
            TaskPriority::High,
            cost,
            true,
        ) {
            Ok(id) => println!("  admitted {id}"),
            Err(e) => println!("  rejected task-{i}: {e}"),
        }
    }

    let metrics = scheduler.metrics();
    println!(
        "\nmetrics: queued={} rejected={} tokens_available={:.1}",
        metrics.tasks_queued, metrics.tasks_rejected, metrics.api_tokens_available
    );

    scheduler.stop().await;
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    demo_basic_priority_ordering().await;
    demo_budget_exhaustion().await;
}
