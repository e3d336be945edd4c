// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! The priority queue: a min-heap keyed by frozen `priority_score`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::task::ScheduledTask;

/// Newtype giving `ScheduledTask` a min-heap ordering over `std::BinaryHeap`
/// (which is a max-heap by default): the task with the *lowest*
/// `priority_score` compares as the greatest, so it surfaces at the top.
///
/// Scores are always finite here — `TaskCost` dimensions are validated
/// non-negative before a task is built, and priority/age terms are bounded
/// or monotonic — so falling back to `Ordering::Equal` on an unorderable
/// comparison never actually triggers in practice; it exists only so a
/// stray NaN can't panic the heap.
struct HeapEntry(ScheduledTask);

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.0.priority_score == other.0.priority_score
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .priority_score
            .partial_cmp(&self.0.priority_score)
            .unwrap_or(Ordering::Equal)
    }
}

/// Priority queue of pending tasks, ordered by frozen `priority_score`.
#[derive(Default)]
pub(crate) struct PriorityQueue {
    heap: BinaryHeap<HeapEntry>,
}

impl PriorityQueue {
    pub(crate) fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub(crate) fn push(&mut self, task: ScheduledTask) {
        self.heap.push(HeapEntry(task));
    }

    pub(crate) fn pop(&mut self) -> Option<ScheduledTask> {
        self.heap.pop().map(|entry| entry.0)
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Read-only iteration in arbitrary order, for introspection
    /// (`get_queue_status`) without mutating the heap.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &ScheduledTask> {
        self.heap.iter().map(|entry| &entry.0)
    }
}
