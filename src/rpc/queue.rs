// Copyright 2025 the Airstroke Authors
// SPDX-License-Identifier: Apache-2.0

//! Pending-request queue with timeout-driven retries.
//!
//! The transport enqueues every request it sends and dequeues on
//! acknowledgment. A periodic `tick` (driven by whatever timer the
//! embedding app has) returns the requests whose timeout elapsed and
//! whose retry budget remains; requests past the budget are dropped
//! with a warning and never reported back — the engine keeps its
//! optimistic local state either way.
//!
//! The queue never schedules anything itself: time comes in through
//! the `now` arguments, which keeps the engine synchronous and the
//! retry logic deterministic under test.

use crate::rpc::RequestSchema;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A queued request with retry bookkeeping.
#[derive(Debug, Clone)]
struct QueuedRequest {
    request: RequestSchema,
    timestamp: Instant,
    retry_count: u32,
}

/// Queue of requests awaiting acknowledgment.
#[derive(Debug)]
pub struct RequestQueue {
    pending: HashMap<Uuid, QueuedRequest>,
    timeout: Duration,
    max_retries: u32,
}

impl RequestQueue {
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self {
            pending: HashMap::new(),
            timeout,
            max_retries,
        }
    }

    /// Track a request that was just sent.
    pub fn enqueue(&mut self, request: RequestSchema, now: Instant) {
        self.pending.insert(
            request.id,
            QueuedRequest {
                request,
                timestamp: now,
                retry_count: 0,
            },
        );
    }

    /// Stop tracking a request (its acknowledgment arrived).
    pub fn dequeue(&mut self, request_id: Uuid) {
        self.pending.remove(&request_id);
    }

    pub fn contains(&self, request_id: Uuid) -> bool {
        self.pending.contains_key(&request_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Collect the requests due for another send.
    ///
    /// Every pending request whose timeout elapsed either comes back
    /// for resending (retry count bumped, timestamp reset) or — once
    /// its retries are spent — is dropped.
    pub fn tick(&mut self, now: Instant) -> Vec<RequestSchema> {
        let mut to_retry = Vec::new();
        let mut to_drop = Vec::new();

        for (id, queued) in &mut self.pending {
            if now.saturating_duration_since(queued.timestamp) < self.timeout {
                continue;
            }
            if queued.retry_count < self.max_retries {
                queued.retry_count += 1;
                queued.timestamp = now;
                tracing::debug!(
                    request = %id,
                    attempt = queued.retry_count,
                    max = self.max_retries,
                    "retrying request"
                );
                to_retry.push(queued.request.clone());
            } else {
                to_drop.push(*id);
            }
        }

        for id in to_drop {
            tracing::warn!(request = %id, "request exceeded max retries, dropping");
            self.pending.remove(&id);
        }

        to_retry
    }
}
