// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-windowed message id deduplication.
//!
//! The guard remembers every message id it has seen together with the time
//! it was first seen. Ids younger than the window are duplicates; older ones
//! may be processed again and are dropped by the periodic sweep.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use zapbridge_core::{DedupKey, TenantId};

/// Concurrent set of recently seen message ids.
#[derive(Debug)]
pub struct DedupGuard {
    seen: DashMap<DedupKey, Instant>,
    window: Duration,
}

impl DedupGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            seen: DashMap::new(),
            window,
        }
    }

    /// Key for a message id, scoped to the tenant that saw it.
    pub fn key(tenant: &TenantId, message_id: &str) -> DedupKey {
        format!("{tenant}:{message_id}")
    }

    /// Atomically records `key`; returns `true` only for the first sighting
    /// within the window.
    pub fn check_and_insert(&self, key: DedupKey) -> bool {
        let now = Instant::now();
        match self.seen.entry(key) {
            Entry::Occupied(mut entry) => {
                if now.duration_since(*entry.get()) >= self.window {
                    entry.insert(now);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }

    /// Records `key` unconditionally, restarting its window.
    pub fn mark(&self, key: DedupKey) {
        self.seen.insert(key, Instant::now());
    }

    /// Whether `key` was seen within the window.
    pub fn contains(&self, key: &str) -> bool {
        self.seen
            .get(key)
            .is_some_and(|seen| seen.elapsed() < self.window)
    }

    /// Removes expired entries, returning how many were dropped.
    pub fn sweep(&self) -> usize {
        let before = self.seen.len();
        let window = self.window;
        self.seen.retain(|_, seen| seen.elapsed() < window);
        let removed = before.saturating_sub(self.seen.len());
        if removed > 0 {
            debug!(removed, remaining = self.seen.len(), "dedup sweep");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Runs [`sweep`](Self::sweep) every `interval` until `cancel` fires.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let guard = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("dedup sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        guard.sweep();
                    }
                }
            }
        })
    }
}
