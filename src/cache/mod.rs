// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Memoized render pipeline.
//!
//! [`RenderCache::get_or_render`] returns a cached diagram for a [`Fingerprint`], or runs the
//! supplied render once, however many callers ask for the same fingerprint concurrently.
//!
//! Each render runs on its own task under a timeout, so a caller that goes away does not cancel
//! the render for the others. Successful results are inserted only if no [`RenderCache::clear`]
//! happened since the render started.

mod fingerprint;

use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;

pub use fingerprint::Fingerprint;

use crate::config::EngineConfig;
use crate::render::{RenderError, RenderedDiagram};

pub type RenderResult = Result<Arc<RenderedDiagram>, RenderError>;

type PendingRender = Shared<BoxFuture<'static, RenderResult>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Callers that joined a render already in flight.
    pub coalesced: u64,
    /// Entries pushed out by capacity.
    pub evictions: u64,
    /// Entries dropped on lookup because they outlived the TTL.
    pub expired: u64,
    pub timeouts: u64,
}

struct CachedEntry {
    diagram: Arc<RenderedDiagram>,
    inserted_at: Instant,
}

struct CacheState {
    entries: LruCache<Fingerprint, CachedEntry>,
    /// Fingerprint → (slot id, shared render).
    pending: HashMap<Fingerprint, (u64, PendingRender)>,
    generation: u64,
    next_slot: u64,
    stats: CacheStats,
}

impl CacheState {
    fn lookup(&mut self, fingerprint: &Fingerprint, ttl: Duration) -> Option<Arc<RenderedDiagram>> {
        let fresh = match self.entries.get(fingerprint) {
            None => return None,
            Some(entry) => (entry.inserted_at.elapsed() <= ttl).then(|| Arc::clone(&entry.diagram)),
        };
        if fresh.is_none() {
            self.entries.pop(fingerprint);
            self.stats.expired += 1;
        }
        fresh
    }

    /// Removes the pending render for `fingerprint` if it is still the one started as `slot`.
    fn forget_slot(&mut self, fingerprint: &Fingerprint, slot: u64) {
        if self
            .pending
            .get(fingerprint)
            .is_some_and(|(pending_slot, _)| *pending_slot == slot)
        {
            self.pending.remove(fingerprint);
        }
    }
}

#[derive(Clone)]
pub struct RenderCache {
    state: Arc<Mutex<CacheState>>,
    ttl: Duration,
    timeout: Duration,
}

impl std::fmt::Debug for RenderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RenderCache")
            .field("len", &state.entries.len())
            .field("capacity", &state.entries.cap())
            .field("pending", &state.pending.len())
            .field("generation", &state.generation)
            .field("ttl", &self.ttl)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RenderCache {
    pub fn new(capacity: usize, ttl: Duration, timeout: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Arc::new(Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                pending: HashMap::new(),
                generation: 0,
                next_slot: 0,
                stats: CacheStats::default(),
            })),
            ttl,
            timeout,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.cache_capacity, config.cache_ttl, config.render_timeout)
    }

    /// Returns the cached diagram for `fingerprint`, or renders it.
    ///
    /// `produce` is only called when neither a fresh entry nor an in-flight render exists. It is
    /// called with the cache lock held and must only build the future, not poll it.
    pub async fn get_or_render<F, Fut>(&self, fingerprint: Fingerprint, produce: F) -> RenderResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RenderedDiagram, RenderError>> + Send + 'static,
    {
        let pending = {
            let mut state = self.state.lock();
            if let Some(diagram) = state.lookup(&fingerprint, self.ttl) {
                state.stats.hits += 1;
                tracing::debug!(%fingerprint, "render cache hit");
                return Ok(diagram);
            }

            if let Some((_, pending)) = state.pending.get(&fingerprint) {
                let pending = pending.clone();
                state.stats.coalesced += 1;
                tracing::debug!(%fingerprint, "joining in-flight render");
                pending
            } else {
                state.stats.misses += 1;
                let slot = state.next_slot;
                state.next_slot += 1;
                let task = tokio::spawn(run_render(
                    Arc::clone(&self.state),
                    fingerprint.clone(),
                    slot,
                    state.generation,
                    self.timeout,
                    produce(),
                ));
                let cleanup = (Arc::clone(&self.state), fingerprint.clone());
                let pending = async move {
                    match task.await {
                        Ok(result) => result,
                        Err(err) => {
                            let (state, fingerprint) = cleanup;
                            state.lock().forget_slot(&fingerprint, slot);
                            tracing::warn!(%fingerprint, error = %err, "render task aborted");
                            Err(RenderError::Internal(err.to_string()))
                        }
                    }
                }
                .boxed()
                .shared();
                state.pending.insert(fingerprint.clone(), (slot, pending.clone()));
                tracing::debug!(%fingerprint, slot, "render cache miss");
                pending
            }
        };

        pending.await
    }

    /// Drops every entry and forgets in-flight renders; their results will not be inserted.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let dropped = state.entries.len();
        let forgotten = state.pending.len();
        state.entries.clear();
        state.pending.clear();
        state.generation += 1;
        tracing::info!(dropped, forgotten, generation = state.generation, "render cache cleared");
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.state.lock().entries.contains(fingerprint)
    }

    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats
    }
}

async fn run_render<Fut>(
    state: Arc<Mutex<CacheState>>,
    fingerprint: Fingerprint,
    slot: u64,
    generation: u64,
    timeout: Duration,
    render: Fut,
) -> RenderResult
where
    Fut: Future<Output = Result<RenderedDiagram, RenderError>>,
{
    let result = match tokio::time::timeout(timeout, render).await {
        Ok(Ok(diagram)) => Ok(Arc::new(diagram)),
        Ok(Err(err)) => Err(err),
        Err(_) => Err(RenderError::Timeout(timeout)),
    };

    let mut state = state.lock();
    state.forget_slot(&fingerprint, slot);

    match &result {
        Ok(diagram) if state.generation == generation => {
            let entry = CachedEntry {
                diagram: Arc::clone(diagram),
                inserted_at: Instant::now(),
            };
            if let Some((evicted, _)) = state.entries.push(fingerprint.clone(), entry) {
                if evicted != fingerprint {
                    state.stats.evictions += 1;
                    tracing::debug!(%evicted, "render cache evicted least recently used entry");
                }
            }
        }
        Ok(_) => {
            tracing::debug!(%fingerprint, "render finished after clear; not cached");
        }
        Err(RenderError::Timeout(after)) => {
            state.stats.timeouts += 1;
            tracing::warn!(%fingerprint, ?after, "render timed out");
        }
        Err(err) => {
            tracing::warn!(%fingerprint, error = %err, "render failed");
        }
    }

    result
}
