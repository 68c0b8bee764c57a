//! Bounded LRU cache for constructed agents.
//!
//! Agents encapsulate connection-pooling state, not per-request state,
//! so once built for a given configuration fingerprint they are reused
//! indefinitely. The cache is owned by whatever long-lived client
//! object the application constructs and is passed into resolution
//! calls; it is not process-global state.

use crate::agent::Agent;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Default maximum number of cached agents.
pub const DEFAULT_AGENT_CACHE_SIZE: usize = 50;

struct CacheEntry {
    agent: Arc<Agent>,
    last_used: u64,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    // Monotonic recency clock; bumped on every hit and insert.
    clock: u64,
}

/// A bounded least-recently-used cache of agents keyed by configuration
/// fingerprint.
///
/// Lookups promote the entry to most-recently-used; inserting past
/// capacity evicts the least-recently-used entry. Entries are never
/// explicitly invalidated.
///
/// Concurrent callers racing on the same fingerprint may both build an
/// agent; the loser's result simply overwrites the winner's (last write
/// wins). Exactly-once construction is not guaranteed and not needed.
pub struct AgentCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl AgentCache {
    /// Create a cache with [`DEFAULT_AGENT_CACHE_SIZE`] capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_AGENT_CACHE_SIZE)
    }

    /// Create a cache holding at most `capacity` agents.
    pub fn with_capacity(capacity: usize) -> Self {
        AgentCache {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                clock: 0,
            }),
            capacity: capacity.max(1),
        }
    }

    /// Fetch the agent for a fingerprint, building and caching it on a
    /// miss.
    pub fn get_or_build<F>(&self, key: &str, build: F) -> Arc<Agent>
    where
        F: FnOnce() -> Arc<Agent>,
    {
        if let Some(agent) = self.get(key) {
            debug!("agent cache hit");
            return agent;
        }
        // Built outside the lock; a concurrent builder for the same key
        // is tolerated and the last insert wins.
        let agent = build();
        self.insert(key, agent.clone());
        agent
    }

    /// Look up an agent, promoting it to most-recently-used.
    pub fn get(&self, key: &str) -> Option<Arc<Agent>> {
        let mut inner = self.lock();
        inner.clock += 1;
        let clock = inner.clock;
        let entry = inner.entries.get_mut(key)?;
        entry.last_used = clock;
        Some(entry.agent.clone())
    }

    /// Look up an agent without touching its recency.
    pub fn peek(&self, key: &str) -> Option<Arc<Agent>> {
        let inner = self.lock();
        inner.entries.get(key).map(|entry| entry.agent.clone())
    }

    /// Insert an agent, evicting the least-recently-used entry when the
    /// cache is full.
    pub fn insert(&self, key: &str, agent: Arc<Agent>) {
        let mut inner = self.lock();
        inner.clock += 1;
        let clock = inner.clock;

        if !inner.entries.contains_key(key) && inner.entries.len() >= self.capacity {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                debug!("agent cache full, evicting least recently used entry");
                inner.entries.remove(&oldest);
            }
        }

        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                agent,
                last_used: clock,
            },
        );
    }

    /// Number of cached agents.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached agents.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        // A panic while holding the lock leaves the map intact, so a
        // poisoned lock is still safe to use.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AgentCache {
    fn default() -> Self {
        Self::new()
    }
}
