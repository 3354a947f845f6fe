//! Per-(user, merchant) memo of classification results
//!
//! Bounded, least-recently-used eviction. Safe to share across tasks; the
//! last writer for a key wins.
//!
//! Each user has a generation that moves on every invalidation. Writers read
//! it before classifying and store only if it is unchanged, so a result
//! computed against a category set that has since changed is never kept.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::models::ClassificationSuggestion;

/// Default number of cached (user, merchant) entries
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

type CacheKey = (i64, String);

struct CacheEntry {
    value: ClassificationSuggestion,
    last_used: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    /// Monotonic access counter used for recency
    tick: u64,
    /// Invalidation counter shared by all users
    epoch: u64,
    /// Epoch of each user's latest invalidation
    invalidated: HashMap<i64, u64>,
    /// Epoch of the latest full clear
    cleared: u64,
}

impl CacheState {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn next_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    fn generation(&self, user_id: i64) -> u64 {
        self.invalidated
            .get(&user_id)
            .copied()
            .unwrap_or(0)
            .max(self.cleared)
    }
}

/// Classification cache keyed by user id and normalized merchant
pub struct ClassificationCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl Default for ClassificationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ClassificationCache {
    /// Create a cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // A panic while holding the lock cannot leave an entry half-written
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up a cached result, marking it as recently used
    pub fn get(&self, user_id: i64, merchant: &str) -> Option<ClassificationSuggestion> {
        let mut state = self.lock();
        let tick = state.next_tick();
        let entry = state.entries.get_mut(&(user_id, merchant.to_string()))?;
        entry.last_used = tick;
        Some(entry.value.clone())
    }

    /// Current generation of a user's entries
    pub fn generation(&self, user_id: i64) -> u64 {
        self.lock().generation(user_id)
    }

    /// Store a result, evicting the least recently used entry when full
    pub fn insert(&self, user_id: i64, merchant: &str, value: ClassificationSuggestion) {
        let mut state = self.lock();
        Self::store(&mut state, self.capacity, user_id, merchant, value);
    }

    /// Store a result only if the user's generation is still `generation`
    ///
    /// Returns false when the entry was dropped as stale.
    pub fn insert_if_current(
        &self,
        user_id: i64,
        merchant: &str,
        value: ClassificationSuggestion,
        generation: u64,
    ) -> bool {
        let mut state = self.lock();
        if state.generation(user_id) != generation {
            return false;
        }
        Self::store(&mut state, self.capacity, user_id, merchant, value);
        true
    }

    fn store(
        state: &mut CacheState,
        capacity: usize,
        user_id: i64,
        merchant: &str,
        value: ClassificationSuggestion,
    ) {
        let tick = state.next_tick();
        let key = (user_id, merchant.to_string());

        if !state.entries.contains_key(&key) && state.entries.len() >= capacity {
            let victim = state
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            if let Some(victim) = victim {
                state.entries.remove(&victim);
            }
        }

        state.entries.insert(
            key,
            CacheEntry {
                value,
                last_used: tick,
            },
        );
    }

    /// Drop every entry for one user (their category set changed)
    pub fn invalidate_user(&self, user_id: i64) {
        let mut state = self.lock();
        let epoch = state.next_epoch();
        state.invalidated.insert(user_id, epoch);
        state.entries.retain(|(uid, _), _| *uid != user_id);
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        let epoch = state.next_epoch();
        state.cleared = epoch;
        state.invalidated.clear();
        state.entries.clear();
    }
}
