use crate::event::EventKey;
use parking_lot::Mutex;
use serde::Deserialize;
use std::cmp::{Ordering, Reverse};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BinaryHeap, HashMap};
use std::hash::{Hash, Hasher};

const DEDUP_SHARDS: usize = 64;

/// Configures the deduplication cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// How long an accepted key stays live.
    pub ttl_seconds: u64,
    /// Optional hard bound on total entries; oldest keys are evicted first.
    /// TTL alone bounds growth under normal duplicate load, the cap guards
    /// against adversarial key flooding.
    pub max_entries: Option<usize>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 300,
            max_entries: None,
        }
    }
}

impl DedupConfig {
    pub fn ttl_ms(&self) -> u64 {
        self.ttl_seconds.saturating_mul(1_000)
    }
}

/// Result of the atomic check-and-insert for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupDecision {
    Fresh,
    Duplicate,
}

/// Time-bounded deduplication cache, sharded so unrelated keys never
/// serialize behind one another.
///
/// The invariant: an entry is live iff the key was accepted within the last
/// `ttl_seconds`. Duplicates do not refresh the acceptance timestamp, which
/// bounds memory growth under repeated duplicate storms. Expired entries are
/// reclaimed amortized on insert through a per-shard min-heap; their logical
/// absence holds at every lookup regardless of when the sweep runs.
pub struct DedupCache {
    shards: Vec<Mutex<DedupShard>>,
    ttl_ms: u64,
    shard_cap: Option<usize>,
}

impl DedupCache {
    pub fn new(config: DedupConfig) -> Self {
        let shard_cap = config
            .max_entries
            .map(|max| max.div_ceil(DEDUP_SHARDS).max(1));
        Self {
            shards: (0..DEDUP_SHARDS)
                .map(|_| Mutex::new(DedupShard::default()))
                .collect(),
            ttl_ms: config.ttl_ms(),
            shard_cap,
        }
    }

    /// Atomically classifies `key` as fresh or duplicate at time `now_ms` and
    /// records it on the fresh path.
    ///
    /// Two concurrent calls on a never-before-seen key contend on the shard
    /// lock; exactly one observes `Fresh`.
    pub fn check_and_record(&self, key: &EventKey, now_ms: u64) -> DedupDecision {
        let mut shard = self.shards[self.shard_for(key)].lock();
        if let Some(&accepted_ms) = shard.entries.get(key) {
            let age_ms = now_ms.saturating_sub(accepted_ms);
            if age_ms <= self.ttl_ms {
                return DedupDecision::Duplicate;
            }
            shard.entries.remove(key);
        }
        shard.insert(key.clone(), now_ms);
        shard.evict_expired(now_ms, self.ttl_ms);
        if let Some(cap) = self.shard_cap {
            shard.enforce_cap(cap);
        }
        DedupDecision::Fresh
    }

    /// Number of physically present entries across all shards. Expired keys
    /// not yet swept are counted; callers needing the logical view should
    /// reason through `check_and_record`.
    pub fn occupancy(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().entries.len()).sum()
    }

    fn shard_for(&self, key: &EventKey) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) & (DEDUP_SHARDS - 1)
    }
}

impl std::fmt::Debug for DedupCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupCache")
            .field("ttl_ms", &self.ttl_ms)
            .field("shard_cap", &self.shard_cap)
            .finish()
    }
}

#[derive(Default)]
struct DedupShard {
    entries: HashMap<EventKey, u64>,
    heap: BinaryHeap<Reverse<HeapEntry>>,
}

impl DedupShard {
    fn insert(&mut self, key: EventKey, accepted_ms: u64) {
        self.heap.push(Reverse(HeapEntry {
            accepted_ms,
            key: key.clone(),
        }));
        self.entries.insert(key, accepted_ms);
    }

    fn evict_expired(&mut self, now_ms: u64, ttl_ms: u64) {
        while let Some(oldest) = self.peek_oldest() {
            if now_ms.saturating_sub(oldest.accepted_ms) <= ttl_ms {
                break;
            }
            self.entries.remove(&oldest.key);
            self.heap.pop();
        }
    }

    fn enforce_cap(&mut self, cap: usize) {
        while self.entries.len() > cap {
            match self.peek_oldest() {
                Some(oldest) => {
                    self.entries.remove(&oldest.key);
                    self.heap.pop();
                }
                None => break,
            }
        }
    }

    /// Oldest live heap entry, discarding records for keys that were removed
    /// or re-accepted with a newer timestamp.
    fn peek_oldest(&mut self) -> Option<HeapEntry> {
        loop {
            let Reverse(candidate) = self.heap.peek()?.clone();
            match self.entries.get(&candidate.key) {
                Some(&accepted_ms) if accepted_ms == candidate.accepted_ms => {
                    return Some(candidate);
                }
                _ => {
                    self.heap.pop();
                }
            }
        }
    }
}

#[derive(Clone, Eq, PartialEq)]
struct HeapEntry {
    accepted_ms: u64,
    key: EventKey,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.accepted_ms
            .cmp(&other.accepted_ms)
            .then_with(|| other.key.cmp(&self.key))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
