//! The replay cache: a set of seen hop-tags, bounding each node key to
//! at-most-once packet acceptance.
//!
//! Grounded on `original_source/sphinxmixcrypto/node.py`'s
//! `PacketReplayCacheDict` for the in-memory shape, and the teacher's
//! `storage/cache.rs` `Cache` (`Arc<RwLock<..>>`) for the thread-safe
//! wrapper satisfying the critical-section contract in SPEC_FULL.md 5.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// A 32-byte replay tag, `h_tau(s)`.
pub type ReplayTag = [u8; 32];

/// The operations a replay cache must support.
///
/// `has_seen`/`mark_seen` are exposed individually for callers that already
/// hold an external lock (e.g. the persistent store's own replay log), but
/// `check_and_mark` is what [`crate::sphinx::node::Node::unwrap`] uses: it
/// holds the cache's lock across the check-then-set, making `has_seen ->
/// mark_seen` atomic per tag as SPEC_FULL.md 5's critical-section contract
/// requires.
pub trait ReplayCache: Send + Sync {
    fn has_seen(&self, tag: &ReplayTag) -> bool;
    fn mark_seen(&self, tag: &ReplayTag);
    fn flush(&self);

    /// Atomically checks and marks `tag`: returns `true` if `tag` was already
    /// present (the caller must reject as a replay), `false` if it was newly
    /// inserted by this call.
    fn check_and_mark(&self, tag: &ReplayTag) -> bool;
}

/// A plain in-memory replay cache, suitable for tests and short-lived
/// processes. Not durable across restarts; see
/// [`crate::storage::replay_store`] for a persistent implementation.
#[derive(Default)]
pub struct InMemoryReplayCache {
    seen: Mutex<HashSet<ReplayTag>>,
}

impl InMemoryReplayCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReplayCache for InMemoryReplayCache {
    fn has_seen(&self, tag: &ReplayTag) -> bool {
        self.seen.lock().expect("replay cache lock poisoned").contains(tag)
    }

    fn mark_seen(&self, tag: &ReplayTag) {
        self.check_and_mark(tag);
    }

    fn flush(&self) {
        self.seen.lock().expect("replay cache lock poisoned").clear();
    }

    fn check_and_mark(&self, tag: &ReplayTag) -> bool {
        let mut seen = self.seen.lock().expect("replay cache lock poisoned");
        !seen.insert(*tag)
    }
}

/// Convenience alias for sharing a replay cache across threads without
/// committing callers to a concrete implementation.
pub type SharedReplayCache = Arc<dyn ReplayCache>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_each_tag_once() {
        let cache = InMemoryReplayCache::new();
        let tag = [1u8; 32];
        assert!(!cache.has_seen(&tag));
        cache.mark_seen(&tag);
        assert!(cache.has_seen(&tag));
    }

    #[test]
    fn flush_clears_state() {
        let cache = InMemoryReplayCache::new();
        let tag = [2u8; 32];
        cache.mark_seen(&tag);
        cache.flush();
        assert!(!cache.has_seen(&tag));
    }

    #[test]
    fn check_and_mark_is_atomic_per_tag() {
        let cache = InMemoryReplayCache::new();
        let tag = [3u8; 32];
        assert!(!cache.check_and_mark(&tag), "first call must not report a replay");
        assert!(cache.check_and_mark(&tag), "second call on the same tag must report a replay");
        assert!(cache.has_seen(&tag));
    }

    #[test]
    fn concurrent_check_and_mark_accepts_exactly_once() {
        use std::sync::Arc;
        use std::thread;

        let cache = Arc::new(InMemoryReplayCache::new());
        let tag = [4u8; 32];
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.check_and_mark(&tag))
            })
            .collect();

        let already_seen_count = handles.into_iter().map(|h| h.join().unwrap()).filter(|&was_seen| was_seen).count();
        assert_eq!(already_seen_count, 7, "exactly one of the concurrent calls may be the first to mark the tag");
    }
}
