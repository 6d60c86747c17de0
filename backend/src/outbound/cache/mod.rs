//! In-process TTL cache adapter for entry read paths.
//!
//! A `RwLock`-guarded map per namespace with lazily evicted entries. TTLs
//! carry a small random jitter so a burst of writes does not expire in the
//! same instant and stampede the database on refill.
//!
//! A Redis-backed adapter can replace this behind the same port when the
//! deployment outgrows a single process.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use tracing::warn;

use crate::domain::ports::{CacheKey, CacheNamespace, EntryCache};

/// Jitter added to every TTL, as a fraction of the base duration.
const TTL_JITTER_FRACTION: f64 = 0.1;

struct Slot {
    value: Value,
    expires_at: Instant,
}

/// In-memory TTL cache implementing the `EntryCache` port.
pub struct TtlEntryCache {
    slots: RwLock<HashMap<(CacheNamespace, String), Slot>>,
    rng: RwLock<SmallRng>,
}

impl Default for TtlEntryCache {
    fn default() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            rng: RwLock::new(SmallRng::from_entropy()),
        }
    }
}

impl TtlEntryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn jittered_ttl(&self, base: Duration) -> Duration {
        let factor = match self.rng.write() {
            Ok(mut rng) => rng.gen_range(0.0..TTL_JITTER_FRACTION),
            Err(_) => 0.0,
        };
        base + base.mul_f64(factor)
    }
}

#[async_trait]
impl EntryCache for TtlEntryCache {
    async fn get(&self, key: &CacheKey) -> Option<Value> {
        let slots = match self.slots.read() {
            Ok(slots) => slots,
            Err(poisoned) => {
                warn!("cache lock poisoned on read");
                poisoned.into_inner()
            }
        };
        slots
            .get(&(key.namespace, key.token.clone()))
            .filter(|slot| slot.expires_at > Instant::now())
            .map(|slot| slot.value.clone())
    }

    async fn put(&self, key: CacheKey, value: Value) {
        let ttl = self.jittered_ttl(key.namespace.ttl());
        let Ok(mut slots) = self.slots.write() else {
            warn!("cache lock poisoned on write, dropping payload");
            return;
        };
        // Expired entries are evicted lazily, on the writes that would
        // otherwise let them accumulate.
        let now = Instant::now();
        slots.retain(|_, slot| slot.expires_at > now);
        slots.insert(
            (key.namespace, key.token),
            Slot {
                value,
                expires_at: now + ttl,
            },
        );
    }

    async fn remove(&self, key: &CacheKey) {
        if let Ok(mut slots) = self.slots.write() {
            slots.remove(&(key.namespace, key.token.clone()));
        }
    }

    async fn purge_prefix(&self, namespace: CacheNamespace, token_prefix: &str) {
        if let Ok(mut slots) = self.slots.write() {
            slots.retain(|(ns, token), _| *ns != namespace || !token.starts_with(token_prefix));
        }
    }

    async fn purge(&self, namespace: CacheNamespace) {
        if let Ok(mut slots) = self.slots.write() {
            slots.retain(|(ns, _), _| *ns != namespace);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(namespace: CacheNamespace, token: &str) -> CacheKey {
        CacheKey::new(namespace, token)
    }

    #[tokio::test]
    async fn round_trips_within_ttl() {
        let cache = TtlEntryCache::new();
        cache
            .put(key(CacheNamespace::PublicEntry, "e1"), json!({"id": "e1"}))
            .await;
        let hit = cache.get(&key(CacheNamespace::PublicEntry, "e1")).await;
        assert_eq!(hit, Some(json!({"id": "e1"})));
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let cache = TtlEntryCache::new();
        cache
            .put(key(CacheNamespace::PublicEntry, "tok"), json!(1))
            .await;
        assert!(cache.get(&key(CacheNamespace::UserEntry, "tok")).await.is_none());
    }

    #[tokio::test]
    async fn prefix_purge_only_hits_matching_tokens() {
        let cache = TtlEntryCache::new();
        cache
            .put(key(CacheNamespace::UserEntry, "e1:viewer-a"), json!(1))
            .await;
        cache
            .put(key(CacheNamespace::UserEntry, "e1:viewer-b"), json!(2))
            .await;
        cache
            .put(key(CacheNamespace::UserEntry, "e2:viewer-a"), json!(3))
            .await;

        cache.purge_prefix(CacheNamespace::UserEntry, "e1:").await;

        assert!(cache
            .get(&key(CacheNamespace::UserEntry, "e1:viewer-a"))
            .await
            .is_none());
        assert!(cache
            .get(&key(CacheNamespace::UserEntry, "e1:viewer-b"))
            .await
            .is_none());
        assert!(cache
            .get(&key(CacheNamespace::UserEntry, "e2:viewer-a"))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn whole_namespace_purge_leaves_others() {
        let cache = TtlEntryCache::new();
        cache.put(key(CacheNamespace::PublicList, "p1"), json!(1)).await;
        cache.put(key(CacheNamespace::PublicEntry, "e1"), json!(2)).await;

        cache.purge(CacheNamespace::PublicList).await;

        assert!(cache.get(&key(CacheNamespace::PublicList, "p1")).await.is_none());
        assert!(cache.get(&key(CacheNamespace::PublicEntry, "e1")).await.is_some());
    }

    #[tokio::test]
    async fn remove_drops_one_key() {
        let cache = TtlEntryCache::new();
        cache.put(key(CacheNamespace::PublicEntry, "e1"), json!(1)).await;
        cache.remove(&key(CacheNamespace::PublicEntry, "e1")).await;
        assert!(cache.get(&key(CacheNamespace::PublicEntry, "e1")).await.is_none());
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let cache = TtlEntryCache::new();
        let base = Duration::from_secs(30);
        for _ in 0..100 {
            let ttl = cache.jittered_ttl(base);
            assert!(ttl >= base);
            assert!(ttl <= base + base.mul_f64(TTL_JITTER_FRACTION));
        }
    }
}
