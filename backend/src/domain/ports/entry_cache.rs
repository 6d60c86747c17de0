//! Port abstraction for the read-path entry cache.
//!
//! Cached payloads are serialised JSON values keyed by namespace plus an
//! opaque token. Adapters own expiry; the namespace carries the time to
//! live each class of payload tolerates.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::user::UserId;

/// Expiry for per-user read results.
pub const USER_CACHE_TTL: Duration = Duration::from_secs(30);
/// Expiry for public read results, which tolerate more staleness.
pub const PUBLIC_CACHE_TTL: Duration = Duration::from_secs(60);

/// Payload classes the cache distinguishes.
///
/// Each namespace expires independently and can be purged wholesale
/// without touching the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    /// A single entry read on behalf of a signed-in viewer.
    UserEntry,
    /// A listing of one user's entries for a date or range.
    UserEntries,
    /// A single entry read anonymously.
    PublicEntry,
    /// A page of the public feed.
    PublicList,
}

impl CacheNamespace {
    pub fn ttl(self) -> Duration {
        match self {
            Self::UserEntry | Self::UserEntries => USER_CACHE_TTL,
            Self::PublicEntry | Self::PublicList => PUBLIC_CACHE_TTL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserEntry => "user:entry",
            Self::UserEntries => "user:entries",
            Self::PublicEntry => "pub:entry",
            Self::PublicList => "pub:list",
        }
    }
}

/// A namespaced cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub namespace: CacheNamespace,
    pub token: String,
}

impl CacheKey {
    pub fn new(namespace: CacheNamespace, token: impl Into<String>) -> Self {
        Self {
            namespace,
            token: token.into(),
        }
    }

    /// Key for a single entry viewed by an optional signed-in user.
    ///
    /// The entry token leads so a mutation can purge every viewer's copy
    /// with one prefix sweep.
    pub fn entry_view(viewer: Option<&UserId>, entry_token: &str) -> Self {
        match viewer {
            Some(id) => Self::new(CacheNamespace::UserEntry, format!("{entry_token}:{id}")),
            None => Self::new(CacheNamespace::PublicEntry, entry_token.to_owned()),
        }
    }

    /// Key for a feed page; the filter token is digested because filter
    /// combinations are unbounded.
    pub fn feed_page(filter_token: &str) -> Self {
        Self::new(CacheNamespace::PublicList, digest_token(filter_token))
    }
}

/// Fixed-width digest for unbounded key material.
pub fn digest_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cache port for entry read paths.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntryCache: Send + Sync {
    /// Fetch a live cached payload, if present.
    async fn get(&self, key: &CacheKey) -> Option<Value>;

    /// Store a payload under the namespace's time to live.
    async fn put(&self, key: CacheKey, value: Value);

    /// Drop one key.
    async fn remove(&self, key: &CacheKey);

    /// Drop every key in `namespace` whose token starts with `token_prefix`.
    async fn purge_prefix(&self, namespace: CacheNamespace, token_prefix: &str);

    /// Drop every key in `namespace`.
    async fn purge(&self, namespace: CacheNamespace);
}

/// Cache adapter that stores nothing; reads always miss.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpEntryCache;

#[async_trait]
impl EntryCache for NoOpEntryCache {
    async fn get(&self, _key: &CacheKey) -> Option<Value> {
        None
    }

    async fn put(&self, _key: CacheKey, _value: Value) {}

    async fn remove(&self, _key: &CacheKey) {}

    async fn purge_prefix(&self, _namespace: CacheNamespace, _token_prefix: &str) {}

    async fn purge(&self, _namespace: CacheNamespace) {}
}
