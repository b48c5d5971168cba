use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::db::types::UserRole;

/// Process-wide role policy cache. Role grant sets are low-churn and read on
/// every administrative request, so they are kept in memory for a fixed TTL
/// and dropped eagerly when an administrator edits a role's grants. Per-user
/// overrides are never cached here; callers read those fresh.
#[derive(Clone)]
pub(crate) struct PolicyCache {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<UserRole, CacheEntry>>>,
}

struct CacheEntry {
    codes: HashSet<String>,
    refreshed_at: Instant,
}

impl PolicyCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Returns the cached grant set, or `None` when the entry is absent or
    /// past its TTL. Expired entries are left in place; the next `store`
    /// overwrites them.
    pub(crate) async fn get(&self, role: UserRole) -> Option<HashSet<String>> {
        let entries = self.entries.read().await;
        let entry = entries.get(&role)?;
        if entry.refreshed_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.codes.clone())
    }

    pub(crate) async fn store(&self, role: UserRole, codes: HashSet<String>) {
        let mut entries = self.entries.write().await;
        entries.insert(role, CacheEntry { codes, refreshed_at: Instant::now() });
    }

    pub(crate) async fn invalidate(&self, role: UserRole) {
        let mut entries = self.entries.write().await;
        entries.remove(&role);
    }

    pub(crate) async fn invalidate_all(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(values: &[&str]) -> HashSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[tokio::test]
    async fn stored_entry_is_served_within_ttl() {
        let cache = PolicyCache::new(Duration::from_secs(300));
        cache.store(UserRole::Manager, codes(&["exam:create"])).await;

        let cached = cache.get(UserRole::Manager).await.expect("cached entry");
        assert!(cached.contains("exam:create"));
        assert!(cache.get(UserRole::Student).await.is_none());
    }

    #[tokio::test]
    async fn entry_expires_after_ttl() {
        let cache = PolicyCache::new(Duration::from_millis(1));
        cache.store(UserRole::Manager, codes(&["exam:create"])).await;

        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(cache.get(UserRole::Manager).await.is_none());
    }

    #[tokio::test]
    async fn cached_entry_masks_later_store_changes_until_invalidated() {
        let cache = PolicyCache::new(Duration::from_secs(300));
        cache.store(UserRole::Manager, codes(&["exam:create"])).await;

        // Storage-side edits are invisible until someone invalidates.
        let first = cache.get(UserRole::Manager).await.expect("cached entry");
        let second = cache.get(UserRole::Manager).await.expect("cached entry");
        assert_eq!(first, second);

        cache.invalidate(UserRole::Manager).await;
        assert!(cache.get(UserRole::Manager).await.is_none());
    }

    #[tokio::test]
    async fn invalidate_all_clears_every_role() {
        let cache = PolicyCache::new(Duration::from_secs(300));
        cache.store(UserRole::Manager, codes(&["exam:create"])).await;
        cache.store(UserRole::Student, codes(&[])).await;

        cache.invalidate_all().await;

        assert!(cache.get(UserRole::Manager).await.is_none());
        assert!(cache.get(UserRole::Student).await.is_none());
    }
}
