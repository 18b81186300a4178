//! Namespace cache (`NSC`) and account cache (`AC`): read-only lookup
//! tables consulted by the context-resolution helpers in `context.rs`.
//! Both are populated by collaborators outside the reconciliation core —
//! here, plain in-memory maps refreshed by whatever process owns them.

use std::collections::HashMap;
use std::sync::RwLock;

/// Per-namespace overrides. Any field left `None` falls through to the
/// next entry in the precedence chain.
#[derive(Debug, Clone, Default)]
pub struct NamespaceOverrides {
    pub account_id: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    /// Deletion policy override, scoped by service alias (e.g. "s3").
    pub deletion_policy_by_service: HashMap<String, String>,
}

/// Read-only view consulted by the core; writers live outside it.
pub trait NamespaceCache: Send + Sync {
    fn lookup(&self, namespace: &str) -> Option<NamespaceOverrides>;
}

/// Per-account overrides, presently limited to the assumable role ARN.
#[derive(Debug, Clone, Default)]
pub struct AccountOverrides {
    pub role_arn: Option<String>,
}

pub trait AccountCache: Send + Sync {
    fn lookup(&self, account_id: &str) -> Option<AccountOverrides>;
}

/// In-memory [`NamespaceCache`] backed by a `RwLock<HashMap>`. Production
/// wiring refreshes it from a `Namespace` informer; tests populate it
/// directly.
#[derive(Default)]
pub struct InMemoryNamespaceCache {
    entries: RwLock<HashMap<String, NamespaceOverrides>>,
}

impl InMemoryNamespaceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, namespace: &str, overrides: NamespaceOverrides) {
        self.entries
            .write()
            .unwrap()
            .insert(namespace.to_owned(), overrides);
    }
}

impl NamespaceCache for InMemoryNamespaceCache {
    fn lookup(&self, namespace: &str) -> Option<NamespaceOverrides> {
        self.entries.read().unwrap().get(namespace).cloned()
    }
}

/// In-memory [`AccountCache`], refreshed from wherever role-ARN mappings
/// are sourced (e.g. a ConfigMap or a credentials broker).
#[derive(Default)]
pub struct InMemoryAccountCache {
    entries: RwLock<HashMap<String, AccountOverrides>>,
}

impl InMemoryAccountCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, account_id: &str, overrides: AccountOverrides) {
        self.entries
            .write()
            .unwrap()
            .insert(account_id.to_owned(), overrides);
    }
}

impl AccountCache for InMemoryAccountCache {
    fn lookup(&self, account_id: &str) -> Option<AccountOverrides> {
        self.entries.read().unwrap().get(account_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_cache_roundtrip() {
        let cache = InMemoryNamespaceCache::new();
        cache.set(
            "team-a",
            NamespaceOverrides {
                region: Some("eu-west-1".into()),
                ..Default::default()
            },
        );
        assert_eq!(
            cache.lookup("team-a").unwrap().region.as_deref(),
            Some("eu-west-1")
        );
        assert!(cache.lookup("team-b").is_none());
    }

    #[test]
    fn account_cache_roundtrip() {
        let cache = InMemoryAccountCache::new();
        cache.set(
            "1234",
            AccountOverrides {
                role_arn: Some("arn:aws:iam::1234:role/ack".into()),
            },
        );
        assert_eq!(
            cache.lookup("1234").unwrap().role_arn.as_deref(),
            Some("arn:aws:iam::1234:role/ack")
        );
    }
}
