//! Context resolution helpers: each function returns the first
//! non-empty source in its documented precedence order.

use crate::caches::{AccountCache, NamespaceCache};
use crate::config::{Config, DeletionPolicy};
use ackr_types::{ManagedResource, SessionContext};
use kube::ResourceExt;
use std::time::Duration;

/// CR annotation carrying an explicit region override.
pub const ANNOTATION_REGION: &str = "services.k8s.aws/region";

/// CR annotation carrying an explicit deletion-policy override.
pub const ANNOTATION_DELETION_POLICY: &str = "services.k8s.aws/deletion-policy";

/// CR annotation marking a resource as observe-only adopted.
pub const ANNOTATION_ADOPTED: &str = "services.k8s.aws/adopted";

/// Fallback resync period when nothing more specific applies: 10 hours.
const DEFAULT_RESYNC_SECONDS: u64 = 36_000;

/// Short requeue delay applied after a reconcile ends `Synced=False`.
pub const DEFAULT_OUT_OF_SYNC_DELAY: Duration = Duration::from_secs(15);

pub fn resolve_account_id<K>(res: &K, namespaces: &dyn NamespaceCache, config: &Config) -> String
where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
{
    if let Some(account_id) = res
        .status()
        .and_then(|s| ackr_types::ResourceStatus::ack_resource_metadata(s))
        .and_then(|m| m.owner_account_id.clone())
    {
        return account_id;
    }
    if let Some(account_id) = res
        .meta()
        .namespace
        .as_deref()
        .and_then(|ns| namespaces.lookup(ns))
        .and_then(|ns| ns.account_id)
    {
        return account_id;
    }
    config.default_account_id.clone().unwrap_or_default()
}

pub fn resolve_role_arn(account_id: &str, accounts: &dyn AccountCache) -> String {
    accounts
        .lookup(account_id)
        .and_then(|a| a.role_arn)
        .unwrap_or_default()
}

pub fn resolve_region<K>(res: &K, namespaces: &dyn NamespaceCache, config: &Config) -> String
where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
{
    if let Some(region) = res
        .status()
        .and_then(|s| ackr_types::ResourceStatus::ack_resource_metadata(s))
        .and_then(|m| m.region.clone())
    {
        return region;
    }
    if let Some(region) = res.annotations().get(ANNOTATION_REGION) {
        return region.clone();
    }
    if let Some(region) = res
        .meta()
        .namespace
        .as_deref()
        .and_then(|ns| namespaces.lookup(ns))
        .and_then(|ns| ns.region)
    {
        return region;
    }
    config.default_region.clone()
}

pub fn resolve_endpoint_url(
    namespace: &str,
    namespaces: &dyn NamespaceCache,
    config: &Config,
) -> Option<String> {
    if let Some(endpoint) = namespaces.lookup(namespace).and_then(|ns| ns.endpoint_url) {
        return Some(endpoint);
    }
    config.default_endpoint_url.clone()
}

pub fn resolve_deletion_policy<K>(
    res: &K,
    service_alias: &str,
    namespaces: &dyn NamespaceCache,
    config: &Config,
) -> DeletionPolicy
where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
{
    if let Some(raw) = res.annotations().get(ANNOTATION_DELETION_POLICY) {
        if let Ok(policy) = raw.parse() {
            return policy;
        }
    }
    if let Some(raw) = res
        .meta()
        .namespace
        .as_deref()
        .and_then(|ns| namespaces.lookup(ns))
        .and_then(|ns| ns.deletion_policy_by_service.get(service_alias).cloned())
    {
        if let Ok(policy) = raw.parse() {
            return policy;
        }
    }
    config.default_deletion_policy
}

pub fn resolve_resync_period(kind: &str, rmf_requeue_seconds: Option<u64>, config: &Config) -> Duration {
    if let Some(seconds) = config.resource_resync_seconds.get(kind) {
        return Duration::from_secs(*seconds);
    }
    if let Some(seconds) = rmf_requeue_seconds {
        return Duration::from_secs(seconds);
    }
    let seconds = if config.default_resync_seconds > 0 {
        config.default_resync_seconds
    } else {
        DEFAULT_RESYNC_SECONDS
    };
    Duration::from_secs(seconds)
}

/// Whether `res` carries the observe-only-adopted annotation.
pub fn is_adopted<K>(res: &K) -> bool
where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
{
    res.annotations()
        .get(ANNOTATION_ADOPTED)
        .map(|v| v == "true")
        .unwrap_or(false)
}

/// Builds the [`SessionContext`] for one reconcile call from the
/// individually-resolved facets.
pub fn build_session_context(
    account_id: String,
    region: String,
    endpoint_url: Option<String>,
    role_arn: String,
    group_kind: ackr_types::GroupKind,
) -> SessionContext {
    SessionContext {
        account_id,
        region,
        endpoint_url,
        role_arn: if role_arn.is_empty() {
            None
        } else {
            Some(role_arn)
        },
        group_kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caches::{InMemoryAccountCache, InMemoryNamespaceCache, NamespaceOverrides};

    #[test]
    fn resync_precedence_prefers_per_kind_config() {
        let mut config = Config {
            default_account_id: None,
            default_region: "us-east-1".into(),
            default_endpoint_url: None,
            default_deletion_policy: DeletionPolicy::Delete,
            default_resync_seconds: 100,
            resource_resync_seconds: Default::default(),
        };
        config
            .resource_resync_seconds
            .insert("Bucket".into(), 30);
        assert_eq!(
            resolve_resync_period("Bucket", Some(999), &config),
            Duration::from_secs(30)
        );
        assert_eq!(
            resolve_resync_period("Topic", Some(999), &config),
            Duration::from_secs(999)
        );
        assert_eq!(
            resolve_resync_period("Topic", None, &config),
            Duration::from_secs(100)
        );
    }

    #[test]
    fn role_arn_defaults_to_empty() {
        let accounts = InMemoryAccountCache::new();
        assert_eq!(resolve_role_arn("1234", &accounts), "");
    }

    #[test]
    fn is_adopted_reads_annotation() {
        use crate::bucket::{Bucket, BucketSpec};
        use kube::ResourceExt;

        let mut res = Bucket::test_new("x", BucketSpec { name: "x".into(), size: 1, encryption_key_ref: None });
        assert!(!is_adopted(&res));
        res.annotations_mut()
            .insert(ANNOTATION_ADOPTED.to_owned(), "true".to_owned());
        assert!(is_adopted(&res));
    }

    #[test]
    fn endpoint_falls_back_to_config_default() {
        let namespaces = InMemoryNamespaceCache::new();
        let config = Config {
            default_account_id: None,
            default_region: "us-east-1".into(),
            default_endpoint_url: Some("https://example.com".into()),
            default_deletion_policy: DeletionPolicy::Delete,
            default_resync_seconds: 100,
            resource_resync_seconds: Default::default(),
        };
        assert_eq!(
            resolve_endpoint_url("default", &namespaces, &config),
            Some("https://example.com".into())
        );
        namespaces.set(
            "default",
            NamespaceOverrides {
                endpoint_url: Some("https://override.example.com".into()),
                ..Default::default()
            },
        );
        assert_eq!(
            resolve_endpoint_url("default", &namespaces, &config),
            Some("https://override.example.com".into())
        );
    }
}
