use super::cloud::{FakeCloud, FakeCloudError};
use super::types::Bucket;
use ackr_types::{
    CloudSession, Delta, DirectApiReader, ReconcileError, ResourceManager, ResourceManagerFactory,
    SecretResolver, SessionContext,
};
use async_trait::async_trait;
use kube::ResourceExt;
use std::sync::Arc;
use std::time::Duration;

fn cloud_key(res: &Bucket) -> String {
    format!("{}/{}", res.namespace().unwrap_or_default(), res.name_any())
}

/// `RM` for [`Bucket`], backed by a [`FakeCloud`] session.
pub struct BucketManager {
    cloud: Arc<FakeCloud>,
    secrets: Arc<dyn SecretResolver>,
}

#[async_trait]
impl ResourceManager<Bucket> for BucketManager {
    async fn resolve_references<AR: DirectApiReader + Sync>(
        &self,
        _reader: &AR,
        res: &Bucket,
    ) -> Result<Bucket, ReconcileError> {
        // Buckets carry no cross-resource pointers; resolution is the
        // identity, except for decrypting an encryption key reference
        // (kept in Spec rather than a separate secret-bound field, so
        // nothing here needs to write it back).
        if let Some(secret_ref) = &res.spec.encryption_key_ref {
            let namespace = res.namespace().unwrap_or_else(|| "default".into());
            self.secrets.resolve(secret_ref, &namespace).await?;
        }
        Ok(res.clone())
    }

    async fn ensure_tags(&self, res: &mut Bucket) -> Result<(), ReconcileError> {
        res.annotations_mut()
            .entry("ackr.example.com/managed-by".to_owned())
            .or_insert_with(|| "ackr-operator".to_owned());
        Ok(())
    }

    async fn read_one(&self, res: &Bucket) -> Result<Bucket, ReconcileError> {
        let bucket = self
            .cloud
            .read(&cloud_key(res))
            .map_err(|err| match err {
                FakeCloudError::NotFound => ReconcileError::NotFound,
                FakeCloudError::Throttled => ReconcileError::Generic("throttled".into()),
            })?;
        let mut latest = res.clone();
        let status = latest.status.get_or_insert_with(Default::default);
        status.observed_size = Some(bucket.size);
        status.ack_resource_metadata = Some(ackr_types::AckResourceMetadata {
            owner_account_id: status
                .ack_resource_metadata
                .as_ref()
                .and_then(|m| m.owner_account_id.clone()),
            region: status
                .ack_resource_metadata
                .as_ref()
                .and_then(|m| m.region.clone()),
            arn: Some(bucket.arn),
        });
        Ok(latest)
    }

    async fn create(&self, desired: &Bucket) -> Result<Bucket, ReconcileError> {
        let bucket = self
            .cloud
            .create(&cloud_key(desired), &desired.spec.name, desired.spec.size);
        let mut latest = desired.clone();
        let status = latest.status.get_or_insert_with(Default::default);
        status.ack_resource_metadata = Some(ackr_types::AckResourceMetadata {
            arn: Some(bucket.arn),
            ..Default::default()
        });
        Ok(latest)
    }

    async fn update(
        &self,
        desired: &Bucket,
        latest: &Bucket,
        _delta: &Delta,
    ) -> Result<Bucket, ReconcileError> {
        let bucket = self
            .cloud
            .update(&cloud_key(desired), desired.spec.size)
            .map_err(|_| ReconcileError::NotFound)?;
        let mut updated = latest.clone();
        let status = updated.status.get_or_insert_with(Default::default);
        status.observed_size = Some(bucket.size);
        Ok(updated)
    }

    async fn delete(&self, res: &Bucket) -> Result<Bucket, ReconcileError> {
        self.cloud.delete(&cloud_key(res)).map_err(|err| match err {
            FakeCloudError::NotFound => ReconcileError::NotFound,
            FakeCloudError::Throttled => ReconcileError::Generic("throttled".into()),
        })?;
        if self.cloud.contains(&cloud_key(res)) {
            // `async_delete` mode: deletion was requested but the backing
            // resource is still draining.
            return Err(ReconcileError::RequeueNeededAfter {
                duration: Duration::from_secs(5),
                cause: Some("deletion in progress".into()),
            });
        }
        Ok(res.clone())
    }

    async fn late_initialize(&self, _latest: &mut Bucket) -> Result<(), ReconcileError> {
        Ok(())
    }

    async fn is_synced(&self, res: &Bucket) -> Result<bool, ReconcileError> {
        let observed = res.status.as_ref().and_then(|s| s.observed_size);
        Ok(observed == Some(res.spec.size))
    }
}

/// `RMF` for [`Bucket`]: wraps the [`CloudSession`] handed in by the
/// reconciler, downcasting it back to the concrete `Arc<FakeCloud>` this
/// demo's [`super::service::BucketServiceController`] constructs.
#[derive(Default)]
pub struct BucketManagerFactory;

#[async_trait]
impl ResourceManagerFactory<Bucket> for BucketManagerFactory {
    type Manager = BucketManager;

    async fn manager_for(
        &self,
        _ctx: &SessionContext,
        session: CloudSession,
        secrets: Arc<dyn SecretResolver>,
    ) -> Result<Self::Manager, ReconcileError> {
        let cloud = session
            .downcast_ref::<Arc<FakeCloud>>()
            .ok_or_else(|| ReconcileError::Generic("session is not a FakeCloud session".into()))?
            .clone();
        Ok(BucketManager { cloud, secrets })
    }

    fn requeue_on_success_seconds(&self) -> Option<u64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::descriptor::BucketDescriptor;
    use crate::bucket::types::BucketSpec;
    use crate::cluster::fake::FakeCluster;
    use ackr_types::ResourceDescriptor;

    fn manager(cloud: Arc<FakeCloud>) -> BucketManager {
        BucketManager {
            cloud,
            secrets: Arc::new(FakeCluster::new()),
        }
    }

    fn bucket(size: u32) -> Bucket {
        Bucket::test_new(
            "x",
            BucketSpec {
                name: "x".into(),
                size,
                encryption_key_ref: None,
            },
        )
    }

    /// Scenario 1, "Create from empty": no cloud resource present yet.
    #[tokio::test]
    async fn create_from_empty() {
        let cloud = Arc::new(FakeCloud::new());
        let rm = manager(cloud.clone());
        let desired = bucket(10);

        assert!(matches!(
            rm.read_one(&desired).await.unwrap_err(),
            ReconcileError::NotFound
        ));

        let created = rm.create(&desired).await.unwrap();
        assert!(cloud.contains(&cloud_key(&desired)));

        let observed = rm.read_one(&created).await.unwrap();
        assert_eq!(observed.status.as_ref().unwrap().observed_size, Some(10));
        assert!(rm.is_synced(&observed).await.unwrap());
    }

    /// Scenario 2, "Update on drift": cloud resource is smaller than desired.
    #[tokio::test]
    async fn update_on_drift() {
        let cloud = Arc::new(FakeCloud::new());
        let desired = bucket(10);
        cloud.create(&cloud_key(&desired), "x", 5);
        let rm = manager(cloud.clone());
        let rd = BucketDescriptor;

        let observed = rm.read_one(&desired).await.unwrap();
        let delta = rd.delta(&desired, &observed);
        assert!(delta.different_at("Spec"));

        let updated = rm.update(&desired, &observed, &delta).await.unwrap();
        assert_eq!(updated.status.as_ref().unwrap().observed_size, Some(10));
        assert_eq!(cloud.read(&cloud_key(&desired)).unwrap().size, 10);
    }

    /// Scenario 3, "Delete success": cloud resource exists and deletes
    /// synchronously.
    #[tokio::test]
    async fn delete_success() {
        let cloud = Arc::new(FakeCloud::new());
        let desired = bucket(10);
        cloud.create(&cloud_key(&desired), "x", 10);
        let rm = manager(cloud.clone());

        rm.delete(&desired).await.unwrap();
        assert!(!cloud.contains(&cloud_key(&desired)));
    }

    /// Scenario 5, "Create-then-404": the first `ReadOne` after `Create`
    /// reports the resource missing, the second finds it.
    #[tokio::test]
    async fn create_then_transient_404() {
        let desired = bucket(10);
        let key = cloud_key(&desired);
        let cloud = Arc::new(FakeCloud::new().with_read_after_create_misses(&key, 1));
        let rm = manager(cloud.clone());

        let created = rm.create(&desired).await.unwrap();
        assert!(matches!(
            rm.read_one(&created).await.unwrap_err(),
            ReconcileError::NotFound
        ));
        let observed = rm.read_one(&created).await.unwrap();
        assert_eq!(observed.status.as_ref().unwrap().observed_size, Some(10));
    }

    /// An in-flight async deletion reports success from the cloud API but
    /// leaves the resource present; the resource manager must surface this
    /// as a bounded requeue rather than treating the delete as complete.
    #[tokio::test]
    async fn delete_in_progress_requeues() {
        let cloud = Arc::new(FakeCloud::new());
        let desired = bucket(10);
        cloud.create(&cloud_key(&desired), "x", 10);
        *cloud.async_delete.lock().unwrap() = true;
        let rm = manager(cloud.clone());

        let err = rm.delete(&desired).await.unwrap_err();
        assert!(matches!(err, ReconcileError::RequeueNeededAfter { .. }));
        assert!(cloud.contains(&cloud_key(&desired)));
    }
}
