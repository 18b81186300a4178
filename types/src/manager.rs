use crate::delta::Delta;
use crate::error::ReconcileError;
use crate::resource::ManagedResource;
use crate::secret::SecretKeyReference;
use crate::session::{CloudSession, SessionContext};
use async_trait::async_trait;

/// Direct (uncached) read access to the cluster store for CR-to-CR
/// references, used by [`ResourceManager::resolve_references`] to
/// dereference cross-resource pointers. Named for the `AR` collaborator in
/// the design: reads always bypass any informer cache to avoid acting on
/// stale data.
#[async_trait]
pub trait DirectApiReader: Send + Sync {
    async fn get<T>(&self, namespace: &str, name: &str) -> Result<Option<T>, ReconcileError>
    where
        T: ManagedResource,
        <T as kube::Resource>::DynamicType: Default;
}

/// Resolves a [`SecretKeyReference`] to its byte value. Implemented by the
/// reconciler itself and handed to resource managers that need credentials
/// out of a Secret (`SecretValueFromReference` in the design's outward
/// interface). Reads go through `KC`, not `AR`.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    async fn resolve(
        &self,
        reference: &SecretKeyReference,
        default_namespace: &str,
    ) -> Result<Vec<u8>, ReconcileError>;
}

/// Per-kind cloud-API adapter (`RM`).
///
/// Every method corresponds to one named step of the Sync/Create/Update/
/// Delete flows. A `ResourceManager` is constructed fresh for each
/// reconcile by a [`ResourceManagerFactory`], scoped to one authenticated
/// [`CloudSession`].
#[async_trait]
pub trait ResourceManager<K>: Send + Sync
where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
{
    /// Dereferences cross-resource pointers (e.g. "vpc-id from this other
    /// CR's status") and returns a freshly resolved copy. The result is
    /// never written back to the cluster store, which is what keeps cyclic
    /// references from becoming persistent cycles.
    async fn resolve_references<AR: DirectApiReader + Sync>(
        &self,
        reader: &AR,
        res: &K,
    ) -> Result<K, ReconcileError>;

    /// Injects controller-identifying tags into the desired spec in place.
    async fn ensure_tags(&self, res: &mut K) -> Result<(), ReconcileError>;

    /// Probes the cloud for the current state of `res`. Returns
    /// [`ReconcileError::NotFound`] if it does not exist.
    async fn read_one(&self, res: &K) -> Result<K, ReconcileError>;

    async fn create(&self, desired: &K) -> Result<K, ReconcileError>;

    async fn update(&self, desired: &K, latest: &K, delta: &Delta) -> Result<K, ReconcileError>;

    /// May return [`ReconcileError::RequeueNeededAfter`] for asynchronous
    /// deletions that have merely been requested, not completed.
    async fn delete(&self, res: &K) -> Result<K, ReconcileError>;

    /// Gives the resource manager a chance to populate spec fields with
    /// server-assigned defaults. May return
    /// [`ReconcileError::RequeueNeededAfter`] if the defaults aren't stable
    /// yet (e.g. the cloud is still provisioning them).
    async fn late_initialize(&self, latest: &mut K) -> Result<(), ReconcileError>;

    async fn is_synced(&self, res: &K) -> Result<bool, ReconcileError>;
}

/// Constructs a [`ResourceManager`] on demand, given an authenticated
/// session (`RMF`).
#[async_trait]
pub trait ResourceManagerFactory<K>: Send + Sync
where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
{
    type Manager: ResourceManager<K>;

    async fn manager_for(
        &self,
        ctx: &SessionContext,
        session: CloudSession,
        secrets: std::sync::Arc<dyn SecretResolver>,
    ) -> Result<Self::Manager, ReconcileError>;

    /// Resync period this kind would like when it has nothing else to say,
    /// consulted after the config's per-kind and default resync settings
    /// precedence chain.
    fn requeue_on_success_seconds(&self) -> Option<u64> {
        None
    }
}
