//! Delete path.

use crate::patch;
use ackr_types::{ManagedResource, ReconcileError, ResourceDescriptor, ResourceManager};
use kube::Client;

/// Runs the Delete flow against `current` (a resource already known to be
/// being deleted, with `ResolveReferences` best-effort applied by the
/// caller). Returns the final `latest` plus the terminating error, if any,
/// same shape as `sync::sync`.
pub async fn delete<K, RD, RM>(
    client: &Client,
    rd: &RD,
    rm: &RM,
    desired: &K,
    current: &mut K,
) -> Result<(), ReconcileError>
where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
    RD: ResourceDescriptor<K>,
    RM: ResourceManager<K>,
{
    let kind = rd.group_kind().kind;

    #[cfg(feature = "metrics")]
    let timer = crate::metrics::RM_CALL_DURATION
        .with_label_values(&[kind.as_str(), "read_one"])
        .start_timer();
    let read_result = rm.read_one(current).await;
    #[cfg(feature = "metrics")]
    timer.observe_duration();

    let observed = match read_result {
        Ok(observed) => observed,
        Err(ReconcileError::NotFound) => {
            rd.mark_unmanaged(current);
            patch::patch_resource_metadata_and_spec(client, desired, current).await?;
            return Ok(());
        }
        Err(other) => return Err(other),
    };
    *current = observed;

    #[cfg(feature = "metrics")]
    let timer = crate::metrics::RM_CALL_DURATION
        .with_label_values(&[kind.as_str(), "delete"])
        .start_timer();
    let delete_result = rm.delete(current).await;
    #[cfg(feature = "metrics")]
    timer.observe_duration();

    let (latest, delete_err) = match delete_result {
        Ok(latest) => (latest, None),
        Err(ReconcileError::RequeueNeededAfter { duration, cause }) => {
            (current.clone(), Some(ReconcileError::RequeueNeededAfter { duration, cause }))
        }
        Err(other) => return Err(other),
    };
    *current = latest;

    patch::patch_resource_metadata_and_spec(client, desired, current).await?;

    if let Some(err) = delete_err {
        return Err(err);
    }

    rd.mark_unmanaged(current);
    patch::patch_resource_metadata_and_spec(client, desired, current).await?;
    tracing::info!("deleted resource");
    Ok(())
}
