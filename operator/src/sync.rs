//! Sync — the core convergence step, and its Create/Update sub-flows.

use crate::conditions;
use crate::context;
use crate::patch;
use ackr_types::{
    DirectApiReader, ManagedResource, ReconcileError, ResourceDescriptor, ResourceManager,
    ResourceStatus,
};
use kube::Client;
use std::time::{Duration, Instant};

/// Bounds the post-create `ReadOne` retry loop to a 10-second wall-clock
/// budget.
const READ_AFTER_CREATE_BUDGET: Duration = Duration::from_secs(10);

/// Runs Sync on a resource that is not being deleted. Always returns a
/// `latest` value (even on failure, reflecting whatever partial progress
/// was made) alongside the terminating error, if any.
pub async fn sync<K, RD, RM, AR>(
    client: &Client,
    rd: &RD,
    rm: &RM,
    reader: &AR,
    desired: &K,
) -> (K, Result<(), ReconcileError>)
where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
    RD: ResourceDescriptor<K>,
    RM: ResourceManager<K>,
    AR: DirectApiReader + Sync,
{
    let mut latest = desired.clone();
    latest.status_mut().reset_conditions();

    let adopted = context::is_adopted(&latest);
    let result = sync_inner(client, rd, rm, reader, desired, &mut latest, adopted).await;

    // Deferred ensureConditions: runs regardless of outcome,
    // since the Synced condition must reflect whatever was observed even
    // when the rest of Sync aborted partway through.
    let is_synced = rm.is_synced(&latest).await;
    let is_synced_ref = match &is_synced {
        Ok(synced) => Ok(*synced),
        Err(err) => Err(err),
    };
    conditions::ensure_conditions(&mut latest, is_synced_ref, result.as_ref().err());

    (latest, result)
}

async fn sync_inner<K, RD, RM, AR>(
    client: &Client,
    rd: &RD,
    rm: &RM,
    reader: &AR,
    desired: &K,
    latest: &mut K,
    adopted: bool,
) -> Result<(), ReconcileError>
where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
    RD: ResourceDescriptor<K>,
    RM: ResourceManager<K>,
    AR: DirectApiReader + Sync,
{
    let kind = rd.group_kind().kind;

    #[cfg(feature = "metrics")]
    let timer = crate::metrics::RM_CALL_DURATION
        .with_label_values(&[kind.as_str(), "resolve_references"])
        .start_timer();
    let resolved = rm.resolve_references(reader, latest).await?;
    #[cfg(feature = "metrics")]
    timer.observe_duration();
    *latest = resolved;

    #[cfg(feature = "metrics")]
    let timer = crate::metrics::RM_CALL_DURATION
        .with_label_values(&[kind.as_str(), "ensure_tags"])
        .start_timer();
    rm.ensure_tags(latest).await?;
    #[cfg(feature = "metrics")]
    timer.observe_duration();

    #[cfg(feature = "metrics")]
    let timer = crate::metrics::RM_CALL_DURATION
        .with_label_values(&[kind.as_str(), "read_one"])
        .start_timer();
    let read_result = rm.read_one(latest).await;
    #[cfg(feature = "metrics")]
    timer.observe_duration();

    match read_result {
        Ok(observed) => {
            update(client, rd, rm, desired, latest, observed).await?;
        }
        Err(ReconcileError::NotFound) if adopted => {
            return Err(ReconcileError::AdoptedResourceNotFound);
        }
        Err(ReconcileError::NotFound) => {
            create(client, rd, rm, reader, desired, latest).await?;
        }
        Err(other) => return Err(other),
    }

    #[cfg(feature = "metrics")]
    let timer = crate::metrics::RM_CALL_DURATION
        .with_label_values(&[kind.as_str(), "late_initialize"])
        .start_timer();
    rm.late_initialize(latest).await?;
    #[cfg(feature = "metrics")]
    timer.observe_duration();

    Ok(())
}

async fn create<K, RD, RM, AR>(
    client: &Client,
    rd: &RD,
    rm: &RM,
    reader: &AR,
    desired: &K,
    latest: &mut K,
) -> Result<(), ReconcileError>
where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
    RD: ResourceDescriptor<K>,
    RM: ResourceManager<K>,
    AR: DirectApiReader + Sync,
{
    let kind = rd.group_kind().kind;

    if !rd.is_managed(latest) {
        rd.mark_managed(latest);
        patch::patch_resource_metadata_and_spec(client, desired, latest).await?;
        // The patch round trip dropped the resolved references and ensured
        // tags, since neither is persisted in the cluster store.
        let resolved = rm.resolve_references(reader, latest).await?;
        *latest = resolved;
        rm.ensure_tags(latest).await?;
    }

    #[cfg(feature = "metrics")]
    let timer = crate::metrics::RM_CALL_DURATION
        .with_label_values(&[kind.as_str(), "create"])
        .start_timer();
    let created = rm.create(latest).await?;
    #[cfg(feature = "metrics")]
    timer.observe_duration();
    *latest = created;

    #[cfg(feature = "metrics")]
    let timer = crate::metrics::RM_CALL_DURATION
        .with_label_values(&[kind.as_str(), "read_one"])
        .start_timer();
    let read_result = rm.read_one(latest).await;
    #[cfg(feature = "metrics")]
    timer.observe_duration();

    let observed = match read_result {
        Ok(observed) => observed,
        Err(ReconcileError::NotFound) => delayed_read_one_after_create(rm, latest).await?,
        Err(other) => return Err(other),
    };
    if let Some(status) = observed.status() {
        *latest.status_mut() = status.clone();
    }

    patch::patch_resource_metadata_and_spec(client, desired, latest).await?;
    Ok(())
}

async fn delayed_read_one_after_create<K, RM>(rm: &RM, latest: &K) -> Result<K, ReconcileError>
where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
    RM: ResourceManager<K>,
{
    let start = Instant::now();
    let mut attempts = 1u32;
    let mut backoff = Duration::from_millis(250);
    loop {
        if start.elapsed() >= READ_AFTER_CREATE_BUDGET {
            return Err(ReconcileError::ReadOneFailAfterCreate { attempts });
        }
        tokio::time::sleep(backoff).await;
        match rm.read_one(latest).await {
            Ok(observed) => return Ok(observed),
            Err(ReconcileError::NotFound) => {
                attempts += 1;
                backoff = (backoff * 2).min(Duration::from_secs(2));
            }
            Err(other) => return Err(other),
        }
    }
}

async fn update<K, RD, RM>(
    client: &Client,
    rd: &RD,
    rm: &RM,
    desired: &K,
    latest: &mut K,
    observed: K,
) -> Result<(), ReconcileError>
where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
    RD: ResourceDescriptor<K>,
    RM: ResourceManager<K>,
{
    if !rd.is_managed(latest) {
        return Err(crate::conditions::fail_on_resource_unmanaged(latest));
    }

    let delta = rd.delta(latest, &observed);
    if !delta.different_at("Spec") {
        *latest = observed;
        return Ok(());
    }

    #[cfg(feature = "metrics")]
    let timer = crate::metrics::RM_CALL_DURATION
        .with_label_values(&[rd.group_kind().kind.as_str(), "update"])
        .start_timer();
    let updated = rm.update(latest, &observed, &delta).await?;
    #[cfg(feature = "metrics")]
    timer.observe_duration();
    *latest = updated;
    patch::patch_resource_metadata_and_spec(client, desired, latest).await?;
    Ok(())
}
