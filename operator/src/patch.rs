//! The two patch helpers every sync/delete flow ends with: a combined
//! metadata+spec merge patch, and a status-subresource merge patch.
//!
//! Both are JSON merge patches against the typed API, collapsed into
//! kind-agnostic functions over `ManagedResource` instead of per-kind
//! `Object`/`Status` impls.

use ackr_types::{ManagedResource, ReconcileError};
use serde::Serialize;
use kube::{
    api::{Patch, PatchParams},
    Api, Client,
};
use serde_json::{json, Value};

const FIELD_MANAGER: &str = "ackr-operator";

/// Strips `metadata.managedFields` before a patch payload is logged; the
/// field is large and never useful in a log line.
pub fn loggable_patch(payload: &Value) -> Value {
    let mut payload = payload.clone();
    if let Some(metadata) = payload.get_mut("metadata").and_then(|m| m.as_object_mut()) {
        metadata.remove("managedFields");
    }
    payload
}

/// Applies a metadata+spec merge patch from `desired` to `latest`'s current
/// values, if either differs from `desired`. No-ops otherwise.
///
/// `latest` is mutated in place: on success its metadata/spec reflect the
/// server's response (so a freshly bumped `resourceVersion` is available
/// for a later patch in the same reconcile), but its `status` is restored
/// to the value it held before this call, since the merge patch response
/// otherwise clobbers it with the pre-patch stored status.
pub async fn patch_resource_metadata_and_spec<K>(
    client: &Client,
    desired: &K,
    latest: &mut K,
) -> Result<(), ReconcileError>
where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
{
    let metadata_changed =
        serde_json::to_value(desired.meta()).ok() != serde_json::to_value(latest.meta()).ok();
    let spec_changed = desired.spec() != latest.spec();
    if !metadata_changed && !spec_changed {
        return Ok(());
    }

    let payload = json!({
        "metadata": latest.meta(),
        "spec": latest.spec(),
    });
    tracing::debug!(patch = %loggable_patch(&payload), "patching metadata+spec");

    let namespace = latest
        .meta()
        .namespace
        .as_deref()
        .ok_or(ReconcileError::Generic("resource has no namespace".into()))?;
    let name = latest
        .meta()
        .name
        .as_deref()
        .ok_or(ReconcileError::Generic("resource has no name".into()))?;
    let api: Api<K> = Api::namespaced(client.clone(), namespace);

    let saved_status = latest.status().cloned();
    let patch: Patch<&Value> = Patch::Merge(&payload);
    let response = api
        .patch(name, &PatchParams::apply(FIELD_MANAGER), &patch)
        .await?;
    *latest = response;
    if let Some(status) = saved_status {
        *latest.status_mut() = status;
    }
    Ok(())
}

/// Applies a status-subresource merge patch from `desired` to `latest`'s
/// current status. `NotFound` (the CR was deleted concurrently) is
/// swallowed, per the design's error post-processing contract.
pub async fn patch_resource_status<K>(
    client: &Client,
    desired: &K,
    latest: &K,
) -> Result<(), ReconcileError>
where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
    <K as ManagedResource>::Status: Serialize,
{
    let _ = desired;
    let namespace = latest
        .meta()
        .namespace
        .as_deref()
        .ok_or(ReconcileError::Generic("resource has no namespace".into()))?;
    let name = latest
        .meta()
        .name
        .as_deref()
        .ok_or(ReconcileError::Generic("resource has no name".into()))?;
    let api: Api<K> = Api::namespaced(client.clone(), namespace);

    let payload = json!({ "status": latest.status() });
    tracing::debug!(patch = %loggable_patch(&payload), "patching status");
    let patch: Patch<&Value> = Patch::Merge(&payload);
    match api
        .patch_status(name, &PatchParams::apply(FIELD_MANAGER), &patch)
        .await
    {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(err)) if err.code == 404 => Ok(()),
        Err(err) => Err(ReconcileError::Kube { source: err }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_managed_fields() {
        let payload = json!({
            "metadata": {
                "name": "x",
                "managedFields": [{"manager": "kubectl"}],
            },
        });
        let stripped = loggable_patch(&payload);
        assert!(stripped["metadata"].get("managedFields").is_none());
        assert_eq!(stripped["metadata"]["name"], "x");
    }
}
