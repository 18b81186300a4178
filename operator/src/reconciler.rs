//! The Reconciler (`R`): orchestrates a single reconcile call.

use crate::caches::{AccountCache, NamespaceCache};
use crate::config::{Config, DeletionPolicy};
use crate::context;
use crate::delete;
use crate::patch;
use crate::sync;
use ackr_types::{
    DirectApiReader, ManagedResource, ReconcileError, ReconcileOutcome, ResourceDescriptor,
    ResourceManager, ResourceManagerFactory, SecretKeyReference, SecretResolver,
    ServiceController,
};
use async_trait::async_trait;
use kube::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Holds references to every collaborator a reconcile call needs: `C`,
/// `NSC`, `AC`, `RD`, `RMF`, `SC`, the cluster client (`KC`) and the direct
/// API reader (`AR`). One instance per watched kind.
pub struct Reconciler<K, RD, RMF, SC, AR>
where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
    RD: ResourceDescriptor<K>,
    RMF: ResourceManagerFactory<K>,
    SC: ServiceController,
    AR: DirectApiReader + Sync,
{
    pub client: Client,
    pub config: Arc<Config>,
    pub namespaces: Arc<dyn NamespaceCache>,
    pub accounts: Arc<dyn AccountCache>,
    pub descriptor: RD,
    pub factory: RMF,
    pub service: SC,
    pub reader: AR,
    _marker: std::marker::PhantomData<K>,
}

impl<K, RD, RMF, SC, AR> Reconciler<K, RD, RMF, SC, AR>
where
    K: ManagedResource + 'static,
    <K as kube::Resource>::DynamicType: Default,
    <K as ManagedResource>::Status: serde::Serialize,
    RD: ResourceDescriptor<K> + 'static,
    RMF: ResourceManagerFactory<K> + 'static,
    SC: ServiceController + 'static,
    AR: DirectApiReader + Sync + 'static,
{
    pub fn new(
        client: Client,
        config: Arc<Config>,
        namespaces: Arc<dyn NamespaceCache>,
        accounts: Arc<dyn AccountCache>,
        descriptor: RD,
        factory: RMF,
        service: SC,
        reader: AR,
    ) -> Self {
        Reconciler {
            client,
            config,
            namespaces,
            accounts,
            descriptor,
            factory,
            service,
            reader,
            _marker: std::marker::PhantomData,
        }
    }

    /// Fetches the CR via `AR`, resolves its session context,
    /// constructs an `RM`, dispatches to `reconcileOne`, and post-processes
    /// the result into a [`ReconcileOutcome`].
    pub async fn reconcile(
        ctx: Arc<Self>,
        namespace: &str,
        name: &str,
    ) -> ReconcileOutcome {
        let this = ctx.as_ref();
        let desired = match this.reader.get::<K>(namespace, name).await {
            Ok(Some(res)) => res,
            Ok(None) => return ReconcileOutcome::Done,
            Err(err) => return ReconcileOutcome::Fatal(err),
        };

        let group_kind = this.descriptor.group_kind();
        let account_id = context::resolve_account_id(&desired, this.namespaces.as_ref(), &this.config);
        let role_arn = context::resolve_role_arn(&account_id, this.accounts.as_ref());
        let region = context::resolve_region(&desired, this.namespaces.as_ref(), &this.config);
        let endpoint_url =
            context::resolve_endpoint_url(namespace, this.namespaces.as_ref(), &this.config);

        let session = match this
            .service
            .new_session(
                &account_id,
                &region,
                endpoint_url.as_deref(),
                Some(&role_arn).filter(|r| !r.is_empty()).map(|s| s.as_str()),
                &group_kind,
            )
            .await
        {
            Ok(session) => session,
            Err(err) => return ReconcileOutcome::Fatal(err),
        };

        let span = tracing::info_span!(
            "reconcile",
            account = %account_id,
            role = %role_arn,
            region = %region,
            kind = %group_kind,
            namespace,
            name,
        );

        async {
            let session_context = context::build_session_context(
                account_id,
                region,
                endpoint_url,
                role_arn,
                group_kind.clone(),
            );

            let secrets: Arc<dyn SecretResolver> = ctx.clone();
            let manager = match this
                .factory
                .manager_for(&session_context, session, secrets)
                .await
            {
                Ok(manager) => manager,
                Err(err) => return ReconcileOutcome::Fatal(err),
            };

            let deletion_policy = context::resolve_deletion_policy(
                &desired,
                this.service.service_alias(),
                this.namespaces.as_ref(),
                &this.config,
            );

            let (latest, result) = this.reconcile_one(&manager, &desired, deletion_policy).await;
            this.handle_reconcile_error(&desired, latest, result).await
        }
        .instrument(span)
        .await
    }

    /// Dispatches to Delete or Sync depending on deletion state and
    /// policy.
    async fn reconcile_one(
        &self,
        manager: &RMF::Manager,
        desired: &K,
        deletion_policy: DeletionPolicy,
    ) -> (K, Result<(), ReconcileError>) {
        if desired.is_being_deleted() {
            let mut current = desired.clone();
            match deletion_policy {
                DeletionPolicy::Delete => {
                    if let Ok(resolved) = manager.resolve_references(&self.reader, &current).await {
                        current = resolved;
                    }
                    let result =
                        delete::delete(&self.client, &self.descriptor, manager, desired, &mut current)
                            .await;
                    (current, result)
                }
                DeletionPolicy::Retain => {
                    tracing::info!("deletion policy is Retain; marking unmanaged without deleting cloud resource");
                    self.descriptor.mark_unmanaged(&mut current);
                    let result =
                        patch::patch_resource_metadata_and_spec(&self.client, desired, &mut current)
                            .await;
                    (current, result)
                }
            }
        } else {
            sync::sync(&self.client, &self.descriptor, manager, &self.reader, desired).await
        }
    }

    /// Always attempts a status patch, then classifies the error into
    /// an outcome.
    async fn handle_reconcile_error(
        &self,
        desired: &K,
        latest: K,
        result: Result<(), ReconcileError>,
    ) -> ReconcileOutcome {
        if let Err(err) = patch::patch_resource_status(&self.client, desired, &latest).await {
            tracing::warn!(error = %err, "failed to patch status");
        }

        match result {
            Ok(()) => self.handle_requeues(&latest),
            Err(err) if err.is_terminal() => ReconcileOutcome::Done,
            Err(err) => {
                if let Some(duration) = err.requeue_after() {
                    ReconcileOutcome::RequeueAfter(duration)
                } else if err.requeue_immediate() {
                    ReconcileOutcome::RequeueImmediate
                } else {
                    ReconcileOutcome::Fatal(err)
                }
            }
        }
    }

    /// `handleRequeues`: inspects the newly-written `Synced` condition to
    /// decide the steady-state resync cadence.
    fn handle_requeues(&self, latest: &K) -> ReconcileOutcome {
        use ackr_types::{ConditionStatus, ConditionType, ResourceStatus};
        match latest.status().and_then(|s| s.condition(ConditionType::Synced)) {
            Some(condition) if condition.status == ConditionStatus::True => {
                let resync = context::resolve_resync_period(
                    &self.descriptor.group_kind().kind,
                    self.factory.requeue_on_success_seconds(),
                    &self.config,
                );
                ReconcileOutcome::RequeueAfter(resync)
            }
            Some(condition) if condition.status == ConditionStatus::False => {
                ReconcileOutcome::RequeueAfter(context::DEFAULT_OUT_OF_SYNC_DELAY)
            }
            _ => ReconcileOutcome::Done,
        }
    }
}

/// The reconciler doubles as the `SecretResolver` (`KC`) handed to resource
/// managers.
#[async_trait]
impl<K, RD, RMF, SC, AR> SecretResolver for Reconciler<K, RD, RMF, SC, AR>
where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
    RD: ResourceDescriptor<K>,
    RMF: ResourceManagerFactory<K>,
    SC: ServiceController,
    AR: DirectApiReader + Sync,
{
    async fn resolve(
        &self,
        reference: &SecretKeyReference,
        default_namespace: &str,
    ) -> Result<Vec<u8>, ReconcileError> {
        use k8s_openapi::api::core::v1::Secret;
        use kube::Api;

        let namespace = reference.namespace.as_deref().unwrap_or(default_namespace);
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = api.get(&reference.name).await.map_err(|err| match err {
            kube::Error::Api(e) if e.code == 404 => ReconcileError::SecretNotFound {
                namespace: namespace.to_owned(),
                name: reference.name.clone(),
            },
            other => ReconcileError::Kube { source: other },
        })?;
        if secret.type_.as_deref() != Some("Opaque") {
            return Err(ReconcileError::SecretTypeNotSupported {
                namespace: namespace.to_owned(),
                name: reference.name.clone(),
                key: reference.key.clone(),
            });
        }
        if let Some(data) = secret.data.as_ref().and_then(|d| d.get(&reference.key)) {
            return Ok(data.0.clone());
        }
        Err(ReconcileError::SecretTypeNotSupported {
            namespace: namespace.to_owned(),
            name: reference.name.clone(),
            key: reference.key.clone(),
        })
    }
}

/// Default "out-of-sync" requeue delay re-exported for `handle_requeues`
/// callers that don't otherwise depend on `context`.
pub const DEFAULT_OUT_OF_SYNC_DELAY: Duration = context::DEFAULT_OUT_OF_SYNC_DELAY;
