//! Cluster store access shared by the reconciler's collaborators.
//!
//! [`KubeCluster`] is the production implementation, backed by a live
//! `kube::Client`. It implements both [`DirectApiReader`] (the `AR`
//! collaborator, used for dereferencing cross-resource pointers) and
//! [`SecretResolver`] (used for reading dependent Secrets), since both are
//! just differently-shaped uncached reads against the same API server.

use ackr_types::{ManagedResource, ReconcileError, SecretKeyReference};
use async_trait::async_trait;
use base64::Engine;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};

pub use ackr_types::{DirectApiReader, SecretResolver};

/// Direct, uncached reads against a live API server.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        KubeCluster { client }
    }
}

#[async_trait]
impl DirectApiReader for KubeCluster {
    async fn get<T>(&self, namespace: &str, name: &str) -> Result<Option<T>, ReconcileError>
    where
        T: ManagedResource,
        <T as kube::Resource>::DynamicType: Default,
    {
        let api: Api<T> = Api::namespaced(self.client.clone(), namespace);
        match api.get(name).await {
            Ok(obj) => Ok(Some(obj)),
            Err(kube::Error::Api(err)) if err.code == 404 => Ok(None),
            Err(err) => Err(ReconcileError::Kube { source: err }),
        }
    }
}

#[async_trait]
impl SecretResolver for KubeCluster {
    async fn resolve(
        &self,
        reference: &SecretKeyReference,
        default_namespace: &str,
    ) -> Result<Vec<u8>, ReconcileError> {
        let namespace = reference.namespace.as_deref().unwrap_or(default_namespace);
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = api
            .get(&reference.name)
            .await
            .map_err(|err| match err {
                kube::Error::Api(e) if e.code == 404 => ReconcileError::SecretNotFound {
                    namespace: namespace.to_owned(),
                    name: reference.name.clone(),
                },
                other => ReconcileError::Kube { source: other },
            })?;

        if let Some(data) = secret.data.as_ref().and_then(|d| d.get(&reference.key)) {
            return Ok(data.0.clone());
        }
        if let Some(data) = secret
            .string_data
            .as_ref()
            .and_then(|d| d.get(&reference.key))
        {
            return Ok(data.as_bytes().to_vec());
        }
        Err(ReconcileError::SecretTypeNotSupported {
            namespace: namespace.to_owned(),
            name: reference.name.clone(),
            key: reference.key.clone(),
        })
    }
}

/// Decodes a base64 secret value as a UTF-8 string, for resource managers
/// that need the credential as a `String` rather than raw bytes.
pub fn secret_value_as_string(raw: Vec<u8>) -> Result<String, ReconcileError> {
    String::from_utf8(raw).map_err(|err| ReconcileError::Generic(err.to_string()))
}

/// Encodes a value the way a fake Secret store would, for tests that build
/// `Secret.data` by hand.
pub fn base64_encode(raw: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(raw)
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory stand-in for [`KubeCluster`], used by reconciler tests that
    /// can't reach a live API server.
    #[derive(Default)]
    pub struct FakeCluster {
        secrets: Mutex<HashMap<(String, String, String), Vec<u8>>>,
    }

    impl FakeCluster {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn put_secret(&self, namespace: &str, name: &str, key: &str, value: &[u8]) {
            self.secrets.lock().unwrap().insert(
                (namespace.to_owned(), name.to_owned(), key.to_owned()),
                value.to_vec(),
            );
        }
    }

    #[async_trait]
    impl DirectApiReader for FakeCluster {
        async fn get<T>(&self, _namespace: &str, _name: &str) -> Result<Option<T>, ReconcileError>
        where
            T: ManagedResource,
            <T as kube::Resource>::DynamicType: Default,
        {
            Ok(None)
        }
    }

    #[async_trait]
    impl SecretResolver for FakeCluster {
        async fn resolve(
            &self,
            reference: &SecretKeyReference,
            default_namespace: &str,
        ) -> Result<Vec<u8>, ReconcileError> {
            let namespace = reference.namespace.as_deref().unwrap_or(default_namespace);
            self.secrets
                .lock()
                .unwrap()
                .get(&(
                    namespace.to_owned(),
                    reference.name.clone(),
                    reference.key.clone(),
                ))
                .cloned()
                .ok_or_else(|| ReconcileError::SecretNotFound {
                    namespace: namespace.to_owned(),
                    name: reference.name.clone(),
                })
        }
    }
}
