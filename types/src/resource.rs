use crate::status::ResourceStatus;
use kube::core::NamespaceResourceScope;
use kube::Resource;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// Group/kind pair identifying a CRD, independent of version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKind {
    pub group: String,
    pub kind: String,
}

impl GroupKind {
    pub fn new(group: impl Into<String>, kind: impl Into<String>) -> Self {
        GroupKind {
            group: group.into(),
            kind: kind.into(),
        }
    }
}

impl std::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.kind, self.group)
    }
}

/// The domain-level view of a single namespaced custom resource instance.
///
/// This is the `Resource` value from the data model: a typed wrapper around
/// a CR that exposes exactly the facets the reconciler needs, independent of
/// which concrete CRD kind it wraps. Every per-kind CRD struct generated by
/// `#[derive(CustomResource)]` implements this trait once, after which the
/// engine in `ackr-operator` never needs to know the concrete type again.
pub trait ManagedResource:
    Resource<Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
where
    <Self as Resource>::DynamicType: Default,
{
    /// The declarative desired state carried by this resource.
    type Spec: Clone + Debug + PartialEq + Serialize + Send + Sync;

    /// The last-observed cloud state, plus conditions and ACK metadata.
    type Status: ResourceStatus + Clone + Debug + Default + Send + Sync;

    fn spec(&self) -> &Self::Spec;

    fn status(&self) -> Option<&Self::Status>;

    /// Returns a mutable reference to the status object, initializing it
    /// with the default value if it does not yet exist.
    fn status_mut(&mut self) -> &mut Self::Status;

    /// `true` once `metadata.deletionTimestamp` has been set by the cluster.
    fn is_being_deleted(&self) -> bool {
        self.meta().deletion_timestamp.is_some()
    }
}
