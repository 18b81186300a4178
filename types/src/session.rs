use crate::resource::GroupKind;
use std::any::Any;
use std::sync::Arc;

/// The facets of a reconcile that determine which account/region/endpoint to
/// talk to and which cloud credentials to assume. Derived fresh for every
/// reconcile call from the CR, the namespace/account caches and the
/// operator's configuration; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub account_id: String,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub role_arn: Option<String>,
    pub group_kind: GroupKind,
}

/// An opaque, authenticated handle to the cloud account/region identified by
/// a [`SessionContext`], as constructed by a [`crate::ServiceController`].
///
/// The engine never inspects the contents of a session; it only threads it
/// through to [`crate::ResourceManagerFactory::manager_for`]. Concrete
/// service controllers downcast it back to whatever credential/client type
/// they constructed.
#[derive(Clone)]
pub struct CloudSession {
    inner: Arc<dyn Any + Send + Sync>,
    pub account_id: String,
    pub region: String,
}

impl CloudSession {
    pub fn new<T: Any + Send + Sync>(account_id: String, region: String, inner: T) -> Self {
        CloudSession {
            inner: Arc::new(inner),
            account_id,
            region,
        }
    }

    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for CloudSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudSession")
            .field("account_id", &self.account_id)
            .field("region", &self.region)
            .finish()
    }
}
