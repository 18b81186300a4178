use super::cloud::FakeCloud;
use ackr_types::{CloudSession, GroupKind, ReconcileError, ServiceController};
use async_trait::async_trait;
use std::sync::Arc;

/// `SC` for the demo bucket service. A real `ServiceController`
/// authenticates against a cloud SDK per (region, role); this one just
/// hands out a shared handle to the in-memory fake cloud, since the
/// session itself carries no real credentials to construct.
pub struct BucketServiceController {
    cloud: Arc<FakeCloud>,
}

impl BucketServiceController {
    pub fn new(cloud: Arc<FakeCloud>) -> Self {
        BucketServiceController { cloud }
    }
}

#[async_trait]
impl ServiceController for BucketServiceController {
    async fn new_session(
        &self,
        account_id: &str,
        region: &str,
        _endpoint_url: Option<&str>,
        _role_arn: Option<&str>,
        _group_kind: &GroupKind,
    ) -> Result<CloudSession, ReconcileError> {
        Ok(CloudSession::new(
            account_id.to_owned(),
            region.to_owned(),
            self.cloud.clone(),
        ))
    }

    fn service_alias(&self) -> &str {
        "bucket"
    }
}
