use crate::error::ReconcileError;
use crate::resource::GroupKind;
use crate::session::CloudSession;
use async_trait::async_trait;

/// Builds authenticated sessions given (region, endpoint, role-ARN, kind),
/// and supplies service metadata (`SC`).
#[async_trait]
pub trait ServiceController: Send + Sync {
    async fn new_session(
        &self,
        account_id: &str,
        region: &str,
        endpoint_url: Option<&str>,
        role_arn: Option<&str>,
        group_kind: &GroupKind,
    ) -> Result<CloudSession, ReconcileError>;

    /// Short alias used in metrics and log scoping (e.g. "s3", "rdsdb").
    fn service_alias(&self) -> &str;
}
