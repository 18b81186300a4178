//! Condition writer (`CW`): the `Synced`/`Terminal` bookkeeping.

use crate::util::messages;
use ackr_types::{
    Condition, ConditionStatus, ConditionType, ManagedResource, ReconcileError, ResourceStatus,
};

/// Computes and writes the resource's `Synced` condition, unless a
/// resource manager has already written one via custom logic.
///
/// `is_synced` is the result of `RM.IsSynced`, called unconditionally
/// before this function is invoked; `reconcile_err` is the error (if any)
/// from the rest of the Sync flow.
pub fn ensure_conditions<K>(
    res: &mut K,
    is_synced: Result<bool, &ReconcileError>,
    reconcile_err: Option<&ReconcileError>,
) where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
{
    let status = res.status_mut();
    if status
        .condition(ConditionType::Synced)
        .is_some_and(|c| c.reason.as_deref() == Some(CUSTOM_SYNCED_REASON))
    {
        return;
    }

    let (mut condition_status, mut message, mut reason) = match is_synced {
        Ok(true) => (ConditionStatus::True, messages::SYNCED.to_owned(), None),
        Ok(false) => (ConditionStatus::False, messages::NOT_SYNCED.to_owned(), None),
        Err(err) => (ConditionStatus::False, err.to_string(), Some(err.to_string())),
    };

    if let Some(err) = reconcile_err {
        if err.is_terminal() {
            condition_status = ConditionStatus::False;
            message = messages::NOT_SYNCED.to_owned();
        } else {
            condition_status = ConditionStatus::Unknown;
            message = messages::UNKNOWN.to_owned();
        }
        reason = Some(match err {
            ReconcileError::AdoptedResourceNotFound => {
                messages::REASON_ADOPTED_RESOURCE_NOT_FOUND.to_owned()
            }
            other => other.to_string(),
        });
    }

    status.set_condition(Condition::new(
        ConditionType::Synced,
        condition_status,
        reason,
        Some(message),
    ));
}

/// Sentinel reason used by `ensure_conditions` to recognize that a resource
/// manager already wrote its own `Synced` condition and should not be
/// overridden. Resource managers opt in by using this exact reason.
pub const CUSTOM_SYNCED_REASON: &str = "CustomSyncLogic";

/// Sets `Terminal=True` with reason `NotManaged` and returns the
/// corresponding sentinel error, for update paths that reach a resource
/// lacking the finalizer.
pub fn fail_on_resource_unmanaged<K>(res: &mut K) -> ReconcileError
where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
{
    res.status_mut().set_condition(Condition::new(
        ConditionType::Terminal,
        ConditionStatus::True,
        Some(messages::REASON_NOT_MANAGED.to_owned()),
        Some(messages::NOT_SYNCED.to_owned()),
    ));
    ReconcileError::NotManaged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::{Bucket, BucketSpec, BucketStatus};

    fn bucket() -> Bucket {
        Bucket::test_new(
            "test",
            BucketSpec {
                name: "x".into(),
                size: 1,
                encryption_key_ref: None,
            },
        )
    }

    #[test]
    fn synced_true_on_success() {
        let mut res = bucket();
        ensure_conditions(&mut res, Ok(true), None);
        let condition = res.status().unwrap().condition(ConditionType::Synced).unwrap();
        assert_eq!(condition.status, ConditionStatus::True);
    }

    #[test]
    fn terminal_error_yields_false_not_unknown() {
        let mut res = bucket();
        let err = ReconcileError::Terminal("broken".into());
        ensure_conditions(&mut res, Ok(true), Some(&err));
        let condition = res.status().unwrap().condition(ConditionType::Synced).unwrap();
        assert_eq!(condition.status, ConditionStatus::False);
        assert_eq!(condition.message.as_deref(), Some(messages::NOT_SYNCED));
    }

    #[test]
    fn non_terminal_error_yields_unknown() {
        let mut res = bucket();
        let err = ReconcileError::Generic("transient".into());
        ensure_conditions(&mut res, Ok(true), Some(&err));
        let condition = res.status().unwrap().condition(ConditionType::Synced).unwrap();
        assert_eq!(condition.status, ConditionStatus::Unknown);
    }

    #[test]
    fn failing_on_unmanaged_sets_terminal() {
        let mut res = bucket();
        let err = fail_on_resource_unmanaged(&mut res);
        assert!(matches!(err, ReconcileError::NotManaged));
        assert!(res
            .status()
            .unwrap()
            .condition(ConditionType::Terminal)
            .is_some());
    }

    #[allow(dead_code)]
    fn _status_shape(s: &BucketStatus) -> &[Condition] {
        s.conditions()
    }
}
