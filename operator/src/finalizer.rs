//! Finalizer bookkeeping shared by every kind's resource descriptor.
//!
//! These helpers only mutate the in-memory object; the cluster write
//! happens later as part of a single combined metadata+spec patch (see
//! `patch.rs`), since adding a finalizer shares the same round trip that
//! also persists resolved references and ensured tags.

use kube::api::ObjectMeta;

/// Name of the finalizer this controller places on every CR it manages.
pub const FINALIZER_NAME: &str = "services.k8s.aws/finalizer";

/// Whether `meta` carries the controller's finalizer.
pub fn is_managed(meta: &ObjectMeta) -> bool {
    meta.finalizers
        .as_ref()
        .map(|f| f.iter().any(|name| name == FINALIZER_NAME))
        .unwrap_or(false)
}

/// Adds the finalizer if it is not already present.
pub fn mark_managed(meta: &mut ObjectMeta) {
    let finalizers = meta.finalizers.get_or_insert_with(Vec::new);
    if !finalizers.iter().any(|name| name == FINALIZER_NAME) {
        finalizers.push(FINALIZER_NAME.to_owned());
    }
}

/// Removes the finalizer if present. Leaves other finalizers untouched.
pub fn mark_unmanaged(meta: &mut ObjectMeta) {
    if let Some(finalizers) = meta.finalizers.as_mut() {
        finalizers.retain(|name| name != FINALIZER_NAME);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_and_removes_finalizer() {
        let mut meta = ObjectMeta::default();
        assert!(!is_managed(&meta));
        mark_managed(&mut meta);
        assert!(is_managed(&meta));
        mark_managed(&mut meta);
        assert_eq!(meta.finalizers.as_ref().unwrap().len(), 1);
        mark_unmanaged(&mut meta);
        assert!(!is_managed(&meta));
    }

    #[test]
    fn preserves_other_finalizers() {
        let mut meta = ObjectMeta {
            finalizers: Some(vec!["other/finalizer".to_owned()]),
            ..Default::default()
        };
        mark_managed(&mut meta);
        assert_eq!(meta.finalizers.as_ref().unwrap().len(), 2);
        mark_unmanaged(&mut meta);
        assert_eq!(
            meta.finalizers.as_ref().unwrap(),
            &vec!["other/finalizer".to_owned()]
        );
    }
}
