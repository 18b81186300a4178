/// `status.message` for a `Synced=True` condition.
pub const SYNCED: &str = "Synced";

/// `status.message` for a `Synced=False` condition with no error, i.e. the
/// resource manager reported the live state does not yet match desired.
pub const NOT_SYNCED: &str = "NotSynced";

/// `status.message` for a `Synced=Unknown` condition, written when a
/// reconcile error makes convergence indeterminate.
pub const UNKNOWN: &str = "Unknown";

/// `status.reason` for the `Terminal` condition raised when an update path
/// reaches a resource lacking the finalizer.
pub const REASON_NOT_MANAGED: &str = "NotManaged";

/// `status.reason` for the `Synced=Unknown` condition raised when an
/// adopted resource's backing cloud resource cannot be found.
pub const REASON_ADOPTED_RESOURCE_NOT_FOUND: &str = "AdoptedResourceNotFound";
