use crate::delta::Delta;
use crate::resource::{GroupKind, ManagedResource};

/// Per-kind metadata provider (`RD`).
///
/// A `ResourceDescriptor` is the one piece of per-kind logic the engine
/// calls directly rather than through a resource manager: it knows how to
/// build an empty instance of `K`, how to tell a managed resource from an
/// unmanaged one, and how to diff two instances. Implementations are
/// typically a zero-sized marker type plus a `Default` impl.
pub trait ResourceDescriptor<K>: Send + Sync
where
    K: ManagedResource,
    <K as kube::Resource>::DynamicType: Default,
{
    fn empty(&self) -> K;

    fn group_kind(&self) -> GroupKind;

    /// `true` iff `res` carries this kind's finalizer.
    fn is_managed(&self, res: &K) -> bool;

    /// Adds this kind's finalizer to `res`'s in-memory metadata. Does not
    /// itself write anything to the cluster; the caller is expected to
    /// patch afterwards.
    fn mark_managed(&self, res: &mut K);

    /// Removes this kind's finalizer from `res`'s in-memory metadata.
    fn mark_unmanaged(&self, res: &mut K);

    /// Structural diff between `a` and `b`, queryable via
    /// [`Delta::different_at`].
    fn delta(&self, a: &K, b: &K) -> Delta;
}
