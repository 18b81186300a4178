use std::time::Duration;

/// The error categories the core classifies into outcomes.
///
/// Every fallible operation a resource manager, resource descriptor or
/// cluster reader/writer performs returns this type, so `HandleReconcileError`
/// has one place to pattern-match on instead of chasing down ad hoc error
/// enums per collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The cloud resource does not (yet, or any longer) exist.
    #[error("cloud resource not found")]
    NotFound,

    /// The CR itself was gone by the time we tried to read or patch it.
    #[error("custom resource not found")]
    ClusterNotFound,

    /// `SecretKeyReference` pointed at a Secret that doesn't exist.
    #[error("secret {namespace}/{name} not found")]
    SecretNotFound { namespace: String, name: String },

    /// `SecretKeyReference` pointed at a Secret that isn't of type Opaque,
    /// or whose `key` is missing from `data`.
    #[error("secret {namespace}/{name} is not a supported type or is missing key {key}")]
    SecretTypeNotSupported {
        namespace: String,
        name: String,
        key: String,
    },

    /// An adopted CR's backing cloud resource could not be found.
    #[error("adopted resource not found")]
    AdoptedResourceNotFound,

    /// A stable failure state that will not clear without user
    /// intervention. Maps to `Done` with `Synced=False`; never requeued.
    #[error("terminal error: {0}")]
    Terminal(String),

    /// The update reached a CR that is supposed to be managed but lacks the
    /// finalizer. A special case of [`ReconcileError::Terminal`].
    #[error("resource is not managed")]
    NotManaged,

    /// Requeue immediately, with no cause worth recording as a reason.
    #[error("requeue needed")]
    RequeueNeeded { cause: Option<String> },

    /// Requeue after `duration`, e.g. because an async cloud operation is
    /// still in flight or late-initialization isn't stable yet.
    #[error("requeue needed after {duration:?}")]
    RequeueNeededAfter {
        duration: Duration,
        cause: Option<String>,
    },

    /// The post-create `ReadOne` retry budget was exhausted.
    #[error("ReadOne failed after Create ({attempts} attempts)")]
    ReadOneFailAfterCreate { attempts: u32 },

    /// Reference resolution, session construction or other CR-author error.
    #[error("invalid user input: {0}")]
    UserInput(String),

    /// Anything else: transport errors, optimistic-concurrency conflicts,
    /// throttling. Propagated to the surrounding manager, which applies its
    /// own backoff.
    #[error("{0}")]
    Generic(String),

    #[error("kubernetes reported error: {source}")]
    Kube {
        #[from]
        source: kube::Error,
    },

    #[error("json error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl ReconcileError {
    /// `true` for the stable, non-retrying failure states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReconcileError::Terminal(_) | ReconcileError::NotManaged)
    }

    pub fn requeue_after(&self) -> Option<Duration> {
        match self {
            ReconcileError::RequeueNeededAfter { duration, .. } => Some(*duration),
            _ => None,
        }
    }

    pub fn requeue_immediate(&self) -> bool {
        matches!(self, ReconcileError::RequeueNeeded { .. })
    }
}
