use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A pointer to a single key within a cluster `Secret`, used anywhere a CRD
/// spec needs to reference credential material rather than embed it.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct SecretKeyReference {
    /// Namespace the Secret lives in. Defaults to the CR's own namespace
    /// when omitted.
    pub namespace: Option<String>,
    pub name: String,
    pub key: String,
}
