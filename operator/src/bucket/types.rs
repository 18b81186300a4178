use ackr_types::{AckResourceMetadata, Condition, ManagedResource, ResourceStatus};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Demo kind standing in for a single ACK-style cloud resource (a storage
/// bucket). Exercises the reconciliation engine end to end against an
/// in-memory fake cloud (see `bucket::cloud`) rather than a real service.
#[derive(CustomResource, Serialize, Deserialize, Default, Debug, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "ackr.example.com",
    version = "v1",
    kind = "Bucket",
    plural = "buckets",
    derive = "PartialEq",
    status = "BucketStatus",
    namespaced
)]
#[kube(derive = "Default")]
pub struct BucketSpec {
    /// Name of the bucket in the backing cloud.
    pub name: String,

    /// Storage size, in gigabytes.
    pub size: u32,

    /// Optional reference to a Secret holding an encryption key, resolved
    /// via `SecretValueFromReference`.
    pub encryption_key_ref: Option<ackr_types::SecretKeyReference>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct BucketStatus {
    pub conditions: Vec<Condition>,

    #[serde(rename = "ackResourceMetadata")]
    pub ack_resource_metadata: Option<AckResourceMetadata>,

    /// Size observed on the backing cloud resource, populated from `ReadOne`.
    pub observed_size: Option<u32>,
}

impl ResourceStatus for BucketStatus {
    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    fn conditions_mut(&mut self) -> &mut Vec<Condition> {
        &mut self.conditions
    }

    fn ack_resource_metadata(&self) -> Option<&AckResourceMetadata> {
        self.ack_resource_metadata.as_ref()
    }

    fn set_ack_resource_metadata(&mut self, meta: AckResourceMetadata) {
        self.ack_resource_metadata = Some(meta);
    }
}

impl ManagedResource for Bucket {
    type Spec = BucketSpec;
    type Status = BucketStatus;

    fn spec(&self) -> &BucketSpec {
        &self.spec
    }

    fn status(&self) -> Option<&BucketStatus> {
        self.status.as_ref()
    }

    fn status_mut(&mut self) -> &mut BucketStatus {
        self.status.get_or_insert_with(Default::default)
    }
}

impl Bucket {
    /// Test/demo convenience constructor: a namespaced `Bucket` named `name`
    /// with the given spec, no status, no finalizers.
    #[cfg(test)]
    pub fn test_new(name: &str, spec: BucketSpec) -> Self {
        use kube::api::ObjectMeta;
        Bucket {
            metadata: ObjectMeta {
                name: Some(name.to_owned()),
                namespace: Some("default".to_owned()),
                ..Default::default()
            },
            spec,
            status: None,
        }
    }
}
