use super::types::Bucket;
use crate::finalizer;
use ackr_types::{Delta, GroupKind, ResourceDescriptor};

/// Zero-sized `RD` implementation for [`Bucket`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BucketDescriptor;

impl ResourceDescriptor<Bucket> for BucketDescriptor {
    fn empty(&self) -> Bucket {
        Bucket::default()
    }

    fn group_kind(&self) -> GroupKind {
        GroupKind::new("ackr.example.com", "Bucket")
    }

    fn is_managed(&self, res: &Bucket) -> bool {
        finalizer::is_managed(&res.metadata)
    }

    fn mark_managed(&self, res: &mut Bucket) {
        finalizer::mark_managed(&mut res.metadata);
    }

    fn mark_unmanaged(&self, res: &mut Bucket) {
        finalizer::mark_unmanaged(&mut res.metadata);
    }

    fn delta(&self, a: &Bucket, b: &Bucket) -> Delta {
        let mut differences = Vec::new();
        if a.spec != b.spec {
            differences.push("Spec".to_owned());
            if a.spec.name != b.spec.name {
                differences.push("Spec.name".to_owned());
            }
            if a.spec.size != b.spec.size {
                differences.push("Spec.size".to_owned());
            }
        }
        Delta::new(differences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::types::BucketSpec;

    #[test]
    fn delta_detects_size_change() {
        let rd = BucketDescriptor;
        let a = Bucket::test_new(
            "x",
            BucketSpec {
                name: "x".into(),
                size: 1,
                encryption_key_ref: None,
            },
        );
        let mut b = a.clone();
        b.spec.size = 2;
        let delta = rd.delta(&a, &b);
        assert!(delta.different_at("Spec"));
    }

    #[test]
    fn delta_empty_when_identical() {
        let rd = BucketDescriptor;
        let a = Bucket::test_new(
            "x",
            BucketSpec {
                name: "x".into(),
                size: 1,
                encryption_key_ref: None,
            },
        );
        let b = a.clone();
        assert!(rd.delta(&a, &b).is_empty());
    }
}
