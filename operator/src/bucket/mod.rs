//! Demo kind exercising the reconciliation engine against an in-memory
//! fake cloud. Stands in for a generated per-service crate in a real
//! deployment of this engine.

mod cloud;
mod descriptor;
mod manager;
mod service;
mod types;

pub use cloud::FakeCloud;
pub use descriptor::BucketDescriptor;
pub use manager::{BucketManager, BucketManagerFactory};
pub use service::BucketServiceController;
pub use types::{Bucket, BucketSpec, BucketStatus};
