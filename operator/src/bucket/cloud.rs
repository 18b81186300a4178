//! In-memory fake standing in for the bucket service's cloud API. Lets the
//! reconciler tests in `sync.rs`/`delete.rs`/`reconciler.rs` exercise
//! create/read/update/delete without a network.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct CloudBucket {
    pub arn: String,
    pub name: String,
    pub size: u32,
}

/// Reasons a fake call can fail, named so tests can assert on them.
#[derive(Debug, Clone, PartialEq)]
pub enum FakeCloudError {
    NotFound,
    Throttled,
}

#[derive(Default)]
pub struct FakeCloud {
    buckets: Mutex<HashMap<String, CloudBucket>>,
    /// When `> 0`, the next this-many `read` calls for a freshly created key
    /// report `NotFound` before succeeding — simulates the create-then-404
    /// eventual-consistency window from scenario 5.
    read_after_create_misses: Mutex<HashMap<String, u32>>,
    /// When set, `delete` reports success but leaves the bucket present,
    /// simulating an asynchronous deletion still in flight.
    pub async_delete: Mutex<bool>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read_after_create_misses(self, key: &str, misses: u32) -> Self {
        self.read_after_create_misses
            .lock()
            .unwrap()
            .insert(key.to_owned(), misses);
        self
    }

    pub fn create(&self, key: &str, name: &str, size: u32) -> CloudBucket {
        let bucket = CloudBucket {
            arn: format!("arn:fake:bucket:{key}"),
            name: name.to_owned(),
            size,
        };
        self.buckets
            .lock()
            .unwrap()
            .insert(key.to_owned(), bucket.clone());
        bucket
    }

    pub fn read(&self, key: &str) -> Result<CloudBucket, FakeCloudError> {
        let mut misses = self.read_after_create_misses.lock().unwrap();
        if let Some(remaining) = misses.get_mut(key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(FakeCloudError::NotFound);
            }
        }
        self.buckets
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or(FakeCloudError::NotFound)
    }

    pub fn update(&self, key: &str, size: u32) -> Result<CloudBucket, FakeCloudError> {
        let mut buckets = self.buckets.lock().unwrap();
        let bucket = buckets.get_mut(key).ok_or(FakeCloudError::NotFound)?;
        bucket.size = size;
        Ok(bucket.clone())
    }

    pub fn delete(&self, key: &str) -> Result<(), FakeCloudError> {
        if *self.async_delete.lock().unwrap() {
            return Ok(());
        }
        self.buckets
            .lock()
            .unwrap()
            .remove(key)
            .map(|_| ())
            .ok_or(FakeCloudError::NotFound)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.buckets.lock().unwrap().contains_key(key)
    }
}
