// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::{errors::SourceError, store::ObjectStore};

/// In-process store that records every `get_object` call.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), Bytes>>,
    fetches: Mutex<HashMap<String, usize>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        self.objects
            .lock()
            .insert((bucket.to_string(), key.to_string()), body.into());
    }

    /// Makes every fetch of `key` fail with an I/O error.
    pub fn fail_key(&self, key: &str) {
        self.failing.lock().insert(key.to_string());
    }

    pub fn fetch_count(&self, key: &str) -> usize {
        self.fetches.lock().get(key).copied().unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().values().sum()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, SourceError> {
        *self.fetches.lock().entry(key.to_string()).or_default() += 1;
        if self.failing.lock().contains(key) {
            return Err(SourceError::Io(std::io::Error::other(format!(
                "injected failure for {key}"
            ))));
        }
        self.objects
            .lock()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, SourceError> {
        Ok(self
            .objects
            .lock()
            .keys()
            .filter(|(b, k)| b == bucket && k.starts_with(prefix))
            .map(|(_, k)| k.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_fetches_and_lists_sorted_keys() {
        let store = MemoryObjectStore::new();
        store.insert("b", "x/2", "two");
        store.insert("b", "x/1", "one");
        store.insert("other", "x/3", "three");

        assert_eq!(&store.get_object("b", "x/1").await.unwrap()[..], b"one");
        assert!(store.get_object("b", "x/9").await.unwrap_err().is_not_found());
        assert_eq!(store.fetch_count("x/1"), 1);
        assert_eq!(store.total_fetches(), 2);
        assert_eq!(
            store.list_objects("b", "x/").await.unwrap(),
            vec!["x/1".to_string(), "x/2".to_string()]
        );
        // listing is not a fetch
        assert_eq!(store.total_fetches(), 2);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_io_errors() {
        let store = MemoryObjectStore::new();
        store.insert("b", "k", "v");
        store.fail_key("k");
        assert!(matches!(
            store.get_object("b", "k").await,
            Err(SourceError::Io(_))
        ));
    }
}
