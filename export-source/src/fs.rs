// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

use crate::{errors::SourceError, store::ObjectStore};

/// Serves exports copied to local disk: `<root>/<bucket>/<key>`.
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key.trim_start_matches('/'))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, SourceError> {
        let path = self.object_path(bucket, key);
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(SourceError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, SourceError> {
        let bucket_root = self.root.join(bucket);
        if !fs::try_exists(&bucket_root).await? {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        let mut pending = vec![bucket_root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                if let Some(key) = relative_key(&bucket_root, &path) {
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}
