// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::sync::Arc;

use core_types::{DataFileKey, DocumentDecoder, Value};
use log::debug;

use crate::{
    errors::{ManifestError, SourceError},
    store::ObjectStore,
};

/// Field of the manifest document listing the export's data files.
const KEYS_FIELD: &str = "keys";

/// One completed manifest: its storage path and ordered data-file keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub path: String,
    pub files: Vec<DataFileKey>,
}

/// Reads completed manifests. No retries at this layer.
#[derive(Clone)]
pub struct ManifestReader {
    store: Arc<dyn ObjectStore>,
    decoder: Arc<dyn DocumentDecoder>,
}

impl ManifestReader {
    pub fn new(store: Arc<dyn ObjectStore>, decoder: Arc<dyn DocumentDecoder>) -> Self {
        Self { store, decoder }
    }

    pub async fn read(&self, bucket: &str, path: &str) -> Result<Manifest, ManifestError> {
        let path = normalize_key(path);
        let body = self
            .store
            .get_object(bucket, path)
            .await
            .map_err(|err| match err {
                SourceError::NotFound { .. } => ManifestError::NotFound {
                    bucket: bucket.to_string(),
                    path: path.to_string(),
                },
                other => ManifestError::Source(other),
            })?;
        let files = parse_manifest(path, &self.decoder.decode_all(&body).map_err(|err| {
            ManifestError::Format {
                path: path.to_string(),
                reason: err.to_string(),
            }
        })?)?;
        debug!("manifest {} lists {} data files", path, files.len());
        Ok(Manifest {
            path: path.to_string(),
            files,
        })
    }
}

/// Object keys never start with `/`.
pub fn normalize_key(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

fn parse_manifest(path: &str, docs: &[Value]) -> Result<Vec<DataFileKey>, ManifestError> {
    let format = |reason: String| ManifestError::Format {
        path: path.to_string(),
        reason,
    };
    let doc = docs
        .first()
        .ok_or_else(|| format("manifest is empty".to_string()))?;
    if doc.as_map().is_none() {
        return Err(format(format!("expected a map, found {}", doc.type_name())));
    }
    let keys = doc
        .get(KEYS_FIELD)
        .ok_or_else(|| format(format!("missing `{KEYS_FIELD}` field")))?
        .as_list()
        .ok_or_else(|| format(format!("`{KEYS_FIELD}` is not a list")))?;
    keys.iter()
        .map(|key| {
            key.as_str()
                .map(DataFileKey::new)
                .ok_or_else(|| format(format!("non-string key of type {}", key.type_name())))
        })
        .collect()
}
