// Copyright (c) James Kassemi, SC, US. All rights reserved.
use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::SourceError;

/// Minimal object-store surface the export walk needs.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Fetches the whole object body.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, SourceError>;

    /// Keys under `prefix`, sorted ascending.
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, SourceError>;
}
