// Copyright (c) James Kassemi, SC, US. All rights reserved.
use core_types::DecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("object s3://{bucket}/{key} not found")]
    NotFound { bucket: String, key: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sdk error: {0}")]
    Sdk(String),
    #[error("object store misconfigured: {0}")]
    Config(String),
}

impl SourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound { .. })
    }
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest s3://{bucket}/{path} not found")]
    NotFound { bucket: String, path: String },
    #[error("manifest {path} is malformed: {reason}")]
    Format { path: String, reason: String },
    #[error("manifest fetch failed: {0}")]
    Source(#[from] SourceError),
}

#[derive(Debug, Error)]
pub enum BlockFileError {
    #[error("data file fetch failed: {0}")]
    Source(#[from] SourceError),
    #[error("data file {key} could not be decoded: {source}")]
    Decode {
        key: String,
        #[source]
        source: DecodeError,
    },
}
