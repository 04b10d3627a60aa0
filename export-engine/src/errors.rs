// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::fmt;

use core_types::BlockRange;
use export_source::{BlockFileError, ExportStatus, ManifestError, SourceError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportError>;

/// Error raised by a visitor's `setup`, `visit_*`, or `teardown`.
#[derive(Debug, Error)]
pub enum VisitorError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl VisitorError {
    pub fn msg(message: impl Into<String>) -> Self {
        VisitorError::Message(message.into())
    }
}

/// Last block the walk started before failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPosition {
    BeforeFirstBlock,
    Block(u64),
}

impl fmt::Display for BlockPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockPosition::BeforeFirstBlock => f.write_str("prior to first block"),
            BlockPosition::Block(seq) => write!(f, "at block {seq}"),
        }
    }
}

/// Failure inside a run, after visitor setup began.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    BlockFile(#[from] BlockFileError),
    #[error("visitor {visitor} failed during setup: {source}")]
    Setup {
        visitor: String,
        #[source]
        source: VisitorError,
    },
    #[error("visitor {visitor} failed: {source}")]
    Visitor {
        visitor: String,
        #[source]
        source: VisitorError,
    },
    #[error("run cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{0} is required")]
    MissingArgument(&'static str),
    #[error("completed manifest path should end in .completed.manifest: {path}")]
    InvalidManifestPath { path: String },
    #[error("invalid manifest path \"{path}\"")]
    InvalidManifestName { path: String },
    #[error("start block {start} is after end block {end}")]
    InvalidBlockWindow { start: u64, end: u64 },
    #[error("exports must all be from the same strand: expected {expected}, found {found} in {path}")]
    StrandMismatch {
        expected: String,
        found: String,
        path: String,
    },
    #[error("manifests overlap or are not contiguous: {previous_path} covers {previous}, {next_path} covers {next}")]
    NonContiguousManifests {
        previous_path: String,
        previous: BlockRange,
        next_path: String,
        next: BlockRange,
    },
    #[error("manifest {path} lists data file {key} without a block range")]
    UnparsableManifestRange { path: String, key: String },
    #[error("unable to read manifest: {0}")]
    Manifest(#[from] ManifestError),
    #[error("no ledger service configured for ledger/export lookups")]
    LedgerServiceUnavailable,
    #[error("lookup failed: {0}")]
    Lookup(#[from] SourceError),
    #[error("export {export_id} has not completed (status {status})")]
    ExportNotReady {
        export_id: String,
        status: ExportStatus,
    },
    #[error("no completed manifest found at s3://{bucket}/{key}")]
    ManifestNotFound { bucket: String, key: String },
    #[error("processing failed {position}: {source}")]
    Processing {
        position: BlockPosition,
        #[source]
        source: RunError,
    },
}

impl ExportError {
    /// Block the run had reached, when the failure happened mid-run.
    pub fn position(&self) -> Option<BlockPosition> {
        match self {
            ExportError::Processing { position, .. } => Some(*position),
            _ => None,
        }
    }
}
