// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::{collections::HashMap, fmt};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::SourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    InProgress,
    Completed,
    Cancelled,
}

impl fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExportStatus::InProgress => "IN_PROGRESS",
            ExportStatus::Completed => "COMPLETED",
            ExportStatus::Cancelled => "CANCELLED",
        };
        f.write_str(label)
    }
}

/// Where and in what state a journal export lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDescription {
    pub ledger_name: String,
    pub export_id: String,
    pub status: ExportStatus,
    pub bucket: String,
    pub prefix: String,
}

/// Current tip of a ledger's journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerDigest {
    pub strand_id: String,
    pub tip_sequence_no: u64,
}

/// Ledger control-plane lookups; the concrete client is supplied by the application.
#[async_trait]
pub trait LedgerService: Send + Sync + 'static {
    async fn describe_export(
        &self,
        ledger_name: &str,
        export_id: &str,
    ) -> Result<ExportDescription, SourceError>;

    async fn get_digest(&self, ledger_name: &str) -> Result<LedgerDigest, SourceError>;
}

/// Fixed answers keyed by ledger name, for tests and offline replays.
#[derive(Default)]
pub struct StaticLedgerService {
    exports: Mutex<HashMap<(String, String), ExportDescription>>,
    digests: Mutex<HashMap<String, LedgerDigest>>,
}

impl StaticLedgerService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_export(&self, description: ExportDescription) {
        let key = (
            description.ledger_name.clone(),
            description.export_id.clone(),
        );
        self.exports.lock().insert(key, description);
    }

    pub fn set_digest(&self, ledger_name: &str, digest: LedgerDigest) {
        self.digests.lock().insert(ledger_name.to_string(), digest);
    }
}

#[async_trait]
impl LedgerService for StaticLedgerService {
    async fn describe_export(
        &self,
        ledger_name: &str,
        export_id: &str,
    ) -> Result<ExportDescription, SourceError> {
        self.exports
            .lock()
            .get(&(ledger_name.to_string(), export_id.to_string()))
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                bucket: ledger_name.to_string(),
                key: export_id.to_string(),
            })
    }

    async fn get_digest(&self, ledger_name: &str) -> Result<LedgerDigest, SourceError> {
        self.digests
            .lock()
            .get(ledger_name)
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                bucket: ledger_name.to_string(),
                key: "digest".to_string(),
            })
    }
}
