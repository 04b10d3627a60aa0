// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Shared document model, journal views, configuration, and retry policy for the
//! ledger export tooling.

pub mod config;
pub mod document;
pub mod journal;
pub mod retry;

pub use config::ExporterConfig;
pub use document::{DecodeError, DocumentDecoder, JsonDocumentDecoder, Value};
pub use journal::{Block, BlockRange, DataFileKey, ManifestName, Revision};
pub use retry::RetryPolicy;
