// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Storage-facing side of export processing: object stores, the ledger service seam,
//! manifest reading, and data-file decoding.

mod blocks;
mod errors;
mod fs;
mod ledger;
mod manifest;
mod memory;
mod s3;
mod store;

pub use blocks::BlockSource;
pub use errors::{BlockFileError, ManifestError, SourceError};
pub use fs::FsObjectStore;
pub use ledger::{
    ExportDescription, ExportStatus, LedgerDigest, LedgerService, StaticLedgerService,
};
pub use manifest::{Manifest, ManifestReader, normalize_key};
pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;
pub use store::ObjectStore;
