// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Iteration over completed ledger journal exports: manifest stitching, block window
//! filtering, table resolution, and visitor dispatch.

mod config;
mod engine;
mod errors;
mod range;
mod stitch;
mod tables;
mod visitor;

pub use config::EngineConfig;
pub use engine::{ExportEngine, RunSummary};
pub use errors::{BlockPosition, ExportError, Result, RunError, VisitorError};
pub use range::{BlockPlacement, BlockWindow};
pub use stitch::{ManifestStitcher, RangedManifest};
pub use tables::{TableMap, TableRef, UNKNOWN_TABLE};
pub use visitor::{
    BlockVisitor, LifecycleGuard, RevisionVisitor, SharedBlockVisitor, SharedRevisionVisitor,
    TeardownFailure, Visitor, VisitorSet, shared,
};
