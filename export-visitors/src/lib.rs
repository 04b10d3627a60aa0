// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Visitors shipped with the exporter: per-second block statistics, net document counts
//! per table, and a pretty printer.

mod doc_count;
mod pretty_print;
pub mod second_bucket;
mod stats;

pub use doc_count::{TableDocumentCount, TableDocumentCountVisitor};
pub use pretty_print::PrettyPrintVisitor;
pub use second_bucket::{SecondBucket, SecondBucketTracker};
pub use stats::{StatsSummary, StatsVisitor};
