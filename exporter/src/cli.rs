// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "exporter", about = "Walk completed ledger journal exports block by block")]
pub struct Cli {
    /// Bucket holding the export.
    #[arg(long)]
    pub bucket: String,
    /// Completed manifest path; repeat to stitch several exports of one strand.
    #[arg(long = "manifest", required = true)]
    pub manifests: Vec<String>,
    #[arg(long)]
    pub start_block: Option<u64>,
    #[arg(long)]
    pub end_block: Option<u64>,
    /// Read `<local-root>/<bucket>/<key>` from disk instead of S3.
    #[arg(long)]
    pub local_root: Option<PathBuf>,
    /// TOML settings file; `EXPORTER_*` variables override it.
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Log every block and revision as JSON.
    Print,
    /// Blocks per second of block time.
    Stats {
        /// CSV destination; buckets go to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Net document count per table.
    Count,
}
