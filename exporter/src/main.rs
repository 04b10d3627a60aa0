// Copyright (c) James Kassemi, SC, US. All rights reserved.
mod cli;

use std::{process, sync::Arc};

use clap::Parser;
use cli::{Cli, Command};
use config::ConfigError;
use core_types::{ExporterConfig, JsonDocumentDecoder};
use export_engine::{
    BlockWindow, EngineConfig, ExportEngine, ExportError, RunSummary, VisitorSet, shared,
};
use export_source::{FsObjectStore, ObjectStore, S3ObjectStore, SourceError};
use export_visitors::{PrettyPrintVisitor, StatsVisitor, TableDocumentCountVisitor};
use log::{info, warn};
use thiserror::Error;
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;

fn main() {
    if let Err(err) = run() {
        eprintln!("exporter failed: {err}");
        process::exit(1);
    }
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ExporterConfig::load(cli.config.as_deref())?;
    let runtime = Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(execute(cli, config))
}

async fn execute(cli: Cli, config: ExporterConfig) -> Result<(), AppError> {
    let label = config.run.label.clone();
    let cancel = CancellationToken::new();
    spawn_interrupt_handler(label.clone(), cancel.clone());

    let store: Arc<dyn ObjectStore> = match &cli.local_root {
        Some(root) => {
            info!("[{}] reading export from {}", label, root.display());
            Arc::new(FsObjectStore::new(root.clone()))
        }
        None => Arc::new(S3ObjectStore::new(&config.s3, config.retry.policy())?),
    };

    let window = BlockWindow::new(
        cli.start_block.or(config.run.start_block),
        cli.end_block.or(config.run.end_block),
    );
    let engine_config = EngineConfig {
        label: label.clone(),
        window,
        cancel,
    };

    let mut visitors = VisitorSet::new();
    let stats = match &cli.command {
        Command::Print => {
            let printer = shared(PrettyPrintVisitor::new());
            visitors
                .add_block_visitor(printer.clone())
                .add_revision_visitor(printer);
            None
        }
        Command::Stats { output } => {
            let stats = shared(match output {
                Some(path) => StatsVisitor::to_csv(path),
                None => StatsVisitor::in_memory(),
            });
            visitors.add_block_visitor(stats.clone());
            Some(stats)
        }
        Command::Count => {
            visitors.add_revision_visitor(shared(TableDocumentCountVisitor::new()));
            None
        }
    };

    let engine = ExportEngine::new(
        engine_config,
        store,
        Arc::new(JsonDocumentDecoder),
        visitors,
    )?;
    let summary = match cli.manifests.as_slice() {
        [single] => engine.process_export(&cli.bucket, single).await?,
        many => engine.process_exports(&cli.bucket, many).await?,
    };
    report(&label, &summary);

    if let Some(stats) = stats {
        for bucket in stats.lock().buckets() {
            println!(
                "{}, {}",
                bucket.second.format("%Y-%m-%dT%H:%M:%S%.3f%z"),
                bucket.count
            );
        }
    }
    Ok(())
}

fn spawn_interrupt_handler(label: String, cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("[{}] interrupt received; cancelling run", label);
                cancel.cancel();
            }
            Err(err) => warn!("[{}] unable to listen for interrupt: {}", label, err),
        }
    });
}

fn report(label: &str, summary: &RunSummary) {
    let last = summary
        .last_block
        .map(|seq| seq.to_string())
        .unwrap_or_else(|| "none".to_string());
    info!(
        "[{}] walked {} manifests; {} files fetched, {} skipped; {} blocks, {} revisions; last block {}",
        label,
        summary.manifests,
        summary.files_fetched,
        summary.files_skipped,
        summary.blocks,
        summary.revisions,
        last
    );
    if summary.teardown_failures > 0 {
        warn!(
            "[{}] {} visitors failed during teardown",
            label, summary.teardown_failures
        );
    }
}
