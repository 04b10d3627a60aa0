// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::sync::Arc;

use core_types::{Block, DocumentDecoder, ManifestName, journal::COMPLETED_MANIFEST_SUFFIX};
use export_source::{
    BlockSource, ExportStatus, LedgerService, Manifest, ManifestReader, ObjectStore,
    normalize_key,
};
use log::{debug, error, info};

use crate::{
    config::EngineConfig,
    errors::{BlockPosition, ExportError, Result, RunError},
    range::BlockPlacement,
    stitch::ManifestStitcher,
    tables::TableMap,
    visitor::VisitorSet,
};

/// Counters for one completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub manifests: usize,
    pub files_fetched: usize,
    pub files_skipped: usize,
    pub blocks: u64,
    pub revisions: u64,
    pub last_block: Option<u64>,
    pub teardown_failures: usize,
}

enum PlannedManifest {
    Path(String),
    Loaded(Manifest),
}

/// Run-scoped state; never outlives a single `process*` call.
struct WalkState {
    position: BlockPosition,
    summary: RunSummary,
}

/// Walks completed journal exports block by block and dispatches them to visitors.
pub struct ExportEngine {
    config: EngineConfig,
    store: Arc<dyn ObjectStore>,
    reader: ManifestReader,
    blocks: BlockSource,
    ledger: Option<Arc<dyn LedgerService>>,
    visitors: VisitorSet,
}

impl ExportEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn ObjectStore>,
        decoder: Arc<dyn DocumentDecoder>,
        visitors: VisitorSet,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            reader: ManifestReader::new(store.clone(), decoder.clone()),
            blocks: BlockSource::new(store.clone(), decoder),
            store,
            config,
            ledger: None,
            visitors,
        })
    }

    pub fn with_ledger_service(mut self, ledger: Arc<dyn LedgerService>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Locates the completed manifest of `export_id` through the ledger service and
    /// processes it.
    pub async fn process(&self, ledger_name: &str, export_id: &str) -> Result<RunSummary> {
        if ledger_name.is_empty() {
            return Err(ExportError::MissingArgument("ledger name"));
        }
        if export_id.is_empty() {
            return Err(ExportError::MissingArgument("export id"));
        }
        let ledger = self
            .ledger
            .as_ref()
            .ok_or(ExportError::LedgerServiceUnavailable)?;

        let description = ledger.describe_export(ledger_name, export_id).await?;
        if description.status != ExportStatus::Completed {
            return Err(ExportError::ExportNotReady {
                export_id: export_id.to_string(),
                status: description.status,
            });
        }
        let digest = ledger.get_digest(ledger_name).await?;
        let key = ManifestName::key(&description.prefix, export_id, &digest.strand_id);
        debug!(
            "[{}] looking for completed manifest s3://{}/{}",
            self.config.label, description.bucket, key
        );

        let candidates = self.store.list_objects(&description.bucket, &key).await?;
        let path = candidates
            .iter()
            .find(|candidate| **candidate == key)
            .or_else(|| candidates.first())
            .cloned()
            .ok_or_else(|| ExportError::ManifestNotFound {
                bucket: description.bucket.clone(),
                key: key.clone(),
            })?;
        self.process_export(&description.bucket, &path).await
    }

    /// Processes one completed manifest.
    pub async fn process_export(&self, bucket: &str, manifest_path: &str) -> Result<RunSummary> {
        if bucket.is_empty() {
            return Err(ExportError::MissingArgument("bucket"));
        }
        if manifest_path.is_empty() {
            return Err(ExportError::MissingArgument("manifest path"));
        }
        if !manifest_path.ends_with(COMPLETED_MANIFEST_SUFFIX) {
            return Err(ExportError::InvalidManifestPath {
                path: manifest_path.to_string(),
            });
        }
        let path = normalize_key(manifest_path).to_string();
        info!(
            "[{}] processing export manifest s3://{}/{}",
            self.config.label, bucket, path
        );
        self.run(bucket, vec![PlannedManifest::Path(path)]).await
    }

    /// Stitches several manifests of one strand and processes them as a single run.
    /// Nothing is set up until stitching succeeds.
    pub async fn process_exports(&self, bucket: &str, manifest_paths: &[String]) -> Result<RunSummary> {
        if bucket.is_empty() {
            return Err(ExportError::MissingArgument("bucket"));
        }
        if manifest_paths.is_empty() {
            return Err(ExportError::MissingArgument("manifest paths"));
        }
        let stitched = ManifestStitcher::new(self.reader.clone())
            .stitch(bucket, manifest_paths)
            .await?;
        for ranged in &stitched {
            info!(
                "[{}] manifest {} covers blocks {}",
                self.config.label, ranged.manifest.path, ranged.range
            );
        }
        let plan = stitched
            .into_iter()
            .map(|ranged| PlannedManifest::Loaded(ranged.manifest))
            .collect();
        self.run(bucket, plan).await
    }

    async fn run(&self, bucket: &str, plan: Vec<PlannedManifest>) -> Result<RunSummary> {
        let mut state = WalkState {
            position: BlockPosition::BeforeFirstBlock,
            summary: RunSummary::default(),
        };
        let mut lifecycle = self.visitors.lifecycle(&self.config.label);
        let outcome = match lifecycle.setup() {
            Ok(()) => self.walk(bucket, plan, &mut state).await,
            Err(err) => Err(err),
        };
        let failures = lifecycle.finish();
        state.summary.teardown_failures = failures.len();

        match outcome {
            Ok(()) => {
                info!(
                    "[{}] run complete: {} manifests, {} files fetched, {} skipped, {} blocks, {} revisions",
                    self.config.label,
                    state.summary.manifests,
                    state.summary.files_fetched,
                    state.summary.files_skipped,
                    state.summary.blocks,
                    state.summary.revisions
                );
                Ok(state.summary)
            }
            Err(source) => {
                error!(
                    "[{}] processing failed {}: {}",
                    self.config.label, state.position, source
                );
                Err(ExportError::Processing {
                    position: state.position,
                    source,
                })
            }
        }
    }

    async fn walk(
        &self,
        bucket: &str,
        plan: Vec<PlannedManifest>,
        state: &mut WalkState,
    ) -> std::result::Result<(), RunError> {
        let window = &self.config.window;
        let cancel = &self.config.cancel;

        'manifests: for planned in plan {
            let manifest = match planned {
                PlannedManifest::Path(path) => self.reader.read(bucket, &path).await?,
                PlannedManifest::Loaded(manifest) => manifest,
            };
            state.summary.manifests += 1;
            debug!(
                "[{}] walking {} ({} data files)",
                self.config.label,
                manifest.path,
                manifest.files.len()
            );

            for key in &manifest.files {
                if cancel.is_cancelled() {
                    info!("[{}] run cancelled before fetching {}", self.config.label, key);
                    return Err(RunError::Cancelled);
                }
                if !window.file_in_range(key) {
                    debug!("[{}] skipping {} outside block window", self.config.label, key);
                    state.summary.files_skipped += 1;
                    continue;
                }
                let blocks = self.blocks.fetch(bucket, key).await?;
                state.summary.files_fetched += 1;

                for block in &blocks {
                    if cancel.is_cancelled() {
                        info!("[{}] run cancelled while walking {}", self.config.label, key);
                        return Err(RunError::Cancelled);
                    }
                    let seq = block.sequence_no();
                    state.position = BlockPosition::Block(seq);
                    match window.place(seq) {
                        BlockPlacement::Before => continue,
                        BlockPlacement::After => {
                            info!(
                                "[{}] block {} is past the window end; stopping",
                                self.config.label, seq
                            );
                            break 'manifests;
                        }
                        BlockPlacement::InRange => {}
                    }
                    self.dispatch(block, &mut state.summary)?;
                }
            }
        }
        Ok(())
    }

    fn dispatch(&self, block: &Block, summary: &mut RunSummary) -> std::result::Result<(), RunError> {
        for visitor in self.visitors.block_visitors() {
            let mut visitor = visitor.lock();
            visitor
                .visit_block(block)
                .map_err(|source| RunError::Visitor {
                    visitor: visitor.name().to_string(),
                    source,
                })?;
        }
        summary.blocks += 1;
        summary.last_block = Some(block.sequence_no());

        if !self.visitors.has_revision_visitors() {
            return Ok(());
        }
        let Some(tables) = TableMap::for_block(block) else {
            return Ok(());
        };
        for revision in block.revisions().filter(|revision| !revision.is_redacted()) {
            let Some(document_id) = revision.document_id() else {
                continue;
            };
            let table = tables.resolve(document_id);
            for visitor in self.visitors.revision_visitors() {
                let mut visitor = visitor.lock();
                visitor
                    .visit_revision(revision, table)
                    .map_err(|source| RunError::Visitor {
                        visitor: visitor.name().to_string(),
                        source,
                    })?;
            }
            summary.revisions += 1;
        }
        Ok(())
    }
}
