// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use core_types::Block;
use export_engine::{BlockVisitor, BlockWindow, Visitor, VisitorError};
use log::info;

use crate::second_bucket::{SecondBucket, SecondBucketTracker};

const BUCKET_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Totals reported when a stats run is torn down.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSummary {
    pub total_blocks: u64,
    pub total_revisions: u64,
    pub first_block_time: Option<DateTime<Utc>>,
    pub last_block_time: Option<DateTime<Utc>>,
    pub elapsed_seconds: i64,
    /// Equals `total_blocks` when every block landed in the same second.
    pub blocks_per_second: f64,
}

impl StatsSummary {
    fn compute(
        total_blocks: u64,
        total_revisions: u64,
        first: Option<DateTime<Utc>>,
        last: Option<DateTime<Utc>>,
    ) -> Self {
        let elapsed_seconds = match (first, last) {
            (Some(first), Some(last)) => (last - first).num_seconds(),
            _ => 0,
        };
        let blocks_per_second = if elapsed_seconds > 0 {
            total_blocks as f64 / elapsed_seconds as f64
        } else {
            total_blocks as f64
        };
        Self {
            total_blocks,
            total_revisions,
            first_block_time: first,
            last_block_time: last,
            elapsed_seconds,
            blocks_per_second,
        }
    }
}

enum BucketSink {
    Memory(Vec<SecondBucket>),
    Csv {
        path: PathBuf,
        writer: Option<BufWriter<File>>,
    },
}

impl BucketSink {
    fn open(&mut self) -> Result<(), VisitorError> {
        match self {
            BucketSink::Memory(records) => records.clear(),
            BucketSink::Csv { path, writer } => {
                *writer = Some(BufWriter::new(File::create(&*path)?));
            }
        }
        Ok(())
    }

    fn write(&mut self, bucket: SecondBucket) -> Result<(), VisitorError> {
        match self {
            BucketSink::Memory(records) => records.push(bucket),
            BucketSink::Csv { path, writer } => {
                let writer = writer.as_mut().ok_or_else(|| {
                    VisitorError::msg(format!("{} written before setup", path.display()))
                })?;
                writeln!(
                    writer,
                    "{}, {}",
                    bucket.second.format(BUCKET_TIME_FORMAT),
                    bucket.count
                )?;
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), VisitorError> {
        if let BucketSink::Csv { writer, .. } = self {
            if let Some(mut writer) = writer.take() {
                writer.flush()?;
            }
        }
        Ok(())
    }
}

/// Counts blocks per second of block time and reports overall throughput.
pub struct StatsVisitor {
    window: BlockWindow,
    sink: BucketSink,
    tracker: SecondBucketTracker,
    total_blocks: u64,
    total_revisions: u64,
    first_block_time: Option<DateTime<Utc>>,
    last_block_time: Option<DateTime<Utc>>,
    summary: Option<StatsSummary>,
}

impl Default for StatsVisitor {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl StatsVisitor {
    /// Keeps bucket records in memory; see [`StatsVisitor::buckets`].
    pub fn in_memory() -> Self {
        Self::with_sink(BucketSink::Memory(Vec::new()))
    }

    /// Writes one `<second>, <count>` line per bucket to `path`, replacing any existing file.
    pub fn to_csv(path: impl AsRef<Path>) -> Self {
        Self::with_sink(BucketSink::Csv {
            path: path.as_ref().to_path_buf(),
            writer: None,
        })
    }

    fn with_sink(sink: BucketSink) -> Self {
        Self {
            window: BlockWindow::unbounded(),
            sink,
            tracker: SecondBucketTracker::new(),
            total_blocks: 0,
            total_revisions: 0,
            first_block_time: None,
            last_block_time: None,
            summary: None,
        }
    }

    /// Restricts counting to blocks inside `window`, independent of the engine's window.
    pub fn with_window(mut self, window: BlockWindow) -> Self {
        self.window = window;
        self
    }

    /// Buckets flushed so far, when collecting in memory.
    pub fn buckets(&self) -> &[SecondBucket] {
        match &self.sink {
            BucketSink::Memory(records) => records,
            BucketSink::Csv { .. } => &[],
        }
    }

    /// Available once the run has been torn down.
    pub fn summary(&self) -> Option<&StatsSummary> {
        self.summary.as_ref()
    }
}

impl Visitor for StatsVisitor {
    fn name(&self) -> &str {
        "stats"
    }

    fn setup(&mut self) -> Result<(), VisitorError> {
        self.tracker = SecondBucketTracker::new();
        self.total_blocks = 0;
        self.total_revisions = 0;
        self.first_block_time = None;
        self.last_block_time = None;
        self.summary = None;
        self.sink.open()
    }

    fn teardown(&mut self) -> Result<(), VisitorError> {
        let sink = &mut self.sink;
        let flushed = self.tracker.finish(|bucket| sink.write(bucket));
        let closed = self.sink.close();

        let summary = StatsSummary::compute(
            self.total_blocks,
            self.total_revisions,
            self.first_block_time,
            self.last_block_time,
        );
        info!(
            "[stats] total blocks: {}, total revisions: {}, elapsed: {}s, blocks/s: {:.2}",
            summary.total_blocks,
            summary.total_revisions,
            summary.elapsed_seconds,
            summary.blocks_per_second
        );
        if let Some(first) = summary.first_block_time {
            info!("[stats] first block time: {}", first.to_rfc3339());
        }
        if let Some(last) = summary.last_block_time {
            info!("[stats] last block time: {}", last.to_rfc3339());
        }
        self.summary = Some(summary);
        flushed.and(closed)
    }
}

impl BlockVisitor for StatsVisitor {
    fn visit_block(&mut self, block: &Block) -> Result<(), VisitorError> {
        if !self.window.contains(block.sequence_no()) {
            return Ok(());
        }
        let ts = block
            .timestamp()
            .map_err(|err| VisitorError::Other(Box::new(err)))?;
        self.first_block_time.get_or_insert(ts);
        self.last_block_time = Some(ts);

        let sink = &mut self.sink;
        self.tracker.observe(ts, |bucket| sink.write(bucket))?;

        self.total_blocks += 1;
        self.total_revisions += block
            .revisions()
            .filter(|revision| revision.has_block_address())
            .count() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block(seq: u64, ts: &str, addressed_revisions: usize, placeholders: usize) -> Block {
        let mut revisions = Vec::new();
        for _ in 0..addressed_revisions {
            revisions.push(json!({"blockAddress": {"sequenceNo": seq}, "metadata": {"id": "d", "version": 0}}));
        }
        for _ in 0..placeholders {
            revisions.push(json!({"hash": "h"}));
        }
        Block::from_value(
            json!({
                "blockAddress": {"sequenceNo": seq},
                "blockTimestamp": ts,
                "revisions": revisions
            })
            .into(),
        )
        .expect("block")
    }

    fn bucket(ts: &str, count: u64) -> SecondBucket {
        SecondBucket {
            second: DateTime::parse_from_rfc3339(ts)
                .expect("ts")
                .with_timezone(&Utc),
            count,
        }
    }

    #[test]
    fn buckets_blocks_by_second() {
        let mut stats = StatsVisitor::in_memory();
        stats.setup().unwrap();
        for (seq, ts) in [
            (1, "2024-03-01T10:00:00.100Z"),
            (2, "2024-03-01T10:00:00.900Z"),
            (3, "2024-03-01T10:00:01.000Z"),
            (4, "2024-03-01T10:00:03.250Z"),
        ] {
            stats.visit_block(&block(seq, ts, 1, 1)).unwrap();
        }
        stats.teardown().unwrap();

        assert_eq!(
            stats.buckets(),
            &[
                bucket("2024-03-01T10:00:00Z", 2),
                bucket("2024-03-01T10:00:01Z", 1),
                bucket("2024-03-01T10:00:03Z", 1),
            ]
        );
        let summary = stats.summary().expect("summary");
        assert_eq!(summary.total_blocks, 4);
        assert_eq!(summary.total_revisions, 4);
        assert_eq!(summary.elapsed_seconds, 3);
        assert!((summary.blocks_per_second - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn single_second_run_reports_block_count_as_rate() {
        let mut stats = StatsVisitor::in_memory();
        stats.setup().unwrap();
        stats.visit_block(&block(1, "2024-03-01T10:00:00.100Z", 0, 0)).unwrap();
        stats.visit_block(&block(2, "2024-03-01T10:00:00.200Z", 0, 0)).unwrap();
        stats.teardown().unwrap();

        let summary = stats.summary().expect("summary");
        assert_eq!(summary.elapsed_seconds, 0);
        assert_eq!(summary.blocks_per_second, 2.0);
    }

    #[test]
    fn own_window_filters_blocks() {
        let mut stats = StatsVisitor::in_memory().with_window(BlockWindow::new(Some(2), Some(2)));
        stats.setup().unwrap();
        for seq in 1..=3 {
            stats
                .visit_block(&block(seq, "2024-03-01T10:00:00.000Z", 0, 0))
                .unwrap();
        }
        stats.teardown().unwrap();
        assert_eq!(stats.summary().expect("summary").total_blocks, 1);
    }

    #[test]
    fn writes_csv_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        std::fs::write(&path, "stale").unwrap();

        let mut stats = StatsVisitor::to_csv(&path);
        stats.setup().unwrap();
        stats.visit_block(&block(1, "2024-03-01T10:00:00.100Z", 0, 0)).unwrap();
        stats.visit_block(&block(2, "2024-03-01T10:00:02.000Z", 0, 0)).unwrap();
        stats.teardown().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "2024-03-01T10:00:00.000+0000, 1\n2024-03-01T10:00:02.000+0000, 1\n"
        );
        assert!(stats.buckets().is_empty());
    }

    #[test]
    fn missing_timestamp_is_a_visitor_error() {
        let mut stats = StatsVisitor::in_memory();
        stats.setup().unwrap();
        let block = Block::from_value(json!({"blockAddress": {"sequenceNo": 1}}).into()).unwrap();
        assert!(stats.visit_block(&block).is_err());
    }
}
