// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use core_types::JsonDocumentDecoder;
use export_engine::{EngineConfig, ExportEngine, VisitorSet, shared};
use export_source::MemoryObjectStore;
use export_visitors::{PrettyPrintVisitor, SecondBucket, StatsVisitor, TableDocumentCountVisitor};
use serde_json::json;

const BUCKET: &str = "journal";
const MANIFEST: &str = "exports/x.s1.completed.manifest";

fn at(ts: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc)
}

fn seed(store: &MemoryObjectStore) {
    let blocks = [
        (1, "2024-05-01T12:00:00.000Z", json!({"metadata": {"id": "car1", "version": 0}, "data": {}})),
        (2, "2024-05-01T12:00:00.500Z", json!({"metadata": {"id": "car2", "version": 0}, "data": {}})),
        (3, "2024-05-01T12:00:01.000Z", json!({"metadata": {"id": "car1", "version": 1}, "data": {"x": 1}})),
        (4, "2024-05-01T12:00:03.000Z", json!({"metadata": {"id": "car2", "version": 1}})),
    ];
    let lines: Vec<String> = blocks
        .into_iter()
        .map(|(seq, ts, mut revision)| {
            let doc_id = revision["metadata"]["id"].as_str().unwrap().to_string();
            revision["blockAddress"] = json!({"strandId": "s1", "sequenceNo": seq});
            json!({
                "blockAddress": {"strandId": "s1", "sequenceNo": seq},
                "blockTimestamp": ts,
                "transactionInfo": {"documents": {doc_id: {"tableName": "Cars", "tableId": "t1"}}},
                "revisions": [revision]
            })
            .to_string()
        })
        .collect();
    store.insert(BUCKET, "exports/s1.1-4.ion", lines.join("\n"));
    store.insert(
        BUCKET,
        MANIFEST,
        json!({"keys": ["exports/s1.1-4.ion"]}).to_string(),
    );
}

#[tokio::test]
async fn stats_and_counts_over_one_export() {
    let store = Arc::new(MemoryObjectStore::new());
    seed(&store);

    let stats = shared(StatsVisitor::in_memory());
    let counts = shared(TableDocumentCountVisitor::new());
    let printer = shared(PrettyPrintVisitor::new());
    let visitors = VisitorSet::new()
        .with_block_visitor(stats.clone())
        .with_revision_visitor(counts.clone())
        .with_block_visitor(printer.clone())
        .with_revision_visitor(printer.clone());
    let engine = ExportEngine::new(
        EngineConfig::default(),
        store,
        Arc::new(JsonDocumentDecoder),
        visitors,
    )
    .unwrap();

    engine.process_export(BUCKET, MANIFEST).await.unwrap();

    let stats = stats.lock();
    assert_eq!(
        stats.buckets(),
        &[
            SecondBucket { second: at("2024-05-01T12:00:00Z"), count: 2 },
            SecondBucket { second: at("2024-05-01T12:00:01Z"), count: 1 },
            SecondBucket { second: at("2024-05-01T12:00:03Z"), count: 1 },
        ]
    );
    let summary = stats.summary().unwrap();
    assert_eq!(summary.total_blocks, 4);
    assert_eq!(summary.total_revisions, 4);
    assert_eq!(summary.elapsed_seconds, 3);

    assert_eq!(counts.lock().count_for("t1"), Some(1));
    assert!(counts.lock().report().unwrap().contains("Cars"));

    let printer = printer.lock();
    assert_eq!(printer.blocks_printed(), 4);
    assert_eq!(printer.revisions_printed(), 4);
}
