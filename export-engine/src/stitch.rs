// Copyright (c) James Kassemi, SC, US. All rights reserved.
use core_types::{BlockRange, ManifestName};
use export_source::{Manifest, ManifestReader};
use log::{debug, warn};

use crate::errors::{ExportError, Result};

/// A manifest together with the block range its data files cover.
#[derive(Debug, Clone)]
pub struct RangedManifest {
    pub manifest: Manifest,
    pub range: BlockRange,
}

/// Orders several completed manifests of one strand into a gap-free sequence.
///
/// Every check runs before any data file is fetched; only manifest objects are read.
#[derive(Clone)]
pub struct ManifestStitcher {
    reader: ManifestReader,
}

impl ManifestStitcher {
    pub fn new(reader: ManifestReader) -> Self {
        Self { reader }
    }

    pub async fn stitch(&self, bucket: &str, paths: &[String]) -> Result<Vec<RangedManifest>> {
        check_strands(paths)?;

        let mut ranged = Vec::with_capacity(paths.len());
        for path in paths {
            let manifest = self.reader.read(bucket, path).await?;
            match manifest_range(&manifest)? {
                Some(range) => {
                    debug!("manifest {} covers {}", manifest.path, range);
                    ranged.push(RangedManifest { manifest, range });
                }
                None => warn!("manifest {} lists no data files; skipping", manifest.path),
            }
        }

        ranged.sort_by_key(|m| m.range.first);
        for pair in ranged.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.range.last.checked_add(1) != Some(next.range.first) {
                return Err(ExportError::NonContiguousManifests {
                    previous_path: prev.manifest.path.clone(),
                    previous: prev.range,
                    next_path: next.manifest.path.clone(),
                    next: next.range,
                });
            }
        }
        Ok(ranged)
    }
}

/// Every name must parse, and all must share the first name's strand.
fn check_strands(paths: &[String]) -> Result<()> {
    let names = paths
        .iter()
        .map(|path| {
            ManifestName::parse(path)
                .map(|name| (path, name))
                .ok_or_else(|| ExportError::InvalidManifestName { path: path.clone() })
        })
        .collect::<Result<Vec<_>>>()?;

    let Some((_, first)) = names.first() else {
        return Ok(());
    };
    for (path, name) in &names[1..] {
        if name.strand_id != first.strand_id {
            return Err(ExportError::StrandMismatch {
                expected: first.strand_id.clone(),
                found: name.strand_id.clone(),
                path: (*path).clone(),
            });
        }
    }
    Ok(())
}

/// First block of the first file through last block of the last file.
fn manifest_range(manifest: &Manifest) -> Result<Option<BlockRange>> {
    let (Some(first_file), Some(last_file)) = (manifest.files.first(), manifest.files.last())
    else {
        return Ok(None);
    };
    let range_of = |key: &core_types::DataFileKey| {
        key.block_range()
            .ok_or_else(|| ExportError::UnparsableManifestRange {
                path: manifest.path.clone(),
                key: key.to_string(),
            })
    };
    Ok(Some(BlockRange {
        first: range_of(first_file)?.first,
        last: range_of(last_file)?.last,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use core_types::JsonDocumentDecoder;
    use export_source::MemoryObjectStore;

    use super::*;

    fn manifest_body(keys: &[&str]) -> String {
        let quoted: Vec<String> = keys.iter().map(|k| format!("\"{k}\"")).collect();
        format!("{{\"keys\": [{}]}}", quoted.join(","))
    }

    fn stitcher(store: &Arc<MemoryObjectStore>) -> ManifestStitcher {
        ManifestStitcher::new(ManifestReader::new(
            store.clone(),
            Arc::new(JsonDocumentDecoder),
        ))
    }

    fn paths(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn orders_manifests_by_first_block() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("b", "x/a.s1.completed.manifest", manifest_body(&["x/s1.101-150.ion", "x/s1.151-200.ion"]));
        store.insert("b", "x/b.s1.completed.manifest", manifest_body(&["x/s1.1-100.ion"]));
        store.insert("b", "x/c.s1.completed.manifest", manifest_body(&["x/s1.201-300.ion"]));

        let stitched = stitcher(&store)
            .stitch(
                "b",
                &paths(&[
                    "x/c.s1.completed.manifest",
                    "x/a.s1.completed.manifest",
                    "x/b.s1.completed.manifest",
                ]),
            )
            .await
            .expect("stitch");
        let ranges: Vec<_> = stitched.iter().map(|m| (m.range.first, m.range.last)).collect();
        assert_eq!(ranges, vec![(1, 100), (101, 200), (201, 300)]);
    }

    #[tokio::test]
    async fn gap_between_manifests_is_rejected() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("b", "a.s1.completed.manifest", manifest_body(&["s1.1-100.ion"]));
        store.insert("b", "b.s1.completed.manifest", manifest_body(&["s1.150-200.ion"]));

        let err = stitcher(&store)
            .stitch("b", &paths(&["a.s1.completed.manifest", "b.s1.completed.manifest"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::NonContiguousManifests { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn overlap_is_rejected() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("b", "a.s1.completed.manifest", manifest_body(&["s1.1-100.ion"]));
        store.insert("b", "b.s1.completed.manifest", manifest_body(&["s1.90-200.ion"]));

        let err = stitcher(&store)
            .stitch("b", &paths(&["a.s1.completed.manifest", "b.s1.completed.manifest"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::NonContiguousManifests { .. }));
    }

    #[tokio::test]
    async fn names_are_checked_before_any_read() {
        let store = Arc::new(MemoryObjectStore::new());
        let err = stitcher(&store)
            .stitch("b", &paths(&["a.s1.completed.manifest", "a.s2.completed.manifest"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::StrandMismatch { ref found, .. } if found == "s2"));

        let err = stitcher(&store)
            .stitch("b", &paths(&["a.s1.completed.manifest", "bogus.manifest"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::InvalidManifestName { .. }));
        assert_eq!(store.total_fetches(), 0);
    }

    #[tokio::test]
    async fn empty_manifests_are_dropped() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("b", "a.s1.completed.manifest", manifest_body(&["s1.1-10.ion"]));
        store.insert("b", "b.s1.completed.manifest", manifest_body(&[]));

        let stitched = stitcher(&store)
            .stitch("b", &paths(&["a.s1.completed.manifest", "b.s1.completed.manifest"]))
            .await
            .expect("stitch");
        assert_eq!(stitched.len(), 1);
        assert_eq!(stitched[0].range, BlockRange { first: 1, last: 10 });
    }

    #[tokio::test]
    async fn unparsable_file_range_is_an_error() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("b", "a.s1.completed.manifest", manifest_body(&["s1.data.ion"]));

        let err = stitcher(&store)
            .stitch("b", &paths(&["a.s1.completed.manifest"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::UnparsableManifestRange { .. }));
    }
}
