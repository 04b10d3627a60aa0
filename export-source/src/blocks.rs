// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::sync::Arc;

use core_types::{Block, DataFileKey, DecodeError, DocumentDecoder};
use log::debug;

use crate::{errors::BlockFileError, store::ObjectStore};

/// Fetches one data file and decodes it into its blocks, in file order.
#[derive(Clone)]
pub struct BlockSource {
    store: Arc<dyn ObjectStore>,
    decoder: Arc<dyn DocumentDecoder>,
}

impl BlockSource {
    pub fn new(store: Arc<dyn ObjectStore>, decoder: Arc<dyn DocumentDecoder>) -> Self {
        Self { store, decoder }
    }

    pub async fn fetch(&self, bucket: &str, key: &DataFileKey) -> Result<Vec<Block>, BlockFileError> {
        let body = self.store.get_object(bucket, key.as_str()).await?;
        let decode_err = |source: DecodeError| BlockFileError::Decode {
            key: key.to_string(),
            source,
        };
        let blocks = self
            .decoder
            .decode_all(&body)
            .map_err(decode_err)?
            .into_iter()
            .map(Block::from_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(decode_err)?;
        debug!("decoded {} blocks from {}", blocks.len(), key);
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryObjectStore;
    use core_types::JsonDocumentDecoder;

    #[tokio::test]
    async fn decodes_blocks_in_file_order() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert(
            "b",
            "s.1-2.json",
            "{\"blockAddress\":{\"sequenceNo\":1}}\n{\"blockAddress\":{\"sequenceNo\":2}}\n",
        );
        let source = BlockSource::new(store.clone(), Arc::new(JsonDocumentDecoder));
        let blocks = source
            .fetch("b", &DataFileKey::new("s.1-2.json"))
            .await
            .expect("fetch");
        let seqs: Vec<_> = blocks.iter().map(Block::sequence_no).collect();
        assert_eq!(seqs, vec![1, 2]);
        assert_eq!(store.fetch_count("s.1-2.json"), 1);
    }

    #[tokio::test]
    async fn block_without_address_is_a_decode_error() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("b", "s.1-1.json", "{\"blockTimestamp\":\"x\"}");
        let source = BlockSource::new(store, Arc::new(JsonDocumentDecoder));
        let err = source
            .fetch("b", &DataFileKey::new("s.1-1.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, BlockFileError::Decode { .. }));
    }
}
