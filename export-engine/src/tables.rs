// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::collections::HashMap;

use core_types::{Block, Value};

/// Table id and name reported for documents absent from the block's document map.
pub const UNKNOWN_TABLE: &str = "***UNKNOWN***";

/// Table a revision belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef<'a> {
    pub table_id: &'a str,
    pub table_name: &'a str,
}

impl TableRef<'_> {
    pub const UNKNOWN: TableRef<'static> = TableRef {
        table_id: UNKNOWN_TABLE,
        table_name: UNKNOWN_TABLE,
    };

    pub fn is_unknown(&self) -> bool {
        self.table_id == UNKNOWN_TABLE && self.table_name == UNKNOWN_TABLE
    }
}

/// Per-block document id to table mapping, built from `transactionInfo.documents`.
#[derive(Debug, Default)]
pub struct TableMap<'a> {
    tables: HashMap<&'a str, TableRef<'a>>,
}

impl<'a> TableMap<'a> {
    /// `None` when the block has no revisions or no transaction info, in which case its
    /// revisions are not dispatched. A transaction without a document map yields an
    /// empty mapping.
    pub fn for_block(block: &'a Block) -> Option<Self> {
        if !block.has_revisions() || !block.has_transaction_info() {
            return None;
        }
        let tables: HashMap<_, _> = block
            .transaction_documents()
            .map(|docs| {
                docs.iter()
                    .map(|(doc_id, info)| (doc_id.as_str(), table_ref(info)))
                    .collect()
            })
            .unwrap_or_default();
        Some(Self { tables })
    }

    pub fn resolve(&self, document_id: &str) -> TableRef<'a> {
        self.tables
            .get(document_id)
            .copied()
            .unwrap_or(TableRef::UNKNOWN)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn table_ref(info: &Value) -> TableRef<'_> {
    let field = |name| info.get(name).and_then(Value::as_str).unwrap_or(UNKNOWN_TABLE);
    TableRef {
        table_id: field("tableId"),
        table_name: field("tableName"),
    }
}
