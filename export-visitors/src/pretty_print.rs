// Copyright (c) James Kassemi, SC, US. All rights reserved.
use core_types::{Block, Revision, Value};
use export_engine::{BlockVisitor, RevisionVisitor, TableRef, Visitor, VisitorError};
use log::info;

/// Logs every block and revision as indented JSON.
#[derive(Debug, Default)]
pub struct PrettyPrintVisitor {
    blocks: u64,
    revisions: u64,
}

impl PrettyPrintVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks_printed(&self) -> u64 {
        self.blocks
    }

    pub fn revisions_printed(&self) -> u64 {
        self.revisions
    }
}

fn pretty(value: &Value) -> Result<String, VisitorError> {
    serde_json::to_string_pretty(value).map_err(|err| VisitorError::Other(Box::new(err)))
}

impl Visitor for PrettyPrintVisitor {
    fn name(&self) -> &str {
        "pretty-print"
    }

    fn setup(&mut self) -> Result<(), VisitorError> {
        self.blocks = 0;
        self.revisions = 0;
        Ok(())
    }
}

impl BlockVisitor for PrettyPrintVisitor {
    fn visit_block(&mut self, block: &Block) -> Result<(), VisitorError> {
        info!("BLOCK {}", block.sequence_no());
        info!("{}", pretty(block.value())?);
        self.blocks += 1;
        Ok(())
    }
}

impl RevisionVisitor for PrettyPrintVisitor {
    fn visit_revision(
        &mut self,
        revision: Revision<'_>,
        table: TableRef<'_>,
    ) -> Result<(), VisitorError> {
        info!("REVISION in table {} ({})", table.table_name, table.table_id);
        info!("{}", pretty(revision.value())?);
        self.revisions += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_blocks_and_revisions() {
        let block = Block::from_value(
            json!({
                "blockAddress": {"sequenceNo": 7},
                "revisions": [{"metadata": {"id": "d", "version": 0}}]
            })
            .into(),
        )
        .unwrap();
        let mut visitor = PrettyPrintVisitor::new();
        visitor.setup().unwrap();
        visitor.visit_block(&block).unwrap();
        for revision in block.revisions() {
            visitor.visit_revision(revision, TableRef::UNKNOWN).unwrap();
        }
        assert_eq!(visitor.blocks_printed(), 1);
        assert_eq!(visitor.revisions_printed(), 1);

        let rendered = pretty(block.value()).unwrap();
        assert!(rendered.contains("\"sequenceNo\": 7"));
    }
}
